use crossbeam::queue::SegQueue;
use easynet_frame::Frame;

/// Unbounded FIFO of inbound frames.
///
/// The listener pushes; any caller thread may pop.
#[derive(Debug, Default)]
pub struct InboundQueue {
    frames: SegQueue<Frame>,
}

impl InboundQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame at the tail.
    pub fn push(&self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Take the oldest frame, if any. Never blocks.
    pub fn pop(&self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Frames currently queued.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn pops_in_push_order() {
        let queue = InboundQueue::new();
        assert!(queue.pop().is_none());

        for n in 0..5u8 {
            queue.push(Frame::from_segments([vec![n]]));
        }
        assert_eq!(queue.len(), 5);

        let order: Vec<u8> = std::iter::from_fn(|| queue.pop())
            .map(|frame| frame.segments()[0][0])
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn concurrent_consumers_see_each_frame_once() {
        let queue = Arc::new(InboundQueue::new());
        for n in 0..1000u32 {
            queue.push(Frame::from_segments([n.to_le_bytes().to_vec()]));
        }

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || std::iter::from_fn(|| queue.pop()).count())
            })
            .collect();
        let total: usize = workers
            .into_iter()
            .map(|worker| worker.join().expect("worker should finish"))
            .sum();
        assert_eq!(total, 1000);
    }
}
