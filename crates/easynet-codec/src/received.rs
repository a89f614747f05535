use std::any::Any;
use std::fmt;

/// A decoded payload whose concrete type is known only at runtime.
pub struct Received {
    tag: String,
    type_name: &'static str,
    value: Box<dyn Any + Send>,
}

impl Received {
    pub(crate) fn new(tag: String, type_name: &'static str, value: Box<dyn Any + Send>) -> Self {
        Self {
            tag,
            type_name,
            value,
        }
    }

    /// Type tag the payload arrived with.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Rust type name the tag is registered to.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Take the value as `T`, or get `self` back unchanged.
    pub fn downcast<T: Any>(self) -> Result<T, Received> {
        let Received {
            tag,
            type_name,
            value,
        } = self;
        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Received {
                tag,
                type_name,
                value,
            }),
        }
    }

    pub fn into_any(self) -> Box<dyn Any + Send> {
        self.value
    }
}

impl fmt::Debug for Received {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Received")
            .field("tag", &self.tag)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
