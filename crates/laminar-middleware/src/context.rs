//! Request-scoped values passed down the middleware chain.
//!
//! A [`Context`] is an immutable, cheaply cloneable bag of typed values.
//! Each unit receives the context by value and passes a (possibly extended)
//! context to its continuation. Extending never mutates: [`Context::with_value`]
//! returns a child that shares its parent's entries. Values added by a unit
//! further down the chain are therefore never visible to the units above it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Context that flows through the middleware chain.
///
/// Values are keyed by their type, so callers usually wrap them in a
/// newtype. Lookups return the most recently added value of that type.
///
/// # Example
///
/// ```
/// use laminar_middleware::Context;
///
/// #[derive(Debug, PartialEq)]
/// struct Tenant(&'static str);
///
/// let root = Context::background();
/// let child = root.with_value(Tenant("acme"));
///
/// assert_eq!(child.value::<Tenant>(), Some(&Tenant("acme")));
/// assert!(root.value::<Tenant>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Entry>>,
}

struct Entry {
    value: Box<dyn Any + Send + Sync>,
    parent: Option<Arc<Entry>>,
}

impl Context {
    /// Returns the empty root context.
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a child context carrying `value` on top of this one.
    #[must_use]
    pub fn with_value<T>(&self, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            head: Some(Arc::new(Entry {
                value: Box::new(value),
                parent: self.head.clone(),
            })),
        }
    }

    /// Returns the most recently added value of type `T`.
    pub fn value<T>(&self) -> Option<&T>
    where
        T: Any + Send + Sync,
    {
        self.entries()
            .find_map(|entry| (*entry.value).downcast_ref::<T>())
    }

    /// Returns `true` if a value of type `T` is present.
    pub fn contains<T>(&self) -> bool
    where
        T: Any + Send + Sync,
    {
        self.value::<T>().is_some()
    }

    /// Returns the number of values layered into this context.
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Returns `true` for a context without values.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    fn entries(&self) -> impl Iterator<Item = &Entry> {
        std::iter::successors(self.head.as_deref(), |entry| entry.parent.as_deref())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("values", &self.len()).finish()
    }
}
