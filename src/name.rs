//! Externally-bindable input slots.
//!
//! A [`Name`] is a typed placeholder for a value the caller supplies at run
//! time via [`Graph::bind`](crate::graphs::Graph::bind). The slot is keyed by
//! *identity*: two names created with the same label are still two distinct
//! slots. Clones of a `Name` share identity, so the handle used to declare an
//! input is the handle used to bind it.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::types::{NameId, Value};

struct NameInner {
    id: NameId,
    label: String,
    type_id: TypeId,
    type_name: &'static str,
}

/// A typed, externally-bindable input slot.
///
/// # Examples
///
/// ```
/// use rill::name::Name;
///
/// let user: Name<String> = Name::named("user");
/// assert_eq!(user.label(), "user");
///
/// // Same label, distinct slot:
/// let other: Name<String> = Name::named("user");
/// assert_ne!(user, other);
/// // Clones share identity:
/// assert_eq!(user, user.clone());
/// ```
pub struct Name<T> {
    inner: Arc<NameInner>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Value> Name<T> {
    /// Create a fresh input slot with a human-readable label.
    pub fn named(label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(NameInner {
                id: NameId::fresh(),
                label: label.into(),
                type_id: TypeId::of::<T>(),
                type_name: std::any::type_name::<T>(),
            }),
            _marker: PhantomData,
        }
    }

    /// The label the slot was declared with.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub(crate) fn id(&self) -> NameId {
        self.inner.id
    }
}

impl<T> Clone for Name<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Name<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<T> Eq for Name<T> {}

impl<T> fmt::Debug for Name<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Name")
            .field("label", &self.inner.label)
            .field("type", &self.inner.type_name)
            .finish()
    }
}

/// Type-erased handle to a [`Name`], used wherever slots of differing value
/// types are collected together (input declarations, bindings, diagnostics).
#[derive(Clone)]
pub struct NameRef {
    inner: Arc<NameInner>,
}

impl NameRef {
    /// The label of the referenced slot.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Name of the slot's value type.
    pub fn type_name(&self) -> &'static str {
        self.inner.type_name
    }

    pub(crate) fn id(&self) -> NameId {
        self.inner.id
    }

    pub(crate) fn value_type_id(&self) -> TypeId {
        self.inner.type_id
    }
}

impl PartialEq for NameRef {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for NameRef {}

impl fmt::Debug for NameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameRef")
            .field("label", &self.inner.label)
            .field("type", &self.inner.type_name)
            .finish()
    }
}

impl<T: Value> From<&Name<T>> for NameRef {
    fn from(name: &Name<T>) -> Self {
        Self {
            inner: Arc::clone(&name.inner),
        }
    }
}

impl<T: Value> From<Name<T>> for NameRef {
    fn from(name: Name<T>) -> Self {
        Self { inner: name.inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_not_label() {
        let a: Name<u32> = Name::named("x");
        let b: Name<u32> = Name::named("x");
        assert_ne!(a, b);
        assert_ne!(NameRef::from(&a), NameRef::from(&b));
    }

    #[test]
    fn test_clone_shares_identity() {
        let a: Name<String> = Name::named("x");
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_erased_ref_keeps_type() {
        let a: Name<String> = Name::named("greeting");
        let r = NameRef::from(&a);
        assert_eq!(r.label(), "greeting");
        assert_eq!(r.value_type_id(), TypeId::of::<String>());
    }
}
