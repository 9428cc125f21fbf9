//! Core value types for the rill dataflow engine.
//!
//! The engine moves values of arbitrary user types between nodes. At the API
//! surface everything is statically typed ([`Node`](crate::node::Node)
//! implementations name their argument and output types), but internally the
//! scheduler is type-erased: every value travels as an [`AnyValue`] and is
//! downcast back at the node boundary. Build-time validation guarantees the
//! downcasts succeed.
//!
//! # Key Types
//!
//! - [`Value`]: the blanket marker trait every graph value must satisfy
//! - [`AnyValue`]: the erased, cheaply-cloneable value handle

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Marker trait for types that can flow through a graph.
///
/// Blanket-implemented: any `'static` type that is `Clone + Debug + Send +
/// Sync` qualifies. `Clone` lets the engine hand owned values to nodes while
/// retaining them for diagnostics; `Debug` is what failure messages use to
/// render argument values.
pub trait Value: Any + Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> Value for T where T: Any + Clone + fmt::Debug + Send + Sync + 'static {}

/// Object-safe shim that keeps `Debug` available after erasure.
trait DynValue: fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Value> DynValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A type-erased graph value.
///
/// `AnyValue` is an `Arc` handle: cloning is cheap and the contained value is
/// shared. The `Debug` implementation renders the underlying value, so
/// diagnostics show `"petter"` rather than an opaque wrapper.
///
/// # Examples
///
/// ```
/// use rill::types::AnyValue;
///
/// let v = AnyValue::new("hello".to_string());
/// assert_eq!(v.downcast::<String>().as_deref(), Some("hello"));
/// assert!(v.downcast::<u32>().is_none());
/// assert_eq!(format!("{v:?}"), "\"hello\"");
/// ```
#[derive(Clone)]
pub struct AnyValue {
    value: Arc<dyn DynValue>,
    type_name: &'static str,
}

impl AnyValue {
    /// Erase a typed value.
    pub fn new<T: Value>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Recover the typed value, cloning it out of the shared handle.
    ///
    /// Returns `None` when `T` is not the contained type.
    pub fn downcast<T: Value>(&self) -> Option<T> {
        self.value.as_any().downcast_ref::<T>().cloned()
    }

    /// `true` when the contained value is a `T`.
    pub fn is<T: Value>(&self) -> bool {
        self.value.as_any().is::<T>()
    }

    /// Human-readable name of the contained type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn value_type_id(&self) -> TypeId {
        self.value.as_any().type_id()
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.value, f)
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn fresh_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identity of a node declaration. Identity, not structure, is what the
/// memo table and the diagnostics view key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct DeclId(u64);

impl DeclId {
    pub(crate) fn fresh() -> Self {
        Self(fresh_id())
    }

    pub(crate) fn raw(self) -> u64 {
        self.0
    }
}

/// Identity of an input slot. Two names with equal labels but separate
/// identities are distinct slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NameId(u64);

impl NameId {
    pub(crate) fn fresh() -> Self {
        Self(fresh_id())
    }

    pub(crate) fn raw(self) -> u64 {
        self.0
    }
}

/// Identity of a constant binding occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ConstId(u64);

impl ConstId {
    pub(crate) fn fresh() -> Self {
        Self(fresh_id())
    }

    pub(crate) fn raw(self) -> u64 {
        self.0
    }
}
