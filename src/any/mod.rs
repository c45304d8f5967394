//! Type-erased value container.
//!
//! [`Any`] holds one value of an arbitrary [`Storable`] type behind a uniform interface. It is the
//! currency of the dynamic layer: method arguments, receivers and return values all travel as
//! `Any`. Unlike [`std::any::Any`] it owns its value, can be cloned, reset and reassigned, and
//! stores small primitive values without allocating.
//!
//! # Casting
//!
//! [`Any::cast`] only succeeds for the exact type that was stored. There is no numeric
//! conversion (an `Any` holding `f32` does not cast to `f64`) and no upcast.
//!
//! # Examples
//!
//! ```rust
//! use metascope::{Any, Error};
//!
//! let mut value = Any::new(42i32);
//! assert_eq!(*value.cast::<i32>()?, 42);
//! assert!(matches!(value.cast::<i64>(), Err(Error::BadCast { .. })));
//!
//! value.assign(String::from("hello"));
//! assert_eq!(value.cast::<String>()?, "hello");
//!
//! value.reset();
//! assert!(value.is_empty());
//! assert_eq!(value.cast::<String>(), Err(Error::EmptyAccess));
//! # Ok::<(), metascope::Error>(())
//! ```

mod policy;

use std::{
    any::{type_name, TypeId},
    fmt,
    mem::{self, ManuallyDrop},
};

pub use policy::{Storable, StorageKind};

use crate::{
    Error::{BadCast, EmptyAccess},
    Result,
};
use policy::{AnyPolicy, Slot};

/// A type-erased, owning value container.
///
/// The container pairs a storage policy with a word-sized slot. The policy fully determines the
/// slot's layout and ownership: cloning goes through the policy's clone, dropping through its
/// destructor. A default-constructed container uses the empty policy and reports
/// [`Any::is_empty`].
pub struct Any {
    policy: &'static dyn AnyPolicy,
    slot: Slot,
}

impl Any {
    /// Creates an empty container.
    #[must_use]
    pub fn empty() -> Self {
        Any {
            policy: policy::empty_policy(),
            slot: Slot::uninit(),
        }
    }

    /// Creates a container holding `value`.
    ///
    /// Storing `()` produces an empty container.
    pub fn new<T: Storable>(value: T) -> Self {
        let (policy, slot) = policy::store(value);
        Any { policy, slot }
    }

    /// Replaces the held value with `value`.
    pub fn assign<T: Storable>(&mut self, value: T) -> &mut Self {
        self.reset();
        let (policy, slot) = policy::store(value);
        self.policy = policy;
        self.slot = slot;
        self
    }

    /// Replaces the held value with a clone of the value held by `other`.
    pub fn assign_from(&mut self, other: &Any) -> &mut Self {
        self.reset();
        // SAFETY: `other.slot` was filled by `other.policy`
        self.slot = unsafe { other.policy.clone_slot(&other.slot) };
        self.policy = other.policy;
        self
    }

    /// Drops the held value and returns the container to the empty state.
    pub fn reset(&mut self) {
        // SAFETY: `self.slot` was filled by `self.policy`
        unsafe { self.policy.drop_slot(&mut self.slot) };
        self.policy = policy::empty_policy();
    }

    /// Exchanges the contents of two containers without copying the held values.
    pub fn swap(&mut self, other: &mut Any) -> &mut Self {
        mem::swap(&mut self.policy, &mut other.policy);
        mem::swap(&mut self.slot, &mut other.slot);
        self
    }

    /// Moves the contents out of this container, leaving it empty.
    #[must_use]
    pub fn take(&mut self) -> Any {
        mem::take(self)
    }

    /// Returns `true` if the container holds no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policy.storage() == StorageKind::Void
    }

    /// Returns `true` if the container holds a value of type `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        !self.is_empty() && self.policy.type_id() == TypeId::of::<T>()
    }

    /// Returns `true` if both containers hold values of the same type.
    #[must_use]
    pub fn compatible(&self, other: &Any) -> bool {
        self.policy.type_id() == other.policy.type_id()
    }

    /// Name of the held type, `"<empty>"` for an empty container.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.policy.type_name()
    }

    /// Byte size of the held type, `0` for an empty container.
    #[must_use]
    pub fn size(&self) -> usize {
        self.policy.size()
    }

    /// How the held value is stored.
    #[must_use]
    pub fn storage(&self) -> StorageKind {
        self.policy.storage()
    }

    /// Returns a reference to the held value.
    ///
    /// # Errors
    /// Returns [`crate::Error::EmptyAccess`] if the container is empty and
    /// [`crate::Error::BadCast`] if it holds a value of a different type than `T`.
    pub fn cast<T: 'static>(&self) -> Result<&T> {
        self.check::<T>()?;
        // SAFETY: the policy describes a `T` stored in `self.slot`
        Ok(unsafe { &*self.policy.value_ptr(&self.slot).cast::<T>() })
    }

    /// Returns a mutable reference to the held value.
    ///
    /// # Errors
    /// Returns [`crate::Error::EmptyAccess`] if the container is empty and
    /// [`crate::Error::BadCast`] if it holds a value of a different type than `T`.
    pub fn cast_mut<T: 'static>(&mut self) -> Result<&mut T> {
        self.check::<T>()?;
        // SAFETY: the policy describes a `T` stored in `self.slot`
        Ok(unsafe { &mut *self.policy.value_ptr_mut(&mut self.slot).cast::<T>() })
    }

    /// Consumes the container and returns the held value.
    ///
    /// # Errors
    /// Returns [`crate::Error::EmptyAccess`] if the container is empty and
    /// [`crate::Error::BadCast`] if it holds a value of a different type than `T`. The
    /// container is dropped in both cases.
    pub fn into_value<T: 'static>(self) -> Result<T> {
        self.check::<T>()?;

        let mut this = ManuallyDrop::new(self);
        // SAFETY: the policy describes a `T` stored in the slot; the value is read exactly once
        // and the storage is released without running its destructor afterwards
        unsafe {
            let value = this
                .policy
                .value_ptr(&this.slot)
                .cast::<T>()
                .read();
            let policy = this.policy;
            policy.forget_slot(&mut this.slot);
            Ok(value)
        }
    }

    fn check<T: 'static>(&self) -> Result<()> {
        if self.is_empty() {
            return Err(EmptyAccess);
        }

        if self.policy.type_id() != TypeId::of::<T>() {
            return Err(BadCast {
                expected: type_name::<T>(),
                found: self.policy.type_name(),
            });
        }

        Ok(())
    }
}

impl Default for Any {
    fn default() -> Self {
        Any::empty()
    }
}

impl Clone for Any {
    fn clone(&self) -> Self {
        Any {
            policy: self.policy,
            // SAFETY: `self.slot` was filled by `self.policy`
            slot: unsafe { self.policy.clone_slot(&self.slot) },
        }
    }
}

impl Drop for Any {
    fn drop(&mut self) {
        // SAFETY: `self.slot` was filled by `self.policy`
        unsafe { self.policy.drop_slot(&mut self.slot) };
    }
}

impl fmt::Debug for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Any({})", self.type_name())
    }
}
