//! Storage policies for [`crate::Any`].
//!
//! Every concrete type stored in an [`crate::Any`] is described by exactly one policy object. The
//! policy knows how to clone, drop and locate a value of that type inside the container's slot.
//! Which policy a type gets is decided at compile time through [`Storable::STORAGE`]:
//!
//! - [`StorageKind::Inline`] - the value lives directly in the pointer-sized slot, no allocation
//! - [`StorageKind::Heap`] - the slot holds a pointer to a boxed value
//! - [`StorageKind::Void`] - nothing is stored, the container stays empty
//!
//! Policy objects are process-wide singletons: the first use of a type creates its policy,
//! every later use gets the same `&'static` instance back.

use std::{
    any::{type_name, TypeId},
    marker::PhantomData,
    mem::{self, MaybeUninit},
    sync::OnceLock,
};

use dashmap::DashMap;

/// How a [`Storable`] type is laid out inside an [`crate::Any`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum StorageKind {
    /// Nothing is stored; used for `()` so that a unit value produces an empty container
    Void,
    /// The value is written into the container's own word-sized slot
    Inline,
    /// The value is boxed and the slot holds the pointer
    Heap,
}

/// A type that can be held by an [`crate::Any`].
///
/// The associated constant selects the storage policy. It defaults to [`StorageKind::Heap`],
/// which is correct for every type; [`StorageKind::Inline`] is only accepted for values that
/// fit into one pointer-sized, pointer-aligned word (checked at compile time).
///
/// # Examples
///
/// ```rust
/// use metascope::{Any, Storable, StorageKind};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Point { x: f64, y: f64 }
///
/// impl Storable for Point {}
///
/// let value = Any::new(Point { x: 1.0, y: 2.0 });
/// assert_eq!(value.storage(), StorageKind::Heap);
/// assert_eq!(value.cast::<Point>()?, &Point { x: 1.0, y: 2.0 });
/// # Ok::<(), metascope::Error>(())
/// ```
pub trait Storable: Clone + 'static {
    /// The storage policy for this type
    const STORAGE: StorageKind = StorageKind::Heap;
}

macro_rules! inline_storage {
    ($($t:ty),* $(,)?) => {
        $(
            impl Storable for $t {
                const STORAGE: StorageKind = StorageKind::Inline;
            }
        )*
    };
}

macro_rules! heap_storage {
    ($($t:ty),* $(,)?) => {
        $(
            impl Storable for $t {}
        )*
    };
}

inline_storage!(bool, char, i8, u8, i16, u16, i32, u32, isize, usize, f32);

#[cfg(target_pointer_width = "64")]
inline_storage!(i64, u64, f64);

#[cfg(not(target_pointer_width = "64"))]
heap_storage!(i64, u64, f64);

heap_storage!(i128, u128, String);

impl Storable for () {
    const STORAGE: StorageKind = StorageKind::Void;
}

/// Thin pointers and references go inline, fat ones (`&str`, `*const [T]`) need a box.
const fn pointer_storage<P>() -> StorageKind {
    if mem::size_of::<P>() <= mem::size_of::<*mut ()>() {
        StorageKind::Inline
    } else {
        StorageKind::Heap
    }
}

impl<T: ?Sized + 'static> Storable for *const T {
    const STORAGE: StorageKind = pointer_storage::<*const T>();
}

impl<T: ?Sized + 'static> Storable for *mut T {
    const STORAGE: StorageKind = pointer_storage::<*mut T>();
}

impl<T: ?Sized + 'static> Storable for &'static T {
    const STORAGE: StorageKind = pointer_storage::<&'static T>();
}

impl<T: Storable> Storable for Vec<T> {}

impl<T: Storable> Storable for Option<T> {}

/// The word-sized storage cell of an [`crate::Any`].
///
/// Depending on the policy it holds an inline value, a pointer to a boxed value, or nothing.
pub(crate) struct Slot(MaybeUninit<*mut ()>);

impl Slot {
    pub(crate) const fn uninit() -> Self {
        Slot(MaybeUninit::uninit())
    }
}

/// Type-specific operations on a [`Slot`].
///
/// All `unsafe` methods require that the slot was filled by this very policy (through
/// [`store`] or [`AnyPolicy::clone_slot`]) and has not been dropped or forgotten since.
pub(crate) trait AnyPolicy: Send + Sync {
    /// `TypeId` of the held type, used for exact-type casts
    fn type_id(&self) -> TypeId;
    /// Name of the held type
    fn type_name(&self) -> &'static str;
    /// Byte size of the held type
    fn size(&self) -> usize;
    /// Storage strategy of this policy
    fn storage(&self) -> StorageKind;
    /// Drops the held value; the slot is uninitialized afterwards
    unsafe fn drop_slot(&self, slot: &mut Slot);
    /// Releases the storage without running the value's destructor
    unsafe fn forget_slot(&self, slot: &mut Slot);
    /// Produces a new slot holding a clone of the value in `src`
    unsafe fn clone_slot(&self, src: &Slot) -> Slot;
    /// Address of the held value
    unsafe fn value_ptr(&self, slot: &Slot) -> *const ();
    /// Mutable address of the held value
    unsafe fn value_ptr_mut(&self, slot: &mut Slot) -> *mut ();
}

/// Policy of a default-constructed or reset container.
struct EmptyPolicy;

static EMPTY_POLICY: EmptyPolicy = EmptyPolicy;

impl AnyPolicy for EmptyPolicy {
    fn type_id(&self) -> TypeId {
        TypeId::of::<EmptyPolicy>()
    }

    fn type_name(&self) -> &'static str {
        "<empty>"
    }

    fn size(&self) -> usize {
        0
    }

    fn storage(&self) -> StorageKind {
        StorageKind::Void
    }

    unsafe fn drop_slot(&self, _slot: &mut Slot) {}

    unsafe fn forget_slot(&self, _slot: &mut Slot) {}

    unsafe fn clone_slot(&self, _src: &Slot) -> Slot {
        Slot::uninit()
    }

    unsafe fn value_ptr(&self, _slot: &Slot) -> *const () {
        std::ptr::null()
    }

    unsafe fn value_ptr_mut(&self, _slot: &mut Slot) -> *mut () {
        std::ptr::null_mut()
    }
}

/// Policy for small values written directly into the slot.
struct InlinePolicy<T>(PhantomData<fn() -> T>);

impl<T: Storable> InlinePolicy<T> {
    /// Caller must have checked that `T` fits the slot, see [`storage_of`]
    unsafe fn write(slot: &mut Slot, value: T) {
        slot.0.as_mut_ptr().cast::<T>().write(value);
    }
}

impl<T: Storable> AnyPolicy for InlinePolicy<T> {
    fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn size(&self) -> usize {
        mem::size_of::<T>()
    }

    fn storage(&self) -> StorageKind {
        StorageKind::Inline
    }

    unsafe fn drop_slot(&self, slot: &mut Slot) {
        slot.0.as_mut_ptr().cast::<T>().drop_in_place();
    }

    unsafe fn forget_slot(&self, _slot: &mut Slot) {}

    unsafe fn clone_slot(&self, src: &Slot) -> Slot {
        let value = (*src.0.as_ptr().cast::<T>()).clone();
        let mut slot = Slot::uninit();
        Self::write(&mut slot, value);
        slot
    }

    unsafe fn value_ptr(&self, slot: &Slot) -> *const () {
        slot.0.as_ptr().cast::<()>()
    }

    unsafe fn value_ptr_mut(&self, slot: &mut Slot) -> *mut () {
        slot.0.as_mut_ptr().cast::<()>()
    }
}

/// Policy for values that live in their own heap allocation.
struct HeapPolicy<T>(PhantomData<fn() -> T>);

impl<T: Storable> HeapPolicy<T> {
    fn write(slot: &mut Slot, value: T) {
        slot.0 = MaybeUninit::new(Box::into_raw(Box::new(value)).cast::<()>());
    }
}

impl<T: Storable> AnyPolicy for HeapPolicy<T> {
    fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn size(&self) -> usize {
        mem::size_of::<T>()
    }

    fn storage(&self) -> StorageKind {
        StorageKind::Heap
    }

    unsafe fn drop_slot(&self, slot: &mut Slot) {
        drop(Box::from_raw(slot.0.assume_init().cast::<T>()));
        slot.0 = MaybeUninit::uninit();
    }

    unsafe fn forget_slot(&self, slot: &mut Slot) {
        drop(Box::from_raw(
            slot.0.assume_init().cast::<mem::ManuallyDrop<T>>(),
        ));
        slot.0 = MaybeUninit::uninit();
    }

    unsafe fn clone_slot(&self, src: &Slot) -> Slot {
        let value = (*src.0.assume_init().cast::<T>()).clone();
        let mut slot = Slot::uninit();
        Self::write(&mut slot, value);
        slot
    }

    unsafe fn value_ptr(&self, slot: &Slot) -> *const () {
        slot.0.assume_init().cast_const()
    }

    unsafe fn value_ptr_mut(&self, slot: &mut Slot) -> *mut () {
        slot.0.assume_init()
    }
}

/// Validated [`Storable::STORAGE`] of `T`.
struct Layout<T>(PhantomData<fn() -> T>);

impl<T: Storable> Layout<T> {
    const STORAGE: StorageKind = match T::STORAGE {
        StorageKind::Inline => {
            assert!(
                mem::size_of::<T>() <= mem::size_of::<Slot>()
                    && mem::align_of::<T>() <= mem::align_of::<Slot>(),
                "inline storage requires a value that fits into one pointer-sized word"
            );
            StorageKind::Inline
        }
        other => other,
    };
}

/// Storage of `T`; declaring `Inline` for a type that does not fit fails to compile.
pub(crate) const fn storage_of<T: Storable>() -> StorageKind {
    Layout::<T>::STORAGE
}

/// Process-wide policy singletons, one per concrete type.
static POLICIES: OnceLock<DashMap<TypeId, &'static dyn AnyPolicy>> = OnceLock::new();

/// The policy shared by all empty containers.
pub(crate) fn empty_policy() -> &'static dyn AnyPolicy {
    &EMPTY_POLICY
}

/// Returns the policy singleton for `T`, creating it on first use.
pub(crate) fn policy_of<T: Storable>() -> &'static dyn AnyPolicy {
    if storage_of::<T>() == StorageKind::Void {
        return empty_policy();
    }

    let policies = POLICIES.get_or_init(DashMap::new);
    if let Some(policy) = policies.get(&TypeId::of::<T>()) {
        return *policy.value();
    }

    *policies
        .entry(TypeId::of::<T>())
        .or_insert_with(|| {
            tracing::trace!(
                type_name = type_name::<T>(),
                storage = %storage_of::<T>(),
                "creating storage policy"
            );
            let policy: &'static dyn AnyPolicy = match storage_of::<T>() {
                StorageKind::Inline => Box::leak(Box::new(InlinePolicy::<T>(PhantomData))),
                StorageKind::Heap => Box::leak(Box::new(HeapPolicy::<T>(PhantomData))),
                StorageKind::Void => empty_policy(),
            };
            policy
        })
        .value()
}

/// Moves `value` into a fresh slot according to its policy.
pub(crate) fn store<T: Storable>(value: T) -> (&'static dyn AnyPolicy, Slot) {
    let policy = policy_of::<T>();
    let mut slot = Slot::uninit();
    match storage_of::<T>() {
        // SAFETY: storage_of only reports Inline for values that fit the slot
        StorageKind::Inline => unsafe { InlinePolicy::<T>::write(&mut slot, value) },
        StorageKind::Heap => HeapPolicy::<T>::write(&mut slot, value),
        StorageKind::Void => drop(value),
    }
    (policy, slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_selection() {
        assert_eq!(<i32 as Storable>::STORAGE, StorageKind::Inline);
        assert_eq!(<f32 as Storable>::STORAGE, StorageKind::Inline);
        assert_eq!(<bool as Storable>::STORAGE, StorageKind::Inline);
        assert_eq!(<*const String as Storable>::STORAGE, StorageKind::Inline);
        assert_eq!(<&'static u64 as Storable>::STORAGE, StorageKind::Inline);
        assert_eq!(<&'static str as Storable>::STORAGE, StorageKind::Heap);
        assert_eq!(<String as Storable>::STORAGE, StorageKind::Heap);
        assert_eq!(<Vec<u8> as Storable>::STORAGE, StorageKind::Heap);
        assert_eq!(<() as Storable>::STORAGE, StorageKind::Void);
    }

    #[test]
    fn test_policy_singleton() {
        let first = policy_of::<u16>();
        let second = policy_of::<u16>();
        assert!(std::ptr::addr_eq(first, second));
        assert_eq!(first.type_id(), TypeId::of::<u16>());
        assert_eq!(first.size(), 2);

        let other = policy_of::<i16>();
        assert!(!std::ptr::addr_eq(first, other));
    }

    #[test]
    fn test_unit_uses_empty_policy() {
        let policy = policy_of::<()>();
        assert!(std::ptr::addr_eq(policy, empty_policy()));
        assert_eq!(policy.storage(), StorageKind::Void);
    }

    #[test]
    fn test_heap_store_and_clone() {
        let (policy, slot) = store(String::from("metascope"));
        assert_eq!(policy.storage(), StorageKind::Heap);

        unsafe {
            let mut copy = policy.clone_slot(&slot);
            let original = &*policy.value_ptr(&slot).cast::<String>();
            let cloned = &*policy.value_ptr(&copy).cast::<String>();
            assert_eq!(original, cloned);
            assert_ne!(policy.value_ptr(&slot), policy.value_ptr(&copy));

            policy.drop_slot(&mut copy);
            let mut slot = slot;
            policy.drop_slot(&mut slot);
        }
    }
}
