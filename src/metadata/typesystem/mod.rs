//! Runtime type descriptors and the traits that reach them.
//!
//! Every reflectable type is described by exactly one [`TypeData`] living in the global
//! [`Catalog`]. Descriptors are created lazily: the first call to [`get`] (or any other path that
//! needs the descriptor) runs the type's registration, commits the result and caches it. From
//! then on lookups are lock-free reads.
//!
//! # Key Components
//!
//! - [`TypeData`] - name, size, kind, members and methods of one type
//! - [`Catalog`] - the append-only, fixed-capacity store of all descriptors
//! - [`TypeBuilder`] - assembles a descriptor during registration
//! - [`Reflect`] - the static holder, "give me the descriptor of `T`"
//! - [`Object`] - the dynamic accessor, "give me the descriptor of this instance"
//! - [`TypeOf`] - lookup through whichever of the two a type provides
//!
//! # Resolution order
//!
//! Given an instance, [`get_of`] goes through [`TypeOf`]. Types declared with
//! [`crate::meta_declare!`] forward to their [`Object::get_type`] accessor, so a `dyn Object`
//! reports the descriptor of its concrete type. All other types answer with their static
//! [`Reflect::type_data`]. Which of the two applies is fixed by the generated impl; there is no
//! runtime switch.
//!
//! # Lifetime
//!
//! Descriptors, and the members and methods they own, are never removed or moved. Every lookup
//! therefore hands out `&'static TypeData`.
//!
//! # Examples
//!
//! ```rust
//! use metascope::{get, get_by_name, TypeKind};
//!
//! let int = get::<i32>();
//! assert_eq!(int.name(), "i32");
//! assert_eq!(int.size(), 4);
//! assert_eq!(int.kind(), TypeKind::Primitive);
//! assert!(std::ptr::eq(int, get_by_name("i32")?));
//! # Ok::<(), metascope::Error>(())
//! ```

mod builder;
mod holder;
mod primitives;
mod record;
mod registry;

use std::{
    any::TypeId,
    fmt,
    sync::atomic::{AtomicU8, Ordering},
};

pub use builder::TypeBuilder;
pub use holder::{external, intrusive};
pub use record::{Qualifier, TypeRecord};
pub use registry::Catalog;

use crate::{
    metadata::{member::Member, method::Method},
    Error::{DuplicateMember, DuplicateMethod, MemberNotFound, MethodNotFound, TypeSealed},
    Result,
};

/// Permanent position of a descriptor in its [`Catalog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIndex(u32);

impl TypeIndex {
    /// Index of a descriptor that has not been committed to a catalog yet
    pub const DETACHED: TypeIndex = TypeIndex(u32::MAX);

    /// Creates an index from a catalog position
    ///
    /// # Errors
    /// Returns [`crate::Error::Registration`] if the position does not fit an index.
    pub fn new(position: usize) -> Result<Self> {
        match u32::try_from(position) {
            Ok(value) if value != u32::MAX => Ok(TypeIndex(value)),
            _ => Err(registration_error!("Catalog position {} exceeds the index range", position)),
        }
    }

    /// The catalog position
    #[must_use]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` for [`TypeIndex::DETACHED`]
    #[must_use]
    pub fn is_detached(self) -> bool {
        self == TypeIndex::DETACHED
    }
}

impl fmt::Display for TypeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_detached() {
            write!(f, "detached")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// What kind of type a descriptor describes, and how it got registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum TypeKind {
    /// The unit type
    Void,
    /// A built-in scalar or string type
    Primitive,
    /// A type with an intrusive [`Object`] accessor
    Class,
    /// A type registered without touching its definition
    External,
    /// A bare named entry with no Rust type behind it
    Opaque,
}

const OPEN: u8 = 0;
const SEALED: u8 = 1;
const FAILED: u8 = 2;

/// The runtime descriptor of one type
///
/// Identity (index, name, size, kind) is fixed once the descriptor is committed. Members and
/// methods are appended while the type registers and the descriptor is sealed afterwards. A
/// registration that ends without sealing leaves the descriptor failed for good.
pub struct TypeData {
    index: TypeIndex,
    name: String,
    size: usize,
    kind: TypeKind,
    type_id: Option<TypeId>,
    members: boxcar::Vec<Member>,
    methods: boxcar::Vec<Method>,
    state: AtomicU8,
}

impl TypeData {
    /// Creates a bare [`TypeKind::Opaque`] descriptor with no Rust type behind it
    #[must_use]
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        TypeData {
            index: TypeIndex::DETACHED,
            name: name.into(),
            size,
            kind: TypeKind::Opaque,
            type_id: None,
            members: boxcar::Vec::new(),
            methods: boxcar::Vec::new(),
            state: AtomicU8::new(OPEN),
        }
    }

    /// Creates a descriptor for the Rust type `T`
    ///
    /// The size is taken from `T` and the descriptor is keyed by `T`'s [`TypeId`] once committed.
    #[must_use]
    pub fn of<T: 'static>(name: impl Into<String>, kind: TypeKind) -> Self {
        TypeData {
            kind,
            size: std::mem::size_of::<T>(),
            type_id: Some(TypeId::of::<T>()),
            ..TypeData::new(name, 0)
        }
    }

    /// Position of this descriptor in the catalog
    #[must_use]
    pub fn index(&self) -> TypeIndex {
        self.index
    }

    /// Unique name of the type
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte size of the type
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Kind of the type
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// [`TypeId`] of the described Rust type, `None` for opaque descriptors
    #[must_use]
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    /// Returns `true` if this descriptor describes the Rust type `T`
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == Some(TypeId::of::<T>())
    }

    /// Returns `true` once registration finished
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.state.load(Ordering::Acquire) == SEALED
    }

    /// Returns `true` if registration ended without sealing the descriptor
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state.load(Ordering::Acquire) == FAILED
    }

    fn is_open(&self) -> bool {
        self.state.load(Ordering::Acquire) == OPEN
    }

    /// Members in registration order
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().map(|(_, member)| member)
    }

    /// Methods in registration order
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().map(|(_, method)| method)
    }

    /// Number of members
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.count()
    }

    /// Number of methods
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.count()
    }

    /// Finds a member by name
    ///
    /// # Errors
    /// Returns [`crate::Error::MemberNotFound`] if no member has this name.
    pub fn member(&self, name: &str) -> Result<&Member> {
        self.members()
            .find(|member| member.name() == name)
            .ok_or_else(|| MemberNotFound {
                type_name: self.name.clone(),
                member: name.to_string(),
            })
    }

    /// Finds a method by name
    ///
    /// # Errors
    /// Returns [`crate::Error::MethodNotFound`] if no method has this name.
    pub fn method(&self, name: &str) -> Result<&Method> {
        self.methods()
            .find(|method| method.name() == name)
            .ok_or_else(|| MethodNotFound {
                type_name: self.name.clone(),
                method: name.to_string(),
            })
    }

    /// Appends a member
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeSealed`] once the descriptor is sealed or failed and
    /// [`crate::Error::DuplicateMember`] if a member with the same name exists.
    pub fn add_member(&self, member: Member) -> Result<()> {
        if !self.is_open() {
            return Err(TypeSealed(self.name.clone()));
        }

        if self.members().any(|existing| existing.name() == member.name()) {
            tracing::warn!(type_name = %self.name, member = member.name(), "rejected duplicate member");
            return Err(DuplicateMember {
                type_name: self.name.clone(),
                member: member.name().to_string(),
            });
        }

        if !self.index.is_detached() {
            member.set_owner(self.index);
        }
        self.members.push(member);
        Ok(())
    }

    /// Appends a method
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeSealed`] once the descriptor is sealed or failed and
    /// [`crate::Error::DuplicateMethod`] if a method with the same name exists.
    pub fn add_method(&self, method: Method) -> Result<()> {
        if !self.is_open() {
            return Err(TypeSealed(self.name.clone()));
        }

        if self.methods().any(|existing| existing.name() == method.name()) {
            tracing::warn!(type_name = %self.name, method = method.name(), "rejected duplicate method");
            return Err(DuplicateMethod {
                type_name: self.name.clone(),
                method: method.name().to_string(),
            });
        }

        if !self.index.is_detached() {
            method.set_owner(self.index);
        }
        self.methods.push(method);
        Ok(())
    }

    /// Marks registration as finished, later appends fail with [`crate::Error::TypeSealed`]
    ///
    /// Has no effect on a failed descriptor.
    pub fn seal(&self) {
        if self.transition(SEALED) {
            tracing::debug!(
                type_name = %self.name,
                index = %self.index,
                members = self.member_count(),
                methods = self.method_count(),
                "sealed type"
            );
        }
    }

    /// Marks registration as abandoned; the descriptor stays unusable
    pub(crate) fn fail(&self) {
        if self.transition(FAILED) {
            tracing::warn!(
                type_name = %self.name,
                index = %self.index,
                "registration did not complete"
            );
        }
    }

    fn transition(&self, state: u8) -> bool {
        self.state
            .compare_exchange(OPEN, state, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Points the owner of every member and method at this descriptor's index
    fn adopt(&self) {
        for member in self.members() {
            member.set_owner(self.index);
        }
        for method in self.methods() {
            method.set_owner(self.index);
        }
    }
}

impl fmt::Display for TypeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Debug for TypeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeData")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("size", &self.size)
            .field("kind", &self.kind)
            .field("members", &self.member_count())
            .field("methods", &self.method_count())
            .field("sealed", &self.is_sealed())
            .field("failed", &self.is_failed())
            .finish()
    }
}

/// Static access to the descriptor of a type
///
/// Implemented by [`crate::meta_define!`] and [`crate::meta_declare_external!`], and by this
/// crate for the primitives, raw pointers, `&'static T`, `Vec<T>` and `Option<T>`. The first call
/// registers the type.
///
/// # Panics
///
/// Registration errors (a duplicate name, a full catalog, a duplicate member) are programmer
/// errors and panic at the first use of the offending type.
pub trait Reflect: 'static {
    /// The de-qualified descriptor of this type
    fn type_data() -> &'static TypeData;

    /// This type as it appears in a signature
    fn type_record() -> TypeRecord {
        TypeRecord::value(Self::type_data().index())
    }
}

/// The dynamic type accessor of an intrusively declared type
///
/// Generated by [`crate::meta_declare!`]. A `dyn Object` reports the descriptor of its concrete
/// type, which makes it the entry point for reflection on values whose static type is unknown.
pub trait Object: std::any::Any {
    /// The descriptor of the concrete type of `self`
    fn get_type(&self) -> &'static TypeData;

    /// Upcast for downcasting to the concrete type
    fn as_any(&self) -> &dyn std::any::Any;

    /// Mutable upcast for downcasting to the concrete type
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

/// Descriptor lookup from an instance
///
/// Intrusive types forward to [`Object::get_type`], everything else to [`Reflect::type_data`].
pub trait TypeOf {
    /// The descriptor describing `self`
    fn type_of(&self) -> &'static TypeData;
}

impl TypeOf for dyn Object {
    fn type_of(&self) -> &'static TypeData {
        self.get_type()
    }
}

impl<T: TypeOf + ?Sized> TypeOf for &T {
    fn type_of(&self) -> &'static TypeData {
        (**self).type_of()
    }
}

impl<T: TypeOf + ?Sized> TypeOf for &mut T {
    fn type_of(&self) -> &'static TypeData {
        (**self).type_of()
    }
}

impl<T: TypeOf + ?Sized> TypeOf for Box<T> {
    fn type_of(&self) -> &'static TypeData {
        (**self).type_of()
    }
}

/// Returns the descriptor of `T`, registering it on first use
#[must_use]
pub fn get<T: Reflect + ?Sized>() -> &'static TypeData {
    T::type_data()
}

/// Returns the descriptor of `value`, preferring its dynamic accessor
#[must_use]
pub fn get_of<T: TypeOf + ?Sized>(value: &T) -> &'static TypeData {
    value.type_of()
}

/// Looks up a registered type by its exact name
///
/// Only types that have registered already are found; [`register`] forces registration.
///
/// # Errors
/// Returns [`crate::Error::TypeNotFound`] if no registered type has this name.
pub fn get_by_name(name: &str) -> Result<&'static TypeData> {
    Catalog::global().get_by_name(name)
}

/// Looks up a registered type by its catalog index
///
/// # Errors
/// Returns [`crate::Error::IndexNotFound`] if the index is not in use.
pub fn get_by_index(index: TypeIndex) -> Result<&'static TypeData> {
    Catalog::global().get_by_index(index)
}

/// Registers `T` now so that name lookups find it
pub fn register<T: Reflect + ?Sized>() -> &'static TypeData {
    T::type_data()
}
