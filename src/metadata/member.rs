//! Data member descriptors.
//!
//! A [`Member`] binds a name to one field of its owner type. It remembers the field's type (as a
//! [`TypeRecord`] into the catalog), its size and offset, and keeps a typed accessor that can read
//! and write the field given an instance. The accessor is a [`Field`]: a pair of plain projection
//! functions, usually produced by [`crate::field!`].
//!
//! Fields can be accessed statically typed ([`Member::get`], [`Member::get_mut`],
//! [`Member::set`]) or fully erased through [`Any`] ([`Member::get_value`],
//! [`Member::set_value`]).

use std::{
    any::type_name,
    fmt,
    sync::OnceLock,
};

use crate::{
    any::{Any, Storable},
    metadata::typesystem::{Catalog, Reflect, TypeData, TypeIndex, TypeRecord},
    Error::BadCast,
    Result,
};

/// Typed projection from an owner `O` to one of its fields `F`
///
/// # Examples
///
/// ```rust
/// use metascope::Field;
///
/// struct Rect { width: u32, height: u32 }
///
/// let width = Field::new(|r: &Rect| &r.width, |r: &mut Rect| &mut r.width);
/// let mut rect = Rect { width: 3, height: 4 };
/// *width.get_mut(&mut rect) = 5;
/// assert_eq!(*width.get(&rect), 5);
/// assert_eq!(rect.height, 4);
/// ```
pub struct Field<O, F> {
    get: fn(&O) -> &F,
    get_mut: fn(&mut O) -> &mut F,
    offset: Option<usize>,
}

impl<O, F> Field<O, F> {
    /// Creates a field accessor from a shared and an exclusive projection
    #[must_use]
    pub fn new(get: fn(&O) -> &F, get_mut: fn(&mut O) -> &mut F) -> Self {
        Field {
            get,
            get_mut,
            offset: None,
        }
    }

    /// Records the byte offset of the field within `O`
    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Reads the field
    pub fn get<'a>(&self, instance: &'a O) -> &'a F {
        (self.get)(instance)
    }

    /// Borrows the field mutably
    pub fn get_mut<'a>(&self, instance: &'a mut O) -> &'a mut F {
        (self.get_mut)(instance)
    }

    /// The recorded byte offset
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }
}

/// Erased access to a [`Field`]
trait MemberAccess: Send + Sync {
    fn as_any(&self) -> &dyn std::any::Any;
    fn field_type_name(&self) -> &'static str;
    fn read(&self, instance: &Any) -> Result<Any>;
    fn write(&self, instance: &mut Any, value: &Any) -> Result<()>;
}

impl<O: 'static, F: Storable> MemberAccess for Field<O, F> {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn field_type_name(&self) -> &'static str {
        type_name::<F>()
    }

    fn read(&self, instance: &Any) -> Result<Any> {
        let owner = instance.cast::<O>()?;
        Ok(Any::new(self.get(owner).clone()))
    }

    fn write(&self, instance: &mut Any, value: &Any) -> Result<()> {
        let value = value.cast::<F>()?.clone();
        let owner = instance.cast_mut::<O>()?;
        *self.get_mut(owner) = value;
        Ok(())
    }
}

/// A named data member of a registered type
pub struct Member {
    name: String,
    owner: OnceLock<TypeIndex>,
    record: TypeRecord,
    size: usize,
    offset: Option<usize>,
    access: Box<dyn MemberAccess>,
}

impl Member {
    /// Creates a member from a field accessor
    ///
    /// The field type is resolved through [`Reflect`], which registers it if needed.
    pub fn new<O: 'static, F: Reflect + Storable>(name: impl Into<String>, field: Field<O, F>) -> Self {
        Member {
            name: name.into(),
            owner: OnceLock::new(),
            record: F::type_record(),
            size: std::mem::size_of::<F>(),
            offset: field.offset,
            access: Box::new(field),
        }
    }

    /// Name of the member
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The member's type as written in the owner's definition
    #[must_use]
    pub fn type_record(&self) -> TypeRecord {
        self.record
    }

    /// The de-qualified descriptor of the member's type
    ///
    /// # Errors
    /// Returns an error if the member type is not in the catalog.
    pub fn type_data(&self) -> Result<&'static TypeData> {
        self.record.type_data()
    }

    /// Byte size of the member's type
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Byte offset within the owner, if recorded
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Index of the owning type, `None` until the owner is committed
    #[must_use]
    pub fn owner_index(&self) -> Option<TypeIndex> {
        self.owner.get().copied()
    }

    /// The owning type in the global catalog
    #[must_use]
    pub fn owner(&self) -> Option<&'static TypeData> {
        self.owner_index()
            .and_then(|index| Catalog::global().get_by_index(index).ok())
    }

    pub(crate) fn set_owner(&self, index: TypeIndex) {
        let _ = self.owner.set(index);
    }

    /// Reads the field of a typed instance
    ///
    /// # Errors
    /// Returns [`crate::Error::BadCast`] if the member does not belong to `O` or is not an `F`.
    pub fn get<'a, O: 'static, F: 'static>(&self, instance: &'a O) -> Result<&'a F> {
        Ok(self.field::<O, F>()?.get(instance))
    }

    /// Borrows the field of a typed instance mutably
    ///
    /// # Errors
    /// Returns [`crate::Error::BadCast`] if the member does not belong to `O` or is not an `F`.
    pub fn get_mut<'a, O: 'static, F: 'static>(&self, instance: &'a mut O) -> Result<&'a mut F> {
        Ok(self.field::<O, F>()?.get_mut(instance))
    }

    /// Overwrites the field of a typed instance
    ///
    /// # Errors
    /// Returns [`crate::Error::BadCast`] if the member does not belong to `O` or is not an `F`.
    pub fn set<O: 'static, F: 'static>(&self, instance: &mut O, value: F) -> Result<()> {
        *self.get_mut::<O, F>(instance)? = value;
        Ok(())
    }

    /// Reads a copy of the field from an erased instance
    ///
    /// # Errors
    /// Returns [`crate::Error::EmptyAccess`] for an empty instance and [`crate::Error::BadCast`]
    /// if it does not hold the owner type.
    pub fn get_value(&self, instance: &Any) -> Result<Any> {
        self.access.read(instance)
    }

    /// Overwrites the field of an erased instance
    ///
    /// # Errors
    /// Returns [`crate::Error::EmptyAccess`] or [`crate::Error::BadCast`] if `instance` does not
    /// hold the owner type or `value` does not hold the field type.
    pub fn set_value(&self, instance: &mut Any, value: &Any) -> Result<()> {
        self.access.write(instance, value)
    }

    fn field<O: 'static, F: 'static>(&self) -> Result<&Field<O, F>> {
        self.access
            .as_any()
            .downcast_ref::<Field<O, F>>()
            .ok_or(BadCast {
                expected: type_name::<F>(),
                found: self.access.field_type_name(),
            })
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.record, self.name)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("record", &self.record)
            .field("size", &self.size)
            .field("offset", &self.offset)
            .field("owner", &self.owner_index())
            .finish()
    }
}
