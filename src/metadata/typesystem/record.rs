//! Qualified type references as they appear in signatures.
//!
//! A [`TypeRecord`] pairs the de-qualified descriptor of a parameter, return value or member with
//! the way it is passed: by value, by reference or through a raw pointer. `*const f32` and `f32`
//! share one [`crate::TypeData`] and differ only in their [`Qualifier`].

use std::fmt;

use crate::{
    metadata::typesystem::{Catalog, TypeData, TypeIndex},
    Error::TypeNotFound,
    Result,
};

/// How a type is qualified at its point of use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum Qualifier {
    /// No type at all, the unit return
    Void,
    /// Passed by value
    Value,
    /// Exclusive reference, `&mut T`
    Reference,
    /// Shared reference, `&T`
    ConstReference,
    /// Mutable raw pointer, `*mut T`
    Pointer,
    /// Const raw pointer, `*const T`
    ConstPointer,
}

impl Qualifier {
    /// Signature prefix of this qualifier
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Qualifier::Void | Qualifier::Value => "",
            Qualifier::Reference => "&mut ",
            Qualifier::ConstReference => "&",
            Qualifier::Pointer => "*mut ",
            Qualifier::ConstPointer => "*const ",
        }
    }
}

/// The type of a parameter, return value or member as written in a signature
///
/// The index, when present, names the de-qualified descriptor in the global [`Catalog`].
///
/// # Examples
///
/// ```rust
/// use metascope::{Qualifier, Reflect};
///
/// let record = <*const f32 as Reflect>::type_record();
/// assert_eq!(record.qualifier, Qualifier::ConstPointer);
/// assert_eq!(record.to_string(), "*const f32");
/// assert_eq!(<() as Reflect>::type_record().to_string(), "void");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRecord {
    /// Index of the de-qualified type, `None` for void
    pub ty: Option<TypeIndex>,
    /// How the type is passed
    pub qualifier: Qualifier,
}

impl TypeRecord {
    /// The record of a unit return
    pub const VOID: TypeRecord = TypeRecord {
        ty: None,
        qualifier: Qualifier::Void,
    };

    /// Creates a record for `index` with the given qualifier
    #[must_use]
    pub fn new(index: TypeIndex, qualifier: Qualifier) -> Self {
        TypeRecord {
            ty: Some(index),
            qualifier,
        }
    }

    /// Creates a by-value record for `index`
    #[must_use]
    pub fn value(index: TypeIndex) -> Self {
        TypeRecord::new(index, Qualifier::Value)
    }

    /// Returns `true` for the unit record
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.qualifier == Qualifier::Void
    }

    /// Resolves the de-qualified descriptor in the global catalog
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] for the void record and
    /// [`crate::Error::IndexNotFound`] if the index is not in the catalog.
    pub fn type_data(&self) -> Result<&'static TypeData> {
        match self.ty {
            Some(index) => Catalog::global().get_by_index(index),
            None => Err(TypeNotFound("void".to_string())),
        }
    }
}

impl fmt::Display for TypeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_void() {
            return write!(f, "void");
        }

        match self.type_data() {
            Ok(data) => write!(f, "{}{}", self.qualifier.prefix(), data.name()),
            Err(_) => write!(f, "{}<unknown>", self.qualifier.prefix()),
        }
    }
}
