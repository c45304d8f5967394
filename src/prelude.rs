//! # metascope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the metascope library. Import this module to get quick access to the essential
//! types for registering, inspecting and invoking reflected types.
//!
//! The registration macros ([`crate::field!`], [`crate::meta_declare!`], [`crate::meta_define!`],
//! [`crate::meta_declare_external!`]) live at the crate root and are imported from there.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all metascope operations
pub use crate::Error;

/// The result type used throughout metascope
pub use crate::Result;

/// Configuration of the global catalog
pub use crate::CatalogConfig;

// ================================================================================================
// Type-Erased Values
// ================================================================================================

/// The type-erased value container
pub use crate::Any;

/// Storage selection for values held by [`Any`]
pub use crate::{Storable, StorageKind};

// ================================================================================================
// Type System
// ================================================================================================

/// Type descriptors and their identity
pub use crate::{TypeData, TypeIndex, TypeKind};

/// Qualified type references used in signatures
pub use crate::{Qualifier, TypeRecord};

/// The process-wide type catalog
pub use crate::Catalog;

/// Registration-time assembler for a descriptor
pub use crate::TypeBuilder;

/// Static holder, dynamic accessor and instance lookup
pub use crate::{Object, Reflect, TypeOf};

/// Descriptor lookup functions
pub use crate::{get, get_by_index, get_by_name, get_of, register};

// ================================================================================================
// Members and Methods
// ================================================================================================

/// Data member descriptors and field accessors
pub use crate::{Field, Member};

/// Method descriptors and their shape
pub use crate::{Method, MethodFlags};

/// Dynamic invocation
pub use crate::{invoke, Receiver};
