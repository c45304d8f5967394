use thiserror::Error;

use crate::metadata::typesystem::TypeIndex;

macro_rules! registration_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Registration {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Registration {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every failure is local and synchronous: it is reported to the immediate caller and nothing
/// is retried. Errors raised while a type registers itself are programmer errors; the holder
/// layer turns them into a panic at the first use of the offending type.
///
/// # Error Categories
///
/// ## Value Container Errors
/// - [`Error::BadCast`] - The held value has a different concrete type than requested
/// - [`Error::EmptyAccess`] - A value was requested from an empty container
///
/// ## Lookup Errors
/// - [`Error::TypeNotFound`] - No descriptor with the given name
/// - [`Error::IndexNotFound`] - No descriptor at the given catalog index
/// - [`Error::MemberNotFound`] - The type has no member with the given name
/// - [`Error::MethodNotFound`] - The type has no method with the given name
///
/// ## Invocation Errors
/// - [`Error::RangeError`] - A parameter index outside `[0, arity)`
/// - [`Error::MismatchedArguments`] - Wrong number of arguments for a method
///
/// ## Registration Errors
/// - [`Error::CapacityExceeded`] - The catalog is full
/// - [`Error::DuplicateType`], [`Error::DuplicateMember`], [`Error::DuplicateMethod`]
/// - [`Error::TypeSealed`] - The descriptor no longer accepts members or methods
/// - [`Error::IncompleteType`] - An earlier registration of the type never finished
/// - [`Error::AlreadyConfigured`] - The global catalog exists already
/// - [`Error::Registration`] - Any other inconsistency detected during registration
///
/// # Examples
///
/// ```rust
/// use metascope::{Any, Error};
///
/// let value = Any::new(4.0f32);
/// match value.cast::<i32>() {
///     Err(Error::BadCast { expected, found }) => {
///         assert_eq!(expected, "i32");
///         assert_eq!(found, "f32");
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Value container errors
    /// The concrete type held by an [`crate::Any`] does not match the requested type.
    ///
    /// Casts are exact: no numeric conversion and no upcast is attempted. The same error is
    /// produced when an invocation argument does not match the declared parameter type.
    #[error("Bad cast - expected `{expected}`, found `{found}`")]
    BadCast {
        /// Name of the type that was requested
        expected: &'static str,
        /// Name of the type that is actually held
        found: &'static str,
    },

    /// A value was requested from an empty [`crate::Any`].
    #[error("Attempted to access the value of an empty container")]
    EmptyAccess,

    // Lookup errors
    /// No type with this name has been registered.
    #[error("Failed to find type in catalog - {0}")]
    TypeNotFound(String),

    /// No type is stored at this catalog index.
    #[error("Failed to find type at catalog index - {0}")]
    IndexNotFound(TypeIndex),

    /// The type has no member with the requested name.
    #[error("Type `{type_name}` has no member `{member}`")]
    MemberNotFound {
        /// Name of the searched type
        type_name: String,
        /// The requested member name
        member: String,
    },

    /// The type has no method with the requested name.
    #[error("Type `{type_name}` has no method `{method}`")]
    MethodNotFound {
        /// Name of the searched type
        type_name: String,
        /// The requested method name
        method: String,
    },

    // Invocation errors
    /// A positional index outside of `[0, len)`.
    #[error("Index {index} out of range - valid range is [0, {len})")]
    RangeError {
        /// The rejected index
        index: usize,
        /// The number of valid positions
        len: usize,
    },

    /// A method was invoked with the wrong number of arguments.
    #[error("Method `{method}` expects {expected} argument(s), {found} given")]
    MismatchedArguments {
        /// Name of the invoked method
        method: String,
        /// The registered arity
        expected: usize,
        /// The number of arguments passed
        found: usize,
    },

    // Registration errors
    /// The catalog reached its fixed capacity.
    ///
    /// Growing the catalog is not an option: descriptors handed out earlier must stay valid,
    /// so the capacity is chosen up front through [`crate::CatalogConfig`].
    #[error("Catalog capacity of {0} types exceeded")]
    CapacityExceeded(usize),

    /// A type with this name is already registered.
    #[error("Type `{0}` is already registered")]
    DuplicateType(String),

    /// The type already has a member with this name.
    #[error("Type `{type_name}` already has a member `{member}`")]
    DuplicateMember {
        /// Name of the owning type
        type_name: String,
        /// The duplicated member name
        member: String,
    },

    /// The type already has a method with this name.
    #[error("Type `{type_name}` already has a method `{method}`")]
    DuplicateMethod {
        /// Name of the owning type
        type_name: String,
        /// The duplicated method name
        method: String,
    },

    /// The descriptor has finished registration and no longer accepts members or methods.
    #[error("Type `{0}` is sealed")]
    TypeSealed(String),

    /// An earlier registration of the type failed or was abandoned before sealing.
    #[error("Registration of type `{0}` did not complete")]
    IncompleteType(String),

    /// The global catalog has already been created, its configuration can no longer change.
    #[error("The global catalog is already initialized")]
    AlreadyConfigured,

    /// A registration step found an inconsistency.
    ///
    /// The error includes the source location where the problem was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the problem
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Registration - {file}:{line}: {message}")]
    Registration {
        /// The message to be printed for the Registration error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },
}
