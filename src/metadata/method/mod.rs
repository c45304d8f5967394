//! Method descriptors.
//!
//! A [`Method`] binds a name to a registered callable. Everything about its signature (arity,
//! return record, parameter records, receiver kind) is derived once from the callable's static
//! type when the method is created and never recomputed. The callable itself is kept with its
//! original types behind an erased invoker, so a dynamic call checks the erased arguments and then
//! performs an ordinary, statically typed call.
//!
//! # Key Components
//!
//! - [`Method`] - the descriptor
//! - [`MethodFlags`] - receiver kind and return presence
//! - [`IntoMethod`], [`IntoStaticMethod`], [`ParamList`] - what can be registered
//! - [`invoke()`] and [`Receiver`] - the dynamic call
//!
//! # Examples
//!
//! ```rust
//! use metascope::{Any, Method, MethodFlags};
//!
//! let max = Method::from_static("max", |a: i32, b: i32| a.max(b));
//! assert_eq!(max.arity(), 2);
//! assert_eq!(max.flags(), MethodFlags::STATIC | MethodFlags::RETURNS);
//! assert_eq!(max.to_string(), "i32 max(i32, i32)");
//!
//! let result = max.call_static(&[Any::new(3), Any::new(7)])?;
//! assert_eq!(*result.cast::<i32>()?, 7);
//! # Ok::<(), metascope::Error>(())
//! ```

mod invoke;
mod signature;

use std::{fmt, sync::OnceLock};

use bitflags::bitflags;

pub use invoke::{invoke, Receiver};
pub use signature::{ByMut, ByRef, IntoMethod, IntoStaticMethod, NoReceiver, ParamList};

use crate::{
    any::Any,
    metadata::typesystem::{Catalog, Object, Reflect, TypeData, TypeIndex, TypeRecord},
    utils::JumpTable,
    Result,
};
use signature::Invoker;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Shape of a registered callable
    pub struct MethodFlags: u8 {
        /// Takes `&self`
        const CONST = 0x01;
        /// Takes `&mut self`
        const MUT = 0x02;
        /// Takes no receiver
        const STATIC = 0x04;
        /// Returns a non-unit value
        const RETURNS = 0x08;
    }
}

/// A named, invocable method of a registered type
pub struct Method {
    name: String,
    owner: OnceLock<TypeIndex>,
    flags: MethodFlags,
    return_type: TypeRecord,
    params: Box<[TypeRecord]>,
    records: JumpTable<TypeRecord>,
    names: JumpTable<&'static str>,
    invoker: Invoker,
}

impl Method {
    /// Creates a method from a callable taking `&O` or `&mut O` first
    pub fn from_method<O, F, M>(name: impl Into<String>, method: F) -> Self
    where
        O: 'static,
        F: IntoMethod<O, M>,
    {
        Method::assemble::<F::Params, F::Output>(name.into(), F::RECEIVER, method.into_invoker())
    }

    /// Creates a method from a callable without receiver
    pub fn from_static<F, M>(name: impl Into<String>, method: F) -> Self
    where
        F: IntoStaticMethod<M>,
    {
        Method::assemble::<F::Params, F::Output>(
            name.into(),
            MethodFlags::STATIC,
            method.into_invoker(),
        )
    }

    fn assemble<P: ParamList, R: Reflect>(
        name: String,
        receiver: MethodFlags,
        invoker: Invoker,
    ) -> Self {
        let return_type = R::type_record();
        let mut flags = receiver;
        if !return_type.is_void() {
            flags |= MethodFlags::RETURNS;
        }

        let (records, names) = if P::ARITY == 0 {
            (JumpTable::EMPTY, JumpTable::EMPTY)
        } else {
            (JumpTable::new(P::RECORDS), JumpTable::new(P::NAMES))
        };

        Method {
            name,
            owner: OnceLock::new(),
            flags,
            return_type,
            params: records.iter().collect(),
            records,
            names,
            invoker,
        }
    }

    /// Name of the method
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Receiver kind and return presence
    #[must_use]
    pub fn flags(&self) -> MethodFlags {
        self.flags
    }

    /// Returns `true` for `&self` methods
    #[must_use]
    pub fn is_const(&self) -> bool {
        self.flags.contains(MethodFlags::CONST)
    }

    /// Returns `true` for associated functions without receiver
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    /// Returns `true` if the method returns a non-unit value
    #[must_use]
    pub fn returns_value(&self) -> bool {
        self.flags.contains(MethodFlags::RETURNS)
    }

    /// Number of parameters, the receiver not included
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// The return type, [`TypeRecord::VOID`] for unit
    #[must_use]
    pub fn return_type(&self) -> TypeRecord {
        self.return_type
    }

    /// All parameter records in order
    #[must_use]
    pub fn params(&self) -> &[TypeRecord] {
        &self.params
    }

    /// The record of parameter `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::RangeError`] if `index` is not in `[0, arity)`. A method without
    /// parameters rejects every index.
    pub fn param_type(&self, index: usize) -> Result<TypeRecord> {
        self.records.call(index)
    }

    /// The Rust type name of parameter `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::RangeError`] if `index` is not in `[0, arity)`.
    pub fn param_type_name(&self, index: usize) -> Result<&'static str> {
        self.names.call(index)
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

    /// Calls the method on the instance held by `receiver`
    ///
    /// See [`invoke()`].
    ///
    /// # Errors
    /// Returns [`crate::Error::MismatchedArguments`], [`crate::Error::EmptyAccess`] or
    /// [`crate::Error::BadCast`] if the call does not match the signature.
    pub fn invoke(&self, receiver: &mut Any, args: &[Any]) -> Result<Any> {
        invoke::dispatch(self, Receiver::Erased(receiver), args)
    }

    /// Calls the method on a typed instance
    ///
    /// # Errors
    /// Returns [`crate::Error::MismatchedArguments`] or [`crate::Error::BadCast`] if the call
    /// does not match the signature.
    pub fn invoke_on<O: 'static>(&self, receiver: &mut O, args: &[Any]) -> Result<Any> {
        invoke::dispatch(self, Receiver::typed(receiver), args)
    }

    /// Calls the method on an instance known only through its dynamic accessor
    ///
    /// # Errors
    /// Returns [`crate::Error::MismatchedArguments`] or [`crate::Error::BadCast`] if the call
    /// does not match the signature.
    pub fn invoke_object(&self, receiver: &mut dyn Object, args: &[Any]) -> Result<Any> {
        let type_name = receiver.get_type().name();
        let receiver = Receiver::Typed {
            value: receiver.as_any_mut(),
            type_name,
        };
        invoke::dispatch(self, receiver, args)
    }

    /// Calls an associated function
    ///
    /// # Errors
    /// Returns [`crate::Error::MismatchedArguments`] or [`crate::Error::BadCast`] if the call
    /// does not match the signature, and [`crate::Error::EmptyAccess`] if the method needs a
    /// receiver.
    pub fn call_static(&self, args: &[Any]) -> Result<Any> {
        invoke::dispatch(self, Receiver::Absent, args)
    }

    /// Calls the method with an explicit receiver
    ///
    /// # Errors
    /// See [`Method::invoke`].
    pub fn invoke_with(&self, receiver: Receiver<'_>, args: &[Any]) -> Result<Any> {
        invoke::dispatch(self, receiver, args)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (position, param) in self.params.iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("return_type", &self.return_type)
            .field("params", &self.params)
            .field("owner", &self.owner_index())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{any::Storable, metadata::typesystem::Qualifier, Error};

    #[derive(Clone, Default)]
    struct Gauge {
        level: f64,
    }

    impl Storable for Gauge {}

    impl Gauge {
        fn level(&self) -> f64 {
            self.level
        }

        fn fill(&mut self, amount: f64, times: u8) {
            self.level += amount * f64::from(times);
        }
    }

    #[test]
    fn test_flags() {
        let level = Method::from_method::<Gauge, _, _>("level", Gauge::level);
        assert!(level.is_const());
        assert!(level.returns_value());
        assert!(!level.is_static());

        let fill = Method::from_method::<Gauge, _, _>("fill", Gauge::fill);
        assert_eq!(fill.flags(), MethodFlags::MUT);
        assert!(!fill.returns_value());
        assert_eq!(fill.return_type(), TypeRecord::VOID);

        let make = Method::from_static("make", || 1u8);
        assert_eq!(make.flags(), MethodFlags::STATIC | MethodFlags::RETURNS);
    }

    #[test]
    fn test_param_types() {
        let fill = Method::from_method::<Gauge, _, _>("fill", Gauge::fill);
        assert_eq!(fill.arity(), 2);
        assert_eq!(fill.param_type(0).unwrap(), <f64 as Reflect>::type_record());
        assert_eq!(fill.param_type(1).unwrap(), <u8 as Reflect>::type_record());
        assert_eq!(fill.params(), &[fill.param_type(0).unwrap(), fill.param_type(1).unwrap()]);
        assert_eq!(
            fill.param_type(2).unwrap_err(),
            Error::RangeError { index: 2, len: 2 }
        );
        assert_eq!(fill.param_type_name(1).unwrap(), "u8");
        assert_eq!(fill.to_string(), "void fill(f64, u8)");
    }

    #[test]
    fn test_zero_arity_rejects_every_index() {
        let level = Method::from_method::<Gauge, _, _>("level", Gauge::level);
        assert_eq!(level.arity(), 0);
        assert!(level.params().is_empty());
        assert_eq!(
            level.param_type(0).unwrap_err(),
            Error::RangeError { index: 0, len: 0 }
        );
        assert!(level.param_type_name(0).is_err());
    }

    #[test]
    fn test_pointer_params() {
        let peek = Method::from_static("peek", |pointer: *const u32| pointer.is_null());
        assert_eq!(peek.param_type(0).unwrap().qualifier, Qualifier::ConstPointer);
        assert_eq!(peek.to_string(), "bool peek(*const u32)");
        let result = peek.call_static(&[Any::new(std::ptr::null::<u32>())]).unwrap();
        assert!(*result.cast::<bool>().unwrap());
    }

    #[test]
    fn test_invoke_on_typed_receiver() {
        let fill = Method::from_method::<Gauge, _, _>("fill", Gauge::fill);
        let mut gauge = Gauge::default();
        fill.invoke_on(&mut gauge, &[Any::new(1.5f64), Any::new(2u8)])
            .unwrap();
        assert_eq!(gauge.level, 3.0);

        let mut wrong = 0u8;
        assert!(matches!(
            fill.invoke_on(&mut wrong, &[Any::new(1.5f64), Any::new(2u8)]),
            Err(Error::BadCast { found: "u8", .. })
        ));
    }

    #[test]
    fn test_call_static_needs_no_receiver() {
        let level = Method::from_method::<Gauge, _, _>("level", Gauge::level);
        assert_eq!(level.call_static(&[]).unwrap_err(), Error::EmptyAccess);

        let make = Method::from_static("make", |level: f64| level * 2.0);
        let mut ignored = Any::new(String::from("unused"));
        let result = make.invoke(&mut ignored, &[Any::new(4.0f64)]).unwrap();
        assert_eq!(*result.cast::<f64>().unwrap(), 8.0);
        assert_eq!(
            make.call_static(&[]).unwrap_err(),
            Error::MismatchedArguments {
                method: "make".to_string(),
                expected: 1,
                found: 0
            }
        );
    }
}
