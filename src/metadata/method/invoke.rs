//! The dynamic invocation bridge.
//!
//! [`invoke`] calls a registered [`Method`] with an erased receiver and erased arguments. The
//! call is checked in this order:
//!
//! 1. the number of arguments must equal the registered arity
//! 2. the receiver must hold the owner type (ignored for static methods)
//! 3. every argument must hold exactly its declared parameter type
//!
//! The checked values are then handed to the original, statically typed callable. A non-unit
//! result comes back wrapped in a fresh [`Any`]; a unit result as an empty one.

use crate::{
    any::Any,
    metadata::method::Method,
    Error::{BadCast, EmptyAccess, MismatchedArguments},
    Result,
};

/// The receiver of a dynamic call
pub enum Receiver<'a> {
    /// An instance inside an [`Any`]
    Erased(&'a mut Any),
    /// A borrowed, concretely typed instance
    Typed {
        /// The instance
        value: &'a mut dyn std::any::Any,
        /// Name of the instance type, for diagnostics
        type_name: &'static str,
    },
    /// No receiver, for associated functions
    Absent,
}

impl<'a> Receiver<'a> {
    /// Wraps a typed instance
    pub fn typed<O: 'static>(value: &'a mut O) -> Self {
        Receiver::Typed {
            value,
            type_name: std::any::type_name::<O>(),
        }
    }

    /// Recovers the instance as an `O`
    ///
    /// # Errors
    /// Returns [`crate::Error::EmptyAccess`] for an absent receiver or an empty [`Any`] and
    /// [`crate::Error::BadCast`] if the instance is not an `O`.
    pub fn get<O: 'static>(self) -> Result<&'a mut O> {
        match self {
            Receiver::Erased(value) => value.cast_mut::<O>(),
            Receiver::Typed { value, type_name } => {
                value.downcast_mut::<O>().ok_or(BadCast {
                    expected: std::any::type_name::<O>(),
                    found: type_name,
                })
            }
            Receiver::Absent => Err(EmptyAccess),
        }
    }
}

/// Calls `method` on the instance held by `receiver`
///
/// # Errors
/// Returns [`crate::Error::MismatchedArguments`] if `args` does not match the arity,
/// [`crate::Error::EmptyAccess`] or [`crate::Error::BadCast`] if the receiver or an argument does
/// not hold the declared type.
///
/// # Examples
///
/// ```rust
/// use metascope::{invoke, meta_declare_external, Any, Storable};
///
/// #[derive(Clone)]
/// struct Scale(f32);
///
/// impl Storable for Scale {}
///
/// meta_declare_external!(Scale => |t| t.method("apply", |s: &Scale, x: f32| s.0 * x));
///
/// let apply = metascope::get::<Scale>().method("apply")?;
/// let mut scale = Any::new(Scale(2.5));
/// let result = invoke(apply, &mut scale, &[Any::new(4.0f32)])?;
/// assert_eq!(*result.cast::<f32>()?, 10.0);
/// # Ok::<(), metascope::Error>(())
/// ```
pub fn invoke(method: &Method, receiver: &mut Any, args: &[Any]) -> Result<Any> {
    dispatch(method, Receiver::Erased(receiver), args)
}

pub(crate) fn dispatch(method: &Method, receiver: Receiver<'_>, args: &[Any]) -> Result<Any> {
    if args.len() != method.arity() {
        return Err(MismatchedArguments {
            method: method.name().to_string(),
            expected: method.arity(),
            found: args.len(),
        });
    }

    tracing::trace!(method = method.name(), arity = args.len(), "invoking method");
    (method.invoker)(receiver, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{any::Storable, Error};

    #[derive(Clone, Debug, PartialEq)]
    struct Tally {
        total: i64,
    }

    impl Storable for Tally {}

    #[test]
    fn test_receiver_variants() {
        let mut erased = Any::new(Tally { total: 1 });
        assert_eq!(Receiver::Erased(&mut erased).get::<Tally>().unwrap().total, 1);

        let mut typed = Tally { total: 2 };
        assert_eq!(Receiver::typed(&mut typed).get::<Tally>().unwrap().total, 2);
        assert!(matches!(
            Receiver::typed(&mut typed).get::<i64>(),
            Err(Error::BadCast { expected: "i64", .. })
        ));

        assert_eq!(Receiver::Absent.get::<Tally>().unwrap_err(), Error::EmptyAccess);
    }

    #[test]
    fn test_invoke_checks_arity_first() {
        let add = Method::from_method::<Tally, _, _>("add", |t: &mut Tally, by: i64| t.total += by);
        let mut receiver = Any::new(3.0f64);

        assert_eq!(
            invoke(&add, &mut receiver, &[]).unwrap_err(),
            Error::MismatchedArguments {
                method: "add".to_string(),
                expected: 1,
                found: 0
            }
        );
        assert!(matches!(
            invoke(&add, &mut receiver, &[Any::new(1i64)]),
            Err(Error::BadCast { .. })
        ));
    }

    #[test]
    fn test_invoke_mutates_receiver() {
        let add = Method::from_method::<Tally, _, _>("add", |t: &mut Tally, by: i64| t.total += by);
        let mut receiver = Any::new(Tally { total: 10 });

        let result = invoke(&add, &mut receiver, &[Any::new(5i64)]).unwrap();
        assert!(result.is_empty());
        assert_eq!(receiver.cast::<Tally>().unwrap().total, 15);

        assert!(matches!(
            invoke(&add, &mut receiver, &[Any::new(5i32)]),
            Err(Error::BadCast { expected: "i64", found: "i32" })
        ));
    }
}
