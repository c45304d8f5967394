//! Static signatures of registrable callables.
//!
//! A method is registered from a plain Rust callable. Its parameter list is captured as a tuple
//! type implementing [`ParamList`], which carries one [`TypeRecord`] producer per position in an
//! associated `const` table and knows how to pull a typed tuple back out of a slice of [`Any`].
//!
//! [`IntoMethod`] and [`IntoStaticMethod`] are implemented for every `Fn` of up to eight
//! parameters. The `Marker` type parameter records the receiver kind, the return type and the
//! parameter tuple, which keeps the implementations for `Fn(&O, ..)`, `Fn(&mut O, ..)` and
//! `Fn(..)` apart.

use crate::{
    any::{Any, Storable},
    metadata::{
        method::{MethodFlags, Receiver},
        typesystem::{Reflect, TypeRecord},
    },
    utils::short_type_name,
    Error::RangeError,
    Result,
};

/// The erased body of a method
#[doc(hidden)]
pub type Invoker = Box<dyn for<'a> Fn(Receiver<'a>, &[Any]) -> Result<Any> + Send + Sync>;

fn invoker<F>(body: F) -> Invoker
where
    F: for<'a, 'b> Fn(Receiver<'a>, &'b [Any]) -> Result<Any> + Send + Sync + 'static,
{
    Box::new(body)
}

/// Receiver marker for methods taking `&self`
pub struct ByRef;

/// Receiver marker for methods taking `&mut self`
pub struct ByMut;

/// Marker for associated functions without receiver
pub struct NoReceiver;

/// A tuple of parameter types
pub trait ParamList: Sized + 'static {
    /// One record producer per position
    const RECORDS: &'static [fn() -> TypeRecord];
    /// One type name producer per position
    const NAMES: &'static [fn() -> &'static str];
    /// Number of parameters
    const ARITY: usize = Self::RECORDS.len();

    /// Casts and clones every argument into its declared type
    ///
    /// # Errors
    /// Returns [`crate::Error::BadCast`] or [`crate::Error::EmptyAccess`] for the first argument
    /// that does not hold its parameter type, and [`crate::Error::RangeError`] if `args` is
    /// shorter than the list.
    fn extract(args: &[Any]) -> Result<Self>;
}

/// A callable taking `&O` or `&mut O` first
pub trait IntoMethod<O, Marker>: Send + Sync + Sized + 'static {
    /// The parameters after the receiver
    type Params: ParamList;
    /// The return type
    type Output: Reflect + Storable;
    /// [`MethodFlags::CONST`] or [`MethodFlags::MUT`]
    const RECEIVER: MethodFlags;

    /// Erases the callable
    #[doc(hidden)]
    fn into_invoker(self) -> Invoker;
}

/// A callable without receiver
pub trait IntoStaticMethod<Marker>: Send + Sync + Sized + 'static {
    /// The parameters
    type Params: ParamList;
    /// The return type
    type Output: Reflect + Storable;

    /// Erases the callable
    #[doc(hidden)]
    fn into_invoker(self) -> Invoker;
}

fn argument<A: Storable>(args: &[Any], index: usize) -> Result<A> {
    match args.get(index) {
        Some(value) => value.cast::<A>().cloned(),
        None => Err(RangeError {
            index,
            len: args.len(),
        }),
    }
}

macro_rules! signatures {
    ($($param:ident $index:tt),*) => {
        impl<$($param: Reflect + Storable),*> ParamList for ($($param,)*) {
            const RECORDS: &'static [fn() -> TypeRecord] = &[$(<$param as Reflect>::type_record),*];
            const NAMES: &'static [fn() -> &'static str] = &[$(short_type_name::<$param>),*];

            #[allow(unused_variables)]
            fn extract(args: &[Any]) -> Result<Self> {
                Ok(($(argument::<$param>(args, $index)?,)*))
            }
        }

        impl<O, Func, R, $($param),*> IntoMethod<O, (ByRef, R, ($($param,)*))> for Func
        where
            O: 'static,
            Func: Fn(&O, $($param),*) -> R + Send + Sync + 'static,
            R: Reflect + Storable,
            $($param: Reflect + Storable,)*
        {
            type Params = ($($param,)*);
            type Output = R;
            const RECEIVER: MethodFlags = MethodFlags::CONST;

            #[allow(non_snake_case)]
            fn into_invoker(self) -> Invoker {
                invoker(move |receiver, args| {
                    let this: &O = receiver.get::<O>()?;
                    let ($($param,)*) = <($($param,)*) as ParamList>::extract(args)?;
                    Ok(Any::new(self(this, $($param),*)))
                })
            }
        }

        impl<O, Func, R, $($param),*> IntoMethod<O, (ByMut, R, ($($param,)*))> for Func
        where
            O: 'static,
            Func: Fn(&mut O, $($param),*) -> R + Send + Sync + 'static,
            R: Reflect + Storable,
            $($param: Reflect + Storable,)*
        {
            type Params = ($($param,)*);
            type Output = R;
            const RECEIVER: MethodFlags = MethodFlags::MUT;

            #[allow(non_snake_case)]
            fn into_invoker(self) -> Invoker {
                invoker(move |receiver, args| {
                    let this = receiver.get::<O>()?;
                    let ($($param,)*) = <($($param,)*) as ParamList>::extract(args)?;
                    Ok(Any::new(self(this, $($param),*)))
                })
            }
        }

        impl<Func, R, $($param),*> IntoStaticMethod<(NoReceiver, R, ($($param,)*))> for Func
        where
            Func: Fn($($param),*) -> R + Send + Sync + 'static,
            R: Reflect + Storable,
            $($param: Reflect + Storable,)*
        {
            type Params = ($($param,)*);
            type Output = R;

            #[allow(non_snake_case)]
            fn into_invoker(self) -> Invoker {
                invoker(move |_receiver, args| {
                    let ($($param,)*) = <($($param,)*) as ParamList>::extract(args)?;
                    Ok(Any::new(self($($param),*)))
                })
            }
        }
    };
}

signatures!();
signatures!(A0 0);
signatures!(A0 0, A1 1);
signatures!(A0 0, A1 1, A2 2);
signatures!(A0 0, A1 1, A2 2, A3 3);
signatures!(A0 0, A1 1, A2 2, A3 3, A4 4);
signatures!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5);
signatures!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6);
signatures!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata::typesystem::Qualifier, Error};

    #[test]
    fn test_param_records() {
        type Params = (i32, f32, *const u8);
        assert_eq!(<Params as ParamList>::ARITY, 3);

        let records: Vec<TypeRecord> = Params::RECORDS.iter().map(|record| record()).collect();
        assert_eq!(records[0], <i32 as Reflect>::type_record());
        assert_eq!(records[1], <f32 as Reflect>::type_record());
        assert_eq!(records[2].qualifier, Qualifier::ConstPointer);

        let names: Vec<&str> = Params::NAMES.iter().map(|name| name()).collect();
        assert_eq!(names, ["i32", "f32", "*const u8"]);
    }

    #[test]
    fn test_empty_params() {
        assert_eq!(<() as ParamList>::ARITY, 0);
        assert!(<() as ParamList>::RECORDS.is_empty());
        assert!(<() as ParamList>::extract(&[]).is_ok());
    }

    #[test]
    fn test_extract() {
        let args = [Any::new(3i32), Any::new(String::from("three"))];
        let (number, text) = <(i32, String)>::extract(&args).unwrap();
        assert_eq!(number, 3);
        assert_eq!(text, "three");

        let swapped = [Any::new(String::from("three")), Any::new(3i32)];
        assert!(matches!(
            <(i32, String)>::extract(&swapped),
            Err(Error::BadCast { expected: "i32", .. })
        ));

        assert_eq!(
            <(i32, String)>::extract(&args[..1]).unwrap_err(),
            Error::RangeError { index: 1, len: 1 }
        );
    }
}
