//! Built-in descriptors.
//!
//! The scalar types, `String` and the unit type are committed when a catalog is created (unless
//! [`crate::CatalogConfig::register_primitives`] is off, in which case they register on first
//! use like any other type). Raw pointers and `&'static T` share the descriptor of their pointee
//! and only change the qualifier of their [`TypeRecord`]. `Vec<T>` and `Option<T>` register on
//! demand under a name built from their element type, e.g. `Vec<String>`.

use crate::{
    metadata::typesystem::{
        external, Catalog, Qualifier, Reflect, TypeData, TypeKind, TypeOf, TypeRecord,
    },
    Result,
};

macro_rules! primitives {
    ($($t:ty => $name:literal),* $(,)?) => {
        $(
            impl Reflect for $t {
                fn type_data() -> &'static TypeData {
                    external::<$t>(|| $name.to_string(), TypeKind::Primitive, |t| t)
                }
            }

            impl TypeOf for $t {
                fn type_of(&self) -> &'static TypeData {
                    <$t as Reflect>::type_data()
                }
            }
        )*

        /// Commits `void` and every primitive descriptor into `catalog`
        pub(crate) fn initialize(catalog: &Catalog) -> Result<()> {
            catalog.add_type(TypeData::of::<()>("void", TypeKind::Void))?;
            $(
                catalog.add_type(TypeData::of::<$t>($name, TypeKind::Primitive))?;
            )*
            Ok(())
        }
    };
}

primitives! {
    bool => "bool",
    char => "char",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    i128 => "i128",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    u128 => "u128",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
    String => "String",
}

impl Reflect for () {
    fn type_data() -> &'static TypeData {
        external::<()>(|| "void".to_string(), TypeKind::Void, |t| t)
    }

    fn type_record() -> TypeRecord {
        TypeRecord::VOID
    }
}

impl<T: Reflect> Reflect for *const T {
    fn type_data() -> &'static TypeData {
        T::type_data()
    }

    fn type_record() -> TypeRecord {
        TypeRecord::new(T::type_data().index(), Qualifier::ConstPointer)
    }
}

impl<T: Reflect> Reflect for *mut T {
    fn type_data() -> &'static TypeData {
        T::type_data()
    }

    fn type_record() -> TypeRecord {
        TypeRecord::new(T::type_data().index(), Qualifier::Pointer)
    }
}

impl<T: Reflect> Reflect for &'static T {
    fn type_data() -> &'static TypeData {
        T::type_data()
    }

    fn type_record() -> TypeRecord {
        TypeRecord::new(T::type_data().index(), Qualifier::ConstReference)
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_data() -> &'static TypeData {
        external::<Vec<T>>(
            || format!("Vec<{}>", T::type_data().name()),
            TypeKind::External,
            |t| t,
        )
    }
}

impl<T: Reflect> TypeOf for Vec<T> {
    fn type_of(&self) -> &'static TypeData {
        <Vec<T> as Reflect>::type_data()
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn type_data() -> &'static TypeData {
        external::<Option<T>>(
            || format!("Option<{}>", T::type_data().name()),
            TypeKind::External,
            |t| t,
        )
    }
}

impl<T: Reflect> TypeOf for Option<T> {
    fn type_of(&self) -> &'static TypeData {
        <Option<T> as Reflect>::type_data()
    }
}
