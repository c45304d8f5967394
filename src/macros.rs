/// Builds a [`crate::Field`] accessor for a named field
///
/// Records the field offset with [`core::mem::offset_of!`].
///
/// ```rust
/// use metascope::field;
///
/// struct Vec2 { x: f32, y: f32 }
///
/// let y = field!(Vec2, y);
/// assert_eq!(*y.get(&Vec2 { x: 1.0, y: 2.0 }), 2.0);
/// assert_eq!(y.offset(), Some(std::mem::offset_of!(Vec2, y)));
/// ```
#[macro_export]
macro_rules! field {
    ($owner:ty, $name:ident) => {
        $crate::Field::new(
            |owner: &$owner| &owner.$name,
            |owner: &mut $owner| &mut owner.$name,
        )
        .with_offset(::core::mem::offset_of!($owner, $name))
    };
}

/// Declares the dynamic type accessor of an intrusively registered type
///
/// Implements [`crate::Object`] and makes [`crate::TypeOf`] forward to it, so a `dyn Object`
/// reports the descriptor of its concrete type. Pair with [`crate::meta_define!`], which supplies
/// the descriptor itself.
///
/// ```rust
/// use metascope::{get_of, meta_declare, meta_define, Object, Storable};
///
/// #[derive(Clone)]
/// struct Cat;
///
/// #[derive(Clone)]
/// struct Dog;
///
/// impl Storable for Cat {}
/// impl Storable for Dog {}
///
/// meta_declare!(Cat);
/// meta_define!(Cat);
/// meta_declare!(Dog);
/// meta_define!(Dog);
///
/// let pets: Vec<Box<dyn Object>> = vec![Box::new(Cat), Box::new(Dog)];
/// let names: Vec<&str> = pets.iter().map(|pet| get_of(pet).name()).collect();
/// assert_eq!(names, ["Cat", "Dog"]);
/// ```
#[macro_export]
macro_rules! meta_declare {
    ($ty:ty) => {
        impl $crate::Object for $ty {
            fn get_type(&self) -> &'static $crate::TypeData {
                <$ty as $crate::Reflect>::type_data()
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }
        }

        impl $crate::TypeOf for $ty {
            fn type_of(&self) -> &'static $crate::TypeData {
                $crate::Object::get_type(self)
            }
        }
    };
}

/// Defines the registration of an intrusively declared type
///
/// Implements [`crate::Reflect`] with the descriptor cached in a `static` owned by the impl. The
/// descriptor is named after the last path segment of the type and has kind
/// [`crate::TypeKind::Class`]. The optional closure receives a [`crate::TypeBuilder`] and returns
/// it with members and methods attached.
///
/// Generic types share one `static` between all instantiations; register those with
/// [`crate::meta_declare_external!`] per instantiation instead.
///
/// ```rust
/// use metascope::{field, meta_declare, meta_define, Storable, TypeKind};
///
/// #[derive(Clone, Default)]
/// struct Account {
///     balance: i64,
/// }
///
/// impl Storable for Account {}
///
/// impl Account {
///     fn deposit(&mut self, amount: i64) -> i64 {
///         self.balance += amount;
///         self.balance
///     }
/// }
///
/// meta_declare!(Account);
/// meta_define!(Account => |t| t
///     .member("balance", field!(Account, balance))
///     .method("deposit", Account::deposit));
///
/// let account = metascope::get::<Account>();
/// assert_eq!(account.name(), "Account");
/// assert_eq!(account.kind(), TypeKind::Class);
/// assert_eq!(account.method("deposit")?.to_string(), "i64 deposit(i64)");
/// # Ok::<(), metascope::Error>(())
/// ```
#[macro_export]
macro_rules! meta_define {
    ($ty:ty => |$builder:ident| $body:expr) => {
        impl $crate::Reflect for $ty {
            fn type_data() -> &'static $crate::TypeData {
                static SLOT: ::std::sync::OnceLock<&'static $crate::TypeData> =
                    ::std::sync::OnceLock::new();
                $crate::metadata::typesystem::intrusive::<$ty>(
                    &SLOT,
                    || ::std::string::String::from($crate::utils::short_type_name::<$ty>()),
                    |$builder| $body,
                )
            }
        }
    };
    ($ty:ty) => {
        $crate::meta_define!($ty => |builder| builder);
    };
}

/// Registers a type without touching its definition
///
/// Implements [`crate::Reflect`] through the catalog's `TypeId` index and a [`crate::TypeOf`]
/// that answers with the static descriptor. Works for types of other crates as long as the local
/// crate may implement traits for them, and for concrete instantiations of generic types.
///
/// ```rust
/// use metascope::{get_of, meta_declare_external, Storable, TypeKind};
///
/// #[derive(Clone)]
/// struct Celsius(f64);
///
/// impl Storable for Celsius {}
///
/// meta_declare_external!(Celsius => |t| t
///     .method("fahrenheit", |c: &Celsius| c.0 * 1.8 + 32.0));
///
/// let celsius = get_of(&Celsius(21.0));
/// assert_eq!(celsius.kind(), TypeKind::External);
/// assert_eq!(celsius.method_count(), 1);
/// ```
#[macro_export]
macro_rules! meta_declare_external {
    ($ty:ty => |$builder:ident| $body:expr) => {
        impl $crate::Reflect for $ty {
            fn type_data() -> &'static $crate::TypeData {
                $crate::metadata::typesystem::external::<$ty>(
                    || ::std::string::String::from($crate::utils::short_type_name::<$ty>()),
                    $crate::TypeKind::External,
                    |$builder| $body,
                )
            }
        }

        impl $crate::TypeOf for $ty {
            fn type_of(&self) -> &'static $crate::TypeData {
                <$ty as $crate::Reflect>::type_data()
            }
        }
    };
    ($ty:ty) => {
        $crate::meta_declare_external!($ty => |builder| builder);
    };
}
