//! Assembles the descriptor of one type during registration.
//!
//! A [`TypeBuilder`] is opened by a holder (see [`crate::metadata::typesystem::external`]). Opening
//! commits the bare identity of the type right away, so member and method signatures that
//! mention the type itself resolve to the descriptor being built. Each chained call appends to
//! that descriptor; [`TypeBuilder::build`] seals it.
//!
//! Errors do not break the chain. The first one is kept, later steps are skipped, and
//! [`TypeBuilder::build`] reports it.
//!
//! A builder holds the catalog's registration lock until it is built or dropped, so no other
//! thread observes the descriptor while it is open. Dropping a builder without a successful
//! [`TypeBuilder::build`] (an error in the chain, or a panic while registering) marks the
//! descriptor failed, and later lookups through the holders refuse it.
//!
//! # Examples
//!
//! ```rust
//! use metascope::{field, meta_declare_external, Storable};
//!
//! #[derive(Clone, Default)]
//! struct Counter {
//!     hits: u32,
//! }
//!
//! impl Storable for Counter {}
//!
//! impl Counter {
//!     fn hit(&mut self, amount: u32) {
//!         self.hits += amount;
//!     }
//!
//!     fn zero() -> Counter {
//!         Counter::default()
//!     }
//! }
//!
//! meta_declare_external!(Counter => |t| t
//!     .member("hits", field!(Counter, hits))
//!     .method("hit", Counter::hit)
//!     .static_method("zero", Counter::zero));
//!
//! let counter = metascope::get::<Counter>();
//! assert_eq!(counter.member_count(), 1);
//! assert_eq!(counter.method_count(), 2);
//! assert!(counter.method("zero")?.is_static());
//! # Ok::<(), metascope::Error>(())
//! ```

use std::{cell::RefCell, marker::PhantomData};

use parking_lot::ReentrantMutexGuard;

use crate::{
    any::Storable,
    metadata::{
        member::{Field, Member},
        method::{IntoMethod, IntoStaticMethod, Method},
        typesystem::{Catalog, Reflect, TypeData, TypeIndex, TypeKind},
    },
    Error, Result,
};

thread_local! {
    static OPEN_ON_THREAD: RefCell<Vec<TypeIndex>> = const { RefCell::new(Vec::new()) };
}

/// Returns `true` if a builder for `data` is open on the calling thread
pub(crate) fn is_open_on_thread(data: &TypeData) -> bool {
    OPEN_ON_THREAD.with(|open| open.borrow().contains(&data.index()))
}

/// Registration-time assembler for the descriptor of `T`
pub struct TypeBuilder<T> {
    data: &'static TypeData,
    error: Option<Error>,
    _guard: ReentrantMutexGuard<'static, ()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> TypeBuilder<T> {
    /// Commits the bare identity of `T` and starts appending to it
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateType`] if the name or the type is registered already and
    /// [`crate::Error::CapacityExceeded`] if the catalog is full.
    pub fn open(catalog: &'static Catalog, name: String, kind: TypeKind) -> Result<Self> {
        let guard = catalog.registration_guard();
        let data = catalog.reserve(TypeData::of::<T>(name, kind))?;
        OPEN_ON_THREAD.with(|open| open.borrow_mut().push(data.index()));
        Ok(TypeBuilder {
            data,
            error: None,
            _guard: guard,
            _marker: PhantomData,
        })
    }

    /// The descriptor under construction
    #[must_use]
    pub fn type_data(&self) -> &'static TypeData {
        self.data
    }

    /// Appends a data member
    ///
    /// The member type is resolved through its [`Reflect`] implementation, registering it if
    /// needed.
    #[must_use]
    pub fn member<F: Reflect + Storable>(self, name: &str, field: Field<T, F>) -> Self {
        self.then(|data| data.add_member(Member::new(name, field)))
    }

    /// Appends a data member with an explicit byte offset
    #[must_use]
    pub fn member_at<F: Reflect + Storable>(
        self,
        name: &str,
        offset: usize,
        field: Field<T, F>,
    ) -> Self {
        self.member(name, field.with_offset(offset))
    }

    /// Appends a method taking `&self` or `&mut self`
    #[must_use]
    pub fn method<F, M>(self, name: &str, method: F) -> Self
    where
        F: IntoMethod<T, M>,
    {
        self.then(|data| data.add_method(Method::from_method::<T, F, M>(name, method)))
    }

    /// Appends an associated function without receiver
    #[must_use]
    pub fn static_method<F, M>(self, name: &str, method: F) -> Self
    where
        F: IntoStaticMethod<M>,
    {
        self.then(|data| data.add_method(Method::from_static::<F, M>(name, method)))
    }

    /// Seals the descriptor and returns it
    ///
    /// # Errors
    /// Returns the first error raised by a chained step.
    pub fn build(mut self) -> Result<&'static TypeData> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }

        self.data.seal();
        Ok(self.data)
    }

    fn then(mut self, step: impl FnOnce(&'static TypeData) -> Result<()>) -> Self {
        if self.error.is_none() {
            if let Err(error) = step(self.data) {
                self.error = Some(error);
            }
        }
        self
    }
}

impl<T> Drop for TypeBuilder<T> {
    fn drop(&mut self) {
        let index = self.data.index();
        OPEN_ON_THREAD.with(|open| {
            let mut open = open.borrow_mut();
            if let Some(position) = open.iter().rposition(|entry| *entry == index) {
                open.remove(position);
            }
        });

        if !self.data.is_sealed() {
            self.data.fail();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{field, metadata::typesystem::TypeIndex};

    #[derive(Clone, Default)]
    struct Sample {
        id: u32,
        weight: f64,
    }

    impl Storable for Sample {}

    #[derive(Clone)]
    struct Broken {
        id: u32,
    }

    fn sample_builder() -> TypeBuilder<Sample> {
        TypeBuilder::open(Catalog::global(), "BuilderSample".to_string(), TypeKind::External)
            .unwrap()
    }

    #[test]
    fn test_builder_appends_in_order() {
        let data = sample_builder()
            .member("id", field!(Sample, id))
            .member_at("weight", 8, Field::new(|s: &Sample| &s.weight, |s: &mut Sample| &mut s.weight))
            .method("heavier", |s: &mut Sample, by: f64| s.weight += by)
            .static_method("make", |id: u32| id * 2)
            .build()
            .unwrap();

        assert!(data.is_sealed());
        assert_ne!(data.index(), TypeIndex::DETACHED);
        let members: Vec<&str> = data.members().map(Member::name).collect();
        assert_eq!(members, ["id", "weight"]);
        assert_eq!(data.member("weight").unwrap().offset(), Some(8));
        assert_eq!(data.member("id").unwrap().owner_index(), Some(data.index()));

        let methods: Vec<&str> = data.methods().map(Method::name).collect();
        assert_eq!(methods, ["heavier", "make"]);
        assert!(data.method("make").unwrap().is_static());
    }

    #[test]
    fn test_builder_keeps_first_error() {
        let result =
            TypeBuilder::<Broken>::open(Catalog::global(), "BuilderBroken".to_string(), TypeKind::External)
                .unwrap()
                .member("id", field!(Broken, id))
                .member("id", field!(Broken, id))
                .method("id", |b: &Broken| b.id)
                .method("id", |b: &Broken| b.id + 1)
                .build();

        assert_eq!(
            result.unwrap_err(),
            Error::DuplicateMember {
                type_name: "BuilderBroken".to_string(),
                member: "id".to_string(),
            }
        );

        let data = Catalog::global()
            .get_by_type_id(std::any::TypeId::of::<Broken>())
            .unwrap();
        assert!(data.is_failed());
        assert!(!data.is_sealed());
        assert_eq!(
            Catalog::global().get_by_name("BuilderBroken").unwrap_err(),
            Error::TypeNotFound("BuilderBroken".to_string())
        );
        assert_eq!(
            data.add_method(Method::from_method::<Broken, _, _>("late", |b: &Broken| b.id)),
            Err(Error::TypeSealed("BuilderBroken".to_string()))
        );
    }

    #[derive(Clone)]
    struct Dropped;

    #[test]
    fn test_dropped_builder_fails_descriptor() {
        let builder =
            TypeBuilder::<Dropped>::open(Catalog::global(), "BuilderDropped".to_string(), TypeKind::External)
                .unwrap();
        let data = builder.type_data();
        assert!(is_open_on_thread(data));
        assert!(!data.is_failed());

        drop(builder);
        assert!(!is_open_on_thread(data));
        assert!(data.is_failed());

        data.seal();
        assert!(!data.is_sealed());
        assert!(Catalog::global().get_by_index(data.index()).is_err());
    }

    #[test]
    fn test_open_builder_is_not_visible() {
        #[derive(Clone)]
        struct Pending;

        let builder =
            TypeBuilder::<Pending>::open(Catalog::global(), "BuilderPending".to_string(), TypeKind::External)
                .unwrap();
        let index = builder.type_data().index();

        let elsewhere = std::thread::spawn(move || {
            let catalog = Catalog::global();
            (
                catalog.get_by_name("BuilderPending").is_err(),
                catalog.get_by_index(index).is_err(),
            )
        })
        .join()
        .unwrap();
        assert_eq!(elsewhere, (true, true));
        assert!(Catalog::global().get_by_name("BuilderPending").is_err());

        let data = builder.build().unwrap();
        assert!(data.is_sealed());
        assert!(std::ptr::eq(Catalog::global().get_by_name("BuilderPending").unwrap(), data));
    }
}
