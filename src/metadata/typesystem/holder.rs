//! Lazy, once-per-type registration.
//!
//! These functions back every [`crate::Reflect`] implementation. They return the sealed
//! descriptor of a type, running its registration the first time it is asked for. Registration
//! happens under the catalog's reentrant lock:
//!
//! - a second thread asking for the same type waits until the descriptor is sealed
//! - the registering thread itself gets the reserved descriptor back when a member or method
//!   signature refers to the type being registered
//! - a registration that failed stays failed: every later use of the type panics again
//!
//! [`intrusive`] additionally caches the descriptor in a per-type `static`, the slot generated by
//! [`crate::meta_define!`]. [`external`] is keyed by [`TypeId`] only, which also works for
//! generic types that cannot own a `static`.

use std::{any::TypeId, sync::OnceLock};

use crate::{
    metadata::typesystem::{builder, Catalog, TypeBuilder, TypeData, TypeKind},
    Error,
};

/// Returns the descriptor of `T`, registering it through its [`TypeId`] on first use
///
/// # Panics
///
/// Panics if registration fails, e.g. on a duplicate name or a full catalog, and on every use
/// after a failed registration.
pub fn external<T: 'static>(
    name: impl FnOnce() -> String,
    kind: TypeKind,
    register: impl FnOnce(TypeBuilder<T>) -> TypeBuilder<T>,
) -> &'static TypeData {
    let catalog = Catalog::global();
    if let Some(data) = catalog.get_by_type_id(TypeId::of::<T>()) {
        if data.is_sealed() {
            return data;
        }
    }

    let _guard = catalog.registration_guard();
    if let Some(data) = catalog.get_by_type_id(TypeId::of::<T>()) {
        if data.is_sealed() || builder::is_open_on_thread(data) {
            return data;
        }
        fail::<T>(&Error::IncompleteType(data.name().to_string()));
    }

    build(catalog, name(), kind, register)
}

/// Returns the descriptor of `T`, caching it in `slot`
///
/// # Panics
///
/// Panics if registration fails, e.g. on a duplicate name or a full catalog, and on every use
/// after a failed registration.
pub fn intrusive<T: 'static>(
    slot: &'static OnceLock<&'static TypeData>,
    name: impl FnOnce() -> String,
    register: impl FnOnce(TypeBuilder<T>) -> TypeBuilder<T>,
) -> &'static TypeData {
    if let Some(data) = slot.get() {
        return data;
    }

    let data = external::<T>(name, TypeKind::Class, register);
    if data.is_sealed() {
        let _ = slot.set(data);
    }
    data
}

fn build<T: 'static>(
    catalog: &'static Catalog,
    name: String,
    kind: TypeKind,
    register: impl FnOnce(TypeBuilder<T>) -> TypeBuilder<T>,
) -> &'static TypeData {
    let result = TypeBuilder::<T>::open(catalog, name, kind).and_then(|builder| register(builder).build());
    match result {
        Ok(data) => data,
        Err(error) => fail::<T>(&error),
    }
}

fn fail<T>(error: &Error) -> ! {
    panic!(
        "failed to register type `{}`: {error}",
        std::any::type_name::<T>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reflect;

    #[derive(Clone)]
    struct Node {
        value: i32,
    }

    impl Reflect for Node {
        fn type_data() -> &'static TypeData {
            static SLOT: OnceLock<&'static TypeData> = OnceLock::new();
            intrusive::<Node>(&SLOT, || "HolderNode".to_string(), |t| {
                t.member("value", crate::field!(Node, value))
                    .method("next", |node: &Node| Node {
                        value: node.value + 1,
                    })
            })
        }
    }

    impl crate::Storable for Node {}

    #[test]
    fn test_self_reference_resolves() {
        let data = Node::type_data();
        assert_eq!(data.kind(), TypeKind::Class);
        assert!(data.is_sealed());

        let next = data.method("next").unwrap();
        assert!(std::ptr::eq(next.return_type().type_data().unwrap(), data));
    }

    #[derive(Clone)]
    struct Faulty {
        id: u32,
    }

    impl crate::Storable for Faulty {}

    impl Reflect for Faulty {
        fn type_data() -> &'static TypeData {
            external::<Faulty>(|| "HolderFaulty".to_string(), TypeKind::External, |t| {
                t.member("id", crate::field!(Faulty, id))
                    .member("id", crate::field!(Faulty, id))
                    .method("id", |f: &Faulty| f.id)
            })
        }
    }

    fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
        payload
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default()
    }

    #[test]
    fn test_failed_registration_stays_failed() {
        let first = std::panic::catch_unwind(Faulty::type_data).unwrap_err();
        assert!(panic_message(first).contains("already has a member `id`"));

        let second = std::panic::catch_unwind(Faulty::type_data).unwrap_err();
        assert!(panic_message(second).contains("Registration of type `HolderFaulty` did not complete"));

        let third = std::thread::spawn(|| std::panic::catch_unwind(Faulty::type_data).is_err())
            .join()
            .unwrap();
        assert!(third);

        let data = Catalog::global()
            .get_by_type_id(TypeId::of::<Faulty>())
            .unwrap();
        assert!(data.is_failed());
        assert_eq!(data.method_count(), 0);
    }

    #[test]
    fn test_registration_runs_once() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| Node::type_data() as *const TypeData as usize))
            .collect();
        let addresses: Vec<usize> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(Node::type_data().member_count(), 1);
    }
}
