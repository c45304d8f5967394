//! Integration tests for non-intrusive registration, built-in types and the global catalog.

use std::{collections::HashSet, panic, sync::Barrier, thread};

use metascope::{field, meta_declare_external, prelude::*};

mod geometry {
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Point {
        pub x: f32,
        pub y: f32,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Segment {
        pub start: Point,
        pub end: Point,
        pub tags: Vec<String>,
        pub weight: Option<f32>,
    }

    impl metascope::Storable for Segment {}
    impl metascope::Storable for Point {}

    impl Segment {
        pub fn length(&self) -> f32 {
            let dx = self.end.x - self.start.x;
            let dy = self.end.y - self.start.y;
            (dx * dx + dy * dy).sqrt()
        }

        pub fn tag(&mut self, tag: String) -> usize {
            self.tags.push(tag);
            self.tags.len()
        }

        pub fn unit() -> Segment {
            Segment {
                end: Point { x: 1.0, y: 0.0 },
                ..Segment::default()
            }
        }
    }
}

mod left {
    #[derive(Clone)]
    pub struct Twin;

    impl metascope::Storable for Twin {}
}

mod right {
    #[derive(Clone)]
    pub struct Twin;

    impl metascope::Storable for Twin {}
}

use geometry::{Point, Segment};

meta_declare_external!(Point => |t| t
    .member("x", field!(Point, x))
    .member("y", field!(Point, y)));
meta_declare_external!(Segment => |t| t
    .member("start", field!(Segment, start))
    .member("end", field!(Segment, end))
    .member("tags", field!(Segment, tags))
    .member("weight", field!(Segment, weight))
    .method("length", Segment::length)
    .method("tag", Segment::tag)
    .static_method("unit", Segment::unit));

meta_declare_external!(left::Twin);
meta_declare_external!(right::Twin);

#[derive(Clone)]
struct Broken {
    id: u32,
}

impl Storable for Broken {}

meta_declare_external!(Broken => |t| t
    .member("id", field!(Broken, id))
    .member("id", field!(Broken, id))
    .method("get", |b: &Broken| b.id));

#[derive(Clone)]
struct Contended(u64);

impl Storable for Contended {}

meta_declare_external!(Contended => |t| t
    .method("value", |c: &Contended| c.0));

#[test]
fn test_external_descriptor() -> Result<()> {
    let segment = get::<Segment>();
    assert_eq!(segment.name(), "Segment");
    assert_eq!(segment.kind(), TypeKind::External);
    assert_eq!(segment.size(), std::mem::size_of::<Segment>());
    assert_eq!(segment.member_count(), 4);
    assert_eq!(segment.method_count(), 3);
    assert!(std::ptr::eq(segment, get_of(&Segment::default())));

    let members: Vec<String> = segment.members().map(ToString::to_string).collect();
    assert_eq!(
        members,
        [
            "Point start",
            "Point end",
            "Vec<String> tags",
            "Option<f32> weight"
        ]
    );
    Ok(())
}

#[test]
fn test_external_invocation() -> Result<()> {
    let segment = get::<Segment>();

    let mut instance = segment.method("unit")?.call_static(&[])?;
    let length = segment.method("length")?.invoke(&mut instance, &[])?;
    assert_eq!(*length.cast::<f32>()?, 1.0);

    let tag = segment.method("tag")?;
    assert_eq!(tag.to_string(), "usize tag(String)");
    let count = tag.invoke(&mut instance, &[Any::new("north".to_string())])?;
    assert_eq!(*count.cast::<usize>()?, 1);

    let tags = segment.member("tags")?.get_value(&instance)?;
    assert_eq!(tags.cast::<Vec<String>>()?, &["north".to_string()]);

    segment
        .member("weight")?
        .set_value(&mut instance, &Any::new(Some(0.5f32)))?;
    assert_eq!(instance.cast::<Segment>()?.weight, Some(0.5));
    Ok(())
}

#[test]
fn test_generic_containers() -> Result<()> {
    let strings = get::<Vec<String>>();
    assert_eq!(strings.name(), "Vec<String>");
    assert_eq!(strings.kind(), TypeKind::External);
    assert!(std::ptr::eq(strings, get_by_name("Vec<String>")?));
    assert!(std::ptr::eq(strings, get_of(&vec!["a".to_string()])));

    let maybe = get::<Option<f32>>();
    assert_eq!(maybe.name(), "Option<f32>");
    assert!(!std::ptr::eq(maybe, get::<Option<f64>>()));
    Ok(())
}

#[test]
fn test_pointer_records() -> Result<()> {
    let constant = <*const f32 as Reflect>::type_record();
    let mutable = <*mut f32 as Reflect>::type_record();
    let reference = <&'static f32 as Reflect>::type_record();

    assert_eq!(constant.qualifier, Qualifier::ConstPointer);
    assert_eq!(mutable.qualifier, Qualifier::Pointer);
    assert_eq!(reference.qualifier, Qualifier::ConstReference);
    assert_eq!(constant.to_string(), "*const f32");
    assert_eq!(reference.to_string(), "&f32");

    for record in [constant, mutable, reference] {
        assert!(std::ptr::eq(record.type_data()?, get::<f32>()));
    }
    assert!(std::ptr::eq(get::<*const f32>(), get::<f32>()));
    Ok(())
}

#[test]
fn test_primitives_are_preregistered() -> Result<()> {
    for name in ["void", "bool", "char", "i8", "u16", "i64", "usize", "f32", "f64", "String"] {
        assert!(get_by_name(name).is_ok(), "{name} missing");
    }
    assert_eq!(get::<()>().kind(), TypeKind::Void);
    assert_eq!(get::<u128>().size(), 16);
    assert!(get_by_name("i32 ").is_err());
    Ok(())
}

#[test]
fn test_opaque_entries() -> Result<()> {
    let catalog = Catalog::global();
    let index = catalog.add_type_data("ExternalBlob", 24)?;
    let blob = get_by_index(index)?;
    assert_eq!(blob.name(), "ExternalBlob");
    assert_eq!(blob.size(), 24);
    assert_eq!(blob.kind(), TypeKind::Opaque);
    assert!(blob.type_id().is_none());
    assert!(std::ptr::eq(blob, get_by_name("ExternalBlob")?));
    assert!(blob.is_sealed());
    assert_eq!(
        blob.add_method(Method::from_static("late", || 1u8)),
        Err(Error::TypeSealed("ExternalBlob".to_string()))
    );
    assert_eq!(blob.method_count(), 0);

    assert_eq!(
        catalog.add_type_data("ExternalBlob", 24).unwrap_err(),
        Error::DuplicateType("ExternalBlob".to_string())
    );
    Ok(())
}

#[test]
fn test_catalog_iteration_follows_registration() -> Result<()> {
    let segment = get::<Segment>();
    let catalog = Catalog::global();
    assert!(catalog.len() <= catalog.capacity());

    let positions: Vec<usize> = catalog.iter().map(|data| data.index().as_usize()).collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(catalog.iter().all(TypeData::is_sealed));
    assert!(catalog.iter().any(|data| std::ptr::eq(data, segment)));
    Ok(())
}

#[test]
fn test_concurrent_first_use() {
    const THREADS: usize = 8;
    let barrier = Barrier::new(THREADS);

    let addresses: HashSet<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    get::<Contended>() as *const TypeData as usize
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(addresses.len(), 1);
    assert_eq!(get::<Contended>().method_count(), 1);
}

#[test]
#[should_panic(expected = "failed to register type")]
fn test_duplicate_name_panics() {
    let _ = get::<left::Twin>();
    let _ = get::<right::Twin>();
}

#[test]
fn test_failed_registration_is_never_handed_out() {
    let first = panic::catch_unwind(get::<Broken>);
    assert!(first.is_err());

    for _ in 0..2 {
        let again = panic::catch_unwind(|| get::<Broken>().method_count());
        assert!(again.is_err());
    }

    let elsewhere = thread::spawn(|| panic::catch_unwind(get::<Broken>).is_err())
        .join()
        .unwrap();
    assert!(elsewhere);
    assert!(get_by_name("Broken").is_err());
    assert!(Catalog::global().iter().all(|data| !data.is::<Broken>()));
}
