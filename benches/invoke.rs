//! Benchmarks for type lookup, value boxing and dynamic invocation.
//!
//! - Descriptor lookup through the static holder, by name and through a `dyn Object`
//! - `Any` construction and casting for inline and heap storage
//! - Method invocation through the erased bridge against a direct call

extern crate metascope;

use criterion::{criterion_group, criterion_main, Criterion};
use metascope::{field, get, get_by_name, get_of, meta_declare, meta_define, Any, Object, Storable};
use std::hint::black_box;

#[derive(Clone, Default)]
struct Body {
    mass: f64,
    velocity: f64,
}

impl Storable for Body {}

impl Body {
    fn momentum(&self) -> f64 {
        self.mass * self.velocity
    }

    fn push(&mut self, impulse: f64, scale: f32) -> f64 {
        self.velocity += impulse * f64::from(scale) / self.mass;
        self.velocity
    }
}

meta_declare!(Body);
meta_define!(Body => |t| t
    .member("mass", field!(Body, mass))
    .member("velocity", field!(Body, velocity))
    .method("momentum", Body::momentum)
    .method("push", Body::push));

fn body() -> Body {
    Body {
        mass: 2.0,
        velocity: 3.0,
    }
}

/// Benchmark the cached descriptor lookup.
fn bench_get_static(c: &mut Criterion) {
    get::<Body>();

    c.bench_function("get_static", |b| {
        b.iter(|| black_box(get::<Body>()));
    });
}

/// Benchmark the lookup by name.
fn bench_get_by_name(c: &mut Criterion) {
    get::<Body>();

    c.bench_function("get_by_name", |b| {
        b.iter(|| black_box(get_by_name(black_box("Body")).unwrap()));
    });
}

/// Benchmark the lookup through the dynamic accessor.
fn bench_get_dynamic(c: &mut Criterion) {
    let object: Box<dyn Object> = Box::new(body());

    c.bench_function("get_dynamic", |b| {
        b.iter(|| black_box(get_of(black_box(&object))));
    });
}

/// Benchmark boxing and casting a value stored inline.
fn bench_any_inline(c: &mut Criterion) {
    c.bench_function("any_inline", |b| {
        b.iter(|| {
            let value = Any::new(black_box(42u32));
            black_box(*value.cast::<u32>().unwrap())
        });
    });
}

/// Benchmark boxing and casting a value stored on the heap.
fn bench_any_heap(c: &mut Criterion) {
    c.bench_function("any_heap", |b| {
        b.iter(|| {
            let value = Any::new(black_box(body()));
            black_box(value.cast::<Body>().unwrap().mass)
        });
    });
}

/// Benchmark a zero-argument `&self` call through the bridge.
fn bench_invoke_no_args(c: &mut Criterion) {
    let method = get::<Body>().method("momentum").unwrap();
    let mut instance = Any::new(body());

    c.bench_function("invoke_no_args", |b| {
        b.iter(|| black_box(method.invoke(&mut instance, &[]).unwrap()));
    });
}

/// Benchmark a two-argument `&mut self` call through the bridge.
fn bench_invoke_two_args(c: &mut Criterion) {
    let method = get::<Body>().method("push").unwrap();
    let mut instance = Any::new(body());
    let args = [Any::new(0.5f64), Any::new(1.0f32)];

    c.bench_function("invoke_two_args", |b| {
        b.iter(|| black_box(method.invoke(&mut instance, black_box(&args)).unwrap()));
    });
}

/// Baseline: the same call made directly.
fn bench_direct_call(c: &mut Criterion) {
    let mut instance = body();

    c.bench_function("direct_call", |b| {
        b.iter(|| black_box(instance.push(black_box(0.5), black_box(1.0))));
    });
}

/// Benchmark reading a member through its erased accessor.
fn bench_member_get_value(c: &mut Criterion) {
    let member = get::<Body>().member("velocity").unwrap();
    let instance = Any::new(body());

    c.bench_function("member_get_value", |b| {
        b.iter(|| black_box(member.get_value(&instance).unwrap()));
    });
}

criterion_group!(
    benches,
    // Lookup
    bench_get_static,
    bench_get_by_name,
    bench_get_dynamic,
    // Any
    bench_any_inline,
    bench_any_heap,
    // Invocation
    bench_invoke_no_args,
    bench_invoke_two_args,
    bench_direct_call,
    bench_member_get_value,
);
criterion_main!(benches);
