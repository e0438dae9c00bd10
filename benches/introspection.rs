//! Benchmarks for metamodel bootstrap.
//!
//! Measures the full pipeline over a synthetic domain model:
//! - Sequential and parallel introspection of independent classes
//! - Deep inheritance chains
//! - The introspection barrier (post-processing and validation)

extern crate facetmodel;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use facetmodel::prelude::*;
use std::{hint::black_box, sync::Arc};

/// A class with a handful of properties, a collection and an action with support methods
fn domain_class(index: usize, superclass: Option<String>) -> ClassDescriptor {
    let mut class = ClassBuilder::new(format!("com.example.Entity{index}"))
        .annotate(Annotation::new("DomainObject"))
        .method(
            MethodBuilder::new("getName")
                .returns(TypeRef::value("String"))
                .annotate(Annotation::new("MemberOrder").with("sequence", "1")),
        )
        .method(
            MethodBuilder::new("disableName")
                .returns(TypeRef::value("String"))
                .returning("Locked"),
        )
        .method(
            MethodBuilder::new("getCode")
                .returns(TypeRef::value("String"))
                .annotate(Annotation::new("MaxLength").with("value", 12_i64)),
        )
        .method(MethodBuilder::new("getNotes").returns(TypeRef::collection("String")))
        .method(
            MethodBuilder::new("rename")
                .param("name", TypeRef::value("String"))
                .returns(TypeRef::class(format!("com.example.Entity{index}"))),
        )
        .method(
            MethodBuilder::new("validate0Rename")
                .param("name", TypeRef::value("String"))
                .returns(TypeRef::value("String")),
        )
        .method(
            MethodBuilder::new("title")
                .returns(TypeRef::value("String"))
                .returning("entity"),
        );
    if let Some(superclass) = superclass {
        class = class.extends(superclass);
    }
    class.build().unwrap()
}

fn flat_model(size: usize) -> Arc<MemoryClassRepository> {
    Arc::new((0..size).map(|i| domain_class(i, None)).collect())
}

fn deep_model(depth: usize) -> Arc<MemoryClassRepository> {
    Arc::new(
        (0..depth)
            .map(|i| domain_class(i, i.checked_sub(1).map(|p| format!("com.example.Entity{p}"))))
            .collect(),
    )
}

fn bootstrap(repository: Arc<MemoryClassRepository>, config: MetaModelConfig) -> usize {
    let loader = SpecificationLoader::new(ProgrammingModel::default(), repository, config);
    loader.introspect_all().unwrap();
    loader.complete_introspection().unwrap();
    loader.len()
}

/// Benchmark introspection of independent classes, sequential vs. on the rayon pool.
fn bench_flat_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("introspect_flat");
    for size in [10, 100, 500] {
        let repository = flat_model(size);
        group.bench_with_input(BenchmarkId::new("sequential", size), &repository, |b, r| {
            b.iter(|| {
                let config = MetaModelConfig {
                    parallel_introspection: false,
                    ..MetaModelConfig::production()
                };
                black_box(bootstrap(r.clone(), config))
            });
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), &repository, |b, r| {
            b.iter(|| black_box(bootstrap(r.clone(), MetaModelConfig::production())));
        });
    }
    group.finish();
}

/// Benchmark a single inheritance chain; every class waits for its supertypes.
fn bench_deep_hierarchy(c: &mut Criterion) {
    let repository = deep_model(32);

    c.bench_function("introspect_deep_hierarchy", |b| {
        b.iter(|| black_box(bootstrap(repository.clone(), MetaModelConfig::production())));
    });
}

/// Benchmark member lookup through the supertype chain after bootstrap.
fn bench_effective_facet(c: &mut Criterion) {
    let loader = SpecificationLoader::new(
        ProgrammingModel::default(),
        deep_model(32),
        MetaModelConfig::production(),
    );
    loader.introspect_all().unwrap();
    loader.complete_introspection().unwrap();
    let leaf = loader.specification("com.example.Entity31").unwrap();

    c.bench_function("effective_facet_deep", |b| {
        b.iter(|| {
            let facet = leaf.effective_facet::<dyn MemberOrderFacet>(black_box("name"));
            black_box(facet)
        });
    });

    c.bench_function("members_deep", |b| {
        b.iter(|| black_box(leaf.members().len()));
    });
}

criterion_group!(
    benches,
    bench_flat_model,
    bench_deep_hierarchy,
    bench_effective_facet
);
criterion_main!(benches);
