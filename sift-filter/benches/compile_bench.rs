//! Benchmarks for filter parsing and compilation.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;

use sift_filter::{FieldKind, FilterSchema, Predicate};

fn user_schema() -> Arc<FilterSchema> {
    let address = FilterSchema::builder("Address")
        .field("street", FieldKind::String)
        .field("city", FieldKind::String)
        .field("country", FieldKind::String)
        .build();

    FilterSchema::builder("User")
        .field("name", FieldKind::String)
        .field("age", FieldKind::Int)
        .field("created_at", FieldKind::DateTime)
        .nested("address", "address", address)
        .search_fields(["name"])
        .custom("custom_filter", |state, value| {
            Ok(state.and(Predicate::Eq("name".into(), value.clone())))
        })
        .build()
}

fn bench_parse(c: &mut Criterion) {
    let schema = user_schema();

    c.bench_function("parse_simple", |b| {
        b.iter(|| {
            schema
                .parse(black_box([("age__gte", "30"), ("age__lte", "60")]))
                .unwrap()
        })
    });

    c.bench_function("parse_nested_and_ordering", |b| {
        b.iter(|| {
            schema
                .parse(black_box([
                    ("name__in", "Mr Praline,Gumbys"),
                    ("address__city", "Nantes"),
                    ("order_by", "-age,name"),
                ]))
                .unwrap()
        })
    });
}

fn bench_compile(c: &mut Criterion) {
    let schema = user_schema();
    let spec = schema
        .parse([
            ("name__icontains", "Mr"),
            ("age__range", "20,70"),
            ("address__country__not_in", "Clue"),
            ("search", "Pra"),
            ("order_by", "-age"),
        ])
        .unwrap();

    c.bench_function("compile_full", |b| {
        b.iter(|| black_box(&spec).compile().unwrap())
    });
}

criterion_group!(benches, bench_parse, bench_compile);
criterion_main!(benches);
