//! Routing benchmarks.
//!
//! Run with: `cargo bench -p trellis-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use trellis_router::{DeclareRoutes, Params, RouteRegistry};

fn build_router(num_routes: usize) -> RouteRegistry<String> {
    let mut router = RouteRegistry::new();

    for i in 0..num_routes / 3 {
        router
            .get(&format!("/api/v1/resource{i}"), format!("resource{i}.index"))
            .expect("static route")
            .name(format!("resource{i}.index"));
    }

    for i in 0..num_routes / 3 {
        router
            .get(&format!("/api/v1/resource{i}/{{id}}"), format!("resource{i}.show"))
            .expect("param route")
            .name(format!("resource{i}.show"))
            .where_number(["id"])
            .expect("constraint");
    }

    for i in 0..num_routes / 3 {
        router
            .get(
                &format!("/api/v1/org/{{org}}/resource{i}/{{id?}}"),
                format!("org.resource{i}"),
            )
            .expect("nested route");
    }

    router
}

fn bench_static_match(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("static_match", |b| {
        b.iter(|| black_box(router.find(&Method::GET, "/api/v1/resource20")));
    });
}

fn bench_param_match(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("param_match", |b| {
        b.iter(|| black_box(router.find(&Method::GET, "/api/v1/resource25/12345")));
    });
}

fn bench_optional_match(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("optional_match", |b| {
        b.iter(|| black_box(router.find(&Method::GET, "/api/v1/org/acme/resource10")));
    });
}

fn bench_miss(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("miss", |b| {
        b.iter(|| black_box(router.find(&Method::GET, "/api/v1/nonexistent/path")));
    });
}

fn bench_url(c: &mut Criterion) {
    let router = build_router(100);
    let params: Params = [("id", "12345")].into_iter().collect();

    c.bench_function("url", |b| {
        b.iter(|| black_box(router.url("resource10.show", &params)));
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for num_routes in [10, 50, 100, 500, 1000] {
        let router = build_router(num_routes);

        group.bench_with_input(
            BenchmarkId::new("last_static", num_routes),
            &num_routes,
            |b, &n| {
                let path = format!("/api/v1/resource{}", n / 3 - 1);
                b.iter(|| black_box(router.find(&Method::GET, &path)));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("miss", num_routes),
            &num_routes,
            |b, _| b.iter(|| black_box(router.find(&Method::GET, "/nowhere"))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_static_match,
    bench_param_match,
    bench_optional_match,
    bench_miss,
    bench_url,
    bench_scaling
);
criterion_main!(benches);
