use criterion::{black_box, criterion_group, criterion_main, Criterion};
use product_catalog::api::product::product_repository::NewProduct;
use product_catalog::infra::{pagination::PaginationParams, validation::Valid};

fn total_pages_benchmark(c: &mut Criterion) {
    let params = PaginationParams::new(7, 25);
    c.bench_function("total_pages", |b| {
        b.iter(|| params.total_pages(black_box(1_000_003)))
    });
}

fn validate_product_benchmark(c: &mut Criterion) {
    c.bench_function("validate_product", |b| {
        b.iter(|| {
            Valid::new(NewProduct {
                name: black_box("Teclado").to_string(),
                price: black_box(174.99),
            })
        })
    });
}

criterion_group!(benches, total_pages_benchmark, validate_product_benchmark);
criterion_main!(benches);
