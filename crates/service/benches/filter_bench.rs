use criterion::{black_box, criterion_group, criterion_main, Criterion};

use service::filter::parse;
use service::services::spexare_service::FIELDS;

const FILTER: &str = "(firstName:Kal* OR nickName~anka) AND lastName!NULL AND id>10 or graduation:*72";

fn bench_parse(c: &mut Criterion) {
    c.bench_function("filter_parse", |b| {
        b.iter(|| parse(black_box(FILTER)).unwrap());
    });
}

fn bench_condition(c: &mut Criterion) {
    c.bench_function("filter_condition", |b| {
        b.iter(|| FIELDS.condition(Some(black_box(FILTER))).unwrap());
    });
}

criterion_group!(benches, bench_parse, bench_condition);
criterion_main!(benches);
