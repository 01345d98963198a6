//! Criterion benchmarks for rust_kvlog

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_kvlog::prelude::*;
use rust_kvlog::{CallSite, Pools};

// ============================================================================
// Gate Benchmarks
// ============================================================================

fn bench_filtered(c: &mut Criterion) {
    let mut group = c.benchmark_group("filtered");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::new(DiscardWriter)
        .with_level(Level::ERROR)
        .with_pools(Pools::leaked());

    group.bench_function("level", |b| {
        b.iter(|| logger.debug(black_box("filtered"), []));
    });

    group.bench_function("builder", |b| {
        b.iter(|| {
            logger
                .debug_builder()
                .k("user", black_box(42))
                .k("path", "/index")
                .msg("filtered")
        });
    });

    let hooked = Logger::new(DiscardWriter)
        .with_name("db")
        .with_hook(disable_logger(["db"]));
    group.bench_function("hook", |b| {
        b.iter(|| hooked.error(black_box("filtered"), []));
    });

    group.finish();
}

// ============================================================================
// Emission Benchmarks
// ============================================================================

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::new(DiscardWriter)
        .with_pools(Pools::leaked())
        .with_kv("service", "bench");

    group.bench_function("info_no_fields", |b| {
        b.iter(|| logger.info(black_box("message"), []));
    });

    group.bench_function("info_with_fields", |b| {
        b.iter(|| {
            logger.info(
                black_box("request served"),
                [field("status", 200), field("bytes", 5120u64), field("ok", true)],
            )
        });
    });

    group.bench_function("builder_with_fields", |b| {
        b.iter(|| {
            logger
                .info_builder()
                .k("status", black_box(200))
                .k("path", "/api/v1/items")
                .lazy("elapsed_ms", || 12.5)
                .msg("request served")
        });
    });

    let caller = logger.with_field(valuer::caller("caller"));
    group.bench_function("with_caller", |b| {
        b.iter(|| caller.info(black_box("message"), []));
    });

    let json = logger.with_encoder(JsonEncoder::new());
    group.bench_function("json", |b| {
        b.iter(|| json.info(black_box("message"), [field("status", 200)]));
    });

    group.finish();
}

// ============================================================================
// Encoder Benchmarks
// ============================================================================

fn bench_encoders(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoders");
    group.throughput(Throughput::Elements(1));

    let fields = [
        field("user", 42),
        field("path", "/api/v1/items"),
        field("note", "needs quoting"),
        field("ratio", 0.25),
    ];
    let record = Record {
        name: "bench",
        time: Utc::now(),
        depth: 0,
        level: Level::INFO,
        message: "encoder benchmark",
        site: CallSite::new("benches/logger_benchmarks.rs", 1, 1),
        fields: &fields,
    };
    let mut buf = Vec::with_capacity(1024);

    let text = TextEncoder::new(true);
    group.bench_function("text", |b| {
        b.iter(|| {
            buf.clear();
            text.encode(&mut buf, black_box(&record));
        });
    });

    let json = JsonEncoder::new();
    group.bench_function("json", |b| {
        b.iter(|| {
            buf.clear();
            json.encode(&mut buf, black_box(&record));
        });
    });

    let map_json = MapJsonEncoder::new();
    group.bench_function("map_json", |b| {
        b.iter(|| {
            buf.clear();
            map_json.encode(&mut buf, black_box(&record));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_filtered, bench_emit, bench_encoders);
criterion_main!(benches);
