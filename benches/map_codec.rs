//! ヘッダーマップコーデックのベンチマーク
//!
//! 使用方法:
//!   cargo bench --bench map_codec
//!
//! 測定項目:
//! - ヘッダー数別のエンコード（4, 16, 64ペア）
//! - ヘッダー数別のデコード（String / Bytes）
//! - プロパティパスのシリアライズ

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use veil_wasm_sdk::map;

/// テスト用ヘッダーを生成
fn generate_headers(count: usize) -> Vec<(String, String)> {
    let mut headers = vec![
        (":method".to_string(), "GET".to_string()),
        (":path".to_string(), "/api/v1/resource".to_string()),
        (":authority".to_string(), "example.com".to_string()),
    ];
    for i in headers.len()..count {
        headers.push((format!("x-custom-{}", i), format!("value-{}-{}", i, "a".repeat(i % 32))));
    }
    headers.truncate(count);
    headers
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_encode");
    for count in [4usize, 16, 64] {
        let headers = generate_headers(count);
        group.throughput(Throughput::Bytes(map::encoded_len(&headers) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &headers, |b, headers| {
            b.iter(|| map::encode(black_box(headers)))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_decode");
    for count in [4usize, 16, 64] {
        let encoded = map::encode(&generate_headers(count));
        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::new("string", count), &encoded, |b, encoded| {
            b.iter(|| map::decode(black_box(encoded)))
        });
        group.bench_with_input(BenchmarkId::new("bytes", count), &encoded, |b, encoded| {
            b.iter(|| map::decode_bytes(black_box(encoded)))
        });
    }
    group.finish();
}

fn bench_property_path(c: &mut Criterion) {
    c.bench_function("property_path", |b| {
        b.iter(|| map::serialize_property_path(black_box(&["request", "headers", "x-request-id"])))
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_property_path);
criterion_main!(benches);
