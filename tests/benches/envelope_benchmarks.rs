//! # Envelope Benchmarks
//!
//! | Operation | Dominant cost |
//! |-----------|---------------|
//! | seal request | two RSA encryptions |
//! | open request | two RSA decryptions |
//! | seal response | AES + HMAC |
//! | verify response | AES + HMAC |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use http::{HeaderMap, Method, StatusCode};
use ssl_crypto::test_keys::{GATEWAY_PRIVATE_KEY_PEM, GATEWAY_PUBLIC_KEY_PEM};
use ssl_crypto::{RsaPrivateCipher, RsaPublicCipher};
use ssl_envelope::{EnvelopeBuilder, EnvelopeConfig, EnvelopeOpener};

const PATH: &str = "/sample/api/v1/values";

fn fixtures() -> (EnvelopeBuilder, EnvelopeOpener, RsaPrivateCipher) {
    let builder = EnvelopeBuilder::new(
        EnvelopeConfig::default(),
        RsaPublicCipher::from_pem(GATEWAY_PUBLIC_KEY_PEM).unwrap(),
    );
    let opener = EnvelopeOpener::new(EnvelopeConfig::default());
    let private_key = RsaPrivateCipher::from_pem(GATEWAY_PRIVATE_KEY_PEM).unwrap();
    (builder, opener, private_key)
}

fn bench_request(c: &mut Criterion) {
    let (builder, opener, private_key) = fixtures();
    let mut group = c.benchmark_group("request");

    let body = r#"{"Name":"prefix","Value":10}"#;
    group.bench_function("seal", |b| {
        b.iter(|| black_box(builder.build_request(&Method::POST, PATH, Some(body)).unwrap()))
    });

    let sealed = builder.build_request(&Method::POST, PATH, Some(body)).unwrap();
    let sealed_body = sealed.body.clone().unwrap();
    group.bench_function("open", |b| {
        b.iter(|| {
            let envelope = opener.inspect(&sealed.headers).unwrap();
            let secrets = opener
                .unwrap_secrets(&private_key, &Method::POST, PATH, &envelope)
                .unwrap();
            black_box(opener.open_body(&secrets, &sealed_body).unwrap())
        })
    });

    group.finish();
}

fn bench_response(c: &mut Criterion) {
    let (builder, opener, _) = fixtures();
    let secrets = builder
        .build_request(&Method::GET, PATH, None)
        .unwrap()
        .secrets;

    let mut group = c.benchmark_group("response");
    for size in [64usize, 1024, 16 * 1024] {
        let body = "x".repeat(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("seal", size), &body, |b, body| {
            b.iter(|| {
                let mut headers = HeaderMap::new();
                black_box(
                    opener
                        .seal_response(StatusCode::OK, &mut headers, body, &secrets)
                        .unwrap(),
                )
            })
        });

        let mut headers = HeaderMap::new();
        let sealed = opener
            .seal_response(StatusCode::OK, &mut headers, &body, &secrets)
            .unwrap()
            .unwrap();
        group.bench_with_input(BenchmarkId::new("verify", size), &sealed, |b, sealed| {
            b.iter(|| {
                black_box(
                    builder
                        .verify_response(StatusCode::OK, &headers, sealed, &secrets)
                        .unwrap(),
                )
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_request, bench_response);
criterion_main!(benches);
