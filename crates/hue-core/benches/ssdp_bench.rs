//! Criterion benchmarks for SSDP probe construction and reply matching.
//!
//! A busy LAN can answer a single `ssdp:all` search with hundreds of
//! datagrams, every one of which is scanned for the bridge identifier.
//!
//! Run with:
//! ```bash
//! cargo bench --package hue-core --bench ssdp_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hue_core::protocol::ssdp::{is_bridge_response, SearchRequest};

// ── Datagram fixtures ─────────────────────────────────────────────────────────

fn bridge_reply() -> Vec<u8> {
    b"HTTP/1.1 200 OK\r\n\
      CACHE-CONTROL: max-age=100\r\n\
      LOCATION: http://192.168.1.20:80/description.xml\r\n\
      SERVER: Linux/3.14.0 UPnP/1.0 IpBridge/1.48.0\r\n\
      ST: upnp:rootdevice\r\n\r\n"
        .to_vec()
}

fn other_reply() -> Vec<u8> {
    b"HTTP/1.1 200 OK\r\n\
      CACHE-CONTROL: max-age=1800\r\n\
      LOCATION: http://192.168.1.31:8008/ssdp/device-desc.xml\r\n\
      SERVER: Linux/3.8.13 UPnP/1.0 Chromecast/1.36\r\n\
      ST: urn:dial-multiscreen-org:service:dial:1\r\n\r\n"
        .to_vec()
}

fn full_buffer() -> Vec<u8> {
    // Worst case: a 1500-byte datagram with no identifier.
    vec![b'x'; 1500]
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_encode_probe(c: &mut Criterion) {
    let req = SearchRequest::default();
    c.bench_function("encode_probe", |b| b.iter(|| black_box(&req).encode()));
}

fn bench_match_reply(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_reply");
    for (name, datagram) in [
        ("bridge", bridge_reply()),
        ("other", other_reply()),
        ("full_buffer", full_buffer()),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &datagram, |b, d| {
            b.iter(|| is_bridge_response(black_box(d)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode_probe, bench_match_reply);
criterion_main!(benches);
