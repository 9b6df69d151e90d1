//! Ring Benchmark Binary
//!
//! Ukur latency push/pop single-thread dan throughput SPSC dua thread.
//!
//! Usage:
//!   cargo run --release --bin ring_bench [config.toml]
//!
//! Tanpa argumen dipakai konfigurasi default (heap, 64KB).

use std::time::Instant;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vlmring::core::{Cursor, RingBuffer, Storage};
use vlmring::RingConfig;

const ITERATIONS: u32 = 1_000_000;
const PAYLOAD_SIZE: usize = 64;

fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => match RingConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => RingConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    // Minimal dua slot supaya loop "drain kalau penuh" selalu maju
    if config.capacity < 2 * vlmring::protocol::slot_size(PAYLOAD_SIZE) {
        error!(capacity = config.capacity, "capacity too small for benchmark payload");
        std::process::exit(1);
    }

    info!(
        capacity = config.capacity,
        backing = ?config.backing,
        "starting ring benchmark"
    );

    match config.build_local() {
        Ok(mut ring) => benchmark_single_thread(&mut ring),
        Err(e) => {
            error!(error = %e, "failed to build local ring");
            std::process::exit(1);
        }
    }

    match config.build_spsc() {
        Ok(mut ring) => benchmark_spsc(&mut ring),
        Err(e) => {
            error!(error = %e, "failed to build spsc ring");
            std::process::exit(1);
        }
    }

    info!("all benchmarks complete");
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn benchmark_single_thread<C: Cursor, S: Storage>(ring: &mut RingBuffer<C, S>) {
    let (mut tx, mut rx) = ring.split();
    let payload = [0u8; PAYLOAD_SIZE];
    let mut out = [0u8; PAYLOAD_SIZE];

    // Warm up
    for i in 0..1000 {
        if tx.push(i, &payload).is_err() {
            break;
        }
    }
    while rx.pop(&mut out).is_ok() {}

    // Benchmark push (drain satu kalau penuh)
    let start = Instant::now();
    for i in 0..ITERATIONS {
        while tx.push(i, &payload).is_err() {
            let _ = rx.pop(&mut out);
        }
    }
    let push_duration = start.elapsed();

    while rx.pop(&mut out).is_ok() {}

    // Benchmark push+pop cycle
    let start = Instant::now();
    for i in 0..ITERATIONS {
        let _ = tx.push(i, &payload);
        let _ = rx.pop(&mut out);
    }
    let cycle_duration = start.elapsed();

    let push_ns = push_duration.as_nanos() as f64 / ITERATIONS as f64;
    let cycle_ns = cycle_duration.as_nanos() as f64 / ITERATIONS as f64;

    info!(
        iterations = ITERATIONS,
        payload_bytes = PAYLOAD_SIZE,
        push_ns = round2(push_ns),
        cycle_ns = round2(cycle_ns),
        "single-thread ring"
    );
}

fn benchmark_spsc<C: Cursor, S: Storage + Sync>(ring: &mut RingBuffer<C, S>)
where
    C: Sync,
{
    let (mut tx, mut rx) = ring.split();
    let payload = [0u8; PAYLOAD_SIZE];

    let start = Instant::now();
    std::thread::scope(|s| {
        s.spawn(move || {
            for i in 0..ITERATIONS {
                while tx.push(i, &payload).is_err() {
                    std::hint::spin_loop();
                }
            }
        });

        s.spawn(move || {
            let mut out = [0u8; PAYLOAD_SIZE];
            let mut received = 0u32;
            while received < ITERATIONS {
                match rx.pop(&mut out) {
                    Ok(header) => {
                        debug_assert_eq!(header.msg_type, received);
                        received += 1;
                    }
                    Err(_) => std::hint::spin_loop(),
                }
            }
        });
    });
    let duration = start.elapsed();

    info!(
        messages = ITERATIONS,
        throughput_mps = round2(ITERATIONS as f64 / duration.as_secs_f64() / 1_000_000.0),
        mb_per_sec = round2(
            (ITERATIONS as usize * PAYLOAD_SIZE) as f64 / duration.as_secs_f64() / 1_000_000.0
        ),
        "spsc ring (2 threads)"
    );
}
