//! SPSC Stress Test - producer dan consumer di thread berbeda
//!
//! Verifikasi FIFO lintas thread: tidak ada pesan hilang, dobel, atau
//! tertukar urutan, termasuk saat ring sering penuh dan turn-around.
//!
//! Usage:
//!   cargo test --release --test spsc_stress_test -- --nocapture

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use vlmring::core::{required_bytes, MmapStorage, SpscRing, Storage};
use vlmring::protocol::{Decoder, Encoder};
use vlmring::RingError;

/// Statistics collector
struct StressStats {
    full_retries: AtomicU64,
    empty_retries: AtomicU64,
    received: AtomicU64,
}

impl StressStats {
    fn new() -> Self {
        Self {
            full_retries: AtomicU64::new(0),
            empty_retries: AtomicU64::new(0),
            received: AtomicU64::new(0),
        }
    }

    fn print_report(&self, name: &str, duration: Duration) {
        let received = self.received.load(Ordering::Relaxed);
        println!("\n📊 {}", name);
        println!("  Duration:      {:.2}ms", duration.as_secs_f64() * 1000.0);
        println!("  Received:      {}", received);
        println!("  Full retries:  {}", self.full_retries.load(Ordering::Relaxed));
        println!("  Empty retries: {}", self.empty_retries.load(Ordering::Relaxed));
        println!(
            "  Rate:          {:.2} M msgs/sec",
            received as f64 / duration.as_secs_f64() / 1_000_000.0
        );
    }
}

/// Producer push `0..count` sebagai tipe pesan (payload kosong), consumer
/// catat semua tipe yang diterima. Retry dengan yield di kedua sisi.
fn run_sequence<S: Storage + Sync>(ring: &mut SpscRing<S>, count: u32, stats: &StressStats) -> Vec<u32> {
    let (mut tx, mut rx) = ring.split();
    let mut recorder = Vec::with_capacity(count as usize);

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..count {
                loop {
                    match tx.push(i, &[]) {
                        Ok(()) => break,
                        Err(RingError::InsufficientSpace { .. }) => {
                            stats.full_retries.fetch_add(1, Ordering::Relaxed);
                            thread::yield_now();
                        }
                        Err(e) => panic!("unexpected push error: {e}"),
                    }
                }
            }
        });

        s.spawn(|| {
            for _ in 0..count {
                loop {
                    match rx.pop_begin() {
                        Ok(grant) => {
                            let msg_type = grant.msg_type();
                            grant.commit();
                            recorder.push(msg_type);
                            stats.received.fetch_add(1, Ordering::Relaxed);
                            break;
                        }
                        Err(RingError::Empty) => {
                            stats.empty_retries.fetch_add(1, Ordering::Relaxed);
                            thread::yield_now();
                        }
                        Err(e) => panic!("unexpected pop error: {e}"),
                    }
                }
            }
        });
    });

    recorder
}

#[test]
fn test_sequence_numbers_strictly_increasing() {
    const N: u32 = 300_000;
    let mut ring: SpscRing = SpscRing::new(N as usize / 10);
    let stats = StressStats::new();

    let start = Instant::now();
    let recorder = run_sequence(&mut ring, N, &stats);
    stats.print_report("sequence (heap)", start.elapsed());

    assert_eq!(recorder.len(), N as usize);
    for (expected, got) in recorder.iter().enumerate() {
        assert_eq!(*got, expected as u32);
    }
    assert!(ring.is_empty());
}

#[test]
fn test_sequence_on_mmap_region() {
    const N: u32 = 100_000;
    let capacity = 4096;
    let storage = MmapStorage::anonymous(required_bytes(capacity).unwrap()).unwrap();
    let mut ring = SpscRing::with_storage(storage, capacity).unwrap();
    let stats = StressStats::new();

    let start = Instant::now();
    let recorder = run_sequence(&mut ring, N, &stats);
    stats.print_report("sequence (mmap)", start.elapsed());

    assert!(recorder.iter().copied().eq(0..N));
}

#[test]
fn test_variable_payloads_with_turn_around() {
    const N: u64 = 200_000;
    // Ring kecil: turn-around terjadi terus-menerus
    let mut ring: SpscRing = SpscRing::new(1000);
    let (mut tx, mut rx) = ring.split();
    let stats = StressStats::new();

    let start = Instant::now();
    thread::scope(|s| {
        s.spawn(|| {
            for seq in 0..N {
                // 8 bytes seq + 0..=120 bytes isi
                let extra = (seq % 121) as usize;
                loop {
                    let pushed = tx.push_with((seq % 7) as u32, 8 + extra, |payload| {
                        let mut encoder = Encoder::new(payload);
                        encoder.put_u64(seq).unwrap();
                        for _ in 0..extra {
                            encoder.put_u8(seq as u8).unwrap();
                        }
                    });
                    match pushed {
                        Ok(()) => break,
                        Err(e) => {
                            assert!(e.is_retryable());
                            stats.full_retries.fetch_add(1, Ordering::Relaxed);
                            thread::yield_now();
                        }
                    }
                }
            }
        });

        s.spawn(|| {
            let mut expected = 0u64;
            while expected < N {
                let popped = rx.pop_with(|header, payload| {
                    let mut decoder = Decoder::new(payload);
                    let seq = decoder.get_u64().unwrap();
                    assert_eq!(header.msg_type, (seq % 7) as u32);
                    assert_eq!(decoder.remaining(), (seq % 121) as usize);
                    let body = decoder.get_bytes(decoder.remaining()).unwrap();
                    assert!(body.iter().all(|&b| b == seq as u8));
                    seq
                });
                match popped {
                    Ok(seq) => {
                        assert_eq!(seq, expected, "reordered or lost message");
                        expected += 1;
                        stats.received.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(RingError::Empty) => {
                        stats.empty_retries.fetch_add(1, Ordering::Relaxed);
                        thread::yield_now();
                    }
                    Err(e) => panic!("unexpected pop error: {e}"),
                }
            }
        });
    });
    stats.print_report("variable payloads", start.elapsed());

    assert_eq!(stats.received.load(Ordering::Relaxed), N);
}

#[test]
fn test_copying_pop_retry_across_threads() {
    const N: u32 = 50_000;
    let mut ring: SpscRing = SpscRing::new(2048);
    let (mut tx, mut rx) = ring.split();

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..N {
                let payload = vec![(i % 251) as u8; (i % 64) as usize];
                while tx.push(i, &payload).is_err() {
                    thread::yield_now();
                }
            }
        });

        s.spawn(|| {
            // Buffer sengaja kecil; OutputTooSmall -> pakai buffer besar
            let mut small = [0u8; 16];
            let mut large = [0u8; 64];
            let mut expected = 0u32;
            while expected < N {
                let header = match rx.pop(&mut small) {
                    Ok(header) => header,
                    Err(RingError::OutputTooSmall { needed, .. }) => {
                        assert_eq!(needed, (expected % 64) as usize);
                        rx.pop(&mut large).unwrap()
                    }
                    Err(RingError::Empty) => {
                        thread::yield_now();
                        continue;
                    }
                    Err(e) => panic!("unexpected pop error: {e}"),
                };
                assert_eq!(header.msg_type, expected);
                expected += 1;
            }
        });
    });

    assert!(ring.is_empty());
}
