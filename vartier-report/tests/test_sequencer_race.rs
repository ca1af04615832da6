//! Concurrency test for report-number allocation: the race that once
//! produced two reports numbered 1 for the same sample must be
//! impossible. N concurrent allocations yield exactly 1..=N.

use std::sync::Arc;
use std::thread;

use vartier_core::models::Sample;
use vartier_report::{MemorySampleStore, ReportSequencer};

#[test]
fn concurrent_allocations_are_unique_and_gapless() {
    let store = Arc::new(MemorySampleStore::new());
    store.insert(Sample::new("25MD08436", "myeloid_GMSv1"));

    const WORKERS: usize = 16;
    let mut handles = Vec::with_capacity(WORKERS);
    for _ in 0..WORKERS {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            let sequencer = ReportSequencer::new(store.as_ref());
            sequencer.next_report_number("25MD08436").unwrap()
        }));
    }

    let mut numbers: Vec<u32> = handles
        .into_iter()
        .map(|h| h.join().expect("allocation thread panicked"))
        .collect();
    numbers.sort_unstable();

    // No duplicates, no gaps: exactly 1..=N.
    let expected: Vec<u32> = (1..=WORKERS as u32).collect();
    assert_eq!(numbers, expected);
}

#[test]
fn allocations_for_different_samples_do_not_interfere() {
    let store = Arc::new(MemorySampleStore::new());
    store.insert(Sample::new("A", "myeloid"));
    store.insert(Sample::new("B", "myeloid"));

    let mut handles = Vec::new();
    for sample_id in ["A", "B"] {
        for _ in 0..4 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                let sequencer = ReportSequencer::new(store.as_ref());
                (sample_id, sequencer.next_report_number(sample_id).unwrap())
            }));
        }
    }

    let mut a = Vec::new();
    let mut b = Vec::new();
    for handle in handles {
        let (sample_id, num) = handle.join().expect("allocation thread panicked");
        match sample_id {
            "A" => a.push(num),
            _ => b.push(num),
        }
    }
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, vec![1, 2, 3, 4]);
    assert_eq!(b, vec![1, 2, 3, 4]);
}
