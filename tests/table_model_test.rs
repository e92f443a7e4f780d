//! Model-based tests: random insert/delete sequences against a `Vec` model.
//!
//! The table must agree with the model record for record, keep every page
//! within `1..=M` records, and come back identical after reopening.

use pagetable::{StoreOptions, TableAccess, TableBuilder, TableConfig};
use proptest::{collection::vec, prelude::*};
use tempfile::tempdir;

/// 4-byte records in 64-byte pages: M = 16, F = 12.
const WIDTH: usize = 4;
const M: usize = 16;

#[derive(Debug, Clone)]
enum Op {
    /// Insert `count` records before a position chosen by `at`.
    Insert { at: u16, count: u8 },
    /// Delete up to `count` records from a position chosen by `at`.
    Delete { at: u16, count: u8 },
    Reopen,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<u16>(), 1..40u8).prop_map(|(at, count)| Op::Insert { at, count }),
        3 => (any::<u16>(), 0..40u8).prop_map(|(at, count)| Op::Delete { at, count }),
        1 => Just(Op::Reopen),
    ]
}

/// Record bytes for serial number `n`.
fn record(n: u32) -> [u8; WIDTH] {
    n.to_le_bytes()
}

fn check(table: &TableAccess, model: &[[u8; WIDTH]]) {
    assert_eq!(table.size(), model.len() as u64);
    for (pos, expected) in model.iter().enumerate() {
        assert_eq!(&table.read_record(pos as u64).unwrap()[..], &expected[..]);
    }
    let mut total = 0;
    for entry in table.entries() {
        assert!(entry.count > 0 && entry.count <= M, "bad count {}", entry.count);
        total += entry.count;
    }
    assert_eq!(total, model.len());
}

fn run(initial: usize, ops: Vec<Op>, cache_pages: usize) {
    let dir = tempdir().unwrap();
    let options = StoreOptions::default()
        .with_cache_pages(cache_pages)
        .with_sync_on_flush(false);
    let config = TableConfig::new(2, 6, 0.75).unwrap();

    let mut serial = 0u32;
    let mut model: Vec<[u8; WIDTH]> = (0..initial)
        .map(|_| {
            serial += 1;
            record(serial)
        })
        .collect();
    let mut table = TableBuilder::new(config)
        .options(options)
        .build(dir.path(), "model", &model.concat())
        .unwrap();

    for op in ops {
        match op {
            Op::Insert { at, count } => {
                let pos = at as usize % (model.len() + 1);
                let new: Vec<[u8; WIDTH]> = (0..count)
                    .map(|_| {
                        serial += 1;
                        record(serial)
                    })
                    .collect();
                table.insert(pos as u64, &new.concat()).unwrap();
                model.splice(pos..pos, new);
            }
            Op::Delete { at, count } => {
                if model.is_empty() {
                    continue;
                }
                let pos = at as usize % model.len();
                let count = (count as usize).min(model.len() - pos);
                table.delete(pos as u64, count as u64).unwrap();
                model.drain(pos..pos + count);
            }
            Op::Reopen => {
                let pages = table.page_count();
                table.close().unwrap();
                table = TableAccess::open_with(dir.path(), "model", options).unwrap();
                assert_eq!(table.page_count(), pages);
            }
        }
        check(&table, &model);
    }

    let entries = table.entries().to_vec();
    table.close().unwrap();
    let table = TableAccess::open(dir.path(), "model").unwrap();
    assert_eq!(table.entries(), &entries[..]);
    check(&table, &model);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn table_matches_model(initial in 0..120usize, ops in vec(op(), 1..40)) {
        run(initial, ops, 64);
    }

    #[test]
    fn table_matches_model_with_tiny_cache(initial in 0..120usize, ops in vec(op(), 1..40)) {
        run(initial, ops, 2);
    }
}

/// Insert and delete that leave pages exactly full or exactly empty.
#[test]
fn exact_capacity_sequence() {
    run(
        24,
        vec![
            Op::Insert { at: 12, count: 4 },
            Op::Insert { at: 0, count: 4 },
            Op::Delete { at: 0, count: 16 },
            Op::Reopen,
            Op::Insert { at: 0, count: 16 },
            Op::Delete { at: 16, count: 12 },
            Op::Reopen,
        ],
        4,
    );
}
