//! Integration tests for the page store.
//!
//! These tests verify cross-component behavior that unit tests don't cover.

use pagetable::{IndexEntry, PageIndex, PageStore, StoreOptions, TableConfig};
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

fn config() -> TableConfig {
    TableConfig::new(3, 6, 0.75).unwrap()
}

fn create_store(cache_pages: usize) -> (PageStore, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let options = StoreOptions::default()
        .with_cache_pages(cache_pages)
        .with_sync_on_flush(false);
    let store = PageStore::create(dir.path(), "store", config(), options).unwrap();
    (store, dir)
}

/// Test data persistence across multiple eviction cycles.
#[test]
fn test_data_persistence_across_evictions() {
    let (mut store, _dir) = create_store(2);

    // Create 5 pages with unique data; dirty pages stay cached until flush
    let mut page_ids = vec![];
    for i in 0u8..5 {
        let page_id = store.allocate().unwrap();
        store
            .with_page_mut(page_id, |page| {
                page.as_mut_slice()[0] = i;
                page.as_mut_slice()[1] = i.wrapping_mul(3);
            })
            .unwrap();
        page_ids.push(page_id);
    }
    assert_eq!(store.stats().snapshot().evictions, 0);

    store.flush(&PageIndex::new()).unwrap();
    assert_eq!(store.stats().snapshot().evictions, 3);

    // Read all back, cycling every page through the cache twice
    for _ in 0..2 {
        for (i, &pid) in page_ids.iter().enumerate() {
            let data = store.read(pid).unwrap();
            assert_eq!(data[0], i as u8);
            assert_eq!(data[1], (i as u8).wrapping_mul(3));
        }
    }
    assert!(store.stats().snapshot().evictions >= 8);
}

/// Writes that were never flushed do not reach the data file.
#[test]
fn test_unflushed_writes_not_persisted() {
    let dir = tempdir().unwrap();
    let options = StoreOptions::default()
        .with_cache_pages(1)
        .with_sync_on_flush(false);
    let mut index = PageIndex::new();
    {
        let mut store = PageStore::create(dir.path(), "store", config(), options).unwrap();
        for i in 0u8..3 {
            let page_id = store.allocate().unwrap();
            store
                .with_page_mut(page_id, |page| page.as_mut_slice().fill(i + 1))
                .unwrap();
            index.insert_at(index.len(), page_id, 1);
        }
        store.flush(&index).unwrap();

        // Overwrite every page through the one-page cache, then drop unflushed
        for entry in index.entries() {
            store
                .with_page_mut(entry.page_id, |page| page.as_mut_slice().fill(0xEE))
                .unwrap();
        }
        assert_eq!(store.stats().snapshot().pages_written, 3);
    }

    let (store, reopened) = PageStore::open(dir.path(), "store", options).unwrap();
    assert_eq!(reopened, index);
    for (i, entry) in reopened.entries().iter().enumerate() {
        let bytes = store.read(entry.page_id).unwrap();
        assert!(bytes.iter().all(|&b| b == i as u8 + 1));
    }
}

/// Test flush and reload across store instances.
#[test]
fn test_flush_and_reload() {
    let dir = tempdir().unwrap();
    let data = b"persistent!";
    let mut index = PageIndex::new();

    // First session: create and write
    {
        let mut store =
            PageStore::create(dir.path(), "store", config(), StoreOptions::default()).unwrap();
        for count in [3, 5] {
            let page_id = store.allocate().unwrap();
            store
                .with_page_mut(page_id, |page| {
                    page.as_mut_slice()[..data.len()].copy_from_slice(data)
                })
                .unwrap();
            index.insert_at(index.len(), page_id, count);
        }
        // A page that was handed out and returned
        let spare = store.allocate().unwrap();
        store.free(spare);
        store.flush(&index).unwrap();
    }

    // Second session: verify data, directory and free list
    {
        let (store, reopened) = PageStore::open(dir.path(), "store", StoreOptions::default()).unwrap();
        assert_eq!(reopened, index);
        assert_eq!(reopened.size(), 8);
        assert_eq!(store.free_list().len(), 1);
        assert_eq!(store.file_pages(), 3);

        for entry in reopened.entries() {
            let bytes = store.read(entry.page_id).unwrap();
            assert_eq!(&bytes[..data.len()], data);
        }
    }
}

/// Freed pages are reused before the data file grows.
#[test]
fn test_free_pages_reused_first() {
    let (mut store, _dir) = create_store(8);

    let ids: Vec<_> = (0..4).map(|_| store.allocate().unwrap()).collect();
    store.free(ids[2]);
    store.free(ids[0]);

    // Lowest id first, and reused pages come back zeroed
    assert_eq!(store.allocate().unwrap(), ids[0]);
    assert_eq!(store.allocate().unwrap(), ids[2]);
    assert!(store.read(ids[2]).unwrap().iter().all(|&b| b == 0));
    assert_eq!(store.file_pages(), 4);

    store.allocate().unwrap();
    assert_eq!(store.file_pages(), 5);
}

/// Test concurrent readers sharing one store.
#[test]
fn test_concurrent_readers() {
    let (mut store, _dir) = create_store(3);
    let mut index = PageIndex::new();
    for i in 0u8..6 {
        let page_id = store.allocate().unwrap();
        store
            .with_page_mut(page_id, |page| page.as_mut_slice().fill(i))
            .unwrap();
        index.insert_at(index.len(), page_id, 1);
    }
    store.flush(&index).unwrap();

    let store = Arc::new(store);
    let entries: Arc<Vec<IndexEntry>> = Arc::new(index.entries().to_vec());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            let entries = Arc::clone(&entries);
            thread::spawn(move || {
                for round in 0..50 {
                    let i = (t + round) % entries.len();
                    let first = store
                        .with_page(entries[i].page_id, |page| page.as_slice()[0])
                        .unwrap();
                    assert_eq!(first, i as u8);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

/// Pages appended after the last flush come back as free pages.
#[test]
fn test_unflushed_pages_reclaimed_on_open() {
    let dir = tempdir().unwrap();
    let options = StoreOptions::default().with_sync_on_flush(false);
    let mut index = PageIndex::new();
    {
        let mut store = PageStore::create(dir.path(), "store", config(), options).unwrap();
        let page_id = store.allocate().unwrap();
        index.insert_at(0, page_id, 2);
        store.flush(&index).unwrap();

        // Grows the file; no metadata is written afterwards
        for _ in 0..3 {
            store.allocate().unwrap();
        }
    }

    let (store, reopened) = PageStore::open(dir.path(), "store", options).unwrap();
    assert_eq!(reopened, index);
    assert_eq!(store.file_pages(), 4);
    assert_eq!(store.free_list().len(), 3);
}
