//! Integration tests for memwal
//!
//! End-to-end sessions: write, "crash" (drop without close), reopen.

use std::collections::BTreeMap;
use std::path::Path;

use memwal::config::{Config, WalSyncStrategy};
use memwal::{MemTable, MemWalError};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

const ARENA_SIZE: usize = 4 << 20;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn session<F>(config: &Config, f: F)
where
    F: FnOnce(&mut MemTable<'_>),
{
    let mut buf = vec![0u8; ARENA_SIZE];
    let mut table = MemTable::open(&mut buf, config).unwrap();
    f(&mut table);
}

fn config_for(path: &Path) -> Config {
    Config::builder()
        .wal_path(path)
        .wal_sync_strategy(WalSyncStrategy::EveryNEntries { count: 16 })
        .build()
}

// =============================================================================
// Crash Recovery Tests
// =============================================================================

#[test]
fn test_multiple_sessions_converge() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let config = config_for(&temp.path().join("wal.log"));
    let mut expected: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();

    for round in 0..5u32 {
        session(&config, |table| {
            assert_eq!(table.len(), expected.len());
            for (key, value) in &expected {
                assert_eq!(table.get_ref(key), Some(value.as_slice()));
            }

            for i in 0..40u32 {
                let key = format!("user:{:03}", (i * 7 + round * 13) % 90).into_bytes();
                let value = format!("round{}-{}", round, i).into_bytes();
                table.put(&key, &value).unwrap();
                expected.insert(key, value);
            }
            // Dropped without close(): the crash case
        });
    }

    session(&config, |table| {
        let actual: Vec<(Vec<u8>, Vec<u8>)> = table
            .iter()
            .map(|(k, v)| (k.to_vec(), v.to_vec()))
            .collect();
        let expected: Vec<(Vec<u8>, Vec<u8>)> = expected.clone().into_iter().collect();
        assert_eq!(actual, expected);
        assert_eq!(table.recovery().records_replayed, 200);
    });
}

#[test]
fn test_full_table_survives_restart() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .wal_path(temp.path().join("wal.log"))
        .capacity(32)
        .build();

    session(&config, |table| {
        for i in 0..32 {
            table.put(format!("{:02}", i).as_bytes(), b"x").unwrap();
        }
        assert!(matches!(
            table.put(b"overflow", b"x"),
            Err(MemWalError::MemTableFull { .. })
        ));
    });

    session(&config, |table| {
        assert!(table.is_full());
        assert!(!table.contains_key(b"overflow"));

        // Still full for new keys, still writable for existing ones
        table.put(b"00", b"y").unwrap();
        assert!(table.put(b"new", b"x").is_err());
    });

    session(&config, |table| {
        assert_eq!(table.get_ref(b"00"), Some(&b"y"[..]));
    });
}

#[test]
fn test_arena_is_reused_by_next_session() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let config = config_for(&temp.path().join("wal.log"));
    let mut buf = vec![0u8; ARENA_SIZE];

    {
        let mut table = MemTable::open(&mut buf, &config).unwrap();
        table.put(b"k", b"first").unwrap();
        table.close().unwrap();
    }

    // Same caller buffer, left dirty by the previous session
    let table = MemTable::open(&mut buf, &config).unwrap();
    assert_eq!(table.get_ref(b"k"), Some(&b"first"[..]));
    assert_eq!(table.len(), 1);
}
