//! Concurrent allocations against one blood type.
//!
//! In-memory databases run on a single connection, so the file-backed tests
//! are the ones that exercise several pooled connections racing each other.

use std::path::PathBuf;

use bloodbank::Error;
use bloodbank::ledger::InventoryLedger;
use bloodbank::model::BloodType;
use bloodbank::storage::Storage;

/// A SQLite file under the system temp dir, removed on drop.
struct TempDatabase {
    path: PathBuf,
}

impl TempDatabase {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("bloodbank-{}.db", uuid::Uuid::new_v4()));
        Self { path }
    }

    fn url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path.display())
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_consume_never_oversells() {
    let storage = Storage::new("sqlite::memory:").await.unwrap();
    let ledger = InventoryLedger::new(storage);
    ledger.replenish(BloodType::ONeg, 10, None, None).await.unwrap();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.consume(BloodType::ONeg, 1).await })
        })
        .collect();

    let mut succeeded = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(record) => {
                assert!(record.units >= 0);
                succeeded += 1;
            }
            Err(Error::InsufficientStock { available, .. }) => {
                assert_eq!(available, 0);
                refused += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(refused, 10);
    assert_eq!(ledger.get_by_type(BloodType::ONeg).await.unwrap().units, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_replenish_and_consume_balance() {
    let storage = Storage::new("sqlite::memory:").await.unwrap();
    let ledger = InventoryLedger::new(storage);
    ledger.replenish(BloodType::AbPos, 50, None, None).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..30 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                ledger.replenish(BloodType::AbPos, 3, None, None).await.map(|_| ())
            } else {
                ledger.consume(BloodType::AbPos, 2).await.map(|_| ())
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // 50 + 15 * 3 - 15 * 2
    let record = ledger.get_by_type(BloodType::AbPos).await.unwrap();
    assert_eq!(record.units, 65);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_oversized_allocations_leave_stock_untouched() {
    let storage = Storage::new("sqlite::memory:").await.unwrap();
    let ledger = InventoryLedger::new(storage);
    ledger.replenish(BloodType::BNeg, 5, None, None).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.consume(BloodType::BNeg, 6).await })
        })
        .collect();

    for handle in handles {
        assert!(matches!(
            handle.await.unwrap(),
            Err(Error::InsufficientStock { requested: 6, available: 5, .. })
        ));
    }

    assert_eq!(ledger.get_by_type(BloodType::BNeg).await.unwrap().units, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_file_database_concurrent_consume_never_oversells() {
    let db = TempDatabase::new();
    let ledger = InventoryLedger::new(Storage::new(&db.url()).await.unwrap());
    ledger.replenish(BloodType::OPos, 10, None, None).await.unwrap();

    let handles: Vec<_> = (0..40)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.consume(BloodType::OPos, 1).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(record) => {
                assert!(record.units >= 0);
                succeeded += 1;
            }
            Err(Error::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(ledger.get_by_type(BloodType::OPos).await.unwrap().units, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_file_database_mixed_movements_lose_no_update() {
    let db = TempDatabase::new();
    let ledger = InventoryLedger::new(Storage::new(&db.url()).await.unwrap());
    ledger.replenish(BloodType::ANeg, 100, None, None).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..200 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                ledger.replenish(BloodType::ANeg, 3, None, None).await.map(|_| ())
            } else {
                ledger.consume(BloodType::ANeg, 2).await.map(|_| ())
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // 100 + 100 * 3 - 100 * 2
    let record = ledger.get_by_type(BloodType::ANeg).await.unwrap();
    assert_eq!(record.units, 200);
}
