//! SQLite executor integration tests
//!
//! Imports the fixture dataset into a temporary database and checks that a
//! session over SQLite ends up where the in-memory session does.

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use txscope::{
    ExplorerConfig, MemoryExecutor, QueryExecutor, QueryKind, QueryParams, RecordLimit, SessionController,
    SqliteExecutor, TransferDataset,
};

fn fixture() -> TransferDataset {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/transfers.json");
    TransferDataset::from_json_file(&path).unwrap()
}

fn addr(c: char) -> String {
    format!("0x{}", c.to_string().repeat(40))
}

fn imported(temp_dir: &TempDir) -> SqliteExecutor {
    let executor = SqliteExecutor::new(&temp_dir.path().join("transfers.db"));
    executor.ensure_schema().unwrap();
    let stats = executor.import_dataset(&fixture()).unwrap();
    assert_eq!(stats.addresses, 5);
    assert_eq!(stats.transfers, 3);
    executor
}

#[test]
fn test_import_writes_every_row() {
    let temp_dir = TempDir::new().unwrap();
    let executor = imported(&temp_dir);

    let conn = executor.connect().unwrap();
    let count = |table: &str| -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    };
    assert_eq!(count("addresses"), 5);
    assert_eq!(count("transfers"), 3);

    let abnormal: String = conn
        .query_row("SELECT addr FROM addresses WHERE type = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(abnormal, addr('a'));
}

#[tokio::test]
async fn test_sqlite_and_memory_sessions_agree() {
    let temp_dir = TempDir::new().unwrap();
    let sqlite: Arc<dyn QueryExecutor> = Arc::new(imported(&temp_dir));
    let memory: Arc<dyn QueryExecutor> = Arc::new(MemoryExecutor::new(fixture()));
    let limit = RecordLimit::new(100).unwrap();

    let mut sessions: Vec<SessionController<dyn QueryExecutor>> = [sqlite, memory]
        .into_iter()
        .map(|executor| SessionController::new(executor, ExplorerConfig::default()))
        .collect();

    for session in &mut sessions {
        session.search_address(&addr('b'), limit).await.unwrap();
        session.expand(&addr('a'), limit).await.unwrap();
    }

    assert_eq!(sessions[0].snapshot(), sessions[1].snapshot());
    assert_eq!(sessions[0].graph().node_count(), 4);
}

#[tokio::test]
async fn test_detail_rows_over_sqlite() {
    let temp_dir = TempDir::new().unwrap();
    let executor = imported(&temp_dir);

    let rows = executor
        .run(QueryKind::NodeDetail, &QueryParams::for_address(addr('b')))
        .await
        .unwrap();
    // B both sends and receives
    assert_eq!(rows.len(), 2);

    let rows = executor
        .run(QueryKind::NodeDetail, &QueryParams::for_address(addr('e')))
        .await
        .unwrap();
    assert!(rows.is_empty());
}
