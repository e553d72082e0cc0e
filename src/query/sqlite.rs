//! SQLite-backed executor
//!
//! Schema:
//!
//! - `addresses(addr TEXT PRIMARY KEY, type INTEGER)`
//! - `transfers(id INTEGER PRIMARY KEY, src TEXT, dst TEXT, count INTEGER, total_amount REAL)`
//!
//! Neighborhood queries union the outgoing and incoming halves of the
//! undirected match, with the anchor always in the `source` position. Queries
//! run on the blocking pool with a fresh read-only connection each.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};

use crate::error::QueryExecutionError;
use crate::graph::ABNORMAL_TYPE_TAG;

use super::{QueryExecutor, QueryKind, QueryParams, RawRow, RawValue, TransferDataset};

/// Counts written by [`SqliteExecutor::import_dataset`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportStats {
    pub addresses: usize,
    pub transfers: usize,
}

/// Executor over a SQLite transfer database
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    db_path: PathBuf,
}

/// Both halves of the undirected match; `{filter}` constrains the anchor `a`.
fn neighborhood_sql(filter: &str, order: &str, limit_param: &str) -> String {
    format!(
        "SELECT * FROM (
            SELECT t.id AS id, a.addr AS source_addr, a.type AS source_type,
                   t.count AS count, t.total_amount AS total_amount, 1 AS is_from_source,
                   b.addr AS target_addr, b.type AS target_type
            FROM transfers t
            JOIN addresses a ON a.addr = t.src
            JOIN addresses b ON b.addr = t.dst
            WHERE {filter}
            UNION ALL
            SELECT t.id, a.addr, a.type, t.count, t.total_amount, 0, b.addr, b.type
            FROM transfers t
            JOIN addresses a ON a.addr = t.dst
            JOIN addresses b ON b.addr = t.src
            WHERE {filter} AND t.src <> t.dst
        )
        ORDER BY {order}
        LIMIT {limit_param}"
    )
}

const DETAIL_SQL: &str = "SELECT CASE WHEN src = ?1 THEN 1 ELSE 0 END AS is_from_source,
                                 SUM(count), SUM(total_amount)
                          FROM transfers
                          WHERE src = ?1 OR dst = ?1
                          GROUP BY is_from_source
                          ORDER BY is_from_source DESC";

impl SqliteExecutor {
    pub fn new(db_path: &Path) -> Self {
        Self {
            db_path: db_path.to_path_buf(),
        }
    }

    pub fn connect(&self) -> Result<Connection, rusqlite::Error> {
        Connection::open(&self.db_path)
    }

    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS addresses (
                    addr TEXT PRIMARY KEY,
                    type INTEGER NOT NULL DEFAULT 0
                )",
            [],
        )
        .map_err(|e| anyhow::anyhow!("Failed to create addresses table: {}", e))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS transfers (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    src TEXT NOT NULL REFERENCES addresses(addr),
                    dst TEXT NOT NULL REFERENCES addresses(addr),
                    count INTEGER NOT NULL,
                    total_amount REAL NOT NULL
                )",
            [],
        )
        .map_err(|e| anyhow::anyhow!("Failed to create transfers table: {}", e))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transfers_src ON transfers(src)",
            [],
        )
        .map_err(|e| anyhow::anyhow!("Failed to create src index: {}", e))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transfers_dst ON transfers(dst)",
            [],
        )
        .map_err(|e| anyhow::anyhow!("Failed to create dst index: {}", e))?;

        conn.execute("CREATE INDEX IF NOT EXISTS idx_addresses_type ON addresses(type)", [])
            .map_err(|e| anyhow::anyhow!("Failed to create type index: {}", e))?;

        Ok(())
    }

    /// Write a dataset in one transaction. Existing addresses are overwritten,
    /// transfers are appended.
    pub fn import_dataset(&self, dataset: &TransferDataset) -> Result<ImportStats> {
        dataset.check()?;
        self.ensure_schema()?;

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut stats = ImportStats::default();
        {
            let mut insert_address =
                tx.prepare("INSERT OR REPLACE INTO addresses (addr, type) VALUES (?1, ?2)")?;
            for address in &dataset.addresses {
                insert_address.execute(params![address.addr, address.type_tag])?;
                stats.addresses += 1;
            }

            let mut insert_transfer = tx.prepare(
                "INSERT INTO transfers (src, dst, count, total_amount) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for transfer in &dataset.transfers {
                let count = i64::try_from(transfer.count)
                    .map_err(|_| anyhow::anyhow!("Transfer count out of range: {}", transfer.count))?;
                insert_transfer.execute(params![transfer.from, transfer.to, count, transfer.total_amount])?;
                stats.transfers += 1;
            }
        }
        tx.commit()?;
        Ok(stats)
    }

    fn open_read_only(path: &Path) -> Result<Connection, rusqlite::Error> {
        Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI,
        )
    }

    fn query_blocking(
        path: &Path,
        kind: QueryKind,
        params: &QueryParams,
    ) -> Result<Vec<RawRow>, QueryExecutionError> {
        let conn = Self::open_read_only(path)?;
        let limit = i64::from(params.limit.map(|l| l.get()).unwrap_or(u32::MAX));

        match kind {
            QueryKind::AbnormalSeed => {
                let sql = neighborhood_sql(
                    "a.type = ?1",
                    "source_type DESC, target_type DESC, id, is_from_source DESC",
                    "?2",
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![ABNORMAL_TYPE_TAG, limit], neighborhood_row)?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            }
            QueryKind::AllAddresses => {
                let sql = neighborhood_sql("1 = 1", "id, is_from_source DESC", "?1");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![limit], neighborhood_row)?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            }
            QueryKind::ByAddress | QueryKind::NodeNeighborhood => {
                let address = required_address(kind, params)?;
                let sql = neighborhood_sql("a.addr = ?1", "id, is_from_source DESC", "?2");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![address, limit], neighborhood_row)?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            }
            QueryKind::NodeDetail => {
                let address = required_address(kind, params)?;
                let mut stmt = conn.prepare(DETAIL_SQL)?;
                let rows = stmt.query_map(params![address], detail_row)?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            }
        }
    }
}

fn required_address(kind: QueryKind, params: &QueryParams) -> Result<String, QueryExecutionError> {
    params
        .address
        .clone()
        .ok_or_else(|| QueryExecutionError::Backend(format!("{} query without an address", kind)))
}

/// Transfer counts are stored as INTEGER; a negative one is corrupt data
fn count_column(row: &Row<'_>, index: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(index)?;
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(index, value))
}

fn neighborhood_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    let source_addr: String = row.get("source_addr")?;
    let source_type: i64 = row.get("source_type")?;
    let count = count_column(row, row.as_ref().column_index("count")?)?;
    let total_amount: f64 = row.get("total_amount")?;
    let is_from_source: i64 = row.get("is_from_source")?;
    let target_addr: String = row.get("target_addr")?;
    let target_type: i64 = row.get("target_type")?;

    Ok(RawRow::neighborhood(
        RawValue::address_node(&source_addr, source_type),
        RawValue::sent(count, total_amount),
        is_from_source != 0,
        RawValue::address_node(&target_addr, target_type),
    ))
}

fn detail_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    let is_from_source: i64 = row.get(0)?;
    let count = count_column(row, 1)?;
    let total_amount: f64 = row.get(2)?;
    Ok(RawRow::detail(is_from_source != 0, count, total_amount))
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn run(&self, kind: QueryKind, params: &QueryParams) -> Result<Vec<RawRow>, QueryExecutionError> {
        let path = self.db_path.clone();
        let params = params.clone();
        tokio::task::spawn_blocking(move || Self::query_blocking(&path, kind, &params))
            .await
            .map_err(|e| QueryExecutionError::Task(e.to_string()))?
    }
}
