//! SQLite-backed node store

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, instrument, warn};

use crate::domain::{Node, NodeId, NodeUpdate};
use crate::infrastructure::error::{StoreError, StoreResult};
use crate::infrastructure::traits::{NodeReader, NodeStore, NodeTransaction};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  parent_id TEXT NULL REFERENCES nodes(id),
  sort_order INTEGER NOT NULL CHECK (sort_order >= 0)
);
CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(parent_id, sort_order);
"#;

const SELECT_NODE: &str = "SELECT id, name, parent_id, sort_order FROM nodes";

/// Durable store on a single SQLite database file.
///
/// Write transactions use `BEGIN IMMEDIATE`, so concurrent writers (threads
/// or processes) serialize on the database write lock. A writer that cannot
/// get the lock within the busy timeout fails with [`StoreError::Conflict`].
#[derive(Debug)]
pub struct SqliteNodeStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteNodeStore {
    #[instrument(level = "debug")]
    pub fn open(path: &Path, busy_timeout: Duration) -> StoreResult<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| StoreError::io(format!("create {}", dir.display()), e))?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| StoreError::sqlite(format!("open {}", path.display()), e))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| StoreError::sqlite("enable WAL", e))?;
        Self::init(conn, Some(path.to_path_buf()), busy_timeout)
    }

    /// Private database, mainly for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::sqlite("open in-memory database", e))?;
        Self::init(conn, None, Duration::ZERO)
    }

    fn init(conn: Connection, path: Option<PathBuf>, busy_timeout: Duration) -> StoreResult<Self> {
        conn.busy_timeout(busy_timeout)
            .map_err(|e| StoreError::sqlite("set busy timeout", e))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| StoreError::sqlite("enable foreign keys", e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::sqlite("migrate schema", e))?;
        debug!("sqlite store ready at {:?}", path);
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

type NodeRow = (String, String, Option<String>, i64);

fn read_row(row: &Row<'_>) -> rusqlite::Result<NodeRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn node_from_row((id, name, parent_id, order): NodeRow) -> StoreResult<Node> {
    let corrupt = |message: String| StoreError::Corrupt {
        id: id.clone(),
        message,
    };
    let node_id = id
        .parse::<NodeId>()
        .map_err(|e| corrupt(format!("invalid id: {}", e)))?;
    let parent_id = parent_id
        .map(|p| p.parse::<NodeId>())
        .transpose()
        .map_err(|e| corrupt(format!("invalid parent id: {}", e)))?;
    let order = u32::try_from(order).map_err(|_| corrupt(format!("invalid order: {}", order)))?;
    Ok(Node {
        id: node_id,
        name,
        parent_id,
        order,
    })
}

fn query_nodes(
    conn: &Connection,
    context: &str,
    sql: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<Node>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| StoreError::sqlite(context, e))?;
    let rows = stmt
        .query_map(params, read_row)
        .map_err(|e| StoreError::sqlite(context, e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| StoreError::sqlite(context, e))?;
    rows.into_iter().map(node_from_row).collect()
}

fn fetch_by_id_on(conn: &Connection, id: &NodeId) -> StoreResult<Option<Node>> {
    let row = conn
        .query_row(
            &format!("{} WHERE id = ?1", SELECT_NODE),
            params![id.to_string()],
            read_row,
        )
        .optional()
        .map_err(|e| StoreError::sqlite(format!("fetch {}", id), e))?;
    row.map(node_from_row).transpose()
}

fn fetch_children_on(conn: &Connection, parent: Option<&NodeId>) -> StoreResult<Vec<Node>> {
    query_nodes(
        conn,
        "fetch children",
        &format!("{} WHERE parent_id IS ?1 ORDER BY sort_order, id", SELECT_NODE),
        params![parent.map(NodeId::to_string)],
    )
}

fn fetch_all_on(conn: &Connection) -> StoreResult<Vec<Node>> {
    query_nodes(conn, "fetch all", SELECT_NODE, [])
}

impl NodeReader for SqliteNodeStore {
    fn fetch_by_id(&self, id: &NodeId) -> StoreResult<Option<Node>> {
        let conn = self.conn()?;
        fetch_by_id_on(&conn, id)
    }

    fn fetch_children_of(&self, parent: Option<&NodeId>) -> StoreResult<Vec<Node>> {
        let conn = self.conn()?;
        fetch_children_on(&conn, parent)
    }

    fn fetch_all(&self) -> StoreResult<Vec<Node>> {
        let conn = self.conn()?;
        fetch_all_on(&conn)
    }
}

impl NodeStore for SqliteNodeStore {
    #[instrument(level = "trace", skip(self))]
    fn begin(&self) -> StoreResult<Box<dyn NodeTransaction + '_>> {
        let conn = self.conn()?;
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| StoreError::sqlite("begin transaction", e))?;
        Ok(Box::new(SqliteTransaction {
            conn,
            finished: false,
        }))
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

/// Open `BEGIN IMMEDIATE` transaction; rolled back on drop unless committed.
pub struct SqliteTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl NodeReader for SqliteTransaction<'_> {
    fn fetch_by_id(&self, id: &NodeId) -> StoreResult<Option<Node>> {
        fetch_by_id_on(&self.conn, id)
    }

    fn fetch_children_of(&self, parent: Option<&NodeId>) -> StoreResult<Vec<Node>> {
        fetch_children_on(&self.conn, parent)
    }

    fn fetch_all(&self) -> StoreResult<Vec<Node>> {
        fetch_all_on(&self.conn)
    }
}

impl NodeTransaction for SqliteTransaction<'_> {
    fn insert(&mut self, node: &Node) -> StoreResult<()> {
        if fetch_by_id_on(&self.conn, &node.id)?.is_some() {
            return Err(StoreError::DuplicateRecord(node.id));
        }
        self.conn
            .execute(
                "INSERT INTO nodes (id, name, parent_id, sort_order) VALUES (?1, ?2, ?3, ?4)",
                params![
                    node.id.to_string(),
                    node.name,
                    node.parent_id.map(|p| p.to_string()),
                    i64::from(node.order)
                ],
            )
            .map_err(|e| StoreError::sqlite(format!("insert {}", node.id), e))?;
        Ok(())
    }

    fn update_fields(&mut self, id: &NodeId, update: &NodeUpdate) -> StoreResult<()> {
        let mut node = fetch_by_id_on(&self.conn, id)?.ok_or(StoreError::MissingRecord(*id))?;
        update.apply(&mut node);
        self.conn
            .execute(
                "UPDATE nodes SET name = ?1, parent_id = ?2, sort_order = ?3 WHERE id = ?4",
                params![
                    node.name,
                    node.parent_id.map(|p| p.to_string()),
                    i64::from(node.order),
                    id.to_string()
                ],
            )
            .map_err(|e| StoreError::sqlite(format!("update {}", id), e))?;
        Ok(())
    }

    fn delete_by_id(&mut self, id: &NodeId) -> StoreResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM nodes WHERE id = ?1", params![id.to_string()])
            .map_err(|e| StoreError::sqlite(format!("delete {}", id), e))?;
        if deleted == 0 {
            return Err(StoreError::MissingRecord(*id));
        }
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| StoreError::sqlite("commit transaction", e))?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            warn!("rollback failed: {}", e);
        }
    }
}
