//! C1: Store — the durable last-known-good record of every synced node,
//! its edges, the per-file sync watermarks that make up/stale detection
//! possible, plus the conflict-artifact and CRDT side stores.
//!
//! Synchronous `rusqlite` throughout, matching the fully-synchronous style
//! of the rest of this codebase.

pub mod crdt;
mod path_encoding;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OptionalExtension, params};

use crate::model::{Attrs, ConflictArtifact, Edge, FieldConflict, Node, NodeError};

pub use crdt::CrdtStore;

/// Errors a Store operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem I/O failed (creating directories, reading/writing blobs).
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The underlying SQLite database rejected an operation.
    #[error("store database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored JSON blob (attrs, conflict artifact) failed to (de)serialize.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A CRDT snapshot on disk could not be decoded as a valid yrs update.
    #[error("CRDT snapshot corrupt: {0}")]
    CrdtCorrupt(String),
    /// A node failed its own construction invariants while being read back.
    #[error("stored node is invalid: {0}")]
    InvalidNode(#[from] NodeError),
}

/// The Store: one SQLite database for nodes/edges/watermarks, plus the
/// file-backed conflict artifact and CRDT side stores, all rooted at the
/// same `.hardcopy` directory.
pub struct Store {
    conn: Mutex<Connection>,
    #[allow(dead_code)]
    root: PathBuf,
    /// Per-node CRDT document snapshots.
    pub crdt: CrdtStore,
}

impl Store {
    /// Open (creating if absent) the Store rooted at `hardcopy_dir`
    /// (conventionally `<workspace>/.hardcopy`).
    ///
    /// # Errors
    /// Returns [`StoreError`] if the directory or database cannot be
    /// created or the schema cannot be initialized.
    pub fn open(hardcopy_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(hardcopy_dir)?;
        let conn = Connection::open(hardcopy_dir.join("db.sqlite3"))?;
        Self::from_connection(conn, hardcopy_dir)
    }

    /// Open an in-memory Store for tests: the node/edge/watermark tables
    /// live only for the process lifetime, but `crdt`/`conflicts` still
    /// write under `hardcopy_dir` since they are plain files.
    ///
    /// # Errors
    /// Returns [`StoreError`] if `hardcopy_dir` cannot be created or the
    /// schema cannot be initialized.
    pub fn open_in_memory(hardcopy_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(hardcopy_dir)?;
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, hardcopy_dir)
    }

    fn from_connection(conn: Connection, hardcopy_dir: &Path) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS nodes (
                id            TEXT PRIMARY KEY,
                node_type     TEXT NOT NULL,
                attrs         TEXT NOT NULL,
                synced_at     INTEGER NOT NULL,
                version_token TEXT,
                cursor        TEXT
            );
            CREATE INDEX IF NOT EXISTS nodes_type_idx ON nodes(node_type);

            CREATE TABLE IF NOT EXISTS edges (
                edge_type TEXT NOT NULL,
                from_id   TEXT NOT NULL,
                to_id     TEXT NOT NULL,
                attrs     TEXT,
                PRIMARY KEY (edge_type, from_id, to_id)
            );
            CREATE INDEX IF NOT EXISTS edges_from_idx ON edges(from_id);
            CREATE INDEX IF NOT EXISTS edges_to_idx ON edges(to_id);

            CREATE TABLE IF NOT EXISTS file_synced (
                node_id   TEXT NOT NULL,
                rel_path  TEXT NOT NULL,
                synced_at INTEGER NOT NULL,
                PRIMARY KEY (node_id, rel_path)
            );

            CREATE TABLE IF NOT EXISTS conflict_artifacts (
                node_id       TEXT PRIMARY KEY,
                node_type     TEXT NOT NULL,
                file_path     TEXT NOT NULL,
                view_rel_path TEXT NOT NULL,
                detected_at   INTEGER NOT NULL,
                fields_json   TEXT NOT NULL,
                body          TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            root: hardcopy_dir.to_path_buf(),
            crdt: CrdtStore::open(hardcopy_dir)?,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- nodes ------------------------------------------------------------

    /// Insert or overwrite a node.
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database or serialization failure.
    pub fn upsert_node(&self, node: &Node) -> Result<(), StoreError> {
        let attrs_json = serde_json::to_string(&node.attrs)?;
        self.lock().execute(
            "INSERT INTO nodes (id, node_type, attrs, synced_at, version_token, cursor)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                node_type = excluded.node_type,
                attrs = excluded.attrs,
                synced_at = excluded.synced_at,
                version_token = excluded.version_token,
                cursor = excluded.cursor",
            params![
                node.id,
                node.node_type,
                attrs_json,
                node.synced_at,
                node.version_token,
                node.cursor
            ],
        )?;
        Ok(())
    }

    /// Insert or overwrite a batch of nodes in a single transaction.
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database or serialization failure; on
    /// failure no node in the batch is persisted.
    pub fn upsert_nodes(&self, nodes: &[Node]) -> Result<(), StoreError> {
        let mut conn = self.lock();
        let txn = conn.transaction()?;
        for node in nodes {
            let attrs_json = serde_json::to_string(&node.attrs)?;
            txn.execute(
                "INSERT INTO nodes (id, node_type, attrs, synced_at, version_token, cursor)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    node_type = excluded.node_type,
                    attrs = excluded.attrs,
                    synced_at = excluded.synced_at,
                    version_token = excluded.version_token,
                    cursor = excluded.cursor",
                params![
                    node.id,
                    node.node_type,
                    attrs_json,
                    node.synced_at,
                    node.version_token,
                    node.cursor
                ],
            )?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Fetch a single node by id.
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database or deserialization failure.
    pub fn get_node(&self, id: &str) -> Result<Option<Node>, StoreError> {
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT id, node_type, attrs, synced_at, version_token, cursor
                 FROM nodes WHERE id = ?1",
                params![id],
                Self::row_to_node,
            )
            .optional()?;
        row.transpose()
    }

    /// List nodes, optionally restricted to a single `node_type`.
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database or deserialization failure.
    pub fn query_nodes(&self, node_type: Option<&str>) -> Result<Vec<Node>, StoreError> {
        let conn = self.lock();
        let mut stmt = match node_type {
            Some(_) => conn.prepare(
                "SELECT id, node_type, attrs, synced_at, version_token, cursor
                 FROM nodes WHERE node_type = ?1 ORDER BY id",
            )?,
            None => conn.prepare(
                "SELECT id, node_type, attrs, synced_at, version_token, cursor
                 FROM nodes ORDER BY id",
            )?,
        };
        let rows = match node_type {
            Some(t) => stmt.query_map(params![t], Self::row_to_node)?,
            None => stmt.query_map([], Self::row_to_node)?,
        };
        let mut out = Vec::new();
        for row in rows {
            out.push(row??);
        }
        Ok(out)
    }

    /// Delete a node by id, along with every edge incident to it (either
    /// side). Watermarks are left dangling — they key off the file path, not
    /// the node id, and are cleaned up separately when a view stops
    /// rendering the node (see [`Edge`] for the no-referential-integrity
    /// rule this is distinct from: edges pointing at *other* deleted nodes
    /// are allowed to dangle and are ignored during traversal).
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database failure; on failure neither the
    /// node nor its edges are removed.
    pub fn delete_node(&self, id: &str) -> Result<(), StoreError> {
        let mut conn = self.lock();
        let txn = conn.transaction()?;
        txn.execute(
            "DELETE FROM edges WHERE from_id = ?1 OR to_id = ?1",
            params![id],
        )?;
        txn.execute("DELETE FROM nodes WHERE id = ?1", params![id])?;
        txn.commit()?;
        Ok(())
    }

    fn row_to_node(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Node, StoreError>> {
        let id: String = row.get(0)?;
        let node_type: String = row.get(1)?;
        let attrs_json: String = row.get(2)?;
        let synced_at: i64 = row.get(3)?;
        let version_token: Option<String> = row.get(4)?;
        let cursor: Option<String> = row.get(5)?;
        Ok((|| {
            let attrs: Attrs = serde_json::from_str(&attrs_json)?;
            let mut node = Node::new(id, node_type, attrs, synced_at)?;
            node.version_token = version_token;
            node.cursor = cursor;
            Ok(node)
        })())
    }

    // -- edges ------------------------------------------------------------

    /// Insert or overwrite an edge.
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database or serialization failure.
    pub fn upsert_edge(&self, edge: &Edge) -> Result<(), StoreError> {
        let attrs_json = edge.attrs.as_ref().map(serde_json::to_string).transpose()?;
        self.lock().execute(
            "INSERT INTO edges (edge_type, from_id, to_id, attrs)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(edge_type, from_id, to_id) DO UPDATE SET attrs = excluded.attrs",
            params![edge.edge_type, edge.from_id, edge.to_id, attrs_json],
        )?;
        Ok(())
    }

    /// Insert or overwrite a batch of edges in a single transaction.
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database or serialization failure.
    pub fn upsert_edges(&self, edges: &[Edge]) -> Result<(), StoreError> {
        let mut conn = self.lock();
        let txn = conn.transaction()?;
        for edge in edges {
            let attrs_json = edge.attrs.as_ref().map(serde_json::to_string).transpose()?;
            txn.execute(
                "INSERT INTO edges (edge_type, from_id, to_id, attrs)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(edge_type, from_id, to_id) DO UPDATE SET attrs = excluded.attrs",
                params![edge.edge_type, edge.from_id, edge.to_id, attrs_json],
            )?;
        }
        txn.commit()?;
        Ok(())
    }

    /// List edges matching the given optional filters (all `None` lists
    /// every edge).
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database or deserialization failure.
    pub fn get_edges(
        &self,
        from_id: Option<&str>,
        to_id: Option<&str>,
        edge_type: Option<&str>,
    ) -> Result<Vec<Edge>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT edge_type, from_id, to_id, attrs FROM edges
             WHERE (?1 IS NULL OR from_id = ?1)
               AND (?2 IS NULL OR to_id = ?2)
               AND (?3 IS NULL OR edge_type = ?3)
             ORDER BY edge_type, from_id, to_id",
        )?;
        let rows = stmt.query_map(params![from_id, to_id, edge_type], |row| {
            let edge_type: String = row.get(0)?;
            let from_id: String = row.get(1)?;
            let to_id: String = row.get(2)?;
            let attrs_json: Option<String> = row.get(3)?;
            Ok((edge_type, from_id, to_id, attrs_json))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (edge_type, from_id, to_id, attrs_json) = row?;
            let attrs = attrs_json.map(|j| serde_json::from_str(&j)).transpose()?;
            out.push(Edge { edge_type, from_id, to_id, attrs });
        }
        Ok(out)
    }

    /// Delete a single edge by its `(type, from, to)` key.
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database failure.
    pub fn delete_edge(&self, edge_type: &str, from_id: &str, to_id: &str) -> Result<(), StoreError> {
        self.lock().execute(
            "DELETE FROM edges WHERE edge_type = ?1 AND from_id = ?2 AND to_id = ?3",
            params![edge_type, from_id, to_id],
        )?;
        Ok(())
    }

    // -- file watermarks ----------------------------------------------------

    /// The last time `rel_path` (a view file for `node_id`) was known to be
    /// in sync with the Store, or `None` if never recorded.
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database failure.
    pub fn get_file_synced_at(&self, node_id: &str, rel_path: &str) -> Result<Option<i64>, StoreError> {
        Ok(self
            .lock()
            .query_row(
                "SELECT synced_at FROM file_synced WHERE node_id = ?1 AND rel_path = ?2",
                params![node_id, rel_path],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// The node id last recorded as synced at `rel_path`, if any. Used by
    /// orphan reconciliation, which only has a path to go on.
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database failure.
    pub fn find_node_id_by_synced_path(&self, rel_path: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .lock()
            .query_row("SELECT node_id FROM file_synced WHERE rel_path = ?1", params![rel_path], |row| {
                row.get(0)
            })
            .optional()?)
    }

    /// Record that `rel_path` is now in sync with the Store as of
    /// `synced_at`.
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database failure.
    pub fn set_file_synced_at(&self, node_id: &str, rel_path: &str, synced_at: i64) -> Result<(), StoreError> {
        self.lock().execute(
            "INSERT INTO file_synced (node_id, rel_path, synced_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(node_id, rel_path) DO UPDATE SET synced_at = excluded.synced_at",
            params![node_id, rel_path, synced_at],
        )?;
        Ok(())
    }

    /// Remove a watermark. `rel_path = None` removes every watermark for
    /// `node_id` (used when a node is deleted or unmaterialized entirely).
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database failure.
    pub fn delete_file_synced_at(&self, node_id: &str, rel_path: Option<&str>) -> Result<(), StoreError> {
        match rel_path {
            Some(path) => {
                self.lock().execute(
                    "DELETE FROM file_synced WHERE node_id = ?1 AND rel_path = ?2",
                    params![node_id, path],
                )?;
            }
            None => {
                self.lock()
                    .execute("DELETE FROM file_synced WHERE node_id = ?1", params![node_id])?;
            }
        }
        Ok(())
    }

    // -- conflict artifacts -------------------------------------------------

    /// Directory holding the human-editable `.md` mirror of each open
    /// conflict artifact (spec §6's `conflicts/<urlencoded-node-id>.md`).
    fn conflicts_dir(&self) -> PathBuf {
        self.root.join("conflicts")
    }

    /// Path to the `.md` mirror file for `node_id`'s conflict artifact,
    /// whether or not it currently exists.
    #[must_use]
    pub fn conflict_artifact_file_path(&self, node_id: &str) -> PathBuf {
        self.conflicts_dir().join(format!("{}.md", path_encoding::encode_node_id(node_id)))
    }

    /// Persist a conflict artifact: structured fields go into the
    /// `conflict_artifacts` table, and `body` (the marker-delimited text a
    /// user resolves by hand) is additionally mirrored to a plain `.md` file
    /// so it can be opened and edited without any database client. Replaces
    /// any prior artifact for the same node.
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database, I/O, or serialization failure.
    pub fn save_conflict_artifact(&self, artifact: &ConflictArtifact, body: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(self.conflicts_dir())?;
        std::fs::write(self.conflict_artifact_file_path(&artifact.node_id), body)?;
        let fields_json = serde_json::to_string(&artifact.fields)?;
        self.lock().execute(
            "INSERT INTO conflict_artifacts
                (node_id, node_type, file_path, view_rel_path, detected_at, fields_json, body)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(node_id) DO UPDATE SET
                node_type = excluded.node_type,
                file_path = excluded.file_path,
                view_rel_path = excluded.view_rel_path,
                detected_at = excluded.detected_at,
                fields_json = excluded.fields_json,
                body = excluded.body",
            params![
                artifact.node_id,
                artifact.node_type,
                artifact.file_path,
                artifact.view_rel_path,
                artifact.detected_at,
                fields_json,
                body
            ],
        )?;
        Ok(())
    }

    /// Read back a conflict artifact and its editable body, if one is open
    /// for `node_id`.
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database or deserialization failure.
    pub fn get_conflict_artifact(&self, node_id: &str) -> Result<Option<(ConflictArtifact, String)>, StoreError> {
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT node_id, node_type, file_path, view_rel_path, detected_at, fields_json, body
                 FROM conflict_artifacts WHERE node_id = ?1",
                params![node_id],
                Self::row_to_conflict_artifact,
            )
            .optional()?;
        row.transpose()
    }

    /// List every currently open conflict artifact, sorted by node id for
    /// deterministic `conflicts` command output (body omitted, callers fetch
    /// it individually via [`Self::get_conflict_artifact`]).
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database or deserialization failure.
    pub fn list_conflict_artifacts(&self) -> Result<Vec<ConflictArtifact>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT node_id, node_type, file_path, view_rel_path, detected_at, fields_json, body
             FROM conflict_artifacts ORDER BY node_id",
        )?;
        let rows = stmt.query_map([], Self::row_to_conflict_artifact)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row??.0);
        }
        Ok(out)
    }

    /// Remove the conflict artifact for `node_id`, if any (called once its
    /// resolution has been pushed successfully), and its `.md` mirror file.
    ///
    /// # Errors
    /// Returns [`StoreError`] on a database or I/O failure.
    pub fn remove_conflict_artifact(&self, node_id: &str) -> Result<(), StoreError> {
        self.lock()
            .execute("DELETE FROM conflict_artifacts WHERE node_id = ?1", params![node_id])?;
        match std::fs::remove_file(self.conflict_artifact_file_path(node_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the current on-disk `.md` mirror of a conflict artifact's body —
    /// the text a user may have hand-edited while resolving markers, which
    /// can differ from what was last written by [`Self::save_conflict_artifact`].
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the file exists but cannot be read.
    pub fn read_conflict_artifact_file(&self, node_id: &str) -> Result<Option<String>, StoreError> {
        let path = self.conflict_artifact_file_path(node_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn row_to_conflict_artifact(
        row: &rusqlite::Row<'_>,
    ) -> rusqlite::Result<Result<(ConflictArtifact, String), StoreError>> {
        let node_id: String = row.get(0)?;
        let node_type: String = row.get(1)?;
        let file_path: String = row.get(2)?;
        let view_rel_path: String = row.get(3)?;
        let detected_at: i64 = row.get(4)?;
        let fields_json: String = row.get(5)?;
        let body: String = row.get(6)?;
        Ok((|| {
            let fields: Vec<FieldConflict> = serde_json::from_str(&fields_json)?;
            Ok((
                ConflictArtifact { node_id, node_type, file_path, view_rel_path, detected_at, fields },
                body,
            ))
        })())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_in_memory(&dir.path().join(".hardcopy")).unwrap();
        (dir, store)
    }

    fn node(id: &str, title: &str) -> Node {
        Node::new(id, "github.Issue", Attrs::from([("title".to_owned(), json!(title))]), 1).unwrap()
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let (_dir, store) = store();
        store.upsert_node(&node("gh:a#1", "hello")).unwrap();
        let got = store.get_node("gh:a#1").unwrap().unwrap();
        assert_eq!(got.attr("title"), Some(&json!("hello")));
    }

    #[test]
    fn upsert_overwrites_existing_node() {
        let (_dir, store) = store();
        store.upsert_node(&node("gh:a#1", "first")).unwrap();
        store.upsert_node(&node("gh:a#1", "second")).unwrap();
        let got = store.get_node("gh:a#1").unwrap().unwrap();
        assert_eq!(got.attr("title"), Some(&json!("second")));
    }

    #[test]
    fn get_missing_node_is_none() {
        let (_dir, store) = store();
        assert!(store.get_node("gh:nope#1").unwrap().is_none());
    }

    #[test]
    fn query_nodes_filters_by_type() {
        let (_dir, store) = store();
        store.upsert_node(&node("gh:a#1", "a")).unwrap();
        let mut other = node("gh:b#1", "b");
        other.node_type = "github.PullRequest".to_owned();
        store.upsert_node(&other).unwrap();

        let issues = store.query_nodes(Some("github.Issue")).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "gh:a#1");

        assert_eq!(store.query_nodes(None).unwrap().len(), 2);
    }

    #[test]
    fn upsert_nodes_batch_is_transactional() {
        let (_dir, store) = store();
        store.upsert_nodes(&[node("gh:a#1", "a"), node("gh:b#1", "b")]).unwrap();
        assert_eq!(store.query_nodes(None).unwrap().len(), 2);
    }

    #[test]
    fn delete_node_removes_it() {
        let (_dir, store) = store();
        store.upsert_node(&node("gh:a#1", "a")).unwrap();
        store.delete_node("gh:a#1").unwrap();
        assert!(store.get_node("gh:a#1").unwrap().is_none());
    }

    #[test]
    fn delete_node_removes_incident_edges() {
        let (_dir, store) = store();
        store.upsert_node(&node("gh:a#1", "a")).unwrap();
        store.upsert_node(&node("gh:a#2", "a")).unwrap();
        store.upsert_node(&node("gh:a#3", "a")).unwrap();
        store.upsert_edge(&Edge::new("blocks", "gh:a#1", "gh:a#2")).unwrap();
        store.upsert_edge(&Edge::new("blocks", "gh:a#3", "gh:a#1")).unwrap();
        store.upsert_edge(&Edge::new("blocks", "gh:a#2", "gh:a#3")).unwrap();

        store.delete_node("gh:a#1").unwrap();

        assert!(store.get_edges(Some("gh:a#1"), None, None).unwrap().is_empty());
        assert!(store.get_edges(None, Some("gh:a#1"), None).unwrap().is_empty());
        let remaining = store.get_edges(None, None, None).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!((remaining[0].from_id.as_str(), remaining[0].to_id.as_str()), ("gh:a#2", "gh:a#3"));
    }

    #[test]
    fn edges_round_trip_and_filter() {
        let (_dir, store) = store();
        store.upsert_edge(&Edge::new("blocks", "gh:a#1", "gh:a#2")).unwrap();
        store.upsert_edge(&Edge::new("blocks", "gh:a#2", "gh:a#3")).unwrap();

        let from_a1 = store.get_edges(Some("gh:a#1"), None, None).unwrap();
        assert_eq!(from_a1.len(), 1);
        assert_eq!(from_a1[0].to_id, "gh:a#2");

        assert_eq!(store.get_edges(None, None, None).unwrap().len(), 2);
    }

    #[test]
    fn delete_edge_removes_only_that_key() {
        let (_dir, store) = store();
        store.upsert_edge(&Edge::new("blocks", "gh:a#1", "gh:a#2")).unwrap();
        store.upsert_edge(&Edge::new("blocks", "gh:a#1", "gh:a#3")).unwrap();
        store.delete_edge("blocks", "gh:a#1", "gh:a#2").unwrap();

        let remaining = store.get_edges(Some("gh:a#1"), None, None).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].to_id, "gh:a#3");
    }

    #[test]
    fn file_watermark_round_trips() {
        let (_dir, store) = store();
        assert!(store.get_file_synced_at("gh:a#1", "issues/1.md").unwrap().is_none());
        store.set_file_synced_at("gh:a#1", "issues/1.md", 1_700_000_000_000).unwrap();
        assert_eq!(
            store.get_file_synced_at("gh:a#1", "issues/1.md").unwrap(),
            Some(1_700_000_000_000)
        );
    }

    #[test]
    fn finds_node_id_by_synced_path() {
        let (_dir, store) = store();
        assert!(store.find_node_id_by_synced_path("issues/1.md").unwrap().is_none());
        store.set_file_synced_at("gh:a#1", "issues/1.md", 1).unwrap();
        assert_eq!(store.find_node_id_by_synced_path("issues/1.md").unwrap().as_deref(), Some("gh:a#1"));
    }

    #[test]
    fn deleting_watermark_without_path_clears_all_for_node() {
        let (_dir, store) = store();
        store.set_file_synced_at("gh:a#1", "issues/1.md", 1).unwrap();
        store.set_file_synced_at("gh:a#1", "issues/1.alt.md", 2).unwrap();
        store.delete_file_synced_at("gh:a#1", None).unwrap();
        assert!(store.get_file_synced_at("gh:a#1", "issues/1.md").unwrap().is_none());
        assert!(store.get_file_synced_at("gh:a#1", "issues/1.alt.md").unwrap().is_none());
    }

    fn conflict_artifact(node_id: &str) -> crate::model::ConflictArtifact {
        crate::model::ConflictArtifact {
            node_id: node_id.to_owned(),
            node_type: "github.Issue".to_owned(),
            file_path: "/repo/issues/1.md".to_owned(),
            view_rel_path: "issues/1.md".to_owned(),
            detected_at: 1_700_000_000_000,
            fields: vec![crate::model::FieldConflict {
                field: "title".to_owned(),
                status: crate::model::FieldStatus::Diverged,
                can_auto_merge: false,
                base: json!("old"),
                local: json!("local title"),
                remote: json!("remote title"),
            }],
        }
    }

    #[test]
    fn conflict_artifact_round_trips_with_body() {
        let (_dir, store) = store();
        store.save_conflict_artifact(&conflict_artifact("gh:a#1"), "<<<<<<< LOCAL\n...").unwrap();

        let (loaded, body) = store.get_conflict_artifact("gh:a#1").unwrap().unwrap();
        assert_eq!(loaded.fields.len(), 1);
        assert!(body.starts_with("<<<<<<< LOCAL"));
    }

    #[test]
    fn get_missing_conflict_artifact_is_none() {
        let (_dir, store) = store();
        assert!(store.get_conflict_artifact("gh:nope#1").unwrap().is_none());
    }

    #[test]
    fn list_conflict_artifacts_is_sorted_by_node_id() {
        let (_dir, store) = store();
        store.save_conflict_artifact(&conflict_artifact("gh:z#1"), "body").unwrap();
        store.save_conflict_artifact(&conflict_artifact("gh:a#1"), "body").unwrap();

        let ids: Vec<String> =
            store.list_conflict_artifacts().unwrap().into_iter().map(|a| a.node_id).collect();
        assert_eq!(ids, vec!["gh:a#1".to_owned(), "gh:z#1".to_owned()]);
    }

    #[test]
    fn remove_conflict_artifact_clears_it() {
        let (_dir, store) = store();
        store.save_conflict_artifact(&conflict_artifact("gh:a#1"), "body").unwrap();
        store.remove_conflict_artifact("gh:a#1").unwrap();
        assert!(store.get_conflict_artifact("gh:a#1").unwrap().is_none());
    }

    #[test]
    fn conflict_artifact_mirrors_to_an_editable_md_file() {
        let (_dir, store) = store();
        store.save_conflict_artifact(&conflict_artifact("gh:a/b#1"), "## title\nmarkers here").unwrap();

        let path = store.conflict_artifact_file_path("gh:a/b#1");
        assert!(path.exists());
        assert_eq!(
            store.read_conflict_artifact_file("gh:a/b#1").unwrap().unwrap(),
            "## title\nmarkers here"
        );

        store.remove_conflict_artifact("gh:a/b#1").unwrap();
        assert!(!path.exists());
    }
}
