// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{
    ContextFile, EditId, EditOp, IdError, PendingEdit, Presentation, Session, SessionId, Slide,
    SlideLayout,
};

const DOCUMENT_FILENAME: &str = "session.json";
const INDEX_DB_FILENAME: &str = "sessions.db";
const SESSIONS_DIRNAME: &str = "sessions";

/// A session checked out of the store. The per-session mutex serializes
/// concurrent staging/commit calls on the same session; the store's own map
/// bookkeeping sits behind one coarse lock.
pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    Index {
        source: rusqlite::Error,
    },
    InvalidDocument {
        path: PathBuf,
        detail: String,
    },
    InvalidId {
        value: String,
        source: IdError,
    },
    InvalidRelativePath {
        field: &'static str,
        value: PathBuf,
    },
    PathOutsideRoot {
        root: PathBuf,
        path: PathBuf,
    },
    SymlinkRefused {
        path: PathBuf,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
            Self::Index { source } => write!(f, "session index error: {source}"),
            Self::InvalidDocument { path, detail } => {
                write!(f, "invalid session document at {path:?}: {detail}")
            }
            Self::InvalidId { value, source } => {
                write!(f, "invalid session id {value:?}: {source}")
            }
            Self::InvalidRelativePath { field, value } => {
                write!(f, "invalid relative path for {field}: {value:?}")
            }
            Self::PathOutsideRoot { root, path } => {
                write!(f, "path is outside data root: root={root:?} path={path:?}")
            }
            Self::SymlinkRefused { path } => {
                write!(f, "refusing to write through symlink at {path:?}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Index { source } => Some(source),
            Self::InvalidId { source, .. } => Some(source),
            Self::InvalidDocument { .. }
            | Self::InvalidRelativePath { .. }
            | Self::PathOutsideRoot { .. }
            | Self::SymlinkRefused { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(source: rusqlite::Error) -> Self {
        Self::Index { source }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to
    /// stable storage where possible. Exact guarantees are
    /// platform/filesystem-dependent.
    Durable,
}

/// The single source of truth mapping `session_id -> Session`.
///
/// Combines an in-memory cache of live session handles with two durable
/// mirrors: a full JSON document per session (complete state recovery) and a
/// compact SQLite index row (fast existence/age queries for the sweeper).
/// Every `save` rewrites document first, then index.
pub struct SessionStore {
    root: PathBuf,
    durability: WriteDurability,
    cache: Mutex<HashMap<SessionId, SessionHandle>>,
    index: Mutex<rusqlite::Connection>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("root", &self.root)
            .field("durability", &self.durability)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Opens (or initializes) a store rooted at `root`: creates the sessions
    /// directory and the index database with its schema.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with_durability(root, WriteDurability::default())
    }

    pub fn open_with_durability(
        root: impl Into<PathBuf>,
        durability: WriteDurability,
    ) -> Result<Self, StoreError> {
        let root = root.into();
        let sessions_dir = root.join(SESSIONS_DIRNAME);
        fs::create_dir_all(&sessions_dir).map_err(|source| StoreError::Io {
            path: sessions_dir,
            source,
        })?;

        let index = rusqlite::Connection::open(root.join(INDEX_DB_FILENAME))?;
        index.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                agent_session_id TEXT
            )",
            [],
        )?;

        Ok(Self {
            root,
            durability,
            cache: Mutex::new(HashMap::new()),
            index: Mutex::new(index),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    fn sessions_dir(&self) -> PathBuf {
        self.root.join(SESSIONS_DIRNAME)
    }

    fn session_dir(&self, session_id: &SessionId) -> PathBuf {
        self.sessions_dir().join(session_id.as_str())
    }

    fn document_path(&self, session_id: &SessionId) -> PathBuf {
        self.session_dir(session_id).join(DOCUMENT_FILENAME)
    }

    /// Resolves an existing session or creates a fresh one.
    ///
    /// Lookup chain: cache, then the durable document, then a brand-new
    /// session (generating an id when none is given) written to both
    /// mirrors. Returns the handle plus whether the session was created.
    pub fn get_or_create(
        &self,
        session_id: Option<SessionId>,
    ) -> Result<(SessionHandle, bool), StoreError> {
        let mut cache = self.cache.lock().expect("session cache lock poisoned");

        if let Some(id) = &session_id {
            if let Some(handle) = cache.get(id) {
                return Ok((handle.clone(), false));
            }
            if let Some(session) = self.load_document(id) {
                let handle: SessionHandle = Arc::new(tokio::sync::Mutex::new(session));
                cache.insert(id.clone(), handle.clone());
                return Ok((handle, false));
            }
        }

        let session = Session::new(session_id.unwrap_or_else(SessionId::generate));
        self.write_document(&session)?;
        self.write_index_row(&session)?;

        let id = session.session_id().clone();
        let handle: SessionHandle = Arc::new(tokio::sync::Mutex::new(session));
        cache.insert(id, handle.clone());
        Ok((handle, true))
    }

    /// Same lookup chain as [`get_or_create`](Self::get_or_create) but
    /// returns `None` instead of creating.
    pub fn load(&self, session_id: &SessionId) -> Result<Option<SessionHandle>, StoreError> {
        let mut cache = self.cache.lock().expect("session cache lock poisoned");

        if let Some(handle) = cache.get(session_id) {
            return Ok(Some(handle.clone()));
        }

        match self.load_document(session_id) {
            Some(session) => {
                let handle: SessionHandle = Arc::new(tokio::sync::Mutex::new(session));
                cache.insert(session_id.clone(), handle.clone());
                Ok(Some(handle))
            }
            None => Ok(None),
        }
    }

    /// Stamps `updated_at` and rewrites both durable mirrors.
    ///
    /// Must be called after every commit and after any out-of-band session
    /// mutation. The caller normally holds the session's handle lock, so the
    /// mirrors never observe a half-mutated session.
    pub fn save(&self, session: &mut Session) -> Result<(), StoreError> {
        session.touch();
        self.write_document(session)?;
        self.write_index_row(session)?;
        Ok(())
    }

    /// Removes every session whose index row is older than `cutoff_millis`,
    /// in the order cache -> document -> index row. Each step is a no-op on
    /// absence, so a retried sweep over an already-purged session removes
    /// nothing and reports 0.
    pub fn sweep(&self, cutoff_millis: u64) -> Result<usize, StoreError> {
        let expired: Vec<String> = {
            let index = self.index.lock().expect("session index lock poisoned");
            let mut statement =
                index.prepare("SELECT session_id FROM sessions WHERE updated_at < ?1")?;
            let rows = statement.query_map([cutoff_millis as i64], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };
        if expired.is_empty() {
            return Ok(0);
        }

        // Drop all expired entries from the cache in one pass, then release
        // the lock before any filesystem work so concurrent lookups are not
        // blocked behind directory deletion.
        {
            let mut cache = self.cache.lock().expect("session cache lock poisoned");
            for raw_id in &expired {
                if let Ok(id) = SessionId::new(raw_id.clone()) {
                    cache.remove(&id);
                }
            }
        }

        let mut removed = 0;
        for raw_id in expired {
            match SessionId::new(raw_id.clone()) {
                Ok(id) => {
                    let dir = self.session_dir(&id);
                    match fs::remove_dir_all(&dir) {
                        Ok(()) => {}
                        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                        Err(source) => return Err(StoreError::Io { path: dir, source }),
                    }
                }
                Err(err) => {
                    // An unparseable row has no document dir to clean up;
                    // still drop the row below.
                    tracing::warn!(session_id = %raw_id, error = %err, "sweeping malformed index row");
                }
            }

            let index = self.index.lock().expect("session index lock poisoned");
            index.execute("DELETE FROM sessions WHERE session_id = ?1", [&raw_id])?;
            removed += 1;
            tracing::debug!(session_id = %raw_id, "swept expired session");
        }

        Ok(removed)
    }

    /// Drops a session from the in-memory cache only; durable mirrors are
    /// untouched. Used by tests to exercise the recovery path.
    pub fn evict_cached(&self, session_id: &SessionId) {
        let mut cache = self.cache.lock().expect("session cache lock poisoned");
        cache.remove(session_id);
    }

    /// Reads and decodes the full document mirror.
    ///
    /// Any failure here (missing file, unreadable JSON, malformed document)
    /// is soft: the session is treated as not found rather than poisoning
    /// the cache with partial state. Genuine corruption is logged.
    fn load_document(&self, session_id: &SessionId) -> Option<Session> {
        let path = self.document_path(session_id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %err,
                        "cannot read session document; treating as not found"
                    );
                }
                return None;
            }
        };

        let doc: SessionDocJson = match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %err,
                    "cannot decode session document; treating as not found"
                );
                return None;
            }
        };

        match session_from_doc(doc, &path) {
            Ok(session) => Some(session),
            Err(err) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %err,
                    "malformed session document; treating as not found"
                );
                None
            }
        }
    }

    fn write_document(&self, session: &Session) -> Result<(), StoreError> {
        let path = self.document_path(session.session_id());
        let doc = session_to_doc(session);
        let json = serde_json::to_string_pretty(&doc).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        write_atomic_in_root(
            &self.root,
            &path,
            format!("{json}\n").as_bytes(),
            self.durability,
        )
    }

    fn write_index_row(&self, session: &Session) -> Result<(), StoreError> {
        let index = self.index.lock().expect("session index lock poisoned");
        index.execute(
            "INSERT OR REPLACE INTO sessions
                (session_id, created_at, updated_at, agent_session_id)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                session.session_id().as_str(),
                session.created_at_millis() as i64,
                session.updated_at_millis() as i64,
                session.agent_session_id(),
            ],
        )?;
        Ok(())
    }
}

// Extracted document-JSON conversion and safe filesystem-write helpers.
include!("session_store/helpers.rs");

#[cfg(test)]
mod tests;
