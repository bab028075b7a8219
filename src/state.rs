// src/state.rs
//! Persisted published-id set. The file store is the only durable state in
//! the system: a JSON array of id strings, loaded once at run start and
//! rewritten on every commit (write-through), so a crash right after a
//! successful send can never produce a duplicate post.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub trait PublishedStore: Send {
    /// Read the full set. Called exactly once per run, before any send.
    fn load(&self) -> Result<HashSet<String>>;
    /// Persist one id immediately. Called only after a positive ack.
    fn commit(&mut self, id: &str) -> Result<()>;
}

pub struct FilePublishedStore {
    path: PathBuf,
    /// Recency order, oldest first; capped at `cap` on commit.
    ids: Vec<String>,
    cap: usize,
}

impl FilePublishedStore {
    pub fn open(path: &Path, cap: usize) -> Result<Self> {
        let ids = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading state from {}", path.display()))?;
            serde_json::from_str::<Vec<String>>(&content)
                .with_context(|| format!("parsing state file {}", path.display()))?
        } else {
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            ids,
            cap,
        })
    }

    fn flush(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating state dir {}", dir.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(&self.ids)?;
        // Temp-then-rename so a crash mid-write can never leave a truncated
        // file behind; the next run either sees the old state or the new.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("writing state to {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing state file {}", self.path.display()))
    }
}

impl PublishedStore for FilePublishedStore {
    fn load(&self) -> Result<HashSet<String>> {
        Ok(self.ids.iter().cloned().collect())
    }

    fn commit(&mut self, id: &str) -> Result<()> {
        if self.ids.iter().any(|x| x == id) {
            return Ok(());
        }
        self.ids.push(id.to_string());
        if self.ids.len() > self.cap {
            // Evict oldest. With one post per run and a short freshness
            // window the cap can never drop an id that could still reappear
            // as a fresh candidate.
            let excess = self.ids.len() - self.cap;
            self.ids.drain(0..excess);
        }
        self.flush()
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryPublishedStore {
    pub ids: HashSet<String>,
}

impl MemoryPublishedStore {
    pub fn with_ids<I: IntoIterator<Item = String>>(ids: I) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }
}

impl PublishedStore for MemoryPublishedStore {
    fn load(&self) -> Result<HashSet<String>> {
        Ok(self.ids.clone())
    }

    fn commit(&mut self, id: &str) -> Result<()> {
        self.ids.insert(id.to_string());
        Ok(())
    }
}
