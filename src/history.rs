//! In-memory ring of recent run summaries for `/debug/runs`.

use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Short fingerprint of one finished run. Never holds page content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub ts_unix: u64,
    pub web_id: Option<String>,
    pub url_count: usize,
    /// `ok` or the error kind (`all_fetches_failed`, `timeout`, ...).
    pub outcome: String,
    /// Step the run was in when it failed.
    pub failed_step: Option<String>,
    pub successful_count: usize,
    pub failed_count: usize,
    pub duration_ms: u64,
}

#[derive(Debug)]
pub struct RunHistory {
    inner: Mutex<Vec<RunRecord>>,
    cap: usize,
}

impl RunHistory {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.clamp(1, 10_000);
        Self {
            inner: Mutex::new(Vec::with_capacity(cap)),
            cap,
        }
    }

    pub fn push(&self, record: RunRecord) {
        let mut v = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        v.push(record);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    /// Up to `n` most recent records, oldest first.
    pub fn snapshot_last_n(&self, n: usize) -> Vec<RunRecord> {
        let v = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let start = v.len().saturating_sub(n);
        v[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RunHistory {
    fn default() -> Self {
        Self::with_capacity(200)
    }
}

pub(crate) fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
