//! Append-only JSON-lines moderation store
//!
//! Every mutation is one JSON line appended to `moderation.jsonl` in the
//! data directory; the full index is rebuilt in memory when the store is
//! opened. Malformed lines are skipped on replay rather than failing the
//! open.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use modgate_core::{
    ContentKind, Error, Fingerprint, ModerationRequest, ModerationStatus, NotificationAttempt,
    Result, Verdict,
};

use crate::store::{generate_request_id, ModerationStore};

/// Log file name inside the data directory
const LOG_FILE: &str = "moderation.jsonl";

/// One persisted store mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum StoreEvent {
    RequestCreated {
        request: ModerationRequest,
    },
    StatusChanged {
        request_id: String,
        status: ModerationStatus,
        at: DateTime<Utc>,
    },
    VerdictSaved {
        request_id: String,
        verdict: Verdict,
    },
    NotificationRecorded {
        request_id: String,
        attempt: NotificationAttempt,
    },
}

/// In-memory view of the event log
#[derive(Default)]
struct Index {
    requests: Vec<ModerationRequest>,
    verdicts: HashMap<String, Vec<Verdict>>,
    notifications: HashMap<String, Vec<NotificationAttempt>>,
}

impl Index {
    fn apply(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::RequestCreated { request } => self.requests.push(request),
            StoreEvent::StatusChanged {
                request_id,
                status,
                at,
            } => {
                if let Some(request) = self.requests.iter_mut().find(|r| r.id == request_id) {
                    request.status = status;
                    request.updated_at = at;
                }
            }
            StoreEvent::VerdictSaved {
                request_id,
                verdict,
            } => self.verdicts.entry(request_id).or_default().push(verdict),
            StoreEvent::NotificationRecorded {
                request_id,
                attempt,
            } => self
                .notifications
                .entry(request_id)
                .or_default()
                .push(attempt),
        }
    }

    fn request(&self, request_id: &str) -> Option<&ModerationRequest> {
        self.requests.iter().find(|r| r.id == request_id)
    }
}

struct State {
    index: Index,
    writer: BufWriter<File>,
}

/// Moderation store persisted as an append-only JSON-lines log
pub struct JsonlStore {
    path: PathBuf,
    state: Mutex<State>,
}

impl JsonlStore {
    /// Open (or create) the store under the given data directory,
    /// replaying any existing log into the in-memory index.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(LOG_FILE);

        let mut index = Index::default();
        if path.exists() {
            let file = File::open(&path)?;
            let reader = BufReader::new(file);
            let mut replayed = 0usize;

            for line in reader.lines() {
                let line = line?;
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<StoreEvent>(&line) {
                    Ok(event) => {
                        index.apply(event);
                        replayed += 1;
                    }
                    Err(e) => {
                        debug!("Skipping malformed store event: {}", e);
                    }
                }
            }

            info!(path = %path.display(), events = replayed, "Replayed moderation log");
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            state: Mutex::new(State {
                index,
                writer: BufWriter::new(file),
            }),
        })
    }

    /// Path of the backing log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(state: &mut State, event: StoreEvent) -> Result<()> {
        let json = serde_json::to_string(&event)
            .map_err(|e| Error::store(format!("failed to encode store event: {e}")))?;
        state.writer.write_all(json.as_bytes())?;
        state.writer.write_all(b"\n")?;
        state.writer.flush()?;
        state.index.apply(event);
        Ok(())
    }
}

#[async_trait]
impl ModerationStore for JsonlStore {
    async fn find_by_fingerprint(
        &self,
        kind: ContentKind,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ModerationRequest>> {
        let state = self.state.lock();
        Ok(state
            .index
            .requests
            .iter()
            .rev()
            .find(|r| r.kind == kind && &r.fingerprint == fingerprint)
            .cloned())
    }

    async fn latest_verdict(&self, request_id: &str) -> Result<Option<Verdict>> {
        let state = self.state.lock();
        Ok(state
            .index
            .verdicts
            .get(request_id)
            .and_then(|v| v.last())
            .cloned())
    }

    async fn create_request(
        &self,
        submitter: &str,
        kind: ContentKind,
        fingerprint: Fingerprint,
    ) -> Result<ModerationRequest> {
        let now = Utc::now();
        let request = ModerationRequest {
            id: generate_request_id(),
            submitter: submitter.to_string(),
            kind,
            fingerprint,
            status: ModerationStatus::Processing,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.lock();
        Self::append(
            &mut state,
            StoreEvent::RequestCreated {
                request: request.clone(),
            },
        )?;
        Ok(request)
    }

    async fn save_verdict(&self, request_id: &str, verdict: Verdict) -> Result<()> {
        let mut state = self.state.lock();
        if state.index.request(request_id).is_none() {
            return Err(Error::store(format!("unknown request: {request_id}")));
        }
        Self::append(
            &mut state,
            StoreEvent::VerdictSaved {
                request_id: request_id.to_string(),
                verdict,
            },
        )
    }

    async fn set_status(&self, request_id: &str, status: ModerationStatus) -> Result<()> {
        let mut state = self.state.lock();
        let current = state
            .index
            .request(request_id)
            .ok_or_else(|| Error::store(format!("unknown request: {request_id}")))?
            .status;

        if current.is_terminal() {
            warn!(request_id = %request_id, current = ?current, "Ignoring status change on terminal request");
            return Ok(());
        }

        Self::append(
            &mut state,
            StoreEvent::StatusChanged {
                request_id: request_id.to_string(),
                status,
                at: Utc::now(),
            },
        )
    }

    async fn record_notification(
        &self,
        request_id: &str,
        attempt: NotificationAttempt,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if state.index.request(request_id).is_none() {
            return Err(Error::store(format!("unknown request: {request_id}")));
        }
        Self::append(
            &mut state,
            StoreEvent::NotificationRecorded {
                request_id: request_id.to_string(),
                attempt,
            },
        )
    }

    async fn requests_for_submitter(&self, submitter: &str) -> Result<Vec<ModerationRequest>> {
        let state = self.state.lock();
        Ok(state
            .index
            .requests
            .iter()
            .filter(|r| r.submitter == submitter)
            .cloned()
            .collect())
    }

    async fn verdicts_for_request(&self, request_id: &str) -> Result<Vec<Verdict>> {
        let state = self.state.lock();
        Ok(state
            .index
            .verdicts
            .get(request_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn notifications_for_request(
        &self,
        request_id: &str,
    ) -> Result<Vec<NotificationAttempt>> {
        let state = self.state.lock();
        Ok(state
            .index
            .notifications
            .get(request_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn submitters(&self) -> Result<Vec<String>> {
        let state = self.state.lock();
        let mut seen = Vec::new();
        for request in &state.index.requests {
            if !seen.contains(&request.submitter) {
                seen.push(request.submitter.clone());
            }
        }
        Ok(seen)
    }
}
