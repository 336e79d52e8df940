//! Charging session service
//!
//! Owns the start/end state machine. HTTP handlers are thin wrappers that
//! delegate here; the repository only persists what this service decides.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::session::validate_percentage;
use crate::domain::{
    ChargingSession, DomainError, DomainResult, ExportRow, RecordKind, SessionRepository,
    SessionStatus, SortOrder,
};

pub struct ChargingSessionService {
    repo: Arc<dyn SessionRepository>,
    /// Serializes start/end transitions within this process
    transition_lock: Mutex<()>,
}

impl ChargingSessionService {
    pub fn new(repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            repo,
            transition_lock: Mutex::new(()),
        }
    }

    // ── Transitions ─────────────────────────────────────────────

    /// Record a raw `start`/`end` reading as received from a client.
    ///
    /// The percentage is checked before the kind, so `("bogus", 150)` is a
    /// validation error rather than an invalid-argument error.
    pub async fn record(&self, kind: &str, percentage: i64) -> DomainResult<ChargingSession> {
        let percentage = validate_percentage(percentage)?;
        let kind: RecordKind = kind.parse()?;
        match kind {
            RecordKind::Start => self.start(percentage).await,
            RecordKind::End => self.end(percentage).await,
        }
    }

    /// Open a new session. Rejected while another session is open.
    async fn start(&self, percentage: i32) -> DomainResult<ChargingSession> {
        let _guard = self.transition_lock.lock().await;

        if let Some(open) = self.repo.find_open().await? {
            warn!(session_id = open.id, "Start rejected: session already open");
            return Err(DomainError::SessionAlreadyOpen(open.id));
        }

        let session = self.repo.create(percentage, Utc::now()).await?;
        info!(session_id = session.id, percentage, "Charging session started");
        Ok(session)
    }

    /// Close the currently open session.
    async fn end(&self, percentage: i32) -> DomainResult<ChargingSession> {
        let _guard = self.transition_lock.lock().await;

        let Some(open) = self.repo.find_open().await? else {
            return Err(DomainError::NoActiveSession);
        };

        match self.repo.close(&open, percentage, Utc::now()).await {
            Ok(session) => {
                info!(session_id = session.id, percentage, "Charging session ended");
                Ok(session)
            }
            // Closed or removed by another writer between lookup and update
            Err(DomainError::SessionAlreadyClosed(_)) | Err(DomainError::NotFound { .. }) => {
                warn!(session_id = open.id, "End lost a race with a concurrent writer");
                Err(DomainError::NoActiveSession)
            }
            Err(e) => Err(e),
        }
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn status(&self) -> DomainResult<SessionStatus> {
        Ok(match self.repo.find_open().await? {
            Some(open) => SessionStatus::Charging {
                start_percentage: open.start_percentage,
                start_time: open.start_time,
            },
            None => SessionStatus::Idle,
        })
    }

    /// All sessions, newest first
    pub async fn history(&self) -> DomainResult<Vec<ChargingSession>> {
        self.repo.list_all(SortOrder::Descending).await
    }

    /// All sessions, oldest first, flattened to text
    pub async fn export(&self) -> DomainResult<Vec<ExportRow>> {
        let sessions = self.repo.list_all(SortOrder::Ascending).await?;
        Ok(sessions.iter().map(ExportRow::from).collect())
    }

    // ── Deletion ────────────────────────────────────────────────

    pub async fn delete(&self, id: i32) -> DomainResult<()> {
        self.repo.delete(id).await?;
        info!(session_id = id, "Charging session deleted");
        Ok(())
    }

    pub async fn delete_all(&self) -> DomainResult<u64> {
        let removed = self.repo.delete_all().await?;
        info!(removed, "All charging sessions deleted");
        Ok(removed)
    }
}

// ── Tests ──────────────────────────────────────────────────────
