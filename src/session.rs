//! Per-session state and the activity log
//!
//! Each session owns an [`ActivityLog`], a bounded ring buffer of the most
//! recent orchestration events, plus a processing flag that allows a single
//! run at a time. Every appended entry is also published on a broadcast
//! channel shared by all sessions (consumed by the WebSocket and SSE feeds).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, RwLock};

/// Default number of entries kept per session
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 20;

/// State of an activity entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    /// Work queued, not started
    Pending,
    /// Work started
    Processing,
    /// Work finished
    Completed,
    /// Work failed
    Failed,
}

/// One line of the activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Who did it (e.g. "Master Orchestrator")
    pub actor: String,
    /// What happened
    pub action: String,
    /// Outcome
    pub status: ActivityStatus,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

/// Activity entry tagged with its session, as published on the feed
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    /// Session the entry belongs to
    pub session_id: String,
    /// The entry itself
    #[serde(flatten)]
    pub entry: ActivityEntry,
}

/// Bounded, append-only activity log
#[derive(Debug)]
pub struct ActivityLog {
    session_id: String,
    capacity: usize,
    entries: Mutex<VecDeque<ActivityEntry>>,
    sender: broadcast::Sender<ActivityEvent>,
}

impl ActivityLog {
    /// Create an empty log that keeps at most `capacity` entries
    pub fn new(
        session_id: impl Into<String>,
        capacity: usize,
        sender: broadcast::Sender<ActivityEvent>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            sender,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ActivityEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an entry, evicting the oldest one when full
    ///
    /// The timestamp is never earlier than the previous entry's.
    pub fn add(
        &self,
        actor: impl Into<String>,
        action: impl Into<String>,
        status: ActivityStatus,
    ) -> ActivityEntry {
        let entry = {
            let mut entries = self.lock();
            let now = Utc::now();
            let timestamp = match entries.back() {
                Some(last) if last.timestamp > now => last.timestamp,
                _ => now,
            };
            let entry = ActivityEntry {
                actor: actor.into(),
                action: action.into(),
                status,
                timestamp,
            };
            entries.push_back(entry.clone());
            while entries.len() > self.capacity {
                entries.pop_front();
            }
            entry
        };

        tracing::debug!(
            session_id = %self.session_id,
            actor = %entry.actor,
            status = ?entry.status,
            "Activity: {}",
            entry.action
        );

        // No subscribers is fine
        let _ = self.sender.send(ActivityEvent {
            session_id: self.session_id.clone(),
            entry: entry.clone(),
        });
        entry
    }

    /// Entries oldest first
    pub fn snapshot(&self) -> Vec<ActivityEntry> {
        self.lock().iter().cloned().collect()
    }

    /// Entries newest first
    pub fn recent(&self) -> Vec<ActivityEntry> {
        self.lock().iter().rev().cloned().collect()
    }

    /// Number of entries held
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of entries held
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// State of one user session
#[derive(Debug)]
pub struct SessionState {
    activity: ActivityLog,
    processing: AtomicBool,
}

impl SessionState {
    /// Create a session publishing on `sender`
    pub fn new(
        id: impl Into<String>,
        capacity: usize,
        sender: broadcast::Sender<ActivityEvent>,
    ) -> Self {
        Self {
            activity: ActivityLog::new(id, capacity, sender),
            processing: AtomicBool::new(false),
        }
    }

    /// The session's activity log
    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Whether a run is in progress
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Mark the session busy; `None` if a run is already in progress
    ///
    /// The flag is cleared when the returned guard is dropped.
    pub fn try_begin(self: &Arc<Self>) -> Option<ProcessingGuard> {
        self.processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ProcessingGuard {
                session: Arc::clone(self),
            })
    }
}

/// Clears the session's processing flag on drop
#[derive(Debug)]
pub struct ProcessingGuard {
    session: Arc<SessionState>,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.session.processing.store(false, Ordering::Release);
    }
}

/// All live sessions
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionState>>>,
    capacity: usize,
    sender: broadcast::Sender<ActivityEvent>,
}

impl SessionRegistry {
    /// Registry whose sessions keep `capacity` activity entries each
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(100);
        Self {
            sessions: RwLock::new(HashMap::new()),
            capacity,
            sender,
        }
    }

    /// Fetch a session, creating it on first use
    pub async fn get_or_create(&self, id: &str) -> Arc<SessionState> {
        if let Some(session) = self.sessions.read().await.get(id) {
            return Arc::clone(session);
        }
        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(id.to_string()).or_insert_with(|| {
            tracing::info!(session_id = %id, "Created session");
            Arc::new(SessionState::new(id, self.capacity, self.sender.clone()))
        }))
    }

    /// Subscribe to activity from every session
    pub fn subscribe(&self) -> broadcast::Receiver<ActivityEvent> {
        self.sender.subscribe()
    }
}
