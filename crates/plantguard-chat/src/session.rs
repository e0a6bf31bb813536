//! Per-session memory of the latest diagnosis.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use plantguard_core::config::SessionConfig;
use plantguard_core::{DiagnosticResult, SessionContext, TreatmentInfo};
use tracing::debug;

/// Process-wide map from session id to its latest diagnosis.
///
/// Records are replaced whole under one lock, so readers never see fields
/// from two different detections. Expiry and capacity come from
/// [`SessionConfig`]; the defaults keep every entry for the life of the
/// process.
#[derive(Debug)]
pub struct SessionContextStore {
    entries: Mutex<HashMap<String, SessionContext>>,
    ttl: Option<Duration>,
    max_entries: usize,
}

impl SessionContextStore {
    /// `ttl_minutes == 0` never expires; `max_entries == 0` is unbounded.
    pub fn new(ttl_minutes: u64, max_entries: usize) -> Self {
        let ttl = if ttl_minutes == 0 {
            None
        } else {
            i64::try_from(ttl_minutes)
                .ok()
                .and_then(Duration::try_minutes)
        };
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.ttl_minutes, config.max_entries)
    }

    /// Record a diagnosis for `session_id`, replacing any earlier one.
    ///
    /// With a TTL set, every expired entry is dropped first.
    pub fn put(
        &self,
        session_id: &str,
        diagnostic: DiagnosticResult,
        treatment: TreatmentInfo,
    ) -> SessionContext {
        let context = SessionContext {
            session_id: session_id.to_string(),
            diagnostic,
            treatment,
            captured_at: Utc::now(),
        };

        let mut entries = self.lock();
        if self.ttl.is_some() {
            let purged = self.purge_locked(&mut entries, context.captured_at);
            if purged > 0 {
                debug!(purged, "Dropped expired session contexts");
            }
        }
        self.insert_locked(&mut entries, context.clone());
        context
    }

    /// Store a complete record as-is.
    pub fn insert(&self, context: SessionContext) {
        let mut entries = self.lock();
        self.insert_locked(&mut entries, context);
    }

    fn insert_locked(&self, entries: &mut HashMap<String, SessionContext>, context: SessionContext) {
        if self.max_entries > 0
            && !entries.contains_key(&context.session_id)
            && entries.len() >= self.max_entries
        {
            self.purge_locked(entries, Utc::now());
            if entries.len() >= self.max_entries {
                let oldest = entries
                    .values()
                    .min_by_key(|c| c.captured_at)
                    .map(|c| c.session_id.clone());
                if let Some(oldest) = oldest {
                    debug!(session_id = %oldest, "Evicting oldest session context");
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(context.session_id.clone(), context);
    }

    /// Latest diagnosis for `session_id`. Expired entries read as absent.
    pub fn get(&self, session_id: &str) -> Option<SessionContext> {
        let mut entries = self.lock();
        let expired = entries
            .get(session_id)
            .map(|c| self.is_expired(c, Utc::now()))?;

        if expired {
            entries.remove(session_id);
            None
        } else {
            entries.get(session_id).cloned()
        }
    }

    pub fn remove(&self, session_id: &str) -> Option<SessionContext> {
        self.lock().remove(session_id)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        self.purge_locked(&mut entries, Utc::now())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_locked(&self, entries: &mut HashMap<String, SessionContext>, now: DateTime<Utc>) -> usize {
        let before = entries.len();
        entries.retain(|_, c| !self.is_expired(c, now));
        before - entries.len()
    }

    fn is_expired(&self, context: &SessionContext, now: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => now - context.captured_at > ttl,
            None => false,
        }
    }

    // Entries stay consistent even if a holder panicked: writes are single inserts.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionContext>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionContextStore {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
