//! Phase 1: SESSIONS
//!
//! One session per registered subject that has none yet.

use super::{record_skip, IngestDriver, PhaseStats};
use crate::error::IngestResult;
use crate::store::{InsertOptions, Store};
use ephys_common::db::{Session, Subject};
use tracing::{debug, info};

impl<S: Store> IngestDriver<S> {
    /// Phase 1: SESSIONS - register a session for subjects without one
    pub(super) async fn phase_sessions(&self) -> IngestResult<PhaseStats> {
        let subjects = self.store.fetch_keys::<Subject>().await?;
        let with_session: std::collections::BTreeSet<String> = self
            .store
            .fetch_keys::<Session>()
            .await?
            .into_iter()
            .map(|key| key.subject)
            .collect();

        let mut stats = PhaseStats::default();
        let mut sessions = Vec::new();

        for subject in subjects.iter() {
            if with_session.contains(subject) {
                stats.already_present += 1;
                continue;
            }

            match self.discovery.discover_session(subject) {
                Ok(Some(session)) => {
                    stats.discovered += 1;
                    sessions.push(session);
                }
                Ok(None) => debug!(subject = %subject, "No recordings yet"),
                Err(reason) => record_skip(&mut stats, "sessions", &reason),
            }
        }

        println!("Inserting {} session(s)", sessions.len());
        info!(count = sessions.len(), "Inserting sessions");

        stats.inserted = self
            .store
            .insert(&sessions, InsertOptions::skip_duplicates())
            .await? as usize;

        Ok(stats)
    }
}
