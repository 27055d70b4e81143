//! In-memory registry of running and finished searches.
//!
//! A search started over HTTP returns its quick result immediately; the
//! background result is picked up later by polling the session id. Sessions
//! are dropped once they are older than the configured retention.
//!
//! Supersession is tracked per client key: a search only supersedes earlier
//! searches started under the same key. Searches without a key are never
//! superseded, since nothing ties them to one caller.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use phimbro_core::{BackgroundSearch, MovieFilter, ProgressiveSearch, SearchOptions};

/// A search as remembered between polls.
#[derive(Debug, Clone)]
pub struct SearchSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Caller-chosen key that scopes supersession.
    pub client: Option<String>,
    pub filter: MovieFilter,
    pub options: SearchOptions,
    pub background: BackgroundSearch,
}

impl SearchSession {
    pub fn generation(&self) -> u64 {
        self.background.generation()
    }
}

#[derive(Debug, Default)]
struct Registry {
    sessions: HashMap<Uuid, SearchSession>,
    /// Newest generation started under each client key.
    latest_by_client: HashMap<String, u64>,
}

#[derive(Debug)]
pub struct SearchSessions {
    retention: TimeDelta,
    registry: RwLock<Registry>,
}

impl SearchSessions {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention: TimeDelta::from_std(retention).unwrap_or(TimeDelta::MAX),
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Register a search and return its session. Expired sessions, and the
    /// client keys only they used, are pruned on the way.
    pub async fn insert(
        &self,
        client: Option<&str>,
        filter: MovieFilter,
        search: &ProgressiveSearch,
    ) -> SearchSession {
        let now = Utc::now();
        let session = SearchSession {
            id: Uuid::new_v4(),
            created_at: now,
            client: client
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            filter,
            options: search.options,
            background: search.background.clone(),
        };

        let mut registry = self.registry.write().await;
        let before = registry.sessions.len();
        registry.sessions.retain(|_, s| now - s.created_at < self.retention);
        if registry.sessions.len() < before {
            let pruned = before - registry.sessions.len();
            debug!(pruned, "Pruned expired search sessions");

            let live: HashSet<String> = registry
                .sessions
                .values()
                .filter_map(|s| s.client.clone())
                .collect();
            registry.latest_by_client.retain(|key, _| live.contains(key));
        }

        if let Some(key) = &session.client {
            let latest = registry.latest_by_client.entry(key.clone()).or_insert(0);
            *latest = (*latest).max(session.generation());
        }
        registry.sessions.insert(session.id, session.clone());

        session
    }

    /// Look up a session that has not expired.
    pub async fn get(&self, id: &Uuid) -> Option<SearchSession> {
        let now = Utc::now();
        self.registry
            .read()
            .await
            .sessions
            .get(id)
            .filter(|s| now - s.created_at < self.retention)
            .cloned()
    }

    /// Whether the same client has started a newer search since `session`.
    pub async fn is_superseded(&self, session: &SearchSession) -> bool {
        let Some(key) = &session.client else {
            return false;
        };
        self.registry
            .read()
            .await
            .latest_by_client
            .get(key)
            .is_some_and(|latest| *latest > session.generation())
    }

    pub async fn len(&self) -> usize {
        self.registry.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.read().await.sessions.is_empty()
    }
}
