use std::time::Duration;

use phimbro_core::{Config, MovieService};

use crate::sessions::SearchSessions;

/// Shared application state
pub struct AppState {
    config: Config,
    service: MovieService,
    sessions: SearchSessions,
}

impl AppState {
    pub fn new(config: Config, service: MovieService) -> Self {
        let retention = Duration::from_secs(config.server.session_retention_secs);
        Self {
            config,
            service,
            sessions: SearchSessions::new(retention),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &MovieService {
        &self.service
    }

    pub fn sessions(&self) -> &SearchSessions {
        &self.sessions
    }
}
