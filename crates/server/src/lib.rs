pub mod api;
pub mod metrics;
pub mod sessions;
pub mod state;
