pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod session;
pub mod status;
pub mod store;

use std::sync::Arc;

use crate::{
    clock::Clock,
    config::Config,
    models::AppState,
    session::MemorySessionStore,
    store::MemoryStore,
};

/// Wires the in-memory stores behind `AppState`.
pub fn build_state(cfg: &Config, clock: Arc<dyn Clock>) -> AppState {
    AppState {
        store: Arc::new(MemoryStore::new(cfg.mock_latency)),
        sessions: Arc::new(MemorySessionStore::default()),
        clock,
        session_ttl_hours: cfg.session_ttl_hours,
        seed_demo_data: cfg.seed_demo_data,
    }
}
