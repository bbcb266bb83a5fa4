use crate::config::Config;
use axum::extract::FromRef;
use sqlx::PgPool;

/// Shared state for the PromptShare router: the Postgres pool plus the
/// env-derived config (JWT secret, token lifetime, admin seed).
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
