//! Web terminal adapter.
//!
//! Axum server with an Askama/HTMX frontend: market panel, order console,
//! wallet, watchlist and news for one symbol at a time. Each user gets an
//! isolated in-memory ledger; all state dies with the process.

mod auth;
mod error;
mod handlers;
mod templates;

pub use auth::{Backend, Credentials, User};
pub use error::WebError;
pub use handlers::*;
pub use templates::*;

use axum::{
    Router,
    routing::{get, post},
};
use axum_login::{AuthManagerLayerBuilder, login_required};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower_http::services::ServeDir;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key, service::SignedCookie};

use crate::domain::ledger::{Ledger, LedgerSettings};
use crate::ports::config_port::ConfigPort;
use crate::ports::news_port::NewsPort;
use crate::ports::quote_port::QuotePort;

/// One ledger per username, created on first touch. The mutex makes every
/// order a serialized read-validate-write unit.
pub type LedgerStore = Arc<Mutex<HashMap<String, Ledger>>>;

pub fn new_ledger_store() -> LedgerStore {
    Arc::new(Mutex::new(HashMap::new()))
}

pub struct AppState {
    pub quote_port: Arc<dyn QuotePort + Send + Sync>,
    pub news_port: Arc<dyn NewsPort + Send + Sync>,
    pub config: Arc<dyn ConfigPort + Send + Sync>,
    pub ledgers: LedgerStore,
}

/// `[account]` settings with the stock defaults.
pub fn ledger_settings(config: &dyn ConfigPort) -> LedgerSettings {
    let defaults = LedgerSettings::default();
    LedgerSettings {
        starting_balance: config.get_double(
            "account",
            "starting_balance",
            defaults.starting_balance,
        ),
        funding_min: config.get_double("account", "funding_min", defaults.funding_min),
        funding_max: config.get_double("account", "funding_max", defaults.funding_max),
    }
}

pub async fn build_router(state: AppState) -> Router {
    let session_layer = session_layer_from_config(&*state.config);
    let backend = Backend::from_config(&*state.config);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    protected_routes()
        .route_layer(login_required!(Backend, login_url = "/login"))
        .merge(public_routes())
        .layer(auth_layer)
        .nest_service("/static", ServeDir::new("static"))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}

/// Same handler graph without the login gate. Integration tests drive this;
/// unauthenticated requests fall back to the shared demo ledger.
pub async fn build_test_router(state: AppState) -> Router {
    let session_layer = session_layer_from_config(&*state.config);
    let backend = Backend::from_config(&*state.config);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    protected_routes()
        .merge(public_routes())
        .layer(auth_layer)
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}

fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/order", post(handlers::place_order))
        .route("/funds", post(handlers::add_funds))
        .route("/reset", post(handlers::reset_account))
        .route("/logout", post(handlers::logout))
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/login", get(handlers::login_form).post(handlers::login))
}

fn session_layer_from_config(
    config: &dyn ConfigPort,
) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    let lifetime = config.get_int("web", "session_lifetime", 86_400);
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(lifetime)))
        .with_signed(session_key(config))
}

/// Cookie signing key from `[web] session_secret` (hex, at least 64 bytes),
/// or a fresh random key when unset. A random key only invalidates sessions
/// across restarts, which in-memory sessions do not survive anyway.
fn session_key(config: &dyn ConfigPort) -> Key {
    config
        .get_string("web", "session_secret")
        .and_then(|secret| hex::decode(secret.trim()).ok())
        .filter(|bytes| bytes.len() >= 64)
        .map(|bytes| Key::from(&bytes))
        .unwrap_or_else(Key::generate)
}

fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}
