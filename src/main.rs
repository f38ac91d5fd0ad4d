//! MathMind · AI Math Trainer Backend
//!
//! - Axum HTTP API for problem generation, history, stats, and analysis
//! - Optional Gemini integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT             : u16 (default 3000)
//!   GOOGLE_API_KEY   : enables Gemini integration if present
//!   GEMINI_BASE_URL  : default "https://generativelanguage.googleapis.com/v1beta"
//!   GEMINI_MODEL     : default "gemini-2.0-flash"
//!   DATA_DIR         : history storage directory (default "./data")
//!   PROMPTS_CONFIG_PATH : path to TOML config (prompt overrides)
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod extract;
mod analysis;
mod store;
mod stats;
mod gemini;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (history store, Gemini client, prompts).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "mathmind_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
