//! Application state: prompt templates, the optional Gemini client, and the
//! history store.
//!
//! Built once at startup from the environment:
//!   GOOGLE_API_KEY   : enables Gemini integration if present
//!   GEMINI_BASE_URL  : default "https://generativelanguage.googleapis.com/v1beta"
//!   GEMINI_MODEL     : default "gemini-2.0-flash"
//!   DATA_DIR         : history storage directory (default "./data")
//!   PROMPTS_CONFIG_PATH : optional TOML prompt overrides

use tracing::{info, instrument, warn};

use crate::config::{load_prompt_config_from_env, Prompts};
use crate::gemini::Gemini;
use crate::store::{FileKvStore, HistoryStore, MemoryKvStore};

pub struct AppState {
    pub gemini: Option<Gemini>,
    pub prompts: Prompts,
    pub history: HistoryStore,
}

impl AppState {
    /// Build state from env: load prompt config, open the data directory,
    /// init the Gemini client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let prompts = load_prompt_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".into());
        let history = match FileKvStore::open(&data_dir) {
            Ok(kv) => {
                info!(target: "mathmind_backend", %data_dir, "History persisted to data directory");
                HistoryStore::new(Box::new(kv))
            }
            Err(e) => {
                // Storage is non-fatal: degrade to an in-memory log rather
                // than refusing to start.
                warn!(target: "mathmind_backend", %data_dir, error = %e, "Data directory unusable; history will not survive restarts");
                HistoryStore::new(Box::new(MemoryKvStore::new()))
            }
        };

        let gemini = Gemini::from_env();
        match &gemini {
            Some(g) => {
                info!(target: "mathmind_backend", base_url = %g.base_url, model = %g.model, "Gemini enabled.")
            }
            None => {
                warn!(target: "mathmind_backend", "Gemini disabled (no GOOGLE_API_KEY). Generation endpoints will report an upstream error.")
            }
        }

        Self { gemini, prompts, history }
    }

    /// State over an in-memory store and no upstream client. Test helper.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            gemini: None,
            prompts: Prompts::default(),
            history: HistoryStore::new(Box::new(MemoryKvStore::new())),
        }
    }
}
