//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use parley_core::config::ParleyConfig;
use parley_skill::handler::SkillHandler;
use parley_skill::model::LanguageModel;

/// Shared application state.
///
/// Turns carry their own session state in the request, so nothing here is
/// mutable.
#[derive(Clone)]
pub struct AppState {
    /// Turn handler shared by all requests.
    pub handler: Arc<SkillHandler>,
    /// Application configuration.
    pub config: Arc<ParleyConfig>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: ParleyConfig, model: Arc<dyn LanguageModel>) -> Self {
        let handler = SkillHandler::new(&config, model);
        Self {
            handler: Arc::new(handler),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }
}
