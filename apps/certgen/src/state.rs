use std::sync::Arc;

use crate::batch::{FontSet, RenderDefaults};
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Loaded once at startup; embedded font programs are shared by every render.
    pub fonts: Arc<FontSet>,
    pub defaults: RenderDefaults,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let fonts = FontSet::load(config.achievement_font.as_deref());
        let defaults = config.render_defaults();
        Self {
            config,
            fonts: Arc::new(fonts),
            defaults,
        }
    }
}
