use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::batch::records::DEFAULT_HEADER_ROWS;
use crate::batch::RenderDefaults;

/// Application configuration loaded from environment variables.
/// Every variable is optional; a value that is set but unparsable is an error.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// TrueType/OpenType font for the achievement field. Helvetica when unset.
    pub achievement_font: Option<PathBuf>,
    pub min_font_size: f32,
    pub underline_spacing: f32,
    pub csv_header_rows: usize,
    pub autoresize: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = RenderDefaults::default();
        Ok(Config {
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            achievement_font: std::env::var_os("CERTGEN_ACHIEVEMENT_FONT")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            min_font_size: env_or("CERTGEN_MIN_FONT_SIZE", defaults.min_font_size)?,
            underline_spacing: env_or("CERTGEN_UNDERLINE_SPACING", defaults.underline_spacing)?,
            csv_header_rows: env_or("CERTGEN_CSV_HEADER_ROWS", DEFAULT_HEADER_ROWS)?,
            autoresize: env_or("CERTGEN_AUTORESIZE", defaults.autoresize)?,
        })
    }

    pub fn render_defaults(&self) -> RenderDefaults {
        RenderDefaults {
            min_font_size: self.min_font_size,
            underline_spacing: self.underline_spacing,
            autoresize: self.autoresize,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let defaults = RenderDefaults::default();
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            achievement_font: None,
            min_font_size: defaults.min_font_size,
            underline_spacing: defaults.underline_spacing,
            csv_header_rows: DEFAULT_HEADER_ROWS,
            autoresize: defaults.autoresize,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        _ => Ok(default),
    }
}
