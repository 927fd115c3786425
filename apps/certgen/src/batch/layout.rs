//! Certificate layout: the two text fields and the fonts they use.
//!
//! Requests describe placements in page points. They are resolved against the
//! template's page size into immutable [`PlacementSpec`] values before any
//! rendering starts.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::layout::{
    Alignment, Base14Font, FontHandle, PlacementSpec, Rect, Rgb, TrueTypeFont,
};
use crate::render::TemplateInfo;

pub const DEFAULT_FONT_SIZE: f32 = 36.0;
/// Largest accepted font size, in points.
pub const MAX_FONT_SIZE: f32 = 300.0;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("{field} must be a positive number, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be at most {max}, got {value}")]
    TooLarge {
        field: &'static str,
        value: f32,
        max: f32,
    },

    #[error("{field} lies outside the page")]
    OffPage { field: &'static str },
}

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// The name box runs from `(x, y)` to the page's bottom-right corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamePlacement {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub rotation: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementPlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub rotation: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRequest {
    pub name: NamePlacement,
    pub achievement: AchievementPlacement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline_spacing: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoresize: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

impl LayoutRequest {
    /// Starting positions for a freshly loaded template.
    pub fn suggested(page: &TemplateInfo) -> Self {
        Self {
            name: NamePlacement {
                x: (page.width / 2.0).floor(),
                y: (page.height / 3.0).floor(),
                font_size: DEFAULT_FONT_SIZE,
                rotation: 0.0,
            },
            achievement: AchievementPlacement {
                x: (page.width * 0.1).floor(),
                y: (page.height * 0.6).floor(),
                width: (page.width * 0.8).floor(),
                height: (page.height * 0.2).floor(),
                font_size: DEFAULT_FONT_SIZE,
                rotation: 0.0,
            },
            underline_spacing: None,
            autoresize: None,
            min_font_size: None,
            color: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fonts and defaults
// ────────────────────────────────────────────────────────────────────────────

/// Server-side defaults for values a request may omit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderDefaults {
    pub min_font_size: f32,
    pub underline_spacing: f32,
    pub autoresize: bool,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            min_font_size: 8.0,
            underline_spacing: 0.0,
            autoresize: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FontSet {
    pub name: FontHandle,
    pub achievement: FontHandle,
}

impl Default for FontSet {
    fn default() -> Self {
        Self {
            name: FontHandle::Builtin(Base14Font::HelveticaBold),
            achievement: FontHandle::Builtin(Base14Font::Helvetica),
        }
    }
}

impl FontSet {
    /// Loads the achievement font from `achievement_font` if given. A font that
    /// cannot be loaded is logged and replaced by Helvetica.
    pub fn load(achievement_font: Option<&Path>) -> Self {
        let mut fonts = Self::default();
        let Some(path) = achievement_font else {
            return fonts;
        };
        match TrueTypeFont::from_path(path) {
            Ok(font) => {
                info!(path = %path.display(), font = font.postscript_name(), "Loaded achievement font");
                fonts.achievement = FontHandle::Embedded(Arc::new(font));
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not load achievement font; falling back to Helvetica"
                );
            }
        }
        fonts
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resolution
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CertificateLayout {
    pub name: PlacementSpec,
    pub achievement: PlacementSpec,
}

impl CertificateLayout {
    pub fn resolve(
        request: &LayoutRequest,
        page: &TemplateInfo,
        fonts: &FontSet,
        defaults: &RenderDefaults,
    ) -> Result<Self, LayoutError> {
        let n = &request.name;
        let a = &request.achievement;

        for (field, value) in [
            ("name.x", n.x),
            ("name.y", n.y),
            ("name.rotation", n.rotation),
            ("achievement.x", a.x),
            ("achievement.y", a.y),
            ("achievement.rotation", a.rotation),
        ] {
            finite(field, value)?;
        }
        font_size("name.font_size", n.font_size)?;
        font_size("achievement.font_size", a.font_size)?;
        positive("achievement.width", a.width)?;
        positive("achievement.height", a.height)?;

        let min_size = font_size(
            "min_font_size",
            request.min_font_size.unwrap_or(defaults.min_font_size),
        )?;
        let spacing = finite(
            "underline_spacing",
            request.underline_spacing.unwrap_or(defaults.underline_spacing),
        )?;
        let autoresize = request.autoresize.unwrap_or(defaults.autoresize);
        let color = request.color.unwrap_or_default().clamped();

        let name_rect = Rect::new(n.x, n.y, page.width, page.height);
        if name_rect.is_empty() {
            return Err(LayoutError::OffPage { field: "name" });
        }

        Ok(Self {
            name: PlacementSpec {
                rect: name_rect,
                font: fonts.name.clone(),
                start_size: n.font_size,
                min_size,
                rotation: n.rotation,
                alignment: Alignment::Center,
                underline: false,
                underline_spacing: spacing,
                autoresize,
                color,
            },
            achievement: PlacementSpec {
                rect: Rect::from_origin_size(a.x, a.y, a.width, a.height),
                font: fonts.achievement.clone(),
                start_size: a.font_size,
                min_size,
                rotation: a.rotation,
                alignment: Alignment::Center,
                underline: true,
                underline_spacing: spacing,
                autoresize,
                color,
            },
        })
    }
}

fn finite(field: &'static str, value: f32) -> Result<f32, LayoutError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LayoutError::NotFinite { field })
    }
}

fn positive(field: &'static str, value: f32) -> Result<f32, LayoutError> {
    if finite(field, value)? > 0.0 {
        Ok(value)
    } else {
        Err(LayoutError::NotPositive { field, value })
    }
}

fn font_size(field: &'static str, value: f32) -> Result<f32, LayoutError> {
    if positive(field, value)? <= MAX_FONT_SIZE {
        Ok(value)
    } else {
        Err(LayoutError::TooLarge {
            field,
            value,
            max: MAX_FONT_SIZE,
        })
    }
}
