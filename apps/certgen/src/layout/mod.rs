// Text layout: font metrics, geometry and the text-fit engine.
// Everything here is synchronous and free of I/O apart from font-file loading;
// callers in async context run it inside tokio::task::spawn_blocking.

pub mod encoding;
pub mod font_metrics;
pub mod geometry;
pub mod placement;
pub mod text_fit;
pub mod truetype;

// Re-export the public API consumed by other modules (batch, handlers).
pub use font_metrics::{Base14Font, FontHandle, TextMetrics};
pub use geometry::{Point, Rect};
pub use placement::{Alignment, PlacementSpec, RenderResult, Rgb};
pub use text_fit::place_text;
pub use truetype::TrueTypeFont;
