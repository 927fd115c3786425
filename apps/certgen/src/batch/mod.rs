// Batch certificate generation: CSV records in, one PDF per record out.
// Rendering is CPU- and disk-bound; handlers run it via spawn_blocking.

pub mod generator;
pub mod layout;
pub mod naming;
pub mod records;

pub use generator::{generate_batch, render_certificate, BatchReport};
pub use layout::{CertificateLayout, FontSet, LayoutError, LayoutRequest, RenderDefaults};
pub use records::{load_records, CertificateRecord, CsvSourceError};
