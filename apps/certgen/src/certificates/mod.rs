// HTTP surface for template inspection, record parsing, preview and batch runs.
pub mod handlers;
