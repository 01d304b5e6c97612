// Report structure and export: section parsing of the synthesized text and the PDF download proxy.

pub mod handlers;
pub mod sections;

pub use sections::parse_sections;
