/// Timestamp extraction from fetched radar images.
///
/// Submodules:
/// - `gif`: walks the GIF block structure to find the comment extension.
/// - `timestamp`: turns a comment or `Last-Modified` header into a
///   reference-zone timestamp, or a typed failure.

pub mod gif;
pub mod timestamp;

pub use timestamp::{ExtractionPolicy, extract};
