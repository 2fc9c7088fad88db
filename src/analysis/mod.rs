//! The LLM-backed steps: quick metadata, per-URL analysis, combine.

pub mod aggregate;
pub mod combine;
pub mod decode;
pub mod detailed;
pub mod metadata;
pub mod prompts;

pub use combine::{combine, CombineInput};
pub use decode::{strip_code_fences, CombinerOutput};
pub use detailed::{analyze_all, DetailedAnalysis};
pub use metadata::quick_metadata;
