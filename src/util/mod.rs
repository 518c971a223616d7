//! Small text helpers shared by the extractor and the assembler.

mod text;

pub use text::{capitalize, normalize_text};
