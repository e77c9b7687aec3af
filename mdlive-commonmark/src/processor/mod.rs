//! Markdown processing.
//!
//! - [`core`]: the processor and its rendering pipeline
//! - [`process`]: wrappers with panic recovery
//! - [`types`]: options, quote styles and AST transformers
pub mod core;
pub mod process;
pub mod types;

pub use process::{process_markdown_string, process_safe, process_with_recovery};
pub use types::{
  AstTransformer,
  InvalidQuoteStyle,
  MarkdownOptions,
  MarkdownOptionsBuilder,
  MarkdownProcessor,
  QuoteStyle,
  TypographerTransformer,
};
