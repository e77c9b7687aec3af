//! # mdlive-commonmark
//!
//! Renders `CommonMark` documents into HTML meant to be inserted into a live
//! page, then activates the interactive parts of that HTML in a second,
//! decoupled pass.
//!
//! ## Quick Start
//!
//! ```rust
//! use mdlive_commonmark::{MarkdownOptions, MarkdownProcessor};
//!
//! let processor = MarkdownProcessor::new(MarkdownOptions::default());
//! let result = processor.render("# Hello\n\n```rust\nfn main() {}\n```");
//!
//! assert!(result.html.contains("code-block-"));
//! assert_eq!(result.title.as_deref(), Some("Hello"));
//! ```
//!
//! ## Pipeline
//!
//! - [`preprocess::normalize`] folds the line-break encodings found in
//!   transported text into plain `\n`.
//! - [`MarkdownProcessor`] parses with `comrak` and swaps fenced code, links
//!   and images for the output of the [`render`] overrides.
//! - [`hydrate::Hydrator`] scans a DOM for chart placeholders and hands each
//!   decoded declaration to a [`hydrate::ChartEngine`], once per element.
//! - [`actions::ActionRegistry`] routes clicks on rendered controls (copy
//!   buttons, image previews) to host-provided handlers.
//!
//! ## Hydration
//!
//! ```rust
//! use mdlive_commonmark::{
//!   MarkdownOptions,
//!   MarkdownProcessor,
//!   hydrate::{EmbedScriptEngine, Hydrator, hydrate_html},
//! };
//!
//! let processor = MarkdownProcessor::new(MarkdownOptions::default());
//! let result = processor.render("```echarts\n{\"series\": []}\n```");
//!
//! let hydrator = Hydrator::new(EmbedScriptEngine);
//! let (html, report) = hydrate_html(&result.html, &hydrator);
//! assert_eq!(report.activated, 1);
//! assert!(html.contains("data-echarts-inited"));
//! ```

pub mod actions;
pub mod error;
pub mod hydrate;
pub mod preprocess;
pub mod processor;
pub mod render;
pub mod syntax;
mod types;
pub mod utils;

pub use crate::{
  error::{ActionError, ChartError, ClipboardError, DecodeError},
  processor::{
    AstTransformer,
    MarkdownOptions,
    MarkdownOptionsBuilder,
    MarkdownProcessor,
    QuoteStyle,
  },
  render::{Escape, HtmlEscaper, RenderRules},
  types::{BlockId, BlockKind, MarkdownResult, RenderedBlock},
};
