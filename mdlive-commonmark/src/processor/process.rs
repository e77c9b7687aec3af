//! High-level processing functions with error recovery.
use log::error;

use super::types::{MarkdownOptions, MarkdownProcessor};
use crate::types::MarkdownResult;

/// Process markdown content with error recovery.
///
/// A panic anywhere in the pipeline is logged and turned into an error
/// placeholder, so one bad document cannot take the host down with it.
///
/// # Arguments
///
/// * `processor` - The configured markdown processor
/// * `content` - The raw markdown content to process
#[must_use]
pub fn process_with_recovery(
  processor: &MarkdownProcessor,
  content: &str,
) -> MarkdownResult {
  match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
    processor.render(content)
  })) {
    Ok(result) => result,
    Err(panic_err) => {
      error!("Panic during markdown processing: {panic_err:?}");
      MarkdownResult {
        html: "<div class=\"error\">Critical error processing markdown \
               content</div>"
          .to_string(),
        ..Default::default()
      }
    },
  }
}

/// Safely process markup content with error recovery.
///
/// Returns `fallback` (or the original content when `fallback` is empty) if
/// `processor_fn` panics.
pub fn process_safe<F>(content: &str, processor_fn: F, fallback: &str) -> String
where
  F: FnOnce(&str) -> String,
{
  if content.is_empty() {
    return String::new();
  }

  let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
    processor_fn(content)
  }));

  match result {
    Ok(processed_text) => processed_text,
    Err(e) => {
      if let Some(error_msg) = e.downcast_ref::<String>() {
        error!("Error processing markup: {error_msg}");
      } else if let Some(error_msg) = e.downcast_ref::<&str>() {
        error!("Error processing markup: {error_msg}");
      } else {
        error!("Unknown error occurred while processing markup");
      }

      if fallback.is_empty() {
        content.to_string()
      } else {
        fallback.to_string()
      }
    },
  }
}

/// Render a Markdown string with default options.
#[must_use]
pub fn process_markdown_string(content: &str) -> MarkdownResult {
  let processor = MarkdownProcessor::new(MarkdownOptions::default());
  process_with_recovery(&processor, content)
}
