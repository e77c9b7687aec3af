//! Types for mdlive-commonmark public API and internal use.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a rendered fence, `code-block-<index>`.
///
/// The index is the fence's pre-order position in the parsed document, so the
/// same document always yields the same identifiers. Identifiers are unique
/// within one render call only; processors that render several documents into
/// the same page should set an `id_prefix`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
  /// Build the identifier for the node at `index`.
  #[must_use]
  pub fn new(prefix: Option<&str>, index: usize) -> Self {
    match prefix {
      Some(prefix) if !prefix.is_empty() => {
        Self(format!("{prefix}-code-block-{index}"))
      },
      _ => Self(format!("code-block-{index}")),
    }
  }

  #[must_use]
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for BlockId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for BlockId {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

/// What a fence was rendered as.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum BlockKind {
  /// Generic code block with a copy control.
  Code {
    /// Language label, empty when the fence had none.
    language: String,
  },
  /// Chart placeholder waiting for hydration.
  Chart,
}

/// A fence rendered by the code-block override.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderedBlock {
  /// Stable identifier carried by the element.
  pub id:   BlockId,
  /// Branch the renderer took.
  pub kind: BlockKind,
  /// The HTML fragment that replaced the fence.
  pub html: String,
}

/// Result of Markdown processing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkdownResult {
  /// Rendered HTML output.
  pub html: String,

  /// Fences rendered during this call, in document order.
  pub blocks: Vec<RenderedBlock>,

  /// Title of the document, if found (first H1).
  pub title: Option<String>,
}

impl MarkdownResult {
  /// Iterate over the chart placeholders of this render.
  pub fn charts(&self) -> impl Iterator<Item = &RenderedBlock> {
    self
      .blocks
      .iter()
      .filter(|block| block.kind == BlockKind::Chart)
  }
}
