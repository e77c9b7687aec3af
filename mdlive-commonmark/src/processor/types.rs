//! Type definitions for the Markdown processor.
//!
//! Contains all the core types used by the processor, including:
//! - Configuration options (`MarkdownOptions`, `QuoteStyle`)
//! - The main processor struct (`MarkdownProcessor`)
//! - AST transformation traits and implementations
//!
//! # Examples
//!
//! ```
//! use mdlive_commonmark::{MarkdownOptions, MarkdownProcessor};
//!
//! let options = MarkdownOptions {
//!   breaks: false,
//!   chart_language: "chart".to_string(),
//!   ..Default::default()
//! };
//!
//! let processor = MarkdownProcessor::new(options);
//! ```

use std::{fmt, str::FromStr, sync::Arc};

use comrak::nodes::AstNode;

use crate::{
  render::{Escape, RenderRules},
  syntax::SyntaxManager,
};

/// Replacement characters for typographic quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteStyle {
  pub double_open:  char,
  pub double_close: char,
  pub single_open:  char,
  pub single_close: char,
}

impl QuoteStyle {
  /// Plain ASCII quotes, so smart punctuation leaves quotes untouched.
  #[must_use]
  pub const fn straight() -> Self {
    Self {
      double_open:  '"',
      double_close: '"',
      single_open:  '\'',
      single_close: '\'',
    }
  }

  /// English curly quotes.
  #[must_use]
  pub const fn curly() -> Self {
    Self {
      double_open:  '“',
      double_close: '”',
      single_open:  '‘',
      single_close: '’',
    }
  }

  /// Map one of the curly quotes emitted by smart punctuation to this style.
  #[must_use]
  pub const fn map(&self, c: char) -> char {
    match c {
      '“' => self.double_open,
      '”' => self.double_close,
      '‘' => self.single_open,
      '’' => self.single_close,
      other => other,
    }
  }
}

impl Default for QuoteStyle {
  fn default() -> Self {
    Self::straight()
  }
}

impl fmt::Display for QuoteStyle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}{}{}{}",
      self.double_open, self.double_close, self.single_open, self.single_close
    )
  }
}

/// Error returned when a quote style string is not exactly four characters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("quote style must be four characters (double pair, single pair), got {0:?}")]
pub struct InvalidQuoteStyle(pub String);

impl FromStr for QuoteStyle {
  type Err = InvalidQuoteStyle;

  /// Parse a four character string, e.g. `“”‘’` or `""''`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let chars: Vec<char> = s.chars().collect();
    match chars.as_slice() {
      [double_open, double_close, single_open, single_close] => {
        Ok(Self {
          double_open:  *double_open,
          double_close: *double_close,
          single_open:  *single_open,
          single_close: *single_close,
        })
      },
      _ => Err(InvalidQuoteStyle(s.to_string())),
    }
  }
}

/// Options for configuring the Markdown processor.
#[derive(Debug, Clone)]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Config struct with related boolean flags"
)]
pub struct MarkdownOptions {
  /// Pass raw HTML in the document through to the output.
  pub html: bool,

  /// Render soft line breaks as `<br />`.
  pub breaks: bool,

  /// Turn bare URLs into links.
  pub linkify: bool,

  /// Smart punctuation and `(c)`, `(r)`, `(tm)`, `+-` replacements.
  pub typographer: bool,

  /// Quote characters used when `typographer` is on.
  pub quotes: QuoteStyle,

  /// Tables, strikethrough and footnotes.
  pub gfm: bool,

  /// Highlight fenced code on the server when a backend is available.
  pub highlight_code: bool,

  /// Fence label that turns a block into a chart placeholder.
  pub chart_language: String,

  /// Header text shown above chart placeholders.
  pub chart_label: String,

  /// Height of chart placeholders, in pixels.
  pub chart_height: u32,

  /// Text of the copy control on code blocks.
  pub copy_label: String,

  /// Optional: Prefix for block identifiers, for pages that show several
  /// rendered documents at once.
  pub id_prefix: Option<String>,
}

impl Default for MarkdownOptions {
  fn default() -> Self {
    Self {
      html:           true,
      breaks:         true,
      linkify:        true,
      typographer:    true,
      quotes:         QuoteStyle::straight(),
      gfm:            true,
      highlight_code: cfg!(feature = "syntect"),
      chart_language: "echarts".to_string(),
      chart_label:    "Chart".to_string(),
      chart_height:   300,
      copy_label:     "Copy".to_string(),
      id_prefix:      None,
    }
  }
}

/// Main Markdown processor.
///
/// Holds the engine configuration built once in [`MarkdownProcessor::new`]
/// and the renderer overrides registered on it. Build one and reuse it; it
/// can be cheaply cloned.
#[derive(Clone)]
pub struct MarkdownProcessor {
  pub(crate) options:        MarkdownOptions,
  pub(crate) comrak:         comrak::options::Options<'static>,
  pub(crate) rules:          RenderRules,
  pub(crate) escaper:        Arc<dyn Escape>,
  pub(crate) syntax_manager: Option<Arc<SyntaxManager>>,
}

/// Trait for AST transformations applied between parsing and rendering.
pub trait AstTransformer {
  fn transform<'a>(&self, node: &'a AstNode<'a>);
}

/// AST transformer applying typographic replacements and the configured quote
/// style to text nodes.
///
/// Smart punctuation itself (curly quotes, dashes, ellipses) is produced by
/// the parser; this pass rewrites the quotes it produced and adds the symbol
/// replacements the parser does not know about. Curly quotes typed directly
/// in the document are left alone, which needs the source the document was
/// parsed from (see [`TypographerTransformer::with_source`]). Without it,
/// every curly quote is restyled.
pub struct TypographerTransformer<'s> {
  quotes: QuoteStyle,
  source: Option<&'s str>,
}

impl<'s> TypographerTransformer<'s> {
  #[must_use]
  pub const fn new(quotes: QuoteStyle) -> Self {
    Self {
      quotes,
      source: None,
    }
  }

  /// Source text the transformed document was parsed from.
  #[must_use]
  pub const fn with_source(mut self, source: &'s str) -> Self {
    self.source = Some(source);
    self
  }

  /// Restyle the quotes in `text` that smart punctuation produced.
  ///
  /// `origin` is the source markup of the text node. Its quote characters
  /// line up one to one with those of `text`; a curly quote in `text` that
  /// lines up with a curly quote in `origin` was typed as such. Returns
  /// `None` when nothing changes or the two cannot be lined up.
  fn style_quotes(
    &self,
    text: &str,
    origin: Option<&str>,
    literal_curly: bool,
  ) -> Option<String> {
    if !text.contains(is_curly_quote) {
      return None;
    }

    if !literal_curly {
      return Some(text.chars().map(|c| self.quotes.map(c)).collect());
    }

    let origin = origin?;
    let origins: Vec<char> = origin.chars().filter(|&c| is_quote(c)).collect();
    if origins.len() != text.chars().filter(|&c| is_quote(c)).count() {
      log::trace!("Quotes of {text:?} do not line up with {origin:?}");
      return None;
    }

    let mut origins = origins.into_iter();
    Some(
      text
        .chars()
        .map(|c| {
          if !is_quote(c) {
            return c;
          }
          match origins.next() {
            Some(typed) if !is_curly_quote(typed) => self.quotes.map(c),
            _ => c,
          }
        })
        .collect(),
    )
  }
}

const fn is_curly_quote(c: char) -> bool {
  matches!(c, '“' | '”' | '‘' | '’')
}

const fn is_quote(c: char) -> bool {
  matches!(c, '"' | '\'') || is_curly_quote(c)
}

impl AstTransformer for TypographerTransformer<'_> {
  fn transform<'a>(&self, node: &'a AstNode<'a>) {
    use std::sync::LazyLock;

    use comrak::nodes::NodeValue;
    use regex::{Captures, Regex};

    static SYMBOL_RE: LazyLock<Regex> = LazyLock::new(|| {
      Regex::new(r"(?i)\((?:c|r|tm)\)|\+-").unwrap_or_else(|e| {
        log::error!(
          "Failed to compile SYMBOL_RE regex: {e}\n Falling back to never \
           matching regex."
        );
        crate::utils::never_matching_regex()
      })
    });

    // Quotes first, while every text node still spans its own source.
    if self.quotes != QuoteStyle::curly() {
      let literal_curly =
        self.source.is_some_and(|source| source.contains(is_curly_quote));
      let offsets = self
        .source
        .filter(|_| literal_curly)
        .map(crate::utils::line_offsets);

      for descendant in node.descendants() {
        let mut data = descendant.data.borrow_mut();
        let pos = data.sourcepos;
        if let NodeValue::Text(ref mut text) = data.value {
          let origin = self.source.zip(offsets.as_deref()).and_then(
            |(source, offsets)| crate::utils::source_slice(source, offsets, pos),
          );
          if let Some(styled) = self.style_quotes(text, origin, literal_curly)
          {
            *text = styled.into();
          }
        }
      }
    }

    // Symbols can straddle text nodes the parser split at punctuation.
    let texts: Vec<_> = node
      .descendants()
      .filter(|n| matches!(n.data.borrow().value, NodeValue::Text(_)))
      .collect();
    for text_node in texts {
      if text_node.parent().is_none() {
        continue;
      }
      while let Some(next) = text_node.next_sibling() {
        let following = match &next.data.borrow().value {
          NodeValue::Text(t) => t.to_string(),
          _ => break,
        };
        if let NodeValue::Text(ref mut text) = text_node.data.borrow_mut().value
        {
          let mut merged = text.to_string();
          merged.push_str(&following);
          *text = merged.into();
        }
        next.detach();
      }
    }

    for descendant in node.descendants() {
      let mut data = descendant.data.borrow_mut();
      if let NodeValue::Text(ref mut text) = data.value {
        let replaced = SYMBOL_RE.replace_all(&**text, |caps: &Captures| {
          match caps[0].to_ascii_lowercase().as_str() {
            "(c)" => "©",
            "(r)" => "®",
            "(tm)" => "™",
            _ => "±",
          }
        });
        if let std::borrow::Cow::Owned(replaced) = replaced {
          *text = replaced.into();
        }
      }
    }
  }
}

/// Builder for constructing `MarkdownOptions` with method chaining.
#[derive(Debug, Clone)]
pub struct MarkdownOptionsBuilder {
  options: MarkdownOptions,
}

impl MarkdownOptionsBuilder {
  /// Create a new builder with default options.
  #[must_use]
  pub fn new() -> Self {
    Self {
      options: MarkdownOptions::default(),
    }
  }

  /// Enable or disable raw HTML pass-through.
  #[must_use]
  pub const fn html(mut self, enabled: bool) -> Self {
    self.options.html = enabled;
    self
  }

  /// Enable or disable hard line breaks.
  #[must_use]
  pub const fn breaks(mut self, enabled: bool) -> Self {
    self.options.breaks = enabled;
    self
  }

  /// Enable or disable bare URL detection.
  #[must_use]
  pub const fn linkify(mut self, enabled: bool) -> Self {
    self.options.linkify = enabled;
    self
  }

  /// Enable or disable typographic replacements.
  #[must_use]
  pub const fn typographer(mut self, enabled: bool) -> Self {
    self.options.typographer = enabled;
    self
  }

  /// Set the quote characters used by the typographer.
  #[must_use]
  pub const fn quotes(mut self, quotes: QuoteStyle) -> Self {
    self.options.quotes = quotes;
    self
  }

  /// Enable or disable tables, strikethrough and footnotes.
  #[must_use]
  pub const fn gfm(mut self, enabled: bool) -> Self {
    self.options.gfm = enabled;
    self
  }

  /// Enable or disable server-side syntax highlighting.
  #[must_use]
  pub const fn highlight_code(mut self, enabled: bool) -> Self {
    self.options.highlight_code = enabled;
    self
  }

  /// Set the fence label that marks chart declarations.
  #[must_use]
  pub fn chart_language<S: Into<String>>(mut self, language: S) -> Self {
    self.options.chart_language = language.into();
    self
  }

  /// Set the chart header text.
  #[must_use]
  pub fn chart_label<S: Into<String>>(mut self, label: S) -> Self {
    self.options.chart_label = label.into();
    self
  }

  /// Set the chart placeholder height in pixels.
  #[must_use]
  pub const fn chart_height(mut self, height: u32) -> Self {
    self.options.chart_height = height;
    self
  }

  /// Set the copy control text.
  #[must_use]
  pub fn copy_label<S: Into<String>>(mut self, label: S) -> Self {
    self.options.copy_label = label.into();
    self
  }

  /// Set the block identifier prefix.
  #[must_use]
  pub fn id_prefix<S: Into<String>>(mut self, prefix: Option<S>) -> Self {
    self.options.id_prefix = prefix.map(Into::into);
    self
  }

  /// Build the final `MarkdownOptions`.
  #[must_use]
  pub fn build(self) -> MarkdownOptions {
    self.options
  }
}

impl Default for MarkdownOptionsBuilder {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use super::*;

  #[test]
  fn test_quote_style_parse() {
    let style: QuoteStyle = "«»‹›".parse().expect("four characters");
    assert_eq!(style.double_open, '«');
    assert_eq!(style.single_close, '›');
    assert_eq!(style.to_string(), "«»‹›");
  }

  #[test]
  fn test_quote_style_parse_rejects_wrong_length() {
    assert!("\"\"".parse::<QuoteStyle>().is_err());
    assert!("“”‘’x".parse::<QuoteStyle>().is_err());
  }

  #[test]
  fn test_quote_style_map() {
    let style = QuoteStyle::straight();
    assert_eq!(style.map('“'), '"');
    assert_eq!(style.map('’'), '\'');
    assert_eq!(style.map('x'), 'x');
    assert_eq!(QuoteStyle::curly().map('“'), '“');
  }

  #[test]
  fn test_style_quotes_without_typed_curly_quotes() {
    let typographer = TypographerTransformer::new(QuoteStyle::straight());
    assert_eq!(
      typographer.style_quotes("“a” ‘b’", None, false).as_deref(),
      Some("\"a\" 'b'")
    );
    assert_eq!(typographer.style_quotes("plain", None, false), None);
  }

  #[test]
  fn test_style_quotes_keeps_typed_curly_quotes() {
    let typographer = TypographerTransformer::new(QuoteStyle::straight());
    assert_eq!(
      typographer
        .style_quotes("“typed” and “literal”", Some("\"typed\" and “literal”"), true)
        .as_deref(),
      Some("\"typed\" and “literal”")
    );
    assert_eq!(
      typographer
        .style_quotes("it’s ‘mine’", Some("it's ‘mine’"), true)
        .as_deref(),
      Some("it's ‘mine’")
    );
  }

  #[test]
  fn test_style_quotes_leaves_unaligned_text() {
    let typographer = TypographerTransformer::new(QuoteStyle::straight());
    assert_eq!(
      typographer.style_quotes("“a” “b”", Some("&quot;a&quot; “b”"), true),
      None
    );
    assert_eq!(typographer.style_quotes("“a”", None, true), None);
  }

  #[test]
  fn test_builder() {
    let options = MarkdownOptionsBuilder::new()
      .breaks(false)
      .chart_language("chart")
      .copy_label("复制")
      .id_prefix(Some("doc"))
      .build();
    assert!(!options.breaks);
    assert_eq!(options.chart_language, "chart");
    assert_eq!(options.copy_label, "复制");
    assert_eq!(options.id_prefix.as_deref(), Some("doc"));
    assert!(options.html);
  }
}
