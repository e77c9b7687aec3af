//! Renderer overrides for fenced code, links and images.
//!
//! Each override is a plain function over an owned [`Token`] view of a parser
//! node. Overrides never see the parser, only the token data and a
//! [`RuleContext`] carrying the processor options and an explicit escaping
//! capability, so they can be exercised without building a document.
//!
//! The overrides in use are collected in [`RenderRules`] and registered on a
//! [`crate::MarkdownProcessor`]. A rule left as `None` falls back to the
//! engine's default HTML for that node type.
use std::borrow::Cow;

use crate::{
  processor::MarkdownOptions,
  syntax::SyntaxManager,
  types::{BlockId, RenderedBlock},
};

mod fence;
mod image;
mod link;

pub use fence::render_fence;
pub use image::{
  ImageStyle,
  extract_alt,
  extract_inline_url,
  image_style,
  render_image,
};
pub use link::{render_link_close, render_link_open};

/// Escaping capability handed to every override.
pub trait Escape {
  /// Escape text placed between tags.
  fn escape_text<'s>(&self, text: &'s str) -> Cow<'s, str>;

  /// Escape a value placed inside a double-quoted attribute.
  fn escape_attribute<'s>(&self, value: &'s str) -> Cow<'s, str>;
}

/// [`Escape`] implementation backed by `html-escape`.
///
/// Attribute values get both quote characters escaped, `"` as `&quot;` and
/// `'` as `&#39;`, which are the two entities the hydrator reverses.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEscaper;

impl Escape for HtmlEscaper {
  fn escape_text<'s>(&self, text: &'s str) -> Cow<'s, str> {
    html_escape::encode_text(text)
  }

  fn escape_attribute<'s>(&self, value: &'s str) -> Cow<'s, str> {
    let escaped = html_escape::encode_text(value);
    if escaped.contains(['"', '\'']) {
      Cow::Owned(escaped.replace('"', "&quot;").replace('\'', "&#39;"))
    } else {
      escaped
    }
  }
}

/// Return `url`, or an empty string when its scheme can run script or reach
/// the local filesystem.
///
/// `javascript:`, `vbscript:` and `file:` are rejected, as is `data:` unless
/// it holds a GIF, PNG, JPEG or WebP image. Whitespace and control characters
/// are ignored when reading the scheme, the way browsers ignore them.
#[must_use]
pub fn sanitize_url(url: &str) -> &str {
  let scheme: String = url
    .chars()
    .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
    .take(16)
    .collect::<String>()
    .to_ascii_lowercase();

  let dangerous = ["javascript:", "vbscript:", "file:"]
    .iter()
    .any(|bad| scheme.starts_with(bad))
    || (scheme.starts_with("data:")
      && ![
        "data:image/gif;",
        "data:image/png;",
        "data:image/jpeg;",
        "data:image/webp;",
      ]
      .iter()
      .any(|good| scheme.starts_with(good)));

  if dangerous {
    log::debug!("Dropping unsafe URL: {url}");
    ""
  } else {
    url
  }
}

/// Override-level view of a parser node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
  /// A fenced code block.
  Fence(FenceToken),
  /// The opening half of a hyperlink.
  LinkOpen(LinkToken),
  /// An image, inline or reference style.
  Image(ImageToken),
  /// Any node the overrides do not handle.
  Other { content: String },
}

impl Token {
  /// Raw content of the token.
  #[must_use]
  pub fn content(&self) -> &str {
    match self {
      Self::Fence(fence) => &fence.content,
      Self::LinkOpen(link) => &link.url,
      Self::Image(image) => &image.content,
      Self::Other { content } => content,
    }
  }
}

/// Fenced code block data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FenceToken {
  /// Literal body of the fence.
  pub content: String,
  /// Info string following the opening fence.
  pub info:    String,
}

/// Hyperlink data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkToken {
  pub url:   String,
  pub title: String,
}

/// Image data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageToken {
  /// Source markup of the image, e.g. `![alt](url)` or `![alt][ref]`.
  pub content: String,
  /// Attributes resolved by the parser (`src`, `alt`, `title`).
  pub attrs:   Vec<(String, String)>,
}

impl ImageToken {
  /// Look up a resolved attribute.
  #[must_use]
  pub fn attr(&self, key: &str) -> Option<&str> {
    self
      .attrs
      .iter()
      .find(|(name, _)| name == key)
      .map(|(_, value)| value.as_str())
  }
}

/// Everything an override may read besides its token.
#[derive(Clone, Copy)]
pub struct RuleContext<'r> {
  pub escaper:     &'r dyn Escape,
  pub options:     &'r MarkdownOptions,
  pub highlighter: Option<&'r SyntaxManager>,
}

impl<'r> RuleContext<'r> {
  #[must_use]
  pub const fn new(escaper: &'r dyn Escape, options: &'r MarkdownOptions) -> Self {
    Self {
      escaper,
      options,
      highlighter: None,
    }
  }

  #[must_use]
  pub const fn with_highlighter(
    mut self,
    highlighter: Option<&'r SyntaxManager>,
  ) -> Self {
    self.highlighter = highlighter;
    self
  }
}

/// Override for fenced code blocks.
pub type FenceRule = fn(&FenceToken, BlockId, &RuleContext<'_>) -> RenderedBlock;

/// Override for the opening tag of a hyperlink.
pub type LinkOpenRule = fn(&LinkToken, &RuleContext<'_>) -> String;

/// Override for images.
pub type ImageRule = fn(&Token, &RuleContext<'_>) -> String;

/// The set of overrides a processor applies.
#[derive(Clone, Copy)]
pub struct RenderRules {
  pub fence:     Option<FenceRule>,
  pub link_open: Option<LinkOpenRule>,
  pub image:     Option<ImageRule>,
}

impl RenderRules {
  /// No overrides; every node keeps the engine's default rendering.
  #[must_use]
  pub const fn none() -> Self {
    Self {
      fence:     None,
      link_open: None,
      image:     None,
    }
  }

  /// The built-in fence, link and image overrides.
  #[must_use]
  pub const fn builtin() -> Self {
    Self {
      fence:     Some(render_fence),
      link_open: Some(render_link_open),
      image:     Some(render_image),
    }
  }

  /// Whether any override is registered.
  #[must_use]
  pub const fn is_empty(&self) -> bool {
    self.fence.is_none() && self.link_open.is_none() && self.image.is_none()
  }
}

impl Default for RenderRules {
  fn default() -> Self {
    Self::builtin()
  }
}

impl std::fmt::Debug for RenderRules {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RenderRules")
      .field("fence", &self.fence.is_some())
      .field("link_open", &self.link_open.is_some())
      .field("image", &self.image.is_some())
      .finish()
  }
}
