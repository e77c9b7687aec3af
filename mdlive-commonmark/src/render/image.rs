use super::{ImageToken, RuleContext, Token, sanitize_url};

/// How an image was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStyle {
  /// `![alt](url "title")`
  Inline,
  /// `![alt][id]`, `![alt][]` or `![alt]`
  Reference,
}

/// Classify image source markup by the inline delimiter `](`.
#[must_use]
pub fn image_style(content: &str) -> ImageStyle {
  if content.contains("](") {
    ImageStyle::Inline
  } else {
    ImageStyle::Reference
  }
}

/// Byte index of the `]` closing the bracket opened at `open`, honouring
/// nesting and backslash escapes.
fn closing_bracket(content: &str, open: usize) -> Option<usize> {
  let mut depth = 0usize;
  let mut escaped = false;
  for (i, c) in content.char_indices().skip_while(|(i, _)| *i < open) {
    if escaped {
      escaped = false;
      continue;
    }
    match c {
      '\\' => escaped = true,
      '[' => depth += 1,
      ']' => {
        depth = depth.saturating_sub(1);
        if depth == 0 {
          return Some(i);
        }
      },
      _ => {},
    }
  }
  None
}

/// Alt text of an image: the label between `![` (or a leading `[`) and its
/// matching `]`, with the trailing reference marker stripped.
#[must_use]
pub fn extract_alt(content: &str) -> Option<&str> {
  let open = content.find('[')?;
  let close = closing_bracket(content, open)?;
  content.get(open + 1..close)
}

/// Destination of an inline image.
///
/// Takes the text between the first `(` after the label's closing `]` and the
/// matching `)`, balancing nested parentheses. An optional title and angle
/// brackets around the destination are dropped.
#[must_use]
pub fn extract_inline_url(content: &str) -> Option<String> {
  let open = content.find('[')?;
  let close = closing_bracket(content, open)?;
  let rest = content.get(close + 1..)?;
  let rest = rest.strip_prefix('(')?;

  let mut depth = 1usize;
  let mut escaped = false;
  let mut end = None;
  for (i, c) in rest.char_indices() {
    if escaped {
      escaped = false;
      continue;
    }
    match c {
      '\\' => escaped = true,
      '(' => depth += 1,
      ')' => {
        depth -= 1;
        if depth == 0 {
          end = Some(i);
          break;
        }
      },
      _ => {},
    }
  }

  let inner = rest.get(..end?)?.trim();
  let destination = if let Some(bracketed) = inner.strip_prefix('<') {
    bracketed.split_once('>').map_or(bracketed, |(dest, _)| dest)
  } else {
    inner.split_whitespace().next().unwrap_or_default()
  };

  Some(destination.to_string())
}

/// Render an image as a lazily loaded `<img>` wrapped for styling.
///
/// Clicking the image dispatches the `preview-image` action with the
/// resolved URL; the preview itself belongs to the host. Tokens that are not
/// images are returned unchanged.
#[must_use]
pub fn render_image(token: &Token, ctx: &RuleContext<'_>) -> String {
  let Token::Image(image) = token else {
    return token.content().to_string();
  };

  let alt = resolve_alt(image);
  let src = resolve_src(image);

  let esc = ctx.escaper;
  let src = esc.escape_attribute(sanitize_url(&src));
  let alt = esc.escape_attribute(&alt);
  let title = image
    .attr("title")
    .filter(|title| !title.is_empty())
    .map(|title| format!(" title=\"{}\"", esc.escape_attribute(title)))
    .unwrap_or_default();

  format!(
    "<span class=\"markdown-image-wrapper\"><img src=\"{src}\" \
     alt=\"{alt}\"{title} loading=\"lazy\" data-action=\"preview-image\" \
     data-preview-src=\"{src}\"></span>"
  )
}

fn resolve_alt(image: &ImageToken) -> String {
  extract_alt(&image.content)
    .map(str::to_string)
    .or_else(|| image.attr("alt").map(str::to_string))
    .unwrap_or_default()
}

fn resolve_src(image: &ImageToken) -> String {
  let inline = match image_style(&image.content) {
    ImageStyle::Inline => {
      extract_inline_url(&image.content).filter(|url| !url.is_empty())
    },
    ImageStyle::Reference => None,
  };

  inline
    .or_else(|| image.attr("src").map(str::to_string))
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{processor::MarkdownOptions, render::HtmlEscaper};

  fn image(content: &str, attrs: &[(&str, &str)]) -> Token {
    Token::Image(ImageToken {
      content: content.to_string(),
      attrs:   attrs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect(),
    })
  }

  fn render(token: &Token) -> String {
    let options = MarkdownOptions::default();
    let ctx = RuleContext::new(&HtmlEscaper, &options);
    render_image(token, &ctx)
  }

  #[test]
  fn test_style_detection() {
    assert_eq!(image_style("![a](b.png)"), ImageStyle::Inline);
    assert_eq!(image_style("![a][b]"), ImageStyle::Reference);
    assert_eq!(image_style("![a]"), ImageStyle::Reference);
  }

  #[test]
  fn test_extract_alt() {
    assert_eq!(extract_alt("![A cat](cat.png)"), Some("A cat"));
    assert_eq!(extract_alt("![A cat][cat]"), Some("A cat"));
    assert_eq!(extract_alt("![see [this]](x.png)"), Some("see [this]"));
    assert_eq!(extract_alt("![esc \\] ok](x.png)"), Some("esc \\] ok"));
    assert_eq!(extract_alt("no brackets"), None);
  }

  #[test]
  fn test_extract_inline_url() {
    assert_eq!(
      extract_inline_url("![a](https://x.test/a.png)").as_deref(),
      Some("https://x.test/a.png")
    );
    assert_eq!(
      extract_inline_url("![a](https://x.test/a.png \"Title\")").as_deref(),
      Some("https://x.test/a.png")
    );
    assert_eq!(
      extract_inline_url("![a](<with space.png>)").as_deref(),
      Some("with space.png")
    );
    assert_eq!(
      extract_inline_url("![a](https://en.wikipedia.org/wiki/Rust_(language))")
        .as_deref(),
      Some("https://en.wikipedia.org/wiki/Rust_(language)")
    );
    assert_eq!(extract_inline_url("![a]()").as_deref(), Some(""));
    assert_eq!(extract_inline_url("![a](unterminated"), None);
    assert_eq!(extract_inline_url("![a][ref]"), None);
  }

  #[test]
  fn test_render_inline_image() {
    let html = render(&image("![A cat](cat.png)", &[("src", "cat.png")]));
    assert!(html.contains("src=\"cat.png\""));
    assert!(html.contains("alt=\"A cat\""));
    assert!(html.contains("loading=\"lazy\""));
    assert!(html.contains("data-action=\"preview-image\""));
    assert!(html.contains("data-preview-src=\"cat.png\""));
  }

  #[test]
  fn test_render_reference_image() {
    let html = render(&image("![Logo][logo]", &[
      ("src", "/img/logo.svg"),
      ("alt", "Logo"),
    ]));
    assert!(html.contains("src=\"/img/logo.svg\""));
    assert!(html.contains("alt=\"Logo\""));
  }

  #[test]
  fn test_render_degrades_to_empty_values() {
    let html = render(&image("", &[]));
    assert!(html.contains("src=\"\""));
    assert!(html.contains("alt=\"\""));
  }

  #[test]
  fn test_render_escapes_url() {
    let html = render(&image("![x](a.png\"onerror=\"alert(1))", &[]));
    assert!(!html.contains("\"onerror"));
  }

  #[test]
  fn test_render_drops_script_url() {
    let html = render(&image("![x](javascript:alert(2))", &[(
      "src",
      "javascript:alert(2)",
    )]));
    assert!(!html.contains("javascript"));
    assert!(html.contains("src=\"\""));
    assert!(html.contains("data-preview-src=\"\""));
  }

  #[test]
  fn test_non_image_token_returned_unchanged() {
    let token = Token::Other {
      content: "plain <b>content</b>".to_string(),
    };
    assert_eq!(render(&token), "plain <b>content</b>");
  }
}
