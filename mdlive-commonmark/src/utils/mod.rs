//! Helpers shared by the processor and the hydrator.
use std::ops::Range;

use comrak::nodes::{AstNode, NodeValue, Sourcepos};

/// Create a regex that never matches anything.
///
/// This is used as a fallback pattern when a regex fails to compile.
/// It will never match any input, which is safer than using a trivial regex
/// like `^$` which would match empty strings.
///
/// # Panics
///
/// Panics if the fallback regex pattern `r"^\b$"` fails to compile, which
/// should never happen.
#[must_use]
#[allow(clippy::unwrap_used, reason = "Both patterns are valid literals")]
pub fn never_matching_regex() -> regex::Regex {
  regex::Regex::new(r"[^\s\S]")
    .unwrap_or_else(|_| regex::Regex::new(r"^\b$").unwrap())
}

/// Extract all inline text from a heading or other inline container.
///
/// Images and inline HTML contribute nothing; emphasis, links and code spans
/// contribute their text.
pub fn extract_inline_text<'a>(node: &'a AstNode<'a>) -> String {
  let mut text = String::new();
  for child in node.children() {
    match &child.data.borrow().value {
      NodeValue::Text(t) => text.push_str(t),
      NodeValue::Code(t) => text.push_str(&t.literal),
      NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
      NodeValue::Link(..)
      | NodeValue::Emph
      | NodeValue::Strong
      | NodeValue::Strikethrough
      | NodeValue::Superscript
      | NodeValue::Subscript => text.push_str(&extract_inline_text(child)),
      _ => {},
    }
  }
  text
}

/// Text of the first level-one heading under `root`, if it has any.
pub fn extract_title<'a>(root: &'a AstNode<'a>) -> Option<String> {
  root
    .descendants()
    .filter(|node| {
      matches!(
        node.data.borrow().value,
        NodeValue::Heading(ref heading) if heading.level == 1
      )
    })
    .map(|heading| extract_inline_text(heading).trim().to_string())
    .find(|title| !title.is_empty())
}

/// Byte offset of the start of every line in `source`.
#[must_use]
pub fn line_offsets(source: &str) -> Vec<usize> {
  std::iter::once(0)
    .chain(source.match_indices('\n').map(|(i, _)| i + 1))
    .collect()
}

/// Byte range of `source` covered by `pos`.
///
/// Lines and columns are 1-based and the end is inclusive. Returns `None`
/// when the position does not describe a non-empty range.
#[must_use]
pub fn source_range(offsets: &[usize], pos: Sourcepos) -> Option<Range<usize>> {
  let start_line = pos.start.line.checked_sub(1)?;
  let end_line = pos.end.line.checked_sub(1)?;
  let start = offsets.get(start_line)? + pos.start.column.checked_sub(1)?;
  let end = offsets.get(end_line)? + pos.end.column;
  (start < end).then_some(start..end)
}

/// The source text covered by `pos`, see [`source_range`].
#[must_use]
pub fn source_slice<'s>(
  source: &'s str,
  offsets: &[usize],
  pos: Sourcepos,
) -> Option<&'s str> {
  source.get(source_range(offsets, pos)?)
}

/// Parse an HTML fragment, run `transform_fn` on the document and serialize
/// the body's children back to a string.
///
/// A panic inside the transform is caught and the input is returned
/// unchanged.
pub fn postprocess_html<F>(html: &str, transform_fn: F) -> String
where
  F: FnOnce(&kuchikikiki::NodeRef),
{
  crate::processor::process_safe(
    html,
    |html| {
      use tendril::TendrilSink;

      let document = kuchikikiki::parse_html().one(html);
      transform_fn(&document);
      serialize_body(&document)
    },
    html,
  )
}

/// Serialize the children of the document's `<body>`.
///
/// Falls back to the whole document if there is no body.
#[must_use]
pub fn serialize_body(document: &kuchikikiki::NodeRef) -> String {
  let mut out = Vec::new();
  match document.select_first("body") {
    Ok(body) => {
      for child in body.as_node().children() {
        if let Err(e) = child.serialize(&mut out) {
          log::warn!("Failed to serialize node: {e}");
        }
      }
    },
    Err(()) => {
      if let Err(e) = document.serialize(&mut out) {
        log::warn!("Failed to serialize document: {e}");
      }
    },
  }
  String::from_utf8(out).unwrap_or_default()
}

/// Find the element whose `id` attribute equals `id`.
#[must_use]
pub fn find_by_id(
  document: &kuchikikiki::NodeRef,
  id: &str,
) -> Option<kuchikikiki::NodeRef> {
  document.inclusive_descendants().find(|node| {
    node.as_element().is_some_and(|element| {
      element.attributes.borrow().get("id") == Some(id)
    })
  })
}
