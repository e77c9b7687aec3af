//! Chart hydration.
//!
//! Rendering leaves each chart as an empty placeholder carrying its escaped
//! declaration in `data-option`. The [`Hydrator`] is the second, decoupled
//! pass: it scans a DOM for placeholders, decodes each declaration and hands
//! it to a [`ChartEngine`]. A placeholder is latched with
//! `data-echarts-inited="1"` before decoding, so running the pass again after
//! every content update activates each placeholder at most once, and a
//! broken declaration is never retried.
use std::borrow::Cow;

use kuchikikiki::NodeRef;
use log::{debug, error, trace};
use markup5ever::{QualName, local_name, ns};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
  error::{ChartError, DecodeError},
  utils,
};

/// Class carried by every chart placeholder.
pub const CHART_CLASS: &str = "echarts-chart";

/// Attribute holding the escaped declaration.
pub const OPTION_ATTR: &str = "data-option";

/// Latch attribute set on a placeholder once it has been visited.
pub const INITED_ATTR: &str = "data-echarts-inited";

/// A decoded chart declaration: a JSON object passed to the engine as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartDeclaration(Map<String, Value>);

impl ChartDeclaration {
  /// Top-level entry of the declaration.
  #[must_use]
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  #[must_use]
  pub const fn as_map(&self) -> &Map<String, Value> {
    &self.0
  }

  #[must_use]
  pub fn into_inner(self) -> Map<String, Value> {
    self.0
  }
}

impl From<Map<String, Value>> for ChartDeclaration {
  fn from(map: Map<String, Value>) -> Self {
    Self(map)
  }
}

/// Reverse the quote escaping applied when the declaration was written into
/// the attribute.
#[must_use]
pub fn unescape_declaration(raw: &str) -> Cow<'_, str> {
  if !raw.contains("&quot;") && !raw.contains("&#39;") && !raw.contains("&#x27;")
  {
    return Cow::Borrowed(raw);
  }
  Cow::Owned(
    raw
      .replace("&quot;", "\"")
      .replace("&#39;", "'")
      .replace("&#x27;", "'"),
  )
}

/// Decode the value of a `data-option` attribute.
///
/// # Errors
///
/// Returns [`DecodeError::Empty`] for a blank declaration and
/// [`DecodeError::Json`] when it is not a JSON object.
pub fn decode_declaration(raw: &str) -> Result<ChartDeclaration, DecodeError> {
  let unescaped = unescape_declaration(raw);
  if unescaped.trim().is_empty() {
    return Err(DecodeError::Empty);
  }
  Ok(serde_json::from_str(&unescaped)?)
}

/// Something that can draw a chart into a placeholder element.
pub trait ChartEngine {
  /// Initialize a chart in `container` from `declaration`.
  ///
  /// # Errors
  ///
  /// Returns a [`ChartError`] when the declaration is rejected or drawing
  /// fails. The hydrator clears the container in that case.
  fn init(
    &self,
    container: &NodeRef,
    declaration: &ChartDeclaration,
  ) -> Result<(), ChartError>;
}

impl<F> ChartEngine for F
where
  F: Fn(&NodeRef, &ChartDeclaration) -> Result<(), ChartError>,
{
  fn init(
    &self,
    container: &NodeRef,
    declaration: &ChartDeclaration,
  ) -> Result<(), ChartError> {
    self(container, declaration)
  }
}

/// Engine for static pages: embeds the decoded declaration as a JSON script
/// inside the placeholder so a client-side charting library can pick it up.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbedScriptEngine;

impl ChartEngine for EmbedScriptEngine {
  fn init(
    &self,
    container: &NodeRef,
    declaration: &ChartDeclaration,
  ) -> Result<(), ChartError> {
    let json = serde_json::to_string(declaration)
      .map_err(|e| ChartError::InvalidOption(e.to_string()))?;

    let script = NodeRef::new_element(
      QualName::new(None, ns!(html), local_name!("script")),
      vec![
        (
          kuchikikiki::ExpandedName::new("", "type"),
          kuchikikiki::Attribute {
            prefix: None,
            value:  "application/json".into(),
          },
        ),
        (
          kuchikikiki::ExpandedName::new("", "class"),
          kuchikikiki::Attribute {
            prefix: None,
            value:  "echarts-option".into(),
          },
        ),
      ],
    );
    // Script bodies are serialized raw, so keep the JSON from closing the tag.
    script.append(NodeRef::new_text(json.replace("</", "<\\/")));
    container.append(script);
    Ok(())
  }
}

/// Outcome of one hydration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HydrationReport {
  /// Placeholders handed to the engine successfully.
  pub activated: usize,
  /// Placeholders already latched by an earlier pass.
  pub skipped:   usize,
  /// Placeholders with an absent or empty `data-option` attribute.
  pub missing:   usize,
  /// Placeholders whose declaration failed to decode or initialize.
  pub failed:    usize,
}

impl HydrationReport {
  /// Number of placeholders visited for the first time in this pass.
  #[must_use]
  pub const fn visited(&self) -> usize {
    self.activated + self.missing + self.failed
  }
}

/// Whether `element` carries the hydration latch.
#[must_use]
pub fn is_activated(element: &NodeRef) -> bool {
  element
    .as_element()
    .is_some_and(|el| el.attributes.borrow().contains(INITED_ATTR))
}

/// Scans a DOM for chart placeholders and activates them through an engine.
#[derive(Debug, Clone, Default)]
pub struct Hydrator<E> {
  engine: E,
}

impl<E: ChartEngine> Hydrator<E> {
  #[must_use]
  pub const fn new(engine: E) -> Self {
    Self { engine }
  }

  #[must_use]
  pub const fn engine(&self) -> &E {
    &self.engine
  }

  /// Activate every placeholder under `document` that has not been visited.
  ///
  /// Failures are isolated per placeholder: a broken declaration is logged,
  /// its placeholder emptied, and the scan moves on.
  pub fn activate_charts(&self, document: &NodeRef) -> HydrationReport {
    let mut report = HydrationReport::default();

    let Ok(selection) = document.select(&format!(".{CHART_CLASS}")) else {
      return report;
    };
    let placeholders: Vec<NodeRef> =
      selection.map(|el| el.as_node().clone()).collect();

    for placeholder in placeholders {
      let Some(element) = placeholder.as_element() else {
        continue;
      };

      let raw = {
        let mut attributes = element.attributes.borrow_mut();
        if attributes.contains(INITED_ATTR) {
          report.skipped += 1;
          continue;
        }
        attributes.insert(INITED_ATTR, "1".to_string());
        attributes
          .get(OPTION_ATTR)
          .filter(|raw| !raw.is_empty())
          .map(str::to_string)
      };

      let Some(raw) = raw else {
        debug!("Chart placeholder without a declaration, skipping");
        report.missing += 1;
        continue;
      };

      let outcome = decode_declaration(&raw)
        .map_err(|e| e.to_string())
        .and_then(|declaration| {
          self
            .engine
            .init(&placeholder, &declaration)
            .map_err(|e| e.to_string())
        });

      match outcome {
        Ok(()) => {
          trace!("Activated chart placeholder");
          report.activated += 1;
        },
        Err(e) => {
          error!("Failed to initialize chart: {e}");
          let children: Vec<_> = placeholder.children().collect();
          for child in children {
            child.detach();
          }
          report.failed += 1;
        },
      }
    }

    report
  }
}

/// Parse an HTML fragment, hydrate it and serialize it back.
#[must_use]
pub fn hydrate_html<E: ChartEngine>(
  html: &str,
  hydrator: &Hydrator<E>,
) -> (String, HydrationReport) {
  let mut report = HydrationReport::default();
  let html = utils::postprocess_html(html, |document| {
    report = hydrator.activate_charts(document);
  });
  (html, report)
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use std::cell::Cell;

  use tendril::TendrilSink;

  use super::*;

  fn parse(html: &str) -> NodeRef {
    kuchikikiki::parse_html().one(html)
  }

  #[test]
  fn test_unescape_declaration() {
    assert_eq!(
      unescape_declaration("{&quot;a&quot;:&#39;b&#x27;}"),
      "{\"a\":'b'}"
    );
    assert!(matches!(unescape_declaration("{}"), Cow::Borrowed(_)));
  }

  #[test]
  fn test_decode_declaration() {
    let declaration =
      decode_declaration("{&quot;series&quot;:[]}").expect("valid object");
    assert_eq!(declaration.get("series"), Some(&Value::Array(Vec::new())));
  }

  #[test]
  fn test_decode_rejects_non_objects() {
    assert!(matches!(decode_declaration("  "), Err(DecodeError::Empty)));
    assert!(matches!(decode_declaration("[1, 2]"), Err(DecodeError::Json(_))));
    assert!(matches!(
      decode_declaration("{not json"),
      Err(DecodeError::Json(_))
    ));
  }

  #[test]
  fn test_activation_is_latched() {
    let calls = Cell::new(0);
    let engine = |_: &NodeRef, _: &ChartDeclaration| -> Result<(), ChartError> {
      calls.set(calls.get() + 1);
      Ok(())
    };
    let hydrator = Hydrator::new(engine);
    let document = parse(
      "<div class=\"echarts-chart\" data-option=\"{&quot;a&quot;:1}\"></div>",
    );

    let first = hydrator.activate_charts(&document);
    let second = hydrator.activate_charts(&document);

    assert_eq!(first.activated, 1);
    assert_eq!(second.activated, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(calls.get(), 1);
  }

  #[test]
  fn test_missing_option_is_latched() {
    let hydrator = Hydrator::new(EmbedScriptEngine);
    let document = parse("<div class=\"echarts-chart\"></div>");

    let report = hydrator.activate_charts(&document);
    assert_eq!(report.missing, 1);

    let placeholder = document
      .select_first(".echarts-chart")
      .expect("placeholder");
    assert!(is_activated(placeholder.as_node()));
  }

  #[test]
  fn test_empty_option_is_missing() {
    let hydrator = Hydrator::new(EmbedScriptEngine);
    let document = parse(
      "<div class=\"echarts-chart\" data-option=\"\"><span>keep</span></div>",
    );

    let report = hydrator.activate_charts(&document);
    assert_eq!(report, HydrationReport {
      missing: 1,
      ..Default::default()
    });

    let placeholder = document
      .select_first(".echarts-chart")
      .expect("placeholder");
    assert!(is_activated(placeholder.as_node()));
    assert_eq!(placeholder.as_node().children().count(), 1);
  }

  #[test]
  fn test_engine_error_clears_container() {
    let engine = |_: &NodeRef, _: &ChartDeclaration| -> Result<(), ChartError> {
      Err(ChartError::Engine("no canvas".to_string()))
    };
    let hydrator = Hydrator::new(engine);
    let document = parse(
      "<div class=\"echarts-chart\" data-option=\"{}\"><span>old</span></div>",
    );

    let report = hydrator.activate_charts(&document);
    assert_eq!(report.failed, 1);

    let placeholder = document
      .select_first(".echarts-chart")
      .expect("placeholder");
    assert_eq!(placeholder.as_node().children().count(), 0);
  }

  #[test]
  fn test_embed_script_engine() {
    let hydrator = Hydrator::new(EmbedScriptEngine);
    let (html, report) = hydrate_html(
      "<div class=\"echarts-chart\" \
       data-option=\"{&quot;title&quot;:&quot;</script>&quot;}\"></div>",
      &hydrator,
    );
    assert_eq!(report.activated, 1);
    assert!(html.contains("<script type=\"application/json\" class=\"echarts-option\">"));
    assert!(html.contains("{\"title\":\"<\\/script>\"}"));
  }

  #[test]
  fn test_hydrate_html_without_placeholders() {
    let hydrator = Hydrator::new(EmbedScriptEngine);
    let (html, report) = hydrate_html("<p>plain</p>", &hydrator);
    assert_eq!(html, "<p>plain</p>");
    assert_eq!(report, HydrationReport::default());
  }
}
