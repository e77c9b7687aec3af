use log::trace;

use super::{FenceToken, RuleContext};
use crate::types::{BlockId, BlockKind, RenderedBlock};

/// Render a fenced code block.
///
/// A fence whose trimmed info string equals the configured chart language
/// becomes a chart placeholder carrying the escaped body in `data-option`.
/// Every other fence becomes a code block with a header strip and a copy
/// control targeting the block's identifier. The body is escaped in both
/// branches; no parsing of the chart body happens here.
#[must_use]
pub fn render_fence(
  token: &FenceToken,
  id: BlockId,
  ctx: &RuleContext<'_>,
) -> RenderedBlock {
  let label = token.info.trim();

  if !label.is_empty() && label == ctx.options.chart_language {
    trace!("Rendering chart placeholder {id}");
    let html = chart_placeholder(&token.content, &id, ctx);
    return RenderedBlock {
      id,
      kind: BlockKind::Chart,
      html,
    };
  }

  let language = label.split_whitespace().next().unwrap_or_default();
  let html = code_block(&token.content, language, &id, ctx);
  RenderedBlock {
    id,
    kind: BlockKind::Code {
      language: language.to_string(),
    },
    html,
  }
}

fn chart_placeholder(
  content: &str,
  id: &BlockId,
  ctx: &RuleContext<'_>,
) -> String {
  let esc = ctx.escaper;
  let label = esc.escape_text(&ctx.options.chart_label);
  let option = esc.escape_attribute(content);
  let height = ctx.options.chart_height;

  format!(
    "<div class=\"echarts-block-wrapper\">\n<div \
     class=\"code-header\"><span class=\"code-lang\">{label}</span></div>\n<div \
     id=\"{id}\" class=\"echarts-chart\" data-option=\"{option}\" \
     style=\"width: 100%; height: {height}px; max-width: \
     100%;\"></div>\n</div>\n"
  )
}

fn code_block(
  content: &str,
  language: &str,
  id: &BlockId,
  ctx: &RuleContext<'_>,
) -> String {
  let esc = ctx.escaper;
  let copy_label = esc.escape_text(&ctx.options.copy_label);

  let lang_span = if language.is_empty() {
    String::new()
  } else {
    format!(
      "<span class=\"code-lang\">{}</span>",
      esc.escape_text(language)
    )
  };

  let class = if language.is_empty() {
    "hljs".to_string()
  } else {
    format!("hljs {}", esc.escape_attribute(language))
  };

  let code = highlighted(content, language, ctx)
    .unwrap_or_else(|| esc.escape_text(content).into_owned());

  format!(
    "<div class=\"code-block-wrapper\">\n<div \
     class=\"code-header\">{lang_span}<button class=\"copy-btn\" \
     type=\"button\" data-action=\"copy-code\" \
     data-target=\"{id}\">{copy_label}</button></div>\n<pre><code id=\"{id}\" \
     class=\"{class}\">{code}</code></pre>\n</div>\n"
  )
}

/// Highlighted HTML for `content`, when a highlighter is configured and knows
/// the language. The highlighter escapes the text itself.
fn highlighted(
  content: &str,
  language: &str,
  ctx: &RuleContext<'_>,
) -> Option<String> {
  if language.is_empty() || !ctx.options.highlight_code {
    return None;
  }

  ctx
    .highlighter?
    .highlight_code(content, language)
    .map_err(|e| trace!("Leaving {language} block unhighlighted: {e}"))
    .ok()
}
