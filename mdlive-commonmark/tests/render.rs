#![allow(clippy::expect_used, clippy::panic, reason = "Fine in tests")]
use mdlive_commonmark::{
  BlockKind,
  MarkdownOptions,
  MarkdownProcessor,
  hydrate::decode_declaration,
};
use serde_json::json;
use tendril::TendrilSink;

fn processor() -> MarkdownProcessor {
  MarkdownProcessor::new(MarkdownOptions {
    highlight_code: false,
    ..Default::default()
  })
}

fn assert_html_contains(html: &str, expected: &[&str]) {
  for &needle in expected {
    assert!(
      html.contains(needle),
      "Expected HTML to contain '{needle}', but it did not.\nFull \
       HTML:\n{html}"
    );
  }
}

#[test]
fn test_plain_fence_renders_code_block() {
  let result = processor().render("```\nalert(1)\n```\n");

  assert_html_contains(&result.html, &[
    "<div class=\"code-block-wrapper\">",
    "data-action=\"copy-code\" data-target=\"code-block-1\"",
    "<code id=\"code-block-1\" class=\"hljs\">alert(1)\n</code>",
  ]);
  assert!(!result.html.contains("echarts-chart"));
  assert_eq!(result.blocks.len(), 1);
  assert_eq!(result.blocks[0].kind, BlockKind::Code {
    language: String::new(),
  });
}

#[test]
fn test_fence_content_is_escaped() {
  let result =
    processor().render("```html\n<script>alert(\"x\") && 1</script>\n```\n");

  assert!(!result.html.contains("<script>"));
  assert_html_contains(&result.html, &[
    "class=\"hljs html\"",
    "&lt;script&gt;alert(\"x\") &amp;&amp; 1&lt;/script&gt;",
    "<span class=\"code-lang\">html</span>",
  ]);
}

#[test]
fn test_chart_fence_round_trips_declaration() {
  let result = processor().render("```echarts\n{\"series\":[]}\n```\n");

  assert_eq!(result.charts().count(), 1);
  assert!(!result.html.contains("copy-btn"));

  let document = kuchikikiki::parse_html().one(result.html.as_str());
  let placeholder = document
    .select_first(".echarts-chart")
    .expect("chart placeholder");
  let attributes = placeholder.attributes.borrow();
  let raw = attributes.get("data-option").expect("data-option attribute");

  let declaration = decode_declaration(raw).expect("valid declaration");
  assert_eq!(
    serde_json::to_value(&declaration).expect("serializable"),
    json!({ "series": [] })
  );
  assert_eq!(attributes.get("id"), Some("code-block-1"));
}

#[test]
fn test_chart_attribute_escapes_quotes() {
  let result =
    processor().render("```echarts\n{\"title\": {\"text\": \"It's\"}}\n```\n");
  assert_html_contains(&result.html, &[
    "data-option=\"{&quot;title&quot;: {&quot;text&quot;: \
     &quot;It&#39;s&quot;}}\n\"",
    "height: 300px",
  ]);
}

#[test]
fn test_chart_language_is_configurable() {
  let processor = MarkdownProcessor::new(MarkdownOptions {
    chart_language: "chart".to_string(),
    chart_height: 420,
    highlight_code: false,
    ..Default::default()
  });

  let result = processor.render("```chart\n{}\n```\n\n```echarts\n{}\n```\n");
  let kinds: Vec<_> = result.blocks.iter().map(|b| &b.kind).collect();
  assert_eq!(kinds, vec![&BlockKind::Chart, &BlockKind::Code {
    language: "echarts".to_string(),
  }]);
  assert!(result.html.contains("height: 420px"));
}

#[test]
fn test_indented_code_keeps_default_rendering() {
  let result = processor().render("Text\n\n    indented code\n");
  assert_html_contains(&result.html, &["<pre><code>indented code\n</code></pre>"]);
  assert!(result.blocks.is_empty());
  assert!(!result.html.contains("copy-btn"));
}

#[test]
fn test_every_anchor_is_hardened() {
  let markdown = "[site](https://example.com) [mail](mailto:a@b.test) \
                  [rel](./local.md) [js](javascript:alert(1)) \
                  <https://auto.test> and bare https://bare.test here";
  let result = processor().render(markdown);

  let anchors = result.html.matches("<a ").count();
  assert_eq!(anchors, 6, "{}", result.html);
  assert_eq!(
    result
      .html
      .matches("target=\"_blank\" rel=\"noopener noreferrer\"")
      .count(),
    anchors
  );
  assert!(!result.html.contains("javascript:"));
  assert_html_contains(&result.html, &[
    "<a href=\"\" target=\"_blank\" rel=\"noopener noreferrer\">js</a>",
  ]);
}

#[test]
fn test_script_urls_dropped_without_raw_html() {
  let processor = MarkdownProcessor::new(MarkdownOptions {
    html: false,
    highlight_code: false,
    ..Default::default()
  });
  let result = processor
    .render("[x](javascript:alert(1)) ![i](javascript:alert(2)) [v](vbscript:x)");

  assert!(!result.html.contains("javascript:"), "{}", result.html);
  assert!(!result.html.contains("vbscript:"), "{}", result.html);
  assert_html_contains(&result.html, &[
    "<a href=\"\" target=\"_blank\"",
    "<img src=\"\" alt=\"i\"",
    "data-preview-src=\"\"",
  ]);
}

#[test]
fn test_data_image_urls_are_kept() {
  let result = processor().render("![dot](data:image/png;base64,iVBORw0KGgo=)");
  assert_html_contains(&result.html, &[
    "src=\"data:image/png;base64,iVBORw0KGgo=\"",
  ]);
}

#[test]
fn test_link_children_survive() {
  let result = processor().render("[**bold** and `code`](https://x.test)");
  assert_html_contains(&result.html, &[
    "rel=\"noopener noreferrer\"><strong>bold</strong> and \
     <code>code</code></a>",
  ]);
}

#[test]
fn test_inline_image() {
  let result = processor().render("![A cat](https://x.test/cat.png \"Kitty\")");
  assert_html_contains(&result.html, &[
    "<span class=\"markdown-image-wrapper\">",
    "src=\"https://x.test/cat.png\"",
    "alt=\"A cat\"",
    "title=\"Kitty\"",
    "loading=\"lazy\"",
    "data-action=\"preview-image\" data-preview-src=\"https://x.test/cat.png\"",
  ]);
}

#[test]
fn test_reference_image_resolves_from_definition() {
  let result =
    processor().render("![Logo][logo]\n\n[logo]: /img/logo.svg \"The logo\"\n");
  assert_html_contains(&result.html, &[
    "src=\"/img/logo.svg\"",
    "alt=\"Logo\"",
    "title=\"The logo\"",
  ]);
}

#[test]
fn test_image_inside_link() {
  let result = processor().render("[![badge](b.svg)](https://ci.test)");
  assert_html_contains(&result.html, &[
    "<a href=\"https://ci.test\" target=\"_blank\"",
    "<img src=\"b.svg\" alt=\"badge\"",
  ]);
}

#[test]
fn test_escaped_line_breaks_are_normalized() {
  let result = processor().render("first\\nsecond\r\nthird");
  assert_html_contains(&result.html, &["first<br />", "second<br />", "third"]);
  assert!(!result.html.contains("\\n"));
}

#[test]
fn test_title_from_first_h1() {
  let result = processor().render("Intro\n\n# Report **2024**\n\n# Other\n");
  assert_eq!(result.title.as_deref(), Some("Report 2024"));
}

#[test]
fn test_id_prefix() {
  let processor = MarkdownProcessor::new(MarkdownOptions {
    id_prefix: Some("doc".to_string()),
    highlight_code: false,
    ..Default::default()
  });
  let result = processor.render("```rust\nfn main() {}\n```\n");
  assert_html_contains(&result.html, &[
    "data-target=\"doc-code-block-1\"",
    "id=\"doc-code-block-1\"",
  ]);
}

#[test]
fn test_identifiers_are_deterministic() {
  let markdown = "# T\n\n```a\n1\n```\n\n- item\n\n  ```b\n  2\n  ```\n";
  let first = processor().render(markdown);
  let second = processor().render(markdown);
  assert_eq!(first.blocks, second.blocks);
  assert_eq!(first.html, second.html);
}

#[test]
fn test_raw_html_toggle() {
  let markdown = "<div class=\"note\">raw</div>\n";
  assert!(processor().render(markdown).html.contains("<div class=\"note\">"));

  let strict = MarkdownProcessor::new(MarkdownOptions {
    html: false,
    highlight_code: false,
    ..Default::default()
  });
  assert!(!strict.render(markdown).html.contains("<div class=\"note\">"));
}

#[test]
fn test_gfm_tables() {
  let result = processor().render("| a | b |\n|---|---|\n| 1 | 2 |\n");
  assert_html_contains(&result.html, &["<table>", "<td>1</td>"]);
}

#[test]
fn test_syntax_extensions() {
  let result = processor().render("H~2~O and x^2^\n\n- [x] done\n- [ ] todo\n");
  assert_html_contains(&result.html, &[
    "<sub>2</sub>",
    "<sup>2</sup>",
    "type=\"checkbox\"",
  ]);
}
