//! Core implementation of the Markdown processor.
use std::sync::Arc;

use comrak::{
  Arena,
  nodes::{AstNode, NodeValue, Sourcepos},
  options::Options,
  parse_document,
};
use log::{debug, error, trace};

use super::types::{
  AstTransformer,
  MarkdownOptions,
  MarkdownProcessor,
  TypographerTransformer,
};
use crate::{
  preprocess,
  render::{
    Escape,
    FenceToken,
    ImageToken,
    LinkToken,
    RenderRules,
    RuleContext,
    Token,
    render_link_close,
  },
  syntax::{SyntaxManager, create_default_manager},
  types::{BlockId, MarkdownResult, RenderedBlock},
  utils,
};

impl MarkdownProcessor {
  /// Create a new `MarkdownProcessor` with the given options.
  ///
  /// The parser configuration is built here, once, and the built-in
  /// renderer overrides are registered.
  #[must_use]
  pub fn new(options: MarkdownOptions) -> Self {
    let syntax_manager = if options.highlight_code {
      match create_default_manager() {
        Ok(manager) => Some(Arc::new(manager)),
        Err(e) => {
          debug!("Server-side highlighting unavailable: {e}");
          None
        },
      }
    } else {
      None
    };

    let comrak = comrak_options(&options);

    Self {
      options,
      comrak,
      rules: RenderRules::builtin(),
      escaper: Arc::new(crate::render::HtmlEscaper),
      syntax_manager,
    }
  }

  /// Access processor options.
  #[must_use]
  pub const fn options(&self) -> &MarkdownOptions {
    &self.options
  }

  /// Access the registered renderer overrides.
  #[must_use]
  pub const fn rules(&self) -> &RenderRules {
    &self.rules
  }

  /// Replace the registered renderer overrides.
  #[must_use]
  pub const fn with_rules(mut self, rules: RenderRules) -> Self {
    self.rules = rules;
    self
  }

  /// Replace the escaping capability handed to the overrides.
  #[must_use]
  pub fn with_escaper<E: Escape + 'static>(mut self, escaper: E) -> Self {
    self.escaper = Arc::new(escaper);
    self
  }

  /// Use `manager` for server-side highlighting of fenced code.
  ///
  /// Highlighting still only happens when `highlight_code` is set.
  #[must_use]
  pub fn with_syntax_manager(mut self, manager: SyntaxManager) -> Self {
    self.syntax_manager = Some(Arc::new(manager));
    self
  }

  /// Check if server-side highlighting will be applied.
  #[must_use]
  pub const fn highlighting_enabled(&self) -> bool {
    self.options.highlight_code && self.syntax_manager.is_some()
  }

  /// Render Markdown to HTML.
  ///
  /// Empty input yields an empty result without touching the parser. The
  /// input is normalized first, so text with escaped or carriage-return
  /// line breaks renders the same as plain text.
  #[must_use]
  pub fn render(&self, markdown: &str) -> MarkdownResult {
    if markdown.is_empty() {
      return MarkdownResult::default();
    }

    let source = preprocess::normalize(markdown);
    let arena = Arena::new();
    let root = parse_document(&arena, &source, &self.comrak);

    let title = utils::extract_title(root);

    if self.options.typographer {
      TypographerTransformer::new(self.options.quotes)
        .with_source(&source)
        .transform(root);
    }

    let blocks = self.apply_overrides(root, &source, |value| {
      &*arena.alloc(value.into())
    });

    let mut html = String::new();
    if let Err(e) = comrak::format_html(root, &self.comrak, &mut html) {
      error!("Failed to format HTML: {e}");
    }

    trace!("Rendered {} fences, title {title:?}", blocks.len());

    MarkdownResult {
      html,
      blocks,
      title,
    }
  }

  /// Replace fences, links and images with the output of the registered
  /// overrides.
  ///
  /// Nodes are visited in pre-order and a fence's index in that order is its
  /// identifier, so identifiers only depend on the document. `alloc` creates
  /// the extra nodes a link needs.
  fn apply_overrides<'a, F>(
    &self,
    root: &'a AstNode<'a>,
    source: &str,
    alloc: F,
  ) -> Vec<RenderedBlock>
  where
    F: Fn(NodeValue) -> &'a AstNode<'a>,
  {
    if self.rules.is_empty() {
      return Vec::new();
    }

    let ctx = RuleContext::new(self.escaper.as_ref(), &self.options)
      .with_highlighter(self.syntax_manager.as_deref());
    let offsets = utils::line_offsets(source);
    let prefix = self.options.id_prefix.as_deref();

    let nodes: Vec<_> = root.descendants().enumerate().collect();
    let mut blocks = Vec::new();

    for (index, node) in nodes {
      match node_token(node, source, &offsets) {
        Some(Token::Fence(fence)) => {
          let Some(rule) = self.rules.fence else {
            continue;
          };
          let block = rule(&fence, BlockId::new(prefix, index), &ctx);
          node.data.borrow_mut().value = NodeValue::Raw(block.html.clone());
          blocks.push(block);
        },
        Some(Token::LinkOpen(link)) => {
          let Some(rule) = self.rules.link_open else {
            continue;
          };
          let open = rule(&link, &ctx);
          unwrap_link(node, open, &alloc);
        },
        Some(token @ Token::Image(_)) => {
          let Some(rule) = self.rules.image else {
            continue;
          };
          let html = rule(&token, &ctx);
          node.data.borrow_mut().value = NodeValue::Raw(html);
          let children: Vec<_> = node.children().collect();
          for child in children {
            child.detach();
          }
        },
        Some(Token::Other { .. }) | None => {},
      }
    }

    blocks
  }
}

/// Build the token view of `node`, if the overrides handle its type.
///
/// Indented code blocks are not fences and keep the default rendering.
fn node_token<'a>(
  node: &'a AstNode<'a>,
  source: &str,
  offsets: &[usize],
) -> Option<Token> {
  let data = node.data.borrow();
  match &data.value {
    NodeValue::CodeBlock(code) if code.fenced => {
      Some(Token::Fence(FenceToken {
        content: code.literal.clone(),
        info:    code.info.clone(),
      }))
    },
    NodeValue::Link(link) => {
      Some(Token::LinkOpen(LinkToken {
        url:   link.url.clone(),
        title: link.title.clone(),
      }))
    },
    NodeValue::Image(link) => {
      let alt = utils::extract_inline_text(node);
      let content = image_markup(source, offsets, data.sourcepos)
        .map_or_else(|| format!("![{alt}]"), str::to_string);

      Some(Token::Image(ImageToken {
        content,
        attrs: vec![
          ("src".to_string(), link.url.clone()),
          ("alt".to_string(), alt),
          ("title".to_string(), link.title.clone()),
        ],
      }))
    },
    _ => None,
  }
}

/// Source markup of an image, e.g. `![alt](url)` or `![alt][ref]`.
///
/// Some positions start at the label's `[` rather than the `!`; the `!` is
/// taken back in that case. Anything that does not look like image markup is
/// rejected.
fn image_markup<'s>(
  source: &'s str,
  offsets: &[usize],
  pos: Sourcepos,
) -> Option<&'s str> {
  let mut range = utils::source_range(offsets, pos)?;
  let starts_at_label = source.get(range.clone())?.starts_with('[')
    && source.get(..range.start)?.ends_with('!');
  if starts_at_label {
    range.start -= 1;
  }

  source.get(range).filter(|markup| {
    markup.starts_with("![") && (markup.ends_with(')') || markup.ends_with(']'))
  })
}

/// Replace a link node by raw opening and closing tags around its children.
fn unwrap_link<'a, F>(node: &'a AstNode<'a>, open: String, alloc: &F)
where
  F: Fn(NodeValue) -> &'a AstNode<'a>,
{
  node.insert_before(alloc(NodeValue::Raw(open)));
  let children: Vec<_> = node.children().collect();
  for child in children {
    node.insert_before(child);
  }
  node.insert_before(alloc(NodeValue::Raw(render_link_close().to_string())));
  node.detach();
}

/// Parser configuration for `options`.
fn comrak_options(options: &MarkdownOptions) -> Options<'static> {
  let mut comrak = Options::default();
  if options.gfm {
    comrak.extension.table = true;
    comrak.extension.footnotes = true;
    comrak.extension.strikethrough = true;
  }
  comrak.extension.tasklist = true;
  comrak.extension.superscript = true;
  comrak.extension.subscript = true;
  comrak.extension.autolink = options.linkify;
  comrak.parse.smart = options.typographer;
  comrak.render.hardbreaks = options.breaks;
  comrak.render.r#unsafe = options.html;
  comrak
}
