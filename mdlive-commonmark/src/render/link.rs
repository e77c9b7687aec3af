use super::{LinkToken, RuleContext, sanitize_url};

/// Render the opening tag of a hyperlink.
///
/// Every link opens in a new browsing context without leaking the opener or
/// the referrer, whatever its origin. URLs with a script or filesystem
/// scheme are emptied, see [`sanitize_url`].
#[must_use]
pub fn render_link_open(token: &LinkToken, ctx: &RuleContext<'_>) -> String {
  let href = ctx.escaper.escape_attribute(sanitize_url(&token.url));
  if token.title.is_empty() {
    format!("<a href=\"{href}\" target=\"_blank\" rel=\"noopener noreferrer\">")
  } else {
    let title = ctx.escaper.escape_attribute(&token.title);
    format!(
      "<a href=\"{href}\" title=\"{title}\" target=\"_blank\" \
       rel=\"noopener noreferrer\">"
    )
  }
}

/// Closing tag matching [`render_link_open`].
#[must_use]
pub const fn render_link_close() -> &'static str {
  "</a>"
}
