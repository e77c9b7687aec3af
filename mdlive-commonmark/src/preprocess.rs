//! Input normalization applied before parsing.
//!
//! Documents often arrive through JSON or other transports that leave line
//! breaks escaped. All four encodings are folded into `\n`, in an order that
//! resolves the double-escaped form before the single-escaped one.

/// Line-break encodings, in the order they are replaced.
const LINE_BREAKS: [&str; 4] = ["\\\\n", "\\n", "\r\n", "\r"];

/// Normalize every line-break encoding in `text` to `\n`.
#[must_use]
pub fn normalize(text: &str) -> String {
  if text.is_empty() {
    return String::new();
  }

  LINE_BREAKS
    .iter()
    .fold(text.to_owned(), |acc, pattern| acc.replace(pattern, "\n"))
}

#[cfg(test)]
mod tests {
  use super::normalize;

  #[test]
  fn test_empty_input() {
    assert_eq!(normalize(""), "");
  }

  #[test]
  fn test_each_encoding() {
    assert_eq!(normalize("a\\\\nb"), "a\nb");
    assert_eq!(normalize("a\\nb"), "a\nb");
    assert_eq!(normalize("a\r\nb"), "a\nb");
    assert_eq!(normalize("a\rb"), "a\nb");
  }

  #[test]
  fn test_double_escape_resolved_first() {
    // A single-escape pass first would leave a stray backslash behind.
    assert_eq!(normalize("x\\\\ny"), "x\ny");
    assert!(!normalize("x\\\\ny").contains('\\'));
  }

  #[test]
  fn test_mixed_input_only_line_feeds() {
    let input = "one\\\\ntwo\\nthree\r\nfour\rfive\nsix";
    let out = normalize(input);
    assert_eq!(out, "one\ntwo\nthree\nfour\nfive\nsix");
    assert!(!out.contains('\r'));
    assert!(!out.contains("\\n"));
  }

  #[test]
  fn test_idempotent() {
    let inputs = [
      "plain text",
      "a\\\\n\\n\r\n\r",
      "\r\r\n\n\\n\\\\n",
      "trailing\\",
      "中文\\n内容\r\n",
    ];
    for input in inputs {
      let once = normalize(input);
      assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
    }
  }
}
