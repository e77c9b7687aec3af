//! Server-side syntax highlighting for fenced code.
//!
//! Highlighting sits behind the [`SyntaxHighlighter`] trait so a backend can
//! be swapped without touching the fence override. The only bundled backend
//! is **Syntect** (with two-face syntax definitions), compiled in with the
//! `syntect` feature. Without it, fences carry `hljs <language>` classes and
//! highlighting is left to the page.

pub mod error;
pub mod types;

pub use error::{SyntaxError, SyntaxResult};
pub use types::{SyntaxConfig, SyntaxHighlighter, SyntaxManager};

#[cfg(feature = "syntect")] mod syntect;
#[cfg(feature = "syntect")] pub use self::syntect::*;

/// Create the default syntax manager based on available features.
///
/// # Errors
///
/// Returns [`SyntaxError::NoBackendAvailable`] when no backend feature is
/// enabled.
pub fn create_default_manager() -> SyntaxResult<SyntaxManager> {
  #[cfg(feature = "syntect")]
  {
    Ok(create_syntect_manager())
  }

  #[cfg(not(feature = "syntect"))]
  {
    Err(SyntaxError::NoBackendAvailable)
  }
}
