//! Error types shared by the hydration and action layers.
//!
//! Rendering itself has no error type: every override returns a string and
//! degrades to empty values instead of failing.

/// A chart declaration that could not be turned into a configuration object.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
  #[error("chart declaration is empty")]
  Empty,
  #[error("chart declaration is not a valid JSON object: {0}")]
  Json(#[from] serde_json::Error),
}

/// Errors reported by a [`crate::hydrate::ChartEngine`].
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
  #[error("invalid chart option: {0}")]
  InvalidOption(String),
  #[error("chart engine failed: {0}")]
  Engine(String),
}

/// Errors reported by a [`crate::actions::Clipboard`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClipboardError {
  #[error("clipboard access denied")]
  Denied,
  #[error("clipboard unavailable: {0}")]
  Unavailable(String),
}

/// Errors returned when dispatching a user interaction.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
  #[error("no handler registered for action '{0}'")]
  UnknownAction(String),
  #[error("element '{0}' not found in document")]
  TargetNotFound(String),
  #[error("action element is missing the '{0}' attribute")]
  MissingAttribute(&'static str),
}
