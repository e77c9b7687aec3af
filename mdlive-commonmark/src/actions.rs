//! User interactions on rendered content.
//!
//! Rendered controls carry a `data-action` attribute instead of inline
//! handlers. The host forwards clicks to an [`ActionRegistry`], which walks
//! up from the clicked node to the nearest element naming an action and
//! invokes the handler registered under that name. The host owns the
//! registry, so nothing is installed into a process-wide namespace.
//!
//! Everything here is single-threaded: shared collaborators are held in
//! [`Rc`] and completion is reported through callbacks the host's event loop
//! may run later.
use std::{cell::RefCell, collections::HashMap, rc::Rc};

use kuchikikiki::NodeRef;
use log::{debug, warn};

use crate::{
  error::{ActionError, ClipboardError},
  utils,
};

/// Attribute naming the action an element triggers.
pub const ACTION_ATTR: &str = "data-action";

/// Attribute holding the identifier of the element a copy control copies.
pub const TARGET_ATTR: &str = "data-target";

/// Attribute holding the URL an image preview opens.
pub const PREVIEW_SRC_ATTR: &str = "data-preview-src";

/// Action name of the copy control on code blocks.
pub const COPY_CODE: &str = "copy-code";

/// Action name of rendered images.
pub const PREVIEW_IMAGE: &str = "preview-image";

/// Signal broadcast when an image preview is requested.
pub const PREVIEW_EVENT: &str = "markdown-preview-image";

/// Completion callback of a clipboard write.
pub type CopyCallback = Box<dyn FnOnce(Result<(), ClipboardError>)>;

/// Write access to the system clipboard.
pub trait Clipboard {
  /// Write `text`, then call `on_complete` with the outcome.
  ///
  /// The callback may run before this returns or at any later point.
  fn write_text(&self, text: String, on_complete: CopyCallback);
}

/// Transient user feedback.
pub trait Notifier {
  fn success(&self, message: &str);
  fn error(&self, message: &str);
}

/// An image preview request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEvent {
  /// Always [`PREVIEW_EVENT`].
  pub name: &'static str,
  /// Image URL to preview.
  pub url:  String,
}

/// Receiver of image preview requests.
pub trait PreviewListener {
  fn on_preview(&self, event: &PreviewEvent);
}

/// Handler invoked for one action name.
pub trait ActionHandler {
  /// Handle a click on `element`, the node carrying `data-action`.
  ///
  /// # Errors
  ///
  /// Returns an [`ActionError`] when the element or the document does not
  /// provide what the action needs.
  fn handle(
    &self,
    document: &NodeRef,
    element: &NodeRef,
  ) -> Result<(), ActionError>;
}

impl<F> ActionHandler for F
where
  F: Fn(&NodeRef, &NodeRef) -> Result<(), ActionError>,
{
  fn handle(
    &self,
    document: &NodeRef,
    element: &NodeRef,
  ) -> Result<(), ActionError> {
    self(document, element)
  }
}

fn attribute(element: &NodeRef, name: &'static str) -> Option<String> {
  element
    .as_element()
    .and_then(|el| el.attributes.borrow().get(name).map(str::to_string))
}

/// Copies the text of a code block to the clipboard.
pub struct CopyCodeAction {
  clipboard:       Rc<dyn Clipboard>,
  notifier:        Rc<dyn Notifier>,
  success_message: String,
  failure_message: String,
}

impl CopyCodeAction {
  #[must_use]
  pub fn new(clipboard: Rc<dyn Clipboard>, notifier: Rc<dyn Notifier>) -> Self {
    Self {
      clipboard,
      notifier,
      success_message: "Copied".to_string(),
      failure_message: "Copy failed".to_string(),
    }
  }

  /// Set the feedback shown after a successful and a failed copy.
  #[must_use]
  pub fn with_messages<S, F>(mut self, success: S, failure: F) -> Self
  where
    S: Into<String>,
    F: Into<String>,
  {
    self.success_message = success.into();
    self.failure_message = failure.into();
    self
  }

  /// Copy the text content of the element with identifier `id`.
  ///
  /// The write is issued once; its outcome is reported through the notifier
  /// when the clipboard completes.
  ///
  /// # Errors
  ///
  /// Returns [`ActionError::TargetNotFound`] when no element has that
  /// identifier. Nothing is written in that case.
  pub fn copy(&self, document: &NodeRef, id: &str) -> Result<(), ActionError> {
    let target = utils::find_by_id(document, id)
      .ok_or_else(|| ActionError::TargetNotFound(id.to_string()))?;
    let text = target.text_contents();

    let notifier = Rc::clone(&self.notifier);
    let success = self.success_message.clone();
    let failure = self.failure_message.clone();
    let id = id.to_string();

    self.clipboard.write_text(
      text,
      Box::new(move |result| {
        match result {
          Ok(()) => {
            debug!("Copied {id} to clipboard");
            notifier.success(&success);
          },
          Err(e) => {
            warn!("Failed to copy {id} to clipboard: {e}");
            notifier.error(&failure);
          },
        }
      }),
    );
    Ok(())
  }
}

impl ActionHandler for CopyCodeAction {
  fn handle(
    &self,
    document: &NodeRef,
    element: &NodeRef,
  ) -> Result<(), ActionError> {
    let id = attribute(element, TARGET_ATTR)
      .ok_or(ActionError::MissingAttribute(TARGET_ATTR))?;
    self.copy(document, &id)
  }
}

/// Broadcasts image preview requests to subscribed listeners.
#[derive(Default)]
pub struct PreviewImageAction {
  listeners: RefCell<Vec<Rc<dyn PreviewListener>>>,
}

impl PreviewImageAction {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn subscribe(&self, listener: Rc<dyn PreviewListener>) {
    self.listeners.borrow_mut().push(listener);
  }

  /// Broadcast one preview request for `url`.
  pub fn preview(&self, url: &str) {
    let event = PreviewEvent {
      name: PREVIEW_EVENT,
      url:  url.to_string(),
    };
    // Listeners may subscribe others while being notified.
    let listeners = self.listeners.borrow().clone();
    for listener in listeners {
      listener.on_preview(&event);
    }
  }
}

impl ActionHandler for PreviewImageAction {
  fn handle(
    &self,
    _document: &NodeRef,
    element: &NodeRef,
  ) -> Result<(), ActionError> {
    let url = attribute(element, PREVIEW_SRC_ATTR)
      .ok_or(ActionError::MissingAttribute(PREVIEW_SRC_ATTR))?;
    self.preview(&url);
    Ok(())
  }
}

/// Delegation surface mapping action names to handlers.
#[derive(Default)]
pub struct ActionRegistry {
  handlers: HashMap<String, Rc<dyn ActionHandler>>,
}

impl ActionRegistry {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Registry with the copy and preview actions wired up.
  #[must_use]
  pub fn with_defaults(
    copy: CopyCodeAction,
    preview: Rc<PreviewImageAction>,
  ) -> Self {
    let mut registry = Self::new();
    registry.register(COPY_CODE, Rc::new(copy));
    registry.register(PREVIEW_IMAGE, preview);
    registry
  }

  /// Register `handler` under `name`, replacing any previous handler.
  pub fn register<S: Into<String>>(
    &mut self,
    name: S,
    handler: Rc<dyn ActionHandler>,
  ) -> &mut Self {
    self.handlers.insert(name.into(), handler);
    self
  }

  #[must_use]
  pub fn is_registered(&self, name: &str) -> bool {
    self.handlers.contains_key(name)
  }

  /// Route a click on `clicked` to the handler of the nearest enclosing
  /// element carrying `data-action`.
  ///
  /// Returns the name of the dispatched action, or `None` when the click was
  /// not inside an action element.
  ///
  /// # Errors
  ///
  /// Returns [`ActionError::UnknownAction`] when nothing is registered under
  /// the name, or the handler's own error.
  pub fn dispatch(
    &self,
    document: &NodeRef,
    clicked: &NodeRef,
  ) -> Result<Option<String>, ActionError> {
    let Some((element, name)) = clicked.inclusive_ancestors().find_map(|node| {
      attribute(&node, ACTION_ATTR).map(|name| (node, name))
    }) else {
      return Ok(None);
    };

    let handler = self
      .handlers
      .get(&name)
      .ok_or_else(|| ActionError::UnknownAction(name.clone()))?;
    handler.handle(document, &element)?;
    Ok(Some(name))
  }
}

impl std::fmt::Debug for ActionRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut names: Vec<_> = self.handlers.keys().collect();
    names.sort();
    f.debug_struct("ActionRegistry")
      .field("actions", &names)
      .finish()
  }
}
