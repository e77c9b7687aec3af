use std::{
  fs,
  path::{Path, PathBuf},
};

use mdlive_commonmark::{MarkdownOptions, QuoteStyle};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Configuration options for mdlive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// Options handed to the Markdown processor
  pub markdown: MarkdownConfig,

  /// Embed chart options into rendered output by default
  pub hydrate: bool,
}

/// Serializable mirror of [`MarkdownOptions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
  pub html:           bool,
  pub breaks:         bool,
  pub linkify:        bool,
  pub typographer:    bool,
  /// Four characters: opening and closing double quote, then single quote
  pub quotes:         String,
  pub gfm:            bool,
  pub highlight_code: bool,
  pub chart_language: String,
  pub chart_label:    String,
  pub chart_height:   u32,
  pub copy_label:     String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id_prefix:      Option<String>,
}

impl From<&MarkdownOptions> for MarkdownConfig {
  fn from(options: &MarkdownOptions) -> Self {
    Self {
      html:           options.html,
      breaks:         options.breaks,
      linkify:        options.linkify,
      typographer:    options.typographer,
      quotes:         options.quotes.to_string(),
      gfm:            options.gfm,
      highlight_code: options.highlight_code,
      chart_language: options.chart_language.clone(),
      chart_label:    options.chart_label.clone(),
      chart_height:   options.chart_height,
      copy_label:     options.copy_label.clone(),
      id_prefix:      options.id_prefix.clone(),
    }
  }
}

impl Default for MarkdownConfig {
  fn default() -> Self {
    Self::from(&MarkdownOptions::default())
  }
}

impl MarkdownConfig {
  /// Convert to processor options.
  ///
  /// # Errors
  ///
  /// Returns an error if `quotes` is not four characters or the chart
  /// language is blank.
  pub fn to_options(&self) -> Result<MarkdownOptions, ConfigError> {
    let quotes: QuoteStyle = self
      .quotes
      .parse()
      .map_err(|e| ConfigError::Config(format!("markdown.quotes: {e}")))?;

    if self.chart_language.trim().is_empty() {
      return Err(ConfigError::Config(
        "markdown.chart_language must not be empty".to_string(),
      ));
    }

    Ok(MarkdownOptions {
      html: self.html,
      breaks: self.breaks,
      linkify: self.linkify,
      typographer: self.typographer,
      quotes,
      gfm: self.gfm,
      highlight_code: self.highlight_code,
      chart_language: self.chart_language.trim().to_string(),
      chart_label: self.chart_label.clone(),
      chart_height: self.chart_height,
      copy_label: self.copy_label.clone(),
      id_prefix: self.id_prefix.clone().filter(|prefix| !prefix.is_empty()),
    })
  }
}

impl Config {
  /// Load configuration from a file, choosing the format by extension.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read, has an unsupported
  /// extension, or does not parse into a valid configuration.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let value = read_value(path.as_ref())?;
    Ok(serde_json::from_value(value)?)
  }

  /// Load configuration from files and `KEY=VALUE` overrides.
  ///
  /// Files are merged in order, later files overriding earlier ones key by
  /// key. Without explicit files, a config file in a standard location is
  /// used if one exists. Overrides are applied last.
  ///
  /// # Errors
  ///
  /// Returns an error if a file cannot be loaded, an override is malformed,
  /// or the result is not a valid configuration.
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, ConfigError> {
    let sources = if config_files.is_empty() {
      Self::find_config_file().into_iter().collect()
    } else {
      config_files.to_vec()
    };

    let mut merged = Value::Object(Map::new());
    for path in &sources {
      log::debug!("Loading config file: {}", path.display());
      let value = read_value(path).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to load config from {}: {e}",
          path.display()
        ))
      })?;
      merge_values(&mut merged, value);
    }

    if sources.len() > 1 {
      log::info!("Loaded and merged {} config files", sources.len());
    }

    for override_str in config_overrides {
      apply_override(&mut merged, override_str)?;
    }

    let config: Self = serde_json::from_value(merged)?;
    config.markdown.to_options()?;
    Ok(config)
  }

  /// Look for a config file in the current directory, then in
  /// `$XDG_CONFIG_HOME/mdlive`.
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    let config_filenames = [
      "mdlive.toml",
      "mdlive.json",
      ".mdlive.toml",
      ".mdlive.json",
      ".config/mdlive.toml",
      ".config/mdlive.json",
    ];

    let current_dir = std::env::current_dir().ok()?;
    if let Some(found) = config_filenames
      .iter()
      .map(|name| current_dir.join(name))
      .find(|path| path.exists())
    {
      return Some(found);
    }

    let xdg_config_home = std::env::var_os("XDG_CONFIG_HOME")?;
    let xdg_config_dir = PathBuf::from(xdg_config_home).join("mdlive");
    ["mdlive.toml", "mdlive.json"]
      .iter()
      .map(|name| xdg_config_dir.join(name))
      .find(|path| path.exists())
  }

  /// Processor options for this configuration.
  ///
  /// # Errors
  ///
  /// See [`MarkdownConfig::to_options`].
  pub fn markdown_options(&self) -> Result<MarkdownOptions, ConfigError> {
    self.markdown.to_options()
  }

  /// Render the default configuration in `format` (`toml` or `json`).
  ///
  /// # Errors
  ///
  /// Returns an error for an unknown format or a serialization failure.
  pub fn default_config_string(format: &str) -> Result<String, ConfigError> {
    let config = Self::default();
    match format {
      "toml" => Ok(toml::to_string_pretty(&config)?),
      "json" => Ok(serde_json::to_string_pretty(&config)?),
      other => {
        Err(ConfigError::Config(format!(
          "Unsupported config format: {other}"
        )))
      },
    }
  }

  /// Write the default configuration to `path`.
  ///
  /// # Errors
  ///
  /// Returns an error for an unknown format or if the file cannot be
  /// written.
  pub fn generate_default_config(
    format: &str,
    path: &Path,
  ) -> Result<(), ConfigError> {
    let config_content = Self::default_config_string(format)?;

    fs::write(path, config_content).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to write default config to {}: {e}",
        path.display()
      ))
    })?;

    log::info!("Created default configuration file: {}", path.display());
    Ok(())
  }
}

/// Read a TOML or JSON file into a generic value.
fn read_value(path: &Path) -> Result<Value, ConfigError> {
  let content = fs::read_to_string(path).map_err(|e| {
    ConfigError::Config(format!(
      "Failed to read config file: {}: {e}",
      path.display()
    ))
  })?;

  match path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(str::to_lowercase)
    .as_deref()
  {
    Some("json") => Ok(serde_json::from_str(&content)?),
    Some("toml") => Ok(toml::from_str(&content)?),
    Some(_) => {
      Err(ConfigError::Config(format!(
        "Unsupported config file format: {}",
        path.display()
      )))
    },
    None => {
      Err(ConfigError::Config(format!(
        "Config file has no extension: {}",
        path.display()
      )))
    },
  }
}

/// Merge `other` into `base`: objects merge recursively, anything else in
/// `other` replaces what `base` had.
fn merge_values(base: &mut Value, other: Value) {
  match (base, other) {
    (Value::Object(base_map), Value::Object(other_map)) => {
      for (key, value) in other_map {
        match base_map.get_mut(&key) {
          Some(existing) => merge_values(existing, value),
          None => {
            base_map.insert(key, value);
          },
        }
      }
    },
    (base, other) => *base = other,
  }
}

/// Apply one `dotted.key=value` override.
///
/// The value is read as JSON when it parses (`true`, `400`, `"x"`) and as a
/// plain string otherwise.
fn apply_override(
  config: &mut Value,
  override_str: &str,
) -> Result<(), ConfigError> {
  let (key, raw) = override_str.split_once('=').ok_or_else(|| {
    ConfigError::Config(format!(
      "Invalid config override format: '{override_str}'. Expected KEY=VALUE"
    ))
  })?;
  let key = key.trim();
  let raw = raw.trim();
  if key.is_empty() {
    return Err(ConfigError::Config(format!(
      "Invalid config override format: '{override_str}'. Empty key"
    )));
  }

  let value = serde_json::from_str::<Value>(raw)
    .unwrap_or_else(|_| Value::String(raw.to_string()));

  let mut segments: Vec<&str> = key.split('.').collect();
  let last = segments.pop().unwrap_or(key);

  let mut current = config;
  for segment in segments {
    let Value::Object(map) = current else {
      return Err(ConfigError::Config(format!(
        "Cannot override '{key}': '{segment}' is not a table"
      )));
    };
    current = map
      .entry(segment.to_string())
      .or_insert_with(|| Value::Object(Map::new()));
  }

  let Value::Object(map) = current else {
    return Err(ConfigError::Config(format!(
      "Cannot override '{key}': parent is not a table"
    )));
  };
  map.insert(last.to_string(), value);
  Ok(())
}
