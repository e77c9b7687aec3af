#![allow(clippy::expect_used, reason = "Fine in tests")]
use std::fs;

use mdlive::config::Config;
use tempfile::tempdir;

#[test]
fn test_load_toml_file() {
  let temp_dir = tempdir().expect("Failed to create temp dir in test");
  let path = temp_dir.path().join("mdlive.toml");
  fs::write(
    &path,
    "hydrate = true\n\n[markdown]\nbreaks = false\nchart_language = \
     \"chart\"\n",
  )
  .expect("Failed to write config in test");

  let config = Config::load(&[path], &[]).expect("valid config");
  assert!(config.hydrate);
  assert!(!config.markdown.breaks);
  assert_eq!(config.markdown.chart_language, "chart");
  // Untouched keys keep their defaults
  assert!(config.markdown.linkify);
  assert_eq!(config.markdown.chart_height, 300);
}

#[test]
fn test_later_files_override_earlier_ones() {
  let temp_dir = tempdir().expect("Failed to create temp dir in test");
  let base = temp_dir.path().join("base.toml");
  let local = temp_dir.path().join("local.json");
  fs::write(&base, "[markdown]\nchart_height = 200\ncopy_label = \"复制\"\n")
    .expect("Failed to write config in test");
  fs::write(&local, r#"{ "markdown": { "chart_height": 480 } }"#)
    .expect("Failed to write config in test");

  let config = Config::load(&[base, local], &[]).expect("valid config");
  assert_eq!(config.markdown.chart_height, 480);
  assert_eq!(config.markdown.copy_label, "复制");
}

#[test]
fn test_overrides_apply_last() {
  let temp_dir = tempdir().expect("Failed to create temp dir in test");
  let path = temp_dir.path().join("mdlive.toml");
  fs::write(&path, "[markdown]\nchart_height = 200\n")
    .expect("Failed to write config in test");

  let config = Config::load(&[path], &[
    "markdown.chart_height=640".to_string(),
    "markdown.id_prefix=doc".to_string(),
    "hydrate=true".to_string(),
  ])
  .expect("valid config");

  assert_eq!(config.markdown.chart_height, 640);
  assert_eq!(config.markdown.id_prefix.as_deref(), Some("doc"));
  assert!(config.hydrate);

  let options = config.markdown_options().expect("valid options");
  assert_eq!(options.id_prefix.as_deref(), Some("doc"));
}

#[test]
fn test_unknown_keys_are_rejected() {
  let temp_dir = tempdir().expect("Failed to create temp dir in test");
  let path = temp_dir.path().join("mdlive.toml");
  fs::write(&path, "[markdown]\nchart_langauge = \"chart\"\n")
    .expect("Failed to write config in test");

  assert!(Config::load(&[path], &[]).is_err());
}

#[test]
fn test_invalid_quotes_are_rejected() {
  let temp_dir = tempdir().expect("Failed to create temp dir in test");
  let path = temp_dir.path().join("mdlive.toml");
  fs::write(&path, "[markdown]\nquotes = \"«»\"\n")
    .expect("Failed to write config in test");

  assert!(Config::load(&[path], &[]).is_err());
}

#[test]
fn test_unsupported_extension() {
  let temp_dir = tempdir().expect("Failed to create temp dir in test");
  let path = temp_dir.path().join("mdlive.yaml");
  fs::write(&path, "hydrate: true\n").expect("Failed to write config in test");

  assert!(Config::from_file(&path).is_err());
  assert!(Config::load(&[path], &[]).is_err());
}

#[test]
fn test_generate_default_config() {
  let temp_dir = tempdir().expect("Failed to create temp dir in test");
  for format in ["toml", "json"] {
    let path = temp_dir.path().join(format!("mdlive.{format}"));
    Config::generate_default_config(format, &path)
      .expect("Failed to generate config in test");

    let loaded = Config::from_file(&path).expect("generated config loads");
    assert_eq!(loaded, Config::default());
  }
}
