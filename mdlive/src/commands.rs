//! Subcommand implementations.
use std::{
  fs,
  io::{self, Read, Write},
  path::Path,
};

use color_eyre::eyre::{Context, Result, bail};
use log::{debug, info, warn};
use mdlive_commonmark::{
  MarkdownProcessor,
  hydrate::{
    CHART_CLASS,
    EmbedScriptEngine,
    HydrationReport,
    Hydrator,
    OPTION_ATTR,
    decode_declaration,
    hydrate_html,
  },
  processor::process_with_recovery,
};
use tendril::TendrilSink;

use crate::config::Config;

/// A chart declaration that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartProblem {
  /// Identifier of the chart placeholder, e.g. `code-block-3`
  pub id:    String,
  pub error: String,
}

/// Read a document from `input`, where `-` means standard input.
///
/// # Errors
///
/// Returns an error if the file or stream cannot be read.
pub fn read_input(input: &Path) -> Result<String> {
  if input.as_os_str() == "-" {
    let mut content = String::new();
    io::stdin()
      .read_to_string(&mut content)
      .wrap_err("Failed to read standard input")?;
    return Ok(content);
  }

  fs::read_to_string(input)
    .wrap_err_with(|| format!("Failed to read {}", input.display()))
}

/// Build the processor for `config`, applying a command line id prefix.
///
/// # Errors
///
/// Returns an error if the configuration does not convert to valid options.
pub fn build_processor(
  config: &Config,
  id_prefix: Option<&str>,
) -> Result<MarkdownProcessor> {
  let mut options = config
    .markdown_options()
    .wrap_err("Invalid markdown configuration")?;
  if let Some(prefix) = id_prefix.filter(|prefix| !prefix.is_empty()) {
    options.id_prefix = Some(prefix.to_string());
  }
  Ok(MarkdownProcessor::new(options))
}

/// Render `markdown` to an HTML fragment, optionally embedding chart options.
#[must_use]
pub fn render_document(
  processor: &MarkdownProcessor,
  markdown: &str,
  hydrate: bool,
) -> (String, Option<HydrationReport>) {
  let result = process_with_recovery(processor, markdown);

  let charts = result.charts().count();
  debug!(
    "Rendered {} code blocks ({charts} charts)",
    result.blocks.len()
  );

  if !hydrate || charts == 0 {
    return (result.html, None);
  }

  let hydrator = Hydrator::new(EmbedScriptEngine);
  let (html, report) = hydrate_html(&result.html, &hydrator);
  (html, Some(report))
}

/// The `render` subcommand.
///
/// # Errors
///
/// Returns an error if the input cannot be read, the configuration is
/// invalid, or the output cannot be written.
pub fn render(
  config: &Config,
  input: &Path,
  output: Option<&Path>,
  hydrate: bool,
  id_prefix: Option<&str>,
) -> Result<()> {
  let processor = build_processor(config, id_prefix)?;
  let markdown = read_input(input)?;
  let (html, report) =
    render_document(&processor, &markdown, hydrate || config.hydrate);

  if let Some(report) = report {
    if report.failed > 0 {
      warn!(
        "{} of {} charts could not be activated",
        report.failed,
        report.visited()
      );
    }
  }

  match output {
    Some(path) => {
      if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
          fs::create_dir_all(parent).wrap_err_with(|| {
            format!("Failed to create directory: {}", parent.display())
          })?;
        }
      }
      fs::write(path, &html)
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
      info!("Wrote {}", path.display());
    },
    None => {
      let mut stdout = io::stdout().lock();
      stdout
        .write_all(html.as_bytes())
        .and_then(|()| stdout.flush())
        .wrap_err("Failed to write to standard output")?;
    },
  }

  Ok(())
}

/// Find chart declarations in rendered `html` that do not decode.
#[must_use]
pub fn chart_problems(html: &str) -> Vec<ChartProblem> {
  let document = kuchikikiki::parse_html().one(html);
  let Ok(selection) = document.select(&format!(".{CHART_CLASS}")) else {
    return Vec::new();
  };

  selection
    .filter_map(|element| {
      let attributes = element.attributes.borrow();
      let id = attributes.get("id").unwrap_or_default().to_string();
      let error = match attributes.get(OPTION_ATTR) {
        None => format!("missing {OPTION_ATTR}"),
        Some(raw) => decode_declaration(raw).err()?.to_string(),
      };
      Some(ChartProblem { id, error })
    })
    .collect()
}

/// The `check` subcommand.
///
/// # Errors
///
/// Returns an error if the input cannot be read or any chart declaration is
/// invalid.
pub fn check(config: &Config, input: &Path) -> Result<()> {
  let processor = build_processor(config, None)?;
  let markdown = read_input(input)?;
  let result = process_with_recovery(&processor, &markdown);

  let problems = chart_problems(&result.html);
  for problem in &problems {
    log::error!("{}: {}", problem.id, problem.error);
  }
  if !problems.is_empty() {
    bail!(
      "{} invalid chart declaration(s) in {}",
      problems.len(),
      input.display()
    );
  }

  info!(
    "{}: {} code blocks, all chart declarations valid",
    input.display(),
    result.blocks.len()
  );
  Ok(())
}

/// The `init` subcommand.
///
/// # Errors
///
/// Returns an error if `output` exists and `force` is not set, or the file
/// cannot be written.
pub fn init(output: &Path, format: &str, force: bool) -> Result<()> {
  if output.exists() && !force {
    bail!(
      "Configuration file already exists: {}. Use --force to overwrite.",
      output.display()
    );
  }

  if let Some(parent) = output.parent() {
    if !parent.as_os_str().is_empty() && !parent.exists() {
      fs::create_dir_all(parent).wrap_err_with(|| {
        format!("Failed to create directory: {}", parent.display())
      })?;
      info!("Created directory: {}", parent.display());
    }
  }

  Config::generate_default_config(format, output).wrap_err_with(|| {
    format!("Failed to generate configuration file: {}", output.display())
  })?;

  info!("Configuration file created successfully. Edit it to customize rendering.");
  Ok(())
}
