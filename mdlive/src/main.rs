use color_eyre::eyre::{Context, Result};
use log::LevelFilter;
use mdlive::{
  cli::{Cli, Commands},
  commands,
  config::Config,
};

fn main() -> Result<()> {
  color_eyre::install()?;

  // Parse command line arguments
  let cli = Cli::parse_args();

  // Initialize logging first so we can log during command handling
  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  match &cli.command {
    Commands::Init {
      output,
      format,
      force,
    } => commands::init(output, format, *force),

    Commands::Render {
      input,
      output,
      hydrate,
      id_prefix,
    } => {
      let config = load_config(&cli)?;
      commands::render(
        &config,
        input,
        output.as_deref(),
        *hydrate,
        id_prefix.as_deref(),
      )
    },

    Commands::Check { input } => {
      let config = load_config(&cli)?;
      commands::check(&config, input)
    },
  }
}

fn load_config(cli: &Cli) -> Result<Config> {
  Config::load(&cli.config_files, &cli.config_overrides)
    .wrap_err("Failed to load configuration")
}
