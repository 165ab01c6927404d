//! Renders a template from the command line.

#![deny(warnings)]
#![deny(missing_docs)]

use std::{
    fs,
    io::{self, Write as _},
};

use clap::Parser as _;
use templet_config::ConfigurationLoader;
use templet_core::{Context, Engine, EngineConfiguration};
use templet_error::{generic_error, ErrorContext as _, GenericError};
use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

mod cli;
use self::cli::Cli;

mod context;
use self::context::load_context;

fn main() {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .with_ansi(true)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => info!("Rendered template."),
        Err(e) => {
            error!("{:?}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<(), GenericError> {
    let mut loader = ConfigurationLoader::default();
    if let Some(path) = &cli.config {
        loader = loader.from_yaml(path)?;
    }
    let config = loader.from_environment("templet")?.into_generic();
    let engine_config = EngineConfiguration::from_configuration(&config)?;

    let mut engine = Engine::from_configuration(&engine_config);
    templet_tags::register_builtins(&mut engine);

    let mut ctx = match &cli.context {
        Some(path) => load_context(path)?,
        None => Context::new(),
    };

    let name = cli.template.display().to_string();
    let source = fs::read_to_string(&cli.template)
        .with_error_context(|| format!("Failed to read template file '{}'.", name))?;

    let mut stdout = io::stdout().lock();
    match cli.mutable_passes {
        Some(passes) => {
            let mut template = engine.new_mutable_template(&source, &name);
            if template.error().is_some() {
                return Err(generic_error!("Failed to compile template '{}': {}", name, template.error_string()));
            }

            for pass in 1..=passes {
                let mut output = String::new();
                template.render_to(&mut templet_core::OutputStream::new(&mut output), &mut ctx)?;
                info!(pass, nodes = template.node_count(), "Finished mutable render pass.");
                stdout.write_all(output.as_bytes()).error_context("Failed to write to stdout.")?;
            }
        }
        None => {
            let template = engine.new_template(&source, &name);
            if template.error().is_some() {
                return Err(generic_error!("Failed to compile template '{}': {}", name, template.error_string()));
            }

            let mut output = String::new();
            template.render_to(&mut templet_core::OutputStream::new(&mut output), &mut ctx)?;
            stdout.write_all(output.as_bytes()).error_context("Failed to write to stdout.")?;
        }
    }

    stdout.flush().error_context("Failed to flush stdout.")
}
