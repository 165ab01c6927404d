use std::path::PathBuf;

use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(about)]
pub struct Cli {
    /// Path to the template to render.
    pub template: PathBuf,

    /// Path to a YAML or JSON file holding the variables to render the template with.
    ///
    /// The document must be a mapping. Files ending in `.json` are read as JSON, anything else as YAML.
    #[arg(long)]
    pub context: Option<PathBuf>,

    /// Path to a YAML configuration file for the template engine.
    ///
    /// Settings can also be given as `TEMPLET_`-prefixed environment variables, which take precedence over the file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Render the template this many times in mutating mode, printing the output of each pass.
    ///
    /// Each pass folds whatever does not need re-evaluating into static text.
    #[arg(long)]
    pub mutable_passes: Option<usize>,
}
