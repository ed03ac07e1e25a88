//! Implementation of the `cfnarm translate` command.

use std::fs::write;
use std::path::PathBuf;

use cfnarm::Options;
use miette::{IntoDiagnostic, Report, Result};
use owo_colors::{OwoColorize, Stream};

use super::{translate_source, SourceArgs};
use crate::output::table::format_summary_table;

/// Arguments for the translate command.
#[derive(Debug, clap::Args)]
pub struct TranslateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Write the ARM template here instead of standard output
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// API version stamped on generated resources
    #[arg(long, env = "CFNARM_API_VERSION")]
    pub api_version: Option<String>,

    /// Declare the source parameters in the ARM template instead of
    /// substituting their values
    #[arg(long)]
    pub passthrough_parameters: bool,
}

impl TranslateArgs {
    fn options(&self) -> Options {
        let mut options = Options::builder()
            .maybe_api_version(self.api_version.clone())
            .passthrough_parameters(self.passthrough_parameters)
            .build();
        self.source.apply_parameters(&mut options);
        options
    }
}

/// Run the translate command.
pub fn run_translate(args: TranslateArgs) -> Result<i32> {
    let source = match args.source.read() {
        Ok(source) => source,
        Err(message) => {
            eprintln!("{} {}", "error:".if_supports_color(Stream::Stderr, |t| t.red()), message);
            return Ok(exitcode::NOINPUT);
        }
    };

    let translation = match translate_source(&source, &args.options()) {
        Ok(translation) => translation,
        Err(diagnostic) => {
            eprintln!("{:?}", Report::new(*diagnostic));
            return Ok(exitcode::DATAERR);
        }
    };

    let json = translation.document.to_json_pretty();
    match &args.output {
        Some(path) => {
            write(path, format!("{}\n", json)).into_diagnostic()?;
            eprintln!("{}", format_summary_table(&translation.summary));
            eprintln!(
                "{} {} resources written to {}",
                "translated:".if_supports_color(Stream::Stderr, |t| t.green()),
                translation.document.resources.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(exitcode::OK)
}
