//! Implementation of the `cfnarm check` command.

use cfnarm::Options;
use miette::{IntoDiagnostic, Report, Result};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use super::{translate_source, SourceArgs};
use crate::output::table::format_summary_table;

/// Arguments for the check command.
#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output the per-resource summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output for one translated resource.
#[derive(Debug, Serialize)]
struct SummaryJson<'a> {
    resource: &'a str,
    #[serde(rename = "type")]
    resource_type: &'a str,
    entries: usize,
    parameters: usize,
    variables: usize,
    outputs: usize,
}

/// Run the check command.
pub fn run_check(args: CheckArgs) -> Result<i32> {
    let source = match args.source.read() {
        Ok(source) => source,
        Err(message) => {
            eprintln!("{} {}", "error:".if_supports_color(Stream::Stderr, |t| t.red()), message);
            return Ok(exitcode::NOINPUT);
        }
    };

    let mut options = Options::default();
    args.source.apply_parameters(&mut options);

    let translation = match translate_source(&source, &options) {
        Ok(translation) => translation,
        Err(diagnostic) => {
            eprintln!("{:?}", Report::new(*diagnostic));
            return Ok(exitcode::DATAERR);
        }
    };

    if args.json {
        let rows: Vec<SummaryJson<'_>> = translation
            .summary
            .iter()
            .map(|row| SummaryJson {
                resource: &row.name,
                resource_type: &row.resource_type,
                entries: row.entries,
                parameters: row.parameters,
                variables: row.variables,
                outputs: row.outputs,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
    } else {
        println!("{}", format_summary_table(&translation.summary));
        println!(
            "{} {} translates to {} ARM resources",
            "ok:".if_supports_color(Stream::Stdout, |t| t.green()),
            source.path.display(),
            translation.document.resources.len()
        );
    }
    Ok(exitcode::OK)
}
