//! CLI command implementations.

mod check;
mod translate;

pub use check::{run_check, CheckArgs};
pub use translate::{run_translate, TranslateArgs};

use std::fs::read_to_string;
use std::path::PathBuf;

use cfnarm::{
    parse_template, translate_with_summary, Dialect, Options, Translation, TranslatorRegistry,
};
use clap::{Args, ValueEnum};
use serde_json::Value as Json;

use crate::output::TemplateDiagnostic;

/// Source template dialect.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum DialectArg {
    /// AWS CloudFormation
    #[default]
    Cfn,
    /// OpenStack Heat (JSON form)
    Heat,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Cfn => Dialect::Cfn,
            DialectArg::Heat => Dialect::Heat,
        }
    }
}

/// Arguments naming the template to read.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Template file (.json)
    pub input: PathBuf,

    /// Source template dialect
    #[arg(long, value_enum, default_value_t = DialectArg::Cfn)]
    pub dialect: DialectArg,

    /// Parameter values in name=value format (repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,
}

/// Parse a key=value parameter string.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid parameter format '{}': expected name=value", s))?;
    if name.is_empty() {
        return Err(format!("invalid parameter format '{}': empty name", s));
    }
    Ok((name.to_string(), value.to_string()))
}

/// A parameter value from the command line: JSON if it parses, else a string.
fn parameter_value(raw: &str) -> Json {
    serde_json::from_str(raw).unwrap_or_else(|_| Json::String(raw.to_string()))
}

/// A template read from disk.
pub struct Source {
    pub path: PathBuf,
    pub content: String,
    pub dialect: Dialect,
}

impl SourceArgs {
    /// Read the input file.
    pub fn read(&self) -> Result<Source, String> {
        let content = read_to_string(&self.input)
            .map_err(|e| format!("cannot read {}: {}", self.input.display(), e))?;
        Ok(Source {
            path: self.input.clone(),
            content,
            dialect: self.dialect.into(),
        })
    }

    /// Apply `-p` values to the options.
    pub fn apply_parameters(&self, options: &mut Options) {
        for (name, value) in &self.params {
            options.set_parameter(name.clone(), parameter_value(value));
        }
    }
}

/// Parse and translate a source with the built-in translators.
pub fn translate_source(
    source: &Source,
    options: &Options,
) -> Result<Translation, Box<TemplateDiagnostic>> {
    let template = parse_template(&source.content, source.dialect).map_err(|e| {
        Box::new(TemplateDiagnostic::from_parse_error(
            &source.path,
            &source.content,
            &e,
        ))
    })?;
    let registry = TranslatorRegistry::with_builtins();
    log::debug!(
        "translating {} resources from {}",
        template.resources().count(),
        source.path.display()
    );
    translate_with_summary(&template, &registry, options).map_err(|e| {
        Box::new(TemplateDiagnostic::from_translate_error(
            &source.path,
            &source.content,
            &e,
            &registry,
        ))
    })
}
