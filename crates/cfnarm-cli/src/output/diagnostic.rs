//! Miette diagnostic wrapper for template errors.
//!
//! Note: This module has an exception for `unused_assignments` because miette
//! derive macros read struct fields in generated code that rustc cannot track.
#![allow(unused_assignments)]

use std::path::Path;

use cfnarm::{EvalError, Location, ParseError, TranslateError, TranslatorRegistry};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

const SUPPORTED_FUNCTIONS: &str = "supported functions: Ref, Fn::GetAtt, Fn::FindInMap, \
    Fn::Join, Fn::Base64 (Heat: get_param, get_resource, get_attr, list_join)";

/// A miette-compatible diagnostic for a failed translation.
///
/// Note: Fields are read by miette derive macros, not directly by code.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(cfnarm::template))]
pub struct TemplateDiagnostic {
    #[source_code]
    src: NamedSource<String>,

    #[label("{label}")]
    span: Option<SourceSpan>,

    label: String,

    message: String,

    #[help]
    help: Option<String>,
}

impl TemplateDiagnostic {
    fn new(
        path: &Path,
        content: &str,
        message: String,
        offset: Option<usize>,
        label: &str,
    ) -> Self {
        TemplateDiagnostic {
            src: NamedSource::new(path.display().to_string(), content.to_string()),
            span: offset.map(|offset| (offset.min(content.len()), 1).into()),
            label: label.to_string(),
            message,
            help: None,
        }
    }

    fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Create a diagnostic from a ParseError with source context.
    pub fn from_parse_error(path: &Path, content: &str, err: &ParseError) -> Self {
        let message = err.to_string();
        match err {
            ParseError::Syntax { line, column, .. } => {
                // Convert line:column to byte offset.
                let offset = content
                    .lines()
                    .take(line.saturating_sub(1))
                    .map(|l| l.len() + 1)
                    .sum::<usize>()
                    + column.saturating_sub(1);
                Self::new(path, content, message, Some(offset), "syntax error here")
            }
            ParseError::UnknownFunction { location, .. } => {
                let offset = locate(content, location);
                Self::new(path, content, message, offset, "unsupported function")
                    .with_help(SUPPORTED_FUNCTIONS)
            }
            ParseError::InvalidFunction { location, .. } => {
                Self::new(path, content, message, locate(content, location), "called here")
            }
            ParseError::Malformed { location, .. } => {
                Self::new(path, content, message, locate(content, location), "here")
            }
            ParseError::DuplicateResource { name } => {
                let offset = content.rfind(&format!("\"{}\"", name));
                Self::new(path, content, message, offset, "declared again here")
            }
        }
    }

    /// Create a diagnostic from a TranslateError with source context.
    pub fn from_translate_error(
        path: &Path,
        content: &str,
        err: &TranslateError,
        registry: &TranslatorRegistry,
    ) -> Self {
        let message = err.to_string();
        match err {
            TranslateError::UnsupportedResourceType { resource, .. } => {
                let offset = locate_segments(content, &[resource.as_str()]);
                Self::new(path, content, message, offset, "this resource").with_help(format!(
                    "supported types: {}",
                    registry.resource_types().join(", ")
                ))
            }
            TranslateError::DanglingDependency { resource, .. } => {
                let offset = locate_segments(content, &[resource.as_str()]);
                Self::new(path, content, message, offset, "this resource")
            }
            TranslateError::InvalidProperty {
                resource, property, ..
            } => Self::new(
                path,
                content,
                message,
                locate_segments(content, &[resource.as_str(), property.as_str()]),
                "this property",
            ),
            TranslateError::NameCollision { resource, .. } => {
                let offset = locate_segments(content, &[resource.as_str()]);
                Self::new(path, content, message, offset, "this resource")
                    .with_help("rename one of the resources so their derived names differ")
            }
            TranslateError::Eval(eval) => Self::from_eval_error(path, content, eval, message),
        }
    }

    fn from_eval_error(path: &Path, content: &str, err: &EvalError, message: String) -> Self {
        match err {
            EvalError::UnresolvedReference { location, .. }
            | EvalError::UnknownAttribute { location, .. }
            | EvalError::MissingMappingKey { location, .. }
            | EvalError::InvalidJoinOperand { location, .. }
            | EvalError::InvalidBase64Operand { location, .. } => {
                Self::new(path, content, message, locate(content, location), "evaluated here")
            }
            EvalError::MissingParameterValue { name } => {
                let offset = locate_segments(content, &[name.as_str()]);
                Self::new(path, content, message, offset, "declared here")
                    .with_help(format!("supply a value with `-p {}=<value>`", name))
            }
            EvalError::CyclicReference { .. } => Self::new(path, content, message, None, ""),
        }
    }
}

/// Best-effort byte offset of the node at a location.
fn locate(content: &str, location: &Location) -> Option<usize> {
    let segments: Vec<String> = location
        .as_str()
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect();
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
    locate_segments(content, &segments)
}

/// Find each quoted key in turn, starting after the previous match.
///
/// List indices and keys that cannot be found are skipped, so the result is
/// the deepest key that was found.
fn locate_segments(content: &str, segments: &[&str]) -> Option<usize> {
    let mut found = None;
    let mut from = 0;
    for segment in segments {
        if segment.parse::<usize>().is_ok() {
            continue;
        }
        let needle = format!("\"{}\"", segment);
        if let Some(position) = content[from..].find(&needle) {
            found = Some(from + position);
            from += position + needle.len();
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use cfnarm::{parse_template, Dialect};

    use super::*;

    const TEMPLATE: &str = r#"{
  "Resources": {
    "Web": {
      "Type": "AWS::EC2::Instance",
      "Properties": { "ImageId": { "Ref": "Image" } }
    }
  }
}"#;

    #[test]
    fn locations_map_to_the_deepest_key() {
        let location = Location::root()
            .child("Resources")
            .child("Web")
            .child("Properties")
            .child("ImageId");
        let offset = locate(TEMPLATE, &location).unwrap();
        assert!(TEMPLATE[offset..].starts_with("\"ImageId\""));
    }

    #[test]
    fn missing_segments_are_skipped() {
        let offset = locate_segments(TEMPLATE, &["resources", "Web", "0", "Type"]).unwrap();
        assert!(TEMPLATE[offset..].starts_with("\"Type\""));
        assert_eq!(locate_segments(TEMPLATE, &["Nowhere"]), None);
    }

    #[test]
    fn syntax_errors_point_at_line_and_column() {
        let content = "{\n  \"Resources\": {,\n}";
        let err = parse_template(content, Dialect::Cfn).unwrap_err();
        let diagnostic = TemplateDiagnostic::from_parse_error(Path::new("t.json"), content, &err);
        let span = diagnostic.span.unwrap();
        assert!(span.offset() > 1 && span.offset() < content.len());
    }
}
