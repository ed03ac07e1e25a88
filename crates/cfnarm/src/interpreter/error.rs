//! Error types for intrinsic function evaluation.

use strsim::levenshtein;
use thiserror::Error;

use crate::types::Location;

/// An error that occurred while evaluating an intrinsic function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// `Ref` or `Fn::GetAtt` named something that is not declared.
    #[error("unresolved reference '{name}' at {location}{}", format_suggestions(suggestions))]
    UnresolvedReference {
        name: String,
        location: Location,
        suggestions: Vec<String>,
    },

    /// `Fn::GetAtt` asked for an attribute the resource type does not expose.
    #[error(
        "resource '{resource}' ({resource_type}) has no attribute '{attribute}' at {location}, available: {}",
        format_available(available)
    )]
    UnknownAttribute {
        resource: String,
        resource_type: String,
        attribute: String,
        location: Location,
        available: Vec<String>,
    },

    /// `Fn::FindInMap` named a mapping or key path that does not exist.
    #[error("no entry for [{}] in mapping '{map}' at {location}", keys.join(", "))]
    MissingMappingKey {
        map: String,
        keys: Vec<String>,
        location: Location,
    },

    /// A `Fn::Join` part resolved to something without a textual form.
    #[error("cannot join part {index} at {location}: found {found}")]
    InvalidJoinOperand {
        location: Location,
        index: usize,
        found: &'static str,
    },

    /// The operand of `Fn::Base64` did not resolve to a string.
    #[error("cannot base64-encode a {found} at {location}")]
    InvalidBase64Operand {
        location: Location,
        found: &'static str,
    },

    /// A chain of references leads back to an entity being resolved.
    #[error("cyclic reference detected: {}", chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },

    /// A parameter has no default and no value was supplied for it.
    #[error("parameter '{name}' has no default and no value was supplied")]
    MissingParameterValue { name: String },
}

fn format_suggestions(suggestions: &[String]) -> String {
    match suggestions {
        [] => String::new(),
        [only] => format!(", did you mean '{only}'?"),
        many => format!(
            ", did you mean one of: {}?",
            many.iter()
                .map(|s| format!("'{s}'"))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "none".to_string()
    } else {
        available.join(", ")
    }
}

/// Compute typo suggestions using Levenshtein distance.
///
/// - distance <= 1 for names of 3 characters or fewer
/// - distance <= 2 for longer names
/// - at most 3 suggestions, closest first
pub fn compute_suggestions<S: AsRef<str>>(name: &str, available: &[S]) -> Vec<String> {
    let max_distance = if name.len() <= 3 { 1 } else { 2 };
    let mut suggestions: Vec<(usize, String)> = available
        .iter()
        .filter_map(|candidate| {
            let candidate = candidate.as_ref();
            let dist = levenshtein(name, candidate);
            (dist <= max_distance && dist > 0).then(|| (dist, candidate.to_string()))
        })
        .collect();

    suggestions.sort_by_key(|(dist, _)| *dist);
    suggestions.into_iter().take(3).map(|(_, s)| s).collect()
}
