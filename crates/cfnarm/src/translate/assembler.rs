//! Collision-checked accumulation of fragments into the target document.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value as Json};

use crate::arm::{self, NameKey, TargetRef};
use crate::translate::{Entries, Fragment, Section, TranslateError};

/// The finished target document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDocument {
    #[serde(rename = "$schema")]
    pub schema: String,
    #[serde(rename = "contentVersion")]
    pub content_version: String,
    pub parameters: Entries,
    pub variables: Entries,
    pub resources: Vec<Json>,
    pub outputs: Entries,
}

impl OutputDocument {
    /// The document as a JSON value, sections in ARM order.
    pub fn to_json(&self) -> Json {
        let section = |entries: &Entries| {
            Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<Map<_, _>>(),
            )
        };
        let mut root = Map::new();
        root.insert("$schema".to_string(), Json::from(self.schema.as_str()));
        root.insert(
            "contentVersion".to_string(),
            Json::from(self.content_version.as_str()),
        );
        root.insert("parameters".to_string(), section(&self.parameters));
        root.insert("variables".to_string(), section(&self.variables));
        root.insert("resources".to_string(), Json::Array(self.resources.clone()));
        root.insert("outputs".to_string(), section(&self.outputs));
        Json::Object(root)
    }

    /// Pretty-printed JSON text of the document.
    pub fn to_json_pretty(&self) -> String {
        format!("{:#}", self.to_json())
    }

    /// Look up a resource entry by type and `name` field.
    pub fn resource(&self, resource_type: &str, name: &str) -> Option<&Json> {
        self.resources.iter().find(|entry| {
            entry.get("type").and_then(Json::as_str) == Some(resource_type)
                && entry.get("name").and_then(Json::as_str) == Some(name)
        })
    }
}

/// Accumulates fragments and rejects any key contributed twice.
///
/// Writes are append-only: nothing merged is ever overwritten. A failed
/// merge leaves the assembler unchanged.
#[derive(Debug, Default)]
pub struct OutputAssembler {
    parameters: Entries,
    variables: Entries,
    resources: Vec<Json>,
    /// Source resource of each entry in `resources`.
    sources: Vec<String>,
    identities: IndexMap<TargetRef, String>,
    outputs: Entries,
}

fn collision(section: Section, key: impl Into<String>, resource: &str) -> TranslateError {
    TranslateError::NameCollision {
        section,
        key: key.into(),
        resource: resource.to_string(),
    }
}

impl OutputAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one fragment.
    ///
    /// # Errors
    ///
    /// Returns `NameCollision` if a parameter, variable or output key, or a
    /// resource entry's type and name, is already present.
    pub fn merge(&mut self, fragment: Fragment) -> Result<(), TranslateError> {
        let source = fragment.source.as_str();
        let keyed = [
            (Section::Parameters, &fragment.parameters, &self.parameters),
            (Section::Variables, &fragment.variables, &self.variables),
            (Section::Outputs, &fragment.outputs, &self.outputs),
        ];
        for (section, incoming, existing) in keyed {
            if let Some(key) = incoming.keys().find(|k| existing.contains_key(*k)) {
                return Err(collision(section, key, source));
            }
        }

        let mut identities = Vec::with_capacity(fragment.resources.len());
        for entry in &fragment.resources {
            let Some(identity) = TargetRef::of_entry(entry) else {
                identities.push(None);
                continue;
            };
            if self.identities.contains_key(&identity) || identities.contains(&Some(identity.clone()))
            {
                return Err(collision(Section::Resources, identity.to_string(), source));
            }
            identities.push(Some(identity));
        }

        self.parameters.extend(fragment.parameters);
        self.variables.extend(fragment.variables);
        self.outputs.extend(fragment.outputs);
        for (entry, identity) in fragment.resources.into_iter().zip(identities) {
            if let Some(identity) = identity {
                self.identities.insert(identity, fragment.source.clone());
            }
            self.resources.push(entry);
            self.sources.push(fragment.source.clone());
        }
        Ok(())
    }

    /// Number of resource entries merged so far.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Check cross references and produce the document.
    ///
    /// Every `dependsOn` entry must name an emitted resource, and the
    /// variable or parameter holding that resource's name must exist.
    ///
    /// # Errors
    ///
    /// Returns `DanglingDependency` for the first entry that fails.
    pub fn finalize(self) -> Result<OutputDocument, TranslateError> {
        for (entry, source) in self.resources.iter().zip(&self.sources) {
            let Some(depends_on) = entry.get("dependsOn").and_then(Json::as_array) else {
                continue;
            };
            for dependency in depends_on {
                if !self.resolves(dependency) {
                    return Err(TranslateError::DanglingDependency {
                        resource: source.clone(),
                        dependency: dependency
                            .as_str()
                            .map_or_else(|| dependency.to_string(), ToString::to_string),
                    });
                }
            }
        }

        Ok(OutputDocument {
            schema: arm::SCHEMA.to_string(),
            content_version: arm::CONTENT_VERSION.to_string(),
            parameters: self.parameters,
            variables: self.variables,
            resources: self.resources,
            outputs: self.outputs,
        })
    }

    fn resolves(&self, dependency: &Json) -> bool {
        let Some(target) = dependency.as_str().and_then(TargetRef::parse) else {
            return false;
        };
        if !self.identities.contains_key(&target) {
            return false;
        }
        match target.name_key() {
            Some(NameKey::Variable(key)) => self.variables.contains_key(&key),
            Some(NameKey::Parameter(key)) => self.parameters.contains_key(&key),
            None => true,
        }
    }
}
