//! Conversion of raw JSON into the template model.

use indexmap::IndexMap;
use indexmap::map::Entry;

use super::dialect::{Dialect, Intrinsic, Keys};
use super::error::ParseError;
use super::raw::RawNode;
use crate::template::{
    Function, FunctionKind, Mapping, MappingEntry, Node, Output, ParameterSpec, Resource, Template,
};
use crate::types::Location;

/// Parse template text in the given dialect.
///
/// # Errors
///
/// Returns an error if:
/// - The input is not valid JSON
/// - The resources section is missing or a resource has no type
/// - A resource name is declared twice
/// - A function-like key is not a supported intrinsic
/// - A supported intrinsic has malformed arguments
pub fn parse_template(input: &str, dialect: Dialect) -> Result<Template, ParseError> {
    let root: RawNode = serde_json::from_str(input).map_err(|e| {
        let message = e.to_string();
        let message = message
            .rsplit_once(" at line ")
            .map_or(message.as_str(), |(m, _)| m)
            .to_string();
        ParseError::Syntax {
            line: e.line(),
            column: e.column(),
            message,
        }
    })?;
    Reader {
        dialect,
        keys: dialect.keys(),
    }
    .template(root)
}

struct Reader {
    dialect: Dialect,
    keys: Keys,
}

fn malformed(location: &Location, message: impl Into<String>) -> ParseError {
    ParseError::Malformed {
        location: location.clone(),
        message: message.into(),
    }
}

fn expect_object(
    raw: RawNode,
    location: &Location,
    what: &str,
) -> Result<Vec<(String, RawNode)>, ParseError> {
    match raw {
        RawNode::Object(entries) => Ok(entries),
        other => Err(malformed(
            location,
            format!("{what} must be an object, found {}", other.kind()),
        )),
    }
}

/// Collect object entries into a map, rejecting duplicate keys.
fn unique(
    entries: Vec<(String, RawNode)>,
    location: &Location,
) -> Result<IndexMap<String, RawNode>, ParseError> {
    let mut map = IndexMap::with_capacity(entries.len());
    for (key, value) in entries {
        match map.entry(key) {
            Entry::Occupied(entry) => {
                return Err(malformed(
                    location,
                    format!("duplicate key '{}'", entry.key()),
                ));
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }
    Ok(map)
}

fn is_truthy(raw: &RawNode) -> bool {
    match raw {
        RawNode::Bool(b) => *b,
        RawNode::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

impl Reader {
    fn template(&self, root: RawNode) -> Result<Template, ParseError> {
        let root_location = Location::root();
        let sections = unique(
            expect_object(root, &root_location, "template")?,
            &root_location,
        )?;
        let mut template = Template::default();
        let mut has_resources = false;

        for (key, value) in sections {
            let location = root_location.child(&key);
            if key == self.keys.description {
                template.description = value.into_text();
            } else if key == self.keys.parameters {
                template.parameters = self.parameters(value, &location)?;
            } else if self.keys.mappings == Some(key.as_str()) {
                template.mappings = self.mappings(value, &location)?;
            } else if key == self.keys.resources {
                template.resources = self.resources(value, &location)?;
                has_resources = true;
            } else if key == self.keys.outputs {
                template.outputs = self.outputs(value, &location)?;
            }
        }

        if !has_resources {
            return Err(malformed(
                &root_location,
                format!("missing '{}' section", self.keys.resources),
            ));
        }
        Ok(template)
    }

    fn parameters(
        &self,
        raw: RawNode,
        location: &Location,
    ) -> Result<IndexMap<String, ParameterSpec>, ParseError> {
        let entries = unique(expect_object(raw, location, "parameters")?, location)?;
        let mut parameters = IndexMap::with_capacity(entries.len());
        for (name, value) in entries {
            let param_location = location.child(&name);
            let fields = unique(
                expect_object(value, &param_location, "parameter")?,
                &param_location,
            )?;
            let mut spec = ParameterSpec {
                name: name.clone(),
                param_type: "String".to_string(),
                ..ParameterSpec::default()
            };
            for (key, field) in fields {
                if key == self.keys.param_type {
                    spec.param_type = field.into_text().ok_or_else(|| {
                        malformed(&param_location.child(&key), "type must be a string")
                    })?;
                } else if key == self.keys.default {
                    spec.default = Some(field.into_json());
                } else if key == self.keys.no_echo {
                    spec.no_echo = is_truthy(&field);
                } else if key.eq_ignore_ascii_case("description") {
                    spec.description = field.into_text();
                } else {
                    spec.constraints.insert(key, field.into_json());
                }
            }
            parameters.insert(name, spec);
        }
        Ok(parameters)
    }

    fn mappings(
        &self,
        raw: RawNode,
        location: &Location,
    ) -> Result<IndexMap<String, Mapping>, ParseError> {
        let entries = unique(expect_object(raw, location, "mappings")?, location)?;
        let mut mappings = IndexMap::with_capacity(entries.len());
        for (name, value) in entries {
            let map_location = location.child(&name);
            let top = unique(expect_object(value, &map_location, "mapping")?, &map_location)?;
            let mut mapping = Mapping::with_capacity(top.len());
            for (key, entry) in top {
                let entry = match entry {
                    RawNode::Object(second) => MappingEntry::Table(
                        unique(second, &map_location.child(&key))?
                            .into_iter()
                            .map(|(k, v)| (k, v.into_json()))
                            .collect(),
                    ),
                    scalar => MappingEntry::Scalar(scalar.into_json()),
                };
                mapping.insert(key, entry);
            }
            mappings.insert(name, mapping);
        }
        Ok(mappings)
    }

    fn resources(
        &self,
        raw: RawNode,
        location: &Location,
    ) -> Result<IndexMap<String, Resource>, ParseError> {
        let entries = expect_object(raw, location, "resources")?;
        let mut resources = IndexMap::with_capacity(entries.len());
        for (name, value) in entries {
            if resources.contains_key(&name) {
                return Err(ParseError::DuplicateResource { name });
            }
            let resource = self.resource(name.clone(), value, &location.child(&name))?;
            resources.insert(name, resource);
        }
        Ok(resources)
    }

    fn resource(
        &self,
        name: String,
        raw: RawNode,
        location: &Location,
    ) -> Result<Resource, ParseError> {
        let fields = unique(expect_object(raw, location, "resource")?, location)?;
        let mut resource_type = None;
        let mut properties = IndexMap::new();
        let mut metadata = None;
        let mut depends_on = Vec::new();

        for (key, field) in fields {
            let field_location = location.child(&key);
            if key == self.keys.resource_type {
                resource_type = Some(
                    field
                        .into_text()
                        .ok_or_else(|| malformed(&field_location, "type must be a string"))?,
                );
            } else if key == self.keys.properties {
                let props = unique(
                    expect_object(field, &field_location, "properties")?,
                    &field_location,
                )?;
                for (prop, value) in props {
                    let node = self.node(value, &field_location.child(&prop))?;
                    properties.insert(prop, node);
                }
            } else if key == self.keys.metadata {
                metadata = Some(field.into_json());
            } else if key == self.keys.depends_on {
                depends_on = match field {
                    RawNode::String(s) => vec![s],
                    RawNode::List(items) => items
                        .into_iter()
                        .map(|item| {
                            item.into_text().ok_or_else(|| {
                                malformed(&field_location, "dependencies must be names")
                            })
                        })
                        .collect::<Result<_, _>>()?,
                    other => {
                        return Err(malformed(
                            &field_location,
                            format!("dependencies must be a name or list, found {}", other.kind()),
                        ));
                    }
                };
            }
        }

        let resource_type = resource_type.ok_or_else(|| {
            malformed(
                location,
                format!("resource has no '{}'", self.keys.resource_type),
            )
        })?;
        Ok(Resource {
            name,
            resource_type,
            properties,
            metadata,
            depends_on,
            location: location.clone(),
        })
    }

    fn outputs(
        &self,
        raw: RawNode,
        location: &Location,
    ) -> Result<IndexMap<String, Output>, ParseError> {
        let entries = unique(expect_object(raw, location, "outputs")?, location)?;
        let mut outputs = IndexMap::with_capacity(entries.len());
        for (name, value) in entries {
            let output_location = location.child(&name);
            let mut fields = unique(
                expect_object(value, &output_location, "output")?,
                &output_location,
            )?;
            let raw_value = fields.shift_remove(self.keys.output_value).ok_or_else(|| {
                malformed(
                    &output_location,
                    format!("output has no '{}'", self.keys.output_value),
                )
            })?;
            let value = self.node(raw_value, &output_location.child(self.keys.output_value))?;
            let description = fields
                .into_iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("description"))
                .and_then(|(_, v)| v.into_text());
            outputs.insert(
                name.clone(),
                Output {
                    name,
                    value,
                    description,
                },
            );
        }
        Ok(outputs)
    }

    /// Convert a property value, recognising intrinsic function calls.
    fn node(&self, raw: RawNode, location: &Location) -> Result<Node, ParseError> {
        match raw {
            RawNode::Null => Ok(Node::Null),
            RawNode::Bool(b) => Ok(Node::Bool(b)),
            RawNode::Number(n) => Ok(Node::Number(n)),
            RawNode::String(s) => Ok(Node::String(s)),
            RawNode::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| self.node(item, &location.child(i)))
                .collect::<Result<_, _>>()
                .map(Node::List),
            RawNode::Object(mut entries) => {
                if let [(key, _)] = entries.as_slice() {
                    if let Some(intrinsic) = self.dialect.intrinsic(key) {
                        let (name, argument) = entries.remove(0);
                        return self.function(intrinsic, name, argument, location);
                    }
                    if self.dialect.is_unsupported_function(key) {
                        return Err(ParseError::UnknownFunction {
                            name: key.clone(),
                            location: location.clone(),
                        });
                    }
                }
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, value) in unique(entries, location)? {
                    let node = self.node(value, &location.child(&key))?;
                    map.insert(key, node);
                }
                Ok(Node::Map(map))
            }
        }
    }

    fn function(
        &self,
        intrinsic: Intrinsic,
        name: String,
        argument: RawNode,
        location: &Location,
    ) -> Result<Node, ParseError> {
        let argument_location = location.child(&name);
        let invalid = |message: &str| ParseError::InvalidFunction {
            name: name.clone(),
            location: location.clone(),
            message: message.to_string(),
        };

        let kind = match intrinsic {
            Intrinsic::Ref(scope) => match argument {
                RawNode::String(target) => FunctionKind::Ref {
                    name: target,
                    scope,
                },
                RawNode::List(mut items) if items.len() == 1 => {
                    let target = items.remove(0).into_text();
                    FunctionKind::Ref {
                        name: target.ok_or_else(|| invalid("expected a name"))?,
                        scope,
                    }
                }
                _ => return Err(invalid("expected a name")),
            },
            Intrinsic::GetAttr => {
                let (resource, attribute) = match argument {
                    RawNode::String(s) if self.dialect == Dialect::Cfn => s
                        .split_once('.')
                        .map(|(r, a)| (r.to_string(), a.to_string()))
                        .ok_or_else(|| invalid("expected 'Resource.Attribute'"))?,
                    RawNode::List(items) if items.len() == 2 => {
                        let mut texts = items.into_iter().map(RawNode::into_text);
                        match (texts.next().flatten(), texts.next().flatten()) {
                            (Some(r), Some(a)) => (r, a),
                            _ => return Err(invalid("expected [resource, attribute]")),
                        }
                    }
                    _ => return Err(invalid("expected [resource, attribute]")),
                };
                FunctionKind::GetAttr {
                    resource,
                    attribute,
                }
            }
            Intrinsic::FindInMap => {
                let RawNode::List(items) = argument else {
                    return Err(invalid("expected [map, top key, second key]"));
                };
                let [map, top_key, second_key]: [RawNode; 3] = items
                    .try_into()
                    .map_err(|_| invalid("expected [map, top key, second key]"))?;
                FunctionKind::FindInMap {
                    map: map
                        .into_text()
                        .ok_or_else(|| invalid("map name must be a string"))?,
                    top_key: self.node(top_key, &argument_location.child(1))?,
                    second_key: self.node(second_key, &argument_location.child(2))?,
                }
            }
            Intrinsic::Join => {
                let RawNode::List(mut items) = argument else {
                    return Err(invalid("expected [delimiter, [parts]]"));
                };
                if items.len() < 2 || (self.dialect == Dialect::Cfn && items.len() != 2) {
                    return Err(invalid("expected [delimiter, [parts]]"));
                }
                let delimiter = items
                    .remove(0)
                    .into_text()
                    .ok_or_else(|| invalid("delimiter must be a string"))?;
                let mut parts = Vec::new();
                for (i, list) in items.into_iter().enumerate() {
                    let RawNode::List(list) = list else {
                        return Err(invalid("parts must be a list"));
                    };
                    let list_location = argument_location.child(i + 1);
                    for (j, part) in list.into_iter().enumerate() {
                        parts.push(self.node(part, &list_location.child(j))?);
                    }
                }
                FunctionKind::Join { delimiter, parts }
            }
            Intrinsic::Base64 => FunctionKind::Base64 {
                inner: self.node(argument, &argument_location)?,
            },
        };

        Ok(Node::Function(Box::new(Function {
            location: location.clone(),
            kind,
        })))
    }
}
