//! Building blocks for ARM template expressions.
//!
//! ARM embeds expressions in JSON strings delimited by brackets:
//! `"[concat(variables('vmName'), '-nic')]"`. Helpers here produce expression
//! *bodies* (the text between the brackets); `wrap` adds the brackets when a
//! body is placed into the document.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde_json::Value as Json;

/// API version stamped on every generated resource unless overridden.
pub const DEFAULT_API_VERSION: &str = "2015-05-01-preview";

/// Schema URI of the generated deployment template.
pub const SCHEMA: &str =
    "https://schema.management.azure.com/schemas/2015-01-01/deploymentTemplate.json#";

/// Content version of the generated deployment template.
pub const CONTENT_VERSION: &str = "1.0.0.0";

/// ARM resource type identifiers used by the built-in translators.
pub mod types {
    pub const VIRTUAL_MACHINES: &str = "Microsoft.Compute/virtualMachines";
    pub const AVAILABILITY_SETS: &str = "Microsoft.Compute/availabilitySets";
    pub const NETWORK_INTERFACES: &str = "Microsoft.Network/networkInterfaces";
    pub const VIRTUAL_NETWORKS: &str = "Microsoft.Network/virtualNetworks";
    pub const PUBLIC_IP_ADDRESSES: &str = "Microsoft.Network/publicIPAddresses";
    pub const NETWORK_SECURITY_GROUPS: &str = "Microsoft.Network/networkSecurityGroups";
    pub const STORAGE_ACCOUNTS: &str = "Microsoft.Storage/storageAccounts";
    pub const AUTOSCALE_SETTINGS: &str = "Microsoft.Insights/autoscaleSettings";
}

/// Quote a literal as an ARM string literal (`'it''s'`).
pub fn quote(literal: &str) -> String {
    format!("'{}'", literal.replace('\'', "''"))
}

/// Wrap an expression body in brackets.
pub fn wrap(body: &str) -> String {
    format!("[{body}]")
}

/// Escape a literal string so ARM does not read it as an expression.
///
/// Only strings both starting with `[` and ending with `]` are expressions.
pub fn escape_literal(literal: &str) -> String {
    if literal.starts_with('[') && literal.ends_with(']') {
        format!("[{literal}")
    } else {
        literal.to_string()
    }
}

/// Return the body of a bracketed expression string, if it is one.
///
/// Escaped literals (`[[...`) are not expressions.
pub fn unwrap(s: &str) -> Option<&str> {
    if s.starts_with("[[") {
        return None;
    }
    s.strip_prefix('[')?.strip_suffix(']')
}

/// `parameters('<key>')`
pub fn parameters(key: &str) -> String {
    format!("parameters({})", quote(key))
}

/// `variables('<key>')`
pub fn variables(key: &str) -> String {
    format!("variables({})", quote(key))
}

/// `resourceId('<type>', <name>)`
pub fn resource_id(resource_type: &str, name: &str) -> String {
    format!("resourceId({}, {name})", quote(resource_type))
}

/// `reference(<target>)`
pub fn reference(target: &str) -> String {
    format!("reference({target})")
}

/// `concat(<operand>, ...)`
pub fn concat<S: AsRef<str>>(operands: &[S]) -> String {
    let joined = operands
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");
    format!("concat({joined})")
}

/// `base64(<operand>)`
pub fn base64(operand: &str) -> String {
    format!("base64({operand})")
}

/// Split a leading quoted literal off an expression fragment.
///
/// Returns the unquoted literal and the remaining input.
fn split_quoted(input: &str) -> Option<(String, &str)> {
    let rest = input.strip_prefix('\'')?;
    let mut literal = String::new();
    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if matches!(chars.peek(), Some((_, '\''))) {
                literal.push('\'');
                chars.next();
            } else {
                return Some((literal, &rest[i + 1..]));
            }
        } else {
            literal.push(c);
        }
    }
    None
}

/// Which document section a name expression points into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameKey {
    Parameter(String),
    Variable(String),
}

/// Identity of a resource in the target document: its type plus the
/// expression (or quoted literal) that names it.
///
/// Translators build `dependsOn` entries and `resourceId` references from a
/// `TargetRef`, and the output assembler parses them back to check that every
/// dependency points at a resource that was actually emitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetRef {
    pub resource_type: String,
    /// Name as an expression body, e.g. `variables('nicName_web')` or `'web'`.
    pub name: String,
}

impl TargetRef {
    /// A resource whose name is held in a variable.
    pub fn variable(resource_type: &str, key: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            name: variables(key),
        }
    }

    /// A resource whose name is supplied as a parameter.
    pub fn parameter(resource_type: &str, key: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            name: parameters(key),
        }
    }

    /// The value of the resource entry's `name` field.
    pub fn name_field(&self) -> String {
        match split_quoted(&self.name) {
            Some((literal, "")) => escape_literal(&literal),
            _ => wrap(&self.name),
        }
    }

    /// A `dependsOn` entry pointing at this resource.
    pub fn depends_on(&self) -> String {
        let prefix = quote(&format!("{}/", self.resource_type));
        wrap(&concat(&[prefix.as_str(), self.name.as_str()]))
    }

    /// The `resourceId(...)` expression body for this resource.
    pub fn id(&self) -> String {
        resource_id(&self.resource_type, &self.name)
    }

    /// The document key the name expression reads, if any.
    pub fn name_key(&self) -> Option<NameKey> {
        let (ctor, inner): (fn(String) -> NameKey, &str) =
            if let Some(inner) = self.name.strip_prefix("variables(") {
                (NameKey::Variable, inner)
            } else if let Some(inner) = self.name.strip_prefix("parameters(") {
                (NameKey::Parameter, inner)
            } else {
                return None;
            };
        let (key, rest) = split_quoted(inner)?;
        (rest == ")").then(|| ctor(key))
    }

    /// Identify a resource entry from its `type` and `name` fields.
    pub fn of_entry(entry: &Json) -> Option<Self> {
        let resource_type = entry.get("type")?.as_str()?;
        let name = entry.get("name")?.as_str()?;
        let name = match unwrap(name) {
            Some(body) => body.trim().to_string(),
            None => quote(name.strip_prefix('[').unwrap_or(name)),
        };
        Some(Self {
            resource_type: resource_type.to_string(),
            name,
        })
    }

    /// Parse a `dependsOn` entry.
    ///
    /// Accepts the forms the translators emit,
    /// `[concat('<type>/', <name>)]` and `[resourceId('<type>', <name>)]`, and
    /// plain `<type>/<name>` strings.
    pub fn parse(entry: &str) -> Option<Self> {
        let Some(body) = unwrap(entry) else {
            let (resource_type, name) = entry.rsplit_once('/')?;
            return Some(Self {
                resource_type: resource_type.to_string(),
                name: quote(name),
            });
        };
        let body = body.trim();
        if let Some(args) = body.strip_prefix("concat(").and_then(|b| b.strip_suffix(')')) {
            let (prefix, rest) = split_quoted(args.trim_start())?;
            let resource_type = prefix.strip_suffix('/')?;
            let name = rest.trim_start().strip_prefix(',')?.trim();
            return Some(Self {
                resource_type: resource_type.to_string(),
                name: name.to_string(),
            });
        }
        if let Some(args) = body
            .strip_prefix("resourceId(")
            .and_then(|b| b.strip_suffix(')'))
        {
            let (resource_type, rest) = split_quoted(args.trim_start())?;
            let name = rest.trim_start().strip_prefix(',')?.trim();
            return Some(Self {
                resource_type,
                name: name.to_string(),
            });
        }
        None
    }
}

impl Display for TargetRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.resource_type, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_doubles_single_quotes() {
        assert_eq!(quote("it's"), "'it''s'");
    }

    #[test]
    fn depends_on_round_trips_through_parse() {
        let target = TargetRef::variable(types::NETWORK_INTERFACES, "nicName_VM_web");
        let rendered = target.depends_on();
        assert_eq!(
            rendered,
            "[concat('Microsoft.Network/networkInterfaces/', variables('nicName_VM_web'))]"
        );
        assert_eq!(TargetRef::parse(&rendered), Some(target));
    }

    #[test]
    fn parse_accepts_resource_id_and_plain_forms() {
        let by_id = TargetRef::parse(
            "[resourceId('Microsoft.Network/publicIPAddresses', parameters('ip'))]",
        )
        .unwrap();
        assert_eq!(by_id, TargetRef::parameter(types::PUBLIC_IP_ADDRESSES, "ip"));

        let plain = TargetRef::parse("Microsoft.Storage/storageAccounts/store").unwrap();
        assert_eq!(plain.resource_type, types::STORAGE_ACCOUNTS);
        assert_eq!(plain.name, "'store'");
    }

    #[test]
    fn entry_identity_matches_literal_and_expression_names() {
        let entry = serde_json::json!({
            "type": types::VIRTUAL_NETWORKS,
            "name": "[parameters('vnet')]",
        });
        assert_eq!(
            TargetRef::of_entry(&entry),
            Some(TargetRef::parameter(types::VIRTUAL_NETWORKS, "vnet"))
        );

        let literal = serde_json::json!({ "type": types::VIRTUAL_NETWORKS, "name": "vnet" });
        assert_eq!(TargetRef::of_entry(&literal).unwrap().name, "'vnet'");
    }

    #[test]
    fn name_key_reads_variable_and_parameter_names() {
        let target = TargetRef::variable(types::VIRTUAL_MACHINES, "vmName_web");
        assert_eq!(
            target.name_key(),
            Some(NameKey::Variable("vmName_web".to_string()))
        );
        let literal = TargetRef::parse("Microsoft.Compute/virtualMachines/web").unwrap();
        assert_eq!(literal.name_key(), None);
    }
}
