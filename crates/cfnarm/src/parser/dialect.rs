//! Source template dialects.
//!
//! Both dialects share one intrinsic-function model; a dialect only decides
//! which section keys and function names map onto it.

use crate::template::RefScope;

/// The source template language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// AWS CloudFormation.
    #[default]
    Cfn,
    /// OpenStack Heat orchestration templates (HOT), JSON form.
    Heat,
}

/// Keys naming template sections and resource fields.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Keys {
    pub description: &'static str,
    pub parameters: &'static str,
    pub mappings: Option<&'static str>,
    pub resources: &'static str,
    pub outputs: &'static str,
    pub resource_type: &'static str,
    pub properties: &'static str,
    pub metadata: &'static str,
    pub depends_on: &'static str,
    pub param_type: &'static str,
    pub default: &'static str,
    pub no_echo: &'static str,
    pub output_value: &'static str,
}

const CFN_KEYS: Keys = Keys {
    description: "Description",
    parameters: "Parameters",
    mappings: Some("Mappings"),
    resources: "Resources",
    outputs: "Outputs",
    resource_type: "Type",
    properties: "Properties",
    metadata: "Metadata",
    depends_on: "DependsOn",
    param_type: "Type",
    default: "Default",
    no_echo: "NoEcho",
    output_value: "Value",
};

const HEAT_KEYS: Keys = Keys {
    description: "description",
    parameters: "parameters",
    mappings: None,
    resources: "resources",
    outputs: "outputs",
    resource_type: "type",
    properties: "properties",
    metadata: "metadata",
    depends_on: "depends_on",
    param_type: "type",
    default: "default",
    no_echo: "hidden",
    output_value: "value",
};

/// Intrinsic functions understood by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Intrinsic {
    Ref(RefScope),
    GetAttr,
    FindInMap,
    Join,
    Base64,
}

/// Heat intrinsics the core does not support; recognised so they fail as
/// unknown functions instead of passing through as plain maps.
const HEAT_UNSUPPORTED: &[&str] = &[
    "digest",
    "get_file",
    "map_merge",
    "map_replace",
    "repeat",
    "resource_facade",
    "str_replace",
    "str_split",
    "yaql",
    "if",
    "equals",
    "not",
    "and",
    "or",
];

impl Dialect {
    pub(crate) fn keys(self) -> Keys {
        match self {
            Dialect::Cfn => CFN_KEYS,
            Dialect::Heat => HEAT_KEYS,
        }
    }

    /// Map a single-key object's key onto a supported intrinsic.
    pub(crate) fn intrinsic(self, key: &str) -> Option<Intrinsic> {
        match (self, key) {
            (Dialect::Cfn, "Ref") => Some(Intrinsic::Ref(RefScope::Any)),
            (Dialect::Cfn, "Fn::GetAtt") => Some(Intrinsic::GetAttr),
            (Dialect::Cfn, "Fn::FindInMap") => Some(Intrinsic::FindInMap),
            (Dialect::Cfn, "Fn::Join") => Some(Intrinsic::Join),
            (Dialect::Cfn | Dialect::Heat, "Fn::Base64") => Some(Intrinsic::Base64),
            (Dialect::Heat, "get_param") => Some(Intrinsic::Ref(RefScope::Parameter)),
            (Dialect::Heat, "get_resource") => Some(Intrinsic::Ref(RefScope::Resource)),
            (Dialect::Heat, "get_attr") => Some(Intrinsic::GetAttr),
            (Dialect::Heat, "list_join") => Some(Intrinsic::Join),
            _ => None,
        }
    }

    /// Whether a key looks like a function call this dialect does not support.
    pub(crate) fn is_unsupported_function(self, key: &str) -> bool {
        match self {
            Dialect::Cfn => key.starts_with("Fn::"),
            Dialect::Heat => key.starts_with("Fn::") || HEAT_UNSUPPORTED.contains(&key),
        }
    }
}
