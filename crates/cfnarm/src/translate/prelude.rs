//! Document-level contributions that belong to no single resource.

use serde_json::{Map, Value as Json, json};

use crate::Options;
use crate::arm::{self, TargetRef, types};
use crate::interpreter::ResolutionContext;
use crate::template::{ParameterSpec, Template};
use crate::translate::{Fragment, TranslateError};
use crate::types::Value;

/// Source name used for fragments contributed by the document itself.
pub const DOCUMENT_SOURCE: &str = "(document)";

/// Parameter naming the storage account that holds virtual machine disks.
pub const STORAGE_ACCOUNT_PARAMETER: &str = "newStorageAccountName";

/// Variable naming the blob container that holds virtual machine disks.
pub const STORAGE_CONTAINER_VARIABLE: &str = "vmStorageAccountContainerName";

/// The shared storage account resource.
pub fn storage_account() -> TargetRef {
    TargetRef::parameter(types::STORAGE_ACCOUNTS, STORAGE_ACCOUNT_PARAMETER)
}

/// Expression body for the URI of a disk blob.
///
/// `blob_name` holds the operands naming the blob, without the `.vhd`
/// extension.
pub fn vhd_uri(blob_name: &[String]) -> String {
    let mut operands = vec![
        arm::quote("http://"),
        arm::parameters(STORAGE_ACCOUNT_PARAMETER),
        arm::quote(".blob.core.windows.net/"),
        arm::variables(STORAGE_CONTAINER_VARIABLE),
        arm::quote("/"),
    ];
    operands.extend_from_slice(blob_name);
    operands.push(arm::quote(".vhd"));
    arm::concat(&operands)
}

/// The `location` variable every resource is placed with.
pub(crate) fn location() -> Fragment {
    let mut fragment = Fragment::new(DOCUMENT_SOURCE);
    fragment.variables.insert(
        "location".to_string(),
        Json::from(arm::wrap("resourceGroup().location")),
    );
    fragment
}

/// The storage account shared by every virtual machine disk.
pub(crate) fn storage(options: &Options) -> Fragment {
    let mut fragment = Fragment::new(DOCUMENT_SOURCE);
    fragment.parameters.insert(
        STORAGE_ACCOUNT_PARAMETER.to_string(),
        json!({
            "type": "string",
            "metadata": {
                "description": "Unique DNS name for the storage account where the virtual machine disks are stored."
            }
        }),
    );
    fragment
        .variables
        .insert(STORAGE_CONTAINER_VARIABLE.to_string(), Json::from("vhds"));
    let account = storage_account();
    fragment.resources.push(json!({
        "type": &account.resource_type,
        "name": account.name_field(),
        "apiVersion": options.api_version(),
        "location": arm::wrap(&arm::variables("location")),
        "properties": { "accountType": "Standard_LRS" },
    }));
    fragment
}

/// Source parameters re-declared in the target document.
pub(crate) fn passthrough_parameters(template: &Template) -> Fragment {
    let mut fragment = Fragment::new(DOCUMENT_SOURCE);
    for spec in template.parameters() {
        fragment
            .parameters
            .insert(spec.name.clone(), target_parameter(spec));
    }
    fragment
}

fn target_type(spec: &ParameterSpec) -> &'static str {
    if spec.no_echo {
        return "securestring";
    }
    let source = spec.param_type.to_ascii_lowercase();
    match source.as_str() {
        "number" => "int",
        "boolean" => "bool",
        "json" => "object",
        "commadelimitedlist" | "comma_delimited_list" => "array",
        s if s.starts_with("list<") => "array",
        _ => "string",
    }
}

/// Numeric constraints are often quoted in source templates.
fn numeric(value: &Json) -> Json {
    match value.as_str().and_then(|s| s.trim().parse::<i64>().ok()) {
        Some(n) => Json::from(n),
        None => value.clone(),
    }
}

fn target_parameter(spec: &ParameterSpec) -> Json {
    let mut parameter = Map::new();
    parameter.insert("type".to_string(), Json::from(target_type(spec)));
    if let Some(default) = &spec.default {
        parameter.insert("defaultValue".to_string(), default.clone());
    }

    for (key, value) in &spec.constraints {
        match key.as_str() {
            "AllowedValues" => {
                parameter.insert("allowedValues".to_string(), value.clone());
            }
            "MinLength" => {
                parameter.insert("minLength".to_string(), numeric(value));
            }
            "MaxLength" => {
                parameter.insert("maxLength".to_string(), numeric(value));
            }
            "MinValue" => {
                parameter.insert("minValue".to_string(), numeric(value));
            }
            "MaxValue" => {
                parameter.insert("maxValue".to_string(), numeric(value));
            }
            "constraints" => heat_constraints(value, &mut parameter),
            _ => {}
        }
    }

    if let Some(description) = &spec.description {
        parameter.insert(
            "metadata".to_string(),
            json!({ "description": description }),
        );
    }
    Json::Object(parameter)
}

/// Map a Heat `constraints` list (`length`, `range`, `allowed_values`).
fn heat_constraints(constraints: &Json, parameter: &mut Map<String, Json>) {
    let Some(constraints) = constraints.as_array() else {
        return;
    };
    for constraint in constraints {
        if let Some(allowed) = constraint.get("allowed_values") {
            parameter.insert("allowedValues".to_string(), allowed.clone());
        }
        let bounds = [
            ("length", "minLength", "maxLength"),
            ("range", "minValue", "maxValue"),
        ];
        for (source, min_key, max_key) in bounds {
            let Some(bound) = constraint.get(source) else {
                continue;
            };
            if let Some(min) = bound.get("min") {
                parameter.insert(min_key.to_string(), numeric(min));
            }
            if let Some(max) = bound.get("max") {
                parameter.insert(max_key.to_string(), numeric(max));
            }
        }
    }
}

/// Template outputs, evaluated and typed.
pub(crate) fn outputs(
    template: &Template,
    ctx: &ResolutionContext<'_>,
) -> Result<Fragment, TranslateError> {
    let mut fragment = Fragment::new(DOCUMENT_SOURCE);
    for output in template.outputs() {
        let value = ctx.evaluate(&output.value)?;
        let output_type = match &value {
            Value::Number(_) => "int",
            Value::Bool(_) => "bool",
            Value::List(_) => "array",
            Value::Map(_) => "object",
            Value::Null | Value::String(_) | Value::Expr(_) => "string",
        };
        fragment.outputs.insert(
            output.name.clone(),
            json!({ "type": output_type, "value": value.to_json() }),
        );
    }
    Ok(fragment)
}
