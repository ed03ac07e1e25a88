//! Tests for intrinsic function evaluation and memoization.

use cfnarm::{
    Dialect, EvalError, Options, ResolutionContext, Template, TranslatorRegistry, Value,
    parse_template,
};
use serde_json::json;

const TEMPLATE: &str = r#"{
    "Parameters": {
        "DBUsername": { "Type": "String", "Default": "admin" },
        "Region": { "Type": "String", "Default": "us-east-1" },
        "Unset": { "Type": "String" }
    },
    "Mappings": {
        "RegionMap": {
            "us-east-1": { "AMI": "ami-123" },
            "eu-west-1": { "AMI": "ami-456" }
        }
    },
    "Resources": {
        "Web": { "Type": "AWS::EC2::Instance" },
        "Sample": {
            "Type": "Test::Sample",
            "Properties": {
                "Joined": { "Fn::Join": [",", ["a", "b", "c"]] },
                "Empty": { "Fn::Join": [",", []] },
                "UserData": { "Fn::Base64": { "Fn::Join": ["", ["user=", { "Ref": "DBUsername" }]] } },
                "Image": { "Fn::FindInMap": ["RegionMap", { "Ref": "Region" }, "AMI"] },
                "MissingImage": { "Fn::FindInMap": ["RegionMap", "ap-south-1", "AMI"] },
                "UnknownMap": { "Fn::FindInMap": ["Nowhere", "us-east-1", "AMI"] },
                "First": { "Ref": "DBUsername" },
                "Second": { "Ref": "DBUsername" },
                "NoValue": { "Ref": "Unset" },
                "Typo": { "Ref": "DBUsernme" },
                "Location": { "Fn::Join": ["-", [{ "Ref": "AWS::Region" }, "vm"]] },
                "Bracketed": { "Fn::Join": ["", ["[", "x"]] },
                "BracketedPair": { "Fn::Join": ["", ["[", "x", "]"]] },
                "BadJoin": { "Fn::Join": [",", ["a", ["nested"]]] },
                "BadBase64": { "Fn::Base64": 42 },
                "WebRef": { "Ref": "Web" },
                "WebIp": { "Fn::GetAtt": ["Web", "PrivateIp"] },
                "WebBogus": { "Fn::GetAtt": ["Web", "Bogus"] },
                "Tags": [{ "Key": "owner", "Value": { "Ref": "DBUsername" } }]
            }
        }
    }
}"#;

fn template() -> Template {
    parse_template(TEMPLATE, Dialect::Cfn).unwrap()
}

fn property(
    template: &Template,
    registry: &TranslatorRegistry,
    options: &Options,
    key: &str,
) -> Result<Value, EvalError> {
    let ctx = ResolutionContext::new(template, registry, options);
    let sample = template.resource("Sample").unwrap();
    Ok(ctx.resource_property(sample, key)?.unwrap())
}

fn eval(key: &str) -> Result<Value, EvalError> {
    property(
        &template(),
        &TranslatorRegistry::with_builtins(),
        &Options::default(),
        key,
    )
}

#[test]
fn join_concatenates_literals() {
    assert_eq!(eval("Joined").unwrap(), Value::from("a,b,c"));
    assert_eq!(eval("Empty").unwrap(), Value::from(""));
}

#[test]
fn base64_encodes_joined_parameter_default() {
    assert_eq!(eval("UserData").unwrap(), Value::from("dXNlcj1hZG1pbg=="));
}

#[test]
fn find_in_map_uses_resolved_key() {
    assert_eq!(eval("Image").unwrap(), Value::from("ami-123"));
}

#[test]
fn find_in_map_reports_missing_key() {
    let err = eval("MissingImage").unwrap_err();
    match err {
        EvalError::MissingMappingKey { map, keys, location } => {
            assert_eq!(map, "RegionMap");
            assert_eq!(keys, vec!["ap-south-1", "AMI"]);
            assert_eq!(location.as_str(), "/Resources/Sample/Properties/MissingImage");
        }
        other => panic!("expected MissingMappingKey, got {other:?}"),
    }
    assert!(matches!(
        eval("UnknownMap").unwrap_err(),
        EvalError::MissingMappingKey { map, .. } if map == "Nowhere"
    ));
}

#[test]
fn parameter_default_is_used_without_override() {
    assert_eq!(eval("First").unwrap(), Value::from("admin"));
}

#[test]
fn parameter_override_takes_precedence() {
    let template = template();
    let registry = TranslatorRegistry::with_builtins();
    let mut options = Options::default();
    options.set_parameter("DBUsername", json!("root"));
    assert_eq!(
        property(&template, &registry, &options, "First").unwrap(),
        Value::from("root")
    );
}

#[test]
fn passthrough_parameters_become_expressions() {
    let template = template();
    let registry = TranslatorRegistry::with_builtins();
    let options = Options::builder().passthrough_parameters(true).build();
    assert_eq!(
        property(&template, &registry, &options, "First").unwrap(),
        Value::expr("parameters('DBUsername')")
    );
    assert_eq!(
        property(&template, &registry, &options, "UserData").unwrap(),
        Value::expr("base64(concat('user=', parameters('DBUsername')))")
    );
}

#[test]
fn parameter_without_value_is_an_error() {
    assert_eq!(
        eval("NoValue").unwrap_err(),
        EvalError::MissingParameterValue {
            name: "Unset".to_string()
        }
    );
}

#[test]
fn unresolved_reference_suggests_close_names() {
    let err = eval("Typo").unwrap_err();
    let EvalError::UnresolvedReference {
        name, suggestions, ..
    } = err
    else {
        panic!("expected UnresolvedReference, got {err:?}");
    };
    assert_eq!(name, "DBUsernme");
    assert_eq!(suggestions, vec!["DBUsername"]);
}

#[test]
fn pseudo_parameter_joins_into_concat() {
    let value = eval("Location").unwrap();
    assert_eq!(value, Value::expr("concat(resourceGroup().location, '-vm')"));
    assert_eq!(
        value.to_json(),
        json!("[concat(resourceGroup().location, '-vm')]")
    );
}

#[test]
fn only_bracketed_literals_are_escaped() {
    let open = eval("Bracketed").unwrap();
    assert_eq!(open, Value::from("[x"));
    assert_eq!(open.to_json(), json!("[x"));

    let pair = eval("BracketedPair").unwrap();
    assert_eq!(pair, Value::from("[x]"));
    assert_eq!(pair.to_json(), json!("[[x]"));
}

#[test]
fn join_rejects_non_scalar_parts() {
    assert!(matches!(
        eval("BadJoin").unwrap_err(),
        EvalError::InvalidJoinOperand { index: 1, found: "list", .. }
    ));
}

#[test]
fn base64_rejects_non_strings() {
    assert!(matches!(
        eval("BadBase64").unwrap_err(),
        EvalError::InvalidBase64Operand { found: "number", .. }
    ));
}

#[test]
fn resource_references_follow_the_attribute_table() {
    assert_eq!(
        eval("WebRef").unwrap(),
        Value::expr("resourceId('Microsoft.Compute/virtualMachines', variables('vmName_Web'))")
    );
    assert_eq!(
        eval("WebIp").unwrap(),
        Value::expr(
            "reference(resourceId('Microsoft.Network/networkInterfaces', variables('nicName_VM_Web'))).ipConfigurations[0].properties.privateIPAddress"
        )
    );
}

#[test]
fn unknown_attribute_lists_available_attributes() {
    let err = eval("WebBogus").unwrap_err();
    let EvalError::UnknownAttribute {
        resource,
        resource_type,
        available,
        ..
    } = err
    else {
        panic!("expected UnknownAttribute, got {err:?}");
    };
    assert_eq!(resource, "Web");
    assert_eq!(resource_type, "AWS::EC2::Instance");
    assert_eq!(
        available,
        vec!["AvailabilityZone", "PrivateIp", "PrivateDnsName", "PublicDnsName"]
    );
}

#[test]
fn nested_structures_are_resolved_in_place() {
    assert_eq!(
        eval("Tags").unwrap().to_json(),
        json!([{ "Key": "owner", "Value": "admin" }])
    );
}

#[test]
fn repeated_reference_is_looked_up_once() {
    let template = template();
    let registry = TranslatorRegistry::with_builtins();
    let options = Options::default();
    let ctx = ResolutionContext::new(&template, &registry, &options);
    let sample = template.resource("Sample").unwrap();

    let first = ctx.resource_property(sample, "First").unwrap();
    // The parameter and the `Ref` node.
    assert_eq!(ctx.memo_len(), 2);
    let second = ctx.resource_property(sample, "Second").unwrap();
    assert_eq!(first, second);
    assert_eq!(ctx.lookup_count(), 1);
    assert_eq!(ctx.memo_len(), 3);

    // Re-evaluating the same node is a node-level memo hit.
    ctx.resource_property(sample, "First").unwrap();
    assert_eq!(ctx.lookup_count(), 1);
    assert_eq!(ctx.memo_len(), 3);
}

#[test]
fn whole_property_tree_resolves_without_functions() {
    let source = r#"{
        "Parameters": { "Size": { "Type": "Number", "Default": 10 } },
        "Resources": {
            "Disk": {
                "Type": "Test::Disk",
                "Properties": {
                    "Size": { "Ref": "Size" },
                    "Name": { "Fn::Join": ["-", ["disk", { "Ref": "Size" }]] },
                    "Plain": [true, null, 1.5]
                }
            }
        }
    }"#;
    let template = parse_template(source, Dialect::Cfn).unwrap();
    let registry = TranslatorRegistry::with_builtins();
    let options = Options::default();
    let ctx = ResolutionContext::new(&template, &registry, &options);
    let disk = template.resource("Disk").unwrap();

    let properties = ctx.resource_properties(disk).unwrap();
    assert_eq!(properties["Size"], Value::from(10_i64));
    assert_eq!(properties["Name"], Value::from("disk-10"));
    assert_eq!(properties["Plain"].to_json(), json!([true, null, 1.5]));
}

#[test]
fn heat_references_stay_in_their_namespace() {
    let source = r#"{
        "heat_template_version": "2013-05-23",
        "parameters": { "data": { "type": "string", "default": "named-by-parameter" } },
        "resources": {
            "data": { "type": "OS::Cinder::Volume", "properties": { "size": 10 } },
            "holder": {
                "type": "Test::Holder",
                "properties": {
                    "Param": { "get_param": "data" },
                    "Resource": { "get_resource": "data" },
                    "MissingParam": { "get_param": "holder" },
                    "MissingResource": { "get_resource": "OS::stack_name" }
                }
            }
        }
    }"#;
    let template = parse_template(source, Dialect::Heat).unwrap();
    let registry = TranslatorRegistry::with_builtins();
    let options = Options::default();
    let ctx = ResolutionContext::new(&template, &registry, &options);
    let holder = template.resource("holder").unwrap();

    assert_eq!(
        ctx.resource_property(holder, "Param").unwrap(),
        Some(Value::from("named-by-parameter"))
    );
    assert_eq!(
        ctx.resource_property(holder, "Resource").unwrap(),
        Some(Value::expr("variables('dataDiskName_data')"))
    );
    for key in ["MissingParam", "MissingResource"] {
        assert!(matches!(
            ctx.resource_property(holder, key).unwrap_err(),
            EvalError::UnresolvedReference { .. }
        ));
    }
}
