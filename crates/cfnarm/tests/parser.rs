//! Tests for template parsing in both dialects.

use cfnarm::template::{FunctionKind, MappingEntry, Node, RefScope};
use cfnarm::{Dialect, ParseError, parse_template};
use serde_json::json;

fn function(node: &Node) -> &FunctionKind {
    &node.as_function().expect("expected a function node").kind
}

#[test]
fn cfn_sections_are_read_in_order() {
    let template = parse_template(
        r#"{
            "Description": "two servers",
            "Parameters": {
                "KeyName": { "Type": "AWS::EC2::KeyPair::KeyName", "Description": "SSH key" },
                "Size": { "Type": "Number", "Default": 2, "MinValue": 1, "MaxValue": "5" }
            },
            "Mappings": { "Arch": { "m1.small": { "Arch": "64" }, "Flat": "value" } },
            "Resources": {
                "B": { "Type": "AWS::EC2::EIP" },
                "A": { "Type": "AWS::EC2::EIP", "DependsOn": "B", "Metadata": { "note": 1 } }
            },
            "Outputs": { "Address": { "Value": { "Ref": "A" }, "Description": "public address" } }
        }"#,
        Dialect::Cfn,
    )
    .unwrap();

    assert_eq!(template.description(), Some("two servers"));

    let names: Vec<&str> = template.resources().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["B", "A"]);

    let size = template.parameter("Size").unwrap();
    assert_eq!(size.param_type, "Number");
    assert_eq!(size.default, Some(json!(2)));
    assert_eq!(size.constraints["MinValue"], json!(1));
    assert_eq!(size.constraints["MaxValue"], json!("5"));
    let key = template.parameter("KeyName").unwrap();
    assert_eq!(key.description.as_deref(), Some("SSH key"));
    assert_eq!(key.default, None);

    let arch = template.mapping("Arch").unwrap();
    assert!(matches!(arch["m1.small"], MappingEntry::Table(_)));
    assert_eq!(arch["Flat"], MappingEntry::Scalar(json!("value")));

    let a = template.resource("A").unwrap();
    assert_eq!(a.depends_on, vec!["B"]);
    assert_eq!(a.metadata, Some(json!({ "note": 1 })));

    let output = template.outputs().next().unwrap();
    assert_eq!(output.name, "Address");
    assert_eq!(output.description.as_deref(), Some("public address"));
    assert_eq!(output.value.ref_target(), Some("A"));
}

#[test]
fn parameter_type_defaults_to_string() {
    let template = parse_template(
        r#"{ "Parameters": { "Name": {} }, "Resources": {} }"#,
        Dialect::Cfn,
    )
    .unwrap();
    assert_eq!(template.parameter("Name").unwrap().param_type, "String");
}

#[test]
fn cfn_intrinsics_become_function_nodes() {
    let template = parse_template(
        r#"{
            "Resources": {
                "R": {
                    "Type": "Test::R",
                    "Properties": {
                        "Ref": { "Ref": "X" },
                        "Dotted": { "Fn::GetAtt": "Web.PrivateIp" },
                        "Listed": { "Fn::GetAtt": ["Web", "PublicIp"] },
                        "Map": { "Fn::FindInMap": ["M", { "Ref": "AWS::Region" }, "AMI"] },
                        "Join": { "Fn::Join": ["-", ["a", { "Ref": "X" }]] },
                        "Encoded": { "Fn::Base64": "text" },
                        "Plain": { "Ref": "X", "Other": 1 }
                    }
                }
            }
        }"#,
        Dialect::Cfn,
    )
    .unwrap();
    let r = template.resource("R").unwrap();

    assert_eq!(
        function(r.property("Ref").unwrap()),
        &FunctionKind::Ref {
            name: "X".to_string(),
            scope: RefScope::Any,
        }
    );
    for key in ["Dotted", "Listed"] {
        assert!(matches!(
            function(r.property(key).unwrap()),
            FunctionKind::GetAttr { resource, .. } if resource == "Web"
        ));
    }
    let FunctionKind::FindInMap { map, top_key, .. } = function(r.property("Map").unwrap())
    else {
        panic!("expected FindInMap");
    };
    assert_eq!(map, "M");
    assert_eq!(top_key.ref_target(), Some("AWS::Region"));

    let join = r.property("Join").unwrap();
    let FunctionKind::Join { delimiter, parts } = function(join) else {
        panic!("expected Join");
    };
    assert_eq!(delimiter, "-");
    assert_eq!(parts.len(), 2);
    assert_eq!(
        parts[1].as_function().unwrap().location.as_str(),
        "/Resources/R/Properties/Join/Fn::Join/1/1"
    );

    assert!(r.property("Encoded").unwrap().is_base64());
    // Two keys: an ordinary map, not a function call.
    assert!(matches!(r.property("Plain"), Some(Node::Map(_))));
}

#[test]
fn heat_functions_map_onto_the_same_model() {
    let template = parse_template(
        r#"{
            "heat_template_version": "2013-05-23",
            "description": "one server",
            "parameters": {
                "flavor": { "type": "string", "default": "m1.small", "hidden": true }
            },
            "resources": {
                "server": {
                    "type": "OS::Nova::Server",
                    "depends_on": ["volume"],
                    "properties": {
                        "flavor": { "get_param": "flavor" },
                        "port": { "get_resource": "port" },
                        "address": { "get_attr": ["port", "fixed_ips"] },
                        "name": { "list_join": ["-", ["web", "01"], ["a"]] }
                    }
                },
                "volume": { "type": "OS::Cinder::Volume", "properties": { "size": 10 } },
                "port": { "type": "OS::Neutron::Port" }
            },
            "outputs": { "ip": { "value": { "get_attr": ["port", "fixed_ips"] } } }
        }"#,
        Dialect::Heat,
    )
    .unwrap();

    assert_eq!(template.description(), Some("one server"));
    assert!(template.parameter("flavor").unwrap().no_echo);

    let server = template.resource("server").unwrap();
    assert_eq!(server.resource_type, "OS::Nova::Server");
    assert_eq!(server.depends_on, vec!["volume"]);
    assert_eq!(server.property("flavor").unwrap().ref_target(), Some("flavor"));
    assert!(matches!(
        function(server.property("flavor").unwrap()),
        FunctionKind::Ref { scope: RefScope::Parameter, .. }
    ));
    assert_eq!(server.property("port").unwrap().ref_target(), Some("port"));
    assert!(matches!(
        function(server.property("port").unwrap()),
        FunctionKind::Ref { scope: RefScope::Resource, .. }
    ));
    assert!(matches!(
        function(server.property("address").unwrap()),
        FunctionKind::GetAttr { attribute, .. } if attribute == "fixed_ips"
    ));
    let FunctionKind::Join { parts, .. } = function(server.property("name").unwrap()) else {
        panic!("expected Join");
    };
    assert_eq!(parts.len(), 3);
    assert_eq!(template.outputs().count(), 1);
}

#[test]
fn duplicate_resource_is_rejected() {
    let err = parse_template(
        r#"{
            "Resources": {
                "Web": { "Type": "AWS::EC2::EIP" },
                "Web": { "Type": "AWS::EC2::SecurityGroup" }
            }
        }"#,
        Dialect::Cfn,
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::DuplicateResource { name } if name == "Web"));
}

#[test]
fn unsupported_function_is_rejected() {
    let err = parse_template(
        r#"{ "Resources": { "R": { "Type": "T", "Properties": { "P": { "Fn::Sub": "${A}" } } } } }"#,
        Dialect::Cfn,
    )
    .unwrap_err();
    let ParseError::UnknownFunction { name, location } = err else {
        panic!("expected UnknownFunction, got {err:?}");
    };
    assert_eq!(name, "Fn::Sub");
    assert_eq!(location.as_str(), "/Resources/R/Properties/P");

    let err = parse_template(
        r#"{ "resources": { "r": { "type": "T", "properties": { "p": { "str_replace": {} } } } } }"#,
        Dialect::Heat,
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::UnknownFunction { name, .. } if name == "str_replace"));
}

#[test]
fn cfn_functions_are_not_heat_functions() {
    // `Ref` is an ordinary key in Heat templates.
    let template = parse_template(
        r#"{ "resources": { "r": { "type": "T", "properties": { "p": { "Ref": "x" } } } } }"#,
        Dialect::Heat,
    )
    .unwrap();
    let r = template.resource("r").unwrap();
    assert!(matches!(r.property("p"), Some(Node::Map(_))));
}

#[test]
fn malformed_arguments_are_rejected() {
    let cases = [
        r#"{ "Fn::GetAtt": "NoDot" }"#,
        r#"{ "Fn::FindInMap": ["M", "a"] }"#,
        r#"{ "Fn::Join": ["-"] }"#,
        r#"{ "Fn::Join": ["-", "not a list"] }"#,
        r#"{ "Ref": ["a", "b"] }"#,
    ];
    for case in cases {
        let source = format!(r#"{{ "Resources": {{ "R": {{ "Type": "T", "Properties": {{ "P": {case} }} }} }} }}"#);
        let err = parse_template(&source, Dialect::Cfn).unwrap_err();
        assert!(
            matches!(err, ParseError::InvalidFunction { .. }),
            "{case}: {err:?}"
        );
    }
}

#[test]
fn structural_errors_are_malformed() {
    let err = parse_template(r#"{ "Parameters": {} }"#, Dialect::Cfn).unwrap_err();
    assert!(
        matches!(&err, ParseError::Malformed { message, .. } if message == "missing 'Resources' section")
    );

    let err = parse_template(r#"{ "Resources": { "R": { "Properties": {} } } }"#, Dialect::Cfn)
        .unwrap_err();
    let ParseError::Malformed { location, message } = err else {
        panic!("expected Malformed, got {err:?}");
    };
    assert_eq!(location.as_str(), "/Resources/R");
    assert_eq!(message, "resource has no 'Type'");

    let err = parse_template(r#"{ "Resources": [] }"#, Dialect::Cfn).unwrap_err();
    assert!(matches!(err, ParseError::Malformed { .. }));
}

#[test]
fn invalid_json_reports_position() {
    let err = parse_template("{\n  \"Resources\": {,\n}", Dialect::Cfn).unwrap_err();
    let ParseError::Syntax { line, column, .. } = err else {
        panic!("expected Syntax, got {err:?}");
    };
    assert_eq!(line, 2);
    assert!(column > 0);
}
