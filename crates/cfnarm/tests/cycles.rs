//! Tests for reference cycle detection.

use cfnarm::arm::TargetRef;
use cfnarm::interpreter::{AttributeRule, AttributeTable, ResourceCatalog};
use cfnarm::template::Resource;
use cfnarm::{
    Dialect, EvalError, Options, ResolutionContext, TranslatorRegistry, Value, parse_template,
};

/// A catalog whose `Test::Link` resources expose their own `Next` property
/// as an attribute, so attribute lookups can chain between resources.
struct Links {
    table: AttributeTable,
}

impl Links {
    fn new() -> Self {
        Self {
            table: AttributeTable::default().with("Next", AttributeRule::Property("Next")),
        }
    }
}

impl ResourceCatalog for Links {
    fn attribute_table(&self, resource_type: &str) -> Option<&AttributeTable> {
        (resource_type == "Test::Link").then_some(&self.table)
    }

    fn primary_target(&self, _resource: &Resource) -> Option<TargetRef> {
        None
    }
}

const RING: &str = r#"{
    "Resources": {
        "A": { "Type": "Test::Link", "Properties": { "Next": { "Fn::GetAtt": ["B", "Next"] } } },
        "B": { "Type": "Test::Link", "Properties": { "Next": { "Fn::GetAtt": ["C", "Next"] } } },
        "C": { "Type": "Test::Link", "Properties": { "Next": { "Fn::GetAtt": ["A", "Next"] } } },
        "Reader": { "Type": "Test::Link", "Properties": { "Value": { "Fn::GetAtt": ["B", "Next"] } } },
        "End": { "Type": "Test::Link", "Properties": { "Next": "done" } },
        "Chain": { "Type": "Test::Link", "Properties": { "Next": { "Fn::GetAtt": ["End", "Next"] } } }
    }
}"#;

fn chain(err: EvalError) -> Vec<String> {
    match err {
        EvalError::CyclicReference { chain } => chain,
        other => panic!("expected CyclicReference, got {other:?}"),
    }
}

#[test]
fn attribute_chain_back_to_resource_is_a_cycle() {
    let template = parse_template(RING, Dialect::Cfn).unwrap();
    let catalog = Links::new();
    let options = Options::default();
    let ctx = ResolutionContext::new(&template, &catalog, &options);

    let err = ctx
        .resource_property(template.resource("A").unwrap(), "Next")
        .unwrap_err();
    assert_eq!(
        chain(err),
        vec!["resource:A", "resource:B", "resource:C", "resource:A"]
    );
}

#[test]
fn cycle_is_reported_whichever_resource_is_evaluated_first() {
    let template = parse_template(RING, Dialect::Cfn).unwrap();
    let catalog = Links::new();
    let options = Options::default();

    for start in ["A", "B", "C"] {
        let ctx = ResolutionContext::new(&template, &catalog, &options);
        let err = ctx
            .resource_property(template.resource(start).unwrap(), "Next")
            .unwrap_err();
        let chain = chain(err);
        assert_eq!(chain.first(), chain.last());
        assert_eq!(chain.len(), 4);
    }
}

#[test]
fn resource_outside_the_ring_still_fails() {
    let template = parse_template(RING, Dialect::Cfn).unwrap();
    let catalog = Links::new();
    let options = Options::default();
    let ctx = ResolutionContext::new(&template, &catalog, &options);

    let err = ctx
        .resource_property(template.resource("Reader").unwrap(), "Value")
        .unwrap_err();
    assert_eq!(
        chain(err),
        vec!["resource:B", "resource:C", "resource:A", "resource:B"]
    );
}

#[test]
fn memoized_results_do_not_hide_cycles() {
    let source = r#"{
        "Resources": {
            "A": { "Type": "Test::Link", "Properties": { "Next": { "Fn::GetAtt": ["B", "Next"] } } },
            "B": { "Type": "Test::Link", "Properties": { "Next": "leaf", "Back": { "Fn::GetAtt": ["A", "Next"] } } }
        }
    }"#;
    let template = parse_template(source, Dialect::Cfn).unwrap();
    let catalog = Links::new();
    let options = Options::default();
    let ctx = ResolutionContext::new(&template, &catalog, &options);

    // A.Next resolves through B and is memoized.
    let a = template.resource("A").unwrap();
    assert_eq!(
        ctx.resource_property(a, "Next").unwrap().unwrap(),
        Value::from("leaf")
    );

    // Reading it back from inside B would have entered B again.
    let b = template.resource("B").unwrap();
    let err = ctx.resource_property(b, "Back").unwrap_err();
    assert!(chain(err).contains(&"resource:B".to_string()));
}

#[test]
fn acyclic_chain_resolves() {
    let template = parse_template(RING, Dialect::Cfn).unwrap();
    let catalog = Links::new();
    let options = Options::default();
    let ctx = ResolutionContext::new(&template, &catalog, &options);

    let value = ctx
        .resource_property(template.resource("Chain").unwrap(), "Next")
        .unwrap();
    assert_eq!(value, Some(Value::from("done")));
}

#[test]
fn self_reference_is_a_cycle() {
    let source = r#"{
        "Resources": {
            "Web": {
                "Type": "AWS::EC2::SecurityGroup",
                "Properties": { "GroupDescription": { "Fn::Join": ["-", [{ "Ref": "Web" }, "sg"]] } }
            }
        }
    }"#;
    let template = parse_template(source, Dialect::Cfn).unwrap();
    let registry = TranslatorRegistry::with_builtins();
    let options = Options::default();
    let ctx = ResolutionContext::new(&template, &registry, &options);

    let err = ctx
        .resource_property(template.resource("Web").unwrap(), "GroupDescription")
        .unwrap_err();
    assert_eq!(chain(err), vec!["resource:Web", "resource:Web"]);
}
