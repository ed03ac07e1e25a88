//! Tests for fragment merging and document finalization.

use cfnarm::arm::{TargetRef, types};
use cfnarm::translate::{OutputAssembler, Section, depends_on};
use cfnarm::{Fragment, TranslateError};
use serde_json::{Value as Json, json};

fn nic(name: &str) -> TargetRef {
    TargetRef::variable(types::NETWORK_INTERFACES, &format!("nicName_{name}"))
}

fn nic_fragment(source: &str, name: &str, dependencies: &[TargetRef]) -> Fragment {
    let target = nic(name);
    let mut fragment = Fragment::new(source);
    fragment
        .variables
        .insert(format!("nicName_{name}"), Json::from(name));
    fragment.resources.push(json!({
        "type": &target.resource_type,
        "name": target.name_field(),
        "dependsOn": depends_on(dependencies),
        "properties": {},
    }));
    fragment
}

#[test]
fn merge_accumulates_fragments() {
    let mut assembler = OutputAssembler::new();
    assembler.merge(nic_fragment("web1", "web1", &[])).unwrap();
    assembler
        .merge(nic_fragment("web2", "web2", &[nic("web1")]))
        .unwrap();
    assert_eq!(assembler.resource_count(), 2);

    let document = assembler.finalize().unwrap();
    assert_eq!(document.variables.len(), 2);
    assert!(
        document
            .resource(types::NETWORK_INTERFACES, "[variables('nicName_web1')]")
            .is_some()
    );
    assert_eq!(
        document.resources[1]["dependsOn"],
        json!(["[concat('Microsoft.Network/networkInterfaces/', variables('nicName_web1'))]"])
    );
}

#[test]
fn duplicate_variable_is_a_collision_at_merge() {
    let mut assembler = OutputAssembler::new();
    assembler
        .merge(nic_fragment("first", "VM_web1", &[]))
        .unwrap();

    let mut second = Fragment::new("second");
    second
        .variables
        .insert("nicName_VM_web1".to_string(), Json::from("other"));
    let err = assembler.merge(second).unwrap_err();
    assert!(matches!(
        err,
        TranslateError::NameCollision { section: Section::Variables, ref key, ref resource }
            if key == "nicName_VM_web1" && resource == "second"
    ));

    // The failed merge left nothing behind.
    assert_eq!(assembler.resource_count(), 1);
    let document = assembler.finalize().unwrap();
    assert_eq!(document.variables["nicName_VM_web1"], "VM_web1");
}

#[test]
fn duplicate_resource_entry_is_a_collision() {
    let mut assembler = OutputAssembler::new();
    assembler.merge(nic_fragment("a", "web", &[])).unwrap();

    let mut clash = nic_fragment("b", "web", &[]);
    clash.variables.clear();
    let err = assembler.merge(clash).unwrap_err();
    assert!(matches!(
        err,
        TranslateError::NameCollision {
            section: Section::Resources,
            ..
        }
    ));
}

#[test]
fn collisions_are_checked_per_section() {
    let mut assembler = OutputAssembler::new();
    let mut parameters = Fragment::new("a");
    parameters
        .parameters
        .insert("size".to_string(), json!({ "type": "string" }));
    assembler.merge(parameters).unwrap();

    // The same key in another section is fine.
    let mut variables = Fragment::new("b");
    variables.variables.insert("size".to_string(), json!(1));
    assembler.merge(variables).unwrap();

    let mut outputs = Fragment::new("c");
    outputs
        .outputs
        .insert("size".to_string(), json!({ "type": "int", "value": 1 }));
    assembler.merge(outputs).unwrap();

    let mut again = Fragment::new("d");
    again
        .parameters
        .insert("size".to_string(), json!({ "type": "int" }));
    assert!(matches!(
        assembler.merge(again).unwrap_err(),
        TranslateError::NameCollision {
            section: Section::Parameters,
            ..
        }
    ));
}

#[test]
fn dependency_on_missing_resource_is_dangling() {
    let mut assembler = OutputAssembler::new();
    assembler
        .merge(nic_fragment("web", "web", &[nic("ghost")]))
        .unwrap();

    let err = assembler.finalize().unwrap_err();
    let TranslateError::DanglingDependency {
        resource,
        dependency,
    } = err
    else {
        panic!("expected DanglingDependency, got {err:?}");
    };
    assert_eq!(resource, "web");
    assert_eq!(
        dependency,
        "[concat('Microsoft.Network/networkInterfaces/', variables('nicName_ghost'))]"
    );
}

#[test]
fn dependency_whose_name_variable_is_missing_is_dangling() {
    let mut assembler = OutputAssembler::new();
    let mut orphan = nic_fragment("orphan", "orphan", &[]);
    orphan.variables.clear();
    assembler.merge(orphan).unwrap();
    assembler
        .merge(nic_fragment("web", "web", &[nic("orphan")]))
        .unwrap();

    assert!(matches!(
        assembler.finalize().unwrap_err(),
        TranslateError::DanglingDependency { resource, .. } if resource == "web"
    ));
}

#[test]
fn unparseable_dependency_is_dangling() {
    let mut assembler = OutputAssembler::new();
    let mut fragment = Fragment::new("web");
    fragment.resources.push(json!({
        "type": types::PUBLIC_IP_ADDRESSES,
        "name": "ip",
        "dependsOn": ["[nonsense("],
    }));
    assembler.merge(fragment).unwrap();
    assert!(matches!(
        assembler.finalize().unwrap_err(),
        TranslateError::DanglingDependency { dependency, .. } if dependency == "[nonsense("
    ));
}

#[test]
fn literal_names_resolve_in_plain_form() {
    let mut assembler = OutputAssembler::new();
    let mut ip = Fragment::new("ip");
    ip.resources.push(json!({
        "type": types::PUBLIC_IP_ADDRESSES,
        "name": "frontend",
        "properties": {},
    }));
    assembler.merge(ip).unwrap();

    let mut user = Fragment::new("user");
    user.resources.push(json!({
        "type": types::NETWORK_INTERFACES,
        "name": "nic",
        "dependsOn": ["Microsoft.Network/publicIPAddresses/frontend"],
    }));
    assembler.merge(user).unwrap();
    assert!(assembler.finalize().is_ok());
}

#[test]
fn document_serializes_in_arm_order() {
    let mut assembler = OutputAssembler::new();
    assembler.merge(nic_fragment("web", "web", &[])).unwrap();
    let document = assembler.finalize().unwrap();

    let json = document.to_json();
    let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["$schema", "contentVersion", "parameters", "variables", "resources", "outputs"]
    );
    assert_eq!(json["contentVersion"], "1.0.0.0");
    assert_eq!(serde_json::to_value(&document).unwrap(), json);

    let text = document.to_json_pretty();
    assert!(text.starts_with("{\n  \"$schema\""));
}
