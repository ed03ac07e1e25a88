//! Built-in resource translators.
//!
//! Each module registers the source resource types it handles together with
//! their attribute tables and primary target resources.

pub mod compute;
mod instance;
mod network;
mod scaling;
mod storage;

use serde_json::{Value as Json, json};

use crate::arm::{self, TargetRef};
use crate::interpreter::ResolutionContext;
use crate::template::{Node, Resource};
use crate::translate::{TranslateError, TranslatorRegistry, depends_on};
use crate::types::Value;

pub const EC2_INSTANCE: &str = "AWS::EC2::Instance";
pub const NOVA_SERVER: &str = "OS::Nova::Server";
pub const EC2_VOLUME: &str = "AWS::EC2::Volume";
pub const CINDER_VOLUME: &str = "OS::Cinder::Volume";
pub const EC2_VOLUME_ATTACHMENT: &str = "AWS::EC2::VolumeAttachment";
pub const CINDER_VOLUME_ATTACHMENT: &str = "OS::Cinder::VolumeAttachment";
pub const EC2_NETWORK_INTERFACE: &str = "AWS::EC2::NetworkInterface";
pub const NEUTRON_PORT: &str = "OS::Neutron::Port";
pub const EC2_EIP: &str = "AWS::EC2::EIP";
pub const EC2_EIP_ASSOCIATION: &str = "AWS::EC2::EIPAssociation";
pub const EC2_SECURITY_GROUP: &str = "AWS::EC2::SecurityGroup";
pub const AUTOSCALING_GROUP: &str = "AWS::AutoScaling::AutoScalingGroup";

pub(crate) const INSTANCE_TYPES: &[&str] = &[EC2_INSTANCE, NOVA_SERVER];
pub(crate) const VOLUME_TYPES: &[&str] = &[EC2_VOLUME, CINDER_VOLUME];
pub(crate) const NETWORK_INTERFACE_TYPES: &[&str] = &[EC2_NETWORK_INTERFACE, NEUTRON_PORT];

/// Register every built-in translator.
pub fn register_builtins(registry: &mut TranslatorRegistry) {
    instance::register(registry);
    storage::register(registry);
    network::register(registry);
    scaling::register(registry);
}

/// A target resource entry placed at the shared location.
pub(crate) fn entry(
    target: &TargetRef,
    ctx: &ResolutionContext<'_>,
    dependencies: &[TargetRef],
    properties: Json,
) -> Json {
    json!({
        "type": &target.resource_type,
        "name": target.name_field(),
        "apiVersion": ctx.options().api_version(),
        "location": arm::wrap(&arm::variables("location")),
        "dependsOn": depends_on(dependencies),
        "properties": properties,
    })
}

/// `{"id": "[resourceId(...)]"}`
pub(crate) fn id_ref(target: &TargetRef) -> Json {
    json!({ "id": arm::wrap(&target.id()) })
}

/// The declared resource a node refers to, if it is a reference to one of
/// the given types.
pub(crate) fn referenced_resource<'a>(
    ctx: &ResolutionContext<'a>,
    node: &Node,
    resource_types: &[&str],
) -> Option<&'a Resource> {
    node.referenced_names()
        .into_iter()
        .find_map(|name| ctx.template().resource(name))
        .filter(|resource| resource.is_any_of(resource_types))
}

/// The resource a required reference property points at.
///
/// # Errors
///
/// Returns `InvalidProperty` if the property is missing or does not refer to
/// a resource of one of the given types.
pub(crate) fn required_reference<'a>(
    ctx: &ResolutionContext<'a>,
    resource: &Resource,
    key: &str,
    resource_types: &[&str],
) -> Result<&'a Resource, TranslateError> {
    let node = resource
        .property(key)
        .ok_or_else(|| TranslateError::invalid_property(&resource.name, key, "is required"))?;
    referenced_resource(ctx, node, resource_types).ok_or_else(|| {
        TranslateError::invalid_property(
            &resource.name,
            key,
            format!("must refer to a resource of type {}", resource_types.join(" or ")),
        )
    })
}

/// Evaluate a property that must be present.
///
/// # Errors
///
/// Returns `InvalidProperty` if the property is missing, or the evaluation
/// error.
pub(crate) fn required_property(
    ctx: &ResolutionContext<'_>,
    resource: &Resource,
    key: &str,
) -> Result<Value, TranslateError> {
    ctx.resource_property(resource, key)?
        .ok_or_else(|| TranslateError::invalid_property(&resource.name, key, "is required"))
}

/// Append targets not already present.
pub(crate) fn extend_unique(targets: &mut Vec<TargetRef>, more: impl IntoIterator<Item = TargetRef>) {
    for target in more {
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
}

/// Standard parameter declaration with a description.
pub(crate) fn parameter(param_type: &str, description: String) -> Json {
    json!({
        "type": param_type,
        "metadata": { "description": description },
    })
}
