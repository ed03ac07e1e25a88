//! Compute instances (`AWS::EC2::Instance`, `OS::Nova::Server`).
//!
//! An instance becomes a virtual machine. When no network interface resource
//! is attached, the translator also synthesizes a virtual network and a
//! network interface for it, with parameters for their names and address
//! space. Attached volumes become data disks, and user data becomes the
//! machine's base64 custom data.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value as Json, json};

use super::compute::{self, ImageReference};
use super::network::{nic_target, public_ip_target, security_group_target};
use super::{
    CINDER_VOLUME_ATTACHMENT, EC2_EIP, EC2_EIP_ASSOCIATION, EC2_INSTANCE, EC2_SECURITY_GROUP,
    EC2_VOLUME_ATTACHMENT, NETWORK_INTERFACE_TYPES, NOVA_SERVER, VOLUME_TYPES, entry,
    extend_unique, id_ref, parameter, referenced_resource, required_reference,
};
use crate::arm::{self, TargetRef, types};
use crate::interpreter::{AttributeRule, AttributeTable, ResolutionContext};
use crate::template::{Node, Resource};
use crate::translate::{
    Entries, Registration, TranslateError, Translator, TranslatorRegistry, prelude,
};
use crate::types::Value;

/// Where the properties an instance translation reads live in each dialect.
#[derive(Debug)]
struct InstanceProfile {
    flavor: &'static str,
    image: &'static str,
    user_data: &'static str,
    security_groups: &'static str,
    networks: &'static str,
    /// Key inside each `networks` item that names a network interface.
    network_port: &'static str,
    attachment_types: &'static [&'static str],
    attachment_instance: &'static str,
    attachment_volume: &'static str,
}

static EC2: InstanceProfile = InstanceProfile {
    flavor: "InstanceType",
    image: "ImageId",
    user_data: "UserData",
    security_groups: "SecurityGroups",
    networks: "NetworkInterfaces",
    network_port: "NetworkInterfaceId",
    attachment_types: &[EC2_VOLUME_ATTACHMENT],
    attachment_instance: "InstanceId",
    attachment_volume: "VolumeId",
};

static NOVA: InstanceProfile = InstanceProfile {
    flavor: "flavor",
    image: "image",
    user_data: "user_data",
    security_groups: "security_groups",
    networks: "networks",
    network_port: "port",
    attachment_types: &[CINDER_VOLUME_ATTACHMENT],
    attachment_instance: "instance_uuid",
    attachment_volume: "volume_id",
};

pub(crate) fn register(registry: &mut TranslatorRegistry) {
    registry.register(
        EC2_INSTANCE,
        Registration::new(ec2_instance)
            .with_attributes(attribute_table(ec2_private_ip))
            .with_target(vm_target),
    );
    registry.register(
        NOVA_SERVER,
        Registration::new(nova_server)
            .with_attributes(
                attribute_table(nova_private_ip)
                    .with("first_address", AttributeRule::Resolve(nova_private_ip))
                    .with("name", AttributeRule::Expression(vm_name)),
            )
            .with_target(vm_target),
    );
}

fn ec2_instance(resource: &Resource) -> Box<dyn Translator + '_> {
    Box::new(InstanceTranslator::new(resource, &EC2))
}

fn nova_server(resource: &Resource) -> Box<dyn Translator + '_> {
    Box::new(InstanceTranslator::new(resource, &NOVA))
}

fn vm_name(name: &str) -> String {
    arm::variables(&format!("vmName_{name}"))
}

fn vm_target(name: &str) -> TargetRef {
    TargetRef::variable(types::VIRTUAL_MACHINES, &format!("vmName_{name}"))
}

fn default_nic_target(name: &str) -> TargetRef {
    TargetRef::variable(types::NETWORK_INTERFACES, &format!("nicName_VM_{name}"))
}

fn default_vnet_target(name: &str) -> TargetRef {
    TargetRef::parameter(types::VIRTUAL_NETWORKS, &format!("virtualNetworkName_VM_{name}"))
}

/// Network interface resources listed in an instance's networks, in order.
fn attached_nics<'c>(
    resource: &Resource,
    profile: &InstanceProfile,
    ctx: &ResolutionContext<'c>,
) -> Vec<&'c Resource> {
    let Some(networks) = resource.property(profile.networks) else {
        return Vec::new();
    };
    let items: Vec<_> = match networks {
        Node::List(items) => items.iter().collect(),
        other => vec![other],
    };
    let mut found: Vec<&'c Resource> = Vec::new();
    for item in items {
        let node = item.get(profile.network_port).unwrap_or(item);
        if let Some(nic) = referenced_resource(ctx, node, NETWORK_INTERFACE_TYPES) {
            if !found.iter().any(|r| r.name == nic.name) {
                found.push(nic);
            }
        }
    }
    found
}

/// Address of the instance's first network interface, attached or
/// synthesized.
fn private_ip(
    resource: &Resource,
    ctx: &ResolutionContext<'_>,
    profile: &InstanceProfile,
) -> String {
    let nic = attached_nics(resource, profile, ctx)
        .first()
        .map_or_else(|| default_nic_target(&resource.name), |nic| nic_target(&nic.name));
    format!(
        "{}.ipConfigurations[0].properties.privateIPAddress",
        arm::reference(&nic.id())
    )
}

fn ec2_private_ip(resource: &Resource, ctx: &ResolutionContext<'_>) -> String {
    private_ip(resource, ctx, &EC2)
}

fn nova_private_ip(resource: &Resource, ctx: &ResolutionContext<'_>) -> String {
    private_ip(resource, ctx, &NOVA)
}

fn computer_name(name: &str) -> String {
    format!(
        "{}.osProfile.computerName",
        arm::reference(&vm_target(name).id())
    )
}

fn attribute_table(
    address: fn(&Resource, &ResolutionContext<'_>) -> String,
) -> AttributeTable {
    AttributeTable::new(AttributeRule::Expression(|name| vm_target(name).id()))
        .with(
            "AvailabilityZone",
            AttributeRule::Expression(|_| arm::variables("location")),
        )
        .with("PrivateIp", AttributeRule::Resolve(address))
        .with("PrivateDnsName", AttributeRule::Expression(computer_name))
        .with("PublicDnsName", AttributeRule::Expression(computer_name))
}

struct InstanceTranslator<'a> {
    resource: &'a Resource,
    profile: &'static InstanceProfile,
}

impl<'a> InstanceTranslator<'a> {
    fn new(resource: &'a Resource, profile: &'static InstanceProfile) -> Self {
        Self { resource, profile }
    }

    fn name(&self) -> &str {
        &self.resource.name
    }

    fn key(&self, purpose: &str) -> String {
        format!("{purpose}_{}", self.name())
    }

    /// Network interface resources listed in the instance's networks.
    fn network_interfaces<'c>(&self, ctx: &ResolutionContext<'c>) -> Vec<&'c Resource> {
        attached_nics(self.resource, self.profile, ctx)
    }

    /// Volume attachments naming this instance, with their volumes.
    fn volumes<'c>(&self, ctx: &ResolutionContext<'c>) -> Result<Vec<&'c Resource>, TranslateError> {
        ctx.resources_referencing(
            self.profile.attachment_types,
            self.profile.attachment_instance,
            self.name(),
        )
        .into_iter()
        .map(|attachment| {
            required_reference(ctx, attachment, self.profile.attachment_volume, VOLUME_TYPES)
        })
        .collect()
    }

    /// The elastic IP attached to this instance, directly or through an
    /// association.
    fn public_ip(&self, ctx: &ResolutionContext<'_>) -> Option<TargetRef> {
        let direct = ctx
            .resources_referencing(&[EC2_EIP], "InstanceId", self.name())
            .into_iter()
            .next();
        let associated = || {
            ctx.resources_referencing(&[EC2_EIP_ASSOCIATION], "InstanceId", self.name())
                .into_iter()
                .find_map(|association| {
                    ["EIP", "AllocationId"].iter().find_map(|key| {
                        association
                            .property(key)
                            .and_then(|node| referenced_resource(ctx, node, &[EC2_EIP]))
                    })
                })
        };
        direct
            .or_else(associated)
            .map(|eip| public_ip_target(&eip.name))
    }

    /// The network security group named first in the instance's groups.
    fn security_group(&self, ctx: &ResolutionContext<'_>) -> Option<TargetRef> {
        let groups = self.resource.property(self.profile.security_groups)?;
        referenced_resource(ctx, groups, &[EC2_SECURITY_GROUP])
            .map(|group| security_group_target(&group.name))
    }

    fn image(&self, ctx: &ResolutionContext<'_>) -> Result<ImageReference, TranslateError> {
        let Some(node) = self.resource.property(self.profile.image) else {
            return Ok(compute::UBUNTU);
        };
        // Region-keyed mapping lookups have no translation-time value.
        if node.as_str().is_none() && node.ref_target().is_none() {
            log::warn!(
                "image of '{}' is computed at deployment, using Ubuntu",
                self.name()
            );
            return Ok(compute::UBUNTU);
        }
        let image = ctx.resource_property(self.resource, self.profile.image)?;
        Ok(image
            .and_then(|v| v.to_text())
            .map_or(compute::UBUNTU, |text| compute::image_reference(&text)))
    }

    fn vm_size(&self, ctx: &ResolutionContext<'_>) -> Result<&'static str, TranslateError> {
        let flavor = ctx.resource_property(self.resource, self.profile.flavor)?;
        Ok(flavor
            .and_then(|v| v.to_text())
            .map_or(compute::DEFAULT_VM_SIZE, |text| compute::vm_size(&text)))
    }

    /// Base64 custom data from the user data property.
    fn custom_data(&self, ctx: &ResolutionContext<'_>) -> Result<Option<Json>, TranslateError> {
        let Some(node) = self.resource.property(self.profile.user_data) else {
            return Ok(None);
        };
        let value = ctx
            .resource_property(self.resource, self.profile.user_data)?
            .unwrap_or(Value::Null);
        if node.is_base64() {
            return Ok(Some(value.to_json()));
        }
        let encoded = match value {
            Value::Null => return Ok(None),
            Value::Expr(body) => Value::expr(arm::base64(&body)),
            Value::List(_) | Value::Map(_) => {
                Value::String(STANDARD.encode(value.to_json().to_string()))
            }
            scalar => Value::String(STANDARD.encode(scalar.to_string())),
        };
        Ok(Some(encoded.to_json()))
    }

    fn data_disks(&self, ctx: &ResolutionContext<'_>) -> Result<Vec<Json>, TranslateError> {
        Ok(self
            .volumes(ctx)?
            .iter()
            .enumerate()
            .map(|(lun, volume)| {
                let disk_name = arm::variables(&format!("dataDiskName_{}", volume.name));
                json!({
                    "name": arm::wrap(&disk_name),
                    "diskSizeGB": arm::wrap(&arm::variables(&format!("dataDiskSize_{}", volume.name))),
                    "lun": lun,
                    "vhd": { "uri": arm::wrap(&prelude::vhd_uri(&[disk_name])) },
                    "createOption": "Empty",
                })
            })
            .collect())
    }

    fn os_profile(&self, ctx: &ResolutionContext<'_>) -> Result<Json, TranslateError> {
        let mut profile = Map::new();
        profile.insert(
            "computerName".to_string(),
            Json::from(arm::wrap(&arm::variables(&self.key("vmName")))),
        );
        profile.insert(
            "adminUsername".to_string(),
            Json::from(arm::wrap(&arm::parameters(&self.key("adminUsername_VM")))),
        );
        profile.insert(
            "adminPassword".to_string(),
            Json::from(arm::wrap(&arm::parameters(&self.key("adminPassword_VM")))),
        );
        if let Some(custom_data) = self.custom_data(ctx)? {
            profile.insert("customData".to_string(), custom_data);
        }
        Ok(Json::Object(profile))
    }

    fn virtual_machine(
        &self,
        ctx: &ResolutionContext<'_>,
        nics: &[TargetRef],
    ) -> Result<Json, TranslateError> {
        let mut storage = json!({
            "imageReference": {
                "publisher": arm::wrap(&arm::variables(&self.key("imgPublisher"))),
                "offer": arm::wrap(&arm::variables(&self.key("imgOffer"))),
                "sku": arm::wrap(&arm::variables(&self.key("imgSku"))),
                "version": "latest",
            },
            "osDisk": {
                "name": "osdisk",
                "vhd": {
                    "uri": arm::wrap(&prelude::vhd_uri(&[
                        arm::variables(&self.key("vmName")),
                        arm::quote("_root"),
                    ])),
                },
                "caching": "ReadWrite",
                "createOption": "FromImage",
            },
        });
        let data_disks = self.data_disks(ctx)?;
        if !data_disks.is_empty() {
            storage["dataDisks"] = Json::Array(data_disks);
        }

        let properties = json!({
            "hardwareProfile": { "vmSize": arm::wrap(&arm::variables(&self.key("vmSize"))) },
            "osProfile": self.os_profile(ctx)?,
            "storageProfile": storage,
            "networkProfile": {
                "networkInterfaces": nics.iter().map(id_ref).collect::<Vec<_>>(),
            },
        });

        let mut dependencies = vec![prelude::storage_account()];
        extend_unique(&mut dependencies, nics.iter().cloned());
        if self.network_interfaces(ctx).is_empty() {
            extend_unique(&mut dependencies, [default_vnet_target(self.name())]);
        }
        extend_unique(&mut dependencies, self.dependencies(ctx)?);
        Ok(entry(&vm_target(self.name()), ctx, &dependencies, properties))
    }

    fn default_network(&self, ctx: &ResolutionContext<'_>) -> Vec<Json> {
        let name = self.name();
        let vnet = default_vnet_target(name);
        let prefix = arm::wrap(&arm::parameters(&format!("subnetAddressPrefix_VM_{name}")));
        let vnet_entry = entry(
            &vnet,
            ctx,
            &[],
            json!({
                "addressSpace": { "addressPrefixes": [&prefix] },
                "subnets": [{
                    "name": arm::wrap(&arm::parameters(&format!("subnetName_VM_{name}"))),
                    "properties": { "addressPrefix": &prefix },
                }],
            }),
        );

        let mut ip_config = json!({
            "subnet": { "id": arm::wrap(&arm::variables(&format!("subnet_VM_{name}_ref"))) },
            "privateIPAllocationMethod": "Dynamic",
        });
        let mut nic_properties = Map::new();
        let mut nic_dependencies = vec![vnet];
        if let Some(public_ip) = self.public_ip(ctx) {
            ip_config["publicIPAddress"] = id_ref(&public_ip);
            nic_dependencies.push(public_ip);
        }
        nic_properties.insert(
            "ipConfigurations".to_string(),
            json!([{ "name": format!("ipConfig_nic_VM_{name}"), "properties": ip_config }]),
        );
        if let Some(group) = self.security_group(ctx) {
            nic_properties.insert("networkSecurityGroup".to_string(), id_ref(&group));
            nic_dependencies.push(group);
        }
        let nic_entry = entry(
            &default_nic_target(name),
            ctx,
            &nic_dependencies,
            Json::Object(nic_properties),
        );
        vec![vnet_entry, nic_entry]
    }
}

impl Translator for InstanceTranslator<'_> {
    fn resource(&self) -> &Resource {
        self.resource
    }

    fn parameters(&self, ctx: &ResolutionContext<'_>) -> Result<Entries, TranslateError> {
        let name = self.name();
        let mut parameters = Entries::new();
        parameters.insert(
            self.key("adminUsername_VM"),
            parameter("string", format!("User name for virtual machine '{name}'.")),
        );
        parameters.insert(
            self.key("adminPassword_VM"),
            parameter("securestring", format!("Password for virtual machine '{name}'.")),
        );
        if self.network_interfaces(ctx).is_empty() {
            parameters.insert(
                self.key("virtualNetworkName_VM"),
                parameter(
                    "string",
                    format!("Name of the virtual network created for virtual machine '{name}'."),
                ),
            );
            parameters.insert(
                self.key("subnetName_VM"),
                parameter(
                    "string",
                    format!("Name of the subnet virtual machine '{name}' is placed in."),
                ),
            );
            parameters.insert(
                self.key("subnetAddressPrefix_VM"),
                parameter(
                    "string",
                    format!("Address prefix of the subnet of virtual machine '{name}'."),
                ),
            );
        }
        Ok(parameters)
    }

    fn variables(&self, ctx: &ResolutionContext<'_>) -> Result<Entries, TranslateError> {
        let name = self.name();
        let image = self.image(ctx)?;
        let mut variables = Entries::new();
        variables.insert(self.key("vmName"), Json::from(name));
        variables.insert(self.key("vmSize"), Json::from(self.vm_size(ctx)?));
        variables.insert(self.key("imgPublisher"), Json::from(image.publisher));
        variables.insert(self.key("imgOffer"), Json::from(image.offer));
        variables.insert(self.key("imgSku"), Json::from(image.sku));
        if self.network_interfaces(ctx).is_empty() {
            variables.insert(self.key("nicName_VM"), Json::from(format!("nic_VM_{name}")));
            let vnet_ref = format!("virtualNetwork_VM_{name}_ref");
            variables.insert(
                vnet_ref.clone(),
                Json::from(arm::wrap(&default_vnet_target(name).id())),
            );
            variables.insert(
                format!("subnet_VM_{name}_ref"),
                Json::from(arm::wrap(&arm::concat(&[
                    arm::variables(&vnet_ref),
                    arm::quote("/subnets/"),
                    arm::parameters(&format!("subnetName_VM_{name}")),
                ]))),
            );
        }
        Ok(variables)
    }

    fn resource_entries(&self, ctx: &ResolutionContext<'_>) -> Result<Vec<Json>, TranslateError> {
        let attached: Vec<TargetRef> = self
            .network_interfaces(ctx)
            .iter()
            .map(|nic| nic_target(&nic.name))
            .collect();
        if !attached.is_empty() {
            return Ok(vec![self.virtual_machine(ctx, &attached)?]);
        }
        let mut entries = vec![self.virtual_machine(ctx, &[default_nic_target(self.name())])?];
        entries.extend(self.default_network(ctx));
        Ok(entries)
    }

    fn needs_storage_account(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_attributes_are_expressions() {
        let table = attribute_table(ec2_private_ip);
        let AttributeRule::Expression(build) = table.reference() else {
            panic!("expected an expression");
        };
        assert_eq!(
            build("web"),
            "resourceId('Microsoft.Compute/virtualMachines', variables('vmName_web'))"
        );
        assert!(table.get("PrivateIp").is_some());
        assert!(table.get("first_address").is_none());
    }

    #[test]
    fn default_targets_use_derived_keys() {
        assert_eq!(
            default_nic_target("web").depends_on(),
            "[concat('Microsoft.Network/networkInterfaces/', variables('nicName_VM_web'))]"
        );
        assert_eq!(
            default_vnet_target("web").name_field(),
            "[parameters('virtualNetworkName_VM_web')]"
        );
    }
}
