//! Network interfaces, public addresses and security groups.

use serde_json::{Map, Value as Json, json};

use super::storage::{AttachmentTranslator, Link};
use super::{
    EC2_EIP, EC2_EIP_ASSOCIATION, EC2_NETWORK_INTERFACE, EC2_SECURITY_GROUP, INSTANCE_TYPES,
    NEUTRON_PORT, entry, extend_unique, id_ref, parameter, referenced_resource,
};
use crate::arm::{self, TargetRef, types};
use crate::interpreter::{AttributeRule, AttributeTable, ResolutionContext};
use crate::template::Resource;
use crate::translate::{Entries, Registration, TranslateError, Translator, TranslatorRegistry};
use crate::types::Value;

pub(crate) fn nic_target(name: &str) -> TargetRef {
    TargetRef::variable(types::NETWORK_INTERFACES, &format!("nicName_{name}"))
}

pub(crate) fn public_ip_target(name: &str) -> TargetRef {
    TargetRef::variable(types::PUBLIC_IP_ADDRESSES, &format!("publicIPName_{name}"))
}

pub(crate) fn security_group_target(name: &str) -> TargetRef {
    TargetRef::variable(types::NETWORK_SECURITY_GROUPS, &format!("nsgName_{name}"))
}

static EIP_ASSOCIATION_LINKS: [Link; 3] = [
    Link::optional("InstanceId", INSTANCE_TYPES),
    Link::optional("EIP", &[EC2_EIP]),
    Link::optional("AllocationId", &[EC2_EIP]),
];

pub(crate) fn register(registry: &mut TranslatorRegistry) {
    let nic_attributes = AttributeTable::new(AttributeRule::Expression(|name| nic_target(name).id()))
        .with("PrimaryPrivateIpAddress", AttributeRule::Expression(nic_private_ip));
    registry.register(
        EC2_NETWORK_INTERFACE,
        Registration::new(ec2_network_interface)
            .with_attributes(nic_attributes.clone())
            .with_target(nic_target),
    );
    registry.register(
        NEUTRON_PORT,
        Registration::new(neutron_port)
            .with_attributes(nic_attributes.with("fixed_ips", AttributeRule::Property("fixed_ips")))
            .with_target(nic_target),
    );

    registry.register(
        EC2_EIP,
        Registration::new(public_ip)
            .with_attributes(
                AttributeTable::new(AttributeRule::Expression(public_ip_address))
                    .with("AllocationId", AttributeRule::Expression(|name| public_ip_target(name).id())),
            )
            .with_target(public_ip_target),
    );
    registry.register(
        EC2_EIP_ASSOCIATION,
        Registration::new(eip_association),
    );

    registry.register(
        EC2_SECURITY_GROUP,
        Registration::new(security_group)
            .with_attributes(
                AttributeTable::new(AttributeRule::Expression(|name| {
                    security_group_target(name).id()
                }))
                .with(
                    "GroupId",
                    AttributeRule::Expression(|name| security_group_target(name).id()),
                ),
            )
            .with_target(security_group_target),
    );
}

fn nic_private_ip(name: &str) -> String {
    format!(
        "{}.ipConfigurations[0].properties.privateIPAddress",
        arm::reference(&nic_target(name).id())
    )
}

fn public_ip_address(name: &str) -> String {
    format!("{}.ipAddress", arm::reference(&public_ip_target(name).id()))
}

fn public_ip(resource: &Resource) -> Box<dyn Translator + '_> {
    Box::new(PublicIpTranslator { resource })
}

fn eip_association(resource: &Resource) -> Box<dyn Translator + '_> {
    Box::new(AttachmentTranslator {
        resource,
        links: &EIP_ASSOCIATION_LINKS,
    })
}

fn security_group(resource: &Resource) -> Box<dyn Translator + '_> {
    Box::new(SecurityGroupTranslator { resource })
}

fn ec2_network_interface(resource: &Resource) -> Box<dyn Translator + '_> {
    Box::new(NicTranslator {
        resource,
        kind: NicKind::Ec2,
    })
}

fn neutron_port(resource: &Resource) -> Box<dyn Translator + '_> {
    Box::new(NicTranslator {
        resource,
        kind: NicKind::Port,
    })
}

#[derive(Debug, Clone, Copy)]
enum NicKind {
    Ec2,
    Port,
}

struct NicTranslator<'a> {
    resource: &'a Resource,
    kind: NicKind,
}

impl NicTranslator<'_> {
    fn name(&self) -> &str {
        &self.resource.name
    }

    fn private_ip(&self, ctx: &ResolutionContext<'_>) -> Result<Option<Value>, TranslateError> {
        match self.kind {
            NicKind::Ec2 => Ok(ctx.resource_property(self.resource, "PrivateIpAddress")?),
            NicKind::Port => {
                let fixed_ips = ctx.resource_property(self.resource, "fixed_ips")?;
                Ok(match fixed_ips {
                    Some(Value::List(ips)) => ips.first().and_then(|ip| ip.get("ip_address")).cloned(),
                    _ => None,
                })
            }
        }
    }

    fn security_group(&self, ctx: &ResolutionContext<'_>) -> Option<TargetRef> {
        let key = match self.kind {
            NicKind::Ec2 => "GroupSet",
            NicKind::Port => "security_groups",
        };
        let groups = self.resource.property(key)?;
        referenced_resource(ctx, groups, &[EC2_SECURITY_GROUP])
            .map(|group| security_group_target(&group.name))
    }

    fn public_ip(&self, ctx: &ResolutionContext<'_>) -> Option<TargetRef> {
        ctx.resources_referencing(&[EC2_EIP], "NetworkInterfaceId", self.name())
            .first()
            .map(|eip| public_ip_target(&eip.name))
    }
}

impl Translator for NicTranslator<'_> {
    fn resource(&self) -> &Resource {
        self.resource
    }

    fn parameters(&self, _ctx: &ResolutionContext<'_>) -> Result<Entries, TranslateError> {
        let name = self.name();
        let mut parameters = Entries::new();
        parameters.insert(
            format!("subnetRef_NIC_{name}"),
            parameter(
                "string",
                format!("Resource ID of the subnet network interface '{name}' is placed in."),
            ),
        );
        Ok(parameters)
    }

    fn variables(&self, _ctx: &ResolutionContext<'_>) -> Result<Entries, TranslateError> {
        let mut variables = Entries::new();
        variables.insert(format!("nicName_{}", self.name()), Json::from(self.name()));
        Ok(variables)
    }

    fn resource_entries(&self, ctx: &ResolutionContext<'_>) -> Result<Vec<Json>, TranslateError> {
        let name = self.name();
        let mut ip_config = Map::new();
        match self.private_ip(ctx)? {
            Some(address) if address != Value::Null => {
                ip_config.insert("privateIPAllocationMethod".to_string(), Json::from("Static"));
                ip_config.insert("privateIPAddress".to_string(), address.to_json());
            }
            _ => {
                ip_config.insert("privateIPAllocationMethod".to_string(), Json::from("Dynamic"));
            }
        }
        ip_config.insert(
            "subnet".to_string(),
            json!({ "id": arm::wrap(&arm::parameters(&format!("subnetRef_NIC_{name}"))) }),
        );

        let mut dependencies = self.dependencies(ctx)?;
        if let Some(public_ip) = self.public_ip(ctx) {
            ip_config.insert("publicIPAddress".to_string(), id_ref(&public_ip));
            extend_unique(&mut dependencies, [public_ip]);
        }

        let mut properties = Map::new();
        properties.insert(
            "ipConfigurations".to_string(),
            json!([{ "name": format!("ipConfig_{name}"), "properties": ip_config }]),
        );
        if let Some(group) = self.security_group(ctx) {
            properties.insert("networkSecurityGroup".to_string(), id_ref(&group));
            extend_unique(&mut dependencies, [group]);
        }

        Ok(vec![entry(
            &nic_target(name),
            ctx,
            &dependencies,
            Json::Object(properties),
        )])
    }
}

struct PublicIpTranslator<'a> {
    resource: &'a Resource,
}

impl Translator for PublicIpTranslator<'_> {
    fn resource(&self) -> &Resource {
        self.resource
    }

    fn variables(&self, _ctx: &ResolutionContext<'_>) -> Result<Entries, TranslateError> {
        let name = &self.resource.name;
        let mut variables = Entries::new();
        variables.insert(format!("publicIPName_{name}"), Json::from(name.as_str()));
        Ok(variables)
    }

    /// The address is attached from the interface side, so it depends on
    /// nothing; depending on its instance would form a cycle.
    fn dependencies(&self, _ctx: &ResolutionContext<'_>) -> Result<Vec<TargetRef>, TranslateError> {
        Ok(Vec::new())
    }

    fn resource_entries(&self, ctx: &ResolutionContext<'_>) -> Result<Vec<Json>, TranslateError> {
        Ok(vec![entry(
            &public_ip_target(&self.resource.name),
            ctx,
            &self.dependencies(ctx)?,
            json!({ "publicIPAllocationMethod": "Static" }),
        )])
    }
}

struct SecurityGroupTranslator<'a> {
    resource: &'a Resource,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Inbound,
    Outbound,
}

impl SecurityGroupTranslator<'_> {
    fn rules(
        &self,
        ctx: &ResolutionContext<'_>,
        key: &str,
        direction: Direction,
    ) -> Result<Vec<Json>, TranslateError> {
        let rules = match ctx.resource_property(self.resource, key)? {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::List(rules)) => rules,
            Some(single @ Value::Map(_)) => vec![single],
            Some(other) => {
                return Err(TranslateError::invalid_property(
                    &self.resource.name,
                    key,
                    format!("must be a list of rules, found {}", other.kind()),
                ));
            }
        };

        rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                let Value::Map(_) = rule else {
                    return Err(TranslateError::invalid_property(
                        &self.resource.name,
                        key,
                        format!("rule {index} must be a map, found {}", rule.kind()),
                    ));
                };
                Ok(security_rule(rule, index, direction))
            })
            .collect()
    }
}

fn protocol(rule: &Value) -> &'static str {
    let protocol = rule
        .get("IpProtocol")
        .and_then(Value::to_text)
        .map(|p| p.to_ascii_lowercase());
    match protocol.as_deref() {
        Some("tcp" | "6") => "Tcp",
        Some("udp" | "17") => "Udp",
        _ => "*",
    }
}

fn port_range(rule: &Value) -> String {
    let from = rule.get("FromPort").and_then(Value::to_text);
    let to = rule.get("ToPort").and_then(Value::to_text);
    match (from, to) {
        (Some(from), Some(to)) if from == "-1" || to == "-1" => "*".to_string(),
        (Some(from), Some(to)) if from == to => from,
        (Some(from), Some(to)) => format!("{from}-{to}"),
        (Some(port), None) | (None, Some(port)) => port,
        (None, None) => "*".to_string(),
    }
}

fn security_rule(rule: &Value, index: usize, direction: Direction) -> Json {
    let cidr = rule
        .get("CidrIp")
        .map_or_else(|| Json::from("*"), Value::to_json);
    let (name, direction, source, destination) = match direction {
        Direction::Inbound => (format!("ingress_{index}"), "Inbound", cidr, Json::from("*")),
        Direction::Outbound => (format!("egress_{index}"), "Outbound", Json::from("*"), cidr),
    };
    json!({
        "name": name,
        "properties": {
            "protocol": protocol(rule),
            "sourcePortRange": "*",
            "destinationPortRange": port_range(rule),
            "sourceAddressPrefix": source,
            "destinationAddressPrefix": destination,
            "access": "Allow",
            "priority": 100 + 10 * index,
            "direction": direction,
        },
    })
}

impl Translator for SecurityGroupTranslator<'_> {
    fn resource(&self) -> &Resource {
        self.resource
    }

    fn variables(&self, _ctx: &ResolutionContext<'_>) -> Result<Entries, TranslateError> {
        let name = &self.resource.name;
        let mut variables = Entries::new();
        variables.insert(format!("nsgName_{name}"), Json::from(name.as_str()));
        Ok(variables)
    }

    fn resource_entries(&self, ctx: &ResolutionContext<'_>) -> Result<Vec<Json>, TranslateError> {
        let mut rules = self.rules(ctx, "SecurityGroupIngress", Direction::Inbound)?;
        rules.extend(self.rules(ctx, "SecurityGroupEgress", Direction::Outbound)?);
        Ok(vec![entry(
            &security_group_target(&self.resource.name),
            ctx,
            &self.dependencies(ctx)?,
            json!({ "securityRules": rules }),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(json: Json) -> Value {
        Value::from_json(&json)
    }

    #[test]
    fn port_ranges() {
        assert_eq!(port_range(&rule(json!({ "FromPort": "80", "ToPort": "80" }))), "80");
        assert_eq!(port_range(&rule(json!({ "FromPort": 1000, "ToPort": 2000 }))), "1000-2000");
        assert_eq!(port_range(&rule(json!({ "FromPort": "-1", "ToPort": "-1" }))), "*");
        assert_eq!(port_range(&rule(json!({}))), "*");
    }

    #[test]
    fn protocols() {
        assert_eq!(protocol(&rule(json!({ "IpProtocol": "TCP" }))), "Tcp");
        assert_eq!(protocol(&rule(json!({ "IpProtocol": "17" }))), "Udp");
        assert_eq!(protocol(&rule(json!({ "IpProtocol": "-1" }))), "*");
    }

    #[test]
    fn egress_rules_match_destination() {
        let translated = security_rule(
            &rule(json!({ "IpProtocol": "tcp", "FromPort": "443", "ToPort": "443", "CidrIp": "10.0.0.0/8" })),
            1,
            Direction::Outbound,
        );
        assert_eq!(translated["name"], "egress_1");
        assert_eq!(translated["properties"]["destinationAddressPrefix"], "10.0.0.0/8");
        assert_eq!(translated["properties"]["sourceAddressPrefix"], "*");
        assert_eq!(translated["properties"]["priority"], 110);
    }
}
