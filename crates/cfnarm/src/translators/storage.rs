//! Volumes and the resources that attach things to instances.
//!
//! Volumes emit no resource of their own: the instance they are attached to
//! lists them as data disks and reads their name and size from the
//! variables declared here.

use serde_json::Value as Json;

use super::{
    CINDER_VOLUME, CINDER_VOLUME_ATTACHMENT, EC2_VOLUME, EC2_VOLUME_ATTACHMENT, INSTANCE_TYPES,
    VOLUME_TYPES, required_property, required_reference,
};
use crate::arm;
use crate::interpreter::{AttributeRule, AttributeTable, ResolutionContext};
use crate::template::Resource;
use crate::translate::{Entries, Registration, TranslateError, Translator, TranslatorRegistry};
use crate::types::Value;

pub(crate) fn register(registry: &mut TranslatorRegistry) {
    let volume_attributes = AttributeTable::new(AttributeRule::Expression(|name| {
        arm::variables(&format!("dataDiskName_{name}"))
    }));
    registry.register(
        EC2_VOLUME,
        Registration::new(ec2_volume).with_attributes(volume_attributes.clone()),
    );
    registry.register(
        CINDER_VOLUME,
        Registration::new(cinder_volume).with_attributes(volume_attributes),
    );
    registry.register(EC2_VOLUME_ATTACHMENT, Registration::new(ec2_attachment));
    registry.register(CINDER_VOLUME_ATTACHMENT, Registration::new(cinder_attachment));
}

fn ec2_volume(resource: &Resource) -> Box<dyn Translator + '_> {
    Box::new(VolumeTranslator {
        resource,
        size_key: "Size",
    })
}

fn cinder_volume(resource: &Resource) -> Box<dyn Translator + '_> {
    Box::new(VolumeTranslator {
        resource,
        size_key: "size",
    })
}

static EC2_ATTACHMENT_LINKS: [Link; 2] = [
    Link::required("InstanceId", INSTANCE_TYPES),
    Link::required("VolumeId", VOLUME_TYPES),
];

static CINDER_ATTACHMENT_LINKS: [Link; 2] = [
    Link::required("instance_uuid", INSTANCE_TYPES),
    Link::required("volume_id", VOLUME_TYPES),
];

fn ec2_attachment(resource: &Resource) -> Box<dyn Translator + '_> {
    Box::new(AttachmentTranslator {
        resource,
        links: &EC2_ATTACHMENT_LINKS,
    })
}

fn cinder_attachment(resource: &Resource) -> Box<dyn Translator + '_> {
    Box::new(AttachmentTranslator {
        resource,
        links: &CINDER_ATTACHMENT_LINKS,
    })
}

struct VolumeTranslator<'a> {
    resource: &'a Resource,
    size_key: &'static str,
}

impl VolumeTranslator<'_> {
    /// Disk size in GB: a positive integer, or an expression.
    fn size(&self, ctx: &ResolutionContext<'_>) -> Result<Json, TranslateError> {
        let size = required_property(ctx, self.resource, self.size_key)?;
        match (size.as_i64(), &size) {
            (Some(gb), _) if gb > 0 => Ok(Json::from(gb)),
            (None, Value::Expr(_)) => Ok(size.to_json()),
            _ => Err(TranslateError::invalid_property(
                &self.resource.name,
                self.size_key,
                format!("must be a positive number of gigabytes, found '{size}'"),
            )),
        }
    }
}

impl Translator for VolumeTranslator<'_> {
    fn resource(&self) -> &Resource {
        self.resource
    }

    fn variables(&self, ctx: &ResolutionContext<'_>) -> Result<Entries, TranslateError> {
        let name = &self.resource.name;
        let mut variables = Entries::new();
        variables.insert(format!("dataDiskName_{name}"), Json::from(name.as_str()));
        variables.insert(format!("dataDiskSize_{name}"), self.size(ctx)?);
        Ok(variables)
    }

    fn resource_entries(&self, _ctx: &ResolutionContext<'_>) -> Result<Vec<Json>, TranslateError> {
        Ok(Vec::new())
    }
}

/// A reference property an attachment must carry.
pub(super) struct Link {
    property: &'static str,
    resource_types: &'static [&'static str],
    required: bool,
}

impl Link {
    pub(super) const fn required(
        property: &'static str,
        resource_types: &'static [&'static str],
    ) -> Self {
        Self {
            property,
            resource_types,
            required: true,
        }
    }

    pub(super) const fn optional(
        property: &'static str,
        resource_types: &'static [&'static str],
    ) -> Self {
        Self {
            property,
            resource_types,
            required: false,
        }
    }
}

/// A resource that only links others together.
///
/// It contributes nothing itself; the resources it links read it through
/// the context. Translating it checks that its links point at resources of
/// the right types.
pub(super) struct AttachmentTranslator<'a> {
    pub(super) resource: &'a Resource,
    pub(super) links: &'static [Link],
}

impl Translator for AttachmentTranslator<'_> {
    fn resource(&self) -> &Resource {
        self.resource
    }

    fn dependencies(
        &self,
        _ctx: &ResolutionContext<'_>,
    ) -> Result<Vec<arm::TargetRef>, TranslateError> {
        Ok(Vec::new())
    }

    fn resource_entries(&self, ctx: &ResolutionContext<'_>) -> Result<Vec<Json>, TranslateError> {
        for link in self.links {
            if !link.required && self.resource.property(link.property).is_none() {
                continue;
            }
            required_reference(ctx, self.resource, link.property, link.resource_types)?;
        }
        Ok(Vec::new())
    }
}
