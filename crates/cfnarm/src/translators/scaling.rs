//! Auto scaling groups.
//!
//! A group becomes an availability set plus autoscale settings targeting it.
//! Capacity comes from `MinSize`, `MaxSize` and `DesiredCapacity`; scaling
//! rules are not carried over.

use serde_json::{Value as Json, json};

use super::{AUTOSCALING_GROUP, entry, extend_unique, required_property};
use crate::arm::{self, TargetRef, types};
use crate::interpreter::ResolutionContext;
use crate::template::Resource;
use crate::translate::{Entries, Registration, TranslateError, Translator, TranslatorRegistry};

pub(crate) fn register(registry: &mut TranslatorRegistry) {
    registry.register(
        AUTOSCALING_GROUP,
        Registration::new(autoscaling_group).with_target(autoscale_target),
    );
}

fn autoscaling_group(resource: &Resource) -> Box<dyn Translator + '_> {
    Box::new(ScalingGroupTranslator { resource })
}

fn autoscale_target(name: &str) -> TargetRef {
    TargetRef::variable(
        types::AUTOSCALE_SETTINGS,
        &format!("autoscaleSettingsName_{name}"),
    )
}

fn availability_set_target(name: &str) -> TargetRef {
    TargetRef::variable(
        types::AVAILABILITY_SETS,
        &format!("availabilitySetName_{name}"),
    )
}

/// Instance count bounds of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Capacity {
    minimum: i64,
    maximum: i64,
    default: i64,
}

struct ScalingGroupTranslator<'a> {
    resource: &'a Resource,
}

impl ScalingGroupTranslator<'_> {
    fn count(&self, ctx: &ResolutionContext<'_>, key: &str) -> Result<Option<i64>, TranslateError> {
        let Some(value) = ctx.resource_property(self.resource, key)? else {
            return Ok(None);
        };
        value.as_i64().map(Some).ok_or_else(|| {
            TranslateError::invalid_property(
                &self.resource.name,
                key,
                format!("must be an integer, found '{value}'"),
            )
        })
    }

    fn capacity(&self, ctx: &ResolutionContext<'_>) -> Result<Capacity, TranslateError> {
        let name = &self.resource.name;
        // Presence first, so a missing size reports "is required".
        required_property(ctx, self.resource, "MinSize")?;
        required_property(ctx, self.resource, "MaxSize")?;
        let minimum = self.count(ctx, "MinSize")?.unwrap_or_default();
        let maximum = self.count(ctx, "MaxSize")?.unwrap_or_default();

        if minimum < 1 {
            return Err(TranslateError::invalid_property(
                name,
                "MinSize",
                format!("must be at least 1, found {minimum}"),
            ));
        }
        if maximum < minimum {
            return Err(TranslateError::invalid_property(
                name,
                "MaxSize",
                format!("must not be less than MinSize ({minimum}), found {maximum}"),
            ));
        }

        let default = match self.count(ctx, "DesiredCapacity")? {
            Some(desired) if !(minimum..=maximum).contains(&desired) => {
                return Err(TranslateError::invalid_property(
                    name,
                    "DesiredCapacity",
                    format!("must be between {minimum} and {maximum}, found {desired}"),
                ));
            }
            Some(desired) => desired,
            None => minimum + (maximum - minimum).div_euclid(2),
        };

        Ok(Capacity {
            minimum,
            maximum,
            default,
        })
    }
}

impl Translator for ScalingGroupTranslator<'_> {
    fn resource(&self) -> &Resource {
        self.resource
    }

    fn variables(&self, _ctx: &ResolutionContext<'_>) -> Result<Entries, TranslateError> {
        let name = &self.resource.name;
        let mut variables = Entries::new();
        variables.insert(
            format!("autoscaleSettingsName_{name}"),
            Json::from(format!("autoScaleSettings_{name}")),
        );
        variables.insert(
            format!("availabilitySetName_{name}"),
            Json::from(format!("availabilitySet_{name}")),
        );
        Ok(variables)
    }

    fn resource_entries(&self, ctx: &ResolutionContext<'_>) -> Result<Vec<Json>, TranslateError> {
        let name = &self.resource.name;
        let capacity = self.capacity(ctx)?;
        let availability_set = availability_set_target(name);

        let mut dependencies = vec![availability_set.clone()];
        extend_unique(&mut dependencies, self.dependencies(ctx)?);

        let mut settings = entry(
            &autoscale_target(name),
            ctx,
            &dependencies,
            json!({
                "name": arm::wrap(&arm::variables(&format!("autoscaleSettingsName_{name}"))),
                "profiles": [{
                    "name": format!("autoscaleSettingsProfile_{name}"),
                    "capacity": {
                        "minimum": capacity.minimum.to_string(),
                        "maximum": capacity.maximum.to_string(),
                        "default": capacity.default.to_string(),
                    },
                    "rules": [],
                }],
                "enabled": true,
                "targetResourceUri": arm::wrap(&availability_set.id()),
            }),
        );
        if let Some(object) = settings.as_object_mut() {
            object.insert("tags".to_string(), json!({}));
        }

        Ok(vec![settings, entry(&availability_set, ctx, &[], json!({}))])
    }
}
