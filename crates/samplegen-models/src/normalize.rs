//! One-shot model normalization.
//!
//! Normalization turns models as authored into models the synthesizer can
//! walk without special cases:
//!
//! 1. non-inlined models receive the system properties of `tradle.Object`
//!    and the matching `required` entries
//! 2. `required` is deduplicated
//! 3. bookkeeping properties are dropped
//! 4. `_t` always fakes the model's own id
//! 5. references to non-inlined models get a `ref` directive
//! 6. `date` properties become strings faked by `date.recent`
//!
//! The function is idempotent: normalizing a normalized model is a no-op.
//! Registries are never normalized in place; `ModelRegistry::normalize`
//! returns a new registry.

use crate::ids;
use crate::model::{Directive, Model, PropertyType};
use crate::registry::{ModelError, ModelRegistry};
use serde_json::Value;

/// Directive that always yields its single argument (the model id).
pub const TYPE_DIRECTIVE: &str = "resource.type";

/// Directive attached to repaired `date` properties.
pub const RECENT_DATE_DIRECTIVE: &str = "date.recent";

impl ModelRegistry {
    /// Normalize every model against this registry.
    pub fn normalize(&self) -> Result<ModelRegistry, ModelError> {
        let mut normalized = ModelRegistry::new();
        for model in self.iter() {
            normalized.insert(normalize_model(self, model)?);
        }
        tracing::debug!(models = normalized.len(), "normalized model registry");
        Ok(normalized)
    }
}

pub fn normalize_model(models: &ModelRegistry, model: &Model) -> Result<Model, ModelError> {
    let mut model = model.clone();

    if !model.inlined {
        let base = models.require(ids::OBJECT)?;
        for (name, property) in &base.properties {
            model.properties.insert(name.clone(), property.clone());
        }
        model.required.extend(base.required.iter().cloned());
        model
            .required
            .extend([ids::LINK, ids::PERMALINK, ids::AUTHOR].map(String::from));
    }

    dedup_in_order(&mut model.required);

    let mut dropped: Vec<&str> = ids::BOOKKEEPING.to_vec();
    if model.id != ids::MESSAGE {
        dropped.extend_from_slice(ids::MESSAGE_ONLY);
    }
    for name in &dropped {
        model.properties.remove(*name);
    }
    model.required.retain(|name| !dropped.contains(&name.as_str()));

    let id = model.id.clone();
    if let Some(type_property) = model.properties.get_mut(ids::TYPE) {
        type_property.faker = Some(Directive::call(TYPE_DIRECTIVE, vec![Value::String(id.clone())]));
    }

    for (name, property) in model.properties.iter_mut() {
        if property.ty == PropertyType::Date {
            property.ty = PropertyType::String;
            if property.faker.is_none() {
                property.faker = Some(Directive::named(RECENT_DATE_DIRECTIVE));
            }
            continue;
        }

        if !property.ty.is_structured() {
            continue;
        }
        if property.ty == PropertyType::Array && property.has_primitive_items() {
            continue;
        }
        if matches!(property.ty, PropertyType::Enum | PropertyType::Json) {
            property.ty = PropertyType::Object;
        }

        let Some(target) = property.target().map(str::to_string) else {
            tracing::trace!(model = %id, property = %name, "locally defined structure");
            continue;
        };
        if !models.contains(&target) {
            return Err(ModelError::not_found(target));
        }
        if models.is_inlined_property(property) {
            continue;
        }

        let mut shape = property.clone();
        shape.faker = None;
        property.faker = Some(Directive::Ref {
            target,
            property: Box::new(shape),
        });
    }

    Ok(model)
}

fn dedup_in_order(names: &mut Vec<String>) {
    let mut seen = std::collections::BTreeSet::new();
    names.retain(|name| seen.insert(name.clone()));
}
