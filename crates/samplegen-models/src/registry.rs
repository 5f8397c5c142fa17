//! Layered model registries.
//!
//! A working registry is the merge of several layers: the bundled base models,
//! any custom-domain models, and user overrides. Later layers win on id
//! collision, but the merge is structural: properties are merged key-wise and
//! `required` lists are unioned.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{Model, Property, PropertyType};

const BASE_MODELS_JSON: &str = include_str!("../models/base.json");

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model not found: {id}")]
    ModelNotFound { id: String },

    #[error("unknown property type `{ty}` for property `{property}` of model `{model}`")]
    UnknownPropertyType {
        ty: String,
        property: String,
        model: String,
    },

    #[error("invalid model `{model}`: {message}")]
    InvalidModel { model: String, message: String },

    #[error("invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub fn not_found(id: impl Into<String>) -> Self {
        ModelError::ModelNotFound { id: id.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelRegistry {
    models: BTreeMap<String, Model>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The models bundled with samplegen: system object, enums, workflow
    /// models, a handful of forms and financial products.
    pub fn base() -> Result<Self, ModelError> {
        Self::from_json_str(BASE_MODELS_JSON)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ModelError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Accepts either `{ "<id>": model, ... }` or `[model, ...]`.
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        let entries: Vec<(Option<String>, Value)> = match value {
            Value::Object(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
            Value::Array(items) => items.into_iter().map(|v| (None, v)).collect(),
            other => {
                return Err(ModelError::InvalidModel {
                    model: "<registry>".to_string(),
                    message: format!("expected an object or array of models, got {other}"),
                })
            }
        };

        let mut registry = Self::new();
        for (key, mut raw) in entries {
            if let (Some(key), Value::Object(map)) = (&key, &mut raw) {
                map.entry("id").or_insert_with(|| Value::String(key.clone()));
            }
            check_property_types(&raw)?;
            let model: Model = serde_json::from_value(raw).map_err(|e| ModelError::InvalidModel {
                model: key.unwrap_or_else(|| "<unnamed>".to_string()),
                message: e.to_string(),
            })?;
            registry.insert(model);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, model: Model) -> Option<Model> {
        self.models.insert(model.id.clone(), model)
    }

    pub fn get(&self, id: &str) -> Option<&Model> {
        self.models.get(id)
    }

    pub fn require(&self, id: &str) -> Result<&Model, ModelError> {
        self.get(id).ok_or_else(|| ModelError::not_found(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// A property is inlined when it says so, or when its target model is.
    pub fn is_inlined_property(&self, property: &Property) -> bool {
        if property.inlined {
            return true;
        }
        property
            .target()
            .and_then(|target| self.get(target))
            .map(|model| model.inlined)
            .unwrap_or(false)
    }

    /// `model_id` is `tag` or carries it as its supertype tag.
    pub fn is_a(&self, model_id: &str, tag: &str) -> bool {
        model_id == tag
            || self
                .get(model_id)
                .map(|model| model.is_subclass_of(tag))
                .unwrap_or(false)
    }
}

/// Rejects unknown `type` strings before serde sees them, so the error can
/// name the model and property.
fn check_property_types(raw: &Value) -> Result<(), ModelError> {
    let model = raw
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>");
    let Some(properties) = raw.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (name, property) in properties {
        let declared = [
            property.get("type"),
            property.get("items").and_then(|items| items.get("type")),
        ];
        for ty in declared.into_iter().flatten() {
            let Some(ty) = ty.as_str() else { continue };
            if PropertyType::parse(ty).is_none() {
                return Err(ModelError::UnknownPropertyType {
                    ty: ty.to_string(),
                    property: name.clone(),
                    model: model.to_string(),
                });
            }
        }
    }
    Ok(())
}

// ============================================================================
// Layer merging
// ============================================================================

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    layers: Vec<ModelRegistry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, layer: ModelRegistry) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn build(self) -> ModelRegistry {
        let mut merged = ModelRegistry::new();
        for layer in self.layers {
            for (id, model) in layer.models {
                match merged.models.get_mut(&id) {
                    Some(existing) => merge_model(existing, model),
                    None => {
                        merged.models.insert(id, model);
                    }
                }
            }
        }
        merged
    }
}

fn merge_model(existing: &mut Model, incoming: Model) {
    existing.properties.extend(incoming.properties);
    for name in incoming.required {
        if !existing.required.contains(&name) {
            existing.required.push(name);
        }
    }
    existing.inlined |= incoming.inlined;
    if incoming.title.is_some() {
        existing.title = incoming.title;
    }
    if incoming.sub_class_of.is_some() {
        existing.sub_class_of = incoming.sub_class_of;
    }
    if incoming.enum_values.is_some() {
        existing.enum_values = incoming.enum_values;
    }
    if !incoming.forms.is_empty() {
        existing.forms = incoming.forms;
    }
    if !incoming.additional_forms.is_empty() {
        existing.additional_forms = incoming.additional_forms;
    }
}
