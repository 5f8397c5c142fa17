//! Structural validation of finished resources.
//!
//! The synthesizer treats validation as a pass/fail oracle: anything it
//! produces must pass before it reaches the output. `Validator` is the seam;
//! `StructuralValidator` is the default implementation and checks shapes
//! against the *normalized* model.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::ids;
use crate::model::{Model, Property, PropertyType};
use crate::registry::ModelRegistry;
use crate::resource::Resource;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct ValidationError {
    /// `<model>.<property>[index]...`
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub trait Validator {
    fn validate(
        &self,
        models: &ModelRegistry,
        model: &Model,
        resource: &Resource,
    ) -> Result<(), ValidationError>;
}

#[derive(Debug, Clone, Copy)]
pub struct StructuralValidator {
    /// Re-hash signed resources and compare with `_link`.
    pub check_links: bool,
}

impl Default for StructuralValidator {
    fn default() -> Self {
        Self { check_links: true }
    }
}

impl Validator for StructuralValidator {
    fn validate(
        &self,
        models: &ModelRegistry,
        model: &Model,
        resource: &Resource,
    ) -> Result<(), ValidationError> {
        let root = model.id.as_str();
        match resource.type_id() {
            Some(ty) if ty == model.id => {}
            Some(ty) => {
                return Err(ValidationError::new(
                    root,
                    format!("`_t` is `{ty}`, expected `{}`", model.id),
                ))
            }
            None => return Err(ValidationError::new(root, "missing `_t`")),
        }

        for name in &model.required {
            if !resource.contains(name) {
                return Err(ValidationError::new(
                    format!("{root}.{name}"),
                    "required property is missing",
                ));
            }
        }

        let virtual_fields = resource.virtual_fields();
        for (key, value) in resource.as_map() {
            let path = format!("{root}.{key}");
            if key == ids::VIRTUAL {
                let ok = value
                    .as_array()
                    .map(|names| names.iter().all(Value::is_string))
                    .unwrap_or(false);
                if !ok {
                    return Err(ValidationError::new(path, "expected a list of names"));
                }
                continue;
            }
            match model.property(key) {
                Some(property) => self.check_value(models, property, value, &path)?,
                None if virtual_fields.contains(key) => {}
                None => {
                    return Err(ValidationError::new(
                        path,
                        format!("property is not declared by `{}`", model.id),
                    ))
                }
            }
        }

        if self.check_links && resource.is_signed() {
            let expected = resource.compute_link();
            if resource.link() != Some(expected.as_str()) {
                return Err(ValidationError::new(
                    format!("{root}.{}", ids::LINK),
                    format!("link does not match payload hash {expected}"),
                ));
            }
        }

        Ok(())
    }
}

impl StructuralValidator {
    fn check_value(
        &self,
        models: &ModelRegistry,
        property: &Property,
        value: &Value,
        path: &str,
    ) -> Result<(), ValidationError> {
        match property.ty {
            PropertyType::String => expect(value.is_string(), path, "expected a string"),
            PropertyType::Number => expect(value.is_number(), path, "expected a number"),
            PropertyType::Boolean => expect(value.is_boolean(), path, "expected a boolean"),
            PropertyType::Date => expect(
                value.is_number() || value.is_string(),
                path,
                "expected a timestamp",
            ),
            PropertyType::Json => Ok(()),
            PropertyType::Enum | PropertyType::Object => self.check_reference(
                models,
                property.reference.as_deref(),
                property.inlined,
                value,
                path,
            ),
            PropertyType::Array => {
                let Some(items) = value.as_array() else {
                    return Err(ValidationError::new(path, "expected an array"));
                };
                let item_type = property.items.as_ref().and_then(|items| items.ty);
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{i}]");
                    match item_type {
                        Some(ty) if ty != PropertyType::Object => {
                            self.check_value(models, &Property::new(ty), item, &item_path)?
                        }
                        _ => self.check_reference(
                            models,
                            property.target(),
                            property.inlined,
                            item,
                            &item_path,
                        )?,
                    }
                }
                Ok(())
            }
        }
    }

    fn check_reference(
        &self,
        models: &ModelRegistry,
        target: Option<&str>,
        inlined: bool,
        value: &Value,
        path: &str,
    ) -> Result<(), ValidationError> {
        let Some(map) = value.as_object() else {
            return Err(ValidationError::new(path, "expected an object"));
        };
        let Some(target) = target else {
            return Ok(());
        };
        let Some(target_model) = models.get(target) else {
            return Err(ValidationError::new(
                path,
                format!("reference to unknown model `{target}`"),
            ));
        };

        if target_model.is_enum() {
            check_enum_value(target_model, map, path)
        } else if inlined || target_model.inlined {
            self.check_inlined(models, target_model, map, path)
        } else {
            check_stub(models, target, map, path)
        }
    }

    fn check_inlined(
        &self,
        models: &ModelRegistry,
        model: &Model,
        map: &Map<String, Value>,
        path: &str,
    ) -> Result<(), ValidationError> {
        for (key, value) in map {
            let nested = format!("{path}.{key}");
            if key == ids::TYPE {
                let ty = value.as_str().unwrap_or_default();
                if !models.is_a(ty, &model.id) {
                    return Err(ValidationError::new(
                        nested,
                        format!("`{ty}` is not a `{}`", model.id),
                    ));
                }
                continue;
            }
            match model.property(key) {
                Some(property) => self.check_value(models, property, value, &nested)?,
                None if key.starts_with('_') => {}
                None => {
                    return Err(ValidationError::new(
                        nested,
                        format!("property is not declared by `{}`", model.id),
                    ))
                }
            }
        }
        Ok(())
    }
}

fn expect(ok: bool, path: &str, message: &str) -> Result<(), ValidationError> {
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new(path, message))
    }
}

fn check_enum_value(model: &Model, map: &Map<String, Value>, path: &str) -> Result<(), ValidationError> {
    let id = map.get("id").and_then(Value::as_str);
    let title = map.get("title").and_then(Value::as_str);
    let (Some(id), Some(_)) = (id, title) else {
        return Err(ValidationError::new(path, "enum value needs `id` and `title`"));
    };

    let prefix = format!("{}_", model.id);
    let Some(local) = id.strip_prefix(&prefix) else {
        return Err(ValidationError::new(
            path,
            format!("enum id `{id}` is not namespaced by `{}`", model.id),
        ));
    };
    if let Some(values) = &model.enum_values {
        if !values.iter().any(|value| value.id == local) {
            return Err(ValidationError::new(
                path,
                format!("`{local}` is not a value of `{}`", model.id),
            ));
        }
    }
    Ok(())
}

fn check_stub(
    models: &ModelRegistry,
    target: &str,
    map: &Map<String, Value>,
    path: &str,
) -> Result<(), ValidationError> {
    let ty = map.get(ids::TYPE).and_then(Value::as_str).unwrap_or_default();
    if !models.is_a(ty, target) {
        return Err(ValidationError::new(
            path,
            format!("stub type `{ty}` is not a `{target}`"),
        ));
    }
    for key in [ids::LINK, ids::PERMALINK] {
        if !map.get(key).map(Value::is_string).unwrap_or(false) {
            return Err(ValidationError::new(
                path,
                format!("stub is missing `{key}`"),
            ));
        }
    }
    Ok(())
}
