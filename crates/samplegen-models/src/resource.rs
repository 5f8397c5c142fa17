//! Resources and the small helpers every producer of resources needs:
//! stubs, titles and virtual fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::digest;
use crate::ids;
use crate::model::Model;
use crate::registry::{ModelError, ModelRegistry};

/// A synthesized instance of a model: plain JSON with string keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(Map<String, Value>);

impl Resource {
    pub fn new(type_id: &str) -> Self {
        let mut map = Map::new();
        map.insert(ids::TYPE.to_string(), Value::String(type_id.to_string()));
        Self(map)
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// `None` unless `value` is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn type_id(&self) -> Option<&str> {
        self.get_str(ids::TYPE)
    }

    pub fn link(&self) -> Option<&str> {
        self.get_str(ids::LINK)
    }

    pub fn permalink(&self) -> Option<&str> {
        self.get_str(ids::PERMALINK)
    }

    pub fn author(&self) -> Option<&str> {
        self.get_str(ids::AUTHOR)
    }

    pub fn is_signed(&self) -> bool {
        self.0.contains_key(ids::SIG)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Names listed in `_virtual`.
    pub fn virtual_fields(&self) -> Vec<String> {
        self.0
            .get(ids::VIRTUAL)
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Set each field and record its name in `_virtual`.
    pub fn set_virtual<I, K>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut names = self.virtual_fields();
        for (name, value) in fields {
            let name = name.into();
            if !names.contains(&name) {
                names.push(name.clone());
            }
            self.0.insert(name, value);
        }
        self.0.insert(
            ids::VIRTUAL.to_string(),
            Value::Array(names.into_iter().map(Value::String).collect()),
        );
    }

    /// The hashed part of the resource: everything except virtual fields.
    pub fn payload(&self) -> Map<String, Value> {
        let virtual_fields = self.virtual_fields();
        self.0
            .iter()
            .filter(|(key, _)| {
                !ids::ALWAYS_VIRTUAL.contains(&key.as_str()) && !virtual_fields.contains(*key)
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn compute_link(&self) -> String {
        digest::link_of(&self.payload())
    }

    /// For signed resources, (re)compute the link and make it the permalink
    /// of this first version. Returns the link, if any.
    pub fn seal(&mut self) -> Option<String> {
        if !self.is_signed() {
            return None;
        }
        let link = self.compute_link();
        self.set_virtual([
            (ids::LINK, Value::String(link.clone())),
            (ids::PERMALINK, Value::String(link.clone())),
        ]);
        Some(link)
    }
}

impl From<Resource> for Value {
    fn from(resource: Resource) -> Self {
        resource.into_value()
    }
}

/// A lightweight pointer to `resource`: its type and identifiers, plus its
/// display name when it has one.
pub fn stub(models: &ModelRegistry, resource: &Resource) -> Result<Value, ModelError> {
    let type_id = resource.type_id().ok_or_else(|| ModelError::InvalidModel {
        model: "<resource>".to_string(),
        message: "cannot stub a resource without `_t`".to_string(),
    })?;
    models.require(type_id)?;

    let mut map = Map::new();
    map.insert(ids::TYPE.to_string(), Value::String(type_id.to_string()));
    for key in [ids::LINK, ids::PERMALINK, ids::DISPLAY_NAME] {
        if let Some(value) = resource.get(key) {
            map.insert(key.to_string(), value.clone());
        }
    }
    Ok(Value::Object(map))
}

/// `true` for values shaped like resource stubs.
pub fn is_stub(value: &Value) -> bool {
    value
        .as_object()
        .map(|map| map.contains_key(ids::TYPE) && map.contains_key(ids::LINK))
        .unwrap_or(false)
}

/// Human-readable title built from the model's `displayName` properties, in
/// property-name order. `None` when none of them has a printable value.
pub fn title(_models: &ModelRegistry, model: &Model, resource: &Resource) -> Option<String> {
    let parts: Vec<String> = model
        .properties
        .iter()
        .filter(|(_, property)| property.display_name)
        .filter_map(|(name, _)| resource.get(name).and_then(printable))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn printable(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map
            .get("title")
            .or_else(|| map.get(ids::DISPLAY_NAME))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Property, PropertyType};
    use serde_json::json;

    fn signed(name: &str) -> Resource {
        let mut resource = Resource::new("demo.Form");
        resource.insert(ids::SIG, json!("sig"));
        resource.insert("name", json!(name));
        resource
    }

    #[test]
    fn seal_sets_link_and_permalink() {
        let mut resource = signed("a");
        let link = resource.seal().unwrap();
        assert_eq!(resource.link(), Some(link.as_str()));
        assert_eq!(resource.permalink(), Some(link.as_str()));
        assert_eq!(resource.compute_link(), link);
    }

    #[test]
    fn unsigned_resources_are_not_sealed() {
        let mut resource = Resource::new("demo.Address");
        assert_eq!(resource.seal(), None);
        assert!(resource.link().is_none());
    }

    #[test]
    fn virtual_fields_do_not_affect_link() {
        let mut a = signed("a");
        let mut b = signed("a");
        b.set_virtual([(ids::AUTHOR, json!("someone")), ("_displayName", json!("A"))]);
        assert_eq!(a.seal(), b.seal());
    }

    #[test]
    fn set_virtual_does_not_duplicate_names() {
        let mut resource = Resource::new("demo.Form");
        resource.set_virtual([(ids::LINK, json!("x"))]);
        resource.set_virtual([(ids::LINK, json!("y"))]);
        assert_eq!(resource.virtual_fields(), vec![ids::LINK.to_string()]);
        assert_eq!(resource.link(), Some("y"));
    }

    #[test]
    fn stub_carries_type_and_links() {
        let mut models = ModelRegistry::new();
        models.insert(Model::new("demo.Form"));
        let mut resource = signed("a");
        resource.seal();

        let stub = stub(&models, &resource).unwrap();
        assert!(is_stub(&stub));
        assert_eq!(stub[ids::TYPE], json!("demo.Form"));
        assert_eq!(stub[ids::LINK], stub[ids::PERMALINK]);
        assert!(stub.get("name").is_none());
    }

    #[test]
    fn title_joins_display_name_properties() {
        let mut first = Property::new(PropertyType::String);
        first.display_name = true;
        let mut last = Property::new(PropertyType::String);
        last.display_name = true;
        let model = Model::new("demo.Name")
            .with_property("a_first", first)
            .with_property("b_last", last);
        let mut resource = Resource::new("demo.Name");
        resource.insert("a_first", json!("Ada"));
        resource.insert("b_last", json!("Lovelace"));

        let models = ModelRegistry::new();
        assert_eq!(title(&models, &model, &resource).as_deref(), Some("Ada Lovelace"));
        assert_eq!(title(&models, &Model::new("demo.Name"), &resource), None);
    }
}
