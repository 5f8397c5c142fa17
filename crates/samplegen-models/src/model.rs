//! Typed models, properties and faking directives.
//!
//! Models arrive as JSON (see `registry`). We keep the JSON field names
//! (`ref`, `subClassOf`, `displaysAs`, ...) via serde renames so registries
//! exported by the platform load unchanged.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::ids;

fn is_false(b: &bool) -> bool {
    !*b
}

// ============================================================================
// Property types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Date,
    Enum,
    Object,
    Array,
    Json,
}

impl PropertyType {
    pub const ALL: [PropertyType; 8] = [
        PropertyType::String,
        PropertyType::Number,
        PropertyType::Boolean,
        PropertyType::Date,
        PropertyType::Enum,
        PropertyType::Object,
        PropertyType::Array,
        PropertyType::Json,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
            PropertyType::Date => "date",
            PropertyType::Enum => "enum",
            PropertyType::Object => "object",
            PropertyType::Array => "array",
            PropertyType::Json => "json",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.as_str() == s)
    }

    /// Types that may point at another model.
    pub fn is_structured(self) -> bool {
        matches!(
            self,
            PropertyType::Object | PropertyType::Array | PropertyType::Enum | PropertyType::Json
        )
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Directives
// ============================================================================

/// How to fake a property.
///
/// On the wire a directive is either a dotted function name
/// (`"name.firstName"`) or a single-key object naming the function and its
/// positional arguments (`{"random.number": [1, 10]}`). The normalizer adds
/// `Ref` directives (`{"ref": [target, property]}`) to reference properties.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawDirective")]
pub enum Directive {
    Named(String),
    Call { name: String, args: Vec<Value> },
    Ref { target: String, property: Box<Property> },
}

impl Directive {
    pub const REF: &'static str = "ref";

    pub fn named(name: impl Into<String>) -> Self {
        Directive::Named(name.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Value>) -> Self {
        Directive::Call {
            name: name.into(),
            args,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Directive::Named(name) | Directive::Call { name, .. } => name,
            Directive::Ref { .. } => Self::REF,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDirective {
    Name(String),
    Call(Map<String, Value>),
}

impl TryFrom<RawDirective> for Directive {
    type Error = String;

    fn try_from(raw: RawDirective) -> Result<Self, Self::Error> {
        let map = match raw {
            RawDirective::Name(name) => return Ok(Directive::Named(name)),
            RawDirective::Call(map) => map,
        };
        if map.len() != 1 {
            return Err(format!(
                "faker directive object must have exactly one key, found {}",
                map.len()
            ));
        }
        let Some((name, args)) = map.into_iter().next() else {
            return Err("empty faker directive".to_string());
        };
        let args = match args {
            Value::Array(args) => args,
            Value::Null => Vec::new(),
            other => vec![other],
        };

        if name == Directive::REF {
            let mut args = args.into_iter();
            let target = match args.next() {
                Some(Value::String(target)) => target,
                _ => return Err("`ref` directive needs a target model id".to_string()),
            };
            let property = match args.next() {
                Some(value) => serde_json::from_value::<Property>(value)
                    .map_err(|e| format!("`ref` directive property: {e}"))?,
                None => return Err("`ref` directive needs a property definition".to_string()),
            };
            return Ok(Directive::Ref {
                target,
                property: Box::new(property),
            });
        }

        Ok(Directive::Call { name, args })
    }
}

impl Serialize for Directive {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Directive::Named(name) => serializer.serialize_str(name),
            Directive::Call { name, args } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(name, args)?;
                map.end()
            }
            Directive::Ref { target, property } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(Self::REF, &(target, property.as_ref()))?;
                map.end()
            }
        }
    }
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Items {
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<PropertyType>,
    /// Set on arrays that list resources pointing back at this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backlink: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(rename = "type")]
    pub ty: PropertyType,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(default, alias = "sample", skip_serializing_if = "Option::is_none")]
    pub faker: Option<Directive>,
    #[serde(rename = "virtual", default, skip_serializing_if = "is_false")]
    pub is_virtual: bool,
    /// Presentation-only; never synthesized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displays_as: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub display_name: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub inlined: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Property {
    pub fn new(ty: PropertyType) -> Self {
        Self {
            ty,
            reference: None,
            items: None,
            faker: None,
            is_virtual: false,
            displays_as: None,
            display_name: false,
            inlined: false,
            title: None,
        }
    }

    /// `type: object, ref: <target>`
    pub fn object(target: impl Into<String>) -> Self {
        Self::new(PropertyType::Object).with_ref(target)
    }

    /// `type: array, items: { ref: <target> }`
    pub fn array_of(target: impl Into<String>) -> Self {
        let mut property = Self::new(PropertyType::Array);
        property.items = Some(Items {
            reference: Some(target.into()),
            ..Items::default()
        });
        property
    }

    pub fn with_ref(mut self, target: impl Into<String>) -> Self {
        self.reference = Some(target.into());
        self
    }

    pub fn with_faker(mut self, directive: Directive) -> Self {
        self.faker = Some(directive);
        self
    }

    pub fn virtual_(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// The model this property points at, directly or through `items`.
    pub fn target(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .or_else(|| self.items.as_ref().and_then(|items| items.reference.as_deref()))
    }

    pub fn is_backlink(&self) -> bool {
        self.items
            .as_ref()
            .map(|items| items.backlink.is_some())
            .unwrap_or(false)
    }

    /// Arrays of strings, numbers, ... (no model behind the elements).
    pub fn has_primitive_items(&self) -> bool {
        matches!(
            self.items.as_ref().and_then(|items| items.ty),
            Some(ty) if ty != PropertyType::Object
        )
    }
}

// ============================================================================
// Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Property>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub inlined: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_class_of: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<EnumValue>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_forms: Vec<String>,
}

impl Model {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            properties: BTreeMap::new(),
            required: Vec::new(),
            inlined: false,
            sub_class_of: None,
            enum_values: None,
            forms: Vec::new(),
            additional_forms: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, property: Property) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn inlined(mut self) -> Self {
        self.inlined = true;
        self
    }

    pub fn sub_class_of(mut self, tag: impl Into<String>) -> Self {
        self.sub_class_of = Some(tag.into());
        self
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Flat tag check: supertypes are not chained.
    pub fn is_subclass_of(&self, tag: &str) -> bool {
        self.sub_class_of.as_deref() == Some(tag)
    }

    pub fn is_enum(&self) -> bool {
        self.is_subclass_of(ids::ENUM)
    }

    /// `forms` followed by `additionalForms`.
    pub fn all_forms(&self) -> impl Iterator<Item = &str> {
        self.forms
            .iter()
            .chain(self.additional_forms.iter())
            .map(String::as_str)
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn named_and_call_directives_parse() {
        let named: Directive = serde_json::from_value(json!("name.firstName")).unwrap();
        assert_eq!(named, Directive::named("name.firstName"));

        let call: Directive = serde_json::from_value(json!({ "random.number": [1, 10] })).unwrap();
        assert_eq!(call, Directive::call("random.number", vec![json!(1), json!(10)]));
    }

    #[test]
    fn scalar_argument_is_wrapped() {
        let call: Directive = serde_json::from_value(json!({ "resource.type": "tradle.Name" })).unwrap();
        assert_eq!(call, Directive::call("resource.type", vec![json!("tradle.Name")]));
    }

    #[test]
    fn ref_directive_survives_serialization() {
        let directive = Directive::Ref {
            target: "tradle.Organization".to_string(),
            property: Box::new(Property::object("tradle.Organization")),
        };
        let value = serde_json::to_value(&directive).unwrap();
        assert_eq!(value["ref"][0], json!("tradle.Organization"));
        assert_eq!(value["ref"][1]["ref"], json!("tradle.Organization"));
        let back: Directive = serde_json::from_value(value).unwrap();
        assert_eq!(back, directive);
    }

    #[test]
    fn nested_ref_directive_round_trips_through_a_property() {
        let inner = Property::object("tradle.Organization").with_faker(Directive::Ref {
            target: "tradle.Organization".to_string(),
            property: Box::new(Property::object("tradle.Organization")),
        });
        let directive = Directive::Ref {
            target: "tradle.Organization".to_string(),
            property: Box::new(inner),
        };
        let value = serde_json::to_value(&directive).unwrap();
        assert!(!value["ref"][1].is_null());
        assert_eq!(serde_json::from_value::<Directive>(value).unwrap(), directive);
    }

    #[test]
    fn multi_key_directive_is_rejected() {
        let err = serde_json::from_value::<Directive>(json!({ "a": [], "b": [] }));
        assert!(err.is_err());
    }

    #[test]
    fn sample_is_an_alias_for_faker() {
        let property: Property =
            serde_json::from_value(json!({ "type": "string", "sample": "lorem.word" })).unwrap();
        assert_eq!(property.faker, Some(Directive::named("lorem.word")));
    }

    #[test]
    fn target_falls_back_to_items() {
        let property = Property::array_of("tradle.Phone");
        assert_eq!(property.target(), Some("tradle.Phone"));
        assert!(!property.has_primitive_items());
    }
}
