//! Property-level synthesis.
//!
//! A property's value comes from, in order: its faker directive (including the
//! `ref` directives added by normalization), a special-cased model (money,
//! phone), enum choice, inlined expansion, or a standalone side-effect
//! resource reduced to a stub.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Map, Value};

use samplegen_models::{ids, Directive, Model, Property, PropertyType};

use crate::error::{Result, SynthesisError};
use crate::fakers::random_hex;
use crate::synthesizer::{Authorship, Synthesized, Synthesizer, MAX_REFERENCE_DEPTH};

const CURRENCIES: &[&str] = &["€", "$", "£"];

impl Synthesizer {
    /// Fake a value for `model.<property>`.
    pub fn synthesize_value(
        &mut self,
        model: &Model,
        property: &str,
        authorship: &Authorship,
    ) -> Result<Synthesized<Value>> {
        let definition = model
            .property(property)
            .ok_or_else(|| SynthesisError::UnknownProperty {
                model: model.id.clone(),
                property: property.to_string(),
            })?;
        self.synthesize_property(definition, authorship)
    }

    pub(crate) fn synthesize_property(
        &mut self,
        property: &Property,
        authorship: &Authorship,
    ) -> Result<Synthesized<Value>> {
        match &property.faker {
            Some(Directive::Ref {
                target,
                property: shape,
            }) => {
                return self.synthesize_reference(
                    target,
                    shape.ty == PropertyType::Array,
                    shape.inlined,
                    authorship,
                )
            }
            Some(Directive::Named(name)) => return Ok(Synthesized::new(self.fake(name, &[])?)),
            Some(Directive::Call { name, args }) => {
                return Ok(Synthesized::new(self.fake(name, args)?))
            }
            None => {}
        }

        let value = match property.ty {
            PropertyType::String => Value::String(random_hex(&mut self.rng, 32)),
            PropertyType::Number => json!(self.rng.gen_range(0..100)),
            PropertyType::Boolean => Value::Bool(self.rng.gen_bool(0.5)),
            PropertyType::Date => json!(self.options.now.timestamp_millis()),
            PropertyType::Json => Value::Object(Map::new()),
            PropertyType::Enum | PropertyType::Object => match property.target() {
                Some(target) => {
                    let inline = property.inlined;
                    return self.synthesize_reference(target, false, inline, authorship);
                }
                None => Value::Object(Map::new()),
            },
            PropertyType::Array => match property.target() {
                Some(target) if !property.has_primitive_items() => {
                    let inline = property.inlined;
                    return self.synthesize_reference(target, true, inline, authorship);
                }
                _ => Value::Array(Vec::new()),
            },
        };
        Ok(Synthesized::new(value))
    }

    /// Fake a value pointing at `target`: one value, or an array of 1 to
    /// `max_array_items` values when `many` is set.
    pub fn synthesize_reference(
        &mut self,
        target: &str,
        many: bool,
        inline: bool,
        authorship: &Authorship,
    ) -> Result<Synthesized<Value>> {
        if !many {
            return self.synthesize_one_reference(target, inline, authorship);
        }

        let max = self.options.max_array_items.max(1);
        let count = if max > 1 { self.rng.gen_range(1..=max) } else { 1 };
        let mut out = Synthesized::new(Vec::with_capacity(count));
        for _ in 0..count {
            let item = self.synthesize_one_reference(target, inline, authorship)?;
            let item = out.absorb(item);
            out.value.push(item);
        }
        Ok(out.map(Value::Array))
    }

    fn synthesize_one_reference(
        &mut self,
        target: &str,
        inline: bool,
        authorship: &Authorship,
    ) -> Result<Synthesized<Value>> {
        if self.depth >= MAX_REFERENCE_DEPTH {
            return Err(SynthesisError::ReferenceDepthExceeded {
                model: target.to_string(),
                depth: self.depth,
            });
        }

        let models = Arc::clone(&self.models);
        let model = models.require(target)?;

        if let Some(special) = self.special_value(model)? {
            return Ok(Synthesized::new(special));
        }
        if model.is_enum() {
            return Ok(Synthesized::new(self.enum_value(model)));
        }

        self.depth += 1;
        let result = if inline || model.inlined {
            self.synthesize_inlined(model, authorship)
        } else {
            self.synthesize_stub_of(model, authorship)
        };
        self.depth -= 1;
        result
    }

    /// Hand-written shapes for models whose generic expansion would be
    /// unrealistic.
    fn special_value(&mut self, model: &Model) -> Result<Option<Value>> {
        let value = match model.id.as_str() {
            ids::MONEY => {
                let value = self.rng.gen_range(10..=500) * 100;
                let currency = CURRENCIES.choose(&mut self.rng).copied().unwrap_or("€");
                json!({ "value": value, "currency": currency })
            }
            ids::PHONE => {
                let phone_types = Arc::clone(&self.models);
                let phone_type = self.enum_value(phone_types.require(ids::PHONE_TYPES)?);
                let number = self.fake("phone.phoneNumber", &[])?;
                json!({ "phoneType": phone_type, "number": number })
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    /// `{id: "<model>_<value>", title}` for a declared value, or an opaque
    /// pair when the enum lists none.
    pub fn enum_value(&mut self, model: &Model) -> Value {
        let chosen = model
            .enum_values
            .as_deref()
            .and_then(|values| values.choose(&mut self.rng));
        match chosen {
            Some(value) => json!({
                "id": format!("{}_{}", model.id, value.id),
                "title": value.title,
            }),
            None => {
                let link = random_hex(&mut self.rng, 32);
                json!({
                    "id": format!("{}_{}", model.id, link),
                    "title": format!("{} {}", model.display_title(), &link[..8]),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesizer::{ResourceRequest, SynthesisOptions};
    use samplegen_models::{ModelRegistry, StructuralValidator, Validator};

    fn synth(seed: u64) -> Synthesizer {
        let models = ModelRegistry::base().unwrap().normalize().unwrap();
        Synthesizer::new(Arc::new(models), seed)
    }

    #[test]
    fn enum_ids_are_namespaced_and_declared() {
        let mut synth = synth(1);
        let models = synth.shared_models();
        let country = models.require("tradle.Country").unwrap();
        for _ in 0..20 {
            let value = synth.enum_value(country);
            let id = value["id"].as_str().unwrap();
            let local = id.strip_prefix("tradle.Country_").unwrap();
            assert!(country
                .enum_values
                .as_ref()
                .unwrap()
                .iter()
                .any(|v| v.id == local));
        }
    }

    #[test]
    fn enums_without_values_get_opaque_ids() {
        let mut synth = synth(1);
        let models = synth.shared_models();
        let value = synth.enum_value(models.require("tradle.Industry").unwrap());
        assert!(value["id"].as_str().unwrap().starts_with("tradle.Industry_"));
        assert!(value["title"].is_string());
    }

    #[test]
    fn money_and_phone_are_special_cased() {
        let mut synth = synth(2);
        let money = synth
            .synthesize_reference(ids::MONEY, false, false, &Authorship::anonymous())
            .unwrap();
        assert!(money.side_effects.is_empty());
        assert!(money.value["value"].is_number());
        assert!(money.value["currency"].is_string());

        let phone = synth
            .synthesize_reference(ids::PHONE, false, false, &Authorship::anonymous())
            .unwrap();
        assert!(phone.value["number"].as_str().unwrap().starts_with("+44"));
        assert!(phone.value["phoneType"]["id"]
            .as_str()
            .unwrap()
            .starts_with("tradle.PhoneTypes_"));
    }

    #[test]
    fn non_inlined_reference_yields_stub_and_side_effect() {
        let mut synth = synth(3);
        let employer = synth
            .synthesize_reference("tradle.Organization", false, false, &Authorship::anonymous())
            .unwrap();
        assert_eq!(employer.side_effects.len(), 1);
        let org = &employer.side_effects[0];
        assert_eq!(employer.value[ids::LINK].as_str(), org.link());
        assert_eq!(employer.value[ids::TYPE], json!("tradle.Organization"));

        let models = synth.shared_models();
        StructuralValidator::default()
            .validate(&models, models.require("tradle.Organization").unwrap(), org)
            .unwrap();
    }

    #[test]
    fn inlined_reference_has_no_side_effects() {
        let mut synth = synth(4);
        let photo = synth
            .synthesize_reference("tradle.Photo", false, false, &Authorship::anonymous())
            .unwrap();
        assert!(photo.side_effects.is_empty());
        assert!(photo.value["url"].as_str().unwrap().starts_with("data:image/"));
    }

    #[test]
    fn arrays_stay_within_bounds() {
        let models = ModelRegistry::base().unwrap().normalize().unwrap();
        let mut synth = Synthesizer::new(Arc::new(models), 5).with_options(SynthesisOptions {
            max_array_items: 3,
            ..SynthesisOptions::default()
        });
        for _ in 0..20 {
            let phones = synth
                .synthesize_reference(ids::PHONE, true, false, &Authorship::anonymous())
                .unwrap();
            let len = phones.value.as_array().unwrap().len();
            assert!((1..=3).contains(&len));
        }
    }

    #[test]
    fn unknown_property_is_reported() {
        let mut synth = synth(6);
        let models = synth.shared_models();
        let err = synth
            .synthesize_value(
                models.require("tradle.Selfie").unwrap(),
                "nope",
                &Authorship::anonymous(),
            )
            .unwrap_err();
        assert!(matches!(err, SynthesisError::UnknownProperty { .. }));
    }

    #[test]
    fn unregistered_target_is_model_not_found() {
        let mut synth = synth(7);
        let err = synth
            .synthesize_reference("demo.Missing", false, false, &Authorship::anonymous())
            .unwrap_err();
        assert!(err.is_model_not_found());
    }

    #[test]
    fn self_inlining_models_hit_the_depth_limit() {
        let mut models = ModelRegistry::base().unwrap();
        models.insert(
            Model::new("demo.Node")
                .inlined()
                .with_property("next", Property::object("demo.Node"))
                .with_required(["next"]),
        );
        let models = models.normalize().unwrap();
        let mut synth = Synthesizer::new(Arc::new(models), 8);
        let err = synth
            .synthesize_reference("demo.Node", false, false, &Authorship::anonymous())
            .unwrap_err();
        assert!(matches!(err, SynthesisError::ReferenceDepthExceeded { .. }));
    }

    fn synth_with(extra: Vec<Model>, seed: u64) -> Synthesizer {
        let mut models = ModelRegistry::base().unwrap();
        for model in extra {
            models.insert(model);
        }
        Synthesizer::new(Arc::new(models.normalize().unwrap()), seed)
    }

    #[test]
    fn optional_self_reference_terminates() {
        let node = Model::new("demo.Node")
            .with_property("label", Property::new(PropertyType::String))
            .with_property("parent", Property::object("demo.Node"))
            .with_required(["label"]);
        let mut synth = synth_with(vec![node], 9);

        let node = synth
            .synthesize_resource("demo.Node", &ResourceRequest::new())
            .unwrap();
        assert_eq!(node.side_effects.len(), 1);
        let parent = &node.side_effects[0];
        assert!(parent.contains("label"));
        assert!(!parent.contains("parent"));
        assert_eq!(node.value.get("parent").unwrap()[ids::LINK].as_str(), parent.link());
    }

    #[test]
    fn mutual_optional_references_terminate() {
        let person = Model::new("demo.Person")
            .with_property("name", Property::new(PropertyType::String))
            .with_property("employer", Property::object("demo.Company"))
            .with_required(["name", "employer"]);
        let company = Model::new("demo.Company")
            .with_property("name", Property::new(PropertyType::String))
            .with_property("ceo", Property::object("demo.Person"))
            .with_required(["name"]);
        let mut synth = synth_with(vec![person, company], 10);

        let company = synth
            .synthesize_resource("demo.Company", &ResourceRequest::new())
            .unwrap();
        let types: Vec<_> = company.side_effects.iter().map(|r| r.type_id().unwrap()).collect();
        assert_eq!(types, ["demo.Company", "demo.Person"]);
        assert!(!company.side_effects[0].contains("ceo"));

        let person = synth
            .synthesize_resource("demo.Person", &ResourceRequest::new())
            .unwrap();
        assert_eq!(person.side_effects.len(), 1);
    }

    #[test]
    fn long_required_stub_chain_stays_under_the_limit() {
        let depth = MAX_REFERENCE_DEPTH - 1;
        let chain: Vec<Model> = (0..depth)
            .map(|i| {
                let model = Model::new(format!("demo.Link{i}"));
                if i + 1 < depth {
                    model
                        .with_property("next", Property::object(format!("demo.Link{}", i + 1)))
                        .with_required(["next"])
                } else {
                    model
                }
            })
            .collect();
        let mut synth = synth_with(chain, 11);

        let head = synth
            .synthesize_resource("demo.Link0", &ResourceRequest::new())
            .unwrap();
        assert_eq!(head.side_effects.len(), depth - 1);
    }

    #[test]
    fn required_self_reference_hits_the_depth_limit() {
        let node = Model::new("demo.Loop")
            .with_property("next", Property::object("demo.Loop"))
            .with_required(["next"]);
        let mut synth = synth_with(vec![node], 12);
        let err = synth
            .synthesize_resource("demo.Loop", &ResourceRequest::new())
            .unwrap_err();
        assert!(matches!(err, SynthesisError::ReferenceDepthExceeded { .. }));
    }
}
