//! Resource-level synthesis: whole resources, inlined values and stubs.

use std::sync::Arc;

use serde_json::Value;

use samplegen_models::resource::{stub, title};
use samplegen_models::{ids, Model, Resource};

use crate::error::Result;
use crate::synthesizer::{Authorship, ResourceRequest, Synthesized, Synthesizer};

/// Which declared properties get a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fill {
    /// Every declared property.
    All,
    /// The `required` list, or every property when it is empty.
    RequiredOrAll,
}

impl Fill {
    /// Standalone resources: everything at the top level, only the required
    /// list once nested behind a reference, so optional cycles terminate.
    fn standalone(depth: usize) -> Self {
        if depth == 0 {
            Fill::All
        } else {
            Fill::RequiredOrAll
        }
    }
}

fn fillable<'m>(model: &'m Model, fill: Fill, exclude: &[String]) -> Vec<&'m str> {
    let candidates: Vec<&'m str> = match fill {
        Fill::RequiredOrAll if !model.required.is_empty() => model
            .required
            .iter()
            .map(String::as_str)
            .filter(|name| model.properties.contains_key(*name))
            .collect(),
        _ => model.properties.keys().map(String::as_str).collect(),
    };

    candidates
        .into_iter()
        .filter(|name| !ids::COMPUTED.contains(name))
        .filter(|name| !exclude.iter().any(|excluded| excluded == name))
        .filter(|name| {
            model
                .property(name)
                .map(|p| p.displays_as.is_none() && !p.is_backlink())
                .unwrap_or(false)
        })
        .collect()
}

impl Synthesizer {
    /// Synthesize a complete, signed resource of `model_id`, plus every
    /// resource its references required. Referenced standalone resources
    /// carry only their required properties.
    pub fn synthesize_resource(
        &mut self,
        model_id: &str,
        request: &ResourceRequest,
    ) -> Result<Synthesized<Resource>> {
        let models = Arc::clone(&self.models);
        let model = models.require(model_id)?;
        self.synthesize_model(model, request)
    }

    /// A fresh standalone resource of `model_id` reduced to a stub. The full
    /// resource is the last side effect.
    pub fn synthesize_stub(
        &mut self,
        model_id: &str,
        authorship: &Authorship,
    ) -> Result<Synthesized<Value>> {
        let models = Arc::clone(&self.models);
        let model = models.require(model_id)?;
        self.synthesize_stub_of(model, authorship)
    }

    pub(crate) fn synthesize_stub_of(
        &mut self,
        model: &Model,
        authorship: &Authorship,
    ) -> Result<Synthesized<Value>> {
        let request = ResourceRequest::new().authored(authorship.clone());
        let Synthesized {
            value: resource,
            mut side_effects,
        } = self.synthesize_model(model, &request)?;
        let stub = stub(&self.models, &resource)?;
        side_effects.push(resource);
        Ok(Synthesized {
            value: stub,
            side_effects,
        })
    }

    /// Expand an inlined model in place. Only its required properties are
    /// filled (all of them when it declares none).
    pub(crate) fn synthesize_inlined(
        &mut self,
        model: &Model,
        authorship: &Authorship,
    ) -> Result<Synthesized<Value>> {
        let mut out = Synthesized::new(Resource::new(&model.id));
        for name in fillable(model, Fill::RequiredOrAll, &[]) {
            let value = self.synthesize_value(model, name, authorship)?;
            let value = out.absorb(value);
            out.value.insert(name, value);
        }
        if let Some(profile) = &authorship.profile {
            profile.apply(model, &mut out.value);
        }
        Ok(out.map(Resource::into_value))
    }

    fn synthesize_model(
        &mut self,
        model: &Model,
        request: &ResourceRequest,
    ) -> Result<Synthesized<Resource>> {
        let authorship = &request.authorship;
        let mut out = Synthesized::new(Resource::new(&model.id));

        let fill = Fill::standalone(self.depth);
        for name in fillable(model, fill, &request.exclude) {
            if request.overrides.contains_key(name) {
                continue;
            }
            let value = self.synthesize_value(model, name, authorship)?;
            let value = out.absorb(value);
            out.value.insert(name, value);
        }

        let resource = &mut out.value;
        for (name, value) in &request.overrides {
            resource.insert(name.clone(), value.clone());
        }
        if let Some(profile) = &authorship.profile {
            profile.apply(model, resource);
        }

        let declared_virtual: Vec<(String, Value)> = model
            .properties
            .iter()
            .filter(|(name, property)| property.is_virtual && !ids::COMPUTED.contains(&name.as_str()))
            .filter_map(|(name, _)| resource.get(name).map(|value| (name.clone(), value.clone())))
            .collect();
        resource.set_virtual(declared_virtual);

        resource.seal();

        let author = match &authorship.author {
            Some(author) => author.clone(),
            None => self.fake_string("author")?,
        };
        let resource = &mut out.value;
        resource.set_virtual([(ids::AUTHOR, Value::String(author))]);
        if let Some(display_name) = title(&self.models, model, resource) {
            resource.set_virtual([(ids::DISPLAY_NAME, Value::String(display_name))]);
        }
        if let Some(profile) = &authorship.profile {
            resource.set_virtual([(ids::AUTHOR_TITLE, Value::String(profile.full_name()))]);
        }

        tracing::debug!(
            model = %model.id,
            link = resource.link().unwrap_or("-"),
            side_effects = out.side_effects.len(),
            "synthesized resource"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesizer::{Profile, SynthesisOptions};
    use chrono::{TimeZone, Utc};
    use samplegen_models::{ModelRegistry, StructuralValidator, Validator};
    use serde_json::json;

    fn synth(seed: u64) -> Synthesizer {
        let models = ModelRegistry::base().unwrap().normalize().unwrap();
        Synthesizer::new(Arc::new(models), seed).with_options(SynthesisOptions {
            now: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            ..SynthesisOptions::default()
        })
    }

    fn assert_valid(synth: &Synthesizer, resource: &Resource) {
        let models = synth.models();
        let model = models.require(resource.type_id().unwrap()).unwrap();
        StructuralValidator::default()
            .validate(models, model, resource)
            .unwrap_or_else(|e| panic!("{e}"));
    }

    #[test]
    fn resources_are_signed_linked_and_valid() {
        let mut synth = synth(1);
        let form = synth
            .synthesize_resource("tradle.PersonalInfo", &ResourceRequest::new())
            .unwrap();
        let resource = &form.value;

        assert_eq!(resource.type_id(), Some("tradle.PersonalInfo"));
        assert!(resource.is_signed());
        assert_eq!(resource.link(), resource.permalink());
        assert_eq!(resource.link(), Some(resource.compute_link().as_str()));
        assert!(resource.author().is_some());
        assert!(resource.get("fullName").is_none());
        assert_valid(&synth, resource);
    }

    #[test]
    fn every_side_effect_is_a_valid_resource_behind_a_stub() {
        let mut synth = synth(2);
        let employment = synth
            .synthesize_resource("tradle.EmploymentInfo", &ResourceRequest::new())
            .unwrap();
        assert_eq!(employment.side_effects.len(), 1);
        let org = &employment.side_effects[0];
        assert_valid(&synth, org);
        assert_eq!(
            employment.value.get("employer").unwrap()[ids::LINK].as_str(),
            org.link()
        );
        assert_valid(&synth, &employment.value);
    }

    #[test]
    fn declared_virtual_properties_are_excluded_from_the_link() {
        let mut synth = synth(3);
        let mut form = synth
            .synthesize_resource("tradle.PersonalInfo", &ResourceRequest::new())
            .unwrap()
            .value;
        assert!(form.virtual_fields().iter().any(|name| name == "age"));
        let link = form.link().map(str::to_string);
        form.insert("age", json!(200));
        assert_eq!(Some(form.compute_link()), link);
    }

    #[test]
    fn overrides_and_profile_are_hashed() {
        let mut synth = synth(4);
        let request = ResourceRequest::new()
            .set("emailAddress", json!("ada@example.com"))
            .authored(Authorship::user("user-1", Profile::new("Ada", "Lovelace")));
        let form = synth
            .synthesize_resource("tradle.PersonalInfo", &request)
            .unwrap()
            .value;

        assert_eq!(form.get_str("emailAddress"), Some("ada@example.com"));
        assert_eq!(form.get_str("firstName"), Some("Ada"));
        assert_eq!(form.get_str("lastName"), Some("Lovelace"));
        assert_eq!(form.author(), Some("user-1"));
        assert_eq!(form.get_str(ids::DISPLAY_NAME), Some("Ada Lovelace"));
        assert_eq!(form.get_str(ids::AUTHOR_TITLE), Some("Ada Lovelace"));
        assert_valid(&synth, &form);
    }

    #[test]
    fn excluded_properties_are_left_out() {
        let mut synth = synth(5);
        let request = ResourceRequest::new().exclude("prefill");
        let form_request = synth
            .synthesize_resource("tradle.FormRequest", &request)
            .unwrap()
            .value;
        assert!(!form_request.contains("prefill"));
        assert!(form_request.contains("product"));
    }

    #[test]
    fn backlinks_are_not_synthesized() {
        let mut synth = synth(6);
        let org = synth
            .synthesize_resource("tradle.Organization", &ResourceRequest::new())
            .unwrap();
        assert!(!org.value.contains("employees"));
        assert!(org.side_effects.is_empty());
    }

    #[test]
    fn stub_points_at_last_side_effect() {
        let mut synth = synth(7);
        let stub = synth
            .synthesize_stub("tradle.Organization", &Authorship::by("org"))
            .unwrap();
        let full = stub.side_effects.last().unwrap();
        assert_eq!(stub.value[ids::LINK].as_str(), full.link());
        assert_eq!(stub.value[ids::DISPLAY_NAME].as_str(), full.get_str("name"));
        assert_eq!(full.author(), Some("org"));
    }

    #[test]
    fn same_seed_same_resource() {
        let a = synth(42)
            .synthesize_resource("tradle.PhotoID", &ResourceRequest::new())
            .unwrap();
        let b = synth(42)
            .synthesize_resource("tradle.PhotoID", &ResourceRequest::new())
            .unwrap();
        assert_eq!(a.value.link(), b.value.link());
    }
}
