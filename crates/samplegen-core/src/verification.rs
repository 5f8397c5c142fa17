//! Verifications: signed statements by an organization that it checked a
//! form.

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, SecondsFormat};
use rand::Rng;
use serde_json::{json, Value};

use samplegen_models::resource::stub;
use samplegen_models::{ids, Resource};

use crate::error::{Result, SynthesisError};
use crate::synthesizer::Synthesizer;

/// How the subject was checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationProvider {
    /// Document and stub only.
    Generic,
    /// Biometric/document check with a confidence score. Photo IDs only.
    Automated,
    /// Manual visual inspection. Photo IDs only.
    Visual,
}

impl VerificationProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationProvider::Generic => "generic",
            VerificationProvider::Automated => "automated",
            VerificationProvider::Visual => "visual",
        }
    }

    fn requires_photo_id(self) -> bool {
        !matches!(self, VerificationProvider::Generic)
    }
}

impl fmt::Display for VerificationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const MAX_YEARS_AGO: i64 = 10;

impl Synthesizer {
    /// Verify `subject` on behalf of `verifier`. Photo IDs get an automated
    /// or visual check (50/50); everything else a generic one.
    pub fn synthesize_verification(&mut self, subject: &Resource, verifier: &str) -> Result<Resource> {
        let provider = if subject.type_id() == Some(ids::PHOTO_ID) {
            if self.rng.gen_bool(0.5) {
                VerificationProvider::Automated
            } else {
                VerificationProvider::Visual
            }
        } else {
            VerificationProvider::Generic
        };
        self.synthesize_verification_with(provider, subject, verifier)
    }

    pub fn synthesize_verification_with(
        &mut self,
        provider: VerificationProvider,
        subject: &Resource,
        verifier: &str,
    ) -> Result<Resource> {
        let subject_type = subject.type_id().unwrap_or_default();
        if provider.requires_photo_id() && subject_type != ids::PHOTO_ID {
            return Err(SynthesisError::UnsupportedVerificationTarget {
                provider: provider.to_string(),
                expected: ids::PHOTO_ID.to_string(),
                ty: subject_type.to_string(),
            });
        }

        let models = Arc::clone(&self.models);
        models.require(ids::VERIFICATION)?;

        let mut verification = Resource::new(ids::VERIFICATION);
        verification.insert("document", stub(&models, subject)?);
        verification.insert("dateVerified", self.date_verified());
        match provider {
            VerificationProvider::Generic => {}
            VerificationProvider::Automated => {
                let confidence = (100.0 * (0.7 + 0.3 * self.rng.gen::<f64>())).floor() / 100.0;
                let reference = self.fake("random.uuid", &[])?;
                verification.insert("confidence", json!(confidence));
                verification.insert(
                    "method",
                    json!({
                        "type": provider.as_str(),
                        "api": { "name": "document-biometrics" },
                        "aspects": ["document authenticity", "facial similarity"],
                        "reference": reference,
                    }),
                );
            }
            VerificationProvider::Visual => {
                let reviewer = self.fake("name.findName", &[])?;
                verification.insert(
                    "method",
                    json!({
                        "type": provider.as_str(),
                        "aspects": ["visual inspection"],
                        "reviewer": reviewer,
                    }),
                );
            }
        }
        verification.insert(ids::SIG, self.fake("sig", &[])?);
        verification.seal();
        verification.set_virtual([(ids::AUTHOR, Value::String(verifier.to_string()))]);

        tracing::debug!(
            provider = %provider,
            subject = %subject_type,
            link = verification.link().unwrap_or("-"),
            "synthesized verification"
        );
        Ok(verification)
    }

    /// Some time in the last ten years.
    fn date_verified(&mut self) -> Value {
        let years_ago = self.rng.gen_range(0..MAX_YEARS_AGO);
        let at = self.options.now - Duration::days(365 * years_ago);
        json!(at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesizer::ResourceRequest;
    use samplegen_models::{ModelRegistry, StructuralValidator, Validator};

    fn synth(seed: u64) -> Synthesizer {
        let models = ModelRegistry::base().unwrap().normalize().unwrap();
        Synthesizer::new(Arc::new(models), seed)
    }

    fn form(synth: &mut Synthesizer, model: &str) -> Resource {
        synth
            .synthesize_resource(model, &ResourceRequest::new())
            .unwrap()
            .value
    }

    fn assert_valid(synth: &Synthesizer, verification: &Resource) {
        let models = synth.models();
        StructuralValidator::default()
            .validate(models, models.require(ids::VERIFICATION).unwrap(), verification)
            .unwrap_or_else(|e| panic!("{e}"));
    }

    #[test]
    fn generic_verification_for_ordinary_forms() {
        let mut synth = synth(1);
        let subject = form(&mut synth, "tradle.PersonalInfo");
        let verification = synth.synthesize_verification(&subject, "org").unwrap();

        assert_eq!(verification.type_id(), Some(ids::VERIFICATION));
        assert_eq!(verification.get("document").unwrap()[ids::LINK].as_str(), subject.link());
        assert!(verification.get("confidence").is_none());
        assert!(verification.get("method").is_none());
        assert_eq!(verification.author(), Some("org"));
        assert_valid(&synth, &verification);
    }

    #[test]
    fn photo_ids_get_provider_checks() {
        let mut synth = synth(2);
        let mut seen_automated = false;
        let mut seen_visual = false;
        for _ in 0..30 {
            let subject = form(&mut synth, ids::PHOTO_ID);
            let verification = synth.synthesize_verification(&subject, "org").unwrap();
            assert_valid(&synth, &verification);
            match verification.get("method").and_then(|m| m["type"].as_str()) {
                Some("automated") => {
                    seen_automated = true;
                    let confidence = verification.get("confidence").unwrap().as_f64().unwrap();
                    assert!((0.7..=1.0).contains(&confidence));
                }
                Some("visual") => seen_visual = true,
                other => panic!("unexpected method {other:?}"),
            }
        }
        assert!(seen_automated && seen_visual);
    }

    #[test]
    fn provider_checks_reject_other_subjects() {
        let mut synth = synth(3);
        let subject = form(&mut synth, ids::SELFIE);
        let err = synth
            .synthesize_verification_with(VerificationProvider::Automated, &subject, "org")
            .unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::UnsupportedVerificationTarget { ref ty, .. } if ty == ids::SELFIE
        ));
    }
}
