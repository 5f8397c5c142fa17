//! Workflow assembly: one simulated user's applications for financial
//! products, as an ordered batch of cross-referencing resources.
//!
//! ```text
//! ProductRequest -> {FormRequest?, FormAnswer + Verification}* -> Submitted -> Judged
//! ```
//!
//! Every batch is flattened so that side effects precede the resources that
//! reference them, and validated before it is handed back.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};

use samplegen_models::resource::stub;
use samplegen_models::{
    ids, Model, ModelRegistry, Resource, StructuralValidator, Validator,
};

use crate::assets::AssetPool;
use crate::error::{Result, SynthesisError};
use crate::fakers::{random_hex, FakerRegistry};
use crate::synthesizer::{
    Authorship, Profile, ResourceRequest, SynthesisOptions, Synthesized, Synthesizer,
};

/// Products per simulated user unless a fixed list is given.
pub const PRODUCTS_PER_USER: usize = 3;

#[derive(Debug, Clone)]
pub struct SamplesConfig {
    pub seed: u64,
    /// Organization identifier used as the author of org-side resources.
    /// Drawn at random when unset.
    pub organization: Option<String>,
    /// Fixed product list; eligible products are discovered when unset.
    pub products: Option<Vec<String>>,
    /// Emit a form request before every form answer.
    pub form_requests: bool,
    pub synthesis: SynthesisOptions,
}

impl Default for SamplesConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            organization: None,
            products: None,
            form_requests: false,
            synthesis: SynthesisOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Approved,
    Denied,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Approved => "approved",
            Outcome::Denied => "denied",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormAnswer {
    pub answer: Synthesized<Resource>,
    pub verification: Resource,
}

/// One application, before flattening.
#[derive(Debug, Clone)]
pub struct ApplicationGraph {
    pub product: String,
    pub outcome: Outcome,
    pub product_request: Synthesized<Resource>,
    pub form_requests: Vec<Synthesized<Resource>>,
    pub answers: Vec<FormAnswer>,
    pub submitted: Synthesized<Resource>,
    pub judgement: Synthesized<Resource>,
}

impl ApplicationGraph {
    /// Number of resources the workflow itself emits, side effects aside.
    pub fn primary_count(&self) -> usize {
        1 + self.form_requests.len() + 2 * self.answers.len() + 2
    }

    pub fn side_effect_count(&self) -> usize {
        self.product_request.side_effects.len()
            + self
                .form_requests
                .iter()
                .map(|r| r.side_effects.len())
                .sum::<usize>()
            + self
                .answers
                .iter()
                .map(|a| a.answer.side_effects.len())
                .sum::<usize>()
            + self.submitted.side_effects.len()
            + self.judgement.side_effects.len()
    }

    /// Product request, form requests, each answer followed by its
    /// verification, submission, judgement. Side effects come right before
    /// the resource that produced them.
    pub fn flatten(self) -> Vec<Resource> {
        let mut out = Vec::with_capacity(self.primary_count() + self.side_effect_count());
        out.extend(self.product_request.flatten());
        for request in self.form_requests {
            out.extend(request.flatten());
        }
        for FormAnswer {
            answer,
            verification,
        } in self.answers
        {
            out.extend(answer.flatten());
            out.push(verification);
        }
        out.extend(self.submitted.flatten());
        out.extend(self.judgement.flatten());
        out
    }
}

/// Products a user can apply for: financial products other than
/// remediation, with forms, at least one of which has a faker directive.
/// Products that ask for a selfie come first; the rest is shuffled.
pub fn eligible_products(models: &ModelRegistry, rng: &mut impl Rng) -> Vec<String> {
    let fakeable = |form: &str| {
        models
            .get(form)
            .map(|m| m.properties.values().any(|p| p.faker.is_some()))
            .unwrap_or(false)
    };
    let mut products: Vec<&Model> = models
        .iter()
        .filter(|m| m.is_subclass_of(ids::FINANCIAL_PRODUCT))
        .filter(|m| m.id != ids::REMEDIATION)
        .filter(|m| !m.forms.is_empty())
        .filter(|m| m.forms.iter().any(|f| fakeable(f)))
        .collect();

    products.shuffle(rng);
    products.sort_by_key(|m| !m.all_forms().any(|f| f == ids::SELFIE));

    let eligible: Vec<String> = products.into_iter().map(|m| m.id.clone()).collect();
    tracing::debug!(products = ?eligible, "discovered eligible products");
    eligible
}

/// `id` as a financial product a user can apply for.
fn require_product<'m>(models: &'m ModelRegistry, id: &str) -> Result<&'m Model> {
    models
        .get(id)
        .filter(|m| m.is_subclass_of(ids::FINANCIAL_PRODUCT))
        .filter(|m| m.all_forms().next().is_some())
        .ok_or_else(|| SynthesisError::UnknownProduct { id: id.to_string() })
}

/// Entry point for whole-dataset generation.
pub struct Samples {
    synth: Synthesizer,
    validator: Box<dyn Validator + Send + Sync>,
    organization: String,
    products: Vec<String>,
    form_requests: bool,
}

impl std::fmt::Debug for Samples {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Samples")
            .field("synth", &self.synth)
            .field("organization", &self.organization)
            .field("products", &self.products)
            .field("form_requests", &self.form_requests)
            .finish()
    }
}

impl Samples {
    /// `models` is the merged, *un-normalized* registry; it is normalized
    /// once here.
    pub fn new(models: &ModelRegistry, config: SamplesConfig) -> Result<Self> {
        let normalized = models.normalize()?;
        let mut synth = Synthesizer::new(Arc::new(normalized), config.seed)
            .with_options(config.synthesis);

        let products = match config.products {
            Some(products) => {
                for id in &products {
                    require_product(models, id)?;
                }
                products
            }
            None => eligible_products(models, synth.rng_mut()),
        };
        let organization = match config.organization {
            Some(org) => org,
            None => random_hex(synth.rng_mut(), 32),
        };

        tracing::info!(
            models = models.len(),
            products = products.len(),
            organization = %organization,
            "sample generator ready"
        );
        Ok(Self {
            synth,
            validator: Box::new(StructuralValidator::default()),
            organization,
            products,
            form_requests: config.form_requests,
        })
    }

    pub fn with_fakers(mut self, fakers: FakerRegistry) -> Self {
        self.synth = self.synth.with_fakers(fakers);
        self
    }

    pub fn with_assets(mut self, assets: Arc<dyn AssetPool>) -> Self {
        if assets.is_empty() {
            tracing::warn!("asset pool is empty; faces fall back to a placeholder image");
        }
        self.synth = self.synth.with_assets(assets);
        self
    }

    pub fn with_validator(mut self, validator: Box<dyn Validator + Send + Sync>) -> Self {
        self.validator = validator;
        self
    }

    /// The normalized registry.
    pub fn models(&self) -> &ModelRegistry {
        self.synth.models()
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn synthesizer_mut(&mut self) -> &mut Synthesizer {
        &mut self.synth
    }

    /// One resource of `model_id` with its side effects, validated.
    pub fn one(&mut self, model_id: &str, author: Option<&str>) -> Result<Vec<Resource>> {
        let request = ResourceRequest::new().authored(Authorship {
            author: author.map(str::to_string),
            profile: None,
        });
        let batch = self.synth.synthesize_resource(model_id, &request)?.flatten();
        self.validate_all(&batch)?;
        Ok(batch)
    }

    /// `count` resources per model id.
    pub fn by_type(&mut self, counts: &BTreeMap<String, usize>) -> Result<Vec<Resource>> {
        let mut out = Vec::new();
        for (model_id, count) in counts {
            for _ in 0..*count {
                out.extend(self.one(model_id, None)?);
            }
        }
        tracing::info!(resources = out.len(), "generated samples by type");
        Ok(out)
    }

    /// A verification of `subject` by the organization.
    pub fn verification(&mut self, subject: &Resource) -> Result<Resource> {
        let verification = self
            .synth
            .synthesize_verification(subject, &self.organization)?;
        self.validate_all(std::slice::from_ref(&verification))?;
        Ok(verification)
    }

    /// Flattened, validated application batch.
    pub fn application(&mut self, author: &str, profile: &Profile, product: &str) -> Result<Vec<Resource>> {
        let batch = self.assemble_application(author, profile, product)?.flatten();
        self.validate_all(&batch)?;
        Ok(batch)
    }

    pub fn assemble_application(
        &mut self,
        author: &str,
        profile: &Profile,
        product: &str,
    ) -> Result<ApplicationGraph> {
        let models = self.synth.shared_models();
        let product_model = require_product(&models, product)?;
        let user = Authorship::user(author, profile.clone());
        let org = Authorship::by(self.organization.clone());

        let product_request = self.synth.synthesize_resource(
            ids::PRODUCT_REQUEST,
            &ResourceRequest::new()
                .set("product", json!(product))
                .authored(user.clone()),
        )?;

        let mut form_requests = Vec::new();
        let mut answers = Vec::new();
        for form in product_model.all_forms() {
            if self.form_requests {
                form_requests.push(self.synth.synthesize_resource(
                    ids::FORM_REQUEST,
                    &ResourceRequest::new()
                        .set("product", json!(product))
                        .set("form", json!(form))
                        .exclude("prefill")
                        .authored(org.clone()),
                )?);
            }
            let answer = self
                .synth
                .synthesize_resource(form, &ResourceRequest::new().authored(user.clone()))?;
            let verification = self
                .synth
                .synthesize_verification(&answer.value, &self.organization)?;
            answers.push(FormAnswer {
                answer,
                verification,
            });
        }

        let form_stubs = answers
            .iter()
            .map(|a| stub(&models, &a.answer.value))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let title = product_model.display_title();

        let submitted = self.synthesize_workflow_step(
            models.require(ids::APPLICATION_SUBMITTED)?,
            &org,
            &form_stubs,
            product,
            format!("Your application for a {title} has been submitted"),
        )?;

        let outcome = if self.synth.rng_mut().gen_bool(0.5) {
            Outcome::Approved
        } else {
            Outcome::Denied
        };
        let judgement_model = match outcome {
            Outcome::Approved => {
                let my_product = ids::my_product_id(product);
                match models.get(&my_product) {
                    Some(model) => model,
                    None => {
                        tracing::warn!(
                            product = %product,
                            missing = %my_product,
                            "MissingJudgementModel: falling back to a confirmation"
                        );
                        models.require(ids::CONFIRMATION)?
                    }
                }
            }
            Outcome::Denied => models.require(ids::APPLICATION_DENIAL)?,
        };
        let judgement = self.synthesize_workflow_step(
            judgement_model,
            &org,
            &form_stubs,
            product,
            format!("Your application for a {title} was {}", outcome.as_str()),
        )?;

        let graph = ApplicationGraph {
            product: product.to_string(),
            outcome,
            product_request,
            form_requests,
            answers,
            submitted,
            judgement,
        };
        tracing::debug!(
            product = %product,
            outcome = outcome.as_str(),
            resources = graph.primary_count(),
            side_effects = graph.side_effect_count(),
            "assembled application"
        );
        Ok(graph)
    }

    /// Submission markers and judgements: the answers' stubs, the product and
    /// a message, for whichever of those the model declares.
    fn synthesize_workflow_step(
        &mut self,
        model: &Model,
        author: &Authorship,
        form_stubs: &[Value],
        product: &str,
        message: String,
    ) -> Result<Synthesized<Resource>> {
        let mut request = ResourceRequest::new().authored(author.clone());
        let fixed = [
            ("forms", Value::Array(form_stubs.to_vec())),
            ("confirmationFor", json!(product)),
            ("message", Value::String(message)),
        ];
        for (name, value) in fixed {
            if model.properties.contains_key(name) {
                request = request.set(name, value);
            }
        }
        self.synth.synthesize_resource(&model.id, &request)
    }

    /// All applications of one simulated user. `products` overrides the
    /// random pick of up to three eligible products.
    pub fn user(&mut self, author: Option<&str>, products: Option<&[String]>) -> Result<Vec<Resource>> {
        let author = match author {
            Some(author) => author.to_string(),
            None => self.synth.fake_string("hash")?,
        };
        let profile = Profile::new(
            self.synth.fake_string("name.firstName")?,
            self.synth.fake_string("name.lastName")?,
        );
        let products: Vec<String> = match products {
            Some(products) => products.to_vec(),
            None => self
                .products
                .choose_multiple(self.synth.rng_mut(), PRODUCTS_PER_USER)
                .cloned()
                .collect(),
        };
        if products.is_empty() {
            return Err(SynthesisError::NoEligibleProducts);
        }

        let mut out = Vec::new();
        for product in &products {
            out.extend(self.application(&author, &profile, product)?);
        }
        tracing::debug!(
            author = %author,
            name = %profile.full_name(),
            products = products.len(),
            resources = out.len(),
            "generated user"
        );
        Ok(out)
    }

    pub fn users(&mut self, count: usize) -> Result<Vec<Resource>> {
        let mut out = Vec::new();
        for _ in 0..count {
            out.extend(self.user(None, None)?);
        }
        tracing::info!(users = count, resources = out.len(), "generated users");
        Ok(out)
    }

    fn validate_all(&self, batch: &[Resource]) -> Result<()> {
        let models = self.synth.models();
        for resource in batch {
            let ty = resource.type_id().unwrap_or_default();
            let model = models.require(ty)?;
            self.validator
                .validate(models, model, resource)
                .map_err(|source| SynthesisError::InvalidGeneratedResource {
                    ty: ty.to_string(),
                    link: resource.link().unwrap_or("-").to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}
