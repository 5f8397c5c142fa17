use samplegen_models::{ModelError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthesisError {
    /// `ModelNotFound`, `UnknownPropertyType`, ...
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("model `{model}` has no property `{property}`")]
    UnknownProperty { model: String, property: String },

    #[error("unknown faker directive `{name}`")]
    UnknownDirective { name: String },

    #[error("faker directive `{name}`: {message}")]
    InvalidDirectiveArguments { name: String, message: String },

    #[error("{provider} verification needs a `{expected}` subject, got `{ty}`")]
    UnsupportedVerificationTarget {
        provider: String,
        expected: String,
        ty: String,
    },

    #[error("generated `{ty}` resource {link} is invalid: {source}")]
    InvalidGeneratedResource {
        ty: String,
        link: String,
        #[source]
        source: ValidationError,
    },

    #[error("reference depth {depth} exceeded while synthesizing `{model}` (cyclic inlined or required references?)")]
    ReferenceDepthExceeded { model: String, depth: usize },

    #[error("no eligible financial products in the model registry")]
    NoEligibleProducts,

    #[error("`{id}` is not a registered financial product with forms")]
    UnknownProduct { id: String },
}

impl SynthesisError {
    pub fn is_model_not_found(&self) -> bool {
        matches!(self, SynthesisError::Model(ModelError::ModelNotFound { .. }))
    }
}

pub type Result<T, E = SynthesisError> = std::result::Result<T, E>;
