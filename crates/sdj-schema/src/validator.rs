//! # Resolution-Aware Validator
//!
//! Composes envelope shape checking, envelope splitting, key parsing,
//! schema resolution, and payload validation into the four public
//! operations of [`Validator`].
//!
//! Each call walks
//! `Start → EnvelopeShapeChecked → Split → [CriterionChecked] → SchemaResolved → PayloadValidated`
//! and stops at the first failing transition. Errors from different stages
//! are never merged. No retries happen here; the attempt budget is handed to
//! the resolver unchanged.

use sdj_core::{
    envelope, FailureKind, ProcessingMessage, SchemaCriterion, SchemaKey, ValidationErrors,
    ValidationResult,
};
use serde_json::Value;

use crate::engine::{JsonSchemaEngine, SchemaEngine};
use crate::meta;
use crate::resolver::Resolver;

/// Attempt budget passed to the resolver for every lookup.
pub const RESOLUTION_ATTEMPTS: u32 = 3;

/// Validates self-describing JSON against resolver-supplied schemas.
///
/// Stateless apart from the engine; one instance can serve concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct Validator<E = JsonSchemaEngine> {
    engine: E,
}

impl Validator<JsonSchemaEngine> {
    /// A validator using the `jsonschema`-backed engine.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: SchemaEngine> Validator<E> {
    pub fn with_engine(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Compile `schema` and validate `instance` against it.
    ///
    /// Returns `instance` unchanged on success. A compile failure and the
    /// structural violations share the same message shape.
    pub fn validate_against_schema(
        &self,
        instance: &Value,
        schema: &Value,
    ) -> ValidationResult<Value> {
        let compiled = self.engine.compile(schema)?;
        self.engine.validate(&compiled, instance)?;
        Ok(instance.clone())
    }

    /// Check that `instance` has the envelope shape, using the meta-schema
    /// obtained from `resolver`.
    ///
    /// Says nothing about whether the referenced schema exists or whether
    /// the payload conforms to it.
    pub fn validate_as_self_describing<R>(
        &self,
        resolver: &R,
        instance: &Value,
    ) -> ValidationResult<Value>
    where
        R: Resolver + ?Sized,
    {
        let _span = tracing::debug_span!("validate_as_self_describing").entered();
        let result = self.check_envelope_shape(resolver, instance);
        log_outcome(&result);
        result.map(|()| instance.clone())
    }

    /// Validate `instance` and return the key it declares.
    ///
    /// The returned document is the `data` payload when `data_only` is set,
    /// otherwise the whole envelope.
    pub fn validate_and_identify_schema<R>(
        &self,
        resolver: &R,
        instance: &Value,
        data_only: bool,
    ) -> ValidationResult<(SchemaKey, Value)>
    where
        R: Resolver + ?Sized,
    {
        let _span = tracing::debug_span!("validate_and_identify_schema", data_only).entered();
        let result = self.run_pipeline(resolver, instance, None, data_only);
        log_outcome(&result);
        result
    }

    /// As [`Validator::validate_and_identify_schema`], additionally requiring
    /// the declared key to satisfy `criterion`.
    ///
    /// A mismatch fails with exactly one
    /// [`FailureKind::SchemaCriterionMismatch`] message before the user
    /// schema is resolved.
    pub fn verify_schema_and_validate<R>(
        &self,
        resolver: &R,
        instance: &Value,
        criterion: &SchemaCriterion,
        data_only: bool,
    ) -> ValidationResult<(SchemaKey, Value)>
    where
        R: Resolver + ?Sized,
    {
        let _span = tracing::debug_span!(
            "verify_schema_and_validate",
            criterion = %criterion,
            data_only
        )
        .entered();
        let result = self.run_pipeline(resolver, instance, Some(criterion), data_only);
        log_outcome(&result);
        result
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    fn check_envelope_shape<R>(&self, resolver: &R, instance: &Value) -> ValidationResult<()>
    where
        R: Resolver + ?Sized,
    {
        let meta_schema = resolver.lookup_schema(&meta::self_describing_key(), RESOLUTION_ATTEMPTS)?;
        let compiled = self.engine.compile(&meta_schema)?;
        self.engine.validate(&compiled, instance)
    }

    fn run_pipeline<R>(
        &self,
        resolver: &R,
        instance: &Value,
        criterion: Option<&SchemaCriterion>,
        data_only: bool,
    ) -> ValidationResult<(SchemaKey, Value)>
    where
        R: Resolver + ?Sized,
    {
        self.check_envelope_shape(resolver, instance)?;
        let envelope = envelope::split(instance)?;
        let key = envelope.schema_key()?;
        tracing::trace!(schema = %key, "envelope identified");

        if let Some(criterion) = criterion {
            if !criterion.matches(&key) {
                return Err(ValidationErrors::one(criterion_mismatch(criterion, &key)));
            }
        }

        let schema = resolver.lookup_schema(&key, RESOLUTION_ATTEMPTS)?;
        let compiled = self.engine.compile(&schema)?;
        self.engine.validate(&compiled, envelope.data())?;

        let document = if data_only {
            envelope.data().clone()
        } else {
            instance.clone()
        };
        Ok((key, document))
    }
}

fn criterion_mismatch(criterion: &SchemaCriterion, key: &SchemaKey) -> ProcessingMessage {
    ProcessingMessage::new(
        FailureKind::SchemaCriterionMismatch,
        format!("verifying schema as {criterion} failed: found {key}"),
    )
    .with_targets([criterion.to_string(), key.to_string()])
}

fn log_outcome<T>(result: &ValidationResult<T>) {
    match result {
        Ok(_) => tracing::trace!("validation succeeded"),
        Err(errors) => tracing::debug!(
            kind = %errors.first().kind(),
            errors = errors.len(),
            "validation failed"
        ),
    }
}
