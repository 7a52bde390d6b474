//! Flow Registry & Executor.
//!
//! Pipeline per call: lookup → validate input → render → invoke → validate output.
//! The registry is frozen before the executor is built, so both are shared
//! across requests through `Arc` with no locking.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::flows::invoker::{ModelError, ModelInvoker};
use crate::flows::schema::{validate, FlowValue, Schema, ValidationErrors};
use crate::flows::template::{Template, TemplateError};

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("flow '{0}' is already registered")]
    DuplicateFlowName(String),

    #[error("template for flow '{flow}' is invalid: {source}")]
    Template {
        flow: String,
        #[source]
        source: TemplateError,
    },
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid input: {0}")]
    InputInvalid(ValidationErrors),

    #[error("flow '{0}' not found")]
    FlowNotFound(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("model output failed validation: {0}")]
    OutputInvalid(ValidationErrors),

    /// A typed request/response could not be mapped to or from the flow's value bag.
    #[error("contract mismatch: {0}")]
    Contract(#[from] serde_json::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Definitions
// ────────────────────────────────────────────────────────────────────────────

/// A named flow. Immutable once registered.
#[derive(Debug, Clone)]
pub struct FlowDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Schema,
    pub output_schema: Schema,
    pub template: Template,
}

impl FlowDefinition {
    /// Compiles `template` up front so a malformed prompt fails at startup.
    pub fn new(
        name: &'static str,
        description: &'static str,
        input_schema: Schema,
        output_schema: Schema,
        template: &str,
    ) -> Result<Self, RegistryError> {
        let template = Template::parse(template).map_err(|source| RegistryError::Template {
            flow: name.to_string(),
            source,
        })?;
        Ok(Self {
            name,
            description,
            input_schema,
            output_schema,
            template,
        })
    }
}

#[derive(Debug, Default)]
pub struct FlowRegistry {
    flows: HashMap<&'static str, Arc<FlowDefinition>>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: FlowDefinition) -> Result<(), RegistryError> {
        if self.flows.contains_key(definition.name) {
            return Err(RegistryError::DuplicateFlowName(definition.name.to_string()));
        }
        self.flows.insert(definition.name, Arc::new(definition));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<FlowDefinition>> {
        self.flows.get(name).cloned()
    }

    /// Registered flow names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.flows.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Executor
// ────────────────────────────────────────────────────────────────────────────

/// Runs registered flows against an injected model invoker.
pub struct FlowExecutor {
    registry: Arc<FlowRegistry>,
    invoker: ModelInvoker,
}

impl FlowExecutor {
    pub fn new(registry: FlowRegistry, invoker: ModelInvoker) -> Self {
        Self {
            registry: Arc::new(registry),
            invoker,
        }
    }

    pub fn flow_names(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    pub fn definition(&self, name: &str) -> Option<Arc<FlowDefinition>> {
        self.registry.get(name)
    }

    /// Runs flow `name` with `input`. All-or-nothing: either a validated
    /// output or a typed failure, never a partially checked value.
    pub async fn run(&self, name: &str, input: &Value) -> Result<FlowValue, FlowError> {
        let invocation_id = Uuid::new_v4();
        let span = info_span!("flow", flow = name, invocation_id = %invocation_id);
        self.run_inner(name, input).instrument(span).await
    }

    async fn run_inner(&self, name: &str, input: &Value) -> Result<FlowValue, FlowError> {
        let definition = self
            .registry
            .get(name)
            .ok_or_else(|| FlowError::FlowNotFound(name.to_string()))?;

        let context = validate(&definition.input_schema, input).map_err(|errors| {
            warn!("rejected input for flow '{}': {}", name, errors);
            FlowError::InputInvalid(errors)
        })?;

        let prompt = definition.template.render(&context);

        let raw = self
            .invoker
            .invoke(definition.name, prompt, &definition.output_schema)
            .await
            .map_err(|err| {
                warn!("flow '{}' model call failed: {}", name, err);
                FlowError::Model(err)
            })?;

        let output = validate(&definition.output_schema, &raw).map_err(|errors| {
            warn!("flow '{}' produced non-conforming output: {}", name, errors);
            FlowError::OutputInvalid(errors)
        })?;

        info!("flow '{}' completed", name);
        Ok(output)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
