// AI flow orchestration: schema validation, prompt templates, model invocation,
// the flow registry/executor, and the seven-flow coaching catalog.
// All model calls go through ModelInvoker; the backend is injected.

pub mod catalog;
pub mod coaching;
pub mod contracts;
pub mod handlers;
pub mod invoker;
pub mod prompts;
pub mod registry;
pub mod schema;
pub mod template;

#[cfg(test)]
pub(crate) mod stub;

// Re-export the public API consumed by main, config and state.
pub use catalog::default_registry;
pub use invoker::{ModelInvoker, RetryPolicy};
pub use registry::FlowExecutor;
