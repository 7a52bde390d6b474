// Coach: career-coaching AI flows behind an HTTP API, plus the oral interview
// capture state machine that hosts embed next to their speech recognizer.
// The `coach` binary wires these modules into a server.

pub mod config;
pub mod errors;
pub mod flows;
pub mod interview;
pub mod llm_client;
pub mod models;
pub mod routes;
pub mod state;
