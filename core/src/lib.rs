//! Move choice on top of the search engine and the shared evaluator parameters.

mod agent;
mod error;

pub use agent::{Agent, AgentConfig, Decision, Randomize};
pub use error::AgentError;
