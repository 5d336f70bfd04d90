//! Environment-driven settings resolution for deckhand.
//!
//! This crate handles:
//! - Typed parsing of raw environment values
//! - CI provider detection and variable mapping
//! - Artifact `.env` files shared between pipeline jobs
//! - Layered resolution of the settings schema
//! - Kubeconfig discovery per deployment track

pub mod artifacts;
pub mod ci;
pub mod environment;
pub mod envfile;
pub mod error;
pub mod global;
pub mod kubeconfig;
pub mod parsers;
pub mod resolver;
pub mod schema;

pub use ci::{CiProvider, ProviderKind};
pub use environment::Environment;
pub use error::{ConfigError, ConfigResult};
pub use parsers::{ParseError, ParseOptions, Value, ValueParser};
pub use resolver::ConfigResolver;
pub use schema::{DefaultValue, Settings, VARIABLES, VariableDefinition};
