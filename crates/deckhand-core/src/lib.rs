//! Core domain types for the deckhand pipeline tool.
//!
//! This crate contains:
//! - The pipeline error type carried into lifecycle hooks
//! - Hook payload models (images, projects, services)
//! - Name sanitizers for environment variables and Kubernetes resources

pub mod deployment;
pub mod error;
pub mod image;
pub mod naming;

pub use deployment::{BasicAuthUser, Project, Service};
pub use error::{Error, Result};
pub use image::DockerImage;
