#![doc = "portfolio-content-core: typed content gateway and data bindings for a CMS-backed portfolio."]

//! This crate holds the data model, query building, entry normalization, error taxonomy,
//! the [`gateway::ContentGateway`] and the [`binding`] layer. It performs no I/O itself:
//! the remote service is reached through an injected [`contract::ContentSource`].
//!
//! # Usage
//! Construct one gateway at start-up with a concrete source, then build one binding per
//! page section with the constructors in [`binding::content`].

pub mod assets;
pub mod binding;
pub mod config;
pub mod contract;
pub mod error;
pub mod gateway;
pub mod model;
pub mod normalize;
pub mod query;

pub use binding::{Binding, BindingState, Phase};
pub use config::ContentfulConfig;
pub use contract::ContentSource;
pub use error::{ContentError, ErrorKind, SourceError};
pub use gateway::ContentGateway;
