//! # contract: the remote content source seam
//!
//! This module defines the single trait ([`ContentSource`]) through which the gateway
//! reaches the headless CMS, together with the raw response shape it returns.
//!
//! ## Interface & Extensibility
//! - Implement [`ContentSource`] for a concrete transport (the delivery API client in the
//!   CLI crate) or for an in-memory fixture.
//! - The method is async and returns a [`SourceError`] with transport facts only; turning
//!   those into user-facing categories is the gateway's job.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, so consumers get a `MockContentSource` when the
//!   `test-export-mocks` feature is on (default).

use async_trait::async_trait;

#[allow(unused_imports)]
use mockall::{automock, predicate::*};

use crate::error::SourceError;
use crate::query::EntryQuery;

pub use crate::normalize::{EntryCollection, Includes, RawAsset, RawEntry, SysMeta};

/// Read-only access to entries of the remote content service.
///
/// Implementations are constructed once at start-up and injected into
/// [`crate::gateway::ContentGateway`]; there is no process-wide client.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run an entry query, returning the raw collection including linked assets.
    async fn get_entries(&self, query: &EntryQuery) -> Result<EntryCollection, SourceError>;
}
