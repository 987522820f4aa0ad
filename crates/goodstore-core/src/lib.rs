//! Core types and trait definitions for the goodstore pipeline.
//!
//! This crate holds the domain model, the scoring rules, and the two
//! write-path drivers (the [`reconcile::Reconciler`] and the
//! [`bulk::BulkLoader`]). It is free of HTTP and database dependencies; storage
//! backends implement [`repository::StoreRepository`] and address lookups
//! implement [`geocode::Geocoder`].

// Trait methods declare `+ Send` futures explicitly; implementors use
// `async fn`.
#![allow(async_fn_in_trait)]

pub mod bulk;
pub mod candidate;
pub mod error;
pub mod geocode;
pub mod reconcile;
pub mod repository;
pub mod score;
pub mod store;
pub mod taxonomy;

pub use error::{Error, PipelineError, Result};
