//! Public value objects returned to callers.
//!
//! These mirror the wire-shaped entities in [`crate::entity`] but are the
//! supported, stable surface: immutable (private fields, accessor methods)
//! and move-only (no `Clone`), constructed only through validating factories
//! so an instance is either fully valid or never exists.
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ContentId`] | One resolved content version (namespace, name, version) |
//! | [`File`] | A downloadable file with hashes and size |
//! | [`Content`] | A content id plus its files and the request's correlation vector |
//! | [`AppFile`] / [`AppContent`] | App variants carrying moniker, applicability, prerequisites |
//! | [`HashType`] | Closed set of supported hash algorithms |
//!
//! Ownership is strictly tree-shaped: a [`Content`] exclusively owns its
//! [`File`]s, a [`File`] owns its hash map and optional
//! [`DeliveryOptimizationData`]. Nothing is shared, nothing is cyclic.

mod content;
mod content_id;
mod file;

pub use content::{AppContent, Content};
pub use content_id::ContentId;
pub use file::{AppFile, ApplicabilityDetails, DeliveryOptimizationData, File, HashType};
