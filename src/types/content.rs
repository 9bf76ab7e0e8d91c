//! Assembled content results.

use crate::error::{Result, SfsError};
use crate::types::{AppFile, ContentId, File};

/// The resolved, fully-described result of a download-info query.
///
/// Owns its [`ContentId`], the ordered [`File`] list, and the
/// correlation-vector string the exchange was issued under (useful when
/// raising a support request about a specific resolution).
#[derive(Debug)]
pub struct Content {
    content_id: ContentId,
    correlation_vector: String,
    files: Vec<File>,
}

impl Content {
    pub(crate) fn new(
        content_id: ContentId,
        correlation_vector: String,
        files: Vec<File>,
    ) -> Result<Self> {
        if correlation_vector.is_empty() {
            return Err(SfsError::Unexpected(
                "content assembled without a correlation vector".to_string(),
            ));
        }
        Ok(Content {
            content_id,
            correlation_vector,
            files,
        })
    }

    /// The resolved content identity.
    pub fn id(&self) -> &ContentId {
        &self.content_id
    }

    /// The correlation vector the resolution was issued under.
    pub fn correlation_vector(&self) -> &str {
        &self.correlation_vector
    }

    /// The downloadable files, in service order.
    pub fn files(&self) -> &[File] {
        &self.files
    }
}

/// The app-content result: adds the update identifier, ordered
/// prerequisites, and app-variant files.
#[derive(Debug)]
pub struct AppContent {
    content_id: ContentId,
    correlation_vector: String,
    update_id: String,
    prerequisites: Vec<ContentId>,
    files: Vec<AppFile>,
}

impl AppContent {
    pub(crate) fn new(
        content_id: ContentId,
        correlation_vector: String,
        update_id: String,
        prerequisites: Vec<ContentId>,
        files: Vec<AppFile>,
    ) -> Result<Self> {
        if correlation_vector.is_empty() {
            return Err(SfsError::Unexpected(
                "content assembled without a correlation vector".to_string(),
            ));
        }
        if update_id.is_empty() {
            return Err(SfsError::ServiceInvalidResponse(
                "UpdateId is empty in response".to_string(),
            ));
        }
        Ok(AppContent {
            content_id,
            correlation_vector,
            update_id,
            prerequisites,
            files,
        })
    }

    /// The resolved content identity.
    pub fn id(&self) -> &ContentId {
        &self.content_id
    }

    /// The correlation vector the resolution was issued under.
    pub fn correlation_vector(&self) -> &str {
        &self.correlation_vector
    }

    /// The service-assigned update identifier.
    pub fn update_id(&self) -> &str {
        &self.update_id
    }

    /// Content that must be installed before this one, in service order.
    pub fn prerequisites(&self) -> &[ContentId] {
        &self.prerequisites
    }

    /// The downloadable app files, in service order.
    pub fn files(&self) -> &[AppFile] {
        &self.files
    }
}
