//! Content version identity.

use crate::entity::ContentIdEntity;
use crate::error::{Result, SfsError};

/// Identifies one resolved content version.
///
/// Equality is case-sensitive exact string match; namespaces and names may
/// be arbitrary UTF-8.
#[derive(Debug, PartialEq, Eq)]
pub struct ContentId {
    namespace: String,
    name: String,
    version: String,
}

impl ContentId {
    /// Build a validated identifier. All three components must be non-empty.
    pub(crate) fn new(namespace: String, name: String, version: String) -> Result<Self> {
        if namespace.is_empty() {
            return Err(SfsError::InvalidArgument(
                "ContentId namespace cannot be empty".to_string(),
            ));
        }
        if name.is_empty() {
            return Err(SfsError::InvalidArgument(
                "ContentId name cannot be empty".to_string(),
            ));
        }
        if version.is_empty() {
            return Err(SfsError::InvalidArgument(
                "ContentId version cannot be empty".to_string(),
            ));
        }
        Ok(ContentId {
            namespace,
            name,
            version,
        })
    }

    pub(crate) fn from_entity(entity: ContentIdEntity) -> Result<Self> {
        ContentId::new(entity.namespace, entity.name, entity.version)
    }

    /// The content namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The content (product) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved version string.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}:{}", self.namespace, self.name, self.version)
    }
}
