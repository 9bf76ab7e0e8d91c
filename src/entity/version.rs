//! Version entities: the parsed shape of version-resolution responses.

use serde_json::Value;

use super::{
    as_root_array, as_root_object, required, required_array, required_string,
    required_string_array,
};
use crate::error::{Result, SfsError};

/// One resolved content version identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ContentIdEntity {
    pub(crate) namespace: String,
    pub(crate) name: String,
    pub(crate) version: String,
}

impl ContentIdEntity {
    /// Validate a ContentId-shaped object. `path` prefixes every error
    /// message (`ContentId`, `Prerequisite`, ...).
    fn from_object(value: &Value, path: &str) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            SfsError::ServiceInvalidResponse(format!("{path} is not a JSON object"))
        })?;
        Ok(ContentIdEntity {
            namespace: required_string(object, "Namespace", &format!("{path}.Namespace"))?,
            name: required_string(object, "Name", &format!("{path}.Name"))?,
            version: required_string(object, "Version", &format!("{path}.Version"))?,
        })
    }
}

/// A version entity with no app-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GenericVersionEntity {
    pub(crate) content_id: ContentIdEntity,
}

/// An app version entity: a content id plus update metadata and an ordered
/// prerequisite list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AppVersionEntity {
    pub(crate) content_id: ContentIdEntity,
    pub(crate) update_id: String,
    pub(crate) prerequisites: Vec<GenericVersionEntity>,
}

/// Parsed version entity, discriminated by the presence of the
/// `UpdateId`/`Prerequisites` key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum VersionEntity {
    Generic(GenericVersionEntity),
    App(AppVersionEntity),
}

impl VersionEntity {
    /// Validate one version JSON object.
    ///
    /// Fails fast on the first violated rule; never returns a partially
    /// populated entity.
    pub(crate) fn from_json(value: &Value) -> Result<Self> {
        let object = as_root_object(value)?;

        let content_id_value = required(object, "ContentId", "ContentId")?;
        let content_id = ContentIdEntity::from_object(content_id_value, "ContentId")?;

        // Either app key selects the app variant; both are then required.
        if !object.contains_key("UpdateId") && !object.contains_key("Prerequisites") {
            return Ok(VersionEntity::Generic(GenericVersionEntity { content_id }));
        }

        let update_id = required_string(object, "UpdateId", "UpdateId")?;
        let prerequisites_value = required_array(object, "Prerequisites", "Prerequisites")?;
        let mut prerequisites = Vec::with_capacity(prerequisites_value.len());
        for element in prerequisites_value {
            let content_id = ContentIdEntity::from_object(element, "Prerequisite")?;
            prerequisites.push(GenericVersionEntity { content_id });
        }

        Ok(VersionEntity::App(AppVersionEntity {
            content_id,
            update_id,
            prerequisites,
        }))
    }

    pub(crate) fn content_id(&self) -> &ContentIdEntity {
        match self {
            VersionEntity::Generic(entity) => &entity.content_id,
            VersionEntity::App(entity) => &entity.content_id,
        }
    }

    pub(crate) fn into_content_id(self) -> ContentIdEntity {
        match self {
            VersionEntity::Generic(entity) => entity.content_id,
            VersionEntity::App(entity) => entity.content_id,
        }
    }
}

/// Validate a batched version-resolution response: a JSON array of version
/// objects, each independently validated.
pub(crate) fn parse_version_entities(value: &Value) -> Result<Vec<VersionEntity>> {
    let array = as_root_array(value)?;
    let mut entities = Vec::with_capacity(array.len());
    for element in array {
        entities.push(VersionEntity::from_json(element)?);
    }
    Ok(entities)
}

/// Validate a specific-version response (`{"ContentId": …, "Files": […]}`).
///
/// The `Files` listing carries bare file ids only and is not part of the
/// entity; it is checked for shape when present and otherwise ignored.
pub(crate) fn parse_specific_version(value: &Value) -> Result<GenericVersionEntity> {
    let object = as_root_object(value)?;
    let content_id_value = required(object, "ContentId", "ContentId")?;
    let content_id = ContentIdEntity::from_object(content_id_value, "ContentId")?;
    if object.contains_key("Files") {
        required_string_array(object, "Files", "Files")?;
    }
    Ok(GenericVersionEntity { content_id })
}
