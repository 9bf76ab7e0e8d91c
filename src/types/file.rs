//! Downloadable-file value objects.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::entity::{AppFileEntity, ApplicabilityEntity, DeliveryOptimizationEntity,
    GenericFileEntity};
use crate::error::{Result, SfsError};

/// Closed set of hash algorithms the service publishes digests for.
///
/// Algorithm names arriving on the wire are matched case-insensitively;
/// anything outside this set is a hard
/// [`ServiceInvalidResponse`](SfsError::ServiceInvalidResponse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashType {
    /// SHA-1.
    Sha1,
    /// SHA-256.
    Sha256,
}

impl HashType {
    fn from_algorithm_name(name: &str) -> Result<Self> {
        if name.eq_ignore_ascii_case("sha1") {
            Ok(HashType::Sha1)
        } else if name.eq_ignore_ascii_case("sha256") {
            Ok(HashType::Sha256)
        } else {
            Err(SfsError::ServiceInvalidResponse(format!(
                "Unrecognized hash algorithm '{name}' in response"
            )))
        }
    }
}

/// Architecture/platform constraints describing where an app file applies.
#[derive(Debug, PartialEq, Eq)]
pub struct ApplicabilityDetails {
    architectures: Vec<String>,
    platform_applicability_for_package: Vec<String>,
}

impl ApplicabilityDetails {
    fn from_entity(entity: ApplicabilityEntity) -> Self {
        ApplicabilityDetails {
            architectures: entity.architectures,
            platform_applicability_for_package: entity.platform_applicability_for_package,
        }
    }

    /// Machine architectures this file applies to, in service order.
    pub fn architectures(&self) -> &[String] {
        &self.architectures
    }

    /// Platform applicability identifiers, in service order.
    pub fn platform_applicability_for_package(&self) -> &[String] {
        &self.platform_applicability_for_package
    }
}

/// Opaque metadata describing an alternate peer-assisted transfer mechanism.
///
/// Property values are raw JSON text, passed through verbatim; this client
/// never interprets them.
#[derive(Debug, PartialEq, Eq)]
pub struct DeliveryOptimizationData {
    catalog_id: String,
    properties: BTreeMap<String, String>,
}

impl DeliveryOptimizationData {
    fn from_entity(entity: DeliveryOptimizationEntity) -> Result<Self> {
        if entity.catalog_id.is_empty() {
            return Err(SfsError::ServiceInvalidResponse(
                "DeliveryOptimization.CatalogId is empty in response".to_string(),
            ));
        }
        Ok(DeliveryOptimizationData {
            catalog_id: entity.catalog_id,
            properties: entity.properties,
        })
    }

    /// The delivery-optimization catalog identifier.
    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    /// Opaque properties, each value the raw JSON text the service sent.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

/// One downloadable file: id, source URL, size, and content hashes.
#[derive(Debug, PartialEq, Eq)]
pub struct File {
    file_id: String,
    url: String,
    size_in_bytes: u64,
    hashes: BTreeMap<HashType, String>,
    delivery_optimization: Option<DeliveryOptimizationData>,
}

fn convert_hashes(raw: BTreeMap<String, String>) -> Result<BTreeMap<HashType, String>> {
    let mut hashes = BTreeMap::new();
    for (algorithm, digest) in raw {
        let hash_type = HashType::from_algorithm_name(&algorithm)?;
        BASE64.decode(&digest).map_err(|_| {
            SfsError::ServiceInvalidResponse(format!(
                "Hashes.{algorithm} is not valid base64 in response"
            ))
        })?;
        hashes.insert(hash_type, digest);
    }
    Ok(hashes)
}

impl File {
    pub(crate) fn from_entity(entity: GenericFileEntity) -> Result<Self> {
        if entity.file_id.is_empty() {
            return Err(SfsError::ServiceInvalidResponse(
                "FileId is empty in response".to_string(),
            ));
        }
        if entity.url.is_empty() {
            return Err(SfsError::ServiceInvalidResponse(
                "Url is empty in response".to_string(),
            ));
        }
        let delivery_optimization = entity
            .delivery_optimization
            .map(DeliveryOptimizationData::from_entity)
            .transpose()?;
        Ok(File {
            file_id: entity.file_id,
            url: entity.url,
            size_in_bytes: entity.size_in_bytes,
            hashes: convert_hashes(entity.hashes)?,
            delivery_optimization,
        })
    }

    /// The service-assigned file identifier.
    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    /// Where the file can be downloaded from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// File size, as an unsigned count of bytes.
    pub fn size_in_bytes(&self) -> u64 {
        self.size_in_bytes
    }

    /// Base64 digests keyed by algorithm.
    pub fn hashes(&self) -> &BTreeMap<HashType, String> {
        &self.hashes
    }

    /// Delivery-optimization hints, when the service published any.
    pub fn delivery_optimization(&self) -> Option<&DeliveryOptimizationData> {
        self.delivery_optimization.as_ref()
    }
}

/// An app file: the generic file payload plus a package moniker and
/// applicability constraints.
#[derive(Debug, PartialEq, Eq)]
pub struct AppFile {
    file: File,
    file_moniker: String,
    applicability_details: ApplicabilityDetails,
}

impl AppFile {
    pub(crate) fn from_entity(entity: AppFileEntity) -> Result<Self> {
        if entity.file_moniker.is_empty() {
            return Err(SfsError::ServiceInvalidResponse(
                "FileMoniker is empty in response".to_string(),
            ));
        }
        Ok(AppFile {
            file: File::from_entity(entity.base)?,
            file_moniker: entity.file_moniker,
            applicability_details: ApplicabilityDetails::from_entity(
                entity.applicability_details,
            ),
        })
    }

    /// The generic file payload.
    pub fn file(&self) -> &File {
        &self.file
    }

    /// The package moniker.
    pub fn file_moniker(&self) -> &str {
        &self.file_moniker
    }

    /// Architecture/platform applicability for this file.
    pub fn applicability_details(&self) -> &ApplicabilityDetails {
        &self.applicability_details
    }
}
