//! File entities: the parsed shape of download-info responses.

use std::collections::BTreeMap;

use serde_json::Value;

use super::{
    as_root_array, as_root_object, required, required_object, required_string,
    required_string_array, required_u64,
};
use crate::error::{Result, SfsError};

/// Opaque delivery-optimization metadata attached to a file.
///
/// Property values are re-serialized verbatim as raw JSON text; this client
/// never interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DeliveryOptimizationEntity {
    pub(crate) catalog_id: String,
    pub(crate) properties: BTreeMap<String, String>,
}

impl DeliveryOptimizationEntity {
    fn from_object(value: &Value, path: &str) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            SfsError::ServiceInvalidResponse(format!("{path} is not a JSON object"))
        })?;
        let catalog_id = required_string(object, "CatalogId", &format!("{path}.CatalogId"))?;
        let properties_value =
            required_object(object, "Properties", &format!("{path}.Properties"))?;
        let mut properties = BTreeMap::new();
        for (key, value) in properties_value {
            properties.insert(key.clone(), value.to_string());
        }
        Ok(DeliveryOptimizationEntity {
            catalog_id,
            properties,
        })
    }
}

/// Architecture/platform applicability constraints (app files only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApplicabilityEntity {
    pub(crate) architectures: Vec<String>,
    pub(crate) platform_applicability_for_package: Vec<String>,
}

impl ApplicabilityEntity {
    fn from_object(value: &Value, path: &str) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            SfsError::ServiceInvalidResponse(format!("{path} is not a JSON object"))
        })?;
        Ok(ApplicabilityEntity {
            architectures: required_string_array(
                object,
                "Architectures",
                &format!("{path}.Architectures"),
            )?,
            platform_applicability_for_package: required_string_array(
                object,
                "PlatformApplicabilityForPackage",
                &format!("{path}.PlatformApplicabilityForPackage"),
            )?,
        })
    }
}

/// A downloadable file with no app-specific payload.
///
/// Hash algorithm names are kept raw here; the closed-enum mapping (and the
/// rejection of unknown names) happens at the public value-object layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GenericFileEntity {
    pub(crate) file_id: String,
    pub(crate) url: String,
    pub(crate) size_in_bytes: u64,
    pub(crate) hashes: BTreeMap<String, String>,
    pub(crate) delivery_optimization: Option<DeliveryOptimizationEntity>,
}

/// An app file: the generic fields plus a moniker and applicability
/// constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AppFileEntity {
    pub(crate) base: GenericFileEntity,
    pub(crate) file_moniker: String,
    pub(crate) applicability_details: ApplicabilityEntity,
}

/// Parsed file entity, discriminated by the presence of `FileMoniker`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FileEntity {
    Generic(GenericFileEntity),
    App(AppFileEntity),
}

impl FileEntity {
    /// Validate one file JSON object.
    ///
    /// Fails fast on the first violated rule; never returns a partially
    /// populated entity.
    pub(crate) fn from_json(value: &Value) -> Result<Self> {
        let object = as_root_object(value)?;

        let file_id = required_string(object, "FileId", "FileId")?;
        let url = required_string(object, "Url", "Url")?;
        let size_in_bytes = required_u64(object, "SizeInBytes", "SizeInBytes")?;

        let hashes_value = required_object(object, "Hashes", "Hashes")?;
        let mut hashes = BTreeMap::new();
        for (algorithm, digest) in hashes_value {
            let digest = digest.as_str().ok_or_else(|| {
                SfsError::ServiceInvalidResponse(format!("Hashes.{algorithm} is not a string"))
            })?;
            hashes.insert(algorithm.clone(), digest.to_string());
        }

        let delivery_optimization = match object.get("DeliveryOptimization") {
            Some(value) => Some(DeliveryOptimizationEntity::from_object(
                value,
                "DeliveryOptimization",
            )?),
            None => None,
        };

        let base = GenericFileEntity {
            file_id,
            url,
            size_in_bytes,
            hashes,
            delivery_optimization,
        };

        if !object.contains_key("FileMoniker") {
            return Ok(FileEntity::Generic(base));
        }

        let file_moniker = required_string(object, "FileMoniker", "FileMoniker")?;
        let applicability_value = required(
            object,
            "ApplicabilityDetails",
            "ApplicabilityDetails",
        )?;
        let applicability_details =
            ApplicabilityEntity::from_object(applicability_value, "ApplicabilityDetails")?;

        Ok(FileEntity::App(AppFileEntity {
            base,
            file_moniker,
            applicability_details,
        }))
    }
}

/// Validate a download-info response: a JSON array of file objects, each
/// independently validated.
pub(crate) fn parse_file_entities(value: &Value) -> Result<Vec<FileEntity>> {
    let array = as_root_array(value)?;
    let mut entities = Vec::with_capacity(array.len());
    for element in array {
        entities.push(FileEntity::from_json(element)?);
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn file_json() -> Value {
        json!({
            "FileId": "testProduct.bin",
            "Url": "https://download.example.com/testProduct.bin",
            "SizeInBytes": 1024,
            "Hashes": {
                "Sha1": "bjzUkBTZ/W2ika02u9lVWMWU37E=",
                "Sha256": "qW0nSHLY0Nxr+h0m0cUNQC2xkCPNDpLF2t3PrI13vVo="
            }
        })
    }

    fn app_file_json() -> Value {
        let mut value = file_json();
        value["FileMoniker"] = json!("testApp_x64");
        value["ApplicabilityDetails"] = json!({
            "Architectures": ["x64"],
            "PlatformApplicabilityForPackage": ["Universal Client"]
        });
        value
    }

    #[test]
    fn test_generic_file_parses() {
        let entity = FileEntity::from_json(&file_json()).unwrap();
        match entity {
            FileEntity::Generic(file) => {
                assert_eq!(file.file_id, "testProduct.bin");
                assert_eq!(file.size_in_bytes, 1024);
                assert_eq!(file.hashes.len(), 2);
                assert!(file.delivery_optimization.is_none());
            }
            FileEntity::App(_) => panic!("expected generic variant"),
        }
    }

    #[test]
    fn test_app_file_parses() {
        let entity = FileEntity::from_json(&app_file_json()).unwrap();
        match entity {
            FileEntity::App(file) => {
                assert_eq!(file.file_moniker, "testApp_x64");
                assert_eq!(file.applicability_details.architectures, vec!["x64"]);
                assert_eq!(
                    file.applicability_details.platform_applicability_for_package,
                    vec!["Universal Client"]
                );
            }
            FileEntity::Generic(_) => panic!("expected app variant"),
        }
    }

    #[test]
    fn test_each_required_field_is_checked() {
        for field in ["FileId", "Url", "SizeInBytes", "Hashes"] {
            let mut value = file_json();
            value.as_object_mut().unwrap().remove(field);
            let err = FileEntity::from_json(&value).unwrap_err();
            assert_eq!(err.code(), ErrorCode::ServiceInvalidResponse);
            assert!(
                err.to_string().contains(&format!("Missing {field} in response")),
                "missing {field}: {err}"
            );
        }
    }

    #[test]
    fn test_type_mismatches_name_the_field() {
        let mut value = file_json();
        value["Url"] = json!(7);
        let err = FileEntity::from_json(&value).unwrap_err();
        assert!(err.to_string().contains("Url is not a string"));

        let mut value = file_json();
        value["SizeInBytes"] = json!(-10);
        let err = FileEntity::from_json(&value).unwrap_err();
        assert!(err
            .to_string()
            .contains("SizeInBytes is not an unsigned integer"));

        let mut value = file_json();
        value["SizeInBytes"] = json!(2.5);
        let err = FileEntity::from_json(&value).unwrap_err();
        assert!(err
            .to_string()
            .contains("SizeInBytes is not an unsigned integer"));

        let mut value = file_json();
        value["Hashes"] = json!(["Sha1"]);
        let err = FileEntity::from_json(&value).unwrap_err();
        assert!(err.to_string().contains("Hashes is not a JSON object"));

        let mut value = file_json();
        value["Hashes"]["Sha1"] = json!(42);
        let err = FileEntity::from_json(&value).unwrap_err();
        assert!(err.to_string().contains("Hashes.Sha1 is not a string"));
    }

    #[test]
    fn test_unknown_hash_names_survive_at_entity_layer() {
        let mut value = file_json();
        value["Hashes"]["Md5"] = json!("abcd");
        let entity = FileEntity::from_json(&value).unwrap();
        match entity {
            FileEntity::Generic(file) => assert!(file.hashes.contains_key("Md5")),
            FileEntity::App(_) => panic!("expected generic variant"),
        }
    }

    #[test]
    fn test_app_file_requires_applicability_details() {
        let mut value = file_json();
        value["FileMoniker"] = json!("m");
        let err = FileEntity::from_json(&value).unwrap_err();
        assert!(err
            .to_string()
            .contains("Missing ApplicabilityDetails in response"));

        let mut value = app_file_json();
        value["ApplicabilityDetails"]
            .as_object_mut()
            .unwrap()
            .remove("Architectures");
        let err = FileEntity::from_json(&value).unwrap_err();
        assert!(err
            .to_string()
            .contains("Missing ApplicabilityDetails.Architectures in response"));

        let mut value = app_file_json();
        value["ApplicabilityDetails"]["PlatformApplicabilityForPackage"] = json!("not array");
        let err = FileEntity::from_json(&value).unwrap_err();
        assert!(err.to_string().contains(
            "ApplicabilityDetails.PlatformApplicabilityForPackage is not an array"
        ));
    }

    #[test]
    fn test_delivery_optimization_validation() {
        let mut value = file_json();
        value["DeliveryOptimization"] = json!({
            "CatalogId": "catalog-1",
            "Properties": {
                "IntProp": 7,
                "ObjProp": {"nested": true}
            }
        });
        let entity = FileEntity::from_json(&value).unwrap();
        match entity {
            FileEntity::Generic(file) => {
                let delivery = file.delivery_optimization.unwrap();
                assert_eq!(delivery.catalog_id, "catalog-1");
                // Property values are raw JSON text, not interpreted.
                assert_eq!(delivery.properties["IntProp"], "7");
                assert_eq!(delivery.properties["ObjProp"], r#"{"nested":true}"#);
            }
            FileEntity::App(_) => panic!("expected generic variant"),
        }

        let mut value = file_json();
        value["DeliveryOptimization"] = json!({"Properties": {}});
        let err = FileEntity::from_json(&value).unwrap_err();
        assert!(err
            .to_string()
            .contains("Missing DeliveryOptimization.CatalogId in response"));

        let mut value = file_json();
        value["DeliveryOptimization"] = json!({"CatalogId": "c", "Properties": []});
        let err = FileEntity::from_json(&value).unwrap_err();
        assert!(err
            .to_string()
            .contains("DeliveryOptimization.Properties is not a JSON object"));
    }

    #[test]
    fn test_download_info_response_must_be_array() {
        let err = parse_file_entities(&file_json()).unwrap_err();
        assert!(err.to_string().contains("Response is not a JSON array"));

        let entities = parse_file_entities(&json!([file_json(), app_file_json()])).unwrap();
        assert_eq!(entities.len(), 2);
    }
}
