//! Off-chain metadata assembly.
//!
//! Pure construction and validation of the metadata document referenced by
//! the mint transaction. Assembly never performs I/O; the upload stage
//! consumes the finished document.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on royalty basis points (100%).
pub const MAX_SELLER_FEE_BASIS_POINTS: u16 = 10_000;

/// Errors produced when a metadata document violates an invariant.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A field failed validation; nothing was uploaded.
    #[error("invalid metadata: {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> MetadataError {
    MetadataError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// One display attribute of the token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

/// One file entry under `properties.files`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileSpec {
    pub uri: String,
    #[serde(rename = "type")]
    pub mime: String,
}

/// The `properties` object of the document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Properties {
    pub files: Vec<FileSpec>,
    pub category: String,
}

/// Descriptive fields supplied by the caller; the image reference is filled
/// in from the completed image upload.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MetadataSpec {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub seller_fee_basis_points: u16,
    pub attributes: Vec<Attribute>,
    /// Pre-uploaded image URI, for invoking metadata upload standalone.
    pub image_uri: Option<String>,
    /// MIME type of the pre-uploaded image.
    pub image_mime: Option<String>,
}

/// The assembled, validated metadata document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NftMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub seller_fee_basis_points: u16,
    pub image: String,
    pub attributes: Vec<Attribute>,
    pub properties: Properties,
}

/// Build a metadata document from descriptive fields and a completed image
/// upload. Fails with `MetadataError::Invalid` before any I/O can happen.
pub fn assemble(
    spec: &MetadataSpec,
    image_uri: &str,
    image_mime: &str,
) -> Result<NftMetadata, MetadataError> {
    if spec.name.trim().is_empty() {
        return Err(invalid("name", "must not be empty"));
    }
    if spec.symbol.trim().is_empty() {
        return Err(invalid("symbol", "must not be empty"));
    }
    if spec.seller_fee_basis_points > MAX_SELLER_FEE_BASIS_POINTS {
        return Err(invalid(
            "seller_fee_basis_points",
            format!(
                "{} exceeds {}",
                spec.seller_fee_basis_points, MAX_SELLER_FEE_BASIS_POINTS
            ),
        ));
    }
    for attribute in &spec.attributes {
        if attribute.trait_type.trim().is_empty() {
            return Err(invalid("attributes", "trait_type must not be empty"));
        }
    }
    if image_uri.is_empty() {
        return Err(invalid("image", "image URI must not be empty"));
    }
    if image_mime.is_empty() {
        return Err(invalid("properties.files", "image MIME type must not be empty"));
    }

    let metadata = NftMetadata {
        name: spec.name.clone(),
        symbol: spec.symbol.clone(),
        description: spec.description.clone(),
        seller_fee_basis_points: spec.seller_fee_basis_points,
        image: image_uri.to_string(),
        attributes: spec.attributes.clone(),
        properties: Properties {
            files: vec![FileSpec {
                uri: image_uri.to_string(),
                mime: image_mime.to_string(),
            }],
            category: "image".to_string(),
        },
    };
    metadata.validate()?;
    Ok(metadata)
}

impl NftMetadata {
    /// Check the cross-field invariants of an assembled document.
    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.properties.files.is_empty() {
            return Err(invalid("properties.files", "must contain at least one file"));
        }
        let image_entry = self
            .properties
            .files
            .iter()
            .find(|file| file.uri == self.image);
        match image_entry {
            Some(entry) if entry.mime.is_empty() => {
                Err(invalid("properties.files", "image entry has no MIME type"))
            }
            Some(_) => Ok(()),
            None => Err(invalid(
                "properties.files",
                "no entry references the image URI",
            )),
        }
    }

    /// The document as uploaded.
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::json!(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> MetadataSpec {
        MetadataSpec {
            name: "Gradient #1".to_string(),
            symbol: "GRAD".to_string(),
            description: "A generative gradient".to_string(),
            seller_fee_basis_points: 500,
            attributes: vec![Attribute {
                trait_type: "palette".to_string(),
                value: "dusk".to_string(),
            }],
            image_uri: None,
            image_mime: None,
        }
    }

    fn field_of(err: MetadataError) -> &'static str {
        let MetadataError::Invalid { field, .. } = err;
        field
    }

    #[test]
    fn test_assemble_happy_path() {
        let metadata = assemble(&spec(), "ipfs://img", "image/png").unwrap();
        assert_eq!(metadata.image, "ipfs://img");
        assert_eq!(metadata.properties.files.len(), 1);
        assert_eq!(metadata.properties.files[0].mime, "image/png");
        assert!(metadata.validate().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut bad = spec();
        bad.name = "  ".to_string();
        assert_eq!(field_of(assemble(&bad, "ipfs://img", "image/png").unwrap_err()), "name");
    }

    #[test]
    fn test_empty_symbol_rejected() {
        let mut bad = spec();
        bad.symbol = String::new();
        assert_eq!(
            field_of(assemble(&bad, "ipfs://img", "image/png").unwrap_err()),
            "symbol"
        );
    }

    #[test]
    fn test_basis_points_range_enforced() {
        let mut bad = spec();
        bad.seller_fee_basis_points = 10_001;
        assert_eq!(
            field_of(assemble(&bad, "ipfs://img", "image/png").unwrap_err()),
            "seller_fee_basis_points"
        );
    }

    #[test]
    fn test_empty_trait_type_rejected() {
        let mut bad = spec();
        bad.attributes.push(Attribute {
            trait_type: String::new(),
            value: "x".to_string(),
        });
        assert_eq!(
            field_of(assemble(&bad, "ipfs://img", "image/png").unwrap_err()),
            "attributes"
        );
    }

    #[test]
    fn test_files_must_reference_image() {
        let mut metadata = assemble(&spec(), "ipfs://img", "image/png").unwrap();
        metadata.properties.files[0].uri = "ipfs://other".to_string();
        assert_eq!(field_of(metadata.validate().unwrap_err()), "properties.files");
    }

    #[test]
    fn test_document_shape() {
        let metadata = assemble(&spec(), "ipfs://img", "image/png").unwrap();
        let document = metadata.to_document();
        assert_eq!(document["image"], "ipfs://img");
        assert_eq!(document["seller_fee_basis_points"], 500);
        assert_eq!(document["properties"]["files"][0]["type"], "image/png");
        assert_eq!(document["attributes"][0]["trait_type"], "palette");
    }

    #[test]
    fn test_metadata_serde_round_trip() {
        let metadata = assemble(&spec(), "ipfs://img", "image/png").unwrap();
        let json = serde_json::to_string(&metadata).unwrap();
        let decoded: NftMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, metadata);
    }
}
