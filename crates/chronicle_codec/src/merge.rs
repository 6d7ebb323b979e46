//! Building documents from gateway rows.
//!
//! Stored payloads are the source of truth for caller-set fields only.
//! Engine-set metadata (`createdAt`, `updatedAt`, `correlationId`) is
//! overlaid from the row's authoritative columns, because historical
//! payloads may carry inconsistent caller-supplied copies.

use crate::document::Document;
use crate::error::{CodecError, CodecResult};
use crate::ids::EntityId;
use chrono::{DateTime, Utc};
use chronicle_gateway::{LatestRow, VersionRow};

/// Decodes a stored payload into the document envelope.
pub fn decode_document(payload: serde_json::Value) -> CodecResult<Document> {
    serde_json::from_value(payload).map_err(|err| CodecError::decoding_failed(err.to_string()))
}

/// Serializes a document into its persisted JSON shape.
pub fn encode_document(document: &Document) -> CodecResult<serde_json::Value> {
    serde_json::to_value(document).map_err(|err| CodecError::encoding_failed(err.to_string()))
}

/// Builds a document from an entity head joined to its latest version.
pub fn document_from_latest(row: &LatestRow) -> CodecResult<Document> {
    let document = decode_document(row.doc.clone())?;
    Ok(overlay(
        document,
        &row.entity_id,
        row.entity_created,
        row.version_created,
        row.correlation_id.clone(),
    ))
}

/// Builds a document from a single version row.
pub fn document_from_version(row: &VersionRow) -> CodecResult<Document> {
    let document = decode_document(row.doc.clone())?;
    Ok(overlay(
        document,
        &row.entity_id,
        row.entity_created,
        row.created,
        row.correlation_id.clone(),
    ))
}

fn overlay(
    mut document: Document,
    entity_id: &str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    correlation_id: Option<String>,
) -> Document {
    document.id = Some(EntityId::from(entity_id));
    document.meta.created_at = Some(created_at);
    document.meta.updated_at = Some(updated_at);
    document.meta.correlation_id = correlation_id;
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn latest_row_overrides_stored_meta() {
        let row = LatestRow {
            entity_id: "e1".to_string(),
            entity_type: "person".to_string(),
            entity_created: at(100),
            removed_at: None,
            version_id: "v2".to_string(),
            version_created: at(200),
            correlation_id: Some("corr-2".to_string()),
            // The stored payload carries stale metadata from write time.
            doc: json!({
                "id": "e1",
                "type": "person",
                "attributes": {"name": "B"},
                "meta": {"correlationId": "stale", "createdAt": "1999-01-01T00:00:00Z"}
            }),
        };

        let doc = document_from_latest(&row).unwrap();
        assert_eq!(doc.id.as_ref().unwrap().as_str(), "e1");
        assert_eq!(doc.meta.created_at, Some(at(100)));
        assert_eq!(doc.meta.updated_at, Some(at(200)));
        assert_eq!(doc.meta.correlation_id.as_deref(), Some("corr-2"));
        assert_eq!(doc.attributes, json!({"name": "B"}));
    }

    #[test]
    fn version_row_uses_its_own_timestamp() {
        let row = VersionRow {
            version_id: "v1".to_string(),
            entity_id: "e1".to_string(),
            created: at(150),
            entity_created: at(100),
            correlation_id: None,
            doc: json!({"type": "person", "attributes": {"name": "A"}}),
        };

        let doc = document_from_version(&row).unwrap();
        assert_eq!(doc.meta.created_at, Some(at(100)));
        assert_eq!(doc.meta.updated_at, Some(at(150)));
        assert!(doc.meta.correlation_id.is_none());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let result = decode_document(json!({"attributes": {}}));
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));

        let result = decode_document(json!("not an object"));
        assert!(result.is_err());
    }
}
