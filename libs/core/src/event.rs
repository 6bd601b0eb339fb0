//! Trigger payload normalization and the blob-write filter.
//!
//! A trigger payload is one JSON object or a JSON array of objects. Each
//! element yields one [`BlobChangeEvent`] in input order; the configured
//! [`MessageFormat`] decides whether the event object is the element itself
//! or the value of its `data` field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::MessageFormat;
use crate::error::RelayError;

/// The only storage operation the relay forwards.
pub const BLOB_WRITE_OPERATION: &str = "PutBlob";

/// Canonical record extracted from one payload element. Lives only for the
/// duration of one pipeline pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlobChangeEvent {
    /// The element's `api` field, empty when absent.
    pub operation_kind: String,
    /// The element's `url` field, empty when absent.
    pub resource_url: String,
}

impl BlobChangeEvent {
    /// True iff the event describes a blob write (exact, case-sensitive).
    pub fn is_blob_write(&self) -> bool {
        self.operation_kind == BLOB_WRITE_OPERATION
    }
}

/// Parses a raw trigger payload and returns a one-pass iterator over its
/// events. A top-level array contributes one event per element; any other
/// top-level value is treated as a single event.
pub fn events(payload: &str, format: MessageFormat) -> Result<EventIter, RelayError> {
    let parsed: Value = serde_json::from_str(payload).map_err(|err| {
        tracing::error!(error = %err, "trigger payload is not valid JSON");
        RelayError::Parse(err.to_string())
    })?;

    let elements = match parsed {
        Value::Array(items) => items,
        single => vec![single],
    };

    Ok(EventIter {
        elements: elements.into_iter(),
        format,
    })
}

/// Finite, one-pass, non-restartable sequence of normalized events.
#[derive(Debug)]
pub struct EventIter {
    elements: std::vec::IntoIter<Value>,
    format: MessageFormat,
}

impl Iterator for EventIter {
    type Item = Result<BlobChangeEvent, RelayError>;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.elements.next()?;
        Some(extract(element, self.format))
    }
}

fn extract(element: Value, format: MessageFormat) -> Result<BlobChangeEvent, RelayError> {
    let event = match format {
        MessageFormat::Wrapped => match element {
            Value::Object(mut fields) => fields.remove("data").ok_or_else(|| {
                RelayError::Parse("wrapped payload element has no 'data' field".into())
            })?,
            _ => {
                return Err(RelayError::Parse(
                    "wrapped payload element is not a JSON object".into(),
                ));
            }
        },
        MessageFormat::Bare => element,
    };

    let fields = event.as_object().ok_or_else(|| {
        RelayError::Parse("event element is not a JSON object".into())
    })?;

    let operation_kind = fields
        .get("api")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let resource_url = fields
        .get("url")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(BlobChangeEvent {
        operation_kind,
        resource_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(payload: &str, format: MessageFormat) -> Vec<BlobChangeEvent> {
        events(payload, format)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn bare_single_object_yields_one_event() {
        let got = collect(
            r#"{"api":"PutBlob","url":"https://acct.blob.core.windows.net/c/f.json"}"#,
            MessageFormat::Bare,
        );
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].operation_kind, "PutBlob");
        assert_eq!(
            got[0].resource_url,
            "https://acct.blob.core.windows.net/c/f.json"
        );
    }

    #[test]
    fn wrapped_element_uses_the_inner_data_object() {
        let got = collect(
            r#"{"data":{"api":"PutBlob","url":"https://u"},"api":"outer","url":"https://outer"}"#,
            MessageFormat::Wrapped,
        );
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].operation_kind, "PutBlob");
        assert_eq!(got[0].resource_url, "https://u");
    }

    #[test]
    fn array_yields_one_event_per_element_in_order() {
        let got = collect(
            r#"[{"api":"PutBlob","url":"https://a"},{"api":"CopyBlob","url":"https://b"},{"api":"DeleteBlob","url":"https://c"}]"#,
            MessageFormat::Bare,
        );
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].resource_url, "https://a");
        assert_eq!(got[1].resource_url, "https://b");
        assert_eq!(got[2].resource_url, "https://c");
    }

    #[test]
    fn filter_passes_put_blob_only() {
        let write = BlobChangeEvent {
            operation_kind: "PutBlob".into(),
            resource_url: "https://a".into(),
        };
        assert!(write.is_blob_write());

        for other in ["CopyBlob", "putblob", "PutBlock", ""] {
            let event = BlobChangeEvent {
                operation_kind: other.into(),
                resource_url: "https://a".into(),
            };
            assert!(!event.is_blob_write(), "{other:?} must not pass the filter");
        }
    }

    #[test]
    fn missing_api_field_normalizes_to_empty_operation() {
        let got = collect(r#"{"url":"https://a"}"#, MessageFormat::Bare);
        assert_eq!(got[0].operation_kind, "");
        assert!(!got[0].is_blob_write());
    }

    #[test]
    fn malformed_payload_is_a_parse_error() {
        let err = events("not json", MessageFormat::Bare).unwrap_err();
        assert!(matches!(err, RelayError::Parse(_)));
    }

    #[test]
    fn wrapped_element_without_data_is_a_parse_error() {
        let err = events(r#"{"api":"PutBlob","url":"https://a"}"#, MessageFormat::Wrapped)
            .unwrap()
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, RelayError::Parse(_)));
    }

    #[test]
    fn non_object_event_is_a_parse_error() {
        let err = events(r#"[42]"#, MessageFormat::Bare)
            .unwrap()
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, RelayError::Parse(_)));
    }
}
