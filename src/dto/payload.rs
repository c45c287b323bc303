//! Button payload codec.
//!
//! The platform hands payloads back as a JSON string literal whose content is itself a JSON
//! object (`"{\"command\":\"results\"}"`). Both layers are unwrapped here and nowhere else.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Failure while unwrapping or building a button payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The outer layer is not a JSON string literal.
    #[error("payload is not a JSON string literal: {payload}")]
    Outer {
        /// Raw payload as received.
        payload: String,
        #[source]
        source: serde_json::Error,
    },
    /// The unwrapped string is not a JSON object.
    #[error("payload content is not a command object: {inner}")]
    Inner {
        /// Content of the outer string literal.
        inner: String,
        #[source]
        source: serde_json::Error,
    },
    /// Building a payload failed.
    #[error("failed to encode command payload")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CommandPayload {
    #[serde(default)]
    command: String,
}

/// Unwrap a raw message payload into its command.
///
/// Returns `Ok(None)` for an absent or empty payload and for objects whose `command` is empty.
pub fn decode_command_payload(raw: Option<&str>) -> Result<Option<String>, PayloadError> {
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    let inner: String = serde_json::from_str(raw).map_err(|source| PayloadError::Outer {
        payload: raw.to_owned(),
        source,
    })?;
    // Derived struct deserialization also accepts arrays; only an object is a payload.
    let payload = serde_json::from_str::<Map<String, Value>>(&inner)
        .and_then(|object| serde_json::from_value::<CommandPayload>(Value::Object(object)))
        .map_err(|source| PayloadError::Inner {
            inner: inner.clone(),
            source,
        })?;

    Ok(Some(payload.command).filter(|command| !command.is_empty()))
}

/// Produce the double-encoded payload for a button routing to `command`.
pub fn encode_command_payload(command: &str) -> Result<String, PayloadError> {
    let inner = serde_json::to_string(&CommandPayload {
        command: command.to_owned(),
    })
    .map_err(PayloadError::Encode)?;
    serde_json::to_string(&inner).map_err(PayloadError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_empty_payloads_carry_no_command() {
        assert!(decode_command_payload(None).unwrap().is_none());
        assert!(decode_command_payload(Some("")).unwrap().is_none());
    }

    #[test]
    fn unwraps_both_layers() {
        let command = decode_command_payload(Some(r#""{\"command\":\"recordResults\"}""#)).unwrap();
        assert_eq!(command.as_deref(), Some("recordResults"));
    }

    #[test]
    fn object_without_command_falls_through() {
        assert!(decode_command_payload(Some(r#""{}""#)).unwrap().is_none());
        assert!(
            decode_command_payload(Some(r#""{\"command\":\"\"}""#))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn single_encoded_object_is_rejected() {
        let err = decode_command_payload(Some(r#"{"command":"results"}"#)).unwrap_err();
        assert!(matches!(err, PayloadError::Outer { .. }));
    }

    #[test]
    fn string_without_object_is_rejected() {
        let err = decode_command_payload(Some(r#""results""#)).unwrap_err();
        assert!(matches!(err, PayloadError::Inner { .. }));
    }

    #[test]
    fn arrays_and_scalars_are_not_payload_objects() {
        for raw in [r#""[\"results\"]""#, r#""[]""#, r#""42""#, r#""null""#] {
            let err = decode_command_payload(Some(raw)).unwrap_err();
            assert!(matches!(err, PayloadError::Inner { .. }), "{raw}");
        }
    }

    #[test]
    fn non_string_command_is_rejected() {
        let err = decode_command_payload(Some(r#""{\"command\":7}""#)).unwrap_err();
        assert!(matches!(err, PayloadError::Inner { .. }));
    }

    #[test]
    fn encoding_matches_decoding() {
        let encoded = encode_command_payload("find_game").unwrap();
        assert_eq!(encoded, r#""{\"command\":\"find_game\"}""#);
        assert_eq!(
            decode_command_payload(Some(&encoded)).unwrap().as_deref(),
            Some("find_game")
        );
    }
}
