use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marks encrypted content; plaintext envelopes never contain it
pub const CIPHER_MARKER: &str = "?iv=";

/// Application event carried in a transport event's content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub event_name: String,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    pub fn new(event_name: impl Into<String>, payload: Value) -> Self {
        Self {
            event_name: event_name.into(),
            payload,
        }
    }

    pub fn to_content(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_content(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

pub fn is_ciphertext(content: &str) -> bool {
    content.contains(CIPHER_MARKER)
}

/// Hook for checking payload shape before an inbound envelope is accepted
pub trait PayloadValidator: Send + Sync {
    fn validate(&self, event_name: &str, payload: &Value) -> Result<(), String>;
}

impl<F> PayloadValidator for F
where
    F: Fn(&str, &Value) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, event_name: &str, payload: &Value) -> Result<(), String> {
        self(event_name, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let envelope = Envelope::new("chat", json!({ "text": "hi" }));
        let content = envelope.to_content().unwrap();
        let value: Value = serde_json::from_str(&content).unwrap();

        assert_eq!(value, json!({ "eventName": "chat", "payload": { "text": "hi" } }));
    }

    #[test]
    fn test_missing_payload_is_null() {
        let envelope = Envelope::from_content(r#"{"eventName":"ping"}"#).unwrap();

        assert_eq!(envelope.event_name, "ping");
        assert_eq!(envelope.payload, Value::Null);
    }

    #[test]
    fn test_rejects_missing_event_name() {
        assert!(Envelope::from_content(r#"{"payload":1}"#).is_err());
        assert!(Envelope::from_content("not json").is_err());
    }

    #[test]
    fn test_ciphertext_detection() {
        assert!(is_ciphertext("abcd?iv=efgh"));
        assert!(!is_ciphertext(r#"{"eventName":"x","payload":null}"#));
    }

    #[test]
    fn test_closure_validator() {
        let validator = |name: &str, payload: &Value| {
            if name == "chat" && !payload.is_string() {
                Err("chat payload must be a string".to_string())
            } else {
                Ok(())
            }
        };

        assert!(validator.validate("chat", &json!("hi")).is_ok());
        assert!(validator.validate("chat", &json!(1)).is_err());
        assert!(validator.validate("other", &json!(1)).is_ok());
    }
}
