//! Platform wire format: the request envelope delivered per turn and the
//! response envelope handed back.
//!
//! Only the fields the skill consumes are modelled; everything else in the
//! platform payload is ignored on decode.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ssml::Ssml;

pub const LAUNCH_REQUEST: &str = "LaunchRequest";
pub const INTENT_REQUEST: &str = "IntentRequest";
pub const SESSION_ENDED_REQUEST: &str = "SessionEndedRequest";

// =============================================================================
// Inbound
// =============================================================================

/// Inbound request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequest {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub session: Option<RequestSession>,
    pub request: RequestBody,
}

fn default_version() -> String {
    "1.0".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSession {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Opaque attributes written by the previous turn; absent on the first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    /// Why the session ended, on `SessionEndedRequest`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub name: String,
    #[serde(default)]
    pub slots: HashMap<String, Slot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Slot {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl SkillRequest {
    /// Build an `IntentRequest` carrying `query` in `slot` of `intent`.
    ///
    /// This is the shape the platform sends for a free-text question; the
    /// CLI and tests use it to drive the handler without a device.
    pub fn intent_query(
        session_id: &str,
        intent: &str,
        slot: &str,
        query: &str,
        attributes: Option<Value>,
    ) -> Self {
        let mut slots = HashMap::new();
        slots.insert(
            slot.to_string(),
            Slot {
                name: Some(slot.to_string()),
                value: Some(query.to_string()),
            },
        );
        Self::with_intent(
            session_id,
            attributes,
            Intent {
                name: intent.to_string(),
                slots,
            },
        )
    }

    /// Build an `IntentRequest` for a slotless intent such as `AMAZON.StopIntent`.
    pub fn intent(session_id: &str, intent: &str, attributes: Option<Value>) -> Self {
        Self::with_intent(
            session_id,
            attributes,
            Intent {
                name: intent.to_string(),
                slots: HashMap::new(),
            },
        )
    }

    fn with_intent(session_id: &str, attributes: Option<Value>, intent: Intent) -> Self {
        Self {
            version: default_version(),
            session: Some(RequestSession {
                new: attributes.is_none(),
                session_id: Some(session_id.to_string()),
                attributes,
            }),
            request: RequestBody {
                kind: INTENT_REQUEST.to_string(),
                request_id: Some(format!("parley.request.{}", uuid::Uuid::new_v4())),
                timestamp: Some(chrono::Utc::now().to_rfc3339()),
                locale: Some("en-US".to_string()),
                intent: Some(intent),
                reason: None,
            },
        }
    }

    /// Session attributes sent with this request, if any.
    pub fn attributes(&self) -> Option<&Value> {
        self.session.as_ref().and_then(|s| s.attributes.as_ref())
    }
}

// =============================================================================
// Outbound
// =============================================================================

/// Outbound response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillResponse {
    pub version: String,
    pub session_attributes: Map<String, Value>,
    pub response: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub output_speech: OutputSpeech,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    pub should_end_session: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpeech {
    #[serde(rename = "type")]
    pub kind: String,
    pub ssml: String,
}

impl From<Ssml> for OutputSpeech {
    fn from(ssml: Ssml) -> Self {
        Self {
            kind: "SSML".to_string(),
            ssml: ssml.into_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_platform_request() {
        let raw = json!({
            "version": "1.0",
            "session": {
                "new": false,
                "sessionId": "test-session-id",
                "application": {"applicationId": "test-app-id"},
                "attributes": {},
                "user": {"userId": "test-user-id"}
            },
            "context": {"System": {"device": {"deviceId": "test-device-id"}}},
            "request": {
                "type": "IntentRequest",
                "requestId": "test-request-id",
                "timestamp": "2025-12-10T10:00:00Z",
                "locale": "en-US",
                "intent": {
                    "name": "GptQueryIntent",
                    "confirmationStatus": "NONE",
                    "slots": {
                        "query": {
                            "name": "query",
                            "value": "who are you?",
                            "confirmationStatus": "NONE"
                        }
                    }
                }
            }
        });
        let req: SkillRequest = serde_json::from_value(raw).unwrap();
        let session = req.session.as_ref().unwrap();
        assert!(!session.new);
        assert_eq!(session.session_id.as_deref(), Some("test-session-id"));
        assert_eq!(req.request.kind, INTENT_REQUEST);
        let intent = req.request.intent.as_ref().unwrap();
        assert_eq!(intent.name, "GptQueryIntent");
        assert_eq!(intent.slots["query"].value.as_deref(), Some("who are you?"));
    }

    #[test]
    fn test_decode_rejects_missing_request() {
        let raw = json!({"version": "1.0", "session": {"sessionId": "s"}});
        assert!(serde_json::from_value::<SkillRequest>(raw).is_err());
    }

    #[test]
    fn test_intent_query_builder() {
        let req = SkillRequest::intent_query("s-1", "GptQueryIntent", "query", "hi", None);
        let session = req.session.as_ref().unwrap();
        assert!(session.new);
        assert_eq!(session.session_id.as_deref(), Some("s-1"));
        assert!(req.attributes().is_none());
        assert!(req
            .request
            .request_id
            .as_deref()
            .unwrap()
            .starts_with("parley.request."));
        assert_eq!(
            req.request.intent.unwrap().slots["query"].value.as_deref(),
            Some("hi")
        );
    }

    #[test]
    fn test_builder_with_attributes_is_not_new() {
        let req = SkillRequest::intent("s-1", "AMAZON.StopIntent", Some(json!({})));
        assert!(!req.session.unwrap().new);
    }

    #[test]
    fn test_response_wire_shape() {
        let resp = SkillResponse {
            version: "1.0".to_string(),
            session_attributes: Map::new(),
            response: ResponseBody {
                output_speech: OutputSpeech {
                    kind: "SSML".to_string(),
                    ssml: "<speak>Hi</speak>".to_string(),
                },
                reprompt: None,
                should_end_session: false,
            },
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["response"]["outputSpeech"]["type"], "SSML");
        assert_eq!(value["response"]["shouldEndSession"], false);
        assert!(value["response"].get("reprompt").is_none());
        assert!(value["sessionAttributes"].is_object());
    }
}
