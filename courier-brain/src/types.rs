use serde::{Deserialize, Serialize};

/// Device identity advertised to the reasoning service.
pub const DEVICE_TYPE: &str = "android";

/// One aggregated turn in the fixed JSON contract the reasoning service
/// expects. Field spellings (`menssageId`, `isgroup`) are part of the
/// contract and must not be corrected here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnPayload {
    pub conversation_activate: bool,
    pub from: String,
    /// Epoch millis at flush time.
    pub time_stamp: i64,
    pub name: Option<String>,
    pub menssage_id: String,
    #[serde(rename = "isgroup")]
    pub is_group: bool,
    pub message_type: String,
    pub device_type: String,
    #[serde(flatten)]
    pub body: TurnBody,
}

/// Wire shape of the buffered texts: exactly one message serializes as a
/// `text` field, two or more as a `messages` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TurnBody {
    Single { text: String },
    Multiple { messages: Vec<String> },
}

impl TurnBody {
    pub fn from_texts(mut texts: Vec<String>) -> Self {
        if texts.len() == 1 {
            TurnBody::Single {
                text: texts.remove(0),
            }
        } else {
            TurnBody::Multiple { messages: texts }
        }
    }
}

/// Structured 200 reply from the reasoning service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrainReply {
    pub is_success: bool,
    pub response: Option<String>,
}

impl BrainReply {
    /// The reply text to relay, present only when the service marked the
    /// turn successful and produced a non-empty response.
    pub fn reply_text(&self) -> Option<&str> {
        if !self.is_success {
            return None;
        }
        self.response
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone)]
pub enum BrainOutcome {
    /// 204: the service consumed the turn and has nothing to say.
    NoReply,
    /// 200 with a parseable body.
    Reply(BrainReply),
    /// Any other non-5xx status (including 200 with an empty body): logged
    /// by the caller, reply dropped, no fallback.
    Ignored { status: u16 },
}

#[cfg(test)]
mod tests {
    use super::{BrainReply, DEVICE_TYPE, TurnBody, TurnPayload};

    fn payload(body: TurnBody) -> TurnPayload {
        TurnPayload {
            conversation_activate: false,
            from: "5511999990000@s.whatsapp.net".to_string(),
            time_stamp: 1_700_000_000_000,
            name: None,
            menssage_id: "ABCD1234".to_string(),
            is_group: false,
            message_type: "conversation".to_string(),
            device_type: DEVICE_TYPE.to_string(),
            body,
        }
    }

    #[test]
    fn single_message_serializes_with_text_field() {
        let value = serde_json::to_value(payload(TurnBody::from_texts(vec!["oi".to_string()])))
            .expect("payload should serialize");
        assert_eq!(value["text"], "oi");
        assert!(value.get("messages").is_none());
        assert_eq!(value["conversationActivate"], false);
        assert_eq!(value["menssageId"], "ABCD1234");
        assert_eq!(value["isgroup"], false);
        assert_eq!(value["messageType"], "conversation");
        assert_eq!(value["deviceType"], "android");
        assert_eq!(value["timeStamp"], 1_700_000_000_000_i64);
        assert!(value["name"].is_null());
    }

    #[test]
    fn multiple_messages_serialize_with_messages_array() {
        let value = serde_json::to_value(payload(TurnBody::from_texts(vec![
            "oi".to_string(),
            "tudo bem?".to_string(),
        ])))
        .expect("payload should serialize");
        assert!(value.get("text").is_none());
        assert_eq!(
            value["messages"],
            serde_json::json!(["oi", "tudo bem?"]),
            "buffered order must survive serialization"
        );
    }

    #[test]
    fn reply_text_requires_success_and_non_empty_response() {
        let reply: BrainReply =
            serde_json::from_str(r#"{"isSuccess":true,"response":"Olá!"}"#).expect("valid reply");
        assert_eq!(reply.reply_text(), Some("Olá!"));

        let not_success: BrainReply =
            serde_json::from_str(r#"{"isSuccess":false,"response":"ignored"}"#)
                .expect("valid reply");
        assert_eq!(not_success.reply_text(), None);

        let blank: BrainReply =
            serde_json::from_str(r#"{"isSuccess":true,"response":"   "}"#).expect("valid reply");
        assert_eq!(blank.reply_text(), None);

        let missing_fields: BrainReply = serde_json::from_str("{}").expect("fields default");
        assert_eq!(missing_fields.reply_text(), None);
    }
}
