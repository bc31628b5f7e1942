//! Maps raw wire-format message content to `(text, kind)`.

use serde::{Deserialize, Serialize};

/// Raw message content as the socket gateway relays it. Every variant is
/// optional; a populated field marks the message's type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageContent {
    pub conversation: Option<String>,
    pub extended_text_message: Option<ExtendedTextContent>,
    pub image_message: Option<CaptionedContent>,
    pub video_message: Option<CaptionedContent>,
    pub audio_message: Option<serde_json::Value>,
    pub document_message: Option<DocumentContent>,
    pub sticker_message: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtendedTextContent {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptionedContent {
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentContent {
    pub caption: Option<String>,
    pub file_name: Option<String>,
}

/// Message type tags in the downstream turn contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    Conversation,
    ExtendedText,
    ImageMessage,
    VideoMessage,
    AudioMessage,
    DocumentMessage,
    StickerMessage,
    Other,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Conversation => "conversation",
            MessageKind::ExtendedText => "extendedText",
            MessageKind::ImageMessage => "imageMessage",
            MessageKind::VideoMessage => "videoMessage",
            MessageKind::AudioMessage => "audioMessage",
            MessageKind::DocumentMessage => "documentMessage",
            MessageKind::StickerMessage => "stickerMessage",
            MessageKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub text: String,
    pub kind: MessageKind,
}

/// Total over all known variants plus a default; first populated variant
/// wins. Media without a caption classifies with empty text, which callers
/// must drop before buffering.
pub fn classify(content: &MessageContent) -> Classified {
    if let Some(text) = content.conversation.as_deref() {
        return Classified {
            text: text.to_string(),
            kind: MessageKind::Conversation,
        };
    }
    if let Some(extended) = content.extended_text_message.as_ref() {
        return Classified {
            text: extended.text.clone().unwrap_or_default(),
            kind: MessageKind::ExtendedText,
        };
    }
    if let Some(image) = content.image_message.as_ref() {
        return Classified {
            text: image.caption.clone().unwrap_or_default(),
            kind: MessageKind::ImageMessage,
        };
    }
    if let Some(video) = content.video_message.as_ref() {
        return Classified {
            text: video.caption.clone().unwrap_or_default(),
            kind: MessageKind::VideoMessage,
        };
    }
    if content.audio_message.is_some() {
        return Classified {
            text: String::new(),
            kind: MessageKind::AudioMessage,
        };
    }
    if let Some(document) = content.document_message.as_ref() {
        return Classified {
            text: document
                .caption
                .clone()
                .or_else(|| document.file_name.clone())
                .unwrap_or_default(),
            kind: MessageKind::DocumentMessage,
        };
    }
    if content.sticker_message.is_some() {
        return Classified {
            text: String::new(),
            kind: MessageKind::StickerMessage,
        };
    }
    Classified {
        text: String::new(),
        kind: MessageKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CaptionedContent, DocumentContent, ExtendedTextContent, MessageContent, MessageKind,
        classify,
    };

    #[test]
    fn plain_conversation_wins_over_everything_else() {
        let content = MessageContent {
            conversation: Some("oi".to_string()),
            extended_text_message: Some(ExtendedTextContent {
                text: Some("quoted".to_string()),
            }),
            ..MessageContent::default()
        };
        let classified = classify(&content);
        assert_eq!(classified.kind, MessageKind::Conversation);
        assert_eq!(classified.text, "oi");
    }

    #[test]
    fn extended_text_falls_back_to_empty_when_text_missing() {
        let content = MessageContent {
            extended_text_message: Some(ExtendedTextContent { text: None }),
            ..MessageContent::default()
        };
        let classified = classify(&content);
        assert_eq!(classified.kind, MessageKind::ExtendedText);
        assert_eq!(classified.text, "");
    }

    #[test]
    fn media_captions_carry_through() {
        let image = MessageContent {
            image_message: Some(CaptionedContent {
                caption: Some("look at this".to_string()),
            }),
            ..MessageContent::default()
        };
        assert_eq!(classify(&image).kind, MessageKind::ImageMessage);
        assert_eq!(classify(&image).text, "look at this");

        let video = MessageContent {
            video_message: Some(CaptionedContent { caption: None }),
            ..MessageContent::default()
        };
        assert_eq!(classify(&video).kind, MessageKind::VideoMessage);
        assert_eq!(classify(&video).text, "");
    }

    #[test]
    fn audio_and_sticker_classify_with_empty_text() {
        let audio = MessageContent {
            audio_message: Some(serde_json::json!({"seconds": 4})),
            ..MessageContent::default()
        };
        assert_eq!(classify(&audio).kind, MessageKind::AudioMessage);
        assert_eq!(classify(&audio).text, "");

        let sticker = MessageContent {
            sticker_message: Some(serde_json::json!({})),
            ..MessageContent::default()
        };
        assert_eq!(classify(&sticker).kind, MessageKind::StickerMessage);
        assert_eq!(classify(&sticker).text, "");
    }

    #[test]
    fn document_prefers_caption_then_file_name_then_empty() {
        let with_caption = MessageContent {
            document_message: Some(DocumentContent {
                caption: Some("contract draft".to_string()),
                file_name: Some("draft.pdf".to_string()),
            }),
            ..MessageContent::default()
        };
        assert_eq!(classify(&with_caption).text, "contract draft");

        let file_name_only = MessageContent {
            document_message: Some(DocumentContent {
                caption: None,
                file_name: Some("draft.pdf".to_string()),
            }),
            ..MessageContent::default()
        };
        assert_eq!(classify(&file_name_only).text, "draft.pdf");

        let bare = MessageContent {
            document_message: Some(DocumentContent::default()),
            ..MessageContent::default()
        };
        assert_eq!(classify(&bare).text, "");
        assert_eq!(classify(&bare).kind, MessageKind::DocumentMessage);
    }

    #[test]
    fn unknown_payload_classifies_as_other() {
        let classified = classify(&MessageContent::default());
        assert_eq!(classified.kind, MessageKind::Other);
        assert_eq!(classified.text, "");
    }

    #[test]
    fn kind_tags_match_the_turn_contract() {
        assert_eq!(MessageKind::Conversation.as_str(), "conversation");
        assert_eq!(MessageKind::ExtendedText.as_str(), "extendedText");
        assert_eq!(MessageKind::DocumentMessage.as_str(), "documentMessage");
        assert_eq!(
            serde_json::to_string(&MessageKind::ExtendedText).expect("kind should serialize"),
            "\"extendedText\""
        );
    }

    #[test]
    fn wire_content_deserializes_from_camel_case() {
        let content: MessageContent = serde_json::from_str(
            r#"{"extendedTextMessage":{"text":"hello"},"documentMessage":{"fileName":"a.txt"}}"#,
        )
        .expect("wire content should deserialize");
        let classified = classify(&content);
        assert_eq!(classified.kind, MessageKind::ExtendedText);
        assert_eq!(classified.text, "hello");
    }
}
