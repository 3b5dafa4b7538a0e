use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

id_type!(
    /// Primary key of an association member.
    MemberId
);
id_type!(ConversationId);
id_type!(MessageId);

/// The signed-in member, as confirmed by the server session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: MemberId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: MemberId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Sender block embedded in a message. The id is optional on the wire because
/// malformed payloads do occur; such messages are never rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    #[serde(default)]
    pub id: Option<MemberId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
    Emoji,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::File => "file",
            MessageKind::Emoji => "emoji",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(rename = "conversation")]
    pub conversation_id: ConversationId,
    #[serde(default)]
    pub sender: Option<Sender>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "message_type", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(default)]
    pub reply_to: Option<MessageId>,
    #[serde(rename = "is_edited", default)]
    pub edited: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn sender_id(&self) -> Option<MemberId> {
        self.sender.as_ref().and_then(|s| s.id)
    }

    /// Text content, treating a blank string the same as no content.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    pub fn sender_name(&self) -> &str {
        match &self.sender {
            Some(sender) if !sender.name.trim().is_empty() => sender.name.trim(),
            _ => "Member",
        }
    }

    /// One-line description used in previews and conversation summaries.
    pub fn summary(&self) -> String {
        if let Some(text) = self.text() {
            return text.to_string();
        }
        match self.kind {
            MessageKind::Image => "Sent an image".to_string(),
            MessageKind::File => "Sent a file".to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "message_type", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub sender_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for LastMessage {
    fn from(m: &Message) -> Self {
        Self {
            content: Some(m.summary()).filter(|s| !s.is_empty()),
            kind: m.kind,
            sender_name: m.sender_name().to_string(),
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    #[serde(default)]
    pub unread_count: u32,
}

impl Conversation {
    /// The first participant that is not `me`.
    pub fn other_participant(&self, me: MemberId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id != me)
    }

    pub fn participant(&self, id: MemberId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Title shown for this conversation to `me`.
    pub fn title_for(&self, me: MemberId) -> String {
        if self.is_group {
            if let Some(name) = self.group_name.as_deref().filter(|n| !n.trim().is_empty()) {
                return name.trim().to_string();
            }
            return "Group conversation".to_string();
        }
        match self.other_participant(me) {
            Some(p) if !p.name.trim().is_empty() => p.name.trim().to_string(),
            Some(p) => format!("Member #{}", p.id),
            None => "Conversation".to_string(),
        }
    }
}

/// Django REST framework page envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.as_deref().is_some_and(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    File,
    Image,
}

impl AttachmentKind {
    pub fn message_kind(&self) -> MessageKind {
        match self {
            AttachmentKind::File => MessageKind::File,
            AttachmentKind::Image => MessageKind::Image,
        }
    }
}

/// A file or image selected in the compose area, not yet uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(
        kind: AttachmentKind,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            kind,
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("kind", &self.kind)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Request body for `POST /conversations/start`.
#[derive(Debug, Clone, Serialize)]
pub struct StartConversationRequest {
    pub member_id: MemberId,
}

/// Message-creation request for `POST /messages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub content: Option<String>,
    pub attachment: Option<Attachment>,
    pub reply_to: Option<MessageId>,
}

impl NewMessage {
    pub fn kind(&self) -> MessageKind {
        self.attachment
            .as_ref()
            .map(|a| a.kind.message_kind())
            .unwrap_or(MessageKind::Text)
    }
}

/// JSON body for `POST /messages` when nothing has to be uploaded.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessageBody<'a> {
    pub conversation: ConversationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
    pub message_type: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
}

impl<'a> From<&'a NewMessage> for NewMessageBody<'a> {
    fn from(m: &'a NewMessage) -> Self {
        Self {
            conversation: m.conversation_id,
            content: m.content.as_deref(),
            message_type: m.kind(),
            reply_to: m.reply_to,
        }
    }
}

/// Request body for `PATCH /messages/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct EditMessageRequest {
    pub content: String,
}
