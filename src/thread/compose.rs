use crate::models::{Attachment, MessageId};

/// What the next submit acts on besides creating a plain message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeTarget {
    Reply(MessageId),
    Edit(MessageId),
}

/// Local, unsent input of a thread view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeState {
    draft: String,
    attachment: Option<Attachment>,
    target: Option<ComposeTarget>,
    emoji_picker_open: bool,
}

impl ComposeState {
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    /// Selects a file or image, replacing any attachment of either kind.
    /// Returns the attachment that was replaced.
    pub fn select_attachment(&mut self, attachment: Attachment) -> Option<Attachment> {
        self.attachment.replace(attachment)
    }

    pub fn clear_attachment(&mut self) -> Option<Attachment> {
        self.attachment.take()
    }

    pub fn target(&self) -> Option<ComposeTarget> {
        self.target
    }

    pub fn reply_target(&self) -> Option<MessageId> {
        match self.target {
            Some(ComposeTarget::Reply(id)) => Some(id),
            _ => None,
        }
    }

    pub fn edit_target(&self) -> Option<MessageId> {
        match self.target {
            Some(ComposeTarget::Edit(id)) => Some(id),
            _ => None,
        }
    }

    pub(crate) fn set_target(&mut self, target: Option<ComposeTarget>) {
        self.target = target;
    }

    pub fn emoji_picker_open(&self) -> bool {
        self.emoji_picker_open
    }

    pub fn toggle_emoji_picker(&mut self) {
        self.emoji_picker_open = !self.emoji_picker_open;
    }

    /// Appends `emoji` to the draft and closes the picker.
    pub fn insert_emoji(&mut self, emoji: &str) {
        self.draft.push_str(emoji);
        self.emoji_picker_open = false;
    }

    /// Trimmed draft, `None` when blank.
    pub fn content(&self) -> Option<&str> {
        Some(self.draft.trim()).filter(|c| !c.is_empty())
    }

    /// True when a send would issue a request.
    pub fn has_payload(&self) -> bool {
        self.content().is_some() || self.attachment.is_some()
    }

    /// Clears what a successful send consumed: text, attachment and reply target.
    pub(crate) fn clear_sent(&mut self) {
        self.draft.clear();
        self.attachment = None;
        if matches!(self.target, Some(ComposeTarget::Reply(_))) {
            self.target = None;
        }
        self.emoji_picker_open = false;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttachmentKind;

    fn file(name: &str, kind: AttachmentKind) -> Attachment {
        Attachment::new(kind, name, "application/octet-stream", vec![1, 2, 3])
    }

    #[test]
    fn file_and_image_are_mutually_exclusive() {
        let mut compose = ComposeState::default();
        assert!(compose.select_attachment(file("cv.pdf", AttachmentKind::File)).is_none());

        let replaced = compose.select_attachment(file("badge.png", AttachmentKind::Image));
        assert_eq!(replaced.map(|a| a.file_name), Some("cv.pdf".to_string()));
        let current = compose.attachment().unwrap();
        assert_eq!(current.kind, AttachmentKind::Image);
        assert_eq!(current.file_name, "badge.png");
    }

    #[test]
    fn whitespace_draft_has_no_payload() {
        let mut compose = ComposeState::default();
        compose.set_draft("   \n\t ");
        assert_eq!(compose.content(), None);
        assert!(!compose.has_payload());

        compose.select_attachment(file("cv.pdf", AttachmentKind::File));
        assert!(compose.has_payload());
    }

    #[test]
    fn emoji_insert_appends_and_closes_picker() {
        let mut compose = ComposeState::default();
        compose.set_draft("Congratulations ");
        compose.toggle_emoji_picker();
        assert!(compose.emoji_picker_open());

        compose.insert_emoji("🎉");
        assert_eq!(compose.draft(), "Congratulations 🎉");
        assert!(!compose.emoji_picker_open());
    }

    #[test]
    fn clear_sent_keeps_edit_target() {
        let mut compose = ComposeState::default();
        compose.set_draft("hello");
        compose.set_target(Some(ComposeTarget::Reply(MessageId(4))));
        compose.clear_sent();
        assert_eq!(compose.draft(), "");
        assert_eq!(compose.target(), None);

        compose.set_target(Some(ComposeTarget::Edit(MessageId(5))));
        compose.clear_sent();
        assert_eq!(compose.edit_target(), Some(MessageId(5)));
    }
}
