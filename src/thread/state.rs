use std::collections::HashSet;
use std::fmt;

use tracing::{error, info, warn};

use crate::errors::ThreadError;
use crate::models::{
    Attachment, Conversation, ConversationId, CurrentUser, MemberId, Message, MessageId,
    NewMessage, Page, Sender,
};
use crate::thread::compose::{ComposeState, ComposeTarget};

const PREVIEW_MAX_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadStatus {
    /// Nothing opened yet, or the last open failed.
    #[default]
    Idle,
    /// The target member is the current user; no message list exists.
    SelfConversation,
    Ready,
}

/// What a thread view was asked to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenTarget {
    /// Direct conversation with a member, started on demand.
    Member(MemberId),
    /// A conversation already listed in the inbox, group or direct.
    Conversation(ConversationId),
}

/// Operation an error banner refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadOp {
    Open,
    LoadOlder,
    Send,
    Reply,
    Attach,
    Edit,
    Delete,
}

impl fmt::Display for ThreadOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ThreadOp::Open => "open the conversation",
            ThreadOp::LoadOlder => "load older messages",
            ThreadOp::Send => "send the message",
            ThreadOp::Reply => "reply to the message",
            ThreadOp::Attach => "attach the file",
            ThreadOp::Edit => "edit the message",
            ThreadOp::Delete => "delete the message",
        })
    }
}

/// Dismissable inline error shown above the thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub op: ThreadOp,
    pub error: ThreadError,
}

impl ErrorBanner {
    pub fn text(&self) -> String {
        format!("Could not {}: {}", self.op, self.error)
    }

    pub fn can_retry(&self) -> bool {
        self.error.is_retryable()
    }

    /// Short advice shown next to the banner text.
    pub fn hint(&self) -> Option<&'static str> {
        if self.can_retry() {
            Some("Try again in a moment.")
        } else if self.error.is_identity() {
            Some("Choose another member.")
        } else if self.error.is_validation() {
            Some("Nothing was sent.")
        } else {
            None
        }
    }
}

/// Quoted preview of the message a reply points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPreview {
    Available {
        id: MessageId,
        sender_name: String,
        excerpt: String,
    },
    /// The original is not loaded (older page) or was deleted.
    Unavailable { id: MessageId },
}

/// Shortens `text` to [`PREVIEW_MAX_CHARS`] characters, marking the cut with `…`.
pub fn excerpt(text: &str) -> String {
    let t = text.trim();
    if t.chars().count() > PREVIEW_MAX_CHARS {
        format!("{}…", t.chars().take(PREVIEW_MAX_CHARS).collect::<String>())
    } else {
        t.to_string()
    }
}

/// State of one thread view: the loaded messages, the compose area and the
/// error banner.
///
/// All mutations are synchronous. Callers perform the API request between a
/// `prepare_*`/`begin_*` step and the matching `complete_*` step, or report
/// the failure with [`ThreadState::fail_open`] / [`ThreadState::fail_in`].
///
/// Completions name the open target or conversation their request was issued
/// for. One that no longer matches the view is ignored, so a slow response
/// never lands in a thread opened after it was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadState {
    me: CurrentUser,
    status: ThreadStatus,
    target: Option<OpenTarget>,
    conversation: Option<Conversation>,
    messages: Vec<Message>,
    next_page: Option<u32>,
    compose: ComposeState,
    error: Option<ErrorBanner>,
}

impl ThreadState {
    pub fn new(me: CurrentUser) -> Self {
        Self {
            me,
            status: ThreadStatus::Idle,
            target: None,
            conversation: None,
            messages: Vec::new(),
            next_page: None,
            compose: ComposeState::default(),
            error: None,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn me(&self) -> &CurrentUser {
        &self.me
    }

    pub fn status(&self) -> ThreadStatus {
        self.status
    }

    pub fn open_target(&self) -> Option<OpenTarget> {
        self.target
    }

    /// Member whose direct conversation was requested, if opened by member.
    pub fn member_id(&self) -> Option<MemberId> {
        match self.target {
            Some(OpenTarget::Member(id)) => Some(id),
            _ => None,
        }
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn conversation_id(&self) -> Option<ConversationId> {
        self.conversation.as_ref().map(|c| c.id)
    }

    /// Whether `conversation_id` is the conversation currently shown.
    pub fn is_open(&self, conversation_id: ConversationId) -> bool {
        self.conversation_id() == Some(conversation_id)
    }

    /// Messages in display order, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn next_page(&self) -> Option<u32> {
        self.next_page
    }

    pub fn has_older(&self) -> bool {
        self.next_page.is_some()
    }

    pub fn compose(&self) -> &ComposeState {
        &self.compose
    }

    pub fn compose_mut(&mut self) -> &mut ComposeState {
        &mut self.compose
    }

    pub fn error(&self) -> Option<&ErrorBanner> {
        self.error.as_ref()
    }

    pub fn title(&self) -> String {
        match &self.conversation {
            Some(conversation) => conversation.title_for(self.me.id),
            None => String::new(),
        }
    }

    // ── Ownership ────────────────────────────────────────────────────────────

    /// Whether `message` was sent by the current user.
    ///
    /// Compares the sender id against the server-confirmed identity only.
    /// A message without a sender id is never considered ours.
    pub fn is_own_message(&self, message: &Message) -> bool {
        message.sender_id() == Some(self.me.id)
    }

    /// Display name of the sender, falling back to the conversation's
    /// participant list when the message carries an id but no name.
    pub fn sender_name(&self, message: &Message) -> String {
        let from_message = message.sender.as_ref().map(|s| s.name.trim()).unwrap_or_default();
        if !from_message.is_empty() {
            return from_message.to_string();
        }
        let Some(id) = message.sender_id() else {
            return "Member".to_string();
        };
        if id == self.me.id && !self.me.name.trim().is_empty() {
            return self.me.name.trim().to_string();
        }
        self.conversation
            .as_ref()
            .and_then(|c| c.participant(id))
            .map(|p| p.name.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Member #{id}"))
    }

    pub fn reply_preview(&self, message: &Message) -> Option<ReplyPreview> {
        let id = message.reply_to?;
        Some(self.preview_of(id))
    }

    /// Preview of the current reply target, for the compose area.
    pub fn reply_target_preview(&self) -> Option<ReplyPreview> {
        self.compose.reply_target().map(|id| self.preview_of(id))
    }

    fn preview_of(&self, id: MessageId) -> ReplyPreview {
        match self.message(id) {
            Some(original) => ReplyPreview::Available {
                id,
                sender_name: self.sender_name(original),
                excerpt: excerpt(&original.summary()),
            },
            None => ReplyPreview::Unavailable { id },
        }
    }

    // ── Open / pagination ────────────────────────────────────────────────────

    /// Resets the view for `member_id`. Returns `false` (and enters
    /// [`ThreadStatus::SelfConversation`]) when no request must be made.
    pub fn begin_open(&mut self, member_id: MemberId) -> bool {
        self.reset_for(OpenTarget::Member(member_id));

        if member_id == self.me.id {
            info!("Blocked conversation with self (member {member_id})");
            self.status = ThreadStatus::SelfConversation;
            return false;
        }
        true
    }

    /// Resets the view for a conversation picked from the inbox.
    pub fn begin_open_conversation(&mut self, conversation_id: ConversationId) {
        self.reset_for(OpenTarget::Conversation(conversation_id));
    }

    fn reset_for(&mut self, target: OpenTarget) {
        self.status = ThreadStatus::Idle;
        self.target = Some(target);
        self.conversation = None;
        self.messages.clear();
        self.next_page = None;
        self.compose.reset();
        self.error = None;
    }

    /// Shows the first page of the conversation opened for `target`.
    /// Returns `false` when the view has moved on to another open.
    pub fn complete_open(
        &mut self,
        target: OpenTarget,
        conversation: Conversation,
        first_page: Page<Message>,
    ) -> bool {
        let pending = self.target == Some(target) && self.status == ThreadStatus::Idle;
        let matches = match target {
            OpenTarget::Conversation(id) => id == conversation.id,
            OpenTarget::Member(_) => true,
        };
        if !pending || !matches {
            warn!("Ignoring stale open of conversation {} ({target:?})", conversation.id);
            return false;
        }

        self.next_page = first_page.has_next().then_some(2);
        self.messages = display_order(first_page.results);
        info!(
            "Opened conversation {} with {} messages",
            conversation.id,
            self.messages.len()
        );
        self.conversation = Some(conversation);
        self.status = ThreadStatus::Ready;
        true
    }

    pub fn mark_read(&mut self, conversation_id: ConversationId) {
        if let Some(conversation) = self.conversation.as_mut().filter(|c| c.id == conversation_id) {
            conversation.unread_count = 0;
        }
    }

    /// Prepends an older page fetched with [`ThreadState::next_page`].
    pub fn complete_load_older(&mut self, conversation_id: ConversationId, page: Page<Message>) -> bool {
        if !self.accepts(conversation_id, "older page") {
            return false;
        }
        let current = self.next_page.unwrap_or(1);
        self.next_page = page.has_next().then_some(current + 1);

        let known: HashSet<MessageId> = self.messages.iter().map(|m| m.id).collect();
        let mut older: Vec<Message> = display_order(page.results)
            .into_iter()
            .filter(|m| !known.contains(&m.id))
            .collect();
        older.append(&mut self.messages);
        self.messages = older;
        true
    }

    // ── Send ────────────────────────────────────────────────────────────────

    /// Builds the creation request from the compose area. `Ok(None)` means
    /// there is nothing to send and no request must be issued.
    pub fn prepare_send(&self) -> Result<Option<NewMessage>, ThreadError> {
        let conversation = self.ready_conversation()?;
        if !self.compose.has_payload() {
            return Ok(None);
        }
        Ok(Some(NewMessage {
            conversation_id: conversation.id,
            content: self.compose.content().map(str::to_string),
            attachment: self.compose.attachment().cloned(),
            reply_to: self.compose.reply_target(),
        }))
    }

    /// Appends the created message. Returns `false` when the view no longer
    /// shows `conversation_id`; the compose area is then left alone.
    pub fn complete_send(&mut self, conversation_id: ConversationId, mut message: Message) -> bool {
        if !self.accepts(conversation_id, "sent message") {
            return false;
        }
        if message.conversation_id != conversation_id {
            warn!(
                "Sent message {} belongs to conversation {}, not {conversation_id}",
                message.id, message.conversation_id
            );
            return false;
        }

        // The author of a message we just created is the session identity.
        if message.sender_id().is_none() {
            message.sender = Some(Sender {
                id: Some(self.me.id),
                name: self.me.name.clone(),
                avatar: self.me.avatar.clone(),
            });
        }

        match self.messages.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => *existing = message,
            None => self.messages.push(message),
        }
        self.compose.clear_sent();
        self.clear_error_for(ThreadOp::Send);
        true
    }

    // ── Edit ────────────────────────────────────────────────────────────────

    /// Selects the attachment for the next send. Edits keep their original
    /// attachment, so nothing can be selected while editing.
    pub fn select_attachment(&mut self, attachment: Attachment) -> bool {
        if self.compose.edit_target().is_some() {
            self.fail(ThreadOp::Attach, ThreadError::AttachmentWhileEditing);
            return false;
        }
        if let Some(previous) = self.compose.select_attachment(attachment) {
            info!("Replaced attachment {}", previous.file_name);
        }
        true
    }

    /// Targets `id` for a reply. An unknown message raises the banner.
    pub fn start_reply(&mut self, id: MessageId) -> bool {
        if let Err(e) = self.require_message(id) {
            self.fail(ThreadOp::Reply, e);
            return false;
        }
        self.compose.set_target(Some(ComposeTarget::Reply(id)));
        true
    }

    /// Targets `id` for editing and loads its text into the draft. Only our
    /// own messages can be edited; anything else raises the banner.
    pub fn start_edit(&mut self, id: MessageId) -> bool {
        let content = match self.require_own(id) {
            Ok(message) => message.content.clone().unwrap_or_default(),
            Err(e) => {
                self.fail(ThreadOp::Edit, e);
                return false;
            }
        };
        self.compose.set_draft(content);
        self.compose.clear_attachment();
        self.compose.set_target(Some(ComposeTarget::Edit(id)));
        true
    }

    /// Drops the reply or edit target. Cancelling an edit also discards the
    /// draft that was loaded from the message.
    pub fn cancel_target(&mut self) {
        if let Some(ComposeTarget::Edit(_)) = self.compose.target() {
            self.compose.set_draft(String::new());
        }
        self.compose.set_target(None);
    }

    pub fn prepare_edit(&self, id: MessageId, content: &str) -> Result<String, ThreadError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ThreadError::EmptyEdit);
        }
        self.require_own(id)?;
        Ok(content.to_string())
    }

    /// Replaces the edited message in place.
    pub fn complete_edit(&mut self, conversation_id: ConversationId, mut updated: Message) -> bool {
        if !self.accepts(conversation_id, "edited message") {
            return false;
        }
        let Some(index) = self.messages.iter().position(|m| m.id == updated.id) else {
            warn!("Edited message {} is no longer in the thread", updated.id);
            return false;
        };
        let previous = &self.messages[index];
        if updated.sender_id().is_none() {
            updated.sender = previous.sender.clone();
        }
        updated.conversation_id = previous.conversation_id;
        updated.edited = true;
        self.messages[index] = updated;

        if self.compose.edit_target() == Some(self.messages[index].id) {
            self.compose.set_draft(String::new());
            self.compose.clear_attachment();
            self.compose.set_target(None);
        }
        self.clear_error_for(ThreadOp::Edit);
        true
    }

    // ── Delete ──────────────────────────────────────────────────────────────

    pub fn prepare_delete(&self, id: MessageId) -> Result<MessageId, ThreadError> {
        self.require_own(id).map(|m| m.id)
    }

    pub fn complete_delete(&mut self, conversation_id: ConversationId, id: MessageId) -> bool {
        if !self.accepts(conversation_id, "deletion") {
            return false;
        }
        self.messages.retain(|m| m.id != id);
        match self.compose.target() {
            Some(ComposeTarget::Edit(target)) if target == id => self.cancel_target(),
            Some(ComposeTarget::Reply(target)) if target == id => self.compose.set_target(None),
            _ => {}
        }
        self.clear_error_for(ThreadOp::Delete);
        true
    }

    // ── Errors ──────────────────────────────────────────────────────────────

    pub fn fail(&mut self, op: ThreadOp, error: ThreadError) {
        error!("Failed to {op}: {error}");
        self.error = Some(ErrorBanner { op, error });
    }

    /// Raises the banner for a failed open of `target`, unless another open
    /// replaced it meanwhile.
    pub fn fail_open(&mut self, target: OpenTarget, error: ThreadError) {
        if self.target == Some(target) && self.status == ThreadStatus::Idle {
            self.fail(ThreadOp::Open, error);
        } else {
            warn!("Dropping failure of stale open ({target:?}): {error}");
        }
    }

    /// Raises the banner for a request issued in `conversation_id`, unless
    /// the view shows another conversation by now.
    pub fn fail_in(&mut self, conversation_id: ConversationId, op: ThreadOp, error: ThreadError) {
        if self.is_open(conversation_id) {
            self.fail(op, error);
        } else {
            warn!("Dropping failure to {op} in conversation {conversation_id}: {error}");
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn accepts(&self, conversation_id: ConversationId, what: &str) -> bool {
        if self.is_open(conversation_id) {
            return true;
        }
        warn!("Ignoring {what} for conversation {conversation_id}: no longer open");
        false
    }

    fn clear_error_for(&mut self, op: ThreadOp) {
        if self.error.as_ref().is_some_and(|b| b.op == op) {
            self.error = None;
        }
    }

    fn ready_conversation(&self) -> Result<&Conversation, ThreadError> {
        match (&self.status, &self.conversation) {
            (ThreadStatus::Ready, Some(conversation)) => Ok(conversation),
            (ThreadStatus::SelfConversation, _) => Err(ThreadError::SelfConversation),
            _ => Err(ThreadError::Unexpected("No conversation is open".to_string())),
        }
    }

    fn require_message(&self, id: MessageId) -> Result<&Message, ThreadError> {
        self.message(id)
            .ok_or_else(|| ThreadError::MessageNotFound { id: id.to_string() })
    }

    fn require_own(&self, id: MessageId) -> Result<&Message, ThreadError> {
        let message = self.require_message(id)?;
        if !self.is_own_message(message) {
            return Err(ThreadError::NotMessageOwner);
        }
        Ok(message)
    }
}

/// Drops messages without a resolvable sender and turns the API's
/// newest-first page into oldest-first display order.
fn display_order(page: Vec<Message>) -> Vec<Message> {
    let mut messages: Vec<Message> = page
        .into_iter()
        .filter(|m| {
            if m.sender_id().is_some() {
                return true;
            }
            warn!("Skipping message: {}", ThreadError::UnresolvedSender { id: m.id.to_string() });
            false
        })
        .collect();
    messages.reverse();
    messages
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::{AttachmentKind, ConversationId, MessageKind, Participant};

    const ME: MemberId = MemberId(1);
    const OTHER: MemberId = MemberId(2);

    fn me() -> CurrentUser {
        CurrentUser { id: ME, name: "Amina".to_string(), avatar: None }
    }

    fn conversation() -> Conversation {
        Conversation {
            id: ConversationId(10),
            participants: vec![
                Participant { id: ME, name: "Amina".to_string(), avatar: None },
                Participant { id: OTHER, name: "Dr. Mensah".to_string(), avatar: None },
            ],
            is_group: false,
            group_name: None,
            last_message: None,
            unread_count: 3,
        }
    }

    fn message(id: u64, sender: Option<MemberId>, content: &str) -> Message {
        Message {
            id: MessageId(id),
            conversation_id: ConversationId(10),
            sender: sender.map(|sid| Sender { id: Some(sid), name: String::new(), avatar: None }),
            content: Some(content.to_string()),
            kind: MessageKind::Text,
            attachment: None,
            reply_to: None,
            edited: false,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, id as u32 % 60).unwrap(),
        }
    }

    fn page(messages: Vec<Message>, next: bool) -> Page<Message> {
        Page {
            results: messages,
            next: next.then(|| "http://api/?page=2".to_string()),
        }
    }

    /// Thread opened with the API's newest-first page `[3, 2, 1]`.
    fn ready_state() -> ThreadState {
        let mut state = ThreadState::new(me());
        assert!(state.begin_open(OTHER));
        state.complete_open(
            OpenTarget::Member(OTHER),
            conversation(),
            page(
                vec![
                    message(3, Some(ME), "see you there"),
                    message(2, Some(OTHER), "the board meets friday"),
                    message(1, Some(ME), "hello"),
                ],
                false,
            ),
        );
        state
    }

    fn ids(state: &ThreadState) -> Vec<u64> {
        state.messages().iter().map(|m| m.id.0).collect()
    }

    #[test]
    fn open_with_self_blocks_without_list() {
        let mut state = ThreadState::new(me());
        assert!(!state.begin_open(ME));
        assert_eq!(state.status(), ThreadStatus::SelfConversation);
        assert!(state.messages().is_empty());
        assert_eq!(state.prepare_send(), Err(ThreadError::SelfConversation));
    }

    #[test]
    fn open_reverses_to_oldest_first() {
        let state = ready_state();
        assert_eq!(state.status(), ThreadStatus::Ready);
        assert_eq!(ids(&state), vec![1, 2, 3]);
        assert_eq!(state.title(), "Dr. Mensah");
    }

    #[test]
    fn open_drops_messages_without_sender() {
        let mut state = ThreadState::new(me());
        state.begin_open(OTHER);
        let mut senderless = message(5, Some(OTHER), "broken");
        senderless.sender = Some(Sender { id: None, name: "ghost".to_string(), avatar: None });
        state.complete_open(
            OpenTarget::Member(OTHER),
            conversation(),
            page(
                vec![message(6, Some(OTHER), "ok"), senderless, message(4, None, "also broken")],
                false,
            ),
        );
        assert_eq!(ids(&state), vec![6]);
    }

    #[test]
    fn ownership_is_decided_by_sender_id_only() {
        let state = ready_state();
        let mine = message(20, Some(ME), "a");
        let theirs = message(21, Some(OTHER), "b");
        let anonymous = message(22, None, "c");
        assert!(state.is_own_message(&mine));
        assert!(!state.is_own_message(&theirs));
        assert!(!state.is_own_message(&anonymous));
    }

    #[test]
    fn empty_compose_prepares_nothing() {
        let mut state = ready_state();
        state.compose_mut().set_draft("  ");
        assert_eq!(state.prepare_send(), Ok(None));
    }

    #[test]
    fn prepare_send_carries_reply_and_attachment() {
        let mut state = ready_state();
        assert!(state.start_reply(MessageId(2)));
        state.compose_mut().set_draft(" agreed ");
        assert!(state.select_attachment(Attachment::new(AttachmentKind::Image, "a.png", "image/png", vec![0])));

        let request = state.prepare_send().unwrap().unwrap();
        assert_eq!(request.conversation_id, ConversationId(10));
        assert_eq!(request.content.as_deref(), Some("agreed"));
        assert_eq!(request.reply_to, Some(MessageId(2)));
        assert_eq!(request.kind(), MessageKind::Image);
    }

    #[test]
    fn complete_send_appends_and_clears_compose() {
        let mut state = ready_state();
        assert!(state.start_reply(MessageId(2)));
        state.compose_mut().set_draft("agreed");
        state.fail(ThreadOp::Send, ThreadError::network("offline"));

        let mut sent = message(4, None, "agreed");
        sent.reply_to = Some(MessageId(2));
        assert!(state.complete_send(ConversationId(10), sent));

        assert_eq!(ids(&state), vec![1, 2, 3, 4]);
        assert!(state.is_own_message(state.message(MessageId(4)).unwrap()));
        assert_eq!(state.compose().draft(), "");
        assert_eq!(state.compose().target(), None);
        assert!(state.error().is_none());
    }

    #[test]
    fn failed_send_keeps_draft() {
        let mut state = ready_state();
        state.compose_mut().set_draft("important");
        state.fail(ThreadOp::Send, ThreadError::Server { status: 503 });

        assert_eq!(state.compose().draft(), "important");
        let banner = state.error().unwrap();
        assert!(banner.can_retry());
        assert_eq!(banner.text(), "Could not send the message: Messaging service error (503)");

        state.dismiss_error();
        assert!(state.error().is_none());
    }

    #[test]
    fn edit_replaces_in_place_with_marker() {
        let mut state = ready_state();
        assert!(state.start_edit(MessageId(1)));
        assert_eq!(state.compose().draft(), "hello");

        let content = state.prepare_edit(MessageId(1), "  hello everyone ").unwrap();
        assert_eq!(content, "hello everyone");

        let mut updated = message(1, None, "hello everyone");
        updated.edited = false;
        assert!(state.complete_edit(ConversationId(10), updated));

        let edited = &state.messages()[0];
        assert_eq!(edited.id, MessageId(1));
        assert_eq!(edited.content.as_deref(), Some("hello everyone"));
        assert!(edited.edited);
        assert!(state.is_own_message(edited));
        assert_eq!(ids(&state), vec![1, 2, 3]);
        assert_eq!(state.compose().target(), None);
        assert_eq!(state.compose().draft(), "");
    }

    #[test]
    fn edit_validation() {
        let state = ready_state();
        assert_eq!(state.prepare_edit(MessageId(1), "   "), Err(ThreadError::EmptyEdit));
        assert_eq!(state.prepare_edit(MessageId(2), "mine now"), Err(ThreadError::NotMessageOwner));
        assert_eq!(
            state.prepare_edit(MessageId(99), "x"),
            Err(ThreadError::MessageNotFound { id: "99".to_string() })
        );
    }

    #[test]
    fn delete_keeps_other_messages_in_order() {
        let mut state = ready_state();
        assert!(state.start_reply(MessageId(3)));
        assert_eq!(state.prepare_delete(MessageId(3)), Ok(MessageId(3)));
        assert!(state.complete_delete(ConversationId(10), MessageId(3)));

        assert_eq!(ids(&state), vec![1, 2]);
        assert_eq!(state.compose().target(), None);
        assert_eq!(state.prepare_delete(MessageId(2)), Err(ThreadError::NotMessageOwner));
    }

    #[test]
    fn reply_preview_resolves_and_truncates() {
        let mut state = ThreadState::new(me());
        let long = "x".repeat(80);
        let mut original = message(4, None, &long);
        original.sender = Some(Sender { id: Some(OTHER), name: String::new(), avatar: None });
        state.begin_open(OTHER);
        state.complete_open(
            OpenTarget::Member(OTHER),
            conversation(),
            page(vec![original, message(1, Some(ME), "hi")], false),
        );

        let mut reply = message(5, Some(ME), "re");
        reply.reply_to = Some(MessageId(4));
        match state.reply_preview(&reply) {
            Some(ReplyPreview::Available { sender_name, excerpt, .. }) => {
                assert_eq!(sender_name, "Dr. Mensah");
                assert_eq!(excerpt.chars().count(), 61);
                assert!(excerpt.ends_with('…'));
            }
            other => panic!("unexpected preview {other:?}"),
        }

        reply.reply_to = Some(MessageId(77));
        assert_eq!(
            state.reply_preview(&reply),
            Some(ReplyPreview::Unavailable { id: MessageId(77) })
        );
    }

    #[test]
    fn older_page_is_prepended_without_duplicates() {
        let mut state = ThreadState::new(me());
        state.begin_open(OTHER);
        state.complete_open(
            OpenTarget::Member(OTHER),
            conversation(),
            page(vec![message(6, Some(OTHER), "f"), message(5, Some(ME), "e")], true),
        );
        assert_eq!(state.next_page(), Some(2));

        assert!(state.complete_load_older(
            ConversationId(10),
            page(
                vec![message(5, Some(ME), "e"), message(4, Some(OTHER), "d"), message(3, None, "?")],
                false,
            ),
        ));
        assert_eq!(ids(&state), vec![4, 5, 6]);
        assert!(!state.has_older());
    }

    #[test]
    fn mark_read_zeroes_unread() {
        let mut state = ready_state();
        state.mark_read(ConversationId(11));
        assert_eq!(state.conversation().unwrap().unread_count, 3);
        state.mark_read(ConversationId(10));
        assert_eq!(state.conversation().unwrap().unread_count, 0);
    }

    fn group() -> Conversation {
        Conversation {
            id: ConversationId(12),
            participants: vec![
                Participant { id: ME, name: "Amina".to_string(), avatar: None },
                Participant { id: OTHER, name: "Dr. Mensah".to_string(), avatar: None },
                Participant { id: MemberId(3), name: "Kofi".to_string(), avatar: None },
            ],
            is_group: true,
            group_name: Some("Board".to_string()),
            last_message: None,
            unread_count: 4,
        }
    }

    /// `ready_state` switched to the group conversation 12.
    fn switched_to_group() -> ThreadState {
        let mut state = ready_state();
        state.begin_open_conversation(ConversationId(12));
        let mut first = message(30, Some(MemberId(3)), "agenda");
        first.conversation_id = ConversationId(12);
        assert!(state.complete_open(
            OpenTarget::Conversation(ConversationId(12)),
            group(),
            page(vec![first], false),
        ));
        state
    }

    #[test]
    fn late_open_does_not_replace_self_block() {
        let mut state = ThreadState::new(me());
        assert!(state.begin_open(OTHER));
        assert!(!state.begin_open(ME));

        let applied = state.complete_open(
            OpenTarget::Member(OTHER),
            conversation(),
            page(vec![message(1, Some(OTHER), "hi")], false),
        );
        assert!(!applied);
        assert_eq!(state.status(), ThreadStatus::SelfConversation);
        assert!(state.messages().is_empty());
        assert!(state.conversation().is_none());

        state.fail_open(OpenTarget::Member(OTHER), ThreadError::network("offline"));
        assert!(state.error().is_none());
    }

    #[test]
    fn send_completing_after_switch_stays_out_of_new_thread() {
        let mut state = ready_state();
        state.compose_mut().set_draft("on my way");
        let request = state.prepare_send().unwrap().unwrap();

        state.begin_open_conversation(ConversationId(12));
        let mut first = message(30, Some(MemberId(3)), "agenda");
        first.conversation_id = ConversationId(12);
        state.complete_open(
            OpenTarget::Conversation(ConversationId(12)),
            group(),
            page(vec![first], false),
        );
        state.compose_mut().set_draft("new draft");

        let mut sent = message(40, Some(ME), "on my way");
        sent.conversation_id = request.conversation_id;
        assert!(!state.complete_send(request.conversation_id, sent));
        assert_eq!(ids(&state), vec![30]);
        assert_eq!(state.compose().draft(), "new draft");

        state.fail_in(request.conversation_id, ThreadOp::Send, ThreadError::Server { status: 500 });
        assert!(state.error().is_none());
    }

    #[test]
    fn stale_edit_delete_and_page_are_ignored() {
        let mut state = switched_to_group();

        let mut edited = message(30, Some(MemberId(3)), "changed elsewhere");
        edited.conversation_id = ConversationId(12);
        assert!(!state.complete_edit(ConversationId(10), edited));
        assert!(!state.complete_delete(ConversationId(10), MessageId(30)));
        assert!(!state.complete_load_older(
            ConversationId(10),
            page(vec![message(2, Some(OTHER), "old")], false),
        ));

        assert_eq!(ids(&state), vec![30]);
        assert_eq!(state.messages()[0].content.as_deref(), Some("agenda"));
    }

    #[test]
    fn sent_message_for_another_conversation_is_rejected() {
        let mut state = ready_state();
        state.compose_mut().set_draft("hello");
        let mut stray = message(41, Some(ME), "hello");
        stray.conversation_id = ConversationId(99);

        assert!(!state.complete_send(ConversationId(10), stray));
        assert_eq!(ids(&state), vec![1, 2, 3]);
        assert_eq!(state.compose().draft(), "hello");
    }

    #[test]
    fn group_opens_by_conversation_id() {
        let mut state = ready_state();
        state.begin_open_conversation(ConversationId(12));
        assert_eq!(state.member_id(), None);
        assert_eq!(state.open_target(), Some(OpenTarget::Conversation(ConversationId(12))));

        // The first page of another conversation never fills this view.
        assert!(!state.complete_open(
            OpenTarget::Conversation(ConversationId(12)),
            conversation(),
            page(vec![message(1, Some(ME), "hello")], false),
        ));
        assert_eq!(state.status(), ThreadStatus::Idle);

        let state = switched_to_group();
        assert_eq!(state.status(), ThreadStatus::Ready);
        assert_eq!(state.title(), "Board");
        assert_eq!(state.sender_name(&state.messages()[0]), "Kofi");
    }

    #[test]
    fn attachment_is_refused_while_editing() {
        let mut state = ready_state();
        assert!(state.start_edit(MessageId(1)));

        let pdf = Attachment::new(AttachmentKind::File, "minutes.pdf", "application/pdf", vec![1]);
        assert!(!state.select_attachment(pdf));
        assert!(state.compose().attachment().is_none());
        let banner = state.error().unwrap();
        assert_eq!(banner.op, ThreadOp::Attach);
        assert_eq!(banner.error, ThreadError::AttachmentWhileEditing);
        assert_eq!(banner.hint(), Some("Nothing was sent."));
    }

    #[test]
    fn reply_and_edit_targets_report_failures() {
        let mut state = ready_state();

        assert!(!state.start_reply(MessageId(77)));
        let banner = state.error().unwrap();
        assert_eq!(banner.op, ThreadOp::Reply);
        assert_eq!(banner.error, ThreadError::MessageNotFound { id: "77".to_string() });

        assert!(!state.start_edit(MessageId(2)));
        assert_eq!(state.error().unwrap().op, ThreadOp::Edit);
        assert_eq!(state.error().unwrap().error, ThreadError::NotMessageOwner);
        assert_eq!(state.compose().target(), None);
        assert_eq!(state.compose().draft(), "");
    }

    #[test]
    fn banner_hints_follow_error_groups() {
        let mut state = ready_state();
        state.fail(ThreadOp::Attach, ThreadError::Unexpected("unreadable file".to_string()));
        assert_eq!(state.error().unwrap().text(), "Could not attach the file: Unexpected error: unreadable file");
        assert_eq!(state.error().unwrap().hint(), None);

        state.fail(ThreadOp::Send, ThreadError::network("offline"));
        assert_eq!(state.error().unwrap().hint(), Some("Try again in a moment."));

        let mut blocked = ThreadState::new(me());
        blocked.begin_open(ME);
        blocked.fail(ThreadOp::Send, ThreadError::SelfConversation);
        assert_eq!(blocked.error().unwrap().hint(), Some("Choose another member."));
    }
}
