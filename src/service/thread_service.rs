use tracing::warn;

use crate::api::MessagingApi;
use crate::models::{Attachment, Conversation, CurrentUser, MemberId, Message, MessageId};
use crate::thread::{OpenTarget, ThreadOp, ThreadState};

/// Conversation thread controller.
///
/// Owns the [`ThreadState`] of one open thread and drives it through the
/// [`MessagingApi`]. Failures never escape: they end up as the state's error
/// banner and the operation reports `false`/`None`.
pub struct ThreadController<A> {
    api: A,
    state: ThreadState,
}

impl<A: MessagingApi> ThreadController<A> {
    pub fn new(api: A, me: CurrentUser) -> Self {
        Self { api, state: ThreadState::new(me) }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn state(&self) -> &ThreadState {
        &self.state
    }

    /// Compose-area edits (draft, reply target, emoji picker).
    pub fn state_mut(&mut self) -> &mut ThreadState {
        &mut self.state
    }

    pub fn is_own_message(&self, message: &Message) -> bool {
        self.state.is_own_message(message)
    }

    pub fn select_attachment(&mut self, attachment: Attachment) -> bool {
        self.state.select_attachment(attachment)
    }

    pub fn dismiss_error(&mut self) {
        self.state.dismiss_error();
    }

    /// Opens (or creates) the direct conversation with `member_id` and loads
    /// its latest page.
    pub async fn open(&mut self, member_id: MemberId) -> bool {
        if !self.state.begin_open(member_id) {
            return false;
        }
        let target = OpenTarget::Member(member_id);

        match self.api.start_conversation(member_id).await {
            Ok(conversation) => self.load_first_page(target, conversation).await,
            Err(e) => {
                self.state.fail_open(target, e);
                false
            }
        }
    }

    /// Opens a conversation taken from the inbox. Groups can only be opened
    /// this way.
    pub async fn open_conversation(&mut self, conversation: Conversation) -> bool {
        self.state.begin_open_conversation(conversation.id);
        let target = OpenTarget::Conversation(conversation.id);
        self.load_first_page(target, conversation).await
    }

    async fn load_first_page(&mut self, target: OpenTarget, conversation: Conversation) -> bool {
        let conversation_id = conversation.id;
        let page = match self.api.list_messages(conversation_id, 1).await {
            Ok(p) => p,
            Err(e) => {
                self.state.fail_open(target, e);
                return false;
            }
        };
        if !self.state.complete_open(target, conversation, page) {
            return false;
        }

        match self.api.mark_read(conversation_id).await {
            Ok(()) => self.state.mark_read(conversation_id),
            Err(e) => warn!("Failed to mark conversation {conversation_id} as read: {e}"),
        }
        true
    }

    pub async fn load_older(&mut self) -> bool {
        let (Some(conversation_id), Some(page)) = (self.state.conversation_id(), self.state.next_page())
        else {
            return false;
        };

        match self.api.list_messages(conversation_id, page).await {
            Ok(older) => self.state.complete_load_older(conversation_id, older),
            Err(e) => {
                self.state.fail_in(conversation_id, ThreadOp::LoadOlder, e);
                false
            }
        }
    }

    /// Sends the compose area. Returns the id of the sent message, or `None`
    /// when nothing was sent.
    pub async fn send(&mut self) -> Option<MessageId> {
        let request = match self.state.prepare_send() {
            Ok(Some(request)) => request,
            Ok(None) => return None,
            Err(e) => {
                self.state.fail(ThreadOp::Send, e);
                return None;
            }
        };
        let conversation_id = request.conversation_id;

        match self.api.send_message(&request).await {
            Ok(message) => {
                let id = message.id;
                self.state.complete_send(conversation_id, message).then_some(id)
            }
            Err(e) => {
                self.state.fail_in(conversation_id, ThreadOp::Send, e);
                None
            }
        }
    }

    pub async fn edit(&mut self, id: MessageId, content: &str) -> bool {
        let content = match self.state.prepare_edit(id, content) {
            Ok(c) => c,
            Err(e) => {
                self.state.fail(ThreadOp::Edit, e);
                return false;
            }
        };
        let Some(conversation_id) = self.state.conversation_id() else {
            return false;
        };

        match self.api.edit_message(id, &content).await {
            Ok(updated) => self.state.complete_edit(conversation_id, updated),
            Err(e) => {
                self.state.fail_in(conversation_id, ThreadOp::Edit, e);
                false
            }
        }
    }

    pub async fn delete(&mut self, id: MessageId) -> bool {
        let id = match self.state.prepare_delete(id) {
            Ok(id) => id,
            Err(e) => {
                self.state.fail(ThreadOp::Delete, e);
                return false;
            }
        };
        let Some(conversation_id) = self.state.conversation_id() else {
            return false;
        };

        match self.api.delete_message(id).await {
            Ok(()) => self.state.complete_delete(conversation_id, id),
            Err(e) => {
                self.state.fail_in(conversation_id, ThreadOp::Delete, e);
                false
            }
        }
    }

    /// Submits the compose area: edits the targeted message when editing,
    /// sends a new message otherwise.
    pub async fn submit(&mut self) -> bool {
        match self.state.compose().edit_target() {
            Some(id) => {
                let draft = self.state.compose().draft().to_string();
                self.edit(id, &draft).await
            }
            None => self.send().await.is_some(),
        }
    }
}
