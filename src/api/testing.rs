//! In-memory [`MessagingApi`] for controller tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::api::MessagingApi;
use crate::errors::ThreadError;
use crate::models::{
    Conversation, ConversationId, CurrentUser, MemberId, Message, MessageId, MessageKind,
    NewMessage, Page, Participant, Sender,
};

pub const CONVERSATION: ConversationId = ConversationId(10);

pub fn sample_message(id: u64, sender: Option<MemberId>, content: &str) -> Message {
    Message {
        id: MessageId(id),
        conversation_id: CONVERSATION,
        sender: sender.map(|sid| Sender { id: Some(sid), name: format!("Member {sid}"), avatar: None }),
        content: Some(content.to_string()),
        kind: MessageKind::Text,
        attachment: None,
        reply_to: None,
        edited: false,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + chrono::Duration::minutes(id as i64),
    }
}

pub fn sample_conversation(id: u64, me: MemberId, other: MemberId, unread: u32) -> Conversation {
    Conversation {
        id: ConversationId(id),
        participants: vec![
            Participant { id: me, name: "Amina".to_string(), avatar: None },
            Participant { id: other, name: format!("Member {other}"), avatar: None },
        ],
        is_group: false,
        group_name: None,
        last_message: None,
        unread_count: unread,
    }
}

pub struct FakeApi {
    me: MemberId,
    page_size: usize,
    /// Oldest first.
    messages: RefCell<Vec<Message>>,
    conversations: RefCell<Vec<Conversation>>,
    failures: RefCell<HashMap<&'static str, ThreadError>>,
    calls: RefCell<Vec<String>>,
    next_id: Cell<u64>,
}

impl FakeApi {
    pub fn new(me: MemberId) -> Self {
        Self {
            me,
            page_size: 20,
            messages: RefCell::new(Vec::new()),
            conversations: RefCell::new(Vec::new()),
            failures: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
            next_id: Cell::new(100),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn seed_messages(&self, messages: Vec<Message>) {
        *self.messages.borrow_mut() = messages;
    }

    pub fn seed_conversations(&self, conversations: Vec<Conversation>) {
        *self.conversations.borrow_mut() = conversations;
    }

    /// Makes the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: &'static str, error: ThreadError) {
        self.failures.borrow_mut().insert(operation, error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, operation: &'static str, args: String) -> Result<(), ThreadError> {
        let call = if args.is_empty() { operation.to_string() } else { format!("{operation} {args}") };
        self.calls.borrow_mut().push(call);
        match self.failures.borrow_mut().remove(operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait(?Send)]
impl MessagingApi for FakeApi {
    async fn current_user(&self) -> Result<CurrentUser, ThreadError> {
        self.record("current_user", String::new())?;
        Ok(CurrentUser { id: self.me, name: "Amina".to_string(), avatar: None })
    }

    async fn list_conversations(&self) -> Result<Page<Conversation>, ThreadError> {
        self.record("list_conversations", String::new())?;
        Ok(Page { results: self.conversations.borrow().clone(), next: None })
    }

    async fn start_conversation(&self, member_id: MemberId) -> Result<Conversation, ThreadError> {
        self.record("start_conversation", member_id.to_string())?;
        Ok(sample_conversation(CONVERSATION.0, self.me, member_id, 2))
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
        page: u32,
    ) -> Result<Page<Message>, ThreadError> {
        self.record("list_messages", format!("{conversation_id} {page}"))?;
        let newest_first: Vec<Message> = self.messages.borrow().iter().rev().cloned().collect();
        let start = (page.saturating_sub(1) as usize) * self.page_size;
        let results: Vec<Message> = newest_first.iter().skip(start).take(self.page_size).cloned().collect();
        let next = (start + self.page_size < newest_first.len())
            .then(|| format!("http://fake/conversations/{conversation_id}/messages?page={}", page + 1));
        Ok(Page { results, next })
    }

    async fn mark_read(&self, conversation_id: ConversationId) -> Result<(), ThreadError> {
        self.record("mark_read", conversation_id.to_string())
    }

    async fn leave_conversation(&self, conversation_id: ConversationId) -> Result<(), ThreadError> {
        self.record("leave_conversation", conversation_id.to_string())?;
        self.conversations.borrow_mut().retain(|c| c.id != conversation_id);
        Ok(())
    }

    async fn send_message(&self, message: &NewMessage) -> Result<Message, ThreadError> {
        self.record("send_message", message.conversation_id.to_string())?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let mut sent = sample_message(id, Some(self.me), "");
        sent.conversation_id = message.conversation_id;
        sent.content = message.content.clone();
        sent.kind = message.kind();
        sent.attachment = message
            .attachment
            .as_ref()
            .map(|a| format!("https://cdn.test/{}", a.file_name));
        sent.reply_to = message.reply_to;
        self.messages.borrow_mut().push(sent.clone());
        Ok(sent)
    }

    async fn edit_message(&self, id: MessageId, content: &str) -> Result<Message, ThreadError> {
        self.record("edit_message", id.to_string())?;
        let mut messages = self.messages.borrow_mut();
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| ThreadError::NotFound { resource: format!("message {id}") })?;
        message.content = Some(content.to_string());
        message.edited = true;
        Ok(message.clone())
    }

    async fn delete_message(&self, id: MessageId) -> Result<(), ThreadError> {
        self.record("delete_message", id.to_string())?;
        self.messages.borrow_mut().retain(|m| m.id != id);
        Ok(())
    }
}
