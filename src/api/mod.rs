//! The REST backend as seen by the messaging client.

#[cfg(feature = "http-client")]
pub mod http_client;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;

use crate::errors::ThreadError;
use crate::models::{
    Conversation, ConversationId, CurrentUser, MemberId, Message, MessageId, NewMessage, Page,
};

/// Messaging endpoints of the association backend.
///
/// Futures are not required to be `Send` so the same trait can be implemented
/// over the browser's fetch API.
#[async_trait(?Send)]
pub trait MessagingApi {
    /// `GET /auth/me`
    async fn current_user(&self) -> Result<CurrentUser, ThreadError>;

    /// `GET /conversations`
    async fn list_conversations(&self) -> Result<Page<Conversation>, ThreadError>;

    /// `POST /conversations/start`: returns the existing direct conversation
    /// with `member_id` or creates it.
    async fn start_conversation(&self, member_id: MemberId) -> Result<Conversation, ThreadError>;

    /// `GET /conversations/{id}/messages?page={page}`, newest first.
    async fn list_messages(
        &self,
        conversation_id: ConversationId,
        page: u32,
    ) -> Result<Page<Message>, ThreadError>;

    /// `POST /conversations/{id}/read`
    async fn mark_read(&self, conversation_id: ConversationId) -> Result<(), ThreadError>;

    /// `POST /conversations/{id}/leave`
    async fn leave_conversation(&self, conversation_id: ConversationId) -> Result<(), ThreadError>;

    /// `POST /messages`
    async fn send_message(&self, message: &NewMessage) -> Result<Message, ThreadError>;

    /// `PATCH /messages/{id}`
    async fn edit_message(&self, id: MessageId, content: &str) -> Result<Message, ThreadError>;

    /// `DELETE /messages/{id}`
    async fn delete_message(&self, id: MessageId) -> Result<(), ThreadError>;
}
