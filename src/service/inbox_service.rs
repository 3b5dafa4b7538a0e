use tracing::{error, info};

use crate::api::MessagingApi;
use crate::errors::ThreadError;
use crate::models::{Conversation, ConversationId, CurrentUser, LastMessage, Message};

/// Conversation list of the signed-in member.
pub struct InboxController<A> {
    api: A,
    me: CurrentUser,
    conversations: Vec<Conversation>,
    error: Option<ThreadError>,
}

impl<A: MessagingApi> InboxController<A> {
    pub fn new(api: A, me: CurrentUser) -> Self {
        Self { api, me, conversations: Vec::new(), error: None }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn me(&self) -> &CurrentUser {
        &self.me
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn error(&self) -> Option<&ThreadError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn total_unread(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }

    pub async fn refresh(&mut self) -> bool {
        match self.api.list_conversations().await {
            Ok(page) => {
                self.conversations = page.results;
                self.error = None;
                true
            }
            Err(e) => {
                error!("Failed to fetch conversations: {e}");
                self.error = Some(e);
                false
            }
        }
    }

    pub async fn mark_read(&mut self, id: ConversationId) -> bool {
        match self.api.mark_read(id).await {
            Ok(()) => {
                if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) {
                    conversation.unread_count = 0;
                }
                true
            }
            Err(e) => {
                error!("Failed to mark conversation {id} as read: {e}");
                self.error = Some(e);
                false
            }
        }
    }

    /// Leaves the conversation on the server and drops it from the list.
    pub async fn leave(&mut self, id: ConversationId) -> bool {
        match self.api.leave_conversation(id).await {
            Ok(()) => {
                info!("Left conversation {id}");
                self.conversations.retain(|c| c.id != id);
                true
            }
            Err(e) => {
                error!("Failed to leave conversation {id}: {e}");
                self.error = Some(e);
                false
            }
        }
    }

    /// Updates the summary of the message's conversation and moves it to
    /// the top of the list.
    pub fn record_sent(&mut self, message: &Message) {
        record_sent(&mut self.conversations, message);
    }
}

/// Sets `message` as the last message of its conversation and moves that
/// conversation to the front of `conversations`.
pub fn record_sent(conversations: &mut Vec<Conversation>, message: &Message) {
    let Some(index) = conversations
        .iter()
        .position(|c| c.id == message.conversation_id)
    else {
        return;
    };
    let mut conversation = conversations.remove(index);
    conversation.last_message = Some(LastMessage::from(message));
    conversations.insert(0, conversation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{sample_conversation, sample_message, FakeApi};
    use crate::models::MemberId;

    const ME: MemberId = MemberId(1);

    fn me() -> CurrentUser {
        CurrentUser { id: ME, name: "Amina".to_string(), avatar: None }
    }

    fn inbox() -> InboxController<FakeApi> {
        let api = FakeApi::new(ME);
        api.seed_conversations(vec![
            sample_conversation(10, ME, MemberId(2), 2),
            sample_conversation(11, ME, MemberId(3), 0),
            sample_conversation(12, ME, MemberId(4), 5),
        ]);
        InboxController::new(api, me())
    }

    fn ids(inbox: &InboxController<FakeApi>) -> Vec<u64> {
        inbox.conversations().iter().map(|c| c.id.0).collect()
    }

    #[tokio::test]
    async fn refresh_and_unread_total() {
        let mut inbox = inbox();
        assert!(inbox.refresh().await);
        assert_eq!(ids(&inbox), vec![10, 11, 12]);
        assert_eq!(inbox.total_unread(), 7);

        assert!(inbox.mark_read(ConversationId(12)).await);
        assert_eq!(inbox.total_unread(), 2);
    }

    #[tokio::test]
    async fn refresh_failure_keeps_list() {
        let mut inbox = inbox();
        inbox.refresh().await;
        inbox.api().fail_next("list_conversations", ThreadError::Unauthorized);

        assert!(!inbox.refresh().await);
        assert_eq!(ids(&inbox), vec![10, 11, 12]);
        assert_eq!(inbox.error(), Some(&ThreadError::Unauthorized));
    }

    #[tokio::test]
    async fn leave_drops_conversation() {
        let mut inbox = inbox();
        inbox.refresh().await;
        assert!(inbox.leave(ConversationId(11)).await);
        assert_eq!(ids(&inbox), vec![10, 12]);

        inbox.refresh().await;
        assert_eq!(ids(&inbox), vec![10, 12]);
    }

    #[tokio::test]
    async fn record_sent_moves_conversation_to_top() {
        let mut inbox = inbox();
        inbox.refresh().await;

        let mut message = sample_message(50, Some(ME), "Agenda attached");
        message.conversation_id = ConversationId(12);
        inbox.record_sent(&message);

        assert_eq!(ids(&inbox), vec![12, 10, 11]);
        let last = inbox.conversations()[0].last_message.as_ref().unwrap();
        assert_eq!(last.content.as_deref(), Some("Agenda attached"));
        assert_eq!(last.sender_name, "Member 1");
    }
}
