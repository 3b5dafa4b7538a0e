use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::api::MessagingApi;
use crate::config::Config;
use crate::errors::ThreadError;
use crate::models::{
    Conversation, ConversationId, CurrentUser, EditMessageRequest, MemberId, Message, MessageId,
    NewMessage, NewMessageBody, Page, StartConversationRequest,
};

/// [`MessagingApi`] over HTTP with `reqwest`.
#[derive(Clone)]
pub struct HttpMessagingApi {
    http: Client,
    base_url: String,
}

impl HttpMessagingApi {
    pub fn new(config: &Config) -> Result<Self, ThreadError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let value = HeaderValue::from_str(&format!("{} {token}", config.auth_scheme))
                .map_err(|e| ThreadError::Unexpected(format!("Invalid API token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ThreadError::Unexpected(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response, ThreadError> {
        let resp = request.send().await.map_err(|e| {
            error!("Request for {resource} failed: {e}");
            ThreadError::network(e.to_string())
        })?;

        let status = resp.status();
        debug!("{resource} -> {status}");
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(ThreadError::from_status(status.as_u16(), resource, &body))
    }

    async fn json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, ThreadError> {
        self.send(request, resource)
            .await?
            .json::<T>()
            .await
            .map_err(|e| {
                error!("Failed to decode {resource}: {e}");
                ThreadError::decode(e.to_string())
            })
    }
}

fn multipart_form(message: &NewMessage) -> Result<Form, ThreadError> {
    let mut form = Form::new()
        .text("conversation", message.conversation_id.to_string())
        .text("message_type", message.kind().as_str());

    if let Some(content) = &message.content {
        form = form.text("content", content.clone());
    }
    if let Some(reply_to) = message.reply_to {
        form = form.text("reply_to", reply_to.to_string());
    }
    if let Some(attachment) = &message.attachment {
        let part = Part::bytes(attachment.bytes.clone())
            .file_name(attachment.file_name.clone())
            .mime_str(&attachment.content_type)
            .map_err(|e| ThreadError::Unexpected(format!("Invalid content type: {e}")))?;
        form = form.part("attachment", part);
    }
    Ok(form)
}

#[async_trait(?Send)]
impl MessagingApi for HttpMessagingApi {
    async fn current_user(&self) -> Result<CurrentUser, ThreadError> {
        self.json(self.http.get(self.url("/auth/me")), "current user").await
    }

    async fn list_conversations(&self) -> Result<Page<Conversation>, ThreadError> {
        self.json(self.http.get(self.url("/conversations")), "conversations")
            .await
    }

    async fn start_conversation(&self, member_id: MemberId) -> Result<Conversation, ThreadError> {
        let request = self
            .http
            .post(self.url("/conversations/start"))
            .json(&StartConversationRequest { member_id });
        self.json(request, &format!("member {member_id}")).await
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
        page: u32,
    ) -> Result<Page<Message>, ThreadError> {
        let request = self
            .http
            .get(self.url(&format!("/conversations/{conversation_id}/messages")))
            .query(&[("page", page)]);
        self.json(request, &format!("conversation {conversation_id}")).await
    }

    async fn mark_read(&self, conversation_id: ConversationId) -> Result<(), ThreadError> {
        let request = self
            .http
            .post(self.url(&format!("/conversations/{conversation_id}/read")));
        self.send(request, &format!("conversation {conversation_id}")).await?;
        Ok(())
    }

    async fn leave_conversation(&self, conversation_id: ConversationId) -> Result<(), ThreadError> {
        let request = self
            .http
            .post(self.url(&format!("/conversations/{conversation_id}/leave")));
        self.send(request, &format!("conversation {conversation_id}")).await?;
        Ok(())
    }

    async fn send_message(&self, message: &NewMessage) -> Result<Message, ThreadError> {
        let request = self.http.post(self.url("/messages"));
        let request = if message.attachment.is_some() {
            request.multipart(multipart_form(message)?)
        } else {
            request.json(&NewMessageBody::from(message))
        };
        self.json(request, "messages").await
    }

    async fn edit_message(&self, id: MessageId, content: &str) -> Result<Message, ThreadError> {
        let request = self
            .http
            .patch(self.url(&format!("/messages/{id}")))
            .json(&EditMessageRequest { content: content.to_string() });
        self.json(request, &format!("message {id}")).await
    }

    async fn delete_message(&self, id: MessageId) -> Result<(), ThreadError> {
        let request = self.http.delete(self.url(&format!("/messages/{id}")));
        self.send(request, &format!("message {id}")).await?;
        Ok(())
    }
}
