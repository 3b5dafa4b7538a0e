use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsValue;
use web_sys::{Blob, BlobPropertyBag, FormData, RequestCredentials};

use member_messaging::MessagingApi;
use member_messaging::errors::ThreadError;
use member_messaging::models::{
    Conversation, ConversationId, CurrentUser, EditMessageRequest, MemberId, Message, MessageId,
    NewMessage, NewMessageBody, Page, StartConversationRequest,
};

/// Base URL of the association's REST API.
const API_BASE: &str = "http://localhost:8000/api";

/// [`MessagingApi`] over the browser fetch API. Authentication rides on the
/// session cookie, so every request includes credentials.
#[derive(Clone, Copy, Default)]
pub struct GlooMessagingApi;

fn url(path: &str) -> String {
    format!("{API_BASE}{path}")
}

fn with_session(builder: RequestBuilder) -> RequestBuilder {
    builder.credentials(RequestCredentials::Include)
}

async fn check(resp: Response, resource: &str) -> Result<Response, ThreadError> {
    if resp.ok() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ThreadError::from_status(resp.status(), resource, &body))
}

async fn send(request: Request, resource: &str) -> Result<Response, ThreadError> {
    let resp = request
        .send()
        .await
        .map_err(|e| ThreadError::network(e.to_string()))?;
    check(resp, resource).await
}

async fn fetch(builder: RequestBuilder, resource: &str) -> Result<Response, ThreadError> {
    let resp = builder
        .send()
        .await
        .map_err(|e| ThreadError::network(e.to_string()))?;
    check(resp, resource).await
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ThreadError> {
    resp.json::<T>()
        .await
        .map_err(|e| ThreadError::decode(e.to_string()))
}

fn js_error(e: JsValue) -> ThreadError {
    ThreadError::Unexpected(format!("{e:?}"))
}

/// Multipart body for a message carrying an attachment.
fn form_data(message: &NewMessage) -> Result<FormData, ThreadError> {
    let form = FormData::new().map_err(js_error)?;
    form.append_with_str("conversation", &message.conversation_id.to_string())
        .map_err(js_error)?;
    form.append_with_str("message_type", message.kind().as_str())
        .map_err(js_error)?;
    if let Some(content) = &message.content {
        form.append_with_str("content", content).map_err(js_error)?;
    }
    if let Some(reply_to) = message.reply_to {
        form.append_with_str("reply_to", &reply_to.to_string())
            .map_err(js_error)?;
    }
    if let Some(attachment) = &message.attachment {
        let bytes = js_sys::Uint8Array::from(attachment.bytes.as_slice());
        let parts = js_sys::Array::of1(&bytes);
        let options = BlobPropertyBag::new();
        options.set_type(&attachment.content_type);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(js_error)?;
        form.append_with_blob_and_filename("attachment", &blob, &attachment.file_name)
            .map_err(js_error)?;
    }
    Ok(form)
}

#[async_trait(?Send)]
impl MessagingApi for GlooMessagingApi {
    async fn current_user(&self) -> Result<CurrentUser, ThreadError> {
        let resp = fetch(with_session(Request::get(&url("/auth/me"))), "current user").await?;
        decode(resp).await
    }

    async fn list_conversations(&self) -> Result<Page<Conversation>, ThreadError> {
        let resp = fetch(with_session(Request::get(&url("/conversations"))), "conversations").await?;
        decode(resp).await
    }

    async fn start_conversation(&self, member_id: MemberId) -> Result<Conversation, ThreadError> {
        let request = with_session(Request::post(&url("/conversations/start")))
            .json(&StartConversationRequest { member_id })
            .map_err(|e| ThreadError::Unexpected(format!("Serialize error: {e}")))?;
        decode(send(request, &format!("member {member_id}")).await?).await
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
        page: u32,
    ) -> Result<Page<Message>, ThreadError> {
        let page = page.to_string();
        let builder = with_session(Request::get(&url(&format!(
            "/conversations/{conversation_id}/messages"
        ))))
        .query([("page", page.as_str())]);
        decode(fetch(builder, &format!("conversation {conversation_id}")).await?).await
    }

    async fn mark_read(&self, conversation_id: ConversationId) -> Result<(), ThreadError> {
        let builder = with_session(Request::post(&url(&format!(
            "/conversations/{conversation_id}/read"
        ))));
        fetch(builder, &format!("conversation {conversation_id}")).await?;
        Ok(())
    }

    async fn leave_conversation(&self, conversation_id: ConversationId) -> Result<(), ThreadError> {
        let builder = with_session(Request::post(&url(&format!(
            "/conversations/{conversation_id}/leave"
        ))));
        fetch(builder, &format!("conversation {conversation_id}")).await?;
        Ok(())
    }

    async fn send_message(&self, message: &NewMessage) -> Result<Message, ThreadError> {
        let builder = with_session(Request::post(&url("/messages")));
        let request = if message.attachment.is_some() {
            builder.body(form_data(message)?)
        } else {
            builder.json(&NewMessageBody::from(message))
        }
        .map_err(|e| ThreadError::Unexpected(format!("Failed to build request: {e}")))?;
        decode(send(request, "messages").await?).await
    }

    async fn edit_message(&self, id: MessageId, content: &str) -> Result<Message, ThreadError> {
        let request = with_session(Request::patch(&url(&format!("/messages/{id}"))))
            .json(&EditMessageRequest { content: content.to_string() })
            .map_err(|e| ThreadError::Unexpected(format!("Serialize error: {e}")))?;
        decode(send(request, &format!("message {id}")).await?).await
    }

    async fn delete_message(&self, id: MessageId) -> Result<(), ThreadError> {
        let builder = with_session(Request::delete(&url(&format!("/messages/{id}"))));
        fetch(builder, &format!("message {id}")).await?;
        Ok(())
    }
}

/// Reads a file picked in an `<input type="file">` into memory.
pub async fn read_file(file: &web_sys::File) -> Result<Vec<u8>, ThreadError> {
    let buffer = wasm_bindgen_futures::JsFuture::from(file.array_buffer())
        .await
        .map_err(js_error)?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}
