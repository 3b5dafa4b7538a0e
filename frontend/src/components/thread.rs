use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

use member_messaging::models::{AttachmentKind, MessageId, MessageKind};
use member_messaging::thread::{ReplyPreview, ThreadState, ThreadStatus};

use crate::state::AppState;

const EMOJIS: [&str; 12] = ["😀", "😂", "😊", "😍", "👍", "👏", "🙏", "🎉", "❤️", "🩺", "💉", "📅"];

/// Flattened message for rendering, computed from [`ThreadState`].
#[derive(Clone, PartialEq)]
struct MessageRow {
    id: MessageId,
    own: bool,
    sender_name: String,
    text: Option<String>,
    kind: MessageKind,
    attachment: Option<String>,
    edited: bool,
    time: String,
    quote: Option<(String, String)>,
}

fn quote_text(preview: ReplyPreview) -> (String, String) {
    match preview {
        ReplyPreview::Available { sender_name, excerpt, .. } => (sender_name, excerpt),
        ReplyPreview::Unavailable { .. } => (String::new(), "Original message unavailable".to_string()),
    }
}

fn rows(thread: &ThreadState) -> Vec<MessageRow> {
    thread
        .messages()
        .iter()
        .map(|m| MessageRow {
            id: m.id,
            own: thread.is_own_message(m),
            sender_name: thread.sender_name(m),
            text: m.text().map(str::to_string),
            kind: m.kind,
            attachment: m.attachment.clone(),
            edited: m.edited,
            time: m.created_at.format("%d %b %H:%M").to_string(),
            quote: thread.reply_preview(m).map(quote_text),
        })
        .collect()
}

/// Conversation thread: banner, messages and compose area.
#[component]
pub fn ThreadView() -> impl IntoView {
    let state = expect_context::<AppState>();
    let status = move || state.thread.with(|t| t.as_ref().map(ThreadState::status));

    view! {
        <main class="thread">
            <ErrorBanner />
            {move || match status() {
                None => view! { <div class="empty-state">"Loading your messages…"</div> }.into_any(),
                Some(ThreadStatus::SelfConversation) => view! {
                    <div class="self-block">
                        <h3>"This is you"</h3>
                        <p>"You cannot send messages to yourself. Choose another member to start a conversation."</p>
                    </div>
                }.into_any(),
                Some(ThreadStatus::Idle) => view! {
                    <div class="empty-state">
                        {move || if state.is_loading.get() { "Opening conversation…" } else { "Select a conversation" }}
                    </div>
                }.into_any(),
                Some(ThreadStatus::Ready) => view! {
                    <ThreadHeader />
                    <MessageList />
                    <ComposeArea />
                }.into_any(),
            }}
        </main>
    }
}

#[component]
fn ErrorBanner() -> impl IntoView {
    let state = expect_context::<AppState>();
    let banner = move || state.thread.with(|t| t.as_ref().and_then(|t| t.error().map(|b| (b.text(), b.hint()))));

    view! {
        {move || banner().map(|(text, hint)| view! {
            <div class="error-banner" role="alert">
                <span>{text}</span>
                {hint.map(|hint| view! { <span class="hint">" " {hint}</span> })}
                <button class="dismiss" on:click=move |_| state.update_thread(ThreadState::dismiss_error)>
                    "×"
                </button>
            </div>
        })}
    }
}

#[component]
fn ThreadHeader() -> impl IntoView {
    let state = expect_context::<AppState>();
    let title = move || state.thread.with(|t| t.as_ref().map(ThreadState::title).unwrap_or_default());
    let has_older = move || state.thread.with(|t| t.as_ref().is_some_and(ThreadState::has_older));

    view! {
        <div class="thread-header">
            <h2>{title}</h2>
            <Show when=has_older>
                <button
                    class="older-btn"
                    disabled=move || state.is_loading.get()
                    on:click=move |_| state.load_older()
                >
                    "Load older messages"
                </button>
            </Show>
        </div>
    }
}

#[component]
fn MessageList() -> impl IntoView {
    let state = expect_context::<AppState>();
    let messages = move || state.thread.with(|t| t.as_ref().map(rows).unwrap_or_default());

    view! {
        <div class="messages-container">
            <For
                each=messages
                key=|row| (row.id, row.edited, row.text.clone())
                let:row
            >
                <MessageBubble row=row />
            </For>
        </div>
    }
}

/// A single message; ours on the right, everyone else's on the left.
#[component]
fn MessageBubble(row: MessageRow) -> impl IntoView {
    let state = expect_context::<AppState>();
    let id = row.id;
    let css_class = if row.own { "message own" } else { "message other" };
    let own = row.own;

    let attachment = row.attachment.clone().map(|url| match row.kind {
        MessageKind::Image => view! { <img class="attachment-image" src=url.clone() alt="Image attachment" /> }.into_any(),
        _ => view! { <a class="attachment-file" href=url.clone() target="_blank">"Download attachment"</a> }.into_any(),
    });
    let body_class = if row.kind == MessageKind::Emoji { "body emoji" } else { "body" };

    view! {
        <div class=css_class>
            <div class="meta">
                <span class="sender">{if own { "You".to_string() } else { row.sender_name.clone() }}</span>
                <span class="time">{row.time.clone()}</span>
            </div>
            {row.quote.clone().map(|(sender, excerpt)| view! {
                <blockquote class="reply-quote">
                    <strong>{sender}</strong>
                    " "
                    {excerpt}
                </blockquote>
            })}
            {row.text.clone().map(|text| view! { <div class=body_class>{text}</div> })}
            {attachment}
            {row.edited.then(|| view! { <span class="edited">"(edited)"</span> })}
            <div class="actions">
                <button on:click=move |_| state.reply_to(id)>"Reply"</button>
                <Show when=move || own>
                    <button on:click=move |_| state.start_edit(id)>"Edit"</button>
                    <button on:click=move |_| state.delete(id)>"Delete"</button>
                </Show>
            </div>
        </div>
    }
}

/// Input area: reply/edit banner, attachment chip, emoji picker and send.
#[component]
fn ComposeArea() -> impl IntoView {
    let state = expect_context::<AppState>();

    let draft = move || state.thread.with(|t| t.as_ref().map(|t| t.compose().draft().to_string()).unwrap_or_default());
    let editing = move || state.thread.with(|t| t.as_ref().and_then(|t| t.compose().edit_target()).is_some());
    let reply = move || state.thread.with(|t| t.as_ref().and_then(ThreadState::reply_target_preview).map(quote_text));
    let attachment = move || {
        state.thread.with(|t| {
            t.as_ref()
                .and_then(|t| t.compose().attachment().map(|a| (a.kind, a.file_name.clone())))
        })
    };
    let picker_open = move || state.thread.with(|t| t.as_ref().is_some_and(|t| t.compose().emoji_picker_open()));
    let can_send = move || {
        !state.is_sending.get()
            && state.thread.with(|t| t.as_ref().is_some_and(|t| t.compose().has_payload()))
    };

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            state.submit();
        }
    };

    let pick = move |ev: ev::Event, kind: AttachmentKind| {
        let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        else {
            return;
        };
        if let Some(file) = input.files().and_then(|files| files.get(0)) {
            state.attach(file, kind);
        }
        input.set_value("");
    };

    view! {
        <div class="input-area">
            {move || reply().map(|(sender, excerpt)| view! {
                <div class="compose-target">
                    <span>"Replying to " <strong>{sender}</strong> ": " {excerpt}</span>
                    <button on:click=move |_| state.update_thread(ThreadState::cancel_target)>"×"</button>
                </div>
            })}
            <Show when=editing>
                <div class="compose-target">
                    <span>"Editing message"</span>
                    <button on:click=move |_| state.update_thread(ThreadState::cancel_target)>"×"</button>
                </div>
            </Show>
            {move || attachment().map(|(kind, name)| view! {
                <div class="attachment-chip">
                    <span>{if kind == AttachmentKind::Image { "🖼 " } else { "📎 " }} {name}</span>
                    <button on:click=move |_| state.update_thread(|t| {
                        t.compose_mut().clear_attachment();
                    })>"×"</button>
                </div>
            })}
            <Show when=picker_open>
                <div class="emoji-picker">
                    {EMOJIS.iter().map(|emoji| {
                        let emoji = *emoji;
                        view! {
                            <button on:click=move |_| state.update_thread(|t| t.compose_mut().insert_emoji(emoji))>
                                {emoji}
                            </button>
                        }
                    }).collect_view()}
                </div>
            </Show>
            <div class="input-row">
                <button class="icon-btn" on:click=move |_| state.update_thread(|t| t.compose_mut().toggle_emoji_picker())>
                    "😊"
                </button>
                <Show when=move || !editing()>
                    <label class="icon-btn">
                        "📎"
                        <input type="file" hidden on:change=move |ev| pick(ev, AttachmentKind::File) />
                    </label>
                    <label class="icon-btn">
                        "🖼"
                        <input type="file" accept="image/*" hidden on:change=move |ev| pick(ev, AttachmentKind::Image) />
                    </label>
                </Show>
                <textarea
                    rows="1"
                    placeholder="Write a message… (Enter to send, Shift+Enter for newline)"
                    prop:value=draft
                    on:input=move |ev| {
                        let text = event_target_value(&ev);
                        state.update_thread(|t| t.compose_mut().set_draft(text));
                    }
                    on:keydown=on_keydown
                />
                <button
                    class="send-btn"
                    on:click=move |_| state.submit()
                    disabled=move || !can_send()
                >
                    {move || match (state.is_sending.get(), editing()) {
                        (true, _) => "Sending…",
                        (false, true) => "Save",
                        (false, false) => "Send",
                    }}
                </button>
            </div>
        </div>
    }
}
