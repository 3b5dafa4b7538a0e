use leptos::prelude::*;

use member_messaging::models::{Conversation, ConversationId, MemberId};

use crate::state::AppState;

#[derive(Clone, PartialEq)]
struct InboxRow {
    id: ConversationId,
    title: String,
    preview: String,
    unread: u32,
    conversation: Conversation,
}

fn inbox_row(conversation: &Conversation, me: MemberId) -> InboxRow {
    InboxRow {
        id: conversation.id,
        title: conversation.title_for(me),
        preview: conversation
            .last_message
            .as_ref()
            .map(|last| match last.content.as_deref() {
                Some(text) if !text.trim().is_empty() => format!("{}: {}", last.sender_name, text.trim()),
                _ => format!("{}: [{}]", last.sender_name, last.kind),
            })
            .unwrap_or_default(),
        unread: conversation.unread_count,
        conversation: conversation.clone(),
    }
}

/// Sidebar listing the member's conversations with unread badges.
#[component]
pub fn Inbox() -> impl IntoView {
    let state = expect_context::<AppState>();

    let rows = move || {
        let Some(me) = state.me.with(|me| me.as_ref().map(|me| me.id)) else {
            return Vec::new();
        };
        state
            .conversations
            .with(|list| list.iter().map(|c| inbox_row(c, me)).collect::<Vec<_>>())
    };
    let total_unread = move || state.conversations.with(|list| list.iter().map(|c| c.unread_count).sum::<u32>());
    let active = move || state.thread.with(|t| t.as_ref().and_then(|t| t.conversation()).map(|c| c.id));

    view! {
        <aside class="sidebar">
            <div class="sidebar-header">
                <h2>"Messages"</h2>
                <Show when=move || { total_unread() > 0 }>
                    <span class="badge total">{total_unread}</span>
                </Show>
                <button class="refresh-btn" on:click=move |_| state.load_conversations()>"↻"</button>
            </div>
            {move || state.inbox_error.get().map(|e| view! { <div class="inbox-error">{e}</div> })}
            <div class="conversation-list">
                {move || {
                    if state.conversations.with(Vec::is_empty) {
                        view! {
                            <div class="empty-list">"No conversations yet"</div>
                        }.into_any()
                    } else {
                        view! {
                            <For
                                each=rows
                                key=|row| (row.id, row.unread, row.preview.clone())
                                let:row
                            >
                                {
                                    let id = row.id;
                                    let conversation = row.conversation.clone();
                                    view! {
                                        <div
                                            class="conversation-item"
                                            class:active=move || active() == Some(id)
                                            on:click=move |_| state.open_conversation(conversation.clone())
                                        >
                                            <div class="conversation-title">
                                                {row.title.clone()}
                                                {(row.unread > 0).then(|| view! { <span class="badge">{row.unread}</span> })}
                                            </div>
                                            <div class="conversation-preview">{row.preview.clone()}</div>
                                            <button
                                                class="leave-btn"
                                                on:click=move |ev| {
                                                    ev.stop_propagation();
                                                    state.leave(id);
                                                }
                                            >
                                                "Leave"
                                            </button>
                                        </div>
                                    }
                                }
                            </For>
                        }.into_any()
                    }
                }}
            </div>
        </aside>
    }
}
