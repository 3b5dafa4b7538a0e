use leptos::prelude::*;
use leptos::task::spawn_local;

use member_messaging::models::{
    Attachment, AttachmentKind, Conversation, ConversationId, CurrentUser, MemberId, MessageId,
};
use member_messaging::MessagingApi;
use member_messaging::service::inbox_service::record_sent;
use member_messaging::thread::{OpenTarget, ThreadOp, ThreadState};

use crate::api::GlooMessagingApi;

/// Shared application state, provided via Leptos context.
#[derive(Clone, Copy)]
pub struct AppState {
    // --- Read signals (for components to subscribe to) ---
    pub me: ReadSignal<Option<CurrentUser>>,
    pub conversations: ReadSignal<Vec<Conversation>>,
    pub inbox_error: ReadSignal<Option<String>>,
    pub thread: ReadSignal<Option<ThreadState>>,
    pub is_loading: ReadSignal<bool>,
    pub is_sending: ReadSignal<bool>,

    // --- Write signals (for mutating state) ---
    pub set_me: WriteSignal<Option<CurrentUser>>,
    pub set_conversations: WriteSignal<Vec<Conversation>>,
    pub set_inbox_error: WriteSignal<Option<String>>,
    pub set_thread: WriteSignal<Option<ThreadState>>,
    pub set_is_loading: WriteSignal<bool>,
    pub set_is_sending: WriteSignal<bool>,
}

impl AppState {
    /// Create a new `AppState` and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let (me, set_me) = signal(None::<CurrentUser>);
        let (conversations, set_conversations) = signal(Vec::<Conversation>::new());
        let (inbox_error, set_inbox_error) = signal(None::<String>);
        let (thread, set_thread) = signal(None::<ThreadState>);
        let (is_loading, set_is_loading) = signal(false);
        let (is_sending, set_is_sending) = signal(false);

        let state = Self {
            me,
            conversations,
            inbox_error,
            thread,
            is_loading,
            is_sending,
            set_me,
            set_conversations,
            set_inbox_error,
            set_thread,
            set_is_loading,
            set_is_sending,
        };

        provide_context(state);
        state
    }

    /// Applies `f` to the open thread, if any.
    pub fn update_thread(&self, f: impl FnOnce(&mut ThreadState)) {
        self.set_thread.update(|thread| {
            if let Some(thread) = thread.as_mut() {
                f(thread);
            }
        });
    }

    /// Load the signed-in member, then the inbox, and open `member` if given.
    pub fn load(&self, member: Option<MemberId>) {
        let state = *self;
        spawn_local(async move {
            match GlooMessagingApi.current_user().await {
                Ok(me) => {
                    state.set_thread.set(Some(ThreadState::new(me.clone())));
                    state.set_me.set(Some(me));
                }
                Err(e) => {
                    log::error!("Failed to load the signed-in member: {e}");
                    state.set_inbox_error.set(Some(e.to_string()));
                    return;
                }
            }
            state.load_conversations();
            if let Some(member) = member {
                state.open_thread(member);
            }
        });
    }

    /// Load conversations from the backend.
    pub fn load_conversations(&self) {
        let state = *self;
        spawn_local(async move {
            match GlooMessagingApi.list_conversations().await {
                Ok(page) => {
                    state.set_inbox_error.set(None);
                    state.set_conversations.set(page.results);
                }
                Err(e) => {
                    log::error!("Failed to fetch conversations: {e}");
                    state.set_inbox_error.set(Some(e.to_string()));
                }
            }
        });
    }

    /// Open (or create) the conversation with `member` and load its messages.
    pub fn open_thread(&self, member: MemberId) {
        let mut should_fetch = false;
        self.update_thread(|t| should_fetch = t.begin_open(member));
        if !should_fetch {
            return;
        }

        let state = *self;
        let target = OpenTarget::Member(member);
        state.set_is_loading.set(true);
        spawn_local(async move {
            match GlooMessagingApi.start_conversation(member).await {
                Ok(conversation) => state.load_first_page(target, conversation).await,
                Err(e) => state.update_thread(|t| t.fail_open(target, e)),
            }
            state.set_is_loading.set(false);
        });
    }

    /// Open a conversation picked in the inbox, group or direct.
    pub fn open_conversation(&self, conversation: Conversation) {
        let target = OpenTarget::Conversation(conversation.id);
        self.update_thread(|t| t.begin_open_conversation(conversation.id));

        let state = *self;
        state.set_is_loading.set(true);
        spawn_local(async move {
            state.load_first_page(target, conversation).await;
            state.set_is_loading.set(false);
        });
    }

    async fn load_first_page(self, target: OpenTarget, conversation: Conversation) {
        let api = GlooMessagingApi;
        let id = conversation.id;
        let page = match api.list_messages(id, 1).await {
            Ok(page) => page,
            Err(e) => {
                self.update_thread(|t| t.fail_open(target, e));
                return;
            }
        };

        let mut opened = false;
        self.update_thread(|t| opened = t.complete_open(target, conversation, page));
        if !opened {
            return;
        }
        match api.mark_read(id).await {
            Ok(()) => {
                self.update_thread(|t| t.mark_read(id));
                self.set_conversations.update(|list| {
                    if let Some(c) = list.iter_mut().find(|c| c.id == id) {
                        c.unread_count = 0;
                    }
                });
            }
            Err(e) => log::warn!("Failed to mark conversation {id} as read: {e}"),
        }
    }

    pub fn load_older(&self) {
        let Some((conversation, page)) = self.thread.with_untracked(|t| {
            let t = t.as_ref()?;
            Some((t.conversation_id()?, t.next_page()?))
        }) else {
            return;
        };

        let state = *self;
        state.set_is_loading.set(true);
        spawn_local(async move {
            match GlooMessagingApi.list_messages(conversation, page).await {
                Ok(older) => state.update_thread(|t| {
                    t.complete_load_older(conversation, older);
                }),
                Err(e) => state.update_thread(|t| t.fail_in(conversation, ThreadOp::LoadOlder, e)),
            }
            state.set_is_loading.set(false);
        });
    }

    /// Send the compose area, or save the edit in progress.
    pub fn submit(&self) {
        let edit = self.thread.with_untracked(|t| {
            t.as_ref()
                .and_then(|t| t.compose().edit_target().map(|id| (id, t.compose().draft().to_string())))
        });
        match edit {
            Some((id, content)) => self.edit(id, content),
            None => self.send(),
        }
    }

    pub fn send(&self) {
        let Some(prepared) = self.thread.with_untracked(|t| t.as_ref().map(ThreadState::prepare_send))
        else {
            return;
        };
        let request = match prepared {
            Ok(Some(request)) => request,
            Ok(None) => return,
            Err(e) => {
                self.update_thread(|t| t.fail(ThreadOp::Send, e));
                return;
            }
        };

        let state = *self;
        let conversation = request.conversation_id;
        state.set_is_sending.set(true);
        spawn_local(async move {
            match GlooMessagingApi.send_message(&request).await {
                Ok(message) => {
                    state.set_conversations.update(|list| record_sent(list, &message));
                    state.update_thread(|t| {
                        t.complete_send(conversation, message);
                    });
                }
                Err(e) => state.update_thread(|t| t.fail_in(conversation, ThreadOp::Send, e)),
            }
            state.set_is_sending.set(false);
        });
    }

    pub fn edit(&self, id: MessageId, content: String) {
        let Some(prepared) = self.thread.with_untracked(|t| {
            t.as_ref().map(|t| {
                t.prepare_edit(id, &content)
                    .map(|content| (t.conversation_id(), content))
            })
        }) else {
            return;
        };
        let (conversation, content) = match prepared {
            Ok((Some(conversation), content)) => (conversation, content),
            Ok((None, _)) => return,
            Err(e) => {
                self.update_thread(|t| t.fail(ThreadOp::Edit, e));
                return;
            }
        };

        let state = *self;
        state.set_is_sending.set(true);
        spawn_local(async move {
            match GlooMessagingApi.edit_message(id, &content).await {
                Ok(updated) => state.update_thread(|t| {
                    t.complete_edit(conversation, updated);
                }),
                Err(e) => state.update_thread(|t| t.fail_in(conversation, ThreadOp::Edit, e)),
            }
            state.set_is_sending.set(false);
        });
    }

    pub fn delete(&self, id: MessageId) {
        let Some(prepared) = self.thread.with_untracked(|t| {
            t.as_ref()
                .map(|t| t.prepare_delete(id).map(|_| t.conversation_id()))
        }) else {
            return;
        };
        let conversation = match prepared {
            Ok(Some(conversation)) => conversation,
            Ok(None) => return,
            Err(e) => {
                self.update_thread(|t| t.fail(ThreadOp::Delete, e));
                return;
            }
        };

        let state = *self;
        spawn_local(async move {
            match GlooMessagingApi.delete_message(id).await {
                Ok(()) => state.update_thread(|t| {
                    t.complete_delete(conversation, id);
                }),
                Err(e) => state.update_thread(|t| t.fail_in(conversation, ThreadOp::Delete, e)),
            }
        });
    }

    /// Reply to `id`; an unknown message raises the banner.
    pub fn reply_to(&self, id: MessageId) {
        self.update_thread(|t| {
            t.start_reply(id);
        });
    }

    /// Load one of our messages into the compose area for editing.
    pub fn start_edit(&self, id: MessageId) {
        self.update_thread(|t| {
            t.start_edit(id);
        });
    }

    /// Read the picked file and make it the compose attachment. A file that
    /// cannot be read raises the banner.
    pub fn attach(&self, file: web_sys::File, kind: AttachmentKind) {
        let Some(conversation) = self.thread.with_untracked(|t| t.as_ref().and_then(ThreadState::conversation_id))
        else {
            return;
        };

        let state = *self;
        spawn_local(async move {
            match crate::api::read_file(&file).await {
                Ok(bytes) => {
                    let attachment = Attachment::new(kind, file.name(), file.type_(), bytes);
                    state.update_thread(|t| {
                        if t.is_open(conversation) {
                            t.select_attachment(attachment);
                        }
                    });
                }
                Err(e) => {
                    log::error!("Failed to read {}: {e}", file.name());
                    state.update_thread(|t| t.fail_in(conversation, ThreadOp::Attach, e));
                }
            }
        });
    }

    pub fn leave(&self, id: ConversationId) {
        let state = *self;
        spawn_local(async move {
            match GlooMessagingApi.leave_conversation(id).await {
                Ok(()) => {
                    state.set_conversations.update(|list| list.retain(|c| c.id != id));
                    let open_here = state.thread.with_untracked(|t| t.as_ref().is_some_and(|t| t.is_open(id)));
                    if open_here {
                        let me = state.me.get_untracked();
                        state.set_thread.set(me.map(ThreadState::new));
                    }
                }
                Err(e) => {
                    log::error!("Failed to leave conversation {id}: {e}");
                    state.set_inbox_error.set(Some(e.to_string()));
                }
            }
        });
    }
}
