//! Line commands and plain-text rendering for the terminal thread client.

use std::fmt::Write as _;

use member_messaging::models::{AttachmentKind, Conversation, ConversationId, CurrentUser, MessageId};
use member_messaging::thread::{ReplyPreview, ThreadState, ThreadStatus};

pub const HELP: &str = "\
commands:
  <text>              send a message (or save the edit in progress)
  /reply <id>         reply to a message
  /edit <id> [text]   edit one of your messages (no text: load it into the draft)
  /delete <id>        delete one of your messages
  /attach <path>      attach a file
  /image <path>       attach an image
  /detach             drop the selected attachment
  /cancel             cancel reply or edit
  /emoji <glyph>      insert an emoji into the draft
  /older              load older messages
  /dismiss            hide the error banner
  /inbox              list conversations
  /open <id>          open a conversation from the inbox (groups included)
  /leave              leave this conversation
  /help               show this help
  /quit               exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Reply(MessageId),
    Edit { id: MessageId, text: Option<String> },
    Delete(MessageId),
    Attach { kind: AttachmentKind, path: String },
    Detach,
    Cancel,
    Emoji(String),
    Older,
    Dismiss,
    Inbox,
    Open(ConversationId),
    Leave,
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Send(line.to_string()));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    let message_id = |args: &str| -> Result<MessageId, String> {
        let raw = args.split_whitespace().next().ok_or("missing message id")?;
        raw.parse().map_err(|_| format!("'{raw}' is not a message id"))
    };
    let required = |args: &str, what: &str| -> Result<String, String> {
        if args.is_empty() {
            Err(format!("missing {what}"))
        } else {
            Ok(args.to_string())
        }
    };

    match name {
        "reply" => message_id(args).map(Command::Reply),
        "edit" => {
            let id = message_id(args)?;
            let text = args
                .split_once(char::is_whitespace)
                .map(|(_, text)| text.trim().to_string())
                .filter(|t| !t.is_empty());
            Ok(Command::Edit { id, text })
        }
        "delete" => message_id(args).map(Command::Delete),
        "attach" => required(args, "path").map(|path| Command::Attach { kind: AttachmentKind::File, path }),
        "image" => required(args, "path").map(|path| Command::Attach { kind: AttachmentKind::Image, path }),
        "detach" => Ok(Command::Detach),
        "cancel" => Ok(Command::Cancel),
        "emoji" => required(args, "emoji").map(Command::Emoji),
        "older" => Ok(Command::Older),
        "dismiss" => Ok(Command::Dismiss),
        "inbox" => Ok(Command::Inbox),
        "open" => {
            let raw = args.split_whitespace().next().ok_or("missing conversation id")?;
            raw.trim_start_matches('#')
                .parse()
                .map(Command::Open)
                .map_err(|_| format!("'{raw}' is not a conversation id"))
        }
        "leave" => Ok(Command::Leave),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command /{other}, try /help")),
    }
}

/// Renders the thread: `>` marks our messages, `<` everyone else's.
pub fn render(state: &ThreadState) -> String {
    let mut out = String::new();

    if let Some(banner) = state.error() {
        match banner.hint() {
            Some(hint) => {
                let _ = writeln!(out, "!! {} {hint} (/dismiss)", banner.text());
            }
            None => {
                let _ = writeln!(out, "!! {} (/dismiss)", banner.text());
            }
        }
    }

    match state.status() {
        ThreadStatus::SelfConversation => {
            out.push_str("You cannot message yourself. Pick another member.\n");
            return out;
        }
        ThreadStatus::Idle => {
            out.push_str("No conversation open.\n");
            return out;
        }
        ThreadStatus::Ready => {}
    }

    let _ = writeln!(out, "── {} ──", state.title());
    if state.has_older() {
        out.push_str("   (older messages available: /older)\n");
    }

    for message in state.messages() {
        let own = state.is_own_message(message);
        let marker = if own { '>' } else { '<' };
        let author = if own { "you".to_string() } else { state.sender_name(message) };

        if let Some(preview) = state.reply_preview(message) {
            let _ = writeln!(out, "{marker}    ┆ {}", preview_line(&preview));
        }

        let mut line = format!(
            "{marker} [{}] {} {}:",
            message.id,
            message.created_at.format("%Y-%m-%d %H:%M"),
            author
        );
        if let Some(text) = message.text() {
            let _ = write!(line, " {text}");
        }
        if let Some(url) = &message.attachment {
            let _ = write!(line, " <{} {url}>", message.kind);
        }
        if message.edited {
            line.push_str(" (edited)");
        }
        out.push_str(&line);
        out.push('\n');
    }

    let compose = state.compose();
    if let Some(preview) = state.reply_target_preview() {
        let _ = writeln!(out, "replying to {}", preview_line(&preview));
    }
    if let Some(id) = compose.edit_target() {
        let _ = writeln!(out, "editing message {id}: {}", compose.draft());
    }
    if let Some(attachment) = compose.attachment() {
        let _ = writeln!(out, "attached {:?}: {}", attachment.kind, attachment.file_name);
    }
    out
}

fn preview_line(preview: &ReplyPreview) -> String {
    match preview {
        ReplyPreview::Available { sender_name, excerpt, .. } => format!("{sender_name}: {excerpt}"),
        ReplyPreview::Unavailable { id } => format!("message {id} is unavailable"),
    }
}

pub fn render_inbox(conversations: &[Conversation], me: &CurrentUser) -> String {
    if conversations.is_empty() {
        return "No conversations yet.\n".to_string();
    }
    let mut out = String::new();
    for conversation in conversations {
        let unread = match conversation.unread_count {
            0 => String::new(),
            n => format!(" ({n} unread)"),
        };
        let last = conversation
            .last_message
            .as_ref()
            .and_then(|m| m.content.as_deref())
            .unwrap_or("");
        let _ = writeln!(out, "#{} {}{unread} {last}", conversation.id, conversation.title_for(me.id));
    }
    out
}
