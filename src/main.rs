mod console;

use std::path::Path;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use member_messaging::models::{Attachment, AttachmentKind, MemberId};
use member_messaging::{Config, HttpMessagingApi, InboxController, MessagingApi, ThreadController};

use crate::console::Command;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Logs go to stderr so they do not interleave with the rendered thread
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "member_messaging=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let member_id: MemberId = std::env::args()
        .nth(1)
        .context("usage: member_messaging <member-id>")?
        .parse()
        .context("member id must be a number")?;

    // ── Identity & wiring ─────────────────────────────────────────────────────
    let config = Config::from_env()?;
    let api = HttpMessagingApi::new(&config)?;
    let me = api
        .current_user()
        .await
        .context("failed to load the signed-in member")?;
    info!("Signed in as member {} via {}", me.id, config.api_base_url);

    let mut inbox = InboxController::new(api.clone(), me.clone());
    let mut thread = ThreadController::new(api, me);

    inbox.refresh().await;
    thread.open(member_id).await;
    print!("{}", console::render(thread.state()));

    // ── Command loop ──────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        };

        let command = match console::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => {
                println!("{}", console::HELP);
                continue;
            }
            Command::Inbox => {
                inbox.refresh().await;
                if let Some(e) = inbox.error() {
                    println!("!! {e}");
                }
                print!("{}", console::render_inbox(inbox.conversations(), inbox.me()));
                continue;
            }
            Command::Open(id) => {
                if inbox.conversation(id).is_none() {
                    inbox.refresh().await;
                }
                match inbox.conversation(id).cloned() {
                    Some(conversation) => {
                        thread.open_conversation(conversation).await;
                    }
                    None => {
                        println!("No conversation #{id} in your inbox (/inbox).");
                        continue;
                    }
                }
            }
            Command::Leave => {
                let Some(id) = thread.state().conversation().map(|c| c.id) else {
                    println!("No conversation open.");
                    continue;
                };
                if inbox.leave(id).await {
                    println!("Left conversation #{id}.");
                    break;
                }
                if let Some(e) = inbox.error() {
                    println!("!! {e}");
                }
                continue;
            }
            Command::Send(text) => {
                thread.state_mut().compose_mut().set_draft(text);
                if thread.state().compose().edit_target().is_some() {
                    thread.submit().await;
                } else if let Some(id) = thread.send().await {
                    if let Some(message) = thread.state().message(id) {
                        inbox.record_sent(message);
                    }
                }
            }
            Command::Reply(id) => {
                thread.state_mut().start_reply(id);
            }
            Command::Edit { id, text: Some(text) } => {
                thread.edit(id, &text).await;
            }
            Command::Edit { id, text: None } => {
                thread.state_mut().start_edit(id);
            }
            Command::Delete(id) => {
                thread.delete(id).await;
            }
            Command::Attach { kind, path } => match read_attachment(kind, &path).await {
                Ok(attachment) => {
                    thread.select_attachment(attachment);
                }
                Err(e) => println!("{e:#}"),
            },
            Command::Detach => {
                thread.state_mut().compose_mut().clear_attachment();
            }
            Command::Cancel => thread.state_mut().cancel_target(),
            Command::Emoji(glyph) => thread.state_mut().compose_mut().insert_emoji(&glyph),
            Command::Older => {
                thread.load_older().await;
            }
            Command::Dismiss => thread.dismiss_error(),
        }

        print!("{}", console::render(thread.state()));
    }

    Ok(())
}

async fn read_attachment(kind: AttachmentKind, path: &str) -> anyhow::Result<Attachment> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {path}"))?;
    let file_name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment")
        .to_string();
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    Ok(Attachment::new(kind, file_name, content_type.essence_str(), bytes))
}
