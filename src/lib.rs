//! Member messaging client: conversation threads between association members
//! over the association's REST backend.

pub mod api;
pub mod config;
pub mod errors;
pub mod models;
pub mod service;
pub mod thread;

#[cfg(feature = "http-client")]
pub use api::http_client::HttpMessagingApi;
pub use api::MessagingApi;
pub use config::Config;
pub use errors::ThreadError;
pub use service::inbox_service::InboxController;
pub use service::thread_service::ThreadController;
pub use thread::{ThreadState, ThreadStatus};
