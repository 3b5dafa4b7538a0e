pub mod compose;
pub mod state;

pub use compose::{ComposeState, ComposeTarget};
pub use state::{excerpt, ErrorBanner, OpenTarget, ReplyPreview, ThreadOp, ThreadState, ThreadStatus};
