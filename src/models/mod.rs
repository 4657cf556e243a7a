pub mod block;
pub mod context;
pub mod event;
pub mod git;
pub mod hook;
pub mod message;

pub use block::UsageBlock;
pub use context::{ContextInfo, ContextMethod, ContextWarning};
pub use event::UsageEvent;
pub use git::GitInfo;
pub use hook::HookJson;
pub use message::{MessageUsage, TranscriptLine};
