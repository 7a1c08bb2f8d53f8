pub mod job;
pub mod queue;
pub mod scanner;
pub mod service;

pub use job::{Job, JobResult, DEFAULT_SESSION};
pub use queue::{JobQueue, JobSubmitter};
pub use scanner::{InboxScanner, WatchTiming};
pub use service::InboxService;
