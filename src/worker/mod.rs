//! Fetch workers
//!
//! Two worker flavors drain the shared frontier: the light worker issues
//! plain HTTP fetches through reqwest, the heavy worker drives a full
//! browser session with anti-detection behavior. Both emit the same
//! structured [`crate::records::CrawlResult`] shape; concurrency exists only
//! across worker processes, never within one worker's active page.

mod backoff;
mod behavior;
mod heavy;
mod identity;
mod light;

pub use backoff::RetryPolicy;
pub use heavy::BrowserWorker;
pub use identity::IdentityPool;
pub use light::LightWorker;
