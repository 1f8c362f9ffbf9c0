//! One tested primitive for every "wait until the page gets there" loop:
//! URL polling, upload-control appearance and upload confirmation all run
//! through [`watch`] / [`watch_async`].

pub mod api;
pub mod error;
pub mod model;

pub use api::{watch, watch_async};
pub use error::SchedulerError;
pub use model::{Backoff, WatchOutcome, WatchSpec};
