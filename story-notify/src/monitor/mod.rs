//! Notification polling.
//!
//! [`PollingEngine`] drives one cycle at a time: read the unseen counter,
//! fetch the feed, walk the entries newer than the [`PollCursor`], show them
//! newest first and move the cursor to the head of the feed. The first cycle
//! after startup only primes the cursor.

mod cursor;
mod engine;

pub use cursor::PollCursor;
pub use engine::{CycleOutcome, PollingEngine};
