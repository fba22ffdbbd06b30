//! Planning-period state and synchronization.
//!
//! Each period type (annual, monthly, weekly, daily) gets its own navigation
//! cursor and a [`PlanEngine`] that resolves the cursor to at most one plan
//! document, creates it lazily, locks past periods and keeps a materialized
//! copy in sync with the store.

mod activity;
mod engine;
mod habit;
mod identity;
mod navigation;
mod period;
mod streak;

pub use activity::*;
pub use engine::*;
pub use habit::*;
pub use identity::*;
pub use navigation::*;
pub use period::*;
pub use streak::*;
