//! Domain types - lists, broadcast notifications and check outcomes.

mod list;
mod notification;
mod verdict;

pub use list::ListKind;
pub use notification::{ListOp, Notification};
pub use verdict::{Decision, Rejection, Verdict};
