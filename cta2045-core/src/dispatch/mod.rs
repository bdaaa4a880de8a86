//! Message dispatch
//!
//! Each category has a static table mapping its operations to a
//! [`Handling`]; the dispatcher turns that handling into reply frames.

pub mod dispatcher;
pub mod table;

pub use dispatcher::{Dispatcher, Replies, MAX_REPLIES};
pub use table::{Handling, Report, ReplyKind};
