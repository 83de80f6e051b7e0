//! Agent engine: signal snapshots, the decision table, and canned text.

pub mod chat;
pub mod decision;
pub mod report;
pub mod signals;

pub use chat::{parse_intent, render_reply, ChatContext, Intent, NewsDigest};
pub use decision::{decide, Decision};
pub use report::render_report;
pub use signals::SignalSnapshot;
