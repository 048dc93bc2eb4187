//! Query sessions over a store snapshot.
//!
//! Input lines are either `%` directives that change the session's
//! [`QueryConfig`] or queries compiled against the active language field.

mod directive;
mod query;
mod session;

pub use directive::Directive;
pub use query::{FUZZY_DISTANCE, MatchMode, QueryConfig, QueryError, compile, compile_highlight};
pub use session::{LineOutcome, QuerySession};
