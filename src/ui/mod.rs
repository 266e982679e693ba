//! Console front end
//!
//! Line-based only: approval prompts and questions on stderr, answers from
//! stdin, progress lines on stderr. Stdout is left for reports.

pub mod approval;
pub mod diff_preview;
pub mod progress;

pub use approval::{
    parse_response, ApprovalRequest, ApprovalResponse, ApprovalState, ConsoleInteractor,
};
pub use diff_preview::render_preview;
pub use progress::ConsoleProgress;
