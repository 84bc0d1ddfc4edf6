//! Page plumbing shared by every dashboard command.

pub mod fanout;
pub mod scope;
pub mod state;

pub use fanout::{collect_student_portfolios, FanOut, FetchFailure};
pub use scope::{Canceller, ViewScope};
pub use state::{LoadState, Page, PageError};
