pub mod passage;
pub mod session;

pub use passage::{Passage, RankedResume, ScoredPassage};
pub use session::SessionId;
