//! Shared types for the chatsift line-extraction pipeline.

mod category;
mod context;
mod line;
mod record;
mod session;
mod subject;

pub use category::*;
pub use context::*;
pub use line::*;
pub use record::*;
pub use session::*;
pub use subject::*;
