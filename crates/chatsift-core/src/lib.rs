//! Core classification-and-extraction pipeline for chatsift.

mod classifier;
mod dispatch;
mod edit_log;
mod error;
mod exclusion;
pub mod extract;
mod loader;
pub mod markup;
mod pipeline;
mod subjects;
mod table;

pub use classifier::{DEFAULT_MAX_CONTINUATION_ATTEMPTS, LineClassifier};
pub use dispatch::{DispatchTable, DisplaySink, ExtractCtx, LineHandler};
pub use edit_log::{EditLog, EditLogs};
pub use error::{Result, SiftError};
pub use exclusion::ExclusionFilter;
pub use loader::{
    CategoryFile, load_category_file, load_excluded_tags, load_subjects, save_excluded_tags,
};
pub use pipeline::{LineSender, Pipeline};
pub use subjects::{StaticRegistry, SubjectRegistry};
pub use table::{CategoryTable, CompiledCategory};
