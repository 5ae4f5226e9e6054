//! The incremental research pipeline.
//!
//! A run moves through fixed stages (search, filter, prompt, streamed
//! synthesis, completion) and reports each one as a [`ProgressEvent`].

mod events;
mod pipeline;
pub mod prompts;
mod source;
mod summary;

pub use events::{ProgressEvent, COMPLETE_MESSAGE, NO_SOURCES_MESSAGE};
pub use pipeline::{ResearchError, ResearchPipeline, ResearchReport, SourceRef};
pub use prompts::ResearchContext;
pub use source::{select_sources, Source};
pub use summary::ResearchSummary;
