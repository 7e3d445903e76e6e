#![forbid(unsafe_code)]

pub mod catalog;
pub mod json_file;
pub mod payload;
pub mod repository;

pub use catalog::StaticCatalog;
pub use json_file::JsonFileSource;
pub use repository::{ActivityCatalog, InMemorySource, QuestionSource, SourceError, Sources};
