//! Filtered read-only query layer over the denormalized tree dataset

pub mod engine;
pub mod filter;
pub mod reader;
pub mod sql;

pub use engine::{QueryEngine, QueryOutcome, TreeQuery};
pub use filter::{ListFilter, Page, SortField, SortOrder, SortSpec, TreeFilter, TreeKey};
pub use reader::{FeaturedReader, FilteredReader, PgTreeReader};
