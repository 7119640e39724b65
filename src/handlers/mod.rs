mod build;
mod query;

pub use build::{BuildSummary, build_atlas, store_atlas, unify_sources};
pub use query::{QueryParams, find_overlaps, report_row};
