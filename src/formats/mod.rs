//! Text formats read and written by the pipeline.
//!
//! - [`source`] - QTL spreadsheet exports (CSV/TSV) consumed by the builder
//! - [`markers`] - marker lists consumed by the query engine
//! - [`report`] - the overlap report CSV
//! - `locus` - the `LG:Start-End` position strings, parsed via [`FromStr`](std::str::FromStr)
//!   on [`Locus`](crate::types::Locus)

mod locus;
pub mod markers;
pub mod report;
pub mod source;

pub use markers::{parse_markers, read_markers};
pub use report::{REPORT_HEADER, annotate_publication, encode_study_name, write_report};
pub use source::{SourceRow, SourceTable, parse_source_table, read_source_table};
