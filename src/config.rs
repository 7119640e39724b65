use crate::formats::report::DEFAULT_STUDY_URL;
use crate::handlers::QueryParams;
use crate::storage::{DEFAULT_TABLE, validate_table_name};
use crate::types::SubstringFilter;
use crate::{Error, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

pub const DEFAULT_DATABASE: &str = "SorghumQtlAtlas.db";

#[derive(Debug, Clone, Parser)]
#[command(name = "qtl-atlas-build")]
#[command(about = "Build a local instance of the Sorghum QTL Atlas \
    (https://aussorgm.org.au/sorghum-qtl-atlas/search/)")]
pub struct BuildConfig {
    /// Atlas exports (CSV or TSV) as a comma-separated list, e.g. Atlas_leaf.csv,Atlas_maturity.csv
    #[arg(long, env = "QTL_ATLAS_INPUT", value_delimiter = ',', required = true)]
    pub input: Vec<PathBuf>,

    /// Database to create; an existing atlas table is overwritten
    #[arg(long, env = "QTL_ATLAS_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: PathBuf,

    /// Table to write the QTL records to
    #[arg(long, env = "QTL_ATLAS_TABLE", default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Banner lines preceding the header in each input file; atlas exports carry one title row
    #[arg(long, default_value = "1")]
    pub skip_rows: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "qtl-atlas-query")]
#[command(about = "Find QTL in the Sorghum QTL Atlas near marker positions")]
pub struct QueryConfig {
    /// Marker CSV with a header line: markerName,chromosome,position or markerName,chromosome,start,stop
    #[arg(long)]
    pub input: PathBuf,

    /// Report to create (CSV)
    #[arg(long)]
    pub output: PathBuf,

    /// Atlas database built by qtl-atlas-build
    #[arg(long, env = "QTL_ATLAS_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: PathBuf,

    /// Distance in kb from a marker to search for QTL
    #[arg(long, default_value_t = 10.0)]
    pub distance: f64,

    /// Maximum QTL length in kb; longer QTL are not reported
    #[arg(long, visible_alias = "qtl_length", default_value_t = 5000.0)]
    pub qtl_length: f64,

    /// Column indices to search for substrings: 0 index, 1 QTL Id, 2 Publication,
    /// 3 Population, 4 Trait Description, 5 LG:Start-End (v3.0),
    /// 6 Genes Under QTL (v3.0), 7 Synteny, 8 Chr, 9 Start, 10 Stop. Ex. --column 3,8
    #[arg(long, default_value = "None")]
    pub column: String,

    /// Substrings to look for in the matching --column entries. Ex. --substring bap,2
    #[arg(long, default_value = "None")]
    pub substring: String,

    /// Table holding the QTL records
    #[arg(long, env = "QTL_ATLAS_TABLE", default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Study page link prepended to the encoded publication
    #[arg(long, env = "QTL_ATLAS_STUDY_URL", default_value = DEFAULT_STUDY_URL)]
    pub study_url: Url,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl QueryConfig {
    /// Validate the options and convert distances to base pairs
    pub fn query_params(&self) -> Result<QueryParams> {
        let filters = SubstringFilter::parse_lists(&self.column, &self.substring)?;
        validate_table_name(&self.table)?;
        Ok(QueryParams {
            tolerance: kb_to_bp("distance", self.distance)?,
            max_span: kb_to_bp("qtl-length", self.qtl_length)?,
            filters,
            study_url: self.study_url.clone(),
        })
    }
}

/// Kilobases to base pairs, truncating any fraction of a base
pub fn kb_to_bp(option: &str, kb: f64) -> Result<i64> {
    if !kb.is_finite() || kb < 0.0 {
        return Err(Error::Config(format!(
            "--{} must be a non-negative number of kb, got {}",
            option, kb
        )));
    }
    Ok((kb * 1000.0) as i64)
}

/// Install the stderr log subscriber; `RUST_LOG` wins over `log_level`
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
