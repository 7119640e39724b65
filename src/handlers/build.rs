use crate::formats::read_source_table;
use crate::storage::AtlasStore;
use crate::types::QtlRecord;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// What a build wrote to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub files: usize,
    pub records: usize,
}

/// Concatenate the source tables in order and derive Chr/Start/Stop for every row.
///
/// Every file must carry the same header as the first one. Row ids count up
/// from 0 across all files.
pub async fn unify_sources(paths: &[PathBuf], skip_rows: usize) -> Result<Vec<QtlRecord>> {
    if paths.is_empty() {
        return Err(Error::Config("no input files given".to_string()));
    }

    let mut first: Option<(&Path, Vec<String>)> = None;
    let mut records = Vec::new();

    for path in paths {
        let table = read_source_table(path, skip_rows).await?;
        if let Some((first_path, headers)) = &first {
            if *headers != table.headers {
                return Err(Error::SchemaMismatch {
                    path: path.clone(),
                    reason: format!("header differs from {}", first_path.display()),
                });
            }
        } else {
            first = Some((path.as_path(), table.headers.clone()));
        }

        tracing::info!("Loaded {} QTL rows from {}", table.rows.len(), path.display());
        for row in table.rows {
            let line = row.line;
            let id = records.len() as i64;
            let record = row
                .into_record(id)
                .map_err(|e| e.at_record(path.as_path(), line))?;
            records.push(record);
        }
    }

    Ok(records)
}

/// Build the atlas table from `paths`, replacing whatever the store held
pub async fn build_atlas(
    store: &dyn AtlasStore,
    paths: &[PathBuf],
    skip_rows: usize,
) -> Result<BuildSummary> {
    let records = unify_sources(paths, skip_rows).await?;
    store_atlas(store, records, paths.len()).await
}

/// Replace the store contents with records already unified from `files` sources
pub async fn store_atlas(
    store: &dyn AtlasStore,
    records: Vec<QtlRecord>,
    files: usize,
) -> Result<BuildSummary> {
    let stored = store.replace_all(records).await?;
    tracing::info!("Stored {} QTL records from {} files", stored, files);

    Ok(BuildSummary {
        files,
        records: stored,
    })
}
