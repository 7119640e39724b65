use crate::Result;
use crate::formats::annotate_publication;
use crate::storage::AtlasStore;
use crate::types::{Marker, OverlapQuery, QtlRecord, ReportRow, SubstringFilter};
use url::Url;

/// Query settings, all distances in base pairs
#[derive(Debug, Clone)]
pub struct QueryParams {
    /// Slop added to both ends of every QTL interval
    pub tolerance: i64,
    /// QTL longer than this are left out of the report
    pub max_span: i64,
    pub filters: Vec<SubstringFilter>,
    pub study_url: Url,
}

/// Look up every marker in the store and build the report rows.
///
/// Rows follow the marker input order, then the atlas row order. A marker
/// with no match contributes no rows.
pub async fn find_overlaps(
    store: &dyn AtlasStore,
    markers: &[Marker],
    params: &QueryParams,
) -> Result<Vec<ReportRow>> {
    let mut rows = Vec::new();

    for marker in markers {
        let query = OverlapQuery::for_marker(marker, params.tolerance, &params.filters);
        let matches = store.overlapping(&query).await?;
        let found = matches.len();
        let before = rows.len();

        for record in matches {
            if record.span() > params.max_span {
                tracing::debug!(
                    "{}: skipping {} (span {} > {})",
                    marker.name,
                    record.qtl_id,
                    record.span(),
                    params.max_span
                );
                continue;
            }
            rows.push(report_row(marker, &record, &params.study_url));
        }

        tracing::debug!(
            "{} ({}:{}): {} matches, {} reported",
            marker.name,
            marker.chr,
            marker.position_label(),
            found,
            rows.len() - before
        );
    }

    Ok(rows)
}

pub fn report_row(marker: &Marker, record: &QtlRecord, study_url: &Url) -> ReportRow {
    ReportRow {
        marker_name: marker.name.clone(),
        my_chr: marker.chr_label.clone(),
        my_position: marker.position_label(),
        qtl_id: record.qtl_id.clone(),
        qtl_span: record.span(),
        trait_description: record.trait_description.clone(),
        publication: annotate_publication(&record.publication, study_url),
        population: record.population.clone(),
        locus_span: record.locus_span.clone(),
        genes_under_qtl: record.genes_under_qtl.clone(),
        synteny: record.synteny.clone(),
        qtl_chr: record.chr,
        qtl_start: record.start,
        qtl_stop: record.stop,
    }
}
