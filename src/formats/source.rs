use crate::types::{AtlasColumn, Locus, QtlRecord};
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// A QTL spreadsheet export (CSV or TSV) with its header
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<SourceRow>,
}

/// Source columns of one spreadsheet row, before the locus is parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    /// 1-based line in the source file
    pub line: u64,
    pub qtl_id: String,
    pub publication: String,
    pub population: String,
    pub trait_description: String,
    pub locus_span: String,
    pub genes_under_qtl: String,
    pub synteny: String,
}

impl SourceRow {
    /// Derive Chr/Start/Stop from the locus span and assign the row id
    pub fn into_record(self, id: i64) -> Result<QtlRecord> {
        let Locus { chr, start, stop } = self.locus_span.parse()?;
        Ok(QtlRecord {
            id,
            qtl_id: self.qtl_id,
            publication: self.publication,
            population: self.population,
            trait_description: self.trait_description,
            locus_span: self.locus_span,
            genes_under_qtl: self.genes_under_qtl,
            synteny: self.synteny,
            chr,
            start,
            stop,
        })
    }
}

/// Read a source table from disk.
///
/// `skip_rows` banner lines are dropped before the header line.
pub async fn read_source_table(path: &Path, skip_rows: usize) -> Result<SourceTable> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Io(e),
    })?;
    parse_source_table(path, &text, skip_rows)
}

pub fn parse_source_table(path: &Path, text: &str, skip_rows: usize) -> Result<SourceTable> {
    let mut body = text.trim_start_matches('\u{feff}');
    for _ in 0..skip_rows {
        body = body.split_once('\n').map_or("", |(_, rest)| rest);
    }

    let header_line = body.lines().next().unwrap_or("");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(header_line))
        .trim(csv::Trim::Headers)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let positions = column_positions(path, &headers)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line()) + skip_rows as u64;
        let field = |column: AtlasColumn| -> String {
            positions
                .iter()
                .find(|(c, _)| *c == column)
                .and_then(|(_, i)| record.get(*i))
                .unwrap_or("")
                .to_string()
        };
        rows.push(SourceRow {
            line,
            qtl_id: field(AtlasColumn::QtlId),
            publication: field(AtlasColumn::Publication),
            population: field(AtlasColumn::Population),
            trait_description: field(AtlasColumn::TraitDescription),
            locus_span: field(AtlasColumn::LocusSpan),
            genes_under_qtl: field(AtlasColumn::GenesUnderQtl),
            synteny: field(AtlasColumn::Synteny),
        });
    }

    Ok(SourceTable {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

/// Tab wins over comma when both appear in the header line
fn detect_delimiter(header_line: &str) -> u8 {
    if header_line.contains('\t') { b'\t' } else { b',' }
}

fn column_positions(path: &Path, headers: &[String]) -> Result<Vec<(AtlasColumn, usize)>> {
    let mut positions = Vec::new();
    for column in AtlasColumn::ALL.into_iter().filter(|c| c.is_source()) {
        let index = headers
            .iter()
            .position(|h| h == column.name())
            .ok_or_else(|| Error::SchemaMismatch {
                path: path.to_path_buf(),
                reason: format!("missing column {:?}", column.name()),
            })?;
        positions.push((column, index));
    }

    for header in headers {
        if !positions.iter().any(|(c, _)| c.name() == header) {
            tracing::warn!("{}: ignoring extra column {:?}", path.display(), header);
        }
    }

    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "QTL Id,Publication,Population,Trait Description,LG:Start-End (v3.0),Genes Under QTL (v3.0),Synteny";

    #[test]
    fn test_parse_csv_table() {
        let text = format!(
            "{}\nQTL1,PubA,PopA,\"desc, long\",3:100-200,geneX,synA\nQTL2,PubB,PopB,desc2,1:5-50,,\n",
            HEADER
        );
        let table = parse_source_table(Path::new("leaf.csv"), &text, 0).unwrap();
        assert_eq!(table.headers.len(), 7);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].trait_description, "desc, long");
        assert_eq!(table.rows[0].line, 2);
        assert_eq!(table.rows[1].genes_under_qtl, "");

        let record = table.rows[0].clone().into_record(0).unwrap();
        assert_eq!((record.chr, record.start, record.stop), (3, 100, 200));
        assert_eq!(record.locus_span, "3:100-200");
    }

    #[test]
    fn test_parse_tsv_with_banner_and_extra_column() {
        let text = format!(
            "Sorghum QTL Atlas export\n{}\tNotes\nQTL9\tPub\tPop\tTrait\t7:1-2\tg\ts\tnote\n",
            HEADER.replace(',', "\t")
        );
        let table = parse_source_table(Path::new("maturity.tsv"), &text, 1).unwrap();
        assert_eq!(table.headers.last().map(String::as_str), Some("Notes"));
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].qtl_id, "QTL9");
        assert_eq!(table.rows[0].synteny, "s");
        assert_eq!(table.rows[0].line, 3);
    }

    #[test]
    fn test_columns_found_by_name() {
        let text = "Synteny,QTL Id,LG:Start-End (v3.0),Publication,Population,Trait Description,Genes Under QTL (v3.0)\nsynA,QTL1,3:100-200,PubA,PopA,desc,geneX\n";
        let table = parse_source_table(Path::new("shuffled.csv"), text, 0).unwrap();
        let row = &table.rows[0];
        assert_eq!(row.qtl_id, "QTL1");
        assert_eq!(row.synteny, "synA");
        assert_eq!(row.locus_span, "3:100-200");
    }

    #[test]
    fn test_missing_column() {
        let text = "QTL Id,Publication\nQTL1,PubA\n";
        let err = parse_source_table(Path::new("bad.csv"), text, 0).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
        assert!(err.to_string().contains("Population"));
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        let text = format!("{}\nQTL1,PubA\n", HEADER);
        let err = parse_source_table(Path::new("ragged.csv"), &text, 0).unwrap_err();
        assert!(matches!(err, Error::Csv(_)));
    }

    #[test]
    fn test_malformed_locus_is_reported() {
        let text = format!("{}\nQTL1,PubA,PopA,desc,3:100,geneX,synA\n", HEADER);
        let table = parse_source_table(Path::new("leaf.csv"), &text, 0).unwrap();
        let err = table.rows[0].clone().into_record(0).unwrap_err();
        assert!(matches!(err, Error::InvalidLocus { .. }));
    }
}
