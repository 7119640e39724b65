use crate::{Error, Result};
use serde::Serialize;
use std::borrow::Cow;

/// Columns of the stored atlas table.
///
/// The numeric index of each variant is the public `--column` contract and
/// must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtlasColumn {
    Index,
    QtlId,
    Publication,
    Population,
    TraitDescription,
    LocusSpan,
    GenesUnderQtl,
    Synteny,
    Chr,
    Start,
    Stop,
}

impl AtlasColumn {
    pub const ALL: [AtlasColumn; 11] = [
        AtlasColumn::Index,
        AtlasColumn::QtlId,
        AtlasColumn::Publication,
        AtlasColumn::Population,
        AtlasColumn::TraitDescription,
        AtlasColumn::LocusSpan,
        AtlasColumn::GenesUnderQtl,
        AtlasColumn::Synteny,
        AtlasColumn::Chr,
        AtlasColumn::Start,
        AtlasColumn::Stop,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name in the store and, for source columns, in the spreadsheet header
    pub fn name(self) -> &'static str {
        match self {
            AtlasColumn::Index => "index",
            AtlasColumn::QtlId => "QTL Id",
            AtlasColumn::Publication => "Publication",
            AtlasColumn::Population => "Population",
            AtlasColumn::TraitDescription => "Trait Description",
            AtlasColumn::LocusSpan => "LG:Start-End (v3.0)",
            AtlasColumn::GenesUnderQtl => "Genes Under QTL (v3.0)",
            AtlasColumn::Synteny => "Synteny",
            AtlasColumn::Chr => "Chr",
            AtlasColumn::Start => "Start",
            AtlasColumn::Stop => "Stop",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            AtlasColumn::Index | AtlasColumn::Chr | AtlasColumn::Start | AtlasColumn::Stop
        )
    }

    /// Columns read from the source spreadsheets (the rest are derived)
    pub fn is_source(self) -> bool {
        !self.is_numeric()
    }
}

/// One row of the atlas table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QtlRecord {
    pub id: i64,
    pub qtl_id: String,
    pub publication: String,
    pub population: String,
    pub trait_description: String,
    pub locus_span: String,
    pub genes_under_qtl: String,
    pub synteny: String,
    pub chr: i64,
    pub start: i64,
    pub stop: i64,
}

impl QtlRecord {
    pub fn span(&self) -> i64 {
        self.stop - self.start
    }

    /// Textual value of a column, as substring filters see it
    pub fn field_text(&self, column: AtlasColumn) -> Cow<'_, str> {
        match column {
            AtlasColumn::Index => Cow::Owned(self.id.to_string()),
            AtlasColumn::QtlId => Cow::Borrowed(self.qtl_id.as_str()),
            AtlasColumn::Publication => Cow::Borrowed(self.publication.as_str()),
            AtlasColumn::Population => Cow::Borrowed(self.population.as_str()),
            AtlasColumn::TraitDescription => Cow::Borrowed(self.trait_description.as_str()),
            AtlasColumn::LocusSpan => Cow::Borrowed(self.locus_span.as_str()),
            AtlasColumn::GenesUnderQtl => Cow::Borrowed(self.genes_under_qtl.as_str()),
            AtlasColumn::Synteny => Cow::Borrowed(self.synteny.as_str()),
            AtlasColumn::Chr => Cow::Owned(self.chr.to_string()),
            AtlasColumn::Start => Cow::Owned(self.start.to_string()),
            AtlasColumn::Stop => Cow::Owned(self.stop.to_string()),
        }
    }
}

/// Chromosome and coordinates parsed from a locus span such as `1:2246707-10368475`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locus {
    pub chr: i64,
    pub start: i64,
    pub stop: i64,
}

/// A marker position or interval supplied by the researcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub name: String,
    /// Chromosome as written in the input, e.g. `Chr3`
    pub chr_label: String,
    pub chr: i64,
    pub start: i64,
    /// Present for interval markers only
    pub stop: Option<i64>,
}

impl Marker {
    pub fn end(&self) -> i64 {
        self.stop.unwrap_or(self.start)
    }

    /// `MyPosition` report value
    pub fn position_label(&self) -> String {
        match self.stop {
            Some(stop) => format!("{}-{}", self.start, stop),
            None => self.start.to_string(),
        }
    }
}

/// Case-sensitive "column contains substring" restriction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringFilter {
    pub column: AtlasColumn,
    pub needle: String,
}

impl SubstringFilter {
    pub fn matches(&self, record: &QtlRecord) -> bool {
        record.field_text(self.column).contains(self.needle.as_str())
    }

    /// Pair up the comma-separated `--column` and `--substring` lists.
    ///
    /// Both must be `None` (no filtering) or both must be set, with equal lengths.
    pub fn parse_lists(columns: &str, substrings: &str) -> Result<Vec<SubstringFilter>> {
        let no_columns = columns.trim().eq_ignore_ascii_case("none");
        let no_substrings = substrings.trim().eq_ignore_ascii_case("none");

        match (no_columns, no_substrings) {
            (true, true) => return Ok(Vec::new()),
            (true, false) => {
                return Err(Error::Config(
                    "column parameter required with substring".to_string(),
                ));
            }
            (false, true) => {
                return Err(Error::Config(
                    "substring parameter required with column".to_string(),
                ));
            }
            (false, false) => {}
        }

        let column_list: Vec<&str> = columns.split(',').collect();
        let substring_list: Vec<&str> = substrings.split(',').collect();
        if column_list.len() != substring_list.len() {
            return Err(Error::Config(format!(
                "different numbers of columns ({}) and substrings ({})",
                column_list.len(),
                substring_list.len()
            )));
        }

        column_list
            .into_iter()
            .zip(substring_list)
            .map(|(column, needle)| -> Result<SubstringFilter> {
                let column = column
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(AtlasColumn::from_index)
                    .ok_or_else(|| {
                        Error::Config(format!(
                            "unknown column index {:?} (expected 0-{})",
                            column,
                            AtlasColumn::ALL.len() - 1
                        ))
                    })?;
                Ok(SubstringFilter {
                    column,
                    needle: needle.to_string(),
                })
            })
            .collect()
    }
}

/// Overlap query for one marker against the atlas table.
///
/// A record matches when it is on the same chromosome and either end of the
/// marker falls within `[Start - tolerance, Stop + tolerance]`, or the marker
/// fully contains the record. A point marker has no `stop` and reduces to the
/// point-in-expanded-interval test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapQuery {
    pub chr: i64,
    pub start: i64,
    pub stop: Option<i64>,
    pub tolerance: i64,
    pub filters: Vec<SubstringFilter>,
}

impl OverlapQuery {
    pub fn for_marker(marker: &Marker, tolerance: i64, filters: &[SubstringFilter]) -> Self {
        Self {
            chr: marker.chr,
            start: marker.start,
            stop: marker.stop,
            tolerance,
            filters: filters.to_vec(),
        }
    }

    pub fn end(&self) -> i64 {
        self.stop.unwrap_or(self.start)
    }

    pub fn matches(&self, record: &QtlRecord) -> bool {
        if record.chr != self.chr {
            return false;
        }
        let low = record.start.saturating_sub(self.tolerance);
        let high = record.stop.saturating_add(self.tolerance);
        let within = |pos: i64| low <= pos && pos <= high;
        let (start, end) = (self.start, self.end());

        let overlaps =
            within(start) || within(end) || (start <= record.start && end >= record.stop);
        overlaps && self.filters.iter().all(|f| f.matches(record))
    }
}

/// One line of the overlap report; field order is the CSV column order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub marker_name: String,
    pub my_chr: String,
    pub my_position: String,
    pub qtl_id: String,
    pub qtl_span: i64,
    pub trait_description: String,
    pub publication: String,
    pub population: String,
    pub locus_span: String,
    pub genes_under_qtl: String,
    pub synteny: String,
    pub qtl_chr: i64,
    pub qtl_start: i64,
    pub qtl_stop: i64,
}
