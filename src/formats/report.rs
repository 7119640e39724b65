use crate::Result;
use crate::types::ReportRow;
use std::io::Write;
use url::Url;

pub const REPORT_HEADER: [&str; 14] = [
    "Marker_Name",
    "MyChr",
    "MyPosition",
    "QtlID",
    "QtlSpan",
    "Trait_Description",
    "Publication",
    "Population",
    "Chrom:Start-End_v3.0",
    "Genes_Under_QTL_v3.0",
    "Synteny",
    "QtlChr",
    "QtlStart",
    "QtlStop",
];

/// Atlas study page; the encoded publication is appended to it
pub const DEFAULT_STUDY_URL: &str =
    "https://aussorgm.org.au/sorghum-qtl-atlas/study-details/?study_name=";

/// Write the report as CSV. The header is written even when `rows` is empty.
pub fn write_report<W: Write>(writer: W, rows: &[ReportRow]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(REPORT_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Encode a publication the way the atlas study page expects it:
/// commas and ampersands are escaped and whitespace runs become `%20`.
pub fn encode_study_name(publication: &str) -> String {
    publication
        .replace(',', "%2C")
        .replace('&', "%26")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("%20")
}

/// `publication ( <study url> )`
pub fn annotate_publication(publication: &str, study_url: &Url) -> String {
    format!(
        "{} ( {}{} )",
        publication,
        study_url.as_str(),
        encode_study_name(publication)
    )
}
