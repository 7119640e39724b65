use crate::types::Marker;
use crate::{Error, Result};
use std::path::Path;

/// Read the marker list (`markerName,chromosome,position` or
/// `markerName,chromosome,start,stop`, with a header line).
pub async fn read_markers(path: &Path) -> Result<Vec<Marker>> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Io(e),
    })?;
    parse_markers(&text)
}

pub fn parse_markers(text: &str) -> Result<Vec<Marker>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut markers = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let invalid = |reason: String| Error::InvalidMarker { line, reason };

        let fields: Vec<&str> = record.iter().collect();
        let (name, chr_label, start, stop) = match fields.as_slice() {
            [name, chr, position] => (*name, *chr, *position, None),
            [name, chr, start, stop] => (*name, *chr, *start, Some(*stop)),
            _ => {
                return Err(invalid(format!(
                    "expected 3 or 4 fields, found {}",
                    fields.len()
                )));
            }
        };

        let chr = parse_chromosome(chr_label).ok_or_else(|| {
            invalid(format!("chromosome {:?} is not a number", chr_label))
        })?;
        let start: i64 = start
            .parse()
            .map_err(|_| invalid(format!("position {:?} is not an integer", start)))?;
        let stop = stop
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| invalid(format!("stop {:?} is not an integer", s)))
            })
            .transpose()?;
        if let Some(stop) = stop {
            if stop < start {
                return Err(invalid(format!("stop {} precedes start {}", stop, start)));
            }
        }

        markers.push(Marker {
            name: name.to_string(),
            chr_label: chr_label.to_string(),
            chr,
            start,
            stop,
        });
    }

    Ok(markers)
}

/// `Chr03` and `3` both name chromosome 3
fn parse_chromosome(label: &str) -> Option<i64> {
    label
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_markers() {
        let markers = parse_markers("marker,chr,pos\nM1,3,150\nM2,Chr10,2000\n").unwrap();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].name, "M1");
        assert_eq!(markers[0].chr, 3);
        assert_eq!(markers[0].start, 150);
        assert_eq!(markers[0].stop, None);
        assert_eq!(markers[1].chr_label, "Chr10");
        assert_eq!(markers[1].chr, 10);
    }

    #[test]
    fn test_interval_and_point_markers_mixed() {
        let markers = parse_markers("name,chr,start,stop\nI1,chr02,100,900\nP1,2,50\n").unwrap();
        assert_eq!(markers[0].stop, Some(900));
        assert_eq!(markers[0].chr, 2);
        assert_eq!(markers[1].stop, None);
    }

    #[test]
    fn test_blank_lines_and_padding() {
        let markers = parse_markers("name,chr,pos\n\n M1 , 3 , 150 \n\n").unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].name, "M1");
        assert_eq!(markers[0].start, 150);
    }

    #[test]
    fn test_header_only() {
        assert!(parse_markers("name,chr,pos\n").unwrap().is_empty());
    }

    #[test]
    fn test_non_numeric_fields_are_fatal() {
        for text in [
            "name,chr,pos\nM1,X,150\n",
            "name,chr,pos\nM1,3,15o\n",
            "name,chr,start,stop\nM1,3,100,end\n",
            "name,chr,pos\nM1,3\n",
            "name,chr,start,stop\nM1,3,500,100\n",
        ] {
            let err = parse_markers(text).unwrap_err();
            assert!(matches!(err, Error::InvalidMarker { line: 2, .. }), "{text:?}: {err}");
        }
    }
}
