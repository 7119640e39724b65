use crate::types::Locus;
use crate::{Error, Result};
use std::str::FromStr;

impl FromStr for Locus {
    type Err = Error;

    /// Parse `LG:Start-End` strings such as `1:2246707-10368475`.
    ///
    /// Any run of non-digit characters separates fields, so `Chr01:5..10`
    /// parses too. Exactly three numeric fields are required.
    fn from_str(value: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidLocus {
            value: value.to_string(),
            reason,
        };

        let tokens: Vec<&str> = value
            .split(|c: char| !c.is_ascii_digit())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.len() != 3 {
            return Err(invalid(format!(
                "expected 3 numeric fields, found {}",
                tokens.len()
            )));
        }

        let mut numbers = [0i64; 3];
        for (slot, token) in numbers.iter_mut().zip(&tokens) {
            *slot = token
                .parse()
                .map_err(|e| invalid(format!("{:?} is not a coordinate: {}", token, e)))?;
        }
        let [chr, start, stop] = numbers;

        if stop < start {
            return Err(invalid(format!("stop {} precedes start {}", stop, start)));
        }

        Ok(Locus { chr, start, stop })
    }
}
