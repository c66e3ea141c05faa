//! # Candidate List Interchange
//!
//! Saves and reloads candidate lists as header-less CSV so a review can be
//! continued in a later session. Each row holds
//! `score, idA, idB, handleA, handleB, nameA, nameB`.

use crate::candidates::{Candidate, CandidateMap, CandidatePair};
use crate::config::{InterchangeConfig, CANDIDATE_COLUMNS, SCORE_DECIMALS};
use crate::display::display_name;
use crate::model::PersonHandle;
use crate::store::GenealogyStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Field separator of a candidate file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
}

impl Delimiter {
    pub fn byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
        }
    }
}

impl FromStr for Delimiter {
    type Err = InterchangeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "comma" | "," => Ok(Delimiter::Comma),
            "semicolon" | ";" => Ok(Delimiter::Semicolon),
            other => Err(InterchangeError::UnknownDelimiter(other.to_string())),
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Comma => f.write_str("comma"),
            Delimiter::Semicolon => f.write_str("semicolon"),
        }
    }
}

/// Character encoding of a candidate file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "iso-8859-1")]
    Latin1,
}

impl FromStr for Encoding {
    type Err = InterchangeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(Encoding::Latin1),
            _ => Err(InterchangeError::UnknownEncoding(value.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => f.write_str("utf-8"),
            Encoding::Latin1 => f.write_str("iso-8859-1"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InterchangeError {
    #[error("character {ch:?} on row {row} cannot be encoded as ISO-8859-1")]
    Unencodable { ch: char, row: usize },
    #[error("candidate file is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("unknown delimiter {0:?} (expected comma or semicolon)")]
    UnknownDelimiter(String),
    #[error("unknown encoding {0:?} (expected utf-8 or iso-8859-1)")]
    UnknownEncoding(String),
}

/// Write candidate pairs, one row each, in the given order. Pairs naming
/// people missing from the store are skipped. Returns the rows written.
pub fn write_candidates<W: Write>(
    mut out: W,
    store: &dyn GenealogyStore,
    pairs: &[CandidatePair],
    format: InterchangeConfig,
) -> Result<usize> {
    let mut buffer = Vec::new();
    let mut written = 0;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(format.delimiter.byte())
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(&mut buffer);
        for pair in pairs {
            let (Some(first), Some(second)) = (store.person(&pair.first), store.person(&pair.second))
            else {
                warn!(first = %pair.first, second = %pair.second, "skipping pair with unknown person");
                continue;
            };
            writer.write_record([
                format!("{:.*}", SCORE_DECIMALS, pair.score),
                first.id.clone(),
                second.id.clone(),
                first.handle.to_string(),
                second.handle.to_string(),
                display_name(&first.primary_name),
                display_name(&second.primary_name),
            ])?;
            written += 1;
        }
        writer.flush()?;
    }

    let bytes = match format.encoding {
        Encoding::Utf8 => buffer,
        Encoding::Latin1 => encode_latin1(&String::from_utf8(buffer)?)?,
    };
    out.write_all(&bytes)?;
    Ok(written)
}

/// Read a candidate list. Blank and malformed rows, and rows naming people
/// unknown to the store, are skipped.
pub fn read_candidates<R: Read>(
    mut input: R,
    store: &dyn GenealogyStore,
    format: InterchangeConfig,
) -> Result<CandidateMap> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    let text = match format.encoding {
        Encoding::Utf8 => String::from_utf8(bytes).map_err(InterchangeError::from)?,
        Encoding::Latin1 => decode_latin1(&bytes),
    };
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(format.delimiter.byte())
        .from_reader(text.as_bytes());

    let mut map = CandidateMap::new();
    let mut skipped = 0usize;
    for (row, record) in reader.records().enumerate() {
        let row = row + 1;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!(row, error = %err, "skipping unreadable row");
                skipped += 1;
                continue;
            }
        };
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if record.len() != CANDIDATE_COLUMNS {
            warn!(row, columns = record.len(), "skipping row with wrong column count");
            skipped += 1;
            continue;
        }
        let Ok(score) = record[0].trim().parse::<f64>() else {
            warn!(row, score = &record[0], "skipping row with invalid score");
            skipped += 1;
            continue;
        };
        let first = PersonHandle::from(&record[3]);
        let second = PersonHandle::from(&record[4]);
        if !store.has_person(&first) || !store.has_person(&second) {
            debug!(row, first = %first, second = %second, "skipping row with unknown person");
            skipped += 1;
            continue;
        }
        map.insert(
            first,
            Candidate {
                handle: second,
                score,
            },
        );
    }
    info!(candidates = map.len(), skipped, "candidate list read");
    Ok(map)
}

pub fn save_candidates(
    path: impl AsRef<Path>,
    store: &dyn GenealogyStore,
    pairs: &[CandidatePair],
    format: InterchangeConfig,
) -> Result<usize> {
    let path = path.as_ref();
    let file = fs::File::create(path)
        .with_context(|| format!("creating candidate file {}", path.display()))?;
    write_candidates(std::io::BufWriter::new(file), store, pairs, format)
        .with_context(|| format!("writing candidate file {}", path.display()))
}

pub fn load_candidates(
    path: impl AsRef<Path>,
    store: &dyn GenealogyStore,
    format: InterchangeConfig,
) -> Result<CandidateMap> {
    let path = path.as_ref();
    let file = fs::File::open(path)
        .with_context(|| format!("opening candidate file {}", path.display()))?;
    read_candidates(file, store, format)
        .with_context(|| format!("reading candidate file {}", path.display()))
}

fn encode_latin1(text: &str) -> Result<Vec<u8>, InterchangeError> {
    let mut bytes = Vec::with_capacity(text.len());
    let mut row = 1;
    for ch in text.chars() {
        let byte = u8::try_from(u32::from(ch)).map_err(|_| InterchangeError::Unencodable { ch, row })?;
        if ch == '\n' {
            row += 1;
        }
        bytes.push(byte);
    }
    Ok(bytes)
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Gender;
    use crate::store::FamilyTree;
    use crate::test_support::TreeBuilder;

    fn tree() -> FamilyTree {
        TreeBuilder::new()
            .person("h1", Gender::Male, "Müller", "Jörg")
            .person("h2", Gender::Male, "Muller", "Jorg")
            .person("h3", Gender::Female, "Smith", "Mary")
            .person("h4", Gender::Female, "Smith", "Maria")
            .build()
    }

    fn pair(first: &str, second: &str, score: f64) -> CandidatePair {
        CandidatePair {
            first: PersonHandle::from(first),
            second: PersonHandle::from(second),
            score,
        }
    }

    #[test]
    fn test_write_rows() {
        let tree = tree();
        let mut out = Vec::new();
        let written = write_candidates(
            &mut out,
            &tree,
            &[pair("h1", "h2", 2.756), pair("h3", "missing", 1.0)],
            InterchangeConfig::default(),
        )
        .unwrap();
        assert_eq!(written, 1);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "2.76,h1,h2,h1,h2,\"Müller, Jörg\",\"Muller, Jorg\"\n");
    }

    #[test]
    fn test_latin1_semicolon_round_trip() {
        let tree = tree();
        let format = InterchangeConfig {
            delimiter: Delimiter::Semicolon,
            encoding: Encoding::Latin1,
        };
        let mut out = Vec::new();
        write_candidates(
            &mut out,
            &tree,
            &[pair("h1", "h2", 3.0), pair("h3", "h4", 1.25)],
            format,
        )
        .unwrap();
        assert!(out.contains(&0xFC)); // ü
        assert!(String::from_utf8(out.clone()).is_err());

        let map = read_candidates(out.as_slice(), &tree, format).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&PersonHandle::from("h3")].handle, PersonHandle::from("h4"));
        assert_eq!(map[&PersonHandle::from("h3")].score, 1.25);
    }

    #[test]
    fn test_latin1_rejects_unencodable_names() {
        let tree = TreeBuilder::new()
            .person("a", Gender::Male, "Иванов", "Иван")
            .person("b", Gender::Male, "Иванов", "Иван")
            .build();
        let format = InterchangeConfig {
            encoding: Encoding::Latin1,
            ..Default::default()
        };
        let err = write_candidates(Vec::new(), &tree, &[pair("a", "b", 1.0)], format).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InterchangeError>(),
            Some(InterchangeError::Unencodable { row: 1, .. })
        ));
    }

    #[test]
    fn test_reader_skips_bad_rows() {
        let tree = tree();
        let input = "\
1.50,I1,I2,h1,h2,a,b

not-a-number,I3,I4,h3,h4,c,d
1.0,too,few
2.0,I3,I9,h3,gone,c,z
0.75,I3,I4,h3,h4,c,d
";
        let map = read_candidates(input.as_bytes(), &tree, InterchangeConfig::default()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&PersonHandle::from("h1")].score, 1.5);
        assert_eq!(map[&PersonHandle::from("h3")].score, 0.75);
    }

    #[test]
    fn test_reader_rejects_invalid_utf8() {
        let tree = tree();
        let err = read_candidates(&[0xFFu8, 0xFE][..], &tree, InterchangeConfig::default()).unwrap_err();
        assert!(err.downcast_ref::<InterchangeError>().is_some());
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!("semicolon".parse::<Delimiter>().unwrap(), Delimiter::Semicolon);
        assert_eq!(";".parse::<Delimiter>().unwrap(), Delimiter::Semicolon);
        assert_eq!("ISO8859-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert!("tab".parse::<Delimiter>().is_err());
        assert_eq!(Encoding::Latin1.to_string(), "iso-8859-1");
    }
}
