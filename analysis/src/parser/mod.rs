//! Storm events CSV loader with encoding and delimiter auto-detection.
//!
//! The NOAA export is large, mostly ASCII, with Latin-1 bytes in the free-text
//! remarks. Encoding is detected on a leading sample, the whole file is decoded
//! once, then rows are deserialized into [`RawEvent`].

use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::models::{RawEvent, REQUIRED_COLUMNS};

/// Bytes examined by the encoding detector.
const ENCODING_SAMPLE_BYTES: usize = 64 * 1024;

/// Loaded storm events with file metadata
#[derive(Debug, Clone)]
pub struct StormData {
    /// Parsed events, in file order
    pub events: Vec<RawEvent>,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
    /// Column headers
    pub headers: Vec<String>,
}

/// Fail early with the expected location when an input file is absent.
pub fn ensure_exists(path: &Path) -> LoadResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(LoadError::MissingInput(path.to_path_buf()))
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let sample = &bytes[..bytes.len().min(ENCODING_SAMPLE_BYTES)];
    let result = chardet::detect(sample);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// A "UTF-8" sample may still be followed by Latin-1 bytes further down the
/// file, so invalid UTF-8 falls back to windows-1252.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        _ => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        },
    }
}

/// Detect the delimiter by counting occurrences in the header line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Load the storm events file.
///
/// # Example
/// ```ignore
/// let data = load_storm_data("data/repdata_data_StormData.csv")?;
/// println!("{} events, encoding {}", data.events.len(), data.encoding);
/// ```
pub fn load_storm_data<P: AsRef<Path>>(path: P) -> LoadResult<StormData> {
    let path = path.as_ref();
    ensure_exists(path)?;
    let bytes = std::fs::read(path)?;
    parse_storm_bytes(&bytes)
}

/// Parse storm events from raw bytes with auto-detection.
pub fn parse_storm_bytes(bytes: &[u8]) -> LoadResult<StormData> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(LoadError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);

    parse_storm_str(&content, delimiter, encoding)
}

/// Parse storm events from decoded text with an explicit delimiter.
pub fn parse_storm_str(content: &str, delimiter: char, encoding: String) -> LoadResult<StormData> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .trim(csv::Trim::None)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::EmptyFile);
    }

    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|col| !headers.iter().any(|h| h == *col))
    {
        return Err(LoadError::MissingColumn(missing.to_string()));
    }

    // Header names are matched after trimming
    reader.set_headers(csv::StringRecord::from(headers.clone()));

    let mut events = Vec::new();
    for row in reader.deserialize::<RawEvent>() {
        events.push(row?);
    }

    Ok(StormData {
        events,
        encoding,
        delimiter,
        headers,
    })
}

/// Parse a NOAA timestamp (`4/18/1950 0:00:00`).
///
/// Date-only and ISO forms are accepted too. Blank input yields `None`.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    NaiveDateTime::parse_from_str(value, "%m/%d/%Y %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%m/%d/%Y")
                .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use std::io::Write;

    const HEADER: &str =
        "STATE__,BGN_DATE,STATE,EVTYPE,END_DATE,FATALITIES,INJURIES,PROPDMG,PROPDMGEXP,CROPDMG,CROPDMGEXP,REMARKS,REFNUM";

    #[test]
    fn test_parse_noaa_rows() {
        let csv = format!(
            "{}\n\
             1.00,4/18/1950 0:00:00,AL,TORNADO,,0.00,15.00,25.00,K,0.00,,,1.00\n\
             1.00,4/18/1950 0:00:00,AL,TORNADO,,0.00,0.00,2.50,K,0.00,,,2.00\n",
            HEADER
        );
        let data = parse_storm_bytes(csv.as_bytes()).unwrap();

        assert_eq!(data.delimiter, ',');
        assert_eq!(data.events.len(), 2);
        assert_eq!(data.events[0].refnum, 1);
        assert_eq!(data.events[0].injuries, 15.0);
        assert_eq!(data.events[0].property_exponent, "K");
        assert_eq!(data.events[1].property_magnitude, 2.5);
    }

    #[test]
    fn test_quoted_remarks_with_commas_and_newlines() {
        let csv = format!(
            "{}\n\
             1.00,1/5/1996 0:00:00,TX,\"FLASH FLOOD\",1/6/1996 0:00:00,1.00,0.00,0.00,,0.00,,\"Heavy rain, then\nflooding\",9.00\n",
            HEADER
        );
        let data = parse_storm_bytes(csv.as_bytes()).unwrap();

        assert_eq!(data.events.len(), 1);
        assert_eq!(data.events[0].evtype, "FLASH FLOOD");
        assert_eq!(data.events[0].refnum, 9);
    }

    #[test]
    fn test_event_type_whitespace_preserved() {
        let csv = format!(
            "{}\n1.00,4/18/1950 0:00:00,AL,\" tornado \",,0,0,0,,0,,,1\n",
            HEADER
        );
        let data = parse_storm_bytes(csv.as_bytes()).unwrap();
        assert_eq!(data.events[0].evtype, " tornado ");
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "REFNUM,EVTYPE,BGN_DATE\n1,TORNADO,4/18/1950 0:00:00\n";
        let err = parse_storm_bytes(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "FATALITIES"));
    }

    #[test]
    fn test_empty_file_error() {
        let err = parse_storm_bytes(b"  \n").unwrap_err();
        assert!(matches!(err, LoadError::EmptyFile));
    }

    #[test]
    fn test_missing_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_storm_data(dir.path().join("StormData.csv")).unwrap_err();
        assert!(matches!(err, LoadError::MissingInput(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("StormData.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(file, "1.00,4/18/1950 0:00:00,AL,HAIL,,0,0,0,,0,,,3").unwrap();
        drop(file);

        let data = load_storm_data(&path).unwrap();
        assert_eq!(data.events.len(), 1);
        assert_eq!(data.headers.len(), 13);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_invalid_utf8_falls_back() {
        let bytes: &[u8] = &[0x61, 0xE9, 0x62];
        let decoded = decode_content(bytes, "utf-8");
        assert_eq!(decoded, "aéb");
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let ts = parse_timestamp("4/18/1950 0:00:00").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (1950, 4, 18));

        let ts = parse_timestamp("11/30/2011 14:05:00").unwrap();
        assert_eq!(ts.year(), 2011);

        assert!(parse_timestamp("1996-01-06").is_some());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
