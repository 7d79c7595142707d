//! Delimited-file import.
//!
//! Columns are identified by header name (`time, open, high, low, close`,
//! optional `volume`). Each row is validated on its own: a row whose time or
//! OHLC cell does not parse is dropped without failing the import. Surviving
//! rows are sorted by time (input order is not trusted) and duplicate
//! timestamps keep their first occurrence.

use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, Trim};
use tracing::{debug, warn};

use super::timestamp::parse_timestamp;
use super::DataError;
use crate::domain::{Bar, BarSequence};

/// Volume used when the column is absent or the cell is unusable.
pub const DEFAULT_VOLUME: f64 = 0.0;

/// What happened to the rows of one import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub rows_read: usize,
    pub dropped_bad_time: usize,
    pub dropped_bad_price: usize,
    pub dropped_unreadable: usize,
    pub duplicates_removed: usize,
    pub volume_defaulted: usize,
    /// Rows kept even though their high/low envelope is inconsistent.
    pub malformed_kept: usize,
}

impl ImportReport {
    pub fn dropped(&self) -> usize {
        self.dropped_bad_time + self.dropped_bad_price + self.dropped_unreadable
    }
}

#[derive(Debug, Clone)]
pub struct Imported {
    pub bars: BarSequence,
    pub report: ImportReport,
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn locate(headers: &ByteRecord) -> Result<Self, DataError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name.as_bytes()))
        };
        let require = |name: &'static str| find(name).ok_or(DataError::MissingColumn(name));
        Ok(Self {
            time: require("time")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

/// Pick the delimiter from the header line: comma, semicolon or tab,
/// whichever occurs most (comma on a tie or when none occurs).
pub fn detect_delimiter(header_line: &str) -> u8 {
    let count = |c: char| header_line.matches(c).count();
    [(b';', count(';')), (b'\t', count('\t'))]
        .into_iter()
        .fold((b',', count(',')), |best, cand| if cand.1 > best.1 { cand } else { best })
        .0
}

/// A cell as text; cells that are not valid UTF-8 read as missing.
fn cell(record: &ByteRecord, index: usize) -> Option<&str> {
    record.get(index).and_then(|b| std::str::from_utf8(b).ok())
}

fn parse_price(cell: Option<&str>) -> Option<f64> {
    cell?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_volume(cell: Option<&str>) -> Option<f64> {
    parse_price(cell).filter(|v| *v >= 0.0)
}

/// Import bars from delimited text.
pub fn import_str(text: &str) -> Result<Imported, DataError> {
    import_bytes(text.as_bytes())
}

/// Import bars from raw file contents.
///
/// Decoding is per cell, so a row with bytes that are not UTF-8 is dropped
/// like any other unparseable row.
pub fn import_bytes(data: &[u8]) -> Result<Imported, DataError> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    let Some(header_line) = data
        .split(|&b| b == b'\n')
        .find(|l| !l.iter().all(u8::is_ascii_whitespace))
    else {
        return Err(DataError::EmptyDataset { rows_read: 0 });
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(detect_delimiter(&String::from_utf8_lossy(header_line)))
        .trim(Trim::All)
        .flexible(true)
        .from_reader(data);

    let columns = Columns::locate(reader.byte_headers()?)?;
    let mut report = ImportReport::default();
    let mut bars = Vec::new();

    for result in reader.byte_records() {
        report.rows_read += 1;
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                debug!(error = %err, "unreadable row dropped");
                report.dropped_unreadable += 1;
                continue;
            }
        };

        let Some(time) = cell(&record, columns.time).and_then(parse_timestamp) else {
            report.dropped_bad_time += 1;
            continue;
        };

        let prices = (
            parse_price(cell(&record, columns.open)),
            parse_price(cell(&record, columns.high)),
            parse_price(cell(&record, columns.low)),
            parse_price(cell(&record, columns.close)),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = prices else {
            report.dropped_bad_price += 1;
            continue;
        };

        let volume = match columns.volume.and_then(|i| parse_volume(cell(&record, i))) {
            Some(v) => v,
            None => {
                report.volume_defaulted += 1;
                DEFAULT_VOLUME
            }
        };

        let bar = Bar {
            time,
            open,
            high,
            low,
            close,
            volume,
        };
        if !bar.is_well_formed() {
            report.malformed_kept += 1;
        }
        bars.push(bar);
    }

    // Stable sort, so dedup keeps the first occurrence in input order.
    bars.sort_by_key(|b| b.time);
    let before = bars.len();
    bars.dedup_by_key(|b| b.time);
    report.duplicates_removed = before - bars.len();

    if bars.is_empty() {
        return Err(DataError::EmptyDataset {
            rows_read: report.rows_read,
        });
    }

    if report.dropped() > 0 || report.duplicates_removed > 0 || report.malformed_kept > 0 {
        warn!(
            rows = report.rows_read,
            dropped = report.dropped(),
            duplicates = report.duplicates_removed,
            malformed = report.malformed_kept,
            "import kept {} of {} rows",
            bars.len(),
            report.rows_read
        );
    }

    Ok(Imported {
        bars: BarSequence::new(bars)?,
        report,
    })
}

pub fn import_reader<R: Read>(mut reader: R) -> Result<Imported, DataError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    import_bytes(&data)
}

pub fn import_path(path: &Path) -> Result<Imported, DataError> {
    import_bytes(&std::fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_delimiters() {
        assert_eq!(detect_delimiter("time,open,high,low,close"), b',');
        assert_eq!(detect_delimiter("time;open;high;low;close"), b';');
        assert_eq!(detect_delimiter("time\topen\thigh\tlow\tclose"), b'\t');
        assert_eq!(detect_delimiter("time"), b',');
    }

    #[test]
    fn drops_rows_with_bad_open() {
        let csv = "time,open,high,low,close,volume\n\
                   2024-01-05,10,11,9,10.5,100\n\
                   2024-01-02,abc,11,9,10.5,100\n\
                   2024-01-03,10,11,9,10.5,100\n\
                   2024-01-04,,11,9,10.5,100\n\
                   2024-01-01,10,11,9,10.5,100\n";
        let imported = import_str(csv).unwrap();
        assert_eq!(imported.bars.len(), 3);
        assert_eq!(imported.report.dropped_bad_price, 2);
        let times: Vec<i64> = imported.bars.iter().map(|b| b.time).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }

    #[test]
    fn drops_rows_with_bad_time() {
        let csv = "time,open,high,low,close\nnot-a-date,1,2,0.5,1.5\n2024-01-01,1,2,0.5,1.5\n";
        let imported = import_str(csv).unwrap();
        assert_eq!(imported.bars.len(), 1);
        assert_eq!(imported.report.dropped_bad_time, 1);
    }

    #[test]
    fn volume_defaults_when_missing_or_bad() {
        let csv = "time,open,high,low,close,volume\n\
                   1704153600,1,2,0.5,1.5,\n\
                   1704240000,1,2,0.5,1.5,-5\n\
                   1704326400,1,2,0.5,1.5,oops\n\
                   1704412800,1,2,0.5,1.5,42\n";
        let imported = import_str(csv).unwrap();
        let volumes: Vec<f64> = imported.bars.iter().map(|b| b.volume).collect();
        assert_eq!(volumes, vec![DEFAULT_VOLUME, DEFAULT_VOLUME, DEFAULT_VOLUME, 42.0]);
        assert_eq!(imported.report.volume_defaulted, 3);
    }

    #[test]
    fn volume_column_is_optional() {
        let csv = "time,open,high,low,close\n2024-01-01,1,2,0.5,1.5\n";
        let imported = import_str(csv).unwrap();
        assert_eq!(imported.bars[0].volume, DEFAULT_VOLUME);
    }

    #[test]
    fn duplicate_times_keep_first() {
        let csv = "time,open,high,low,close\n\
                   2024-01-02,5,6,4,5\n\
                   2024-01-01,1,2,0.5,1.5\n\
                   2024-01-02,7,8,6,7\n";
        let imported = import_str(csv).unwrap();
        assert_eq!(imported.bars.len(), 2);
        assert_eq!(imported.bars[1].open, 5.0);
        assert_eq!(imported.report.duplicates_removed, 1);
    }

    #[test]
    fn headers_matched_case_insensitively_in_any_order() {
        let csv = "Close;Volume;Time;Low;High;Open\n1.5;10;2024-01-01;0.5;2;1\n";
        let imported = import_str(csv).unwrap();
        let bar = imported.bars[0];
        assert_eq!((bar.open, bar.high, bar.low, bar.close, bar.volume), (1.0, 2.0, 0.5, 1.5, 10.0));
    }

    #[test]
    fn malformed_envelope_is_tolerated() {
        let csv = "time,open,high,low,close\n2024-01-01,10,5,20,12\n";
        let imported = import_str(csv).unwrap();
        assert_eq!(imported.bars.len(), 1);
        assert_eq!(imported.report.malformed_kept, 1);
    }

    #[test]
    fn non_finite_prices_are_dropped() {
        let csv = "time,open,high,low,close\n2024-01-01,NaN,2,0.5,1.5\n2024-01-02,1,inf,0.5,1.5\n";
        assert!(matches!(
            import_str(csv),
            Err(DataError::EmptyDataset { rows_read: 2 })
        ));
    }

    #[test]
    fn empty_input_is_empty_dataset() {
        assert!(matches!(
            import_str(""),
            Err(DataError::EmptyDataset { rows_read: 0 })
        ));
        assert!(matches!(
            import_str("time,open,high,low,close\n"),
            Err(DataError::EmptyDataset { rows_read: 0 })
        ));
    }

    #[test]
    fn missing_required_column() {
        assert!(matches!(
            import_str("time,open,high,low\n2024-01-01,1,2,0.5\n"),
            Err(DataError::MissingColumn("close"))
        ));
    }

    #[test]
    fn invalid_utf8_cell_drops_only_its_row() {
        let mut data = b"time,open,high,low,close\n2024-01-01,1,2,0.5,1.5\n".to_vec();
        data.extend_from_slice(b"2024-01-02,\xff\xfe,2,0.5,1.5\n");
        data.extend_from_slice(b"\xff-01-03,1,2,0.5,1.5\n");
        data.extend_from_slice(b"2024-01-04,1,2,0.5,1.5\n");
        let imported = import_bytes(&data).unwrap();
        assert_eq!(imported.bars.len(), 2);
        assert_eq!(imported.report.dropped_bad_price, 1);
        assert_eq!(imported.report.dropped_bad_time, 1);
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let imported = import_bytes(b"\xEF\xBB\xBFtime;open;high;low;close\n2024-01-01;1;2;0.5;1.5\n").unwrap();
        assert_eq!(imported.bars.len(), 1);
    }

    #[test]
    fn short_rows_are_dropped_not_fatal() {
        let csv = "time,open,high,low,close\n2024-01-01,1,2\n2024-01-02,1,2,0.5,1.5\n";
        let imported = import_str(csv).unwrap();
        assert_eq!(imported.bars.len(), 1);
        assert_eq!(imported.report.dropped_bad_price, 1);
    }
}
