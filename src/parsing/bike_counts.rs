use crate::types::records::BikeCountRecord;
use chrono::NaiveDateTime;
use log::debug;
use std::sync::Arc;

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parses a bike count export into records for `station_id`.
///
/// The text is comma separated and its first line is a header, which is always discarded,
/// even when it is blank.
/// Of every following row, field 0 is the timestamp (`YYYY-MM-DD HH:MM[:SS]`) and
/// field 1 the count. Rows with fewer than two fields, an unparsable timestamp or a
/// count that is not a non-negative integer are dropped. The order of the input is kept.
///
/// # Examples
///
/// ```
/// use velostat::parse_bike_count_csv;
///
/// let text = "Datetime,Count\n2019-01-07 08:00:00,42\n2019-01-07 08:15:00,n/a\n";
/// let records = parse_bike_count_csv("100020113", text);
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].count, 42);
/// assert_eq!(&*records[0].station_id, "100020113");
/// ```
pub fn parse_bike_count_csv(station_id: &str, text: &str) -> Vec<BikeCountRecord> {
    let station_id: Arc<str> = Arc::from(station_id);
    // The reader skips blank lines, so the header is cut off by line rather than by record.
    let body = text.split_once('\n').map_or("", |(_, rest)| rest);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b',')
        .from_reader(body.as_bytes());

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for row in reader.records() {
        let Ok(row) = row else {
            dropped += 1;
            continue;
        };
        let (Some(raw_timestamp), Some(raw_count)) = (row.get(0), row.get(1)) else {
            dropped += 1;
            continue;
        };
        let Some(timestamp) = parse_timestamp(raw_timestamp) else {
            dropped += 1;
            continue;
        };
        let Ok(count) = raw_count.trim().parse::<u64>() else {
            dropped += 1;
            continue;
        };
        records.push(BikeCountRecord {
            station_id: Arc::clone(&station_id),
            timestamp,
            count,
        });
    }

    if dropped > 0 {
        debug!(
            "Dropped {} malformed bike count rows for station {}",
            dropped, station_id
        );
    }
    records
}

/// Parses a local civil timestamp, with or without seconds.
pub(crate) fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}
