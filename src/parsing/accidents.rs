use crate::types::records::{AccidentRecord, Coordinate};
use crate::types::weekday::AccidentWeekday;
use crate::utils::{clean_cell, parse_decimal};
use log::debug;
use std::collections::HashMap;

/// Column names of the accident atlas export.
pub mod columns {
    pub const MONTH: &str = "UMONAT";
    pub const WEEKDAY: &str = "UWOCHENTAG";
    pub const LONGITUDE: &str = "XGCSWGS84";
    pub const LATITUDE: &str = "YGCSWGS84";
    pub const BICYCLE: &str = "IstRad";
    pub const STATE: &str = "ULAND";
}

/// Parses a semicolon separated accident export.
///
/// The first row names the columns; names are trimmed and stripped of quote characters.
/// Every following row is matched against those names, so the column order and the
/// presence of optional columns may differ between source years. A row is kept when
/// `UMONAT` holds a month (`1..=12`) and `UWOCHENTAG` a weekday code (`1..=7`); rows
/// failing that are dropped. Coordinates are optional: `XGCSWGS84`/`YGCSWGS84` may use
/// a decimal comma and trailing carriage returns, and a row whose coordinates do not
/// parse is kept with `location: None`.
///
/// # Examples
///
/// ```
/// use velostat::parse_accident_csv;
///
/// let text = "\"UMONAT\";\"UWOCHENTAG\";\"XGCSWGS84\";\"YGCSWGS84\"\n\
///             3;2;7,6254;51,9601\n\
///             4;7;;\n";
/// let accidents = parse_accident_csv(text);
/// assert_eq!(accidents.len(), 2);
/// assert!(accidents[0].location.is_some());
/// assert!(accidents[1].location.is_none());
/// ```
pub fn parse_accident_csv(text: &str) -> Vec<AccidentRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b';')
        .from_reader(text.as_bytes());
    let mut rows = reader.records();

    let header: Vec<String> = match rows.next() {
        Some(Ok(header)) => header.iter().map(clean_header).collect(),
        _ => return Vec::new(),
    };

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for row in rows {
        let Ok(row) = row else {
            dropped += 1;
            continue;
        };
        let fields: HashMap<&str, &str> = header
            .iter()
            .map(String::as_str)
            .zip(row.iter())
            .collect();
        match accident_from_fields(&fields) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("Dropped {} malformed accident rows", dropped);
    }
    records
}

fn clean_header(raw: &str) -> String {
    raw.trim().trim_start_matches('\u{feff}').replace('"', "")
}

fn accident_from_fields(fields: &HashMap<&str, &str>) -> Option<AccidentRecord> {
    let month = fields
        .get(columns::MONTH)
        .and_then(|raw| clean_cell(raw).parse::<u32>().ok())
        .filter(|month| (1..=12).contains(month))?;
    let weekday = fields
        .get(columns::WEEKDAY)
        .and_then(|raw| clean_cell(raw).parse::<u8>().ok())
        .and_then(AccidentWeekday::from_code)?;

    let longitude = fields.get(columns::LONGITUDE).and_then(|raw| parse_decimal(raw));
    let latitude = fields.get(columns::LATITUDE).and_then(|raw| parse_decimal(raw));
    let location = match (longitude, latitude) {
        (Some(longitude), Some(latitude)) => Some(Coordinate::new(longitude, latitude)),
        _ => None,
    };

    let is_bicycle = fields
        .get(columns::BICYCLE)
        .and_then(|raw| clean_cell(raw).parse::<u8>().ok())
        .map(|flag| flag == 1);
    let state_code = fields
        .get(columns::STATE)
        .map(|raw| clean_cell(raw).to_string())
        .filter(|code| !code.is_empty());

    Some(AccidentRecord {
        month,
        weekday,
        location,
        is_bicycle,
        state_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "OBJECTID;ULAND;UMONAT;UWOCHENTAG;IstRad;XGCSWGS84;YGCSWGS84";

    #[test]
    fn test_fields_are_matched_by_name() {
        let text = format!("{HEADER}\n1;05;11;3;1;7,60100;51,90100\r\n");
        let accidents = parse_accident_csv(&text);
        assert_eq!(accidents.len(), 1);
        let accident = &accidents[0];
        assert_eq!(accident.month, 11);
        assert_eq!(accident.weekday, AccidentWeekday::TUESDAY);
        assert_eq!(accident.is_bicycle, Some(true));
        assert_eq!(accident.state_code.as_deref(), Some("05"));
        let location = accident.location.unwrap();
        assert!((location.longitude - 7.601).abs() < 1e-9);
        assert!((location.latitude - 51.901).abs() < 1e-9);
    }

    #[test]
    fn test_column_order_may_change_between_years() {
        let text = "\"YGCSWGS84\";\"UWOCHENTAG\";\"XGCSWGS84\";\"UMONAT\"\n51,9;1;7,6;12\n";
        let accidents = parse_accident_csv(text);
        assert_eq!(accidents.len(), 1);
        assert_eq!(accidents[0].month, 12);
        assert_eq!(accidents[0].weekday, AccidentWeekday::SUNDAY);
        assert_eq!(accidents[0].location, Some(Coordinate::new(7.6, 51.9)));
        assert_eq!(accidents[0].is_bicycle, None);
        assert_eq!(accidents[0].state_code, None);
    }

    #[test]
    fn test_bad_coordinates_keep_the_record() {
        let text = format!("{HEADER}\n1;05;1;2;1;abc;51,9\n2;05;1;2;1;7,6\n");
        let accidents = parse_accident_csv(&text);
        assert_eq!(accidents.len(), 2);
        assert!(accidents.iter().all(|a| a.location.is_none()));
    }

    #[test]
    fn test_rows_without_month_or_weekday_are_dropped() {
        let text = format!("{HEADER}\n1;05;13;2;1;7,6;51,9\n2;05;1;0;1;7,6;51,9\n3;05;;;1;7,6;51,9\n");
        assert!(parse_accident_csv(&text).is_empty());
    }

    #[test]
    fn test_empty_text() {
        assert!(parse_accident_csv("").is_empty());
        assert!(parse_accident_csv(HEADER).is_empty());
    }
}
