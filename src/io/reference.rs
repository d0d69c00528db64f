//! Reference dataset: known locations and transit-station coordinates.
//!
//! The dataset is a CSV with (at least) `address`, `block_no`, `latitude` and
//! `longitude` columns, one row per station-adjacent location. It is loaded
//! once at startup and never mutated afterwards, so the store can be shared by
//! reference (or behind an `Arc`) for the lifetime of the process.
//!
//! Loading rules:
//! - **Strict schema** for the required columns (`DataLoad` error)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic order**: stations keep file order, choice lists are sorted

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{GeoPoint, LocationRecord, TransitStationCoordinate};
use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 4] = ["address", "block_no", "latitude", "longitude"];

/// A row-level error encountered while loading.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Read-only store of reference locations.
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    records: Vec<LocationRecord>,
    stations: Vec<TransitStationCoordinate>,
    row_errors: Vec<RowError>,
    rows_read: usize,
}

impl ReferenceStore {
    /// Load the dataset from a CSV file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::data_load(format!(
                "Failed to open reference dataset '{}': {e}",
                path.display()
            ))
        })?;
        let store = Self::from_reader(file)?;

        tracing::info!(
            path = %path.display(),
            rows_read = store.rows_read,
            rows_used = store.records.len(),
            rows_skipped = store.row_errors.len(),
            "loaded reference dataset"
        );
        Ok(store)
    }

    /// Load the dataset from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AppError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| AppError::data_load(format!("Failed to read reference CSV headers: {e}")))?
            .clone();
        let header_map = build_header_map(&headers);

        for name in REQUIRED_COLUMNS {
            if !header_map.contains_key(name) {
                return Err(AppError::data_load(format!(
                    "Reference dataset is missing required column: `{name}`"
                )));
            }
        }

        let mut records = Vec::new();
        let mut row_errors = Vec::new();
        let mut rows_read = 0usize;

        for (idx, result) in reader.records().enumerate() {
            // Header is line 1.
            let line = idx + 2;
            rows_read += 1;

            let parsed = result
                .map_err(|e| format!("CSV parse error: {e}"))
                .and_then(|record| parse_row(&record, &header_map));

            match parsed {
                Ok(row) => records.push(row),
                Err(message) => {
                    tracing::warn!(line, %message, "skipping reference row");
                    row_errors.push(RowError { line, message });
                }
            }
        }

        if records.is_empty() {
            return Err(AppError::data_load(format!(
                "Reference dataset has no valid rows ({rows_read} read, {} rejected).",
                row_errors.len()
            )));
        }

        let stations = records.iter().map(LocationRecord::point).collect();

        Ok(Self {
            records,
            stations,
            row_errors,
            rows_read,
        })
    }

    /// Build a store from rows that are already validated.
    pub fn from_records(records: Vec<LocationRecord>) -> Result<Self, AppError> {
        if records.is_empty() {
            return Err(AppError::data_load("Reference dataset has no rows."));
        }
        let stations = records.iter().map(LocationRecord::point).collect();
        Ok(Self {
            rows_read: records.len(),
            records,
            stations,
            row_errors: Vec::new(),
        })
    }

    /// Distinct street addresses, sorted.
    pub fn list_unique_addresses(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.address.clone()).collect()
    }

    /// Distinct block numbers, sorted.
    pub fn list_unique_blocks(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.block.clone()).collect()
    }

    /// One coordinate per reference row, in file order.
    pub fn all_transit_station_coordinates(&self) -> &[TransitStationCoordinate] {
        &self.stations
    }

    pub fn records(&self) -> &[LocationRecord] {
        &self.records
    }

    /// Look up a `(block, address)` pair, ignoring case and repeated spaces.
    pub fn find(&self, block: &str, address: &str) -> Option<&LocationRecord> {
        let block = normalize_key(block);
        let address = normalize_key(address);
        self.records
            .iter()
            .find(|r| normalize_key(&r.block) == block && normalize_key(&r.address) == address)
    }

    pub fn row_errors(&self) -> &[RowError] {
        &self.row_errors
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }
}

/// Uppercase and collapse internal whitespace.
pub fn normalize_key(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_ascii_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<LocationRecord, String> {
    let address = get_required(record, header_map, "address")?.to_string();
    let block = get_required(record, header_map, "block_no")?.to_string();
    let latitude = parse_f64(get_required(record, header_map, "latitude")?, "latitude")?;
    let longitude = parse_f64(get_required(record, header_map, "longitude")?, "longitude")?;

    if !GeoPoint::new(latitude, longitude).is_valid() {
        return Err(format!("Coordinate out of range: ({latitude}, {longitude})"));
    }

    Ok(LocationRecord {
        address,
        block,
        latitude,
        longitude,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{name}` value '{s}'"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite `{name}` value '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::ErrorKind;

    const SAMPLE: &str = "\
town,address,block_no,latitude,longitude
ANG MO KIO,ANG MO KIO AVE 10,406,1.3624,103.8536
ANG MO KIO,ANG MO KIO AVE 4,108,1.3704,103.8378
BEDOK,BEDOK NORTH RD,216,1.3273,103.9361
BEDOK,BEDOK NORTH RD,217,1.3276,103.9365
";

    #[test]
    fn loads_rows_and_unique_choices() {
        let store = ReferenceStore::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(store.records().len(), 4);
        assert_eq!(store.all_transit_station_coordinates().len(), 4);

        let addresses: Vec<_> = store.list_unique_addresses().into_iter().collect();
        assert_eq!(addresses, vec!["ANG MO KIO AVE 10", "ANG MO KIO AVE 4", "BEDOK NORTH RD"]);
        assert_eq!(store.list_unique_blocks().len(), 4);

        let first = store.all_transit_station_coordinates()[0];
        assert_eq!(first, GeoPoint::new(1.3624, 103.8536));
    }

    #[test]
    fn accepts_bom_and_mixed_case_headers() {
        let csv = "\u{feff}Address,BLOCK_NO,Latitude,Longitude\nYISHUN RING RD,123,1.43,103.83\n";
        let store = ReferenceStore::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(store.records()[0].block, "123");
    }

    #[test]
    fn missing_column_is_a_data_load_error() {
        let csv = "address,latitude,longitude\nFOO RD,1.3,103.8\n";
        let err = ReferenceStore::from_reader(csv.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataLoad);
        assert!(err.message().contains("block_no"));
    }

    #[test]
    fn bad_rows_are_skipped_and_reported() {
        let csv = "address,block_no,latitude,longitude\n\
                   FOO RD,1,abc,103.8\n\
                   BAR RD,2,1.30,103.80\n\
                   BAZ RD,3,95.0,103.80\n";
        let store = ReferenceStore::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.rows_read(), 3);
        let lines: Vec<_> = store.row_errors().iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn no_valid_rows_is_fatal() {
        let csv = "address,block_no,latitude,longitude\nFOO RD,1,,\n";
        let err = ReferenceStore::from_reader(csv.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataLoad);
    }

    #[test]
    fn load_reads_from_disk_and_reports_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let store = ReferenceStore::load(file.path()).unwrap();
        assert_eq!(store.records().len(), 4);

        let err = ReferenceStore::load(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataLoad);
    }

    #[test]
    fn find_ignores_case_and_spacing() {
        let store = ReferenceStore::from_reader(SAMPLE.as_bytes()).unwrap();
        let hit = store.find("216", "bedok  north rd").unwrap();
        assert_eq!(hit.latitude, 1.3273);
        assert!(store.find("999", "BEDOK NORTH RD").is_none());
    }
}
