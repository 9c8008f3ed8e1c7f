// Turns the airports.dat CSV (OpenFlights layout) into a GeoJSON feature collection.
// Rows that can't be parsed are skipped, only a failing reader aborts the load.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use tracing::debug;

use crate::error::{io_error_with_path, AppError};

pub const AIRPORTS_FILE: &str = "airports.dat";

const NAME_COLUMN: usize = 1;
const IATA_COLUMN: usize = 4;
const LATITUDE_COLUMN: usize = 6;
const LONGITUDE_COLUMN: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct AirportRecord {
    pub name: String,
    pub iata_code: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    TooFewColumns(usize),
    InvalidLatitude(String),
    InvalidLongitude(String),
    Undecodable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SkipReason::TooFewColumns(n) => write!(f, "only {} columns", n),
            SkipReason::InvalidLatitude(raw) => write!(f, "latitude '{}' is not a number", raw),
            SkipReason::InvalidLongitude(raw) => write!(f, "longitude '{}' is not a number", raw),
            SkipReason::Undecodable(msg) => write!(f, "undecodable row: {}", msg),
        }
    }
}

/// Outcome of parsing one CSV row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowParse {
    Parsed(AirportRecord),
    Skipped(SkipReason),
}

/// Feature collection plus the number of rows that were dropped on the way.
#[derive(Debug)]
pub struct LoadReport {
    pub collection: FeatureCollection,
    pub skipped: usize,
}

impl AirportRecord {
    pub fn into_feature(self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("name".to_string(), self.name.into());
        properties.insert("iataCode".to_string(), self.iata_code.into());

        Feature {
            bbox: None,
            // [latitude, longitude], the order the map page reads back
            geometry: Some(Geometry::new(Value::Point(vec![self.latitude, self.longitude]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

pub fn parse_row(record: &StringRecord) -> RowParse {
    if record.len() <= LONGITUDE_COLUMN {
        return RowParse::Skipped(SkipReason::TooFewColumns(record.len()));
    }

    // Indexes are in range after the length check above.
    let field = |i: usize| record.get(i).unwrap_or_default();

    let latitude = match parse_coordinate(field(LATITUDE_COLUMN)) {
        Some(v) => v,
        None => return RowParse::Skipped(SkipReason::InvalidLatitude(field(LATITUDE_COLUMN).to_string())),
    };
    let longitude = match parse_coordinate(field(LONGITUDE_COLUMN)) {
        Some(v) => v,
        None => return RowParse::Skipped(SkipReason::InvalidLongitude(field(LONGITUDE_COLUMN).to_string())),
    };

    RowParse::Parsed(AirportRecord {
        name: field(NAME_COLUMN).to_string(),
        iata_code: field(IATA_COLUMN).to_string(),
        latitude,
        longitude,
    })
}

// Finite values only, no range check.
fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn load_report<R: Read>(source: R) -> Result<LoadReport, AppError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    let mut features = Vec::new();
    let mut skipped = 0;
    for (index, result) in rdr.records().enumerate() {
        let outcome = match result {
            Ok(record) => parse_row(&record),
            Err(err) => match err.into_kind() {
                csv::ErrorKind::Io(io_err) => return Err(AppError::Io(io_err, None)),
                kind => RowParse::Skipped(SkipReason::Undecodable(format!("{:?}", kind))),
            },
        };

        match outcome {
            RowParse::Parsed(airport) => features.push(airport.into_feature()),
            RowParse::Skipped(reason) => {
                debug!(row = index + 1, %reason, "skipping airport row");
                skipped += 1;
            }
        }
    }

    Ok(LoadReport {
        collection: FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
        skipped,
    })
}

#[allow(dead_code)]
pub fn load<R: Read>(source: R) -> Result<FeatureCollection, AppError> {
    load_report(source).map(|report| report.collection)
}

pub fn load_file(path: &Path) -> Result<FeatureCollection, AppError> {
    let file = File::open(path).map_err(|e| io_error_with_path(e, path))?;
    let report = load_report(file).map_err(|e| match e {
        AppError::Io(err, None) => io_error_with_path(err, path),
        other => other,
    })?;
    debug!(
        path = %path.display(),
        features = report.collection.features.len(),
        skipped = report.skipped,
        "loaded airports"
    );
    Ok(report.collection)
}
