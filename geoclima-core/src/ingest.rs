//! Turns a raw table into a catalog: resolves the column schema, normalizes
//! coordinates and drops rows that cannot be placed on a map.

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::IngestError;
use crate::model::LocationRecord;
use crate::normalize::{self, CoordinateError};
use crate::source::{Cell, RawTable, RowSource};

pub const COL_NAME: &str = "Nombre de SS.EE.";
pub const COL_LEVEL: &str = "Nivel / Modalidad";
pub const COL_ADDRESS: &str = "Dirección";
pub const COL_DEPARTMENT: &str = "Departamento";
pub const COL_PROVINCE: &str = "Provincia";
pub const COL_DISTRICT: &str = "Distrito";
pub const COL_MODULAR_CODE: &str = "Código Modular";
pub const COL_CENTER_CODE: &str = "Código Centro Poblado";
pub const COL_CENTER_NAME: &str = "Centro Poblado";
pub const COL_LATITUDE: &str = "Latitud";
pub const COL_LONGITUDE: &str = "Longitud";

/// Column positions resolved from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: usize,
    level: usize,
    address: usize,
    department: usize,
    province: usize,
    district: usize,
    modular_code: usize,
    center_code: usize,
    center_name: Option<usize>,
    latitude: usize,
    longitude: usize,
}

impl Schema {
    pub fn resolve(headers: &[String]) -> Result<Self, IngestError> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim().to_lowercase() == wanted.to_lowercase())
        };
        let require = |wanted: &'static str| find(wanted).ok_or(IngestError::MissingColumn(wanted));

        Ok(Self {
            name: require(COL_NAME)?,
            level: require(COL_LEVEL)?,
            address: require(COL_ADDRESS)?,
            department: require(COL_DEPARTMENT)?,
            province: require(COL_PROVINCE)?,
            district: require(COL_DISTRICT)?,
            modular_code: require(COL_MODULAR_CODE)?,
            center_code: require(COL_CENTER_CODE)?,
            center_name: find(COL_CENTER_NAME),
            latitude: require(COL_LATITUDE)?,
            longitude: require(COL_LONGITUDE)?,
        })
    }

    fn record(&self, row: &[Cell]) -> Result<LocationRecord, CoordinateError> {
        let cell = |idx: usize| row.get(idx).unwrap_or(&Cell::Empty);
        let text = |idx: usize| cell(idx).as_text().unwrap_or_default();

        let coordinates = normalize::normalize_pair(cell(self.latitude), cell(self.longitude))?;

        Ok(LocationRecord {
            name: text(self.name),
            modular_code: text(self.modular_code),
            level: text(self.level),
            address: text(self.address),
            department: text(self.department),
            province: text(self.province),
            district: text(self.district),
            populated_center_code: normalize::populated_center_code(cell(self.center_code)),
            populated_center: self.center_name.and_then(|idx| cell(idx).as_text()),
            coordinates,
        })
    }
}

/// A row left out of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRow {
    /// 1-based data row number, header excluded.
    pub row: usize,
    pub reason: String,
}

/// Accounting for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub dropped: Vec<DroppedRow>,
}

/// Build a catalog from an already-loaded table.
pub fn ingest_table(table: &RawTable) -> Result<(Catalog, IngestReport), IngestError> {
    let schema = Schema::resolve(&table.headers)?;

    let mut records = Vec::with_capacity(table.rows.len());
    let mut report = IngestReport {
        rows_read: table.rows.len(),
        ..Default::default()
    };

    for (idx, row) in table.rows.iter().enumerate() {
        match schema.record(row) {
            Ok(record) => records.push(record),
            Err(err) => {
                debug!(row = idx + 1, reason = %err, "Dropping row without usable coordinates");
                report.dropped.push(DroppedRow {
                    row: idx + 1,
                    reason: err.to_string(),
                });
            }
        }
    }

    report.rows_kept = records.len();
    info!(
        rows_read = report.rows_read,
        rows_kept = report.rows_kept,
        rows_dropped = report.dropped.len(),
        "Catalog ingested"
    );

    Ok((Catalog::new(records), report))
}

/// Load from a source and build the catalog.
pub fn ingest(source: &dyn RowSource) -> Result<(Catalog, IngestReport), IngestError> {
    let table = source.load()?;
    ingest_table(&table)
}
