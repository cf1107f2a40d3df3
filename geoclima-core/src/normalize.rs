//! Coercion of raw latitude/longitude cells into validated coordinates.

use crate::model::{Coordinates, DEFAULT_POPULATED_CENTER_CODE};
use crate::source::Cell;

/// Why a row's coordinates were rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("{0} is missing")]
    Missing(Axis),

    #[error("{axis} '{value}' is not a number")]
    NotNumeric { axis: Axis, value: String },

    #[error("coordinate is not a finite number")]
    NonFinite,

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Latitude => f.write_str("latitude"),
            Axis::Longitude => f.write_str("longitude"),
        }
    }
}

/// Coerce a single cell to a finite float. Text is trimmed and parsed with `.` as the
/// decimal separator; anything else counts as missing.
pub fn coerce(cell: &Cell, axis: Axis) -> Result<f64, CoordinateError> {
    let value = match cell {
        Cell::Empty => return Err(CoordinateError::Missing(axis)),
        Cell::Number(n) => *n,
        Cell::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(CoordinateError::Missing(axis));
            }
            trimmed.parse::<f64>().map_err(|_| CoordinateError::NotNumeric {
                axis,
                value: trimmed.to_string(),
            })?
        }
        Cell::Bool(b) => {
            return Err(CoordinateError::NotNumeric {
                axis,
                value: b.to_string(),
            });
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoordinateError::NonFinite)
    }
}

/// Both cells must coerce and land in range; a half-valid pair is rejected whole.
pub fn normalize_pair(latitude: &Cell, longitude: &Cell) -> Result<Coordinates, CoordinateError> {
    let lat = coerce(latitude, Axis::Latitude)?;
    let lon = coerce(longitude, Axis::Longitude)?;
    Coordinates::new(lat, lon)
}

/// Populated-center code with the `1` fallback for blank cells.
pub fn populated_center_code(cell: &Cell) -> String {
    cell.as_text()
        .unwrap_or_else(|| DEFAULT_POPULATED_CENTER_CODE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_numbers_and_numeric_text() {
        let c = normalize_pair(&Cell::Text(" -12.05 ".into()), &Cell::Number(-77.03)).unwrap();
        assert_eq!(c.latitude(), -12.05);
        assert_eq!(c.longitude(), -77.03);
    }

    #[test]
    fn rejects_placeholder_text() {
        let err = normalize_pair(&Cell::Text("N/D".into()), &Cell::Number(-77.03)).unwrap_err();
        assert_eq!(
            err,
            CoordinateError::NotNumeric {
                axis: Axis::Latitude,
                value: "N/D".into()
            }
        );
    }

    #[test]
    fn rejects_blank_cells() {
        assert_eq!(
            normalize_pair(&Cell::Number(-12.0), &Cell::Empty).unwrap_err(),
            CoordinateError::Missing(Axis::Longitude)
        );
        assert_eq!(
            normalize_pair(&Cell::Text("   ".into()), &Cell::Number(-77.0)).unwrap_err(),
            CoordinateError::Missing(Axis::Latitude)
        );
    }

    #[test]
    fn rejects_non_finite_and_out_of_range() {
        assert_eq!(
            normalize_pair(&Cell::Text("inf".into()), &Cell::Number(0.0)).unwrap_err(),
            CoordinateError::NonFinite
        );
        assert_eq!(
            normalize_pair(&Cell::Number(f64::NAN), &Cell::Number(0.0)).unwrap_err(),
            CoordinateError::NonFinite
        );
        assert!(matches!(
            normalize_pair(&Cell::Number(-120.0), &Cell::Number(0.0)),
            Err(CoordinateError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            normalize_pair(&Cell::Bool(true), &Cell::Number(0.0)),
            Err(CoordinateError::NotNumeric { .. })
        ));
    }

    #[test]
    fn normalizing_a_valid_pair_again_is_a_no_op() {
        let samples = [(-12.05, -77.03), (0.0, 0.0), (90.0, -180.0), (-9.123456, -75.654321)];

        for (lat, lon) in samples {
            let first = normalize_pair(&Cell::Number(lat), &Cell::Number(lon)).unwrap();
            let again = normalize_pair(
                &Cell::Text(first.latitude().to_string()),
                &Cell::Number(first.longitude()),
            )
            .unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn populated_center_code_defaults_to_one() {
        assert_eq!(populated_center_code(&Cell::Empty), "1");
        assert_eq!(populated_center_code(&Cell::Number(250301.0)), "250301");
        assert_eq!(populated_center_code(&Cell::Text("0123".into())), "0123");
    }
}
