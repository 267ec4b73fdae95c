/// Outcome of coercing a raw cell to a number.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Coerced {
    /// Finite number.
    Value(f64),

    /// Absent column or blank cell.
    Missing,

    /// Present, but not a finite number.
    NotANumber,
}

impl Coerced {
    pub fn from_cell(cell: Option<&str>) -> Self {
        let Some(cell) = cell.map(str::trim).filter(|cell| !cell.is_empty()) else {
            return Self::Missing;
        };
        match cell.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Value(value),
            _ => Self::NotANumber,
        }
    }

    /// Get the number, or [`None`] for a gap.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Value(value) => Some(value),
            Self::Missing | Self::NotANumber => None,
        }
    }
}
