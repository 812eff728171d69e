use crate::error::{Result, TradeError};
use serde::{Deserialize, Serialize};

/// One cleaned bilateral trade row: `from` exports to `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub from_code: String,
    pub from_name: String,
    pub to_code: String,
    pub to_name: String,
    pub volume_a: f64,
    pub volume_b: f64,
}

/// A row as a loader sees it, before any field has been checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTradeRecord {
    pub from_code: Option<String>,
    pub from_name: Option<String>,
    pub to_code: Option<String>,
    pub to_name: Option<String>,
    pub volume_a: Option<String>,
    pub volume_b: Option<String>,
}

impl TradeRecord {
    pub fn new(
        from_code: &str,
        from_name: &str,
        to_code: &str,
        to_name: &str,
        volume_a: f64,
        volume_b: f64,
    ) -> Self {
        Self {
            from_code: from_code.to_string(),
            from_name: from_name.to_string(),
            to_code: to_code.to_string(),
            to_name: to_name.to_string(),
            volume_a,
            volume_b,
        }
    }

    /// Trade existed in both periods.
    pub fn qualifies(&self) -> bool {
        self.volume_a > 0.0 && self.volume_b > 0.0
    }

    /// Convert a raw row, where `row` is the 1-based data row used in errors.
    pub fn try_from_raw(row: usize, raw: &RawTradeRecord) -> Result<Self> {
        Ok(Self {
            from_code: required(row, "from_code", &raw.from_code)?.to_string(),
            from_name: required(row, "from_name", &raw.from_name)?.to_string(),
            to_code: required(row, "to_code", &raw.to_code)?.to_string(),
            to_name: required(row, "to_name", &raw.to_name)?.to_string(),
            volume_a: volume(row, "volume_a", &raw.volume_a)?,
            volume_b: volume(row, "volume_b", &raw.volume_b)?,
        })
    }
}

impl RawTradeRecord {
    pub fn is_complete(&self) -> bool {
        [
            &self.from_code,
            &self.from_name,
            &self.to_code,
            &self.to_name,
            &self.volume_a,
            &self.volume_b,
        ]
        .iter()
        .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

/// Validate a whole batch. The first bad row fails everything, so callers
/// never see a partially converted set.
pub fn validate_batch(rows: &[RawTradeRecord]) -> Result<Vec<TradeRecord>> {
    rows.iter()
        .enumerate()
        .map(|(idx, raw)| TradeRecord::try_from_raw(idx + 1, raw))
        .collect()
}

fn required<'a>(row: usize, field: &str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(TradeError::schema(row, format!("missing required field '{}'", field))),
    }
}

fn volume(row: usize, field: &str, value: &Option<String>) -> Result<f64> {
    let text = required(row, field, value)?;
    let parsed: f64 = text
        .parse()
        .map_err(|_| TradeError::schema(row, format!("'{}' is not numeric: {:?}", field, text)))?;

    if !parsed.is_finite() {
        return Err(TradeError::schema(
            row,
            format!("'{}' must be finite, got {}", field, text),
        ));
    }
    if parsed < 0.0 {
        return Err(TradeError::schema(
            row,
            format!("'{}' must not be negative, got {}", field, text),
        ));
    }

    Ok(parsed)
}
