//! Header lookup and lenient field parsing shared by the trace readers

use crate::error::{PrepError, Result};
use csv::StringRecord;
use std::path::{Path, PathBuf};

/// Empty cells and the NaN spellings pandas writes are treated as absent
pub fn is_missing(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty()
        || raw.eq_ignore_ascii_case("nan")
        || raw.eq_ignore_ascii_case("na")
        || raw.eq_ignore_ascii_case("null")
}

/// Parse a float, `Ok(None)` for a missing cell
pub(crate) fn parse_float(raw: &str) -> std::result::Result<Option<f64>, ()> {
    if is_missing(raw) {
        return Ok(None);
    }
    let value: f64 = raw.trim().parse().map_err(|_| ())?;
    if value.is_nan() {
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

/// Parse an integer; decimal text is truncated toward zero
pub(crate) fn parse_int(raw: &str) -> std::result::Result<Option<i64>, ()> {
    if is_missing(raw) {
        return Ok(None);
    }
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(Some(value));
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value.trunc() as i64)),
        Ok(_) => Ok(None),
        Err(_) => Err(()),
    }
}

/// Column index of a CSV header, bound to the file it came from
pub struct Columns {
    path: PathBuf,
    headers: StringRecord,
}

impl Columns {
    pub fn new(path: &Path, headers: StringRecord) -> Self {
        Self {
            path: path.to_path_buf(),
            headers,
        }
    }

    pub fn optional(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn require(&self, name: &str) -> Result<usize> {
        self.optional(name).ok_or_else(|| PrepError::MissingColumn {
            path: self.path.clone(),
            column: name.to_string(),
        })
    }

    /// First of several accepted spellings of a column
    pub fn require_any(&self, names: &[&str]) -> Result<usize> {
        names
            .iter()
            .find_map(|name| self.optional(name))
            .ok_or_else(|| PrepError::MissingColumn {
                path: self.path.clone(),
                column: names.join("|"),
            })
    }

    pub fn name(&self, index: usize) -> &str {
        self.headers.get(index).map(str::trim).unwrap_or("")
    }

    pub fn fields<'r>(&'r self, record: &'r StringRecord) -> Fields<'r> {
        Fields {
            columns: self,
            record,
        }
    }
}

/// Typed accessors over one record
pub struct Fields<'r> {
    columns: &'r Columns,
    record: &'r StringRecord,
}

impl Fields<'_> {
    fn raw(&self, index: usize) -> &str {
        self.record.get(index).unwrap_or("")
    }

    fn invalid(&self, index: usize) -> PrepError {
        PrepError::InvalidValue {
            path: self.columns.path.clone(),
            line: self.record.position().map(|p| p.line()).unwrap_or(0),
            column: self.columns.name(index).to_string(),
            value: self.raw(index).to_string(),
        }
    }

    pub fn int(&self, index: usize) -> Result<Option<i64>> {
        parse_int(self.raw(index)).map_err(|_| self.invalid(index))
    }

    pub fn float(&self, index: usize) -> Result<Option<f64>> {
        parse_float(self.raw(index)).map_err(|_| self.invalid(index))
    }

    pub fn required_int(&self, index: usize) -> Result<i64> {
        self.int(index)?.ok_or_else(|| self.invalid(index))
    }

    pub fn required_float(&self, index: usize) -> Result<f64> {
        self.float(index)?.ok_or_else(|| self.invalid(index))
    }
}
