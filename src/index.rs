//! Data Index: year → country → [`Record`], plus lazily derived per-country histories.

use crate::error::AtlasError;
use crate::models::{HistoryPoint, RawRow, Record, canonical_country_code};
use ahash::AHashMap;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Outcome of [`DataIndex::build`]: how many rows made it in and which were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub accepted: usize,
    pub skipped: Vec<AtlasError>,
}

/// Chronological absolute-temperature series for one country.
///
/// Cheap to clone; iterate as many times as needed with [`History::iter`].
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    points: Rc<[HistoryPoint]>,
}

impl History {
    pub fn iter(&self) -> std::slice::Iter<'_, HistoryPoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[HistoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn to_vec(&self) -> Vec<HistoryPoint> {
        self.points.to_vec()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryPoint;
    type IntoIter = std::slice::Iter<'a, HistoryPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Immutable lookup built once from the tabular feed.
#[derive(Debug, Default)]
pub struct DataIndex {
    by_year: BTreeMap<i32, AHashMap<String, Record>>,
    names: AHashMap<String, String>,
    history_cache: RefCell<AHashMap<String, History>>,
}

impl DataIndex {
    /// Normalize raw rows. Rows whose year or country code cannot be parsed, and
    /// repeated (year, country) pairs, are skipped and listed in the report.
    pub fn build<I>(rows: I) -> (Self, IngestReport)
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut index = DataIndex::default();
        let mut report = IngestReport::default();

        for (i, raw) in rows.into_iter().enumerate() {
            let row_no = i + 1;
            match normalize_row(row_no, raw) {
                Ok(record) => {
                    let year_map = index.by_year.entry(record.year).or_default();
                    if year_map.contains_key(&record.country_code) {
                        let err = AtlasError::malformed(
                            row_no,
                            format!(
                                "duplicate entry for country {} in {}",
                                record.country_code, record.year
                            ),
                        );
                        warn!("skipping row: {err}");
                        report.skipped.push(err);
                        continue;
                    }
                    index
                        .names
                        .entry(record.country_code.clone())
                        .or_insert_with(|| record.country_name.clone());
                    year_map.insert(record.country_code.clone(), record);
                    report.accepted += 1;
                }
                Err(err) => {
                    warn!("skipping row: {err}");
                    report.skipped.push(err);
                }
            }
        }

        info!(
            "indexed {} records over {} years ({} rows skipped)",
            report.accepted,
            index.by_year.len(),
            report.skipped.len()
        );
        (index, report)
    }

    /// The record for `country_code` in `year`, or `None` when there is no data.
    pub fn lookup(&self, year: i32, country_code: &str) -> Option<&Record> {
        let key = canonical_country_code(country_code)?;
        self.by_year.get(&year)?.get(&key)
    }

    /// Chronological non-null absolute temperatures for a country.
    ///
    /// Derived on first access and cached; an unknown country yields an empty history.
    pub fn history_for(&self, country_code: &str) -> History {
        let Some(key) = canonical_country_code(country_code) else {
            return History {
                points: Rc::from(Vec::new()),
            };
        };
        if let Some(h) = self.history_cache.borrow().get(&key) {
            return h.clone();
        }

        let points: Vec<HistoryPoint> = self
            .by_year
            .iter()
            .filter_map(|(year, countries)| {
                let temperature = countries.get(&key)?.absolute_value?;
                Some(HistoryPoint {
                    year: *year,
                    temperature,
                })
            })
            .collect();
        debug!("derived history for {key}: {} points", points.len());

        let history = History {
            points: Rc::from(points),
        };
        self.history_cache
            .borrow_mut()
            .insert(key, history.clone());
        history
    }

    /// Inclusive `(min, max)` year present in the data.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let min = *self.by_year.keys().next()?;
        let max = *self.by_year.keys().next_back()?;
        Some((min, max))
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.by_year.keys().copied()
    }

    /// Display name for a country (first name seen in the feed).
    pub fn country_name(&self, country_code: &str) -> Option<&str> {
        let key = canonical_country_code(country_code)?;
        self.names.get(&key).map(|s| s.as_str())
    }

    /// All country codes, sorted.
    pub fn countries(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.names.keys().map(|s| s.as_str()).collect();
        out.sort_unstable();
        out
    }

    /// Records in `year`, in no particular order.
    pub fn records_in(&self, year: i32) -> impl Iterator<Item = &Record> + '_ {
        self.by_year.get(&year).into_iter().flat_map(|m| m.values())
    }

    pub fn all_absolute_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.records().filter_map(|r| r.absolute_value)
    }

    pub fn all_relative_changes(&self) -> impl Iterator<Item = f64> + '_ {
        self.records().filter_map(|r| r.relative_change)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.by_year.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_year.is_empty()
    }

    fn records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.by_year.values().flat_map(|m| m.values())
    }
}

fn normalize_row(row: usize, raw: RawRow) -> Result<Record, AtlasError> {
    let year_text = raw
        .year
        .ok_or_else(|| AtlasError::malformed(row, "missing year"))?;
    let year = parse_year(&year_text)
        .ok_or_else(|| AtlasError::malformed(row, format!("unparseable year '{year_text}'")))?;
    let country_code = raw
        .country_code
        .as_deref()
        .and_then(canonical_country_code)
        .ok_or_else(|| AtlasError::malformed(row, "missing country code"))?;
    let country_name = raw.country_name.unwrap_or_else(|| country_code.clone());

    Ok(Record {
        country_code,
        country_name,
        year,
        absolute_value: raw.absolute.as_deref().and_then(parse_number),
        relative_change: raw.relative.as_deref().and_then(parse_number),
    })
}

/// Integer years; `"1850.0"` is accepted because JSON numbers may be stringified floats.
fn parse_year(s: &str) -> Option<i32> {
    let t = s.trim();
    if let Ok(y) = t.parse::<i32>() {
        return Some(y);
    }
    let f = t.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

/// Finite floats only; anything else means "no value".
fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_year_accepts_integral_floats_only() {
        assert_eq!(parse_year("1850"), Some(1850));
        assert_eq!(parse_year(" 2014.0 "), Some(2014));
        assert_eq!(parse_year("2014.5"), None);
        assert_eq!(parse_year("n/a"), None);
    }

    #[test]
    fn parse_number_rejects_non_finite() {
        assert_eq!(parse_number("14.25"), Some(14.25));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NA"), None);
    }
}
