use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which metric the map and legend currently show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricMode {
    /// Mean temperature in °C (sequential scale).
    #[default]
    Absolute,
    /// Change vs. the prior period in % (diverging scale).
    Relative,
}

impl MetricMode {
    /// Key used by the persistence surface.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricMode::Absolute => "absolute",
            MetricMode::Relative => "relative",
        }
    }

    /// Unit suffix used in labels.
    pub fn unit(&self) -> &'static str {
        match self {
            MetricMode::Absolute => "°C",
            MetricMode::Relative => "%",
        }
    }
}

impl fmt::Display for MetricMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "absolute" | "abs" => Ok(MetricMode::Absolute),
            "relative" | "rel" => Ok(MetricMode::Relative),
            other => Err(format!("unknown metric mode '{other}'")),
        }
    }
}

/// One (country, year) observation after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub country_code: String,
    pub country_name: String,
    pub year: i32,
    /// Mean temperature in °C.
    pub absolute_value: Option<f64>,
    /// Change vs. prior period in %, passed through from the source.
    pub relative_change: Option<f64>,
}

impl Record {
    /// The value shown for `mode`, if present.
    pub fn value_for(&self, mode: MetricMode) -> Option<f64> {
        match mode {
            MetricMode::Absolute => self.absolute_value,
            MetricMode::Relative => self.relative_change,
        }
    }
}

/// One entry of a country's temperature history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub year: i32,
    pub temperature: f64,
}

/// A history entry after smoothing, keeping the raw observation alongside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedPoint {
    pub year: i32,
    pub temperature: f64,
    pub original_temperature: f64,
}

/// Raw input row as found in the tabular feed. Every field is kept as text;
/// numbers in JSON input are stringified so CSV and JSON go through the same parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(default, alias = "Year", deserialize_with = "de_lenient_string")]
    pub year: Option<String>,
    #[serde(
        default,
        alias = "code",
        alias = "id",
        alias = "Country Code",
        deserialize_with = "de_lenient_string"
    )]
    pub country_code: Option<String>,
    #[serde(
        default,
        alias = "name",
        alias = "country",
        alias = "Country Name",
        deserialize_with = "de_lenient_string"
    )]
    pub country_name: Option<String>,
    #[serde(
        default,
        alias = "absolute_value",
        alias = "temperature",
        alias = "AverageTemperature",
        deserialize_with = "de_lenient_string"
    )]
    pub absolute: Option<String>,
    #[serde(
        default,
        alias = "relative_change",
        alias = "change",
        alias = "Change",
        deserialize_with = "de_lenient_string"
    )]
    pub relative: Option<String>,
}

/// Serde helper: accept a string, number, bool or null and keep it as optional text.
/// Empty strings become `None`.
fn de_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct LenientVisitor;

    impl<'de> Visitor<'de> for LenientVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a string, number, or null")
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let t = s.trim();
            Ok(if t.is_empty() { None } else { Some(t.to_string()) })
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D2>(self, d: D2) -> Result<Self::Value, D2::Error>
        where
            D2: serde::Deserializer<'de>,
        {
            d.deserialize_any(LenientVisitor)
        }
    }

    deserializer.deserialize_any(LenientVisitor)
}

/// Canonical key for a country identifier, shared by the tabular and geographic feeds.
///
/// Numeric codes are zero-padded to three digits (`"4"` and `"004"` match);
/// other codes are upper-cased.
pub fn canonical_country_code(raw: &str) -> Option<String> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }
    // JSON numbers may arrive as "4.0"
    let t = t.strip_suffix(".0").unwrap_or(t);
    if t.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("{:0>3}", t))
    } else {
        Some(t.to_ascii_uppercase())
    }
}

/// One country polygon's identity in the geographic feed. Geometry stays with the
/// rendering surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryFeature {
    pub id: String,
    pub name: Option<String>,
}

/// The set of country polygons the map draws, keyed like the tabular feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geography {
    pub countries: Vec<CountryFeature>,
}

impl Geography {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let countries = ids
            .into_iter()
            .filter_map(|id| canonical_country_code(id.as_ref()))
            .map(|id| CountryFeature { id, name: None })
            .collect();
        Self { countries }
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

/// Which view a zoom gesture applies to. Map and chart zoom never affect each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomTarget {
    Map,
    Chart,
}

/// 2-D zoom transform: uniform scale `k` followed by translation `(x, y)`,
/// i.e. a point `p` maps to `p * k + t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform { k: 1.0, x: 0.0, y: 0.0 };

    pub fn new(k: f64, x: f64, y: f64) -> Self {
        Self { k, x, y }
    }

    pub fn apply(&self, p: (f64, f64)) -> (f64, f64) {
        (p.0 * self.k + self.x, p.1 * self.k + self.y)
    }

    pub fn invert_x(&self, px: f64) -> f64 {
        (px - self.x) / self.k
    }

    pub fn invert_y(&self, py: f64) -> f64 {
        (py - self.y) / self.k
    }

    /// Returns a copy of `axis` whose domain shows what this transform makes visible
    /// along the horizontal direction.
    pub fn rescale_x(&self, axis: &LinearAxis) -> LinearAxis {
        let d0 = axis.invert(self.invert_x(axis.range.0));
        let d1 = axis.invert(self.invert_x(axis.range.1));
        LinearAxis::new((d0, d1), axis.range)
    }

    /// Vertical counterpart of [`ZoomTransform::rescale_x`].
    pub fn rescale_y(&self, axis: &LinearAxis) -> LinearAxis {
        let d0 = axis.invert(self.invert_y(axis.range.0));
        let d1 = axis.invert(self.invert_y(axis.range.1));
        LinearAxis::new((d0, d1), axis.range)
    }

    pub fn is_finite(&self) -> bool {
        self.k.is_finite() && self.x.is_finite() && self.y.is_finite()
    }
}

/// Linear mapping from a data domain to a pixel range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearAxis {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearAxis {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if (d1 - d0).abs() < f64::EPSILON {
            return (r0 + r1) / 2.0;
        }
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if (r1 - r0).abs() < f64::EPSILON {
            return (d0 + d1) / 2.0;
        }
        d0 + (px - r0) / (r1 - r0) * (d1 - d0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_codes_pad_numeric_and_upper_alpha() {
        assert_eq!(canonical_country_code("4").as_deref(), Some("004"));
        assert_eq!(canonical_country_code(" 004 ").as_deref(), Some("004"));
        assert_eq!(canonical_country_code("840.0").as_deref(), Some("840"));
        assert_eq!(canonical_country_code("deu").as_deref(), Some("DEU"));
        assert_eq!(canonical_country_code("  "), None);
    }

    #[test]
    fn mode_parses_and_prints() {
        assert_eq!("Relative".parse::<MetricMode>(), Ok(MetricMode::Relative));
        assert_eq!(MetricMode::Absolute.to_string(), "absolute");
        assert!("kelvin".parse::<MetricMode>().is_err());
    }

    #[test]
    fn identity_zoom_keeps_axis() {
        let axis = LinearAxis::new((1850.0, 2014.0), (0.0, 600.0));
        let out = ZoomTransform::IDENTITY.rescale_x(&axis);
        assert!((out.domain.0 - 1850.0).abs() < 1e-9);
        assert!((out.domain.1 - 2014.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_in_narrows_domain_around_origin() {
        let axis = LinearAxis::new((0.0, 100.0), (0.0, 100.0));
        let out = ZoomTransform::new(2.0, 0.0, 0.0).rescale_x(&axis);
        assert!((out.domain.0 - 0.0).abs() < 1e-9);
        assert!((out.domain.1 - 50.0).abs() < 1e-9);
    }
}
