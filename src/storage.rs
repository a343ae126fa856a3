use crate::coordinator::{DrilldownFrame, MapFrame};
use crate::error::AtlasError;
use crate::models::{CountryFeature, Geography, RawRow, canonical_country_code};
use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, WriterBuilder};
use serde_json::Value;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Rows read from a tabular feed, plus the ones that could not be read at all.
#[derive(Debug, Clone, Default)]
pub struct ParsedRows {
    pub rows: Vec<RawRow>,
    pub errors: Vec<AtlasError>,
}

/// Read CSV rows with a header line. Records that cannot be decoded are reported, not fatal.
///
/// Short records are padded with empty fields, so missing trailing values read as `None`;
/// fields past the header are dropped.
pub fn read_rows_csv<R: Read>(reader: R) -> Result<ParsedRows> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    // A feed without a readable header is unusable.
    let headers = rdr.headers().context("read csv header")?.clone();

    let mut out = ParsedRows::default();
    for (i, rec) in rdr.records().enumerate() {
        let decoded = rec.and_then(|mut record| {
            while record.len() < headers.len() {
                record.push_field("");
            }
            record.truncate(headers.len());
            record.deserialize::<RawRow>(Some(&headers))
        });
        match decoded {
            Ok(row) => out.rows.push(row),
            Err(e) => out.errors.push(AtlasError::malformed(i + 1, e.to_string())),
        }
    }
    Ok(out)
}

/// Read a JSON array of row objects.
pub fn read_rows_json(text: &str) -> Result<ParsedRows> {
    let v: Value = serde_json::from_str(text).context("parse json rows")?;
    let arr = v
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("unexpected rows shape: not a top-level array"))?;

    let mut out = ParsedRows::default();
    for (i, item) in arr.iter().enumerate() {
        match serde_json::from_value::<RawRow>(item.clone()) {
            Ok(row) => out.rows.push(row),
            Err(e) => out.errors.push(AtlasError::malformed(i + 1, e.to_string())),
        }
    }
    Ok(out)
}

/// CSV or JSON, decided by the first non-blank character.
pub fn read_rows(text: &str) -> Result<ParsedRows> {
    match text.trim_start().chars().next() {
        Some('[') => read_rows_json(text),
        Some(_) => read_rows_csv(text.as_bytes()),
        None => bail!("empty tabular feed"),
    }
}

/// Country identities from a GeoJSON `FeatureCollection` or a TopoJSON `Topology`.
pub fn parse_geography(text: &str) -> Result<Geography> {
    let v: Value = serde_json::from_str(text).context("parse geography json")?;

    let features: Vec<&Value> = if let Some(fs) = v.get("features").and_then(Value::as_array) {
        fs.iter().collect()
    } else if let Some(objects) = v.get("objects").and_then(Value::as_object) {
        objects
            .values()
            .filter_map(|o| o.get("geometries").and_then(Value::as_array))
            .flatten()
            .collect()
    } else {
        bail!("unexpected geography shape: neither features nor objects");
    };

    let mut countries = Vec::new();
    for f in features {
        let Some(id) = f.get("id").and_then(id_text).and_then(|s| canonical_country_code(&s))
        else {
            continue;
        };
        let name = f
            .get("properties")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);
        countries.push(CountryFeature { id, name });
    }
    if countries.is_empty() {
        bail!("geography has no identifiable countries");
    }
    Ok(Geography { countries })
}

fn id_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Save map fills as pretty JSON.
pub fn save_map_json<P: AsRef<Path>>(frame: &MapFrame, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(frame)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Prefix cells a spreadsheet would evaluate as a formula.
fn safe_cell(s: &str) -> String {
    match s.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{s}"),
        _ => s.to_string(),
    }
}

/// Save map fills as CSV with header. Country codes come straight from the feeds,
/// so formula-like cells are neutralized.
pub fn save_map_csv<P: AsRef<Path>>(frame: &MapFrame, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.serialize(("country_code", "year", "mode", "value", "color"))?;
    for fill in &frame.fills {
        wtr.serialize((
            safe_cell(&fill.country_code),
            frame.year,
            frame.mode.as_str(),
            fill.value,
            fill.color.hex(),
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a drill-down series pair as CSV: year, raw, smoothed.
pub fn save_drilldown_csv<P: AsRef<Path>>(frame: &DrilldownFrame, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.serialize(("year", "temperature", "smoothed"))?;
    for p in &frame.smoothed {
        wtr.serialize((p.year, p.original_temperature, p.temperature))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::coordinator::CountryFill;
    use crate::models::{MetricMode, ZoomTransform};
    use tempfile::tempdir;

    #[test]
    fn write_csv_and_json() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("x.csv");
        let jsonp = dir.path().join("x.json");
        let frame = MapFrame {
            year: 2000,
            mode: MetricMode::Absolute,
            transform: ZoomTransform::IDENTITY,
            fills: vec![CountryFill {
                country_code: "004".into(),
                value: Some(14.2),
                color: Color::rgb(1, 2, 3),
            }],
        };
        save_map_csv(&frame, &csvp).unwrap();
        save_map_json(&frame, &jsonp).unwrap();
        let csv_text = std::fs::read_to_string(&csvp).unwrap();
        assert!(csv_text.contains("004,2000,absolute,14.2,#010203"));
        assert!(jsonp.exists());
    }

    #[test]
    fn csv_numbers_and_blanks() {
        let text = "year,country_code,country_name,absolute,relative\n\
                    1850,4,Afghanistan,14.2,\n\
                    1851,004,Afghanistan,,0.5\n";
        let parsed = read_rows(text).unwrap();
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].absolute.as_deref(), Some("14.2"));
        assert_eq!(parsed.rows[0].relative, None);
        assert_eq!(parsed.rows[1].absolute, None);
    }
}
