use crate::index::{DataIndex, IngestReport};
use crate::models::RawRow;
use crate::scale::ScaleModel;
use crate::storage::ParsedRows;
use crate::view_state::YearBounds;

/// Data Index and Scale Model, built together once after load and read-only afterwards.
#[derive(Debug)]
pub struct Atlas {
    pub index: DataIndex,
    pub scales: ScaleModel,
    pub report: IngestReport,
}

impl Atlas {
    pub fn from_rows<I: IntoIterator<Item = RawRow>>(rows: I) -> Self {
        let (index, report) = DataIndex::build(rows);
        let scales = ScaleModel::build(&index);
        Self {
            index,
            scales,
            report,
        }
    }

    /// Like [`Atlas::from_rows`], keeping the read errors in the ingest report.
    pub fn from_parsed(parsed: ParsedRows) -> Self {
        let mut atlas = Self::from_rows(parsed.rows);
        atlas.report.skipped.extend(parsed.errors);
        atlas
    }

    /// Year range of the data; a dataset without years gets a single-year range at 0.
    pub fn year_bounds(&self) -> YearBounds {
        let (min, max) = self.index.year_bounds().unwrap_or((0, 0));
        YearBounds { min, max }
    }
}
