//! Captured curve data: name -> per-frame samples, plus metadata.
//!
//! On disk an item directory holds `curvedata.json` (metadata document) and
//! `curvedata.csv`: a header row of curve names followed by one row per frame.
//! The frame count is the length of the first curve; shorter curves are
//! padded with `0` on save, longer ones are cut.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::warn;

use crate::error::{CurveError, CurveResult};
use crate::transfer::{ensure_parent, read_metadata, Metadata, TransferDocument};

pub const CURVE_DATA_DOCUMENT: &str = "curvedata.json";
pub const CURVE_DATA_TABLE: &str = "curvedata.csv";

/// Samples indexed by integer frame, starting at frame 0.
pub type CurveValues = Vec<f64>;

/// Ordered map of curve name to samples.
pub type CurveMap = IndexMap<String, CurveValues>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CurveData {
    pub metadata: Metadata,
    curves: CurveMap,
    path: Option<PathBuf>,
}

impl CurveData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_curves(curves: CurveMap) -> Self {
        Self {
            curves,
            ..Self::default()
        }
    }

    pub fn curves(&self) -> &CurveMap {
        &self.curves
    }

    pub fn insert_curve(&mut self, name: impl Into<String>, values: CurveValues) {
        self.curves.insert(name.into(), values);
    }

    pub fn curve_names(&self) -> impl Iterator<Item = &str> {
        self.curves.keys().map(|k| k.as_str())
    }

    /// Length of the first curve, or 0 when empty.
    pub fn total_frames(&self) -> usize {
        self.curves.first().map_or(0, |(_, v)| v.len())
    }

    /// Sample of `name` at `frame`, 0.0 when either is absent.
    pub fn curve_value(&self, name: &str, frame: usize) -> f64 {
        self.curves
            .get(name)
            .and_then(|v| v.get(frame))
            .copied()
            .unwrap_or(0.0)
    }

    /// Every curve's sample at one frame, in curve order.
    pub fn value_map_at_frame(&self, frame: usize) -> IndexMap<String, f64> {
        self.curves
            .keys()
            .map(|name| (name.clone(), self.curve_value(name, frame)))
            .collect()
    }

    /// Directory this data was read from or last saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Replace the curves with the contents of a CSV table.
    pub fn read_csv<R: Read>(&mut self, reader: R) -> CurveResult<()> {
        self.read_table(reader, Path::new("<reader>"))
    }

    fn read_table<R: Read>(&mut self, reader: R, origin: &Path) -> CurveResult<()> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let names: Vec<String> = rdr
            .headers()
            .map_err(|e| CurveError::csv(origin, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut columns: Vec<CurveValues> = vec![Vec::new(); names.len()];
        let mut ended = vec![false; names.len()];
        for (row, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| CurveError::csv(origin, e))?;
            for (col, cell) in record.iter().enumerate().take(names.len()) {
                let cell = cell.trim();
                if cell.is_empty() {
                    ended[col] = true;
                    continue;
                }
                if ended[col] {
                    warn!(
                        "Ignoring value after a gap in curve {:?} at row {}",
                        names[col], row
                    );
                    continue;
                }
                let value = cell.parse::<f64>().map_err(|_| CurveError::InvalidValue {
                    curve: names[col].clone(),
                    row,
                    cell: cell.to_string(),
                })?;
                columns[col].push(value);
            }
            // Short rows end the missing columns.
            for flag in ended.iter_mut().skip(record.len()) {
                *flag = true;
            }
        }

        let mut curves = CurveMap::with_capacity(names.len());
        for (name, values) in names.into_iter().zip(columns) {
            if curves.contains_key(&name) {
                warn!("Duplicate curve name {name:?} in table; keeping the last column");
            }
            curves.insert(name, values);
        }
        self.curves = curves;
        Ok(())
    }

    /// Write the header and `total_frames()` rows.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::WriterBuilder::new().from_writer(writer);
        wtr.write_record(self.curves.keys())?;
        for frame in 0..self.total_frames() {
            let row: Vec<String> = self
                .curves
                .keys()
                .map(|name| self.curve_value(name, frame).to_string())
                .collect();
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn set_from_csv_path(&mut self, path: &Path) -> CurveResult<()> {
        let file = File::open(path).map_err(|e| CurveError::io(path, e))?;
        self.read_table(file, path)
    }

    pub fn from_csv_path(path: &Path) -> CurveResult<Self> {
        let mut data = CurveData::new();
        data.set_from_csv_path(path)?;
        Ok(data)
    }

    /// Open a saved curve data item directory.
    pub fn from_path(dir: &Path) -> CurveResult<Self> {
        let mut data = CurveData {
            metadata: read_metadata(&dir.join(CURVE_DATA_DOCUMENT))?,
            curves: CurveMap::new(),
            path: Some(dir.to_path_buf()),
        };
        data.set_from_csv_path(&dir.join(CURVE_DATA_TABLE))?;
        Ok(data)
    }

    pub fn save(&mut self, dir: &Path) -> CurveResult<()> {
        TransferDocument {
            metadata: self.metadata.clone(),
        }
        .write(&dir.join(CURVE_DATA_DOCUMENT))?;

        let table = dir.join(CURVE_DATA_TABLE);
        ensure_parent(&table)?;
        let file = File::create(&table).map_err(|e| CurveError::io(&table, e))?;
        self.write_csv(file).map_err(|e| CurveError::csv(&table, e))?;
        self.path = Some(dir.to_path_buf());
        Ok(())
    }
}

/// Build curve data from a CSV file and metadata, then save it to `dir`.
pub fn save_curve_data(
    dir: &Path,
    csv_path: Option<&Path>,
    metadata: Option<&Metadata>,
) -> CurveResult<CurveData> {
    let mut data = CurveData::new();
    if let Some(metadata) = metadata {
        data.metadata.update(metadata);
    }
    if let Some(csv_path) = csv_path {
        data.set_from_csv_path(csv_path)?;
    }
    data.save(dir)?;
    Ok(data)
}
