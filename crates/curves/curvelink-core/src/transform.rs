//! Weighted combination of named curves into derived curves.
//!
//! A transform declares, per output name, an ordered list of
//! `(source name, weight)` cells. Cells are kept raw so the gap policy is
//! applied when the transform runs: the first empty or unparsable cell ends
//! that output's list.
//!
//! Combination starts from zero and folds every weighted source in:
//! - `sum`: `acc + sample * weight`
//! - `max`: `max(acc, sample * weight)`
//! - anything else leaves the output at its zero default
//!
//! Sequences of different lengths combine pairwise, so the result is as long
//! as the shortest operand seen.

use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::error::{CurveError, CurveResult};
use crate::transfer::{ensure_parent, read_metadata, Metadata, TransferDocument};

pub const DATA_TRANSFORM_DOCUMENT: &str = "datatransform.json";
pub const DATA_TRANSFORM_TABLE: &str = "datatransform.csv";

/// Combination method tag stored in the transform metadata.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CombineMethod {
    Sum,
    Max,
    /// Unrecognised tag; produces zero output.
    Other(String),
}

impl CombineMethod {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "sum" => CombineMethod::Sum,
            "max" => CombineMethod::Max,
            other => CombineMethod::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CombineMethod::Sum => "sum",
            CombineMethod::Max => "max",
            CombineMethod::Other(tag) => tag,
        }
    }

    #[inline]
    fn fold(&self, acc: f64, weighted: f64) -> Option<f64> {
        match self {
            CombineMethod::Sum => Some(acc + weighted),
            CombineMethod::Max => Some(acc.max(weighted)),
            CombineMethod::Other(_) => None,
        }
    }
}

impl fmt::Display for CombineMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output name -> raw `(source, weight)` cells, plus metadata carrying the method.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataTransform {
    pub metadata: Metadata,
    outputs: IndexMap<String, Vec<String>>,
}

impl DataTransform {
    pub fn new(method: CombineMethod) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert("method", method.as_str());
        Self {
            metadata,
            outputs: IndexMap::new(),
        }
    }

    pub fn method(&self) -> CombineMethod {
        CombineMethod::parse(self.metadata.method())
    }

    /// Declare an output from raw cells (`src1, w1, src2, w2, ...`).
    pub fn insert_cells<S: Into<String>>(
        &mut self,
        output: impl Into<String>,
        cells: impl IntoIterator<Item = S>,
    ) {
        self.outputs
            .insert(output.into(), cells.into_iter().map(Into::into).collect());
    }

    /// Declare an output from typed pairs.
    pub fn insert_pairs(&mut self, output: impl Into<String>, pairs: &[(&str, f64)]) {
        let cells = pairs
            .iter()
            .flat_map(|(src, w)| [src.to_string(), w.to_string()]);
        self.insert_cells(output, cells);
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(|k| k.as_str())
    }

    /// Raw cells for `output` (empty when undeclared).
    pub fn cells(&self, output: &str) -> &[String] {
        self.outputs.get(output).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The usable prefix of an output's pair list.
    pub fn pairs(&self, output: &str) -> Vec<(&str, f64)> {
        weighted_pairs(output, self.cells(output))
    }

    /// Apply to full curves. Source lookup ignores case; a missing source is an empty curve.
    pub fn apply_list(&self, inputs: &IndexMap<String, Vec<f64>>) -> IndexMap<String, Vec<f64>> {
        let method = self.method();
        if let CombineMethod::Other(tag) = &method {
            warn!("Unknown data transform method {tag:?}; outputs stay empty");
        }

        let mut out = IndexMap::with_capacity(self.outputs.len());
        for (name, cells) in &self.outputs {
            let mut acc: Option<Vec<f64>> = None;
            for (source, weight) in weighted_pairs(name, cells) {
                let samples = lookup_ignore_case(inputs, source);
                let prev = acc.take();
                let folded: Option<Vec<f64>> = match prev {
                    None => samples
                        .iter()
                        .map(|v| method.fold(0.0, v * weight))
                        .collect(),
                    Some(prev) => prev
                        .iter()
                        .zip(samples.iter())
                        .map(|(a, v)| method.fold(*a, v * weight))
                        .collect(),
                };
                // Unknown methods fold to nothing; leave the accumulator empty.
                acc = folded;
            }
            out.insert(name.clone(), acc.unwrap_or_default());
        }
        out
    }

    /// Apply to one frame of values. Source lookup is exact; a missing source is 0.0.
    pub fn apply_scalar(&self, inputs: &IndexMap<String, f64>) -> IndexMap<String, f64> {
        let method = self.method();
        let mut out = IndexMap::with_capacity(self.outputs.len());
        for (name, cells) in &self.outputs {
            let mut value = 0.0;
            for (source, weight) in weighted_pairs(name, cells) {
                let sample = inputs.get(source).copied().unwrap_or(0.0);
                if let Some(next) = method.fold(value, sample * weight) {
                    value = next;
                }
            }
            out.insert(name.clone(), value);
        }
        out
    }

    /// Parse rows of `output,src1,w1,src2,w2,...`.
    pub fn read_csv<R: Read>(&mut self, reader: R) -> Result<(), csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut outputs = IndexMap::new();
        for record in rdr.records() {
            let record = record?;
            let mut fields = record.iter();
            let Some(name) = fields.next() else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            outputs.insert(name.to_string(), fields.map(str::to_string).collect());
        }
        self.outputs = outputs;
        Ok(())
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        for (name, cells) in &self.outputs {
            let mut record = Vec::with_capacity(cells.len() + 1);
            record.push(name.as_str());
            record.extend(cells.iter().map(String::as_str));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn set_from_csv_path(&mut self, path: &Path) -> CurveResult<()> {
        let file = File::open(path).map_err(|e| CurveError::io(path, e))?;
        self.read_csv(file).map_err(|e| CurveError::csv(path, e))
    }

    /// Open a saved transform item directory.
    pub fn from_path(dir: &Path) -> CurveResult<Self> {
        let mut transform = DataTransform {
            metadata: read_metadata(&dir.join(DATA_TRANSFORM_DOCUMENT))?,
            outputs: IndexMap::new(),
        };
        transform.set_from_csv_path(&dir.join(DATA_TRANSFORM_TABLE))?;
        Ok(transform)
    }

    pub fn save(&self, dir: &Path) -> CurveResult<()> {
        TransferDocument {
            metadata: self.metadata.clone(),
        }
        .write(&dir.join(DATA_TRANSFORM_DOCUMENT))?;

        let table = dir.join(DATA_TRANSFORM_TABLE);
        ensure_parent(&table)?;
        let file = File::create(&table).map_err(|e| CurveError::io(&table, e))?;
        self.write_csv(file).map_err(|e| CurveError::csv(&table, e))
    }
}

/// Build a transform from a CSV file and metadata, then save it to `dir`.
pub fn save_data_transform(
    dir: &Path,
    csv_path: Option<&Path>,
    metadata: Option<&Metadata>,
) -> CurveResult<DataTransform> {
    let mut transform = DataTransform::default();
    if let Some(metadata) = metadata {
        transform.metadata.update(metadata);
    }
    if let Some(csv_path) = csv_path {
        transform.set_from_csv_path(csv_path)?;
    }
    transform.save(dir)?;
    Ok(transform)
}

fn weighted_pairs<'a>(output: &str, cells: &'a [String]) -> Vec<(&'a str, f64)> {
    let mut pairs = Vec::with_capacity(cells.len() / 2);
    for (i, pair) in cells.chunks_exact(2).enumerate() {
        let (source, weight) = (pair[0].as_str(), pair[1].as_str());
        if source.is_empty() || weight.is_empty() {
            debug!("Data transform {output:?}: pair list ends at index {}", i * 2);
            break;
        }
        match weight.trim().parse::<f64>() {
            Ok(w) => pairs.push((source, w)),
            Err(_) => {
                warn!(
                    "Found invalid config! Data name: {output}, index: {}, weight {weight:?}",
                    i * 2 + 1
                );
                break;
            }
        }
    }
    pairs
}

fn lookup_ignore_case<'a>(inputs: &'a IndexMap<String, Vec<f64>>, name: &str) -> &'a [f64] {
    let wanted = name.to_lowercase();
    inputs
        .iter()
        .find(|(k, _)| k.to_lowercase() == wanted)
        .map(|(_, v)| v.as_slice())
        .unwrap_or(&[])
}
