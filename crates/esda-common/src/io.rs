//! JSON persistence for datasets.
//!
//! Cycle stages exchange datasets as JSON documents on disk
//! (`bg_<date>_<cycle>.json`, `analysis_<date>_<cycle>.json`, ...).

use crate::dataset::{Dataset, StandardizedDataset};
use crate::error::DatasetResult;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

impl Dataset {
    /// Load a dataset from a JSON document and check its shapes.
    pub fn from_json_file(path: impl AsRef<Path>) -> DatasetResult<Self> {
        let file = File::open(path.as_ref())?;
        let dataset: Dataset = serde_json::from_reader(BufReader::new(file))?;
        dataset.check()?;
        Ok(dataset)
    }

    /// Write the dataset as a JSON document, creating parent directories.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> DatasetResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

impl StandardizedDataset {
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> DatasetResult<()> {
        self.as_ref().to_json_file(path)
    }
}
