//! # IMD Pipeline
//!
//! Turns a directory of wide IMD workbooks into headerless EAV CSV files, one
//! per data sheet. Stages run in order and each hands the whole workbook
//! collection to the next:
//!
//! 1. `load` reads every matching workbook, skipping the non-data sheets
//! 2. `strip_columns` drops geography columns chosen by the file's [`Resolution`]
//! 3. `to_eav` melts each sheet into identity, attribute and value columns
//! 4. `write` stores sheet `i` of `file` as `{i}_{file}`
pub mod resolution;

use crate::config::ImdConfig;
use crate::error::EtlError;
use crate::error::ResultMessage;
use crate::spreadsheet::read_workbook;
use crate::table::io::list_files;
use crate::table::io::write_csv;
use crate::table::Table;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use tracing::info;

pub use crate::imd::resolution::Resolution;

/// Errors specific to IMD workbook processing
#[derive(Error, Debug)]
pub enum ImdError {
    #[error("File name '{file}' is too short to classify: no character at position {position}")]
    FileNameTooShort { file: String, position: usize },
}

/// Workbook file name to its data sheets, in workbook order
pub type Workbooks = BTreeMap<String, Vec<Table>>;

pub struct ImdPipeline {
    config: ImdConfig,
}

impl ImdPipeline {
    /// Creates a pipeline after checking the configuration.
    pub fn new(config: ImdConfig) -> Result<Self, EtlError> {
        config.validate()?;
        Ok(ImdPipeline { config })
    }

    pub fn config(&self) -> &ImdConfig {
        &self.config
    }

    /// Loads every workbook in the input directory matching the file pattern.
    pub fn load(&self) -> Result<Workbooks, EtlError> {
        let input_dir = &self.config.input_dir;
        let files = list_files(input_dir, Some(&self.config.file_pattern))
            .with_prefix(&input_dir.display().to_string())?;

        let mut workbooks = Workbooks::new();
        for (file_name, path) in files {
            let tables = read_workbook(&path, &self.config.criteria)?;
            info!("{file_name} loaded successfully");
            workbooks.insert(file_name, tables);
        }
        info!("All files loaded");
        Ok(workbooks)
    }

    /// Drops the geography columns of each sheet according to the file's
    /// resolution.
    ///
    /// Every selector is resolved before the sheet is touched, so a sheet
    /// whose layout drifted fails with the offending column instead of losing
    /// the wrong one.
    pub fn strip_columns(&self, mut workbooks: Workbooks) -> Result<Workbooks, EtlError> {
        for (file_name, tables) in workbooks.iter_mut() {
            let resolution = Resolution::classify(
                file_name,
                self.config.resolution_position,
                self.config.resolution_marker,
            )?;
            let selectors = match resolution {
                Resolution::Summary => &self.config.summary_columns,
                Resolution::Lsoa => &self.config.lsoa_columns,
            };
            for table in tables.iter_mut() {
                let indexes = table
                    .resolve_all(selectors)
                    .map_err(EtlError::from)
                    .with_prefix(file_name)?;
                table
                    .drop_columns(&indexes)
                    .map_err(EtlError::from)
                    .with_prefix(file_name)?;
                debug!(file = %file_name, sheet = %table.name, ?resolution, columns = table.width(), "columns stripped");
            }
        }
        Ok(workbooks)
    }

    /// Melts every sheet into entity-attribute-value form.
    pub fn to_eav(&self, workbooks: Workbooks) -> Result<Workbooks, EtlError> {
        let mut melted = Workbooks::new();
        for (file_name, tables) in workbooks {
            let mut sheets = Vec::with_capacity(tables.len());
            for table in &tables {
                let eav = table
                    .melt(
                        self.config.id_columns,
                        self.config.value_start,
                        &self.config.attribute_name,
                        &self.config.value_name,
                    )
                    .map_err(EtlError::from)
                    .with_prefix(&file_name)?;
                debug!(file = %file_name, sheet = %table.name, rows = eav.height(), "sheet reshaped");
                sheets.push(eav);
            }
            melted.insert(file_name, sheets);
        }
        Ok(melted)
    }

    /// Writes sheet `i` of every workbook to `{i}_{file name}` in the output
    /// directory, creating the directory if needed.
    pub fn write(&self, workbooks: &Workbooks) -> Result<Vec<PathBuf>, EtlError> {
        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir)?;

        let mut written = Vec::<PathBuf>::new();
        for (file_name, tables) in workbooks {
            for (index, table) in tables.iter().enumerate() {
                let path = write_csv(table, output_dir, &format!("{index}_{file_name}"))?;
                written.push(path);
            }
            info!("{file_name} written ({} sheets)", tables.len());
        }
        Ok(written)
    }

    /// Runs every stage in order and returns the files written.
    pub fn run(&self) -> Result<Vec<PathBuf>, EtlError> {
        let workbooks = self.load()?;
        let workbooks = self.strip_columns(workbooks)?;
        let workbooks = self.to_eav(workbooks)?;
        self.write(&workbooks)
    }
}
