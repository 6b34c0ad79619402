//! Pipeline configuration.
//!
//! Every constant the pipelines depend on lives here: directory layout, sheet
//! exclusions, the filename classification marker, column maps, the join plan
//! and the bridge plan. A configuration is built once, checked with
//! `validate()` when a pipeline is constructed and never mutated afterwards.
use crate::lookup::bridge::DedupPolicy;
use crate::spreadsheet::criteria::Criteria;
use crate::table::column::positions;
use crate::table::column::ColumnSelector;
use glob::Pattern;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Raw workbook directory, relative to the project root
pub const IMD_INPUT_DIR: &str = "Raw/IMD Data";
/// Processed IMD output directory, relative to the project root
pub const IMD_OUTPUT_DIR: &str = "Processed/IMD Data";
/// Raw lookup directory, relative to the project root
pub const LOOKUP_INPUT_DIR: &str = "Raw/Lookups";
/// Processed lookup output directory, relative to the project root
pub const LOOKUP_OUTPUT_DIR: &str = "Processed/Lookups";

/// Geography code header of the base lookup file
pub const BASE_KEY: &str = "LSOA code (2011)";
/// Geography code header of every joined lookup file
pub const JOIN_KEY: &str = "LSOA11CD";

/// Errors raised when a configuration is internally inconsistent
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration value '{0}' must not be empty")]
    EmptyValue(&'static str),

    #[error("Attribute and value columns share the name '{0}'")]
    DuplicateOutputColumn(String),

    #[error("At least one identity column is required")]
    NoIdentityColumns,

    #[error("Bridge table '{0}' is configured more than once")]
    DuplicateBridge(String),

    #[error("Bridge table '{0}' would overwrite the master lookup file")]
    BridgeNameClash(String),
}

/// Settings for the IMD workbook pipeline
#[derive(Clone, Debug)]
pub struct ImdConfig {
    /// Directory the workbooks are read from
    pub input_dir: PathBuf,
    /// Directory the per-sheet CSV files are written to
    pub output_dir: PathBuf,
    /// Workbook file name pattern
    pub file_pattern: Pattern,
    /// Sheet exclusions and error cell handling
    pub criteria: Criteria,
    /// Zero-based character position inspected to classify a file name
    pub resolution_position: usize,
    /// Character at `resolution_position` marking an LSOA-resolution file
    pub resolution_marker: char,
    /// Columns dropped from every sheet of a summary-resolution file
    pub summary_columns: Vec<ColumnSelector>,
    /// Columns dropped from every sheet of an LSOA-resolution file
    pub lsoa_columns: Vec<ColumnSelector>,
    /// Leading columns repeated on every EAV row
    pub id_columns: usize,
    /// First column melted into attribute/value pairs
    pub value_start: usize,
    /// Header of the melted attribute column
    pub attribute_name: String,
    /// Header of the melted value column
    pub value_name: String,
}

impl ImdConfig {
    /// Standard layout under `root`: `Raw/IMD Data` to `Processed/IMD Data`.
    pub fn with_root(root: &Path) -> Self {
        ImdConfig {
            input_dir: root.join(IMD_INPUT_DIR),
            output_dir: root.join(IMD_OUTPUT_DIR),
            file_pattern: Pattern::new("*.xlsx").expect("Hardcode workbook pattern"),
            criteria: Criteria::default(),
            resolution_position: 6,
            resolution_marker: '_',
            summary_columns: positions(&[1]),
            lsoa_columns: positions(&[1, 2, 3]),
            id_columns: 2,
            value_start: 1,
            attribute_name: "attribute".to_owned(),
            value_name: "value".to_owned(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attribute_name.is_empty() {
            Err(ConfigError::EmptyValue("attribute_name"))?
        }
        if self.value_name.is_empty() {
            Err(ConfigError::EmptyValue("value_name"))?
        }
        if self.attribute_name == self.value_name {
            Err(ConfigError::DuplicateOutputColumn(self.value_name.to_owned()))?
        }
        if self.id_columns == 0 {
            Err(ConfigError::NoIdentityColumns)?
        }
        Ok(())
    }
}

/// One left-join of the master build: `file` is joined where the running
/// table's `left_on` equals the file's `right_on`.
#[derive(Clone, Debug)]
pub struct JoinStep {
    pub file: String,
    pub left_on: String,
    pub right_on: String,
}

impl JoinStep {
    fn new(file: &str) -> Self {
        JoinStep {
            file: file.to_owned(),
            left_on: BASE_KEY.to_owned(),
            right_on: JOIN_KEY.to_owned(),
        }
    }
}

/// A bridge table taken from two columns of the joined master table
#[derive(Clone, Debug)]
pub struct BridgeSpec {
    /// Output name; the file is written as `{name}.csv`
    pub name: String,
    /// Geography code column
    pub code: ColumnSelector,
    /// Geography name column
    pub label: ColumnSelector,
}

impl BridgeSpec {
    fn new(name: &str, code: usize, label: usize) -> Self {
        BridgeSpec {
            name: name.to_owned(),
            code: code.into(),
            label: label.into(),
        }
    }
}

/// Settings for the geographic lookup pipeline
#[derive(Clone, Debug)]
pub struct LookupConfig {
    /// Directory the lookup CSV files are read from
    pub input_dir: PathBuf,
    /// Directory the master and bridge files are written to
    pub output_dir: PathBuf,
    /// Lookup file every join starts from
    pub base_file: String,
    /// Joins applied to the base file, in order
    pub joins: Vec<JoinStep>,
    /// Bridge tables built from the joined master table, in output order
    pub bridges: Vec<BridgeSpec>,
    /// Columns removed from the master table once the bridges are built
    pub removed_columns: Vec<ColumnSelector>,
    /// How bridge tables are deduplicated
    pub dedup: DedupPolicy,
    /// Output file name of the master table
    pub master_file_name: String,
}

impl LookupConfig {
    /// Standard layout under `root`: `Raw/Lookups` to `Processed/Lookups`.
    pub fn with_root(root: &Path) -> Self {
        LookupConfig {
            input_dir: root.join(LOOKUP_INPUT_DIR),
            output_dir: root.join(LOOKUP_OUTPUT_DIR),
            base_file: "LSOA_District_lookup.csv".to_owned(),
            joins: vec![
                JoinStep::new("LSOA_DistrictUT_lookup.csv"),
                JoinStep::new("LSOA_LEP_lookup.csv"),
                JoinStep::new("LSOA_CCG_lookup.csv"),
            ],
            bridges: vec![
                BridgeSpec::new("lad_bridge", 2, 3),
                BridgeSpec::new("lad_ut_bridge", 6, 7),
                BridgeSpec::new("lep_bridge", 10, 11),
                BridgeSpec::new("ccg_bridge", 14, 16),
            ],
            removed_columns: positions(&[3, 4, 5, 7, 8, 9, 11, 12, 13, 15, 16]),
            dedup: DedupPolicy::default(),
            master_file_name: "MasterLookUp.csv".to_owned(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_file.is_empty() {
            Err(ConfigError::EmptyValue("base_file"))?
        }
        if self.master_file_name.is_empty() {
            Err(ConfigError::EmptyValue("master_file_name"))?
        }
        if self.joins.iter().any(|join| join.file.is_empty()) {
            Err(ConfigError::EmptyValue("joins.file"))?
        }

        let mut names = HashSet::<&str>::new();
        for bridge in &self.bridges {
            if bridge.name.is_empty() {
                Err(ConfigError::EmptyValue("bridges.name"))?
            }
            if !names.insert(bridge.name.as_str()) {
                Err(ConfigError::DuplicateBridge(bridge.name.to_owned()))?
            }
            if self.master_file_name == format!("{}.csv", bridge.name) {
                Err(ConfigError::BridgeNameClash(bridge.name.to_owned()))?
            }
        }
        Ok(())
    }
}
