//! # Lookup Pipeline
//!
//! Joins the geographic lookup files into one master lookup keyed by LSOA,
//! derives the code/name bridge tables from it and writes both out as
//! headerless CSV.
pub mod bridge;

use crate::config::LookupConfig;
use crate::error::EtlError;
use crate::error::ResultMessage;
use crate::lookup::bridge::build_bridge;
use crate::table::io::list_files;
use crate::table::io::read_csv;
use crate::table::io::write_csv;
use crate::table::Table;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use tracing::info;

/// Errors specific to lookup processing
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Lookup file '{0}' is missing from the input directory")]
    MissingInput(String),
}

/// Lookup file name to its table
pub type Lookups = BTreeMap<String, Table>;

pub struct LookupPipeline {
    config: LookupConfig,
}

impl LookupPipeline {
    /// Creates a pipeline after checking the configuration.
    pub fn new(config: LookupConfig) -> Result<Self, EtlError> {
        config.validate()?;
        Ok(LookupPipeline { config })
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Reads every file in the input directory as a CSV table with a header row.
    pub fn load(&self) -> Result<Lookups, EtlError> {
        let input_dir = &self.config.input_dir;
        let files = list_files(input_dir, None).with_prefix(&input_dir.display().to_string())?;

        let mut lookups = Lookups::new();
        for (file_name, path) in files {
            let table = read_csv(&path).with_prefix(&file_name)?;
            info!("{file_name} loaded successfully");
            lookups.insert(file_name, table);
        }
        Ok(lookups)
    }

    /// Left-joins the configured lookups onto the base file, in order.
    ///
    /// The result has exactly one row per base row.
    pub fn create_master(&self, lookups: &Lookups) -> Result<Table, EtlError> {
        let mut master = self.lookup(lookups, &self.config.base_file)?.clone();
        for join in &self.config.joins {
            let right = self.lookup(lookups, &join.file)?;
            master = master
                .left_join(right, &join.left_on, &join.right_on)
                .map_err(EtlError::from)
                .with_prefix(&join.file)?;
            debug!(file = %join.file, columns = master.width(), "lookup joined");
        }
        master.name = self.config.master_file_name.to_owned();
        info!("Master lookup created ({} rows, {} columns)", master.height(), master.width());
        Ok(master)
    }

    /// Builds every configured bridge table from the joined master table.
    pub fn create_bridge_tables(&self, master: &Table) -> Result<Vec<Table>, EtlError> {
        let mut bridges = Vec::with_capacity(self.config.bridges.len());
        for spec in &self.config.bridges {
            let bridge = build_bridge(master, spec, self.config.dedup)
                .map_err(EtlError::from)
                .with_prefix(&spec.name)?;
            debug!(bridge = %spec.name, rows = bridge.height(), "bridge table created");
            bridges.push(bridge);
        }
        Ok(bridges)
    }

    /// Drops the configured columns from the master table.
    pub fn remove_columns(&self, mut master: Table) -> Result<Table, EtlError> {
        let indexes = master.resolve_all(&self.config.removed_columns)?;
        master.drop_columns(&indexes)?;
        Ok(master)
    }

    /// Writes the master table and every bridge table to the output directory.
    pub fn write(&self, master: &Table, bridges: &[Table]) -> Result<Vec<PathBuf>, EtlError> {
        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir)?;

        let mut written = vec![write_csv(master, output_dir, &self.config.master_file_name)?];
        info!("{} written", self.config.master_file_name);
        for bridge in bridges {
            let file_name = format!("{}.csv", bridge.name);
            written.push(write_csv(bridge, output_dir, &file_name)?);
            info!("{file_name} written");
        }
        Ok(written)
    }

    /// Runs every stage in order and returns the files written.
    ///
    /// Bridges are taken from the master table before its columns are removed.
    pub fn run(&self) -> Result<Vec<PathBuf>, EtlError> {
        let lookups = self.load()?;
        let master = self.create_master(&lookups)?;
        let bridges = self.create_bridge_tables(&master)?;
        let master = self.remove_columns(master)?;
        self.write(&master, &bridges)
    }

    fn lookup<'a>(&self, lookups: &'a Lookups, file_name: &str) -> Result<&'a Table, LookupError> {
        lookups
            .get(file_name)
            .ok_or_else(|| LookupError::MissingInput(file_name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LOOKUP_INPUT_DIR;
    use crate::lookup::bridge::DedupPolicy;
    use std::collections::HashSet;
    use std::path::Path;
    use tempfile::tempdir;

    const DISTRICT: &str = "\
LSOA code (2011),LSOA name (2011),LAD19CD,LAD19NM
E01011949,Hartlepool 009A,E06000001,Hartlepool
E01011950,Hartlepool 008A,E06000001,Hartlepool
E01012052,Middlesbrough 001A,E06000002,Middlesbrough
W01000001,Isle of Anglesey 007A,W06000001,Isle of Anglesey
";

    const DISTRICT_UT: &str = "\
LSOA11CD,LSOA11NM,UTLA19CD,UTLA19NM,FID
E01011949,Hartlepool 009A,E06000001,Hartlepool,1
E01011950,Hartlepool 008A,E06000001,Hartlepool,2
E01012052,Middlesbrough 001A,E06000002,Middlesbrough,3
";

    const LEP: &str = "\
LSOA11CD,LEP17CD,LEP17NM,LSOA11NM,FID
E01011949,E37000034,Tees Valley,Hartlepool 009A,1
E01011950,E37000034,Tees Valley,Hartlepool 008A,2
E01012052,E37000034,Tees Valley,Middlesbrough 001A,3
E01012052,E37000099,Duplicate,Middlesbrough 001A,4
";

    const CCG: &str = "\
CCG19CD,LSOA11CD,CCG19NM,FID
E38000075,E01011949,NHS Hartlepool and Stockton-on-Tees CCG,1
E38000075,E01011950,NHS Hartlepool and Stockton-on-Tees CCG,2
E38000162,E01012052,NHS South Tees CCG,3
";

    fn write_lookups(root: &Path, skip: Option<&str>) {
        let dir = root.join(LOOKUP_INPUT_DIR);
        fs::create_dir_all(&dir).unwrap();
        let files = [
            ("LSOA_District_lookup.csv", DISTRICT),
            ("LSOA_DistrictUT_lookup.csv", DISTRICT_UT),
            ("LSOA_LEP_lookup.csv", LEP),
            ("LSOA_CCG_lookup.csv", CCG),
        ];
        for (name, content) in files {
            if Some(name) != skip {
                fs::write(dir.join(name), content).unwrap();
            }
        }
    }

    fn pipeline(root: &Path) -> LookupPipeline {
        LookupPipeline::new(LookupConfig::with_root(root)).unwrap()
    }

    #[test]
    fn master_keeps_every_base_row() {
        let root = tempdir().unwrap();
        write_lookups(root.path(), None);
        let pipeline = pipeline(root.path());

        let master = pipeline.create_master(&pipeline.load().unwrap()).unwrap();
        assert_eq!(master.name, "MasterLookUp.csv");
        assert_eq!(master.height(), 4);
        assert_eq!(master.width(), 18);
        assert_eq!(master.columns[4], "LSOA11CD_x");
        assert_eq!(master.columns[9], "LSOA11CD_y");
        assert_eq!(master.columns[15], "LSOA11CD");
        // duplicated LEP key joins its first row
        assert_eq!(master.rows[2][11].as_deref(), Some("Tees Valley"));
        // unmatched base row
        assert_eq!(master.rows[3][0].as_deref(), Some("W01000001"));
        assert!(master.rows[3][4..].iter().all(Option::is_none));
    }

    #[test]
    fn bridges_have_distinct_values() {
        let root = tempdir().unwrap();
        write_lookups(root.path(), None);
        let pipeline = pipeline(root.path());

        let master = pipeline.create_master(&pipeline.load().unwrap()).unwrap();
        let bridges = pipeline.create_bridge_tables(&master).unwrap();
        let names: Vec<_> = bridges.iter().map(|bridge| bridge.name.as_str()).collect();
        assert_eq!(names, vec!["lad_bridge", "lad_ut_bridge", "lep_bridge", "ccg_bridge"]);

        for bridge in &bridges {
            for index in 0..2 {
                let values: Vec<_> = bridge.column_values(index).filter(|value| value.is_some()).collect();
                let distinct: HashSet<_> = values.iter().collect();
                assert_eq!(values.len(), distinct.len(), "{} column {index}", bridge.name);
            }
        }

        let lad = &bridges[0];
        assert_eq!(lad.height(), 3);
        assert_eq!(lad.rows[2], vec![Some("W06000001".to_owned()), Some("Isle of Anglesey".to_owned())]);

        // E37000034 and an unmatched null against Tees Valley and null
        let lep = &bridges[2];
        assert_eq!(lep.height(), 2);
        assert_eq!(lep.rows[1], vec![None, None]);

        let ccg = &bridges[3];
        assert_eq!(ccg.rows[1], vec![Some("E38000162".to_owned()), Some("NHS South Tees CCG".to_owned())]);
    }

    #[test]
    fn pair_policy_bridges() {
        let root = tempdir().unwrap();
        write_lookups(root.path(), None);
        let mut config = LookupConfig::with_root(root.path());
        config.dedup = DedupPolicy::Pair;
        let pipeline = LookupPipeline::new(config).unwrap();

        let master = pipeline.create_master(&pipeline.load().unwrap()).unwrap();
        let bridges = pipeline.create_bridge_tables(&master).unwrap();
        assert_eq!(bridges[1].height(), 3);
        assert_eq!(bridges[1].rows[2], vec![None, None]);
    }

    #[test]
    fn remove_master_columns() {
        let root = tempdir().unwrap();
        write_lookups(root.path(), None);
        let pipeline = pipeline(root.path());

        let master = pipeline.create_master(&pipeline.load().unwrap()).unwrap();
        let master = pipeline.remove_columns(master).unwrap();
        assert_eq!(
            master.columns,
            vec!["LSOA code (2011)", "LSOA name (2011)", "LAD19CD", "UTLA19CD", "LEP17CD", "CCG19CD", "FID"]
        );
        assert_eq!(master.height(), 4);
    }

    #[test]
    fn missing_lookup_file() {
        let root = tempdir().unwrap();
        write_lookups(root.path(), Some("LSOA_LEP_lookup.csv"));
        let pipeline = pipeline(root.path());

        let error = pipeline.create_master(&pipeline.load().unwrap()).unwrap_err();
        assert!(matches!(error, EtlError::LookupError(LookupError::MissingInput(ref file)) if file == "LSOA_LEP_lookup.csv"));
    }

    #[test]
    fn run_end_to_end() {
        let root = tempdir().unwrap();
        write_lookups(root.path(), None);
        let config = LookupConfig::with_root(root.path());
        let output_dir = config.output_dir.to_owned();

        let written = LookupPipeline::new(config).unwrap().run().unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|path| path.strip_prefix(&output_dir).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["MasterLookUp.csv", "lad_bridge.csv", "lad_ut_bridge.csv", "lep_bridge.csv", "ccg_bridge.csv"]);

        let master = fs::read_to_string(output_dir.join("MasterLookUp.csv")).unwrap();
        assert_eq!(master.lines().next(), Some("E01011949,Hartlepool 009A,E06000001,E06000001,E37000034,E38000075,1"));
        assert_eq!(master.lines().last(), Some("W01000001,Isle of Anglesey 007A,W06000001,,,,"));

        let lad = fs::read_to_string(output_dir.join("lad_bridge.csv")).unwrap();
        assert_eq!(lad, "E06000001,Hartlepool\nE06000002,Middlesbrough\nW06000001,Isle of Anglesey\n");
    }
}
