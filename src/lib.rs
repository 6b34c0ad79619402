//! # IMD ETL
//!
//! Batch conversion of English Indices of Multiple Deprivation (IMD) workbooks
//! and geographic lookup files into headerless CSV ready for bulk loading.
//!
//! ## Pipelines
//!
//! - [`ImdPipeline`]: reads `.xlsx` workbooks, drops the non-data sheets and
//!   the geography columns implied by each file name, melts every sheet into
//!   entity-attribute-value rows and writes one CSV per sheet.
//! - [`LookupPipeline`]: left-joins the LSOA lookup files into a master
//!   lookup, derives deduplicated code/name bridge tables from it and writes
//!   the master and bridge CSVs.
//!
//! Both pipelines are configured by an immutable struct ([`ImdConfig`],
//! [`LookupConfig`]) and expose one method per stage plus `run`.
//!
//! ## Workbooks
//!
//! Excel files are read directly from their Office Open XML package: the ZIP
//! archive is opened with `zip` and each part is streamed with `quick-xml`.
pub mod config;
pub mod error;
pub(crate) mod helpers;
pub mod imd;
pub mod lookup;
pub mod spreadsheet;
pub mod table;

pub use crate::config::ImdConfig;
pub use crate::config::LookupConfig;
pub use crate::error::EtlError;
pub use crate::imd::ImdPipeline;
pub use crate::lookup::LookupPipeline;
pub use crate::table::Table;
