//! Low-level helpers shared by the workbook reader and the table writers.
pub(crate) mod xml;
pub(crate) mod zip;

#[cfg(test)]
pub(crate) mod fixtures;
