//! Part lookup inside a workbook's ZIP package.
use crate::error::EtlError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::ZipArchive;

/// Buffered XML reader over one part of the archive
pub(crate) type XmlPart<'a, RS> = XmlReader<BufReader<ZipFile<'a, RS>>>;

pub(crate) trait PackageExt<RS: Read + Seek> {
    /// Opens the part `name`, or `None` if the package has no such part.
    ///
    /// Writers disagree on case and path separators, so an exact match is
    /// tried first and a case-insensitive `/`-normalized match second.
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, EtlError>;

    /// Opens the part `name` for event-based XML reading.
    fn xml_part(&'_ mut self, name: &str) -> Result<Option<XmlPart<'_, RS>>, EtlError>;
}

impl<RS: Read + Seek> PackageExt<RS> for ZipArchive<RS> {
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, EtlError> {
        let index = self.index_for_name(name).or_else(|| {
            let wanted = name.replace('\\', "/");
            self.file_names()
                .find(|candidate| candidate.replace('\\', "/").eq_ignore_ascii_case(&wanted))
                .and_then(|candidate| self.index_for_name(candidate))
        });
        match index {
            Some(index) => Ok(Some(self.by_index(index)?)),
            None => Ok(None),
        }
    }

    fn xml_part(&'_ mut self, name: &str) -> Result<Option<XmlPart<'_, RS>>, EtlError> {
        Ok(self.part(name)?.map(|file| XmlReader::new(BufReader::new(file))))
    }
}
