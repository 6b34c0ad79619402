use crate::imd::ImdError;

/// Geographic resolution of an IMD workbook, read from its file name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Aggregated areas (districts, counties); one name column after the code
    Summary,
    /// Lower layer super output areas; three extra geography columns after the code
    Lsoa,
}

impl Resolution {
    /// Classifies `file_name` by the character at `position`: `marker` means
    /// LSOA resolution, anything else summary resolution.
    pub fn classify(file_name: &str, position: usize, marker: char) -> Result<Self, ImdError> {
        match file_name.chars().nth(position) {
            Some(character) if character == marker => Ok(Resolution::Lsoa),
            Some(_) => Ok(Resolution::Summary),
            None => Err(ImdError::FileNameTooShort {
                file: file_name.to_owned(),
                position,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_marker() {
        assert_eq!(Resolution::classify("IMD_19_LSOA.xlsx", 6, '_').unwrap(), Resolution::Lsoa);
        assert_eq!(Resolution::classify("IMD_19LAD.xlsx", 6, '_').unwrap(), Resolution::Summary);
        assert_eq!(Resolution::classify("E01000001_IMD.xlsx", 6, '_').unwrap(), Resolution::Summary);
    }

    #[test]
    fn short_name() {
        let error = Resolution::classify("IMD.x", 6, '_').unwrap_err();
        assert!(matches!(error, ImdError::FileNameTooShort { ref file, position: 6 } if file == "IMD.x"));
        assert!(Resolution::classify("IMD_19_", 6, '_').is_ok());
    }
}
