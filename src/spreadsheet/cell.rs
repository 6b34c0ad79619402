use crate::error::EtlError;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::SpreadsheetError;
use chrono::NaiveDate;
use chrono::TimeDelta;

/// How the raw text of a cell is interpreted.
///
/// Numbers carrying a date or time style keep the epoch of their workbook
/// (1900 or 1904 date system) in the variant.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// `1` or `0`
    Boolean,
    Number,
    NumberDateTime1900,
    NumberDate1900,
    NumberTime1900,
    NumberDateTime1904,
    NumberDate1904,
    NumberTime1904,
    /// `t="d"` cells holding ISO 8601 text
    IsoDateTime,
    InlineString,
    /// Index into the shared string table
    SharedString,
    /// `#N/A`, `#DIV/0!` and friends
    Error,
}

impl CellType {
    /// Cell type of a built-in number format id, `None` for non-date formats.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        let (date_time, date, time) = if is_1904 {
            (Self::NumberDateTime1904, Self::NumberDate1904, Self::NumberTime1904)
        } else {
            (Self::NumberDateTime1900, Self::NumberDate1900, Self::NumberTime1900)
        };
        match id.parse::<u32>().ok()? {
            22 => Some(date_time),
            14..=17 => Some(date),
            18..=21 | 45..=47 => Some(time),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Literal sections, escapes and bracketed colours are ignored.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_literal => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }
}

/// A single cell read from a worksheet.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Raw cell value; shared strings are already resolved
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Renders the cell as the text written to CSV output.
    /// Date/time formatted numbers become ISO strings.
    pub(crate) fn to_text(&self) -> Result<String, EtlError> {
        let text = match self.kind {
            CellType::Boolean => if self.value == "1" { "true" } else { "false" }.to_owned(),
            CellType::NumberDateTime1900 => to_datetime_string(&self.value, false)?,
            CellType::NumberDateTime1904 => to_datetime_string(&self.value, true)?,
            CellType::NumberDate1900 => to_date_string(&self.value, false)?,
            CellType::NumberDate1904 => to_date_string(&self.value, true)?,
            CellType::NumberTime1900 | CellType::NumberTime1904 => to_time_string(&self.value)?,
            CellType::IsoDateTime => self.value.replace('T', " "),
            _ => self.value.to_owned(),
        };
        Ok(text)
    }
}

/// Parses a date serial; Excel has no negative or non-finite dates.
fn to_serial(value: &str) -> Result<f64, EtlError> {
    let serial = value.parse::<f64>()?;
    if !serial.is_finite() || serial < 0.0 {
        Err(SpreadsheetError::DateValueError(value.to_owned()))?
    }
    Ok(serial)
}

/// Converts Excel numeric date to ISO date string.
/// Handles Lotus 1-2-3 leap year bug for 1900 epoch.
fn to_date_string(value: &str, is_1904: bool) -> Result<String, EtlError> {
    let days = to_serial(value)?.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate Literal");
    let date = days
        .checked_add(offset)
        .and_then(TimeDelta::try_days)
        .and_then(|delta| epoch.checked_add_signed(delta))
        .ok_or_else(|| SpreadsheetError::DateValueError(value.to_owned()))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Converts the fractional day of an Excel number to an ISO time string.
fn to_time_string(value: &str) -> Result<String, EtlError> {
    let factor = to_serial(value)?.fract();
    let mut total = (factor * 86_400_000f64).round() as i64;
    let milliseconds = total % 1_000; total /= 1_000;
    let seconds = total % 60; total /= 60;
    let minutes = total % 60; total /= 60;
    let hours = total;
    let timestamp = if milliseconds > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    };
    Ok(timestamp)
}

/// Converts Excel numeric datetime to ISO datetime string.
fn to_datetime_string(value: &str, is_1904: bool) -> Result<String, EtlError> {
    let date = to_date_string(value, is_1904)?;
    let time = to_time_string(value)?;
    Ok(format!("{date} {time}"))
}
