//! Streaming access to the XML parts of a workbook package.
//!
//! Parts are read event by event with quick-xml. Attribute values come back
//! as owned, unescaped strings and element text is accumulated with entity and
//! character references resolved.

use crate::error::EtlError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

/// Run of phonetic hints inside a rich text string; never part of the value
const PHONETIC_RUN: QName = QName(b"rPh");
/// Text run inside a rich text string
const TEXT_RUN: QName = QName(b"t");

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown entity '&{0};'")]
    UnknownEntity(String),

    #[error("Invalid value '{value}' for attribute '{name}'")]
    InvalidAttributeValue { name: String, value: String },
}

/// Event reader over one XML part
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(source: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        // `<c/>` arrives as Start + End so callers only match Start/End pairs
        config.expand_empty_elements = true;
        config.check_end_names = false;
        config.check_comments = false;
        config.trim_text(false);
        XmlReader {
            reader,
            buffer: Vec::with_capacity(4096),
        }
    }

    /// Next event, or `None` once the document ends
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, EtlError> {
        self.buffer.clear();
        let event = self.reader.read_event_into(&mut self.buffer)?;
        Ok(match event {
            Event::Eof => None,
            event => Some(event),
        })
    }

    /// Collects the text of the current element up to its `end` tag.
    ///
    /// With `bare_text` the element's own text counts (as in `<v>`);
    /// otherwise only `<t>` runs do (as in `<is>` and `<si>`). Phonetic runs
    /// are skipped either way.
    pub(crate) fn read_text(&mut self, end: QName, bare_text: bool) -> Result<String, EtlError> {
        let mut text = String::new();
        let mut in_phonetic_run = false;
        let mut in_text = bare_text;
        while let Some(event) = self.next()? {
            match event {
                Event::End(event) if event.name() == end => break,
                Event::Start(event) if event.name() == PHONETIC_RUN => in_phonetic_run = true,
                Event::End(event) if event.name() == PHONETIC_RUN => in_phonetic_run = false,
                Event::Start(event) if event.name() == TEXT_RUN => in_text = !in_phonetic_run,
                Event::End(event) if event.name() == TEXT_RUN => in_text = bare_text,
                Event::Text(event) if in_text => push_text(&mut text, &event)?,
                Event::CData(event) if in_text => text.push_str(&event.xml_content()?),
                Event::GeneralRef(event) if in_text => push_reference(&mut text, &event)?,
                _ => (),
            }
        }
        Ok(text)
    }
}

/// Attribute lookup on start tags
pub(crate) trait StartTagExt {
    /// Unescaped value of the attribute `name`, if present
    fn attribute(&self, name: &str) -> Result<Option<String>, EtlError>;

    /// Value of the attribute `name` parsed as `T`, if present
    fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, EtlError>;
}

impl StartTagExt for BytesStart<'_> {
    fn attribute(&self, name: &str) -> Result<Option<String>, EtlError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute_value(&attribute))
            .transpose()
    }

    fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, EtlError> {
        let Some(value) = self.attribute(name)? else {
            return Ok(None);
        };
        match value.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(XmlError::InvalidAttributeValue {
                name: name.to_owned(),
                value,
            })?,
        }
    }
}

/// Unescaped value of one attribute
pub(crate) fn attribute_value(attribute: &Attribute) -> Result<String, EtlError> {
    Ok(attribute.unescape_value()?.into_owned())
}

/// Appends a text event to `text`
pub(crate) fn push_text(text: &mut String, event: &BytesText) -> Result<(), EtlError> {
    text.push_str(&event.xml_content()?);
    Ok(())
}

/// Appends a resolved entity (`&amp;`) or character reference (`&#65;`, `&#x41;`)
pub(crate) fn push_reference(text: &mut String, event: &BytesRef) -> Result<(), EtlError> {
    let name = event.xml_content()?;
    let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        Some(hex) => Some(u32::from_str_radix(hex, 16)?),
        None => name.strip_prefix('#').map(str::parse::<u32>).transpose()?,
    };
    match code {
        Some(code) => text.extend(char::from_u32(code)),
        None => match resolve_xml_entity(&name) {
            Some(entity) => text.push_str(entity),
            None => Err(XmlError::UnknownEntity(name.to_string()))?,
        },
    }
    Ok(())
}

/// Loops over the events of an [`XmlReader`], ignoring unmatched ones
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next()? {
            match event {
                $($arms)*
                _ => (),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(xml: &str) -> XmlReader<Cursor<&[u8]>> {
        XmlReader::new(Cursor::new(xml.as_bytes()))
    }

    fn text_of(xml: &str, end: &[u8], bare_text: bool) -> Result<String, EtlError> {
        let mut reader = reader(xml);
        // skip the opening tag
        reader.next()?;
        reader.read_text(QName(end), bare_text)
    }

    #[test]
    fn value_text_with_references() {
        assert_eq!(text_of("<v>Terms &amp; Conditions</v>", b"v", true).unwrap(), "Terms & Conditions");
        assert_eq!(text_of("<v>&#65;&#x42;C</v>", b"v", true).unwrap(), "ABC");
        assert!(text_of("<v>&bogus;</v>", b"v", true).is_err());
    }

    #[test]
    fn rich_text_skips_phonetic_runs() {
        let xml = "<si><r><t>Leeds</t></r><r><t xml:space=\"preserve\"> 001A</t></r><rPh><t>リーズ</t></rPh></si>";
        assert_eq!(text_of(xml, b"si", false).unwrap(), "Leeds 001A");
    }

    #[test]
    fn attributes() -> Result<(), EtlError> {
        let mut reader = reader(r#"<c r="B3" s="4" t="s" n="Terms &amp; Conditions"/>"#);
        let mut found = false;
        match_xml_events!(reader => {
            Event::Start(event) => {
                assert_eq!(event.attribute("r")?.as_deref(), Some("B3"));
                assert_eq!(event.attribute("n")?.as_deref(), Some("Terms & Conditions"));
                assert_eq!(event.parse_attribute::<usize>("s")?, Some(4));
                assert_eq!(event.attribute("x")?, None);
                assert!(event.parse_attribute::<usize>("t").is_err());
                found = true;
            }
        });
        assert!(found);
        Ok(())
    }
}
