//! Document encoding: UTF-8, XML declaration, two-space indentation,
//! trailing newline.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::element::Element;
use crate::error::XmlError;

/// Encode a document.
pub fn encode(root: &Element) -> Result<Vec<u8>, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_element(&mut writer, root)?;
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

/// Encode a document as a string.
pub fn encode_to_string(root: &Element) -> Result<String, XmlError> {
    Ok(String::from_utf8(encode(root)?)?)
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> Result<(), XmlError> {
    let name = el.name.as_str();
    match (&el.text, el.children.is_empty()) {
        (None, true) => write(writer, Event::Empty(BytesStart::new(name))),
        (text, _) => {
            write(writer, Event::Start(BytesStart::new(name)))?;
            if let Some(text) = text {
                write(writer, Event::Text(BytesText::new(text)))?;
            }
            for child in &el.children {
                write_element(writer, child)?;
            }
            write(writer, Event::End(BytesEnd::new(name)))
        }
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::Encode(e.to_string()))
}
