//! RSS 2.0 encoding.

use super::EncodeError;
use crate::model::Feed;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn write(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), EncodeError> {
    writer
        .write_event(event)
        .map_err(|e| EncodeError::Xml(e.to_string()))
}

/// `<name>text</name>`, with `text` escaped.
fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<(), EncodeError> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

/// Encodes `feed` as an RSS 2.0 document.
///
/// Channel `pubDate` and `lastBuildDate` carry the feed's creation time;
/// each item's `guid` is its link.
pub fn to_rss(feed: &Feed) -> Result<String, EncodeError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    write(&mut writer, Event::Start(rss))?;
    write(&mut writer, Event::Start(BytesStart::new("channel")))?;

    let created = feed.created.to_rfc2822();
    text_element(&mut writer, "title", &feed.title)?;
    text_element(&mut writer, "link", &feed.link)?;
    text_element(&mut writer, "description", &feed.description)?;
    text_element(&mut writer, "pubDate", &created)?;
    text_element(&mut writer, "lastBuildDate", &created)?;

    for entry in &feed.entries {
        write(&mut writer, Event::Start(BytesStart::new("item")))?;
        text_element(&mut writer, "title", &entry.title)?;
        text_element(&mut writer, "link", &entry.link)?;
        text_element(&mut writer, "description", &entry.description)?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "true"));
        write(&mut writer, Event::Start(guid))?;
        write(&mut writer, Event::Text(BytesText::new(&entry.link)))?;
        write(&mut writer, Event::End(BytesEnd::new("guid")))?;

        text_element(&mut writer, "pubDate", &entry.created.to_rfc2822())?;
        write(&mut writer, Event::End(BytesEnd::new("item")))?;
    }

    write(&mut writer, Event::End(BytesEnd::new("channel")))?;
    write(&mut writer, Event::End(BytesEnd::new("rss")))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| EncodeError::Xml(e.to_string()))
}
