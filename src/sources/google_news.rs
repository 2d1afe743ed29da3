//! Google News RSS search.
//!
//! Queries `news.google.com/rss/search` and parses the returned RSS into
//! [`FeedEntry`] values. Item links point at the aggregator's redirect pages,
//! not the publishers; resolution happens downstream.

use crate::error::Result;
use crate::models::FeedEntry;
use quick_xml::Reader;
use quick_xml::events::Event as XmlEvent;
use tracing::{debug, info, instrument};

/// Search the feed for a query, in the given region and language.
#[instrument(level = "info", skip(http))]
pub async fn search(
    http: &reqwest::Client,
    query: &str,
    region: &str,
    lang: &str,
) -> Result<Vec<FeedEntry>> {
    let feed_url = format!(
        "https://news.google.com/rss/search?q={}&hl={}&gl={}&ceid={}:en",
        urlencoding::encode(query),
        lang,
        region,
        region,
    );
    debug!(%feed_url, "Fetching news feed");

    let body = http
        .get(&feed_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let entries = parse_feed(&body)?;
    info!(count = entries.len(), query, "Indexed candidate articles");
    Ok(entries)
}

#[derive(Default)]
struct PartialEntry {
    title: String,
    url: String,
    published: String,
    publisher: String,
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Link,
    Published,
    Publisher,
}

/// Parse RSS XML into feed entries. Items without a link are dropped.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut in_item = false;
    let mut field: Option<Field> = None;
    let mut current = PartialEntry::default();

    loop {
        match reader.read_event()? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"item" => {
                    in_item = true;
                    current = PartialEntry::default();
                }
                b"title" if in_item => field = Some(Field::Title),
                b"link" if in_item => field = Some(Field::Link),
                b"pubDate" if in_item => field = Some(Field::Published),
                b"source" if in_item => field = Some(Field::Publisher),
                _ => field = None,
            },
            XmlEvent::Text(t) => {
                if in_item {
                    if let Some(f) = field {
                        let decoded = t.decode().unwrap_or_default();
                        let text = match quick_xml::escape::unescape(&decoded) {
                            Ok(unescaped) => unescaped.into_owned(),
                            Err(_) => decoded.into_owned(),
                        };
                        assign(&mut current, f, &text);
                    }
                }
            }
            XmlEvent::CData(t) => {
                if in_item {
                    if let Some(f) = field {
                        let text = String::from_utf8_lossy(&t).into_owned();
                        assign(&mut current, f, &text);
                    }
                }
            }
            XmlEvent::End(e) => {
                if e.name().as_ref() == b"item" {
                    in_item = false;
                    if !current.url.is_empty() {
                        entries.push(FeedEntry {
                            title: std::mem::take(&mut current.title),
                            url: std::mem::take(&mut current.url),
                            published: std::mem::take(&mut current.published),
                            publisher: std::mem::take(&mut current.publisher),
                        });
                    }
                }
                field = None;
            }
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

fn assign(entry: &mut PartialEntry, field: Field, text: &str) {
    let slot = match field {
        Field::Title => &mut entry.title,
        Field::Link => &mut entry.url,
        Field::Published => &mut entry.published,
        Field::Publisher => &mut entry.publisher,
    };
    if !slot.is_empty() {
        slot.push(' ');
    }
    slot.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>"quake" - Google News</title>
<link>https://news.google.com/search</link>
<item>
  <title>Strong quake hits region - live updates</title>
  <link>https://news.google.com/rss/articles/CBMiAAA?oc=5</link>
  <pubDate>Mon, 06 Feb 2023 04:30:00 GMT</pubDate>
  <source url="https://example.com">Example Times</source>
</item>
<item>
  <title><![CDATA[Rescue effort continues]]></title>
  <link>https://news.google.com/rss/articles/CBMiBBB?oc=5</link>
  <pubDate>Mon, 06 Feb 2023 09:00:00 GMT</pubDate>
  <source url="https://other.example">Other Daily</source>
</item>
<item>
  <title>Item without a link is dropped</title>
</item>
</channel></rss>"#;

    #[test]
    fn parses_items_into_entries() {
        let entries = parse_feed(FIXTURE).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].title, "Strong quake hits region - live updates");
        assert_eq!(
            entries[0].url,
            "https://news.google.com/rss/articles/CBMiAAA?oc=5"
        );
        assert_eq!(entries[0].published, "Mon, 06 Feb 2023 04:30:00 GMT");
        assert_eq!(entries[0].publisher, "Example Times");
    }

    #[test]
    fn parses_cdata_titles() {
        let entries = parse_feed(FIXTURE).unwrap();
        assert_eq!(entries[1].title, "Rescue effort continues");
        assert_eq!(entries[1].publisher, "Other Daily");
    }

    #[test]
    fn channel_level_title_is_not_an_entry() {
        let entries = parse_feed(FIXTURE).unwrap();
        assert!(entries.iter().all(|e| !e.title.contains("Google News")));
    }

    #[test]
    fn empty_feed_yields_no_entries() {
        let xml = r#"<rss version="2.0"><channel><title>empty</title></channel></rss>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_feed("<rss><channel><item></rss>").is_err());
    }
}
