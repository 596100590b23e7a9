use anyhow::{anyhow, Context, Result};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use serde::Deserialize;

/// Most recent entry of a news feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// Marker stored in state: the entry id, or the link when there is none.
    pub id: String,
}

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    // Also matches `<atom:link href=".."/>`, which has no text.
    #[serde(rename = "link", default)]
    links: Vec<Text>,
    guid: Option<Text>,
}

// --- RSS 1.0 (RDF): items are siblings of <channel> ---

#[derive(Debug, Deserialize)]
struct Rdf {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

// --- Atom ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}
#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<Text>,
    id: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}
#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
}

/// Element whose attributes we ignore (`<guid isPermaLink>`, `<title type>`).
#[derive(Debug, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

/// Parse an RSS 2.0, RSS 1.0 or Atom document, picked by its root element.
/// `Ok(None)` means a valid feed with zero entries (or a first entry with
/// neither id nor link); anything else, e.g. an HTML error page, is `Err`.
pub fn parse_latest(xml: &str) -> Result<Option<FeedEntry>> {
    let xml_clean = scrub_html_entities_for_xml(xml);

    let root = root_element(&xml_clean).ok_or_else(|| anyhow!("no root element"))?;
    let first = match root.as_str() {
        "rss" => from_str::<Rss>(&xml_clean)
            .context("parsing rss 2.0 feed")?
            .channel
            .items
            .into_iter()
            .next()
            .map(from_rss_item),
        "RDF" => from_str::<Rdf>(&xml_clean)
            .context("parsing rss 1.0 feed")?
            .items
            .into_iter()
            .next()
            .map(from_rss_item),
        "feed" => from_str::<AtomFeed>(&xml_clean)
            .context("parsing atom feed")?
            .entries
            .into_iter()
            .next()
            .map(from_atom_entry),
        other => return Err(anyhow!("unsupported feed root <{other}>")),
    };

    Ok(first.filter(|e| !e.id.is_empty()))
}

/// Local name of the first element, skipping the declaration, comments and
/// doctype. `None` if the document has no element or is not XML.
fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned())
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

fn from_rss_item(it: Item) -> FeedEntry {
    let link = it
        .links
        .iter()
        .map(|l| l.value.trim())
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string();
    let id = it
        .guid
        .map(|g| g.value.trim().to_string())
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| link.clone());
    FeedEntry {
        title: clean_title(it.title.as_deref().unwrap_or_default()),
        link,
        id,
    }
}

fn from_atom_entry(e: AtomEntry) -> FeedEntry {
    let link = e
        .links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| e.links.first())
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default();
    let id = e
        .id
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .unwrap_or_else(|| link.clone());
    FeedEntry {
        title: clean_title(e.title.as_ref().map(|t| t.value.as_str()).unwrap_or_default()),
        link,
        id,
    }
}

fn clean_title(raw: &str) -> String {
    html_escape::decode_html_entities(raw).trim().to_string()
}

pub async fn fetch_latest(client: &Client, url: &str) -> Option<FeedEntry> {
    let body = match client.get(url).send().await {
        Ok(resp) if resp.status().is_success() => match resp.text().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(url, error = %e, "feed: reading body failed");
                return None;
            }
        },
        Ok(resp) => {
            tracing::warn!(url, status = %resp.status(), "feed: non-success status");
            return None;
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "feed: request failed");
            return None;
        }
    };

    match parse_latest(&body) {
        Ok(Some(entry)) => Some(entry),
        Ok(None) => {
            tracing::info!(url, "feed: no entries");
            None
        }
        Err(e) => {
            tracing::warn!(url, error = ?e, "feed: parse failed");
            None
        }
    }
}

// quick-xml only knows the five XML entities; feeds often carry HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
