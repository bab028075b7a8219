// src/ingest/providers/rss.rs
//! Generic RSS 2.0 provider. Production mode fetches over HTTP; the
//! fixture mode feeds embedded XML straight to the parser so provider
//! tests need no network.

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::ingest::types::{item_id, CandidateItem, SourceProvider};
use crate::text;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn parse_rfc2822_to_unix(ts: &str) -> u64 {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
        .unwrap_or(0)
}

pub struct RssProvider {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl RssProvider {
    pub fn from_fixture(name: &str, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()
            .context("building rss http client")?;
        Ok(Self {
            name: crate::ingest::types::domain_of(url),
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        })
    }

    fn parse_items_from_str(&self, s: &str) -> Result<Vec<CandidateItem>> {
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = text::clean_html(it.title.as_deref().unwrap_or_default());
            let link = it
                .link
                .as_deref()
                .or(it.guid.as_deref())
                .unwrap_or_default()
                .trim()
                .to_string();
            if title.is_empty() || link.is_empty() {
                continue;
            }

            out.push(CandidateItem {
                id: item_id(&link, it.guid.as_deref()),
                title,
                body: it.description.unwrap_or_default(),
                url: link,
                published_at: it
                    .pub_date
                    .as_deref()
                    .map(parse_rfc2822_to_unix)
                    .unwrap_or(0),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for RssProvider {
    async fn fetch_candidates(&self) -> Result<Vec<CandidateItem>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items_from_str(s),
            Mode::Http { url, client } => {
                let body = match client.get(url).send().await {
                    Ok(resp) => resp.text().await.context("rss http .text()")?,
                    Err(e) => {
                        tracing::warn!(error = ?e, provider = %self.name, "provider http error");
                        return Err(e).context("rss http get()");
                    }
                };
                self.parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// Feeds routinely smuggle HTML entities into what should be XML.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&laquo;", "\"")
        .replace("&raquo;", "\"")
}
