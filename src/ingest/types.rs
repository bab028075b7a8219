// src/ingest/types.rs
use anyhow::Result;
use sha2::{Digest, Sha256};

/// One fetched news entry, before any filtering. Never persisted itself;
/// only `id` survives a successful publish, inside the published set.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CandidateItem {
    /// Opaque stable identifier, derived from the normalized URL or GUID.
    /// Never derived from the title: titles change on re-fetch.
    pub id: String,
    pub title: String,
    /// Summary/body text as the feed gives it; may still carry markup.
    pub body: String,
    pub url: String,
    /// Unix seconds. 0 when the feed timestamp was missing or unparseable,
    /// so such items can never look fresh.
    pub published_at: u64,
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_candidates(&self) -> Result<Vec<CandidateItem>>;
    fn name(&self) -> &str;
}

/// Stable item id: sha256 over the normalized link, or over the raw GUID
/// when the link is unusable. Normalization strips the fragment and a
/// trailing slash and lowercases the host, so editorial re-fetches of the
/// same article map to the same id.
pub fn item_id(link: &str, guid: Option<&str>) -> String {
    let key = normalize_link(link)
        .or_else(|| guid.map(|g| g.trim().to_string()).filter(|g| !g.is_empty()))
        .unwrap_or_else(|| link.trim().to_string());
    let digest = Sha256::digest(key.as_bytes());
    // 16 hex chars keep the state file readable; collisions are negligible
    // at published-set scale.
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

fn normalize_link(link: &str) -> Option<String> {
    let url = url::Url::parse(link.trim()).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let path = url.path().trim_end_matches('/');
    let mut out = format!("{host}{path}");
    if let Some(q) = url.query() {
        out.push('?');
        out.push_str(q);
    }
    Some(out)
}

/// Host part of a URL with the `www.` prefix removed, for attribution lines.
pub fn domain_of(link: &str) -> String {
    url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .map(|h| h.strip_prefix("www.").unwrap_or(h.as_str()).to_string())
        .unwrap_or_default()
}
