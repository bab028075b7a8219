// tests/pipeline_idempotence.rs
//! End-to-end pipeline runs against mock capabilities: no network, no
//! fonts, no Telegram. The properties under test are the commit protocol
//! ones: at-most-once posting, untouched state on send failure, clean
//! no-op on an empty source.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use autoposter::error::PostError;
use autoposter::ingest::types::{CandidateItem, SourceProvider};
use autoposter::pipeline::{ItemOutcome, Poster, PosterCfg};
use autoposter::publish::{Ack, Delivery};
use autoposter::render::{CardRender, TextMeasure};
use autoposter::state::PublishedStore;
use autoposter::text::IdentityRewrite;

struct MockProvider {
    items: Vec<CandidateItem>,
}

#[async_trait]
impl SourceProvider for MockProvider {
    async fn fetch_candidates(&self) -> Result<Vec<CandidateItem>> {
        Ok(self.items.clone())
    }
    fn name(&self) -> &str {
        "mock"
    }
}

/// Store over a shared set so tests can inspect state after the poster
/// takes ownership.
struct SharedStore {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl PublishedStore for SharedStore {
    fn load(&self) -> Result<HashSet<String>> {
        Ok(self.inner.lock().unwrap().clone())
    }
    fn commit(&mut self, id: &str) -> Result<()> {
        self.inner.lock().unwrap().insert(id.to_string());
        Ok(())
    }
}

struct FakeRenderer;

impl TextMeasure for FakeRenderer {
    fn measure(&self, text: &str, font_size: u32) -> (u32, u32) {
        (text.chars().count() as u32 * font_size * 6 / 10, font_size)
    }
}

impl CardRender for FakeRenderer {
    fn draw(&self, _lines: &[String], _font_size: u32, _footer: &str) -> Result<Vec<u8>> {
        Ok(vec![0x89, 0x50, 0x4e, 0x47])
    }
}

struct MockDelivery {
    fail: bool,
    calls: Arc<Mutex<usize>>,
}

#[async_trait]
impl Delivery for MockDelivery {
    async fn send(&self, _image: &[u8], caption: &str) -> std::result::Result<Ack, PostError> {
        *self.calls.lock().unwrap() += 1;
        assert!(caption.chars().count() <= 1024, "over-limit caption reached the wire");
        if self.fail {
            Err(PostError::SendFailed("boom".into()))
        } else {
            Ok(Ack { message_id: 42 })
        }
    }
}

fn fresh_item(id: &str) -> CandidateItem {
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    CandidateItem {
        id: id.to_string(),
        title: "Заголовок новости".to_string(),
        body: "Первое предложение новости про рубль. Второе предложение с деталями. \
               Третье предложение с уточнением."
            .to_string(),
        url: format!("https://example.com/news/{id}"),
        published_at: now - 60,
    }
}

fn cfg() -> PosterCfg {
    PosterCfg {
        freshness_window_secs: 3600,
        fallback_window_secs: None,
        max_posts_per_run: 1,
        caption_limit: 1024,
        min_body_chars: 10,
        cyrillic_ratio_min: 0.0,
        channel_link: "https://t.me/chan".to_string(),
        brand: "Brand".to_string(),
    }
}

fn poster(
    items: Vec<CandidateItem>,
    state: Arc<Mutex<HashSet<String>>>,
    fail_send: bool,
    calls: Arc<Mutex<usize>>,
    cfg: PosterCfg,
) -> Poster {
    Poster::new(
        vec![Box::new(MockProvider { items })],
        Box::new(SharedStore { inner: state }),
        Box::new(IdentityRewrite),
        Box::new(FakeRenderer),
        Box::new(MockDelivery { fail: fail_send, calls }),
        cfg,
    )
}

#[tokio::test]
async fn second_run_observes_the_commit_and_skips() {
    let state = Arc::new(Mutex::new(HashSet::new()));
    let calls = Arc::new(Mutex::new(0));
    let mut p = poster(
        vec![fresh_item("a")],
        state.clone(),
        false,
        calls.clone(),
        cfg(),
    );

    let first = p.run_once().await.unwrap();
    assert_eq!(first.posted, 1);
    assert!(state.lock().unwrap().contains("a"));

    let second = p.run_once().await.unwrap();
    assert_eq!(second.posted, 0);
    assert_eq!(
        second.outcomes,
        vec![("a".to_string(), ItemOutcome::SkippedDuplicate)]
    );
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn send_failure_leaves_state_untouched_and_item_eligible() {
    let state = Arc::new(Mutex::new(HashSet::new()));
    let calls = Arc::new(Mutex::new(0));
    let mut p = poster(
        vec![fresh_item("a")],
        state.clone(),
        true,
        calls.clone(),
        cfg(),
    );

    let report = p.run_once().await.unwrap();
    assert_eq!(report.posted, 0);
    assert!(matches!(
        report.outcomes[0],
        (ref id, ItemOutcome::SkippedError(_)) if id == "a"
    ));
    assert!(state.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_source_is_a_clean_noop() {
    let state = Arc::new(Mutex::new(HashSet::new()));
    let calls = Arc::new(Mutex::new(0));
    let mut p = poster(vec![], state.clone(), false, calls.clone(), cfg());

    let report = p.run_once().await.unwrap();
    assert_eq!(report.posted, 0);
    assert!(report.outcomes.is_empty());
    assert_eq!(*calls.lock().unwrap(), 0);
    assert!(state.lock().unwrap().is_empty());
}

#[tokio::test]
async fn max_posts_per_run_caps_the_output() {
    let state = Arc::new(Mutex::new(HashSet::new()));
    let calls = Arc::new(Mutex::new(0));
    let mut p = poster(
        vec![fresh_item("a"), fresh_item("b"), fresh_item("c")],
        state.clone(),
        false,
        calls.clone(),
        cfg(),
    );

    let report = p.run_once().await.unwrap();
    assert_eq!(report.posted, 1);
    assert_eq!(state.lock().unwrap().len(), 1);
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn infeasible_budget_skips_without_calling_send() {
    let state = Arc::new(Mutex::new(HashSet::new()));
    let calls = Arc::new(Mutex::new(0));
    let mut tight = cfg();
    tight.caption_limit = 10; // below the mandatory skeleton
    let mut p = poster(
        vec![fresh_item("a")],
        state.clone(),
        false,
        calls.clone(),
        tight,
    );

    let report = p.run_once().await.unwrap();
    assert_eq!(report.posted, 0);
    assert!(matches!(
        report.outcomes[0],
        (_, ItemOutcome::SkippedError(_))
    ));
    assert_eq!(*calls.lock().unwrap(), 0);
    assert!(state.lock().unwrap().is_empty());
}

struct BrokenProvider;

#[async_trait]
impl SourceProvider for BrokenProvider {
    async fn fetch_candidates(&self) -> Result<Vec<CandidateItem>> {
        anyhow::bail!("connection refused")
    }
    fn name(&self) -> &str {
        "broken"
    }
}

#[tokio::test]
async fn one_broken_source_does_not_stop_the_run() {
    let state = Arc::new(Mutex::new(HashSet::new()));
    let calls = Arc::new(Mutex::new(0));
    let mut p = Poster::new(
        vec![
            Box::new(BrokenProvider),
            Box::new(MockProvider {
                items: vec![fresh_item("a")],
            }),
        ],
        Box::new(SharedStore {
            inner: state.clone(),
        }),
        Box::new(IdentityRewrite),
        Box::new(FakeRenderer),
        Box::new(MockDelivery {
            fail: false,
            calls: calls.clone(),
        }),
        cfg(),
    );

    let report = p.run_once().await.unwrap();
    assert_eq!(report.posted, 1);
    assert_eq!(report.source_errors.len(), 1);
    assert!(report.source_errors[0].contains("broken"));
}

#[tokio::test]
#[serial_test::serial]
async fn typical_feed_description_passes_the_default_quality_gate() {
    // Feeds deliver a few sentences per item, not full article text; the
    // default gate must let such an item through.
    std::env::set_var("BOT_TOKEN", "t");
    std::env::set_var("CHANNEL_ID", "@c");
    let defaults = autoposter::config::Config::from_env().unwrap();
    let cfg = PosterCfg {
        freshness_window_secs: defaults.freshness_window_secs,
        fallback_window_secs: defaults.fallback_window_secs,
        max_posts_per_run: defaults.max_posts_per_run,
        caption_limit: defaults.caption_limit,
        min_body_chars: defaults.min_body_chars,
        cyrillic_ratio_min: defaults.cyrillic_ratio_min,
        channel_link: defaults.channel_link,
        brand: defaults.brand,
    };

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    let item = CandidateItem {
        id: "rss-desc".to_string(),
        title: "ЦБ сохранил ключевую ставку".to_string(),
        body: "Банк России сохранил ключевую ставку на уровне 16% годовых. \
               Решение совпало с ожиданиями большинства аналитиков. \
               Следующее заседание совета директоров запланировано на июнь."
            .to_string(),
        url: "https://example.com/news/rate".to_string(),
        published_at: now - 60,
    };

    let state = Arc::new(Mutex::new(HashSet::new()));
    let calls = Arc::new(Mutex::new(0));
    let mut p = poster(vec![item], state.clone(), false, calls.clone(), cfg);

    let report = p.run_once().await.unwrap();
    assert_eq!(report.posted, 1, "outcomes: {:?}", report.outcomes);
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn failed_send_retries_next_run_and_succeeds() {
    let state = Arc::new(Mutex::new(HashSet::new()));

    let calls = Arc::new(Mutex::new(0));
    let mut failing = poster(
        vec![fresh_item("a")],
        state.clone(),
        true,
        calls.clone(),
        cfg(),
    );
    failing.run_once().await.unwrap();
    assert!(state.lock().unwrap().is_empty());

    let mut working = poster(
        vec![fresh_item("a")],
        state.clone(),
        false,
        calls.clone(),
        cfg(),
    );
    let report = working.run_once().await.unwrap();
    assert_eq!(report.posted, 1);
    assert!(state.lock().unwrap().contains("a"));
}
