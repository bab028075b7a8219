// tests/caption_budget.rs
//! Budget invariant at the caption layer: for any input the assembled
//! caption fits the limit or the assembler refuses with BudgetInfeasible.

use autoposter::caption::{assemble, build_sections, CaptionSection};
use autoposter::error::PostError;

fn sections_for(body_sentences: usize) -> Vec<CaptionSection> {
    let details = "Это предложение с подробностями для теста бюджета. ".repeat(body_sentences);
    build_sections(
        "Заголовок",
        "Лид-предложение с коротким содержанием новости.",
        &details,
        "https://example.com/news/12345",
        "example.com",
        "https://t.me/chan",
        "Brand",
    )
}

#[test]
fn oversized_body_is_shrunk_before_the_footer() {
    // ~2000 chars of details against LIMIT=1024.
    let out = assemble(&sections_for(40), 1024).unwrap();
    assert!(out.chars().count() <= 1024);
    assert!(out.contains("<b>Источник:</b>"));
    assert!(out.contains("https://example.com/news/12345"));
    assert!(out.contains("https://t.me/chan"));
    assert!(out.contains("<b>Заголовок</b>"));
}

#[test]
fn mandatory_skeleton_survives_at_any_feasible_limit() {
    for limit in [300usize, 500, 800, 1024, 4096] {
        let out = assemble(&sections_for(40), limit).unwrap();
        assert!(out.chars().count() <= limit, "limit {limit} violated");
        assert!(out.contains("Источник"), "source lost at limit {limit}");
        assert!(out.contains("t.me/chan"), "channel lost at limit {limit}");
    }
}

#[test]
fn empty_title_with_long_body_still_fits() {
    let details = "д".repeat(2000);
    let secs = build_sections(
        "",
        "",
        &details,
        "https://x.example/1",
        "x.example",
        "https://t.me/chan",
        "Channel",
    );
    let out = assemble(&secs, 1024).unwrap();
    assert!(out.chars().count() <= 1024);
    assert!(out.contains("Источник"));
}

#[test]
fn infeasible_limit_is_refused_not_exceeded() {
    match assemble(&sections_for(2), 16) {
        Err(PostError::BudgetInfeasible { skeleton, limit }) => {
            assert!(skeleton > limit);
            assert_eq!(limit, 16);
        }
        Ok(s) => panic!("expected BudgetInfeasible, got {} chars", s.chars().count()),
        Err(e) => panic!("unexpected error: {e}"),
    }
}
