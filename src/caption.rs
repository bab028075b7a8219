// src/caption.rs
//! Caption budget assembler. Produces one HTML-dialect caption string of at
//! most `limit` Unicode code points. Mandatory sections (title, source link,
//! channel link) always survive; truncatable sections are shortened or
//! dropped, lowest priority first. The length postcondition is hard: the
//! assembler either fits the limit or reports `BudgetInfeasible`.

use crate::error::PostError;

/// Separator between rendered sections.
const SEP: &str = "\n\n";
const ELLIPSIS: char = '…';

/// One caption component. `head` and `tail` carry the pre-escaped markup
/// skeleton (labels, links, `<b>` wrappers) and are never truncated; `body`
/// is already-escaped text and is the only part the assembler may shrink.
#[derive(Debug, Clone)]
pub struct CaptionSection {
    /// Concatenation order; also the trim order (highest value trims first).
    pub priority: u8,
    pub head: String,
    pub body: String,
    pub tail: String,
    pub mandatory: bool,
}

impl CaptionSection {
    fn rendered_len(&self) -> usize {
        self.head.chars().count() + self.body.chars().count() + self.tail.chars().count()
    }

    fn is_blank(&self) -> bool {
        self.head.is_empty() && self.body.is_empty() && self.tail.is_empty()
    }
}

fn join(sections: &[CaptionSection]) -> String {
    let mut out = String::new();
    for s in sections.iter().filter(|s| !s.is_blank()) {
        if !out.is_empty() {
            out.push_str(SEP);
        }
        out.push_str(&s.head);
        out.push_str(&s.body);
        out.push_str(&s.tail);
    }
    out
}

fn total_len(sections: &[CaptionSection]) -> usize {
    let mut len = 0usize;
    let mut first = true;
    for s in sections.iter().filter(|s| !s.is_blank()) {
        if !first {
            len += SEP.chars().count();
        }
        first = false;
        len += s.rendered_len();
    }
    len
}

/// Assemble sections into one caption of at most `limit` code points.
///
/// Overflow handling, in order: shrink truncatable bodies lowest-priority
/// first (a truncatable section whose body empties is removed entirely),
/// then shrink mandatory bodies lowest-priority first (their heads/tails
/// are untouchable). If the mandatory skeleton alone still exceeds the
/// limit, that is a configuration error, not a reason to emit an over-limit
/// caption.
pub fn assemble(sections: &[CaptionSection], limit: usize) -> Result<String, PostError> {
    let mut secs: Vec<CaptionSection> = sections.to_vec();
    secs.sort_by_key(|s| s.priority);

    shrink_pass(&mut secs, limit, false);
    shrink_pass(&mut secs, limit, true);

    let total = total_len(&secs);
    if total > limit {
        return Err(PostError::BudgetInfeasible {
            skeleton: total,
            limit,
        });
    }
    let out = join(&secs);
    debug_assert!(out.chars().count() <= limit);
    Ok(out)
}

/// One trimming phase. `mandatory_phase = false` trims truncatable sections
/// (removing them when their body empties); `true` trims mandatory bodies
/// only. Each iteration either shortens a body or removes a section, so the
/// loop is bounded by the total input length.
fn shrink_pass(secs: &mut [CaptionSection], limit: usize, mandatory_phase: bool) {
    loop {
        let total = total_len(secs);
        if total <= limit {
            return;
        }
        let overflow = total - limit;

        // Lowest-priority candidate with anything left to cut. A mandatory
        // section only ever gives up its body; a truncatable one can be
        // dropped outright even when its body is already empty.
        let target = secs
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                s.mandatory == mandatory_phase
                    && if mandatory_phase {
                        !s.body.is_empty()
                    } else {
                        !s.is_blank()
                    }
            })
            .max_by_key(|(_, s)| s.priority)
            .map(|(i, _)| i);
        let Some(i) = target else { return };

        let body_len = secs[i].body.chars().count();
        let budget = body_len.saturating_sub(overflow);
        if budget == 0 {
            if mandatory_phase {
                secs[i].body.clear();
            } else {
                // Fully removed: the skeleton goes with the body.
                secs[i].head.clear();
                secs[i].body.clear();
                secs[i].tail.clear();
            }
        } else {
            secs[i].body = truncate_to(&secs[i].body, budget);
        }
    }
}

/// Shorten `s` to at most `max_chars` code points, preferring a sentence
/// boundary, then a word boundary, and appending an ellipsis. Never cuts
/// inside an HTML entity (`&...;`).
pub fn truncate_to(s: &str, max_chars: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_chars {
        return s.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    // Reserve one slot for the ellipsis.
    let mut cut = max_chars - 1;

    // Back out of a half-eaten entity: a '&' with no ';' before the cut.
    if let Some(amp) = chars[..cut].iter().rposition(|&c| c == '&') {
        if !chars[amp..cut].contains(&';') {
            cut = amp;
        }
    }

    // Sentence boundary, if it keeps a reasonable share of the budget.
    let sentence_end = chars[..cut]
        .iter()
        .rposition(|&c| matches!(c, '.' | '!' | '?'));
    if let Some(p) = sentence_end {
        if (p + 1) * 10 >= cut * 6 {
            let mut out: String = chars[..=p].iter().collect();
            out.push(ELLIPSIS);
            return out;
        }
    }

    // Word boundary, else a hard character cut.
    let end = chars[..cut]
        .iter()
        .rposition(|&c| c.is_whitespace())
        .unwrap_or(cut);
    let mut out: String = chars[..end].iter().collect();
    while out
        .chars()
        .last()
        .is_some_and(|c| c.is_whitespace() || matches!(c, ',' | ';' | ':'))
    {
        out.pop();
    }
    out.push(ELLIPSIS);
    out
}

fn escape(s: &str) -> String {
    html_escape::encode_text(s).to_string()
}

fn escape_attr(s: &str) -> String {
    html_escape::encode_double_quoted_attribute(s).to_string()
}

fn capitalize(s: &str) -> String {
    let t = s.trim();
    let mut chars = t.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Media-style caption layout: bold title, lead, chunked details, source
/// attribution, channel link. Title/source/channel are mandatory; the lead
/// and details give way under budget pressure (details first).
pub fn build_sections(
    title: &str,
    lead: &str,
    details: &str,
    source_url: &str,
    source_domain: &str,
    channel_link: &str,
    brand: &str,
) -> Vec<CaptionSection> {
    let mut sections = vec![CaptionSection {
        priority: 0,
        head: "<b>".to_string(),
        body: escape(&capitalize(title)),
        tail: "</b>".to_string(),
        mandatory: true,
    }];

    if !lead.trim().is_empty() {
        sections.push(CaptionSection {
            priority: 1,
            head: "📰 ".to_string(),
            body: escape(&capitalize(lead)),
            tail: String::new(),
            mandatory: false,
        });
    }

    let detail_chunks = chunk_details(details, 180, 3);
    if !detail_chunks.is_empty() {
        let body = detail_chunks
            .iter()
            .map(|c| escape(&capitalize(c)))
            .collect::<Vec<_>>()
            .join("\n\n");
        sections.push(CaptionSection {
            priority: 2,
            head: "<b>Подробности:</b>\n".to_string(),
            body,
            tail: String::new(),
            mandatory: false,
        });
    }

    sections.push(CaptionSection {
        priority: 3,
        head: format!(
            "<b>Источник:</b> <a href=\"{}\">{}</a>",
            escape_attr(source_url),
            escape(source_domain)
        ),
        body: String::new(),
        tail: String::new(),
        mandatory: true,
    });

    sections.push(CaptionSection {
        priority: 4,
        head: format!(
            "🪙 <a href=\"{}\">{}</a>",
            escape_attr(channel_link),
            escape(brand)
        ),
        body: String::new(),
        tail: String::new(),
        mandatory: true,
    });

    sections
}

/// Group sentences into short paragraphs for readability: at most
/// `max_chunks` blocks of roughly `chunk_chars` characters.
fn chunk_details(details: &str, chunk_chars: usize, max_chunks: usize) -> Vec<String> {
    let sents = crate::text::split_sentences(details);
    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for s in sents {
        let joined_len = current.iter().map(|c| c.chars().count() + 1).sum::<usize>()
            + s.chars().count();
        if !current.is_empty() && joined_len > chunk_chars {
            chunks.push(current.join(" "));
            current = vec![s];
        } else {
            current.push(s);
        }
    }
    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks.truncate(max_chunks);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(priority: u8, body: &str, mandatory: bool) -> CaptionSection {
        CaptionSection {
            priority,
            head: String::new(),
            body: body.to_string(),
            tail: String::new(),
            mandatory,
        }
    }

    #[test]
    fn under_limit_passes_through() {
        let secs = vec![section(0, "title", true), section(1, "lead", false)];
        assert_eq!(assemble(&secs, 100).unwrap(), "title\n\nlead");
    }

    #[test]
    fn body_shrinks_before_footer_is_touched() {
        let footer = "Источник: https://x\nChannel";
        let secs = vec![
            CaptionSection {
                priority: 0,
                head: String::new(),
                body: String::new(),
                tail: String::new(),
                mandatory: true,
            },
            section(1, &"ы".repeat(2000), false),
            CaptionSection {
                priority: 2,
                head: footer.to_string(),
                body: String::new(),
                tail: String::new(),
                mandatory: true,
            },
        ];
        let out = assemble(&secs, 1024).unwrap();
        assert!(out.chars().count() <= 1024);
        assert!(out.contains(footer));
    }

    #[test]
    fn lower_priority_sections_shrink_first() {
        let secs = vec![
            section(0, "title", true),
            section(1, &"a".repeat(50), false),
            section(2, &"b".repeat(50), false),
        ];
        let out = assemble(&secs, 80).unwrap();
        // The priority-2 body took the whole cut.
        assert!(out.contains(&"a".repeat(50)));
        assert!(!out.contains(&"b".repeat(40)));
        assert!(out.chars().count() <= 80);
    }

    #[test]
    fn mandatory_body_shrinks_as_last_resort_but_head_survives() {
        let secs = vec![CaptionSection {
            priority: 0,
            head: "<b>".to_string(),
            body: "t".repeat(100),
            tail: "</b>".to_string(),
            mandatory: true,
        }];
        let out = assemble(&secs, 50).unwrap();
        assert!(out.starts_with("<b>"));
        assert!(out.ends_with("</b>"));
        assert!(out.chars().count() <= 50);
    }

    #[test]
    fn head_only_optional_section_is_dropped_not_fatal() {
        let secs = vec![
            section(0, "title", true),
            CaptionSection {
                priority: 1,
                head: "x".repeat(100),
                body: String::new(),
                tail: String::new(),
                mandatory: false,
            },
        ];
        let out = assemble(&secs, 20).unwrap();
        assert_eq!(out, "title");
    }

    #[test]
    fn infeasible_skeleton_is_an_error_not_an_overlong_string() {
        let secs = vec![CaptionSection {
            priority: 0,
            head: "x".repeat(2000),
            body: String::new(),
            tail: String::new(),
            mandatory: true,
        }];
        match assemble(&secs, 1024) {
            Err(PostError::BudgetInfeasible { skeleton, limit }) => {
                assert_eq!(skeleton, 2000);
                assert_eq!(limit, 1024);
            }
            other => panic!("expected BudgetInfeasible, got {other:?}"),
        }
    }

    #[test]
    fn truncation_prefers_sentence_boundary() {
        let s = "Первое предложение. Второе предложение подлиннее для отступа.";
        let out = truncate_to(s, 26);
        assert_eq!(out, "Первое предложение.…");
    }

    #[test]
    fn truncation_falls_back_to_word_boundary() {
        let out = truncate_to("слово другое третье", 14);
        assert!(out.ends_with('…'));
        assert!(out.chars().count() <= 14);
        assert!(!out.contains("третье"));
    }

    #[test]
    fn truncation_never_splits_an_entity() {
        let s = format!("{} &amp; хвост", "a".repeat(10));
        // A naive cut at 14 chars would land inside "&amp;".
        let out = truncate_to(&s, 15);
        assert!(!out.contains('&') || out.contains("&amp;"));
        assert!(out.chars().count() <= 15);
    }

    #[test]
    fn build_sections_keeps_links_under_pressure() {
        let secs = build_sections(
            &"Заголовок ".repeat(30),
            &"Лид предложение. ".repeat(20),
            &"Детали детали детали. ".repeat(60),
            "https://example.com/news/1",
            "example.com",
            "https://t.me/chan",
            "Brand",
        );
        let out = assemble(&secs, 1024).unwrap();
        assert!(out.chars().count() <= 1024);
        assert!(out.contains("<b>Источник:</b>"));
        assert!(out.contains("https://t.me/chan"));
    }
}
