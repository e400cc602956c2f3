//! Terminal rendering for result pages, key lists and history. Every renderer
//! returns lines so callers can print them or compare them in tests.

use chrono::{DateTime, Utc};
use terminal_size::{terminal_size, Height, Width};

use crate::admin::{key_stats, ApiKeyInfo};
use crate::search::{CloudType, SortedResultItem};

const MAX_COL_WIDTH: usize = 60;

/// Table with a green header, each line fitted to `max_width`.
pub fn render_table(headers: &[&str], rows: &[Vec<String>], max_width: usize) -> Vec<String> {
    let cols: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let mut widths: Vec<usize> = cols.iter().map(|c| visible_len(c).min(MAX_COL_WIDTH)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = visible_len(cell);
            if w > widths[i] { widths[i] = w.min(MAX_COL_WIDTH); }
        }
    }
    let sep = build_separator(&widths);
    let mut out = Vec::with_capacity(rows.len() + 4);
    out.push(sep.clone());
    out.push(build_row_header_colored(&cols, &widths));
    out.push(sep.clone());
    for r in rows {
        out.push(build_row(r, &widths));
    }
    out.push(sep);
    out.into_iter().map(|l| fit_line_to_width(&l, max_width)).collect()
}

fn format_millis(ts: i64) -> String {
    if ts <= 0 { return "-".to_string(); }
    DateTime::<Utc>::from_timestamp_millis(ts).map(|d| d.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_else(|| "-".to_string())
}

/// Current page of sorted results plus a per-drive summary and paging hint.
pub fn render_results(items: &[SortedResultItem], total: usize, has_more: bool, groups: &[(CloudType, usize)], max_width: usize) -> Vec<String> {
    if total == 0 {
        return vec!["no results".to_string()];
    }
    let mut out = Vec::new();
    let summary: Vec<String> = groups.iter().map(|(t, n)| format!("{}: {}", t.display_name(), n)).collect();
    out.push(fit_line_to_width(&summary.join(" | "), max_width));
    let rows: Vec<Vec<String>> = items
        .iter()
        .enumerate()
        .map(|(i, it)| {
            let title = if it.link.note.trim().is_empty() { it.link.source.clone().unwrap_or_default() } else { it.link.note.clone() };
            vec![
                (i + 1).to_string(),
                it.cloud_type.as_str().to_string(),
                title,
                it.link.url.clone(),
                it.link.password.clone(),
                format_millis(it.timestamp),
            ]
        })
        .collect();
    out.extend(render_table(&["#", "drive", "title", "url", "pwd", "time"], &rows, max_width));
    let mut footer = format!("showing {} of {}", items.len(), total);
    if has_more { footer.push_str(" (type 'more' for the next page)"); }
    out.push(footer);
    out
}

pub fn render_keys(keys: &[ApiKeyInfo], now: DateTime<Utc>, max_width: usize) -> Vec<String> {
    if keys.is_empty() {
        return vec!["no API keys".to_string()];
    }
    let rows: Vec<Vec<String>> = keys
        .iter()
        .map(|k| {
            vec![
                k.display_key(),
                k.status_at(now).to_string(),
                k.remaining_at(now).to_string(),
                k.expires_at.format("%Y-%m-%d %H:%M").to_string(),
                k.ttl_hours.to_string(),
                k.description.clone(),
            ]
        })
        .collect();
    let mut out = render_table(&["key", "status", "remaining", "expires", "ttl_h", "description"], &rows, max_width);
    let s = key_stats(keys, now);
    out.push(format!("total: {}, active: {}, unused: {}, expired: {}, disabled: {}", s.total, s.active, s.unused, s.expired, s.disabled));
    out
}

pub fn render_history(entries: &[String]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["history is empty".to_string()];
    }
    entries.iter().enumerate().map(|(i, e)| format!("{:>2}. {}", i + 1, e)).collect()
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let (text, align_right) = (truncate(&cell, *w), is_numeric_like(&cell));
        s.push(' ');
        let pad = w.saturating_sub(visible_len(&text));
        if align_right {
            s.push_str(&" ".repeat(pad));
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&" ".repeat(pad));
        }
        s.push_str(" |");
    }
    s
}

fn build_row_header_colored(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let text = truncate(&cell, *w);
        s.push(' ');
        s.push_str(&format!("\x1b[32m{}\x1b[0m", text)); // green
        s.push_str(&" ".repeat(w.saturating_sub(visible_len(&text))));
        s.push_str(" |");
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    if st.is_empty() { return false; }
    let mut has_digit = false;
    for ch in st.chars() {
        if ch.is_ascii_digit() { has_digit = true; continue; }
        if ".-+,_".contains(ch) { continue; }
        return false;
    }
    has_digit
}

// --- Terminal fitting & ANSI helpers ---

pub fn get_terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), Height(_h))) if w > 4 => (w - 4) as usize,
        _ => 80,
    }
}

fn fit_line_to_width(s: &str, maxw: usize) -> String {
    if visible_len(s) <= maxw { return s.to_string(); }
    elide_middle_preserving_ansi(s, maxw)
}

/// Visible characters, skipping ANSI CSI sequences.
pub fn visible_len(s: &str) -> usize {
    let mut count = 0;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() { break; }
                }
            }
            continue;
        }
        count += 1;
    }
    count
}

fn elide_middle_preserving_ansi(s: &str, maxw: usize) -> String {
    if maxw <= 3 { return "…".repeat(maxw.min(1)); }
    let budget = maxw - 3;
    let front_keep = budget / 2;
    let back_keep = budget - front_keep;

    // (is_ansi, text)
    let mut toks: Vec<(bool, String)> = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            let mut seq = String::from(ch);
            if chars.peek() == Some(&'[') {
                seq.push('[');
                chars.next();
                for c in chars.by_ref() {
                    seq.push(c);
                    if c.is_ascii_alphabetic() { break; }
                }
            }
            toks.push((true, seq));
        } else {
            match toks.last_mut() {
                Some((false, text)) => text.push(ch),
                _ => toks.push((false, ch.to_string())),
            }
        }
    }

    let mut front = String::new();
    let mut taken = 0usize;
    for (ansi, text) in &toks {
        if *ansi { front.push_str(text); continue; }
        for ch in text.chars() {
            if taken >= front_keep { break; }
            front.push(ch);
            taken += 1;
        }
        if taken >= front_keep { break; }
    }

    let mut back: Vec<String> = Vec::new();
    let mut taken = 0usize;
    for (ansi, text) in toks.iter().rev() {
        if *ansi { back.push(text.clone()); continue; }
        let n = text.chars().count();
        let need = back_keep - taken;
        if n <= need {
            back.push(text.clone());
            taken += n;
        } else {
            back.push(text.chars().skip(n - need).collect());
            break;
        }
    }
    back.reverse();

    // reset so a cut escape never bleeds into the next line
    format!("{}...{}\x1b[0m", front, back.concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::RawLink;

    #[test]
    fn table_lines_share_visible_width() {
        let rows = vec![vec!["1".to_string(), "quark".to_string()], vec!["22".to_string(), "magnet".to_string()]];
        let lines = render_table(&["#", "drive"], &rows, 200);
        assert_eq!(lines.len(), 6);
        let w = visible_len(&lines[0]);
        assert!(lines.iter().all(|l| visible_len(l) == w));
        assert!(lines[1].contains("\x1b[32mdrive\x1b[0m"));
        // numbers right-aligned
        assert_eq!(lines[3], "|  1 | quark  |");
    }

    #[test]
    fn long_lines_are_elided_to_width() {
        let line = format!("\x1b[32m{}\x1b[0m", "x".repeat(100));
        let fitted = fit_line_to_width(&line, 20);
        assert_eq!(visible_len(&fitted), 20);
        assert!(fitted.contains("..."));
        assert_eq!(truncate("abcdef", 4), "abc…");
    }

    #[test]
    fn results_footer_mentions_more() {
        let items = vec![SortedResultItem {
            link: RawLink { url: "https://pan.quark.cn/s/1".into(), note: "Movie".into(), ..Default::default() },
            cloud_type: CloudType::Quark,
            priority: 1,
            timestamp: 0,
        }];
        let lines = render_results(&items, 49, true, &[(CloudType::Quark, 49)], 200);
        assert_eq!(lines[0], "Quark Drive: 49");
        assert_eq!(lines.last().unwrap(), "showing 1 of 49 (type 'more' for the next page)");
        assert_eq!(render_results(&[], 0, false, &[], 80), vec!["no results"]);
    }

    #[test]
    fn history_listing() {
        assert_eq!(render_history(&["a".to_string(), "b".to_string()]), vec![" 1. a", " 2. b"]);
        assert_eq!(render_history(&[]), vec!["history is empty"]);
    }
}
