use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::has_scheme;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:https?://)?(?:www\.)?[-a-z0-9@:%._+~#=]{1,256}\.[a-z0-9()]{1,6}\b[-a-z0-9()@:%_+.~#?&/=]*",
    )
    .expect("URL_RE: hardcoded regex is valid")
});

static ABBREVIATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:etc|e\.g|i\.e|vs)(?:\.|$)").expect("ABBREVIATION_RE: hardcoded regex is valid")
});

static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+").expect("DECIMAL_RE: hardcoded regex is valid"));

static TLD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.[a-z]{2,}(?:/|$)").expect("TLD_RE: hardcoded regex is valid")
});

static LETTERS_DOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[a-z]{2}\.").expect("LETTERS_DOT_RE: hardcoded regex is valid"));

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Byte ranges of the valid URLs in `text`, in order, non-overlapping.
///
/// Text between accepted URLs is scanned again on its own, the way a later
/// pass would see it once split into separate runs. No unlinked piece of the
/// result contains a valid URL.
pub fn find_links(text: &str) -> Vec<Range<usize>> {
    let mut links = Vec::new();
    scan(text, 0..text.len(), &mut links);
    links.sort_by_key(|link| link.start);
    links
}

fn scan(text: &str, range: Range<usize>, links: &mut Vec<Range<usize>>) {
    let base = range.start;
    let found: Vec<Range<usize>> = URL_RE
        .find_iter(&text[range.clone()])
        .filter_map(|m| {
            let candidate = trim_candidate(m.as_str());
            is_valid_url(candidate).then(|| base + m.start()..base + m.start() + candidate.len())
        })
        .collect();

    // A range without accepted URLs stays plain text
    if found.is_empty() {
        return;
    }

    let mut cursor = range.start;
    for link in &found {
        if link.start > cursor {
            scan(text, cursor..link.start, links);
        }
        cursor = link.end;
    }
    if cursor < range.end {
        scan(text, cursor..range.end, links);
    }
    links.extend(found);
}

/// Drop trailing sentence punctuation and unbalanced closing parentheses.
pub fn trim_candidate(candidate: &str) -> &str {
    let mut candidate = candidate;
    loop {
        if let Some(rest) = candidate.strip_suffix(TRAILING_PUNCTUATION) {
            candidate = rest;
        } else if candidate.ends_with(')')
            && candidate.matches('(').count() < candidate.matches(')').count()
        {
            candidate = &candidate[..candidate.len() - 1];
        } else {
            return candidate;
        }
    }
}

/// Whether a trimmed candidate should become a link.
///
/// Ambiguous text is rejected: a missed link costs less than a linked
/// abbreviation.
pub fn is_valid_url(candidate: &str) -> bool {
    if candidate.starts_with('.') || candidate.ends_with('.') || candidate.contains("..") {
        return false;
    }
    if ABBREVIATION_RE.is_match(candidate) || DECIMAL_RE.is_match(candidate) {
        return false;
    }
    if !TLD_RE.is_match(candidate) || !LETTERS_DOT_RE.is_match(candidate) {
        return false;
    }
    // An e-mail address, not a web address
    if candidate.contains('@') && !has_scheme(candidate) {
        return false;
    }
    true
}
