/// Link target for detected URL text.
///
/// Trims whitespace and trailing sentence punctuation, then prefixes
/// `https://` unless the text already names an http(s) scheme.
pub fn normalize_url(text: &str) -> String {
    let url = text
        .trim()
        .trim_end_matches(['.', ',', ';', ':', '!', '?']);

    if has_scheme(url) {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Case-insensitive `http://` or `https://` prefix.
pub(crate) fn has_scheme(text: &str) -> bool {
    let prefix = |scheme: &str| {
        text.get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
    };
    prefix("http://") || prefix("https://")
}
