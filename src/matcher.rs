use std::sync::LazyLock;

use regex::Regex;

use crate::note::PostReference;

/// Anything that looks like a web link inside freeform text.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bhttps?://[-A-Z0-9+&@#/%?=~_|!:,.;]*[-A-Z0-9+&@#/%=~_|]")
        .expect("url pattern is valid")
});

// The id is greedy, so whatever follows it is a non-alphanumeric or the end.
static NOTE_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://([a-zA-Z0-9.-]+)/notes/([a-zA-Z0-9]+)").expect("note pattern is valid")
});

/// Returns every link in `line`, in order of appearance.
pub fn extract_urls(line: &str) -> Vec<&str> {
    URL_PATTERN.find_iter(line).map(|m| m.as_str()).collect()
}

/// Recognizes `http(s)://<domain>/notes/<id>`.
pub fn match_note_url(url: &str) -> Option<PostReference> {
    let caps = NOTE_URL_PATTERN.captures(url)?;

    Some(PostReference {
        domain: caps[1].to_owned(),
        post_id: caps[2].to_owned(),
        source_url: url.to_owned(),
    })
}
