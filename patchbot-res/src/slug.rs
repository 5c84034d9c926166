use std::sync::LazyLock;

use regex::Regex;

// The information separators \x1c-\x1f are not Unicode White_Space, but count as whitespace like they do for str.isspace.
static SPECIAL_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s\x1c-\x1f-]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s\x1c-\x1f]+").unwrap());
static DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

/// Converts a string into a lowercase, hyphen-delimited slug.
/// Characters other than word characters, whitespace and hyphens are dropped.
pub fn slugify(string: &str) -> String {
    let lowered = string.to_lowercase();

    let stripped = SPECIAL_CHARS.replace_all(&lowered, "");
    let dashed = WHITESPACE.replace_all(&stripped, "-");
    let collapsed = DASHES.replace_all(&dashed, "-");

    collapsed.trim_matches('-').to_string()
}
