//! Text tokenization and normalization.
//!
//! One shared normalization routine is used for both rule texts and query
//! texts so that token ids assigned at index-build time line up with the
//! tokens seen at query time.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Common words ignored from matching such as HTML tags, XML entities, etc.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();

    // common XML character references as &quot;
    for &word in &["amp", "apos", "gt", "lt", "nbsp", "quot"] {
        set.insert(word);
    }

    // common html tags as <a href=https://link ...>
    for &word in &[
        "a", "abbr", "alt", "blockquote", "body", "br", "class", "div", "em", "h1", "h2", "h3",
        "h4", "h5", "hr", "href", "img", "li", "ol", "p", "pre", "rel", "script", "span", "src",
        "td", "th", "tr", "ul",
    ] {
        set.insert(word);
    }

    // comment line markers
    set.insert("rem"); // batch files
    set.insert("dnl"); // autotools

    // doc book tags as <para>
    set.insert("para");
    set.insert("ulink");

    // HTML punctuations and entities all as &emdash;
    for &word in &[
        "bdquo", "bull", "bullet", "colon", "comma", "emdash", "emsp", "ensp", "ge", "hairsp",
        "ldquo", "ldquor", "le", "lpar", "lsaquo", "lsquo", "lsquor", "mdash", "ndash", "numsp",
        "period", "puncsp", "raquo", "rdquo", "rdquor", "rpar", "rsaquo", "rsquo", "rsquor",
        "sbquo", "semi", "thinsp", "tilde",
    ] {
        set.insert(word);
    }

    // xml char entities
    set.insert("x3c");
    set.insert("x3e");

    // seen in many CSS
    for &word in &[
        "lists", "side", "nav", "height", "auto", "border", "padding", "width",
    ] {
        set.insert(word);
    }

    // seen in Perl PODs
    set.insert("head1");
    set.insert("head2");
    set.insert("head3");

    // common in C literals
    set.insert("printf");

    // common in shell
    set.insert("echo");

    set
});

/// Splits on whitespace and punctuation: keep only characters and numbers,
/// plus `+` when in the middle or end of a word (license names like "GPL2+").
///
/// Unicode-aware: `[^_\W]` matches any word character except underscore.
static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^_\W]+\+?[^_\W]*").expect("invalid word pattern"));

/// True if `token` is in the stopword set. Expects a lowercased token.
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Tokenize text for indexing rules: lowercase, split into words, and drop
/// stopwords.
///
/// Empty or unreadable input yields an empty sequence, never an error.
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let lowercase = text.to_lowercase();
    WORD_PATTERN
        .find_iter(&lowercase)
        .map(|m| m.as_str())
        .filter(|t| !t.is_empty() && !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Tokenize text keeping stopwords.
///
/// Query building needs every word so it can track stopwords per position;
/// they are filtered there, not here.
pub fn tokenize_keep_stopwords(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let lowercase = text.to_lowercase();
    WORD_PATTERN
        .find_iter(&lowercase)
        .map(|m| m.as_str())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// True for tokens that carry little signal on their own: single characters
/// and digit-only tokens.
pub fn is_short_or_digits(token: &str) -> bool {
    token.chars().count() == 1 || token.chars().all(|c| c.is_ascii_digit())
}
