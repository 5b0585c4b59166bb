//! Domain-specific format validators and the map-format key patterns derived from them
//! (spec §4.A, "Domain formats").
//!
//! Grounded on `src/checks.rs`: `lazy_static!`-compiled `Regex`es behind plain
//! `fn(&str) -> bool` predicates, the exact shape `jsonschema`'s `with_format` expects.

use regex::Regex;

// T = [a-z][+a-zA-Z0-9]* | [A-Z][+A-Z0-9]*
const TOPIC_SEGMENT: &str = r"(?:[a-z][+a-zA-Z0-9]*|[A-Z][+A-Z0-9]*)";

lazy_static::lazy_static! {
    static ref TOPIC_RE: Regex =
        Regex::new(&format!(r"^(?:{seg}(?:-{seg})*)$", seg = TOPIC_SEGMENT)).unwrap();
    static ref SUB_TOPIC_RE: Regex =
        Regex::new(&format!(r"^{seg}$", seg = TOPIC_SEGMENT)).unwrap();
    static ref FLAG_TOPIC_RE: Regex =
        Regex::new(&format!(r"^!?{seg}(?:-{seg})*$", seg = TOPIC_SEGMENT)).unwrap();
    // A relaxed RFC 5646 pattern tolerating `_` in place of `-`.
    static ref LANGUAGE_TAG_RE: Regex =
        Regex::new(r"(?i)^[a-z]{2,3}(?:[_-][a-z0-9]{2,8})*$").unwrap();
}

/// The `topic` format: `^(T(-T)*)$`.
pub fn topic(instance: &str) -> bool {
    TOPIC_RE.is_match(instance)
}

/// The `sub-topic` format: `^T$`.
pub fn sub_topic(instance: &str) -> bool {
    SUB_TOPIC_RE.is_match(instance)
}

/// The `flag-topic` format: `^!?T(-T)*$`.
pub fn flag_topic(instance: &str) -> bool {
    FLAG_TOPIC_RE.is_match(instance)
}

/// The `language-tag` format: case-insensitive, `_`-tolerant RFC 5646.
pub fn language_tag(instance: &str) -> bool {
    LANGUAGE_TAG_RE.is_match(instance)
}

/// `topic-map` and `localization` apply to *object-typed* schemas without their own
/// `properties`/`patternProperties`: the format is converted into a `patternProperties`
/// entry keyed by the corresponding format's regex source, value schema `true` (anything).
/// As a *string* format (reached only if the rewrite in
/// [`crate::schema::rewrite_map_formats`] didn't apply, e.g. the schema wasn't object-typed)
/// both formats degrade to "always passes" per spec §4.A: "Strings passing through these
/// formats pass unconditionally."
pub fn topic_map(_instance: &str) -> bool {
    true
}

pub fn localization(_instance: &str) -> bool {
    true
}

/// The regex *source* (not a compiled `Regex`) backing each map-format's key pattern, used
/// when rewriting a schema's `topic-map`/`localization` format into `patternProperties`.
pub fn map_format_key_pattern(format: &str) -> Option<&'static str> {
    match format {
        "topic-map" => Some(r"^(?:[a-z][+a-zA-Z0-9]*|[A-Z][+A-Z0-9]*)(?:-(?:[a-z][+a-zA-Z0-9]*|[A-Z][+A-Z0-9]*))*$"),
        "localization" => Some(r"(?i)^[a-z]{2,3}(?:[_-][a-z0-9]{2,8})*$"),
        _ => None,
    }
}
