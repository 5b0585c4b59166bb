//! Deterministic id generation, dash↔camelCase conversion and id-to-topic conversion
//! (spec §4.C).

use crate::model::{Item, ItemKind};
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};

lazy_static::lazy_static! {
    // Matches a `-`, `_` or `/` immediately followed by the character to upper-case.
    static ref DASH_SEGMENT_RE: Regex = Regex::new(r"[_/-](.)").unwrap();
}

/// `dashToCamel`: replaces each occurrence of `[_/-]X` with uppercase `X`.
pub fn dash_to_camel(s: &str) -> String {
    DASH_SEGMENT_RE
        .replace_all(s, |caps: &regex::Captures| caps[1].to_uppercase())
        .into_owned()
}

/// `topicFromId`: replaces `-` with `+`, then applies the dash-to-camel rule.
pub fn topic_from_id(id: &str) -> String {
    dash_to_camel(&id.replace('-', "+"))
}

/// `itemName`: the name contribution an item makes toward a generated id prefix.
pub fn item_name(item: &Item) -> String {
    match &item.kind {
        ItemKind::Widget { widget } => {
            let segment = widget.rsplit('/').next().unwrap_or(widget);
            dash_to_camel(segment)
        }
        ItemKind::Composition { composition } => dash_to_camel(composition),
        ItemKind::Layout { layout } => dash_to_camel(layout),
        ItemKind::Custom {} => String::new(),
    }
}

/// The assembler's per-instance monotonic id counter (spec §3, "Lifecycles" and §9's design
/// note: "a relaxed atomic in a threaded port"). A plain `usize` would do in a single-task
/// model, but since pages may be assembled from multiple threads via `rayon` (spec §4.G.1),
/// this crate takes the threaded port directly rather than two code paths.
#[derive(Debug, Default)]
pub struct IdCounter(AtomicUsize);

impl IdCounter {
    pub fn new() -> Self {
        IdCounter(AtomicUsize::new(0))
    }

    /// `nextId(prefix)`: returns `"<prefix>-id<N>"` where `N` is the assembler's counter,
    /// post-incremented.
    pub fn next_id(&self, prefix: &str) -> String {
        let n = self.0.fetch_add(1, Ordering::Relaxed);
        format!("{}-id{}", prefix, n)
    }
}
