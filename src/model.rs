//! The artifact bundle's data model: flows, pages, widgets, layouts and shared schemas.
//!
//! Every artifact is identified by one or more `refs` (aliases); [`RefIndex`] is the
//! `lookup`-by-ref accessor used throughout the assembler. Lookups always return an owned
//! clone, so the assembler never mutates the caller's bundle (spec §5, "Shared resources").

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

fn default_true() -> bool {
    true
}

/// The four mutually-exclusive item kinds, discriminated by which key is present on the
/// JSON object (spec §3, "Item"). `Custom` is the catch-all: an item with none of
/// `widget`/`composition`/`layout` is tolerated without name derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemKind {
    Widget { widget: String },
    Composition { composition: String },
    Layout { layout: String },
    Custom {},
}

/// One entry in an area's ordered item list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    #[serde(flatten)]
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Value>,
    #[serde(
        default,
        rename = "insertBeforeId",
        skip_serializing_if = "Option::is_none"
    )]
    pub insert_before_id: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Item {
    pub fn widget_ref(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Widget { widget } => Some(widget),
            _ => None,
        }
    }

    pub fn composition_ref(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Composition { composition } => Some(composition),
            _ => None,
        }
    }

    pub fn layout_ref(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Layout { layout } => Some(layout),
            _ => None,
        }
    }
}

/// A page's `definition`: optional layout/extends and the area→items mapping.
///
/// `areas` uses a `BTreeMap` rather than the insertion-ordered map the source JSON had: per
/// spec §3 invariant 5, only per-area item ordering is contractually preserved, never the
/// set of area names itself, so a deterministic key order is as good as any other and keeps
/// this crate from taking on an `indexmap` dependency the teacher never carried.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub areas: BTreeMap<String, Vec<Item>>,
    /// Only meaningful when this page is used as a composition: the default-feature
    /// template interpolated and compiled in §4.E.2 step 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Value>,
    /// Only meaningful when this page is used as a composition: §4.E.2 step 3.
    #[serde(default, rename = "mergedFeatures", skip_serializing_if = "Option::is_none")]
    pub merged_features: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub name: String,
    pub refs: Vec<String>,
    #[serde(default)]
    pub definition: PageDefinition,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Widget {
    pub name: String,
    pub refs: Vec<String>,
    #[serde(default)]
    pub descriptor: WidgetDescriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub name: String,
    pub refs: Vec<String>,
    #[serde(default)]
    pub definition: Value,
    #[serde(default)]
    pub pages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub name: Option<String>,
    pub refs: Vec<String>,
    #[serde(default)]
    pub definition: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedSchema {
    pub refs: Vec<String>,
    pub definition: Value,
}

/// The `{ schemas, flows, pages, widgets, layouts, ... }` bundle from spec §6. Unrecognized
/// top-level keys round-trip through `extra` untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default)]
    pub schemas: Vec<SharedSchema>,
    #[serde(default)]
    pub flows: Vec<Flow>,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub layouts: Vec<Layout>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A `ref -> artifact` lookup table that always hands back an owned clone, matching the
/// `lookup`/`deepClone` rule in spec §5: the assembler never aliases the caller's bundle.
#[derive(Debug, Clone, Default)]
pub struct RefIndex<T> {
    by_ref: HashMap<String, T>,
}

impl<T: Clone> RefIndex<T> {
    pub fn new<'a, I>(items: I, refs_of: impl Fn(&T) -> &'a [String]) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut by_ref = HashMap::new();
        for item in items {
            for r in refs_of(item) {
                by_ref.insert(r.clone(), item.clone());
            }
        }
        RefIndex { by_ref }
    }

    pub fn lookup(&self, r: &str) -> Option<T> {
        self.by_ref.get(r).cloned()
    }

    pub fn contains(&self, r: &str) -> bool {
        self.by_ref.contains_key(r)
    }
}

pub fn pages_index(pages: &[Page]) -> RefIndex<Page> {
    RefIndex::new(pages, |p: &Page| p.refs.as_slice())
}

pub fn widgets_index(widgets: &[Widget]) -> RefIndex<Widget> {
    RefIndex::new(widgets, |w: &Widget| w.refs.as_slice())
}

pub fn layouts_index(layouts: &[Layout]) -> RefIndex<Layout> {
    RefIndex::new(layouts, |l: &Layout| l.refs.as_slice())
}
