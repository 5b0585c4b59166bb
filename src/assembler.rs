//! The Page Assembler (spec §4.E): recursive `extends`/composition resolution, id
//! uniqueness, disabled-item pruning and widget-feature validation.
//!
//! This is the core of the crate. `Assembler::assemble` drives a mutual recursion between
//! extension resolution ([`Assembler::load_page_recursively`]) and composition expansion
//! ([`Assembler::expand_compositions_with_chain`]), consulting the schema facade, the
//! expression interpolator, id utilities and the structural merge along the way.

use crate::config::CompileOptions;
use crate::error::{ArtifactKind, AssemblerError};
use crate::expr::{interpolate, Context};
use crate::ids::{item_name, IdCounter};
use crate::merge::merge_item_lists;
use crate::model::{Item, Page, PageDefinition, RefIndex};
use crate::schema::Compiler;
use crate::validators::ValidatorsTable;
use serde_json::Value;
use std::collections::HashMap;

/// The result of [`Assembler::assemble`]: a page whose `extends`/compositions are fully
/// resolved and whose remaining items all carry unique, enabled ids.
#[derive(Debug, Clone)]
pub struct AssembledPage {
    pub name: String,
    pub definition: PageDefinition,
}

pub struct Assembler<'v> {
    validators: &'v ValidatorsTable,
    pages: RefIndex<Page>,
    counter: IdCounter,
}

impl<'v> Assembler<'v> {
    pub fn new(validators: &'v ValidatorsTable, pages: RefIndex<Page>) -> Self {
        Assembler {
            validators,
            pages,
            counter: IdCounter::new(),
        }
    }

    /// `assemble(page) -> page`: the public entry point. Errors are ordinary `Result`
    /// propagation -- there's no panicking path, so the `BadInput` variant is only
    /// reachable from the crate's dynamic JSON entry point (`artifact_validator`), which
    /// accepts a raw bundle before it is deserialized into typed pages.
    pub fn assemble(&self, page: &Page) -> Result<AssembledPage, AssemblerError> {
        let page_ref = page.refs.first().map(String::as_str).unwrap_or(page.name.as_str());
        let definition = self.load_page_recursively(page, page_ref, &[], &[])?;
        self.validate_widget_features(&definition, &page.name)?;
        Ok(AssembledPage {
            name: page.name.clone(),
            definition,
        })
    }

    /// Steps 1-8 of spec §4.E: cycle check, schema validation, extension merge, id
    /// generation, composition expansion, duplicate check, disabled pruning. Widget-feature
    /// validation (step 9) is deliberately deferred to [`Assembler::assemble`]'s single final
    /// pass: when this is called to load a composition's own page, its widget items may
    /// still carry unresolved `${...}` expressions that only get resolved once the
    /// composition's `areas` are interpolated by the caller.
    ///
    /// `composition_chain` is threaded straight through to the internal
    /// [`Assembler::expand_compositions_with_chain`] call rather than reset to empty: this is
    /// what lets cycle detection see through a composition page's own `extends` resolution
    /// down into its nested compositions, instead of starting each nested load with a chain
    /// that forgot every composition already open on the stack.
    fn load_page_recursively(
        &self,
        page: &Page,
        page_ref: &str,
        extension_chain: &[String],
        composition_chain: &[String],
    ) -> Result<PageDefinition, AssemblerError> {
        if extension_chain.iter().any(|name| name == &page.name) {
            let mut chain = extension_chain.to_vec();
            chain.push(page.name.clone());
            log::warn!("cycle in page extension for \"{}\": {}", page.name, chain.join(" -> "));
            return Err(AssemblerError::PageExtensionCycle {
                page: page.name.clone(),
                chain,
            });
        }

        if let Some(validator) = self.validators.page() {
            let instance = serde_json::to_value(&page.definition).unwrap_or(Value::Null);
            validator
                .validate(&instance, "")
                .map_err(|errors| AssemblerError::SchemaFailure {
                    kind: ArtifactKind::Page,
                    name: page_ref.to_string(),
                    errors,
                })?;
        }

        let mut definition = page.definition.clone();

        let mut next_chain = extension_chain.to_vec();
        next_chain.push(page.name.clone());

        if let Some(extends_ref) = definition.extends.take() {
            if !extends_ref.is_empty() {
                let base_page = self.pages.lookup(&extends_ref).ok_or_else(|| {
                    self.validators.error(
                        format!(
                            "Unknown page ref \"{}\" referenced by \"extends\" on page \"{}\"",
                            extends_ref, page.name
                        ),
                        vec![],
                    )
                })?;
                let base_definition =
                    self.load_page_recursively(&base_page, &extends_ref, &next_chain, composition_chain)?;

                let mut merged_areas = base_definition.areas;
                for (area_name, items) in std::mem::take(&mut definition.areas) {
                    match merged_areas.get_mut(&area_name) {
                        Some(target) => merge_item_lists(target, items, &page.name)?,
                        None => {
                            merged_areas.insert(area_name, items);
                        }
                    }
                }

                let layout = match (base_definition.layout, definition.layout.take()) {
                    (Some(_), Some(_)) => {
                        return Err(AssemblerError::LayoutConflict {
                            page: page.name.clone(),
                            base: base_page.name.clone(),
                        })
                    }
                    (Some(base_layout), None) => Some(base_layout),
                    (None, extending_layout) => extending_layout,
                };

                definition.areas = merged_areas;
                definition.layout = layout;
            }
        }

        for items in definition.areas.values_mut() {
            for item in items.iter_mut() {
                if item.id.is_none() {
                    let prefix = item_name(item);
                    item.id = Some(self.counter.next_id(&prefix));
                }
            }
        }
        check_duplicate_ids(&definition, &page.name)?;

        self.expand_compositions_with_chain(&mut definition, &page.name, composition_chain)?;
        check_duplicate_ids(&definition, &page.name)?;

        prune_disabled(&mut definition);

        Ok(definition)
    }

    /// Composition expansion (spec §4.E.1). Each area is walked in reverse index order so
    /// that splicing a replacement does not disturb the indices of items yet to be visited.
    fn expand_compositions_with_chain(
        &self,
        definition: &mut PageDefinition,
        page_name: &str,
        composition_chain: &[String],
    ) -> Result<(), AssemblerError> {
        let area_names: Vec<String> = definition.areas.keys().cloned().collect();

        for area_name in area_names {
            let mut index = definition.areas.get(&area_name).map(Vec::len).unwrap_or(0);
            while index > 0 {
                index -= 1;

                let item = match definition.areas.get(&area_name).and_then(|items| items.get(index)) {
                    Some(item) if item.composition_ref().is_some() => item.clone(),
                    _ => continue,
                };
                if !item.enabled {
                    continue;
                }

                let composition_ref = item.composition_ref().unwrap().to_string();
                let composition_id = item
                    .id
                    .clone()
                    .unwrap_or_else(|| self.counter.next_id(&item_name(&item)));

                if composition_chain.iter().any(|seen| seen == &composition_ref) {
                    let mut chain = composition_chain.to_vec();
                    chain.push(composition_ref);
                    log::warn!("cycle in compositions for \"{}\": {}", page_name, chain.join(" -> "));
                    return Err(AssemblerError::CompositionCycle {
                        page: page_name.to_string(),
                        chain,
                    });
                }

                let composition_page = self.pages.lookup(&composition_ref).ok_or_else(|| {
                    self.validators.error(
                        format!(
                            "Unknown composition ref \"{}\" referenced by page \"{}\"",
                            composition_ref, page_name
                        ),
                        vec![],
                    )
                })?;

                let mut next_chain = composition_chain.to_vec();
                next_chain.push(composition_ref.clone());

                // `load_page_recursively` itself expands any compositions nested inside this
                // composition's own page (carrying `next_chain` forward), so by the time it
                // returns, `composition_definition` is already fully composition-free -- there
                // is no separate nested-expansion pass to run afterwards.
                let mut composition_definition =
                    self.load_page_recursively(&composition_page, &composition_ref, &[], &next_chain)?;

                prefix_composition_ids(&mut composition_definition, &composition_id);

                let item_pointer = format!("/areas/{}/{}", area_name, index);
                let item_features = item.features.clone().unwrap_or(Value::Null);
                expand_composition_expressions(
                    &mut composition_definition,
                    &composition_id,
                    item_features,
                    &composition_ref,
                    page_name,
                    &item_pointer,
                )?;

                let mut dot_spliced = false;
                for (inner_area_name, inner_items) in composition_definition.areas {
                    if inner_area_name == "." {
                        if let Some(target) = definition.areas.get_mut(&area_name) {
                            target.splice(index..index + 1, inner_items);
                        }
                        dot_spliced = true;
                    } else {
                        match definition.areas.get_mut(&inner_area_name) {
                            Some(target) => merge_item_lists(target, inner_items, page_name)?,
                            None => {
                                definition.areas.insert(inner_area_name, inner_items);
                            }
                        }
                    }
                }
                if !dot_spliced {
                    if let Some(target) = definition.areas.get_mut(&area_name) {
                        if index < target.len() {
                            target.remove(index);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Widget-feature validation (spec §4.E step 9, and the composition-sourced pass that
    /// step 10 calls for separately -- both collapse into this single pass over the fully
    /// assembled tree, since composition content is already grafted and interpolated by the
    /// time this runs).
    fn validate_widget_features(&self, definition: &PageDefinition, page_name: &str) -> Result<(), AssemblerError> {
        for (area_name, items) in &definition.areas {
            for (index, item) in items.iter().enumerate() {
                if let Some(widget_ref) = item.widget_ref() {
                    if let Some(validator) = self.validators.features_widgets.get(widget_ref) {
                        let features = item
                            .features
                            .clone()
                            .unwrap_or_else(|| Value::Object(Default::default()));
                        let pointer_prefix = format!("/areas/{}/{}/features", area_name, index);
                        validator
                            .validate(&features, &pointer_prefix)
                            .map_err(|errors| AssemblerError::FeatureValidationFailure {
                                page: page_name.to_string(),
                                referent: widget_ref.to_string(),
                                errors,
                            })?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn check_duplicate_ids(definition: &PageDefinition, page_name: &str) -> Result<(), AssemblerError> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for items in definition.areas.values() {
        for item in items {
            if let Some(id) = &item.id {
                *counts.entry(id.clone()).or_insert(0) += 1;
            }
        }
    }
    let duplicates: Vec<String> = counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(id, _)| id)
        .collect();
    if duplicates.is_empty() {
        Ok(())
    } else {
        log::warn!("duplicate ids in page \"{}\": {}", page_name, duplicates.join(", "));
        Err(AssemblerError::duplicate_id(page_name, duplicates))
    }
}

fn prune_disabled(definition: &mut PageDefinition) {
    for (area_name, items) in definition.areas.iter_mut() {
        let before = items.len();
        items.retain(|item| item.enabled);
        let dropped = before - items.len();
        if dropped > 0 {
            log::debug!("pruned {} disabled item(s) from area \"{}\"", dropped, area_name);
        }
    }
}

/// Prefix phase (spec §4.E.1 step 6): every item id and `insertBeforeId` reference within the
/// composition's areas is rewritten to `<compositionId>-<origId>`, and every dotted,
/// non-leading-dot area name is renamed to `<compositionId>-<oldAreaName>`. The special area
/// name `.` is preserved, as are plain (non-dotted) area names.
///
/// This crate prefixes every id uniformly rather than only "explicit" ones: ids synthesized
/// by [`IdCounter`] are already globally unique, so re-prefixing them is a harmless rename,
/// and the `Item` model carries no explicit-vs-generated provenance to do otherwise.
fn prefix_composition_ids(definition: &mut PageDefinition, composition_id: &str) {
    let old_areas = std::mem::take(&mut definition.areas);
    let mut new_areas = std::collections::BTreeMap::new();
    for (area_name, mut items) in old_areas {
        for item in items.iter_mut() {
            if let Some(id) = &item.id {
                item.id = Some(format!("{}-{}", composition_id, id));
            }
            if let Some(before) = &item.insert_before_id {
                item.insert_before_id = Some(format!("{}-{}", composition_id, before));
            }
        }
        let renamed = area_name != "." && area_name.chars().skip(1).any(|c| c == '.');
        let new_name = if renamed {
            format!("{}-{}", composition_id, area_name)
        } else {
            area_name
        };
        new_areas.insert(new_name, items);
    }
    definition.areas = new_areas;
}

/// Composition expressions (spec §4.E.2): interpolates the composition's own `features`
/// template and validates/defaults the item's features against it, folds `mergedFeatures`
/// array concatenations in, then interpolates `areas` with the resulting context.
fn expand_composition_expressions(
    definition: &mut PageDefinition,
    composition_id: &str,
    item_features: Value,
    composition_ref: &str,
    containing_page: &str,
    item_pointer: &str,
) -> Result<(), AssemblerError> {
    let mut features = item_features.clone();
    let ctx = Context::new(composition_id, item_features);

    if let Some(features_template) = definition.features.take() {
        let interpolated_template = interpolate(&features_template, &ctx).unwrap_or(Value::Null);
        let compiler = Compiler::create();
        let validator = compiler.compile(
            &interpolated_template,
            composition_ref,
            CompileOptions::features_validator(),
        )?;
        let pointer_prefix = format!("{}/features", item_pointer);
        features = validator
            .validate_and_default(&features, &pointer_prefix)
            .map_err(|errors| AssemblerError::FeatureValidationFailure {
                page: containing_page.to_string(),
                referent: composition_ref.to_string(),
                errors,
            })?;
    }

    if let Some(merged_features_def) = definition.merged_features.take() {
        let interpolated = interpolate(&merged_features_def, &ctx).unwrap_or(Value::Null);
        if let Value::Object(map) = interpolated {
            for (path, addition) in map {
                if let Value::Array(addition_items) = addition {
                    let target = get_or_default_array(&mut features, &path);
                    target.extend(addition_items);
                }
            }
        }
    }

    let ctx2 = Context::new(composition_id, features);
    let areas_value = serde_json::to_value(&definition.areas).unwrap_or_else(|_| Value::Object(Default::default()));
    let interpolated_areas = interpolate(&areas_value, &ctx2).unwrap_or_else(|| Value::Object(Default::default()));
    definition.areas = serde_json::from_value(interpolated_areas).unwrap_or_default();

    Ok(())
}

/// Shallow dotted-path accessor/creator returning the `Vec` at `path` inside `value`,
/// creating empty objects/arrays along the way as needed (spec §4.E.2 step 3: "...current
/// value found at that path in the cloned features (defaulting to `[]`)").
fn get_or_default_array<'a>(value: &'a mut Value, path: &str) -> &'a mut Vec<Value> {
    let parts: Vec<&str> = path.split('.').collect();
    let mut current = value;
    for (i, part) in parts.iter().enumerate() {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let map = current.as_object_mut().expect("just ensured object");
        let entry = map.entry((*part).to_string()).or_insert(Value::Null);
        if i == parts.len() - 1 {
            if !entry.is_array() {
                *entry = Value::Array(Vec::new());
            }
            return entry.as_array_mut().expect("just ensured array");
        }
        current = entry;
    }
    unreachable!("path always has at least one segment")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_ids_across_areas_are_reported_sorted() {
        let mut definition = PageDefinition::default();
        let item_a: Item = serde_json::from_value(json!({"widget": "w", "id": "x"})).unwrap();
        let item_b: Item = serde_json::from_value(json!({"widget": "w", "id": "x"})).unwrap();
        definition.areas.insert("a".into(), vec![item_a]);
        definition.areas.insert("b".into(), vec![item_b]);
        let err = check_duplicate_ids(&definition, "home").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error loading page \"home\": Duplicate widget/composition/layout ID(s): x"
        );
    }

    #[test]
    fn prune_disabled_drops_disabled_items_only() {
        let mut definition = PageDefinition::default();
        let kept: Item = serde_json::from_value(json!({"widget": "w", "id": "id2"})).unwrap();
        let dropped: Item =
            serde_json::from_value(json!({"widget": "w", "id": "id1", "enabled": false})).unwrap();
        definition.areas.insert("a".into(), vec![dropped, kept]);
        prune_disabled(&mut definition);
        let ids: Vec<_> = definition.areas["a"].iter().map(|i| i.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["id2"]);
    }

    #[test]
    fn prefix_composition_ids_renames_ids_and_dotted_areas_but_preserves_dot() {
        let mut definition = PageDefinition::default();
        let item: Item = serde_json::from_value(json!({"widget": "w", "id": "inner"})).unwrap();
        definition.areas.insert(".".into(), vec![item.clone()]);
        definition.areas.insert("widget.sub".into(), vec![item]);
        prefix_composition_ids(&mut definition, "host");
        assert_eq!(definition.areas["."][0].id.as_deref(), Some("host-inner"));
        assert!(definition.areas.contains_key("host-widget.sub"));
        assert!(!definition.areas.contains_key("widget.sub"));
    }

    #[test]
    fn get_or_default_array_creates_missing_path() {
        let mut value = json!({});
        get_or_default_array(&mut value, "a.b").push(json!(1));
        assert_eq!(value, json!({"a": {"b": [1]}}));
    }
}
