//! The top-level Artifact Validator (spec §4.G): dispatches validation per artifact class and
//! orchestrates the page assembler over entry pages only.

use crate::assembler::{AssembledPage, Assembler};
use crate::error::{ArtifactKind, AssemblerError};
use crate::model::{pages_index, Bundle, Flow, Widget};
use crate::validators::ValidatorsTable;
use rayon::prelude::*;
use std::collections::HashSet;

/// The outcome of [`validate_artifacts`]: the original bundle's `schemas` and `layouts` pass
/// through untouched; `flows`/`widgets`/`pages` are replaced by their validated/assembled
/// forms, and `pages` contains only the entry pages reachable from some flow.
pub struct ValidatedBundle {
    pub flows: Vec<Flow>,
    pub widgets: Vec<Widget>,
    pub pages: Vec<AssembledPage>,
}

/// `validateFlows(flows)`: validates each flow's `definition` against `validators.flow`.
pub fn validate_flows(flows: &[Flow], validators: &ValidatorsTable) -> Result<Vec<Flow>, AssemblerError> {
    let validator = match validators.flow() {
        Some(v) => v,
        None => return Ok(flows.to_vec()),
    };
    for flow in flows {
        validator
            .validate(&flow.definition, "")
            .map_err(|errors| AssemblerError::SchemaFailure {
                kind: ArtifactKind::Flow,
                name: flow.name.clone(),
                errors,
            })?;
    }
    Ok(flows.to_vec())
}

/// `validateWidgets(widgets)`: validates each widget's `descriptor` against `validators.widget`.
pub fn validate_widgets(widgets: &[Widget], validators: &ValidatorsTable) -> Result<Vec<Widget>, AssemblerError> {
    let validator = match validators.widget() {
        Some(v) => v,
        None => return Ok(widgets.to_vec()),
    };
    for widget in widgets {
        let instance = serde_json::to_value(&widget.descriptor).unwrap_or(serde_json::Value::Null);
        validator
            .validate(&instance, "")
            .map_err(|errors| AssemblerError::SchemaFailure {
                kind: ArtifactKind::Widget,
                name: widget.name.clone(),
                errors,
            })?;
    }
    Ok(widgets.to_vec())
}

/// `validatePages(pages, flows, widgets, layouts)`: computes the entry-ref set from the
/// union of every flow's `pages`, then assembles only the pages whose `refs` intersect it.
/// Assembly of distinct entry pages runs in parallel via `rayon` (spec §4.G.1); within a
/// single page, composition expansion stays strictly sequential.
pub fn validate_pages(bundle: &Bundle, validators: &ValidatorsTable) -> Result<Vec<AssembledPage>, AssemblerError> {
    let entry_refs: HashSet<&str> = bundle
        .flows
        .iter()
        .flat_map(|flow| flow.pages.iter().map(String::as_str))
        .collect();

    let entry_pages: Vec<_> = bundle
        .pages
        .iter()
        .filter(|page| page.refs.iter().any(|r| entry_refs.contains(r.as_str())))
        .collect();

    let pages_by_ref = pages_index(&bundle.pages);
    let assembler = Assembler::new(validators, pages_by_ref);

    entry_pages
        .into_par_iter()
        .map(|page| assembler.assemble(page))
        .collect()
}

/// `validateArtifacts(bundle)`: builds validators once, runs the three validation passes in
/// parallel over shared read-only references, and returns the bundle with
/// `flows`/`widgets`/`pages` replaced.
pub fn validate_artifacts(bundle: &Bundle) -> Result<ValidatedBundle, AssemblerError> {
    let validators = ValidatorsTable::build(bundle)?;

    let (flows_result, (widgets_result, pages_result)) = rayon::join(
        || validate_flows(&bundle.flows, &validators),
        || {
            rayon::join(
                || validate_widgets(&bundle.widgets, &validators),
                || validate_pages(bundle, &validators),
            )
        },
    );

    Ok(ValidatedBundle {
        flows: flows_result?,
        widgets: widgets_result?,
        pages: pages_result?,
    })
}
