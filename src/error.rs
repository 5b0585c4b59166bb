use std::fmt;

/// Error produced while compiling a schema, before any instance is validated against it.
#[derive(Debug)]
pub enum CompileError {
    /// A non-features schema is missing the required `$schema` key.
    MissingSchemaKeyword { source_label: String },
    /// The schema itself failed to compile (malformed keywords, bad regex, ...).
    Invalid {
        source_label: String,
        message: String,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::MissingSchemaKeyword { source_label } => write!(
                f,
                "Schema \"{}\" is missing the required \"$schema\" keyword",
                source_label
            ),
            CompileError::Invalid {
                source_label,
                message,
            } => write!(f, "Failed to compile schema \"{}\": {}", source_label, message),
        }
    }
}

impl std::error::Error for CompileError {}

/// A JSON-Pointer-scoped validation error, as produced by a [`crate::schema::CompiledValidator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub instance_path: String,
    pub message: String,
}

/// The kind of artifact a schema-failure error is reporting on, used only to render the
/// `SchemaFailure` message shape from spec §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Page,
    Flow,
    Widget,
    Schema,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Page => write!(f, "page"),
            ArtifactKind::Flow => write!(f, "flow"),
            ArtifactKind::Widget => write!(f, "widget"),
            ArtifactKind::Schema => write!(f, "schema"),
        }
    }
}

/// Every error the assembler and its collaborators can produce, matching the taxonomy in
/// spec §7 message-for-message.
#[derive(Debug)]
pub enum AssemblerError {
    /// `PageAssembler.assemble must be called with a page artifact (object)`
    BadInput,
    /// `Error loading page "<n>": Cycle in page extension detected: <a> -> <b> -> ...`
    PageExtensionCycle { page: String, chain: Vec<String> },
    /// `Error loading page "<n>": Cycle in compositions detected: <a> -> <b> -> ...`
    CompositionCycle { page: String, chain: Vec<String> },
    /// `Error loading page "<n>": Duplicate widget/composition/layout ID(s): <id1>, <id2>, ...`
    DuplicateId { page: String, ids: Vec<String> },
    /// `Error loading page "<n>": Page overwrites layout set by base page "<base>"`
    LayoutConflict { page: String, base: String },
    /// `Error loading page "<n>": No id found that matches insertBeforeId value "<v>"`
    MissingInsertBefore { page: String, value: String },
    /// `Validation failed for <artifact-kind> "<name>": <errors>`
    SchemaFailure {
        kind: ArtifactKind,
        name: String,
        errors: Vec<SchemaError>,
    },
    /// `Validation of page <pageRef> failed for <widgetOrCompositionRef> features: ...`
    FeatureValidationFailure {
        page: String,
        referent: String,
        errors: Vec<SchemaError>,
    },
    /// Schema compilation itself failed (wraps [`CompileError`]).
    Compile(CompileError),
    /// The facade's generic `error(message, errors)` constructor (spec §4.A) -- a
    /// caller-supplied message paired with the raw validator errors, for call sites that
    /// don't map onto one of the fixed shapes above (e.g. the validator builder, which has
    /// no fixed notion of "artifact kind" for an arbitrary shared-schema ref).
    Structured {
        message: String,
        errors: Vec<SchemaError>,
    },
}

impl AssemblerError {
    pub fn duplicate_id(page: impl Into<String>, mut ids: Vec<String>) -> Self {
        ids.sort();
        ids.dedup();
        AssemblerError::DuplicateId {
            page: page.into(),
            ids,
        }
    }
}

fn join_chain(chain: &[String]) -> String {
    chain.join(" -> ")
}

fn join_errors(errors: &[SchemaError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.instance_path, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblerError::BadInput => {
                write!(f, "PageAssembler.assemble must be called with a page artifact (object)")
            }
            AssemblerError::PageExtensionCycle { page, chain } => write!(
                f,
                "Error loading page \"{}\": Cycle in page extension detected: {}",
                page,
                join_chain(chain)
            ),
            AssemblerError::CompositionCycle { page, chain } => write!(
                f,
                "Error loading page \"{}\": Cycle in compositions detected: {}",
                page,
                join_chain(chain)
            ),
            AssemblerError::DuplicateId { page, ids } => write!(
                f,
                "Error loading page \"{}\": Duplicate widget/composition/layout ID(s): {}",
                page,
                ids.join(", ")
            ),
            AssemblerError::LayoutConflict { page, base } => write!(
                f,
                "Error loading page \"{}\": Page overwrites layout set by base page \"{}\"",
                page, base
            ),
            AssemblerError::MissingInsertBefore { page, value } => write!(
                f,
                "Error loading page \"{}\": No id found that matches insertBeforeId value \"{}\"",
                page, value
            ),
            AssemblerError::SchemaFailure { kind, name, errors } => write!(
                f,
                "Validation failed for {} \"{}\": {}",
                kind,
                name,
                join_errors(errors)
            ),
            AssemblerError::FeatureValidationFailure {
                page,
                referent,
                errors,
            } => write!(
                f,
                "Validation of page {} failed for {} features: {}",
                page,
                referent,
                join_errors(errors)
            ),
            AssemblerError::Compile(err) => write!(f, "{}", err),
            AssemblerError::Structured { message, errors } => {
                if errors.is_empty() {
                    write!(f, "{}", message)
                } else {
                    write!(f, "{}: {}", message, join_errors(errors))
                }
            }
        }
    }
}

impl std::error::Error for AssemblerError {}

impl From<CompileError> for AssemblerError {
    fn from(err: CompileError) -> Self {
        AssemblerError::Compile(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_id_message_is_sorted_and_deduplicated() {
        let err = AssemblerError::duplicate_id("home", vec!["b".into(), "a".into(), "a".into()]);
        assert_eq!(
            err.to_string(),
            "Error loading page \"home\": Duplicate widget/composition/layout ID(s): a, b"
        );
    }

    #[test]
    fn cycle_message_shape() {
        let err = AssemblerError::PageExtensionCycle {
            page: "p3".into(),
            chain: vec!["p3".into(), "p2".into(), "p1".into(), "p3".into()],
        };
        assert_eq!(
            err.to_string(),
            "Error loading page \"p3\": Cycle in page extension detected: p3 -> p2 -> p1 -> p3"
        );
    }

    #[test]
    fn missing_insert_before_message_shape() {
        let err = AssemblerError::MissingInsertBefore {
            page: "home".into(),
            value: "idZ".into(),
        };
        assert_eq!(
            err.to_string(),
            "Error loading page \"home\": No id found that matches insertBeforeId value \"idZ\""
        );
    }
}
