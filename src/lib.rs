//! # pageforge
//!
//! Validates and assembles the build-time artifacts of a declarative single-page-application
//! framework: flows (routing maps), pages (composed UI descriptions), widgets (reusable UI
//! fragments carrying a feature schema), layouts, and shared JSON schemas.
//!
//! The entry point is [`artifact_validator::validate_artifacts`], which validates every
//! artifact class and assembles each entry page reachable from a flow into a self-contained
//! definition with all `extends` inheritance, compositions, and `${...}` feature expressions
//! resolved.
//!
//! ## Example
//!
//! ```rust
//! use pageforge::{artifact_validator, model::Bundle};
//! use serde_json::json;
//!
//! let bundle: Bundle = serde_json::from_value(json!({
//!     "pages": [{"name": "home", "refs": ["home"], "definition": {"areas": {}}}],
//!     "flows": [{"name": "main", "refs": ["main"], "definition": {}, "pages": ["home"]}]
//! })).unwrap();
//!
//! let validated = artifact_validator::validate_artifacts(&bundle).unwrap();
//! assert_eq!(validated.pages.len(), 1);
//! ```
#![warn(
    clippy::doc_markdown,
    clippy::redundant_closure,
    clippy::needless_borrow,
    clippy::print_stdout,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

pub mod artifact_validator;
pub mod assembler;
pub mod config;
pub mod error;
pub mod expr;
pub mod ids;
pub mod merge;
pub mod model;
pub mod schema;
pub mod validators;

pub use artifact_validator::{validate_artifacts, ValidatedBundle};
pub use assembler::{AssembledPage, Assembler};
pub use error::{ArtifactKind, AssemblerError, CompileError, SchemaError};
pub use model::Bundle;
pub use validators::ValidatorsTable;
