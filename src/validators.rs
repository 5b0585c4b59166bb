//! The Validator Builder (spec §4.F): compiles every schema artifact in a bundle into flat
//! lookup tables keyed by ref, consumed by the page assembler (component E).

use crate::config::CompileOptions;
use crate::error::{AssemblerError, CompileError};
use crate::model::Bundle;
use crate::schema::{CompiledValidator, Compiler};
use std::collections::HashMap;

/// The well-known validator keys produced when the bundle carries shared schemas with those
/// refs (spec §3, "Validators Table").
pub struct ValidatorsTable {
    pub by_schema_ref: HashMap<String, CompiledValidator>,
    pub features_widgets: HashMap<String, CompiledValidator>,
    pub features_pages: HashMap<String, CompiledValidator>,
    compiler: Compiler,
}

impl ValidatorsTable {
    pub fn build(bundle: &Bundle) -> Result<Self, CompileError> {
        let compiler = Compiler::create();

        let mut by_schema_ref = HashMap::new();
        for schema in &bundle.schemas {
            let source_label = schema.refs.first().map(String::as_str).unwrap_or("schema");
            for r in &schema.refs {
                let validator = compiler.compile(&schema.definition, source_label, CompileOptions::default())?;
                by_schema_ref.insert(r.clone(), validator);
            }
        }

        let mut features_widgets = HashMap::new();
        for widget in &bundle.widgets {
            if let Some(features_schema) = &widget.descriptor.features {
                for r in &widget.refs {
                    let validator =
                        compiler.compile(features_schema, r, CompileOptions::features_validator())?;
                    features_widgets.insert(r.clone(), validator);
                }
            }
        }

        let mut features_pages = HashMap::new();
        for page in &bundle.pages {
            if let Some(features_schema) = &page.definition.features {
                for r in &page.refs {
                    let validator =
                        compiler.compile(features_schema, r, CompileOptions::features_validator())?;
                    features_pages.insert(r.clone(), validator);
                }
            }
        }

        Ok(ValidatorsTable {
            by_schema_ref,
            features_widgets,
            features_pages,
            compiler,
        })
    }

    pub fn page(&self) -> Option<&CompiledValidator> {
        self.by_schema_ref.get("page")
    }

    pub fn flow(&self) -> Option<&CompiledValidator> {
        self.by_schema_ref.get("flow")
    }

    pub fn widget(&self) -> Option<&CompiledValidator> {
        self.by_schema_ref.get("widget")
    }

    pub fn error(&self, message: impl Into<String>, errors: Vec<crate::error::SchemaError>) -> AssemblerError {
        self.compiler.error(message, errors)
    }
}
