//! The JSON Schema Validator Facade (spec §4.A).
//!
//! This wraps the `jsonschema` crate -- the same validation engine this retrieval pack's
//! teacher repository publishes (see `DESIGN.md`) -- behind a narrow `CompiledValidator`
//! type so the rest of this crate never names `jsonschema::Validator` directly. The facade
//! owns the pre-compile tree rewrites (additional-properties prohibition, map-format
//! rewriting) and the post-compile first-level-defaults expansion; `jsonschema` owns
//! everything else (drafts, standard formats, `$ref` resolution, `default` keyword
//! handling).

pub mod formats;

use crate::error::{AssemblerError, CompileError, SchemaError};
use crate::config::CompileOptions;
use serde_json::{Map, Value};

/// A compiler handle carrying this facade's framework configuration: JSON-Pointer error
/// paths, the full standard format set plus the domain formats from §4.A, and `default`
/// keyword application -- all defaults of the underlying `jsonschema` engine, so `create()`
/// mostly exists to fix the point where domain formats get registered.
#[derive(Debug, Default, Clone, Copy)]
pub struct Compiler;

impl Compiler {
    pub fn create() -> Self {
        Compiler
    }

    /// `compile(schema, sourceLabel, options) -> validator`.
    pub fn compile(
        &self,
        schema: &Value,
        source_label: &str,
        options: CompileOptions,
    ) -> Result<CompiledValidator, CompileError> {
        if !options.is_features_validator && schema.get("$schema").is_none() {
            return Err(CompileError::MissingSchemaKeyword {
                source_label: source_label.to_string(),
            });
        }

        let mut owned = schema.clone();
        if options.prohibit_additional_properties || options.use_map_formats {
            rewrite_schema_tree(&mut owned, &options);
        }

        let mut builder = jsonschema::options();
        builder
            .with_format("topic", formats::topic)
            .with_format("sub-topic", formats::sub_topic)
            .with_format("flag-topic", formats::flag_topic)
            .with_format("language-tag", formats::language_tag)
            .with_format("topic-map", formats::topic_map)
            .with_format("localization", formats::localization);

        let validator = builder.build(&owned).map_err(|err| CompileError::Invalid {
            source_label: source_label.to_string(),
            message: err.to_string(),
        })?;

        Ok(CompiledValidator {
            validator,
            first_level_defaults: if options.expand_first_level_defaults {
                collect_first_level_defaults(&owned)
            } else {
                Vec::new()
            },
        })
    }

    /// `error(message, errors) -> StructuredError`: the facade's generic error constructor.
    pub fn error(&self, message: impl Into<String>, errors: Vec<SchemaError>) -> AssemblerError {
        AssemblerError::Structured {
            message: message.into(),
            errors,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DefaultKind {
    Object,
    Array,
}

/// A compiled validator: the narrow surface the rest of this crate consumes, so that
/// `jsonschema::Validator` stays an implementation detail of this module.
pub struct CompiledValidator {
    validator: jsonschema::Validator,
    first_level_defaults: Vec<(String, DefaultKind)>,
}

impl CompiledValidator {
    /// Runs validation against `instance`, reporting errors prefixed with `pointer_prefix`.
    /// Mutates the returned defaults into a clone of `instance` before validating, per the
    /// post-compile decoration in spec §4.A -- callers that need the defaulted value back
    /// (feature validation applies `default` keywords in place) should use
    /// [`CompiledValidator::validate_and_default`] instead.
    pub fn validate(&self, instance: &Value, pointer_prefix: &str) -> Result<(), Vec<SchemaError>> {
        let mut instance = instance.clone();
        self.apply_first_level_defaults(&mut instance);
        collect_errors(&self.validator, &instance, pointer_prefix)
    }

    /// Same as [`CompiledValidator::validate`], but returns the (possibly defaulted) instance
    /// on success, used by composition feature validation (spec §4.E.2 step 2: "This both
    /// validates and applies `default` keywords in-place").
    pub fn validate_and_default(
        &self,
        instance: &Value,
        pointer_prefix: &str,
    ) -> Result<Value, Vec<SchemaError>> {
        let mut instance = instance.clone();
        self.apply_first_level_defaults(&mut instance);
        collect_errors(&self.validator, &instance, pointer_prefix)?;
        Ok(instance)
    }

    fn apply_first_level_defaults(&self, instance: &mut Value) {
        if let Some(obj) = instance.as_object_mut() {
            for (property, kind) in &self.first_level_defaults {
                if !obj.contains_key(property) {
                    let empty = match kind {
                        DefaultKind::Object => Value::Object(Map::new()),
                        DefaultKind::Array => Value::Array(Vec::new()),
                    };
                    obj.insert(property.clone(), empty);
                }
            }
        }
    }
}

fn collect_errors(
    validator: &jsonschema::Validator,
    instance: &Value,
    pointer_prefix: &str,
) -> Result<(), Vec<SchemaError>> {
    let errors: Vec<SchemaError> = validator
        .iter_errors(instance)
        .map(|e| SchemaError {
            instance_path: format!("{}{}", pointer_prefix, e.instance_path),
            message: e.to_string(),
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_first_level_defaults(schema: &Value) -> Vec<(String, DefaultKind)> {
    let mut out = Vec::new();
    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (name, subschema) in properties {
            let kind = match subschema.get("type").and_then(Value::as_str) {
                Some("object") => Some(DefaultKind::Object),
                Some("array") => Some(DefaultKind::Array),
                _ => None,
            };
            if let Some(kind) = kind {
                out.push((name.clone(), kind));
            }
        }
    }
    out
}

/// The combined pre-compile transform: additional-properties prohibition (spec §4.A,
/// "Pre-compile transforms" step 1) and map-format rewriting (step 2), both applied in a
/// single recursive descent on an owned clone, per §9's design note ("the pre-compile
/// transforms should be performed on owned deep clones, not on caller-provided schema
/// objects").
fn rewrite_schema_tree(schema: &mut Value, options: &CompileOptions) {
    if let Value::Object(object) = schema {
        if options.use_map_formats {
            apply_map_format(object);
        }

        if options.prohibit_additional_properties
            && (object.contains_key("properties") || object.contains_key("patternProperties"))
            && !object.contains_key("additionalProperties")
        {
            object.insert("additionalProperties".to_string(), Value::Bool(false));
        }

        if let Some(items) = object.get_mut("items") {
            rewrite_schema_tree(items, options);
        }
        if let Some(Value::Object(properties)) = object.get_mut("properties") {
            for subschema in properties.values_mut() {
                rewrite_schema_tree(subschema, options);
            }
        }
        if let Some(Value::Object(pattern_properties)) = object.get_mut("patternProperties") {
            for subschema in pattern_properties.values_mut() {
                rewrite_schema_tree(subschema, options);
            }
        }
        // A boolean-valued `additionalProperties` is left as-is; only an object-valued one
        // describes a schema worth descending into.
        if let Some(additional @ Value::Object(_)) = object.get_mut("additionalProperties") {
            rewrite_schema_tree(additional, options);
        }
    }
}

/// If `schema` declares `type: object` (or a union containing `object`) and declares
/// neither `properties` nor `patternProperties`, and also declares `format: topic-map` or
/// `format: localization`, convert that format into a `patternProperties` entry.
fn apply_map_format(object: &mut Map<String, Value>) {
    let is_object_typed = match object.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("object")),
        _ => false,
    };
    if !is_object_typed || object.contains_key("properties") || object.contains_key("patternProperties") {
        return;
    }
    let format = match object.get("format").and_then(Value::as_str) {
        Some(f) => f.to_string(),
        None => return,
    };
    if let Some(pattern) = formats::map_format_key_pattern(&format) {
        object.remove("format");
        let mut pattern_properties = Map::new();
        pattern_properties.insert(pattern.to_string(), Value::Bool(true));
        object.insert(
            "patternProperties".to_string(),
            Value::Object(pattern_properties),
        );
    }
}
