//! The schema facade's own configuration surface (spec §4.A), generalizing the shape of the
//! teacher's `CompilationOptions`/`CompilationConfig` (`src/compilation/options.rs`,
//! `src/compilation/config.rs`) from "which JSON Schema draft" to "which of this facade's own
//! pre/post-compile transforms are active".

/// Per-`compile` call options (spec §4.A: "options:" list).
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    /// Recursively add `additionalProperties: false` to subschemas that declare
    /// `properties`/`patternProperties` but not `additionalProperties` themselves.
    pub prohibit_additional_properties: bool,
    /// Rewrite `topic-map`/`localization` object-typed formats into `patternProperties`.
    pub use_map_formats: bool,
    /// Fill in `{}`/`[]` for top-level `object`/`array` properties missing on the instance,
    /// one level deep, before each validation call.
    pub expand_first_level_defaults: bool,
    /// Suppresses the missing-`$schema` compile-time check; set for feature schemas, which
    /// are synthesized rather than authored artifacts.
    pub is_features_validator: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            prohibit_additional_properties: true,
            use_map_formats: true,
            expand_first_level_defaults: true,
            is_features_validator: false,
        }
    }
}

impl CompileOptions {
    pub fn features_validator() -> Self {
        CompileOptions {
            is_features_validator: true,
            ..CompileOptions::default()
        }
    }
}
