use std::path::Path;

use serde::Deserialize;

use crate::diagnostics::CompileError;

/// Emission options, fixed at construction and passed to both the lowering
/// engine and the serializer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitOptions {
    /// Write the originating IR type as a `/*...*/` comment before every
    /// variable and parameter name.
    pub debug_annotations: bool,
    /// Assert a runtime type test on every method parameter at method entry.
    pub invariant_checks: bool,
    /// Save every method parameter into a `$`-prefixed shadow at method entry.
    pub shadow_variables: bool,
    /// Name of the runtime support object (`copy`, `equals`, `deref`, ...).
    pub runtime: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self::off()
    }
}

impl EmitOptions {
    /// Minimal output: no annotations, no instrumentation.
    pub fn off() -> Self {
        Self {
            debug_annotations: false,
            invariant_checks: false,
            shadow_variables: false,
            runtime: default_runtime(),
        }
    }

    /// Type comments plus invariant-check scaffolding.
    pub fn debug() -> Self {
        Self {
            debug_annotations: true,
            invariant_checks: true,
            ..Self::off()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CompileError> {
        let file: TomlConfig = toml::from_str(content)
            .map_err(|e| CompileError::config(e.message().to_string(), None))?;
        file.emit.validate(None)
    }

    /// Load options from the `[emit]` table of a TOML file.
    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CompileError::config(format!("failed to read config: {e}"), Some(path.to_path_buf()))
        })?;
        let file: TomlConfig = toml::from_str(&content)
            .map_err(|e| CompileError::config(e.message().to_string(), Some(path.to_path_buf())))?;
        file.emit.validate(Some(path))
    }

    fn validate(self, path: Option<&Path>) -> Result<Self, CompileError> {
        let valid = self.runtime.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
            && self.runtime.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
        if !valid {
            return Err(CompileError::config(
                format!("runtime name '{}' is not a valid identifier", self.runtime),
                path.map(Path::to_path_buf),
            ));
        }
        Ok(self)
    }
}

fn default_runtime() -> String {
    "Wy".to_string()
}

// ---- TOML deserialization types ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    emit: EmitOptions,
}
