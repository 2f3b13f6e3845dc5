//! Repository configuration.
//!
//! Paths are resolved relative to the process working directory unless they
//! are absolute. The defaults mirror the policy-stack layout shipped with the
//! EPR reference policies.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{TemplateFamily, Variant};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Root of the original policy stack.
    pub original_root: PathBuf,
    /// Root of the modified policy stack.
    pub modified_root: PathBuf,
    /// Base policy subtree, relative to each root.
    pub base_policy_dir: PathBuf,
    /// Patient template subtree, relative to each root.
    pub patient_template_dir: PathBuf,
    /// Fail instantiation when a placeholder of the family's table is absent
    /// from the template.
    pub strict_placeholders: bool,
    /// Read modified delegation (304) templates from the original tree, as
    /// earlier deployments did.
    pub legacy_modified_delegation_source: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            original_root: PathBuf::from("policy-stack/original"),
            modified_root: PathBuf::from("policy-stack/modified"),
            base_policy_dir: PathBuf::from("Privacy Policy Stack/EPD Policy Stack"),
            patient_template_dir: PathBuf::from(
                "Privacy Policy Stack/Patient Specific via Policy Manager",
            ),
            strict_placeholders: false,
            legacy_modified_delegation_source: false,
        }
    }
}

impl RepositoryConfig {
    /// Default layout with both variant roots under `root`
    /// (`root/original`, `root/modified`).
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            original_root: root.join("original"),
            modified_root: root.join("modified"),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] on malformed input or unknown keys.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] on I/O failure or malformed input.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    #[must_use]
    pub fn strict_placeholders(mut self, strict: bool) -> Self {
        self.strict_placeholders = strict;
        self
    }

    #[must_use]
    pub fn legacy_modified_delegation_source(mut self, legacy: bool) -> Self {
        self.legacy_modified_delegation_source = legacy;
        self
    }

    #[must_use]
    pub fn root(&self, variant: Variant) -> &Path {
        match variant {
            Variant::Original => &self.original_root,
            Variant::Modified => &self.modified_root,
        }
    }

    #[must_use]
    pub fn base_policy_path(&self, variant: Variant) -> PathBuf {
        self.root(variant).join(&self.base_policy_dir)
    }

    #[must_use]
    pub fn template_path(&self, variant: Variant) -> PathBuf {
        self.root(variant).join(&self.patient_template_dir)
    }

    /// Directory searched for `family`'s template when onboarding in `variant`.
    #[must_use]
    pub fn template_source(&self, variant: Variant, family: TemplateFamily) -> PathBuf {
        if self.legacy_modified_delegation_source
            && variant == Variant::Modified
            && family == TemplateFamily::DELEGATION
        {
            return self.template_path(Variant::Original);
        }
        self.template_path(variant)
    }
}
