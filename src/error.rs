use std::path::PathBuf;

use thiserror::Error;

use crate::codec::DecodeError;
use crate::config::ConfigError;
use crate::filler::Parameter;
use crate::types::{TemplateFamily, Variant};

/// Unified error type for loading, instantiating and configuring the repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Base policies of one variant could not be loaded. The repository is unusable.
    #[error("failed to load {variant} base policies: {source}")]
    Initialization {
        variant: Variant,
        #[source]
        source: Box<RepositoryError>,
    },

    #[error(
        "expected exactly 1 template with the ID {family} in the {variant} tree, found {found}"
    )]
    TemplateSelection {
        family: TemplateFamily,
        variant: Variant,
        found: usize,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("policy directory {} does not exist", path.display())]
    MissingDirectory { path: PathBuf },

    #[error("policy directory {} is not valid UTF-8", path.display())]
    NonUtf8Path { path: PathBuf },

    #[error("invalid discovery pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A template file exists for a family with no registered filler.
    #[error(
        "no placeholder filler registered for template family {family} ({variant}: {})",
        path.display()
    )]
    UnregisteredFamily {
        family: TemplateFamily,
        variant: Variant,
        path: PathBuf,
    },

    #[error("no placeholder filler registered for template family {family}")]
    UnknownFamily { family: TemplateFamily },

    #[error("template family {family} requires a {parameter}")]
    MissingParameter {
        family: TemplateFamily,
        parameter: Parameter,
    },

    /// Only raised with `strict_placeholders` enabled.
    #[error(
        "placeholder '{placeholder}' not found in {} (template {family}, {variant})",
        path.display()
    )]
    PlaceholderMissing {
        family: TemplateFamily,
        variant: Variant,
        path: PathBuf,
        placeholder: &'static str,
    },

    /// A parameter value would change the XML structure of the template.
    #[error("{parameter} '{value}' for template family {family} contains a character not allowed in policy templates")]
    UnsafeValue {
        family: TemplateFamily,
        parameter: Parameter,
        value: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
