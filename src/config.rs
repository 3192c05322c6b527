use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::builtins::BuiltinTable;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid options: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid template '{template}' for '{name}': {reason}")]
    InvalidTemplate {
        name: String,
        template: String,
        reason: String,
    },
    #[error(
        "Template '{template}' for '{name}' uses argument ${index} but the form takes {arity} arguments"
    )]
    ArgumentOutOfRange {
        name: String,
        template: String,
        index: usize,
        arity: usize,
    },
}

/// How function names and call targets are spelled in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseConvention {
    #[default]
    Identity,
    SnakeToCamel,
}

impl CaseConvention {
    pub fn apply(self, name: &str) -> Cow<'_, str> {
        match self {
            Self::Identity => Cow::Borrowed(name),
            Self::SnakeToCamel => snake_to_camel(name),
        }
    }
}

fn snake_to_camel(name: &str) -> Cow<'_, str> {
    let body = name.trim_start_matches('_');
    if !body.contains('_') {
        return Cow::Borrowed(name);
    }
    let leading = &name[..name.len() - body.len()];
    let mut parts = body.split('_');
    let mut converted = String::with_capacity(name.len());
    converted.push_str(leading);
    converted.push_str(parts.next().unwrap_or_default());
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            converted.extend(first.to_uppercase());
            converted.push_str(&chars.as_str().to_lowercase());
        }
    }
    Cow::Owned(converted)
}

/// Declaration bookkeeping granularity.
///
/// `Flat` shares one declared-name set across the whole run, so a name first
/// bound in one function is a bare reassignment in every later function.
/// `Lexical` keeps one frame per function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoping {
    #[default]
    Flat,
    Lexical,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
pub struct TranslateOptions {
    pub case_convention: CaseConvention,
    pub scoping: Scoping,
    pub builtins: BuiltinTable,
}

impl TranslateOptions {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }
}
