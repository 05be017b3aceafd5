//! Named file types for `--type`, `--type-not` and `--type-list`.
use crate::error::{Result, SeekrError};
use ignore::types::{FileTypeDef, Types, TypesBuilder};
use ignore::Match;
use log::debug;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TypeChange {
    Defaults,
    Add(String),
    Clear(String),
}

/// Mapping from type name to globs. Mutable while the configuration is being
/// resolved, then frozen into a [`TypeFilter`].
///
/// The catalog records its edits and replays them into a fresh
/// [`TypesBuilder`] whenever it needs one.
#[derive(Debug, Clone, Default)]
pub struct FileTypeCatalog {
    changes: Vec<TypeChange>,
}

impl FileTypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table shipped with the `ignore` crate.
    pub fn with_defaults() -> Self {
        Self {
            changes: vec![TypeChange::Defaults],
        }
    }

    fn builder(&self) -> TypesBuilder {
        let mut builder = TypesBuilder::new();
        for change in &self.changes {
            match change {
                TypeChange::Defaults => {
                    builder.add_defaults();
                }
                TypeChange::Add(def) => {
                    if let Err(e) = builder.add_def(def) {
                        debug!("replaying type definition '{def}': {e}");
                    }
                }
                TypeChange::Clear(name) => {
                    builder.clear(name);
                }
            }
        }
        builder
    }

    /// Applies a `--type-add` definition: `NAME:GLOB` or
    /// `NAME:include:TYPE[,TYPE..]`. Globs are checked here so a bad
    /// definition fails before any search starts.
    pub fn add(&mut self, def: &str) -> Result<()> {
        let mut builder = self.builder();
        builder.add_def(def).map_err(|e| {
            SeekrError::Config(format!(
                "invalid type definition '{def}' ({e}), expected NAME:GLOB or NAME:include:TYPE[,TYPE..]"
            ))
        })?;
        let name = def.split(':').next().unwrap_or(def);
        builder.select(name);
        builder.build().map_err(SeekrError::InvalidGlob)?;
        self.changes.push(TypeChange::Add(def.to_string()));
        Ok(())
    }

    pub fn clear(&mut self, name: &str) {
        self.changes.push(TypeChange::Clear(name.to_string()));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions().iter().any(|def| def.name() == name)
    }

    /// Type names with their globs, both sorted. Cleared types are omitted.
    pub fn definitions(&self) -> Vec<FileTypeDef> {
        self.builder().definitions()
    }

    pub fn filter(&self, selected: &[String], negated: &[String]) -> Result<TypeFilter> {
        if selected.is_empty() && negated.is_empty() {
            return Ok(TypeFilter::default());
        }
        let mut builder = self.builder();
        for name in selected {
            builder.select(name);
        }
        // Negations come last so `-t x -T x` rejects x.
        for name in negated {
            builder.negate(name);
        }
        let types = builder.build().map_err(|e| match e {
            ignore::Error::UnrecognizedFileType(name) => SeekrError::UnknownType(name),
            other => SeekrError::InvalidGlob(other),
        })?;
        Ok(TypeFilter { types })
    }
}

/// Frozen `--type` / `--type-not` predicate.
#[derive(Debug, Clone)]
pub struct TypeFilter {
    types: Types,
}

impl Default for TypeFilter {
    fn default() -> Self {
        Self {
            types: Types::empty(),
        }
    }
}

impl TypeFilter {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn allows(&self, path: &Path) -> bool {
        !matches!(self.types.matched(path, false), Match::Ignore(_))
    }

    pub(crate) fn types(&self) -> &Types {
        &self.types
    }
}
