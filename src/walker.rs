//! Sorted depth-first traversal on `ignore::WalkBuilder`, with seekr's own
//! layered ignore rules applied through `filter_entry`.
use crate::error::SeekrError;
use crate::file_types::TypeFilter;
use crate::rules::{IgnoreOptions, IgnoreRuleSet};
use ignore::{DirEntry, Walk, WalkBuilder};
use log::{debug, warn};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Path that stands for standard input.
pub const STDIN_PATH: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    /// A file reached by following a symbolic link.
    Symlink,
    Stdin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    path: PathBuf,
    depth: usize,
    kind: EntryKind,
}

impl WalkEntry {
    pub fn new(path: impl Into<PathBuf>, depth: usize, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            depth,
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_stdin(&self) -> bool {
        self.kind == EntryKind::Stdin
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    pub max_depth: Option<usize>,
    pub follow_links: bool,
    pub hidden: bool,
    pub max_filesize: Option<u64>,
    pub ignore: IgnoreOptions,
    /// Global, explicit and command-line rules, built once at startup.
    pub rules: IgnoreRuleSet,
    pub types: TypeFilter,
}

/// Per-root ignore state shared with the walk's entry filter. Each directory
/// gets its parent's rule set plus the ignore files it contains, computed on
/// first use.
struct DirRules {
    root: PathBuf,
    abs_root: PathBuf,
    ignore: IgnoreOptions,
    base: IgnoreRuleSet,
    max_filesize: Option<u64>,
    cache: Mutex<HashMap<PathBuf, IgnoreRuleSet>>,
}

impl DirRules {
    fn rules_for(&self, dir: &Path) -> IgnoreRuleSet {
        let cached = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dir)
            .cloned();
        if let Some(rules) = cached {
            return rules;
        }

        let parent = match dir.parent() {
            Some(parent) if dir != self.abs_root => self.rules_for(parent),
            _ => self.base.clone(),
        };
        let rules = parent.with_layers(self.ignore.dir_layers(dir));
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(dir.to_path_buf(), rules.clone());
        rules
    }

    fn keep(&self, dent: &DirEntry) -> bool {
        let is_dir = dent.file_type().is_some_and(|ft| ft.is_dir());
        let relative = dent.path().strip_prefix(&self.root).unwrap_or(dent.path());
        let abs = self.abs_root.join(relative);

        if let Some(dir) = abs.parent() {
            if self.rules_for(dir).is_excluded(&abs, is_dir) {
                debug!("ignoring {}", dent.path().display());
                return false;
            }
        }

        if let (Some(max), false) = (self.max_filesize, is_dir) {
            match dent.metadata() {
                Ok(md) if md.len() > max => {
                    debug!("skipping {} ({} bytes > {max})", dent.path().display(), md.len());
                    return false;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("{}", SeekrError::Walk(e));
                    return false;
                }
            }
        }
        true
    }
}

/// Lazy, non-restartable sequence of files to search.
pub struct Walker {
    roots: VecDeque<PathBuf>,
    implicit_root: bool,
    cwd: PathBuf,
    options: WalkOptions,
    current: Option<Walk>,
}

impl Walker {
    /// An empty `roots` walks the current directory and prints paths relative
    /// to it.
    pub fn new(roots: Vec<PathBuf>, options: WalkOptions) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let implicit_root = roots.is_empty();
        let roots = if implicit_root {
            VecDeque::from([PathBuf::from(".")])
        } else {
            VecDeque::from(roots)
        };
        Self {
            roots,
            implicit_root,
            cwd,
            options,
            current: None,
        }
    }

    fn start(&mut self, root: PathBuf) -> Option<WalkEntry> {
        if root.as_os_str() == STDIN_PATH {
            return Some(WalkEntry::new(root, 0, EntryKind::Stdin));
        }

        let md = match fs::metadata(&root) {
            Ok(md) => md,
            Err(e) => {
                warn!("{}", SeekrError::file(&root, e));
                return None;
            }
        };
        if !md.is_dir() {
            return Some(WalkEntry::new(root, 0, EntryKind::File));
        }
        if self.options.max_depth == Some(0) {
            return None;
        }

        let abs_root = fs::canonicalize(&root).unwrap_or_else(|_| self.cwd.join(&root));
        let rules = DirRules {
            root: root.clone(),
            base: self.options.ignore.rules_for_root(&self.options.rules, &abs_root),
            abs_root,
            ignore: self.options.ignore.clone(),
            max_filesize: self.options.max_filesize,
            cache: Mutex::new(HashMap::new()),
        };

        let mut builder = WalkBuilder::new(&root);
        builder
            .standard_filters(false)
            .hidden(!self.options.hidden)
            .follow_links(self.options.follow_links)
            .max_depth(self.options.max_depth)
            .types(self.options.types.types().clone())
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |dent| rules.keep(dent));
        self.current = Some(builder.build());
        None
    }

    fn entry(&self, dent: DirEntry) -> Option<WalkEntry> {
        let file_type = dent.file_type()?;
        if !file_type.is_file() {
            if file_type.is_symlink() {
                debug!("skipping symbolic link: {}", dent.path().display());
            }
            return None;
        }
        let kind = if dent.path_is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::File
        };
        let depth = dent.depth();
        let path = dent.into_path();
        let path = if self.implicit_root {
            path.strip_prefix(".").map(Path::to_path_buf).unwrap_or(path)
        } else {
            path
        };
        Some(WalkEntry::new(path, depth, kind))
    }
}

impl Iterator for Walker {
    type Item = WalkEntry;

    fn next(&mut self) -> Option<WalkEntry> {
        loop {
            match self.current.as_mut().map(Iterator::next) {
                Some(Some(Ok(dent))) => {
                    if let Some(entry) = self.entry(dent) {
                        return Some(entry);
                    }
                }
                Some(Some(Err(e))) => warn!("{}", SeekrError::Walk(e)),
                Some(None) => self.current = None,
                None => {
                    let root = self.roots.pop_front()?;
                    if let Some(entry) = self.start(root) {
                        return Some(entry);
                    }
                }
            }
        }
    }
}
