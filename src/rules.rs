//! Layered gitignore-style exclusion rules.
//!
//! Every ignore source (global gitignore, `--ignore-file`, ignore files in
//! parent directories, ignore files found while walking, command-line globs)
//! becomes an [`IgnoreLayer`]. An [`IgnoreRuleSet`] keeps its layers ordered
//! from least to most specific and answers a path query by visiting them in
//! reverse: the first layer with an opinion decides.
use crate::error::{Result, SeekrError};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::overrides::{Override, OverrideBuilder};
use ignore::Match;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-directory ignore files, lowest precedence first.
pub const LOCAL_IGNORE_FILES: [&str; 3] = [".gitignore", ".ignore", ".seekrignore"];

/// Matcher root. Paths are made relative to the layer base before they reach
/// the `ignore` matchers, which then strip nothing further.
const MATCHER_ROOT: &str = ".";

/// Where a layer of rules came from. The derived ordering is the precedence
/// order: a later variant beats an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleSource {
    Global,
    Explicit,
    Parent,
    Local,
    CommandLine,
}

/// Outcome of evaluating a path against rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMatch {
    Ignore,
    Whitelist,
    None,
}

impl RuleMatch {
    pub fn is_ignore(self) -> bool {
        self == RuleMatch::Ignore
    }

    pub fn is_none(self) -> bool {
        self == RuleMatch::None
    }
}

impl<T> From<Match<T>> for RuleMatch {
    fn from(m: Match<T>) -> Self {
        match m {
            Match::None => RuleMatch::None,
            Match::Ignore(_) => RuleMatch::Ignore,
            Match::Whitelist(_) => RuleMatch::Whitelist,
        }
    }
}

#[derive(Debug, Clone)]
enum LayerMatcher {
    /// Ignore-file syntax: `!` whitelists.
    Gitignore(Gitignore),
    /// `--glob` syntax: a plain glob whitelists, `!` excludes, and files that
    /// miss every whitelist glob are excluded.
    Override(Override),
}

/// The rules of one ignore source, scoped to the directory `base`.
#[derive(Debug, Clone)]
pub struct IgnoreLayer {
    source: RuleSource,
    base: PathBuf,
    origin: Option<PathBuf>,
    matcher: LayerMatcher,
}

impl IgnoreLayer {
    /// Parses ignore-file text. Lines that fail to parse are skipped and
    /// returned as warnings.
    pub fn parse(
        source: RuleSource,
        base: impl Into<PathBuf>,
        origin: Option<PathBuf>,
        text: &str,
    ) -> (Self, Vec<SeekrError>) {
        let mut builder = GitignoreBuilder::new(MATCHER_ROOT);
        let mut warnings = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if let Err(e) = builder.add_line(origin.clone(), line) {
                warnings.push(SeekrError::PatternFile {
                    path: origin.clone().unwrap_or_else(|| PathBuf::from("<inline>")),
                    line: idx + 1,
                    message: e.to_string(),
                });
            }
        }
        let gitignore = builder.build().unwrap_or_else(|e| {
            warnings.push(SeekrError::InvalidGlob(e));
            Gitignore::empty()
        });
        let layer = Self {
            source,
            base: base.into(),
            origin,
            matcher: LayerMatcher::Gitignore(gitignore),
        };
        (layer, warnings)
    }

    /// Builds the command-line layer from `(glob, case_insensitive)` pairs.
    /// Unlike ignore files, one bad glob rejects the whole set.
    pub fn overrides(base: impl Into<PathBuf>, globs: &[(String, bool)]) -> Result<Self> {
        let mut builder = OverrideBuilder::new(MATCHER_ROOT);
        for (glob, case_insensitive) in globs {
            builder
                .case_insensitive(*case_insensitive)
                .map_err(SeekrError::InvalidGlob)?;
            builder.add(glob).map_err(SeekrError::InvalidGlob)?;
        }
        let overrides = builder.build().map_err(SeekrError::InvalidGlob)?;
        Ok(Self {
            source: RuleSource::CommandLine,
            base: base.into(),
            origin: None,
            matcher: LayerMatcher::Override(overrides),
        })
    }

    /// Reads an ignore file. A missing file is silently skipped, any other
    /// failure is reported as a warning.
    pub fn load(source: RuleSource, base: &Path, file: &Path) -> Option<Self> {
        let text = match fs::read_to_string(file) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("{}", SeekrError::file(file, e));
                return None;
            }
        };
        let (layer, warnings) = IgnoreLayer::parse(source, base, Some(file.to_path_buf()), &text);
        for warning in warnings {
            warn!("{warning}");
        }
        debug!(
            "loaded {} rule(s) from {} ({:?})",
            layer.len(),
            file.display(),
            source
        );
        Some(layer)
    }

    pub fn len(&self) -> usize {
        match &self.matcher {
            LayerMatcher::Gitignore(gi) => gi.len(),
            LayerMatcher::Override(ov) => to_usize(ov.num_ignores() + ov.num_whitelists()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.matcher {
            LayerMatcher::Gitignore(gi) => gi.is_empty(),
            LayerMatcher::Override(ov) => ov.is_empty(),
        }
    }

    pub fn source(&self) -> RuleSource {
        self.source
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn specificity(&self) -> (RuleSource, usize) {
        (self.source, self.base.components().count())
    }

    /// Last matching rule wins. A path outside `base` is matched whole, so
    /// only unanchored rules can apply to it.
    pub fn matched(&self, path: &Path, is_dir: bool) -> RuleMatch {
        let candidate = path.strip_prefix(&self.base).unwrap_or(path);
        match &self.matcher {
            LayerMatcher::Gitignore(gi) => {
                let m = gi.matched(candidate, is_dir);
                if let Some(glob) = m.inner() {
                    debug!(
                        "{}: rule '{}' from {} matched",
                        path.display(),
                        glob.original(),
                        glob.from().unwrap_or(Path::new("<inline>")).display()
                    );
                }
                m.into()
            }
            LayerMatcher::Override(ov) => {
                let m = ov.matched(candidate, is_dir);
                if !m.is_none() {
                    debug!("{}: command-line glob {:?}", path.display(), m);
                }
                m.into()
            }
        }
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// An immutable, cheaply clonable stack of layers. Directories derive a
/// child set that shares its parent's layers.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRuleSet {
    layers: Vec<Arc<IgnoreLayer>>,
}

impl IgnoreRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a layer after every layer that is at most as specific, so
    /// layers of equal specificity keep their load order.
    pub fn push(&mut self, layer: IgnoreLayer) {
        if layer.is_empty() {
            return;
        }
        let key = layer.specificity();
        let at = self.layers.partition_point(|l| l.specificity() <= key);
        self.layers.insert(at, Arc::new(layer));
    }

    pub fn with_layers(&self, layers: impl IntoIterator<Item = IgnoreLayer>) -> Self {
        let mut child = self.clone();
        for layer in layers {
            child.push(layer);
        }
        child
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Evaluates layers most specific first; the first decisive layer wins.
    pub fn matched(&self, path: &Path, is_dir: bool) -> RuleMatch {
        self.layers
            .iter()
            .rev()
            .map(|layer| layer.matched(path, is_dir))
            .find(|m| !m.is_none())
            .unwrap_or(RuleMatch::None)
    }

    pub fn is_excluded(&self, path: &Path, is_dir: bool) -> bool {
        self.matched(path, is_dir).is_ignore()
    }
}

/// Ignore switches resolved from the command line and config file.
#[derive(Debug, Clone, Default)]
pub struct IgnoreOptions {
    pub no_ignore: bool,
    pub no_ignore_parent: bool,
    pub no_ignore_vcs: bool,
    pub ignore_files: Vec<PathBuf>,
    /// `(glob, case_insensitive)` in command-line order.
    pub globs: Vec<(String, bool)>,
}

impl IgnoreOptions {
    fn vcs_enabled(&self) -> bool {
        !self.no_ignore && !self.no_ignore_vcs
    }

    /// Rules that apply everywhere: global gitignore, `--ignore-file` and
    /// command-line globs. Paths are resolved against `cwd`.
    pub fn base_rules(&self, cwd: &Path) -> Result<IgnoreRuleSet> {
        let mut set = IgnoreRuleSet::new();

        if self.vcs_enabled() {
            if let Some(global) = ignore::gitignore::gitconfig_excludes_path() {
                if let Some(layer) = IgnoreLayer::load(RuleSource::Global, cwd, &global) {
                    set.push(layer);
                }
            }
        }

        if !self.no_ignore {
            for file in &self.ignore_files {
                let file = cwd.join(file);
                match IgnoreLayer::load(RuleSource::Explicit, cwd, &file) {
                    Some(layer) => set.push(layer),
                    None if !file.exists() => {
                        warn!("{}: ignore file not found", file.display())
                    }
                    None => {}
                }
            }
        }

        if !self.globs.is_empty() {
            set.push(IgnoreLayer::overrides(cwd, &self.globs)?);
        }

        Ok(set)
    }

    /// Adds the ignore files of every ancestor of `root` (shallowest first).
    pub fn rules_for_root(&self, base: &IgnoreRuleSet, root: &Path) -> IgnoreRuleSet {
        if self.no_ignore || self.no_ignore_parent {
            return base.clone();
        }
        let mut ancestors: Vec<&Path> = root.ancestors().skip(1).collect();
        ancestors.reverse();
        let layers = ancestors
            .into_iter()
            .flat_map(|dir| self.load_dir(RuleSource::Parent, dir));
        base.with_layers(layers)
    }

    /// Ignore layers defined inside `dir` itself.
    pub fn dir_layers(&self, dir: &Path) -> Vec<IgnoreLayer> {
        if self.no_ignore {
            return Vec::new();
        }
        self.load_dir(RuleSource::Local, dir)
    }

    fn load_dir(&self, source: RuleSource, dir: &Path) -> Vec<IgnoreLayer> {
        let mut layers = Vec::new();
        let vcs = self.vcs_enabled();
        if vcs {
            let exclude = dir.join(".git").join("info").join("exclude");
            layers.extend(IgnoreLayer::load(source, dir, &exclude));
        }
        for name in LOCAL_IGNORE_FILES {
            if name == ".gitignore" && !vcs {
                continue;
            }
            layers.extend(IgnoreLayer::load(source, dir, &dir.join(name)));
        }
        layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn layer(source: RuleSource, base: &str, text: &str) -> IgnoreLayer {
        let (layer, warnings) = IgnoreLayer::parse(source, base, None, text);
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        layer
    }

    fn globs(list: &[(&str, bool)]) -> Vec<(String, bool)> {
        list.iter().map(|(g, ci)| (g.to_string(), *ci)).collect()
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let l = layer(RuleSource::Local, "/r", "\n   \n# comment\n");
        assert!(l.is_empty());

        let l = layer(RuleSource::Local, "/r", "\\#literal\n\\!bang\n");
        assert_eq!(l.len(), 2);
        assert!(l.matched(Path::new("/r/#literal"), false).is_ignore());
        assert!(l.matched(Path::new("/r/!bang"), false).is_ignore());
        assert!(l.matched(Path::new("/r/literal"), false).is_none());
    }

    #[test]
    fn test_negation_and_last_rule_wins() {
        let l = layer(RuleSource::Local, "/r", "*.log\n!keep.log\n");
        assert_eq!(l.matched(Path::new("/r/a.log"), false), RuleMatch::Ignore);
        assert_eq!(l.matched(Path::new("/r/keep.log"), false), RuleMatch::Whitelist);
        assert_eq!(l.matched(Path::new("/r/a.txt"), false), RuleMatch::None);

        let l = layer(RuleSource::Local, "/r", "!keep.log\n*.log\n");
        assert_eq!(l.matched(Path::new("/r/keep.log"), false), RuleMatch::Ignore);
    }

    #[test]
    fn test_directory_only_rules() {
        let l = layer(RuleSource::Local, "/r", "build/\n");
        assert!(l.matched(Path::new("/r/build"), true).is_ignore());
        assert!(l.matched(Path::new("/r/build"), false).is_none());
        assert!(l.matched(Path::new("/r/sub/build"), true).is_ignore());
    }

    #[test]
    fn test_anchored_rules_match_relative_to_base() {
        let l = layer(RuleSource::Local, "/r", "/top.txt\ndocs/*.md\n");
        assert!(l.matched(Path::new("/r/top.txt"), false).is_ignore());
        assert!(l.matched(Path::new("/r/sub/top.txt"), false).is_none());
        assert!(l.matched(Path::new("/r/docs/a.md"), false).is_ignore());
        assert!(l.matched(Path::new("/r/docs/deep/a.md"), false).is_none());
        assert!(l.matched(Path::new("/elsewhere/top.txt"), false).is_none());
    }

    #[test]
    fn test_base_is_compared_by_component() {
        let l = layer(RuleSource::Local, "/r", "/x/*.log\n");
        assert!(l.matched(Path::new("/r/x/a.log"), false).is_ignore());
        assert!(l.matched(Path::new("/rx/a.log"), false).is_none());
    }

    #[test]
    fn test_double_star_matches_any_depth() {
        let l = layer(RuleSource::Local, "/r", "**/gen/*.rs\n");
        assert!(l.matched(Path::new("/r/gen/a.rs"), false).is_ignore());
        assert!(l.matched(Path::new("/r/x/y/gen/a.rs"), false).is_ignore());
        assert!(l.matched(Path::new("/r/x/gen/sub/a.rs"), false).is_none());

        let l = layer(RuleSource::Local, "/r", "***.log\n");
        assert!(l.matched(Path::new("/r/a.log"), false).is_ignore());
        assert!(l.matched(Path::new("/r/deep/b.log"), false).is_ignore());
    }

    #[test]
    fn test_alternation_and_negated_classes() {
        let l = layer(RuleSource::Local, "/r", "*.{c,h}\n[^a]*.rs\n");
        assert!(l.matched(Path::new("/r/a.c"), false).is_ignore());
        assert!(l.matched(Path::new("/r/a.h"), false).is_ignore());
        assert!(l.matched(Path::new("/r/a.cc"), false).is_none());
        assert!(l.matched(Path::new("/r/b.rs"), false).is_ignore());
        assert!(l.matched(Path::new("/r/a.rs"), false).is_none());

        let l = layer(RuleSource::Local, "/r", "[!a]*.md\n");
        assert!(l.matched(Path::new("/r/b.md"), false).is_ignore());
        assert!(l.matched(Path::new("/r/a.md"), false).is_none());
    }

    #[test]
    fn test_backslash_escapes() {
        let l = layer(RuleSource::Local, "/r", "\\*.txt\nfoo\\ \n");
        assert!(l.matched(Path::new("/r/*.txt"), false).is_ignore());
        assert!(l.matched(Path::new("/r/a.txt"), false).is_none());
        assert!(l.matched(Path::new("/r/foo "), false).is_ignore());
        assert!(l.matched(Path::new("/r/foo"), false).is_none());
    }

    #[test]
    fn test_malformed_line_is_skipped_with_warning() {
        let (l, warnings) = IgnoreLayer::parse(
            RuleSource::Local,
            "/r",
            Some(PathBuf::from("/r/.gitignore")),
            "*.log\n*.{tmp\n*.tmp\n",
        );
        assert_eq!(l.len(), 2);
        assert_eq!(warnings.len(), 1);
        match &warnings[0] {
            SeekrError::PatternFile { line, .. } => assert_eq!(*line, 2),
            other => panic!("expected PatternFile warning, got {other:?}"),
        }
        assert!(l.matched(Path::new("/r/x.tmp"), false).is_ignore());
    }

    #[test]
    fn test_more_specific_layer_wins_regardless_of_polarity() {
        let mut set = IgnoreRuleSet::new();
        set.push(layer(RuleSource::Local, "/r/sub", "!*.log\n"));
        set.push(layer(RuleSource::Local, "/r", "*.log\n"));
        set.push(layer(RuleSource::Global, "/", "*.txt\n"));

        assert!(!set.is_excluded(Path::new("/r/sub/a.log"), false));
        assert!(set.is_excluded(Path::new("/r/a.log"), false));
        assert!(set.is_excluded(Path::new("/r/sub/a.txt"), false));

        let mut set = IgnoreRuleSet::new();
        set.push(layer(RuleSource::Local, "/r", "!notes.txt\n"));
        set.push(layer(RuleSource::Global, "/", "*.txt\n"));
        assert!(!set.is_excluded(Path::new("/r/notes.txt"), false));
        assert!(set.is_excluded(Path::new("/r/other.txt"), false));
    }

    #[test]
    fn test_command_line_globs_whitelist_and_exclude() {
        let overrides = IgnoreLayer::overrides("/r", &globs(&[("*.rs", false), ("!skip.rs", false)])).unwrap();
        let mut set = IgnoreRuleSet::new();
        set.push(layer(RuleSource::Local, "/r", "*.rs\n"));
        set.push(overrides);

        assert_eq!(set.matched(Path::new("/r/main.rs"), false), RuleMatch::Whitelist);
        assert!(set.is_excluded(Path::new("/r/skip.rs"), false));
        assert!(set.is_excluded(Path::new("/r/readme.md"), false));
        assert!(!set.is_excluded(Path::new("/r/src"), true));
    }

    #[test]
    fn test_command_line_glob_alternation() {
        let keep = IgnoreLayer::overrides("/r", &globs(&[("*.{rs,toml}", false)])).unwrap();
        assert_eq!(keep.matched(Path::new("/r/a.rs"), false), RuleMatch::Whitelist);
        assert_eq!(keep.matched(Path::new("/r/b.toml"), false), RuleMatch::Whitelist);
        assert_eq!(keep.matched(Path::new("/r/c.md"), false), RuleMatch::Ignore);

        let drop = IgnoreLayer::overrides("/r", &globs(&[("!*.{rs,toml}", false)])).unwrap();
        assert_eq!(drop.matched(Path::new("/r/a.rs"), false), RuleMatch::Ignore);
        assert_eq!(drop.matched(Path::new("/r/c.md"), false), RuleMatch::None);
    }

    #[test]
    fn test_iglob_is_case_insensitive() {
        let overrides =
            IgnoreLayer::overrides("/r", &globs(&[("*.MD", true), ("*.TXT", false)])).unwrap();
        assert_eq!(overrides.matched(Path::new("/r/a.md"), false), RuleMatch::Whitelist);
        assert_eq!(overrides.matched(Path::new("/r/a.txt"), false), RuleMatch::Ignore);
    }

    #[test]
    fn test_invalid_override_is_fatal() {
        let err = IgnoreLayer::overrides("/r", &globs(&[("[oops", false)])).unwrap_err();
        assert!(matches!(err, SeekrError::InvalidGlob(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_no_ignore_vcs_keeps_dot_ignore_and_explicit_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(".gitignore"), "*.a\n").unwrap();
        fs::write(root.join(".ignore"), "*.b\n").unwrap();
        fs::write(root.join("extra"), "*.c\n").unwrap();

        let options = IgnoreOptions {
            no_ignore_vcs: true,
            ignore_files: vec![PathBuf::from("extra")],
            ..Default::default()
        };
        let set = options
            .base_rules(root)
            .unwrap()
            .with_layers(options.dir_layers(root));
        assert!(!set.is_excluded(&root.join("x.a"), false));
        assert!(set.is_excluded(&root.join("x.b"), false));
        assert!(set.is_excluded(&root.join("x.c"), false));

        let options = IgnoreOptions {
            no_ignore: true,
            ignore_files: vec![PathBuf::from("extra")],
            ..Default::default()
        };
        let set = options
            .base_rules(root)
            .unwrap()
            .with_layers(options.dir_layers(root));
        assert!(set.is_empty());
    }

    #[test]
    fn test_git_info_exclude_has_lowest_local_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git/info")).unwrap();
        fs::write(root.join(".git/info/exclude"), "*.log\n").unwrap();
        fs::write(root.join(".gitignore"), "!keep.log\n").unwrap();

        let options = IgnoreOptions::default();
        let set = IgnoreRuleSet::new().with_layers(options.dir_layers(root));
        assert!(set.is_excluded(&root.join("a.log"), false));
        assert!(!set.is_excluded(&root.join("keep.log"), false));
    }

    #[test]
    fn test_parent_directory_rules() {
        let dir = tempdir().unwrap();
        let parent = dir.path();
        let root = parent.join("project");
        fs::create_dir_all(&root).unwrap();
        fs::write(parent.join(".ignore"), "*.gen\n").unwrap();

        let options = IgnoreOptions::default();
        let set = options.rules_for_root(&IgnoreRuleSet::new(), &root);
        assert!(set.is_excluded(&root.join("a.gen"), false));

        let options = IgnoreOptions {
            no_ignore_parent: true,
            ..Default::default()
        };
        let set = options.rules_for_root(&IgnoreRuleSet::new(), &root);
        assert!(!set.is_excluded(&root.join("a.gen"), false));
    }
}
