//! Pattern compilation and per-line matching.
use crate::error::Result;
use aho_corasick::{AhoCorasick, MatchKind};
use log::debug;
use regex::bytes::{Regex, RegexBuilder};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    #[default]
    Sensitive,
    Insensitive,
    /// Insensitive unless a pattern contains an uppercase literal.
    Smart,
}

#[derive(Debug, Clone, Default)]
pub struct MatcherOptions {
    pub fixed_strings: bool,
    pub case: CaseMode,
    pub word: bool,
    pub line: bool,
    pub size_limit: Option<usize>,
    pub dfa_size_limit: Option<usize>,
}

/// Byte range of a match within a line, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone)]
enum Engine {
    Regex(Regex),
    Literals(AhoCorasick),
}

/// Compiled pattern set, shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct Matcher {
    engine: Engine,
}

impl Matcher {
    /// Multiple patterns match as an alternation. An empty pattern list
    /// never matches.
    pub fn new(patterns: &[String], options: &MatcherOptions) -> Result<Self> {
        let case_insensitive = match options.case {
            CaseMode::Sensitive => false,
            CaseMode::Insensitive => true,
            CaseMode::Smart => !patterns
                .iter()
                .any(|p| has_uppercase_literal(p, options.fixed_strings)),
        };

        let literal_ok = options.fixed_strings
            && !options.word
            && !options.line
            && (!case_insensitive || patterns.iter().all(|p| p.is_ascii()));
        if literal_ok || patterns.is_empty() {
            debug!("using literal matcher for {} pattern(s)", patterns.len());
            let automaton = AhoCorasick::builder()
                .match_kind(MatchKind::LeftmostFirst)
                .ascii_case_insensitive(case_insensitive)
                .build(patterns)?;
            return Ok(Self {
                engine: Engine::Literals(automaton),
            });
        }

        let alternation = patterns
            .iter()
            .map(|p| {
                if options.fixed_strings {
                    format!("(?:{})", regex::escape(p))
                } else {
                    format!("(?:{p})")
                }
            })
            .collect::<Vec<_>>()
            .join("|");
        let expr = if options.line {
            format!("^(?:{alternation})$")
        } else if options.word {
            format!(r"\b(?:{alternation})\b")
        } else {
            alternation
        };
        debug!("compiled expression: {expr}");

        let mut builder = RegexBuilder::new(&expr);
        builder.case_insensitive(case_insensitive).multi_line(true);
        if let Some(limit) = options.size_limit {
            builder.size_limit(limit);
        }
        if let Some(limit) = options.dfa_size_limit {
            builder.dfa_size_limit(limit);
        }
        Ok(Self {
            engine: Engine::Regex(builder.build()?),
        })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.engine, Engine::Literals(_))
    }

    /// Whether anything in `haystack` matches. Works on whole buffers as well
    /// as single lines.
    pub fn is_match(&self, haystack: &[u8]) -> bool {
        match &self.engine {
            Engine::Regex(re) => re.is_match(haystack),
            Engine::Literals(ac) => ac.is_match(haystack),
        }
    }

    /// Non-overlapping matches in `line`, leftmost first.
    pub fn find_spans(&self, line: &[u8]) -> Vec<Span> {
        match &self.engine {
            Engine::Regex(re) => re
                .find_iter(line)
                .map(|m| Span::new(m.start(), m.end()))
                .collect(),
            Engine::Literals(ac) => ac
                .find_iter(line)
                .map(|m| Span::new(m.start(), m.end()))
                .collect(),
        }
    }

    /// Rewrites every match in `line`. Regex patterns expand `$N`, `$name`
    /// and `${name}` in `replacement`; literal patterns insert it verbatim.
    /// Returns the new line and the spans of the inserted text.
    pub fn replace(&self, line: &[u8], replacement: &[u8]) -> (Vec<u8>, Vec<Span>) {
        let mut out = Vec::with_capacity(line.len());
        let mut spans = Vec::new();
        let mut last = 0;
        match &self.engine {
            Engine::Regex(re) => {
                for caps in re.captures_iter(line) {
                    if let Some(m) = caps.get(0) {
                        out.extend_from_slice(&line[last..m.start()]);
                        let start = out.len();
                        caps.expand(replacement, &mut out);
                        spans.push(Span::new(start, out.len()));
                        last = m.end();
                    }
                }
            }
            Engine::Literals(ac) => {
                for m in ac.find_iter(line) {
                    out.extend_from_slice(&line[last..m.start()]);
                    let start = out.len();
                    out.extend_from_slice(replacement);
                    spans.push(Span::new(start, out.len()));
                    last = m.end();
                }
            }
        }
        out.extend_from_slice(&line[last..]);
        (out, spans)
    }
}

/// Uppercase characters that follow a backslash are escapes (`\S`, `\W`),
/// not literals, and so are Unicode class names (`\pL`, `\p{Greek}`).
fn has_uppercase_literal(pattern: &str, fixed: bool) -> bool {
    if fixed {
        return pattern.chars().any(char::is_uppercase);
    }
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some('p' | 'P') = chars.next() {
                if chars.clone().next() == Some('{') {
                    chars.by_ref().find(|&c| c == '}');
                } else {
                    chars.next();
                }
            }
        } else if c.is_uppercase() {
            return true;
        }
    }
    false
}
