//! Tracked-path configuration and source-to-destination path mapping.

use std::path::{Component, Path};

use serde::Serialize;

use crate::error::{Error, Result};

/// A single `source-prefix > destination-prefix` rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathRule {
    /// Prefix in the source repository.
    pub source: String,
    /// Corresponding prefix in the destination repository.
    pub destination: String,
}

impl PathRule {
    /// Parse a `source-prefix > destination-prefix` line.
    ///
    /// # Errors
    /// Returns `InvalidTrackedPath` if the separator is missing or either side
    /// is empty.
    pub fn parse(line: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidTrackedPath {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let (source, destination) = line
            .split_once('>')
            .ok_or_else(|| invalid("expected 'source > destination'"))?;

        let source = normalize_prefix(source).ok_or_else(|| invalid("empty source prefix"))?;
        let destination =
            normalize_prefix(destination).ok_or_else(|| invalid("empty destination prefix"))?;

        Ok(Self {
            source,
            destination,
        })
    }
}

/// Trim whitespace, `./` and trailing separators from a configured prefix.
fn normalize_prefix(raw: &str) -> Option<String> {
    let cleaned = raw.trim().replace('\\', "/");
    let mut prefix = cleaned.as_str();
    while let Some(rest) = prefix.strip_prefix("./") {
        prefix = rest;
    }
    let prefix = prefix.trim_matches('/');

    if prefix.is_empty() || prefix == "." {
        None
    } else {
        Some(prefix.to_string())
    }
}

/// Whether `path` equals `prefix` or lies beneath it, compared by component.
fn is_under(path: &str, prefix: &str) -> bool {
    Path::new(path).starts_with(prefix)
}

/// Ordered tracked-path rules plus per-repository ignore lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackedPathMap {
    rules: Vec<PathRule>,
    source_ignore: Vec<String>,
    destination_ignore: Vec<String>,
}

impl TrackedPathMap {
    /// Build a map from parsed rules and ignore lists.
    #[must_use]
    pub fn new(
        rules: Vec<PathRule>,
        source_ignore: &[String],
        destination_ignore: &[String],
    ) -> Self {
        Self {
            rules,
            source_ignore: source_ignore.iter().filter_map(|p| normalize_prefix(p)).collect(),
            destination_ignore: destination_ignore
                .iter()
                .filter_map(|p| normalize_prefix(p))
                .collect(),
        }
    }

    /// Parse `source > destination` lines into a map.
    ///
    /// # Errors
    /// Returns the first malformed line.
    pub fn parse<S: AsRef<str>>(
        lines: &[S],
        source_ignore: &[String],
        destination_ignore: &[String],
    ) -> Result<Self> {
        let rules = lines
            .iter()
            .map(|line| line.as_ref())
            .filter(|line| !line.trim().is_empty())
            .map(PathRule::parse)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(rules, source_ignore, destination_ignore))
    }

    /// The rules in configuration order.
    #[must_use]
    pub fn rules(&self) -> &[PathRule] {
        &self.rules
    }

    /// Ignored prefixes in the source repository.
    #[must_use]
    pub fn source_ignore(&self) -> &[String] {
        &self.source_ignore
    }

    /// Ignored prefixes in the destination repository.
    #[must_use]
    pub fn destination_ignore(&self) -> &[String] {
        &self.destination_ignore
    }

    /// Whether no rules are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Source-side pathspecs for history walks: tracked and ignored prefixes.
    #[must_use]
    pub fn source_pathspecs(&self) -> Vec<String> {
        self.rules
            .iter()
            .map(|r| r.source.clone())
            .chain(self.source_ignore.iter().cloned())
            .collect()
    }

    /// Destination-side pathspecs for history walks: tracked and ignored prefixes.
    #[must_use]
    pub fn destination_pathspecs(&self) -> Vec<String> {
        self.rules
            .iter()
            .map(|r| r.destination.clone())
            .chain(self.destination_ignore.iter().cloned())
            .collect()
    }

    /// Tracked-or-ignored predicate for source commits during indexing.
    #[must_use]
    pub fn is_source_candidate(&self, path: &str) -> bool {
        self.source_pathspecs().iter().any(|p| is_under(path, p))
    }

    /// Tracked-or-ignored predicate for destination commits during indexing.
    #[must_use]
    pub fn is_destination_candidate(&self, path: &str) -> bool {
        self.destination_pathspecs().iter().any(|p| is_under(path, p))
    }

    /// Replay filter: under a tracked source prefix and not ignored.
    #[must_use]
    pub fn is_replayable(&self, path: &str) -> bool {
        self.rules.iter().any(|r| is_under(path, &r.source))
            && !self.source_ignore.iter().any(|p| is_under(path, p))
    }

    fn is_destination_ignored(&self, path: &str) -> bool {
        self.destination_ignore.iter().any(|p| is_under(path, p))
    }

    /// Most specific rule whose source prefix contains `path`.
    ///
    /// Equal-length matches resolve to the first configured rule.
    #[must_use]
    pub fn longest_match(&self, path: &str) -> Option<&PathRule> {
        self.rules
            .iter()
            .filter(|r| is_under(path, &r.source))
            .fold(None, |best: Option<&PathRule>, rule| match best {
                Some(b) if b.source.len() >= rule.source.len() => Some(b),
                _ => Some(rule),
            })
    }
}

/// Maps source-repository paths onto the destination working tree.
///
/// A rule match is a miss unless the target path already exists in the
/// destination working tree.
#[derive(Debug, Clone, Copy)]
pub struct PathMapper<'a> {
    paths: &'a TrackedPathMap,
    destination_root: &'a Path,
}

impl<'a> PathMapper<'a> {
    /// Create a mapper over the destination working tree at `destination_root`.
    #[must_use]
    pub const fn new(paths: &'a TrackedPathMap, destination_root: &'a Path) -> Self {
        Self {
            paths,
            destination_root,
        }
    }

    /// Map a source path to its destination path, or `None` on a miss.
    #[must_use]
    pub fn map(&self, source_path: &str) -> Option<String> {
        let rule = self.paths.longest_match(source_path)?;

        let remainder = Path::new(source_path).strip_prefix(&rule.source).ok()?;
        let mut parts = Vec::new();
        for component in remainder.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                Component::CurDir | Component::RootDir => {}
                Component::ParentDir | Component::Prefix(_) => return None,
            }
        }

        let candidate = if parts.is_empty() {
            rule.destination.clone()
        } else {
            format!("{}/{}", rule.destination, parts.join("/"))
        };

        if self.paths.is_destination_ignored(&candidate) {
            return None;
        }

        self.destination_root
            .join(&candidate)
            .exists()
            .then_some(candidate)
    }
}
