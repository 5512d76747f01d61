use crate::IgnoreError;
use globset::{Glob, GlobMatcher};

/// A single compiled line from a `.gitignore`/`.memoryignore` file.
pub(crate) struct IgnorePattern {
    pub(crate) negated: bool,
    dir_only: bool,
    matcher: GlobMatcher,
}

impl IgnorePattern {
    pub(crate) fn compile(line: &str) -> Result<Self, IgnoreError> {
        let mut s = line.trim();

        let negated = if let Some(rest) = s.strip_prefix('!') {
            s = rest;
            true
        } else {
            false
        };

        let dir_only = s.ends_with('/') && s.len() > 1;
        if dir_only {
            s = &s[..s.len() - 1];
        }

        let anchored = s.starts_with('/') || s[..s.len().saturating_sub(1)].contains('/');
        let s = s.strip_prefix('/').unwrap_or(s);

        let glob_text = if anchored || s.is_empty() {
            s.to_string()
        } else {
            format!("**/{s}")
        };

        let matcher = Glob::new(&glob_text)
            .map_err(|e| IgnoreError::InvalidPattern(line.to_string(), e))?
            .compile_matcher();

        Ok(Self {
            negated,
            dir_only,
            matcher,
        })
    }

    /// Whether this pattern applies to `local_path` (relative to the layer's
    /// base directory, no leading slash). `is_dir` marks whether the
    /// candidate itself is a directory.
    pub(crate) fn matches(&self, local_path: &str, is_dir: bool) -> bool {
        if !self.dir_only {
            return self.matcher.is_match(local_path);
        }

        if is_dir && self.matcher.is_match(local_path) {
            return true;
        }

        // Directory-only patterns also ignore everything *underneath* a
        // matching directory, even when the caller evaluates a descendant
        // file directly instead of relying on traversal pruning.
        let components: Vec<&str> = local_path.split('/').collect();
        for end in 1..components.len() {
            let prefix = components[..end].join("/");
            if self.matcher.is_match(&prefix) {
                return true;
            }
        }
        false
    }
}
