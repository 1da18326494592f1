use glob::{MatchOptions, Pattern};

use super::PathMatcher;

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Shell-style matching over the whole normalized path. `*` crosses `/`, and
/// there is no negation. Runs of `*` mean the same as one `*`. Patterns `glob`
/// still refuses to compile match literally.
pub struct FnmatchMatcher {
    pattern: Option<Pattern>,
    literal: String,
}

impl FnmatchMatcher {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: Pattern::new(&collapse_stars(pattern)).ok(),
            literal: pattern.to_string(),
        }
    }
}

/// `glob` only accepts `**` as a whole path component, while shell fnmatch
/// reads any run of stars as a single `*`.
fn collapse_stars(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

impl PathMatcher for FnmatchMatcher {
    fn matches(&self, path: &str) -> bool {
        match &self.pattern {
            Some(p) => p.matches_with(path, OPTIONS),
            None => self.literal == path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_crosses_segments() {
        let m = FnmatchMatcher::new("src/*");
        assert!(m.matches("src/lib.rs"));
        assert!(m.matches("src/deep/nested/lib.rs"));
        assert!(!m.matches("tests/lib.rs"));
    }

    #[test]
    fn matches_whole_path_only() {
        let m = FnmatchMatcher::new("*.md");
        assert!(m.matches("README.md"));
        assert!(m.matches("docs/guide.md"));
        assert!(!m.matches("README.md.orig"));

        let exact = FnmatchMatcher::new("Cargo.toml");
        assert!(exact.matches("Cargo.toml"));
        assert!(!exact.matches("crates/x/Cargo.toml"));
    }

    #[test]
    fn case_sensitive() {
        let m = FnmatchMatcher::new("Makefile");
        assert!(!m.matches("makefile"));
    }

    #[test]
    fn character_classes() {
        let m = FnmatchMatcher::new("v[0-9].txt");
        assert!(m.matches("v1.txt"));
        assert!(!m.matches("vx.txt"));
    }

    #[test]
    fn star_runs_inside_a_segment_act_as_one_star() {
        let m = FnmatchMatcher::new("a**");
        assert!(m.matches("abc"));
        assert!(m.matches("a/b/c"));
        assert!(!m.matches("xa"));

        let rs = FnmatchMatcher::new("src/**.rs");
        assert!(rs.matches("src/a.rs"));
        assert!(rs.matches("src/deep/b.rs"));
        assert!(!rs.matches("lib/a.rs"));
    }

    #[test]
    fn component_double_star_still_needs_its_slashes() {
        let m = FnmatchMatcher::new("src/**/x");
        assert!(m.matches("src/a/x"));
        assert!(!m.matches("src/x"));
    }

    #[test]
    fn invalid_pattern_degrades_to_literal() {
        let m = FnmatchMatcher::new("v[oops");
        assert!(m.matches("v[oops"));
        assert!(!m.matches("vo"));
    }
}
