use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use super::PathMatcher;

/// Gitignore-style matcher over an ordered list of pattern lines.
///
/// Each line becomes a rule backed by one or two globs in a single
/// [`GlobSet`]. A path matches when the last rule it hits is not negated.
pub struct GitignoreMatcher {
    set: GlobSet,
    /// Rule index for each glob in `set`.
    rule_of_glob: Vec<usize>,
    negated: Vec<bool>,
}

impl GitignoreMatcher {
    pub fn new<I, S>(lines: I) -> Result<Self, globset::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut rule_of_glob = Vec::new();
        let mut negated = Vec::new();

        for line in lines {
            let Some(rule) = Rule::parse(line.as_ref()) else {
                continue;
            };
            let index = negated.len();
            for glob in &rule.globs {
                builder.add(GlobBuilder::new(glob).literal_separator(true).build()?);
                rule_of_glob.push(index);
            }
            negated.push(rule.negated);
        }

        Ok(Self {
            set: builder.build()?,
            rule_of_glob,
            negated,
        })
    }

    pub fn rule_count(&self) -> usize {
        self.negated.len()
    }
}

impl PathMatcher for GitignoreMatcher {
    fn matches(&self, path: &str) -> bool {
        self.set
            .matches(path)
            .into_iter()
            .map(|glob| self.rule_of_glob[glob])
            .max()
            .is_some_and(|rule| !self.negated[rule])
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Rule {
    globs: Vec<String>,
    negated: bool,
}

impl Rule {
    /// Translate one gitignore line. Blank lines and comments yield no rule.
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };

        let dir_only = body.ends_with('/');
        let body = body.trim_end_matches('/');
        // A slash anywhere but the end anchors the pattern at the root.
        let anchored = body.contains('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            return None;
        }

        let body = escape_braces(body);
        let base = if anchored || body.starts_with("**") {
            body
        } else {
            format!("**/{body}")
        };
        let contents = if base == "**" || base.ends_with("/**") {
            None
        } else {
            Some(format!("{base}/**"))
        };

        let globs = match (dir_only, contents) {
            (true, Some(contents)) => vec![contents],
            (false, Some(contents)) => vec![base, contents],
            // `**/` still needs a directory above the path.
            (true, None) if base == "**" => vec!["*/**".to_string()],
            (_, None) => vec![base],
        };
        Some(Self { globs, negated })
    }
}

/// Gitignore has no `{a,b}` alternation, so braces outside a character class
/// are matched literally.
fn escape_braces(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut class_start: Option<usize> = None;
    for (i, c) in body.char_indices() {
        match (c, class_start) {
            ('[', None) => class_start = Some(i),
            (']', Some(start)) => {
                let opened = &body[start + 1..i];
                if !(opened.is_empty() || opened == "!") {
                    class_start = None;
                }
            }
            ('{' | '}', None) => {
                out.push('[');
                out.push(c);
                out.push(']');
                continue;
            }
            _ => {}
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(lines: &[&str]) -> GitignoreMatcher {
        GitignoreMatcher::new(lines).unwrap()
    }

    #[test]
    fn rule_translation() {
        assert_eq!(
            Rule::parse("*.md").unwrap().globs,
            vec!["**/*.md", "**/*.md/**"]
        );
        assert_eq!(Rule::parse("/build").unwrap().globs, vec!["build", "build/**"]);
        assert_eq!(Rule::parse("docs/").unwrap().globs, vec!["**/docs/**"]);
        assert_eq!(Rule::parse("src/**").unwrap().globs, vec!["src/**"]);
        assert!(Rule::parse("!keep.txt").unwrap().negated);
        assert_eq!(Rule::parse("# comment"), None);
        assert_eq!(Rule::parse("   "), None);
        assert_eq!(Rule::parse("/"), None);
        assert_eq!(Rule::parse("**/").unwrap().globs, vec!["*/**"]);
        assert_eq!(
            Rule::parse("src/{a,b}.rs").unwrap().globs,
            vec!["src/[{]a,b[}].rs", "src/[{]a,b[}].rs/**"]
        );
    }

    #[test]
    fn any_directory_pattern_skips_root_files() {
        let m = matcher(&["**/"]);
        assert!(!m.matches("x"));
        assert!(m.matches("a/x"));
        assert!(m.matches("a/b/x"));
    }

    #[test]
    fn braces_are_literal() {
        let m = matcher(&["src/{a,b}.rs"]);
        assert!(m.matches("src/{a,b}.rs"));
        assert!(!m.matches("src/a.rs"));
        assert!(!m.matches("src/b.rs"));
    }

    #[test]
    fn braces_inside_a_class_stay_in_the_class() {
        assert_eq!(escape_braces("x[{]y"), "x[{]y");
        assert_eq!(escape_braces("[]{]z{"), "[]{]z[{]");
        assert_eq!(escape_braces("a}"), "a[}]");
    }

    #[test]
    fn double_star_crosses_segments() {
        let m = matcher(&["src/**/*.ts"]);
        assert!(m.matches("src/app/main.ts"));
        assert!(m.matches("src/a/b/c/deep.ts"));
        assert!(m.matches("src/main.ts"));
        assert!(!m.matches("lib/app/main.ts"));
        assert!(!m.matches("src/app/main.tsx"));
    }

    #[test]
    fn single_star_stays_in_segment() {
        let m = matcher(&["src/*.rs"]);
        assert!(m.matches("src/lib.rs"));
        assert!(!m.matches("src/store/mod.rs"));
    }

    #[test]
    fn slashless_pattern_matches_basename_at_any_depth() {
        let m = matcher(&["*.lock"]);
        assert!(m.matches("Cargo.lock"));
        assert!(m.matches("crates/x/Cargo.lock"));
        assert!(!m.matches("Cargo.lockfile"));
    }

    #[test]
    fn leading_slash_anchors() {
        let m = matcher(&["/build"]);
        assert!(m.matches("build"));
        assert!(m.matches("build/out.o"));
        assert!(!m.matches("sub/build/out.o"));
    }

    #[test]
    fn plain_name_covers_directory_contents() {
        let m = matcher(&["vendor"]);
        assert!(m.matches("vendor"));
        assert!(m.matches("vendor/lib/a.c"));
        assert!(m.matches("third_party/vendor/a.c"));
        assert!(!m.matches("vendored/a.c"));
    }

    #[test]
    fn trailing_slash_matches_only_beneath_directory() {
        let m = matcher(&["docs/"]);
        assert!(m.matches("docs/readme.md"));
        assert!(m.matches("site/docs/index.html"));
        assert!(!m.matches("docs"));
    }

    #[test]
    fn last_matching_rule_wins() {
        let m = matcher(&["src/**", "!src/generated/**"]);
        assert!(m.matches("src/main.rs"));
        assert!(!m.matches("src/generated/schema.rs"));

        let reincluded = matcher(&["src/**", "!src/generated/**", "src/generated/keep.rs"]);
        assert!(reincluded.matches("src/generated/keep.rs"));
    }

    #[test]
    fn lone_negation_matches_nothing() {
        let m = matcher(&["!src/**"]);
        assert!(!m.matches("src/main.rs"));
        assert_eq!(m.rule_count(), 1);
    }

    #[test]
    fn case_sensitive() {
        let m = matcher(&["README.md"]);
        assert!(m.matches("README.md"));
        assert!(!m.matches("readme.md"));
    }

    #[test]
    fn invalid_glob_is_an_error() {
        assert!(GitignoreMatcher::new(["src/[unclosed"]).is_err());
    }
}
