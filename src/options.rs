//! Option tokens and the Makefile fragments they map to.
//!
//! Every token contributes at most one fragment to one of three
//! accumulators (variable lines, build flags, link flags), in the order the
//! tokens were listed.

use crate::error::GomakerError;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

pub const STATIC_EXPORT: &str = "export CGO_ENABLED=0";
pub const COMMIT_VAR: &str = "COMMIT=$(shell git rev-parse --verify --short HEAD)";
pub const COMMIT_RELEASE_VAR: &str = "RELEASE=$(VERSION)$(COMMIT)";
pub const PLAIN_RELEASE_VAR: &str = "RELEASE=$(VERSION)";
pub const VERSION_LDFLAG: &str = "-X main.version=$(RELEASE)";
pub const STRIP_LDFLAG: &str = "-s";
pub const VERBOSE_FLAG: &str = "-x";

/// Used when no `--options` value is given at all.
pub const DEFAULT_OPTIONS: &str = "static,verbose,lite,commit";

static SUBST_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.\-/]*[A-Za-z0-9_]\.[A-Za-z_][A-Za-z0-9_]*$")
        .expect("substitution key pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOption {
    /// plain `go build`
    None,
    /// `go build -x`
    Verbose,
    /// strip debug symbols
    Lite,
    /// statically linked binary, no cgo
    Static,
    /// stamp version and commit into `main.version`
    Commit,
    Unknown(String),
}

impl From<&str> for BuildOption {
    fn from(token: &str) -> Self {
        match token {
            "none" => BuildOption::None,
            "verbose" => BuildOption::Verbose,
            "lite" => BuildOption::Lite,
            "static" => BuildOption::Static,
            "commit" => BuildOption::Commit,
            other => BuildOption::Unknown(other.to_string()),
        }
    }
}

/// Splits a comma separated option list.
///
/// An empty list, or one that names `none` anywhere, collapses to `[None]`.
pub fn parse_options(list: &str) -> Vec<BuildOption> {
    let tokens: Vec<BuildOption> = list
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(BuildOption::from)
        .collect();

    if tokens.is_empty() || tokens.contains(&BuildOption::None) {
        return vec![BuildOption::None];
    }
    tokens
}

/// A `-X importpath.name=value` link-time variable assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub key: String,
    pub value: String,
}

impl Substitution {
    pub fn parse(input: &str) -> Result<Self, GomakerError> {
        let malformed = |reason| GomakerError::Substitution {
            input: input.to_string(),
            reason,
        };

        let (key, value) = input.split_once('=').ok_or_else(|| malformed("expected key=value"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(malformed("empty key"));
        }
        if !SUBST_KEY.is_match(key) {
            return Err(malformed("key must look like importpath.name"));
        }
        let spaced = value.chars().any(char::is_whitespace);
        if spaced && value.contains('\'') {
            return Err(malformed("value cannot mix whitespace and single quotes"));
        }

        Ok(Substitution {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    /// Go's flag splitter honours single quotes, so spaced values get wrapped.
    ///
    /// The value is escaped to survive make and then the shell's double
    /// quotes around `-ldflags`, so it reaches the linker as given.
    pub fn to_ldflag(&self) -> String {
        let value = escape_recipe_value(&self.value);
        if self.value.chars().any(char::is_whitespace) {
            format!("-X '{}={}'", self.key, value)
        } else {
            format!("-X {}={}", self.key, value)
        }
    }
}

/// Accumulated fragments for the generated Makefile.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildFlags {
    pub variables: Vec<String>,
    pub build_flags: Vec<String>,
    pub link_flags: Vec<String>,
    pub commit: bool,
}

impl BuildFlags {
    pub fn from_options(options: &[BuildOption]) -> Self {
        let mut flags = BuildFlags::default();

        for option in options {
            match option {
                BuildOption::None => {}
                BuildOption::Verbose => flags.build_flags.push(VERBOSE_FLAG.to_string()),
                BuildOption::Lite => flags.link_flags.push(STRIP_LDFLAG.to_string()),
                BuildOption::Static => flags.variables.push(STATIC_EXPORT.to_string()),
                BuildOption::Commit => {
                    flags.variables.push(COMMIT_VAR.to_string());
                    flags.variables.push(COMMIT_RELEASE_VAR.to_string());
                    flags.link_flags.push(VERSION_LDFLAG.to_string());
                    flags.commit = true;
                }
                BuildOption::Unknown(name) => {
                    warn!("{} is not a real option. Skipping.", name);
                    continue;
                }
            }
            debug!(?option, "applied option");
        }

        if !flags.commit {
            flags.variables.push(PLAIN_RELEASE_VAR.to_string());
        }
        flags
    }

    /// Adds `-tags 'a,b'` for a comma or whitespace separated tag list.
    pub fn with_tags(mut self, tags: &str) -> Self {
        let tags: Vec<&str> = tags
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        if !tags.is_empty() {
            self.build_flags.push(format!("-tags '{}'", tags.join(",")));
        }
        self
    }

    pub fn with_ldflags(mut self, extra: &str) -> Self {
        let extra = extra.trim();
        if !extra.is_empty() {
            self.link_flags.push(extra.to_string());
        }
        self
    }

    pub fn with_substitutions(mut self, inputs: &[String]) -> Result<Self, GomakerError> {
        for input in inputs {
            let subst = Substitution::parse(input)?;
            self.link_flags.push(subst.to_ldflag());
        }
        Ok(self)
    }

    /// The recipe line of the `build` rule, without the leading tab.
    pub fn build_command(&self) -> String {
        let mut parts = vec!["go build -o $(NAME)".to_string()];
        parts.extend(self.build_flags.iter().cloned());
        if !self.link_flags.is_empty() {
            parts.push(format!("-ldflags {}", quote(&self.link_flags.join(" "))));
        }
        parts.join(" ")
    }
}

/// Escapes `value` for a double-quoted word in a make recipe.
///
/// `$` becomes `\$$`: make turns `$$` into `$`, the shell drops the backslash.
fn escape_recipe_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '$' => out.push_str("\\$$"),
            '\\' | '"' | '`' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Double-quotes the link flags. Fragments are escaped where they are built;
/// `$(RELEASE)` and raw `--ldflags` text pass through to make as written.
fn quote(s: &str) -> String {
    format!("\"{}\"", s)
}
