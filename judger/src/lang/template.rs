//! Argument templates used by compile and run recipes.
//!
//! A template is a plain argument with `$name` placeholders in it, such as
//! `$src` or `-o$bin`. Placeholders are resolved against a [`TemplateVars`]
//! table; unknown placeholders are kept verbatim.

use std::{borrow::Cow, path::Path};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(\w+)|\$\{(\w+)\}").expect("placeholder pattern should be valid")
});

/// Variable name of the written source file.
pub const VAR_SOURCE: &str = "src";
/// Variable name of the run target (build artifact, or the source itself).
pub const VAR_BINARY: &str = "bin";
/// Variable name of the workspace directory.
pub const VAR_DIR: &str = "dir";

/// Values that placeholders expand to.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    vars: Vec<(String, String)>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.vars.push((name, value)),
        }
        self
    }

    pub fn set_path(&mut self, name: impl Into<String>, path: &Path) -> &mut Self {
        self.set(name, path.display().to_string())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Expand every placeholder inside a single argument.
    pub fn expand<'a>(&self, arg: &'a str) -> Cow<'a, str> {
        PLACEHOLDER.replace_all(arg, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match self.get(name) {
                Some(v) => v.to_owned(),
                None => caps[0].to_owned(),
            }
        })
    }

    /// Expand a whole argument template into a runnable command line.
    pub fn expand_all(&self, template: &[String]) -> Vec<String> {
        template
            .iter()
            .map(|arg| self.expand(arg).into_owned())
            .collect()
    }
}
