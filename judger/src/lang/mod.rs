//! Toolchain recipes for every supported language.
//!
//! The registry is built once from the built-in table plus whatever the
//! configuration adds, and is read-only afterwards.

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

pub mod template;

pub use template::TemplateVars;

/// How to build and run programs written in one language.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSpec {
    /// Identifier used in submissions, e.g. `python` or `cpp`.
    pub id: String,
    /// Extension of the written source file, including the leading dot.
    pub source_extension: String,
    /// File stem of the written source file. Some toolchains (Java) tie it to
    /// the name of the entry class.
    #[serde(default = "default_source_stem")]
    pub source_stem: String,
    /// Compiler invocation. `None` for interpreted languages.
    #[serde(default)]
    pub compile_template: Option<Vec<String>>,
    /// Name of the file the compiler produces inside the workspace.
    #[serde(default)]
    pub artifact: Option<String>,
    /// Program invocation, expanded once per test case.
    pub run_template: Vec<String>,
}

fn default_source_stem() -> String {
    "solution".into()
}

impl LanguageSpec {
    pub fn interpreted(id: &str, extension: &str, run: &[&str]) -> Self {
        LanguageSpec {
            id: id.into(),
            source_extension: extension.into(),
            source_stem: default_source_stem(),
            compile_template: None,
            artifact: None,
            run_template: run.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn compiled(
        id: &str,
        extension: &str,
        compile: &[&str],
        artifact: Option<&str>,
        run: &[&str],
    ) -> Self {
        LanguageSpec {
            id: id.into(),
            source_extension: extension.into(),
            source_stem: default_source_stem(),
            compile_template: Some(compile.iter().map(|s| s.to_string()).collect()),
            artifact: artifact.map(|s| s.to_owned()),
            run_template: run.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_source_stem(mut self, stem: &str) -> Self {
        self.source_stem = stem.into();
        self
    }

    pub fn needs_build(&self) -> bool {
        self.compile_template.is_some()
    }

    /// File name of the source file, e.g. `solution.py`.
    pub fn source_file_name(&self) -> String {
        format!("{}{}", self.source_stem, self.source_extension)
    }
}

/// The built-in recipes.
pub fn builtin_languages() -> Vec<LanguageSpec> {
    vec![
        LanguageSpec::interpreted("python", ".py", &["python3", "$src"]),
        LanguageSpec::compiled(
            "cpp",
            ".cpp",
            &["g++", "$src", "-o", "$bin"],
            Some("a.out"),
            &["$bin"],
        ),
        LanguageSpec::compiled(
            "c",
            ".c",
            &["gcc", "$src", "-o", "$bin"],
            Some("a.out"),
            &["$bin"],
        ),
        LanguageSpec::compiled(
            "java",
            ".java",
            &["javac", "$src"],
            Some("Solution.class"),
            &["java", "-cp", "$dir", "Solution"],
        )
        .with_source_stem("Solution"),
    ]
}

/// The language id in a submission does not name any registered toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotSupported(pub String);

impl fmt::Display for NotSupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported language: {}", self.0)
    }
}

/// Lookup table from language id to its recipe.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    languages: BTreeMap<String, Arc<LanguageSpec>>,
}

impl LanguageRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with the built-in recipes, with `extra` entries added on top.
    /// An extra entry with an existing id replaces the built-in one.
    pub fn with_builtins(extra: impl IntoIterator<Item = LanguageSpec>) -> Self {
        let mut reg = Self::empty();
        for spec in builtin_languages().into_iter().chain(extra) {
            reg.register(spec);
        }
        reg
    }

    pub fn register(&mut self, spec: LanguageSpec) -> Option<Arc<LanguageSpec>> {
        self.languages.insert(spec.id.clone(), Arc::new(spec))
    }

    /// Pure lookup. Must run before any filesystem or process work.
    pub fn resolve(&self, language_id: &str) -> Result<Arc<LanguageSpec>, NotSupported> {
        self.languages
            .get(language_id)
            .cloned()
            .ok_or_else(|| NotSupported(language_id.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageSpec> {
        self.languages.values().map(|x| x.as_ref())
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}
