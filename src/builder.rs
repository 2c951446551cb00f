use std::collections::BTreeMap;

use crate::compiler::Compiler;
use crate::config::CompilerConfig;
use crate::template::CompiledTemplate;

/// Collects a template and its settings before compilation.
///
/// Array capacities can only be set here: [`compile`](Self::compile) consumes
/// the builder, and the resulting [`CompiledTemplate`] has no mutators.
///
/// # Examples
///
/// ```
/// use sqlx_named_template::TemplateBuilder;
///
/// let compiled = TemplateBuilder::new("SELECT * FROM t WHERE a LIKE_ANY :kw")
///     .array_len("kw", 3)
///     .compile()?;
/// assert_eq!(compiled.sql(), "SELECT * FROM t WHERE a LIKE ? OR a LIKE ? OR a LIKE ?");
/// assert_eq!(compiled.indexes("kw__2")?, &[3]);
/// # Ok::<(), sqlx_named_template::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateBuilder {
    template: String,
    config: CompilerConfig,
    overrides: BTreeMap<String, usize>,
}

impl TemplateBuilder {
    /// Starts a builder for `template` with the default configuration.
    pub fn new<T>(template: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            template: template.into(),
            config: CompilerConfig::default(),
            overrides: BTreeMap::new(),
        }
    }

    /// Replaces the whole compiler configuration.
    #[must_use]
    pub fn config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the marker character, see [`CompilerConfig::marker`].
    #[must_use]
    pub fn marker(mut self, marker: char) -> Self {
        self.config.marker = marker;
        self
    }

    /// Sets the number of placeholders array parameter `name` expands into.
    ///
    /// `name` must appear in an `IN` or `LIKE_ANY` context and `len` must be
    /// positive, otherwise [`compile`](Self::compile) fails.
    #[must_use]
    pub fn array_len(mut self, name: impl Into<String>, len: usize) -> Self {
        self.overrides.insert(name.into(), len);
        self
    }

    /// The raw template text.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Runs the compiler once and freezes the result.
    ///
    /// # Errors
    ///
    /// Configuration errors, see [`Compiler::compile`].
    pub fn compile(self) -> crate::Result<CompiledTemplate> {
        Compiler::new(self.config)?.compile(&self.template, &self.overrides)
    }

    /// Like [`compile`](Self::compile) but reuses an existing compiler; the
    /// compiler's configuration takes precedence over the builder's.
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile`].
    pub fn compile_with(self, compiler: &Compiler) -> crate::Result<CompiledTemplate> {
        compiler.compile(&self.template, &self.overrides)
    }
}

/// Converts named placeholders (`:name`) to positional placeholders (`?`) with
/// the default configuration.
///
/// # Examples
///
/// ```
/// use sqlx_named_template::builder::build_query;
///
/// let sql = build_query("SELECT * FROM users WHERE id = :id AND name = :name")?;
/// assert_eq!(sql, "SELECT * FROM users WHERE id = ? AND name = ?");
/// # Ok::<(), sqlx_named_template::Error>(())
/// ```
pub fn build_query(template: &str) -> crate::Result<String> {
    let compiled = TemplateBuilder::new(template).compile()?;
    Ok(compiled.sql().to_owned())
}
