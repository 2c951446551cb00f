use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::classifier::{classify, Context};
use crate::config::CompilerConfig;
use crate::scanner::Scanner;
use crate::template::{CompiledTemplate, IndexRegistry};
use crate::{Error, Result};

/// Rewrites named-parameter templates into positional SQL.
///
/// A single forward cursor walks the buffer; every edit happens at or after
/// the cursor (a `LIKE_ANY` rewrite also consumes the field token in front of
/// the keyword) and the cursor is moved past the inserted text, so rewritten
/// output is never scanned again.
#[derive(Debug, Clone)]
pub struct Compiler {
    config: CompilerConfig,
    scanner: Scanner,
}

impl Compiler {
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the scanner cannot be built.
    pub fn new(config: CompilerConfig) -> Result<Self> {
        config.validate()?;
        let scanner = Scanner::new(config.marker)?;
        Ok(Self { config, scanner })
    }

    /// The configuration this compiler was built with.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles `template`, using `overrides` as per-name array capacities.
    ///
    /// # Errors
    ///
    /// - [`Error::ArrayParameterRequired`] if an override names a parameter
    ///   that is not used in an `IN` / `LIKE_ANY` context.
    /// - [`Error::InvalidArrayLength`] if an array resolves to length zero.
    /// - [`Error::InvalidArrayContext`] if the field in front of `LIKE_ANY`
    ///   is itself a parameter or contains a `?`.
    /// - [`Error::ConflictingParameterKind`] if a name is used both as a
    ///   scalar and as an array.
    pub fn compile(
        &self,
        template: &str,
        overrides: &BTreeMap<String, usize>,
    ) -> Result<CompiledTemplate> {
        let mut buf = template.to_owned();
        let mut registry = IndexRegistry::default();
        let mut cursor = 0;

        while let Some(marker) = self.scanner.next_marker(&buf, cursor) {
            let name = marker.name.as_str();
            let context = classify(&buf, marker.span.start);
            trace!(param = %name, ?context, offset = marker.span.start, "classified parameter");

            match context {
                Context::Scalar => {
                    if overrides.contains_key(name) {
                        return Err(Error::ArrayParameterRequired(name.to_owned()));
                    }
                    buf.replace_range(marker.span.clone(), "?");
                    registry.scalar(name)?;
                    cursor = marker.span.start + 1;
                }
                Context::In { negated } => {
                    let len = self.array_len(name, overrides)?;
                    let group = format!("({})", vec!["?"; len].join(", "));
                    buf.replace_range(marker.span.clone(), &group);
                    registry.array(name, len, negated)?;
                    cursor = marker.span.start + group.len();
                }
                Context::LikeAny {
                    field_start,
                    field,
                    negated,
                } => {
                    // The field is repeated verbatim, so it must not carry a `?`.
                    if field_start < cursor || field.contains('?') {
                        return Err(Error::InvalidArrayContext(name.to_owned()));
                    }
                    let len = self.array_len(name, overrides)?;
                    let (op, joiner) = if negated {
                        ("NOT LIKE", " AND ")
                    } else {
                        ("LIKE", " OR ")
                    };
                    let expanded = vec![format!("{field} {op} ?"); len].join(joiner);
                    buf.replace_range(field_start..marker.span.end, &expanded);
                    registry.array(name, len, negated)?;
                    cursor = field_start + expanded.len();
                }
            }
        }

        // Overrides for names that never appeared at all.
        if let Some(name) = overrides.keys().find(|name| registry.kind(name).is_none()) {
            return Err(Error::ArrayParameterRequired(name.clone()));
        }

        let compiled = registry.finish(template.to_owned(), buf);
        debug!(
            source_len = template.len(),
            placeholders = compiled.placeholder_count(),
            params = compiled.params().count(),
            "compiled SQL template"
        );
        Ok(compiled)
    }

    fn array_len(&self, name: &str, overrides: &BTreeMap<String, usize>) -> Result<usize> {
        let len = overrides
            .get(name)
            .copied()
            .unwrap_or(self.config.default_array_len);
        if len == 0 {
            return Err(Error::InvalidArrayLength {
                name: name.to_owned(),
                len,
            });
        }
        Ok(len)
    }
}
