use std::collections::HashMap;

use crate::{Error, Result};

/// Key under which slot `index` of array parameter `name` is registered.
///
/// ```
/// assert_eq!(sqlx_named_template::slot_key("ids", 3), "ids__3");
/// ```
pub fn slot_key(name: &str, index: usize) -> String {
    format!("{name}__{index}")
}

/// How a parameter expands in the translated SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Scalar,
    /// Expands into `len` placeholders, one per slot.
    Array { len: usize },
}

/// A logical parameter discovered in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Name without the marker.
    pub name: String,
    pub kind: ParamKind,
    /// Used at least once as `NOT IN` / `NOT LIKE_ANY`.
    pub negated: bool,
}

impl Param {
    /// Capacity if this is an array parameter.
    pub fn array_len(&self) -> Option<usize> {
        match self.kind {
            ParamKind::Scalar => None,
            ParamKind::Array { len } => Some(len),
        }
    }
}

/// Accumulates parameters and placeholder positions while the compiler
/// rewrites a template.
#[derive(Debug, Default)]
pub(crate) struct IndexRegistry {
    placeholders: usize,
    params: Vec<Param>,
    lookup: HashMap<String, usize>,
    indexes: HashMap<String, Vec<usize>>,
    keys: Vec<String>,
}

impl IndexRegistry {
    fn declare(&mut self, name: &str, kind: ParamKind, negated: bool) -> Result<()> {
        match self.lookup.get(name) {
            Some(&i) => {
                let param = &mut self.params[i];
                if param.kind != kind {
                    return Err(Error::ConflictingParameterKind(name.to_owned()));
                }
                param.negated |= negated;
            }
            None => {
                self.lookup.insert(name.to_owned(), self.params.len());
                self.params.push(Param {
                    name: name.to_owned(),
                    kind,
                    negated,
                });
            }
        }
        Ok(())
    }

    fn push(&mut self, key: String) {
        self.placeholders += 1;
        match self.indexes.get_mut(&key) {
            Some(positions) => positions.push(self.placeholders),
            None => {
                self.keys.push(key.clone());
                self.indexes.insert(key, vec![self.placeholders]);
            }
        }
    }

    /// Registers one `?` for a scalar occurrence.
    pub(crate) fn scalar(&mut self, name: &str) -> Result<()> {
        self.declare(name, ParamKind::Scalar, false)?;
        self.push(name.to_owned());
        Ok(())
    }

    /// Registers `len` consecutive `?` for an array occurrence.
    pub(crate) fn array(&mut self, name: &str, len: usize, negated: bool) -> Result<()> {
        self.declare(name, ParamKind::Array { len }, negated)?;
        for i in 0..len {
            self.push(slot_key(name, i));
        }
        Ok(())
    }

    pub(crate) fn kind(&self, name: &str) -> Option<ParamKind> {
        self.lookup.get(name).map(|&i| self.params[i].kind)
    }

    pub(crate) fn finish(self, source: String, sql: String) -> CompiledTemplate {
        CompiledTemplate {
            source,
            sql,
            placeholders: self.placeholders,
            params: self.params,
            lookup: self.lookup,
            indexes: self.indexes,
            keys: self.keys,
        }
    }
}

/// The immutable result of compiling a named-parameter template.
///
/// Holds the translated SQL with positional `?` placeholders and the index
/// registry mapping every parameter name (or array slot key, see [`slot_key`])
/// to its 1-based placeholder positions. Safe to share across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    source: String,
    sql: String,
    placeholders: usize,
    params: Vec<Param>,
    lookup: HashMap<String, usize>,
    indexes: HashMap<String, Vec<usize>>,
    keys: Vec<String>,
}

impl CompiledTemplate {
    /// The translated SQL.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The template text this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of `?` placeholders in [`sql`](Self::sql).
    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    /// Parameters in order of first appearance.
    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    /// The parameter called `name`, if the template uses it.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.lookup.get(name).map(|&i| &self.params[i])
    }

    /// Whether `name` is referenced by the template.
    pub fn is_param(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    /// Whether `name` is used in an `IN` / `LIKE_ANY` context.
    pub fn is_array_param(&self, name: &str) -> bool {
        self.param(name).is_some_and(|p| p.array_len().is_some())
    }

    /// Capacity of an array parameter.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownParameter`] if `name` is not in the template,
    /// [`Error::ArrayParameterRequired`] if it is a scalar.
    pub fn array_len(&self, name: &str) -> Result<usize> {
        let param = self
            .param(name)
            .ok_or_else(|| Error::UnknownParameter(name.to_owned()))?;
        param
            .array_len()
            .ok_or_else(|| Error::ArrayParameterRequired(name.to_owned()))
    }

    /// 1-based positions registered under `key`, in textual order.
    ///
    /// `key` is a scalar name or an array slot key such as `ids__0`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownParameter`] if nothing is registered under `key`.
    pub fn indexes(&self, key: &str) -> Result<&[usize]> {
        self.indexes
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::UnknownParameter(key.to_owned()))
    }

    /// Every registered key with its positions, in order of first appearance.
    pub fn index_entries(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.keys
            .iter()
            .map(move |k| (k.as_str(), self.indexes[k].as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CompiledTemplate {
        let mut registry = IndexRegistry::default();
        registry.scalar("id").unwrap();
        registry.array("tags", 2, false).unwrap();
        registry.scalar("id").unwrap();
        registry.finish("src".to_owned(), "sql".to_owned())
    }

    #[test]
    fn test_positions_follow_discovery_order() {
        let t = sample();
        assert_eq!(t.indexes("id").unwrap(), &[1, 4]);
        assert_eq!(t.indexes("tags__0").unwrap(), &[2]);
        assert_eq!(t.indexes("tags__1").unwrap(), &[3]);
        assert_eq!(t.placeholder_count(), 4);
    }

    #[test]
    fn test_index_entries_in_discovery_order() {
        let mut registry = IndexRegistry::default();
        for name in ["a", "b", "c", "d", "e", "f"] {
            registry.scalar(name).unwrap();
        }
        registry.array("g", 2, false).unwrap();
        registry.scalar("a").unwrap();
        let t = registry.finish(String::new(), String::new());

        let keys: Vec<_> = t.index_entries().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b", "c", "d", "e", "f", "g__0", "g__1"]);
        let (_, first) = t.index_entries().next().unwrap();
        assert_eq!(first, &[1, 9]);
    }

    #[test]
    fn test_param_queries() {
        let t = sample();
        assert!(t.is_param("id"));
        assert!(!t.is_array_param("id"));
        assert!(t.is_array_param("tags"));
        assert_eq!(t.array_len("tags").unwrap(), 2);
        assert!(matches!(t.array_len("id"), Err(Error::ArrayParameterRequired(_))));
        assert!(matches!(t.array_len("nope"), Err(Error::UnknownParameter(_))));
        assert!(matches!(t.indexes("tags"), Err(Error::UnknownParameter(_))));
        let names: Vec<_> = t.params().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["id", "tags"]);
    }

    #[test]
    fn test_conflicting_kinds_rejected() {
        let mut registry = IndexRegistry::default();
        registry.scalar("x").unwrap();
        let err = registry.array("x", 3, false).unwrap_err();
        assert!(matches!(err, Error::ConflictingParameterKind(name) if name == "x"));
    }

    #[test]
    fn test_negation_is_sticky() {
        let mut registry = IndexRegistry::default();
        registry.array("ids", 2, true).unwrap();
        registry.array("ids", 2, false).unwrap();
        let t = registry.finish(String::new(), String::new());
        assert!(t.param("ids").unwrap().negated);
        assert_eq!(t.indexes("ids__1").unwrap(), &[2, 4]);
    }
}
