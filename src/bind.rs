//! Binding values by name onto the positional placeholders of a
//! [`CompiledTemplate`].

use std::collections::HashMap;

use tracing::warn;

use crate::template::{slot_key, CompiledTemplate, Param, ParamKind};
use crate::{Error, Result};

static NULL: Value = Value::Null;

/// A value bound to a named parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// Elements for an `IN` / `LIKE_ANY` parameter.
    Array(Vec<Value>),
}

impl Value {
    /// Whether this is an [`Value::Array`].
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident as $cast:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(<$cast>::from(v))
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u16 => UInt as u64,
    u32 => UInt as u64,
    u64 => UInt as u64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => Text as String,
    &str => Text as String,
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

/// Values keyed by parameter name (without the marker).
///
/// # Examples
///
/// ```
/// use sqlx_named_template::{named_params, NamedParams, Value};
///
/// let params = named_params! { id: 42, tags: vec!["a", "b"] };
/// assert_eq!(params.get("id"), Some(&Value::Int(42)));
///
/// let same = NamedParams::new().with("id", 42).with("tags", vec!["a", "b"]);
/// assert_eq!(params, same);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedParams {
    values: HashMap<String, Value>,
}

impl NamedParams {
    /// Creates an empty set of values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of `name`, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Chaining form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Value supplied for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Number of supplied values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values were supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Builds a [`NamedParams`] from `name: value` pairs.
#[macro_export]
macro_rules! named_params {
    ($($name:ident : $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut params = $crate::NamedParams::new();
        $(
            params.insert(stringify!($name), $value);
        )*
        params
    }};
}

/// Values in placeholder order, ready to be bound positionally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<Value>,
}

impl Arguments {
    /// Value at the 1-based placeholder `position`.
    pub fn get(&self, position: usize) -> Option<&Value> {
        position.checked_sub(1).and_then(|i| self.values.get(i))
    }

    /// Number of positional arguments, equal to the placeholder count.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the query has no placeholders.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Arguments in placeholder order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl CompiledTemplate {
    /// Resolves named values into positional arguments.
    ///
    /// A scalar is written at every position its name occurs. An array value
    /// fills its slots in order; unused slots are padded with NULL, which never
    /// widens an `IN` or `LIKE` predicate. For `NOT IN` / `NOT LIKE_ANY` the
    /// last element is repeated instead, since a NULL would make the whole
    /// predicate unknown.
    ///
    /// # Errors
    ///
    /// - [`Error::UnboundPlaceholder`] if a parameter has no value.
    /// - [`Error::UnknownParameter`] if a value names no parameter.
    /// - [`Error::ValueShape`] if an array is given for a scalar, a scalar for
    ///   an array, or an array contains arrays.
    /// - [`Error::Arity`] if an array value exceeds the parameter's capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlx_named_template::{named_params, TemplateBuilder, Value};
    ///
    /// let compiled = TemplateBuilder::new("SELECT * FROM t WHERE a = :a AND id IN :ids")
    ///     .array_len("ids", 3)
    ///     .compile()?;
    /// let args = compiled.bind(&named_params! { a: "x", ids: vec![7, 8] })?;
    /// assert_eq!(args.get(1), Some(&Value::Text("x".into())));
    /// assert_eq!(args.get(3), Some(&Value::Int(8)));
    /// assert_eq!(args.get(4), Some(&Value::Null));
    /// # Ok::<(), sqlx_named_template::Error>(())
    /// ```
    pub fn bind(&self, params: &NamedParams) -> Result<Arguments> {
        if let Some(name) = params.values.keys().find(|name| !self.is_param(name)) {
            return Err(Error::UnknownParameter(name.clone()));
        }

        let mut slots: Vec<Option<Value>> = vec![None; self.placeholder_count()];
        for param in self.params() {
            let value = params
                .get(&param.name)
                .ok_or_else(|| Error::UnboundPlaceholder(param.name.clone()))?;
            match param.kind {
                ParamKind::Scalar => {
                    if value.is_array() {
                        return Err(shape(param, "a single value, not an array"));
                    }
                    self.fill(&mut slots, &param.name, value)?;
                }
                ParamKind::Array { len } => self.bind_array(&mut slots, param, len, value)?,
            }
        }

        let values = slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Value::Null))
            .collect();
        Ok(Arguments { values })
    }

    fn bind_array(
        &self,
        slots: &mut [Option<Value>],
        param: &Param,
        capacity: usize,
        value: &Value,
    ) -> Result<()> {
        let Value::Array(items) = value else {
            return Err(shape(param, "an array"));
        };
        if items.iter().any(Value::is_array) {
            return Err(shape(param, "an array of single values"));
        }
        if items.len() > capacity {
            return Err(Error::Arity {
                name: param.name.clone(),
                len: items.len(),
                capacity,
            });
        }

        let padding = match items.last() {
            Some(last) if param.negated => last,
            None if param.negated => {
                warn!(param = %param.name, "empty array in a negated context is padded with NULL");
                &NULL
            }
            _ => &NULL,
        };
        for i in 0..capacity {
            let item = items.get(i).unwrap_or(padding);
            self.fill(slots, &slot_key(&param.name, i), item)?;
        }
        Ok(())
    }

    fn fill(&self, slots: &mut [Option<Value>], key: &str, value: &Value) -> Result<()> {
        for &position in self.indexes(key)? {
            slots[position - 1] = Some(value.clone());
        }
        Ok(())
    }
}

fn shape(param: &Param, expected: &'static str) -> Error {
    Error::ValueShape {
        name: param.name.clone(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TemplateBuilder;

    fn compiled(sql: &str, overrides: &[(&str, usize)]) -> CompiledTemplate {
        overrides
            .iter()
            .fold(TemplateBuilder::new(sql), |b, &(name, len)| b.array_len(name, len))
            .compile()
            .unwrap()
    }

    #[test]
    fn test_scalar_bound_at_every_position() {
        let t = compiled("SELECT * FROM users WHERE id = :id OR parent_id = :id AND name = :name", &[]);
        let args = t.bind(&named_params! { id: 5, name: "bob" }).unwrap();
        assert_eq!(args.len(), 3);
        assert_eq!(args.get(1), Some(&Value::Int(5)));
        assert_eq!(args.get(2), Some(&Value::Int(5)));
        assert_eq!(args.get(3), Some(&Value::Text("bob".to_owned())));
        assert_eq!(args.get(0), None);
    }

    #[test]
    fn test_array_padded_with_null() {
        let t = compiled("WHERE id IN :ids", &[("ids", 4)]);
        let args = t.bind(&named_params! { ids: vec![1, 2] }).unwrap();
        let values: Vec<_> = args.iter().cloned().collect();
        assert_eq!(values, [Value::Int(1), Value::Int(2), Value::Null, Value::Null]);
    }

    #[test]
    fn test_negated_array_repeats_last() {
        let t = compiled("WHERE id NOT IN :ids", &[("ids", 3)]);
        let args = t.bind(&named_params! { ids: vec![9] }).unwrap();
        let values: Vec<_> = args.iter().cloned().collect();
        assert_eq!(values, [Value::Int(9), Value::Int(9), Value::Int(9)]);

        let args = t.bind(&named_params! { ids: Vec::<i32>::new() }).unwrap();
        assert!(args.iter().all(|v| *v == Value::Null));
    }

    #[test]
    fn test_array_too_long() {
        let t = compiled("WHERE a LIKE_ANY :kw", &[("kw", 2)]);
        let err = t.bind(&named_params! { kw: vec!["a%", "b%", "c%"] }).unwrap_err();
        assert!(matches!(err, Error::Arity { len: 3, capacity: 2, .. }));
    }

    #[test]
    fn test_missing_value() {
        let t = compiled("WHERE a = :a AND b = :b", &[]);
        let err = t.bind(&named_params! { a: 1 }).unwrap_err();
        assert!(matches!(err, Error::UnboundPlaceholder(name) if name == "b"));
    }

    #[test]
    fn test_unknown_value() {
        let t = compiled("WHERE a = :a", &[]);
        let err = t.bind(&named_params! { a: 1, z: 2 }).unwrap_err();
        assert!(matches!(err, Error::UnknownParameter(name) if name == "z"));
    }

    #[test]
    fn test_value_shapes() {
        let t = compiled("WHERE a = :a AND id IN :ids", &[("ids", 2)]);
        let err = t.bind(&named_params! { a: vec![1], ids: vec![1] }).unwrap_err();
        assert!(matches!(err, Error::ValueShape { name, .. } if name == "a"));

        let err = t.bind(&named_params! { a: 1, ids: 1 }).unwrap_err();
        assert!(matches!(err, Error::ValueShape { name, .. } if name == "ids"));

        let nested = Value::Array(vec![Value::Array(vec![])]);
        let err = t
            .bind(&NamedParams::new().with("a", 1).with("ids", nested))
            .unwrap_err();
        assert!(matches!(err, Error::ValueShape { .. }));
    }

    #[test]
    fn test_option_values() {
        let t = compiled("WHERE a = :a AND b = :b", &[]);
        let args = t
            .bind(&named_params! { a: None::<i32>, b: Some("x") })
            .unwrap();
        assert_eq!(args.get(1), Some(&Value::Null));
        assert_eq!(args.get(2), Some(&Value::Text("x".to_owned())));
    }
}
