use std::sync::Arc;

use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;
use sqlx::{mysql::MySqlQueryResult, Encode, Executor, MySql, Type};
use tracing::debug;

use crate::bind::{Arguments, NamedParams, Value};
use crate::builder::TemplateBuilder;
use crate::template::CompiledTemplate;

/// Type alias for SQLx Query with MySQL arguments
pub type Q<'q> = Query<'q, MySql, MySqlArguments>;

/// Positional binding of resolved [`Arguments`] onto a SQLx query.
pub(crate) trait BindArguments<'q>: Sized {
    fn bind_one<T>(self, value: T) -> Self
    where
        T: 'q + Encode<'q, MySql> + Type<MySql> + Send;

    fn bind_value(self, value: &'q Value) -> Self {
        match value {
            // Arrays are flattened by `CompiledTemplate::bind` and never reach here.
            Value::Null | Value::Array(_) => self.bind_one(None::<String>),
            Value::Bool(v) => self.bind_one(*v),
            Value::Int(v) => self.bind_one(*v),
            Value::UInt(v) => self.bind_one(*v),
            Value::Float(v) => self.bind_one(*v),
            Value::Text(v) => self.bind_one(v.as_str()),
            Value::Bytes(v) => self.bind_one(v.as_slice()),
        }
    }

    fn bind_arguments(self, args: &'q Arguments) -> Self {
        args.iter().fold(self, Self::bind_value)
    }
}

impl<'q> BindArguments<'q> for Q<'q> {
    fn bind_one<T>(self, value: T) -> Self
    where
        T: 'q + Encode<'q, MySql> + Type<MySql> + Send,
    {
        self.bind(value)
    }
}

/// A compiled template together with the values for one execution.
///
/// `PreparedQuery` resolves named values into positional arguments once, when
/// it is created, and constructs a fresh SQLx `Query` on each execution. The
/// compiled template is shared, so the same template can back many queries
/// without re-parsing.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::MySqlPool;
/// use sqlx_named_template::{named_params, PreparedQuery};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let query = PreparedQuery::from_template(
///     "UPDATE users SET active = :active WHERE id IN :ids",
///     &named_params! { active: false, ids: vec![1, 2, 3] },
/// )?;
///
/// let result = query.execute(&pool).await?;
/// println!("Deactivated {} users", result.rows_affected());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    template: Arc<CompiledTemplate>,
    args: Arguments,
}

impl PreparedQuery {
    /// Creates a `PreparedQuery` from an already compiled template.
    ///
    /// # Errors
    ///
    /// Returns a binding error if `params` does not fit the template, see
    /// [`CompiledTemplate::bind`].
    pub fn new(template: Arc<CompiledTemplate>, params: &NamedParams) -> crate::Result<Self> {
        let args = template.bind(params)?;
        Ok(Self { template, args })
    }

    /// Compiles `template` with the default configuration and binds `params`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the template cannot be compiled, or a
    /// binding error if `params` does not fit it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sqlx_named_template::{named_params, PreparedQuery};
    ///
    /// let query = PreparedQuery::from_template(
    ///     "SELECT * FROM users WHERE id = :id",
    ///     &named_params! { id: 42 },
    /// )?;
    /// assert_eq!(query.sql(), "SELECT * FROM users WHERE id = ?");
    /// # Ok::<(), sqlx_named_template::Error>(())
    /// ```
    pub fn from_template<T>(template: T, params: &NamedParams) -> crate::Result<Self>
    where
        T: Into<String>,
    {
        let compiled = TemplateBuilder::new(template).compile()?;
        Self::new(Arc::new(compiled), params)
    }

    /// The translated SQL sent to the database.
    pub fn sql(&self) -> &str {
        self.template.sql()
    }

    /// The resolved positional arguments.
    pub fn arguments(&self) -> &Arguments {
        &self.args
    }

    /// Executes the query using the provided executor.
    ///
    /// This works with any SQLx `Executor` implementation, including
    /// `MySqlPool`, `Transaction`, and others.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn execute<'e, E>(&self, executor: E) -> crate::Result<MySqlQueryResult>
    where
        E: Executor<'e, Database = MySql>,
    {
        let sql = self.template.sql();
        debug!(sql = %sql, args = self.args.len(), "executing query");
        let q = sqlx::query::<MySql>(sql).bind_arguments(&self.args);
        Ok(q.execute(executor).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{named_params, Error};

    #[test]
    fn test_prepared_query_from_template() {
        let query = PreparedQuery::from_template(
            "SELECT * FROM users WHERE id = :id AND name = :name",
            &named_params! { id: 1, name: "a" },
        )
        .unwrap();
        assert_eq!(query.sql(), "SELECT * FROM users WHERE id = ? AND name = ?");
        assert_eq!(query.arguments().len(), 2);
    }

    #[test]
    fn test_prepared_query_repeated_placeholders() {
        let query = PreparedQuery::from_template(
            "SELECT * FROM users WHERE id = :id OR user_id = :id",
            &named_params! { id: 7 },
        )
        .unwrap();

        // Both occurrences receive the value
        let values: Vec<_> = query.arguments().iter().cloned().collect();
        assert_eq!(values, [Value::Int(7), Value::Int(7)]);
    }

    #[test]
    fn test_prepared_query_shares_template() {
        let compiled = Arc::new(
            TemplateBuilder::new("DELETE FROM users WHERE id IN :ids")
                .array_len("ids", 2)
                .compile()
                .unwrap(),
        );
        let a = PreparedQuery::new(Arc::clone(&compiled), &named_params! { ids: vec![1] }).unwrap();
        let b = PreparedQuery::new(Arc::clone(&compiled), &named_params! { ids: vec![2, 3] }).unwrap();
        assert_eq!(a.sql(), b.sql());
        assert_eq!(a.arguments().get(2), Some(&Value::Null));
        assert_eq!(b.arguments().get(2), Some(&Value::Int(3)));
    }

    #[test]
    fn test_prepared_query_unbound() {
        let err = PreparedQuery::from_template("SELECT * FROM users WHERE id = :id", &named_params! {})
            .unwrap_err();
        assert!(matches!(err, Error::UnboundPlaceholder(_)));
    }
}
