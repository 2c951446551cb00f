use std::sync::Arc;

use sqlx::{
    mysql::{MySqlArguments, MySqlRow},
    query::QueryAs,
    Encode, Executor, MySql, Type,
};
use tracing::debug;

use crate::bind::{Arguments, NamedParams};
use crate::builder::TemplateBuilder;
use crate::query::BindArguments;
use crate::template::CompiledTemplate;

/// Type alias for SQLx QueryAs with MySQL arguments
pub type QA<'q, R> = QueryAs<'q, MySql, R, MySqlArguments>;

impl<'q, R> BindArguments<'q> for QA<'q, R> {
    fn bind_one<T>(self, value: T) -> Self
    where
        T: 'q + Encode<'q, MySql> + Type<MySql> + Send,
    {
        self.bind(value)
    }
}

/// A prepared query that returns typed results.
///
/// `PreparedQueryAs` is similar to [`PreparedQuery`](crate::PreparedQuery) but
/// returns strongly-typed results using SQLx's `FromRow` trait. It supports
/// `fetch_all`, `fetch_one`, and `fetch_optional`.
///
/// # Type Parameters
///
/// * `R` - The result type that implements `FromRow`
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::{MySqlPool, FromRow};
/// use sqlx_named_template::{named_params, PreparedQueryAs};
///
/// #[derive(FromRow)]
/// struct User {
///     id: i32,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let query = PreparedQueryAs::<User>::from_template(
///     "SELECT id, name FROM users WHERE name LIKE_ANY :patterns",
///     &named_params! { patterns: vec!["al%", "bo%"] },
/// )?;
///
/// for user in query.fetch_all(&pool).await? {
///     println!("User: {} ({})", user.name, user.id);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PreparedQueryAs<R> {
    template: Arc<CompiledTemplate>,
    args: Arguments,
    _pd: std::marker::PhantomData<fn() -> R>,
}

impl<R> PreparedQueryAs<R>
where
    for<'row> R: sqlx::FromRow<'row, MySqlRow> + Send + Unpin,
{
    /// Creates a `PreparedQueryAs` from an already compiled template.
    ///
    /// # Errors
    ///
    /// Returns a binding error if `params` does not fit the template.
    pub fn new(template: Arc<CompiledTemplate>, params: &NamedParams) -> crate::Result<Self> {
        let args = template.bind(params)?;
        Ok(Self {
            template,
            args,
            _pd: std::marker::PhantomData,
        })
    }

    /// Compiles `template` with the default configuration and binds `params`.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be compiled or `params` does
    /// not fit it.
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

    fn query(&self) -> QA<'_, R> {
        let sql = self.template.sql();
        debug!(sql = %sql, args = self.args.len(), "executing query");
        sqlx::query_as::<MySql, R>(sql).bind_arguments(&self.args)
    }

    /// Executes the query and returns all matching rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or if any row cannot be converted to type `R`.
    pub async fn fetch_all<'e, E>(&self, executor: E) -> crate::Result<Vec<R>>
    where
        E: Executor<'e, Database = MySql>,
    {
        Ok(self.query().fetch_all(executor).await?)
    }

    /// Executes the query and returns exactly one row.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No rows are found
    /// - The query fails
    /// - The row cannot be converted to type `R`
    pub async fn fetch_one<'e, E>(&self, executor: E) -> crate::Result<R>
    where
        E: Executor<'e, Database = MySql>,
    {
        Ok(self.query().fetch_one(executor).await?)
    }

    /// Executes the query and returns at most one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be converted to type `R`.
    pub async fn fetch_optional<'e, E>(&self, executor: E) -> crate::Result<Option<R>>
    where
        E: Executor<'e, Database = MySql>,
    {
        Ok(self.query().fetch_optional(executor).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{named_params, Value};

    #[derive(sqlx::FromRow)]
    struct TestRow {
        #[allow(dead_code)]
        id: i32,
    }

    #[test]
    fn test_prepared_query_as_from_template() {
        let result = PreparedQueryAs::<TestRow>::from_template(
            "SELECT id FROM users WHERE id = :id",
            &named_params! { id: 1 },
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_prepared_query_as_like_any() {
        let compiled = TemplateBuilder::new("SELECT id FROM users WHERE name LIKE_ANY :names")
            .array_len("names", 2)
            .compile()
            .unwrap();
        let query = PreparedQueryAs::<TestRow>::new(
            Arc::new(compiled),
            &named_params! { names: vec!["a%"] },
        )
        .unwrap();

        assert_eq!(query.sql(), "SELECT id FROM users WHERE name LIKE ? OR name LIKE ?");
        assert_eq!(query.arguments().get(1), Some(&Value::Text("a%".to_owned())));
        assert_eq!(query.arguments().get(2), Some(&Value::Null));
    }
}
