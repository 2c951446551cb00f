//! # sqlx-named-template
//!
//! Named-parameter SQL templates for SQLx: write `:name` placeholders, compile
//! the template once into positional `?` SQL plus an index of where every name
//! landed, then bind values by name for each execution.
//!
//! ## Features
//!
//! - **Named Placeholders**: Use `:param_name` instead of `?`; a name may appear any number of times
//! - **Array Parameters**: `col IN :ids` and `col LIKE_ANY :patterns` expand into a fixed number of slots
//! - **Compile Once**: `TemplateBuilder::compile` produces an immutable, thread-safe `CompiledTemplate`;
//!   `TemplateCache` memoizes it per distinct template
//! - **Generic Executor Support**: Works with `MySqlPool`, `Transaction`, and any SQLx `Executor`
//! - **Type-Safe Results**: `PreparedQueryAs` provides strongly-typed query results via `FromRow`
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sqlx = { version = "0.8", features = ["mysql", "runtime-tokio"] }
//! sqlx-named-template = "0.1"
//! ```
//!
//! ## Examples
//!
//! ### Compiling a Template
//!
//! ```rust
//! use sqlx_named_template::TemplateBuilder;
//!
//! let compiled = TemplateBuilder::new(
//!     "SELECT * FROM users WHERE org = :org AND role IN :roles AND (owner = :org OR public)",
//! )
//! .array_len("roles", 3)
//! .compile()?;
//!
//! assert_eq!(
//!     compiled.sql(),
//!     "SELECT * FROM users WHERE org = ? AND role IN (?, ?, ?) AND (owner = ? OR public)",
//! );
//! assert_eq!(compiled.indexes("org")?, &[1, 5]);
//! assert_eq!(compiled.indexes("roles__0")?, &[2]);
//! # Ok::<(), sqlx_named_template::Error>(())
//! ```
//!
//! ### Executing with Named Values
//!
//! ```rust,no_run
//! use sqlx::{MySqlPool, FromRow};
//! use sqlx_named_template::{named_params, PreparedQuery, PreparedQueryAs};
//!
//! #[derive(FromRow)]
//! struct User {
//!     id: i32,
//!     name: String,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = MySqlPool::connect("mysql://localhost/test").await?;
//!
//! let insert = PreparedQuery::from_template(
//!     "INSERT INTO users (id, name) VALUES (:id, :name)",
//!     &named_params! { id: 42, name: "John Doe" },
//! )?;
//! insert.execute(&pool).await?;
//!
//! let select = PreparedQueryAs::<User>::from_template(
//!     "SELECT id, name FROM users WHERE id IN :ids",
//!     &named_params! { ids: vec![1, 42] },
//! )?;
//! for user in select.fetch_all(&pool).await? {
//!     println!("{}: {}", user.id, user.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## How It Works
//!
//! 1. **Scan**: find the next `:name` after a forward cursor
//! 2. **Classify**: look at the keyword before it: `IN`, `LIKE_ANY` or anything else
//! 3. **Rewrite**: splice in `?`, `(?, ?, ...)` or `field LIKE ? OR field LIKE ? ...` and
//!    record the 1-based position of every emitted placeholder
//! 4. **Bind**: at execution time, resolve named values into positional arguments, padding
//!    unused array slots with NULL
//!
//! Array slots are registered under `name__0`, `name__1`, ... (see [`slot_key`]).
//! Arrays default to 32 slots; use [`TemplateBuilder::array_len`] to change it per name.
//!
//! ## Limitations
//!
//! - Currently only supports MySQL for execution
//! - Placeholders inside string literals and comments are not skipped
//! - `LIKE_ANY` expands without parentheses; wrap it yourself when combining with `AND`
//! - A marker as the last character of the template is left as plain text
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at your option.

pub mod bind;
pub mod builder;
pub mod cache;
pub mod classifier;
pub mod compiler;
pub mod config;
pub mod error;
pub mod query;
pub mod query_as;
pub mod scanner;
pub mod template;

pub use bind::{Arguments, NamedParams, Value};
pub use builder::TemplateBuilder;
pub use cache::{LazyTemplate, TemplateCache};
pub use compiler::Compiler;
pub use config::{CompilerConfig, DEFAULT_ARRAY_LEN, DEFAULT_MARKER};
pub use error::{Error, Result};
pub use query::PreparedQuery;
pub use query_as::PreparedQueryAs;
pub use template::{slot_key, CompiledTemplate, Param, ParamKind};

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::named_params;
    pub use crate::{NamedParams, PreparedQuery, PreparedQueryAs, TemplateBuilder, TemplateCache};
}
