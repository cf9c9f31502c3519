//! Query construction and rendering.
//!
//! `QueryBuilder` collects filters, ordering and paging into a `QueryState`;
//! `render` turns a state into SQL text and an ordered argument list for one
//! dialect.

pub mod builder;
pub mod render;
pub mod state;

pub use builder::QueryBuilder;
pub use render::RenderedQuery;
pub use state::{Direction, OrderBy, QueryState};
