//! Record schema declarations.
//!
//! Instead of runtime reflection, a record lists its fields once as
//! `FieldDecl`s and exposes positional access to them through `FieldAccess`.
//! The `schema!` macro writes both from a single field list.

use crate::value::{ConversionError, SqlValue, Value};
use chrono::{DateTime, Utc};

/// One declared field of a record, by position
#[derive(Debug, Clone)]
pub enum FieldDecl {
    /// A field stored in the named column
    Column {
        field: &'static str,
        column: &'static str,
    },
    /// An embedded sub-record whose columns join the parent's namespace
    Embedded {
        field: &'static str,
        fields: fn() -> Vec<FieldDecl>,
    },
    /// A field with no column
    Ignored { field: &'static str },
}

impl FieldDecl {
    pub fn column(field: &'static str, column: &'static str) -> Self {
        FieldDecl::Column { field, column }
    }

    pub fn embedded<E: Embeddable>(field: &'static str) -> Self {
        FieldDecl::Embedded {
            field,
            fields: E::fields,
        }
    }

    pub fn ignored(field: &'static str) -> Self {
        FieldDecl::Ignored { field }
    }

    /// Rust-side name of the field
    pub fn field_name(&self) -> &'static str {
        match self {
            FieldDecl::Column { field, .. }
            | FieldDecl::Embedded { field, .. }
            | FieldDecl::Ignored { field } => field,
        }
    }
}

/// A column field's storage, as seen by the materializer
pub trait ColumnSlot {
    /// Overwrite the field from a backend value
    fn assign(&mut self, value: Value) -> Result<(), ConversionError>;

    /// Current value, encoded for binding
    fn current(&self) -> Value;
}

impl<T: SqlValue> ColumnSlot for T {
    fn assign(&mut self, value: Value) -> Result<(), ConversionError> {
        *self = T::from_value(value)?;
        Ok(())
    }

    fn current(&self) -> Value {
        self.to_value()
    }
}

/// Mutable view of one declared field
pub enum FieldMut<'a> {
    Column(&'a mut dyn ColumnSlot),
    Embedded(&'a mut dyn FieldAccess),
}

/// Shared view of one declared field
pub enum FieldRef<'a> {
    Column(&'a dyn ColumnSlot),
    Embedded(&'a dyn FieldAccess),
}

/// Positional access to declared fields. Position `i` refers to the `i`-th
/// entry of `Embeddable::fields`; ignored fields yield `None`.
pub trait FieldAccess {
    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;

    fn field_ref(&self, index: usize) -> Option<FieldRef<'_>>;
}

/// A composite that can be scanned into, directly or embedded in a record
pub trait Embeddable: FieldAccess + Default + 'static {
    fn fields() -> Vec<FieldDecl>;
}

/// A record stored in its own table
pub trait Record: Embeddable + Send {
    /// Table name; defaults to the snake_case type name
    fn table_name() -> String {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        let short = base.rsplit("::").next().unwrap_or(base);
        to_snake_case(short)
    }

    fn primary_key() -> &'static str {
        "id"
    }

    /// Runs before insertion; an error aborts the insert
    fn before_create(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after each record is materialized; an error aborts the query
    fn after_find(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

pub(crate) fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Common base columns, meant to be embedded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

crate::schema! {
    Model {
        id: column("id"),
        created_at: column("created_at"),
        updated_at: column("updated_at"),
    }
}

/// Implement `FieldAccess` and `Embeddable` from one field list.
///
/// Each entry is `field: column("name")`, `field: embedded(Type)` or
/// `field: ignored`, in the struct's declaration order.
///
/// ```
/// use vibeorm::scan::{Embeddable, Model};
///
/// #[derive(Default)]
/// struct User {
///     base: Model,
///     name: String,
///     scratch: Vec<u8>,
/// }
///
/// vibeorm::schema! {
///     User {
///         base: embedded(Model),
///         name: column("name"),
///         scratch: ignored,
///     }
/// }
///
/// assert_eq!(User::fields().len(), 3);
/// ```
#[macro_export]
macro_rules! schema {
    ($ty:ty { $( $field:ident : $kind:ident $( ( $($arg:tt)* ) )? ),* $(,)? }) => {
        impl $crate::scan::FieldAccess for $ty {
            #[allow(unused_assignments, unused_variables, unused_mut)]
            fn field_mut(&mut self, index: usize) -> Option<$crate::scan::FieldMut<'_>> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return $crate::__schema_slot!(mut $kind, self.$field);
                    }
                    position += 1;
                )*
                None
            }

            #[allow(unused_assignments, unused_variables, unused_mut)]
            fn field_ref(&self, index: usize) -> Option<$crate::scan::FieldRef<'_>> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return $crate::__schema_slot!(ref $kind, self.$field);
                    }
                    position += 1;
                )*
                None
            }
        }

        impl $crate::scan::Embeddable for $ty {
            fn fields() -> Vec<$crate::scan::FieldDecl> {
                vec![ $( $crate::__schema_decl!($kind, $field $(, $($arg)* )? ) ),* ]
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __schema_decl {
    (column, $field:ident, $column:expr) => {
        $crate::scan::FieldDecl::column(stringify!($field), $column)
    };
    (embedded, $field:ident, $inner:ty) => {
        $crate::scan::FieldDecl::embedded::<$inner>(stringify!($field))
    };
    (ignored, $field:ident) => {
        $crate::scan::FieldDecl::ignored(stringify!($field))
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __schema_slot {
    (mut column, $place:expr) => {
        Some($crate::scan::FieldMut::Column(&mut $place))
    };
    (mut embedded, $place:expr) => {
        Some($crate::scan::FieldMut::Embedded(&mut $place))
    };
    (mut ignored, $place:expr) => {
        None
    };
    (ref column, $place:expr) => {
        Some($crate::scan::FieldRef::Column(&$place))
    };
    (ref embedded, $place:expr) => {
        Some($crate::scan::FieldRef::Embedded(&$place))
    };
    (ref ignored, $place:expr) => {
        None
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct BlogPost {
        base: Model,
        title: String,
    }

    crate::schema! {
        BlogPost {
            base: embedded(Model),
            title: column("title"),
        }
    }

    impl Record for BlogPost {}

    #[derive(Debug, Default)]
    struct Account {
        id: i64,
    }

    crate::schema! {
        Account {
            id: column("account_id"),
        }
    }

    impl Record for Account {
        fn table_name() -> String {
            "accounts".to_string()
        }

        fn primary_key() -> &'static str {
            "account_id"
        }
    }

    #[test]
    fn test_default_table_name_is_snake_case() {
        assert_eq!(BlogPost::table_name(), "blog_post");
        assert_eq!(BlogPost::primary_key(), "id");
        assert_eq!(Account::table_name(), "accounts");
        assert_eq!(Account::primary_key(), "account_id");
        assert_eq!(to_snake_case("HTTPLog"), "h_t_t_p_log");
        assert_eq!(to_snake_case("user"), "user");
    }

    #[test]
    fn test_field_decls_follow_declaration_order() {
        let fields = BlogPost::fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field_name(), "base");
        assert!(matches!(fields[0], FieldDecl::Embedded { .. }));
        assert!(matches!(fields[1], FieldDecl::Column { column: "title", .. }));

        let model_fields = Model::fields();
        assert_eq!(model_fields.len(), 3);
    }

    #[test]
    fn test_positional_access() -> anyhow::Result<()> {
        let mut post = BlogPost::default();
        match post.field_mut(1) {
            Some(FieldMut::Column(slot)) => slot.assign(Value::from("hello"))?,
            _ => panic!("title should be a column"),
        }
        assert_eq!(post.title, "hello");
        assert!(matches!(post.field_ref(0), Some(FieldRef::Embedded(_))));
        assert!(post.field_ref(2).is_none());
        Ok(())
    }
}
