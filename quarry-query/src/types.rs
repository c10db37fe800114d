//! Common types used in query building.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9, oldest first).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0, newest first).
    Desc,
}

impl SortOrder {
    /// Get the SQL keyword for this sort order.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parse a direction marker such as `"desc"`, `":desc"` or `"DESC"`.
    ///
    /// Anything unrecognised is ascending.
    pub fn parse(marker: &str) -> Self {
        let marker = marker.trim().trim_start_matches(':');
        if marker.eq_ignore_ascii_case("desc") || marker.eq_ignore_ascii_case("descending") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    /// The opposite direction.
    pub fn flip(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// Order by specification for a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByField {
    /// The column name to order by.
    pub column: String,
    /// The sort order.
    pub order: SortOrder,
}

impl OrderByField {
    /// Create a new order by field.
    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            column: column.into(),
            order,
        }
    }

    /// Create an ascending order.
    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, SortOrder::Asc)
    }

    /// Create a descending order.
    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, SortOrder::Desc)
    }

    /// Write the SQL directly to a buffer.
    ///
    /// ```rust
    /// use quarry_query::types::OrderByField;
    ///
    /// let field = OrderByField::desc("created_at");
    /// let mut buffer = String::from("ORDER BY ");
    /// field.write_sql(&mut buffer);
    /// assert_eq!(buffer, "ORDER BY created_at DESC");
    /// ```
    #[inline]
    pub fn write_sql(&self, buffer: &mut String) {
        buffer.push_str(&self.column);
        buffer.push(' ');
        buffer.push_str(self.order.as_sql());
    }

    /// Same column, opposite direction.
    pub fn reversed(&self) -> Self {
        Self::new(self.column.clone(), self.order.flip())
    }
}

impl From<&str> for OrderByField {
    fn from(column: &str) -> Self {
        Self::asc(column)
    }
}

impl From<String> for OrderByField {
    fn from(column: String) -> Self {
        Self::asc(column)
    }
}

impl From<(&str, SortOrder)> for OrderByField {
    fn from((column, order): (&str, SortOrder)) -> Self {
        Self::new(column, order)
    }
}

impl From<(String, SortOrder)> for OrderByField {
    fn from((column, order): (String, SortOrder)) -> Self {
        Self::new(column, order)
    }
}

impl From<(&str, &str)> for OrderByField {
    fn from((column, marker): (&str, &str)) -> Self {
        Self::new(column, SortOrder::parse(marker))
    }
}

/// Ordered list of order-by fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBy {
    fields: Vec<OrderByField>,
}

impl OrderBy {
    /// Create an empty order by (no ordering).
    pub fn none() -> Self {
        Self::default()
    }

    /// Check if the order by is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The fields in order.
    pub fn fields(&self) -> &[OrderByField] {
        &self.fields
    }

    /// Add a field to the order by.
    pub fn then(mut self, field: impl Into<OrderByField>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Append another spec after this one.
    pub fn extend(&mut self, other: OrderBy) {
        self.fields.extend(other.fields);
    }

    /// Flip every direction, keeping the columns.
    pub fn reverse(&self) -> Self {
        Self {
            fields: self.fields.iter().map(OrderByField::reversed).collect(),
        }
    }

    /// Write `col DIR, col DIR` (without the `ORDER BY` keyword).
    pub fn write_sql(&self, buffer: &mut String) {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                buffer.push_str(", ");
            }
            field.write_sql(buffer);
        }
    }

    /// Generate the SQL for this order by.
    pub fn to_sql(&self) -> String {
        let mut sql = String::with_capacity(self.fields.len() * 16);
        self.write_sql(&mut sql);
        sql
    }
}

impl FromIterator<OrderByField> for OrderBy {
    fn from_iter<I: IntoIterator<Item = OrderByField>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl From<OrderByField> for OrderBy {
    fn from(field: OrderByField) -> Self {
        Self {
            fields: vec![field],
        }
    }
}

impl From<Vec<OrderByField>> for OrderBy {
    fn from(fields: Vec<OrderByField>) -> Self {
        Self { fields }
    }
}

impl From<&str> for OrderBy {
    fn from(column: &str) -> Self {
        OrderByField::from(column).into()
    }
}

impl From<String> for OrderBy {
    fn from(column: String) -> Self {
        OrderByField::from(column).into()
    }
}

impl From<(&str, SortOrder)> for OrderBy {
    fn from(pair: (&str, SortOrder)) -> Self {
        OrderByField::from(pair).into()
    }
}

impl From<(&str, &str)> for OrderBy {
    fn from(pair: (&str, &str)) -> Self {
        OrderByField::from(pair).into()
    }
}

impl From<Vec<&str>> for OrderBy {
    fn from(columns: Vec<&str>) -> Self {
        columns.into_iter().map(OrderByField::from).collect()
    }
}

impl<const N: usize> From<[&str; N]> for OrderBy {
    fn from(columns: [&str; N]) -> Self {
        columns.into_iter().map(OrderByField::from).collect()
    }
}

impl From<Vec<(&str, SortOrder)>> for OrderBy {
    fn from(pairs: Vec<(&str, SortOrder)>) -> Self {
        pairs.into_iter().map(OrderByField::from).collect()
    }
}

impl<const N: usize> From<[(&str, SortOrder); N]> for OrderBy {
    fn from(pairs: [(&str, SortOrder); N]) -> Self {
        pairs.into_iter().map(OrderByField::from).collect()
    }
}

impl From<Vec<(&str, &str)>> for OrderBy {
    fn from(pairs: Vec<(&str, &str)>) -> Self {
        pairs.into_iter().map(OrderByField::from).collect()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for OrderBy {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs.into_iter().map(OrderByField::from).collect()
    }
}
