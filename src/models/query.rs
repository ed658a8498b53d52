//! Structured form of the list query string.

use super::client::Attribute;
use std::collections::BTreeMap;

/// No more than 50 clients per page.
pub const MAX_PER_PAGE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub const VALID_VALUES: &'static str = "asc|desc";

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Direction::Asc),
            "desc" => Some(Direction::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// What a sort entry orders by.
///
/// `Id` is only produced by the default sort; clients sort by attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Attribute(Attribute),
}

impl SortField {
    /// `Id` orders by insertion sequence, so `Id` descending is newest first.
    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "seq",
            SortField::Attribute(attr) => attr.column(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: MAX_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientQuery {
    pub sort: Vec<(SortField, Direction)>,
    pub page: Pagination,
    /// Pattern matched against title, email and company.
    pub search: Option<String>,
    /// Exact-match constraints.
    pub filters: BTreeMap<Attribute, String>,
}

impl Default for ClientQuery {
    fn default() -> Self {
        Self {
            sort: vec![(SortField::Id, Direction::Desc)],
            page: Pagination::default(),
            search: None,
            filters: BTreeMap::new(),
        }
    }
}
