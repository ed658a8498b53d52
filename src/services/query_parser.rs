//! Parses list query strings and write bodies against the attribute whitelist.
//!
//! Sort query (default order is asc):
//!   `?sort=title,dateOfBirth:desc,company:asc`
//!
//! Pagination query (default perPage is 50):
//!   `?page=1:50`, `?page=2`
//!
//! Filter queries (any whitelisted attribute):
//!   `?title=sometitle&company=somecompany`
//!
//! Filters whose names collide with `sort`, `search` or `page` are written
//! with one leading `_` (`?_sort=value`). A filter literally named `_sort`
//! takes two (`?__sort=value`). Exactly one leading `_` is stripped.

use crate::models::{
    client::{Attribute, ClientInput},
    query::{ClientQuery, Direction, MAX_PER_PAGE, Pagination, SortField},
};
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

pub const SORT_KEY: &str = "sort";
pub const PAGE_KEY: &str = "page";
pub const SEARCH_KEY: &str = "search";
const RESERVED_KEYS: [&str; 3] = [SORT_KEY, PAGE_KEY, SEARCH_KEY];

const ESCAPE_PREFIX: char = '_';

/// Body key carrying the temporary image to attach.
pub const IMAGE_ID_KEY: &str = "imageId";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid page value: {0}. Use a number >= 1")]
    InvalidPage(String),
    #[error("Invalid perPage value: {0}. Use a number <= {max}", max = MAX_PER_PAGE)]
    InvalidPerPage(String),
    #[error("Invalid attribute: {0}. Valid attributes: {valid}", valid = Attribute::valid_names())]
    InvalidAttribute(String),
    #[error("Invalid sort key: {0}. Valid keys: {valid}", valid = Attribute::valid_names())]
    InvalidSortKey(String),
    #[error("Invalid sort order value: {0}. Valid values: {valid}", valid = Direction::VALID_VALUES)]
    InvalidSortOrder(String),
    #[error("Invalid filter: {0}. Valid filters: {valid}", valid = Attribute::valid_names())]
    InvalidFilter(String),
    #[error("Invalid search pattern: {0}")]
    InvalidSearch(String),
    #[error("Invalid value for {0}. Use a string")]
    InvalidValue(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Build a [`ClientQuery`] from raw query-string pairs.
///
/// Fails on the first malformed or non-whitelisted value.
pub fn parse_query(raw: &HashMap<String, String>) -> ParseResult<ClientQuery> {
    let sort = parse_sort(raw.get(SORT_KEY).map(String::as_str))?;
    let page = parse_pagination(raw.get(PAGE_KEY).map(String::as_str))?;
    let search = raw.get(SEARCH_KEY).cloned();
    if let Some(pattern) = &search {
        Regex::new(pattern).map_err(|_| ParseError::InvalidSearch(pattern.clone()))?;
    }
    let filters = parse_filters(raw)?;

    Ok(ClientQuery {
        sort,
        page,
        search,
        filters,
    })
}

/// Split a write body into whitelisted attributes and the optional `imageId`.
///
/// Every key is checked against the whitelist before any value is looked at.
/// Attribute values must be strings; a null `imageId` means no image.
pub fn parse_client_input(body: HashMap<String, Value>) -> ParseResult<ClientInput> {
    if let Some(key) = body
        .keys()
        .find(|key| *key != IMAGE_ID_KEY && Attribute::from_name(key).is_none())
    {
        return Err(ParseError::InvalidAttribute(key.clone()));
    }

    let mut input = ClientInput::default();
    for (key, value) in body {
        if key == IMAGE_ID_KEY {
            input.image_id = match value {
                Value::Null => None,
                Value::String(id) => Some(id),
                _ => return Err(ParseError::InvalidValue(key)),
            };
            continue;
        }
        let attr = Attribute::from_name(&key)
            .ok_or_else(|| ParseError::InvalidAttribute(key.clone()))?;
        let Value::String(value) = value else {
            return Err(ParseError::InvalidValue(key));
        };
        input.attributes.insert(attr, value);
    }
    Ok(input)
}

/// `key:order,key:order,...`; order may be omitted.
fn parse_sort(raw: Option<&str>) -> ParseResult<Vec<(SortField, Direction)>> {
    let raw = match raw {
        Some(s) if !s.is_empty() => s,
        // newest first
        _ => return Ok(vec![(SortField::Id, Direction::Desc)]),
    };

    let mut sort: Vec<(SortField, Direction)> = Vec::new();
    for token in raw.split(',') {
        let (key, order) = split_key_value(token);
        let attr = Attribute::from_name(key)
            .ok_or_else(|| ParseError::InvalidSortKey(key.to_string()))?;
        let order = order.unwrap_or("asc");
        let direction =
            Direction::parse(order).ok_or_else(|| ParseError::InvalidSortOrder(order.to_string()))?;

        let field = SortField::Attribute(attr);
        match sort.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = direction,
            None => sort.push((field, direction)),
        }
    }
    Ok(sort)
}

/// `page` or `page:perPage`.
fn parse_pagination(raw: Option<&str>) -> ParseResult<Pagination> {
    let raw = match raw {
        Some(s) if !s.is_empty() => s,
        _ => return Ok(Pagination::default()),
    };

    let (page_raw, per_page_raw) = split_key_value(raw);
    let page = page_raw
        .parse::<u32>()
        .ok()
        .filter(|page| *page >= 1)
        .ok_or_else(|| ParseError::InvalidPage(page_raw.to_string()))?;

    let per_page = match per_page_raw {
        None => MAX_PER_PAGE,
        Some(value) => value
            .parse::<u32>()
            .ok()
            .filter(|n| (1..=MAX_PER_PAGE).contains(n))
            .ok_or_else(|| ParseError::InvalidPerPage(value.to_string()))?,
    };

    Ok(Pagination { page, per_page })
}

fn parse_filters(raw: &HashMap<String, String>) -> ParseResult<BTreeMap<Attribute, String>> {
    let mut filters = BTreeMap::new();
    for (key, value) in raw {
        // Reserved keys are matched before any escape stripping.
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        let name = key.strip_prefix(ESCAPE_PREFIX).unwrap_or(key);
        let attr =
            Attribute::from_name(name).ok_or_else(|| ParseError::InvalidFilter(name.to_string()))?;
        filters.insert(attr, value.clone());
    }
    Ok(filters)
}

/// Split on the last `:`; `None` when there is no separator.
fn split_key_value(s: &str) -> (&str, Option<&str>) {
    match s.rfind(':') {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    }
}
