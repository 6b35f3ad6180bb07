//! Разбор query string в [`TableQuery`].
//!
//! `?status=active&status=stale&age=18-30&q=ann&sort=name&order=desc&page=0&page_size=25&selected=7`
//!
//! Повторяющийся ключ: OR внутри колонки, разные ключи: AND.
//! Зарезервированные параметры в фильтры не попадают.

use table_engine::{FilterState, Selection, SortOrder, SortSpec, TableQuery};

use crate::error::ApiError;

const SEARCH: &str = "q";
const SORT: &str = "sort";
const ORDER: &str = "order";
const PAGE: &str = "page";
const PAGE_SIZE: &str = "page_size";
const SELECTED: &str = "selected";

pub fn parse_table_query(pairs: Vec<(String, String)>) -> Result<TableQuery, ApiError> {
    let mut query = TableQuery::default();
    let mut sort_column = None;
    let mut order = SortOrder::default();
    let mut filters = Vec::new();
    let mut selected = Vec::new();

    for (key, value) in pairs {
        match key.as_str() {
            SEARCH => query.search = Some(value),
            SORT => sort_column = Some(value).filter(|v| !v.is_empty()),
            ORDER => order = value.parse().map_err(ApiError::InvalidQuery)?,
            PAGE => query.page.page = parse_number(PAGE, &value)?,
            PAGE_SIZE => query.page.page_size = parse_number(PAGE_SIZE, &value)?,
            SELECTED => selected.push(value),
            _ => filters.push((key, value)),
        }
    }

    query.filters = FilterState::from_pairs(filters);
    query.selected = Selection::from_ids(selected);
    query.sort = sort_column.map(|column| SortSpec { column, order });
    Ok(query)
}

fn parse_number(name: &str, value: &str) -> Result<usize, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::InvalidQuery(format!("{name}: expected a non-negative integer, got '{value}'")))
}
