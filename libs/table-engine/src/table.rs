//! Table Presentation Shell: search → filter → sort → page, плюс facets.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use fello_api::{Cell, EntityKind, Row};

use crate::config::EntityConfig;
use crate::error::TableError;
use crate::facets::{ColumnFacets, facet_table};
use crate::filter::{FilterState, RowFilter};
use crate::selection::{PageSelection, Selection};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 500;

// ════════════════════════════════════════════════════════════════
//  Query
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortSpec {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Zero-based страница.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Размер страницы в пределах `1..=MAX_PAGE_SIZE`.
    pub fn effective_size(&self) -> usize {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableQuery {
    #[serde(default)]
    pub filters: FilterState,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    #[serde(default)]
    pub page: PageRequest,
    /// Выбранные строки; view сообщает состояние чекбокса страницы.
    #[serde(default)]
    pub selected: Selection,
}

impl TableQuery {
    /// Проверка запроса снаружи (HTTP/CLI). `build_view` сам по себе тотален.
    pub fn validate(&self, config: &EntityConfig) -> Result<(), TableError> {
        config.validate(&self.filters)?;
        if let Some(sort) = &self.sort {
            config.validate_sort(sort)?;
        }
        Ok(())
    }

    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

// ════════════════════════════════════════════════════════════════
//  View
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub entity: EntityKind,
    /// Строки текущей страницы.
    pub rows: Vec<Row>,
    /// Всего строк в snapshot'е.
    pub total: usize,
    /// Строк после поиска и фильтров.
    pub filtered: usize,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub selection: PageSelection,
    pub facets: Vec<ColumnFacets>,
}

/// Собрать страницу таблицы.
///
/// Поиск сужает вселенную для фильтров и facets; facets колонки
/// считаются без её собственного фильтра (см. [`facet_table`]).
pub fn build_view(config: &EntityConfig, rows: &[Row], query: &TableQuery) -> TableView {
    let searched = search_rows(config, rows, query);

    let filter = RowFilter::new(config, &query.filters, None);
    let mut visible: Vec<&Row> = searched.iter().copied().filter(|row| filter.matches(row)).collect();

    if let Some(sort) = &query.sort {
        sort_rows(&mut visible, sort);
    }

    let page_size = query.page.effective_size();
    let filtered = visible.len();
    let page_count = filtered.div_ceil(page_size);
    let page_rows: Vec<Row> = visible
        .into_iter()
        .skip(query.page.page.saturating_mul(page_size))
        .take(page_size)
        .cloned()
        .collect();
    let selection = query.selected.page_state(&page_rows);

    let facets = facet_table(config, searched.iter().copied(), &query.filters);

    tracing::debug!(
        entity = %config.kind,
        total = rows.len(),
        filtered,
        page = query.page.page,
        "table view built"
    );

    TableView {
        entity: config.kind,
        rows: page_rows,
        total: rows.len(),
        filtered,
        page: query.page.page,
        page_size,
        page_count,
        selection,
        facets,
    }
}

/// Только facets (без сортировки и страницы) для того же запроса.
pub fn build_facets(config: &EntityConfig, rows: &[Row], query: &TableQuery) -> Vec<ColumnFacets> {
    let searched = search_rows(config, rows, query);
    facet_table(config, searched.iter().copied(), &query.filters)
}

fn search_rows<'a>(config: &EntityConfig, rows: &'a [Row], query: &TableQuery) -> Vec<&'a Row> {
    let needle = query.needle();
    rows.iter()
        .filter(|row| needle.as_deref().is_none_or(|n| search_matches(config, row, n)))
        .collect()
}

/// Case-insensitive substring по search-полям сущности.
/// `needle` уже в нижнем регистре.
pub fn search_matches(config: &EntityConfig, row: &Row, needle: &str) -> bool {
    config.search_fields.iter().any(|field| {
        row.cell(field)
            .and_then(Cell::display)
            .is_some_and(|text| text.to_lowercase().contains(needle))
    })
}

// ════════════════════════════════════════════════════════════════
//  Sorting
// ════════════════════════════════════════════════════════════════

#[derive(Debug, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(cell: Option<&Cell>) -> Option<SortKey> {
        match cell? {
            Cell::Number(Some(n)) => Some(SortKey::Number(*n)),
            Cell::Number(None) => None,
            cell => cell
                .display()
                .filter(|s| !s.is_empty())
                .map(|s| SortKey::Text(s.to_lowercase())),
        }
    }

    fn cmp(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
        }
    }
}

/// Стабильная сортировка по одной колонке; пустые значения всегда в конце.
pub fn sort_rows(rows: &mut Vec<&Row>, sort: &SortSpec) {
    let mut keyed: Vec<(Option<SortKey>, &Row)> = rows
        .iter()
        .map(|row| (SortKey::of(row.cell(&sort.column)), *row))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match sort.order {
            SortOrder::Asc => a.cmp(b),
            SortOrder::Desc => b.cmp(a),
        },
    });

    *rows = keyed.into_iter().map(|(_, row)| row).collect();
}
