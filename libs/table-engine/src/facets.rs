//! Facet Aggregator: value → count по колонке.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use fello_api::Row;

use crate::config::{ColumnDef, ColumnKind, EntityConfig, SelectMode};
use crate::filter::{FilterState, RowFilter};

// ════════════════════════════════════════════════════════════════
//  FacetCounts
// ════════════════════════════════════════════════════════════════

/// Bucket label → count в порядке первого появления.
///
/// Bucket'ы с нулевым count не хранятся. Сериализуется JSON объектом
/// с тем же порядком ключей.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetCounts {
    entries: Vec<(String, usize)>,
}

impl FacetCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count bucket'а; отсутствующий bucket: 0.
    pub fn get(&self, label: &str) -> usize {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map_or(0, |(_, n)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(l, n)| (l.as_str(), *n))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Сумма всех count'ов. Для Tags колонок может превышать число строк.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    fn increment(&mut self, label: &str) {
        self.add(label, 1);
    }

    /// Нулевой `n` не создаёт bucket.
    fn add(&mut self, label: &str, n: usize) {
        if n == 0 {
            return;
        }
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += n,
            None => self.entries.push((label.to_string(), n)),
        }
    }
}

impl Serialize for FacetCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, count) in &self.entries {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

impl<'a> FromIterator<(&'a str, usize)> for FacetCounts {
    fn from_iter<I: IntoIterator<Item = (&'a str, usize)>>(iter: I) -> Self {
        let mut counts = FacetCounts::new();
        for (label, n) in iter {
            counts.add(label, n);
        }
        counts
    }
}

// ════════════════════════════════════════════════════════════════
//  Aggregation
// ════════════════════════════════════════════════════════════════

/// Посчитать facets колонки `column` по строкам `rows`.
///
/// - Range: строка попадает в каждый bucket, чьи включительные границы
///   содержат её значение; строки без числа не считаются.
/// - Tags: каждый элемент массива даёт отдельный +1.
/// - Categorical: одно непустое значение, числа каноническим текстом.
///
/// Колонка, не объявленная в config, считается по форме ячейки
/// (Tags через fan-out, остальное категориально).
pub fn compute_facets<'a>(
    config: &EntityConfig,
    rows: impl IntoIterator<Item = &'a Row>,
    column: &str,
) -> FacetCounts {
    let kind = config
        .column(column)
        .map_or(ColumnKind::Categorical, |c| c.kind);
    let mut counts = FacetCounts::new();

    for row in rows {
        let Some(cell) = row.cell(column) else {
            continue;
        };
        match kind {
            ColumnKind::Range(buckets) => {
                let Some(value) = cell.as_number() else {
                    continue;
                };
                for bucket in buckets.iter().filter(|b| b.contains(value)) {
                    counts.increment(bucket.label);
                }
            }
            ColumnKind::Categorical | ColumnKind::Tags => {
                for key in cell.keys() {
                    counts.increment(&key);
                }
            }
        }
    }
    counts
}

// ════════════════════════════════════════════════════════════════
//  Facet table (filter badges)
// ════════════════════════════════════════════════════════════════

/// Опция фильтра с count'ом для badge'а.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionCount {
    pub value: String,
    pub label: String,
    pub count: usize,
    pub selected: bool,
}

/// Facets одной фильтруемой колонки.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnFacets {
    pub column: &'static str,
    pub title: &'static str,
    pub select: SelectMode,
    /// Объявленные опции в порядке config'а (count может быть 0).
    pub options: Vec<OptionCount>,
    /// Все наблюдённые значения, включая не объявленные в опциях.
    pub counts: FacetCounts,
}

fn column_facets(column: &'static ColumnDef, counts: FacetCounts, state: &FilterState) -> ColumnFacets {
    let selected = state.get(column.key);
    let options = column
        .options
        .iter()
        .map(|o| OptionCount {
            value: o.value.to_string(),
            label: o.label.to_string(),
            count: counts.get(o.value),
            selected: selected.is_some_and(|s| s.contains(o.value)),
        })
        .collect();

    ColumnFacets {
        column: column.key,
        title: column.title,
        select: column.select,
        options,
        counts,
    }
}

/// Facets всех фильтруемых колонок сущности.
///
/// Facets колонки C считаются по строкам, прошедшим все активные
/// фильтры, кроме фильтра самой C: выбор "Status: Active" сужает
/// count'ы Age, но не скрывает соседние опции Status.
pub fn facet_table<'a, I>(config: &EntityConfig, rows: I, state: &FilterState) -> Vec<ColumnFacets>
where
    I: IntoIterator<Item = &'a Row> + Clone,
{
    config
        .filterable_columns()
        .map(|column| {
            let filter = RowFilter::new(config, state, Some(column.key));
            let visible = rows.clone().into_iter().filter(|row| filter.matches(row));
            let counts = compute_facets(config, visible, column.key);
            column_facets(column, counts, state)
        })
        .collect()
}
