//! Форматирование значений для отображения.

use chrono::DateTime;

use fello_api::{Cell, canonical_number};

use crate::config::keys::{ACTUAL_DURATION, CREATED_AT, DATE, DURATION, FINISH_DATE, START_DATE};

/// Placeholder для отсутствующего значения.
pub const NOT_AVAILABLE: &str = "N/A";

/// Дата "0" backend'а (unix epoch в America/New_York): значит "не задано".
const EPOCH_SENTINEL: &str = "1969-12-31T19:00:00-05:00";

/// Минуты → `45min`, `1h`, `1h 15min`. Ноль, отрицательное и NaN → `N/A`.
pub fn format_duration(minutes: Option<f64>) -> String {
    let Some(minutes) = minutes.filter(|m| *m > 0.0) else {
        return NOT_AVAILABLE.to_string();
    };
    let minutes = minutes.round() as u64;
    if minutes < 60 {
        return format!("{minutes}min");
    }
    let (hours, rest) = (minutes / 60, minutes % 60);
    if rest > 0 {
        format!("{hours}h {rest}min")
    } else {
        format!("{hours}h")
    }
}

/// RFC 3339 → `Mar 5, 2024, 2:30 PM` в offset'е исходной строки.
/// Пустая строка, epoch-заглушка и неразбираемое значение → `N/A`.
pub fn format_date_time(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() || value == EPOCH_SENTINEL {
        return NOT_AVAILABLE.to_string();
    }
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt.format("%b %-d, %Y, %-I:%M %p").to_string(),
        Err(_) => NOT_AVAILABLE.to_string(),
    }
}

/// Interaction "короткая": фактическая длительность меньше 80% плановой.
pub fn is_short_interaction(scheduled: f64, actual: Option<f64>) -> bool {
    actual.is_some_and(|actual| actual > 0.0 && actual < scheduled * 0.8)
}

/// `alcohol_use` → `alcohol use`.
pub fn humanize(value: &str) -> String {
    value.replace('_', " ")
}

/// Текст ячейки для табличного вывода: даты и длительности
/// форматируются по колонке, теги через запятую, пустое как `N/A`.
pub fn display_cell(column: &str, cell: Option<&Cell>) -> String {
    let Some(cell) = cell.filter(|c| !c.is_empty()) else {
        return NOT_AVAILABLE.to_string();
    };
    match (column, cell) {
        (DATE | START_DATE | FINISH_DATE | CREATED_AT, Cell::Text(Some(s))) => format_date_time(s),
        (DURATION | ACTUAL_DURATION, _) => format_duration(cell.as_number()),
        (_, Cell::Tags(tags)) => tags.iter().map(|t| humanize(t)).collect::<Vec<_>>().join(", "),
        (_, Cell::Number(Some(n))) => canonical_number(*n),
        (_, Cell::Text(Some(s))) => s.clone(),
        _ => NOT_AVAILABLE.to_string(),
    }
}
