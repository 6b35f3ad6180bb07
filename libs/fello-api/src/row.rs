use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;

/// Значение одной колонки нормализованной строки.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Категориальное значение (status, gender, ...). None = отсутствует.
    Text(Option<String>),
    /// Числовое значение (age, duration, ...). None = отсутствует.
    Number(Option<f64>),
    /// Многозначное поле (challenges, verticals).
    Tags(Vec<String>),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(Some(value.into()))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Text(v) => v.as_deref().is_none_or(str::is_empty),
            Cell::Number(v) => v.is_none(),
            Cell::Tags(v) => v.is_empty(),
        }
    }

    /// Числовое значение; числовые строки тоже распознаются.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => *v,
            Cell::Text(Some(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(Some(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_tags(&self) -> &[String] {
        match self {
            Cell::Tags(v) => v,
            _ => &[],
        }
    }

    /// Ключи значения для faceting'а и фильтрации по набору.
    ///
    /// Text: одно непустое значение, Number: каноническая строка
    /// числа, Tags: каждый элемент. Пустые значения ключей не дают.
    pub fn keys(&self) -> Vec<Cow<'_, str>> {
        match self {
            Cell::Text(Some(s)) if !s.is_empty() => vec![Cow::Borrowed(s.as_str())],
            Cell::Text(_) => Vec::new(),
            Cell::Number(Some(n)) => vec![Cow::Owned(canonical_number(*n))],
            Cell::Number(None) => Vec::new(),
            Cell::Tags(v) => v
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| Cow::Borrowed(s.as_str()))
                .collect(),
        }
    }

    /// Текстовое представление для поиска и сортировки.
    pub fn display(&self) -> Option<Cow<'_, str>> {
        match self {
            Cell::Text(Some(s)) => Some(Cow::Borrowed(s.as_str())),
            Cell::Number(Some(n)) => Some(Cow::Owned(canonical_number(*n))),
            Cell::Tags(v) if !v.is_empty() => Some(Cow::Owned(v.join(", "))),
            _ => None,
        }
    }
}

/// Каноническая строка числа: целые: без дробной части (`30`, не `30.0`).
pub fn canonical_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Нормализованная строка таблицы.
///
/// Единая форма для fellows/finders/interactions: стабильный id и набор
/// типизированных ячеек по ключу колонки. Строки не мутируются после
/// построения: при refresh набор заменяется целиком.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub id: String,
    pub cells: BTreeMap<String, Cell>,
}

impl Row {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Builder: добавить ячейку.
    pub fn with(mut self, key: &str, cell: Cell) -> Self {
        self.cells.insert(key.to_string(), cell);
        self
    }

    pub fn cell(&self, key: &str) -> Option<&Cell> {
        self.cells.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.cell(key).and_then(Cell::as_text)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.cell(key).and_then(Cell::as_number)
    }

    pub fn tags(&self, key: &str) -> &[String] {
        self.cell(key).map(Cell::as_tags).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_skip_empty_values() {
        assert!(Cell::Text(Some(String::new())).keys().is_empty());
        assert!(Cell::Text(None).keys().is_empty());
        assert!(Cell::Number(None).keys().is_empty());
        assert_eq!(Cell::Number(Some(30.0)).keys(), vec!["30"]);
        assert_eq!(
            Cell::Tags(vec!["a".into(), String::new(), "b".into()]).keys(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn canonical_number_drops_integral_fraction() {
        assert_eq!(canonical_number(45.0), "45");
        assert_eq!(canonical_number(4.5), "4.5");
        assert_eq!(canonical_number(-3.0), "-3");
    }

    #[test]
    fn row_accessors() {
        let row = Row::new("1")
            .with("status", Cell::text("active"))
            .with("age", Cell::Number(Some(25.0)))
            .with("challenges", Cell::Tags(vec!["parenting".into()]));

        assert_eq!(row.text("status"), Some("active"));
        assert_eq!(row.number("age"), Some(25.0));
        assert_eq!(row.tags("challenges"), ["parenting".to_string()]);
        assert!(row.tags("missing").is_empty());
        assert_eq!(row.cell("missing"), None);
    }

    #[test]
    fn row_serializes_cells_flat() {
        let row = Row::new("9")
            .with("gender", Cell::Text(None))
            .with("age", Cell::Number(Some(40.0)));
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["cells"]["gender"], serde_json::Value::Null);
        assert_eq!(json["cells"]["age"], 40.0);
    }
}
