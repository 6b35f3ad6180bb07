use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use fello_api::Row;

/// Выбранные строки таблицы (по id).
///
/// Не зависит от фильтров: строка, скрытая фильтром, остаётся выбранной.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I: IntoIterator<Item = S>, S: Into<String>>(ids: I) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Чекбокс в заголовке: если страница выбрана целиком, снять выбор
    /// со всей страницы, иначе выбрать всю страницу.
    pub fn toggle_page(&mut self, page: &[Row]) {
        if self.all_selected(page) {
            for row in page {
                self.ids.remove(&row.id);
            }
        } else {
            self.ids.extend(page.iter().map(|row| row.id.clone()));
        }
    }

    pub fn all_selected(&self, page: &[Row]) -> bool {
        !page.is_empty() && page.iter().all(|row| self.is_selected(&row.id))
    }

    /// Часть строк страницы выбрана, но не все (indeterminate).
    pub fn some_selected(&self, page: &[Row]) -> bool {
        page.iter().any(|row| self.is_selected(&row.id)) && !self.all_selected(page)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Состояние чекбокса в заголовке для страницы `page`.
    pub fn page_state(&self, page: &[Row]) -> PageSelection {
        PageSelection {
            selected: self.len(),
            on_page: page.iter().filter(|row| self.is_selected(&row.id)).count(),
            all_on_page: self.all_selected(page),
            some_on_page: self.some_selected(page),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageSelection {
    /// Всего выбрано, включая строки вне страницы и скрытые фильтром.
    pub selected: usize,
    pub on_page: usize,
    pub all_on_page: bool,
    pub some_on_page: bool,
}
