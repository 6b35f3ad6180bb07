use fello_api::EntityKind;

/// Ошибки входа table-engine (валидация запроса, загрузка snapshot'а).
///
/// Сами filter/facet функции тотальны и ошибок не возвращают.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("{entity}: unknown column '{column}'")]
    UnknownColumn { entity: EntityKind, column: String },

    #[error("column '{column}': unknown bucket '{label}'")]
    UnknownBucket { column: String, label: String },

    #[error("column '{0}' is not sortable")]
    NotSortable(String),

    #[error("snapshot ({context}): {detail}")]
    Snapshot { context: &'static str, detail: String },
}
