//! Per-entity table configuration.
//!
//! Одна generic таблица, три инстанса: fellows, finders, interactions.
//! Всё, что отличает сущности (колонки, bucket'ы, подписи опций,
//! поля поиска), описано здесь статическими данными.

use serde::Serialize;

use fello_api::EntityKind;

use crate::error::TableError;
use crate::filter::FilterState;
use crate::table::SortSpec;

// ════════════════════════════════════════════════════════════════
//  Column model
// ════════════════════════════════════════════════════════════════

/// Именованный числовой диапазон. Границы включительные, `max = None`: без верхней.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bucket {
    pub label: &'static str,
    pub min: f64,
    pub max: Option<f64>,
}

impl Bucket {
    pub const fn new(label: &'static str, min: f64, max: Option<f64>) -> Self {
        Self { label, min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && self.max.is_none_or(|max| value <= max)
    }
}

/// Возрастные bucket'ы, общие для fellows и finders.
pub static AGE_BUCKETS: [Bucket; 4] = [
    Bucket::new("18-30", 18.0, Some(30.0)),
    Bucket::new("31-40", 31.0, Some(40.0)),
    Bucket::new("41-50", 41.0, Some(50.0)),
    Bucket::new("51plus", 51.0, None),
];

/// Правило bucketing'а колонки для facets и фильтров.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "buckets", rename_all = "snake_case")]
pub enum ColumnKind {
    /// Скалярное значение, один bucket на строку.
    Categorical,
    /// Массив значений, каждый элемент: свой bucket.
    Tags,
    /// Число, раскладывается по именованным диапазонам.
    Range(&'static [Bucket]),
}

/// Режим выбора опций в фильтре (как в toolbar'е dashboard'а).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectMode {
    Single,
    Multi,
}

/// Опция фильтра: сырое значение + подпись.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub value: &'static str,
    pub label: &'static str,
}

const fn opt(value: &'static str, label: &'static str) -> FilterOption {
    FilterOption { value, label }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnDef {
    pub key: &'static str,
    pub title: &'static str,
    pub kind: ColumnKind,
    pub select: SelectMode,
    /// Опции фильтра. Пустой список: колонка не фильтруется из UI.
    pub options: &'static [FilterOption],
    pub sortable: bool,
}

impl ColumnDef {
    const fn plain(key: &'static str, title: &'static str) -> Self {
        Self {
            key,
            title,
            kind: ColumnKind::Categorical,
            select: SelectMode::Multi,
            options: &[],
            sortable: true,
        }
    }

    const fn filter(
        key: &'static str,
        title: &'static str,
        kind: ColumnKind,
        select: SelectMode,
        options: &'static [FilterOption],
    ) -> Self {
        Self {
            key,
            title,
            kind,
            select,
            options,
            sortable: true,
        }
    }

    const fn unsorted(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn is_filterable(&self) -> bool {
        !self.options.is_empty() || matches!(self.kind, ColumnKind::Range(_))
    }

    pub fn buckets(&self) -> &'static [Bucket] {
        match self.kind {
            ColumnKind::Range(buckets) => buckets,
            _ => &[],
        }
    }

    pub fn option_label(&self, value: &str) -> Option<&'static str> {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label)
    }
}

/// Конфигурация таблицы одной сущности.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntityConfig {
    pub kind: EntityKind,
    pub title: &'static str,
    pub columns: &'static [ColumnDef],
    /// Колонки, по которым идёт текстовый поиск (`q`).
    pub search_fields: &'static [&'static str],
}

impl EntityConfig {
    pub fn for_kind(kind: EntityKind) -> &'static EntityConfig {
        match kind {
            EntityKind::Fellows => &FELLOWS,
            EntityKind::Finders => &FINDERS,
            EntityKind::Interactions => &INTERACTIONS,
        }
    }

    pub fn column(&self, key: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn filterable_columns(&self) -> impl Iterator<Item = &'static ColumnDef> {
        self.columns.iter().filter(|c| c.is_filterable())
    }

    /// Проверка FilterState на входе (HTTP/CLI): колонка должна быть
    /// объявлена, а для Range: метки должны совпадать с bucket'ами.
    ///
    /// Значения категориальных колонок не проверяются по списку опций:
    /// backend может прислать статус, которого нет в подписях.
    pub fn validate(&self, state: &FilterState) -> Result<(), TableError> {
        for (key, values) in state.iter() {
            let column = self.column(key).ok_or_else(|| TableError::UnknownColumn {
                entity: self.kind,
                column: key.to_string(),
            })?;
            if let ColumnKind::Range(buckets) = column.kind {
                for value in values {
                    if !buckets.iter().any(|b| b.label == value.as_str()) {
                        return Err(TableError::UnknownBucket {
                            column: key.to_string(),
                            label: value.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn validate_sort(&self, sort: &SortSpec) -> Result<(), TableError> {
        match self.column(&sort.column) {
            Some(c) if c.sortable => Ok(()),
            Some(_) => Err(TableError::NotSortable(sort.column.clone())),
            None => Err(TableError::UnknownColumn {
                entity: self.kind,
                column: sort.column.clone(),
            }),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Column keys
// ════════════════════════════════════════════════════════════════

pub mod keys {
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const STATUS: &str = "status";
    pub const GENDER: &str = "gender";
    pub const AGE: &str = "age";
    pub const CHALLENGES: &str = "challenges";
    pub const RATING: &str = "rating";
    pub const CRIMINAL_OFFENCES: &str = "criminal_offences";
    pub const DATE: &str = "date";
    pub const ORGANIZATION: &str = "organization";
    pub const VERIFICATION: &str = "verification_status";
    pub const PAYMENTS: &str = "payments";

    pub const INTERACTION_STATUS: &str = "interaction_status";
    pub const VERTICAL: &str = "vertical";
    pub const DURATION: &str = "duration";
    pub const ACTUAL_DURATION: &str = "actual_duration";
    pub const PAYMENT_STATUS: &str = "payment_status";
    pub const START_DATE: &str = "interaction_start_date";
    pub const FINISH_DATE: &str = "interaction_finish_date";
    pub const CREATED_AT: &str = "created_at";
    pub const FELLO_NAME: &str = "fello_name";
    pub const FELLO_EMAIL: &str = "fello_email";
    pub const PARTICIPANT_NAME: &str = "participant_name";
    pub const PARTICIPANT_EMAIL: &str = "participant_email";
    pub const PAYMENT_PENDING: &str = "is_payment_pending";
}

use keys::*;

// ════════════════════════════════════════════════════════════════
//  Shared options
// ════════════════════════════════════════════════════════════════

static CHALLENGE_OPTIONS: [FilterOption; 4] = [
    opt("alcohol_use", "Alcohol Use"),
    opt("drug_use", "Drug Use"),
    opt("parenting", "Parenting"),
    opt("relationships", "Relationships"),
];

static AGE_OPTIONS: [FilterOption; 4] = [
    opt("18-30", "18-30"),
    opt("31-40", "31-40"),
    opt("41-50", "41-50"),
    opt("51plus", "51+"),
];

static RATING_OPTIONS: [FilterOption; 3] = [
    opt("new", "New"),
    opt("1-3", "1-3"),
    opt("3-5", "3-5"),
];

static OFFENCE_OPTIONS: [FilterOption; 2] = [opt("no", "No"), opt("yes", "Yes")];

// ════════════════════════════════════════════════════════════════
//  Fellows
// ════════════════════════════════════════════════════════════════

static FELLOW_STATUSES: [FilterOption; 16] = [
    opt("signed_up", "Signed Up"),
    opt("application_in_progress", "Application in Progress"),
    opt("stale", "Stale"),
    opt("pending_application_review", "Pending Application Review"),
    opt("application_under_review", "Application Under Review"),
    opt("additional_information_needed", "Additional Information Needed"),
    opt("pending_meet_and_greet", "Pending Meet and Greet"),
    opt("reference_check_required", "Reference Check Required"),
    opt("background_check_required", "Background Check Required"),
    opt("training_required", "Training Required"),
    opt("pending_bio_update", "Pending Bio Update"),
    opt("pending_platform_agreement", "Pending Platform Agreement"),
    opt("active", "Active"),
    opt("deactivated", "Deactivated"),
    opt("not_proceeding_with_fello", "Not Proceeding with Fello"),
    opt("pending_deletion", "Pending Deletion"),
];

static FELLOW_GENDERS: [FilterOption; 5] = [
    opt("Male", "Male"),
    opt("Female", "Female"),
    opt("Non-binary", "Non-binary"),
    opt("Prefer to self-describe", "Self Described"),
    opt("Decline to state", "Declined"),
];

static FELLOW_COLUMNS: [ColumnDef; 12] = [
    ColumnDef::plain(NAME, "Name"),
    ColumnDef::filter(STATUS, "Status", ColumnKind::Categorical, SelectMode::Multi, &FELLOW_STATUSES),
    ColumnDef::filter(RATING, "Rating", ColumnKind::Categorical, SelectMode::Single, &RATING_OPTIONS),
    ColumnDef::plain(VERIFICATION, "Verification"),
    ColumnDef::plain(PAYMENTS, "Payments"),
    ColumnDef::plain(EMAIL, "Email"),
    ColumnDef::filter(CHALLENGES, "Challenges", ColumnKind::Tags, SelectMode::Multi, &CHALLENGE_OPTIONS)
        .unsorted(),
    ColumnDef::filter(AGE, "Age", ColumnKind::Range(&AGE_BUCKETS), SelectMode::Single, &AGE_OPTIONS),
    ColumnDef::filter(GENDER, "Gender", ColumnKind::Categorical, SelectMode::Single, &FELLOW_GENDERS),
    ColumnDef::filter(
        CRIMINAL_OFFENCES,
        "Criminal Offences",
        ColumnKind::Categorical,
        SelectMode::Single,
        &OFFENCE_OPTIONS,
    ),
    ColumnDef::plain(DATE, "Sign Up Date"),
    ColumnDef::plain(ORGANIZATION, "Organization"),
];

pub static FELLOWS: EntityConfig = EntityConfig {
    kind: EntityKind::Fellows,
    title: "Fellows",
    columns: &FELLOW_COLUMNS,
    search_fields: &[NAME],
};

// ════════════════════════════════════════════════════════════════
//  Finders
// ════════════════════════════════════════════════════════════════

static FINDER_STATUSES: [FilterOption; 10] = [
    opt("signed_up", "Signed Up"),
    opt("active", "Active"),
    opt("deactivated", "Deactivated"),
    opt("pending_deletion", "Pending Deletion"),
    opt("background_check_required", "Background Check Required"),
    opt("training_required", "Training Required"),
    opt("pending_review", "Pending Review"),
    opt("under_review", "Under Review"),
    opt("additional_info_needed", "Additional Info Needed"),
    opt("pending_verification", "Pending Verification"),
];

static FINDER_GENDERS: [FilterOption; 5] = [
    opt("male", "Male"),
    opt("female", "Female"),
    opt("non_binary", "Non-binary"),
    opt("other", "Other"),
    opt("decline_to_state", "Declined to State"),
];

static FINDER_COLUMNS: [ColumnDef; 10] = [
    ColumnDef::plain(NAME, "Name"),
    ColumnDef::filter(STATUS, "Status", ColumnKind::Categorical, SelectMode::Multi, &FINDER_STATUSES),
    ColumnDef::plain(EMAIL, "Email"),
    ColumnDef::plain(DATE, "Sign Up Date"),
    ColumnDef::filter(RATING, "Rating", ColumnKind::Categorical, SelectMode::Single, &RATING_OPTIONS),
    ColumnDef::filter(CHALLENGES, "Challenges", ColumnKind::Tags, SelectMode::Multi, &CHALLENGE_OPTIONS)
        .unsorted(),
    ColumnDef::filter(AGE, "Age", ColumnKind::Range(&AGE_BUCKETS), SelectMode::Single, &AGE_OPTIONS),
    ColumnDef::filter(GENDER, "Gender", ColumnKind::Categorical, SelectMode::Single, &FINDER_GENDERS),
    ColumnDef::filter(
        CRIMINAL_OFFENCES,
        "Criminal Offences",
        ColumnKind::Categorical,
        SelectMode::Single,
        &OFFENCE_OPTIONS,
    ),
    ColumnDef::plain(ORGANIZATION, "Organization"),
];

pub static FINDERS: EntityConfig = EntityConfig {
    kind: EntityKind::Finders,
    title: "Finders",
    columns: &FINDER_COLUMNS,
    search_fields: &[NAME],
};

// ════════════════════════════════════════════════════════════════
//  Interactions
// ════════════════════════════════════════════════════════════════

static INTERACTION_STATUSES: [FilterOption; 8] = [
    opt("completed", "Completed"),
    opt("cancelled_by_admin", "Cancelled by Admin"),
    opt("cancelled_by_fello", "Cancelled by Fello"),
    opt("cancelled_by_participant", "Cancelled by Participant"),
    opt("escalated", "Escalated"),
    opt("upcoming", "Upcoming"),
    opt("no_show_fello", "Fello No-Show"),
    opt("no_show_participant", "Participant No-Show"),
];

static DURATION_OPTIONS: [FilterOption; 5] = [
    opt("15", "15 minutes"),
    opt("30", "30 minutes"),
    opt("45", "45 minutes"),
    opt("60", "60 minutes"),
    opt("75", "75 minutes"),
];

static PAYMENT_OPTIONS: [FilterOption; 2] = [
    opt("pending", "Payment Pending"),
    opt("completed", "Payment Completed"),
];

static INTERACTION_COLUMNS: [ColumnDef; 13] = [
    ColumnDef::plain(START_DATE, "Start Date"),
    ColumnDef::filter(DURATION, "Scheduled Duration", ColumnKind::Categorical, SelectMode::Multi, &DURATION_OPTIONS),
    ColumnDef::plain(ACTUAL_DURATION, "Actual Duration"),
    ColumnDef::plain(FELLO_NAME, "Fello"),
    ColumnDef::plain(PARTICIPANT_NAME, "Participant"),
    ColumnDef::plain(FELLO_EMAIL, "Fello Email"),
    ColumnDef::plain(PARTICIPANT_EMAIL, "Participant Email"),
    ColumnDef::filter(
        INTERACTION_STATUS,
        "Status",
        ColumnKind::Categorical,
        SelectMode::Multi,
        &INTERACTION_STATUSES,
    ),
    ColumnDef::filter(VERTICAL, "Vertical", ColumnKind::Categorical, SelectMode::Multi, &CHALLENGE_OPTIONS),
    ColumnDef::filter(PAYMENT_STATUS, "Payment", ColumnKind::Categorical, SelectMode::Multi, &PAYMENT_OPTIONS),
    ColumnDef::plain(PAYMENT_PENDING, "Payment Pending"),
    ColumnDef::plain(CREATED_AT, "Created Date"),
    ColumnDef::plain(FINISH_DATE, "Finish Date"),
];

pub static INTERACTIONS: EntityConfig = EntityConfig {
    kind: EntityKind::Interactions,
    title: "Interactions",
    columns: &INTERACTION_COLUMNS,
    search_fields: &[FELLO_NAME, PARTICIPANT_NAME, FELLO_EMAIL, PARTICIPANT_EMAIL],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_buckets_are_inclusive() {
        let b = &AGE_BUCKETS;
        assert!(b[0].contains(18.0) && b[0].contains(30.0));
        assert!(!b[0].contains(31.0));
        assert!(b[1].contains(31.0) && b[1].contains(40.0));
        assert!(b[3].contains(51.0) && b[3].contains(99.0));
        assert!(!b.iter().any(|bucket| bucket.contains(17.0)));
    }

    #[test]
    fn every_entity_has_unique_column_keys() {
        for kind in EntityKind::ALL {
            let config = EntityConfig::for_kind(kind);
            let mut keys: Vec<_> = config.columns.iter().map(|c| c.key).collect();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), config.columns.len(), "{kind}");
            for field in config.search_fields {
                assert!(config.column(field).is_some(), "{kind}: {field}");
            }
        }
    }

    #[test]
    fn validate_rejects_unknown_column_and_bucket() {
        let mut state = FilterState::new();
        state.set("age", ["18-30"]);
        assert!(FELLOWS.validate(&state).is_ok());

        state.set("age", ["teen"]);
        assert!(matches!(
            FELLOWS.validate(&state),
            Err(TableError::UnknownBucket { .. })
        ));

        let mut state = FilterState::new();
        state.set("shoe_size", ["42"]);
        assert!(matches!(
            INTERACTIONS.validate(&state),
            Err(TableError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn validate_sort_requires_sortable_column() {
        assert!(FINDERS.validate_sort(&SortSpec::asc("name")).is_ok());
        assert!(matches!(
            FINDERS.validate_sort(&SortSpec::asc("challenges")),
            Err(TableError::NotSortable(_))
        ));
    }

    #[test]
    fn option_labels_resolve() {
        let status = FELLOWS.column(STATUS).unwrap();
        assert_eq!(status.option_label("active"), Some("Active"));
        assert_eq!(FELLOWS.column(AGE).unwrap().option_label("51plus"), Some("51+"));
        assert!(FELLOWS.column(NAME).unwrap().buckets().is_empty());
    }
}
