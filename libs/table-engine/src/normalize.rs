//! Record Normalizer: backend record → [`Row`].
//!
//! Нормализация тотальна: отсутствующие/кривые поля превращаются в
//! документированные default'ы (пустой массив тегов, `null` для
//! неизвестных категорий), ошибок нет.

use serde::de::DeserializeOwned;
use serde_json::Value;

use fello_api::{Cell, EntityKind, Fellow, Finder, Interaction, Row};

use crate::config::keys::*;

/// Сущность backend'а, которую можно показать в таблице.
pub trait Entity: DeserializeOwned + Default + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn row_id(&self) -> String;

    fn to_row(&self) -> Row;
}

/// Нормализовать сырой JSON объект. Неразбираемый вход даёт строку
/// из default-записи (с предупреждением в лог), а не ошибку.
pub fn normalize<E: Entity>(raw: &Value) -> Row {
    match E::deserialize(raw) {
        Ok(record) => record.to_row(),
        Err(e) => {
            tracing::warn!(entity = %E::KIND, error = %e, "malformed record, using defaults");
            E::default().to_row()
        }
    }
}

pub fn normalize_all<E: Entity>(records: &[E]) -> Vec<Row> {
    records.iter().map(Entity::to_row).collect()
}

// ════════════════════════════════════════════════════════════════
//  Field rules
// ════════════════════════════════════════════════════════════════

/// Rating → bucket фильтра: `new`, `1-3`, `3-5`.
///
/// Метки bucket'ов проходят как есть; число раскладывается
/// `1 <= r < 3` → `1-3`, `3 <= r <= 5` → `3-5`; остальное: None.
pub fn rating_bucket(raw: Option<&str>) -> Option<&'static str> {
    let raw = raw?.trim();
    match raw.to_ascii_lowercase().as_str() {
        "new" => return Some("new"),
        "1-3" => return Some("1-3"),
        "3-5" => return Some("3-5"),
        _ => {}
    }
    let r: f64 = raw.parse().ok()?;
    if (1.0..3.0).contains(&r) {
        Some("1-3")
    } else if (3.0..=5.0).contains(&r) {
        Some("3-5")
    } else {
        None
    }
}

/// Флаг судимости → `yes`/`no`, остальное: None.
pub fn offence_flag(raw: Option<&str>) -> Option<&'static str> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" => Some("yes"),
        "no" | "false" => Some("no"),
        _ => None,
    }
}

/// Удалить дубликаты, сохранив порядок первого вхождения.
pub fn dedup_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !tag.is_empty() && !out.contains(tag) {
            out.push(tag.clone());
        }
    }
    out
}

fn text(value: &str) -> Cell {
    opt_text(Some(value))
}

fn opt_text(value: Option<&str>) -> Cell {
    Cell::Text(value.filter(|s| !s.is_empty()).map(String::from))
}

fn yes_no(value: bool) -> Cell {
    Cell::text(if value { "yes" } else { "no" })
}

// ════════════════════════════════════════════════════════════════
//  Profiles
// ════════════════════════════════════════════════════════════════

/// Общие поля профилей fellow/finder.
struct Profile<'a> {
    id: String,
    name: &'a str,
    email: &'a str,
    status: Option<&'a str>,
    gender: Option<&'a str>,
    age: Option<u32>,
    challenges: &'a [String],
    rating: Option<&'a str>,
    criminal_offences: Option<&'a str>,
    date: &'a str,
    organization: &'a str,
}

impl Profile<'_> {
    fn into_row(self) -> Row {
        Row::new(self.id)
            .with(NAME, text(self.name))
            .with(EMAIL, text(self.email))
            .with(STATUS, opt_text(self.status))
            .with(GENDER, opt_text(self.gender))
            .with(AGE, Cell::Number(self.age.map(f64::from)))
            .with(CHALLENGES, Cell::Tags(dedup_tags(self.challenges)))
            .with(RATING, opt_text(rating_bucket(self.rating)))
            .with(CRIMINAL_OFFENCES, opt_text(offence_flag(self.criminal_offences)))
            .with(DATE, text(self.date))
            .with(ORGANIZATION, text(self.organization))
    }
}

impl Entity for Fellow {
    const KIND: EntityKind = EntityKind::Fellows;

    fn row_id(&self) -> String {
        self.id.to_string()
    }

    fn to_row(&self) -> Row {
        let verification = if self.last_admin_profile_verification.is_some() {
            "Verified"
        } else {
            "Pending"
        };
        let payments = if self.is_stripe_onboarding_complete {
            "Complete"
        } else {
            "Pending"
        };

        Profile {
            id: self.row_id(),
            name: &self.name,
            email: &self.email,
            status: self.status.as_deref(),
            gender: self.gender.as_deref(),
            age: self.age,
            challenges: &self.challenges,
            rating: self.rating.as_deref(),
            criminal_offences: self.criminal_offences.as_deref(),
            date: &self.date,
            organization: &self.partner_organization_code,
        }
        .into_row()
        .with(VERIFICATION, Cell::text(verification))
        .with(PAYMENTS, Cell::text(payments))
    }
}

impl Entity for Finder {
    const KIND: EntityKind = EntityKind::Finders;

    fn row_id(&self) -> String {
        self.id.to_string()
    }

    fn to_row(&self) -> Row {
        Profile {
            id: self.row_id(),
            name: &self.name,
            email: &self.email,
            status: self.status.as_deref(),
            gender: self.gender.as_deref(),
            age: self.age,
            challenges: &self.challenges,
            rating: self.rating.as_deref(),
            criminal_offences: self.criminal_offences.as_deref(),
            date: &self.date,
            organization: &self.partner_organization_code,
        }
        .into_row()
    }
}

// ════════════════════════════════════════════════════════════════
//  Interactions
// ════════════════════════════════════════════════════════════════

impl Entity for Interaction {
    const KIND: EntityKind = EntityKind::Interactions;

    fn row_id(&self) -> String {
        self.id.to_string()
    }

    fn to_row(&self) -> Row {
        // payment_status опционален в API; без него статус выводится
        // из is_payment_pending, иначе фильтр "Payment Pending" пуст.
        let payment_status = self
            .payment_status
            .as_deref()
            .or(self.is_payment_pending.then_some("pending"));
        let duration = Some(self.duration).filter(|d| *d > 0.0);

        Row::new(self.row_id())
            .with(START_DATE, text(&self.interaction_start_date))
            .with(DURATION, Cell::Number(duration))
            .with(ACTUAL_DURATION, Cell::Number(self.actual_duration))
            .with(FELLO_NAME, text(&self.fello_name))
            .with(PARTICIPANT_NAME, text(&self.participant_name))
            .with(FELLO_EMAIL, text(&self.fello_email))
            .with(PARTICIPANT_EMAIL, text(&self.participant_email))
            .with(INTERACTION_STATUS, opt_text(self.interaction_status.as_deref()))
            .with(VERTICAL, opt_text(self.vertical.as_deref()))
            .with(PAYMENT_STATUS, opt_text(payment_status))
            .with(PAYMENT_PENDING, yes_no(self.is_payment_pending))
            .with(CREATED_AT, text(&self.created_at))
            .with(FINISH_DATE, opt_text(self.interaction_finish_date.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_challenges_become_empty_tags() {
        let row = normalize::<Fellow>(&json!({"id": 3, "name": "Ana", "status": "active"}));
        assert_eq!(row.cell(CHALLENGES), Some(&Cell::Tags(Vec::new())));
        assert_eq!(row.id, "3");
    }

    #[test]
    fn null_challenges_become_empty_tags() {
        let row = normalize::<Finder>(&json!({"id": 4, "challenges": null}));
        assert_eq!(row.cell(CHALLENGES), Some(&Cell::Tags(Vec::new())));
    }

    #[test]
    fn age_from_string_and_garbage() {
        let row = normalize::<Finder>(&json!({"id": 1, "age": "37"}));
        assert_eq!(row.number(AGE), Some(37.0));

        let row = normalize::<Finder>(&json!({"id": 2, "age": "n/a"}));
        assert_eq!(row.cell(AGE), Some(&Cell::Number(None)));
    }

    #[test]
    fn non_object_input_yields_default_row() {
        let row = normalize::<Fellow>(&json!("garbage"));
        assert_eq!(row.id, "0");
        assert_eq!(row.cell(STATUS), Some(&Cell::Text(None)));
        assert_eq!(row.cell(CHALLENGES), Some(&Cell::Tags(Vec::new())));
    }

    #[test]
    fn empty_status_is_null() {
        let row = normalize::<Fellow>(&json!({"id": 1, "status": ""}));
        assert_eq!(row.cell(STATUS), Some(&Cell::Text(None)));
    }

    #[test]
    fn rating_buckets() {
        assert_eq!(rating_bucket(Some("new")), Some("new"));
        assert_eq!(rating_bucket(Some("1-3")), Some("1-3"));
        assert_eq!(rating_bucket(Some("2.5")), Some("1-3"));
        assert_eq!(rating_bucket(Some("3")), Some("3-5"));
        assert_eq!(rating_bucket(Some("5.0")), Some("3-5"));
        assert_eq!(rating_bucket(Some("0.5")), None);
        assert_eq!(rating_bucket(Some("excellent")), None);
        assert_eq!(rating_bucket(None), None);
    }

    #[test]
    fn offence_flags() {
        assert_eq!(offence_flag(Some("No")), Some("no"));
        assert_eq!(offence_flag(Some("yes")), Some("yes"));
        assert_eq!(offence_flag(Some("maybe")), None);
    }

    #[test]
    fn tags_are_deduplicated_in_order() {
        let row = normalize::<Fellow>(&json!({
            "id": 1,
            "challenges": ["parenting", "alcohol_use", "parenting"]
        }));
        assert_eq!(row.tags(CHALLENGES), ["parenting", "alcohol_use"].map(String::from));
    }

    #[test]
    fn fellow_row_derives_verification_and_payments() {
        let fellow = Fellow {
            id: 5,
            last_admin_profile_verification: Some("2024-05-01".into()),
            ..Fellow::default()
        };
        let row = fellow.to_row();
        assert_eq!(row.text(VERIFICATION), Some("Verified"));
        assert_eq!(row.text(PAYMENTS), Some("Pending"));
    }

    #[test]
    fn interaction_payment_status_falls_back_to_pending_flag() {
        let row = normalize::<Interaction>(&json!({
            "id": 9,
            "duration": 30,
            "is_payment_pending": true,
            "interaction_status": "completed"
        }));
        assert_eq!(row.text(PAYMENT_STATUS), Some("pending"));
        assert_eq!(row.number(DURATION), Some(30.0));
        assert_eq!(row.text(PAYMENT_PENDING), Some("yes"));

        let row = normalize::<Interaction>(&json!({"id": 10, "payment_status": "completed"}));
        assert_eq!(row.text(PAYMENT_STATUS), Some("completed"));
        assert_eq!(row.cell(DURATION), Some(&Cell::Number(None)));
    }
}
