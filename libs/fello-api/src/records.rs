use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::de;

// ════════════════════════════════════════════════════════════════
//  List envelope
// ════════════════════════════════════════════════════════════════

/// Ответ list-endpoint'а backend'а: `{ items, amount, next_token }`.
///
/// Каждый элемент `items` разбирается отдельно: элемент, который не
/// является объектом (или не разбирается в `T`), пропускается с
/// предупреждением в лог, остальные записи сохраняются.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub amount: u64,
    pub next_token: String,
}

impl<T> Default for ListResponse<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            amount: 0,
            next_token: String::new(),
        }
    }
}

impl<T> ListResponse<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Deserialize)]
struct RawListResponse {
    #[serde(default, deserialize_with = "raw_items")]
    items: Vec<Value>,
    #[serde(default, deserialize_with = "de::id")]
    amount: i64,
    #[serde(default, deserialize_with = "de::string")]
    next_token: String,
}

fn raw_items<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ListResponse<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Поддержка двух вариантов:
        // 1. {"items":[...],"amount":N,"next_token":"..."}: штатный ответ
        // 2. [...]: голый массив (snapshot-файлы, старые endpoint'ы)
        // null и прочие скаляры: пустой список.
        let raw = Value::deserialize(deserializer)?;
        let envelope = match raw {
            Value::Array(items) => RawListResponse {
                amount: items.len() as i64,
                items,
                next_token: String::new(),
            },
            object @ Value::Object(_) => {
                RawListResponse::deserialize(&object).map_err(serde::de::Error::custom)?
            }
            other => {
                tracing::warn!(value = %other, "list response is not an object or array, using empty list");
                return Ok(ListResponse::default());
            }
        };

        let mut items = Vec::with_capacity(envelope.items.len());
        for (index, item) in envelope.items.iter().enumerate() {
            if !item.is_object() {
                tracing::warn!(index, "skipping list item: not a JSON object");
                continue;
            }
            match T::deserialize(item) {
                Ok(record) => items.push(record),
                Err(e) => tracing::warn!(index, error = %e, "skipping list item"),
            }
        }

        Ok(ListResponse {
            items,
            amount: envelope.amount.max(0) as u64,
            next_token: envelope.next_token,
        })
    }
}

// ════════════════════════════════════════════════════════════════
//  Profiles: Fellow / Finder
// ════════════════════════════════════════════════════════════════

/// Причина изменения, указанная администратором.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusChangeReason {
    #[serde(default, deserialize_with = "de::string")]
    pub reason: String,
    #[serde(default, deserialize_with = "de::string")]
    pub submitting_user_name: String,
}

/// Запись журнала изменений профиля.
///
/// `old_value`/`new_value` у fellow: строки, у finder: объекты
/// `{string: number}`, поэтому хранятся как сырой JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserChangeLog {
    #[serde(default, deserialize_with = "de::id")]
    pub id: i64,
    #[serde(default, rename = "type", deserialize_with = "de::string")]
    pub kind: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub field: Option<String>,
    #[serde(default, deserialize_with = "de::string")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "de::id")]
    pub user_id: i64,
    #[serde(default)]
    pub old_value: Option<Value>,
    #[serde(default)]
    pub new_value: Option<Value>,
    #[serde(default, deserialize_with = "de::lenient_opt")]
    pub reason: Option<StatusChangeReason>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentAccount {
    #[serde(default, deserialize_with = "de::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "de::id")]
    pub user_id: i64,
    #[serde(default, deserialize_with = "de::string")]
    pub account_id: String,
    #[serde(default, deserialize_with = "de::string")]
    pub customer_id: String,
    #[serde(default, deserialize_with = "de::bool_or_false")]
    pub onboarding_complete: bool,
}

/// Профиль помощника в том виде, в каком его отдаёт `/api/admin/fellos/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fellow {
    #[serde(default, deserialize_with = "de::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "de::id")]
    pub profile_id: i64,
    #[serde(default, deserialize_with = "de::string")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub email: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "de::age")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "de::tags")]
    pub challenges: Vec<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "de::string")]
    pub date: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub criminal_offences: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub photo_url: Option<String>,
    #[serde(default, deserialize_with = "de::string")]
    pub partner_organization_code: String,
    #[serde(default, deserialize_with = "de::bool_or_false")]
    pub is_critical_information_modified: bool,
    #[serde(default, deserialize_with = "de::bool_or_false")]
    pub is_stripe_onboarding_complete: bool,
    #[serde(default, deserialize_with = "de::tags")]
    pub verticals_for_approval: Vec<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub last_admin_profile_verification: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_vec")]
    pub user_change_logs: Vec<UserChangeLog>,
    #[serde(default, deserialize_with = "de::lenient_opt")]
    pub payment_account: Option<PaymentAccount>,
}

/// Профиль ищущего помощи. Схема backend'а совпадает с [`Fellow`],
/// отличаются только наборы значений status/gender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Finder {
    #[serde(default, deserialize_with = "de::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "de::id")]
    pub profile_id: i64,
    #[serde(default, deserialize_with = "de::string")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub email: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "de::age")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "de::tags")]
    pub challenges: Vec<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "de::string")]
    pub date: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub criminal_offences: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub photo_url: Option<String>,
    #[serde(default, deserialize_with = "de::string")]
    pub partner_organization_code: String,
    #[serde(default, deserialize_with = "de::bool_or_false")]
    pub is_critical_information_modified: bool,
    #[serde(default, deserialize_with = "de::bool_or_false")]
    pub is_stripe_onboarding_complete: bool,
    #[serde(default, deserialize_with = "de::tags")]
    pub verticals_for_approval: Vec<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub last_admin_profile_verification: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_vec")]
    pub user_change_logs: Vec<UserChangeLog>,
    #[serde(default, deserialize_with = "de::lenient_opt")]
    pub payment_account: Option<PaymentAccount>,
}

// ════════════════════════════════════════════════════════════════
//  Interaction
// ════════════════════════════════════════════════════════════════

/// Сессия между fellow и finder (participant).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(default, deserialize_with = "de::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub fello_status: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub finder_status: Option<String>,
    #[serde(default, deserialize_with = "de::id")]
    pub fello_id: i64,
    #[serde(default, deserialize_with = "de::id")]
    pub finder_id: i64,

    #[serde(default, deserialize_with = "de::string")]
    pub interaction_start_date: String,
    #[serde(default, deserialize_with = "de::string")]
    pub interaction_end_date: String,
    /// Запланированная длительность, минуты.
    #[serde(default, deserialize_with = "de::f64_or_zero")]
    pub duration: f64,
    /// Фактическая длительность, минуты.
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub actual_duration: Option<f64>,
    #[serde(default, deserialize_with = "de::string")]
    pub created_at: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub interaction_finish_date: Option<String>,

    #[serde(default, deserialize_with = "de::opt_string")]
    pub interaction_status: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub last_status_change: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub vertical: Option<String>,

    #[serde(default, deserialize_with = "de::bool_or_false")]
    pub is_payment_pending: bool,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub payment_amount: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub payment_status: Option<String>,
    #[serde(default, deserialize_with = "de::opt_bool")]
    pub is_hidden: Option<bool>,

    #[serde(default, deserialize_with = "de::string")]
    pub fello_name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub fello_email: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub fello_photo_url: Option<String>,
    #[serde(default, deserialize_with = "de::string")]
    pub fello_last_login: String,
    #[serde(default, deserialize_with = "de::id")]
    pub fello_user_profile_id: i64,

    #[serde(default, deserialize_with = "de::string")]
    pub participant_name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub participant_email: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub participant_photo_url: Option<String>,
    #[serde(default, deserialize_with = "de::string")]
    pub participant_last_login: String,
    #[serde(default, deserialize_with = "de::id")]
    pub participant_user_profile_id: i64,

    #[serde(default, deserialize_with = "de::opt_id")]
    pub cancelled_by_user_profile_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub cancellation_reason: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub cancellation_timestamp: Option<String>,

    #[serde(default, deserialize_with = "de::opt_string")]
    pub admin_notes: Option<String>,
    #[serde(default, deserialize_with = "de::opt_bool")]
    pub requires_review: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub review_reason: Option<String>,
}
