//! Data-access слой: REST клиент admin API backend'а.
//!
//! Контекст запроса (base URL, bearer token, timezone) передаётся явно
//! через [`ApiContext`], глобального session state нет.

mod error;

pub use error::ClientError;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use fello_api::{EntityKind, Fellow, Finder, Interaction, ListResponse};

pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const TIMEZONE_HEADER: &str = "x-user-timezone";
/// Верхняя граница `interaction_window_days` (10 лет).
pub const MAX_WINDOW_DAYS: i64 = 3650;

// ════════════════════════════════════════════════════════════════
//  Context
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiContext {
    pub base_url: String,
    /// Без token'а запрос уходит без `Authorization` (backend ответит 401).
    pub token: Option<String>,
    pub timezone: String,
}

impl ApiContext {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url.trim_end_matches('/'))
    }
}

/// Лимиты list-запросов.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FetchLimits {
    #[serde(default = "default_list_limit")]
    pub fellows: usize,
    #[serde(default = "default_list_limit")]
    pub finders: usize,
    #[serde(default = "default_interaction_limit")]
    pub interactions: usize,
    /// Окно interactions: последние N дней.
    #[serde(default = "default_window_days")]
    pub interaction_window_days: i64,
}

fn default_list_limit() -> usize {
    1000
}
fn default_interaction_limit() -> usize {
    500
}
fn default_window_days() -> i64 {
    30
}

impl FetchLimits {
    /// Окно interactions должно лежать в `1..=MAX_WINDOW_DAYS`.
    pub fn validate(&self) -> Result<(), ClientError> {
        let days = self.interaction_window_days;
        if (1..=MAX_WINDOW_DAYS).contains(&days) {
            Ok(())
        } else {
            Err(ClientError::Window {
                days,
                max: MAX_WINDOW_DAYS,
            })
        }
    }
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            fellows: default_list_limit(),
            finders: default_list_limit(),
            interactions: default_interaction_limit(),
            interaction_window_days: default_window_days(),
        }
    }
}

/// Полуинтервал дат для list-запроса interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// `[now - days, now]`; `None` для `days <= 0` и при выходе за диапазон дат.
    pub fn last_days(days: i64, now: DateTime<Utc>) -> Option<Self> {
        if days <= 0 {
            return None;
        }
        let start = now.checked_sub_signed(TimeDelta::try_days(days)?)?;
        Some(Self { start, end: now })
    }
}

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Результат совместной загрузки трёх списков.
#[derive(Debug, Clone, Default)]
pub struct Lists {
    pub fellows: Vec<Fellow>,
    pub finders: Vec<Finder>,
    pub interactions: Vec<Interaction>,
}

// ════════════════════════════════════════════════════════════════
//  Client
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    ctx: ApiContext,
}

impl AdminClient {
    pub fn new(ctx: ApiContext) -> Self {
        Self {
            http: reqwest::Client::new(),
            ctx,
        }
    }

    pub fn context(&self) -> &ApiContext {
        &self.ctx
    }

    /// GET с auth заголовками.
    ///
    /// Не-2xx → [`ClientError::Status`] (тело ответа в лог), пустое тело →
    /// `None`, невалидный JSON → [`ClientError::Decode`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Option<T>, ClientError> {
        let url = self.ctx.url(endpoint);
        let mut req = self
            .http
            .get(&url)
            .query(params)
            .header(CONTENT_TYPE, "application/json")
            .header(TIMEZONE_HEADER, &self.ctx.timezone);
        match &self.ctx.token {
            Some(token) => req = req.bearer_auth(token),
            None => tracing::warn!(endpoint, "no access token available"),
        }

        let resp = req.send().await.map_err(|e| ClientError::Request {
            endpoint: endpoint.to_string(),
            detail: e.to_string(),
        })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| ClientError::Request {
            endpoint: endpoint.to_string(),
            detail: format!("read response body: {e}"),
        })?;

        if !status.is_success() {
            tracing::warn!(endpoint, status = status.as_u16(), body = %body, "API error response");
            return Err(ClientError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ClientError::Decode {
                endpoint: endpoint.to_string(),
                detail: e.to_string(),
            })
    }

    /// Список сущности; пустой ответ: пустой список.
    pub async fn list<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, ClientError> {
        let resp: Option<ListResponse<T>> = self.get_json(kind.list_endpoint(), params).await?;
        let items = resp.map(|r| r.items).unwrap_or_default();
        tracing::debug!(entity = %kind, count = items.len(), "list fetched");
        Ok(items)
    }

    pub async fn fellows(&self, limit: usize) -> Result<Vec<Fellow>, ClientError> {
        self.list(EntityKind::Fellows, &[("limit", limit.to_string())])
            .await
    }

    pub async fn finders(&self, limit: usize) -> Result<Vec<Finder>, ClientError> {
        self.list(EntityKind::Finders, &[("limit", limit.to_string())])
            .await
    }

    pub async fn interactions(
        &self,
        limit: usize,
        window: DateWindow,
    ) -> Result<Vec<Interaction>, ClientError> {
        let params = [
            ("limit", limit.to_string()),
            ("start_date", iso(window.start)),
            ("end_date", iso(window.end)),
        ];
        self.list(EntityKind::Interactions, &params).await
    }

    /// Три списка параллельно, ожидаются совместно.
    ///
    /// Ошибка любого запроса логируется и превращается в пустой список
    /// этой сущности. Ни retry, ни timeout здесь нет.
    pub async fn fetch_all(&self, limits: &FetchLimits) -> Lists {
        let interactions = async {
            limits.validate()?;
            let days = limits.interaction_window_days;
            let window = DateWindow::last_days(days, Utc::now()).ok_or(ClientError::Window {
                days,
                max: MAX_WINDOW_DAYS,
            })?;
            self.interactions(limits.interactions, window).await
        };
        let (fellows, finders, interactions) = tokio::join!(
            self.fellows(limits.fellows),
            self.finders(limits.finders),
            interactions,
        );

        Lists {
            fellows: or_empty(EntityKind::Fellows, fellows),
            finders: or_empty(EntityKind::Finders, finders),
            interactions: or_empty(EntityKind::Interactions, interactions),
        }
    }
}

fn or_empty<T>(kind: EntityKind, result: Result<Vec<T>, ClientError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::error!(entity = %kind, error = %e, "fetch failed, using empty list");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn url_joins_without_double_slash() {
        let ctx = ApiContext::new("https://api.example.com/");
        assert_eq!(
            ctx.url("/api/admin/fellos/"),
            "https://api.example.com/api/admin/fellos/"
        );
    }

    #[test]
    fn context_defaults_to_new_york() {
        let ctx = ApiContext::new("http://x").with_token("t");
        assert_eq!(ctx.timezone, DEFAULT_TIMEZONE);
        assert_eq!(ctx.token.as_deref(), Some("t"));
    }

    #[test]
    fn window_is_iso_with_millis() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let window = DateWindow::last_days(30, now).unwrap();
        assert_eq!(iso(window.start), "2024-03-01T12:00:00.000Z");
        assert_eq!(iso(window.end), "2024-03-31T12:00:00.000Z");
    }

    #[test]
    fn window_rejects_non_positive_and_overflowing_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(DateWindow::last_days(0, now), None);
        assert_eq!(DateWindow::last_days(-7, now), None);
        assert_eq!(DateWindow::last_days(i64::MAX, now), None);
        assert_eq!(DateWindow::last_days(100_000_000, now), None);
    }

    #[test]
    fn limits_validate_window_bounds() {
        let mut limits = FetchLimits::default();
        assert!(limits.validate().is_ok());
        limits.interaction_window_days = MAX_WINDOW_DAYS;
        assert!(limits.validate().is_ok());
        for days in [0, -1, MAX_WINDOW_DAYS + 1, i64::MAX] {
            limits.interaction_window_days = days;
            assert!(matches!(limits.validate(), Err(ClientError::Window { .. })));
        }
    }

    #[test]
    fn limits_default_per_entity() {
        let limits: FetchLimits = serde_json::from_str("{}").unwrap();
        assert_eq!(limits, FetchLimits::default());
        assert_eq!(limits.interactions, 500);
        assert_eq!(limits.fellows, 1000);
    }
}
