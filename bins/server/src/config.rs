use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use admin_client::{ApiContext, DEFAULT_TIMEZONE, FetchLimits};
use fello_api::EntityKind;
use table_engine::SortOrder;

use crate::error::ServerError;

#[derive(Parser)]
#[command(name = "fello-admin", about = "Admin dashboard для fellows, finders и interactions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Запустить HTTP API таблиц
    Serve(ServeArgs),
    /// Один запрос к таблице, результат в stdout (JSON)
    Query(QueryArgs),
}

/// Откуда брать данные. Перекрывает значения из config.toml.
#[derive(Args, Clone, Debug)]
pub struct SourceArgs {
    /// Путь к TOML конфиг файлу
    #[arg(long, default_value = "config.toml", env = "FELLO_ADMIN_CONFIG")]
    pub config: String,

    /// Base URL backend API
    #[arg(long, env = "FELLO_API_URL")]
    pub base_url: Option<String>,

    /// Bearer token для backend API
    #[arg(long, env = "FELLO_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// JSON snapshot вместо backend'а (офлайн режим)
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Порт HTTP API (по умолчанию из config.toml)
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Args, Clone, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// fellows | finders | interactions
    pub entity: EntityKind,

    /// Фильтр `column=value`; повтор колонки: OR, разные колонки: AND
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Поиск подстроки по search-полям сущности
    #[arg(long)]
    pub search: Option<String>,

    /// Колонка сортировки
    #[arg(long)]
    pub sort: Option<String>,

    #[arg(long, default_value = "asc")]
    pub order: SortOrder,

    #[arg(long, default_value_t = 0)]
    pub page: usize,

    #[arg(long, default_value_t = table_engine::table::DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Id выбранной строки (повторяемый); в выводе: состояние выбора страницы
    #[arg(long)]
    pub selected: Vec<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Вывести summary statistics вместо страницы таблицы
    #[arg(long)]
    pub stats: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON (view целиком, с facets)
    Json,
    /// Таблица текущей страницы, колонки через таб
    Text,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected column=value, got '{raw}'")),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub limits: FetchLimits,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            source: SourceConfig::default(),
            backend: BackendConfig::default(),
            limits: FetchLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Backend admin REST API.
    #[default]
    Remote,
    /// JSON файл с тремя списками.
    Snapshot { path: PathBuf },
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timezone: default_timezone(),
        }
    }
}

fn default_api_port() -> u16 {
    9300
}
fn default_base_url() -> String {
    "http://localhost:8000".into()
}
fn default_timezone() -> String {
    DEFAULT_TIMEZONE.into()
}

impl FileConfig {
    pub fn load(path: &str) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path).map_err(|e| ServerError::Config {
            context: "read",
            detail: format!("'{path}': {e}"),
        })?;
        Self::parse(&content).map_err(|e| ServerError::Config {
            context: "parse",
            detail: format!("'{path}': {e}"),
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Effective: merged config
// ═══════════════════════════════════════════════════════════════

/// Итоговая конфигурация: config.toml < env/CLI.
#[derive(Debug)]
pub struct Effective {
    pub api_port: u16,
    pub source: SourceConfig,
    pub api: ApiContext,
    pub limits: FetchLimits,
}

impl Effective {
    /// Отсутствующий config.toml: не ошибка (всё из CLI/env и default'ов),
    /// существующий, но битый: ошибка.
    pub fn new(args: &SourceArgs, port: Option<u16>) -> Result<Self, ServerError> {
        let cfg = match FileConfig::load(&args.config) {
            Ok(c) => c,
            Err(e) => {
                if Path::new(&args.config).exists() {
                    return Err(e);
                }
                tracing::debug!(config = %args.config, "config file not found, using defaults");
                FileConfig::default()
            }
        };
        cfg.limits.validate().map_err(|e| ServerError::Config {
            context: "limits",
            detail: e.to_string(),
        })?;
        Ok(Self::merge(cfg, args, port))
    }

    fn merge(cfg: FileConfig, args: &SourceArgs, port: Option<u16>) -> Self {
        let source = match &args.snapshot {
            Some(path) => SourceConfig::Snapshot { path: path.clone() },
            None => cfg.source,
        };

        let mut api = ApiContext::new(args.base_url.clone().unwrap_or(cfg.backend.base_url))
            .with_timezone(cfg.backend.timezone);
        api.token = args.token.clone().or(cfg.backend.token);

        Self {
            api_port: port.unwrap_or(cfg.api_port),
            source,
            api,
            limits: cfg.limits,
        }
    }
}
