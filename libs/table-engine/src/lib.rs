//! Faceted filtering и aggregation для admin таблиц.
//!
//! Поток данных: backend record → [`normalize`] → [`Row`] →
//! [`apply_filters`] / [`compute_facets`] → [`build_view`].
//! Всё, кроме загрузки snapshot'а,: чистые тотальные функции над
//! неизменяемыми входами.

pub mod config;
pub mod error;
pub mod facets;
pub mod filter;
pub mod format;
pub mod normalize;
pub mod selection;
pub mod snapshot;
pub mod stats;
pub mod table;

pub use config::{Bucket, ColumnDef, ColumnKind, EntityConfig, FilterOption, SelectMode};
pub use error::TableError;
pub use facets::{ColumnFacets, FacetCounts, OptionCount, compute_facets, facet_table};
pub use filter::{FilterState, RowFilter, apply_filters};
pub use normalize::{Entity, normalize};
pub use selection::{PageSelection, Selection};
pub use snapshot::Snapshot;
pub use stats::{EntityStats, FellowStats, FinderStats, InteractionStats};
pub use table::{PageRequest, SortOrder, SortSpec, TableQuery, TableView, build_facets, build_view};

pub use fello_api::{Cell, EntityKind, Row};
