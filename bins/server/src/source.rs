use std::path::PathBuf;
use std::sync::Arc;

use admin_client::{AdminClient, FetchLimits};
use table_api_server::{SnapshotSource, SourceFuture};
use table_engine::Snapshot;

use crate::config::{Effective, SourceConfig};

/// Backend admin API: три списка параллельно.
pub struct RemoteSource {
    client: AdminClient,
    limits: FetchLimits,
}

impl SnapshotSource for RemoteSource {
    fn name(&self) -> &str {
        "remote"
    }

    fn load(&self) -> SourceFuture<'_> {
        Box::pin(async move {
            let lists = self.client.fetch_all(&self.limits).await;
            Ok(Snapshot::new(lists.fellows, lists.finders, lists.interactions))
        })
    }
}

/// JSON snapshot на диске; перечитывается на каждый refresh.
pub struct FileSource {
    path: PathBuf,
}

impl SnapshotSource for FileSource {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn load(&self) -> SourceFuture<'_> {
        Box::pin(async move {
            let text = tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| format!("read '{}': {e}", self.path.display()))?;
            Snapshot::from_json(&text).map_err(|e| e.to_string())
        })
    }
}

pub fn from_config(cfg: &Effective) -> Arc<dyn SnapshotSource> {
    match &cfg.source {
        SourceConfig::Remote => {
            tracing::info!(base_url = %cfg.api.base_url, "using remote source");
            Arc::new(RemoteSource {
                client: AdminClient::new(cfg.api.clone()),
                limits: cfg.limits,
            })
        }
        SourceConfig::Snapshot { path } => {
            tracing::info!(path = %path.display(), "using snapshot source");
            Arc::new(FileSource { path: path.clone() })
        }
    }
}
