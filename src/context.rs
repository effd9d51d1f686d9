use anyhow::{bail, Context as _};
use std::sync::Arc;
use tracing::info;

use crate::capture::CaptureEngine;
use crate::config::{Config, StorageBackend};
use crate::files::FileService;
use crate::storage::{MemoryObjectStore, ObjectStore, S3ObjectStore};
use crate::store::{PostgresRepo, WebhookRepo};
use crate::tasks::BackgroundTasks;
use crate::vector::{HttpEmbeddingProvider, InMemoryVectorIndex, VectorIndex, VectorStore};

/// Process-scoped container wiring every component to the backends the config
/// selects. Built once at startup and passed down; components never reach for
/// globals.
pub struct AppContext {
    pub repo: Arc<dyn WebhookRepo>,
    pub storage: Arc<dyn ObjectStore>,
    pub capture: CaptureEngine<dyn WebhookRepo>,
    pub vectors: Arc<VectorStore<dyn ObjectStore, dyn VectorIndex>>,
    pub files: FileService<dyn ObjectStore, dyn VectorIndex>,
    pub tasks: BackgroundTasks,
}

impl AppContext {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let repo: Arc<dyn WebhookRepo> = Arc::new(
            PostgresRepo::new(&config.database.url, config.database.max_connections)
                .await
                .context("connecting to the webhook database")?,
        );

        let storage: Arc<dyn ObjectStore> = match config.storage.backend {
            StorageBackend::S3 => {
                let Some(s3) = &config.storage.s3 else {
                    bail!("storage.backend is \"s3\" but no [storage.s3] section is present");
                };
                Arc::new(
                    S3ObjectStore::new(s3)
                        .await
                        .context("connecting to blob storage")?,
                )
            }
            StorageBackend::Memory => Arc::new(MemoryObjectStore::new()),
        };

        let provider = HttpEmbeddingProvider::new(config.embedding.clone())
            .context("building the embedding client")?;
        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new(provider));

        let tasks = BackgroundTasks::new();
        let vectors = Arc::new(VectorStore::new(Arc::clone(&storage), index));
        let files = FileService::new(Arc::clone(&storage), Arc::clone(&vectors), tasks.clone());
        let capture = CaptureEngine::new(Arc::clone(&repo), tasks.clone());

        info!("Application context initialized");
        Ok(AppContext {
            repo,
            storage,
            capture,
            vectors,
            files,
            tasks,
        })
    }

    /// Stop accepting new detached work and wait for in-flight persistence
    /// and indexing to finish.
    pub async fn shutdown(&self) {
        info!(
            "Shutting down with {} background task(s) in flight",
            self.tasks.in_flight()
        );
        self.tasks.shutdown().await;
    }
}
