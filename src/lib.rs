//! Shelf application library
//!
//! Application modules plus the bootstrap shared by the binary and the
//! integration tests.

pub mod modules;

use anyhow::Context;
use axum::Router;
use shelf_http::NormalizePath;
use shelf_db::Database;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// A fully bootstrapped application: migrated, initialized and started.
pub struct App {
    pub settings: Settings,
    pub registry: ModuleRegistry,
    pub db: Database,
}

impl App {
    /// Open the database for `settings`, migrate it, then init and start
    /// every module.
    pub async fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        let db = Database::connect(settings.database_url())
            .await
            .context("failed to connect to database")?;

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry);

        registry.migrate(&db).await?;

        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };
        registry.init_all(&ctx).await?;
        registry.start_all(&ctx).await?;

        Ok(Self {
            settings,
            registry,
            db,
        })
    }

    /// The HTTP service with every module mounted, trailing slashes trimmed.
    pub fn router(&self) -> NormalizePath<Router> {
        shelf_http::build_service(&self.registry, &self.settings, self.db.clone())
    }

    /// Serve until a shutdown signal arrives.
    pub async fn serve(&self) -> anyhow::Result<()> {
        shelf_http::start_server(&self.registry, &self.settings, self.db.clone()).await
    }

    /// Stop modules in reverse order, then release the connection.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let stopped = self.registry.stop_all().await;
        self.db.close().await;
        stopped
    }
}
