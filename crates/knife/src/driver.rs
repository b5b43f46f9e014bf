//! Runs a renderer over many packages on a bounded pool of blocking workers

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use knife_core::knife_graph::{PackageId, TypeGraph};
use knife_core::Session;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::config::KnifeConfig;
use crate::error::{KnifeError, Result};
use crate::template::TemplateData;

/// Turns the data of one package into text
pub trait Renderer: Send + Sync {
    fn render(&self, data: &TemplateData) -> anyhow::Result<String>;
}

impl<F> Renderer for F
where
    F: Fn(&TemplateData) -> anyhow::Result<String> + Send + Sync,
{
    fn render(&self, data: &TemplateData) -> anyhow::Result<String> {
        self(data)
    }
}

/// Output for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub package: PackageId,
    pub path: String,
    pub output: String,
}

pub struct Knife {
    session: Arc<Session>,
    config: KnifeConfig,
    extra: Arc<BTreeMap<String, serde_json::Value>>,
}

impl Knife {
    pub fn new(graph: Arc<TypeGraph>) -> Self {
        Self::with_config(graph, KnifeConfig::default())
    }

    pub fn with_config(graph: Arc<TypeGraph>, config: KnifeConfig) -> Self {
        let extra = Arc::new(config.extra.clone());
        Self {
            session: Arc::new(Session::new(graph)),
            config,
            extra,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn config(&self) -> &KnifeConfig {
        &self.config
    }

    /// Every package of the graph, in graph order
    pub fn packages(&self) -> Vec<PackageId> {
        self.session.graph().package_ids().collect()
    }

    pub fn template_data(&self, package: PackageId) -> TemplateData {
        TemplateData::new(self.session.clone(), package)
            .with_extra(self.extra.clone())
            .exported_only(self.config.exported_only)
    }

    /// Map import paths to packages, failing on the first unknown path
    pub fn resolve_paths<S: AsRef<str>>(&self, paths: &[S]) -> Result<Vec<PackageId>> {
        paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                self.session
                    .graph()
                    .package_by_path(path)
                    .ok_or_else(|| KnifeError::UnknownPackage(path.to_string()))
            })
            .collect()
    }

    /// Render each package, at most `workers` at a time.
    ///
    /// Results come back in the order of `packages`. Once a render fails no
    /// further package is started; renders already running finish and the
    /// first failure is returned.
    pub async fn render_each<R>(
        &self,
        packages: &[PackageId],
        renderer: Arc<R>,
    ) -> Result<Vec<Rendered>>
    where
        R: Renderer + 'static,
    {
        let workers = self.config.workers();
        info!(packages = packages.len(), workers, "rendering packages");

        let permits = Arc::new(Semaphore::new(workers));
        let failed = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();
        for (index, &package) in packages.iter().enumerate() {
            let permit = permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| KnifeError::PoolClosed)?;
            // a failing task sets the flag before giving back its permit
            if failed.load(Ordering::Acquire) {
                debug!(remaining = packages.len() - index, "render failed, skipping packages");
                break;
            }
            let data = self.template_data(package);
            let renderer = renderer.clone();
            let failed = failed.clone();
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let path = data.path().to_string();
                debug!(%path, "rendering package");
                let output = renderer.render(&data).map_err(|e| {
                    failed.store(true, Ordering::Release);
                    KnifeError::Render {
                        package: path.clone(),
                        message: format!("{:#}", e),
                    }
                })?;
                debug!(%path, bytes = output.len(), "rendered package");
                Ok::<_, KnifeError>((index, Rendered { package, path, output }))
            });
        }

        let mut slots: Vec<Option<Rendered>> = vec![None; packages.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, rendered) = joined??;
            slots[index] = Some(rendered);
        }
        Ok(slots.into_iter().flatten().collect())
    }

    /// Render `packages` and concatenate the outputs in package order
    pub async fn execute<R>(&self, packages: &[PackageId], renderer: Arc<R>) -> Result<String>
    where
        R: Renderer + 'static,
    {
        let rendered = self.render_each(packages, renderer).await?;
        Ok(rendered.into_iter().map(|r| r.output).collect())
    }
}
