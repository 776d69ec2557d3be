use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::config::ModelsConfig;
use crate::features::ModelDomain;
use crate::model::GbtModel;

/// A model artifact currently swapped in for a domain.
#[derive(Debug)]
pub struct LoadedModel {
    pub model: GbtModel,
    pub path: PathBuf,
    pub mtime: SystemTime,
    pub loaded_at: String,
}

/// Versioned model registry with hot reload.
///
/// Each domain has at most one loaded artifact. Swaps are whole-`Arc`
/// replacements: a prediction in flight keeps the model it resolved,
/// a new artifact takes effect for the next request. A failed reload
/// keeps the previous model in place.
pub struct ModelRegistry {
    config: ModelsConfig,
    slots: DashMap<ModelDomain, Arc<LoadedModel>>,
    reloads: AtomicU64,
    reload_failures: AtomicU64,
}

impl ModelRegistry {
    pub fn new(config: &ModelsConfig) -> Self {
        Self {
            config: config.clone(),
            slots: DashMap::new(),
            reloads: AtomicU64::new(0),
            reload_failures: AtomicU64::new(0),
        }
    }

    /// Startup sweep. Missing or broken artifacts leave the slot empty,
    /// they never abort startup.
    pub fn load_all(&self) {
        let report = self.sweep();
        info!("Model sweep: {}", report);
    }

    /// The model currently serving a domain, if any.
    pub fn get(&self, domain: ModelDomain) -> Option<Arc<LoadedModel>> {
        self.slots.get(&domain).map(|entry| entry.value().clone())
    }

    /// Health status for a domain: the artifact version, or "placeholder".
    pub fn status(&self, domain: ModelDomain) -> String {
        match self.get(domain) {
            Some(loaded) => loaded.model.version.clone(),
            None => "placeholder".to_string(),
        }
    }

    /// Check every domain artifact against disk and swap in what changed.
    /// Returns a per-domain action report.
    pub fn sweep(&self) -> serde_json::Value {
        let mut report = serde_json::Map::new();
        for domain in ModelDomain::ALL {
            let action = self.sweep_domain(domain);
            report.insert(domain.as_str().to_string(), serde_json::Value::String(action));
        }
        serde_json::Value::Object(report)
    }

    fn sweep_domain(&self, domain: ModelDomain) -> String {
        let path = Path::new(&self.config.dir).join(domain.artifact_file());

        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(_) => {
                return match self.get(domain) {
                    // Artifact removed from disk: keep serving the loaded copy
                    Some(loaded) => {
                        debug!("{}: artifact gone, still serving {}", domain, loaded.model.version);
                        format!("artifact missing (serving {})", loaded.model.version)
                    }
                    None => "placeholder".to_string(),
                };
            }
        };

        let mtime = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if let Some(loaded) = self.get(domain) {
            if loaded.mtime == mtime {
                return format!("unchanged ({})", loaded.model.version);
            }
        }

        match self.load_artifact(domain, &path, mtime) {
            Ok(version) => {
                self.reloads.fetch_add(1, Ordering::Relaxed);
                info!("{}: loaded model {} from {}", domain, version, path.display());
                format!("loaded ({})", version)
            }
            Err(e) => {
                self.reload_failures.fetch_add(1, Ordering::Relaxed);
                warn!("{}: failed to load {}: {}", domain, path.display(), e);
                match self.get(domain) {
                    Some(loaded) => format!("load failed (serving {})", loaded.model.version),
                    None => format!("load failed: {}", e),
                }
            }
        }
    }

    fn load_artifact(
        &self,
        domain: ModelDomain,
        path: &Path,
        mtime: SystemTime,
    ) -> anyhow::Result<String> {
        let content = std::fs::read_to_string(path)?;
        let model: GbtModel = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("bad artifact JSON: {}", e))?;
        model.validate(domain)?;

        let version = model.version.clone();
        let loaded = LoadedModel {
            model,
            path: path.to_path_buf(),
            mtime,
            loaded_at: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        };
        self.slots.insert(domain, Arc::new(loaded));
        Ok(version)
    }

    /// Background reload loop, spawned from main.
    pub async fn run_reload_loop(&self) {
        if !self.config.hot_reload {
            info!("Model hot reload disabled");
            return;
        }
        let interval = std::time::Duration::from_secs(self.config.check_interval_secs.max(1));
        loop {
            tokio::time::sleep(interval).await;
            let report = self.sweep();
            debug!("Reload sweep: {}", report);
        }
    }

    /// Per-domain artifact detail for the models API.
    pub fn list_models(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        for domain in ModelDomain::ALL {
            let detail = match self.get(domain) {
                Some(loaded) => serde_json::json!({
                    "status": "loaded",
                    "version": loaded.model.version,
                    "trained_at": loaded.model.trained_at,
                    "trees": loaded.model.trees.len(),
                    "path": loaded.path.display().to_string(),
                    "loaded_at": loaded.loaded_at,
                }),
                None => serde_json::json!({
                    "status": "placeholder",
                }),
            };
            out.insert(domain.as_str().to_string(), detail);
        }
        serde_json::Value::Object(out)
    }

    pub fn get_stats(&self) -> serde_json::Value {
        serde_json::json!({
            "dir": self.config.dir,
            "hot_reload": self.config.hot_reload,
            "loaded": self.slots.len(),
            "reloads": self.reloads.load(Ordering::Relaxed),
            "reload_failures": self.reload_failures.load(Ordering::Relaxed),
        })
    }
}
