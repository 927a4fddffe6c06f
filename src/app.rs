use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::Config;
use crate::engine::QaEngine;
use crate::error::{QaError, Result};

pub struct AppContext {
    pub root: PathBuf,
    pub config: Config,
    pub robot_mode: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let root = Self::find_root()?;
        let config = Config::load(cli.config.as_deref(), &root)?;

        Ok(Self {
            root,
            config,
            robot_mode: cli.robot,
        })
    }

    #[must_use]
    pub fn index_dir(&self) -> PathBuf {
        self.config.index_dir(&self.root)
    }

    /// Load the index and train the reranker.
    pub fn open_engine(&self) -> Result<QaEngine> {
        QaEngine::open(&self.index_dir(), &self.config)
    }

    fn find_root() -> Result<PathBuf> {
        if let Ok(root) = std::env::var("ISQA_ROOT") {
            return Ok(PathBuf::from(root));
        }
        let cwd = std::env::current_dir()?;
        if let Some(found) = find_upwards(&cwd, ".isqa") {
            return Ok(found);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| QaError::MissingConfig("data directory not found".to_string()))?;
        Ok(data_dir.join("isqa"))
    }
}

fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(name);
        if candidate.is_dir() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}
