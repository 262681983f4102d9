use std::env;
use std::path::{Path, PathBuf};

use room_engine::{ConfigError, LayerError, TileTableError};
use thiserror::Error;

pub(crate) const ROOT_ENV_VAR: &str = "ROOMSIM_ROOT";

#[derive(Debug, Clone)]
pub(crate) struct AppPaths {
    pub(crate) root: PathBuf,
    pub(crate) sim_config: PathBuf,
    pub(crate) tiles: PathBuf,
}

impl AppPaths {
    /// `ROOMSIM_ROOT` wins when set. Otherwise the nearest directory above the
    /// executable that holds `assets/` is the root.
    pub(crate) fn resolve() -> Result<Self, StartupError> {
        let root = match env::var_os(ROOT_ENV_VAR) {
            Some(value) => {
                let root = PathBuf::from(value);
                if !holds_assets(&root) {
                    return Err(StartupError::InvalidEnvRoot { path: root });
                }
                root
            }
            None => {
                let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
                assets_root_above(&exe).ok_or(StartupError::RootNotFound { exe })?
            }
        };
        Ok(Self::under(root))
    }

    fn under(root: PathBuf) -> Self {
        let assets = root.join("assets");
        Self {
            sim_config: assets.join("sim_config.json"),
            tiles: assets.join("tiles.json"),
            root,
        }
    }
}

fn holds_assets(dir: &Path) -> bool {
    dir.join("assets").is_dir()
}

fn assets_root_above(exe: &Path) -> Option<PathBuf> {
    exe.ancestors()
        .skip(1)
        .find(|dir| holds_assets(dir))
        .map(Path::to_path_buf)
}

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("ROOMSIM_ROOT points to {path}, which has no assets/ directory")]
    InvalidEnvRoot { path: PathBuf },
    #[error("no directory above {exe} holds assets/; set ROOMSIM_ROOT to the project root")]
    RootNotFound { exe: PathBuf },
    #[error("failed to load simulation config: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to load tile table: {0}")]
    TileTable(#[from] TileTableError),
    #[error("invalid collision layer assignment: {0}")]
    Layer(#[from] LayerError),
}
