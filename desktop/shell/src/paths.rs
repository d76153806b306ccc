//! Build mode and filesystem locations.
//!
//! Packaged builds ship the backend and static resources next to the
//! executable. Development runs use the repository checkout and keep their
//! data apart from a real install.

use std::env;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub const ENV_MODE: &str = "BD_ENV";
pub const ENV_DATA_DIR: &str = "BD_DATA_DIR";

const PRODUCTION: &str = "production";
const APP_DIR_NAME: &str = "Brief Desk";
const DEVELOPMENT_SUFFIX: &str = " (development)";
const RESOURCES_DIR: &str = "resources";
const SCRIPTS_DIR: &str = "scripts";
const BACKEND_STEM: &str = "backend";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    Packaged,
    Development,
}

impl BuildMode {
    /// `BD_ENV=production` selects the packaged layout.
    pub fn detect() -> Self {
        match env::var(ENV_MODE) {
            Ok(value) if value.eq_ignore_ascii_case(PRODUCTION) => Self::Packaged,
            _ => Self::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Packaged => "packaged",
            Self::Development => "development",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppPaths {
    mode: BuildMode,
    data_dir: PathBuf,
    resources_dir: PathBuf,
    app_dir: PathBuf,
}

impl AppPaths {
    pub fn new(mode: BuildMode, data_dir: PathBuf, resources_dir: PathBuf, app_dir: PathBuf) -> Self {
        Self {
            mode,
            data_dir,
            resources_dir,
            app_dir,
        }
    }

    /// Resolve every location for `mode`.
    ///
    /// `data_dir` wins over `BD_DATA_DIR`, which wins over the platform
    /// data directory.
    pub fn resolve(mode: BuildMode, data_dir: Option<PathBuf>) -> Self {
        let app_dir = executable_dir();
        let work_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        let data_dir = data_dir
            .or_else(|| env::var_os(ENV_DATA_DIR).map(PathBuf::from))
            .unwrap_or_else(|| default_data_dir(mode));

        let resources_dir = match mode {
            BuildMode::Packaged => app_dir.join(RESOURCES_DIR),
            BuildMode::Development => work_dir.join(RESOURCES_DIR),
        };

        Self::new(mode, data_dir, resources_dir, app_dir)
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn resources_dir(&self) -> &Path {
        &self.resources_dir
    }

    /// Directory of the running executable.
    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    /// Default backend location for the build mode.
    ///
    /// Packaged: `<resources>/scripts/backend[.exe]`.
    /// Development: `<cwd>/scripts/backend[.exe]`.
    pub fn backend_executable(&self) -> PathBuf {
        let file_name = format!("{BACKEND_STEM}{}", env::consts::EXE_SUFFIX);
        match self.mode {
            BuildMode::Packaged => self.resources_dir.join(SCRIPTS_DIR).join(file_name),
            BuildMode::Development => env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(SCRIPTS_DIR)
                .join(file_name),
        }
    }
}

fn executable_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir(mode: BuildMode) -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(env::temp_dir);
    match mode {
        BuildMode::Packaged => base.join(APP_DIR_NAME),
        BuildMode::Development => base.join(format!("{APP_DIR_NAME}{DEVELOPMENT_SUFFIX}")),
    }
}
