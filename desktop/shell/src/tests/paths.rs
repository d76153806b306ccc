use crate::paths::{AppPaths, BuildMode, ENV_DATA_DIR, ENV_MODE};
use crate::tests::EnvGuard;

use std::path::PathBuf;

use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial]
fn given_production_env_when_detect_then_packaged() {
    let _mode = EnvGuard::set(ENV_MODE, "production");

    assert_eq!(BuildMode::detect(), BuildMode::Packaged);
}

#[test]
#[serial]
fn given_no_env_when_detect_then_development() {
    let _mode = EnvGuard::remove(ENV_MODE);

    assert_eq!(BuildMode::detect(), BuildMode::Development);
}

#[test]
#[serial]
fn given_explicit_data_dir_when_resolve_then_it_wins_over_env() {
    let temp = TempDir::new().unwrap();
    let _data = EnvGuard::set(ENV_DATA_DIR, "/somewhere/else");

    let paths = AppPaths::resolve(BuildMode::Development, Some(temp.path().to_path_buf()));

    assert_eq!(paths.data_dir(), temp.path());
}

#[test]
#[serial]
fn given_env_data_dir_when_resolve_then_used() {
    let temp = TempDir::new().unwrap();
    let _data = EnvGuard::set(ENV_DATA_DIR, temp.path().to_str().unwrap());

    let paths = AppPaths::resolve(BuildMode::Packaged, None);

    assert_eq!(paths.data_dir(), temp.path());
}

#[test]
#[serial]
fn given_development_mode_when_resolve_then_data_dir_kept_apart() {
    let _data = EnvGuard::remove(ENV_DATA_DIR);

    let dev = AppPaths::resolve(BuildMode::Development, None);
    let packaged = AppPaths::resolve(BuildMode::Packaged, None);

    assert_ne!(dev.data_dir(), packaged.data_dir());
    assert!(dev.data_dir().to_string_lossy().ends_with("(development)"));
}

#[test]
fn given_packaged_paths_then_backend_lives_under_resources_scripts() {
    let paths = AppPaths::new(
        BuildMode::Packaged,
        PathBuf::from("/data"),
        PathBuf::from("/opt/brief-desk/resources"),
        PathBuf::from("/opt/brief-desk"),
    );

    let expected = PathBuf::from("/opt/brief-desk/resources/scripts")
        .join(format!("backend{}", std::env::consts::EXE_SUFFIX));
    assert_eq!(paths.backend_executable(), expected);
}

#[test]
fn given_development_paths_then_backend_lives_under_working_dir_scripts() {
    let paths = AppPaths::new(
        BuildMode::Development,
        PathBuf::from("/data"),
        PathBuf::from("/repo/resources"),
        PathBuf::from("/repo/target/debug"),
    );

    let expected = std::env::current_dir()
        .unwrap()
        .join("scripts")
        .join(format!("backend{}", std::env::consts::EXE_SUFFIX));
    assert_eq!(paths.backend_executable(), expected);
}
