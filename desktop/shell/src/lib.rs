pub mod bridge;
pub mod cli;
pub mod hooks;
pub mod host;
pub mod logging;
pub mod paths;
pub mod supervisor;

#[cfg(test)]
mod tests;

use bridge::Bridge;
use cli::{Commands, StoreCommands, parse_value};
use hooks::ExitTrigger;
use host::{
    ConsoleShell, Host, StartOutcome, UiShell, spawn_second_instance_listener,
    spawn_signal_listener,
};
use paths::{AppPaths, BuildMode};
use supervisor::{
    BackendLauncher, BackendSession, InstanceLock, LockStatus, ReadinessProbe, SupervisorConfig,
    SupervisorError, notify_primary, platform_terminator,
};

use std::process::ExitCode;
use std::sync::Arc;

use bd_store::{JsonFileStore, KeyValueStore, seed_first_launch};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const EXIT_TRIGGER_BUFFER: usize = 16;

/// Run the desktop application until an exit hook fires.
///
/// Only one instance runs per data directory; a second launch asks the
/// primary to come forward and exits successfully.
pub async fn run(paths: &AppPaths, config: &SupervisorConfig) -> ExitCode {
    let mut shell = ConsoleShell::default();

    let mut lock = match InstanceLock::acquire(paths.data_dir()) {
        Ok(LockStatus::Acquired(lock)) => lock,
        Ok(LockStatus::HeldBy { pid, port }) => {
            info!("Brief Desk is already running (PID {pid})");
            if let Err(e) = notify_primary(pid, port) {
                warn!("Failed to notify primary instance: {e}");
            }
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            error!("Failed to acquire instance lock: {e}");
            shell.show_startup_failure(&e);
            return ExitCode::FAILURE;
        }
    };

    let store: Arc<dyn KeyValueStore> = match JsonFileStore::open_in(paths.data_dir()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            let e = SupervisorError::from(e);
            error!("Failed to open settings store: {e}");
            shell.show_startup_failure(&e);
            return ExitCode::FAILURE;
        }
    };

    if paths.mode() == BuildMode::Packaged {
        match seed_first_launch(store.as_ref(), paths.resources_dir()) {
            Ok(true) => info!("First launch: default settings written"),
            Ok(false) => {}
            Err(e) => warn!("Failed to seed default settings: {e}"),
        }
    }

    let session = Arc::new(
        BackendSession::new(platform_terminator()).with_host(config.backend.host.clone()),
    );
    info!("Backend terminator: {}", session.terminator_name());

    // Hooks are registered before any backend exists so no exit path is missed.
    let (exit_tx, mut exit_rx) = mpsc::channel::<ExitTrigger>(EXIT_TRIGGER_BUFFER);
    if let Err(e) = spawn_signal_listener(exit_tx.clone()) {
        warn!("Failed to register signal handlers: {e}");
    }
    if let Some(listener) = lock.take_listener()
        && let Err(e) = spawn_second_instance_listener(listener, exit_tx.clone())
    {
        warn!("Failed to listen for second launches: {e}");
    }

    let readiness = if config.readiness.enabled {
        match ReadinessProbe::new(&config.readiness) {
            Ok(probe) => Some(probe),
            Err(e) => {
                error!("Failed to build readiness probe: {e}");
                shell.show_startup_failure(&e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    let launcher = BackendLauncher::resolve(&config.backend, paths);
    info!("Backend executable: {}", launcher.executable().display());

    let mut host = Host::new(session, store, launcher, readiness, shell);

    match host.start(&mut exit_rx).await {
        Ok(StartOutcome::Ready(_)) => {}
        Ok(StartOutcome::Interrupted(trigger)) => {
            info!("Quit during startup ({})", trigger.as_str());
            return ExitCode::SUCCESS;
        }
        Err(_) => return ExitCode::FAILURE,
    }

    host.run_until_exit(exit_rx).await;
    drop(exit_tx);
    lock.release();

    ExitCode::SUCCESS
}

/// Run a one-shot command against the data directory and print JSON.
pub fn execute(command: Commands, paths: &AppPaths, pretty: bool) -> ExitCode {
    let result = match command {
        Commands::Run => Err("run is handled by the event loop".to_owned()),
        Commands::Paths => to_json(&PathsReport {
            paths,
            backend_executable: paths.backend_executable(),
        }),
        Commands::PortFile => bridge_for(paths)
            .and_then(|bridge| bridge.read_temp_port_file())
            .map(serde_json::Value::String),
        Commands::Endpoint => bridge_for(paths)
            .and_then(|bridge| bridge.get_api_endpoint())
            .map(serde_json::Value::String),
        Commands::Store { action } => bridge_for(paths).and_then(|bridge| match action {
            StoreCommands::Get { key } => bridge
                .store_get(&key)
                .map(|value| value.unwrap_or(serde_json::Value::Null)),
            StoreCommands::Set { key, value } => bridge
                .store_set(&key, parse_value(&value))
                .map(|()| serde_json::json!({ "key": key, "saved": true })),
            StoreCommands::Delete { key } => bridge
                .store_delete(&key)
                .map(|()| serde_json::json!({ "key": key, "deleted": true })),
        }),
    };

    match result {
        Ok(value) => {
            let output = if pretty {
                serde_json::to_string_pretty(&value)
            } else {
                serde_json::to_string(&value)
            };

            match output {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error serializing response: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn bridge_for(paths: &AppPaths) -> Result<Bridge, String> {
    let store = JsonFileStore::open_in(paths.data_dir())
        .map_err(|e| format!("{e}\n\nHint: {}", e.recovery_hint()))?;
    Ok(Bridge::new(Arc::new(store), paths.clone()))
}

#[derive(Serialize)]
struct PathsReport<'a> {
    #[serde(flatten)]
    paths: &'a AppPaths,
    backend_executable: std::path::PathBuf,
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}
