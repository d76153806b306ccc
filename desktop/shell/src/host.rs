//! Application host: ordered startup, then exit-hook dispatch.

use crate::hooks::{ExitTrigger, HookOutcome, ShutdownHooks};
use crate::supervisor::{
    BackendLauncher, BackendSession, PortAllocator, ReadinessProbe, SECOND_INSTANCE_MESSAGE,
    SupervisorError, SupervisorResult,
};

use std::sync::Arc;
use std::time::Duration;

use bd_store::KeyValueStore;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const SECOND_INSTANCE_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// The window layer, as far as the host is concerned.
pub trait UiShell {
    /// Create and show the main window pointed at `endpoint`.
    fn show_main_window(&mut self, endpoint: &str);

    /// Bring the existing window forward (second launch).
    fn focus_main_window(&mut self);

    /// Tell the user startup failed before the application quits.
    fn show_startup_failure(&mut self, error: &SupervisorError);
}

/// Terminal stand-in for the window layer.
#[derive(Debug, Default)]
pub struct ConsoleShell {
    endpoint: Option<String>,
}

impl UiShell for ConsoleShell {
    fn show_main_window(&mut self, endpoint: &str) {
        println!("Brief Desk is ready at {endpoint}");
        println!("Press Ctrl+C to quit.");
        self.endpoint = Some(endpoint.to_owned());
    }

    fn focus_main_window(&mut self) {
        if let Some(ref endpoint) = self.endpoint {
            println!("Brief Desk is already running at {endpoint}");
        }
    }

    fn show_startup_failure(&mut self, error: &SupervisorError) {
        eprintln!("Brief Desk could not start.\n\n{error}\n\nHint: {}", error.recovery_hint());
    }
}

/// How startup ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Backend answered and the window is showing this endpoint
    Ready(String),
    /// An exit trigger arrived first; the backend was killed and no window shown
    Interrupted(ExitTrigger),
}

pub struct Host<S: UiShell> {
    session: Arc<BackendSession>,
    hooks: ShutdownHooks,
    store: Arc<dyn KeyValueStore>,
    launcher: BackendLauncher,
    readiness: Option<ReadinessProbe>,
    shell: S,
}

impl<S: UiShell> Host<S> {
    pub fn new(
        session: Arc<BackendSession>,
        store: Arc<dyn KeyValueStore>,
        launcher: BackendLauncher,
        readiness: Option<ReadinessProbe>,
        shell: S,
    ) -> Self {
        let hooks = ShutdownHooks::new(session.clone());

        Self {
            session,
            hooks,
            store,
            launcher,
            readiness,
            shell,
        }
    }

    /// Replace the platform hooks (tests exercise the macOS policy elsewhere).
    pub fn with_hooks(mut self, hooks: ShutdownHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Run the startup sequence: port, spawn, publish, readiness, window.
    ///
    /// Each step runs only if the previous one succeeded. Exit triggers are
    /// watched the whole time: one that ends the session interrupts startup,
    /// kills whatever was spawned and skips the window. On failure the
    /// partial backend is killed, the session ends, and the failure is shown
    /// instead of a window.
    pub async fn start(
        &mut self,
        triggers: &mut mpsc::Receiver<ExitTrigger>,
    ) -> SupervisorResult<StartOutcome> {
        let result = {
            let startup = prepare_backend(
                &self.session,
                self.store.as_ref(),
                &self.launcher,
                self.readiness.as_ref(),
            );
            tokio::pin!(startup);

            loop {
                tokio::select! {
                    result = &mut startup => break result.map(StartOutcome::Ready),
                    trigger = triggers.recv() => {
                        let trigger = trigger.unwrap_or(ExitTrigger::ProcessExit);
                        if self.hooks.ends_session(trigger) {
                            break Ok(StartOutcome::Interrupted(trigger));
                        }
                        info!("Ignoring {} during startup", trigger.as_str());
                    }
                }
            }
        };

        match result {
            Ok(StartOutcome::Ready(endpoint)) => {
                self.shell.show_main_window(&endpoint);
                Ok(StartOutcome::Ready(endpoint))
            }
            Ok(StartOutcome::Interrupted(trigger)) => {
                warn!("Startup interrupted by {}", trigger.as_str());
                self.abort_startup().await;
                Ok(StartOutcome::Interrupted(trigger))
            }
            Err(e) => {
                error!("Error during app initialization: {e}");
                self.abort_startup().await;
                self.shell.show_startup_failure(&e);
                Err(e)
            }
        }
    }

    /// Dispatch exit triggers until one asks the application to quit.
    ///
    /// A closed trigger channel counts as the process exiting. The quit-time
    /// hooks fire afterwards, as they would when the application shuts down,
    /// and find the backend already gone.
    pub async fn run_until_exit(&mut self, mut triggers: mpsc::Receiver<ExitTrigger>) {
        loop {
            let trigger = match triggers.recv().await {
                Some(trigger) => trigger,
                None => {
                    warn!("Exit trigger channel closed");
                    ExitTrigger::ProcessExit
                }
            };

            info!("Exit hook fired: {}", trigger.as_str());

            match self.fire(trigger).await {
                HookOutcome::Quit => break,
                HookOutcome::FocusWindow => self.shell.focus_main_window(),
                HookOutcome::Continue => {}
            }
        }

        for trigger in [
            ExitTrigger::BeforeQuit,
            ExitTrigger::Quit,
            ExitTrigger::ProcessExit,
        ] {
            self.fire(trigger).await;
        }

        info!("Quitting app...");
    }

    pub fn session(&self) -> &Arc<BackendSession> {
        &self.session
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    /// Hooks may wait for the backend to be reaped; keep that off the runtime.
    async fn fire(&self, trigger: ExitTrigger) -> HookOutcome {
        let hooks = self.hooks.clone();
        match tokio::task::spawn_blocking(move || hooks.fire(trigger)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Exit hook {} failed: {e}", trigger.as_str());
                HookOutcome::Quit
            }
        }
    }

    async fn abort_startup(&self) {
        let session = self.session.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || session.abort_startup()).await {
            error!("Failed to abort startup: {e}");
        }
    }
}

async fn prepare_backend(
    session: &BackendSession,
    store: &dyn KeyValueStore,
    launcher: &BackendLauncher,
    readiness: Option<&ReadinessProbe>,
) -> SupervisorResult<String> {
    session.begin_startup()?;

    let port = PortAllocator::acquire_free_port()?;
    info!("Assigned port: {port}");

    session.start_backend(launcher, port)?;

    let endpoint = session.publish_endpoint(store)?;

    if let Some(probe) = readiness {
        probe
            .wait_ready(&endpoint, || session.exit_status())
            .await?;
    }

    Ok(endpoint)
}

/// Forward second launches to the exit-trigger channel.
///
/// A second instance connects to the loopback port recorded in the lock
/// file and sends [`SECOND_INSTANCE_MESSAGE`]; other connections are ignored.
pub fn spawn_second_instance_listener(
    listener: std::net::TcpListener,
    tx: mpsc::Sender<ExitTrigger>,
) -> SupervisorResult<()> {
    listener.set_nonblocking(true)?;
    let listener = tokio::net::TcpListener::from_std(listener)?;

    tokio::spawn(async move {
        loop {
            let mut stream = match listener.accept().await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!("Second-instance listener accept failed: {e}");
                    continue;
                }
            };

            let mut buf = [0u8; 64];
            let read = tokio::time::timeout(
                SECOND_INSTANCE_READ_TIMEOUT,
                stream.read(&mut buf),
            )
            .await;

            match read {
                Ok(Ok(n)) if buf[..n].starts_with(SECOND_INSTANCE_MESSAGE) => {
                    if tx.send(ExitTrigger::SecondInstance).await.is_err() {
                        break;
                    }
                }
                _ => debug!("Ignoring unexpected connection on second-instance port"),
            }
        }
    });

    Ok(())
}

/// Turn OS signals into exit triggers.
///
/// SIGHUP means the terminal standing in for the window went away; SIGUSR1
/// is how a second launch reaches the primary instance.
#[cfg(unix)]
pub fn spawn_signal_listener(tx: mpsc::Sender<ExitTrigger>) -> SupervisorResult<()> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM, SIGUSR1};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1])?;

    std::thread::Builder::new()
        .name("exit-signals".into())
        .spawn(move || {
            for signal in signals.forever() {
                let trigger = match signal {
                    SIGINT => ExitTrigger::Interrupt,
                    SIGTERM => ExitTrigger::Terminate,
                    SIGHUP => ExitTrigger::WindowClosed,
                    SIGUSR1 => ExitTrigger::SecondInstance,
                    _ => continue,
                };

                info!("Received signal {signal}");
                if tx.blocking_send(trigger).is_err() {
                    break;
                }
            }
        })?;

    Ok(())
}

/// Ctrl+C is the only console signal we can observe on Windows.
#[cfg(windows)]
pub fn spawn_signal_listener(tx: mpsc::Sender<ExitTrigger>) -> SupervisorResult<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(ExitTrigger::Interrupt).await.is_err() {
                break;
            }
        }
    });

    Ok(())
}
