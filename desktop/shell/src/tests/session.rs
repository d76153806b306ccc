use crate::supervisor::{
    BackendSession, PortAllocator, SessionState, SupervisorError, TerminationOutcome,
    endpoint_url,
};
use crate::tests::{CountingTerminator, FailingTerminator, missing_launcher};

use std::sync::atomic::Ordering;

use bd_store::{KeyValueStore, MemoryStore, keys};
use googletest::assert_that;
use googletest::prelude::{eq, none, some};
use tempfile::TempDir;

#[test]
fn test_endpoint_url_format() {
    assert_eq!(endpoint_url("localhost", 51234), "http://localhost:51234");
}

#[test]
fn given_new_session_then_nothing_tracked() {
    let (terminator, calls) = CountingTerminator::new();
    let session = BackendSession::new(Box::new(terminator));

    assert_that!(session.state(), eq(SessionState::NotStarted));
    assert_that!(session.pid(), none());
    assert_that!(session.terminate(), eq(TerminationOutcome::NotTracked));
    assert_that!(calls.load(Ordering::SeqCst), eq(0));
}

#[test]
fn given_session_started_twice_when_begin_startup_then_rejected() {
    let (terminator, _) = CountingTerminator::new();
    let session = BackendSession::new(Box::new(terminator));

    session.begin_startup().unwrap();
    let result = session.begin_startup();

    assert!(matches!(
        result,
        Err(SupervisorError::InvalidTransition { from: "starting", .. })
    ));
}

#[test]
fn given_missing_executable_when_start_backend_then_no_endpoint_published() {
    let temp = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let (terminator, calls) = CountingTerminator::new();
    let session = BackendSession::new(Box::new(terminator));
    let port = PortAllocator::acquire_free_port().unwrap();

    session.begin_startup().unwrap();
    let result = session.start_backend(&missing_launcher(temp.path()), port);

    assert!(matches!(result, Err(SupervisorError::BackendNotFound { .. })));
    assert_that!(session.state(), eq(SessionState::Starting));
    assert!(session.publish_endpoint(&store).is_err());
    assert_that!(store.get(keys::API_ENDPOINT).unwrap(), none());

    session.abort_startup();

    assert_that!(session.state(), eq(SessionState::Terminated));
    assert_that!(calls.load(Ordering::SeqCst), eq(0));
}

#[test]
fn given_not_started_session_when_publish_then_endpoint_unavailable() {
    let store = MemoryStore::new();
    let (terminator, _) = CountingTerminator::new();
    let session = BackendSession::new(Box::new(terminator));

    let result = session.publish_endpoint(&store);

    assert!(matches!(
        result,
        Err(SupervisorError::EndpointUnavailable { .. })
    ));
    assert!(store.is_empty());
}

#[cfg(unix)]
mod with_process {
    use super::*;
    use crate::supervisor::ProcessTerminator;
    use crate::tests::sleep_launcher;

    use std::process::Command;

    #[test]
    fn given_running_backend_when_published_then_store_holds_endpoint() {
        let store = MemoryStore::new();
        let (terminator, _) = CountingTerminator::new();
        let session = BackendSession::new(Box::new(terminator));
        let port = PortAllocator::acquire_free_port().unwrap();

        session.begin_startup().unwrap();
        let pid = session.start_backend(&sleep_launcher(), port).unwrap();
        let endpoint = session.publish_endpoint(&store).unwrap();

        assert_that!(session.state(), eq(SessionState::Running { port, pid }));
        assert_that!(session.port(), some(eq(port)));
        assert_that!(endpoint.as_str(), eq(endpoint_url("localhost", port).as_str()));
        assert_eq!(
            store.get(keys::API_ENDPOINT).unwrap(),
            Some(serde_json::Value::String(endpoint.clone()))
        );
        assert_that!(session.endpoint(), some(eq(&endpoint)));

        session.terminate();
    }

    #[test]
    fn given_custom_host_when_published_then_endpoint_uses_host() {
        let store = MemoryStore::new();
        let (terminator, _) = CountingTerminator::new();
        let session = BackendSession::new(Box::new(terminator)).with_host("127.0.0.1");
        let port = PortAllocator::acquire_free_port().unwrap();

        session.begin_startup().unwrap();
        session.start_backend(&sleep_launcher(), port).unwrap();
        let endpoint = session.publish_endpoint(&store).unwrap();

        assert_eq!(endpoint, format!("http://127.0.0.1:{port}"));

        session.terminate();
    }

    #[test]
    fn given_running_backend_when_terminated_repeatedly_then_killed_once() {
        let (terminator, calls) = CountingTerminator::new();
        let session = BackendSession::new(Box::new(terminator));
        let port = PortAllocator::acquire_free_port().unwrap();

        session.begin_startup().unwrap();
        let pid = session.start_backend(&sleep_launcher(), port).unwrap();

        let first = session.terminate();
        let second = session.terminate();
        let third = session.terminate();

        assert_that!(first, eq(TerminationOutcome::Killed { pid }));
        assert_that!(second, eq(TerminationOutcome::NotTracked));
        assert_that!(third, eq(TerminationOutcome::NotTracked));
        assert_that!(calls.load(Ordering::SeqCst), eq(1));
        assert_that!(session.state(), eq(SessionState::Terminated));
        assert_that!(session.endpoint(), none());
        assert!(!crate::supervisor::is_process_running(pid));
    }

    #[test]
    fn given_backend_already_exited_when_terminated_then_no_kill_sent() {
        let temp = TempDir::new().unwrap();
        let script = temp.path().join("quick-backend");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        Command::new("chmod").arg("+x").arg(&script).status().unwrap();

        let (terminator, calls) = CountingTerminator::new();
        let session = BackendSession::new(Box::new(terminator));
        let port = PortAllocator::acquire_free_port().unwrap();

        session.begin_startup().unwrap();
        let pid = session
            .start_backend(&crate::supervisor::BackendLauncher::new(&script), port)
            .unwrap();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while session.exit_status().is_none() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }

        let outcome = session.terminate();

        assert_that!(outcome, eq(TerminationOutcome::AlreadyExited { pid }));
        assert_that!(calls.load(Ordering::SeqCst), eq(0));
        assert_that!(session.state(), eq(SessionState::Terminated));
    }

    #[test]
    fn given_kill_error_when_terminated_then_swallowed_and_session_ends() {
        let session = BackendSession::new(Box::new(FailingTerminator));
        let port = PortAllocator::acquire_free_port().unwrap();

        session.begin_startup().unwrap();
        let pid = session.start_backend(&sleep_launcher(), port).unwrap();

        let outcome = session.terminate();

        assert_that!(outcome, eq(TerminationOutcome::KillFailed { pid }));
        assert_that!(session.state(), eq(SessionState::Terminated));
        assert_that!(session.terminate(), eq(TerminationOutcome::NotTracked));

        crate::supervisor::SignalTerminator.terminate(pid).ok();
    }

    #[test]
    fn given_state_subscriber_when_session_runs_then_final_state_is_terminated() {
        let (terminator, _) = CountingTerminator::new();
        let session = BackendSession::new(Box::new(terminator));
        let rx = session.subscribe();
        let port = PortAllocator::acquire_free_port().unwrap();

        session.begin_startup().unwrap();
        session.start_backend(&sleep_launcher(), port).unwrap();
        assert!(matches!(*rx.borrow(), SessionState::Running { .. }));

        session.terminate();

        assert_that!(*rx.borrow(), eq(SessionState::Terminated));
    }

    #[test]
    fn given_session_dropped_then_backend_killed() {
        let (terminator, calls) = CountingTerminator::new();
        let port = PortAllocator::acquire_free_port().unwrap();
        let pid = {
            let session = BackendSession::new(Box::new(terminator));
            session.begin_startup().unwrap();
            session.start_backend(&sleep_launcher(), port).unwrap()
        };

        assert_that!(calls.load(Ordering::SeqCst), eq(1));
        assert!(!crate::supervisor::is_process_running(pid));
    }
}
