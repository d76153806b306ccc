use crate::hooks::{ExitTrigger, HookOutcome, ShutdownHooks};
use crate::supervisor::{BackendSession, SessionState};
use crate::tests::CountingTerminator;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use googletest::assert_that;
use googletest::prelude::eq;

#[test]
fn given_never_started_session_when_quit_fires_then_nothing_killed() {
    let (terminator, calls) = CountingTerminator::new();
    let hooks = ShutdownHooks::with_platform_policy(
        Arc::new(BackendSession::new(Box::new(terminator))),
        false,
    );

    let outcome = hooks.fire(ExitTrigger::Quit);

    assert_that!(outcome, eq(HookOutcome::Quit));
    assert_that!(calls.load(Ordering::SeqCst), eq(0));
    assert_that!(hooks.session().state(), eq(SessionState::NotStarted));
}

#[test]
fn given_second_instance_when_fired_then_focus_requested() {
    let (terminator, calls) = CountingTerminator::new();
    let hooks = ShutdownHooks::with_platform_policy(
        Arc::new(BackendSession::new(Box::new(terminator))),
        false,
    );

    assert_that!(hooks.fire(ExitTrigger::SecondInstance), eq(HookOutcome::FocusWindow));
    assert_that!(calls.load(Ordering::SeqCst), eq(0));
}

#[test]
fn given_keep_running_policy_when_all_windows_closed_then_continue() {
    let (terminator, _) = CountingTerminator::new();
    let hooks = ShutdownHooks::with_platform_policy(
        Arc::new(BackendSession::new(Box::new(terminator))),
        true,
    );

    assert_that!(hooks.fire(ExitTrigger::AllWindowsClosed), eq(HookOutcome::Continue));
    assert_that!(hooks.fire(ExitTrigger::Quit), eq(HookOutcome::Quit));
}

#[test]
fn given_quit_policy_when_all_windows_closed_then_quit() {
    let (terminator, _) = CountingTerminator::new();
    let hooks = ShutdownHooks::with_platform_policy(
        Arc::new(BackendSession::new(Box::new(terminator))),
        false,
    );

    assert_that!(hooks.fire(ExitTrigger::AllWindowsClosed), eq(HookOutcome::Quit));
}

#[test]
fn test_trigger_names() {
    assert_eq!(ExitTrigger::AllWindowsClosed.as_str(), "window-all-closed");
    assert_eq!(ExitTrigger::Interrupt.as_str(), "SIGINT");
    assert_eq!(ExitTrigger::Terminate.as_str(), "SIGTERM");
}

#[cfg(unix)]
mod with_process {
    use super::*;
    use crate::supervisor::PortAllocator;
    use crate::tests::sleep_launcher;

    fn running_hooks() -> (ShutdownHooks, Arc<std::sync::atomic::AtomicUsize>) {
        let (terminator, calls) = CountingTerminator::new();
        let session = Arc::new(BackendSession::new(Box::new(terminator)));
        let port = PortAllocator::acquire_free_port().unwrap();
        session.begin_startup().unwrap();
        session.start_backend(&sleep_launcher(), port).unwrap();
        (ShutdownHooks::with_platform_policy(session, false), calls)
    }

    #[test]
    fn given_window_closed_then_every_later_hook_is_a_no_op() {
        let (hooks, calls) = running_hooks();

        let mut outcomes = Vec::new();
        for trigger in [
            ExitTrigger::WindowClosed,
            ExitTrigger::AllWindowsClosed,
            ExitTrigger::BeforeQuit,
            ExitTrigger::Quit,
            ExitTrigger::ProcessExit,
            ExitTrigger::Interrupt,
            ExitTrigger::Terminate,
        ] {
            outcomes.push(hooks.fire(trigger));
        }

        assert!(outcomes.iter().all(|outcome| *outcome == HookOutcome::Quit));
        assert_that!(calls.load(Ordering::SeqCst), eq(1));
        assert_that!(hooks.session().state(), eq(SessionState::Terminated));
    }

    #[test]
    fn given_second_instance_then_backend_keeps_running() {
        let (hooks, calls) = running_hooks();

        hooks.fire(ExitTrigger::SecondInstance);

        assert!(matches!(hooks.session().state(), SessionState::Running { .. }));
        assert_that!(calls.load(Ordering::SeqCst), eq(0));

        hooks.fire(ExitTrigger::Interrupt);
        assert_that!(calls.load(Ordering::SeqCst), eq(1));
    }

    #[test]
    fn given_hooks_fired_from_threads_then_single_kill() {
        let (hooks, calls) = running_hooks();
        let hooks = Arc::new(hooks);

        let handles: Vec<_> = [ExitTrigger::Interrupt, ExitTrigger::Terminate, ExitTrigger::Quit]
            .into_iter()
            .map(|trigger| {
                let hooks = hooks.clone();
                std::thread::spawn(move || hooks.fire(trigger))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_that!(calls.load(Ordering::SeqCst), eq(1));
    }
}
