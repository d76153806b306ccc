use crate::supervisor::{PortAllocator, ReadinessProbe, ReadinessSettings, SupervisorError};

use std::time::Duration;

use wiremock::{Mock, MockServer, ResponseTemplate, matchers::method};

fn fast_settings() -> ReadinessSettings {
    ReadinessSettings {
        enabled: true,
        timeout_secs: 1,
        poll_interval_ms: 50,
        request_timeout_ms: 200,
    }
}

#[tokio::test]
async fn given_backend_answering_200_when_wait_ready_then_ok() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    let probe = ReadinessProbe::new(&fast_settings()).unwrap();

    let elapsed = probe.wait_ready(&mock_server.uri(), || None).await.unwrap();

    assert!(elapsed < probe.timeout());
}

#[tokio::test]
async fn given_backend_answering_404_when_wait_ready_then_counts_as_ready() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    let probe = ReadinessProbe::new(&fast_settings()).unwrap();

    let result = probe.wait_ready(&mock_server.uri(), || None).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn given_nothing_listening_when_wait_ready_then_startup_timeout() {
    let port = PortAllocator::acquire_free_port().unwrap();
    let probe = ReadinessProbe::new(&fast_settings()).unwrap();

    let result = probe
        .wait_ready(&format!("http://127.0.0.1:{port}"), || None)
        .await;

    assert!(matches!(
        result,
        Err(SupervisorError::StartupTimeout { timeout_secs: 1, .. })
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn given_backend_exited_when_wait_ready_then_fails_fast() {
    use std::os::unix::process::ExitStatusExt;

    let port = PortAllocator::acquire_free_port().unwrap();
    let mut settings = fast_settings();
    settings.timeout_secs = 30;
    let probe = ReadinessProbe::new(&settings).unwrap();

    let start = std::time::Instant::now();
    let result = probe
        .wait_ready(&format!("http://127.0.0.1:{port}"), || {
            Some(std::process::ExitStatus::from_raw(256))
        })
        .await;

    assert!(matches!(result, Err(SupervisorError::BackendExited { .. })));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn given_timeout_when_wait_ready_then_error_points_at_caller() {
    let port = PortAllocator::acquire_free_port().unwrap();
    let probe = ReadinessProbe::new(&fast_settings()).unwrap();

    let result = probe
        .wait_ready(&format!("http://127.0.0.1:{port}"), || None)
        .await;

    let Err(e) = result else {
        panic!("expected readiness to time out");
    };
    assert!(matches!(e, SupervisorError::StartupTimeout { .. }));
    assert!(e.to_string().contains(file!()));
}
