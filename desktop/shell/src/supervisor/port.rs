//! Ephemeral port allocation.

use crate::supervisor::{SupervisorError, SupervisorResult};

use std::net::TcpListener;
use std::panic::Location;

use error_location::ErrorLocation;
use tracing::debug;

const HOST: &str = "127.0.0.1";

pub struct PortAllocator;

impl PortAllocator {
    /// Ask the OS for a port that is free right now.
    ///
    /// Binds port 0, reads back the assigned port and releases the socket.
    /// Nothing is reserved: another process may take the port before the
    /// backend binds it.
    #[track_caller]
    pub fn acquire_free_port() -> SupervisorResult<u16> {
        let location = Location::caller();

        let listener =
            TcpListener::bind((HOST, 0)).map_err(|source| SupervisorError::PortAllocation {
                source,
                location: ErrorLocation::from(location),
            })?;

        let port = listener
            .local_addr()
            .map_err(|source| SupervisorError::PortAllocation {
                source,
                location: ErrorLocation::from(location),
            })?
            .port();

        drop(listener);
        debug!("OS assigned free port {port}");

        Ok(port)
    }

    /// Check if a port is available for binding.
    pub fn is_available(port: u16) -> bool {
        TcpListener::bind((HOST, port)).is_ok()
    }
}
