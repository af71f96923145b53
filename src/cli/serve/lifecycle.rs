//! Server lifecycle management.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Result, anyhow};
use thiserror::Error;
use tiny_http::Server;

use crate::actor::Coordinator;
use crate::config::PortSetting;
use crate::core::Shutdown;
use crate::log;

/// Maximum number of port binding attempts in auto mode.
pub const MAX_PORT_RETRIES: u16 = 10;

#[derive(Debug, Error)]
pub enum BindError {
    #[error("port {port} is unavailable")]
    Unavailable {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("no free port in {first}-{last}")]
    Exhausted { first: u16, last: u16 },
}

/// Bind to the configured interface and port.
///
/// A fixed port gets one attempt. `auto` walks up from the default port,
/// [`MAX_PORT_RETRIES`] candidates at most.
pub fn bind_with_retry(
    interface: IpAddr,
    port: PortSetting,
) -> Result<(Server, SocketAddr), BindError> {
    let base_port = port.first();

    if !port.is_auto() {
        let addr = SocketAddr::new(interface, base_port);
        return Server::http(addr)
            .map(|server| (server, addr))
            .map_err(|source| BindError::Unavailable {
                port: base_port,
                source,
            });
    }

    let mut last = base_port;
    for offset in 0..MAX_PORT_RETRIES {
        let Some(port) = base_port.checked_add(offset) else {
            break;
        };
        last = port;
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => crate::debug!("serve"; "port {} unavailable: {}", port, e),
        }
    }

    Err(BindError::Exhausted {
        first: base_port,
        last,
    })
}

/// Install the Ctrl+C handler.
///
/// Requests shutdown (which wakes the actor runtime) and unblocks the
/// request loop.
pub fn install_shutdown_handler(server: Arc<Server>, shutdown: Shutdown) -> Result<()> {
    ctrlc::set_handler(move || {
        if !shutdown.is_requested() {
            log!("serve"; "shutting down...");
        }
        shutdown.trigger();
        server.unblock();
    })
    .map_err(|e| anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Spawn the actor system on its own thread.
pub fn spawn_actors(coordinator: Coordinator) -> JoinHandle<()> {
    thread::spawn(move || run_actor_system(coordinator))
}

fn run_actor_system(coordinator: Coordinator) {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log!("error"; "failed to create tokio runtime: {}", e);
            return;
        }
    };

    rt.block_on(coordinator.run());

    // A compile still running on a blocking thread must not hold up exit
    rt.shutdown_timeout(Duration::from_millis(500));
}

/// Wait for actor system to shutdown gracefully (max 2 seconds).
pub fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
    crate::debug!("serve"; "actors did not stop in time");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpListener};

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn test_fixed_port_taken_is_unavailable() {
        let taken = TcpListener::bind((LOCALHOST, 0)).unwrap();
        let port = taken.local_addr().unwrap().port();

        let Err(err) = bind_with_retry(LOCALHOST, PortSetting::Fixed(port)) else {
            panic!("port {port} is taken but bind succeeded");
        };
        assert!(matches!(err, BindError::Unavailable { port: p, .. } if p == port));
    }

    #[test]
    fn test_fixed_port_free_binds() {
        let port = {
            let probe = TcpListener::bind((LOCALHOST, 0)).unwrap();
            probe.local_addr().unwrap().port()
        };

        let (_server, addr) = bind_with_retry(LOCALHOST, PortSetting::Fixed(port)).unwrap();
        assert_eq!(addr.port(), port);
    }

    #[test]
    fn test_exhausted_message() {
        let err = BindError::Exhausted {
            first: 5277,
            last: 5286,
        };
        assert_eq!(err.to_string(), "no free port in 5277-5286");
    }
}
