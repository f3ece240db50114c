//! Network reachability checks
//!
//! Plain TCP connects for the datastore and busy-port checks, blocking HTTP
//! GETs for the health endpoints. Both respect a fixed timeout so a hung
//! service cannot stall the run.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Answers "is something listening there" questions about the network
pub trait NetworkProbe {
    /// Whether a TCP connection to `host:port` can be opened
    fn tcp_reachable(&self, host: &str, port: u16, timeout: Duration) -> bool;

    /// HTTP status of a GET to `url`, or a description of why none arrived
    fn http_status(&self, url: &str, timeout: Duration) -> Result<u16, String>;
}

/// Probes the real network
#[derive(Debug, Default)]
pub struct LiveNetwork;

impl NetworkProbe for LiveNetwork {
    fn tcp_reachable(&self, host: &str, port: u16, timeout: Duration) -> bool {
        let Ok(addrs) = (host, port).to_socket_addrs() else {
            return false;
        };
        addrs
            .collect::<Vec<SocketAddr>>()
            .iter()
            .any(|addr| TcpStream::connect_timeout(addr, timeout).is_ok())
    }

    fn http_status(&self, url: &str, timeout: Duration) -> Result<u16, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stagehand/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| e.to_string())?;
        let response = client.get(url).send().map_err(|e| e.to_string())?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_tcp_reachable_open_port() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(LiveNetwork.tcp_reachable("127.0.0.1", port, Duration::from_secs(1)));
    }

    #[test]
    fn test_tcp_unreachable_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        assert!(!LiveNetwork.tcp_reachable("127.0.0.1", port, Duration::from_secs(1)));
    }

    #[test]
    fn test_http_status_reports_connection_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let result = LiveNetwork.http_status(
            &format!("http://127.0.0.1:{port}/api/health"),
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }
}
