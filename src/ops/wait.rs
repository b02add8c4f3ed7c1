use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("{host}:{port} still unreachable after {waited:?}")]
    TimedOut { host: String, port: u16, waited: Duration },
}

/// Blocks until `host:port` accepts a TCP connection, retrying every
/// `interval`. Without a timeout this waits forever.
pub async fn wait_for_tcp(host: &str, port: u16, interval: Duration, timeout: Option<Duration>) -> Result<u32, WaitError> {
    let started = Instant::now();
    let mut attempts = 0u32;
    info!(host, port, "waiting for database");

    loop {
        attempts += 1;
        match TcpStream::connect((host, port)).await {
            Ok(_) => {
                info!(host, port, attempts, "database is reachable");
                return Ok(attempts);
            }
            Err(e) => debug!(host, port, attempts, error = %e, "database not reachable yet"),
        }

        let pause = match timeout {
            Some(limit) => {
                let waited = started.elapsed();
                if waited >= limit {
                    return Err(WaitError::TimedOut { host: host.to_string(), port, waited });
                }
                interval.min(limit - waited)
            }
            None => interval,
        };
        sleep(pause).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timeout_shorter_than_interval_still_waits_it_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let started = Instant::now();
        let err = wait_for_tcp("127.0.0.1", port, Duration::from_secs(5), Some(Duration::from_millis(300)))
            .await
            .unwrap_err();
        let WaitError::TimedOut { waited, .. } = err;
        assert!(waited >= Duration::from_millis(300));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
