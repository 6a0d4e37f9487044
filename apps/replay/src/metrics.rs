//! Gauge reporting over plaintext StatsD.
//!
//! The sink is opened once at startup and closed once at shutdown. A failed
//! send is the caller's to log; it never fails the pipeline.

use std::io;

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::info;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("StatsD socket error: {0}")]
    Io(#[from] io::Error),

    #[error("Metrics sink is closed")]
    Closed,
}

#[async_trait]
pub trait GaugeSink: Send + Sync {
    async fn gauge(&self, name: &str, value: u64, sample_rate: f64) -> Result<(), MetricsError>;

    async fn close(&self);
}

/// StatsD line for a gauge. The rate suffix is only written below 1.0.
pub fn format_gauge(prefix: &str, name: &str, value: u64, sample_rate: f64) -> String {
    let mut line = if prefix.is_empty() {
        format!("{name}:{value}|g")
    } else {
        format!("{prefix}.{name}:{value}|g")
    };
    if sample_rate < 1.0 {
        line.push_str(&format!("|@{sample_rate}"));
    }
    line
}

pub struct StatsdSink {
    socket: tokio::sync::Mutex<Option<UdpSocket>>,
    prefix: String,
}

impl StatsdSink {
    pub async fn connect(addr: &str, prefix: &str) -> Result<Self, MetricsError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(addr).await?;
        info!("StatsD sink targeting {addr}");

        Ok(Self {
            socket: tokio::sync::Mutex::new(Some(socket)),
            prefix: prefix.trim_end_matches('.').to_string(),
        })
    }
}

#[async_trait]
impl GaugeSink for StatsdSink {
    async fn gauge(&self, name: &str, value: u64, sample_rate: f64) -> Result<(), MetricsError> {
        let guard = self.socket.lock().await;
        let socket = guard.as_ref().ok_or(MetricsError::Closed)?;
        let line = format_gauge(&self.prefix, name, value, sample_rate);
        socket.send(line.as_bytes()).await?;
        Ok(())
    }

    async fn close(&self) {
        if self.socket.lock().await.take().is_some() {
            info!("StatsD sink closed");
        }
    }
}

/// Discards every sample.
pub struct NoopSink;

#[async_trait]
impl GaugeSink for NoopSink {
    async fn gauge(&self, _name: &str, _value: u64, _sample_rate: f64) -> Result<(), MetricsError> {
        Ok(())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_gauge() {
        assert_eq!(
            format_gauge("", "mleap.gauge", 1234, 1.0),
            "mleap.gauge:1234|g"
        );
        assert_eq!(
            format_gauge("trivial", "mleap.gauge", 1234, 1.0),
            "trivial.mleap.gauge:1234|g"
        );
        assert_eq!(
            format_gauge("", "mleap.gauge", 7, 0.5),
            "mleap.gauge:7|g|@0.5"
        );
    }

    #[tokio::test]
    async fn test_statsd_sink_sends_line() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap().to_string();

        let sink = StatsdSink::connect(&addr, "replay.").await.unwrap();
        sink.gauge("mleap.gauge", 42_000, 1.0).await.unwrap();

        let mut buf = [0u8; 128];
        let n = receiver.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"replay.mleap.gauge:42000|g");
    }

    #[tokio::test]
    async fn test_gauge_after_close_is_error() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap().to_string();

        let sink = StatsdSink::connect(&addr, "").await.unwrap();
        sink.close().await;
        assert!(matches!(
            sink.gauge("mleap.gauge", 1, 1.0).await,
            Err(MetricsError::Closed)
        ));
    }
}
