// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-shot local HTTP listener for the OAuth redirect.
//!
//! The receiver accepts exactly one connection on its port, whatever the
//! path, replies with a static confirmation page and closes the listening
//! socket before returning. The captured query string is handed back through
//! a oneshot channel.

use crate::error::{AppError, Result};
use crate::models::OAuthCallback;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Page shown in the browser once the redirect has been captured.
const CONFIRMATION_PAGE: &str =
    "<html><body><h3>You can now close this tab and return to the app</h3></body></html>";

/// Lifecycle of a [`CallbackReceiver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Idle,
    Listening,
    Captured,
    Stopped,
}

/// Single-use OAuth redirect receiver.
#[derive(Debug)]
pub struct CallbackReceiver {
    addr: SocketAddr,
    state: ReceiverState,
    listener: Option<TcpListener>,
    captured: Option<OAuthCallback>,
}

impl CallbackReceiver {
    /// Create an idle receiver for `addr`. Nothing is bound yet.
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            state: ReceiverState::Idle,
            listener: None,
            captured: None,
        }
    }

    /// Receiver on the loopback interface at `port`.
    pub fn on_port(port: u16) -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], port)))
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// Bound address (the requested one until [`listen`](Self::listen) runs).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bind the port and start listening.
    pub async fn listen(&mut self) -> Result<SocketAddr> {
        if self.state != ReceiverState::Idle {
            return Err(AppError::Auth(format!(
                "callback receiver cannot listen from state {:?}",
                self.state
            )));
        }
        let listener = TcpListener::bind(self.addr).await.map_err(|e| {
            AppError::Auth(format!("unable to listen on {}: {}", self.addr, e))
        })?;
        self.addr = listener.local_addr()?;
        self.listener = Some(listener);
        self.state = ReceiverState::Listening;
        tracing::info!(address = %self.addr, "Listening for OAuth callback");
        Ok(self.addr)
    }

    /// Accept exactly one request and capture its query string.
    ///
    /// Connections that close without sending a request line (browser
    /// preconnects) are ignored. The listening socket is closed as soon as
    /// a request arrives, so a second request is refused by the OS rather
    /// than silently ignored.
    pub async fn capture(&mut self) -> Result<()> {
        let listener = self.listener.take().ok_or_else(|| {
            AppError::Auth(format!(
                "callback receiver cannot capture from state {:?}",
                self.state
            ))
        })?;

        let (mut reader, mut writer, request_line) = loop {
            let (socket, peer) = listener.accept().await?;
            let (reader, writer) = socket.into_split();
            let mut reader = BufReader::new(reader);
            let mut request_line = String::new();
            match reader.read_line(&mut request_line).await {
                Ok(_) if !request_line.trim().is_empty() => {
                    tracing::debug!(peer = %peer, "OAuth callback connection accepted");
                    break (reader, writer, request_line);
                }
                Ok(_) => tracing::debug!(peer = %peer, "Ignoring empty connection"),
                Err(e) => tracing::debug!(peer = %peer, error = %e, "Ignoring unreadable connection"),
            }
        };
        drop(listener);

        // Drain headers so the browser sees a clean response.
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 || line.trim_end().is_empty() {
                break;
            }
        }

        let target = request_line.split_whitespace().nth(1).ok_or_else(|| {
            AppError::Auth(format!("malformed callback request {:?}", request_line.trim()))
        })?;
        let query = target.split_once('?').map(|(_, q)| q).unwrap_or("");

        let response = format!(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: text/html; charset=utf-8\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            CONFIRMATION_PAGE.len(),
            CONFIRMATION_PAGE
        );
        if let Err(e) = writer.write_all(response.as_bytes()).await {
            tracing::warn!(error = %e, "Failed to write OAuth confirmation page");
        }
        let _ = writer.shutdown().await;

        self.captured = Some(OAuthCallback::from_query(query));
        self.state = ReceiverState::Captured;
        tracing::info!("OAuth callback captured");
        Ok(())
    }

    /// Hand the captured callback to the caller. The receiver is spent.
    pub fn take(&mut self) -> Option<OAuthCallback> {
        let captured = self.captured.take();
        if captured.is_some() {
            self.state = ReceiverState::Stopped;
        }
        captured
    }

    /// Run [`capture`](Self::capture) on a background task.
    ///
    /// The receiver must already be listening.
    pub fn spawn(mut self) -> PendingCallback {
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let result = match self.capture().await {
                Ok(()) => self
                    .take()
                    .ok_or_else(|| AppError::Auth("no callback captured".to_string())),
                Err(e) => Err(e),
            };
            // The waiting side may have timed out and gone away.
            let _ = tx.send(result);
        });
        PendingCallback { rx, handle }
    }
}

/// Handle to a callback capture running in the background.
#[derive(Debug)]
pub struct PendingCallback {
    rx: oneshot::Receiver<Result<OAuthCallback>>,
    handle: JoinHandle<()>,
}

impl PendingCallback {
    /// Block until the callback arrives or `timeout` elapses.
    pub async fn wait(self, timeout: Duration) -> Result<OAuthCallback> {
        let PendingCallback { rx, handle } = self;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(AppError::Auth(
                "callback receiver stopped without a result".to_string(),
            )),
            Err(_) => {
                handle.abort();
                Err(AppError::Auth(format!(
                    "no OAuth callback received within {}s",
                    timeout.as_secs()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpStream;

    async fn send_request(addr: SocketAddr, target: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", target);
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let mut receiver = CallbackReceiver::on_port(0);
        assert_eq!(receiver.state(), ReceiverState::Idle);

        let addr = receiver.listen().await.unwrap();
        assert_eq!(receiver.state(), ReceiverState::Listening);
        assert_ne!(addr.port(), 0);

        let client = tokio::spawn(async move {
            send_request(addr, "/exchange_token?state=xyz&code=abc&scope=read,activity:write")
                .await
        });
        receiver.capture().await.unwrap();
        assert_eq!(receiver.state(), ReceiverState::Captured);

        let response = client.await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("close this tab"));

        let callback = receiver.take().unwrap();
        assert_eq!(receiver.state(), ReceiverState::Stopped);
        assert_eq!(callback.code(), Some("abc"));
        assert_eq!(callback.state(), Some("xyz"));
        assert!(callback.has_scope("activity:write"));
        assert!(receiver.take().is_none());
    }

    #[tokio::test]
    async fn test_capture_requires_listening() {
        let mut receiver = CallbackReceiver::on_port(0);
        assert!(matches!(receiver.capture().await, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn test_listen_twice_fails() {
        let mut receiver = CallbackReceiver::on_port(0);
        receiver.listen().await.unwrap();
        assert!(matches!(receiver.listen().await, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn test_spawn_delivers_percent_decoded_query() {
        let mut receiver = CallbackReceiver::on_port(0);
        let addr = receiver.listen().await.unwrap();
        let pending = receiver.spawn();

        send_request(addr, "/any/path?code=a%2Bb%20c&scope=activity%3Awrite").await;

        let callback = pending.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(callback.code(), Some("a+b c"));
        assert!(callback.has_scope("activity:write"));
    }

    #[tokio::test]
    async fn test_only_one_request_is_served() {
        let mut receiver = CallbackReceiver::on_port(0);
        let addr = receiver.listen().await.unwrap();
        let pending = receiver.spawn();

        send_request(addr, "/?code=first").await;
        let callback = pending.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(callback.code(), Some("first"));

        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_preconnect_without_request_is_ignored() {
        let mut receiver = CallbackReceiver::on_port(0);
        let addr = receiver.listen().await.unwrap();
        let pending = receiver.spawn();

        // Speculative connections that never send a request line.
        drop(TcpStream::connect(addr).await.unwrap());
        let mut blank = TcpStream::connect(addr).await.unwrap();
        blank.write_all(b"\r\n").await.unwrap();
        drop(blank);

        let response = send_request(addr, "/exchange_token?code=real").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));

        let callback = pending.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(callback.code(), Some("real"));
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let mut receiver = CallbackReceiver::on_port(0);
        receiver.listen().await.unwrap();
        let pending = receiver.spawn();

        let err = pending.wait(Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(ref msg) if msg.contains("no OAuth callback")));
    }
}
