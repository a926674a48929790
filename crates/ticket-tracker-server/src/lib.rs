//! HTTP front end of the ticket tracker
//!
//! A fixed pool of worker threads pulls requests off a shared
//! [`tiny_http::Server`], resolves them into [`ticket_tracker_core::Request`]s
//! and hands them to a [`RequestHandler`].

#![warn(missing_docs)]

mod http;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use eyre::{eyre, Result, WrapErr};
use ticket_tracker_core::{Config, RequestHandler};

/// A running HTTP server
pub struct ServerHandle<H: RequestHandler> {
    addr: SocketAddr,
    server: Arc<tiny_http::Server>,
    stop: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
    handler: Arc<H>,
}

/// Bind the listener and start serving `handler`
///
/// Returns once the listener is bound; requests are processed by
/// `config.workers` background threads.
pub fn serve<H>(config: &Config, handler: H) -> Result<ServerHandle<H>>
where
    H: RequestHandler + Send + Sync + 'static,
{
    let server = tiny_http::Server::http((config.host.as_str(), config.port))
        .map_err(|e| eyre!("could not bind {}:{}: {e}", config.host, config.port))?;
    let addr = server
        .server_addr()
        .to_ip()
        .ok_or_else(|| eyre!("listener is not bound to an IP address"))?;

    let server = Arc::new(server);
    let stop = Arc::new(AtomicBool::new(false));
    let handler = Arc::new(handler);
    let config = Arc::new(config.clone());

    let workers = (0..config.workers.max(1))
        .map(|i| {
            let server = server.clone();
            let stop = stop.clone();
            let handler = handler.clone();
            let config = config.clone();
            thread::Builder::new()
                .name(format!("http_worker_{i}"))
                .spawn(move || http_loop(&server, &*handler, &config, &stop))
                .wrap_err("could not spawn HTTP worker")
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(%addr, workers = workers.len(), "HTTP server listening");

    Ok(ServerHandle {
        addr,
        server,
        stop,
        workers,
        handler,
    })
}

fn http_loop<H: RequestHandler>(
    server: &tiny_http::Server,
    handler: &H,
    config: &Config,
    stop: &AtomicBool,
) {
    loop {
        match server.recv() {
            Ok(rq) => {
                if let Some(rq) = http::parse(rq, config) {
                    let span = tracing::info_span!(
                        "request",
                        id = %rq.request_id(),
                        method = rq.method().as_str(),
                        url = rq.url(),
                    );
                    let _enter = span.enter();
                    handler.handle(rq);
                }
            }
            Err(_) if stop.load(Ordering::Acquire) => break,
            Err(e) => tracing::warn!(error = %e, "HTTP receive failed"),
        }
    }
}

impl<H: RequestHandler> ServerHandle<H> {
    /// Address the server is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until all workers have exited
    ///
    /// Workers only exit after [`Self::shutdown()`], so for a server nobody
    /// shuts down this blocks forever.
    pub fn join(self) {
        for worker in self.workers {
            if worker.join().is_err() {
                tracing::error!("HTTP worker panicked");
            }
        }
    }

    /// Stop accepting requests, wait for in-flight ones, and shut the
    /// handler down
    pub fn shutdown(self) {
        self.stop.store(true, Ordering::Release);
        // every call wakes exactly one worker blocked in `recv()`
        for _ in &self.workers {
            self.server.unblock();
        }
        for worker in self.workers {
            if worker.join().is_err() {
                tracing::error!("HTTP worker panicked");
            }
        }

        match Arc::into_inner(self.handler) {
            Some(handler) => handler.shutdown(),
            None => tracing::warn!("handler still in use, skipping shutdown"),
        }
        tracing::info!(addr = %self.addr, "HTTP server stopped");
    }
}
