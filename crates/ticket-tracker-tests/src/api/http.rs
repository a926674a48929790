//! API implementation talking to a real HTTP server on an ephemeral port

use eyre::Result;
use ticket_tracker_server::ServerHandle;
use ticket_tracker_store::Tracker;
use tokio::task;

use super::Api;

pub struct HttpTracker {
    server: ServerHandle<Tracker>,
}

pub async fn start(config: ticket_tracker_core::Config) -> Result<(HttpTracker, Api, String)> {
    let server = task::spawn_blocking(move || {
        let tracker = ticket_tracker_store::launch(&config);
        ticket_tracker_server::serve(&config, tracker)
    })
    .await??;

    let base_url = format!("http://{}", server.local_addr());
    let api = Api::http(base_url.clone())?;
    Ok((HttpTracker { server }, api, base_url))
}

impl HttpTracker {
    pub async fn shutdown(self) {
        task::spawn_blocking(move || self.server.shutdown())
            .await
            .unwrap();
    }
}
