//! Mock API implementation directly using the `ticket-tracker-store` crate

use std::sync::Arc;

use ticket_tracker_core::{RawRequest, Request, RequestHandler, RequestMethod};
use tokio::sync::oneshot;
use tokio::task::{self, JoinHandle};
use uuid::Uuid;

use super::{Api, RawResponse, RequestMsg};

pub struct MockTracker {
    tracker: Arc<ticket_tracker_store::Tracker>,
    join_handles: Vec<JoinHandle<()>>,
}

struct MockRawRequest {
    url: String,
    method: RequestMethod,
    body: Option<String>,
    response_channel: oneshot::Sender<RawResponse>,
}

pub async fn start(threads: u16, config: ticket_tracker_core::Config) -> (MockTracker, Api) {
    let tracker = Arc::new(
        task::spawn_blocking(move || ticket_tracker_store::launch(&config))
            .await
            .unwrap(),
    );

    let it = (0..threads.max(1)).map(|_| {
        let (sender, receiver) = flume::bounded::<RequestMsg>(65536);
        let tracker = tracker.clone();
        let handle = task::spawn_blocking(move || {
            let tracker = &*tracker;
            for msg in receiver.into_iter() {
                let (method, url) = msg.kind.request_line();
                let raw = Box::new(MockRawRequest {
                    url,
                    method,
                    body: msg.body,
                    response_channel: msg.response_channel,
                });
                tracker.handle(Request::from_raw(msg.kind, msg.request_id, raw))
            }
        });
        (sender, handle)
    });
    let (senders, join_handles) = it.unzip();

    let mock_tracker = MockTracker {
        tracker,
        join_handles,
    };
    (mock_tracker, Api::mock(senders))
}

impl MockTracker {
    pub async fn shutdown(self) {
        for handle in self.join_handles {
            handle.await.unwrap()
        }
        task::spawn_blocking(move || Arc::into_inner(self.tracker).unwrap().shutdown())
            .await
            .unwrap();
    }
}

impl RawRequest for MockRawRequest {
    fn url(&self) -> &str {
        &self.url
    }

    fn method(&self) -> RequestMethod {
        self.method
    }

    fn read_string(&mut self) -> std::io::Result<String> {
        Ok(self.body.take().unwrap_or_default())
    }

    fn respond_with_json(self: Box<Self>, status: u16, json: String, request_id: Uuid) {
        let response = RawResponse {
            status,
            body: Some(json),
            request_id: Some(request_id),
        };
        // the test may have given up on the response already
        let _ = self.response_channel.send(response);
    }

    fn respond_with_status(self: Box<Self>, status: u16, request_id: Uuid) {
        let response = RawResponse {
            status,
            body: None,
            request_id: Some(request_id),
        };
        let _ = self.response_channel.send(response);
    }
}

