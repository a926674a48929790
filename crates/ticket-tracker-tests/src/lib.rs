use eyre::{eyre, Result};

mod api;
pub use api::{Api, ApiError, ApiResponse, RawResponse};

/// How tests talk to the tracker
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Transport {
    /// Requests are handed to the tracker in-process
    Mock,
    /// Requests go through a real HTTP server on an ephemeral port
    Http,
}

pub struct TestCtxBuilder {
    /// Whether to start with the example tickets
    pub seed: bool,
    /// Count of worker threads serving requests
    pub workers: u16,
    /// Transport between the test and the tracker
    pub transport: Transport,
    /// Origins allowed to issue cross-origin requests
    pub allowed_origins: Vec<String>,
}

impl TestCtxBuilder {
    /// Create a new test context builder initialized with environment defaults
    ///
    /// `TRACKER_TRANSPORT` selects the transport (`mock` or `http`, default
    /// `mock`).
    pub fn from_env() -> Result<Self> {
        let transport = match std::env::var("TRACKER_TRANSPORT") {
            Err(_) => Transport::Mock,
            Ok(v) if v.eq_ignore_ascii_case("mock") => Transport::Mock,
            Ok(v) if v.eq_ignore_ascii_case("http") => Transport::Http,
            Ok(v) => return Err(eyre!("TRACKER_TRANSPORT must be `mock` or `http`, got `{v}`")),
        };

        Ok(TestCtxBuilder {
            seed: false,
            workers: 4,
            transport,
            allowed_origins: ticket_tracker_core::Config::default().allowed_origins,
        })
    }

    /// Start with the three example tickets
    pub fn with_seed(mut self, seed: bool) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of worker threads to use
    pub fn with_workers(mut self, workers: u16) -> Self {
        assert_ne!(workers, 0);
        self.workers = workers;
        self
    }

    /// Override the transport selected by the environment
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Get the [`ticket_tracker_core::Config`] for launching the tracker
    fn config(&self) -> ticket_tracker_core::Config {
        ticket_tracker_core::Config {
            host: String::from("127.0.0.1"),
            port: 0,
            workers: self.workers,
            allowed_origins: self.allowed_origins.clone(),
            seed: self.seed,
        }
    }

    /// Build the test context
    pub async fn build(self) -> Result<TestCtx> {
        let config = self.config();
        let (backend, api, base_url) = match self.transport {
            Transport::Mock => {
                let (tracker, api) = api::mock::start(self.workers, config).await;
                (Backend::Mock(tracker), api, None)
            }
            Transport::Http => {
                let (tracker, api, base_url) = api::http::start(config).await?;
                (Backend::Http(tracker), api, Some(base_url))
            }
        };

        Ok(TestCtx {
            api,
            backend,
            transport: self.transport,
            base_url,
            drop_bomb: DropBomb,
        })
    }
}

enum Backend {
    Mock(api::mock::MockTracker),
    Http(api::http::HttpTracker),
}

/// Test context
pub struct TestCtx {
    /// API allowing to interact with the tracker
    pub api: Api,
    backend: Backend,
    /// Transport the context was built with
    pub transport: Transport,
    base_url: Option<String>,

    drop_bomb: DropBomb,
}

impl TestCtx {
    /// Base URL of the HTTP server, if the context runs over HTTP
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Shut the tracker down and finish the test
    ///
    /// All clones of [`Self::api`] must have been dropped.
    pub async fn finish(self) {
        std::mem::forget(self.drop_bomb);
        drop(self.api);
        match self.backend {
            Backend::Mock(t) => t.shutdown().await,
            Backend::Http(t) => t.shutdown().await,
        }
    }
}

struct DropBomb;

impl Drop for DropBomb {
    fn drop(&mut self) {
        eprintln!("@TestAuthor: You should call `ctx.finish().await` to shut the tracker down");
    }
}
