use std::sync::Arc;

use eyre::{eyre, Result};
use flume::Sender;
use nanorand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use ticket_tracker_core::{RequestKind, RequestMethod, StatusChange, Ticket, TicketDraft, TicketId};
use tokio::sync::oneshot;
use uuid::Uuid;

pub mod http;
pub mod mock;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Error 400: {0}")]
    BadRequest(String),
    #[error("Error 404")]
    NotFound,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Response as it came off the transport
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: Option<String>,
    pub request_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl RawResponse {
    /// Interpret the response of a request expected to answer `success` with
    /// a JSON document
    fn into_api_response<T: DeserializeOwned>(self, success: u16) -> Result<ApiResponse<T>> {
        let result = match self.status {
            status if status == success => {
                let body = self
                    .body
                    .as_deref()
                    .ok_or_else(|| eyre!("{status} response without a body"))?;
                Ok(serde_json::from_str(body)?)
            }
            _ => Err(self.api_error()?),
        };
        Ok(ApiResponse {
            status: self.status,
            request_id: self.request_id,
            result,
        })
    }

    /// Interpret the response of a request expected to answer `success` with
    /// an empty body
    fn into_empty_response(self, success: u16) -> Result<ApiResponse<()>> {
        let result = match self.status {
            status if status == success => Ok(()),
            _ => Err(self.api_error()?),
        };
        Ok(ApiResponse {
            status: self.status,
            request_id: self.request_id,
            result,
        })
    }

    fn api_error(&self) -> Result<ApiError> {
        match self.status {
            400 => {
                let body = self.body.as_deref().unwrap_or_default();
                let ErrorBody { error } = serde_json::from_str(body)
                    .map_err(|e| eyre!("400 response must carry an error message: {e}"))?;
                Ok(ApiError::BadRequest(error))
            }
            404 if self.body.as_deref().unwrap_or_default().is_empty() => Ok(ApiError::NotFound),
            404 => Err(eyre!("404 response must not have a body: {:?}", self.body)),
            status => Err(eyre!("unexpected status {status}: {:?}", self.body)),
        }
    }
}

struct RequestMsg {
    kind: RequestKind,
    body: Option<String>,
    request_id: Uuid,
    response_channel: oneshot::Sender<RawResponse>,
}

enum Transport {
    Mock {
        /// One channel per worker thread
        channels: Arc<Vec<Sender<RequestMsg>>>,
        my_index: usize,
    },
    Http {
        client: reqwest::Client,
        base_url: String,
    },
}

pub struct Api {
    transport: Transport,
}

impl Clone for Api {
    fn clone(&self) -> Self {
        let transport = match &self.transport {
            Transport::Mock { channels, my_index } => Transport::Mock {
                channels: channels.clone(),
                my_index: (my_index + 1) % channels.len(),
            },
            Transport::Http { client, base_url } => Transport::Http {
                client: client.clone(),
                base_url: base_url.clone(),
            },
        };
        Self { transport }
    }
}

impl Api {
    fn mock(channels: Vec<Sender<RequestMsg>>) -> Self {
        Self {
            transport: Transport::Mock {
                channels: Arc::new(channels),
                my_index: 0,
            },
        }
    }

    fn http(base_url: String) -> Result<Self> {
        // tiny_http sometimes never delivers a request sent on a reused idle
        // keep-alive connection while several workers wait in `recv()`
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self {
            transport: Transport::Http { client, base_url },
        })
    }

    /// Generate a fresh id to correlate a request with its response
    pub fn new_request_id() -> Uuid {
        let mut bytes = [0u8; 16];
        nanorand::tls_rng().fill(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }

    /// Send a request with an arbitrary body and return the response as is
    pub async fn send(&self, kind: RequestKind, body: Option<String>) -> Result<RawResponse> {
        let request_id = Self::new_request_id();
        match &self.transport {
            Transport::Mock { channels, my_index } => {
                let (sender, receiver) = oneshot::channel();
                let msg = RequestMsg {
                    kind,
                    body,
                    request_id,
                    response_channel: sender,
                };
                channels[*my_index].send_async(msg).await?;
                Ok(receiver.await?)
            }
            Transport::Http { client, base_url } => {
                let (method, path) = kind.request_line();
                let method = match method {
                    RequestMethod::Get => reqwest::Method::GET,
                    RequestMethod::Post => reqwest::Method::POST,
                    RequestMethod::Put => reqwest::Method::PUT,
                    RequestMethod::Patch => reqwest::Method::PATCH,
                    RequestMethod::Delete => reqwest::Method::DELETE,
                    other => return Err(eyre!("{other:?} requests are not part of the API")),
                };
                let mut request = client
                    .request(method, format!("{base_url}{path}"))
                    .header("X-Request-Id", request_id.to_string());
                if let Some(body) = body {
                    request = request
                        .header(reqwest::header::CONTENT_TYPE, "application/json")
                        .body(body);
                }
                let response = request.send().await?;
                let status = response.status().as_u16();
                let request_id = response
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| Uuid::parse_str(v).ok());
                let body = response.text().await?;
                Ok(RawResponse {
                    status,
                    body: (!body.is_empty()).then_some(body),
                    request_id,
                })
            }
        }
    }

    pub async fn list_tickets(&self) -> Result<ApiResponse<Vec<Ticket>>> {
        let response = self.send(RequestKind::ListTickets, None);
        response.await?.into_api_response(200)
    }

    pub async fn get_ticket(&self, id: TicketId) -> Result<ApiResponse<Ticket>> {
        let response = self.send(RequestKind::GetTicket(id), None);
        response.await?.into_api_response(200)
    }

    pub async fn create_ticket(&self, draft: &TicketDraft) -> Result<ApiResponse<Ticket>> {
        let body = serde_json::to_string(draft)?;
        let response = self.send(RequestKind::CreateTicket, Some(body));
        response.await?.into_api_response(201)
    }

    pub async fn update_ticket(
        &self,
        id: TicketId,
        draft: &TicketDraft,
    ) -> Result<ApiResponse<Ticket>> {
        let body = serde_json::to_string(draft)?;
        let response = self.send(RequestKind::UpdateTicket(id), Some(body));
        response.await?.into_api_response(200)
    }

    pub async fn update_status(&self, id: TicketId, status: &str) -> Result<ApiResponse<Ticket>> {
        let body = serde_json::to_string(&StatusChange::new(status))?;
        let response = self.send(RequestKind::UpdateStatus(id), Some(body));
        response.await?.into_api_response(200)
    }

    pub async fn delete_ticket(&self, id: TicketId) -> Result<ApiResponse<()>> {
        let response = self.send(RequestKind::DeleteTicket(id), None);
        response.await?.into_empty_response(204)
    }
}

pub struct ApiResponse<T> {
    pub status: u16,
    pub request_id: Option<Uuid>,
    pub result: ApiResult<T>,
}
