//! Single-shot request execution and response classification
//!
//! [`dispatch`] runs a request once and maps the result onto [`ClientError`]
//! in a fixed priority order: transport failure, 2xx, 404, 409, then any
//! other status decoded into the caller's error shape `E`.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::decoder::ResponseDecoder;
use crate::error::{body_excerpt, ClientError, DecodeFailure, TransportError};
use crate::request::{PendingRequest, RawResponse};
use crate::transport::Transport;

/// Terminal state of one executed request
#[derive(Debug)]
pub enum ResponseOutcome {
    TransportError(TransportError),
    Success { status: StatusCode, body: Vec<u8> },
    NotFound,
    Conflict,
    ApplicationError { status: StatusCode, body: Vec<u8> },
}

impl ResponseOutcome {
    /// Classifies what the transport returned
    pub fn classify(result: Result<RawResponse, TransportError>) -> Self {
        let response = match result {
            Ok(response) => response,
            Err(err) => return Self::TransportError(err),
        };
        let RawResponse { status, body, .. } = response;
        if status.is_success() {
            Self::Success { status, body }
        } else if status == StatusCode::NOT_FOUND {
            Self::NotFound
        } else if status == StatusCode::CONFLICT {
            Self::Conflict
        } else {
            Self::ApplicationError { status, body }
        }
    }

    /// Applies `decoder` on success and builds the error otherwise
    pub fn resolve<E, D>(self, decoder: D) -> Result<D::Output, ClientError<E>>
    where
        E: DeserializeOwned,
        D: ResponseDecoder,
    {
        match self {
            Self::TransportError(err) => Err(ClientError::Transport(err)),
            Self::Success { status, body } => {
                decoder.decode(&body).map_err(|failure| match failure {
                    DecodeFailure::Json(source) => ClientError::Decode {
                        status: status.as_u16(),
                        body: body_excerpt(&body),
                        source,
                    },
                    DecodeFailure::Empty => ClientError::EmptyResponse {
                        status: status.as_u16(),
                    },
                })
            }
            Self::NotFound => Err(ClientError::NotFound),
            Self::Conflict => Err(ClientError::Conflict),
            Self::ApplicationError { status, body } => {
                let status = status.as_u16();
                match serde_json::from_slice::<E>(&body) {
                    Ok(error) => Err(ClientError::Application { status, error }),
                    Err(_) => Err(ClientError::Status {
                        status,
                        body: String::from_utf8_lossy(&body).into_owned(),
                    }),
                }
            }
        }
    }
}

/// Executes `request` once and decodes the outcome
pub async fn dispatch<E, D>(
    transport: &dyn Transport,
    request: PendingRequest,
    decoder: D,
) -> Result<D::Output, ClientError<E>>
where
    E: DeserializeOwned,
    D: ResponseDecoder,
{
    let method = request.method().clone();
    let path = request.path();

    let outcome = ResponseOutcome::classify(transport.execute(request).await);
    match &outcome {
        ResponseOutcome::TransportError(err) => {
            warn!("{method} {path}: transport failure ({}): {err}", err.kind());
        }
        ResponseOutcome::Success { status, body } => {
            debug!("{method} {path}: {status} ({} bytes)", body.len());
        }
        ResponseOutcome::NotFound => debug!("{method} {path}: 404 Not Found"),
        ResponseOutcome::Conflict => debug!("{method} {path}: 409 Conflict"),
        ResponseOutcome::ApplicationError { status, body } => {
            warn!("{method} {path}: {status} ({} bytes)", body.len());
        }
    }

    outcome.resolve(decoder)
}
