//! Request dispatch from protocol messages to canvas operations

use std::time::Duration;

use canvas::{validate_draw, CanvasError, CanvasStore, Payload};
use place_ipc::{CanvasBody, CanvasToClient, ClientToCanvas, ErrorCode};
use tracing::{debug, warn};

/// Turns one request into one response. Store calls run on the blocking pool.
pub struct Handler {
    canvas: CanvasStore,
    op_timeout: Duration,
}

impl Handler {
    pub fn new(canvas: CanvasStore, op_timeout: Duration) -> Self {
        Self { canvas, op_timeout }
    }

    pub async fn handle(&self, request: ClientToCanvas) -> CanvasToClient {
        debug!("Handling {:?}", request);
        let result = match request {
            ClientToCanvas::Reset => self.reset().await,
            ClientToCanvas::Draw { x, y, value } => self.draw(x, y, value).await,
            ClientToCanvas::Fetch { content_type } => self.fetch(content_type).await,
        };
        result.unwrap_or_else(|response| response)
    }

    async fn reset(&self) -> Result<CanvasToClient, CanvasToClient> {
        // Every store call inside reset carries the store's own deadline;
        // the reset as a whole is bounded only by the canvas size.
        let canvas = self.canvas.clone();
        tokio::task::spawn_blocking(move || canvas.reset())
            .await
            .map_err(|e| {
                CanvasToClient::error(ErrorCode::StoreUnavailable, format!("reset task failed: {e}"))
            })?
            .map_err(error_response)?;
        Ok(CanvasToClient::ResetComplete)
    }

    async fn draw(&self, x: i64, y: i64, value: i64) -> Result<CanvasToClient, CanvasToClient> {
        let draw = validate_draw(x, y, value, self.canvas.config())
            .map_err(|rejection| error_response(rejection.into()))?;
        self.with_deadline("draw", move |canvas| canvas.write(draw.coord, draw.value))
            .await?;
        Ok(CanvasToClient::Drawn {
            x: draw.coord.x,
            y: draw.coord.y,
            value: draw.value,
        })
    }

    async fn fetch(&self, content_type: Option<String>) -> Result<CanvasToClient, CanvasToClient> {
        let payload = self
            .with_deadline("fetch", move |canvas| canvas.fetch(content_type.as_deref()))
            .await?;
        let content_type = payload.content_type().to_string();
        let body = match payload {
            Payload::Binary(bytes) => CanvasBody::Bytes(bytes),
            Payload::Base64(text) => CanvasBody::Text(text),
        };
        Ok(CanvasToClient::Canvas { content_type, body })
    }

    /// Run one store call on the blocking pool, giving up after the deadline.
    ///
    /// A timed-out call is abandoned, not cancelled; the store may still apply it.
    async fn with_deadline<T, F>(&self, op: &'static str, f: F) -> Result<T, CanvasToClient>
    where
        T: Send + 'static,
        F: FnOnce(&CanvasStore) -> Result<T, CanvasError> + Send + 'static,
    {
        let canvas = self.canvas.clone();
        let task = tokio::task::spawn_blocking(move || f(&canvas));
        match tokio::time::timeout(self.op_timeout, task).await {
            Err(_) => {
                warn!("{} exceeded {:?}", op, self.op_timeout);
                Err(CanvasToClient::error(
                    ErrorCode::Timeout,
                    format!("{op} exceeded {}ms", self.op_timeout.as_millis()),
                ))
            }
            Ok(Err(e)) => Err(CanvasToClient::error(
                ErrorCode::StoreUnavailable,
                format!("{op} task failed: {e}"),
            )),
            Ok(Ok(result)) => result.map_err(error_response),
        }
    }
}

/// Map a canvas failure onto a protocol error response
pub fn error_response(err: CanvasError) -> CanvasToClient {
    let code = match &err {
        CanvasError::OutOfBounds { .. } => ErrorCode::OutOfBounds,
        CanvasError::InvalidValue { .. } => ErrorCode::InvalidValue,
        CanvasError::Rejected(r) if r.is_out_of_bounds() => ErrorCode::OutOfBounds,
        CanvasError::Rejected(r) if r.is_invalid_value() => ErrorCode::InvalidValue,
        CanvasError::Rejected(_) | CanvasError::Config(_) => ErrorCode::InvalidRequest,
        CanvasError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
    };
    if !err.is_caller_error() {
        warn!("Request failed: {}", err);
    }
    CanvasToClient::error(code, err.to_string())
}
