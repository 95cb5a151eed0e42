//! Response construction helpers.
//!
//! Every response the server produces is fully buffered. Errors always use
//! the `{"error": "<message>"}` shape.

use bytes::Bytes;
use http::{header, Response, StatusCode};
use http_body_util::Full;
use serde::{Deserialize, Serialize};

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

const JSON: &str = "application/json";

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable, client-safe message.
    pub error: String,
}

/// Serializes `value` as a JSON response with the given status.
///
/// # Errors
///
/// Returns the serializer error if `value` cannot be encoded.
pub fn json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    value: &T,
) -> Result<HttpResponse, serde_json::Error> {
    let body = serde_json::to_vec(value)?;
    Ok(text_response(status, JSON, body))
}

/// Builds an `{"error": message}` response.
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    let body = ErrorBody {
        error: message.to_string(),
    };
    json_response(status, &body).unwrap_or_else(|_| {
        text_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            JSON,
            r#"{"error":"an internal error occurred"}"#,
        )
    })
}

/// Builds a response from raw bytes and a content type.
pub fn text_response(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> HttpResponse {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(content_type),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(response: HttpResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_error_response_shape() {
        let response = error_response(StatusCode::NOT_FOUND, "product not found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSON);
        assert_eq!(body_string(response).await, r#"{"error":"product not found"}"#);
    }

    #[tokio::test]
    async fn test_json_response() {
        let response = json_response(StatusCode::OK, &serde_json::json!({"id": "42"})).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"id":"42"}"#);
    }

    #[test]
    fn test_text_response_content_type() {
        let response = text_response(StatusCode::OK, "text/plain; version=0.0.4", "up 1");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }
}
