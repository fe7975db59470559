use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

// ============================================================================
// Data structures (pure, no I/O)
// ============================================================================

/// HTTP methods used against the management API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Status code and decoded body of one API call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, Some(body))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// SBIO: Trait for abstraction (allows mocking in tests)
// ============================================================================

/// The single capability pool and cluster logic needs from the outside world.
///
/// Implementations must report a rejected session (401) as
/// `StingrayError::AuthorizationFailure` rather than as a response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, method: Method, path: &str, body: Option<&Value>)
        -> Result<ApiResponse>;
}

// ============================================================================
// SBIO: Mock implementation for testing (no I/O)
// ============================================================================

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::error::StingrayError;

    /// A request as seen by the mock
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCall {
        pub method: Method,
        pub path: String,
        pub body: Option<Value>,
    }

    /// Canned responses keyed by method and path.
    ///
    /// Unrouted requests answer 404 with an error document.
    #[derive(Default)]
    pub struct MockTransport {
        routes: Mutex<HashMap<(Method, String), ApiResponse>>,
        calls: Mutex<Vec<RecordedCall>>,
        write_count: AtomicUsize,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(self, method: Method, path: &str, response: ApiResponse) -> Self {
            self.routes
                .lock()
                .unwrap()
                .insert((method, path.to_string()), response);
            self
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Number of PUT and DELETE requests received
        pub fn write_count(&self) -> usize {
            self.write_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn execute(
            &self,
            method: Method,
            path: &str,
            body: Option<&Value>,
        ) -> Result<ApiResponse> {
            if method != Method::Get {
                self.write_count.fetch_add(1, Ordering::SeqCst);
            }
            self.calls.lock().unwrap().push(RecordedCall {
                method,
                path: path.to_string(),
                body: body.cloned(),
            });

            let response = self
                .routes
                .lock()
                .unwrap()
                .get(&(method, path.to_string()))
                .cloned();

            match response {
                Some(r) if r.status == 401 => {
                    Err(StingrayError::AuthorizationFailure(path.to_string()))
                }
                Some(r) => Ok(r),
                None => Ok(ApiResponse::new(
                    404,
                    Some(serde_json::json!({
                        "error_id": "resource.not_found",
                        "error_text": format!("{} not found", path),
                    })),
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use crate::error::StingrayError;
    use serde_json::json;

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Put.to_string(), "PUT");
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_method_into_reqwest() {
        assert_eq!(reqwest::Method::from(Method::Put), reqwest::Method::PUT);
    }

    #[test]
    fn test_response_success_range() {
        assert!(ApiResponse::new(200, None).is_success());
        assert!(ApiResponse::new(204, None).is_success());
        assert!(!ApiResponse::new(400, None).is_success());
    }

    #[tokio::test]
    async fn test_mock_routes_and_counts() {
        let mock = MockTransport::new()
            .route(Method::Get, "/a", ApiResponse::ok(json!({"x": 1})))
            .route(Method::Put, "/a", ApiResponse::ok(json!({"x": 2})));

        let r = mock.execute(Method::Get, "/a", None).await.unwrap();
        assert_eq!(r.body, Some(json!({"x": 1})));

        mock.execute(Method::Put, "/a", Some(&json!({"x": 2})))
            .await
            .unwrap();
        assert_eq!(mock.write_count(), 1);
        assert_eq!(mock.calls().len(), 2);

        let missing = mock.execute(Method::Get, "/b", None).await.unwrap();
        assert_eq!(missing.status, 404);
    }

    #[tokio::test]
    async fn test_mock_unauthorized_is_error() {
        let mock = MockTransport::new().route(Method::Get, "/a", ApiResponse::new(401, None));
        let result = mock.execute(Method::Get, "/a", None).await;
        assert!(matches!(result, Err(StingrayError::AuthorizationFailure(_))));
    }
}
