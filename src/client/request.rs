//! Request and response values passed through the client

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::endpoint::Endpoint;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    File {
        field: String,
        file_name: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

/// One logical call to the backend
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub endpoint: Endpoint,
    pub body: RequestBody,
    pub is_long_running: bool,
    pub is_admin_action: bool,
}

impl RequestContext {
    /// Context with flags taken from the endpoint table
    pub fn new(endpoint: Endpoint) -> Self {
        let spec = endpoint.spec();
        Self {
            endpoint,
            body: RequestBody::Empty,
            is_long_running: spec.long_running,
            is_admin_action: spec.admin_action,
        }
    }

    pub fn json<T: Serialize>(endpoint: Endpoint, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(endpoint).with_body(RequestBody::Json(serde_json::to_value(payload)?)))
    }

    pub fn form(endpoint: Endpoint, fields: &[(&str, &str)]) -> Self {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::new(endpoint).with_body(RequestBody::Form(fields))
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn admin_action(mut self, flag: bool) -> Self {
        self.is_admin_action = flag;
        self
    }

    pub fn long_running(mut self, flag: bool) -> Self {
        self.is_long_running = flag;
        self
    }
}

/// A 2xx or non-2xx response that reached the client
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json_body(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// A body like `{"message": "..."}` with nothing else in it, returned
    /// by backends that do not implement an endpoint
    pub fn is_absent_sentinel(&self) -> bool {
        match serde_json::from_slice::<Value>(&self.body) {
            Ok(Value::Object(map)) => {
                map.contains_key("message") && map.keys().all(|k| k == "message" || k == "detail")
            }
            _ => false,
        }
    }
}
