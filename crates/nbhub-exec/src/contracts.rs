use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use nbhub_core::ApiFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn label(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartFile {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl MultipartFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            field: "files".to_string(),
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    None,
    Json(Value),
    Multipart(Vec<MultipartFile>),
    /// The payload failed to serialize; the request must not be sent.
    Unencodable(String),
}

/// Everything the HTTP boundary needs to perform one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub body: RequestBody,
    /// Attach the session's authorization header.
    pub authenticated: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: RequestBody::None,
            authenticated: true,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn post_json(url: impl Into<String>, body: impl Serialize) -> Self {
        Self::new(Method::Post, url).json(body)
    }

    pub fn patch_json(url: impl Into<String>, body: impl Serialize) -> Self {
        Self::new(Method::Patch, url).json(body)
    }

    pub fn json(mut self, body: impl Serialize) -> Self {
        self.body = match serde_json::to_value(body) {
            Ok(value) => RequestBody::Json(value),
            Err(err) => RequestBody::Unencodable(err.to_string()),
        };
        self
    }

    pub fn multipart(mut self, files: Vec<MultipartFile>) -> Self {
        self.body = RequestBody::Multipart(files);
        self
    }

    /// Set when the body could not be built; such a request fails locally.
    pub fn encoding_failure(&self) -> Option<ApiFailure> {
        match &self.body {
            RequestBody::Unencodable(reason) => Some(ApiFailure::local(format!(
                "Could not encode the request: {reason}"
            ))),
            _ => None,
        }
    }

    /// For endpoints reachable without a session.
    pub fn public(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiFailure> {
        let status = self.status;
        serde_json::from_value(self.body).map_err(|err| {
            ApiFailure::new(
                Some(status),
                serde_json::json!({ "detail": format!("unexpected response body: {err}") }),
            )
        })
    }

    /// Accepts either a single object or a list of them.
    pub fn decode_many<T: DeserializeOwned>(self) -> Result<Vec<T>, ApiFailure> {
        if self.body.is_array() {
            self.decode::<Vec<T>>()
        } else {
            self.decode::<T>().map(|item| vec![item])
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordReset {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenExchange {
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewServer {
    pub name: String,
    pub image_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplication {
    pub name: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// Card token minted by the payment provider; raw card numbers never pass through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCard {
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn update_payload_omits_untouched_fields() {
        let update = ProjectUpdate {
            description: Some("notes".to_string()),
            ..ProjectUpdate::default()
        };
        let request = RequestDescriptor::patch_json("http://api/v1/a/projects/1/", &update);
        assert_eq!(request.body, RequestBody::Json(json!({ "description": "notes" })));
        assert!(request.authenticated);
    }

    #[test]
    fn unserializable_payload_never_becomes_null() {
        let mut keyed = std::collections::BTreeMap::new();
        keyed.insert((1, 2), "pair keys are not valid JSON object keys");

        let request = RequestDescriptor::post_json("http://api/v1/a/teams/", &keyed);

        assert!(matches!(request.body, RequestBody::Unencodable(_)));
        let failure = request.encoding_failure().expect("local failure");
        assert!(failure.local);
        assert_eq!(failure.status, None);
        assert!(RequestDescriptor::get("http://api/").encoding_failure().is_none());
    }

    #[test]
    fn decode_many_accepts_object_or_list() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Item {
            id: String,
        }

        let one = ApiResponse::new(201, json!({ "id": "a" }));
        let many = ApiResponse::new(201, json!([{ "id": "a" }, { "id": "b" }]));
        assert_eq!(one.decode_many::<Item>().expect("one").len(), 1);
        assert_eq!(many.decode_many::<Item>().expect("many").len(), 2);
    }

    #[test]
    fn undecodable_success_becomes_failure() {
        let err = ApiResponse::new(200, json!({ "unexpected": true }))
            .decode::<Credentials>()
            .expect_err("shape");
        assert_eq!(err.status, Some(200));
        assert!(err.body["detail"].as_str().is_some());
    }
}
