//! The request and response types the view mixin works with.

use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderValue, Method, StatusCode};

use crispy_ext_core::{CrispyError, CrispyResult};
use crispy_ext_forms::data::{Files, FormData};

use crate::multipart::{extract_boundary, parse_multipart};

/// The parts of an HTTP request a form view needs.
#[derive(Debug, Clone)]
pub struct FormRequest {
    /// The request method.
    pub method: Method,
    /// Parsed form body.
    pub post: FormData,
    /// Uploaded files.
    pub files: Files,
}

impl Default for FormRequest {
    fn default() -> Self {
        Self::get()
    }
}

impl FormRequest {
    /// A `GET` request.
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            post: FormData::new(),
            files: Files::new(),
        }
    }

    /// A `POST` request with a form body.
    pub fn post(data: FormData) -> Self {
        Self {
            method: Method::POST,
            post: data,
            files: Files::new(),
        }
    }

    /// Sets the method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the uploaded files.
    #[must_use]
    pub fn with_files(mut self, files: Files) -> Self {
        self.files = files;
        self
    }

    /// Returns `true` for methods that carry a form payload.
    pub fn has_payload(&self) -> bool {
        self.method == Method::POST || self.method == Method::PUT
    }

    /// Builds a form request from an HTTP request.
    ///
    /// `application/x-www-form-urlencoded` bodies fill `post`;
    /// `multipart/form-data` bodies fill `post` and `files`. Any other body
    /// is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CrispyError::BadRequest`] for a multipart request without a
    /// boundary or with an oversized upload.
    ///
    /// # Examples
    ///
    /// ```
    /// use crispy_ext_views::request::FormRequest;
    ///
    /// let request = http::Request::builder()
    ///     .method(http::Method::POST)
    ///     .header("content-type", "application/x-www-form-urlencoded")
    ///     .body(b"name=Ada+Lovelace".to_vec())
    ///     .unwrap();
    /// let request = FormRequest::from_http(&request).unwrap();
    /// assert_eq!(request.post.get("name"), Some("Ada Lovelace"));
    /// ```
    pub fn from_http(request: &http::Request<Vec<u8>>) -> CrispyResult<Self> {
        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let (post, files) = match mime.as_str() {
            "application/x-www-form-urlencoded" => (
                FormData::parse(&String::from_utf8_lossy(request.body())),
                Files::new(),
            ),
            "multipart/form-data" => {
                let boundary = extract_boundary(content_type).ok_or_else(|| {
                    CrispyError::BadRequest("Multipart request has no boundary".to_string())
                })?;
                let data = parse_multipart(request.body(), boundary)?;
                (data.fields, data.files)
            }
            _ => {
                if !request.body().is_empty() {
                    tracing::debug!(content_type, "Ignoring request body");
                }
                (FormData::new(), Files::new())
            }
        };

        Ok(Self {
            method: request.method().clone(),
            post,
            files,
        })
    }
}

/// The response type views return.
pub type Response = http::Response<String>;

/// A 302 redirect to `url`.
///
/// # Errors
///
/// Returns [`CrispyError::ImproperlyConfigured`] when `url` cannot be used
/// as a `Location` header value.
pub fn redirect(url: &str) -> CrispyResult<Response> {
    let location = HeaderValue::from_str(url).map_err(|_| {
        CrispyError::ImproperlyConfigured(format!("Invalid redirect URL {url:?}"))
    })?;
    let mut response = http::Response::new(String::new());
    *response.status_mut() = StatusCode::FOUND;
    response.headers_mut().insert(LOCATION, location);
    Ok(response)
}
