//! Delivery of built reports as HTTP downloads.
//!
//! [`ReportResponse`] turns a report into a `200 OK` attachment response.
//! [`ReportEndpoint`] serves registered reports over `tiny_http`, building a
//! fresh report for every request.

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::net::{SocketAddr, ToSocketAddrs};

use log::{debug, error, info, warn};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::error::ReportError;
use crate::report::Report;

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";
const ALLOWED_METHODS: &str = "GET, HEAD";

type ReportFactory = Box<dyn Fn() -> Box<dyn Report>>;

fn create_header(name: &str, value: &str) -> Result<Header, ReportError> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|_| ReportError::Http(format!("invalid {} header value {:?}", name, value)))
}

/// Status, headers and body of a report download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportResponse {
    pub status: u16,
    pub content_type: String,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
    pub allow: Option<String>,
}

impl ReportResponse {
    /// Builds `report` into an attachment named after the report's filename.
    ///
    /// Fails when the headers cannot be encoded, so a download never goes
    /// out without its `Content-Disposition`.
    pub fn from_report(report: &mut dyn Report) -> Result<Self, ReportError> {
        let body = report.build()?;
        let response = Self {
            status: 200,
            content_type: report.content_type().to_owned(),
            content_disposition: Some(attachment(report.filename())),
            body,
            allow: None,
        };
        response.headers()?;
        Ok(response)
    }

    fn plain(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: PLAIN_TEXT.to_owned(),
            content_disposition: None,
            body: message.as_bytes().to_vec(),
            allow: None,
        }
    }

    /// `404 Not Found` for paths without a registered report.
    pub fn not_found() -> Self {
        Self::plain(404, "Not Found")
    }

    /// `405 Method Not Allowed`, listing the accepted methods.
    pub fn method_not_allowed() -> Self {
        let mut response = Self::plain(405, "Method Not Allowed");
        response.allow = Some(ALLOWED_METHODS.to_owned());
        response
    }

    /// `500 Internal Server Error` for reports that failed to build.
    pub fn internal_error() -> Self {
        Self::plain(500, "Internal Server Error")
    }

    fn headers(&self) -> Result<Vec<Header>, ReportError> {
        let mut headers = vec![create_header("Content-Type", &self.content_type)?];
        if let Some(disposition) = &self.content_disposition {
            headers.push(create_header("Content-Disposition", disposition)?);
        }
        if let Some(allow) = &self.allow {
            headers.push(create_header("Allow", allow)?);
        }
        Ok(headers)
    }

    /// Converts into a `tiny_http` response.
    pub fn into_http(self) -> Result<Response<Cursor<Vec<u8>>>, ReportError> {
        let headers = self.headers()?;
        let mut response = Response::from_data(self.body).with_status_code(StatusCode(self.status));
        for header in headers {
            response = response.with_header(header);
        }
        Ok(response)
    }
}

/// `Content-Disposition` value offering `filename` as a download.
///
/// Names outside printable ASCII keep an ASCII `filename` fallback and carry
/// the exact name in an RFC 6266 `filename*` parameter.
pub fn attachment(filename: &str) -> String {
    let mut fallback = String::with_capacity(filename.len());
    let mut lossless = true;
    for ch in filename.chars() {
        match ch {
            '"' | '\\' => {
                fallback.push('\\');
                fallback.push(ch);
            }
            ' '..='~' => fallback.push(ch),
            _ => {
                fallback.push('_');
                lossless = false;
            }
        }
    }

    if lossless {
        format!("attachment; filename=\"{}\"", fallback)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(filename)
        )
    }
}

/// Serves registered reports over HTTP, one fresh report per request.
pub struct ReportEndpoint {
    server: Server,
    routes: HashMap<String, ReportFactory>,
}

impl ReportEndpoint {
    /// Binds the endpoint. Port `0` picks a free port; see [`Self::local_addr`].
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self, ReportError> {
        let server = Server::http(addr).map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        Ok(Self {
            server,
            routes: HashMap::new(),
        })
    }

    /// Address the server listens on, when it is an IP socket.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Registers `factory` for GET and HEAD requests on `path`.
    pub fn route<F, R>(&mut self, path: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> R + 'static,
        R: Report + 'static,
    {
        self.routes.insert(
            path.into(),
            Box::new(move || Box::new(factory()) as Box<dyn Report>),
        );
        self
    }

    /// Registered paths, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Produces the response for a request line.
    pub fn respond(&self, method: &Method, url: &str) -> ReportResponse {
        // HEAD is answered like GET; tiny_http leaves the body out.
        if !matches!(method, Method::Get | Method::Head) {
            return ReportResponse::method_not_allowed();
        }

        let path = url.split('?').next().unwrap_or(url);
        let Some(factory) = self.routes.get(path) else {
            debug!("No report registered for {}", path);
            return ReportResponse::not_found();
        };

        let mut report = factory();
        match ReportResponse::from_report(report.as_mut()) {
            Ok(response) => {
                info!(
                    "Serving {} ({}, {} bytes)",
                    report.filename(),
                    response.content_type,
                    response.body.len()
                );
                response
            }
            Err(err) => {
                error!("Failed to build report for {}: {}", path, err);
                ReportResponse::internal_error()
            }
        }
    }

    /// Answers a single request.
    pub fn handle(&self, request: Request) -> Result<(), ReportError> {
        let response = self.respond(request.method(), request.url());
        debug!(
            "{} {} -> {}",
            request.method(),
            request.url(),
            response.status
        );
        let response = match response.into_http() {
            Ok(response) => response,
            Err(err) => {
                error!("Failed to encode response for {}: {}", request.url(), err);
                ReportResponse::internal_error().into_http()?
            }
        };
        request.respond(response)?;
        Ok(())
    }

    /// Blocks until one request arrives and answers it.
    pub fn recv_one(&self) -> Result<(), ReportError> {
        let request = self.server.recv()?;
        self.handle(request)
    }

    /// Answers requests until the server shuts down.
    pub fn serve(&self) -> Result<(), ReportError> {
        if let Some(addr) = self.local_addr() {
            info!("Serving reports on http://{}", addr);
        }
        for request in self.server.incoming_requests() {
            if let Err(err) = self.handle(request) {
                warn!("Failed to answer request: {}", err);
            }
        }
        Ok(())
    }
}
