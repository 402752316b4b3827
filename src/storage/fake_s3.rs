//! Local stand-in for an S3-compatible endpoint
//!
//! Serves just enough of the REST API for `S3Manager` to run against it over
//! real HTTP (path-style addressing) and records every request it receives.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use actix_web::{
    body,
    dev::ServerHandle,
    http::{header, Method},
    web, App, HttpRequest, HttpResponse, HttpServer,
};

pub const UPLOAD_ID: &str = "upload-1";

const XML: &str = "application/xml";

/// How the endpoint answers HeadObject
#[derive(Debug, Clone, Copy)]
pub enum HeadResponse {
    Found(usize),
    NoContentLength,
    Missing,
    Forbidden,
}

/// Canned behavior of the endpoint
#[derive(Debug, Clone, Copy)]
pub struct Behavior {
    pub head: HeadResponse,
    /// Part number whose UploadPart is rejected
    pub fail_part: Option<u32>,
}

impl Default for Behavior {
    fn default() -> Self {
        Behavior {
            head: HeadResponse::Found(0),
            fail_part: None,
        }
    }
}

/// A request as seen by the endpoint
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body_len: usize,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }
}

#[derive(Clone)]
struct EndpointState {
    behavior: Behavior,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct FakeS3 {
    addr: SocketAddr,
    handle: ServerHandle,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeS3 {
    /// Bind to an ephemeral port on the loopback interface and start serving
    pub fn start(behavior: Behavior) -> std::io::Result<Self> {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = EndpointState {
            behavior,
            requests: requests.clone(),
        };

        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .app_data(web::PayloadConfig::new(64 * 1024 * 1024))
                .default_service(web::to(respond))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))?;

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_rt::spawn(server);

        Ok(FakeS3 { addr, handle, requests })
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}

async fn respond(
    req: HttpRequest,
    payload: web::Bytes,
    state: web::Data<EndpointState>,
) -> HttpResponse {
    let params: HashMap<String, String> = url::form_urlencoded::parse(req.query_string().as_bytes())
        .into_owned()
        .collect();
    let headers = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let recorded = RecordedRequest {
        method: req.method().clone(),
        path: req.path().to_string(),
        params,
        headers,
        body_len: payload.len(),
    };
    let response = dispatch(&recorded, &state.behavior);
    state.requests.lock().unwrap().push(recorded);
    response
}

fn dispatch(req: &RecordedRequest, behavior: &Behavior) -> HttpResponse {
    match req.method {
        Method::HEAD => match behavior.head {
            // HEAD responses keep the would-be body's length and drop the body
            HeadResponse::Found(size) => HttpResponse::Ok()
                .insert_header((header::ETAG, "\"object-etag\""))
                .body(vec![0u8; size]),
            HeadResponse::NoContentLength => HttpResponse::Ok().body(body::None::new()),
            HeadResponse::Missing => HttpResponse::NotFound().finish(),
            HeadResponse::Forbidden => HttpResponse::Forbidden().finish(),
        },
        Method::PUT => match req.params.get("partNumber") {
            Some(part) if behavior.fail_part.is_some_and(|n| part.parse::<u32>() == Ok(n)) => {
                HttpResponse::BadRequest().content_type(XML).body(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                     <Error><Code>InvalidArgument</Code><Message>Part rejected</Message>\
                     <RequestId>fake</RequestId></Error>",
                )
            }
            Some(part) => HttpResponse::Ok()
                .insert_header((header::ETAG, format!("\"part-{}\"", part)))
                .finish(),
            None => HttpResponse::Ok()
                .insert_header((header::ETAG, "\"object-etag\""))
                .finish(),
        },
        Method::POST if req.has_param("uploads") => {
            HttpResponse::Ok().content_type(XML).body(format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                 <InitiateMultipartUploadResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
                 <Bucket>{bucket}</Bucket><Key>{key}</Key><UploadId>{UPLOAD_ID}</UploadId>\
                 </InitiateMultipartUploadResult>",
                bucket = bucket_of(&req.path),
                key = key_of(&req.path),
            ))
        }
        Method::POST if req.has_param("uploadId") => {
            HttpResponse::Ok().content_type(XML).body(format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                 <CompleteMultipartUploadResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
                 <Bucket>{bucket}</Bucket><Key>{key}</Key><ETag>\"object-etag\"</ETag>\
                 </CompleteMultipartUploadResult>",
                bucket = bucket_of(&req.path),
                key = key_of(&req.path),
            ))
        }
        Method::DELETE => HttpResponse::NoContent().finish(),
        _ => HttpResponse::MethodNotAllowed().finish(),
    }
}

fn bucket_of(path: &str) -> &str {
    path.trim_start_matches('/').split('/').next().unwrap_or_default()
}

fn key_of(path: &str) -> &str {
    path.trim_start_matches('/')
        .split_once('/')
        .map(|(_, key)| key)
        .unwrap_or_default()
}
