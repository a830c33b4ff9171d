//! Shared helpers for HTTP integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::Value;
use std::sync::{Arc, Mutex};

use drawing_analyzer::services::{AnalysisGateway, AnalysisPrompt, GatewayError};
use drawing_analyzer::{create_app, AppState, Settings};

pub const BOUNDARY: &str = "drawing-analyzer-test-boundary";

/// Gateway that replays a canned answer and records every prompt it gets.
pub struct FakeGateway {
    reply: Result<String, GatewayError>,
    configured: bool,
    prompts: Mutex<Vec<AnalysisPrompt>>,
}

impl FakeGateway {
    pub fn replying(body: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(body.into()),
            configured: true,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: GatewayError) -> Arc<Self> {
        Arc::new(Self {
            configured: !error.is_configuration(),
            reply: Err(error),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<AnalysisPrompt> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AnalysisGateway for FakeGateway {
    async fn complete(&self, prompt: &AnalysisPrompt) -> Result<String, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.reply.clone()
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

pub fn test_app(gateway: Arc<FakeGateway>) -> Router {
    test_app_with(Settings::default(), gateway)
}

pub fn test_app_with(settings: Settings, gateway: Arc<FakeGateway>) -> Router {
    create_app(AppState::new(settings, gateway))
}

/// Builds a `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, file_name: &str, content_type: &str, content: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(content);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    /// File part without a `Content-Type` header.
    pub fn untyped_file(mut self, file_name: &str, content: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(content);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
        self
    }

    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.bytes
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::CONTENT_LENGTH, self.bytes.len())
            .body(Body::from(self.bytes))
            .unwrap()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A report the way the model is asked to produce it.
pub fn model_report() -> Value {
    serde_json::json!({
        "projectType": "eletrico",
        "scale": {"detected": true, "value": "1:50", "ratio": 50},
        "projectName": "Residência Modelo",
        "symbols": [{"code": "TUG", "name": "Tomada", "count": 12, "category": "eletrico"}],
        "areas": [{"room": "Sala", "area": 18.5}],
        "totalArea": 72.4,
        "walls": [],
        "electricalPoints": [{"type": "tomada", "room": "Sala", "circuit": "C1"}],
        "hydraulicPoints": [],
        "structuralElements": [],
        "observations": ["Legenda completa"],
        "inconsistencies": [],
        "suggestions": []
    })
}

/// One-page PDF whose only content is `line`.
pub fn single_page_pdf(line: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(line)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
