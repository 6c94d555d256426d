//! Router-level tests for the HTTP facade.
//!
//! A mock classifier stands in for the candle model so these tests pin
//! down the wire contract: JSON shapes, error strings, the 0-100
//! confidence scale, and the untrained-model warning.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use herbarium_core::{catalog, LabelSet, Prediction, Result};
use herbarium_model::{Classifier, ModelProvenance};
use herbarium_server::{create_router, AppState};
use http_body_util::BodyExt;
use image::DynamicImage;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// A configurable mock classifier for testing
struct MockClassifier {
    labels: LabelSet,
    probabilities: Vec<f32>,
    provenance: ModelProvenance,
    fail: bool,
}

impl MockClassifier {
    fn new() -> Self {
        // Mass concentrated on Neem Tree (9), then Holy Basil (4).
        let mut probabilities = vec![0.01; 10];
        probabilities[0] = 0.02;
        probabilities[8] = 0.02;
        probabilities[4] = 0.25;
        probabilities[9] = 0.65;
        Self {
            labels: catalog::label_set(),
            probabilities,
            provenance: ModelProvenance {
                strategy: "standard-strict",
                missing_parameters: 0,
                trained: true,
            },
            fail: false,
        }
    }

    fn untrained() -> Self {
        let mut mock = Self::new();
        mock.provenance = ModelProvenance {
            strategy: "untrained-fallback",
            missing_parameters: 0,
            trained: false,
        };
        mock
    }

    fn failing() -> Self {
        let mut mock = Self::new();
        mock.fail = true;
        mock
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, _image: DynamicImage) -> Result<Prediction> {
        if self.fail {
            return Err(herbarium_core::Error::inference("simulated failure"));
        }
        Prediction::from_probabilities(&self.labels, self.probabilities.clone())
            .ok_or_else(|| herbarium_core::Error::inference("bad mock distribution"))
    }

    fn labels(&self) -> &LabelSet {
        &self.labels
    }

    fn provenance(&self) -> &ModelProvenance {
        &self.provenance
    }

    fn name(&self) -> &str {
        "mock-classifier"
    }
}

fn app(mock: MockClassifier) -> axum::Router {
    create_router(AppState::new(Arc::new(mock)))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_request(field_name: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "herbarium-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; \
             name=\"{field_name}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        32,
        32,
        image::Rgb([40, 160, 60]),
    ));
    img.write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageFormat::Png,
    )
    .unwrap();
    bytes
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = app(MockClassifier::new())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_plant_info_known_plant() {
    let response = app(MockClassifier::new())
        .oneshot(
            Request::builder()
                .uri("/plant_info/Neem%20Tree")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["plant_name"], "Neem Tree");
    let uses: Vec<String> = body["medicinal_uses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u.as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        uses,
        vec![
            "Skin conditions and acne treatment",
            "Antimicrobial and antifungal properties",
            "Dental health and oral hygiene",
            "Immune system support",
            "Blood purification and detox",
        ]
    );
}

#[tokio::test]
async fn test_plant_info_unknown_plant() {
    let response = app(MockClassifier::new())
        .oneshot(
            Request::builder()
                .uri("/plant_info/Unknown%20Plant")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Plant not found");
}

#[tokio::test]
async fn test_predict_without_file_field() {
    let request = multipart_request("note", "note.txt", b"not a file upload");
    let response = app(MockClassifier::new()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_predict_with_empty_filename() {
    let request = multipart_request("file", "", &png_bytes());
    let response = app(MockClassifier::new()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No file selected");
}

#[tokio::test]
async fn test_predict_with_undecodable_image() {
    let request = multipart_request("file", "leaf.png", b"definitely not a png");
    let response = app(MockClassifier::new()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Error processing image"));
}

#[tokio::test]
async fn test_predict_success_shape() {
    let request = multipart_request("file", "leaf.png", &png_bytes());
    let response = app(MockClassifier::new()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["predicted_class"], "Neem Tree");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((confidence - 65.0).abs() < 0.1);
    assert_eq!(body["medicinal_uses"].as_array().unwrap().len(), 5);
    assert!(body.get("model_untrained").is_none());
    assert!(body.get("warning").is_none());

    let top = body["top_predictions"].as_array().unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0]["class"], "Neem Tree");
    assert_eq!(top[1]["class"], "Holy Basil");
    let confidences: Vec<f64> = top
        .iter()
        .map(|t| t["confidence"].as_f64().unwrap())
        .collect();
    assert!(confidences[0] >= confidences[1] && confidences[1] >= confidences[2]);
    let classes: Vec<&str> = top.iter().map(|t| t["class"].as_str().unwrap()).collect();
    assert_ne!(classes[0], classes[1]);
    assert_ne!(classes[1], classes[2]);
    for entry in top {
        assert_eq!(entry["uses"].as_array().unwrap().len(), 5);
    }
}

#[tokio::test]
async fn test_predict_flags_untrained_model() {
    let request = multipart_request("file", "leaf.png", &png_bytes());
    let response = app(MockClassifier::untrained())
        .oneshot(request)
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["model_untrained"], true);
    assert!(body["warning"].as_str().unwrap().contains("untrained"));
}

#[tokio::test]
async fn test_predict_inference_failure() {
    let request = multipart_request("file", "leaf.png", &png_bytes());
    let response = app(MockClassifier::failing()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Error in prediction");
}

#[tokio::test]
async fn test_index_page_served() {
    let response = app(MockClassifier::new())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("Herbarium"));
}
