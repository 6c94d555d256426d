//! HTTP routes for the classification service.
//!
//! Recoverable failures (missing upload, undecodable image, inference
//! errors) are reported as `{"error": ...}` JSON bodies with HTTP 200,
//! matching the behavior callers of this API already depend on. Only the
//! request-framing layer itself produces non-200 statuses.

use crate::state::AppState;
use crate::static_files;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use herbarium_core::{catalog, Prediction};
use herbarium_model::Classifier;
use serde::Serialize;
use serde_json::{json, Value};

/// Upload size cap for the predict route
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Build the Axum application
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/plant_info/:plant_name", get(plant_info))
        .fallback(static_files::serve_static)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// One entry of the top-3 ranking
#[derive(Debug, Serialize)]
pub struct TopPrediction {
    pub class: String,
    /// Percentage confidence (0-100)
    pub confidence: f32,
    pub uses: Vec<&'static str>,
}

/// Successful prediction response
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub predicted_class: String,
    /// Percentage confidence (0-100)
    pub confidence: f32,
    pub medicinal_uses: Vec<&'static str>,
    pub top_predictions: Vec<TopPrediction>,
    /// Set when the service is running on the freshly initialized
    /// fallback network; such predictions carry no signal.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub model_untrained: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

pub async fn predict(State(state): State<AppState>, mut multipart: Multipart) -> Json<Value> {
    // Find the `file` field, skipping any other form fields.
    let field = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => break field,
            Ok(Some(_)) => continue,
            Ok(None) => return Json(json!({ "error": "No file uploaded" })),
            Err(e) => {
                return Json(json!({ "error": format!("Error processing image: {}", e) }));
            }
        }
    };

    if field.file_name().unwrap_or("").is_empty() {
        return Json(json!({ "error": "No file selected" }));
    }

    let bytes = match field.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => return Json(json!({ "error": format!("Error processing image: {}", e) })),
    };

    let image = match herbarium_model::decode_image(&bytes) {
        Ok(image) => image,
        Err(e) => return Json(json!({ "error": format!("Error processing image: {}", e) })),
    };

    let prediction = match state.classifier.classify(image).await {
        Ok(prediction) => prediction,
        Err(e) => {
            tracing::error!("Prediction failed: {}", e);
            return Json(json!({ "error": "Error in prediction" }));
        }
    };

    let response = build_predict_response(state.classifier.as_ref(), &prediction);
    match serde_json::to_value(&response) {
        Ok(value) => Json(value),
        Err(e) => {
            tracing::error!("Failed to serialize prediction: {}", e);
            Json(json!({ "error": "Error in prediction" }))
        }
    }
}

fn build_predict_response(classifier: &dyn Classifier, prediction: &Prediction) -> PredictResponse {
    let labels = classifier.labels();
    let top_predictions = prediction
        .top_k(3)
        .into_iter()
        .filter_map(|(index, probability)| {
            let class = labels.get(index)?.to_string();
            let uses = catalog::medicinal_uses(&class).unwrap_or_default().to_vec();
            Some(TopPrediction {
                class,
                confidence: probability * 100.0,
                uses,
            })
        })
        .collect();

    let untrained = !classifier.provenance().trained;
    PredictResponse {
        success: true,
        predicted_class: prediction.label.clone(),
        confidence: prediction.confidence * 100.0,
        medicinal_uses: catalog::medicinal_uses(&prediction.label)
            .unwrap_or_default()
            .to_vec(),
        top_predictions,
        model_untrained: untrained,
        warning: untrained.then(|| {
            "Model weights could not be loaded; predictions come from an untrained network"
                .to_string()
        }),
    }
}

pub async fn plant_info(Path(plant_name): Path<String>) -> Json<Value> {
    match catalog::medicinal_uses(&plant_name) {
        Some(uses) => Json(json!({
            "plant_name": plant_name,
            "medicinal_uses": uses,
        })),
        None => Json(json!({ "error": "Plant not found" })),
    }
}
