use axum::{
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "web/dist"]
struct WebAssets;

/// Serve embedded static files (the upload page and its assets)
pub async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    // Try exact path first
    if let Some(content) = <WebAssets as Embed>::get(path) {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime.as_ref())],
            content.data.into_owned(),
        )
            .into_response();
    }

    // Serve the upload page for any unmatched route
    if let Some(content) = <WebAssets as Embed>::get("index.html") {
        return Html(String::from_utf8_lossy(&content.data).to_string()).into_response();
    }

    // Fallback: return a minimal page if no assets were embedded
    Html(FALLBACK_HTML.to_string()).into_response()
}

const FALLBACK_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Herbarium</title>
</head>
<body>
    <h1>Herbarium</h1>
    <p>Upload a plant photo to identify the species and its medicinal uses.</p>
    <form id="upload-form">
        <input type="file" id="file" name="file" accept="image/*">
        <button type="submit">Identify</button>
    </form>
    <pre id="result"></pre>
    <script>
        document.getElementById('upload-form').addEventListener('submit', async (e) => {
            e.preventDefault();
            const input = document.getElementById('file');
            const data = new FormData();
            if (input.files.length > 0) {
                data.append('file', input.files[0]);
            }
            const response = await fetch('/predict', { method: 'POST', body: data });
            document.getElementById('result').textContent =
                JSON.stringify(await response.json(), null, 2);
        });
    </script>
</body>
</html>
"#;
