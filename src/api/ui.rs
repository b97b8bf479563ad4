use axum::{
    body::Body,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "ui"]
struct UiAsset;

/// Serves the embedded single-page UI. Unknown paths get `index.html` so
/// client-side routes survive a reload.
pub async fn serve_asset(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    match UiAsset::get(path) {
        Some(content) => embedded(path, content.data.into_owned()),
        None => match UiAsset::get("index.html") {
            Some(content) => embedded("index.html", content.data.into_owned()),
            None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
        },
    }
}

fn embedded(path: &str, data: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        [(header::CONTENT_TYPE, mime.as_ref().to_string())],
        Body::from(data),
    )
        .into_response()
}
