use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::{error_response, AppState};
use crate::services::ServiceError;

const NO_FILE: &str = "No file uploaded.";
const UPLOADED: &str = "File uploaded successfully!";

pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let Ok(mut multipart) = multipart else {
        return error_response(StatusCode::BAD_REQUEST, NO_FILE);
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                log::warn!("Rejected upload: {}", e.body_text());
                return error_response(StatusCode::BAD_REQUEST, &e.body_text());
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Rejected upload {original_name:?}: {}", e.body_text());
                return error_response(StatusCode::BAD_REQUEST, &e.body_text());
            }
        };

        return match state.uploads.store(&original_name, &bytes).await {
            Ok(filename) => (
                StatusCode::OK,
                Json(json!({ "message": UPLOADED, "filename": filename })),
            )
                .into_response(),
            Err(e) => ServiceError::Internal(format!("Upload failed: {e:#}")).into_response(),
        };
    }

    error_response(StatusCode::BAD_REQUEST, NO_FILE)
}

pub async fn get_file(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    match state.uploads.retrieve(&filename).await {
        Ok(Some(bytes)) => {
            ([(header::CONTENT_TYPE, content_type(&filename))], bytes).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => ServiceError::Internal(format!("Could not serve upload: {e:#}")).into_response(),
    }
}

fn content_type(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{test_app, test_app_with_limit};
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt as _;

    const BOUNDARY: &str = "referral-boundary";

    fn multipart_request(field: &str, filename: &str, contents: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: image/png\r\n\r\n\
             {contents}\r\n\
             --{BOUNDARY}--\r\n"
        );

        Request::builder()
            .method("POST")
            .uri("/api/file/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn upload_then_download() {
        let app = test_app();

        let response = app
            .router
            .clone()
            .oneshot(multipart_request("file", "me.png", "png-bytes"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], UPLOADED);
        let filename = body["filename"].as_str().unwrap().to_string();
        assert!(filename.ends_with(".png"));

        let request = Request::builder()
            .uri(format!("/uploads/{filename}"))
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"png-bytes");
    }

    #[tokio::test]
    async fn upload_without_file_field_is_rejected() {
        let app = test_app();

        let response = app
            .router
            .clone()
            .oneshot(multipart_request("avatar", "me.png", "png-bytes"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": NO_FILE }));
    }

    #[tokio::test]
    async fn upload_without_multipart_body_is_rejected() {
        let app = test_app();

        let request = Request::builder()
            .method("POST")
            .uri("/api/file/upload")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_upload_is_not_found() {
        let app = test_app();

        let request = Request::builder()
            .uri("/uploads/file-0-missing.png")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upload_over_the_size_limit_is_rejected() {
        let app = test_app_with_limit(64);

        let response = app
            .router
            .clone()
            .oneshot(multipart_request("file", "big.png", &"x".repeat(1000)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
        let stored = std::fs::read_dir(app._uploads_dir.path()).unwrap().count();
        assert_eq!(stored, 0);
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type("a.jpeg"), "image/jpeg");
        assert_eq!(content_type("a.JPG"), "image/jpeg");
        assert_eq!(content_type("a"), "application/octet-stream");
    }
}
