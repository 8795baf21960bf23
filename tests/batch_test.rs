use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use barcode_scanner_api::config::ScannerConfig;
use barcode_scanner_api::decode::{ScanOptions, code128, ean13, frame_from_row};
use barcode_scanner_api::services::decoder::create_decoder;
use barcode_scanner_api::services::extraction::ExtractionService;
use barcode_scanner_api::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "---------------------------987654321098765432109876543";

fn make_app(config: ScannerConfig) -> axum::Router {
    let decoder = Arc::from(create_decoder("builtin", ScanOptions::default()));
    let extraction = Arc::new(ExtractionService::new(config.clone(), decoder));
    create_app(AppState { extraction, config })
}

fn png_of_row(row: &[u8], height: u32) -> Vec<u8> {
    let frame = frame_from_row(row, height);
    let img = image::GrayImage::from_raw(frame.width, frame.height, frame.data).unwrap();
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

fn multipart_body(files: &[(&str, &str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (filename, content_type, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn batch_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/extract-barcode-batch")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_batch_mixed_outcomes_keep_order() {
    let app = make_app(ScannerConfig::default());
    let body = multipart_body(&[
        (
            "first.png",
            "image/png",
            png_of_row(&ean13::encode_row("5901234123457", 2), 64),
        ),
        (
            "broken.png",
            "image/png",
            b"these bytes are not a png".to_vec(),
        ),
        (
            "third.png",
            "image/png",
            png_of_row(&code128::encode_row("PKG-77", 2), 48),
        ),
    ]);

    let response = app.oneshot(batch_request(body)).await.unwrap();
    // Per-file failures never fail the batch call itself.
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["total_files"], 3);

    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["filename"], "first.png");
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[0]["barcodes"][0]["data"], "5901234123457");

    assert_eq!(results[1]["filename"], "broken.png");
    assert_eq!(results[1]["success"], false);
    assert!(
        results[1]["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid image:")
    );
    assert_eq!(results[1]["count"], 0);

    assert_eq!(results[2]["filename"], "third.png");
    assert_eq!(results[2]["success"], true);
    assert_eq!(results[2]["barcodes"][0]["type"], "CODE128");
}

#[tokio::test]
async fn test_batch_all_failed_is_unsuccessful() {
    let app = make_app(ScannerConfig::default());
    let body = multipart_body(&[
        ("a.txt", "text/plain", b"plain text".to_vec()),
        ("b.png", "image/png", b"junk".to_vec()),
    ]);

    let response = app.oneshot(batch_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["total_files"], 2);
    let results = json["results"].as_array().unwrap();
    assert!(results.iter().all(|r| r["success"] == false));
}

#[tokio::test]
async fn test_batch_without_files_is_rejected() {
    let app = make_app(ScannerConfig::default());
    let body = format!("--{BOUNDARY}--\r\n").into_bytes();

    let response = app.oneshot(batch_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "No files provided");
}

#[tokio::test]
async fn test_batch_oversized_file_fails_in_place() {
    let png = png_of_row(&ean13::encode_row("4006381333931", 2), 64);
    let app = make_app(ScannerConfig {
        max_file_size: png.len(),
        ..ScannerConfig::default()
    });

    let body = multipart_body(&[
        ("fits.png", "image/png", png.clone()),
        ("huge.png", "image/png", vec![0u8; png.len() + 1]),
    ]);

    let response = app.oneshot(batch_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["total_files"], 2);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[1]["success"], false);
    assert!(
        results[1]["message"]
            .as_str()
            .unwrap()
            .contains("maximum limit")
    );
}

#[tokio::test]
async fn test_batch_many_files_preserve_submission_order() {
    let app = make_app(ScannerConfig::default());
    let codes = [
        "5901234123457",
        "4006381333931",
        "9638507543129",
        "1234567890128",
    ];
    let files: Vec<(&str, &str, Vec<u8>)> = codes
        .iter()
        .enumerate()
        .map(|(i, code)| {
            let name: &str = match i {
                0 => "scan0.png",
                1 => "scan1.png",
                2 => "scan2.png",
                _ => "scan3.png",
            };
            (name, "image/png", png_of_row(&ean13::encode_row(code, 2), 64))
        })
        .collect();
    let body = multipart_body(&files);

    let response = app.oneshot(batch_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), codes.len());
    for (i, code) in codes.iter().enumerate() {
        assert_eq!(results[i]["filename"], format!("scan{i}.png"));
        assert_eq!(results[i]["success"], true);
        assert_eq!(results[i]["barcodes"][0]["data"], *code);
    }
}
