use actix_web::{http::StatusCode, test, web, App};
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;

use question_image_service::config::UploadConfig;
use question_image_service::handlers;
use question_image_service::services::{InMemoryStorage, UploadService};

const BOUNDARY: &str = "----questionimageboundary";
const THRESHOLD: usize = 200 * 1024;

fn png_bytes(img: RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .expect("encode png");
    buf
}

fn solid_png(width: u32, height: u32) -> Vec<u8> {
    png_bytes(RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40])))
}

fn noise_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    png_bytes(RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        };
        image::Rgb([next(), next(), next()])
    }))
}

fn multipart_body(field: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"question.png\"\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(uri: &str, field: &str, data: &[u8]) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(field, data))
}

fn service_for(storage: Arc<InMemoryStorage>) -> web::Data<UploadService> {
    web::Data::new(UploadService::new(storage, UploadConfig::default()))
}

macro_rules! app_with {
    ($storage:expr) => {
        test::init_service(
            App::new()
                .app_data(service_for($storage))
                .configure(handlers::configure),
        )
        .await
    };
}

fn assert_question_url(url: &str, subject: &str) -> String {
    let prefix = format!("https://lumi-questions.s3.amazonaws.com/questions/{}/", subject);
    assert!(url.starts_with(&prefix), "unexpected url {url}");
    let id = url[prefix.len()..]
        .strip_suffix(".png")
        .expect("png suffix");
    assert_eq!(id.len(), 36);
    url["https://lumi-questions.s3.amazonaws.com/".len()..].to_string()
}

#[actix_web::test]
async fn small_png_is_stored_without_compression() {
    let storage = Arc::new(InMemoryStorage::new("lumi-questions"));
    let app = app_with!(storage.clone());
    // ~50 KiB of noise: a realistic photo-sized upload that still sits under the threshold
    let payload = noise_png(130, 130);
    assert!(payload.len() > 40 * 1024);
    assert!(payload.len() <= THRESHOLD);

    let resp = test::call_service(&app, upload_request("/upload/?subject=Math", "file", &payload).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "File uploaded successfully");
    let key = assert_question_url(body["url"].as_str().unwrap(), "math");

    let objects = storage.objects();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].key, key);
    assert_eq!(objects[0].content_type, "image/png");
    assert_eq!(objects[0].body.as_ref(), payload.as_slice());
}

#[actix_web::test]
async fn large_image_is_compressed_before_storage() {
    let storage = Arc::new(InMemoryStorage::new("lumi-questions"));
    let app = app_with!(storage.clone());
    let payload = noise_png(500, 500);
    assert!(payload.len() > THRESHOLD);

    let resp = test::call_service(&app, upload_request("/upload/?subject=Science", "file", &payload).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let key = assert_question_url(body["url"].as_str().unwrap(), "science");

    let objects = storage.objects();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].key, key);
    assert_ne!(objects[0].body.as_ref(), payload.as_slice());
    assert!(objects[0].body.len() <= THRESHOLD);
    assert!(image::load_from_memory(&objects[0].body).is_ok());
}

#[actix_web::test]
async fn garbage_over_threshold_is_rejected_without_write() {
    let storage = Arc::new(InMemoryStorage::new("lumi-questions"));
    let app = app_with!(storage.clone());
    let garbage = vec![0x42u8; THRESHOLD + 10];

    let resp = test::call_service(&app, upload_request("/upload/?subject=math", "file", &garbage).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Error uploading file:"), "{detail}");
    assert!(body.get("url").is_none());
    assert!(storage.objects().is_empty());
}

#[actix_web::test]
async fn storage_failure_returns_500_without_url() {
    let storage = Arc::new(InMemoryStorage::new("lumi-questions"));
    storage.fail_writes(true);
    let app = app_with!(storage.clone());

    let resp = test::call_service(
        &app,
        upload_request("/upload/?subject=math", "file", &solid_png(10, 10)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["detail"],
        "Error uploading file: S3 upload failed: simulated backend failure"
    );
    assert!(body.get("url").is_none());
}

#[actix_web::test]
async fn missing_subject_is_bad_request() {
    let storage = Arc::new(InMemoryStorage::new("lumi-questions"));
    let app = app_with!(storage.clone());

    let resp = test::call_service(&app, upload_request("/upload/", "file", &solid_png(10, 10)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("subject"));
    assert!(storage.objects().is_empty());
}

#[actix_web::test]
async fn missing_file_field_is_bad_request() {
    let storage = Arc::new(InMemoryStorage::new("lumi-questions"));
    let app = app_with!(storage.clone());

    let resp = test::call_service(
        &app,
        upload_request("/upload/?subject=math", "attachment", &solid_png(10, 10)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Missing multipart field 'file'");
    assert!(storage.objects().is_empty());
}

#[actix_web::test]
async fn repeated_uploads_get_distinct_urls() {
    let storage = Arc::new(InMemoryStorage::new("lumi-questions"));
    let app = app_with!(storage.clone());
    let payload = solid_png(20, 20);

    let mut urls = Vec::new();
    for _ in 0..2 {
        let resp = test::call_service(&app, upload_request("/upload?subject=MATH", "file", &payload).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        urls.push(body["url"].as_str().unwrap().to_string());
    }

    assert_ne!(urls[0], urls[1]);
    assert_eq!(storage.objects().len(), 2);
}

#[actix_web::test]
async fn health_and_metrics_endpoints_respond() {
    let storage = Arc::new(InMemoryStorage::new("lumi-questions"));
    let app = app_with!(storage);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/openapi.json").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
