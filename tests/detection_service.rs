mod common;

use std::sync::Arc;
use std::time::Duration;

use common::fixtures::{png_bytes, ColorDetector, Harness, SlowDetector, BLACK, BLUE, RED};

use accident_detect::application::dto::NO_DETECTIONS_MESSAGE;
use accident_detect::domain::errors::DomainError;

#[tokio::test]
async fn keeps_allow_listed_detections_rounded() {
    let h = Harness::new("car\ntruck\n");
    let report = h.service.detect_upload("crash.png", &png_bytes(RED)).await.unwrap();

    assert_eq!(report.raw_count, 2);
    assert_eq!(report.records.len(), 1);
    let car = &report.records[0];
    assert_eq!(car.class, "car");
    assert_eq!(car.confidence, 0.87);
    assert_eq!((car.x_min, car.y_min, car.x_max, car.y_max), (12.35, 6.79, 100.0, 80.5));
    assert_eq!(report.message(), None);
}

#[tokio::test]
async fn every_field_has_at_most_two_decimals() {
    let h = Harness::new("car\ntruck\nperson\n");
    let report = h.service.detect_upload("crash.png", &png_bytes(RED)).await.unwrap();

    assert_eq!(report.records.len(), 2);
    for r in &report.records {
        for v in [r.confidence, r.x_min, r.y_min, r.x_max, r.y_max] {
            assert!(((v * 100.0).round() - v * 100.0).abs() < 1e-6, "{v} not rounded");
        }
    }
}

#[tokio::test]
async fn no_detections_yields_message() {
    let h = Harness::new("car\n");
    let report = h.service.detect_upload("empty-road.jpg", &png_bytes(BLACK)).await.unwrap();

    assert!(report.records.is_empty());
    assert_eq!(report.message(), Some(NO_DETECTIONS_MESSAGE));
}

#[tokio::test]
async fn detections_outside_allow_list_give_the_empty_message() {
    let h = Harness::new("fire\n");
    let report = h.service.detect_upload("crash.png", &png_bytes(RED)).await.unwrap();

    assert_eq!(report.raw_count, 2);
    assert!(report.records.is_empty());
    assert_eq!(report.message(), Some(NO_DETECTIONS_MESSAGE));
}

#[tokio::test]
async fn same_filename_is_overwritten_and_results_follow_the_new_image() {
    let h = Harness::new("car\ntruck\n");

    let first = h.service.detect_upload("scene.png", &png_bytes(RED)).await.unwrap();
    assert_eq!(first.records[0].class, "car");

    let second = h.service.detect_upload("scene.png", &png_bytes(BLUE)).await.unwrap();
    assert_eq!(second.records.len(), 1);
    assert_eq!(second.records[0].class, "truck");

    let stored = std::fs::read(h.uploads_dir().join("scene.png")).unwrap();
    assert_eq!(stored, png_bytes(BLUE));
    assert_eq!(std::fs::read_dir(h.uploads_dir()).unwrap().count(), 1);
}

#[tokio::test]
async fn upload_is_written_under_its_original_name() {
    let h = Harness::new("car\n");
    let report = h.service.detect_upload("dir/../Crash Site.PNG", &png_bytes(RED)).await.unwrap();

    assert_eq!(report.filename, "Crash Site.PNG");
    assert!(h.uploads_dir().join("Crash Site.PNG").exists());
    assert_eq!(report.original.dimensions(), (32, 24));
}

#[tokio::test]
async fn rejects_unsupported_and_empty_uploads() {
    let h = Harness::new("car\n");

    let err = h.service.detect_upload("clip.gif", &png_bytes(RED)).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));

    let err = h.service.detect_upload("crash.png", &[]).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
}

#[tokio::test]
async fn undecodable_image_is_a_decode_error() {
    let h = Harness::new("car\n");
    let err = h.service.detect_upload("broken.jpg", b"definitely not a jpeg").await.unwrap_err();
    assert!(matches!(err, DomainError::ImageDecode(_)));
}

#[tokio::test]
async fn retention_never_removes_an_upload_still_being_detected() {
    let h = Harness::with_retention("car\ntruck\n", Arc::new(SlowDetector(Duration::from_millis(200))), 1);
    let red = png_bytes(RED);
    let blue = png_bytes(BLUE);

    let first = h.service.detect_upload("a.png", &red);
    let second = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.service.detect_upload("b.png", &blue).await
    };
    let (a, b) = tokio::join!(first, second);

    assert_eq!(a.unwrap().records[0].class, "car");
    assert_eq!(b.unwrap().records[0].class, "truck");

    let left: Vec<_> = std::fs::read_dir(h.uploads_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(left, ["b.png"]);
}

#[tokio::test]
async fn failed_detection_still_lets_retention_evict_the_file() {
    let h = Harness::with_retention("car\n", Arc::new(ColorDetector), 1);

    let err = h.service.detect_upload("broken.jpg", b"not an image").await.unwrap_err();
    assert!(matches!(err, DomainError::ImageDecode(_)));

    h.service.detect_upload("crash.png", &png_bytes(RED)).await.unwrap();
    assert!(!h.uploads_dir().join("broken.jpg").exists());
    assert!(h.uploads_dir().join("crash.png").exists());
}
