// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fan-out across several upstream models

use detection_relay::detection::{
    analyze, DetectionBox, DetectionService, ImageDimensions, ImagePayload, ModelOutcome,
    ModelTarget, RoboflowClient,
};
use serde_json::json;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use super::mock_upstream::{closed_template, detection_body, MockUpstream, Reply};

fn image() -> ImagePayload {
    ImagePayload::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46])
        .unwrap()
}

fn bottle_body() -> serde_json::Value {
    json!({
        "image": {"width": 640, "height": 480},
        "predictions": [
            {"class": "bottle", "confidence": 0.92, "x": 100, "y": 150, "width": 40, "height": 60}
        ]
    })
}

#[tokio::test]
async fn test_one_success_one_server_error() {
    let upstream = MockUpstream::start(vec![
        ("m1", Reply::ok(bottle_body())),
        ("m2", Reply::status(500, "Internal Server Error")),
    ])
    .await;

    let targets = vec![
        ModelTarget::new("m1", "k1", upstream.template()),
        ModelTarget::new("m2", "k2", upstream.template()),
    ];
    let service = DetectionService::hosted(targets, None).unwrap();
    let result = service.analyze(&image()).await.unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(
        result.get("m1"),
        Some(&ModelOutcome::Success {
            detections: vec![DetectionBox {
                label: "bottle".to_string(),
                confidence: 0.92,
                x: 100.0,
                y: 150.0,
                width: 40.0,
                height: 60.0,
            }],
            image: ImageDimensions {
                width: 640,
                height: 480,
            },
        })
    );
    assert!(result
        .get("m2")
        .and_then(|o| o.failure_message())
        .unwrap()
        .contains("status 500"));

    let merged = result.merged_detections();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].model, "m1");
}

#[tokio::test]
async fn test_all_targets_unreachable() {
    let targets = vec![
        ModelTarget::new("m1", "k", closed_template()),
        ModelTarget::new("m2", "k", closed_template()),
    ];
    let service = DetectionService::hosted(targets, None).unwrap();
    let result = service.analyze(&image()).await.unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.failure_count(), 2);
    assert!(result.iter().all(|(_, o)| !o.is_success()));
}

#[tokio::test]
async fn test_all_targets_time_out() {
    let slow = Reply::ok(detection_body(json!([]))).delayed(Duration::from_secs(3));
    let upstream = MockUpstream::start(vec![("m1", slow.clone()), ("m2", slow)]).await;

    let targets = vec![
        ModelTarget::new("m1", "k", upstream.template()),
        ModelTarget::new("m2", "k", upstream.template()),
    ];
    let service = DetectionService::hosted(targets, Some(Duration::from_millis(200))).unwrap();
    let result = service.analyze(&image()).await.unwrap();

    assert_eq!(result.failure_count(), 2);
}

#[tokio::test]
async fn test_key_set_matches_targets() {
    let upstream = MockUpstream::start(vec![
        ("a", Reply::ok(detection_body(json!([])))),
        ("b", Reply::status(404, "not found")),
        ("c", Reply::raw("garbage")),
        ("d", Reply::ok(bottle_body())),
    ])
    .await;

    let ids = ["a", "b", "c", "d", "unknown"];
    let targets: Vec<_> = ids
        .iter()
        .map(|id| ModelTarget::new(*id, "k", upstream.template()))
        .collect();

    let client = RoboflowClient::new(None).unwrap();
    let result = analyze(&client, &image(), &targets).await.unwrap();

    let keys: HashSet<&str> = result.ids().collect();
    let expected: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(keys, expected);
    assert_eq!(result.len(), ids.len());
    assert_eq!(result.ids().collect::<Vec<_>>(), ids.to_vec());
    assert_eq!(result.success_count(), 2);
}

#[tokio::test]
async fn test_empty_target_list() {
    let client = RoboflowClient::new(None).unwrap();
    let result = analyze(&client, &image(), &[]).await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_submissions_overlap() {
    let delay = Duration::from_millis(400);
    let replies: Vec<_> = ["m1", "m2", "m3", "m4"]
        .into_iter()
        .map(|id| (id, Reply::ok(bottle_body()).delayed(delay)))
        .collect();
    let upstream = MockUpstream::start(replies).await;

    let targets: Vec<_> = ["m1", "m2", "m3", "m4"]
        .iter()
        .map(|id| ModelTarget::new(*id, "k", upstream.template()))
        .collect();
    let service = DetectionService::hosted(targets, None).unwrap();

    let start = Instant::now();
    let result = service.analyze(&image()).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(result.success_count(), 4);
    // Sequential submission would take at least 4 * delay
    assert!(elapsed < delay * 3, "took {:?}", elapsed);
    assert_eq!(upstream.requests().len(), 4);
}
