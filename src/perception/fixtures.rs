//! Miniature Perception dataset written to disk for tests.
use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use serde_json::json;

use super::definitions::{BOUNDING_BOX, OBJECT_COUNT, RENDERED_OBJECT_INFO, SEMANTIC_SEGMENTATION};

pub const VERSION: &str = "0.0.1";
pub const ROTATION_DEF: &str = "camera-rotation";
pub const IMAGE_SIZE: (u32, u32) = (64, 48);
pub const RGB_COLOR: Rgb<u8> = Rgb([100, 100, 100]);
pub const SEGMENTATION_COLOR: Rgb<u8> = Rgb([200, 0, 0]);

fn labels() -> serde_json::Value {
    json!([
        {"label_id": 1, "label_name": "cereal"},
        {"label_id": 2, "label_name": "soda"},
        {"label_id": 3, "label_name": "candy"}
    ])
}

fn bbox(label_id: u64, x: f64, y: f64, width: f64, height: f64) -> serde_json::Value {
    json!({"label_id": label_id, "instance_id": 1, "x": x, "y": y, "width": width, "height": height})
}

fn capture(id: &str, boxes: serde_json::Value, segmentation: bool) -> serde_json::Value {
    let mut annotations = vec![json!({
        "id": format!("{id}-bbox"),
        "annotation_definition": BOUNDING_BOX,
        "values": boxes
    })];
    if segmentation {
        annotations.push(json!({
            "id": format!("{id}-seg"),
            "annotation_definition": SEMANTIC_SEGMENTATION,
            "filename": format!("SemanticSegmentation/segmentation_{id}.png"),
            "values": null
        }));
    }

    json!({
        "id": id,
        "sequence_id": format!("seq-{id}"),
        "step": 0,
        "timestamp": 0.0,
        "sensor": {"sensor_id": "camera", "ego_id": "ego", "modality": "camera",
                   "translation": [0.0, 0.0, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0]},
        "ego": {"ego_id": "ego", "translation": [0.0, 0.0, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0]},
        "filename": format!("RGB/rgb_{id}.png"),
        "format": "PNG",
        "annotations": annotations
    })
}

fn metric(capture_id: &str, def_id: &str, values: serde_json::Value) -> serde_json::Value {
    json!({
        "capture_id": capture_id,
        "annotation_id": null,
        "sequence_id": format!("seq-{capture_id}"),
        "step": 0,
        "metric_definition": def_id,
        "values": values
    })
}

fn write_json(path: &Path, value: &serde_json::Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// Writes three captures (`capture-a`, `capture-b`, `capture-c`) with boxes,
/// one segmentation image, rendered object info, object counts and camera rotations.
pub fn write_dataset(root: &Path) {
    let dataset = root.join("Dataset0001");

    write_json(&dataset.join("annotation_definitions.json"), &json!({
        "version": VERSION,
        "annotation_definitions": [
            {"id": BOUNDING_BOX, "name": "bounding box", "description": "", "format": "JSON", "spec": labels()},
            {"id": SEMANTIC_SEGMENTATION, "name": "semantic segmentation", "description": "", "format": "PNG", "spec": []}
        ]
    }));

    write_json(&dataset.join("metric_definitions.json"), &json!({
        "version": VERSION,
        "metric_definitions": [
            {"id": RENDERED_OBJECT_INFO, "name": "rendered object info", "description": "", "spec": labels()},
            {"id": OBJECT_COUNT, "name": "object count", "description": "", "spec": labels()},
            {"id": ROTATION_DEF, "name": "camera rotation", "description": "", "spec": []}
        ]
    }));

    write_json(&dataset.join("captures_000.json"), &json!({
        "version": VERSION,
        "captures": [
            capture("capture-a", json!([bbox(1, 2.0, 3.0, 10.0, 8.0), bbox(2, 30.0, 20.0, 12.0, 12.0)]), true),
            capture("capture-b", json!([bbox(1, 5.0, 5.0, 20.0, 20.0)]), false)
        ]
    }));
    write_json(&dataset.join("captures_001.json"), &json!({
        "version": VERSION,
        "captures": [capture("capture-c", json!([bbox(3, 40.0, 30.0, 8.0, 8.0)]), false)]
    }));

    write_json(&dataset.join("metrics_000.json"), &json!({
        "version": VERSION,
        "metrics": [
            metric("capture-a", RENDERED_OBJECT_INFO, json!([
                {"label_id": 1, "instance_id": 1, "visible_pixels": 120},
                {"label_id": 2, "instance_id": 2, "visible_pixels": 40}
            ])),
            metric("capture-b", RENDERED_OBJECT_INFO, json!([
                {"label_id": 1, "instance_id": 1, "visible_pixels": 300},
                {"label_id": 3, "instance_id": 2, "visible_pixels": 10}
            ])),
            metric("capture-c", RENDERED_OBJECT_INFO, json!([
                {"label_id": 1, "instance_id": 1, "visible_pixels": 55}
            ])),
            metric("capture-a", OBJECT_COUNT, json!([
                {"label_id": 1, "label_name": "cereal", "count": 1},
                {"label_id": 2, "label_name": "soda", "count": 1}
            ])),
            metric("capture-b", OBJECT_COUNT, json!([
                {"label_id": 1, "label_name": "cereal", "count": 1},
                {"label_id": 3, "label_name": "candy", "count": 1}
            ])),
            metric("capture-c", OBJECT_COUNT, json!([
                {"label_id": 1, "label_name": "cereal", "count": 1}
            ]))
        ]
    }));
    write_json(&dataset.join("metrics_001.json"), &json!({
        "version": VERSION,
        "metrics": [
            metric("capture-a", ROTATION_DEF, json!([{"x_rotation": 0.0, "y_rotation": 0.0, "z_rotation": 0.0}])),
            metric("capture-b", ROTATION_DEF, json!([{"x_rotation": 90.0, "y_rotation": 0.0, "z_rotation": 0.0}])),
            metric("capture-c", ROTATION_DEF, json!([{"x_rotation": 0.0, "y_rotation": 90.0, "z_rotation": 45.0}]))
        ]
    }));

    let (width, height) = IMAGE_SIZE;
    for id in ["capture-a", "capture-b", "capture-c"] {
        let path = root.join("RGB").join(format!("rgb_{id}.png"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(width, height, RGB_COLOR).save(&path).unwrap();
    }

    let segmentation = root.join("SemanticSegmentation").join("segmentation_capture-a.png");
    fs::create_dir_all(segmentation.parent().unwrap()).unwrap();
    RgbImage::from_pixel(width, height, SEGMENTATION_COLOR).save(&segmentation).unwrap();
}
