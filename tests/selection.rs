//! Split selection integration tests.

mod common;

use std::collections::HashSet;

use common::{annotation, collection, image};
use framepick::{AllowLists, AnnotationCollection, DistortionAllowList, SequenceManifest, select};
use serde_json::Value;

/// Allow-lists from `(sequence, "space separated labels")` pairs.
fn allow(entries: &[(&str, &str)]) -> AllowLists {
    entries
        .iter()
        .map(|(sequence, labels)| {
            (
                sequence.to_string(),
                DistortionAllowList::new(labels.split_whitespace()),
            )
        })
        .collect()
}

/// Three sequences, three distortions, two levels; annotations on every
/// other image plus one dangling annotation.
fn corpus() -> AnnotationCollection {
    let mut images = Vec::new();
    let mut annotations = Vec::new();
    let mut id = 0;

    for sequence in ["seq1", "seq2", "seq3"] {
        for distortion in ["blur", "noise", "jpeg"] {
            for level in [1, 2] {
                id += 1;
                images.push(image(id, sequence, distortion, level, "0001"));
                if id % 2 == 1 {
                    annotations.push(annotation(1000 + id, id));
                }
            }
        }
    }
    annotations.push(annotation(9999, 4242));

    collection(images, annotations)
}

#[test]
fn keeps_only_allowed_distortion_and_its_annotation() {
    let global = collection(
        vec![
            image(1, "seq1", "blur", 1, "0003"),
            image(2, "seq1", "noise", 1, "0003"),
        ],
        vec![annotation(10, 1), annotation(11, 2)],
    );

    let subset = select(
        &global,
        &SequenceManifest::new(["seq1"]),
        &allow(&[("seq1", "blur")]),
    );

    let image_ids: Vec<u64> = subset.images.iter().map(|image| image.id()).collect();
    assert_eq!(image_ids, [1]);
    assert_eq!(subset.annotations.len(), 1);
    assert_eq!(subset.annotations[0].image_id(), 1);
}

#[test]
fn selection_matches_membership_rule() {
    let global = corpus();
    let manifest = SequenceManifest::new(["seq3", "seq1"]);
    let allow_lists = allow(&[("seq1", "blur jpeg"), ("seq3", "noise")]);

    let subset = select(&global, &manifest, &allow_lists);
    let kept: HashSet<u64> = subset.images.iter().map(|image| image.id()).collect();

    for image in &global.images {
        let sequence = image.video_name().unwrap();
        let expected = manifest.names().iter().any(|name| name == sequence)
            && allow_lists[sequence].contains(image.distortion_type().unwrap());
        assert_eq!(kept.contains(&image.id()), expected, "image {}", image.id());
    }

    for annotation in &global.annotations {
        let retained = subset
            .annotations
            .iter()
            .any(|kept_annotation| std::ptr::eq(*kept_annotation, annotation));
        assert_eq!(retained, kept.contains(&annotation.image_id()));
    }
}

#[test]
fn selection_preserves_global_order() {
    let global = corpus();
    // Manifest order is the reverse of the corpus order.
    let subset = select(
        &global,
        &SequenceManifest::new(["seq3", "seq2", "seq1"]),
        &allow(&[
            ("seq1", "noise"),
            ("seq2", "noise"),
            ("seq3", "noise"),
        ]),
    );

    let ids: Vec<u64> = subset.images.iter().map(|image| image.id()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
    assert_eq!(ids.len(), 6);

    let annotation_ids: Vec<u64> = subset
        .annotations
        .iter()
        .map(|annotation| annotation.fields()["id"].as_u64().unwrap())
        .collect();
    let mut sorted = annotation_ids.clone();
    sorted.sort_unstable();
    assert_eq!(annotation_ids, sorted);
}

#[test]
fn sequence_without_allow_list_contributes_nothing() {
    let global = corpus();
    let subset = select(
        &global,
        &SequenceManifest::new(["seq1", "seq2"]),
        &allow(&[("seq1", ""), ("seq3", "blur")]),
    );

    assert!(subset.images.is_empty());
    assert!(subset.annotations.is_empty());
}

#[test]
fn dangling_annotations_are_dropped() {
    let global = corpus();
    let subset = select(
        &global,
        &SequenceManifest::new(["seq1", "seq2", "seq3"]),
        &allow(&[
            ("seq1", "blur noise jpeg"),
            ("seq2", "blur noise jpeg"),
            ("seq3", "blur noise jpeg"),
        ]),
    );

    assert_eq!(subset.images.len(), global.images.len());
    assert_eq!(subset.annotations.len(), global.annotations.len() - 1);
    assert!(
        subset
            .annotations
            .iter()
            .all(|annotation| annotation.image_id() != 4242)
    );
}

#[test]
fn output_json_is_stable_and_verbatim() {
    let global = corpus();
    let manifest = SequenceManifest::new(["seq2"]);
    let allow_lists = allow(&[("seq2", "jpeg")]);

    let first = select(&global, &manifest, &allow_lists).to_json_string().unwrap();
    let second = select(&global, &manifest, &allow_lists).to_json_string().unwrap();
    assert_eq!(first, second);
    assert!(first.starts_with("{\n  \"info\": {\n    \"description\""));

    let parsed: Value = serde_json::from_str(&first).unwrap();
    let keys: Vec<&str> = parsed.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["info", "licenses", "categories", "images", "annotations"]);
    assert_eq!(parsed["info"]["version"], "1.0");
    assert_eq!(parsed["info"]["year"], 2025);
    assert_eq!(parsed["licenses"][0]["name"], "internal");
    assert_eq!(parsed["categories"][0]["name"], "object");

    let source = global
        .images
        .iter()
        .find(|image| image.id() == parsed["images"][0]["id"].as_u64().unwrap())
        .unwrap();
    assert_eq!(
        parsed["images"][0].as_object().unwrap(),
        source.fields(),
        "records are copied unchanged"
    );
}

#[test]
fn missing_licenses_and_categories_default_to_empty() {
    let global = AnnotationCollection::from_json_str(
        r#"{"images": [{"id": 1, "video_name": "s", "distortion_type": "d"}], "annotations": []}"#,
    )
    .unwrap();

    let subset = select(
        &global,
        &SequenceManifest::new(["s"]),
        &allow(&[("s", "d")]),
    );
    let parsed: Value = serde_json::from_str(&subset.to_json_string().unwrap()).unwrap();
    assert_eq!(parsed["licenses"], serde_json::json!([]));
    assert_eq!(parsed["categories"], serde_json::json!([]));
    assert_eq!(parsed["images"][0]["id"], 1);
}

#[test]
fn numeric_sequence_names_never_match() {
    let global = AnnotationCollection::from_json_str(
        r#"{"images": [
            {"id": 1, "video_name": 7, "distortion_type": "blur"},
            {"id": 2, "video_name": "7", "distortion_type": "blur"},
            {"id": 3, "video_name": "7", "distortion_type": 5}
        ], "annotations": []}"#,
    )
    .unwrap();

    let subset = select(
        &global,
        &SequenceManifest::new(["7"]),
        &allow(&[("7", "blur 5")]),
    );
    let ids: Vec<u64> = subset.images.iter().map(|image| image.id()).collect();
    assert_eq!(ids, [2]);
}
