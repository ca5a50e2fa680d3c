//! Split selection.
//!
//! [`select`] narrows a global [`AnnotationCollection`] to the images of the
//! manifest's sequences whose distortion type is on that sequence's
//! allow-list, then keeps exactly the annotations that point at a kept image.
//! Both lists keep the relative order of the global collection.

use std::collections::{HashMap, HashSet};

use crate::{
    annotation::{AnnotationCollection, DatasetInfo, FilteredCollection, ImageRecord},
    manifest::{AllowLists, DistortionAllowList, SequenceManifest},
};

/// Sequences of `sequences` that have a non-empty allow-list, with that list.
///
/// Sequences without one are logged and left out.
pub fn active_sequences<'m>(
    sequences: &'m SequenceManifest,
    allow_lists: &'m AllowLists,
) -> HashMap<&'m str, &'m DistortionAllowList> {
    let mut active = HashMap::with_capacity(sequences.len());

    for name in sequences.names() {
        match allow_lists.get(name).filter(|list| !list.is_empty()) {
            Some(list) => {
                log::info!("{name}: selected distortions {:?}", list.labels());
                active.insert(name.as_str(), list);
            }
            None => log::warn!("No distortions found for {name}, skipping"),
        }
    }

    active
}

fn is_selected(image: &ImageRecord, active: &HashMap<&str, &DistortionAllowList>) -> bool {
    let (Some(sequence), Some(distortion)) = (image.video_name(), image.distortion_type()) else {
        return false;
    };

    active
        .get(sequence)
        .is_some_and(|list| list.contains(distortion))
}

/// Select the images and annotations of a split.
///
/// An image is kept iff its `video_name` is in `sequences` and its
/// `distortion_type` is on that sequence's allow-list. An annotation is kept
/// iff its `image_id` names a kept image. `licenses` and `categories` are
/// passed through.
///
/// # Example
///
/// ```
/// use framepick::{AnnotationCollection, AllowLists, DistortionAllowList, SequenceManifest, select};
///
/// let global = AnnotationCollection::from_json_str(r#"{
///     "images": [
///         {"id": 1, "video_name": "seq1", "distortion_type": "blur", "file_name": "a_0001.jpg"},
///         {"id": 2, "video_name": "seq1", "distortion_type": "noise", "file_name": "b_0001.jpg"}
///     ],
///     "annotations": [{"id": 10, "image_id": 1}, {"id": 11, "image_id": 2}]
/// }"#)?;
///
/// let manifest = SequenceManifest::new(["seq1"]);
/// let mut allow_lists = AllowLists::new();
/// allow_lists.insert("seq1".into(), DistortionAllowList::new(["blur"]));
///
/// let subset = select(&global, &manifest, &allow_lists);
/// assert_eq!(subset.images.len(), 1);
/// assert_eq!(subset.annotations[0].image_id(), 1);
/// # Ok::<(), framepick::FramePickError>(())
/// ```
pub fn select<'a>(
    global: &'a AnnotationCollection,
    sequences: &SequenceManifest,
    allow_lists: &AllowLists,
) -> FilteredCollection<'a> {
    let active = active_sequences(sequences, allow_lists);

    let images: Vec<&ImageRecord> = global
        .images
        .iter()
        .filter(|image| is_selected(image, &active))
        .collect();

    let image_ids: HashSet<u64> = images.iter().map(|image| image.id()).collect();

    let annotations: Vec<_> = global
        .annotations
        .iter()
        .filter(|annotation| image_ids.contains(&annotation.image_id()))
        .collect();

    log::info!("Selected images: {}", images.len());
    log::info!("Selected annotations: {}", annotations.len());

    FilteredCollection {
        info: DatasetInfo::default(),
        licenses: &global.licenses,
        categories: &global.categories,
        images,
        annotations,
    }
}
