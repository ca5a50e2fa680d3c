//! COCO-style annotation records.
//!
//! The global annotation file is a JSON object with `images`, `annotations`
//! and optional `licenses` / `categories` arrays. Only the handful of fields
//! the selector and the extractor key on are typed; every other field is
//! carried through untouched. Each record keeps the JSON object it was read
//! from, and serializes back from that object, so a filtered file is a
//! verbatim subset of the global one (same fields, same field order).
//!
//! # Example
//!
//! ```no_run
//! use framepick::AnnotationCollection;
//!
//! let global = AnnotationCollection::load("global_annotations.json")?;
//! println!("{} images, {} annotations", global.images.len(), global.annotations.len());
//! # Ok::<(), framepick::FramePickError>(())
//! ```

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::FramePickError;

/// Description written into the `info` block of every filtered file.
pub const SUBSET_DESCRIPTION: &str =
    "Subset of global COCO annotations based on selected videos and distortions";
/// Version written into the `info` block of every filtered file.
pub const SUBSET_VERSION: &str = "1.0";
/// Year written into the `info` block of every filtered file.
pub const SUBSET_YEAR: u32 = 2025;

fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// Read a level, accepting JSON strings and numbers.
///
/// Numbers are rendered with their JSON text, so a severity level stored as
/// `3` and one stored as `"3"` build the same video path.
fn level(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn integer_id(
    fields: &Map<String, Value>,
    key: &str,
    kind: &'static str,
) -> Result<u64, FramePickError> {
    match fields.get(key) {
        Some(value) => value.as_u64().ok_or_else(|| FramePickError::InvalidRecord {
            kind,
            reason: format!("`{key}` is not a non-negative integer: {value}"),
        }),
        None => Err(FramePickError::InvalidRecord {
            kind,
            reason: format!("missing `{key}`"),
        }),
    }
}

/// One decodable frame of one distorted video.
///
/// Created from a JSON object via [`TryFrom`]; the object must carry an
/// integer `id`. The remaining keyed fields are optional: an image without a
/// string `video_name` or `distortion_type` is simply never selected, and one
/// without a usable `file_name` is never extracted. Only `severity_level`
/// may also be a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct ImageRecord {
    id: u64,
    video_name: Option<String>,
    distortion_type: Option<String>,
    severity_level: Option<String>,
    file_name: Option<String>,
    fields: Map<String, Value>,
}

impl ImageRecord {
    /// Globally unique image id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Name of the sequence this frame belongs to.
    pub fn video_name(&self) -> Option<&str> {
        self.video_name.as_deref()
    }

    /// Distortion applied to the source video.
    pub fn distortion_type(&self) -> Option<&str> {
        self.distortion_type.as_deref()
    }

    /// Severity level of the distortion, rendered as text.
    pub fn severity_level(&self) -> Option<&str> {
        self.severity_level.as_deref()
    }

    /// Target file name, relative to the frame output directory.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// The full JSON object this record was read from.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<Map<String, Value>> for ImageRecord {
    type Error = FramePickError;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: integer_id(&fields, "id", "image")?,
            video_name: text(&fields, "video_name"),
            distortion_type: text(&fields, "distortion_type"),
            severity_level: level(&fields, "severity_level"),
            file_name: text(&fields, "file_name"),
            fields,
        })
    }
}

impl Serialize for ImageRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// One annotation entity, owned by the image named in `image_id`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct AnnotationRecord {
    image_id: u64,
    fields: Map<String, Value>,
}

impl AnnotationRecord {
    /// Id of the owning [`ImageRecord`].
    pub fn image_id(&self) -> u64 {
        self.image_id
    }

    /// The full JSON object this record was read from.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<Map<String, Value>> for AnnotationRecord {
    type Error = FramePickError;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        Ok(Self {
            image_id: integer_id(&fields, "image_id", "annotation")?,
            fields,
        })
    }
}

impl Serialize for AnnotationRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// The global annotation collection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotationCollection {
    /// Every image of every sequence and distortion.
    pub images: Vec<ImageRecord>,
    /// Every annotation.
    pub annotations: Vec<AnnotationRecord>,
    /// Passed through to the filtered output; empty when absent.
    #[serde(default)]
    pub licenses: Vec<Value>,
    /// Passed through to the filtered output; empty when absent.
    #[serde(default)]
    pub categories: Vec<Value>,
}

impl AnnotationCollection {
    /// Read and parse a global annotation file.
    ///
    /// # Errors
    ///
    /// Returns [`FramePickError::JsonRead`] if the file cannot be opened, is
    /// not valid JSON, or contains an image / annotation without its
    /// integer id.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FramePickError> {
        let path = path.as_ref();
        log::info!("Reading global annotation file: {}", path.display());

        let file = File::open(path).map_err(|error| FramePickError::JsonRead {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|error| FramePickError::JsonRead {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })
    }

    /// Parse a global annotation collection from an in-memory JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, FramePickError> {
        serde_json::from_str(json).map_err(|error| FramePickError::JsonRead {
            path: "<memory>".into(),
            reason: error.to_string(),
        })
    }
}

/// The fixed `info` block of a filtered collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetInfo {
    pub description: String,
    pub version: String,
    pub year: u32,
}

impl Default for DatasetInfo {
    fn default() -> Self {
        Self {
            description: SUBSET_DESCRIPTION.to_string(),
            version: SUBSET_VERSION.to_string(),
            year: SUBSET_YEAR,
        }
    }
}

/// A referentially consistent subset of an [`AnnotationCollection`].
///
/// Borrows every record from the collection it was selected from; nothing is
/// copied until the subset is serialized. Built by
/// [`select`](crate::selector::select).
#[derive(Debug, Clone, Serialize)]
pub struct FilteredCollection<'a> {
    pub info: DatasetInfo,
    pub licenses: &'a [Value],
    pub categories: &'a [Value],
    pub images: Vec<&'a ImageRecord>,
    pub annotations: Vec<&'a AnnotationRecord>,
}

impl FilteredCollection<'_> {
    /// Render as 2-space indented JSON.
    pub fn to_json_string(&self) -> Result<String, FramePickError> {
        serde_json::to_string_pretty(self).map_err(|error| FramePickError::JsonWrite {
            path: "<memory>".into(),
            reason: error.to_string(),
        })
    }

    /// Write as 2-space indented JSON, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`FramePickError::JsonWrite`] if the file cannot be created or
    /// written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FramePickError> {
        let path = path.as_ref();
        let write_error = |reason: String| FramePickError::JsonWrite {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| write_error(error.to_string()))?;
        }

        let file = File::create(path).map_err(|error| write_error(error.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|error| write_error(error.to_string()))?;
        writer
            .flush()
            .map_err(|error| write_error(error.to_string()))?;

        log::debug!("Saved filtered annotations to {}", path.display());
        Ok(())
    }
}
