//! Plain-text split definitions.
//!
//! A split is described by two kinds of text file, one entry per non-blank
//! line (surrounding whitespace is trimmed):
//!
//! - the **sequence manifest**, listing the sequences that belong to the
//!   split, and
//! - one **distortion allow-list** per sequence, named `<sequence>.txt`
//!   inside the distortion directory, listing the distortion types kept for
//!   that sequence.
//!
//! A missing manifest is fatal; a missing allow-list only drops its sequence.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::error::FramePickError;

/// Read the non-blank, trimmed lines of a text file.
pub fn read_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>, FramePickError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| FramePickError::TextRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(non_blank_lines(&contents))
}

fn non_blank_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Ordered list of the sequence names that make up a split.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequenceManifest {
    names: Vec<String>,
}

impl SequenceManifest {
    /// Build a manifest from names, dropping blank entries.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|name| name.as_ref().trim().to_owned())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// Load a manifest file.
    ///
    /// # Errors
    ///
    /// - [`FramePickError::ManifestNotFound`] if the file does not exist.
    /// - [`FramePickError::EmptyManifest`] if it holds no sequence name.
    /// - [`FramePickError::TextRead`] if it cannot be read.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FramePickError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FramePickError::ManifestNotFound {
                path: path.to_path_buf(),
            });
        }

        let names = read_lines(path)?;
        if names.is_empty() {
            return Err(FramePickError::EmptyManifest {
                path: path.to_path_buf(),
            });
        }

        log::info!("Selected sequences: {names:?}");
        Ok(Self { names })
    }

    /// Sequence names, in manifest order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Distortion types kept for one sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DistortionAllowList {
    labels: Vec<String>,
}

impl DistortionAllowList {
    /// Build an allow-list from labels, dropping blank entries.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|label| label.as_ref().trim().to_owned())
                .filter(|label| !label.is_empty())
                .collect(),
        }
    }

    /// Path of the allow-list file for `sequence` inside `distortion_dir`.
    pub fn path_for(distortion_dir: &Path, sequence: &str) -> PathBuf {
        distortion_dir.join(format!("{sequence}.txt"))
    }

    /// Load the allow-list of `sequence` from `distortion_dir`.
    ///
    /// A missing or unreadable file yields an empty list and a warning.
    pub fn load(distortion_dir: &Path, sequence: &str) -> Self {
        let path = Self::path_for(distortion_dir, sequence);
        if !path.exists() {
            log::warn!("Distortion file not found: {}", path.display());
            return Self::default();
        }

        match read_lines(&path) {
            Ok(labels) => Self { labels },
            Err(error) => {
                log::warn!("{error}");
                Self::default()
            }
        }
    }

    pub fn contains(&self, distortion_type: &str) -> bool {
        self.labels.iter().any(|label| label == distortion_type)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Allow-lists keyed by sequence name.
pub type AllowLists = HashMap<String, DistortionAllowList>;

/// Load the allow-list of every sequence in `manifest`.
pub fn load_allow_lists(distortion_dir: &Path, manifest: &SequenceManifest) -> AllowLists {
    manifest
        .names()
        .iter()
        .map(|name| (name.clone(), DistortionAllowList::load(distortion_dir, name)))
        .collect()
}
