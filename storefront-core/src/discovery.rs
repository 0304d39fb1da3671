//! Photo Discovery - One Folder, Sorted Files

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Could not scan {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No image folder found in {0}")]
    NoImageDir(PathBuf),

    #[error("Only one image folder is allowed in {root}, found {first} and {second}")]
    MultipleImageDirs {
        root: PathBuf,
        first: String,
        second: String,
    },

    #[error("No images ending in '{ending}' found in {dir}")]
    NoImages { ending: String, dir: PathBuf },
}

fn read_dir(path: &Path) -> Result<Vec<fs::DirEntry>, DiscoveryError> {
    let io = |source| DiscoveryError::Io { path: path.to_path_buf(), source };
    fs::read_dir(path).map_err(io)?.collect::<Result<_, _>>().map_err(io)
}

/// The single photo folder directly under `root`. `.git` is ignored.
pub fn find_image_dir(root: &Path) -> Result<PathBuf, DiscoveryError> {
    let mut found: Option<PathBuf> = None;
    for entry in read_dir(root)? {
        if entry.file_name() == ".git" || !entry.path().is_dir() {
            continue;
        }
        if let Some(first) = &found {
            return Err(DiscoveryError::MultipleImageDirs {
                root: root.to_path_buf(),
                first: first.file_name().unwrap_or_default().to_string_lossy().into_owned(),
                second: entry.file_name().to_string_lossy().into_owned(),
            });
        }
        found = Some(entry.path());
    }
    found.ok_or_else(|| DiscoveryError::NoImageDir(root.to_path_buf()))
}

fn has_ending(name: &str, ending: &str) -> bool {
    name.len() >= ending.len()
        && name.is_char_boundary(name.len() - ending.len())
        && name[name.len() - ending.len()..].eq_ignore_ascii_case(ending)
}

/// Files in `dir` ending in `ending` (ASCII case-insensitive), sorted.
pub fn list_images(dir: &Path, ending: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut images: Vec<PathBuf> = read_dir(dir)?
        .into_iter()
        .filter(|e| e.path().is_file())
        .filter(|e| e.file_name().to_str().is_some_and(|n| has_ending(n, ending)))
        .map(|e| e.path())
        .collect();

    if images.is_empty() {
        return Err(DiscoveryError::NoImages {
            ending: ending.to_string(),
            dir: dir.to_path_buf(),
        });
    }
    images.sort();
    Ok(images)
}

/// Hero first, thumbnails after, in file-name order.
pub fn find_images(root: &Path, ending: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let dir = find_image_dir(root)?;
    log::debug!("Image folder: {}", dir.display());
    list_images(&dir, ending)
}
