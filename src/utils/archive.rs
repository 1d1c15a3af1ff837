//! Zip extraction helpers.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Extract a zip archive into `dest`.
///
/// Member names that escape the destination (absolute paths, `..`
/// components) are rejected outright rather than skipped, since a partial
/// extraction would silently drop data.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file).context("Failed to read zip archive")?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            bail!("Archive member has an unsafe path: {}", entry.name());
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&out_path)
                .with_context(|| format!("Failed to create {}", out_path.display()))?;
            std::io::copy(&mut entry, &mut out)?;
        }
    }
    Ok(())
}

/// Extract only the members under `prefix`, re-rooted at `dest`.
///
/// Hydroshare bags nest the payload under `<resource-id>/data/contents/`;
/// everything else in the bag is packaging metadata we don't want.
pub fn extract_zip_prefixed(archive_path: &Path, dest: &Path, prefix: &str) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file).context("Failed to read zip archive")?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            bail!("Archive member has an unsafe path: {}", entry.name());
        };
        let Ok(stripped) = relative.strip_prefix(prefix) else {
            continue;
        };
        if stripped.as_os_str().is_empty() {
            continue;
        }
        let out_path = dest.join(stripped);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&out_path)
                .with_context(|| format!("Failed to create {}", out_path.display()))?;
            std::io::copy(&mut entry, &mut out)?;
        }
    }
    Ok(())
}

/// If `dir` contains exactly one entry and it is a directory, move its
/// contents up into `dir` and remove it.
///
/// Dataset archives from Zenodo and Figshare usually wrap everything in a
/// single top-level directory named after the upload.
pub fn flatten_single_subdir(dir: &Path) -> Result<()> {
    let entries: Vec<_> =
        std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    if entries.len() != 1 {
        return Ok(());
    }
    let only = &entries[0];
    if !only.file_type()?.is_dir() {
        return Ok(());
    }

    let subdir = only.path();
    for child in std::fs::read_dir(&subdir)? {
        let child = child?;
        let target = dir.join(child.file_name());
        std::fs::rename(child.path(), target)?;
    }
    std::fs::remove_dir(&subdir)?;
    Ok(())
}
