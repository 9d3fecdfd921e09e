//! Output paths and all-or-nothing file writes.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::error::{Error, Result};
use crate::metadata::ImageMetadata;

/// Name of the sibling directory that receives copies when not overwriting.
pub const MODIFIED_DIR: &str = "Modified";

/// Where the watermarked version of `original` is written.
///
/// With `overwrite` this is `original` itself; otherwise
/// `dirname(original)/Modified/basename(original)`.
#[must_use]
pub fn output_path(original: &Path, overwrite: bool) -> PathBuf {
    if overwrite {
        return original.to_path_buf();
    }
    let parent = original.parent().unwrap_or(Path::new("."));
    let name = original.file_name().unwrap_or_default();
    parent.join(MODIFIED_DIR).join(name)
}

/// Encode `image` with `metadata` and write it for `original`.
///
/// Creates the `Modified` directory when needed; an existing directory is
/// fine. Returns the path that was written.
///
/// # Errors
///
/// Returns an error if encoding fails or the file or directory cannot be
/// written. A failed write leaves any existing destination untouched.
pub fn save(
    image: &RgbImage,
    metadata: &ImageMetadata,
    original: &Path,
    overwrite: bool,
) -> Result<PathBuf> {
    let target = output_path(original, overwrite);
    if target.file_name().is_none() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("no file name in {}", original.display()),
        )));
    }
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = metadata.encode(image)?;
    write_atomic(&target, &bytes)?;
    Ok(target)
}

/// Write `bytes` to a hidden sibling of `target`, then rename over it.
///
/// An existing `target` keeps its permissions.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp_name = OsString::from(".");
    tmp_name.push(target.file_name().unwrap_or_default());
    tmp_name.push(format!(".{}.partial", std::process::id()));
    let tmp = target.with_file_name(tmp_name);

    let written = fs::write(&tmp, bytes)
        .and_then(|()| copy_permissions(target, &tmp))
        .and_then(|()| fs::rename(&tmp, target));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn copy_permissions(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::metadata(from) {
        Ok(existing) => fs::set_permissions(to, existing.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use tempfile::TempDir;

    fn png_metadata() -> ImageMetadata {
        ImageMetadata::capture(ImageFormat::Png, b"").unwrap()
    }

    #[test]
    fn output_path_for_copy_and_overwrite() {
        assert_eq!(
            output_path(Path::new("/photos/trip/img.jpg"), false),
            PathBuf::from("/photos/trip/Modified/img.jpg")
        );
        assert_eq!(
            output_path(Path::new("/photos/trip/img.jpg"), true),
            PathBuf::from("/photos/trip/img.jpg")
        );
        assert_eq!(
            output_path(Path::new("img.png"), false),
            PathBuf::from("Modified/img.png")
        );
    }

    #[test]
    fn save_creates_modified_dir_idempotently() {
        let dir = TempDir::new().unwrap();
        let img = RgbImage::new(3, 3);
        let meta = png_metadata();

        let first = save(&img, &meta, &dir.path().join("a.png"), false).unwrap();
        let second = save(&img, &meta, &dir.path().join("b.png"), false).unwrap();
        assert_eq!(first, dir.path().join("Modified").join("a.png"));
        assert!(first.is_file());
        assert!(second.is_file());

        let leftovers: Vec<_> = fs::read_dir(dir.path().join("Modified"))
            .unwrap()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn save_overwrite_replaces_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.png");
        fs::write(&path, b"old").unwrap();

        let written = save(&RgbImage::new(2, 2), &png_metadata(), &path, true).unwrap();
        assert_eq!(written, path);
        assert_ne!(fs::read(&path).unwrap(), b"old");
        assert!(!dir.path().join(MODIFIED_DIR).exists());
    }

    #[cfg(unix)]
    #[test]
    fn save_overwrite_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("private.png");
        fs::write(&path, b"old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        save(&RgbImage::new(2, 2), &png_metadata(), &path, true).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn save_reports_unwritable_destination() {
        let dir = TempDir::new().unwrap();
        // A file where the Modified directory should go.
        fs::write(dir.path().join(MODIFIED_DIR), b"blocker").unwrap();

        let err = save(
            &RgbImage::new(2, 2),
            &png_metadata(),
            &dir.path().join("y.png"),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
