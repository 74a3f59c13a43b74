//! Filesystem moves with a copy fallback across devices.
//!
//! A plain `rename` is tried first. When source and destination live on
//! different filesystems the item is copied and the source removed. Any
//! failure undoes the work done so far, so the caller sees either the item
//! at `dest` or the item still at `src`.

use std::fs;
use std::io;
use std::path::Path;

/// Maximum directory depth copied across devices.
const MAX_COPY_DEPTH: usize = 64;

/// Move a file, symlink or directory tree from `src` to `dest`.
///
/// `dest` must not exist; its parent must.
///
/// # Errors
///
/// Returns the first I/O error encountered. On error the source is left in
/// place and nothing is left behind at `dest`.
pub fn move_item(src: &Path, dest: &Path) -> io::Result<()> {
    if fs::symlink_metadata(dest).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("destination exists: {}", dest.display()),
        ));
    }

    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            log::debug!(
                "Rename across devices, copying {} -> {}",
                src.display(),
                dest.display()
            );
            copy_then_remove(src, dest)
        }
        Err(e) => Err(e),
    }
}

fn is_cross_device(error: &io::Error) -> bool {
    // EXDEV is 18 on Linux and macOS.
    error.kind() == io::ErrorKind::CrossesDevices || (cfg!(unix) && error.raw_os_error() == Some(18))
}

fn copy_then_remove(src: &Path, dest: &Path) -> io::Result<()> {
    let is_dir = fs::symlink_metadata(src)?.is_dir();

    let copied = if is_dir {
        copy_dir_recursive(src, dest, 0)
    } else {
        copy_entry(src, dest)
    };
    if let Err(e) = copied {
        remove_any(dest).ok();
        return Err(e);
    }

    if let Err(e) = remove_any(src) {
        // remove_dir_all may have removed part of the tree; put it back.
        if is_dir {
            if let Err(restore) = copy_dir_recursive(dest, src, 0) {
                log::error!(
                    "Failed to restore {} after partial removal: {}",
                    src.display(),
                    restore
                );
                return Err(e);
            }
        }
        remove_any(dest).ok();
        return Err(e);
    }

    Ok(())
}

fn copy_entry(src: &Path, dest: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        if fs::symlink_metadata(src)?.file_type().is_symlink() {
            return std::os::unix::fs::symlink(fs::read_link(src)?, dest);
        }
    }
    fs::copy(src, dest).map(|_| ())
}

fn copy_dir_recursive(src: &Path, dest: &Path, depth: usize) -> io::Result<()> {
    if depth > MAX_COPY_DEPTH {
        return Err(io::Error::other(format!(
            "maximum recursion depth ({MAX_COPY_DEPTH}) exceeded during copy"
        )));
    }

    fs::create_dir_all(dest)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target, depth + 1)?;
        } else if fs::symlink_metadata(&target).is_err() {
            copy_entry(&entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Remove a file, symlink or directory tree without following links.
pub(crate) fn remove_any(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
