use crate::config::VendorEntry;
use crate::context::BuildContext;
use crate::error::TaskError;
use std::fs::{self, Metadata};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Copy a vendor file into its destination directory if it is newer
pub fn copy_newer(ctx: &BuildContext, entry: &VendorEntry) -> Result<(), TaskError> {
    let src = ctx.path(&entry.src);
    let src_meta = match fs::metadata(&src) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!("{}: source not found, skipping", entry.src);
            return Ok(());
        }
        Err(e) => return Err(TaskError::io(&src, e)),
    };

    let dest_dir = ctx.path(&entry.dest_dir);
    let dest = destination(&src, &dest_dir)?;

    if !is_newer(&src_meta, &dest)? {
        tracing::debug!("{} is up to date", dest.display());
        return Ok(());
    }

    fs::create_dir_all(&dest_dir).map_err(|e| TaskError::io(&dest_dir, e))?;
    fs::copy(&src, &dest).map_err(|e| TaskError::io(&dest, e))?;
    tracing::info!("Copied {} -> {}", entry.src, entry.dest_dir);
    Ok(())
}

/// Publish every vendor copy into the components directory
pub fn copy_components(ctx: &BuildContext) -> Result<(), TaskError> {
    let dest_dir = ctx.path(&ctx.config.components.dest);

    for entry in &ctx.config.vendor {
        let copied = destination(&ctx.path(&entry.src), &ctx.path(&entry.dest_dir))?;
        if !copied.is_file() {
            tracing::warn!("{} not found, skipping", copied.display());
            continue;
        }

        let dest = destination(&copied, &dest_dir)?;
        fs::create_dir_all(&dest_dir).map_err(|e| TaskError::io(&dest_dir, e))?;
        fs::copy(&copied, &dest).map_err(|e| TaskError::io(&dest, e))?;
        tracing::debug!("Copied {} -> {}", copied.display(), dest.display());
    }
    Ok(())
}

/// `<dest_dir>/<file name of src>`
fn destination(src: &Path, dest_dir: &Path) -> Result<PathBuf, TaskError> {
    let file_name = src.file_name().ok_or_else(|| {
        TaskError::io(
            src,
            std::io::Error::new(ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    Ok(dest_dir.join(file_name))
}

/// True if `dest` is missing or strictly older than the source
fn is_newer(src_meta: &Metadata, dest: &Path) -> Result<bool, TaskError> {
    let dest_meta = match fs::metadata(dest) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(TaskError::io(dest, e)),
    };

    let src_time = src_meta.modified().map_err(|e| TaskError::io(dest, e))?;
    let dest_time = dest_meta.modified().map_err(|e| TaskError::io(dest, e))?;
    Ok(src_time > dest_time)
}
