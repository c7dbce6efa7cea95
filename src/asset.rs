//! Digital asset binary fetch.
//!
//! Asset binaries live next to their item files:
//! `ContentItems/<type>/files/<id>/<file name>`. The type comes from
//! `metadata.json` and defaults to `DigitalAsset`.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::context::RequestContext;
use crate::error::{ContentError, ContentResult};
use crate::store::{ContentSet, ASSET_FILES_DIR};

pub const DEFAULT_ASSET_TYPE: &str = "DigitalAsset";

/// Bytes of one asset file, unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl AssetFile {
    /// `Content-Type` guessed from the file extension.
    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

/// Read the native binary of asset `id`.
///
/// `Ok(None)` when there is no content set, no binary folder, or the
/// folder is empty.
pub async fn read_asset(ctx: &RequestContext, id: &str) -> ContentResult<Option<AssetFile>> {
    let Some(ref set) = ctx.content_set else {
        debug!(id, "no content set selected, asset fetch skipped");
        return Ok(None);
    };
    if id.is_empty() {
        return Ok(None);
    }

    let set = set.clone();
    let id = id.to_string();
    tokio::task::spawn_blocking(move || read_asset_blocking(&set, &id)).await?
}

fn read_asset_blocking(set: &ContentSet, id: &str) -> ContentResult<Option<AssetFile>> {
    let indexed = set.type_of(id)?;
    let asset_type = if indexed.is_empty() {
        DEFAULT_ASSET_TYPE
    } else {
        indexed.as_str()
    };

    let dir = set.type_dir(asset_type).join(ASSET_FILES_DIR).join(id);
    let Some(path) = pick_asset_file(set, asset_type, id, &dir)? else {
        debug!(id, dir = %dir.display(), "no asset binary found");
        return Ok(None);
    };

    let bytes = std::fs::read(&path).map_err(|e| ContentError::io(&path, e))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(Some(AssetFile { file_name, bytes }))
}

/// The file named after the asset item, else the first file by name.
fn pick_asset_file(
    set: &ContentSet,
    asset_type: &str,
    id: &str,
    dir: &Path,
) -> ContentResult<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    if let Some(item) = set.load_item(asset_type, id)? {
        if let Some(named) = files
            .iter()
            .find(|p| p.file_name().is_some_and(|n| n == item.name.as_str()))
        {
            return Ok(Some(named.clone()));
        }
    }
    Ok(files.into_iter().next())
}
