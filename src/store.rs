//! Read-only access to an exported content set on disk.
//!
//! A content set directory has this layout:
//!
//! ```text
//! <content dir>/
//! ├── metadata.json                  # "group0": ["News:n1", ...] id → type index
//! └── ContentItems/
//!     ├── <type>/<id>.json           # one file per content item
//!     ├── <asset type>/files/<id>/   # digital asset binaries
//!     └── VariationSets/<id>.json    # language variation groups
//! ```
//!
//! Content sets are located either inside a template
//! (`<templates>/<name>/assets/contenttemplate/Content Template of <name>`)
//! or as a standalone export (`<content>/<name>/contentexport`).
//!
//! Nothing here caches: every call re-reads the files it needs.

use std::path::{Path, PathBuf};

use serde_json::Value;
use sites_query_core::models::{ContentItem, ContentTypeIndex};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{ContentError, ContentResult};

pub const ITEMS_DIR: &str = "ContentItems";
pub const VARIATIONS_DIR: &str = "VariationSets";
pub const METADATA_FILE: &str = "metadata.json";
/// Sub-folder of an asset type folder holding binaries.
pub const ASSET_FILES_DIR: &str = "files";

/// Internal marker directories never scanned for items.
const MARKER_DIRS: [&str; 2] = ["_scs_theme_root_", "_scs_design_name_"];

/// Path of the content export embedded in template `name`.
pub fn template_content_dir(config: &Config, name: &str) -> PathBuf {
    config
        .templates_path()
        .join(name)
        .join("assets")
        .join("contenttemplate")
        .join(format!("Content Template of {}", name))
}

/// Path of the standalone content export `name`.
pub fn export_content_dir(config: &Config, name: &str) -> PathBuf {
    config.content_path().join(name).join("contentexport")
}

/// Locate the content directory for a template or content-set name.
///
/// The template's embedded export is tried first, then the standalone
/// export. Returns `None` when neither exists.
pub fn resolve_content_dir(config: &Config, name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    [template_content_dir(config, name), export_content_dir(config, name)]
        .into_iter()
        .find(|dir| dir.is_dir())
}

/// A resolved content set directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSet {
    name: String,
    root: PathBuf,
}

impl ContentSet {
    /// Resolve `name` against the configured template and content folders.
    pub fn open(config: &Config, name: &str) -> Option<Self> {
        match resolve_content_dir(config, name) {
            Some(root) => {
                debug!(content_set = name, root = %root.display(), "resolved content set");
                Some(Self::at(name, root))
            }
            None => {
                info!(content_set = name, "no content directory found for content set");
                None
            }
        }
    }

    /// Use an already-known directory as a content set.
    pub fn at(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn items_dir(&self) -> PathBuf {
        self.root.join(ITEMS_DIR)
    }

    pub fn variations_dir(&self) -> PathBuf {
        self.items_dir().join(VARIATIONS_DIR)
    }

    pub fn type_dir(&self, item_type: &str) -> PathBuf {
        self.items_dir().join(item_type)
    }

    /// Read and parse `metadata.json`. A missing file yields an empty index.
    pub fn type_index(&self) -> ContentResult<ContentTypeIndex> {
        let path = self.root.join(METADATA_FILE);
        Ok(read_json(&path)?
            .map(|metadata| ContentTypeIndex::from_json(&metadata))
            .unwrap_or_default())
    }

    /// Type name for `id`, or an empty string when the index has no entry.
    pub fn type_of(&self, id: &str) -> ContentResult<String> {
        Ok(self
            .type_index()?
            .type_of(id)
            .map(str::to_string)
            .unwrap_or_default())
    }

    /// Load `ContentItems/<type>/<id>.json`.
    pub fn load_item(&self, item_type: &str, id: &str) -> ContentResult<Option<ContentItem>> {
        if item_type.is_empty() || id.is_empty() {
            return Ok(None);
        }
        let path = self.type_dir(item_type).join(format!("{}.json", id));
        match read_json(&path)? {
            Some(value) => item_from_json(&path, value, item_type).map(Some),
            None => Ok(None),
        }
    }

    /// Every item in one type folder, in file-name order.
    pub fn list_type(&self, item_type: &str) -> ContentResult<Vec<ContentItem>> {
        let mut items = Vec::new();
        for path in json_files(&self.type_dir(item_type))? {
            if let Some(value) = read_json(&path)? {
                items.push(item_from_json(&path, value, item_type)?);
            }
        }
        Ok(items)
    }

    /// Item type folders, in name order. `VariationSets` is excluded.
    pub fn list_types(&self) -> ContentResult<Vec<String>> {
        let dir = self.items_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut types = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name == VARIATIONS_DIR || MARKER_DIRS.contains(&name.as_str()) {
                continue;
            }
            types.push(name);
        }
        Ok(types)
    }

    /// Every item of every type, type by type.
    pub fn list_all(&self) -> ContentResult<Vec<ContentItem>> {
        let mut items = Vec::new();
        for item_type in self.list_types()? {
            items.extend(self.list_type(&item_type)?);
        }
        Ok(items)
    }

    /// Recursively collect item files under `ContentItems`.
    ///
    /// Skips the internal marker directories, `VariationSets`, and asset
    /// binary folders. Runs on the blocking pool.
    pub async fn scan_item_files(&self) -> ContentResult<Vec<PathBuf>> {
        let dir = self.items_dir();
        tokio::task::spawn_blocking(move || scan_item_files_blocking(&dir)).await?
    }

    /// All items whose `slug` equals `slug`, in scan order.
    pub async fn find_by_slug(&self, slug: &str) -> ContentResult<Vec<ContentItem>> {
        let mut found = Vec::new();
        for path in self.scan_item_files().await? {
            let Some(value) = read_json(&path)? else {
                continue;
            };
            if value.get("slug").and_then(Value::as_str) != Some(slug) {
                continue;
            }
            let folder_type = path
                .parent()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            found.push(item_from_json(&path, value, &folder_type)?);
        }
        Ok(found)
    }
}

fn scan_item_files_blocking(dir: &Path) -> ContentResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            let skipped = MARKER_DIRS.contains(&&*name)
                || (entry.depth() == 1 && name == VARIATIONS_DIR)
                || (entry.depth() == 2 && name == ASSET_FILES_DIR);
            !skipped
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && is_json(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// `*.json` files directly inside `dir`, in name order. Missing dir → empty.
pub(crate) fn json_files(dir: &Path) -> ContentResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_json(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Read and parse a JSON file. A missing file is `Ok(None)`.
pub(crate) fn read_json(path: &Path) -> ContentResult<Option<Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ContentError::io(path, e)),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| ContentError::MalformedJson {
            path: path.to_path_buf(),
            source,
        })
}

fn item_from_json(path: &Path, value: Value, folder_type: &str) -> ContentResult<ContentItem> {
    let mut item = ContentItem::from_json(value).map_err(|source| ContentError::InvalidItem {
        path: path.to_path_buf(),
        source,
    })?;
    if item.item_type.is_empty() {
        item.item_type = folder_type.to_string();
    }
    Ok(item)
}


#[cfg(test)]
mod tests {
    use super::fixtures::SetBuilder;
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_set(tmp: &TempDir) -> ContentSet {
        let root = SetBuilder::new(tmp.path())
            .item("News", "n2", json!({ "name": "Second", "data": { "title": "B" } }))
            .item("News", "n1", json!({ "name": "First", "fields": { "title": "A" }, "slug": "first" }))
            .item("Author", "a1", json!({ "name": "Ann" }))
            .unindexed_item("News", "n3", json!({ "name": "Orphan", "slug": "orphan-post" }))
            .variation("n1", json!([]))
            .asset_file("DigitalAsset", "img1", "photo.jpg", b"\xff\xd8")
            .raw_file("ContentItems/_scs_theme_root_/x.json", r#"{"slug":"orphan-post"}"#)
            .build();
        ContentSet::at("Blog", root)
    }

    #[test]
    fn test_resolve_prefers_template() {
        let tmp = TempDir::new().unwrap();
        let config = Config::for_root(tmp.path());
        let template = template_content_dir(&config, "Blog");
        let export = export_content_dir(&config, "Blog");
        std::fs::create_dir_all(&export).unwrap();
        assert_eq!(resolve_content_dir(&config, "Blog"), Some(export.clone()));

        std::fs::create_dir_all(&template).unwrap();
        assert_eq!(resolve_content_dir(&config, "Blog"), Some(template));
        assert_eq!(resolve_content_dir(&config, "Missing"), None);
        assert!(ContentSet::open(&config, "").is_none());
    }

    #[test]
    fn test_type_of() {
        let tmp = TempDir::new().unwrap();
        let set = sample_set(&tmp);
        assert_eq!(set.type_of("n1").unwrap(), "News");
        assert_eq!(set.type_of("a1").unwrap(), "Author");
        assert_eq!(set.type_of("n3").unwrap(), "");
    }

    #[test]
    fn test_missing_metadata_is_empty_index() {
        let tmp = TempDir::new().unwrap();
        let set = ContentSet::at("Empty", tmp.path());
        assert!(set.type_index().unwrap().is_empty());
        assert_eq!(set.type_of("anything").unwrap(), "");
    }

    #[test]
    fn test_load_item_reconciles_fields() {
        let tmp = TempDir::new().unwrap();
        let set = sample_set(&tmp);
        let item = set.load_item("News", "n2").unwrap().unwrap();
        let wire = item.to_json();
        assert_eq!(wire["fields"]["title"], "B");
        assert_eq!(wire["fields"], wire["data"]);
        assert!(set.load_item("News", "nope").unwrap().is_none());
    }

    #[test]
    fn test_malformed_item_propagates() {
        let tmp = TempDir::new().unwrap();
        let root = SetBuilder::new(tmp.path())
            .raw_file("ContentItems/News/bad.json", "{ not json")
            .build();
        let set = ContentSet::at("Broken", root);
        let err = set.load_item("News", "bad").unwrap_err();
        assert!(matches!(err, ContentError::MalformedJson { .. }));
        assert!(set.list_type("News").is_err());
    }

    #[test]
    fn test_list_type_in_name_order() {
        let tmp = TempDir::new().unwrap();
        let set = sample_set(&tmp);
        let ids: Vec<String> = set.list_type("News").unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["n1", "n2", "n3"]);
        assert!(set.list_type("Nothing").unwrap().is_empty());
    }

    #[test]
    fn test_list_types_skips_variations() {
        let tmp = TempDir::new().unwrap();
        let set = sample_set(&tmp);
        assert_eq!(set.list_types().unwrap(), vec!["Author", "DigitalAsset", "News"]);
    }

    #[tokio::test]
    async fn test_scan_skips_markers_and_variations() {
        let tmp = TempDir::new().unwrap();
        let set = sample_set(&tmp);
        let files = set.scan_item_files().await.unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a1.json", "n1.json", "n2.json", "n3.json"]);
    }

    #[tokio::test]
    async fn test_find_by_slug() {
        let tmp = TempDir::new().unwrap();
        let set = sample_set(&tmp);
        let found = set.find_by_slug("orphan-post").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "n3");
        assert_eq!(found[0].item_type, "News");
        assert!(set.find_by_slug("nothing").await.unwrap().is_empty());
    }
}
