//! Language variation resolution.
//!
//! Translations of an item are linked through variation-set files under
//! `ContentItems/VariationSets/`. A file may be named after the item itself
//! or after any other member of the same group, so a lookup tries the
//! item's own file first and then scans every file for a group containing
//! the item.

use std::path::Path;

use sites_query_core::models::{ContentItem, VariationSet};
use tracing::{debug, warn};

use crate::error::{ContentError, ContentResult};
use crate::store::{json_files, read_json, ContentSet};

/// Find the variant of `item` in `language`.
///
/// Returns the item unchanged when no language is requested, the item
/// already is in that language, or it is marked non-translatable.
/// `Ok(None)` means the item has no variant in that language.
///
/// `scan_limit` caps the number of files read by the fallback scan.
pub fn resolve_variant(
    set: &ContentSet,
    item: ContentItem,
    language: &str,
    scan_limit: Option<usize>,
) -> ContentResult<Option<ContentItem>> {
    if language.is_empty()
        || item.language.as_deref() == Some(language)
        || item.translatable == Some(false)
    {
        return Ok(Some(item));
    }

    let direct = set.variations_dir().join(format!("{}.json", item.id));
    if let Some(variations) = read_variation_set(&direct)? {
        let Some(peer) = variations.language_peer(language, &item.id) else {
            debug!(id = %item.id, language, "no language peer in item's own variation set");
            return Ok(None);
        };
        return load_peer(set, &peer.id, &item.item_type);
    }

    let files = json_files(&set.variations_dir())?;
    for (scanned, path) in files.iter().enumerate() {
        if let Some(limit) = scan_limit {
            if scanned >= limit {
                warn!(
                    id = %item.id,
                    language,
                    limit,
                    "variation scan limit reached before a match was found"
                );
                break;
            }
        }

        let Some(variations) = read_variation_set(path)? else {
            continue;
        };
        if !variations.contains(&item.id) {
            continue;
        }
        // a group listing the item itself under `language` resolves to it
        let Some(peer) = variations.language_entry(language) else {
            continue;
        };
        if let Some(found) = load_peer(set, &peer.id, &item.item_type)? {
            return Ok(Some(found));
        }
    }

    debug!(id = %item.id, language, "item not available in requested language");
    Ok(None)
}

/// Load a peer by its own indexed type, falling back to the source item's type.
fn load_peer(
    set: &ContentSet,
    peer_id: &str,
    fallback_type: &str,
) -> ContentResult<Option<ContentItem>> {
    let indexed = set.type_of(peer_id)?;
    let item_type = if indexed.is_empty() {
        fallback_type
    } else {
        indexed.as_str()
    };
    set.load_item(item_type, peer_id)
}

fn read_variation_set(path: &Path) -> ContentResult<Option<VariationSet>> {
    match read_json(path)? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| ContentError::MalformedJson {
                path: path.to_path_buf(),
                source,
            }),
        None => Ok(None),
    }
}
