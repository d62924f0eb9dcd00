/// Normalizes a destination prefix so it is either empty or ends with a
/// single `/`.
pub fn normalized_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

pub fn revision_object_prefix(prefix: &str, dataset_id: &str, revision_id: &str) -> String {
    format!("{}{dataset_id}/{revision_id}/", normalized_prefix(prefix))
}

/// Object key an exported asset lands at. Export destinations and completion
/// messages both derive their keys from here.
pub fn asset_object_key(
    prefix: &str,
    dataset_id: &str,
    revision_id: &str,
    asset_name: &str,
) -> String {
    format!(
        "{}{asset_name}",
        revision_object_prefix(prefix, dataset_id, revision_id)
    )
}

/// Provider-style key pattern equivalent to [`asset_object_key`].
pub fn revision_key_pattern(prefix: &str, dataset_id: &str) -> String {
    format!(
        "{}{dataset_id}/${{Revision.Id}}/${{Asset.Name}}",
        normalized_prefix(prefix)
    )
}
