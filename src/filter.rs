//! Inclusion and exclusion predicates
//!
//! Pure functions over names; nothing here touches the filesystem.

use std::collections::BTreeSet;
use std::path::Path;

/// Suffix the game client appends to SavedVariables backups
const BACKUP_SUFFIX: &str = ".bak";

/// True when `name` takes part in the sync. An empty allow-list admits everyone.
pub fn should_include_character(name: &str, only_chars: &BTreeSet<String>) -> bool {
    only_chars.is_empty() || only_chars.contains(name)
}

/// True when a top-level character item is excluded by basename
pub fn should_skip_char_item(item_name: &str, excluded_char_files: &BTreeSet<String>) -> bool {
    excluded_char_files.contains(item_name)
}

/// True when a SavedVariables file belongs to an excluded addon.
///
/// The file's stem must equal an excluded addon name, or start with `<name>-`.
/// `pfQuest.lua`, `pfQuest-config.lua`, `pfQuest.bak` and the client's
/// `pfQuest.lua.bak` backups all belong to `pfQuest`; `pfQuestHelper.lua` does
/// not.
pub fn should_skip_addon_file(file_name: &str, excluded_addons: &BTreeSet<String>) -> bool {
    let stem = addon_stem(file_name);

    excluded_addons.iter().any(|addon| {
        stem == addon.as_str()
            || stem
                .strip_prefix(addon.as_str())
                .is_some_and(|rest| rest.starts_with('-'))
    })
}

/// File name with a trailing `.bak` and then its last extension removed
pub fn addon_stem(file_name: &str) -> &str {
    let name = file_name.strip_suffix(BACKUP_SUFFIX).unwrap_or(file_name);
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name)
}
