//! Sync Engine - Propagates the prototype's files to every other character and account
//!
//! A run resolves the prototype, enumerates every destination up front, then
//! walks them in order:
//!
//! 1. characters on the prototype's own account (the prototype excluded)
//! 2. for each other account: its account-level files, then its characters
//!
//! Configuration and resolution failures abort the run before anything is
//! written. A failure on a single file is logged, recorded in the
//! [`SyncSummary`] and the run moves on.

use crate::config::SyncConfig;
use crate::discovery::{AccountTree, CharacterListing, ResolvedPrototype, SyncTarget};
use crate::error::{ResolveError, Result};
use crate::filter::{should_include_character, should_skip_addon_file, should_skip_char_item};
use crate::fs::{FileSystem, StdFs};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Folder of per-addon saved state, at both character and account level
pub const SAVED_VARIABLES: &str = "SavedVariables";

/// Account-level saved state file
pub const ACCOUNT_SAVED_VARIABLES_FILE: &str = "SavedVariables.lua";

/// Items copied from the prototype into every character directory
pub const CHARACTER_ITEMS: [&str; 8] = [
    "bindings-cache.wtf",
    "camera-settings.txt",
    "chat-cache.txt",
    "layout-cache.txt",
    "macros-cache.txt",
    "macros-local.txt",
    "AddOns.txt",
    SAVED_VARIABLES,
];

/// Invocation flags consumed by the engine
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Log every mutation instead of performing it
    pub dry_run: bool,
}

/// One item to bring over to a destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanItem {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Directories are mirrored file by file with addon filtering
    pub is_dir: bool,
}

/// Items for a single destination that survived filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPlan {
    /// Destination directory, created when missing
    pub root: PathBuf,
    pub items: Vec<PlanItem>,
    /// Source items dropped by `char_files_excluded`
    pub excluded: Vec<PathBuf>,
}

/// Destinations of a run, in execution order
#[derive(Debug, Default)]
pub struct TargetList {
    pub targets: Vec<SyncTarget>,
    /// Directories that could not be listed; their characters are absent
    /// from `targets`
    pub unreadable: Vec<ResolveError>,
}

/// A file-level decision taken during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Directory was created (or would be, in dry-run)
    CreatedDir { path: PathBuf },
    /// File was copied (or would be, in dry-run)
    Copied { from: PathBuf, to: PathBuf },
    /// Excluded addon file was pruned from a destination (or would be, in dry-run)
    Removed { path: PathBuf },
    /// Source item filtered out by configuration
    Excluded { path: PathBuf },
    /// Source item does not exist; nothing to copy
    Missing { path: PathBuf },
    /// Operation failed; the item was skipped
    Failed { path: PathBuf, error: String },
}

/// Results from a complete sync run
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub dry_run: bool,
    pub characters_synced: usize,
    pub accounts_synced: usize,
    pub duration: Duration,
    pub actions: Vec<SyncAction>,
}

impl SyncSummary {
    fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            characters_synced: 0,
            accounts_synced: 0,
            duration: Duration::ZERO,
            actions: Vec::new(),
        }
    }

    fn record(&mut self, action: SyncAction) {
        self.actions.push(action);
    }

    fn count(&self, pred: impl Fn(&SyncAction) -> bool) -> usize {
        self.actions.iter().filter(|&a| pred(a)).count()
    }

    pub fn files_copied(&self) -> usize {
        self.count(|a| matches!(a, SyncAction::Copied { .. }))
    }

    pub fn files_removed(&self) -> usize {
        self.count(|a| matches!(a, SyncAction::Removed { .. }))
    }

    pub fn items_excluded(&self) -> usize {
        self.count(|a| matches!(a, SyncAction::Excluded { .. }))
    }

    pub fn items_missing(&self) -> usize {
        self.count(|a| matches!(a, SyncAction::Missing { .. }))
    }

    pub fn failed_operations(&self) -> usize {
        self.count(|a| matches!(a, SyncAction::Failed { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.actions.iter().filter_map(|a| match a {
            SyncAction::Failed { path, error } => Some((path.as_path(), error.as_str())),
            _ => None,
        })
    }

    /// True when no item failed
    pub fn is_success(&self) -> bool {
        self.failed_operations() == 0
    }
}

/// Copies the prototype's files to every destination
pub struct SyncEngine<F: FileSystem = StdFs> {
    config: SyncConfig,
    options: SyncOptions,
    fs: F,
}

impl SyncEngine<StdFs> {
    /// Create a sync engine over the local filesystem
    pub fn new(config: SyncConfig, options: SyncOptions) -> Self {
        Self::with_fs(config, options, StdFs)
    }
}

impl<F: FileSystem> SyncEngine<F> {
    pub fn with_fs(config: SyncConfig, options: SyncOptions, fs: F) -> Self {
        Self {
            config,
            options,
            fs,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    /// Open the tree at `account_root` and locate the prototype
    pub fn resolve(&self, account_root: &Path) -> Result<(AccountTree<'_, F>, ResolvedPrototype)> {
        let tree = AccountTree::open(&self.fs, account_root)?;
        let prototype = tree.resolve_prototype(&self.config.prototype)?;
        Ok((tree, prototype))
    }

    /// Every destination in execution order.
    ///
    /// Only failing to list the account root is fatal. Accounts or realms
    /// that cannot be listed end up in [`TargetList::unreadable`].
    pub fn targets(
        &self,
        tree: &AccountTree<'_, F>,
        prototype: &ResolvedPrototype,
    ) -> Result<TargetList> {
        let mut list = TargetList::default();

        let own = tree.enumerate_characters(&prototype.account_dir);
        self.push_characters(&prototype.account, own, prototype, &mut list);

        for account in tree.enumerate_accounts(&prototype.account_dir)? {
            let account_dir = tree.account_dir(&account);
            let listing = tree.enumerate_characters(&account_dir);

            list.targets.push(SyncTarget::Account {
                account: account.clone(),
                path: account_dir,
            });
            self.push_characters(&account, listing, prototype, &mut list);
        }

        Ok(list)
    }

    fn push_characters(
        &self,
        account: &str,
        listing: CharacterListing,
        prototype: &ResolvedPrototype,
        list: &mut TargetList,
    ) {
        for dir in listing.characters {
            // Matched by resolved location so an alias of the prototype is never written
            if self.fs.same_path(&dir.path, &prototype.path) {
                debug!("Skipping prototype: {}", dir.path.display());
                continue;
            }
            if self.includes(&dir.character) {
                list.targets.push(SyncTarget::character(account, dir));
            }
        }
        list.unreadable.extend(listing.unreadable);
    }

    fn includes(&self, character: &str) -> bool {
        let included = should_include_character(character, &self.config.only_chars);
        if !included {
            debug!("Skipping character not in only_chars: {}", character);
        }
        included
    }

    /// Run a complete sync against the `Account` directory at `account_root`
    pub fn run(&self, account_root: &Path) -> Result<SyncSummary> {
        let start_time = Instant::now();

        let (tree, prototype) = self.resolve(account_root)?;
        info!(
            "Prototype: {}/{}/{} ({})",
            prototype.account,
            prototype.realm,
            prototype.character,
            prototype.path.display()
        );

        let TargetList {
            targets,
            unreadable,
        } = self.targets(&tree, &prototype)?;
        if self.options.dry_run {
            info!("Dry run: no files will be changed");
        }

        let mut summary = SyncSummary::new(self.options.dry_run);

        for e in unreadable {
            warn!("Skipping unreadable directory: {}", e);
            summary.record(SyncAction::Failed {
                path: e.path().to_path_buf(),
                error: e.to_string(),
            });
        }

        for target in &targets {
            match target {
                SyncTarget::Character { .. } => {
                    info!("Syncing character: {}", target.label());
                    self.sync_character(&prototype.path, target.path(), &mut summary);
                    summary.characters_synced += 1;
                }
                SyncTarget::Account { .. } => {
                    info!("Syncing account: {}", target.label());
                    self.sync_account(&prototype.account_dir, target.path(), &mut summary);
                    summary.accounts_synced += 1;
                }
            }
        }

        summary.duration = start_time.elapsed();

        info!(
            "Synced {} characters and {} accounts in {:.2}s: {} copied, {} removed, {} failed",
            summary.characters_synced,
            summary.accounts_synced,
            summary.duration.as_secs_f64(),
            summary.files_copied(),
            summary.files_removed(),
            summary.failed_operations()
        );
        info!("Done.");

        Ok(summary)
    }

    /// Items to copy from a prototype character directory into `dst`
    pub fn plan_character(&self, src: &Path, dst: &Path) -> CopyPlan {
        let mut plan = CopyPlan {
            root: dst.to_path_buf(),
            items: Vec::new(),
            excluded: Vec::new(),
        };

        for item in CHARACTER_ITEMS {
            if should_skip_char_item(item, &self.config.excluded_char_files) {
                plan.excluded.push(src.join(item));
                continue;
            }
            plan.items.push(PlanItem {
                source: src.join(item),
                destination: dst.join(item),
                is_dir: item == SAVED_VARIABLES,
            });
        }

        plan
    }

    /// Items to copy from the prototype's account directory into `dst`
    pub fn plan_account(&self, src: &Path, dst: &Path) -> CopyPlan {
        CopyPlan {
            root: dst.to_path_buf(),
            items: vec![
                PlanItem {
                    source: src.join(ACCOUNT_SAVED_VARIABLES_FILE),
                    destination: dst.join(ACCOUNT_SAVED_VARIABLES_FILE),
                    is_dir: false,
                },
                PlanItem {
                    source: src.join(SAVED_VARIABLES),
                    destination: dst.join(SAVED_VARIABLES),
                    is_dir: true,
                },
            ],
            excluded: Vec::new(),
        }
    }

    pub fn sync_character(&self, src: &Path, dst: &Path, summary: &mut SyncSummary) {
        let plan = self.plan_character(src, dst);
        self.execute(&plan, summary);
    }

    pub fn sync_account(&self, src: &Path, dst: &Path, summary: &mut SyncSummary) {
        let plan = self.plan_account(src, dst);
        self.execute(&plan, summary);
    }

    fn execute(&self, plan: &CopyPlan, summary: &mut SyncSummary) {
        if !self.ensure_dir(&plan.root, summary) {
            return;
        }

        for path in &plan.excluded {
            debug!("Excluded: {}", path.display());
            summary.record(SyncAction::Excluded { path: path.clone() });
        }

        for item in &plan.items {
            if item.is_dir {
                self.mirror_saved_variables(&item.source, &item.destination, summary);
            } else {
                self.copy_item(&item.source, &item.destination, summary);
            }
        }
    }

    /// Copy the files directly inside `src` to `dst`, dropping excluded
    /// addons, then prune excluded addon files already at `dst`
    fn mirror_saved_variables(&self, src: &Path, dst: &Path, summary: &mut SyncSummary) {
        if self.fs.same_path(src, dst) {
            debug!("Skipping {}: same folder as {}", dst.display(), src.display());
            return;
        }

        if self.fs.is_dir(src) {
            match self.fs.read_dir(src) {
                Ok(entries) => {
                    if !self.ensure_dir(dst, summary) {
                        return;
                    }

                    for entry in entries.into_iter().filter(|e| !e.is_dir) {
                        if should_skip_addon_file(&entry.name, &self.config.excluded_addons) {
                            debug!("Excluded addon file: {}", entry.path.display());
                            summary.record(SyncAction::Excluded { path: entry.path });
                            continue;
                        }
                        self.copy_item(&entry.path, &dst.join(&entry.name), summary);
                    }
                }
                Err(e) => {
                    warn!("Failed to list {}: {}", src.display(), e);
                    summary.record(SyncAction::Failed {
                        path: src.to_path_buf(),
                        error: e.to_string(),
                    });
                    return;
                }
            }
        } else {
            debug!("Skipping missing: {}", src.display());
            summary.record(SyncAction::Missing {
                path: src.to_path_buf(),
            });
        }

        self.prune_excluded(dst, summary);
    }

    fn prune_excluded(&self, dst: &Path, summary: &mut SyncSummary) {
        if self.config.excluded_addons.is_empty() || !self.fs.is_dir(dst) {
            return;
        }

        let entries = match self.fs.read_dir(dst) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to list {}: {}", dst.display(), e);
                summary.record(SyncAction::Failed {
                    path: dst.to_path_buf(),
                    error: e.to_string(),
                });
                return;
            }
        };

        for entry in entries.into_iter().filter(|e| !e.is_dir) {
            if !should_skip_addon_file(&entry.name, &self.config.excluded_addons) {
                continue;
            }

            if self.options.dry_run {
                info!("[dry-run] Would remove {}", entry.path.display());
                summary.record(SyncAction::Removed { path: entry.path });
                continue;
            }

            match self.fs.remove_file(&entry.path) {
                Ok(()) => {
                    debug!("Removed: {}", entry.path.display());
                    summary.record(SyncAction::Removed { path: entry.path });
                }
                Err(e) => {
                    warn!("Failed to remove {}: {}", entry.path.display(), e);
                    summary.record(SyncAction::Failed {
                        path: entry.path,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    fn copy_item(&self, src: &Path, dst: &Path, summary: &mut SyncSummary) {
        if !self.fs.is_file(src) {
            debug!("Skipping missing: {}", src.display());
            summary.record(SyncAction::Missing {
                path: src.to_path_buf(),
            });
            return;
        }

        if self.fs.same_path(src, dst) {
            debug!("Skipping copy onto itself: {}", dst.display());
            return;
        }

        let action = SyncAction::Copied {
            from: src.to_path_buf(),
            to: dst.to_path_buf(),
        };

        if self.options.dry_run {
            info!("[dry-run] Would copy {} -> {}", src.display(), dst.display());
            summary.record(action);
            return;
        }

        match self.fs.copy_file(src, dst) {
            Ok(()) => {
                debug!("Copied: {} -> {}", src.display(), dst.display());
                summary.record(action);
            }
            Err(e) => {
                warn!("Failed to copy {} -> {}: {}", src.display(), dst.display(), e);
                summary.record(SyncAction::Failed {
                    path: dst.to_path_buf(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Make sure `path` exists. Returns false when it could not be created.
    fn ensure_dir(&self, path: &Path, summary: &mut SyncSummary) -> bool {
        if self.fs.is_dir(path) {
            return true;
        }

        let action = SyncAction::CreatedDir {
            path: path.to_path_buf(),
        };

        if self.options.dry_run {
            info!("[dry-run] Would create directory {}", path.display());
            summary.record(action);
            return true;
        }

        match self.fs.create_dir_all(path) {
            Ok(()) => {
                debug!("Created directory: {}", path.display());
                summary.record(action);
                true
            }
            Err(e) => {
                warn!("Failed to create directory {}: {}", path.display(), e);
                summary.record(SyncAction::Failed {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                });
                false
            }
        }
    }
}
