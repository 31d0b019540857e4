//! Account tree discovery
//!
//! Resolves the prototype to a concrete character directory and enumerates the
//! accounts, realms and characters that receive its files. Layout:
//!
//! ```text
//! <wtf>/Account/<account>/<realm>/<character>/...
//! <wtf>/Account/<account>/SavedVariables.lua
//! <wtf>/Account/<account>/SavedVariables/
//! ```
//!
//! Every listing is sorted by name, so realm search and target order are
//! reproducible across filesystems.

use crate::config::Prototype;
use crate::error::ResolveError;
use crate::fs::{DirEntry, FileSystem};
use std::path::{Path, PathBuf};

/// Name of the directory holding all accounts
pub const ACCOUNT_DIR: &str = "Account";

/// Account-level folder that sits next to the realm directories
const ACCOUNT_SAVED_VARIABLES: &str = "SavedVariables";

/// Concrete location of the prototype character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrototype {
    pub account: String,
    pub realm: String,
    pub character: String,

    /// `<root>/<account>`, source of account-level files
    pub account_dir: PathBuf,

    /// `<root>/<account>/<realm>/<character>`
    pub path: PathBuf,
}

/// A character directory found under an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterDir {
    pub realm: String,
    pub character: String,
    pub path: PathBuf,
}

/// Characters found under one account
#[derive(Debug, Default)]
pub struct CharacterListing {
    pub characters: Vec<CharacterDir>,
    /// Account or realm directories that could not be listed
    pub unreadable: Vec<ResolveError>,
}

/// A destination receiving the prototype's files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTarget {
    Character {
        account: String,
        realm: String,
        character: String,
        path: PathBuf,
    },
    Account {
        account: String,
        path: PathBuf,
    },
}

impl SyncTarget {
    pub fn character(account: &str, dir: CharacterDir) -> Self {
        SyncTarget::Character {
            account: account.to_string(),
            realm: dir.realm,
            character: dir.character,
            path: dir.path,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SyncTarget::Character { path, .. } | SyncTarget::Account { path, .. } => path,
        }
    }

    /// Display name (`account/realm/character` or `account`)
    pub fn label(&self) -> String {
        match self {
            SyncTarget::Character {
                account,
                realm,
                character,
                ..
            } => format!("{}/{}/{}", account, realm, character),
            SyncTarget::Account { account, .. } => account.clone(),
        }
    }
}

/// Read-only view of an `Account` directory
#[derive(Debug)]
pub struct AccountTree<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    root: PathBuf,
}

impl<'a, F: FileSystem + ?Sized> AccountTree<'a, F> {
    /// Open the tree rooted at `root` (the `Account` directory itself)
    pub fn open(fs: &'a F, root: impl Into<PathBuf>) -> Result<Self, ResolveError> {
        let root = root.into();
        if !fs.is_dir(&root) {
            return Err(ResolveError::AccountRootNotFound(root));
        }
        Ok(Self { fs, root })
    }

    /// Open `<wtf_dir>/Account`
    pub fn from_wtf_dir(fs: &'a F, wtf_dir: &Path) -> Result<Self, ResolveError> {
        Self::open(fs, wtf_dir.join(ACCOUNT_DIR))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn account_dir(&self, account: &str) -> PathBuf {
        self.root.join(account)
    }

    /// Locate the prototype character directory.
    ///
    /// Without a realm, realms are tried in name order and the first one that
    /// holds the character wins.
    pub fn resolve_prototype(
        &self,
        prototype: &Prototype,
    ) -> Result<ResolvedPrototype, ResolveError> {
        let account_dir = self.account_dir(&prototype.account);
        let not_found = || ResolveError::PrototypeNotFound {
            prototype: prototype.to_string(),
            searched: account_dir.clone(),
        };

        if !self.fs.is_dir(&account_dir) {
            return Err(not_found());
        }

        let realm = match &prototype.realm {
            Some(realm) => {
                if !self.fs.is_dir(&account_dir.join(realm).join(&prototype.character)) {
                    return Err(not_found());
                }
                realm.clone()
            }
            None => self
                .realm_dirs(&account_dir)?
                .into_iter()
                .find(|realm| self.fs.is_dir(&realm.path.join(&prototype.character)))
                .map(|realm| realm.name)
                .ok_or_else(not_found)?,
        };

        tracing::debug!("Resolved prototype {} in realm {}", prototype, realm);

        Ok(ResolvedPrototype {
            account: prototype.account.clone(),
            path: account_dir.join(&realm).join(&prototype.character),
            realm,
            character: prototype.character.clone(),
            account_dir,
        })
    }

    /// Every account directory except the one at `exclude`, in name order.
    ///
    /// `exclude` is matched by resolved location, so a symlinked alias of it is
    /// skipped too. Failing to list the root is fatal.
    pub fn enumerate_accounts(&self, exclude: &Path) -> Result<Vec<String>, ResolveError> {
        Ok(self
            .list_dirs(&self.root)?
            .into_iter()
            .filter(|entry| !self.fs.same_path(&entry.path, exclude))
            .map(|entry| entry.name)
            .collect())
    }

    /// Every directory two levels below `account_dir`; each is taken to be a
    /// character. Directories that cannot be listed are reported in
    /// [`CharacterListing::unreadable`] and the walk continues.
    pub fn enumerate_characters(&self, account_dir: &Path) -> CharacterListing {
        let mut listing = CharacterListing::default();

        let realms = match self.realm_dirs(account_dir) {
            Ok(realms) => realms,
            Err(e) => {
                listing.unreadable.push(e);
                return listing;
            }
        };

        for realm in realms {
            match self.list_dirs(&realm.path) {
                Ok(characters) => {
                    listing
                        .characters
                        .extend(characters.into_iter().map(|character| CharacterDir {
                            realm: realm.name.clone(),
                            character: character.name,
                            path: character.path,
                        }))
                }
                Err(e) => listing.unreadable.push(e),
            }
        }

        listing
    }

    fn realm_dirs(&self, account_dir: &Path) -> Result<Vec<DirEntry>, ResolveError> {
        Ok(self
            .list_dirs(account_dir)?
            .into_iter()
            .filter(|entry| entry.name != ACCOUNT_SAVED_VARIABLES)
            .collect())
    }

    fn list_dirs(&self, path: &Path) -> Result<Vec<DirEntry>, ResolveError> {
        let entries = self.fs.read_dir(path).map_err(|source| ResolveError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(entries.into_iter().filter(|entry| entry.is_dir).collect())
    }
}
