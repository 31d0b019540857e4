/// Common test utilities and helpers for wtf-sync tests
use assert_fs::prelude::*;
use assert_fs::TempDir;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Every character item the prototype carries in the standard scenario
#[allow(dead_code)]
pub const CHAR_FILES: [&str; 7] = [
    "bindings-cache.wtf",
    "camera-settings.txt",
    "chat-cache.txt",
    "layout-cache.txt",
    "macros-cache.txt",
    "macros-local.txt",
    "AddOns.txt",
];

/// A scratch WTF directory
pub struct WtfFixture {
    pub temp_dir: TempDir,
}

#[allow(dead_code)]
impl WtfFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        temp_dir
            .child("Account")
            .create_dir_all()
            .expect("Failed to create Account dir");
        Self { temp_dir }
    }

    /// Two accounts: `A` with `Org/Hero` (prototype) and `Org/Mage`, `B` with
    /// `Org/Warrior`
    pub fn scenario() -> Self {
        let fixture = Self::new();

        for file in CHAR_FILES {
            fixture.write(&format!("A/Org/Hero/{}", file), &format!("hero {}", file));
        }
        fixture.write("A/Org/Hero/SavedVariables/pfQuest.lua", "hero pfQuest");
        fixture.write("A/Org/Hero/SavedVariables/pfQuest-config.lua", "hero pfQuest-config");
        fixture.write("A/Org/Hero/SavedVariables/Bagnon.lua", "hero Bagnon");
        fixture.write("A/Org/Hero/SavedVariables/Bagnon.lua.bak", "hero Bagnon backup");

        fixture.write("A/SavedVariables.lua", "account A");
        fixture.write("A/SavedVariables/pfQuest.lua", "account pfQuest");
        fixture.write("A/SavedVariables/Bagnon.lua", "account Bagnon");

        fixture.mkdir("A/Org/Mage");
        fixture.write("B/Org/Warrior/SavedVariables/pfQuest.lua", "stale warrior pfQuest");

        fixture
    }

    pub fn wtf_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn account_root(&self) -> PathBuf {
        self.temp_dir.path().join("Account")
    }

    /// Path of `rel` under `Account/`
    pub fn path(&self, rel: &str) -> PathBuf {
        self.account_root().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let child = self.temp_dir.child("Account").child(rel);
        if let Some(parent) = child.path().parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        child.write_str(content).expect("Failed to write fixture file");
        child.path().to_path_buf()
    }

    pub fn mkdir(&self, rel: &str) {
        self.temp_dir
            .child("Account")
            .child(rel)
            .create_dir_all()
            .expect("Failed to create fixture dir");
    }

    pub fn read(&self, rel: &str) -> Option<String> {
        std::fs::read_to_string(self.path(rel)).ok()
    }

    pub fn write_config(&self, content: &str) -> PathBuf {
        let child = self.temp_dir.child("wtf-sync.conf");
        child.write_str(content).expect("Failed to write test config");
        child.path().to_path_buf()
    }

    /// Every file under the WTF directory with its contents
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut files = BTreeMap::new();
        collect_files(self.wtf_dir(), &mut files);
        files
    }

    /// Every directory under the WTF directory
    pub fn directories(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        collect_dirs(self.wtf_dir(), &mut dirs);
        dirs.sort();
        dirs
    }
}

fn collect_files(dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
    for entry in std::fs::read_dir(dir).expect("Failed to read dir") {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            collect_files(&path, files);
        } else {
            let content = std::fs::read(&path).expect("Failed to read file");
            files.insert(path, content);
        }
    }
}

fn collect_dirs(dir: &Path, dirs: &mut Vec<PathBuf>) {
    for entry in std::fs::read_dir(dir).expect("Failed to read dir") {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            dirs.push(path.clone());
            collect_dirs(&path, dirs);
        }
    }
}
