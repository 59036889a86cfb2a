// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Durable asset store
//!
//! Maps `(name, hash)` to the bytes of every variant of that version.
//!
//! Layout under the storage path:
//!
//! ```text
//! assets/
//!   .staging/<uuid>/            in-progress puts
//!   .last_sync                  unix seconds of the last completed sync
//!   <name>/.key                 original name
//!   <name>/current              directory of the committed hash
//!   <name>/<hash>/.key          original hash
//!   <name>/<hash>/<mode>.<ext>  one file per variant
//! ```
//!
//! Names and hashes are opaque strings. Short lowercase ones are used
//! verbatim as directory names; any other value is stored under `~` followed
//! by the hex SHA-256 of the value, and the `.key` file keeps the original.
//!
//! A version becomes visible by renaming its fully written staging directory
//! into place, so readers never observe a partially written asset.

mod error;

pub use error::StoreError;

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use ring::digest::{digest, SHA256};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::{Asset, VariantKey};

const STAGING_DIR: &str = ".staging";
const LAST_SYNC_FILE: &str = ".last_sync";
const CURRENT_FILE: &str = "current";
const KEY_FILE: &str = ".key";
const MAX_PLAIN_LEN: usize = 64;

/// Whether `s` is used verbatim as a directory name.
///
/// Lowercase only, so case-insensitive filesystems cannot fold two keys into
/// one directory. Leading dots are reserved for bookkeeping files.
fn is_plain_component(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_PLAIN_LEN
        && !s.starts_with('.')
        && s != CURRENT_FILE
        && s.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.' | ':')
        })
}

/// Directory name under which a name or hash is stored
pub fn disk_component(key: &str) -> Result<String, StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    if is_plain_component(key) {
        return Ok(key.to_string());
    }
    Ok(format!("~{}", hex::encode(digest(&SHA256, key.as_bytes()))))
}

/// Original key of a name or version directory
///
/// Reads the `.key` file, falling back to the directory name for plain
/// components. Directories whose key does not map back to their own name
/// are ignored.
fn original_key(dir: &Path, component: &str) -> Option<String> {
    let key = match fs::read_to_string(dir.join(KEY_FILE)) {
        Ok(key) => key,
        Err(_) if is_plain_component(component) => component.to_string(),
        Err(_) => return None,
    };
    (disk_component(&key).ok().as_deref() == Some(component)).then_some(key)
}

/// Committed version of a named asset as seen by readers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub hash: String,
    pub variants: BTreeSet<VariantKey>,
}

/// Directory-backed asset store
pub struct AssetStore {
    root: PathBuf,
    index: RwLock<HashMap<String, StoredAsset>>,
}

impl AssetStore {
    /// Open (or create) the store under `storage_path`
    ///
    /// Creates an `assets/` subdirectory, discards leftovers of interrupted
    /// puts and rebuilds the in-memory index from disk.
    pub fn open(storage_path: &Path) -> Result<Self, StoreError> {
        let root = storage_path.join("assets");
        fs::create_dir_all(&root)?;

        let staging = root.join(STAGING_DIR);
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let index = scan_index(&root)?;
        info!(root = %root.display(), assets = index.len(), "Asset store opened");

        Ok(Self {
            root,
            index: RwLock::new(index),
        })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Exact-hash lookup of a stored asset with all its variant bytes
    pub fn get(&self, name: &str, hash: &str) -> Result<Option<Asset>, StoreError> {
        let dir = self.version_dir(name, hash)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut asset = Asset::new(name, hash);
        for entry in entries {
            let entry = entry?;
            let Some(key) = entry.file_name().to_str().and_then(VariantKey::from_file_name)
            else {
                continue;
            };
            match fs::read(entry.path()) {
                Ok(data) => {
                    asset.variants.insert(key, data);
                }
                // Evicted underneath us
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Some(asset))
    }

    /// Read a single variant of an exact version
    pub fn read_variant(
        &self,
        name: &str,
        hash: &str,
        key: VariantKey,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.version_dir(name, hash)?.join(key.file_name());
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Durably commit an asset version
    ///
    /// All variants are written and synced in a staging directory that is then
    /// renamed into place; afterwards `current` is switched to the new hash.
    /// On failure the staging directory is removed and previously stored data
    /// is left untouched.
    pub fn put(&self, asset: &Asset) -> Result<(), StoreError> {
        if asset.variants.is_empty() {
            return Err(StoreError::EmptyAsset(asset.name.clone()));
        }
        let target = self.version_dir(&asset.name, &asset.hash)?;
        let staging = self.root.join(STAGING_DIR).join(Uuid::new_v4().to_string());

        let result = self.commit_staged(asset, &staging, &target);
        if result.is_err() && staging.exists() {
            let _ = fs::remove_dir_all(&staging);
        }
        result?;

        self.index.write().insert(
            asset.name.clone(),
            StoredAsset {
                hash: asset.hash.clone(),
                variants: asset.variants.keys().copied().collect(),
            },
        );

        debug!(
            name = %asset.name,
            hash = %asset.hash,
            variants = asset.variants.len(),
            bytes = asset.size_bytes(),
            "Asset committed"
        );
        Ok(())
    }

    fn commit_staged(&self, asset: &Asset, staging: &Path, target: &Path) -> Result<(), StoreError> {
        fs::create_dir_all(staging)?;
        for (key, data) in &asset.variants {
            let mut file = fs::File::create(staging.join(key.file_name()))?;
            file.write_all(data)?;
            file.sync_all()?;
        }
        atomic_write(&staging.join(KEY_FILE), asset.hash.as_bytes())?;

        let name_dir = self.name_dir(&asset.name)?;
        fs::create_dir_all(&name_dir)?;
        if !name_dir.join(KEY_FILE).exists() {
            atomic_write(&name_dir.join(KEY_FILE), asset.name.as_bytes())?;
        }

        if target.exists() {
            // Same hash committed before: swap the directories
            let trash = self.root.join(STAGING_DIR).join(Uuid::new_v4().to_string());
            fs::rename(target, &trash)?;
            if let Err(e) = fs::rename(staging, target) {
                let _ = fs::rename(&trash, target);
                return Err(e.into());
            }
            let _ = fs::remove_dir_all(&trash);
        } else {
            fs::rename(staging, target)?;
        }

        atomic_write(&name_dir.join(CURRENT_FILE), disk_component(&asset.hash)?.as_bytes())
    }

    /// Make an already stored version the committed one
    ///
    /// Repairs a name whose `current` pointer lags behind a version directory
    /// that was renamed into place before an interruption.
    pub fn promote(&self, name: &str, hash: &str) -> Result<(), StoreError> {
        let dir = self.version_dir(name, hash)?;
        let variants = read_variant_keys(&dir)?;
        if variants.is_empty() {
            return Err(StoreError::NotCommitted {
                name: name.to_string(),
                hash: hash.to_string(),
            });
        }

        atomic_write(
            &self.name_dir(name)?.join(CURRENT_FILE),
            disk_component(hash)?.as_bytes(),
        )?;
        self.index.write().insert(
            name.to_string(),
            StoredAsset {
                hash: hash.to_string(),
                variants,
            },
        );
        info!(name = %name, hash = %hash, "Stored version promoted to current");
        Ok(())
    }

    /// All hashes stored on disk for `name`
    pub fn list_hashes(&self, name: &str) -> Result<BTreeSet<String>, StoreError> {
        let dir = self.name_dir(name)?;
        let mut hashes = BTreeSet::new();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(hashes),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(hash) = entry
                .file_name()
                .to_str()
                .and_then(|component| original_key(&entry.path(), component))
            {
                hashes.insert(hash);
            }
        }
        Ok(hashes)
    }

    /// Remove every stored version of `name` except `keep_hash`
    ///
    /// Refuses to run unless `keep_hash` is committed, so a name is never left
    /// without a durable version. Returns the number of versions removed.
    pub fn evict_superseded(&self, name: &str, keep_hash: &str) -> Result<usize, StoreError> {
        if !self.version_dir(name, keep_hash)?.is_dir() {
            return Err(StoreError::NotCommitted {
                name: name.to_string(),
                hash: keep_hash.to_string(),
            });
        }

        let mut removed = 0;
        for hash in self.list_hashes(name)? {
            if hash == keep_hash {
                continue;
            }
            fs::remove_dir_all(self.version_dir(name, &hash)?)?;
            removed += 1;
            debug!(name = %name, hash = %hash, "Superseded version evicted");
        }
        Ok(removed)
    }

    /// Remove a name and all of its versions
    pub fn remove_name(&self, name: &str) -> Result<bool, StoreError> {
        let dir = self.name_dir(name)?;
        self.index.write().remove(name);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Committed hash for `name`
    pub fn current_hash(&self, name: &str) -> Option<String> {
        self.index.read().get(name).map(|s| s.hash.clone())
    }

    /// Committed version of `name` with its variant set
    pub fn stored(&self, name: &str) -> Option<StoredAsset> {
        self.index.read().get(name).cloned()
    }

    /// Names with a committed version
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the last time a sync completed
    pub fn last_sync_time(&self) -> Option<SystemTime> {
        let data = fs::read_to_string(self.root.join(LAST_SYNC_FILE)).ok()?;
        let secs: u64 = data.trim().parse().ok()?;
        Some(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    /// Set the last time a sync completed
    pub fn set_last_sync_time(&self, time: SystemTime) -> Result<(), StoreError> {
        let secs = time
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|_| StoreError::InvalidTime)?
            .as_secs();
        atomic_write(&self.root.join(LAST_SYNC_FILE), secs.to_string().as_bytes())
    }

    fn name_dir(&self, name: &str) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(disk_component(name)?))
    }

    fn version_dir(&self, name: &str, hash: &str) -> Result<PathBuf, StoreError> {
        Ok(self.name_dir(name)?.join(disk_component(hash)?))
    }
}

/// Atomic file write (write to temp, then rename)
///
/// Either the old content remains or the new content is fully written. The
/// temp file is dot-prefixed so it never shares a name with a stored key.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let temp_path = temp_path_for(path);

    let mut file = fs::File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.tmp"))
}

fn scan_index(root: &Path) -> Result<HashMap<String, StoredAsset>, StoreError> {
    let mut index = HashMap::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(component) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if component.starts_with('.') {
            continue;
        }
        let Some(name) = original_key(&entry.path(), &component) else {
            warn!(dir = %component, "Unrecognized directory in asset store, ignoring");
            continue;
        };

        match scan_name(&entry.path())? {
            Some(stored) => {
                index.insert(name, stored);
            }
            None => warn!(name = %name, "No committed version found, ignoring"),
        }
    }

    Ok(index)
}

fn scan_name(name_dir: &Path) -> Result<Option<StoredAsset>, StoreError> {
    let current = fs::read_to_string(name_dir.join(CURRENT_FILE))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|c| !c.is_empty() && !c.starts_with('.') && name_dir.join(c).is_dir())
        .and_then(|c| original_key(&name_dir.join(&c), &c).map(|hash| (c, hash)));

    let (component, hash) = match current {
        Some(found) => found,
        None => {
            // `current` missing or stale: take the newest version directory
            let mut newest: Option<(SystemTime, String, String)> = None;
            for entry in fs::read_dir(name_dir)? {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                let Some(component) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                let Some(hash) = original_key(&entry.path(), &component) else {
                    continue;
                };
                let modified = entry.metadata()?.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                if newest
                    .as_ref()
                    .map_or(true, |(t, c, _)| (modified, &component) > (*t, c))
                {
                    newest = Some((modified, component, hash));
                }
            }
            match newest {
                Some((_, component, hash)) => (component, hash),
                None => return Ok(None),
            }
        }
    };

    let variants = read_variant_keys(&name_dir.join(&component))?;
    if variants.is_empty() {
        return Ok(None);
    }
    Ok(Some(StoredAsset { hash, variants }))
}

fn read_variant_keys(version_dir: &Path) -> Result<BTreeSet<VariantKey>, StoreError> {
    let mut variants = BTreeSet::new();
    let entries = match fs::read_dir(version_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(variants),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        if let Some(key) = entry.file_name().to_str().and_then(VariantKey::from_file_name) {
            variants.insert(key);
        }
    }
    Ok(variants)
}
