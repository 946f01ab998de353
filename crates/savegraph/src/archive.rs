// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Keyed save store.
//!
//! An [`Archive`] maps string keys to serialized values, each stored with
//! the type tag it was saved under. Entries live in memory until
//! [`Archive::sync`] commits them to [`Settings::path`].
//!
//! # File layout
//!
//! ```text
//! magic "SGRA" | version u16 | entry count u32 |
//!   (key str | type tag str | payload bytes)*
//! ```
//!
//! Strings and byte blobs are `u32` length-prefixed, integers little-endian.
//! A sync writes `<path>.tmp` and renames it over `<path>`, so a crash never
//! leaves a torn archive behind.

use crate::codec;
use crate::config::Settings;
use crate::error::{CodecError, Result};
use crate::format::cursor::{Cursor, Encoder};
use crate::persist::Persist;
use crate::registry::Registry;
use crate::types::{TypeRef, ANY_TYPE_NAME};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Leading bytes of every archive file.
pub const ARCHIVE_MAGIC: [u8; 4] = *b"SGRA";

/// Current archive file version.
pub const ARCHIVE_VERSION: u16 = 1;

/// One stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Name of the declared type the value was saved under.
    pub type_tag: String,
    /// Binary-format payload.
    pub payload: Vec<u8>,
}

/// Keyed collection of serialized values backed by one file.
#[derive(Debug)]
pub struct Archive<'r> {
    registry: &'r Registry,
    settings: Settings,
    entries: BTreeMap<String, ArchiveEntry>,
}

impl Archive<'static> {
    /// Archive bound to the process-wide registry.
    pub fn open_global(settings: Settings) -> Result<Self> {
        Self::open(Registry::global(), settings)
    }
}

impl<'r> Archive<'r> {
    /// Empty in-memory archive; nothing is read from disk.
    pub fn new(registry: &'r Registry, settings: Settings) -> Self {
        Self {
            registry,
            settings,
            entries: BTreeMap::new(),
        }
    }

    /// Archive loaded from `settings.path`, empty if the file does not exist.
    pub fn open(registry: &'r Registry, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let mut archive = Self::new(registry, settings);
        archive.reload()?;
        Ok(archive)
    }

    /// Archive decoded from the bytes of an archive file, e.g. a cloud
    /// backup download. Nothing is read from or written to disk.
    pub fn from_bytes(registry: &'r Registry, settings: Settings, bytes: &[u8]) -> Result<Self> {
        settings.validate()?;
        let mut archive = Self::new(registry, settings);
        archive.entries = decode_entries(bytes)?;
        Ok(archive)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Serialize `value` as `ty` under `key`, replacing any previous entry.
    pub fn save(&mut self, key: &str, ty: &TypeRef, value: &Value) -> Result<()> {
        let payload = codec::serialize_with(self.registry, &self.settings, ty, value)?;
        self.registry.declare(ty);
        self.entries.insert(
            key.to_string(),
            ArchiveEntry {
                type_tag: ty.name().to_string(),
                payload,
            },
        );
        self.after_mutation()
    }

    /// Load the value stored under `key` as `ty`.
    ///
    /// With type checking enabled the stored tag must equal `ty`'s name;
    /// requesting `object` always decodes with the stored type.
    pub fn load(&self, key: &str, ty: &TypeRef) -> Result<Value> {
        let entry = self.entry(key)?;
        let ty = self.effective_type(entry, ty)?;
        codec::deserialize_with(self.registry, &self.settings, &ty, &entry.payload)
    }

    /// Like [`load`](Self::load) but a missing key yields `default`.
    pub fn load_or(&self, key: &str, ty: &TypeRef, default: Value) -> Result<Value> {
        if !self.key_exists(key) {
            return Ok(default);
        }
        self.load(key, ty)
    }

    /// Populate `target` from the value stored under `key`.
    pub fn load_into(&self, key: &str, ty: &TypeRef, target: &mut Value) -> Result<()> {
        let entry = self.entry(key)?;
        let ty = self.effective_type(entry, ty)?;
        codec::deserialize_into_with(self.registry, &self.settings, &ty, &entry.payload, target)
    }

    /// Typed [`save`](Self::save).
    pub fn put<T: Persist>(&mut self, key: &str, value: &T) -> Result<()> {
        self.save(key, &T::type_info(), &value.to_value())
    }

    /// Typed [`load`](Self::load).
    pub fn get<T: Persist>(&self, key: &str) -> Result<T> {
        T::from_value(self.load(key, &T::type_info())?)
    }

    /// Typed [`load_or`](Self::load_or).
    pub fn get_or<T: Persist>(&self, key: &str, default: T) -> Result<T> {
        if !self.key_exists(key) {
            return Ok(default);
        }
        self.get(key)
    }

    fn entry(&self, key: &str) -> Result<&ArchiveEntry> {
        self.entries
            .get(key)
            .ok_or_else(|| CodecError::MissingKey(key.to_string()))
    }

    fn effective_type(&self, entry: &ArchiveEntry, requested: &TypeRef) -> Result<TypeRef> {
        if requested.name() == ANY_TYPE_NAME {
            return self
                .registry
                .resolve_tag(&entry.type_tag)
                .ok_or_else(|| CodecError::UnknownTypeTag(entry.type_tag.clone()));
        }
        if self.settings.type_checking && entry.type_tag != requested.name() {
            return Err(CodecError::mismatch(requested.name(), entry.type_tag.clone()));
        }
        Ok(requested.clone())
    }

    // ========================================================================
    // Keys
    // ========================================================================

    pub fn key_exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove `key`; returns whether it existed.
    pub fn delete_key(&mut self, key: &str) -> Result<bool> {
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.after_mutation()?;
        }
        Ok(existed)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.after_mutation()
    }

    /// Stored entries without decoding them.
    pub fn raw_entries(&self) -> impl Iterator<Item = (&str, &ArchiveEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn raw_entry(&self, key: &str) -> Option<&ArchiveEntry> {
        self.entries.get(key)
    }

    /// Store an already serialized entry.
    pub fn insert_raw(&mut self, key: &str, entry: ArchiveEntry) -> Result<()> {
        self.entries.insert(key.to_string(), entry);
        self.after_mutation()
    }

    /// Copy every entry of `other` into this archive; `other` wins on
    /// conflicting keys.
    pub fn merge(&mut self, other: &Archive<'_>) -> Result<()> {
        for (key, entry) in other.raw_entries() {
            self.entries.insert(key.to_string(), entry.clone());
        }
        self.after_mutation()
    }

    /// The archive in file layout, exactly as [`sync`](Self::sync) would
    /// write it.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode_archive(&self.entries)
    }

    /// Merge the entries of an archive file image into this archive; the
    /// image wins on conflicting keys. A corrupt image changes nothing.
    pub fn save_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let incoming = decode_entries(bytes)?;
        log::debug!("[archive] merging {} raw entries", incoming.len());
        self.entries.extend(incoming);
        self.after_mutation()
    }

    fn after_mutation(&mut self) -> Result<()> {
        if self.settings.auto_sync {
            self.sync()?;
        }
        Ok(())
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Commit every entry to disk.
    pub fn sync(&mut self) -> Result<()> {
        let bytes = self.to_bytes()?;
        let path = &self.settings.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        if self.settings.backup_on_sync && path.exists() {
            fs::copy(path, self.settings.backup_path())?;
        }

        let temp = self.settings.temp_path();
        fs::write(&temp, &bytes)?;
        fs::rename(&temp, path)?;
        log::info!(
            "[archive] synced {} entries ({} bytes) to {}",
            self.entries.len(),
            bytes.len(),
            path.display()
        );
        Ok(())
    }

    /// Replace the in-memory entries with the file's contents.
    pub fn reload(&mut self) -> Result<()> {
        self.entries = match fs::read(&self.settings.path) {
            Ok(bytes) => decode_archive(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        log::debug!(
            "[archive] loaded {} entries from {}",
            self.entries.len(),
            self.settings.path.display()
        );
        Ok(())
    }

    pub fn file_exists(&self) -> bool {
        self.settings.path.exists()
    }

    /// Last modification time of the archive file.
    pub fn timestamp(&self) -> Result<SystemTime> {
        Ok(fs::metadata(&self.settings.path)?.modified()?)
    }

    /// Copy the current archive file to `<path>.bak`.
    pub fn create_backup(&self) -> Result<()> {
        fs::copy(&self.settings.path, self.settings.backup_path())?;
        log::info!(
            "[archive] backup created for {}",
            self.settings.path.display()
        );
        Ok(())
    }

    /// Restore `<path>.bak` over the archive file and reload it. Returns
    /// `false` if no backup exists.
    pub fn restore_backup(&mut self) -> Result<bool> {
        let backup = self.settings.backup_path();
        if !backup.exists() {
            return Ok(false);
        }
        // Validate before overwriting the live file.
        let bytes = fs::read(&backup)?;
        decode_archive(&bytes)?;
        fs::rename(&backup, &self.settings.path)?;
        self.reload()?;
        log::warn!(
            "[archive] restored {} from backup",
            self.settings.path.display()
        );
        Ok(true)
    }

    /// Delete the archive file (and its backup) and clear the entries.
    pub fn delete_file(&mut self) -> Result<()> {
        remove_if_exists(&self.settings.path)?;
        remove_if_exists(&self.settings.backup_path())?;
        self.entries.clear();
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn encode_archive(entries: &BTreeMap<String, ArchiveEntry>) -> Result<Vec<u8>> {
    let mut enc = Encoder::new();
    for byte in ARCHIVE_MAGIC {
        enc.put_u8(byte);
    }
    enc.put_u16(ARCHIVE_VERSION);
    enc.put_len(entries.len())?;
    for (key, entry) in entries {
        enc.put_str(key)?;
        enc.put_str(&entry.type_tag)?;
        enc.put_bytes(&entry.payload)?;
    }
    Ok(enc.into_bytes())
}

/// An empty image holds no entries.
fn decode_entries(bytes: &[u8]) -> Result<BTreeMap<String, ArchiveEntry>> {
    if bytes.is_empty() {
        return Ok(BTreeMap::new());
    }
    decode_archive(bytes)
}

fn decode_archive(bytes: &[u8]) -> Result<BTreeMap<String, ArchiveEntry>> {
    let mut cursor = Cursor::new(bytes);
    let mut magic = [0u8; 4];
    for byte in &mut magic {
        *byte = cursor.read_u8()?;
    }
    if magic != ARCHIVE_MAGIC {
        return Err(CodecError::malformed("not an archive file (bad magic)"));
    }
    let version = cursor.read_u16()?;
    if version != ARCHIVE_VERSION {
        return Err(CodecError::malformed(format!(
            "unsupported archive version {} (expected {})",
            version, ARCHIVE_VERSION
        )));
    }

    let count = cursor.read_len()?;
    let mut entries = BTreeMap::new();
    for _ in 0..count {
        let key = cursor.read_string()?;
        let type_tag = cursor.read_string()?;
        let payload = cursor.read_bytes()?.to_vec();
        entries.insert(key, ArchiveEntry { type_tag, payload });
    }
    if cursor.remaining() != 0 {
        return Err(CodecError::malformed(format!(
            "{} trailing bytes after archive entries",
            cursor.remaining()
        )));
    }
    Ok(entries)
}
