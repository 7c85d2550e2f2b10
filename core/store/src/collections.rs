//! Per-vault persistence of the note, link and folder collections.
//!
//! Every collection is stored as one encrypted file in the active vault's
//! directory. Loads that fail for any reason (missing file, bad frame,
//! failed decryption, undecodable plaintext) produce an empty collection
//! with a log side effect — callers cannot distinguish unreadable data
//! from a legitimately empty vault.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::broadcast;
use tracing::{error, warn};
use uuid::Uuid;

use crate::frame::EncryptedFrame;
use crate::model::{Folder, Link, Note, VaultItem};
use lockleaf_crypto::CipherEngine;

/// File names of the three collections inside a vault directory.
pub const NOTES_FILE: &str = "notes.enc";
pub const LINKS_FILE: &str = "links.enc";
pub const FOLDERS_FILE: &str = "folders.enc";

const CHANNEL_CAPACITY: usize = 16;

/// Store for the three entity collections of one vault.
///
/// All operations are synchronous and blocking; single-record writes
/// rewrite the full collection file. Subscribers receive the updated
/// collection after every successful save, so presentation layers can
/// refresh without polling.
pub struct CollectionStore {
    cipher: Arc<CipherEngine>,
    vault_dir: Option<PathBuf>,
    notes_tx: broadcast::Sender<Vec<Note>>,
    links_tx: broadcast::Sender<Vec<Link>>,
    folders_tx: broadcast::Sender<Vec<Folder>>,
    items_tx: broadcast::Sender<Vec<VaultItem>>,
}

impl CollectionStore {
    /// Create a store targeting the default storage directory.
    pub fn new(cipher: Arc<CipherEngine>) -> Self {
        Self::create(cipher, None)
    }

    /// Create a store targeting a specific vault directory.
    pub fn with_vault_dir(cipher: Arc<CipherEngine>, dir: impl Into<PathBuf>) -> Self {
        Self::create(cipher, Some(dir.into()))
    }

    fn create(cipher: Arc<CipherEngine>, vault_dir: Option<PathBuf>) -> Self {
        let (notes_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (links_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (folders_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (items_tx, _) = broadcast::channel(CHANNEL_CAPACITY);

        Self {
            cipher,
            vault_dir,
            notes_tx,
            links_tx,
            folders_tx,
            items_tx,
        }
    }

    /// Switch the store to a different vault directory (or the default)
    /// and re-emit every collection so subscribers refresh.
    pub fn set_vault_dir(&mut self, dir: Option<PathBuf>) {
        self.vault_dir = dir;
        let _ = self.notes_tx.send(self.load_notes());
        let _ = self.links_tx.send(self.load_links());
        let _ = self.folders_tx.send(self.load_folders());
        self.publish_items();
    }

    /// The directory currently backing this store.
    pub fn vault_dir(&self) -> Option<&PathBuf> {
        self.vault_dir.as_ref()
    }

    fn default_dir() -> PathBuf {
        dirs::document_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    fn file_path(&self, file: &str) -> PathBuf {
        match &self.vault_dir {
            Some(dir) => dir.join(file),
            None => Self::default_dir().join(file),
        }
    }

    // ── Generic load/save ───────────────────────────────────────────────

    fn load_collection<T: DeserializeOwned>(&self, file: &str, what: &str) -> Vec<T> {
        let path = self.file_path(file);
        if !path.exists() {
            return Vec::new();
        }

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                error!(path = %path.display(), "failed to read {}: {}", what, e);
                return Vec::new();
            }
        };

        if data.is_empty() {
            return Vec::new();
        }

        let Some(frame) = EncryptedFrame::decode(&data) else {
            warn!(path = %path.display(), "unreadable {} file, treating as empty", what);
            return Vec::new();
        };

        match self.cipher.decrypt_object(&frame.ciphertext, &frame.nonce) {
            Some(items) => items,
            None => {
                warn!("failed to decrypt {}, treating as empty", what);
                Vec::new()
            }
        }
    }

    fn save_collection<T: Serialize>(&self, items: &[T], file: &str, what: &str) -> bool {
        let Some((ciphertext, nonce)) = self.cipher.encrypt_object(&items) else {
            error!("failed to encrypt {}", what);
            return false;
        };

        let frame = EncryptedFrame::new(nonce, ciphertext);
        let path = self.file_path(file);

        if let Err(e) = fs::write(&path, frame.encode()) {
            error!(path = %path.display(), "failed to write {}: {}", what, e);
            return false;
        }

        true
    }

    // ── Notes ───────────────────────────────────────────────────────────

    pub fn load_notes(&self) -> Vec<Note> {
        self.load_collection(NOTES_FILE, "notes")
    }

    /// Persist the full note collection and notify subscribers.
    pub fn save_notes(&self, notes: &[Note]) {
        if !self.save_collection(notes, NOTES_FILE, "notes") {
            return;
        }
        let _ = self.notes_tx.send(notes.to_vec());
        self.publish_items();
    }

    /// Insert or replace a single note by id.
    pub fn save_note(&self, note: Note) {
        let mut notes = self.load_notes();
        match notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => *existing = note,
            None => notes.push(note),
        }
        self.save_notes(&notes);
    }

    pub fn delete_note(&self, id: Uuid) {
        let mut notes = self.load_notes();
        notes.retain(|n| n.id != id);
        self.save_notes(&notes);
    }

    // ── Links ───────────────────────────────────────────────────────────

    pub fn load_links(&self) -> Vec<Link> {
        self.load_collection(LINKS_FILE, "links")
    }

    /// Persist the full link collection and notify subscribers.
    pub fn save_links(&self, links: &[Link]) {
        if !self.save_collection(links, LINKS_FILE, "links") {
            return;
        }
        let _ = self.links_tx.send(links.to_vec());
        self.publish_items();
    }

    /// Insert or replace a single link by id.
    pub fn save_link(&self, link: Link) {
        let mut links = self.load_links();
        match links.iter_mut().find(|l| l.id == link.id) {
            Some(existing) => *existing = link,
            None => links.push(link),
        }
        self.save_links(&links);
    }

    pub fn delete_link(&self, id: Uuid) {
        let mut links = self.load_links();
        links.retain(|l| l.id != id);
        self.save_links(&links);
    }

    // ── Folders ─────────────────────────────────────────────────────────

    pub fn load_folders(&self) -> Vec<Folder> {
        self.load_collection(FOLDERS_FILE, "folders")
    }

    /// Persist the full folder collection and notify subscribers.
    pub fn save_folders(&self, folders: &[Folder]) {
        if !self.save_collection(folders, FOLDERS_FILE, "folders") {
            return;
        }
        let _ = self.folders_tx.send(folders.to_vec());
    }

    /// Insert or replace a single folder by id.
    pub fn save_folder(&self, folder: Folder) {
        let mut folders = self.load_folders();
        match folders.iter_mut().find(|f| f.id == folder.id) {
            Some(existing) => *existing = folder,
            None => folders.push(folder),
        }
        self.save_folders(&folders);
    }

    /// Delete a folder and clear the soft references pointing at it.
    ///
    /// Notes and links that referenced the folder keep existing with
    /// `folder_id` cleared and a refreshed modification date. Only the
    /// collections that actually changed are rewritten; there is no
    /// multi-file transaction, so a crash mid-cascade can leave them
    /// mutually inconsistent.
    pub fn delete_folder(&self, id: Uuid) {
        let mut folders = self.load_folders();
        folders.retain(|f| f.id != id);
        self.save_folders(&folders);

        let mut notes = self.load_notes();
        let mut notes_updated = false;
        for note in notes.iter_mut() {
            if note.folder_id == Some(id) {
                note.folder_id = None;
                note.touch();
                notes_updated = true;
            }
        }
        if notes_updated {
            self.save_notes(&notes);
        }

        let mut links = self.load_links();
        let mut links_updated = false;
        for link in links.iter_mut() {
            if link.folder_id == Some(id) {
                link.folder_id = None;
                link.touch();
                links_updated = true;
            }
        }
        if links_updated {
            self.save_links(&links);
        }
    }

    // ── Change notifications ────────────────────────────────────────────

    pub fn subscribe_notes(&self) -> broadcast::Receiver<Vec<Note>> {
        self.notes_tx.subscribe()
    }

    pub fn subscribe_links(&self) -> broadcast::Receiver<Vec<Link>> {
        self.links_tx.subscribe()
    }

    pub fn subscribe_folders(&self) -> broadcast::Receiver<Vec<Folder>> {
        self.folders_tx.subscribe()
    }

    /// Subscribe to the unified notes+links feed.
    pub fn subscribe_items(&self) -> broadcast::Receiver<Vec<VaultItem>> {
        self.items_tx.subscribe()
    }

    fn publish_items(&self) {
        let items: Vec<VaultItem> = self
            .load_notes()
            .into_iter()
            .map(VaultItem::Note)
            .chain(self.load_links().into_iter().map(VaultItem::Link))
            .collect();
        let _ = self.items_tx.send(items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use lockleaf_crypto::{SessionKey, KEY_LENGTH};
    use tempfile::TempDir;
    use url::Url;

    fn unlocked_cipher() -> Arc<CipherEngine> {
        let cipher = CipherEngine::new();
        cipher.set_current_key(SessionKey::from_bytes([42u8; KEY_LENGTH]));
        Arc::new(cipher)
    }

    fn test_store() -> (CollectionStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = CollectionStore::with_vault_dir(unlocked_cipher(), temp.path());
        (store, temp)
    }

    #[test]
    fn test_load_missing_files_is_empty() {
        let (store, _temp) = test_store();

        assert!(store.load_notes().is_empty());
        assert!(store.load_links().is_empty());
        assert!(store.load_folders().is_empty());
    }

    #[test]
    fn test_load_zero_length_file_is_empty() {
        let (store, temp) = test_store();
        fs::write(temp.path().join(NOTES_FILE), b"").unwrap();

        assert!(store.load_notes().is_empty());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let (store, _temp) = test_store();

        let mut note = Note::new("First", "body");
        note.tags = vec!["work".to_string()];
        let other = Note::new("Second", "more body");

        store.save_notes(&[note.clone(), other.clone()]);
        let mut loaded = store.load_notes();
        loaded.sort_by_key(|n| n.creation_date);

        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains(&note));
        assert!(loaded.contains(&other));
    }

    #[test]
    fn test_save_note_upserts() {
        let (store, _temp) = test_store();

        let mut note = Note::new("Draft", "v1");
        store.save_note(note.clone());
        assert_eq!(store.load_notes().len(), 1);

        note.content = "v2".to_string();
        store.save_note(note.clone());

        let loaded = store.load_notes();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].content, "v2");

        store.save_note(Note::new("Another", ""));
        assert_eq!(store.load_notes().len(), 2);
    }

    #[test]
    fn test_delete_note() {
        let (store, _temp) = test_store();

        let note = Note::new("Gone soon", "");
        let keep = Note::new("Keeper", "");
        store.save_notes(&[note.clone(), keep.clone()]);

        store.delete_note(note.id);

        let loaded = store.load_notes();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, keep.id);
    }

    #[test]
    fn test_link_roundtrip() {
        let (store, _temp) = test_store();

        let mut link = Link::new("Docs", Url::parse("https://docs.rs").unwrap());
        link.description = Some("crate docs".to_string());
        link.favicon = Some(vec![0xDE, 0xAD]);
        store.save_link(link.clone());

        let loaded = store.load_links();
        assert_eq!(loaded, vec![link]);
    }

    #[test]
    fn test_corrupted_file_loads_empty() {
        let (store, temp) = test_store();
        fs::write(temp.path().join(LINKS_FILE), b"not a frame at all, definitely").unwrap();

        assert!(store.load_links().is_empty());
    }

    #[test]
    fn test_tampered_ciphertext_loads_empty() {
        let (store, temp) = test_store();
        store.save_notes(&[Note::new("Secret", "payload")]);

        let path = temp.path().join(NOTES_FILE);
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        assert!(store.load_notes().is_empty());
    }

    #[test]
    fn test_wrong_key_loads_empty() {
        let temp = TempDir::new().unwrap();

        let store = CollectionStore::with_vault_dir(unlocked_cipher(), temp.path());
        store.save_notes(&[Note::new("Secret", "")]);

        let other_cipher = CipherEngine::new();
        other_cipher.set_current_key(SessionKey::from_bytes([7u8; KEY_LENGTH]));
        let other = CollectionStore::with_vault_dir(Arc::new(other_cipher), temp.path());

        assert!(other.load_notes().is_empty());
    }

    #[test]
    fn test_save_without_key_leaves_file_untouched() {
        let temp = TempDir::new().unwrap();
        let store = CollectionStore::with_vault_dir(Arc::new(CipherEngine::new()), temp.path());

        store.save_notes(&[Note::new("Unsavable", "")]);

        assert!(!temp.path().join(NOTES_FILE).exists());
        assert!(store.load_notes().is_empty());
    }

    #[test]
    fn test_delete_folder_cascades() {
        let (store, _temp) = test_store();

        let folder = Folder::new("Projects");
        let other_folder = Folder::new("Archive");
        store.save_folders(&[folder.clone(), other_folder.clone()]);

        let backdated = Utc::now() - Duration::seconds(30);

        let mut filed_note = Note::new("In folder", "");
        filed_note.folder_id = Some(folder.id);
        filed_note.modification_date = backdated;

        let mut loose_note = Note::new("Loose", "");
        loose_note.modification_date = backdated;

        let mut filed_link = Link::new("In folder", Url::parse("https://example.com").unwrap());
        filed_link.folder_id = Some(folder.id);
        filed_link.modification_date = backdated;

        store.save_notes(&[filed_note.clone(), loose_note.clone()]);
        store.save_links(&[filed_link.clone()]);

        store.delete_folder(folder.id);

        let folders = store.load_folders();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].id, other_folder.id);

        let notes = store.load_notes();
        let reloaded_filed = notes.iter().find(|n| n.id == filed_note.id).unwrap();
        assert!(reloaded_filed.folder_id.is_none());
        assert!(reloaded_filed.modification_date > backdated);

        let reloaded_loose = notes.iter().find(|n| n.id == loose_note.id).unwrap();
        assert_eq!(reloaded_loose.modification_date, backdated);

        let links = store.load_links();
        assert!(links[0].folder_id.is_none());
        assert!(links[0].modification_date > backdated);
    }

    #[test]
    fn test_delete_folder_skips_unreferenced_collections() {
        let (store, temp) = test_store();

        let folder = Folder::new("Empty");
        store.save_folders(&[folder.clone()]);
        store.save_notes(&[Note::new("Loose", "")]);

        // No link file on disk; the cascade must not create one.
        store.delete_folder(folder.id);

        assert!(!temp.path().join(LINKS_FILE).exists());
        assert!(store.load_folders().is_empty());
    }

    #[test]
    fn test_save_notifies_subscribers() {
        let (store, _temp) = test_store();

        let mut notes_rx = store.subscribe_notes();
        let mut items_rx = store.subscribe_items();

        let note = Note::new("Announce", "");
        store.save_notes(&[note.clone()]);

        assert_eq!(notes_rx.try_recv().unwrap(), vec![note.clone()]);
        assert_eq!(items_rx.try_recv().unwrap(), vec![VaultItem::Note(note)]);
    }

    #[test]
    fn test_folder_save_does_not_touch_items_feed() {
        let (store, _temp) = test_store();

        let mut folders_rx = store.subscribe_folders();
        let mut items_rx = store.subscribe_items();

        store.save_folders(&[Folder::new("Quiet")]);

        assert_eq!(folders_rx.try_recv().unwrap().len(), 1);
        assert!(items_rx.try_recv().is_err());
    }

    #[test]
    fn test_failed_save_emits_nothing() {
        let temp = TempDir::new().unwrap();
        let store = CollectionStore::with_vault_dir(Arc::new(CipherEngine::new()), temp.path());
        let mut notes_rx = store.subscribe_notes();

        store.save_notes(&[Note::new("Silent", "")]);

        assert!(notes_rx.try_recv().is_err());
    }

    #[test]
    fn test_set_vault_dir_reemits_collections() {
        let cipher = unlocked_cipher();

        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();

        let seeder = CollectionStore::with_vault_dir(cipher.clone(), second.path());
        let note = Note::new("Second vault note", "");
        seeder.save_notes(&[note.clone()]);

        let mut store = CollectionStore::with_vault_dir(cipher, first.path());
        let mut notes_rx = store.subscribe_notes();

        store.set_vault_dir(Some(second.path().to_path_buf()));

        assert_eq!(notes_rx.try_recv().unwrap(), vec![note]);
        assert_eq!(store.vault_dir(), Some(&second.path().to_path_buf()));
    }
}
