//! Entity types stored in a vault's collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Common accessors shared by notes and links.
pub trait Item {
    fn id(&self) -> Uuid;
    fn title(&self) -> &str;
    fn creation_date(&self) -> DateTime<Utc>;
    fn modification_date(&self) -> DateTime<Utc>;
    fn folder_id(&self) -> Option<Uuid>;
    fn tags(&self) -> &[String];
}

/// A markdown note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub creation_date: DateTime<Utc>,
    pub modification_date: DateTime<Utc>,
    /// Soft reference to a folder; cleared when the folder is deleted.
    pub folder_id: Option<Uuid>,
    pub tags: Vec<String>,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            creation_date: now,
            modification_date: now,
            folder_id: None,
            tags: Vec::new(),
        }
    }

    /// Refresh the modification timestamp.
    pub fn touch(&mut self) {
        self.modification_date = Utc::now();
    }
}

impl Item for Note {
    fn id(&self) -> Uuid {
        self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }
    fn modification_date(&self) -> DateTime<Utc> {
        self.modification_date
    }
    fn folder_id(&self) -> Option<Uuid> {
        self.folder_id
    }
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// A saved web link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: Uuid,
    pub title: String,
    pub url: Url,
    pub description: Option<String>,
    pub creation_date: DateTime<Utc>,
    pub modification_date: DateTime<Utc>,
    /// Soft reference to a folder; cleared when the folder is deleted.
    pub folder_id: Option<Uuid>,
    pub tags: Vec<String>,
    /// Raw favicon bytes, fetched by the presentation layer.
    pub favicon: Option<Vec<u8>>,
}

impl Link {
    pub fn new(title: impl Into<String>, url: Url) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            url,
            description: None,
            creation_date: now,
            modification_date: now,
            folder_id: None,
            tags: Vec::new(),
            favicon: None,
        }
    }

    /// Refresh the modification timestamp.
    pub fn touch(&mut self) {
        self.modification_date = Utc::now();
    }
}

impl Item for Link {
    fn id(&self) -> Uuid {
        self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }
    fn modification_date(&self) -> DateTime<Utc> {
        self.modification_date
    }
    fn folder_id(&self) -> Option<Uuid> {
        self.folder_id
    }
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Display color for a folder, stored as sRGB components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

/// A folder grouping notes and links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub creation_date: DateTime<Utc>,
    pub modification_date: DateTime<Utc>,
    pub parent_folder_id: Option<Uuid>,
    pub color: Option<Color>,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            creation_date: now,
            modification_date: now,
            parent_folder_id: None,
            color: None,
        }
    }
}

/// A note or link, for the unified feed across both collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VaultItem {
    Note(Note),
    Link(Link),
}

impl VaultItem {
    pub fn id(&self) -> Uuid {
        match self {
            VaultItem::Note(note) => note.id,
            VaultItem::Link(link) => link.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            VaultItem::Note(note) => &note.title,
            VaultItem::Link(link) => &link.title,
        }
    }

    pub fn modification_date(&self) -> DateTime<Utc> {
        match self {
            VaultItem::Note(note) => note.modification_date,
            VaultItem::Link(link) => link.modification_date,
        }
    }
}
