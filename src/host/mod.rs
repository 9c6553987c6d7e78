//! Access to the note-taking application that owns the folders and notes.
//!
//! Everything here is a thin handle into state owned by the host. Handles
//! wrap the host's opaque identifiers and are only meaningful to the host
//! that produced them.

pub mod memory;
pub mod osascript;

pub use memory::{HostOp, MemoryHost};
pub use osascript::OsascriptHost;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRef(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderRef(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteRef(pub String);

/// Whatever a folder lives in: an account (top level) or another folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Container {
    Account(AccountRef),
    Folder(FolderRef),
}

/// Operations consumed from the note-taking application.
///
/// Every call blocks until the host answers. Nothing is retried and no
/// timeout is applied.
pub trait NotesHost {
    fn accounts(&self) -> Result<Vec<AccountRef>>;

    /// Top-level folders of one account, in host order.
    fn account_folders(&self, account: &AccountRef) -> Result<Vec<FolderRef>>;

    /// Top-level folders across every account, as one flat namespace.
    fn top_level_folders(&self) -> Result<Vec<FolderRef>> {
        let mut folders = Vec::new();
        for account in self.accounts()? {
            folders.extend(self.account_folders(&account)?);
        }
        Ok(folders)
    }

    fn folder_name(&self, folder: &FolderRef) -> Result<String>;
    fn folder_container(&self, folder: &FolderRef) -> Result<Container>;
    fn subfolders(&self, folder: &FolderRef) -> Result<Vec<FolderRef>>;

    fn child_folders(&self, container: &Container) -> Result<Vec<FolderRef>> {
        match container {
            Container::Account(account) => self.account_folders(account),
            Container::Folder(folder) => self.subfolders(folder),
        }
    }

    fn folder_notes(&self, folder: &FolderRef) -> Result<Vec<NoteRef>>;
    fn note_name(&self, note: &NoteRef) -> Result<String>;
    fn note_body(&self, note: &NoteRef) -> Result<String>;

    fn create_folder(&self, parent: &Container, name: &str) -> Result<FolderRef>;
    fn create_note(&self, folder: &FolderRef, name: &str, body: &str) -> Result<NoteRef>;

    /// Duplicate a note in place, keeping native formatting and attachments.
    fn duplicate_note(&self, note: &NoteRef) -> Result<NoteRef>;
    fn move_note(&self, note: &NoteRef, folder: &FolderRef) -> Result<()>;
    fn delete_note(&self, note: &NoteRef) -> Result<()>;
}
