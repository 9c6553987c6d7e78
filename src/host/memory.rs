//! In-process notes host backed by a JSON snapshot.
//!
//! Mirrors the parts of Apple Notes behavior the duplicator depends on:
//! folder names are not unique, deleted or otherwise unreachable folders
//! fail on every access, and locked (password-protected) notes refuse to
//! hand out their body or be duplicated. Individual host calls can also be
//! made to fail on demand with [`MemoryHost::fail_on`].

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{AccountRef, Container, FolderRef, NoteRef, NotesHost};
use crate::error::{NotedupError, Result};

/// Serialized form of a whole host: accounts, folder trees and notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub accounts: Vec<AccountSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub name: String,
    #[serde(default)]
    pub folders: Vec<FolderSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderSnapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub inaccessible: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub folders: Vec<FolderSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<NoteSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSnapshot {
    pub name: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl AccountSnapshot {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            folders: Vec::new(),
        }
    }

    pub fn folder(mut self, folder: FolderSnapshot) -> Self {
        self.folders.push(folder);
        self
    }
}

impl FolderSnapshot {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inaccessible: false,
            folders: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn folder(mut self, folder: FolderSnapshot) -> Self {
        self.folders.push(folder);
        self
    }

    pub fn note(mut self, name: &str, body: &str) -> Self {
        self.notes.push(NoteSnapshot {
            name: name.to_string(),
            body: body.to_string(),
            locked: false,
        });
        self
    }

    pub fn locked_note(mut self, name: &str) -> Self {
        self.notes.push(NoteSnapshot {
            name: name.to_string(),
            body: String::new(),
            locked: true,
        });
        self
    }

    pub fn inaccessible(mut self) -> Self {
        self.inaccessible = true;
        self
    }

    /// Child folder by name, first match.
    pub fn child(&self, name: &str) -> Option<&FolderSnapshot> {
        self.folders.iter().find(|f| f.name == name)
    }
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn account(&self, name: &str) -> Option<&AccountSnapshot> {
        self.accounts.iter().find(|a| a.name == name)
    }

    /// Follow `names` from the top level of `account`, first match per level.
    pub fn folder_at(&self, account: &str, names: &[&str]) -> Option<&FolderSnapshot> {
        let (first, rest) = names.split_first()?;
        let mut current = self
            .account(account)?
            .folders
            .iter()
            .find(|f| f.name == *first)?;
        for name in rest {
            current = current.child(name)?;
        }
        Some(current)
    }
}

struct AccountNode {
    id: String,
    name: String,
    folders: Vec<String>,
}

struct FolderNode {
    name: String,
    container: Container,
    inaccessible: bool,
    folders: Vec<String>,
    notes: Vec<String>,
}

struct NoteNode {
    name: String,
    body: String,
    locked: bool,
    folder: String,
}

/// Host calls that [`MemoryHost::fail_on`] can break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOp {
    /// Reading the name of a note with the given name.
    NoteName,
    /// Moving a note with the given name into another folder.
    MoveNote,
    /// Creating a folder with the given name.
    CreateFolder,
}

#[derive(Default)]
struct Store {
    accounts: Vec<AccountNode>,
    folders: HashMap<String, FolderNode>,
    notes: HashMap<String, NoteNode>,
    faults: HashSet<(HostOp, String)>,
}

impl Store {
    fn check_fault(&self, op: HostOp, name: &str) -> Result<()> {
        if self.faults.contains(&(op, name.to_string())) {
            return Err(NotedupError::Host(format!("{:?} rejected for \"{}\"", op, name)));
        }
        Ok(())
    }

    fn folder(&self, id: &FolderRef) -> Result<&FolderNode> {
        let node = self
            .folders
            .get(&id.0)
            .ok_or_else(|| NotedupError::Host(format!("no folder with id {}", id.0)))?;
        if node.inaccessible {
            return Err(NotedupError::InaccessibleFolder(id.0.clone()));
        }
        Ok(node)
    }

    fn folder_mut(&mut self, id: &str) -> Result<&mut FolderNode> {
        let node = self
            .folders
            .get_mut(id)
            .ok_or_else(|| NotedupError::Host(format!("no folder with id {}", id)))?;
        if node.inaccessible {
            return Err(NotedupError::InaccessibleFolder(id.to_string()));
        }
        Ok(node)
    }

    fn note(&self, id: &NoteRef) -> Result<&NoteNode> {
        self.notes
            .get(&id.0)
            .ok_or_else(|| NotedupError::Host(format!("no note with id {}", id.0)))
    }

    fn account_mut(&mut self, id: &AccountRef) -> Result<&mut AccountNode> {
        self.accounts
            .iter_mut()
            .find(|a| a.id == id.0)
            .ok_or_else(|| NotedupError::Host(format!("no account with id {}", id.0)))
    }

    fn insert_folder(&mut self, container: Container, name: &str, inaccessible: bool) -> String {
        let id = format!("folder-{}", Uuid::new_v4());
        self.folders.insert(
            id.clone(),
            FolderNode {
                name: name.to_string(),
                container,
                inaccessible,
                folders: Vec::new(),
                notes: Vec::new(),
            },
        );
        id
    }

    fn insert_note(&mut self, folder: &str, name: &str, body: &str, locked: bool) -> String {
        let id = format!("note-{}", Uuid::new_v4());
        self.notes.insert(
            id.clone(),
            NoteNode {
                name: name.to_string(),
                body: body.to_string(),
                locked,
                folder: folder.to_string(),
            },
        );
        id
    }

    fn load_folder(&mut self, container: Container, snapshot: &FolderSnapshot) -> String {
        let id = self.insert_folder(container, &snapshot.name, snapshot.inaccessible);

        let mut notes = Vec::with_capacity(snapshot.notes.len());
        for note in &snapshot.notes {
            notes.push(self.insert_note(&id, &note.name, &note.body, note.locked));
        }

        let mut children = Vec::with_capacity(snapshot.folders.len());
        for child in &snapshot.folders {
            children.push(self.load_folder(Container::Folder(FolderRef(id.clone())), child));
        }

        if let Some(node) = self.folders.get_mut(&id) {
            node.notes = notes;
            node.folders = children;
        }
        id
    }

    fn dump_folder(&self, id: &str) -> Option<FolderSnapshot> {
        let node = self.folders.get(id)?;
        Some(FolderSnapshot {
            name: node.name.clone(),
            inaccessible: node.inaccessible,
            folders: node
                .folders
                .iter()
                .filter_map(|child| self.dump_folder(child))
                .collect(),
            notes: node
                .notes
                .iter()
                .filter_map(|note| self.notes.get(note))
                .map(|note| NoteSnapshot {
                    name: note.name.clone(),
                    body: note.body.clone(),
                    locked: note.locked,
                })
                .collect(),
        })
    }
}

/// Notes host held entirely in memory.
pub struct MemoryHost {
    store: RefCell<Store>,
}

impl MemoryHost {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut store = Store::default();
        for account in &snapshot.accounts {
            let id = format!("account-{}", Uuid::new_v4());
            let mut folders = Vec::with_capacity(account.folders.len());
            for folder in &account.folders {
                folders.push(store.load_folder(Container::Account(AccountRef(id.clone())), folder));
            }
            store.accounts.push(AccountNode {
                id,
                name: account.name.clone(),
                folders,
            });
        }
        Self {
            store: RefCell::new(store),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let snapshot = Snapshot::load(path)?;
        Ok(Self::from_snapshot(&snapshot))
    }

    pub fn snapshot(&self) -> Snapshot {
        let store = self.store.borrow();
        Snapshot {
            accounts: store
                .accounts
                .iter()
                .map(|account| AccountSnapshot {
                    name: account.name.clone(),
                    folders: account
                        .folders
                        .iter()
                        .filter_map(|folder| store.dump_folder(folder))
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.snapshot().save(path)
    }

    /// Total number of folders, reachable or not. Handy for asserting that
    /// nothing was created.
    pub fn folder_count(&self) -> usize {
        self.store.borrow().folders.len()
    }

    pub fn note_count(&self) -> usize {
        self.store.borrow().notes.len()
    }

    /// Make every later `op` on the note or folder called `name` fail.
    pub fn fail_on(&self, op: HostOp, name: &str) {
        self.store.borrow_mut().faults.insert((op, name.to_string()));
    }
}

impl NotesHost for MemoryHost {
    fn accounts(&self) -> Result<Vec<AccountRef>> {
        Ok(self
            .store
            .borrow()
            .accounts
            .iter()
            .map(|a| AccountRef(a.id.clone()))
            .collect())
    }

    fn account_folders(&self, account: &AccountRef) -> Result<Vec<FolderRef>> {
        let store = self.store.borrow();
        let node = store
            .accounts
            .iter()
            .find(|a| a.id == account.0)
            .ok_or_else(|| NotedupError::Host(format!("no account with id {}", account.0)))?;
        Ok(node.folders.iter().cloned().map(FolderRef).collect())
    }

    fn folder_name(&self, folder: &FolderRef) -> Result<String> {
        Ok(self.store.borrow().folder(folder)?.name.clone())
    }

    fn folder_container(&self, folder: &FolderRef) -> Result<Container> {
        Ok(self.store.borrow().folder(folder)?.container.clone())
    }

    fn subfolders(&self, folder: &FolderRef) -> Result<Vec<FolderRef>> {
        let store = self.store.borrow();
        Ok(store
            .folder(folder)?
            .folders
            .iter()
            .cloned()
            .map(FolderRef)
            .collect())
    }

    fn folder_notes(&self, folder: &FolderRef) -> Result<Vec<NoteRef>> {
        let store = self.store.borrow();
        Ok(store
            .folder(folder)?
            .notes
            .iter()
            .cloned()
            .map(NoteRef)
            .collect())
    }

    fn note_name(&self, note: &NoteRef) -> Result<String> {
        let store = self.store.borrow();
        let node = store.note(note)?;
        store.check_fault(HostOp::NoteName, &node.name)?;
        Ok(node.name.clone())
    }

    fn note_body(&self, note: &NoteRef) -> Result<String> {
        let store = self.store.borrow();
        let node = store.note(note)?;
        if node.locked {
            return Err(NotedupError::Host(format!(
                "note \"{}\" is locked",
                node.name
            )));
        }
        Ok(node.body.clone())
    }

    fn create_folder(&self, parent: &Container, name: &str) -> Result<FolderRef> {
        let mut store = self.store.borrow_mut();
        store.check_fault(HostOp::CreateFolder, name)?;
        // the parent must be reachable before anything is inserted
        match parent {
            Container::Account(account) => {
                store.account_mut(account)?;
            }
            Container::Folder(folder) => {
                store.folder_mut(&folder.0)?;
            }
        }

        let id = store.insert_folder(parent.clone(), name, false);
        match parent {
            Container::Account(account) => store.account_mut(account)?.folders.push(id.clone()),
            Container::Folder(folder) => store.folder_mut(&folder.0)?.folders.push(id.clone()),
        }
        debug!(folder = %id, name, "created folder");
        Ok(FolderRef(id))
    }

    fn create_note(&self, folder: &FolderRef, name: &str, body: &str) -> Result<NoteRef> {
        let mut store = self.store.borrow_mut();
        store.folder_mut(&folder.0)?;
        let id = store.insert_note(&folder.0, name, body, false);
        store.folder_mut(&folder.0)?.notes.push(id.clone());
        Ok(NoteRef(id))
    }

    fn duplicate_note(&self, note: &NoteRef) -> Result<NoteRef> {
        let mut store = self.store.borrow_mut();
        let (name, body, folder) = {
            let node = store.note(note)?;
            if node.locked {
                return Err(NotedupError::Host(format!(
                    "note \"{}\" is locked and cannot be duplicated",
                    node.name
                )));
            }
            (node.name.clone(), node.body.clone(), node.folder.clone())
        };
        store.folder_mut(&folder)?;
        let id = store.insert_note(&folder, &name, &body, false);
        store.folder_mut(&folder)?.notes.push(id.clone());
        Ok(NoteRef(id))
    }

    fn move_note(&self, note: &NoteRef, folder: &FolderRef) -> Result<()> {
        let mut store = self.store.borrow_mut();
        let (from, name) = {
            let node = store.note(note)?;
            (node.folder.clone(), node.name.clone())
        };
        store.check_fault(HostOp::MoveNote, &name)?;
        store.folder_mut(&folder.0)?;

        store.folder_mut(&from)?.notes.retain(|n| n != &note.0);
        store.folder_mut(&folder.0)?.notes.push(note.0.clone());
        if let Some(node) = store.notes.get_mut(&note.0) {
            node.folder = folder.0.clone();
        }
        Ok(())
    }

    fn delete_note(&self, note: &NoteRef) -> Result<()> {
        let mut store = self.store.borrow_mut();
        let node = store
            .notes
            .remove(&note.0)
            .ok_or_else(|| NotedupError::Host(format!("no note with id {}", note.0)))?;
        if let Some(folder) = store.folders.get_mut(&node.folder) {
            folder.notes.retain(|n| n != &note.0);
        }
        Ok(())
    }
}
