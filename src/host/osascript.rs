//! Apple Notes through `osascript -l JavaScript`.
//!
//! Every trait call runs one JXA script. Arguments travel as a JSON array on
//! the interpreter's stdin, so names never need shell or AppleScript quoting
//! and note bodies are not bound by the OS limit on argument and environment
//! size. Every script prints its result as JSON.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::{AccountRef, Container, FolderRef, NoteRef, NotesHost};
use crate::error::{NotedupError, Result};

/// AppleEvent "no such object" (errAENoSuchObject).
const NO_SUCH_OBJECT: &str = "-1728";

const PRELUDE: &str = r#"
ObjC.import('Foundation');
function run() {
    const app = Application('Notes');
    const input = $.NSFileHandle.fileHandleWithStandardInput.readDataToEndOfFile;
    const text = $.NSString.alloc.initWithDataEncoding(input, $.NSUTF8StringEncoding).js;
    const args = JSON.parse(text);
    const folder = (id) => app.folders.byId(id);
    const note = (id) => app.notes.byId(id);
    return JSON.stringify(body(app, args, folder, note));
}
"#;

const ACCOUNTS: &str = "function body(app) { return app.accounts().map(a => a.id()); }";

// account.folders() lists every folder of the account, nested ones included
const ACCOUNT_FOLDERS: &str = r#"
function body(app, args) {
    const account = app.accounts.byId(args[0]);
    return account.folders().filter(f => {
        try { return f.container().id() === args[0]; } catch (e) { return false; }
    }).map(f => f.id());
}
"#;

const FOLDER_NAME: &str = "function body(app, args, folder) { return folder(args[0]).name(); }";

const FOLDER_CONTAINER: &str = r#"
function body(app, args, folder) {
    const id = folder(args[0]).container().id();
    const kind = app.accounts.byId(id).exists() ? 'account' : 'folder';
    return { kind: kind, id: id };
}
"#;

const SUBFOLDERS: &str =
    "function body(app, args, folder) { return folder(args[0]).folders().map(f => f.id()); }";

const FOLDER_NOTES: &str =
    "function body(app, args, folder) { return folder(args[0]).notes().map(n => n.id()); }";

const NOTE_NAME: &str = "function body(app, args, folder, note) { return note(args[0]).name(); }";

const NOTE_BODY: &str = "function body(app, args, folder, note) { return note(args[0]).body(); }";

const CREATE_FOLDER: &str = r#"
function body(app, args, folder) {
    const parent = args[0] === 'account' ? app.accounts.byId(args[1]) : folder(args[1]);
    return app.make({ new: 'folder', withProperties: { name: args[2] }, at: parent }).id();
}
"#;

const CREATE_NOTE: &str = r#"
function body(app, args, folder) {
    const props = { name: args[1], body: args[2] };
    return app.make({ new: 'note', withProperties: props, at: folder(args[0]) }).id();
}
"#;

const DUPLICATE_NOTE: &str =
    "function body(app, args, folder, note) { return app.duplicate(note(args[0])).id(); }";

const MOVE_NOTE: &str = r#"
function body(app, args, folder, note) {
    app.move(note(args[0]), { to: folder(args[1]) });
    return true;
}
"#;

const DELETE_NOTE: &str =
    "function body(app, args, folder, note) { app.delete(note(args[0])); return true; }";

/// Live Apple Notes host.
pub struct OsascriptHost {
    program: String,
}

impl Default for OsascriptHost {
    fn default() -> Self {
        Self::new()
    }
}

impl OsascriptHost {
    pub fn new() -> Self {
        Self::with_program("osascript")
    }

    /// Use a different interpreter binary, e.g. a wrapper script.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run<T: DeserializeOwned>(
        &self,
        op: &str,
        body: &str,
        args: serde_json::Value,
    ) -> Result<T> {
        let script = format!("{}\n{}", PRELUDE, body);
        let input = args.to_string();
        debug!(op, args_len = input.len(), "running osascript");

        let mut child = Command::new(&self.program)
            .args(["-l", "JavaScript", "-e", &script])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            // an interpreter that exits without reading is reported by its exit status
            match stdin.write_all(input.as_bytes()) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(self.spawn_error(e)),
                _ => {}
            }
        }

        let output = child.wait_with_output().map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(NotedupError::Host(format!("{} failed: {}", op, stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(serde_json::from_str(stdout.trim())?)
    }

    fn spawn_error(&self, e: std::io::Error) -> NotedupError {
        NotedupError::Host(format!("failed to run {}: {}", self.program, e))
    }

    /// Run a folder read, reporting missing or deleted folders as inaccessible.
    fn read_folder<T: DeserializeOwned>(
        &self,
        op: &str,
        body: &str,
        folder: &FolderRef,
    ) -> Result<T> {
        self.run(op, body, json!([folder.0])).map_err(|e| match e {
            NotedupError::Host(msg) if msg.contains(NO_SUCH_OBJECT) => {
                NotedupError::InaccessibleFolder(folder.0.clone())
            }
            other => other,
        })
    }
}

impl NotesHost for OsascriptHost {
    fn accounts(&self) -> Result<Vec<AccountRef>> {
        let ids: Vec<String> = self.run("accounts", ACCOUNTS, json!([]))?;
        Ok(ids.into_iter().map(AccountRef).collect())
    }

    fn account_folders(&self, account: &AccountRef) -> Result<Vec<FolderRef>> {
        let ids: Vec<String> = self.run("account_folders", ACCOUNT_FOLDERS, json!([account.0]))?;
        Ok(ids.into_iter().map(FolderRef).collect())
    }

    fn folder_name(&self, folder: &FolderRef) -> Result<String> {
        self.read_folder("folder_name", FOLDER_NAME, folder)
    }

    fn folder_container(&self, folder: &FolderRef) -> Result<Container> {
        self.read_folder("folder_container", FOLDER_CONTAINER, folder)
    }

    fn subfolders(&self, folder: &FolderRef) -> Result<Vec<FolderRef>> {
        let ids: Vec<String> = self.read_folder("subfolders", SUBFOLDERS, folder)?;
        Ok(ids.into_iter().map(FolderRef).collect())
    }

    fn folder_notes(&self, folder: &FolderRef) -> Result<Vec<NoteRef>> {
        let ids: Vec<String> = self.read_folder("folder_notes", FOLDER_NOTES, folder)?;
        Ok(ids.into_iter().map(NoteRef).collect())
    }

    fn note_name(&self, note: &NoteRef) -> Result<String> {
        self.run("note_name", NOTE_NAME, json!([note.0]))
    }

    fn note_body(&self, note: &NoteRef) -> Result<String> {
        self.run("note_body", NOTE_BODY, json!([note.0]))
    }

    fn create_folder(&self, parent: &Container, name: &str) -> Result<FolderRef> {
        let (kind, id) = match parent {
            Container::Account(account) => ("account", &account.0),
            Container::Folder(folder) => ("folder", &folder.0),
        };
        let id: String = self.run("create_folder", CREATE_FOLDER, json!([kind, id, name]))?;
        Ok(FolderRef(id))
    }

    fn create_note(&self, folder: &FolderRef, name: &str, body: &str) -> Result<NoteRef> {
        let id: String = self.run("create_note", CREATE_NOTE, json!([folder.0, name, body]))?;
        Ok(NoteRef(id))
    }

    fn duplicate_note(&self, note: &NoteRef) -> Result<NoteRef> {
        let id: String = self.run("duplicate_note", DUPLICATE_NOTE, json!([note.0]))?;
        Ok(NoteRef(id))
    }

    fn move_note(&self, note: &NoteRef, folder: &FolderRef) -> Result<()> {
        let _: bool = self.run("move_note", MOVE_NOTE, json!([note.0, folder.0]))?;
        Ok(())
    }

    fn delete_note(&self, note: &NoteRef) -> Result<()> {
        let _: bool = self.run("delete_note", DELETE_NOTE, json!([note.0]))?;
        Ok(())
    }
}
