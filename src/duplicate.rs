//! Sibling-folder duplication.
//!
//! A duplicate is planned first: every check that can refuse the operation
//! (unreadable source, name collision) runs before the host is asked to
//! create anything. Execution then creates the folder and copies notes one
//! at a time. A note that fails to copy is logged and recorded in the
//! report; it never aborts the run.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{NotedupError, Result};
use crate::host::{Container, FolderRef, NoteRef, NotesHost};

pub const DEFAULT_SUFFIX: &str = "*";

/// How a single note is copied into the destination folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CopyStrategy {
    /// Read name and body, create a fresh note. Loses anything not in the body.
    #[default]
    Field,
    /// Let the host duplicate the note, then move the copy over. Keeps
    /// formatting and attachments.
    Native,
}

/// Everything checked before the first write.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicatePlan {
    #[serde(skip)]
    pub source: FolderRef,
    #[serde(skip)]
    pub parent: Container,
    pub source_name: String,
    pub new_name: String,
    /// Notes directly in the source folder.
    pub notes: usize,
    /// Nested subfolders that will be recreated (deep mode only).
    pub subfolders: usize,
    /// Notes inside those subfolders (deep mode only).
    pub nested_notes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteFailure {
    /// Folder the note lives in, relative to the source folder.
    pub folder: String,
    /// 1-based position within that folder.
    pub index: usize,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateReport {
    pub source_name: String,
    pub new_name: String,
    #[serde(skip)]
    pub folder: FolderRef,
    pub notes_total: usize,
    pub notes_copied: usize,
    /// Subfolders recreated under the new folder.
    pub folders_created: usize,
    pub failures: Vec<NoteFailure>,
    pub skipped_folders: Vec<String>,
}

pub struct Duplicator<'a> {
    host: &'a dyn NotesHost,
    copy: CopyStrategy,
    recursive: bool,
    suffix: String,
}

impl<'a> Duplicator<'a> {
    pub fn new(host: &'a dyn NotesHost) -> Self {
        Self {
            host,
            copy: CopyStrategy::default(),
            recursive: false,
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }

    pub fn copy_strategy(mut self, copy: CopyStrategy) -> Self {
        self.copy = copy;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Plan and execute in one go.
    pub fn duplicate(&self, source: &FolderRef) -> Result<DuplicateReport> {
        let plan = self.plan(source)?;
        self.execute(&plan)
    }

    pub fn plan(&self, source: &FolderRef) -> Result<DuplicatePlan> {
        let source_name = self.host.folder_name(source)?;
        let new_name = format!("{}{}", source_name, self.suffix);
        let parent = self.host.folder_container(source)?;

        for sibling in self.host.child_folders(&parent)? {
            match self.host.folder_name(&sibling) {
                Ok(name) if name == new_name => return Err(NotedupError::AlreadyExists(new_name)),
                Ok(_) => {}
                Err(e) => warn!(folder = %sibling.0, error = %e, "cannot read sibling folder name"),
            }
        }

        let notes = self.host.folder_notes(source)?.len();
        let (subfolders, nested_notes) = if self.recursive {
            self.count_nested(source)
        } else {
            (0, 0)
        };

        Ok(DuplicatePlan {
            source: source.clone(),
            parent,
            source_name,
            new_name,
            notes,
            subfolders,
            nested_notes,
        })
    }

    pub fn execute(&self, plan: &DuplicatePlan) -> Result<DuplicateReport> {
        info!("Creating new folder: {}", plan.new_name);
        let folder = self.host.create_folder(&plan.parent, &plan.new_name)?;

        let mut report = DuplicateReport {
            source_name: plan.source_name.clone(),
            new_name: plan.new_name.clone(),
            folder: folder.clone(),
            notes_total: 0,
            notes_copied: 0,
            folders_created: 0,
            failures: Vec::new(),
            skipped_folders: Vec::new(),
        };

        self.copy_notes(&plan.source, &folder, &plan.source_name, &mut report)?;
        if self.recursive {
            self.copy_subfolders(&plan.source, &folder, &plan.source_name, &mut report);
        }

        Ok(report)
    }

    fn copy_notes(
        &self,
        source: &FolderRef,
        dest: &FolderRef,
        label: &str,
        report: &mut DuplicateReport,
    ) -> Result<()> {
        let notes = self.host.folder_notes(source)?;
        info!("Found {} note(s) to copy in {}", notes.len(), label);
        report.notes_total += notes.len();

        for (i, note) in notes.iter().enumerate() {
            let index = i + 1;
            let (name, outcome) = match self.host.note_name(note) {
                Ok(name) => {
                    info!("  Copying note {}/{}: {}", index, notes.len(), name);
                    let outcome = self.copy_note(note, &name, dest);
                    (name, outcome)
                }
                Err(e) => ("<unreadable>".to_string(), Err(e)),
            };

            match outcome {
                Ok(()) => report.notes_copied += 1,
                Err(e) => {
                    let reason = e.to_string();
                    let error = NotedupError::NoteCopyFailure {
                        index,
                        name: name.clone(),
                        reason: reason.clone(),
                    };
                    warn!(folder = label, "{}", error);
                    report.failures.push(NoteFailure {
                        folder: label.to_string(),
                        index,
                        name,
                        reason,
                    });
                }
            }
        }
        Ok(())
    }

    fn copy_note(&self, note: &NoteRef, name: &str, dest: &FolderRef) -> Result<()> {
        match self.copy {
            CopyStrategy::Field => {
                let body = self.host.note_body(note)?;
                self.host.create_note(dest, name, &body)?;
            }
            CopyStrategy::Native => {
                let copy = self.host.duplicate_note(note)?;
                if let Err(e) = self.host.move_note(&copy, dest) {
                    // the duplicate still sits in the source folder
                    if let Err(cleanup) = self.host.delete_note(&copy) {
                        warn!(note = %copy.0, error = %cleanup, "could not remove stray duplicate");
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn copy_subfolders(
        &self,
        source: &FolderRef,
        dest: &FolderRef,
        label: &str,
        report: &mut DuplicateReport,
    ) {
        let subfolders = match self.host.subfolders(source) {
            Ok(subfolders) => subfolders,
            Err(e) => {
                warn!(folder = label, error = %e, "skipping subfolders");
                report.skipped_folders.push(format!("{}/*", label));
                return;
            }
        };

        for subfolder in subfolders {
            let name = match self.host.folder_name(&subfolder) {
                Ok(name) => name,
                Err(e) => {
                    warn!(folder = %subfolder.0, error = %e, "skipping inaccessible folder");
                    report.skipped_folders.push(format!("{}/{}", label, subfolder.0));
                    continue;
                }
            };
            let child_label = format!("{}/{}", label, name);

            info!("  Creating subfolder: {}", name);
            let created = match self
                .host
                .create_folder(&Container::Folder(dest.clone()), &name)
            {
                Ok(created) => created,
                Err(e) => {
                    warn!(folder = %child_label, error = %e, "could not create subfolder");
                    report.skipped_folders.push(child_label);
                    continue;
                }
            };
            report.folders_created += 1;

            if let Err(e) = self.copy_notes(&subfolder, &created, &child_label, report) {
                warn!(folder = %child_label, error = %e, "could not list notes");
                report.skipped_folders.push(child_label.clone());
            }
            self.copy_subfolders(&subfolder, &created, &child_label, report);
        }
    }

    /// Folders and notes below `folder`, ignoring anything unreadable.
    fn count_nested(&self, folder: &FolderRef) -> (usize, usize) {
        let mut folders = 0;
        let mut notes = 0;
        for subfolder in self.host.subfolders(folder).unwrap_or_default() {
            if self.host.folder_name(&subfolder).is_err() {
                continue;
            }
            folders += 1;
            notes += self
                .host
                .folder_notes(&subfolder)
                .map(|n| n.len())
                .unwrap_or_default();
            let (f, n) = self.count_nested(&subfolder);
            folders += f;
            notes += n;
        }
        debug!(folder = %folder.0, folders, notes, "counted nested contents");
        (folders, notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{AccountSnapshot, FolderSnapshot, Snapshot};
    use crate::host::{HostOp, MemoryHost};

    fn host_with(personal: FolderSnapshot) -> MemoryHost {
        MemoryHost::from_snapshot(&Snapshot {
            accounts: vec![AccountSnapshot::new("iCloud")
                .folder(FolderSnapshot::new("Work"))
                .folder(personal)],
        })
    }

    fn three_notes() -> FolderSnapshot {
        FolderSnapshot::new("Test")
            .note("one", "<div>1</div>")
            .note("two", "<div>2</div>")
            .note("three", "<div>3</div>")
    }

    fn test_folder(host: &MemoryHost) -> FolderRef {
        let personal = host.top_level_folders().unwrap()[1].clone();
        host.subfolders(&personal).unwrap()[0].clone()
    }

    #[test]
    fn test_duplicates_all_notes() {
        let host = host_with(FolderSnapshot::new("Personal").folder(three_notes()));
        let report = Duplicator::new(&host).duplicate(&test_folder(&host)).unwrap();

        assert_eq!(report.new_name, "Test*");
        assert_eq!((report.notes_copied, report.notes_total), (3, 3));
        assert!(report.failures.is_empty());

        let snapshot = host.snapshot();
        let copy = snapshot.folder_at("iCloud", &["Personal", "Test*"]).unwrap();
        let original = snapshot.folder_at("iCloud", &["Personal", "Test"]).unwrap();
        assert_eq!(copy.notes, original.notes);
    }

    #[test]
    fn test_collision_aborts_before_writing() {
        let host = host_with(
            FolderSnapshot::new("Personal")
                .folder(three_notes())
                .folder(FolderSnapshot::new("Test*")),
        );
        let folders_before = host.folder_count();
        let notes_before = host.note_count();

        match Duplicator::new(&host).duplicate(&test_folder(&host)) {
            Err(NotedupError::AlreadyExists(name)) => assert_eq!(name, "Test*"),
            other => panic!("Expected AlreadyExists, got {:?}", other),
        }
        assert_eq!(host.folder_count(), folders_before);
        assert_eq!(host.note_count(), notes_before);
    }

    #[test]
    fn test_failed_note_does_not_abort() {
        let host = host_with(
            FolderSnapshot::new("Personal").folder(
                FolderSnapshot::new("Test")
                    .note("one", "1")
                    .locked_note("two")
                    .note("three", "3"),
            ),
        );
        let report = Duplicator::new(&host).duplicate(&test_folder(&host)).unwrap();

        assert_eq!((report.notes_copied, report.notes_total), (2, 3));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 2);
        assert_eq!(report.failures[0].name, "two");
        assert!(report.failures[0].reason.contains("locked"));

        let snapshot = host.snapshot();
        let copy = snapshot.folder_at("iCloud", &["Personal", "Test*"]).unwrap();
        let names: Vec<&str> = copy.notes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["one", "three"]);
    }

    #[test]
    fn test_native_copy_leaves_source_untouched() {
        let host = host_with(FolderSnapshot::new("Personal").folder(three_notes()));
        let report = Duplicator::new(&host)
            .copy_strategy(CopyStrategy::Native)
            .duplicate(&test_folder(&host))
            .unwrap();
        assert_eq!(report.notes_copied, 3);

        let snapshot = host.snapshot();
        let original = snapshot.folder_at("iCloud", &["Personal", "Test"]).unwrap();
        let copy = snapshot.folder_at("iCloud", &["Personal", "Test*"]).unwrap();
        assert_eq!(original.notes.len(), 3);
        assert_eq!(copy.notes, original.notes);
    }

    #[test]
    fn test_native_copy_of_locked_note_fails_cleanly() {
        let host = host_with(
            FolderSnapshot::new("Personal")
                .folder(FolderSnapshot::new("Test").note("one", "1").locked_note("two")),
        );
        let report = Duplicator::new(&host)
            .copy_strategy(CopyStrategy::Native)
            .duplicate(&test_folder(&host))
            .unwrap();

        assert_eq!((report.notes_copied, report.notes_total), (1, 2));
        let snapshot = host.snapshot();
        let original = snapshot.folder_at("iCloud", &["Personal", "Test"]).unwrap();
        assert_eq!(original.notes.len(), 2);
    }

    #[test]
    fn test_native_move_failure_removes_stray_duplicate() {
        let host = host_with(FolderSnapshot::new("Personal").folder(three_notes()));
        host.fail_on(HostOp::MoveNote, "two");
        let notes_before = host.note_count();

        let report = Duplicator::new(&host)
            .copy_strategy(CopyStrategy::Native)
            .duplicate(&test_folder(&host))
            .unwrap();

        assert_eq!((report.notes_copied, report.notes_total), (2, 3));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 2);
        assert_eq!(report.failures[0].name, "two");

        let snapshot = host.snapshot();
        let original = snapshot.folder_at("iCloud", &["Personal", "Test"]).unwrap();
        let names: Vec<&str> = original.notes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["one", "two", "three"]);
        let copy = snapshot.folder_at("iCloud", &["Personal", "Test*"]).unwrap();
        let names: Vec<&str> = copy.notes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["one", "three"]);
        // no duplicate of "two" is left anywhere
        assert_eq!(host.note_count(), notes_before + 2);
    }

    #[test]
    fn test_unreadable_note_name_keeps_original_error() {
        let host = host_with(FolderSnapshot::new("Personal").folder(three_notes()));
        host.fail_on(HostOp::NoteName, "two");

        let report = Duplicator::new(&host).duplicate(&test_folder(&host)).unwrap();

        assert_eq!((report.notes_copied, report.notes_total), (2, 3));
        let failure = &report.failures[0];
        assert_eq!(failure.name, "<unreadable>");
        assert_eq!(failure.reason, "Notes error: NoteName rejected for \"two\"");
    }

    #[test]
    fn test_recursive_skips_subfolder_that_cannot_be_created() {
        let host = host_with(
            FolderSnapshot::new("Personal").folder(
                three_notes()
                    .folder(FolderSnapshot::new("Inner").note("x", "X"))
                    .folder(FolderSnapshot::new("Other").note("y", "Y")),
            ),
        );
        host.fail_on(HostOp::CreateFolder, "Inner");

        let report = Duplicator::new(&host)
            .recursive(true)
            .duplicate(&test_folder(&host))
            .unwrap();

        assert_eq!(report.folders_created, 1);
        assert_eq!(report.skipped_folders, ["Test/Inner"]);
        assert_eq!((report.notes_copied, report.notes_total), (4, 4));

        let snapshot = host.snapshot();
        let copy = snapshot.folder_at("iCloud", &["Personal", "Test*"]).unwrap();
        let names: Vec<&str> = copy.folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Other"]);
        let original = snapshot.folder_at("iCloud", &["Personal", "Test", "Inner"]).unwrap();
        assert_eq!(original.notes.len(), 1);
    }

    #[test]
    fn test_shallow_copy_skips_subfolders() {
        let host = host_with(
            FolderSnapshot::new("Personal")
                .folder(three_notes().folder(FolderSnapshot::new("Inner").note("x", ""))),
        );
        let report = Duplicator::new(&host).duplicate(&test_folder(&host)).unwrap();

        assert_eq!(report.folders_created, 0);
        let snapshot = host.snapshot();
        let copy = snapshot.folder_at("iCloud", &["Personal", "Test*"]).unwrap();
        assert!(copy.folders.is_empty());
    }

    #[test]
    fn test_recursive_copy_rebuilds_tree() {
        let host = host_with(
            FolderSnapshot::new("Personal").folder(
                three_notes()
                    .folder(
                        FolderSnapshot::new("Inner")
                            .note("x", "X")
                            .folder(FolderSnapshot::new("Deepest").note("y", "Y")),
                    )
                    .folder(FolderSnapshot::new("Gone").inaccessible()),
            ),
        );
        let duplicator = Duplicator::new(&host).recursive(true);
        let plan = duplicator.plan(&test_folder(&host)).unwrap();
        assert_eq!((plan.notes, plan.subfolders, plan.nested_notes), (3, 2, 2));

        let report = duplicator.execute(&plan).unwrap();
        assert_eq!((report.notes_copied, report.notes_total), (5, 5));
        assert_eq!(report.folders_created, 2);
        assert_eq!(report.skipped_folders.len(), 1);

        let snapshot = host.snapshot();
        let deepest = snapshot
            .folder_at("iCloud", &["Personal", "Test*", "Inner", "Deepest"])
            .unwrap();
        assert_eq!(deepest.notes[0].body, "Y");
    }

    #[test]
    fn test_plan_does_not_write() {
        let host = host_with(FolderSnapshot::new("Personal").folder(three_notes()));
        let before = host.snapshot();

        let plan = Duplicator::new(&host)
            .suffix(" copy")
            .plan(&test_folder(&host))
            .unwrap();
        assert_eq!(plan.new_name, "Test copy");
        assert_eq!(plan.notes, 3);
        assert_eq!(host.snapshot(), before);
    }

    #[test]
    fn test_top_level_folder_duplicates_into_account() {
        let host = host_with(FolderSnapshot::new("Personal").note("p", ""));
        let personal = host.top_level_folders().unwrap()[1].clone();
        Duplicator::new(&host).duplicate(&personal).unwrap();

        let snapshot = host.snapshot();
        assert!(snapshot.folder_at("iCloud", &["Personal*"]).is_some());
    }
}
