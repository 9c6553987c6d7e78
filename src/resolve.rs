//! Locating a folder from its parsed path.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::host::{Container, FolderRef, NotesHost};
use crate::path::FolderPath;

/// How a path is matched against the host's folder trees.
///
/// The two strategies can pick different folders on a hierarchy with
/// repeated names, so the choice is explicit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResolveStrategy {
    /// Anchor at the top level and require an exact match at every level.
    #[default]
    Strict,
    /// Search every account at any depth, skipping unreadable folders.
    Exhaustive,
}

/// Find the folder `path` names. `Ok(None)` means no folder matched.
pub fn resolve_folder(
    host: &dyn NotesHost,
    path: &FolderPath,
    strategy: ResolveStrategy,
) -> Result<Option<FolderRef>> {
    debug!(path = %path, ?strategy, "resolving folder");
    match strategy {
        ResolveStrategy::Strict => resolve_strict(host, path.segments()),
        ResolveStrategy::Exhaustive => resolve_exhaustive(host, path.segments()),
    }
}

fn resolve_strict(host: &dyn NotesHost, segments: &[String]) -> Result<Option<FolderRef>> {
    let mut candidates = host.top_level_folders()?;
    let mut current = None;

    for (i, segment) in segments.iter().enumerate() {
        let mut found = None;
        for folder in candidates {
            if host.folder_name(&folder)? == *segment {
                found = Some(folder);
                break;
            }
        }

        let Some(folder) = found else {
            return Ok(None);
        };
        candidates = if i + 1 < segments.len() {
            host.subfolders(&folder)?
        } else {
            Vec::new()
        };
        current = Some(folder);
    }

    Ok(current)
}

fn resolve_exhaustive(host: &dyn NotesHost, segments: &[String]) -> Result<Option<FolderRef>> {
    for account in host.accounts()? {
        let folders = match host.account_folders(&account) {
            Ok(folders) => folders,
            Err(e) => {
                warn!(account = %account.0, error = %e, "skipping unreadable account");
                continue;
            }
        };
        if let Some(found) = search(host, &folders, segments, 0) {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Slash-delimited path of `container` below its account, e.g. `/Archive/Personal`.
/// An account itself renders as the empty string.
pub fn container_location(host: &dyn NotesHost, container: &Container) -> Result<String> {
    let mut names = Vec::new();
    let mut current = container.clone();
    while let Container::Folder(folder) = current {
        names.push(host.folder_name(&folder)?);
        current = host.folder_container(&folder)?;
    }

    let mut out = String::new();
    for name in names.iter().rev() {
        out.push('/');
        out.push_str(name);
    }
    Ok(out)
}

/// Depth-first match of `segments[index..]` against `folders`.
///
/// Once the first segment has matched, later segments must match direct
/// children. Before that, every subtree is also searched for a new start.
fn search(
    host: &dyn NotesHost,
    folders: &[FolderRef],
    segments: &[String],
    index: usize,
) -> Option<FolderRef> {
    for folder in folders {
        let name = match host.folder_name(folder) {
            Ok(name) => name,
            Err(e) => {
                warn!(folder = %folder.0, error = %e, "skipping inaccessible folder");
                continue;
            }
        };

        let matched = name == segments[index];
        if matched && index + 1 == segments.len() {
            return Some(folder.clone());
        }

        if !matched && index > 0 {
            continue;
        }

        let children = match host.subfolders(folder) {
            Ok(children) => children,
            Err(e) => {
                warn!(folder = %folder.0, error = %e, "skipping inaccessible folder");
                continue;
            }
        };

        if matched {
            if let Some(found) = search(host, &children, segments, index + 1) {
                return Some(found);
            }
        }
        if index == 0 {
            if let Some(found) = search(host, &children, segments, 0) {
                return Some(found);
            }
        }
    }
    None
}
