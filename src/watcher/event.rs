//! Translation of native notifications into coordinator events.

use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};

/// A filesystem change the coordinator acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Deleted(PathBuf),
    /// The native queue dropped events. Carries the affected path when the
    /// backend reports one.
    Overflow(Option<PathBuf>),
}

impl WatchEvent {
    /// Translate one native event. Renames split into delete and create.
    pub fn from_notify(event: &Event) -> Vec<WatchEvent> {
        if event.need_rescan() {
            return vec![WatchEvent::Overflow(event.paths.first().cloned())];
        }

        let paths = event.paths.iter().cloned();
        match event.kind {
            EventKind::Create(_) => paths.map(WatchEvent::Created).collect(),
            EventKind::Remove(_) => paths.map(WatchEvent::Deleted).collect(),

            EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                paths.map(WatchEvent::Deleted).collect()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                paths.map(WatchEvent::Created).collect()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
                [from, to, ..] => vec![
                    WatchEvent::Deleted(from.clone()),
                    WatchEvent::Created(to.clone()),
                ],
                _ => Vec::new(),
            },
            // Backends that cannot tell the side of a rename
            EventKind::Modify(ModifyKind::Name(_)) => paths
                .map(|p| {
                    if p.exists() {
                        WatchEvent::Created(p)
                    } else {
                        WatchEvent::Deleted(p)
                    }
                })
                .collect(),
            EventKind::Modify(_) | EventKind::Any => paths.map(WatchEvent::Modified).collect(),

            EventKind::Access(_) | EventKind::Other => Vec::new(),
        }
    }
}
