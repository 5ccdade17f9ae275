//! Per-project snapshot discovery.
//!
//! Each project's tasks are exported to a directory as `<project_name>_tasks.json`.
//! A plain `tasks.json` in the same directory is treated as the default project.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SnapshotError;
use crate::snapshot::Snapshot;

/// A project and the snapshot file holding its tasks.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub display_name: String,
    pub file_path: PathBuf,
}

impl Project {
    pub fn new(display_name: &str, dir: &Path) -> Self {
        let name = sanitize_project_name(display_name);
        let file_path = dir.join(format!("{}_tasks.json", name));

        Project {
            name,
            display_name: display_name.to_string(),
            file_path,
        }
    }

    /// Recognise a `<name>_tasks.json` snapshot file.
    pub fn from_file(file_path: PathBuf) -> Option<Self> {
        if file_path.extension()?.to_str()? != "json" {
            return None;
        }
        let stem = file_path.file_stem()?.to_str()?;
        let name = stem.strip_suffix("_tasks")?;
        if name.is_empty() {
            return None;
        }
        let display_name = name.replace('_', " ");

        Some(Project {
            name: name.to_string(),
            display_name,
            file_path,
        })
    }

    pub fn load_snapshot(&self) -> Snapshot {
        Snapshot::load_or_empty(&self.file_path)
    }
}

/// Convert a display name to a safe project name for file naming.
pub fn sanitize_project_name(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// All project snapshots in `dir`, sorted by display name.
pub fn discover_projects(dir: &Path) -> Result<Vec<Project>, SnapshotError> {
    let mut projects = Vec::new();

    if !dir.exists() {
        return Ok(projects);
    }

    for entry in fs::read_dir(dir).map_err(|e| SnapshotError::io(dir, e))? {
        let path = entry.map_err(|e| SnapshotError::io(dir, e))?.path();
        if path.is_file() {
            if let Some(project) = Project::from_file(path) {
                projects.push(project);
            }
        }
    }

    projects.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(projects)
}

/// The plain `tasks.json` snapshot, if present.
pub fn get_legacy_project(dir: &Path) -> Option<Project> {
    let legacy_path = dir.join("tasks.json");
    legacy_path.exists().then(|| Project {
        name: "default".to_string(),
        display_name: "Default".to_string(),
        file_path: legacy_path,
    })
}

/// The most recently modified snapshot in `dir`, counting the legacy file.
pub fn get_most_recent_project(dir: &Path) -> Result<Option<Project>, SnapshotError> {
    let mut projects = discover_projects(dir)?;
    projects.extend(get_legacy_project(dir));

    let most_recent = projects
        .into_iter()
        .filter_map(|p| {
            let modified = fs::metadata(&p.file_path).and_then(|m| m.modified()).ok()?;
            Some((p, modified))
        })
        .max_by_key(|(_, modified)| *modified)
        .map(|(p, _)| p);

    Ok(most_recent)
}
