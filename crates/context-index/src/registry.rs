//! Host-global project registry (spec §3 `ProjectCard`, §4.5 L4 "Project
//! registry"): a single JSON file under `~/.memorybank` listing every
//! project this host knows about, used for discovery and cross-project task
//! delegation.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const GLOBAL_REGISTRY_FILE: &str = "global_registry.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectCard {
    pub project_id: String,
    pub path: PathBuf,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    /// Glob patterns describing the files this project owns.
    #[serde(default)]
    pub owns: Vec<String>,
    #[serde(default)]
    pub exports: Vec<String>,
    #[serde(default)]
    pub project_type: String,
    pub last_active: i64,
}

impl ProjectCard {
    #[must_use]
    pub fn new(project_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            project_id: project_id.into(),
            path: path.into(),
            description: String::new(),
            tags: Vec::new(),
            responsibilities: Vec::new(),
            owns: Vec::new(),
            exports: Vec::new(),
            project_type: String::new(),
            last_active: context_scanner::now_ms() as i64,
        }
    }
}

/// The registry itself. `projectId` is globally unique on the host (spec
/// §3); a second `register` of the same id overwrites the card in place.
#[derive(Default)]
pub struct ProjectRegistry {
    path: Option<PathBuf>,
    cards: HashMap<String, ProjectCard>,
}

impl ProjectRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location: `~/.memorybank/global_registry.json`. Falls back to
    /// a relative `.memorybank` directory if the host has no resolvable home
    /// directory (e.g. a minimal container).
    #[must_use]
    pub fn default_path() -> PathBuf {
        let base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join(".memorybank").join(GLOBAL_REGISTRY_FILE)
    }

    /// Load the registry from `path`, starting empty if the file is absent
    /// or corrupt.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cards: Vec<ProjectCard> = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self {
            path: Some(path),
            cards: cards.into_iter().map(|c| (c.project_id.clone(), c)).collect(),
        }
    }

    /// Load from [`ProjectRegistry::default_path`].
    pub fn load_default() -> Self {
        Self::load(Self::default_path())
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut cards: Vec<&ProjectCard> = self.cards.values().collect();
        cards.sort_by(|a, b| a.project_id.cmp(&b.project_id));
        let raw = serde_json::to_string_pretty(&cards)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Insert or overwrite a project's card.
    pub fn register(&mut self, card: ProjectCard) {
        self.cards.insert(card.project_id.clone(), card);
    }

    #[must_use]
    pub fn get(&self, project_id: &str) -> Option<&ProjectCard> {
        self.cards.get(project_id)
    }

    #[must_use]
    pub fn find_by_path(&self, path: &Path) -> Option<&ProjectCard> {
        self.cards.values().find(|c| c.path == path)
    }

    #[must_use]
    pub fn list(&self) -> Vec<&ProjectCard> {
        let mut cards: Vec<&ProjectCard> = self.cards.values().collect();
        cards.sort_by(|a, b| a.project_id.cmp(&b.project_id));
        cards
    }

    /// Bump `lastActive` to now. Returns an error iff `project_id` is not
    /// registered (a `ValidationError`, spec §7).
    pub fn touch_last_active(&mut self, project_id: &str) -> Result<()> {
        let card = self
            .cards
            .get_mut(project_id)
            .ok_or_else(|| IndexError::Validation(format!("unknown projectId {project_id:?}")))?;
        card.last_active = context_scanner::now_ms() as i64;
        Ok(())
    }

    pub fn remove(&mut self, project_id: &str) -> Option<ProjectCard> {
        self.cards.remove(project_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_starts_empty() {
        let registry = ProjectRegistry::load(std::env::temp_dir().join("nonexistent-global-registry.json"));
        assert!(registry.is_empty());
    }

    #[test]
    fn register_overwrites_by_project_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("global_registry.json");

        let mut registry = ProjectRegistry::load(&path);
        registry.register(ProjectCard::new("proj-a", "/tmp/proj-a"));
        assert_eq!(registry.len(), 1);

        let mut updated = ProjectCard::new("proj-a", "/tmp/proj-a");
        updated.description = "renamed".to_string();
        registry.register(updated);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("proj-a").unwrap().description, "renamed");
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("global_registry.json");

        let mut registry = ProjectRegistry::load(&path);
        registry.register(ProjectCard::new("proj-a", "/tmp/proj-a"));
        registry.save().unwrap();

        let reloaded = ProjectRegistry::load(&path);
        assert_eq!(reloaded.get("proj-a").unwrap().path, PathBuf::from("/tmp/proj-a"));
    }

    #[test]
    fn find_by_path_locates_card() {
        let mut registry = ProjectRegistry::new();
        registry.register(ProjectCard::new("proj-a", "/tmp/proj-a"));
        assert_eq!(registry.find_by_path(Path::new("/tmp/proj-a")).unwrap().project_id, "proj-a");
        assert!(registry.find_by_path(Path::new("/tmp/nope")).is_none());
    }

    #[test]
    fn touch_last_active_rejects_unknown_project() {
        let mut registry = ProjectRegistry::new();
        assert!(registry.touch_last_active("ghost").is_err());
    }
}
