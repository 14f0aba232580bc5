//! In-memory catalog of the profiles found under a Bambu Studio config root.
//!
//! The catalog is rebuilt wholesale: `system/` is scanned before `user/`, and
//! each scope is walked depth-first in file-name order. Lookups return the
//! first match in that order, so a system profile shadows a user profile that
//! shares its type and name.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ProfileError, Result};
use crate::profile::{FlattenedProfile, ProfileRecord, ProfileScope, ProfileType};
use crate::resolve::InheritanceResolver;

#[derive(Debug, Clone)]
pub struct ProfileIndex {
    root: PathBuf,
    records: Vec<ProfileRecord>,
}

impl ProfileIndex {
    /// Scan `root` and build the catalog.
    ///
    /// Any profile file that cannot be parsed, or lacks `name`/`type`, fails
    /// the whole build.
    pub fn build(root: impl Into<PathBuf>) -> Result<Self> {
        let mut index = Self {
            root: root.into(),
            records: Vec::new(),
        };
        index.reindex()?;
        Ok(index)
    }

    /// Drop every record and rescan the root.
    pub fn reindex(&mut self) -> Result<()> {
        let mut records = Vec::new();
        for scope in ProfileScope::SCAN_ORDER {
            let scope_dir = self.root.join(scope.dir_name());
            if !scope_dir.is_dir() {
                continue;
            }
            scan_scope(&scope_dir, scope, &mut records)?;
        }

        tracing::debug!(
            root = %self.root.display(),
            profiles = records.len(),
            "indexed profile catalog"
        );
        self.records = records;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records(&self) -> &[ProfileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, profile_type: ProfileType, name: &str) -> Option<&ProfileRecord> {
        self.records
            .iter()
            .find(|r| r.profile_type == profile_type && r.name == name)
    }

    pub fn list(&self, profile_type: ProfileType) -> Vec<&ProfileRecord> {
        self.records
            .iter()
            .filter(|r| r.profile_type == profile_type)
            .collect()
    }

    pub fn machines(&self) -> Vec<&ProfileRecord> {
        self.list(ProfileType::Machine)
    }

    pub fn find_machine(&self, name: &str) -> Option<&ProfileRecord> {
        self.find(ProfileType::Machine, name)
    }

    pub fn processes(&self) -> Vec<&ProfileRecord> {
        self.list(ProfileType::Process)
    }

    pub fn find_process(&self, name: &str) -> Option<&ProfileRecord> {
        self.find(ProfileType::Process, name)
    }

    pub fn filaments(&self) -> Vec<&ProfileRecord> {
        self.list(ProfileType::Filament)
    }

    pub fn find_filament(&self, name: &str) -> Option<&ProfileRecord> {
        self.find(ProfileType::Filament, name)
    }

    /// Resolve `record` against this catalog.
    pub fn resolve(&self, record: &ProfileRecord) -> Result<FlattenedProfile> {
        InheritanceResolver::new(self).resolve(record)
    }
}

fn scan_scope(scope_dir: &Path, scope: ProfileScope, out: &mut Vec<ProfileRecord>) -> Result<()> {
    let walker = WalkDir::new(scope_dir)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| scope_dir.to_path_buf());
            ProfileError::io(path, err.into())
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !entry.file_name().to_string_lossy().ends_with(".json") {
            continue;
        }

        let Some(record) = ProfileRecord::from_file(path, scope)? else {
            continue;
        };
        tracing::trace!(
            path = %path.display(),
            profile_type = %record.profile_type,
            name = %record.name,
            "indexed profile"
        );
        out.push(record);
    }

    Ok(())
}
