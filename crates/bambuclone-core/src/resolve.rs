//! Single-parent inheritance resolution.
//!
//! A profile's `inherits` names an ancestor of the same type. The chain is
//! walked iteratively from the child up to the root ancestor, then folded
//! root-first so that nearer descendants overwrite ancestor fields. The merge
//! is shallow: a nested object in the child replaces the ancestor's value
//! wholesale.

use std::collections::HashSet;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::{ProfileError, Result};
use crate::index::ProfileIndex;
use crate::profile::{FlattenedProfile, ProfileFields, ProfileRecord, INHERITS_KEY};

pub struct InheritanceResolver<'a> {
    index: &'a ProfileIndex,
}

impl<'a> InheritanceResolver<'a> {
    pub fn new(index: &'a ProfileIndex) -> Self {
        Self { index }
    }

    pub fn resolve(&self, record: &ProfileRecord) -> Result<FlattenedProfile> {
        let chain = self.collect_chain(record)?;

        let mut merged = ProfileFields::new();
        for fields in chain.into_iter().rev() {
            for (key, value) in fields {
                merged.insert(key, value);
            }
        }

        Ok(FlattenedProfile::new(merged))
    }

    /// Raw fields of `record` and each of its ancestors, child first.
    fn collect_chain(&self, record: &ProfileRecord) -> Result<Vec<ProfileFields>> {
        let mut chain = Vec::new();
        let mut names = vec![record.name.clone()];
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut current = record;

        loop {
            visited.insert(current.path.clone());
            let fields = current.read_fields()?;
            let parent = inherits_of(&fields, current)?;
            chain.push(fields);

            let Some(parent) = parent else {
                break;
            };

            let ancestor = self
                .index
                .find(current.profile_type, &parent)
                .ok_or_else(|| ProfileError::MissingAncestor {
                    profile_type: current.profile_type,
                    name: current.name.clone(),
                    ancestor: parent.clone(),
                })?;

            names.push(ancestor.name.clone());
            if visited.contains(&ancestor.path) {
                return Err(ProfileError::InheritanceCycle { chain: names });
            }

            tracing::trace!(
                profile = %current.name,
                ancestor = %ancestor.name,
                "following inheritance"
            );
            current = ancestor;
        }

        Ok(chain)
    }
}

/// An empty `inherits` string means "no parent".
fn inherits_of(fields: &ProfileFields, record: &ProfileRecord) -> Result<Option<String>> {
    match fields.get(INHERITS_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ProfileError::InvalidInherits {
            path: record.path.clone(),
        }),
    }
}
