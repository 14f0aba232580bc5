//! Ordered field transformations applied to a profile object.
//!
//! Steps run in insertion order and each sees the output of the previous
//! one, so later steps win.

use serde_json::Value;

use crate::profile::{ProfileFields, INHERITS_KEY, NAME_KEY};

/// Marker fields every user-owned profile carries.
pub const USER_MARKERS: [(&str, &str); 3] = [
    ("from", "User"),
    ("is_custom_defined", "0"),
    ("version", "1.0.0.0"),
];

/// Fields that only make sense while a profile is tied to the system catalog.
pub const DETACHED_FIELDS: [&str; 5] = [
    "upward_compatible_machine",
    "setting_id",
    "compatible_printers",
    "instantiation",
    INHERITS_KEY,
];

#[derive(Debug, Clone, PartialEq)]
pub enum FieldStep {
    /// Insert or replace one field.
    Set { key: String, value: Value },
    /// Delete one field if present.
    Remove { key: String },
    /// Insert or replace every field of the given object.
    Merge(ProfileFields),
}

impl FieldStep {
    fn apply(&self, fields: &mut ProfileFields) {
        match self {
            Self::Set { key, value } => {
                fields.insert(key.clone(), value.clone());
            }
            Self::Remove { key } => {
                fields.shift_remove(key);
            }
            Self::Merge(other) => {
                for (key, value) in other {
                    fields.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPipeline {
    steps: Vec<FieldStep>,
}

impl FieldPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.steps.push(FieldStep::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.steps.push(FieldStep::Remove { key: key.into() });
        self
    }

    pub fn merge(mut self, fields: ProfileFields) -> Self {
        self.steps.push(FieldStep::Merge(fields));
        self
    }

    pub fn steps(&self) -> &[FieldStep] {
        &self.steps
    }

    pub fn apply(&self, mut fields: ProfileFields) -> ProfileFields {
        for step in &self.steps {
            step.apply(&mut fields);
        }
        fields
    }

    /// Rename, then caller overrides, then user-ownership adaptation.
    pub fn for_user_clone(to: &str, overwrite: &ProfileFields) -> Self {
        let mut pipeline = Self::new().set(NAME_KEY, to).merge(overwrite.clone());
        for (key, value) in USER_MARKERS {
            pipeline = pipeline.set(key, value);
        }
        for key in DETACHED_FIELDS {
            pipeline = pipeline.remove(key);
        }
        pipeline
    }
}
