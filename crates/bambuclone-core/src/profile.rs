//! Profile identity types and raw profile file access.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProfileError, Result};

/// Raw JSON object of a profile file.
pub type ProfileFields = Map<String, Value>;

pub const NAME_KEY: &str = "name";
pub const TYPE_KEY: &str = "type";
pub const INHERITS_KEY: &str = "inherits";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    Machine,
    Process,
    Filament,
}

impl ProfileType {
    pub const ALL: [ProfileType; 3] = [Self::Machine, Self::Process, Self::Filament];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Machine => "machine",
            Self::Process => "process",
            Self::Filament => "filament",
        }
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProfileType(pub String);

impl fmt::Display for UnknownProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown profile type `{}` (expected machine|process|filament)",
            self.0
        )
    }
}

impl std::error::Error for UnknownProfileType {}

impl FromStr for ProfileType {
    type Err = UnknownProfileType;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "machine" => Ok(Self::Machine),
            "process" => Ok(Self::Process),
            "filament" => Ok(Self::Filament),
            other => Err(UnknownProfileType(other.to_string())),
        }
    }
}

/// Top-level catalog partition. Scan order follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileScope {
    System,
    User,
}

impl ProfileScope {
    pub const SCAN_ORDER: [ProfileScope; 2] = [Self::System, Self::User];

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }
}

impl fmt::Display for ProfileScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.dir_name())
    }
}

/// Identity and location of one profile file. Content is not retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRecord {
    pub profile_type: ProfileType,
    pub name: String,
    pub path: PathBuf,
    pub scope: ProfileScope,
}

impl ProfileRecord {
    /// Parse `path` and take identity from its own `name`/`type` fields.
    ///
    /// Files whose `type` is not a clonable profile type (`machine_model`,
    /// vendor manifests, ...) yield `None`; they can never match a lookup.
    pub fn from_file(path: &Path, scope: ProfileScope) -> Result<Option<Self>> {
        let fields = read_profile_fields(path)?;
        let name = string_field(&fields, NAME_KEY, path)?.to_string();
        let raw_type = string_field(&fields, TYPE_KEY, path)?;
        let Ok(profile_type) = raw_type.parse::<ProfileType>() else {
            tracing::debug!(
                path = %path.display(),
                profile_type = %raw_type,
                "skipping file with unrecognised profile type"
            );
            return Ok(None);
        };

        Ok(Some(Self {
            profile_type,
            name,
            path: path.to_path_buf(),
            scope,
        }))
    }

    /// Re-read the raw (unresolved) fields of this profile.
    pub fn read_fields(&self) -> Result<ProfileFields> {
        read_profile_fields(&self.path)
    }
}

pub(crate) fn read_profile_fields(path: &Path) -> Result<ProfileFields> {
    let text = std::fs::read_to_string(path).map_err(|e| ProfileError::io(path, e))?;
    serde_json::from_str(&text).map_err(|source| ProfileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn string_field<'a>(fields: &'a ProfileFields, key: &'static str, path: &Path) -> Result<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ProfileError::MissingField {
            path: path.to_path_buf(),
            field: key,
        })
}

/// Profile content after the inheritance chain has been folded in.
///
/// Never carries an `inherits` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlattenedProfile {
    fields: ProfileFields,
}

impl FlattenedProfile {
    pub(crate) fn new(mut fields: ProfileFields) -> Self {
        fields.shift_remove(INHERITS_KEY);
        Self { fields }
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get(NAME_KEY).and_then(Value::as_str)
    }

    pub fn profile_type(&self) -> Option<ProfileType> {
        self.fields
            .get(TYPE_KEY)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &ProfileFields {
        &self.fields
    }

    pub fn into_fields(self) -> ProfileFields {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_type_parse_and_display() {
        for ty in ProfileType::ALL {
            assert_eq!(ty.as_str().parse::<ProfileType>().unwrap(), ty);
            assert_eq!(ty.to_string(), ty.as_str());
        }
        assert!("printer".parse::<ProfileType>().is_err());
        assert!("Process".parse::<ProfileType>().is_err());
    }

    #[test]
    fn test_flattened_profile_strips_inherits() {
        let fields: ProfileFields = serde_json::from_str(
            r#"{"name": "A", "type": "filament", "inherits": "B", "nozzle_temperature": ["220"]}"#,
        )
        .unwrap();
        let flat = FlattenedProfile::new(fields);

        assert!(flat.get(INHERITS_KEY).is_none());
        assert_eq!(flat.name(), Some("A"));
        assert_eq!(flat.profile_type(), Some(ProfileType::Filament));
        assert_eq!(flat.fields().len(), 3);
    }
}
