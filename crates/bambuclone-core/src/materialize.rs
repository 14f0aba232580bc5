//! Turning a flattened profile into a user-owned clone on disk.
//!
//! Output layout:
//!
//! ```text
//! <output_root>/[<identity token>/]user/<user>/<type>/<name>.json
//! <output_root>/[<identity token>/]user/<user>/<type>/<name>.info
//! ```
//!
//! Both files are overwritten unconditionally. The `.json` is written before
//! the `.info`; there is no rollback if the second write fails.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{ProfileError, Result};
use crate::index::ProfileIndex;
use crate::profile::{FlattenedProfile, ProfileFields, ProfileType, NAME_KEY, TYPE_KEY};
use crate::transform::FieldPipeline;

pub const DEFAULT_USER: &str = "default";

/// A request to derive a user profile from an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneDirective {
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "ProfileFields::is_empty")]
    pub overwrite: ProfileFields,
}

impl CloneDirective {
    pub fn new(profile_type: ProfileType, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            profile_type,
            from: from.into(),
            to: to.into(),
            user: None,
            overwrite: ProfileFields::new(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_overwrite(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overwrite.insert(key.into(), value.into());
        self
    }

    pub fn user(&self) -> &str {
        self.user.as_deref().unwrap_or(DEFAULT_USER)
    }
}

/// How clone output is namespaced under the output root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStrategy {
    /// `<output_root>/user/...`
    #[default]
    Plain,
    /// `<output_root>/<sha256(name)>/user/...`
    Hashed,
}

/// Hex SHA-256 of a profile name.
pub fn identity_token(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Contents of the `.info` sidecar Bambu Studio keeps next to user presets.
pub fn info_sidecar(updated_time: i64) -> String {
    format!("sync_info = \nuser_id = \nsetting_id = \nbase_id = \nupdated_time = {updated_time}\n")
}

/// Current Unix time in seconds, rounded to the nearest second.
fn unix_time_rounded() -> i64 {
    let millis = chrono::Utc::now().timestamp_millis();
    (millis + 500).div_euclid(1000)
}

/// A clone that has been written to disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterializedProfile {
    pub name: String,
    pub profile_type: ProfileType,
    pub user: String,
    pub identity_token: Option<String>,
    pub json_path: PathBuf,
    pub info_path: PathBuf,
    #[serde(skip)]
    pub content: ProfileFields,
}

pub struct CloneMaterializer<'a> {
    index: &'a mut ProfileIndex,
    output_root: PathBuf,
    strategy: IdentityStrategy,
}

impl<'a> CloneMaterializer<'a> {
    pub fn new(index: &'a mut ProfileIndex, output_root: impl Into<PathBuf>) -> Self {
        Self {
            index,
            output_root: output_root.into(),
            strategy: IdentityStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: IdentityStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn index(&self) -> &ProfileIndex {
        &*self.index
    }

    /// Build, write and index the clone described by `directive`.
    pub fn materialize(
        &mut self,
        source: &FlattenedProfile,
        directive: &CloneDirective,
    ) -> Result<MaterializedProfile> {
        let content = FieldPipeline::for_user_clone(&directive.to, &directive.overwrite)
            .apply(source.fields().clone());

        let name = match content.get(NAME_KEY) {
            Some(Value::String(name)) => name.clone(),
            other => {
                return Err(ProfileError::InvalidName {
                    name: other.map_or_else(|| "null".to_string(), Value::to_string),
                    reason: "`name` must be a string",
                })
            }
        };
        validate_segment(&name)?;
        let user = directive.user().to_string();
        validate_segment(&user)?;

        let profile_type = content
            .get(TYPE_KEY)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<ProfileType>().ok())
            .unwrap_or(directive.profile_type);

        let identity_token = match self.strategy {
            IdentityStrategy::Plain => None,
            IdentityStrategy::Hashed => Some(identity_token(&name)),
        };

        let mut dir = self.output_root.clone();
        if let Some(token) = &identity_token {
            dir.push(token);
        }
        dir.push("user");
        dir.push(&user);
        dir.push(profile_type.as_str());

        let json_path = dir.join(format!("{name}.json"));
        let info_path = dir.join(format!("{name}.info"));

        fs::create_dir_all(&dir).map_err(|e| ProfileError::write(&dir, e))?;
        let bytes = to_pretty_json(&content).map_err(|e| ProfileError::write(&json_path, e))?;
        fs::write(&json_path, bytes).map_err(|e| ProfileError::write(&json_path, e))?;
        fs::write(&info_path, info_sidecar(unix_time_rounded()))
            .map_err(|e| ProfileError::write(&info_path, e))?;

        tracing::info!(
            profile_type = %profile_type,
            from = %directive.from,
            to = %name,
            user = %user,
            path = %json_path.display(),
            "wrote user profile"
        );

        self.index.reindex()?;

        Ok(MaterializedProfile {
            name,
            profile_type,
            user,
            identity_token,
            json_path,
            info_path,
            content,
        })
    }
}

/// Pretty JSON with 4-space indentation and a trailing newline.
pub fn to_pretty_json(fields: &ProfileFields) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    fields
        .serialize(&mut ser)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    buf.push(b'\n');
    Ok(buf)
}

/// Names and users become single path segments.
fn validate_segment(segment: &str) -> Result<()> {
    let reason = if segment.is_empty() {
        "must not be empty"
    } else if segment == "." || segment == ".." {
        "must not be a relative path component"
    } else if segment.contains(['/', '\\']) {
        "must not contain a path separator"
    } else {
        return Ok(());
    };
    Err(ProfileError::InvalidName {
        name: segment.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_token_is_sha256_hex() {
        assert_eq!(
            identity_token(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            identity_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_info_sidecar_format() {
        assert_eq!(
            info_sidecar(1700000000),
            "sync_info = \nuser_id = \nsetting_id = \nbase_id = \nupdated_time = 1700000000\n"
        );
    }

    #[test]
    fn test_directive_defaults() {
        let directive: CloneDirective = serde_json::from_str(
            r#"{"type": "machine", "from": "Bambu Lab X1C 0.4 nozzle", "to": "X1C custom"}"#,
        )
        .unwrap();
        assert_eq!(directive.profile_type, ProfileType::Machine);
        assert_eq!(directive.user(), DEFAULT_USER);
        assert!(directive.overwrite.is_empty());
    }

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("My Profile @0.4").is_ok());
        assert!(validate_segment("").is_err());
        assert!(validate_segment("..").is_err());
        assert!(validate_segment("a/b").is_err());
        assert!(validate_segment("a\\b").is_err());
    }

    #[test]
    fn test_pretty_json_uses_four_spaces() {
        let mut fields = ProfileFields::new();
        fields.insert("name".into(), Value::from("x"));
        let text = String::from_utf8(to_pretty_json(&fields).unwrap()).unwrap();
        assert_eq!(text, "{\n    \"name\": \"x\"\n}\n");
    }
}
