//! Bambuclone core
//!
//! Works on a Bambu Studio configuration tree:
//!
//! ```text
//! <root>/system/**/*.json   vendor presets (read-only)
//! <root>/user/**/*.json     user presets
//! ```
//!
//! ```text
//! ┌──────────────┐     ┌─────────────────────┐     ┌───────────────────┐
//! │ ProfileIndex │────►│ InheritanceResolver │────►│ CloneMaterializer │
//! └──────────────┘     └─────────────────────┘     └───────────────────┘
//!        ▲                                                   │
//!        └──────────────────── reindex ──────────────────────┘
//! ```
//!
//! - [`ProfileIndex`] catalogs every profile by `(type, name)`.
//! - [`InheritanceResolver`] folds a profile's `inherits` chain into one
//!   flat object.
//! - [`CloneMaterializer`] derives a user-owned copy and writes it next to a
//!   `.info` sidecar.
//! - [`run_job`] drives a batch of [`CloneDirective`]s from a job file.

pub mod error;
pub mod index;
pub mod job;
pub mod materialize;
pub mod profile;
pub mod resolve;
pub mod transform;


pub use error::{ProfileError, Result};
pub use index::ProfileIndex;
pub use job::{run_job, JobConfig, JobReport, SkippedDirective, DEFAULT_JOB_FILE};
pub use materialize::{
    identity_token, info_sidecar, CloneDirective, CloneMaterializer, IdentityStrategy,
    MaterializedProfile, DEFAULT_USER,
};
pub use profile::{FlattenedProfile, ProfileFields, ProfileRecord, ProfileScope, ProfileType};
pub use resolve::InheritanceResolver;
pub use transform::{FieldPipeline, FieldStep, DETACHED_FIELDS, USER_MARKERS};
