//! # vpclookup - resolve a cloud account's default VPC from a descriptor
//!
//! vpclookup reads a small declarative descriptor, checks its provider and
//! engine version requirements, configures the cloud provider with the
//! declared credential profile and region, executes the declared read-only
//! lookups and publishes named outputs bound to the lookup results.
//!
//! ## Core Concepts
//!
//! - **Descriptor**: YAML/TOML file with requirement, provider, data and output blocks
//! - **Provider**: a plugin (built-in `aws`) that turns a profile and region into an API client
//! - **Data lookup**: a read-only query that must resolve to exactly one object
//! - **Output**: a named value copied verbatim from a resolved lookup attribute
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           CLI Interface                              │
//! │                    (clap-based command parsing)                      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                              Engine                                  │
//! │     (validate -> version checks -> profile check -> lookups)         │
//! └─────────────────────────────────────────────────────────────────────┘
//!          │                         │                         │
//!          ▼                         ▼                         ▼
//! ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────────┐
//! │   Descriptor    │   │  Provider Registry  │   │   Output Binding    │
//! │  (model, refs,  │   │  (aws via AWS SDK)  │   │ (human/json/export) │
//! │  constraints)   │   │                     │   │                     │
//! └─────────────────┘   └─────────────────────┘   └─────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use vpclookup::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let descriptor = Descriptor::from_file("vpclookup.yml")?;
//!     let engine = Engine::new(ProviderRegistry::with_builtin());
//!     let report = engine.run(&descriptor, &RunOverrides::default()).await?;
//!     print!("{}", render_human(&report.outputs));
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::credentials::AwsFiles;
    pub use crate::descriptor::{
        DataAddress, Descriptor, OutputDecl, ProviderConfig, ProviderRequirement, Reference,
        VersionConstraint, VpcFilter,
    };
    pub use crate::engine::{Engine, RunOverrides, RunReport};
    pub use crate::error::{Error, Result};
    pub use crate::lookup::{DataLookup, ResolvedData};
    pub use crate::output::{render_exports, render_human, render_json, render_raw, OutputValue, Outputs};
    pub use crate::provider::{NetworkApi, ProviderPlugin, ProviderRegistry, Vpc, VpcQuery};
}

/// Error types and the crate-wide `Result` alias.
pub mod error;

/// Descriptor model, references and version constraints.
pub mod descriptor;

/// Named AWS credential profiles.
pub mod credentials;

/// Provider plugins and the network API.
pub mod provider;

/// Lookup execution.
pub mod lookup;

/// Output binding and rendering.
pub mod output;

/// The evaluation engine.
pub mod engine;

pub use engine::ENGINE_VERSION;
pub use error::{Error, Result};
