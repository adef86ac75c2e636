//! Declarative descriptor model.
//!
//! A descriptor carries four kinds of block:
//!
//! - `required_version` / `required_providers`: which engine and provider
//!   versions the file may be evaluated with
//! - `provider`: credential profile and region for each provider
//! - `data`: read-only lookups against existing cloud state
//! - `output`: named values bound to attributes of resolved lookups
//!
//! ## Example
//!
//! ```yaml
//! required_providers:
//!   aws:
//!     source: hashicorp/aws
//!     version: "4.57.0"
//!
//! provider:
//!   aws:
//!     profile: dev
//!     region: ap-southeast-2
//!
//! data:
//!   aws_vpc:
//!     default:
//!       default: true
//!
//! output:
//!   default_vpc_id:
//!     value: data.aws_vpc.default.id
//! ```

pub mod reference;
pub mod version;

pub use reference::{DataAddress, Reference};
pub use version::VersionConstraint;

use crate::error::{Error, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static REGION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]{2}(-gov|-iso[a-z]?)?-[a-z]+-\d+$").expect("region regex is valid")
});

/// The canonical descriptor written by `vpclookup init`.
pub const CANONICAL_YAML: &str = r#"# vpclookup descriptor
# Resolves the account's default VPC and publishes its id.

required_version: ">= 0.1"

required_providers:
  aws:
    source: hashicorp/aws
    version: "4.57.0"

provider:
  aws:
    profile: dev
    region: ap-southeast-2

data:
  aws_vpc:
    default:
      default: true

output:
  default_vpc_id:
    value: data.aws_vpc.default.id
"#;

/// A whole descriptor file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Descriptor {
    /// Constraint on the engine's own version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_version: Option<VersionConstraint>,

    /// Provider name -> source and version constraint
    #[serde(default)]
    pub required_providers: IndexMap<String, ProviderRequirement>,

    /// Provider name -> configuration
    #[serde(default)]
    pub provider: IndexMap<String, ProviderConfig>,

    /// Data source declarations, grouped by type
    #[serde(default)]
    pub data: DataBlocks,

    /// Output name -> declaration
    #[serde(default)]
    pub output: IndexMap<String, OutputDecl>,
}

/// Constraint on which provider plugin may serve a provider name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderRequirement {
    /// Registry-style source address, e.g. `hashicorp/aws`
    pub source: String,
    /// Accepted plugin versions
    pub version: VersionConstraint,
}

/// Credential and region context shared by every lookup against one provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Named credential profile; `None` uses the SDK's default chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Region id, e.g. `ap-southeast-2`
    pub region: String,
}

impl ProviderConfig {
    pub fn new(profile: Option<&str>, region: impl Into<String>) -> Self {
        Self {
            profile: profile.map(str::to_string),
            region: region.into(),
        }
    }
}

/// Data source blocks keyed by type, then by local name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DataBlocks {
    /// `data.aws_vpc.<name>` declarations
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub aws_vpc: IndexMap<String, VpcFilter>,

    /// Types this build does not understand; rejected by validation
    #[serde(flatten)]
    pub unsupported: IndexMap<String, serde_json::Value>,
}

impl DataBlocks {
    /// All declared data sources in declaration order
    pub fn addresses(&self) -> impl Iterator<Item = DataAddress> + '_ {
        self.aws_vpc
            .keys()
            .map(|name| DataAddress::new(DataSourceKind::AwsVpc.type_name(), name.clone()))
    }

    /// Look up a VPC data source by address
    pub fn vpc(&self, address: &DataAddress) -> Option<&VpcFilter> {
        if address.kind != DataSourceKind::AwsVpc.type_name() {
            return None;
        }
        self.aws_vpc.get(&address.name)
    }

    pub fn is_empty(&self) -> bool {
        self.aws_vpc.is_empty() && self.unsupported.is_empty()
    }
}

/// Data source types this build can evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    AwsVpc,
}

impl DataSourceKind {
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "aws_vpc" => Some(Self::AwsVpc),
            _ => None,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Self::AwsVpc => "aws_vpc",
        }
    }

    /// Attributes exposed once the lookup resolves
    pub fn attributes(self) -> &'static [&'static str] {
        match self {
            Self::AwsVpc => &[
                "id",
                "arn",
                "cidr_block",
                "default",
                "dhcp_options_id",
                "instance_tenancy",
                "owner_id",
                "state",
                "tags",
            ],
        }
    }

    /// Attributes that are maps and may be indexed with a key
    pub fn map_attributes(self) -> &'static [&'static str] {
        match self {
            Self::AwsVpc => &["tags"],
        }
    }

    /// Provider a data source of this kind belongs to unless overridden
    pub fn default_provider(self) -> &'static str {
        match self {
            Self::AwsVpc => "aws",
        }
    }
}

/// Criteria for an `aws_vpc` lookup. All given criteria must hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct VpcFilter {
    /// Match the account's default VPC in the region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub tags: IndexMap<String, String>,
    /// Provider configuration to query through (defaults to `aws`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl VpcFilter {
    /// Filter that selects the default VPC
    pub fn default_vpc() -> Self {
        Self {
            default: Some(true),
            ..Self::default()
        }
    }

    /// True if no criterion is set
    pub fn is_unconstrained(&self) -> bool {
        self.default.is_none()
            && self.id.is_none()
            && self.cidr_block.is_none()
            && self.state.is_none()
            && self.tags.is_empty()
    }

    pub fn provider_name(&self) -> &str {
        self.provider
            .as_deref()
            .unwrap_or_else(|| DataSourceKind::AwsVpc.default_provider())
    }
}

/// A named output bound to a data source attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputDecl {
    pub value: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hide the value in human-readable output
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
}

impl Descriptor {
    /// Load a descriptor from a file, picking the format by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let parsed = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content).map_err(|e| {
                Error::descriptor_parse(path, e.to_string(), Some(Box::new(e)))
            }),
            "toml" => toml::from_str(&content)
                .map_err(|e| Error::descriptor_parse(path, e.to_string(), Some(Box::new(e)))),
            "json" => serde_json::from_str(&content)
                .map_err(|e| Error::descriptor_parse(path, e.to_string(), Some(Box::new(e)))),
            _ => serde_yaml::from_str(&content)
                .or_else(|yaml_err| {
                    toml::from_str(&content).map_err(|_| yaml_err)
                })
                .map_err(|e| Error::descriptor_parse(path, e.to_string(), Some(Box::new(e)))),
        };

        let descriptor: Descriptor = parsed?;
        tracing::debug!(
            path = %path.display(),
            providers = descriptor.provider.len(),
            outputs = descriptor.output.len(),
            "loaded descriptor"
        );
        Ok(descriptor)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The canonical default-VPC descriptor.
    pub fn canonical() -> Self {
        let mut descriptor = Descriptor {
            required_version: Some(VersionConstraint::at_least(0, 1)),
            ..Self::default()
        };
        descriptor.required_providers.insert(
            "aws".to_string(),
            ProviderRequirement {
                source: "hashicorp/aws".to_string(),
                version: VersionConstraint::exact(semver::Version::new(4, 57, 0)),
            },
        );
        descriptor.provider.insert(
            "aws".to_string(),
            ProviderConfig::new(Some("dev"), "ap-southeast-2"),
        );
        descriptor
            .data
            .aws_vpc
            .insert("default".to_string(), VpcFilter::default_vpc());
        descriptor.output.insert(
            "default_vpc_id".to_string(),
            OutputDecl {
                value: Reference {
                    address: DataAddress::new("aws_vpc", "default"),
                    attribute: "id".to_string(),
                    key: None,
                },
                description: None,
                sensitive: false,
            },
        );
        descriptor
    }

    /// Check the descriptor's internal consistency.
    ///
    /// This does not touch the network or check versions; see
    /// [`crate::engine::Engine::check_requirements`] for that.
    pub fn validate(&self) -> Result<()> {
        if let Some(kind) = self.data.unsupported.keys().next() {
            return Err(Error::DescriptorValidation(format!(
                "unsupported data source type '{}'",
                kind
            )));
        }

        for (name, config) in &self.provider {
            if !self.required_providers.contains_key(name) {
                return Err(Error::DescriptorValidation(format!(
                    "provider '{}' is configured but not listed in required_providers",
                    name
                )));
            }
            if let Some(profile) = &config.profile {
                if profile.trim().is_empty() {
                    return Err(Error::DescriptorValidation(format!(
                        "provider '{}' has an empty profile",
                        name
                    )));
                }
            }
            validate_region(name, &config.region)?;
        }

        for (name, requirement) in &self.required_providers {
            if requirement.source.trim().is_empty() {
                return Err(Error::DescriptorValidation(format!(
                    "required provider '{}' has an empty source",
                    name
                )));
            }
        }

        for (name, filter) in &self.data.aws_vpc {
            let address = DataAddress::new(DataSourceKind::AwsVpc.type_name(), name.clone());
            if filter.is_unconstrained() {
                return Err(Error::EmptyFilter(address.to_string()));
            }
            let provider = filter.provider_name();
            if !self.provider.contains_key(provider) {
                return Err(Error::DescriptorValidation(format!(
                    "{} uses provider '{}', which has no configuration block",
                    address, provider
                )));
            }
        }

        for (name, output) in &self.output {
            let reference = &output.value;
            let kind = DataSourceKind::from_type_name(&reference.address.kind).ok_or_else(|| {
                Error::DescriptorValidation(format!(
                    "output '{}' references unsupported data source type '{}'",
                    name, reference.address.kind
                ))
            })?;
            if self.data.vpc(&reference.address).is_none() {
                return Err(Error::DescriptorValidation(format!(
                    "output '{}' references undeclared data source '{}'",
                    name, reference.address
                )));
            }
            if !kind.attributes().contains(&reference.attribute.as_str()) {
                return Err(Error::DescriptorValidation(format!(
                    "output '{}': '{}' has no attribute '{}'",
                    name,
                    kind.type_name(),
                    reference.attribute
                )));
            }
            if reference.key.is_some()
                && !kind.map_attributes().contains(&reference.attribute.as_str())
            {
                return Err(Error::DescriptorValidation(format!(
                    "output '{}': attribute '{}' cannot be indexed",
                    name, reference.attribute
                )));
            }
        }

        Ok(())
    }

    /// Data sources that at least one output references, in declaration order.
    pub fn referenced_data(&self) -> Vec<DataAddress> {
        self.data
            .addresses()
            .filter(|address| self.output.values().any(|o| &o.value.address == address))
            .collect()
    }
}

pub(crate) fn validate_region(provider: &str, region: &str) -> Result<()> {
    if REGION_REGEX.is_match(region) {
        Ok(())
    } else {
        Err(Error::DescriptorValidation(format!(
            "provider '{}' has invalid region '{}'",
            provider, region
        )))
    }
}
