//! Provider plugins and the network API they expose.
//!
//! A [`ProviderPlugin`] is selected by name from the [`ProviderRegistry`],
//! version-checked against the descriptor's `required_providers`, and then
//! configured once per run with a [`ProviderConfig`] and the AWS shared files. Configuration yields a
//! [`NetworkApi`] client which every lookup against that provider shares.
//!
//! ## Built-in providers
//!
//! | Name | Feature | Version |
//! |------|---------|---------|
//! | `aws` | `aws` (default) | 4.57.0 |

#[cfg(feature = "aws")]
pub mod aws;

use crate::credentials::AwsFiles;
use crate::descriptor::ProviderConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

// ============================================================================
// Network data
// ============================================================================

/// Criteria for a VPC query. Unset fields do not constrain the result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VpcQuery {
    pub is_default: Option<bool>,
    pub vpc_id: Option<String>,
    pub cidr_block: Option<String>,
    pub state: Option<String>,
    pub tags: IndexMap<String, String>,
}

impl VpcQuery {
    pub fn is_empty(&self) -> bool {
        self.is_default.is_none()
            && self.vpc_id.is_none()
            && self.cidr_block.is_none()
            && self.state.is_none()
            && self.tags.is_empty()
    }
}

/// A VPC as returned by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpc {
    pub id: String,
    pub arn: String,
    pub cidr_block: String,
    pub owner_id: String,
    pub state: String,
    pub is_default: bool,
    pub dhcp_options_id: Option<String>,
    pub instance_tenancy: Option<String>,
    pub tags: IndexMap<String, String>,
}

impl Vpc {
    /// Value of a descriptor-visible attribute, verbatim.
    ///
    /// `key` indexes into map attributes (`tags`). Returns `None` when the
    /// attribute is unknown or has no value.
    pub fn attribute(&self, name: &str, key: Option<&str>) -> Option<serde_json::Value> {
        use serde_json::Value;

        let text = |s: &str| Some(Value::String(s.to_string()));
        match (name, key) {
            ("id", None) => text(&self.id),
            ("arn", None) => text(&self.arn),
            ("cidr_block", None) => text(&self.cidr_block),
            ("owner_id", None) => text(&self.owner_id),
            ("state", None) => text(&self.state),
            ("default", None) => Some(Value::Bool(self.is_default)),
            ("dhcp_options_id", None) => self.dhcp_options_id.as_deref().and_then(text),
            ("instance_tenancy", None) => self.instance_tenancy.as_deref().and_then(text),
            ("tags", None) => Some(Value::Object(
                self.tags
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            )),
            ("tags", Some(key)) => self.tags.get(key).map(|v| Value::String(v.clone())),
            _ => None,
        }
    }
}

/// AWS partition for a region id.
pub fn partition_for_region(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else if region.starts_with("us-isob-") {
        "aws-iso-b"
    } else if region.starts_with("us-iso-") {
        "aws-iso"
    } else {
        "aws"
    }
}

/// ARN of a VPC.
pub fn vpc_arn(region: &str, owner_id: &str, vpc_id: &str) -> String {
    format!(
        "arn:{}:ec2:{}:{}:vpc/{}",
        partition_for_region(region),
        region,
        owner_id,
        vpc_id
    )
}

// ============================================================================
// Traits
// ============================================================================

/// Read-only network queries against a configured provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NetworkApi: Send + Sync {
    /// Every VPC matching `query`, across all result pages.
    async fn describe_vpcs(&self, query: &VpcQuery) -> Result<Vec<Vpc>>;
}

/// A provider implementation that can be configured into a [`NetworkApi`].
#[async_trait]
pub trait ProviderPlugin: Send + Sync + Debug {
    /// Local provider name, e.g. `aws`
    fn name(&self) -> &str;

    /// Source address this plugin answers to, e.g. `hashicorp/aws`
    fn source(&self) -> &str;

    /// Plugin version checked against `required_providers`
    fn version(&self) -> &Version;

    /// Build a client for the given profile and region.
    ///
    /// `files` are the shared config/credentials files the profile was
    /// checked against; the client must resolve the profile from them.
    async fn configure(
        &self,
        config: &ProviderConfig,
        files: &AwsFiles,
    ) -> Result<Arc<dyn NetworkApi>>;
}

// ============================================================================
// Registry
// ============================================================================

/// Provider plugins available to the engine, keyed by name
#[derive(Debug, Default, Clone)]
pub struct ProviderRegistry {
    plugins: IndexMap<String, Arc<dyn ProviderPlugin>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every provider compiled into this build
    pub fn with_builtin() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "aws")]
        registry.register(Arc::new(aws::AwsProvider::new()));
        registry
    }

    /// Register a plugin, replacing any plugin with the same name
    pub fn register(&mut self, plugin: Arc<dyn ProviderPlugin>) {
        tracing::debug!(
            provider = plugin.name(),
            version = %plugin.version(),
            "registered provider"
        );
        self.plugins.insert(plugin.name().to_string(), plugin);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn ProviderPlugin>> {
        self.plugins
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ProviderNotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vpc() -> Vpc {
        let mut tags = IndexMap::new();
        tags.insert("Name".to_string(), "main".to_string());
        Vpc {
            id: "vpc-0a1b2c3d".to_string(),
            arn: vpc_arn("ap-southeast-2", "123456789012", "vpc-0a1b2c3d"),
            cidr_block: "172.31.0.0/16".to_string(),
            owner_id: "123456789012".to_string(),
            state: "available".to_string(),
            is_default: true,
            dhcp_options_id: Some("dopt-1".to_string()),
            instance_tenancy: None,
            tags,
        }
    }

    #[test]
    fn test_vpc_attributes() {
        let vpc = sample_vpc();
        assert_eq!(vpc.attribute("id", None), Some(serde_json::json!("vpc-0a1b2c3d")));
        assert_eq!(vpc.attribute("default", None), Some(serde_json::json!(true)));
        assert_eq!(vpc.attribute("tags", Some("Name")), Some(serde_json::json!("main")));
        assert_eq!(vpc.attribute("tags", None), Some(serde_json::json!({"Name": "main"})));
        assert_eq!(vpc.attribute("tags", Some("Team")), None);
        assert_eq!(vpc.attribute("instance_tenancy", None), None);
        assert_eq!(vpc.attribute("id", Some("x")), None);
        assert_eq!(vpc.attribute("subnets", None), None);
    }

    #[test]
    fn test_vpc_arn_partitions() {
        assert_eq!(
            vpc_arn("ap-southeast-2", "123456789012", "vpc-1"),
            "arn:aws:ec2:ap-southeast-2:123456789012:vpc/vpc-1"
        );
        assert_eq!(partition_for_region("cn-north-1"), "aws-cn");
        assert_eq!(partition_for_region("us-gov-west-1"), "aws-us-gov");
        assert_eq!(partition_for_region("us-iso-east-1"), "aws-iso");
        assert_eq!(partition_for_region("us-isob-east-1"), "aws-iso-b");
    }

    #[test]
    fn test_query_is_empty() {
        assert!(VpcQuery::default().is_empty());
        let q = VpcQuery {
            is_default: Some(true),
            ..VpcQuery::default()
        };
        assert!(!q.is_empty());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ProviderRegistry::new();
        assert!(matches!(
            registry.get("aws"),
            Err(Error::ProviderNotFound(name)) if name == "aws"
        ));
    }

    #[cfg(feature = "aws")]
    #[test]
    fn test_builtin_registry_has_aws() {
        let registry = ProviderRegistry::with_builtin();
        let aws = registry.get("aws").unwrap();
        assert_eq!(aws.source(), "hashicorp/aws");
        assert_eq!(aws.version(), &Version::new(4, 57, 0));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["aws"]);
    }
}
