//! AWS provider backed by the official AWS SDK for Rust.
//!
//! ## Authentication
//!
//! Credentials come from the standard AWS credential chain. When the
//! provider block names a `profile`, the chain is pinned to that profile.
//! Profiles are always read from the [`AwsFiles`] the engine hands over,
//! which are the same files the profile check used.
//!
//! The region always comes from the provider block; environment variables
//! such as `AWS_REGION` do not override it.

use super::{vpc_arn, NetworkApi, ProviderPlugin, Vpc, VpcQuery};
use crate::credentials::AwsFiles;
use crate::descriptor::ProviderConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::BehaviorVersion;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::Filter;
use aws_sdk_ec2::Client;
use indexmap::IndexMap;
use semver::Version;
use std::sync::Arc;

/// Version this provider reports to `required_providers` checks
pub const AWS_PROVIDER_VERSION: Version = Version::new(4, 57, 0);

/// Source address the AWS provider answers to
pub const AWS_PROVIDER_SOURCE: &str = "hashicorp/aws";

/// The `aws` provider plugin
#[derive(Debug, Clone)]
pub struct AwsProvider {
    version: Version,
}

impl AwsProvider {
    pub fn new() -> Self {
        Self {
            version: AWS_PROVIDER_VERSION,
        }
    }
}

impl Default for AwsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderPlugin for AwsProvider {
    fn name(&self) -> &str {
        "aws"
    }

    fn source(&self) -> &str {
        AWS_PROVIDER_SOURCE
    }

    fn version(&self) -> &Version {
        &self.version
    }

    async fn configure(
        &self,
        config: &ProviderConfig,
        files: &AwsFiles,
    ) -> Result<Arc<dyn NetworkApi>> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_ec2::config::Region::new(config.region.clone()))
            .profile_files(profile_files(files));
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;

        tracing::info!(
            region = %config.region,
            profile = config.profile.as_deref().unwrap_or("<default chain>"),
            config_file = %files.config_file.display(),
            "configured aws provider"
        );

        Ok(Arc::new(Ec2NetworkApi {
            client: Client::new(&sdk_config),
            region: config.region.clone(),
        }))
    }
}

/// SDK profile sources for the given shared files
fn profile_files(files: &AwsFiles) -> ProfileFiles {
    ProfileFiles::builder()
        .with_file(ProfileFileKind::Config, &files.config_file)
        .with_file(ProfileFileKind::Credentials, &files.credentials_file)
        .build()
}

/// [`NetworkApi`] over the EC2 API
#[derive(Debug, Clone)]
pub struct Ec2NetworkApi {
    client: Client,
    region: String,
}

impl Ec2NetworkApi {
    /// Translate a query into EC2 `DescribeVpcs` filters
    fn filters(query: &VpcQuery) -> Vec<Filter> {
        let mut filters = Vec::new();

        if let Some(is_default) = query.is_default {
            filters.push(
                Filter::builder()
                    .name("is-default")
                    .values(is_default.to_string())
                    .build(),
            );
        }
        if let Some(ref vpc_id) = query.vpc_id {
            filters.push(Filter::builder().name("vpc-id").values(vpc_id).build());
        }
        if let Some(ref cidr) = query.cidr_block {
            filters.push(Filter::builder().name("cidr").values(cidr).build());
        }
        if let Some(ref state) = query.state {
            filters.push(Filter::builder().name("state").values(state).build());
        }
        for (key, value) in &query.tags {
            filters.push(
                Filter::builder()
                    .name(format!("tag:{}", key))
                    .values(value)
                    .build(),
            );
        }

        filters
    }
}

/// Convert an SDK VPC; VPCs without an id are dropped.
fn vpc_from_sdk(vpc: &aws_sdk_ec2::types::Vpc, region: &str) -> Option<Vpc> {
    let id = vpc.vpc_id().filter(|id| !id.is_empty())?.to_string();
    let owner_id = vpc.owner_id().unwrap_or_default().to_string();

    let mut tags = IndexMap::new();
    for tag in vpc.tags() {
        if let (Some(key), Some(value)) = (tag.key(), tag.value()) {
            tags.insert(key.to_string(), value.to_string());
        }
    }

    Some(Vpc {
        arn: vpc_arn(region, &owner_id, &id),
        id,
        cidr_block: vpc.cidr_block().unwrap_or_default().to_string(),
        owner_id,
        state: vpc.state().map(|s| s.as_str().to_string()).unwrap_or_default(),
        is_default: vpc.is_default().unwrap_or(false),
        dhcp_options_id: vpc.dhcp_options_id().map(str::to_string),
        instance_tenancy: vpc.instance_tenancy().map(|t| t.as_str().to_string()),
        tags,
    })
}

#[async_trait]
impl NetworkApi for Ec2NetworkApi {
    async fn describe_vpcs(&self, query: &VpcQuery) -> Result<Vec<Vpc>> {
        let filters = Self::filters(query);
        let mut vpcs = Vec::new();
        let mut next_token: Option<String> = None;
        let mut page = 0usize;

        loop {
            let resp = self
                .client
                .describe_vpcs()
                .set_filters(Some(filters.clone()))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    Error::api("DescribeVpcs", DisplayErrorContext(&e).to_string())
                })?;

            page += 1;
            tracing::trace!(page, count = resp.vpcs().len(), "DescribeVpcs page");

            for vpc in resp.vpcs() {
                match vpc_from_sdk(vpc, &self.region) {
                    Some(vpc) => vpcs.push(vpc),
                    None => tracing::warn!("DescribeVpcs returned a VPC without an id; ignoring it"),
                }
            }

            match resp.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(vpcs)
    }
}
