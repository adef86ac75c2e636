//! The evaluation engine.
//!
//! A run goes through these phases, stopping at the first error:
//!
//! ```text
//! validate descriptor
//!   -> check required_version against this engine
//!   -> select provider plugins and check required_providers
//!   -> apply profile/region overrides
//!   -> check credential profiles exist
//!   -> configure each provider once, against the checked AWS files
//!   -> execute referenced lookups
//!   -> bind outputs
//! ```
//!
//! Nothing is cached between runs: running twice against an unchanged
//! account yields identical outputs, and every run queries the API afresh.

use crate::credentials::AwsFiles;
use crate::descriptor::{validate_region, Descriptor, ProviderConfig};
use crate::error::{Error, Result};
use crate::lookup::{DataLookup, ResolvedData};
use crate::output::{self, Outputs};
use crate::provider::{NetworkApi, ProviderRegistry};
use indexmap::IndexMap;
use semver::Version;
use std::sync::Arc;

/// Version of this engine, checked against `required_version`
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Per-run adjustments to the descriptor's provider blocks
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    /// Replace every provider's credential profile
    pub profile: Option<String>,
    /// Replace every provider's region
    pub region: Option<String>,
    /// Skip checking that named profiles exist in the AWS shared files
    pub skip_profile_check: bool,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Effective provider configuration after overrides
    pub providers: IndexMap<String, ProviderConfig>,
    /// Every lookup that was executed
    pub resolved: ResolvedData,
    /// Bound outputs
    pub outputs: Outputs,
}

/// Evaluates descriptors against registered providers
#[derive(Debug, Clone)]
pub struct Engine {
    registry: ProviderRegistry,
    aws_files: AwsFiles,
    version: Version,
}

impl Engine {
    /// Engine over `registry`, using the discovered AWS shared files.
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            aws_files: AwsFiles::discover(),
            version: Version::parse(ENGINE_VERSION).unwrap_or_else(|_| Version::new(0, 0, 0)),
        }
    }

    /// Use these AWS config/credentials files for profile checks.
    pub fn with_aws_files(mut self, aws_files: AwsFiles) -> Self {
        self.aws_files = aws_files;
        self
    }

    /// Report a different engine version to `required_version` checks.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn aws_files(&self) -> &AwsFiles {
        &self.aws_files
    }

    /// Check engine and provider version constraints without any network call.
    pub fn check_requirements(&self, descriptor: &Descriptor) -> Result<()> {
        if let Some(constraint) = &descriptor.required_version {
            if !constraint.matches(&self.version) {
                return Err(Error::UnsatisfiedConstraint {
                    subject: "vpclookup".to_string(),
                    actual: self.version.to_string(),
                    constraint: constraint.to_string(),
                });
            }
        }

        for (name, requirement) in &descriptor.required_providers {
            let plugin = self.registry.get(name)?;
            if plugin.source() != requirement.source {
                return Err(Error::ProviderNotFound(format!(
                    "{} (source '{}'; this build provides '{}')",
                    name,
                    requirement.source,
                    plugin.source()
                )));
            }
            if !requirement.version.matches(plugin.version()) {
                return Err(Error::UnsatisfiedConstraint {
                    subject: format!("provider {}", name),
                    actual: plugin.version().to_string(),
                    constraint: requirement.version.to_string(),
                });
            }
            tracing::debug!(
                provider = %name,
                version = %plugin.version(),
                constraint = %requirement.version,
                "provider requirement satisfied"
            );
        }

        Ok(())
    }

    /// Provider blocks with overrides applied.
    pub fn effective_providers(
        descriptor: &Descriptor,
        overrides: &RunOverrides,
    ) -> Result<IndexMap<String, ProviderConfig>> {
        let mut providers = descriptor.provider.clone();
        for (name, config) in providers.iter_mut() {
            if let Some(profile) = &overrides.profile {
                tracing::debug!(provider = %name, profile = %profile, "overriding profile");
                config.profile = Some(profile.clone());
            }
            if let Some(region) = &overrides.region {
                validate_region(name, region)?;
                tracing::debug!(provider = %name, region = %region, "overriding region");
                config.region = region.clone();
            }
        }
        Ok(providers)
    }

    /// Validate, check requirements and apply overrides; everything short of
    /// talking to a provider.
    pub fn prepare(
        &self,
        descriptor: &Descriptor,
        overrides: &RunOverrides,
    ) -> Result<IndexMap<String, ProviderConfig>> {
        descriptor.validate()?;
        self.check_requirements(descriptor)?;
        let providers = Self::effective_providers(descriptor, overrides)?;

        if overrides.skip_profile_check {
            tracing::warn!("skipping credential profile check");
        } else {
            for config in providers.values() {
                if let Some(profile) = &config.profile {
                    self.aws_files.ensure_profile(profile)?;
                }
            }
        }

        Ok(providers)
    }

    /// Evaluate a descriptor end to end.
    pub async fn run(&self, descriptor: &Descriptor, overrides: &RunOverrides) -> Result<RunReport> {
        let providers = self.prepare(descriptor, overrides)?;

        let mut clients: IndexMap<String, Arc<dyn NetworkApi>> = IndexMap::new();
        let mut resolved = ResolvedData::new();

        for address in descriptor.referenced_data() {
            let filter = descriptor.data.vpc(&address).ok_or_else(|| {
                Error::Internal(format!("{} disappeared after validation", address))
            })?;
            let provider_name = filter.provider_name();

            let api = match clients.get(provider_name) {
                Some(api) => Arc::clone(api),
                None => {
                    let config = providers.get(provider_name).ok_or_else(|| {
                        Error::Internal(format!("provider '{}' is not configured", provider_name))
                    })?;
                    let plugin = self.registry.get(provider_name)?;
                    let api = plugin.configure(config, &self.aws_files).await?;
                    clients.insert(provider_name.to_string(), Arc::clone(&api));
                    api
                }
            };

            let vpc = DataLookup::new(address.clone(), filter)
                .execute(api.as_ref())
                .await?;
            resolved.insert(address, vpc);
        }

        let outputs = output::bind_all(descriptor, &resolved)?;
        tracing::info!(outputs = outputs.len(), "run complete");

        Ok(RunReport {
            providers,
            resolved,
            outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockNetworkApi, ProviderPlugin, Vpc};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Plugin that hands out a prepared mock and records configurations.
    struct StubPlugin {
        version: Version,
        configured: Mutex<Vec<ProviderConfig>>,
        files: Mutex<Vec<AwsFiles>>,
        api: Mutex<Option<MockNetworkApi>>,
    }

    impl StubPlugin {
        fn new(version: Version, api: MockNetworkApi) -> Self {
            Self {
                version,
                configured: Mutex::new(Vec::new()),
                files: Mutex::new(Vec::new()),
                api: Mutex::new(Some(api)),
            }
        }
    }

    impl std::fmt::Debug for StubPlugin {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("StubPlugin")
                .field("version", &self.version)
                .finish_non_exhaustive()
        }
    }

    #[async_trait]
    impl ProviderPlugin for StubPlugin {
        fn name(&self) -> &str {
            "aws"
        }

        fn source(&self) -> &str {
            "hashicorp/aws"
        }

        fn version(&self) -> &Version {
            &self.version
        }

        async fn configure(
            &self,
            config: &ProviderConfig,
            files: &AwsFiles,
        ) -> Result<Arc<dyn NetworkApi>> {
            self.configured.lock().unwrap().push(config.clone());
            self.files.lock().unwrap().push(files.clone());
            let api = self
                .api
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| Error::Internal("configured twice".to_string()))?;
            Ok(Arc::new(api))
        }
    }

    fn default_vpc(id: &str) -> Vpc {
        Vpc {
            id: id.to_string(),
            arn: format!("arn:aws:ec2:ap-southeast-2:123456789012:vpc/{}", id),
            cidr_block: "172.31.0.0/16".to_string(),
            owner_id: "123456789012".to_string(),
            state: "available".to_string(),
            is_default: true,
            dhcp_options_id: None,
            instance_tenancy: None,
            tags: IndexMap::new(),
        }
    }

    fn aws_files_with(profiles: &[&str]) -> (TempDir, AwsFiles) {
        let dir = tempfile::tempdir().unwrap();
        let config: String = profiles
            .iter()
            .map(|p| format!("[profile {}]\nregion = ap-southeast-2\n", p))
            .collect();
        std::fs::write(dir.path().join("config"), config).unwrap();
        let files = AwsFiles::new(dir.path().join("config"), dir.path().join("credentials"));
        (dir, files)
    }

    fn engine_with(plugin: Arc<StubPlugin>, files: AwsFiles) -> Engine {
        let mut registry = ProviderRegistry::new();
        registry.register(plugin);
        Engine::new(registry).with_aws_files(files)
    }

    #[tokio::test]
    async fn test_run_binds_default_vpc_id() {
        let mut api = MockNetworkApi::new();
        api.expect_describe_vpcs()
            .times(1)
            .returning(|_| Ok(vec![default_vpc("vpc-0a1b2c3d")]));
        let plugin = Arc::new(StubPlugin::new(Version::new(4, 57, 0), api));
        let (_dir, files) = aws_files_with(&["dev"]);
        let engine = engine_with(Arc::clone(&plugin), files);

        let report = engine
            .run(&Descriptor::canonical(), &RunOverrides::default())
            .await
            .unwrap();

        assert_eq!(
            report.outputs["default_vpc_id"].value,
            serde_json::json!("vpc-0a1b2c3d")
        );
        let configured = plugin.configured.lock().unwrap();
        assert_eq!(
            configured.as_slice(),
            &[ProviderConfig::new(Some("dev"), "ap-southeast-2")]
        );
    }

    #[tokio::test]
    async fn test_provider_uses_the_files_the_profile_was_checked_against() {
        let mut api = MockNetworkApi::new();
        api.expect_describe_vpcs()
            .returning(|_| Ok(vec![default_vpc("vpc-0a1b2c3d")]));
        let plugin = Arc::new(StubPlugin::new(Version::new(4, 57, 0), api));
        let (_dir, files) = aws_files_with(&["dev"]);
        let engine = engine_with(Arc::clone(&plugin), files.clone());

        engine
            .run(&Descriptor::canonical(), &RunOverrides::default())
            .await
            .unwrap();

        assert_eq!(engine.aws_files(), &files);
        assert_eq!(plugin.files.lock().unwrap().as_slice(), &[files]);
    }

    #[tokio::test]
    async fn test_wrong_provider_version_fails_before_any_call() {
        let mut api = MockNetworkApi::new();
        api.expect_describe_vpcs().never();
        let plugin = Arc::new(StubPlugin::new(Version::new(4, 58, 0), api));
        let (_dir, files) = aws_files_with(&["dev"]);
        let engine = engine_with(Arc::clone(&plugin), files);

        let err = engine
            .run(&Descriptor::canonical(), &RunOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsatisfiedConstraint { .. }));
        assert!(plugin.configured.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_profile_fails_before_configure() {
        let api = MockNetworkApi::new();
        let plugin = Arc::new(StubPlugin::new(Version::new(4, 57, 0), api));
        let (_dir, files) = aws_files_with(&["prod"]);
        let engine = engine_with(Arc::clone(&plugin), files);

        let err = engine
            .run(&Descriptor::canonical(), &RunOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProfileNotFound { ref profile, .. } if profile == "dev"));
        assert!(plugin.configured.lock().unwrap().is_empty());
    }

    #[test]
    fn test_required_version_checked() {
        let plugin = Arc::new(StubPlugin::new(Version::new(4, 57, 0), MockNetworkApi::new()));
        let (_dir, files) = aws_files_with(&["dev"]);
        let engine = engine_with(plugin, files).with_version(Version::new(0, 0, 9));

        let err = engine.check_requirements(&Descriptor::canonical()).unwrap_err();
        match err {
            Error::UnsatisfiedConstraint { subject, actual, .. } => {
                assert_eq!(subject, "vpclookup");
                assert_eq!(actual, "0.0.9");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        let (_dir, files) = aws_files_with(&["dev"]);
        let engine = Engine::new(ProviderRegistry::new()).with_aws_files(files);
        let err = engine.check_requirements(&Descriptor::canonical()).unwrap_err();
        assert!(matches!(err, Error::ProviderNotFound(_)));
    }

    #[test]
    fn test_overrides_apply_to_every_provider() {
        let overrides = RunOverrides {
            profile: Some("ops".to_string()),
            region: Some("us-west-2".to_string()),
            skip_profile_check: false,
        };
        let providers = Engine::effective_providers(&Descriptor::canonical(), &overrides).unwrap();
        assert_eq!(providers["aws"], ProviderConfig::new(Some("ops"), "us-west-2"));

        let bad = RunOverrides {
            region: Some("moon-base-1x".to_string()),
            ..RunOverrides::default()
        };
        assert!(Engine::effective_providers(&Descriptor::canonical(), &bad).is_err());
    }
}
