//! Execution of data lookups.
//!
//! A lookup must resolve to exactly one object. Zero matches and several
//! matches are both reported as errors; a lookup never yields an empty or
//! arbitrarily chosen result.

use crate::descriptor::{DataAddress, VpcFilter};
use crate::error::{Error, Result};
use crate::provider::{NetworkApi, Vpc, VpcQuery};
use indexmap::IndexMap;

/// Resolved data sources of one run, keyed by address
pub type ResolvedData = IndexMap<DataAddress, Vpc>;

impl VpcQuery {
    /// Build the API query for a descriptor filter.
    pub fn from_filter(filter: &VpcFilter) -> Self {
        Self {
            is_default: filter.default,
            vpc_id: filter.id.clone(),
            cidr_block: filter.cidr_block.clone(),
            state: filter.state.clone(),
            tags: filter.tags.clone(),
        }
    }
}

/// Reduce query results to the single required match.
pub fn resolve_single(address: &DataAddress, mut matches: Vec<Vpc>) -> Result<Vpc> {
    match matches.len() {
        0 => Err(Error::NoMatchingResource {
            address: address.to_string(),
        }),
        1 => Ok(matches.remove(0)),
        count => Err(Error::AmbiguousMatch {
            address: address.to_string(),
            count,
            ids: matches.into_iter().map(|vpc| vpc.id).collect(),
        }),
    }
}

/// One `aws_vpc` lookup, ready to run against a configured provider
#[derive(Debug, Clone)]
pub struct DataLookup {
    address: DataAddress,
    query: VpcQuery,
}

impl DataLookup {
    pub fn new(address: DataAddress, filter: &VpcFilter) -> Self {
        Self {
            address,
            query: VpcQuery::from_filter(filter),
        }
    }

    pub fn address(&self) -> &DataAddress {
        &self.address
    }

    pub fn query(&self) -> &VpcQuery {
        &self.query
    }

    /// Run the query and resolve it to exactly one VPC.
    pub async fn execute(&self, api: &dyn NetworkApi) -> Result<Vpc> {
        if self.query.is_empty() {
            return Err(Error::EmptyFilter(self.address.to_string()));
        }

        tracing::debug!(address = %self.address, query = ?self.query, "executing lookup");
        let matches = api.describe_vpcs(&self.query).await?;
        tracing::debug!(address = %self.address, matches = matches.len(), "lookup returned");

        let vpc = resolve_single(&self.address, matches)?;
        tracing::info!(address = %self.address, id = %vpc.id, "resolved data source");
        Ok(vpc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockNetworkApi;
    use mockall::predicate::eq;

    fn vpc(id: &str, is_default: bool) -> Vpc {
        Vpc {
            id: id.to_string(),
            arn: format!("arn:aws:ec2:ap-southeast-2:123456789012:vpc/{}", id),
            cidr_block: "172.31.0.0/16".to_string(),
            owner_id: "123456789012".to_string(),
            state: "available".to_string(),
            is_default,
            dhcp_options_id: None,
            instance_tenancy: Some("default".to_string()),
            tags: IndexMap::new(),
        }
    }

    fn address() -> DataAddress {
        DataAddress::new("aws_vpc", "default")
    }

    #[test]
    fn test_query_from_default_filter() {
        let query = VpcQuery::from_filter(&VpcFilter::default_vpc());
        assert_eq!(query.is_default, Some(true));
        assert!(query.vpc_id.is_none());
        assert!(query.tags.is_empty());
    }

    #[test]
    fn test_resolve_single_exactly_one() {
        let resolved = resolve_single(&address(), vec![vpc("vpc-1", true)]).unwrap();
        assert_eq!(resolved.id, "vpc-1");
    }

    #[test]
    fn test_resolve_single_none() {
        let err = resolve_single(&address(), vec![]).unwrap_err();
        assert!(matches!(err, Error::NoMatchingResource { ref address } if address == "data.aws_vpc.default"));
    }

    #[test]
    fn test_resolve_single_many() {
        let err = resolve_single(&address(), vec![vpc("vpc-1", true), vpc("vpc-2", true)])
            .unwrap_err();
        match err {
            Error::AmbiguousMatch { count, ids, .. } => {
                assert_eq!(count, 2);
                assert_eq!(ids, vec!["vpc-1", "vpc-2"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_execute_queries_default_vpc() {
        let mut api = MockNetworkApi::new();
        api.expect_describe_vpcs()
            .with(eq(VpcQuery {
                is_default: Some(true),
                ..VpcQuery::default()
            }))
            .times(1)
            .returning(|_| Ok(vec![vpc("vpc-0a1b2c3d", true)]));

        let lookup = DataLookup::new(address(), &VpcFilter::default_vpc());
        let resolved = lookup.execute(&api).await.unwrap();
        assert_eq!(resolved.id, "vpc-0a1b2c3d");
    }

    #[tokio::test]
    async fn test_execute_propagates_api_errors() {
        let mut api = MockNetworkApi::new();
        api.expect_describe_vpcs()
            .returning(|_| Err(Error::api("DescribeVpcs", "throttled")));

        let lookup = DataLookup::new(address(), &VpcFilter::default_vpc());
        let err = lookup.execute(&api).await.unwrap_err();
        assert!(matches!(err, Error::Api { .. }));
    }

    #[test]
    fn test_execute_rejects_empty_filter_without_calling_api() {
        let mut api = MockNetworkApi::new();
        api.expect_describe_vpcs().never();

        let lookup = DataLookup::new(address(), &VpcFilter::default());
        let err = tokio_test::block_on(lookup.execute(&api)).unwrap_err();
        assert!(matches!(err, Error::EmptyFilter(_)));
    }
}
