use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub use api::*;
pub use client::GithubClientImpl;

mod api;
mod client;

/// Access to the container packages of a GitHub organization.
///
/// Implementations hide pagination: every listing is the complete result.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GithubClient {
    async fn list_packages(&self, org: &str, package_type: &str) -> Result<Vec<Package>>;

    async fn list_package_versions(
        &self,
        org: &str,
        package_name: &str,
    ) -> Result<Vec<PackageVersion>>;

    async fn delete_package_version(
        &self,
        org: &str,
        package_name: &str,
        version_id: u64,
    ) -> Result<()>;
}
