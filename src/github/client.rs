use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, ACCEPT, AUTHORIZATION, USER_AGENT},
    Client, ClientBuilder, RequestBuilder, StatusCode,
};
use serde::de::DeserializeOwned;

use super::{GithubClient, Package, PackageVersion};

const API_URL: &str = "https://api.github.com";
const PER_PAGE: u32 = 100;

pub struct GithubClientImpl {
    client: Client,
    base_url: String,
}

impl GithubClientImpl {
    pub fn new(token: impl AsRef<str>) -> Result<Self> {
        Self::with_base_url(token, API_URL)
    }

    pub fn with_base_url(token: impl AsRef<str>, base_url: impl Into<String>) -> Result<Self> {
        let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        log::debug!("{}: {}", USER_AGENT.as_str(), user_agent);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, "application/vnd.github.v3+json".try_into()?);
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", token.as_ref()).try_into()?,
        );
        headers.insert(USER_AGENT, user_agent.try_into()?);

        let client = ClientBuilder::new().default_headers(headers).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Follows `page=1, 2, ...` until the API returns an empty page or one
    /// shorter than `PER_PAGE`. A 404 is reported as "`resource` does not exist".
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        resource: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let request = self
                .client
                .get(format!("{}{}", self.base_url, path))
                .query(query)
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let batch: Vec<T> = send_json(request, resource).await?;
            log::debug!("GET {} page {}: {} items", path, page, batch.len());

            if batch.is_empty() {
                break;
            }
            let last_page = batch.len() < PER_PAGE as usize;
            items.extend(batch);
            if last_page {
                break;
            }

            page += 1;
        }

        Ok(items)
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder, resource: &str) -> Result<T> {
    let response = request.send().await.context("Failed to send request")?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(anyhow!("{} does not exist", resource));
    } else if !status.is_success() {
        return Err(anyhow!("Server returned status {}", status));
    }

    response.json().await.context("Failed to parse reply as json")
}

#[async_trait]
impl GithubClient for GithubClientImpl {
    async fn list_packages(&self, org: &str, package_type: &str) -> Result<Vec<Package>> {
        self.get_all_pages(
            &format!("Organization {org}"),
            &format!("/orgs/{org}/packages"),
            &[("package_type", package_type)],
        )
        .await
        .context(format!("Failed to list {} packages of {}", package_type, org))
    }

    async fn list_package_versions(
        &self,
        org: &str,
        package_name: &str,
    ) -> Result<Vec<PackageVersion>> {
        self.get_all_pages(
            &format!("Package {org}/{package_name}"),
            &format!("/orgs/{org}/packages/container/{package_name}/versions"),
            &[],
        )
        .await
        .context(format!("Failed to list versions of {}/{}", org, package_name))
    }

    async fn delete_package_version(
        &self,
        org: &str,
        package_name: &str,
        version_id: u64,
    ) -> Result<()> {
        let response = self
            .client
            .delete(format!(
                "{}/orgs/{org}/packages/container/{package_name}/versions/{version_id}",
                self.base_url,
            ))
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!(
                "Failed to delete {}/{} version {}: server returned status {}",
                org,
                package_name,
                version_id,
                status,
            ));
        }

        Ok(())
    }
}
