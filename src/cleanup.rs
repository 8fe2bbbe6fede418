use std::fmt::{self, Display};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::github::{GithubClient, Package, PackageVersion};
use crate::retention;

pub const PACKAGE_TYPE: &str = "container";

pub struct CleanupOptions {
    pub org: String,
    /// Only packages whose name starts with this are touched.
    pub prefix: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedVersion {
    pub package_name: String,
    pub version_id: u64,
}

#[derive(Debug, Clone)]
pub struct FailedDeletion {
    pub package_name: String,
    pub version_id: u64,
    pub error: String,
}

/// Outcome of one pass over the organization's packages.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub packages: Vec<String>,
    /// Versions deleted, or in dry-run mode the ones that would have been.
    pub removed: Vec<DeletedVersion>,
    pub failures: Vec<FailedDeletion>,
    pub dry_run: bool,
}

impl RunSummary {
    /// True if at least one deletion was attempted, whatever its outcome.
    pub fn cleanup_performed(&self) -> bool {
        !self.removed.is_empty() || !self.failures.is_empty()
    }
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.cleanup_performed() {
            return write!(
                f,
                "No outdated package versions found in {} package(s)",
                self.packages.len()
            );
        }

        let verb = match self.dry_run {
            true => "would delete",
            false => "deleted",
        };
        write!(
            f,
            "Cleanup performed: {} {} version(s) across {} package(s)",
            verb,
            self.removed.len(),
            self.packages.len(),
        )?;
        if !self.failures.is_empty() {
            write!(f, ", {} deletion(s) failed:", self.failures.len())?;
            for failure in &self.failures {
                write!(
                    f,
                    "\n  {}:{}: {}",
                    failure.package_name, failure.version_id, failure.error
                )?;
            }
        }
        Ok(())
    }
}

pub async fn run(
    client: &impl GithubClient,
    options: &CleanupOptions,
    now: DateTime<Utc>,
) -> Result<RunSummary> {
    let mut summary = RunSummary {
        dry_run: options.dry_run,
        ..Default::default()
    };

    let packages = find_packages(client, options)
        .await
        .context(format!("Failed to list packages of {}", options.org))?;
    log::info!(
        "Found packages: {:?}",
        packages.iter().map(|pkg| &pkg.name).collect::<Vec<_>>()
    );
    for package in &packages {
        log::debug!(
            "Package {} (id {}) has {} versions",
            package.name,
            package.id,
            package.version_count,
        );
    }

    for package in packages {
        let result = clean_package(client, options, &package.name, now, &mut summary)
            .await
            .context(format!(
                "Failed to clean package {}/{}",
                options.org, package.name,
            ));
        if let Err(error) = result {
            log::warn!("Run aborted, progress so far: {}", summary);
            return Err(error.context(format!("Run aborted ({})", summary)));
        }
        summary.packages.push(package.name);
    }

    Ok(summary)
}

async fn find_packages(client: &impl GithubClient, options: &CleanupOptions) -> Result<Vec<Package>> {
    let packages = client.list_packages(&options.org, PACKAGE_TYPE).await?;
    Ok(packages
        .into_iter()
        .filter(|pkg| pkg.name.starts_with(&options.prefix))
        .collect())
}

async fn clean_package(
    client: &impl GithubClient,
    options: &CleanupOptions,
    package_name: &str,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) -> Result<()> {
    log::info!("Cleaning package {}/{}", options.org, package_name);

    let versions = client
        .list_package_versions(&options.org, package_name)
        .await
        .context("Failed to get package versions from github")?;

    let outdated = find_outdated_versions(&versions, now)?;
    log::debug!(
        "{} of {} versions of {} are outdated",
        outdated.len(),
        versions.len(),
        package_name,
    );

    clean_package_versions(client, options, package_name, &outdated, summary).await;
    Ok(())
}

/// Classifies every version before anything is deleted, so a malformed
/// timestamp leaves the whole package untouched.
fn find_outdated_versions(
    versions: &[PackageVersion],
    now: DateTime<Utc>,
) -> Result<Vec<&PackageVersion>> {
    let mut outdated = Vec::new();
    for version in versions {
        let created_at = retention::parse_created_at(&version.created_at)
            .context(format!("Failed to evaluate version {}", version.id))?;

        let delete = retention::should_delete(created_at, version.tags(), now);
        log::debug!(
            "Version {} created {} tags {:?}: {}",
            version.id,
            created_at,
            version.tags(),
            if delete { "delete" } else { "keep" },
        );

        if delete {
            outdated.push(version);
        }
    }
    Ok(outdated)
}

async fn clean_package_versions(
    client: &impl GithubClient,
    options: &CleanupOptions,
    package_name: &str,
    versions: &[&PackageVersion],
    summary: &mut RunSummary,
) {
    for version in versions {
        let dry_run_suffix = match options.dry_run {
            true => " (DRY RUN)",
            false => "",
        };
        log::info!(
            "Deleting {}/{} version {} ({}){}",
            options.org,
            package_name,
            version.id,
            version.name,
            dry_run_suffix,
        );

        if !options.dry_run {
            if let Err(error) = client
                .delete_package_version(&options.org, package_name, version.id)
                .await
            {
                log::warn!("{:?}", error);
                summary.failures.push(FailedDeletion {
                    package_name: package_name.to_string(),
                    version_id: version.id,
                    error: format!("{:#}", error),
                });
                continue;
            }
        }

        summary.removed.push(DeletedVersion {
            package_name: package_name.to_string(),
            version_id: version.id,
        });
    }
}
