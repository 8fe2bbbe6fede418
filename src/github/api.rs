use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub version_count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PackageVersion {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// UTC timestamp as sent by the API, e.g. `2024-05-01T12:00:00Z`.
    pub created_at: String,
    #[serde(default)]
    pub metadata: PackageVersionMetadata,
}

impl PackageVersion {
    pub fn tags(&self) -> &[String] {
        &self.metadata.container.tags
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageVersionMetadata {
    #[serde(default)]
    pub package_type: String,
    #[serde(default)]
    pub container: ContainerVersionMetadata,
}

// A missing tag list and an empty one both mean "untagged".
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerVersionMetadata {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_version() {
        let version: PackageVersion = serde_json::from_str(
            r#"{
                "id": 42,
                "name": "sha256:abc",
                "created_at": "2024-05-01T12:00:00Z",
                "metadata": {
                    "package_type": "container",
                    "container": { "tags": ["temp-1"] }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(version.id, 42);
        assert_eq!(version.tags(), ["temp-1".to_string()]);
    }

    #[test]
    fn test_deserialize_version_without_tags() {
        let absent: PackageVersion = serde_json::from_str(
            r#"{"id": 1, "created_at": "2024-05-01T12:00:00Z", "metadata": {"container": {}}}"#,
        )
        .unwrap();
        assert!(absent.tags().is_empty());

        let null: PackageVersion = serde_json::from_str(
            r#"{"id": 2, "created_at": "2024-05-01T12:00:00Z", "metadata": {"container": {"tags": null}}}"#,
        )
        .unwrap();
        assert!(null.tags().is_empty());

        let no_metadata: PackageVersion =
            serde_json::from_str(r#"{"id": 3, "created_at": "2024-05-01T12:00:00Z"}"#).unwrap();
        assert!(no_metadata.tags().is_empty());
    }

    #[test]
    fn test_deserialize_package() {
        let packages: Vec<Package> = serde_json::from_str(
            r#"[{"id": 7, "name": "writing-api", "version_count": 12, "visibility": "private"}]"#,
        )
        .unwrap();
        assert_eq!(
            packages,
            vec![Package {
                id: 7,
                name: "writing-api".to_string(),
                version_count: 12,
            }]
        );
    }
}
