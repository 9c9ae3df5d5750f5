use std::env;

use recordstore_core::naming::{PROJECT_ENV, STAGE_ENV};
use recordstore_core::TableNaming;

/// Default AWS region when `AWS_REGION` is unset.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Project identifier used in default table names.
    pub project: Option<String>,
    /// Deployment stage used in default table names.
    pub stage: Option<String>,
    /// AWS region (default: "us-east-1")
    pub region: String,
    /// Custom endpoint URL, e.g. a local DynamoDB.
    pub endpoint_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RECORDSTORE_PROJECT` - project identifier (optional)
    /// - `RECORDSTORE_STAGE` - deployment stage (optional)
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    /// - `AWS_ENDPOINT_URL` - custom endpoint, e.g. `http://localhost:8000` (optional)
    pub fn from_env() -> Self {
        Self {
            project: non_empty_var(PROJECT_ENV),
            stage: non_empty_var(STAGE_ENV),
            region: non_empty_var("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint_url: non_empty_var("AWS_ENDPOINT_URL"),
        }
    }

    /// Table naming derived from the project and stage.
    pub fn table_naming(&self) -> TableNaming {
        TableNaming::new(self.project.clone(), self.stage.clone())
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint_url {
            Some(url) => format!("Local DynamoDB ({})", url),
            None => format!("AWS DynamoDB (region: {})", self.region),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(project: Option<&str>, stage: Option<&str>) -> Config {
        Config {
            project: project.map(str::to_string),
            stage: stage.map(str::to_string),
            region: DEFAULT_REGION.to_string(),
            endpoint_url: None,
        }
    }

    #[test]
    fn test_table_naming_from_config() {
        let naming = config(Some("MyProject"), Some("MyStage")).table_naming();
        assert_eq!(naming.table_name("Widget"), "MyProject-MyStage-Widget");
    }

    #[test]
    fn test_target_display() {
        let mut config = config(None, None);
        assert_eq!(config.target_display(), "AWS DynamoDB (region: us-east-1)");

        config.endpoint_url = Some("http://localhost:8000".to_string());
        assert_eq!(
            config.target_display(),
            "Local DynamoDB (http://localhost:8000)"
        );
    }

    #[test]
    fn test_default_values() {
        // Clear environment variables to test defaults
        env::remove_var(PROJECT_ENV);
        env::remove_var(STAGE_ENV);
        env::remove_var("AWS_REGION");
        env::remove_var("AWS_ENDPOINT_URL");

        let config = Config::from_env();

        assert_eq!(config, self::config(None, None));
        assert_eq!(config.table_naming().table_name("Widget"), "Widget");

        env::set_var(PROJECT_ENV, "Shop");
        env::set_var(STAGE_ENV, "  ");
        let naming = Config::from_env().table_naming();
        env::remove_var(PROJECT_ENV);
        env::remove_var(STAGE_ENV);

        assert_eq!(naming.stage, None);
        assert_eq!(naming.table_name("Widget"), "Shop-Widget");
    }
}
