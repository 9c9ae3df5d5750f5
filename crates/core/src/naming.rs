//! Default table naming.
//!
//! Tables are named `<project>-<stage>-<TypeName>`, with any missing
//! component left out. The project and stage come from process-wide
//! configuration and are injected here rather than read inside the core.

/// Separator between table name components.
pub const TABLE_NAME_SEPARATOR: &str = "-";

/// Environment variable holding the project identifier.
pub const PROJECT_ENV: &str = "RECORDSTORE_PROJECT";

/// Environment variable holding the deployment stage identifier.
pub const STAGE_ENV: &str = "RECORDSTORE_STAGE";

/// Project and stage identifiers used to derive default table names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableNaming {
    pub project: Option<String>,
    pub stage: Option<String>,
}

impl TableNaming {
    pub fn new(project: Option<String>, stage: Option<String>) -> Self {
        Self { project, stage }
    }

    /// Derives the default table name for a record type.
    pub fn table_name(&self, type_name: &str) -> String {
        [self.project.as_deref(), self.stage.as_deref(), Some(type_name)]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|component| !component.is_empty())
            .collect::<Vec<_>>()
            .join(TABLE_NAME_SEPARATOR)
    }
}
