//! Command line interface for one-off record lookups and writes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use recordstore::config::{Config, DEFAULT_REGION};
use recordstore::core::naming::{PROJECT_ENV, STAGE_ENV};
use recordstore::core::{
    Attributes, QueryOptions, RecordDefinition, Repository, RuleSchema, Schema, StoredRecord,
};
use recordstore::core::record::PutOptions;
use recordstore::storage::DynamoDbStore;

/// recordstore - read and write schema-validated records in DynamoDB
#[derive(Parser, Debug)]
#[command(name = "recordstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Where records live and how they are shaped.
#[derive(Debug, clap::Args)]
pub struct TargetArgs {
    /// JSON file with the record schema
    #[arg(long, short, value_name = "FILE")]
    pub schema: PathBuf,

    /// Record type name (defaults to the schema name)
    #[arg(long)]
    pub type_name: Option<String>,

    /// Partition key attribute
    #[arg(long, short = 'k')]
    pub partition_key: String,

    /// Sort key attribute
    #[arg(long)]
    pub sort_key: Option<String>,

    /// Explicit table name, bypassing the project/stage convention
    #[arg(long)]
    pub table_name: Option<String>,

    /// Project identifier used in table names
    #[arg(long, env = PROJECT_ENV)]
    pub project: Option<String>,

    /// Deployment stage used in table names
    #[arg(long, env = STAGE_ENV)]
    pub stage: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Custom endpoint, e.g. http://localhost:8000 for a local DynamoDB
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,
}

/// Available record operations.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch one record by primary key.
    Get {
        /// Partition key value (JSON, or a bare string)
        partition: String,

        /// Sort key value (JSON, or a bare string)
        #[arg(long)]
        sort: Option<String>,
    },

    /// Fetch several records in one batch request.
    BatchGet {
        /// Partition key values (JSON, or bare strings)
        #[arg(required = true)]
        partitions: Vec<String>,

        /// Sort key values, matched to partitions by position
        #[arg(long = "sort")]
        sorts: Vec<String>,
    },

    /// Run a key-condition query and print every matching record.
    Query {
        /// Key condition expression, e.g. "pk = :pk AND begins_with(sk, :prefix)"
        #[arg(long)]
        key_condition: String,

        /// Expression attribute values as a JSON object
        #[arg(long, default_value = "{}")]
        values: String,

        /// Expression attribute names as a JSON object
        #[arg(long)]
        names: Option<String>,

        /// Secondary index to query
        #[arg(long)]
        index: Option<String>,

        /// Maximum items per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Return items in descending sort-key order
        #[arg(long)]
        descending: bool,
    },

    /// Validate and write one record.
    Put {
        /// Record attributes as a JSON object
        #[arg(long)]
        item: String,

        /// Condition expression the write must satisfy
        #[arg(long)]
        condition: Option<String>,
    },
}

impl Cli {
    /// Runs the selected command and returns what should be printed.
    pub async fn run(self) -> Result<Value> {
        let config = self.target.config();
        tracing::info!(target_store = %config.target_display(), "Connecting");

        let definition = self.target.definition(&config)?;
        let store = DynamoDbStore::from_config(&config).await;
        let repository = Repository::new(Arc::new(store), Arc::new(definition));

        match self.command {
            Command::Get { partition, sort } => {
                let record = repository
                    .find_by_pk(parse_value(&partition), sort.as_deref().map(parse_value))
                    .await?;
                Ok(record.as_ref().map_or(Value::Null, record_json))
            }
            Command::BatchGet { partitions, sorts } => {
                let partitions: Vec<Value> = partitions.iter().map(|raw| parse_value(raw)).collect();
                let sorts: Vec<Value> = sorts.iter().map(|raw| parse_value(raw)).collect();
                let sorts = (!sorts.is_empty()).then_some(sorts.as_slice());

                let records = repository.find_all_by_pk(&partitions, sorts).await?;
                Ok(Value::Array(records.iter().map(record_json).collect()))
            }
            Command::Query {
                key_condition,
                values,
                names,
                index,
                page_size,
                descending,
            } => {
                let mut options = QueryOptions::default();
                if let Some(index) = index {
                    options = options.index(index);
                }
                if let Some(page_size) = page_size {
                    options = options.page_size(page_size);
                }
                if descending {
                    options = options.descending();
                }
                if let Some(names) = names {
                    for (placeholder, name) in parse_object(&names, "--names")? {
                        match name {
                            Value::String(name) => options = options.expression_name(placeholder, name),
                            other => bail!("--names values must be strings, got {other} for {placeholder}"),
                        }
                    }
                }

                let values = parse_object(&values, "--values")?;
                let records = repository.find_all_by(&key_condition, values, options).await?;
                tracing::info!(count = records.len(), "Query complete");
                Ok(Value::Array(records.iter().map(record_json).collect()))
            }
            Command::Put { item, condition } => {
                let mut record = repository.new_record();
                record.populate(parse_object(&item, "--item")?);

                let options = condition.map(PutOptions::condition).unwrap_or_default();
                let ack = repository.save_with(&mut record, options).await?;
                Ok(json!({ "saved": record_json(&record), "ack": ack }))
            }
        }
    }
}

impl TargetArgs {
    fn config(&self) -> Config {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());
        Config {
            project: non_empty(&self.project),
            stage: non_empty(&self.stage),
            region: self.region.clone(),
            endpoint_url: non_empty(&self.endpoint_url),
        }
    }

    fn definition(&self, config: &Config) -> Result<RecordDefinition> {
        let raw = std::fs::read_to_string(&self.schema)
            .with_context(|| format!("Failed to read schema file {}", self.schema.display()))?;
        let schema: RuleSchema = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid schema in {}", self.schema.display()))?;

        let type_name = self
            .type_name
            .clone()
            .unwrap_or_else(|| schema.name().to_string());

        let mut builder = RecordDefinition::builder(type_name, Arc::new(schema))
            .partition_key(self.partition_key.clone());
        if let Some(sort_key) = &self.sort_key {
            builder = builder.sort_key(sort_key.clone());
        }
        if let Some(table_name) = &self.table_name {
            builder = builder.table_name(table_name.clone());
        }

        Ok(builder.build(&config.table_naming())?)
    }
}

/// Parses a JSON value, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_object(raw: &str, flag: &str) -> Result<Attributes> {
    match serde_json::from_str(raw).with_context(|| format!("{flag} is not valid JSON"))? {
        Value::Object(map) => Ok(map),
        other => bail!("{flag} must be a JSON object, got {other}"),
    }
}

fn record_json(record: &StoredRecord) -> Value {
    Value::Object(record.attributes())
}
