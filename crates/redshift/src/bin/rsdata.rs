//! rsdata: run SQL on Amazon Redshift through the Data API.
//!
//! Connection settings come from the environment (and `.env`); see
//! `ConnectionConfig::from_env`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tracing::info;

use redshift_data::{
    ConnectionConfig, DatabaseConfig, Field, ParamValue, ParameterizedQuery, RedshiftDataClient,
    StatementHandle, StatementOptions,
};
use redshift_data_core::config::load_dotenv;

// ── CLI ─────────────────────────────────────────────────────────────

/// Redshift Data API client.
#[derive(Parser, Debug)]
#[command(name = "rsdata", version, about)]
struct Cli {
    /// Env profile prefix (reads {PROFILE}_REDSHIFT_* before REDSHIFT_*).
    #[arg(long, global = true, env = "REDSHIFT_PROFILE")]
    profile: Option<String>,

    /// Database override for this invocation.
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit one statement and print its id.
    Exec {
        sql: String,
        /// Bind parameter as name=value (repeatable).
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Statement name shown in the console.
        #[arg(long)]
        name: Option<String>,
        /// Wait for the statement and print its result.
        #[arg(long)]
        wait: bool,
    },
    /// Submit statements as one batch; prints one sub-statement id per line.
    Batch {
        #[arg(required = true)]
        sqls: Vec<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the current status of a statement as JSON.
    Describe { id: String },
    /// Poll a statement until it finishes.
    Wait { id: String },
    /// Print the result rows of a finished statement.
    Result {
        id: String,
        /// One JSON object per row instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Cancel a running statement.
    Cancel { id: String },
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match cli.profile.as_deref() {
        Some(profile) => ConnectionConfig::from_env_profiled(&profile.to_uppercase()),
        None => ConnectionConfig::from_env(),
    }
    .context("failed to load connection settings")?;
    config.log_summary();

    let database = cli.database.as_ref().map(|name| DatabaseConfig {
        database: name.clone(),
        ..config.database.clone()
    });

    let client = RedshiftDataClient::new(config).context("failed to create client")?;
    let outcome = run(&client, cli.command, database).await;
    client.close()?;
    outcome
}

async fn run(
    client: &RedshiftDataClient,
    command: Command,
    database: Option<DatabaseConfig>,
) -> Result<()> {
    match command {
        Command::Exec {
            sql,
            params,
            name,
            wait,
        } => {
            let query = params
                .iter()
                .fold(ParameterizedQuery::new(sql), |q, (name, value)| {
                    q.bind(name.as_str(), ParamValue::infer(value))
                });
            let options = StatementOptions {
                statement_name: name,
                ..StatementOptions::default()
            };

            let id = client
                .execute_statement_with(query, database, options)?
                .await
                .context("execute_statement failed")?;
            info!(statement_id = %id, "Statement submitted");

            if !wait {
                println!("{id}");
                return Ok(());
            }

            let description = client.wait_for_statement(id.clone())?.await?;
            if description.has_result_set {
                print_table(client, id).await
            } else {
                println!(
                    "{id}: {} ({} rows affected)",
                    description.status,
                    description.result_rows.max(0)
                );
                Ok(())
            }
        }
        Command::Batch { sqls, name } => {
            let queries = sqls.into_iter().map(ParameterizedQuery::new).collect();
            let options = StatementOptions {
                statement_name: name,
                ..StatementOptions::default()
            };
            let handles = client
                .batch_execute_statement_with(queries, database, options)?
                .await
                .context("batch_execute_statement failed")?;
            for handle in handles {
                println!("{handle}");
            }
            Ok(())
        }
        Command::Describe { id } => {
            let description = client.describe_statement(id.into())?.await?;
            println!("{}", serde_json::to_string_pretty(&description)?);
            Ok(())
        }
        Command::Wait { id } => {
            let description = client.wait_for_statement(id.into())?.await?;
            println!("{}: {}", description.id, description.status);
            Ok(())
        }
        Command::Result { id, json } => {
            if json {
                print_json_rows(client, id.into()).await
            } else {
                print_table(client, id.into()).await
            }
        }
        Command::Cancel { id } => {
            if client.cancel_statement(id.clone().into())?.await? {
                println!("{id}: cancelled");
                Ok(())
            } else {
                bail!("statement {id} could not be cancelled")
            }
        }
    }
}

async fn print_table(client: &RedshiftDataClient, id: StatementHandle) -> Result<()> {
    let rows = client.get_statement_result(id)?.await?;
    let result = rows.collect().await?;
    println!("{result}");
    Ok(())
}

async fn print_json_rows(client: &RedshiftDataClient, id: StatementHandle) -> Result<()> {
    let rows = client.get_statement_result(id)?.await?;
    let names: Vec<String> = rows.columns().iter().map(|c| c.name.clone()).collect();

    let mut stream = Box::pin(rows.into_stream());
    while let Some(record) = stream.next().await {
        let object: serde_json::Map<String, serde_json::Value> = names
            .iter()
            .cloned()
            .zip(record?.into_iter().map(field_to_json))
            .collect();
        println!("{}", serde_json::Value::Object(object));
    }
    Ok(())
}

fn field_to_json(field: Field) -> serde_json::Value {
    match field {
        Field::Null => serde_json::Value::Null,
        Field::Boolean(b) => b.into(),
        Field::Long(v) => v.into(),
        Field::Double(v) => v.into(),
        Field::String(s) => s.into(),
        Field::Blob(bytes) => bytes.iter().map(|b| format!("{b:02x}")).collect::<String>().into(),
    }
}
