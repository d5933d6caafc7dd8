use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use marketoctl::api::{parse_field_spec, ApiClient, ApiResponse, Fields, ObjectInfo};
use marketoctl::config::{self, Config};
use marketoctl::{editor, logging, Error, Result};

#[derive(Parser, Debug)]
#[command(name = "marketoctl", version)]
#[command(about = "CLI tool to facilitate Marketo integration", long_about = None)]
struct Cli {
    /// Prints request and response details
    #[arg(short = 'v', long)]
    debug: bool,

    /// Edit configuration
    #[arg(long)]
    edit_config: bool,

    /// Configuration file (defaults to $MARKETOCTL_CONFIG, then $SNAP_USER_COMMON/marketoctl.yaml, then ./marketoctl.yaml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// List available lead fields, or fetch a lead with id=<id>
    Lead {
        #[arg(value_name = "field=value")]
        spec: Vec<String>,
    },

    /// Create or update a lead, then show it
    #[command(name = "set_lead", alias = "set-lead")]
    SetLead {
        #[arg(required = true, value_name = "field=value")]
        spec: Vec<String>,
    },

    /// List available snap fields, or fetch a snap with marketoGUID=<guid>
    Snap {
        #[arg(value_name = "field=value")]
        spec: Vec<String>,
    },

    /// Create or update a snap, then show it
    #[command(name = "set_snap", alias = "set-snap")]
    SetSnap {
        #[arg(required = true, value_name = "field=value")]
        spec: Vec<String>,
    },

    /// Search snaps by exactly one of marketoGUID, snapName or emailAddress
    #[command(name = "get_snaps", alias = "get-snaps")]
    GetSnaps {
        #[arg(value_name = "field=value")]
        spec: Vec<String>,
    },

    /// Delete snaps by snapName
    #[command(name = "delete_snap", alias = "delete-snap")]
    DeleteSnap {
        #[arg(value_name = "field=value")]
        spec: Vec<String>,
    },

    /// List the custom object types
    Objects,

    /// Show the schema of a custom object
    Describe { name: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let path = config::config_path(cli.config.as_deref());
    if cli.edit_config || !path.exists() {
        editor::edit_config(&path).map_err(|err| {
            tracing::debug!(error = %err, "configuration editing failed");
            Error::Config(format!(
                "Could not access the configuration file ...\nPlease edit {} manually.",
                path.display()
            ))
        })?;
    }
    let config = load_config(&path)?;

    let Some(action) = cli.action else {
        return Ok(());
    };

    let mut client = ApiClient::from_config(&config)?;
    match action {
        Action::Lead { spec } => {
            let fields = parse_field_spec(&spec);
            if fields.is_empty() {
                print_info(&client.lead_info().await?);
                return Ok(());
            }
            let id = lookup_key(&fields, "id", "lead")?;
            print_records(&client.get_lead(&id).await?)?;
        }
        Action::SetLead { spec } => {
            let fields = require_fields(&spec)?;
            let updated = client.set_lead(&fields).await?;
            let id = updated
                .first_field("id")
                .ok_or_else(|| Error::MalformedResponse("lead result has no id".to_string()))?;
            print_outcome("Lead", &id, &updated);
            print_records(&client.get_lead(&id).await?)?;
        }
        Action::Snap { spec } => {
            let fields = parse_field_spec(&spec);
            if fields.is_empty() {
                print_info(&client.snap_info().await?);
                return Ok(());
            }
            let guid = lookup_key(&fields, "marketoGUID", "snap")?;
            print_records(&client.get_snap(&guid).await?)?;
        }
        Action::SetSnap { spec } => {
            let fields = require_fields(&spec)?;
            let updated = client.set_snap(&fields).await?;
            let guid = updated.first_field("marketoGUID").ok_or_else(|| {
                Error::MalformedResponse("snap result has no marketoGUID".to_string())
            })?;
            print_outcome("Snap", &guid, &updated);
            print_records(&client.get_snap(&guid).await?)?;
        }
        Action::GetSnaps { spec } => {
            let found = client.get_snaps(&parse_field_spec(&spec)).await?;
            if found.result().is_empty() {
                println!("{}", "No snaps found.".yellow());
            } else {
                print_records(&found)?;
            }
        }
        Action::DeleteSnap { spec } => {
            let fields = parse_field_spec(&spec);
            let deleted = client.delete_snap(&fields).await?;
            let guid = deleted
                .first_field("marketoGUID")
                .or_else(|| fields.values().next().map(ToString::to_string))
                .unwrap_or_default();
            print_outcome("Snap", &guid, &deleted);
        }
        Action::Objects => print_records(&client.list_objects().await?)?,
        Action::Describe { name } => print_records(&client.describe_object(&name).await?)?,
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).map_err(|err| match err {
        Error::Yaml(err) => Error::Config(format!(
            "Could not parse the configuration file ...\nEnsure {} is a valid YAML ({}).",
            path.display(),
            err
        )),
        other => other,
    })
}

fn require_fields(spec: &[String]) -> Result<Fields> {
    let fields = parse_field_spec(spec);
    if fields.is_empty() {
        return Err(Error::Usage(
            "Expected at least one field=value pair".to_string(),
        ));
    }
    Ok(fields)
}

/// Lookups take exactly one pair naming the record's key.
fn lookup_key(fields: &Fields, key: &str, object: &str) -> Result<String> {
    match fields.get(key) {
        Some(value) if fields.len() == 1 => Ok(value.to_string()),
        _ => Err(Error::Usage(format!(
            "Fetching a {object} takes a single {key}=<value> pair; use set_{object} to write fields"
        ))),
    }
}

fn print_info(info: &ObjectInfo) {
    let msg = format!(
        "'{}' object available fields:\n\t{}\nupdateable fields:\n\t{}",
        info.display_name,
        info.available_fields.join(", "),
        info.updateable_fields.join(", ")
    );
    println!("{}", msg.green());
}

fn print_outcome(object: &str, key: &str, response: &ApiResponse) {
    let status = response.first_field("status").unwrap_or_default();
    println!("{}", format!("{object} object '{key}' {status}!").green());
}

fn print_records(response: &ApiResponse) -> Result<()> {
    let records = match response.as_value().get("result") {
        Some(result) => result,
        None => response.as_value(),
    };
    match records {
        Value::Array(items) => {
            for item in items {
                println!("{}", serde_json::to_string_pretty(item)?);
            }
        }
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

fn report(err: &Error) {
    eprintln!("{}", err.to_string().red().bold());
    for reason in err.reasons() {
        let line = match &reason.code {
            Some(code) => format!("\t{} ({})", reason.message, code),
            None => format!("\t{}", reason.message),
        };
        eprintln!("{}", line.red());
    }
}
