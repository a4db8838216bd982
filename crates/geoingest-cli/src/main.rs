use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use geoingest_core::{Config, RecordSet, UID_FIELD};
use geoingest_engine::validate_and_check;
use geoingest_index::{IndexClient, SolrClient};

mod files;

/// How many matching identifiers to list before deleting
const DELETE_LIST_ROWS: usize = 1000;

/// Geoingest - validate and ingest GeoBlacklight records into a search index
#[derive(Parser)]
#[command(name = "geoingest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: geoingest.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate GeoBlacklight JSON files and upload them to the index
    Add {
        /// A JSON file, or a directory searched recursively for JSON files
        path: PathBuf,

        /// Index instance name from the config file
        #[arg(short, long)]
        instance: String,

        /// Schema name from the [schemas] config table
        #[arg(short, long, default_value = "geoblacklight-1")]
        schema: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete records from the index
    Delete {
        /// Index instance name from the config file
        #[arg(short, long)]
        instance: String,

        #[command(flatten)]
        target: DeleteTarget,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct DeleteTarget {
    /// Delete one record by its layer slug
    #[arg(long)]
    id: Option<String>,

    /// Delete every record in the named collection
    #[arg(long)]
    collection: Option<String>,

    /// Delete every record with the given provenance
    #[arg(long)]
    provenance: Option<String>,

    /// Delete by raw index query
    #[arg(long)]
    query: Option<String>,

    /// Purge the entire index
    #[arg(long)]
    all: bool,
}

impl DeleteTarget {
    fn to_query(&self) -> String {
        if let Some(id) = &self.id {
            format!("layer_slug_s:{}", id)
        } else if let Some(collection) = &self.collection {
            format!("dct_isPartOf_sm:\"{}\"", collection)
        } else if let Some(provenance) = &self.provenance {
            format!("dct_provenance_s:\"{}\"", provenance)
        } else if let Some(query) = &self.query {
            query.clone()
        } else {
            "*:*".to_string()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("geoingest.toml").exists() {
        Config::from_file(Path::new("geoingest.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    match cli.command {
        Commands::Add {
            path,
            instance,
            schema,
            yes,
        } => add_command(&config, &path, &instance, &schema, yes).await,
        Commands::Delete {
            instance,
            target,
            yes,
        } => delete_command(&config, &instance, &target.to_query(), yes).await,
    }
}

fn client_for(config: &Config, instance_name: &str) -> Result<SolrClient> {
    let instance = config.instance(instance_name)?;
    Ok(SolrClient::new(
        instance_name,
        &instance.url,
        instance.username.clone(),
        instance.password.clone(),
    ))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} (y/N) ", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

async fn add_command(
    config: &Config,
    path: &Path,
    instance_name: &str,
    schema: &str,
    yes: bool,
) -> Result<()> {
    let file_list = files::collect_json_files(path)?;
    if file_list.is_empty() {
        eprintln!("No documents found in '{}'; exiting.", path.display());
        return Ok(());
    }

    eprintln!(
        "{} {} document(s) in {}",
        "Checking".cyan(),
        file_list.len(),
        path.display()
    );

    let mut set = RecordSet::new();
    for file in &file_list {
        let payload = files::open_json(file)?;
        set.add_record(payload, Some(file.display().to_string()))
            .with_context(|| format!("while loading '{}'", file.display()))?;
    }

    let client = client_for(config, instance_name)?;
    let report = validate_and_check(config, &mut set, schema, &client).await;

    println!("{}", report.record_summary);
    for diagnostic in &report.run_errors {
        eprintln!("{} {}", "error:".red(), diagnostic);
    }

    if report.has_errors() {
        eprintln!("{}", "Exited with errors; nothing was uploaded.".yellow());
        std::process::exit(1);
    }

    if !yes
        && !confirm(&format!(
            "Upload {} record(s) to instance '{}'?",
            set.len(),
            instance_name
        ))?
    {
        eprintln!("Operation aborted by user.");
        return Ok(());
    }

    // The batch was checked before upload; a concurrent writer could still
    // insert a colliding identifier in between. Accepted risk for an
    // offline batch tool, in exchange for flat memory use.
    for record in set.iter() {
        client
            .update(std::slice::from_ref(&record.payload))
            .await
            .with_context(|| format!("failed to upload '{}'", record.origin()))?;
        info!(origin = record.origin(), "uploaded");
    }

    eprintln!(
        "{} uploaded {} record(s) to '{}'",
        "Done:".green(),
        set.len(),
        instance_name
    );
    Ok(())
}

async fn delete_command(
    config: &Config,
    instance_name: &str,
    query: &str,
    yes: bool,
) -> Result<()> {
    eprintln!(
        "{} from '{}' where {}",
        "Delete".cyan(),
        instance_name,
        query
    );

    let client = client_for(config, instance_name)?;

    // Count-then-delete is racy against concurrent writers; the count is
    // for operator confirmation only.
    let found = client
        .select(query, None, DELETE_LIST_ROWS, Some(UID_FIELD))
        .await?;

    if found.num_found == 0 {
        eprintln!("No matching records found. Exiting.");
        return Ok(());
    }

    eprintln!("{} record(s) will be deleted:", found.num_found);
    for doc in &found.docs {
        if let Some(uid) = doc.get(UID_FIELD).and_then(|v| v.as_str()) {
            eprintln!("  {}", uid);
        }
    }
    if found.num_found > found.docs.len() {
        eprintln!("  ... and {} more", found.num_found - found.docs.len());
    }

    if !yes
        && !confirm(&format!(
            "Are you sure you want to delete {} record(s) from instance '{}'?",
            found.num_found, instance_name
        ))?
    {
        eprintln!("Operation aborted by user.");
        return Ok(());
    }

    client.delete(query).await?;
    eprintln!(
        "{} {} record(s) deleted.",
        "Done:".green(),
        found.num_found
    );
    Ok(())
}
