//! Register Explorer CLI - scrape the sponsor registry, keep the
//! organisation table, resolve company links

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use register_explorer::config::{self, Secrets};
use register_explorer::store::{ColumnSpec, Constraint, SqlType, SqliteStore};
use register_explorer::{logging, scrape};

const ORGANISATIONS_TABLE: &str = "organisations";
const COL_ORGANISATION_NAME: &str = "organisation_name";
const COL_URL: &str = "url";

#[derive(Parser)]
#[command(name = "register-explorer")]
#[command(version = "0.1.0")]
#[command(about = "Explore the public register of recognised sponsor organisations")]
#[command(long_about = r#"
Register Explorer keeps a local table of sponsor organisations:
  • Scrape the public registry page into the table
  • Resolve an organisation to its company page via a search engine
  • Add, remove, update and show rows

Example usage:
  register-explorer scrape
  register-explorer search --name "ABB B.V."
  register-explorer enrich --name "ABB B.V."
  register-explorer show
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the registry page and store the organisation names
    Scrape {
        /// Path to the database file
        #[arg(short, long, default_value = "organisations.db")]
        database: PathBuf,

        /// Registry page URL
        #[arg(short, long, default_value = scrape::IND_SPONSORS_URL)]
        url: String,
    },

    /// Resolve an organisation to its first search-result link
    Search {
        /// Organisation name to search for
        #[arg(short, long)]
        name: String,

        /// Path to the secrets file (my_key, my_cx)
        #[arg(short, long)]
        secrets: Option<PathBuf>,
    },

    /// Resolve an organisation's link and store it in the url column
    Enrich {
        /// Organisation name to enrich
        #[arg(short, long)]
        name: String,

        /// Path to the database file
        #[arg(short, long, default_value = "organisations.db")]
        database: PathBuf,

        /// Path to the secrets file (my_key, my_cx)
        #[arg(short, long)]
        secrets: Option<PathBuf>,
    },

    /// Add one organisation row
    Add {
        /// Organisation name (primary key)
        #[arg(short, long)]
        name: String,

        /// Organisation URL
        #[arg(short, long)]
        url: String,

        /// Path to the database file
        #[arg(short, long, default_value = "organisations.db")]
        database: PathBuf,
    },

    /// Delete every row where any column equals the value exactly
    Remove {
        /// Exact value to match
        #[arg(long)]
        value: String,

        /// Path to the database file
        #[arg(short, long, default_value = "organisations.db")]
        database: PathBuf,
    },

    /// Print the organisation table
    Show {
        /// Path to the database file
        #[arg(short, long, default_value = "organisations.db")]
        database: PathBuf,
    },
}

fn organisation_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new(COL_ORGANISATION_NAME, SqlType::Text, Constraint::PrimaryKey),
        ColumnSpec::new(COL_URL, SqlType::Text, Constraint::Unique),
    ]
}

fn open_store(database: &PathBuf) -> SqliteStore {
    let mut store = SqliteStore::new(database);
    store.connect();
    store.create_table(ORGANISATIONS_TABLE, &organisation_columns());
    store
}

fn load_secrets(path: Option<PathBuf>) -> anyhow::Result<Secrets> {
    config::load_secrets(path.as_deref())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::set_up_logging(cli.verbose);

    match cli.command {
        Commands::Scrape { database, url } => {
            tracing::info!("Scraping registry page into {:?}", database);
            let organisations =
                scrape::scrape_registry_organisations(&url, scrape::IND_EXCLUDED_HEADERS)?;
            println!("Scraped {} organisations", organisations.len());

            let mut store = open_store(&database);
            let before = store
                .get_column_values(ORGANISATIONS_TABLE, COL_ORGANISATION_NAME)
                .len();
            for organisation in &organisations {
                store.insert(
                    ORGANISATIONS_TABLE,
                    &[(COL_ORGANISATION_NAME, organisation.as_str())],
                );
            }
            let after = store
                .get_column_values(ORGANISATIONS_TABLE, COL_ORGANISATION_NAME)
                .len();
            println!("Stored {} new organisations ({} total)", after - before, after);
            store.disconnect();
        }

        Commands::Search { name, secrets } => {
            let secrets = load_secrets(secrets)?;
            let link = scrape::resolve_organisation_link(&name, &secrets)?;
            println!("{link}");
        }

        Commands::Enrich { name, database, secrets } => {
            let secrets = load_secrets(secrets)?;
            let link = scrape::resolve_organisation_link(&name, &secrets)?;

            if link == scrape::NO_RESULTS {
                tracing::warn!("No search results for \"{name}\"; url left unchanged");
                return Ok(());
            }

            let mut store = open_store(&database);
            let affected = store.update_row(ORGANISATIONS_TABLE, &name, &[(COL_URL, &link)])?;
            if affected > 0 {
                println!("{name}: {link}");
            } else {
                println!("No organisation named \"{name}\" in the table");
            }
            store.disconnect();
        }

        Commands::Add { name, url, database } => {
            let mut store = open_store(&database);
            store.insert(
                ORGANISATIONS_TABLE,
                &[(COL_ORGANISATION_NAME, name.as_str()), (COL_URL, url.as_str())],
            );
            store.disconnect();
        }

        Commands::Remove { value, database } => {
            let mut store = open_store(&database);
            if let Some(row) = store.get_row_by_exact_match(ORGANISATIONS_TABLE, &value) {
                tracing::info!("Removing row: {row:?}");
            }
            store.delete_by_exact_match(ORGANISATIONS_TABLE, &value);
            store.disconnect();
        }

        Commands::Show { database } => {
            let mut store = open_store(&database);
            let rows = store.dump_table(ORGANISATIONS_TABLE);
            println!("{} organisations", rows.len());
            store.disconnect();
        }
    }

    Ok(())
}
