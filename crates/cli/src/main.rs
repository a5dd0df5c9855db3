use crate::error::CliError;
use clap::Parser;
use commands::Commands;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod input;
mod output;

#[derive(Parser)]
#[command(
    name = "sqlrules",
    version = "0.1.0",
    about = "MC/DC coverage rules for SQL SELECT statements"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<(), CliError> {
    // Initialize logger; stdout is reserved for the rules
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            schema,
            config,
            json,
            output,
        } => {
            let sql = input::read_sql(&input)?;
            let schema = input::load_schema(schema.as_deref())?;
            let options = input::load_options(config.as_deref())?;

            let rules = rules_engine::generate(&sql, schema.as_ref(), &options)?;
            output::write_rules(&rules, json, output)?;
        }
        Commands::Render { input } => {
            let query = sql_syntax::parse(&input::read_sql(&input)?)?;
            println!("{query}");
        }
        Commands::Ast { input } => {
            let query = sql_syntax::parse(&input::read_sql(&input)?)?;
            let json = serde_json::to_string_pretty(&query).map_err(CliError::JsonSerialize)?;
            println!("{json}");
        }
        Commands::Check { input, schema } => {
            let query = sql_syntax::parse(&input::read_sql(&input)?)?;
            let schema = catalog::Schema::load(&schema)?;
            catalog::validate(&query, &schema)?;
            info!(
                "Every table and column resolves against {} table(s)",
                schema.tables.len()
            );
        }
    }

    Ok(())
}
