use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the coverage rules of a SELECT statement
    Generate {
        #[command(flatten)]
        input: SqlInput,

        #[arg(long, help = "Schema file path (JSON)")]
        schema: Option<String>,

        #[arg(long, help = "Rule options file path (JSON)")]
        config: Option<String>,

        #[arg(long, help = "If set, prints the rules as a JSON array instead of one per line")]
        json: bool,

        #[arg(
            long,
            help = "If specified, writes the rules to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// Print the canonical rendering of a statement
    Render {
        #[command(flatten)]
        input: SqlInput,
    },
    Ast {
        #[command(flatten)]
        input: SqlInput,
    },
    /// Resolve every table and column of a statement against a schema
    Check {
        #[command(flatten)]
        input: SqlInput,

        #[arg(long, help = "Schema file path (JSON)")]
        schema: String,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SqlInput {
    #[arg(long, help = "SQL statement")]
    pub sql: Option<String>,

    #[arg(long, help = "File containing the SQL statement")]
    pub file: Option<String>,
}
