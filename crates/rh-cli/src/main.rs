use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::SourceArgs;

#[derive(Parser)]
#[command(name = "rh")]
#[command(about = "Mortgage rate history: snapshots, series, change logs, comparisons", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct one lender's catalogue at an instant
    Snapshot {
        #[arg(long)]
        lender: String,

        /// RFC 3339 or YYYY-MM-DD (start of day UTC)
        #[arg(long)]
        at: String,
    },

    /// Rate/APR time series for one product, or every product of the lender
    Series {
        #[arg(long)]
        lender: String,

        /// Product id; omit for all products
        #[arg(long)]
        product: Option<String>,
    },

    /// Change log across lenders, newest first
    Changes {
        /// Repeatable; default is every known lender
        #[arg(long = "lender")]
        lenders: Vec<String>,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,
    },

    /// Compare catalogues between two dates (no --to = now)
    Compare {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: Option<String>,

        /// Repeatable; default is every known lender
        #[arg(long = "lender")]
        lenders: Vec<String>,

        /// `variable` or `fixed-<years>`
        #[arg(long = "rate-type")]
        rate_type: Option<String>,

        /// pdh | btl
        #[arg(long)]
        buyer: Option<String>,

        /// Case-insensitive match on product or lender name
        #[arg(long)]
        search: Option<String>,

        /// Repeatable status toggle (decreased, modified, unchanged, increased, new, removed)
        #[arg(long = "status")]
        statuses: Vec<String>,

        /// Include per-status counts
        #[arg(long, default_value_t = false)]
        summary: bool,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> local overrides)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent when the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = rh_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Snapshot { lender, at } => {
            let session = commands::Session::open(&cli.source)?;
            commands::history::snapshot(&session, &lender, &at).await?;
        }

        Commands::Series { lender, product } => {
            let session = commands::Session::open(&cli.source)?;
            commands::history::series(&session, &lender, product.as_deref()).await?;
        }

        Commands::Changes { lenders, from, to } => {
            let session = commands::Session::open(&cli.source)?;
            commands::history::changes(&session, &lenders, from.as_deref(), to.as_deref())
                .await?;
        }

        Commands::Compare {
            from,
            to,
            lenders,
            rate_type,
            buyer,
            search,
            statuses,
            summary,
        } => {
            let session = commands::Session::open(&cli.source)?;
            commands::compare::run(
                &session,
                commands::compare::CompareArgs {
                    from,
                    to,
                    lenders,
                    rate_type,
                    buyer,
                    search,
                    statuses,
                    summary,
                },
            )
            .await?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
