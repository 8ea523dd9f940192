use anyhow::Context;
use clap::{Parser, Subcommand};
use foodgram::app::{import_ingredients, import_tags, user_create_superuser, UserRegisterReq};
use foodgram::config::Config;
use foodgram::infra::init_db;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "foodgram", version, about = "Recipe sharing backend")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Load ingredients from a JSON array of {name, measurement_unit}
    LoadIngredients {
        path: PathBuf,
        /// Update the unit of ingredients that already exist
        #[arg(long)]
        update: bool,
    },
    /// Load tags from a JSON array of {name, slug}
    LoadTags { path: PathBuf },
    /// Create an account allowed to edit any recipe
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "FOODGRAM_SUPERUSER_PASSWORD")]
        password: String,
        #[arg(long, default_value = "Admin")]
        first_name: String,
        #[arg(long, default_value = "Admin")]
        last_name: String,
    },
}

fn init_logger(verbose: bool) {
    let default = if verbose {
        "foodgram=debug,axum=debug,info"
    } else {
        "foodgram=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .compact(),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = Config::from_env()?;

    match cli.command {
        Command::Serve => foodgram::serve(config).await?,
        Command::LoadIngredients { path, update } => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("file not found: {}", path.display()))?;
            let pool = init_db(&config.db_path)?;
            let result = import_ingredients(&pool, &json, update)?;
            println!(
                "Done: created {}, updated {}, skipped {}",
                result.created, result.updated, result.skipped
            );
        }
        Command::LoadTags { path } => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("file not found: {}", path.display()))?;
            let pool = init_db(&config.db_path)?;
            let result = import_tags(&pool, &json)?;
            println!("Done: created {}, skipped {}", result.created, result.skipped);
        }
        Command::CreateSuperuser {
            email,
            username,
            password,
            first_name,
            last_name,
        } => {
            let pool = init_db(&config.db_path)?;
            let user = user_create_superuser(
                &pool,
                UserRegisterReq {
                    email,
                    username,
                    first_name,
                    last_name,
                    password,
                },
            )?;
            println!("Superuser {} created (id {})", user.username, user.id);
        }
    }
    Ok(())
}
