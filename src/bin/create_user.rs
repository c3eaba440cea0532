//! Creates a user account, or resets the password of an existing one.
//!
//! ```text
//! create_user --username alice --email alice@example.com --password s3cret
//! ```

use anyhow::Context;
use clap::Parser;

use cinema_booking::{config::Config, database::Database, models::User, services::auth};

#[derive(Debug, Parser)]
#[command(about = "Create or update a cinema booking user")]
struct Args {
    #[arg(long)]
    username: String,

    #[arg(long, default_value = "")]
    email: String,

    #[arg(long, env = "CREATE_USER_PASSWORD")]
    password: String,

    /// bcrypt cost factor
    #[arg(long, default_value_t = bcrypt::DEFAULT_COST)]
    cost: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    anyhow::ensure!(!args.username.trim().is_empty(), "username must not be empty");
    anyhow::ensure!(!args.password.is_empty(), "password must not be empty");

    let config = Config::from_env().context("invalid configuration")?;
    let db = Database::new(&config.database)
        .await
        .context("failed to connect to database")?;
    db.run_migrations().await.context("failed to run migrations")?;

    let hash = auth::hash_password(&args.password, args.cost).await?;
    let user = User::upsert(&db.pool, args.username.trim(), &args.email, &hash).await?;

    tracing::info!(user_id = user.id, username = %user.username, "user saved");
    Ok(())
}
