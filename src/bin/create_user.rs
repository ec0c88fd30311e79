use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use ticket_api::auth::responses::Role;
use ticket_api::auth::store::{normalize_email, CredentialStore, NewIdentity};
use ticket_api::auth::{service, AuthError, PasswordService, PgCredentialStore};

#[derive(Parser, Debug)]
#[command(name = "create_user", about = "Create a ticket API account directly in the database")]
struct Args {
    /// Display name for the account.
    #[arg(long)]
    name: String,

    /// Email address for the account (case insensitive).
    #[arg(long)]
    email: String,

    /// Plaintext password to hash and store for this user.
    #[arg(long)]
    password: String,

    /// Role to assign (`user` or `admin`).
    #[arg(long, default_value = "user")]
    role: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let name = args.name.trim();
    let email = normalize_email(&args.email);

    let Some(role) = Role::parse(args.role.trim().to_lowercase().as_str()) else {
        writeln!(
            io::stderr(),
            "error: unsupported role '{}'. Use 'user' or 'admin'.",
            args.role
        )?;
        std::process::exit(1);
    };

    if let Err(err) = service::validate_registration(name, &email, &args.password) {
        writeln!(io::stderr(), "error: {err}")?;
        std::process::exit(1);
    }

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;
    ticket_api::db::run_migrations(&pool).await?;

    let password_service = PasswordService::new()?;
    let password_hash = password_service.hash_password(&args.password)?;

    let store: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(pool));
    let identity = match store
        .insert_identity(NewIdentity {
            name: name.to_string(),
            email: email.clone(),
            password_hash,
            role,
        })
        .await
    {
        Ok(identity) => identity,
        Err(AuthError::DuplicateEmail) => {
            writeln!(io::stderr(), "error: a user with email '{email}' already exists.")?;
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    println!(
        "Created {} user '{}' with id {}",
        identity.role.as_str(),
        identity.email,
        identity.id
    );
    Ok(())
}
