use anyhow::{bail, Context, Result};
use caredesk::auth::issue_token;
use caredesk::config::{jwt_from_env, DatabaseLocation, DEFAULT_DATABASE_URL};
use caredesk::store::{CareStore, NewUser, StoreError};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wards::Role;

#[derive(Parser)]
#[command(name = "carectl", version)]
struct Cli {
    /// Database to operate on (`sqlite://<path>` or `sqlite::memory:`)
    #[arg(long, global = true, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database file and apply the schema
    InitDb,
    /// Provision a user account
    CreateUser {
        #[arg(long)]
        username: String,
        /// Profile role; omit to create a user without a profile
        #[arg(long, value_parser = parse_role)]
        role: Option<Role>,
        /// Initial password; a random one is generated and printed when omitted
        #[arg(long, env = "CARECTL_PASSWORD")]
        password: Option<String>,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    /// Mint a bearer token for an existing user (needs JWT_SECRET)
    IssueToken {
        #[arg(long)]
        username: String,
    },
    /// Print version and exit
    Version,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = Role::ALL.iter().map(|r| r.as_str()).collect();
        format!("unknown role `{raw}` (expected one of {})", known.join(", "))
    })
}

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_store(url: &str) -> Result<CareStore> {
    let store = match DatabaseLocation::parse(url)? {
        DatabaseLocation::File(path) => CareStore::open(&path)
            .with_context(|| format!("failed to open database {}", path.display()))?,
        DatabaseLocation::Memory => CareStore::open_in_memory()?,
    };
    Ok(store)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::InitDb => {
            open_store(&cli.database)?;
            info!("Schema applied to {}", cli.database);
            println!("initialized {}", cli.database);
        }
        Commands::CreateUser {
            username,
            role,
            password,
            first_name,
            last_name,
            email,
        } => {
            let store = open_store(&cli.database)?;
            let (password, generated) = match password {
                Some(p) if p.chars().count() < 8 => {
                    bail!("password must be at least 8 characters")
                }
                Some(p) => (p, false),
                None => (uuid::Uuid::new_v4().simple().to_string(), true),
            };
            let new_user = NewUser {
                username: username.clone(),
                first_name,
                last_name,
                email,
            };
            let user = match store.create_user(&new_user, &password, role) {
                Ok(user) => user,
                Err(StoreError::DuplicateUsername(name)) => {
                    bail!("user `{name}` already exists")
                }
                Err(e) => return Err(e).context("failed to create user"),
            };
            match role {
                Some(role) => println!("created user {} (id {}, role {})", user.username, user.id, role),
                None => println!("created user {} (id {}, no profile)", user.username, user.id),
            }
            if generated {
                println!("password: {password}");
            }
        }
        Commands::IssueToken { username } => {
            let jwt = jwt_from_env().context("cannot sign tokens")?;
            let store = open_store(&cli.database)?;
            if store.user_by_username(&username)?.is_none() {
                bail!("no user named `{username}`");
            }
            let token = issue_token(&jwt, &username).context("failed to sign token")?;
            info!("Issued token for {} valid {}h", username, jwt.ttl_hours);
            println!("{token}");
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
    }
    Ok(())
}
