use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use scm_hub::{
    auth::{AuthConfig, AuthService, UserProfile},
    config::{self, AppConfig},
    db::{self, DbPool},
    entities::user::UserRole,
    events::{Event, EventSender},
    openapi::ApiDocV1,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;
use utoipa::OpenApi;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate => {
            let context = CliContext::initialize().await?;
            db::run_migrations(&context.db)
                .await
                .context("failed to apply migrations")?;
            println!("Migrations applied");
        }
        Commands::CreateUser(args) => {
            let context = CliContext::initialize().await?;
            handle_create_user(&context, args, cli.json).await?;
        }
        Commands::Openapi(args) => {
            let doc = ApiDocV1::openapi();
            let rendered = if args.compact {
                doc.to_json()
            } else {
                doc.to_pretty_json()
            }
            .context("failed to render OpenAPI document")?;
            println!("{}", rendered);
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "scm-cli", about = "SCM Hub administration", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create a user account
    CreateUser(CreateUserArgs),
    /// Print the OpenAPI document
    Openapi(OpenapiArgs),
}

#[derive(Args)]
struct CreateUserArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long, value_enum, help = "Defaults to admin for the first account, user otherwise")]
    role: Option<RoleArg>,
}

#[derive(Args)]
struct OpenapiArgs {
    #[arg(long, action = ArgAction::SetTrue, help = "Emit single-line JSON")]
    compact: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Admin,
    User,
}

impl From<RoleArg> for UserRole {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Admin => UserRole::Admin,
            RoleArg::User => UserRole::User,
        }
    }
}

struct CliContext {
    db: Arc<DbPool>,
    auth_service: AuthService,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config: AppConfig = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        let db = Arc::new(db_pool);

        let (event_tx, mut event_rx) = mpsc::channel::<Event>(32);
        let event_sender = Arc::new(EventSender::new(event_tx));

        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                debug!(target: "scm_cli", event = ?event, "received async event");
            }
        });

        let auth_service = AuthService::new(AuthConfig::from(&config), db.clone(), event_sender);

        Ok(Self { db, auth_service })
    }
}

async fn handle_create_user(context: &CliContext, args: CreateUserArgs, json: bool) -> Result<()> {
    let user = context
        .auth_service
        .create_user(
            &args.name,
            &args.email,
            &args.password,
            args.role.map(UserRole::from),
        )
        .await
        .context("failed to create user")?;
    let profile = UserProfile::from(user);

    if json {
        print_json(&profile)?;
    } else {
        println!(
            "Created {} ({}) with role {}",
            profile.name, profile.email, profile.role
        );
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
