//! Command-line front end: argument parsing and terminal rendering.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use releaserite::api::ApiClient;
use releaserite::auth::{permissions, AuthContext};
use releaserite::config::{self, Config};
use releaserite::errors::AppError;
use releaserite::models::{
    CreateEnvironmentRequest, CreateReleaseRequest, CreateServiceRequest, Environment, Release,
    ServiceLinkRequest,
};
use releaserite::progress::{self, ProgressTier};
use releaserite::session::SessionStore;
use releaserite::tracker::{self, ReleaseView};

/// Track releases and their deployments across environments.
#[derive(Debug, Parser)]
#[command(name = "releaserite", version, about)]
pub struct Cli {
    /// API base URL, e.g. http://127.0.0.1:8000/api/v1
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Session file holding the stored credentials
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the access token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RELEASERITE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored access token
    Logout,
    /// Show the current user, role and permissions
    Whoami,
    /// Manage environments
    #[command(subcommand)]
    Environments(EnvironmentCommand),
    /// Manage services
    #[command(subcommand)]
    Services(ServiceCommand),
    /// Manage releases and their deployments
    #[command(subcommand)]
    Releases(ReleaseCommand),
    /// List users (admin)
    #[command(subcommand)]
    Users(ListCommand),
    /// List roles (admin)
    #[command(subcommand)]
    Roles(ListCommand),
}

#[derive(Debug, Subcommand)]
pub enum ListCommand {
    List,
}

#[derive(Debug, Subcommand)]
pub enum EnvironmentCommand {
    List,
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Debug, Subcommand)]
pub enum ServiceCommand {
    List,
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        repo_link: Option<String>,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReleaseCommand {
    /// List releases with per-environment progress badges
    List,
    /// Show deployment progress and the service matrix of one release
    Show { id: Uuid },
    Create {
        name: String,
        #[arg(long)]
        version: String,
        /// Service to include, as ID[@VERSION]; repeatable
        #[arg(long = "service")]
        services: Vec<String>,
    },
    Delete {
        id: Uuid,
    },
    /// Record a successful deployment of one service to one environment
    Deploy(DeployArgs),
    /// Remove the deployment of one service from one environment
    Undeploy(DeployArgs),
    /// Download the PDF report
    Report {
        id: Uuid,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct DeployArgs {
    pub id: Uuid,
    /// Environment name or ID
    #[arg(long)]
    pub env: String,
    /// Service name or ID
    #[arg(long)]
    pub service: String,
}

struct App {
    client: ApiClient,
    store: SessionStore,
}

impl App {
    async fn session(&self) -> Result<AuthContext, AppError> {
        self.store.require().await
    }
}

/// Run one command. A rejected session clears the stored credentials.
pub async fn run(cli: Cli, mut config: Config) -> Result<(), AppError> {
    if let Some(raw) = cli.api_url.as_deref() {
        config.api_url = config::parse_api_url(raw)?;
    }
    if let Some(path) = cli.session {
        config.session_path = path;
    }

    let app = App {
        client: ApiClient::new(config.api_url.clone())?,
        store: SessionStore::open(&config.session_path).await?,
    };

    let result = dispatch(&app, cli.command).await;
    if let Err(AppError::Unauthorized(_)) = &result {
        app.store.clear().await?;
        return Err(AppError::Unauthorized(
            "Session expired or invalid; please log in again.".to_string(),
        ));
    }
    result
}

async fn dispatch(app: &App, command: Command) -> Result<(), AppError> {
    match command {
        Command::Login { email, password } => {
            let token = match app.client.login(&email, &password).await {
                Err(AppError::Unauthorized(msg)) => return Err(AppError::Forbidden(msg)),
                other => other?,
            };
            app.store.save(&token).await?;
            let ctx = AuthContext::from_token(token);
            println!(
                "Logged in as {} ({})",
                email,
                ctx.role().as_deref().unwrap_or("no role")
            );
            Ok(())
        }
        Command::Logout => {
            app.store.clear().await?;
            println!("Logged out");
            Ok(())
        }
        Command::Whoami => whoami(app).await,
        Command::Environments(cmd) => environments(app, cmd).await,
        Command::Services(cmd) => services(app, cmd).await,
        Command::Releases(cmd) => releases(app, cmd).await,
        Command::Users(ListCommand::List) => {
            let ctx = app.session().await?;
            require_admin(&ctx)?;
            for user in app.client.list_users(&ctx).await? {
                let role = user.role.as_ref().map(|r| r.name.as_str()).unwrap_or("-");
                let state = if user.is_active { "active" } else { "inactive" };
                println!(
                    "{}  {:<32} {:<24} {:<18} {}",
                    user.id,
                    user.email,
                    user.full_name.as_deref().unwrap_or("-"),
                    role,
                    state
                );
            }
            Ok(())
        }
        Command::Roles(ListCommand::List) => {
            let ctx = app.session().await?;
            require_admin(&ctx)?;
            for role in app.client.list_roles(&ctx).await? {
                println!(
                    "{}  {:<20} {}",
                    role.id,
                    role.name,
                    role.permission_list().join(", ")
                );
            }
            Ok(())
        }
    }
}

async fn whoami(app: &App) -> Result<(), AppError> {
    let ctx = app.session().await?;
    let user = app.client.me(&ctx).await?;
    println!("{}", user.email);
    if let Some(name) = &user.full_name {
        println!("  name:        {}", name);
    }
    println!("  role:        {}", ctx.role().as_deref().unwrap_or("-"));
    let perms = ctx.permissions();
    if perms.is_empty() {
        println!("  permissions: -");
    } else {
        println!("  permissions: {}", perms.join(", "));
    }
    if let Some(total) = app.client.dashboard_summary(&ctx).await? {
        println!("  total users: {}", total);
    }
    Ok(())
}

async fn environments(app: &App, cmd: EnvironmentCommand) -> Result<(), AppError> {
    let ctx = app.session().await?;
    match cmd {
        EnvironmentCommand::List => {
            for env in app.client.list_environments(&ctx).await? {
                println!(
                    "{}  {:<16} {}",
                    env.id,
                    env.name,
                    env.description.as_deref().unwrap_or("")
                );
            }
        }
        EnvironmentCommand::Create { name, description } => {
            let env = app
                .client
                .create_environment(&ctx, &CreateEnvironmentRequest { name, description })
                .await?;
            println!("Created environment {} ({})", env.name, env.id);
        }
        EnvironmentCommand::Delete { id } => {
            app.client.delete_environment(&ctx, id).await?;
            println!("Deleted environment {}", id);
        }
    }
    Ok(())
}

async fn services(app: &App, cmd: ServiceCommand) -> Result<(), AppError> {
    let ctx = app.session().await?;
    match cmd {
        ServiceCommand::List => {
            for svc in app.client.list_services(&ctx).await? {
                println!(
                    "{}  {:<24} {:<10} {}",
                    svc.id,
                    svc.name,
                    svc.status.as_deref().unwrap_or("-"),
                    svc.owner.as_deref().unwrap_or("-")
                );
            }
        }
        ServiceCommand::Create {
            name,
            description,
            owner,
            repo_link,
        } => {
            require_permission(&ctx, permissions::CREATE_SERVICES)?;
            let request = CreateServiceRequest {
                name,
                description,
                owner,
                environment_id: None,
                status: None,
                repo_link,
            };
            let svc = app.client.create_service(&ctx, &request).await?;
            println!("Created service {} ({})", svc.name, svc.id);
        }
        ServiceCommand::Delete { id } => {
            require_permission(&ctx, permissions::CREATE_SERVICES)?;
            app.client.delete_service(&ctx, id).await?;
            println!("Deleted service {}", id);
        }
    }
    Ok(())
}

async fn releases(app: &App, cmd: ReleaseCommand) -> Result<(), AppError> {
    let ctx = app.session().await?;
    match cmd {
        ReleaseCommand::List => {
            let releases = app.client.list_releases(&ctx).await?;
            let environments = tracker::load_environments(&app.client, &ctx).await?;
            for release in &releases {
                println!(
                    "{}  {:<24} {:<10} {}",
                    release.id,
                    release.name,
                    release.version,
                    render_badges(release, &environments)
                );
            }
        }
        ReleaseCommand::Show { id } => {
            let view = ReleaseView::load(app.client.clone(), ctx, id).await?;
            print_release(&view.release().await, view.environments());
        }
        ReleaseCommand::Create {
            name,
            version,
            services,
        } => {
            require_permission(&ctx, permissions::CREATE_RELEASES)?;
            let services = services
                .iter()
                .map(|raw| parse_service_link(raw))
                .collect::<Result<Vec<_>, _>>()?;
            let request = CreateReleaseRequest {
                name,
                version,
                planned_release_date: None,
                services,
                product_owner_id: None,
                qa_id: None,
                security_analyst_id: None,
            };
            let release = app.client.create_release(&ctx, &request).await?;
            println!("Created release {} {} ({})", release.name, release.version, release.id);
        }
        ReleaseCommand::Delete { id } => {
            require_permission(&ctx, permissions::CREATE_RELEASES)?;
            app.client.delete_release(&ctx, id).await?;
            println!("Deleted release {}", id);
        }
        ReleaseCommand::Deploy(args) => {
            require_permission(&ctx, permissions::CREATE_RELEASES)?;
            let view = ReleaseView::load(app.client.clone(), ctx, args.id).await?;
            let (env_id, service_id) = resolve_target(&view, &args).await?;
            view.deploy(env_id, service_id).await?;
            print_progress_line(&view, env_id).await;
        }
        ReleaseCommand::Undeploy(args) => {
            require_permission(&ctx, permissions::CREATE_RELEASES)?;
            let view = ReleaseView::load(app.client.clone(), ctx, args.id).await?;
            let (env_id, service_id) = resolve_target(&view, &args).await?;
            view.undeploy(env_id, service_id).await?;
            print_progress_line(&view, env_id).await;
        }
        ReleaseCommand::Report { id, out } => {
            let view = ReleaseView::load(app.client.clone(), ctx, id).await?;
            let path = view.download_report(&out).await?;
            println!("Report written to {}", path.display());
        }
    }
    Ok(())
}

/// Refuse early when the token's claims lack `required`. The API checks again.
fn require_permission(ctx: &AuthContext, required: &str) -> Result<(), AppError> {
    if ctx.has_permission(required) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Your role does not grant {required}"
        )))
    }
}

fn require_admin(ctx: &AuthContext) -> Result<(), AppError> {
    if ctx.claims().is_some_and(|claims| claims.is_admin()) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin privileges required.".to_string()))
    }
}

fn parse_service_link(raw: &str) -> Result<ServiceLinkRequest, AppError> {
    let (id, version) = match raw.split_once('@') {
        Some((id, version)) => (id, Some(version.to_string())),
        None => (raw, None),
    };
    let service_id = Uuid::parse_str(id.trim())
        .map_err(|_| AppError::Config(format!("invalid service id {id:?}")))?;
    Ok(ServiceLinkRequest {
        service_id,
        pipeline_link: None,
        version: version.filter(|v| !v.is_empty()),
    })
}

async fn resolve_target(view: &ReleaseView, args: &DeployArgs) -> Result<(Uuid, Uuid), AppError> {
    let env_id = find_environment(view.environments(), &args.env)
        .ok_or_else(|| AppError::NotFound(format!("Environment {:?} not found", args.env)))?;
    let release = view.release().await;
    let service_id = find_service(&release, &args.service).ok_or_else(|| {
        AppError::NotFound(format!(
            "Service {:?} is not part of release {}",
            args.service, release.name
        ))
    })?;
    Ok((env_id, service_id))
}

fn find_environment(environments: &[Environment], key: &str) -> Option<Uuid> {
    let by_id = Uuid::parse_str(key).ok();
    environments
        .iter()
        .find(|env| Some(env.id) == by_id || env.name.eq_ignore_ascii_case(key))
        .map(|env| env.id)
}

fn find_service(release: &Release, key: &str) -> Option<Uuid> {
    let by_id = Uuid::parse_str(key).ok();
    release
        .service_links
        .iter()
        .find(|link| Some(link.service_id) == by_id || link.service.name.eq_ignore_ascii_case(key))
        .map(|link| link.service_id)
}

async fn print_progress_line(view: &ReleaseView, env_id: Uuid) {
    let p = view.progress(env_id).await;
    let name = view
        .environments()
        .iter()
        .find(|env| env.id == env_id)
        .map(|env| env.name.as_str())
        .unwrap_or("?");
    println!(
        "{}: {}/{} services deployed ({}%)",
        name, p.deployed, p.total, p.percent
    );
}

fn render_badges(release: &Release, environments: &[Environment]) -> String {
    let badges = progress::tracker_badges(release, environments);
    if badges.is_empty() {
        return "(no services)".to_string();
    }
    badges
        .iter()
        .map(|badge| match badge.tier {
            ProgressTier::Full => format!("{} ✓", badge.environment),
            _ => format!("{} {}%", badge.environment, badge.percent),
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn progress_bar(percent: u32) -> String {
    const WIDTH: u32 = 20;
    let filled = (percent.min(100) * WIDTH / 100) as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(WIDTH as usize - filled)
    )
}

fn print_release(release: &Release, environments: &[Environment]) {
    println!("{} {}", release.name, release.version);
    println!("  created:   {}", release.created_at.format("%Y-%m-%d"));
    if let Some(planned) = release.planned_release_date {
        println!("  planned:   {}", planned.format("%Y-%m-%d"));
    }
    for (label, person) in [
        ("owner", &release.owner),
        ("product", &release.product_owner),
        ("qa", &release.qa),
        ("security", &release.security_analyst),
    ] {
        let name = person.as_ref().map(|p| p.display_name()).unwrap_or("-");
        println!("  {:<10} {}", format!("{label}:"), name);
    }

    let matrix = progress::release_matrix(release, environments);

    println!();
    println!("Deployment progress");
    if matrix.environments.is_empty() {
        println!("  No environments defined.");
    }
    for card in &matrix.environments {
        let p = card.progress;
        println!(
            "  {:<12} {} {:>3}%  {}/{} services  ({})",
            card.environment.name,
            progress_bar(p.percent),
            p.percent,
            p.deployed,
            p.total,
            p.tier().as_str()
        );
    }

    println!();
    println!("Services");
    if matrix.rows.is_empty() {
        println!("  No services included in this release.");
        return;
    }
    for row in &matrix.rows {
        println!(
            "  {} {}  owner: {}",
            row.link.service.name,
            row.link.version.as_deref().unwrap_or("-"),
            row.link.service.owner.as_deref().unwrap_or("-")
        );
        if let Some(pipeline) = &row.link.pipeline_link {
            println!("    pipeline: {}", pipeline);
        }
        for (env, cell) in environments.iter().zip(&row.cells) {
            match cell {
                Some(d) => println!(
                    "    {:<12} deployed {}",
                    env.name,
                    d.deployed_at.format("%Y-%m-%d %H:%M")
                ),
                None => println!("    {:<12} not deployed", env.name),
            }
        }
    }
}
