use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use minedash::client::SqliteClient;
use minedash::resource::schema::capitalize;
use minedash::resource::{
    equipment, inventory, maintenance, production, Equipment, FinancialTransaction, InventoryItem,
    MaintenanceRecord, ProductionRecord, Resource, Totals,
};
use minedash::{AppContext, Config, Error, Page, RemoteError, Submitted, ToastKind, Toaster};

#[derive(Parser)]
#[command(name = "minedash")]
#[command(about = "Track equipment, stock, money, output and maintenance for a mine site")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database URL (memory:// or file://path/to/db.sqlite)
    #[arg(long = "database-url", global = true)]
    database: Option<String>,

    /// User to act as
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Mining equipment
    Equipment {
        #[command(subcommand)]
        action: Action,
    },
    /// Inventory items and stock levels
    Inventory {
        #[command(subcommand)]
        action: Action,
    },
    /// Financial transactions
    Financial {
        #[command(subcommand)]
        action: Action,
    },
    /// Production records
    Production {
        #[command(subcommand)]
        action: Action,
    },
    /// Maintenance records
    Maintenance {
        #[command(subcommand)]
        action: Action,
    },
    /// Totals and alerts across every resource
    Summary,
}

#[derive(Subcommand)]
enum Action {
    /// List every row
    List,
    /// Show the fields the add and edit forms accept
    Fields,
    /// Create a row from field values
    Add {
        /// Field value, e.g. --set name="Excavator Alpha"
        #[arg(long = "set", value_parser = parse_pair)]
        values: Vec<(String, String)>,
    },
    /// Change fields of a row by ID (or ID suffix)
    Edit {
        id: String,
        #[arg(long = "set", value_parser = parse_pair)]
        values: Vec<(String, String)>,
    },
    /// Delete a row by ID (or ID suffix)
    Delete { id: String },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = cli.database {
        config.database_url = url;
    }
    if let Some(user) = cli.user {
        config.user = Some(user);
    }

    let context = AppContext::builder()
        .config(&config)?
        .build()
        .context("Failed to set up the database")?;

    let outcome = match cli.command {
        Commands::Equipment { action } => run::<Equipment>(&context, action).await,
        Commands::Inventory { action } => run::<InventoryItem>(&context, action).await,
        Commands::Financial { action } => run::<FinancialTransaction>(&context, action).await,
        Commands::Production { action } => run::<ProductionRecord>(&context, action).await,
        Commands::Maintenance { action } => run::<MaintenanceRecord>(&context, action).await,
        Commands::Summary => summary(&context).await,
    };

    print_toasts(context.toaster());
    context.shutdown();
    outcome
}

async fn run<R: Resource>(context: &AppContext, action: Action) -> Result<()> {
    let descriptor = R::descriptor();
    if let Action::Fields = action {
        for field in descriptor.fields {
            let required = if field.required { "required" } else { "optional" };
            let default = field.default.map(|d| format!(", default {}", d)).unwrap_or_default();
            println!("  {:<20} {} ({:?}, {}{})", field.name, field.label, field.kind, required, default);
        }
        return Ok(());
    }

    let page = context.page::<R>();
    page.mount().await.map_err(for_user)?;

    match action {
        Action::List | Action::Fields => list_rows(&page),
        Action::Add { values } => {
            page.open_create();
            let mut input = page.form().values();
            input.extend(values);
            match page.submit(input).await {
                Ok(Submitted::Created(row)) => println!("Created {} {}", descriptor.singular, short_id(row.id())),
                Ok(Submitted::Updated(_)) => {}
                Err(e) => return Err(for_user(e)),
            }
            list_rows(&page);
        }
        Action::Edit { id, values } => {
            let row = resolve(&page, &id)?;
            page.open_edit(&row);
            let mut input = page.form().values();
            input.extend(values);
            page.submit(input).await.map_err(for_user)?;
            list_rows(&page);
        }
        Action::Delete { id } => {
            let row = resolve(&page, &id)?;
            page.delete(row.id()).await.map_err(for_user)?;
            list_rows(&page);
        }
    }
    Ok(())
}

/// Finds a loaded row by full ID or by ID suffix, the way short IDs are
/// printed.
fn resolve<R: Resource>(page: &Page<R, SqliteClient<R>>, id: &str) -> Result<R> {
    let singular = R::descriptor().singular;
    let mut matches: Vec<R> = page
        .list()
        .items()
        .into_iter()
        .filter(|r| r.id().ends_with(id))
        .collect();
    match matches.len() {
        0 => bail!("No {} found with ID ending with '{}'", singular, id),
        1 => Ok(matches.remove(0)),
        n => bail!("{} {} rows match '{}', use more of the ID", n, singular, id),
    }
}

fn list_rows<R: Resource>(page: &Page<R, SqliteClient<R>>) {
    let descriptor = R::descriptor();
    let rows = page.list().items();
    if rows.is_empty() {
        println!("No {} found", descriptor.plural);
        return;
    }
    println!("{}:", capitalize(descriptor.plural));
    for row in rows {
        let fields = serde_json::to_string(&row.fields()).unwrap_or_default();
        println!("  {} [{:?}] {}", short_id(row.id()), row.badge(), fields);
    }
}

async fn summary(context: &AppContext) -> Result<()> {
    let equipment_page = context.page::<Equipment>();
    let inventory_page = context.page::<InventoryItem>();
    let financial_page = context.page::<FinancialTransaction>();
    let production_page = context.page::<ProductionRecord>();
    let maintenance_page = context.page::<MaintenanceRecord>();

    equipment_page.mount().await.map_err(for_user)?;
    inventory_page.mount().await.map_err(for_user)?;
    financial_page.mount().await.map_err(for_user)?;
    production_page.mount().await.map_err(for_user)?;
    maintenance_page.mount().await.map_err(for_user)?;

    println!("Equipment:");
    equipment_page.list().view(|rows| {
        for (status, count) in equipment::status_counts(rows) {
            println!("  {:?}: {}", status, count);
        }
    });

    println!("Inventory:");
    inventory_page.list().view(|rows| {
        println!("  Total value: {:.2}", inventory::total_value(rows));
        for item in inventory::needing_reorder(rows) {
            println!(
                "  {}: {} ({} on hand, minimum {})",
                item.stock_status().label(),
                item.name,
                item.current_stock,
                item.minimum_stock
            );
        }
    });

    println!("Financial:");
    financial_page.list().view(|rows| {
        let totals = Totals::of(rows);
        println!("  Revenue:    {:.2}", totals.revenue);
        println!("  Expenses:   {:.2}", totals.expense);
        println!("  Net profit: {:.2}", totals.net_profit());
    });

    println!("Production:");
    production_page.list().view(|rows| {
        println!("  Total: {:.1} t", production::total_tonnage(rows));
        for (material, tons) in production::tonnage_by_material(rows) {
            println!("  {}: {:.1} t", material, tons);
        }
    });

    println!("Maintenance:");
    let today = Local::now().date_naive();
    maintenance_page.list().view(|rows| {
        println!("  Total cost: {:.2}", maintenance::total_cost(rows));
        for record in maintenance::overdue(rows, today) {
            println!("  Overdue since {}: {}", record.scheduled_date, record.description);
        }
    });
    Ok(())
}

/// Store failures have already been reported as a toast; the backend detail
/// only goes to the log.
fn for_user(e: Error) -> anyhow::Error {
    match e {
        Error::Remote(RemoteError::Unauthorized(_)) | Error::NotAuthenticated => {
            anyhow!("not signed in, pass --user or set MINEDASH_USER")
        }
        Error::Remote(_) => anyhow!("the request did not go through (set RUST_LOG=warn for details)"),
        Error::Validation(errors) => {
            let lines: Vec<String> = errors
                .fields
                .iter()
                .map(|f| format!("  {}: {}", f.field, f.problem))
                .collect();
            anyhow!("invalid input:\n{}", lines.join("\n"))
        }
        other => other.into(),
    }
}

fn print_toasts(toaster: &Toaster) {
    for toast in toaster.visible() {
        let mark = match toast.kind {
            ToastKind::Success => "✓",
            ToastKind::Failure => "✗",
        };
        println!("{} {}", mark, toast.message);
        toaster.dismiss(toast.id);
    }
}

fn short_id(id: &str) -> &str {
    &id[id.len().saturating_sub(8)..]
}
