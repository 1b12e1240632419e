use anyhow::Context;
use chrono::{NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::ConnectionArgs;
use core_types::Record;
use database::{Connection, Fragment};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the rowmap command-line tool.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let settings = configuration::load_settings()
        .context("Failed to load database settings")?
        .with_overrides(cli.connection)?;
    let mut conn = Connection::connect(&settings)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", settings.database))?;

    match cli.command {
        Commands::Ping => {
            conn.ping().await?;
            println!("Database '{}' is reachable.", conn.name());
        }
        Commands::Count(args) => {
            let count = match args.filter {
                Some(filter) => conn.count_rows_where(&args.table, filter).await?,
                None => conn.count_rows(&args.table).await?,
            };
            println!("{count}");
        }
        Commands::DropTable(args) => {
            conn.drop_table(&args.table).await?;
            println!("Dropped table '{}' (if it existed).", args.table);
        }
        Commands::Demo(args) => handle_demo(&mut conn, args).await?,
    }

    conn.close().await?;
    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Maps annotated Rust records onto PostgreSQL tables.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the configured database is reachable.
    Ping,
    /// Count the rows of a table.
    Count(CountArgs),
    /// Drop a table if it exists.
    DropTable(TableArgs),
    /// Create a demo table, round-trip a few records through it and print them.
    Demo(DemoArgs),
}

#[derive(Parser)]
struct CountArgs {
    #[arg(long)]
    table: String,

    /// Optional WHERE body, e.g. "price > 10".
    #[arg(long)]
    filter: Option<String>,
}

#[derive(Parser)]
struct TableArgs {
    #[arg(long)]
    table: String,
}

#[derive(Parser)]
struct DemoArgs {
    #[arg(long, default_value = "rowmap_demo")]
    table: String,

    /// Leave the demo table in place afterwards.
    #[arg(long)]
    keep: bool,
}

// ==============================================================================
// Demo Command Logic
// ==============================================================================

#[derive(Debug, Default, Clone, Record)]
struct Pizza {
    #[sql(column = "id", sql_type = "SERIAL", constraint = "PRIMARY KEY")]
    id: i32,
    #[sql(column = "topping", constraint = "NOT NULL")]
    topping: String,
    #[sql(column = "price")]
    price: f64,
    #[sql(column = "baked_at")]
    baked_at: Option<NaiveDateTime>,
}

async fn handle_demo(conn: &mut Connection, args: DemoArgs) -> anyhow::Result<()> {
    let table = args.table.as_str();
    conn.create_table::<Pizza>(table).await?;

    let baked_at = Some(Utc::now().naive_utc());
    for (topping, price) in [("Margherita", 8.5), ("Pepperoni", 10.0), ("Funghi", 9.25)] {
        let pizza = Pizza {
            topping: topping.to_string(),
            price,
            baked_at,
            ..Pizza::default()
        };
        let id = conn.insert_object(&pizza, table).await?;
        tracing::info!(id, topping, "Inserted demo record.");
    }

    // Raise the price of the cheapest pizza inside a transaction.
    let mut tx = conn.begin().await?;
    let mut cheapest: Vec<Pizza> = tx
        .select_for_update(table, Fragment::new("price < %v").arg(9.0_f64))
        .await?;
    for pizza in &mut cheapest {
        pizza.price += 1.0;
        tx.update_object(&*pizza, table).await?;
    }
    tx.commit().await?;

    let pizzas: Vec<Pizza> = conn.select_from(table).await?;
    println!("{}", render(&pizzas));

    let total = conn.count_rows(table).await?;
    println!("{total} rows in '{table}'.");

    if !args.keep {
        conn.drop_table(table).await?;
    }
    Ok(())
}

fn render(pizzas: &[Pizza]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["id", "topping", "price", "baked_at"]);

    for pizza in pizzas {
        table.add_row(vec![
            pizza.id.to_string(),
            pizza.topping.clone(),
            format!("{:.2}", pizza.price),
            pizza
                .baked_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        ]);
    }
    table
}
