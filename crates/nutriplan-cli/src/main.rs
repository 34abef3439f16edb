//! `nutriplan`: shopping-list categorization for diet plans.
//!
//! # Usage
//!
//! ```text
//! nutriplan parse zakupy.txt
//! nutriplan categorize --list zakupy.txt
//! nutriplan categorize --plan 0b6c5e2a-…
//! nutriplan create --name "Redukcja" --client "Jan Kowalski"
//! nutriplan plans
//! ```

mod app;
mod settings;

use std::{
  io::{self, Read as _, Write as _},
  path::{Path, PathBuf},
};

use anyhow::{Context as _, bail};
use app::{App, Command, ConsoleNotifier, Flow, Mode, Session};
use clap::{Parser, Subcommand};
use nutriplan_core::{
  lineitem::parse_item,
  plan::DietPlan,
  product::{ParsedProduct, RawLineItem},
  store::PlanStore,
  wizard::Wizard,
};
use nutriplan_store_sqlite::SqliteStore;
use settings::Settings;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Shopping-list categorization for diet plans")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "nutriplan.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
  /// Parse shopping lines and print the products as JSON.
  Parse {
    /// One item per line, or a JSON array of items. `-` reads stdin.
    file: PathBuf,
  },

  /// Sort a shopping list into categories at an interactive prompt.
  Categorize {
    /// Shopping list file (same formats as `parse`).
    #[arg(long, value_name = "FILE", required_unless_present = "plan")]
    list: Option<PathBuf>,

    /// Categorize the shopping list of a saved plan.
    #[arg(long, value_name = "UUID", conflicts_with = "list")]
    plan: Option<Uuid>,
  },

  /// Build a diet plan step by step, then categorize its shopping list.
  Create {
    /// Start from a copy of a saved plan.
    #[arg(long, value_name = "UUID")]
    template: Option<Uuid>,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    client: Option<String>,
  },

  /// List saved plans, newest first.
  Plans,

  /// List the category catalog.
  Categories,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so they never mix with prompt output.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  match cli.command {
    Cmd::Parse { file } => {
      let products: Vec<ParsedProduct> =
        read_items(&file)?.iter().map(parse_item).collect();
      println!("{}", serde_json::to_string_pretty(&products)?);
    }

    Cmd::Categorize { list, plan } => {
      let store = open_store(&settings).await?;
      let (raw, plan_id) = match (list, plan) {
        (Some(path), _) => (read_items(&path)?, Uuid::new_v4()),
        (None, Some(plan_id)) => (load_plan(&store, plan_id).await?.shopping_list(), plan_id),
        (None, None) => bail!("either --list or --plan is required"),
      };

      let mut session = Session::new(&raw, ConsoleNotifier);
      if let Some(limit) = settings.history_limit {
        session = session.with_history_limit(limit);
      }
      tracing::info!(%plan_id, items = raw.len(), "starting categorization");
      run(store, &settings, Mode::Categorize { session, plan_id }).await?;
    }

    Cmd::Create {
      template,
      name,
      client,
    } => {
      let store = open_store(&settings).await?;
      let name = name.unwrap_or_default();
      let plan = match template {
        Some(id) => load_plan(&store, id).await?.instantiate(name, client),
        None => {
          let mut plan = DietPlan::new(name);
          plan.client = client;
          plan
        }
      };

      let mut wizard = Wizard::new(plan, ConsoleNotifier);
      if let Some(limit) = settings.history_limit {
        wizard = wizard.with_history_limit(limit);
      }
      run(store, &settings, Mode::Create { wizard }).await?;
    }

    Cmd::Plans => {
      let store = open_store(&settings).await?;
      for plan in store.list_plans().await? {
        println!(
          "{}  {}  {:<30} {}",
          plan.plan_id,
          plan.created_at.format("%Y-%m-%d"),
          plan.name,
          plan.client.as_deref().unwrap_or("-")
        );
      }
    }

    Cmd::Categories => {
      let store = open_store(&settings).await?;
      for category in store.list_categories().await? {
        println!(
          "{:<12} {:<24} {}",
          category.category_id,
          category.name,
          category.keywords.join(", ")
        );
      }
    }
  }

  Ok(())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Open the configured store and make sure the configured categories exist.
async fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
  let path = &settings.store_path;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))?;
  let seeded = store
    .seed_categories(&settings.categories)
    .await
    .context("failed to seed category catalog")?;
  tracing::debug!(path = %path.display(), seeded, "store ready");
  Ok(store)
}

async fn load_plan(store: &SqliteStore, plan_id: Uuid) -> anyhow::Result<DietPlan> {
  store
    .get_plan(plan_id)
    .await?
    .with_context(|| format!("no saved plan with id {plan_id}"))
}

/// Read a shopping list: a JSON array of items, or one text item per line.
fn read_items(path: &Path) -> anyhow::Result<Vec<RawLineItem>> {
  let text = if path == Path::new("-") {
    let mut text = String::new();
    io::stdin()
      .read_to_string(&mut text)
      .context("failed to read stdin")?;
    text
  } else {
    std::fs::read_to_string(path)
      .with_context(|| format!("failed to read {}", path.display()))?
  };

  if text.trim_start().starts_with('[') {
    return serde_json::from_str(&text).context("failed to parse JSON item list");
  }
  Ok(
    text
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(RawLineItem::from)
      .collect(),
  )
}

// ─── Prompt loop ──────────────────────────────────────────────────────────────

async fn run(store: SqliteStore, settings: &Settings, mode: Mode) -> anyhow::Result<()> {
  let catalog = store
    .list_categories()
    .await
    .context("failed to load categories")?;
  let mut app = App::new(store, catalog, settings.suggestion_min_score, mode, io::stdout());
  app.print_state()?;

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  loop {
    print!("> ");
    io::stdout().flush()?;

    let Some(line) = lines.next_line().await.context("failed to read input")? else {
      break;
    };
    let command = match Command::parse(&line) {
      Ok(Some(command)) => command,
      Ok(None) => continue,
      Err(e) => {
        eprintln!("error: {e:#}");
        continue;
      }
    };
    match app.handle(command).await {
      Ok(Flow::Quit) => break,
      Ok(Flow::Continue) => {}
      Err(e) => eprintln!("error: {e:#}"),
    }
  }

  Ok(())
}
