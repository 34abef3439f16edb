//! Session state and command dispatcher for the interactive prompt.
//!
//! Two modes share one command set:
//!
//! - `Categorize` drives a [`CategorizationSession`] over a shopping list.
//! - `Create` drives the diet-creator [`Wizard`]; categorization commands
//!   are accepted only while the wizard is on its categorize step.

use std::io::Write;

use anyhow::{Context as _, bail};
use nutriplan_core::{
  catalog::{Category, KeywordSuggester},
  lineitem::parse_line,
  notify::{NoticeLevel, Notifier},
  partition::Partition,
  plan::{DietDay, DietPlan, Ingredient, Meal},
  product::ParsedProduct,
  session::CategorizationSession,
  store::PlanStore,
  wizard::{PlanSummary, Step, Wizard},
};
use uuid::Uuid;

pub const HELP: &str = "\
Categorization:
  list                     show products grouped by category
  assign <n> <category>    move product n into a category (id or name)
  unassign <n>             move product n back to the uncategorized pool
  edit <n> <text>          replace product n with a re-parsed line
  suggest [n]              show category suggestions
  undo | redo              step through the edit history
  save                     persist the categorization (or the finished plan)
Plan (create mode):
  name <text>              set the plan name
  client <text>            set the client (empty clears it)
  day <label>              start a new day
  meal <name>              start a new meal in the last day
  add <ingredient>         add an ingredient line to the last meal
  next | back              move between wizard steps
  summary                  show plan totals
General:
  help | quit";

// ─── Notifier ─────────────────────────────────────────────────────────────────

/// Prints notices straight to the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
  fn notify(&self, level: NoticeLevel, message: &str) {
    match level {
      NoticeLevel::Warning | NoticeLevel::Error => eprintln!("{level}: {message}"),
      NoticeLevel::Info | NoticeLevel::Success => println!("{message}"),
    }
  }
}

pub type Session = CategorizationSession<ConsoleNotifier>;

// ─── Commands ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  Help,
  List,
  Assign { item: usize, category: String },
  Unassign { item: usize },
  Edit { item: usize, text: String },
  Suggest { item: Option<usize> },
  Undo,
  Redo,
  Save,
  Quit,
  Name(String),
  Client(String),
  Day(String),
  Meal(String),
  Add(String),
  Next,
  Back,
  Summary,
}

impl Command {
  /// Parse one input line. Blank lines yield `None`.
  pub fn parse(line: &str) -> anyhow::Result<Option<Self>> {
    let line = line.trim();
    let (word, rest) = line
      .split_once(char::is_whitespace)
      .map(|(w, r)| (w, r.trim()))
      .unwrap_or((line, ""));

    let command = match word {
      "" => return Ok(None),
      "help" | "?" => Self::Help,
      "list" | "ls" => Self::List,
      "assign" | "a" => {
        let (item, category) = item_and_text(rest, "assign <n> <category>")?;
        Self::Assign { item, category }
      }
      "unassign" | "u" => Self::Unassign {
        item: item_number(rest)?,
      },
      "edit" | "e" => {
        let (item, text) = item_and_text(rest, "edit <n> <text>")?;
        Self::Edit { item, text }
      }
      "suggest" | "s" => Self::Suggest {
        item: (!rest.is_empty()).then(|| item_number(rest)).transpose()?,
      },
      "undo" | "z" => Self::Undo,
      "redo" | "y" => Self::Redo,
      "save" | "w" => Self::Save,
      "quit" | "q" | "exit" => Self::Quit,
      "name" => Self::Name(required(rest, "name <text>")?),
      "client" => Self::Client(rest.to_owned()),
      "day" => Self::Day(required(rest, "day <label>")?),
      "meal" => Self::Meal(required(rest, "meal <name>")?),
      "add" => Self::Add(required(rest, "add <ingredient>")?),
      "next" | "n" => Self::Next,
      "back" | "b" => Self::Back,
      "summary" => Self::Summary,
      other => bail!("unknown command {other:?}; type `help`"),
    };
    Ok(Some(command))
  }
}

fn item_number(s: &str) -> anyhow::Result<usize> {
  let n: usize = s
    .parse()
    .with_context(|| format!("expected an item number, got {s:?}"))?;
  if n == 0 {
    bail!("item numbers start at 1");
  }
  Ok(n)
}

fn item_and_text(rest: &str, usage: &str) -> anyhow::Result<(usize, String)> {
  let Some((item, text)) = rest.split_once(char::is_whitespace) else {
    bail!("usage: {usage}");
  };
  Ok((item_number(item)?, required(text.trim(), usage)?))
}

fn required(rest: &str, usage: &str) -> anyhow::Result<String> {
  if rest.is_empty() {
    bail!("usage: {usage}");
  }
  Ok(rest.to_owned())
}

// ─── Mode ─────────────────────────────────────────────────────────────────────

pub enum Mode {
  Categorize { session: Session, plan_id: Uuid },
  Create { wizard: Wizard<ConsoleNotifier> },
}

fn active_session(mode: &mut Mode) -> anyhow::Result<&mut Session> {
  if let Mode::Create { wizard } = mode
    && wizard.step() != Step::Categorize
  {
    bail!(
      "categorization is available on the categorize step (now on {})",
      wizard.step()
    );
  }
  Ok(match mode {
    Mode::Categorize { session, .. } => session,
    Mode::Create { wizard } => wizard.session_mut(),
  })
}

fn active_wizard(mode: &mut Mode) -> anyhow::Result<&mut Wizard<ConsoleNotifier>> {
  match mode {
    Mode::Create { wizard } => Ok(wizard),
    Mode::Categorize { .. } => bail!("only available while creating a plan"),
  }
}

/// The product shown as number `item` by [`write_partition`].
fn product_at(partition: &Partition, item: usize) -> anyhow::Result<ParsedProduct> {
  partition
    .products()
    .nth(item - 1)
    .cloned()
    .with_context(|| format!("no item {item}; the list has {}", partition.len()))
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// What the prompt loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Quit,
}

pub struct App<S, W> {
  store:     S,
  catalog:   Vec<Category>,
  suggester: KeywordSuggester,
  mode:      Mode,
  out:       W,
}

impl<S: PlanStore, W: Write> App<S, W> {
  pub fn new(store: S, catalog: Vec<Category>, min_score: i64, mode: Mode, out: W) -> Self {
    let suggester = KeywordSuggester::new(&catalog).with_min_score(min_score);
    Self {
      store,
      catalog,
      suggester,
      mode,
      out,
    }
  }

  #[cfg(test)]
  pub fn store(&self) -> &S { &self.store }

  #[cfg(test)]
  pub fn mode(&self) -> &Mode { &self.mode }

  #[cfg(test)]
  pub fn output(&self) -> &W { &self.out }

  /// Run one command. User mistakes come back as errors for the prompt
  /// loop to print; the session is left as it was.
  pub async fn handle(&mut self, command: Command) -> anyhow::Result<Flow> {
    match command {
      Command::Quit => return Ok(Flow::Quit),
      Command::Help => writeln!(self.out, "{HELP}")?,
      Command::List => self.print_state()?,
      Command::Assign { item, category } => self.assign(item, &category)?,
      Command::Unassign { item } => self.unassign(item)?,
      Command::Edit { item, text } => self.edit(item, &text).await?,
      Command::Suggest { item } => self.suggest(item)?,
      Command::Undo => self.travel(true)?,
      Command::Redo => self.travel(false)?,
      Command::Save => self.save().await?,
      Command::Name(name) => self.edit_plan(|p| p.name = name)?,
      Command::Client(client) => {
        let client = (!client.is_empty()).then_some(client);
        self.edit_plan(|p| p.client = client)?
      }
      Command::Day(label) => self.edit_plan(|p| p.days.push(DietDay::new(label)))?,
      Command::Meal(name) => self.edit_plan(|p| last_day(p).meals.push(Meal::new(name)))?,
      Command::Add(text) => {
        let parsed: ParsedProduct = parse_line(&text);
        let ingredient = Ingredient::new(parsed.name, parsed.quantity, parsed.unit);
        self.edit_plan(|p| last_meal(p).ingredients.push(ingredient))?
      }
      Command::Next => {
        let step = active_wizard(&mut self.mode)?.next()?;
        writeln!(self.out, "── {step} ──")?;
        self.print_state()?
      }
      Command::Back => {
        let step = active_wizard(&mut self.mode)?.back();
        writeln!(self.out, "── {step} ──")?;
        self.print_state()?
      }
      Command::Summary => {
        let summary = active_wizard(&mut self.mode)?.summary();
        write_summary(&mut self.out, &summary, &self.catalog)?
      }
    }
    Ok(Flow::Continue)
  }

  // ── Categorization ────────────────────────────────────────────────────────

  fn resolve_category(&self, input: &str) -> anyhow::Result<String> {
    if self.catalog.is_empty() {
      return Ok(input.to_owned());
    }
    let wanted = input.to_lowercase();
    self
      .catalog
      .iter()
      .find(|c| c.category_id == input || c.name.to_lowercase() == wanted)
      .map(|c| c.category_id.clone())
      .with_context(|| {
        let known: Vec<&str> = self.catalog.iter().map(|c| c.category_id.as_str()).collect();
        format!("unknown category {input:?}; known: {}", known.join(", "))
      })
  }

  fn assign(&mut self, item: usize, category: &str) -> anyhow::Result<()> {
    let category = self.resolve_category(category)?;
    let session = active_session(&mut self.mode)?;
    let product = product_at(session.partition(), item)?;
    if !session.assign(&category, &product) {
      bail!("{} could not be assigned", product.name);
    }
    self.print_state()
  }

  fn unassign(&mut self, item: usize) -> anyhow::Result<()> {
    let session = active_session(&mut self.mode)?;
    let product = product_at(session.partition(), item)?;
    if !session.unassign(&product) {
      writeln!(self.out, "{} is not categorized", product.name)?;
      return Ok(());
    }
    self.print_state()
  }

  async fn edit(&mut self, item: usize, text: &str) -> anyhow::Result<()> {
    let session = active_session(&mut self.mode)?;
    let old = product_at(session.partition(), item)?;
    let category = old.category_id.clone();
    let applied = session
      .edit_and_persist(&self.store, category.as_deref(), &old, parse_line(text))
      .await;
    if !applied {
      return Err(edit_refused(item, text, &old));
    }
    self.print_state()
  }

  fn suggest(&mut self, item: Option<usize>) -> anyhow::Result<()> {
    let session = active_session(&mut self.mode)?;
    let partition = session.partition();

    if let Some(item) = item {
      let product = product_at(partition, item)?;
      let ranked = self.suggester.rank(&product);
      if ranked.is_empty() {
        writeln!(self.out, "no suggestion for {}", product.name)?;
      }
      for (category_id, score) in ranked {
        writeln!(self.out, "  {category_id:<12} {score}")?;
      }
      return Ok(());
    }

    let mut any = false;
    for (n, product) in partition.uncategorized().iter().enumerate() {
      if let Some(category_id) = session.suggest(&self.suggester, product) {
        writeln!(self.out, "{:>4}. {product}  →  {category_id}", n + 1)?;
        any = true;
      }
    }
    if !any {
      writeln!(self.out, "no suggestions")?;
    }
    Ok(())
  }

  /// Undo (`back == true`) or redo in whatever history is active.
  fn travel(&mut self, back: bool) -> anyhow::Result<()> {
    let moved = match &mut self.mode {
      Mode::Categorize { session, .. } => {
        if back { session.undo() } else { session.redo() }
      }
      Mode::Create { wizard } if wizard.step() == Step::Categorize => {
        let session = wizard.session_mut();
        if back { session.undo() } else { session.redo() }
      }
      Mode::Create { wizard } => {
        if back { wizard.undo_plan()? } else { wizard.redo_plan()? }
      }
    };
    if !moved {
      writeln!(self.out, "nothing to {}", if back { "undo" } else { "redo" })?;
      return Ok(());
    }
    self.print_state()
  }

  async fn save(&mut self) -> anyhow::Result<()> {
    let saved = match &self.mode {
      Mode::Categorize { session, plan_id } => session.save(&self.store, *plan_id).await?,
      Mode::Create { wizard } => wizard.finish(&self.store).await?,
    };
    let products: usize = saved.values().map(Vec::len).sum();
    writeln!(
      self.out,
      "saved {products} product(s) in {} categor{}",
      saved.len(),
      if saved.len() == 1 { "y" } else { "ies" }
    )?;
    Ok(())
  }

  // ── Plan editing ──────────────────────────────────────────────────────────

  fn edit_plan(&mut self, edit: impl FnOnce(&mut DietPlan)) -> anyhow::Result<()> {
    if active_wizard(&mut self.mode)?.edit_plan(edit)? {
      self.print_state()?;
    }
    Ok(())
  }

  // ── Output ────────────────────────────────────────────────────────────────

  pub fn print_state(&mut self) -> anyhow::Result<()> {
    match &self.mode {
      Mode::Categorize { session, .. } => {
        write_partition(&mut self.out, session.partition(), &self.catalog)
      }
      Mode::Create { wizard } => match wizard.step() {
        Step::Basics | Step::Meals => write_plan(&mut self.out, wizard.plan()),
        Step::Categorize => {
          write_partition(&mut self.out, wizard.session().partition(), &self.catalog)
        }
        Step::Preview => write_summary(&mut self.out, &wizard.summary(), &self.catalog),
      },
    }
  }
}

/// The session logs why an edit was refused; the prompt only reports which.
fn edit_refused(item: usize, text: &str, old: &ParsedProduct) -> anyhow::Error {
  anyhow::anyhow!("edit refused: {text:?} could not replace item {item} ({})", old.name)
}

fn last_day(plan: &mut DietPlan) -> &mut DietDay {
  if plan.days.is_empty() {
    plan.days.push(DietDay::new("Dzień 1"));
  }
  let last = plan.days.len() - 1;
  &mut plan.days[last]
}

fn last_meal(plan: &mut DietPlan) -> &mut Meal {
  let day = last_day(plan);
  if day.meals.is_empty() {
    day.meals.push(Meal::new("Posiłek 1"));
  }
  let last = day.meals.len() - 1;
  &mut day.meals[last]
}

fn category_label<'a>(catalog: &'a [Category], category_id: &'a str) -> &'a str {
  catalog
    .iter()
    .find(|c| c.category_id == category_id)
    .map_or(category_id, |c| c.name.as_str())
}

/// Numbering follows [`Partition::products`], so it matches [`product_at`].
fn write_partition(
  out: &mut impl Write,
  partition: &Partition,
  catalog: &[Category],
) -> anyhow::Result<()> {
  let mut n = 0;
  writeln!(out, "Uncategorized ({}):", partition.uncategorized_count())?;
  for product in partition.uncategorized() {
    n += 1;
    writeln!(out, "{n:>4}. {product}")?;
  }
  for (category_id, products) in partition.categorized() {
    writeln!(
      out,
      "{} [{category_id}] ({}):",
      category_label(catalog, category_id),
      products.len()
    )?;
    for product in products {
      n += 1;
      writeln!(out, "{n:>4}. {product}")?;
    }
  }
  Ok(())
}

fn write_plan(out: &mut impl Write, plan: &DietPlan) -> anyhow::Result<()> {
  let name = if plan.name.is_empty() { "(unnamed)" } else { plan.name.as_str() };
  match &plan.client {
    Some(client) => writeln!(out, "{name} for {client}")?,
    None => writeln!(out, "{name}")?,
  }
  for day in &plan.days {
    writeln!(out, "  {}", day.label)?;
    for meal in &day.meals {
      writeln!(out, "    {}", meal.name)?;
      for ingredient in &meal.ingredients {
        writeln!(
          out,
          "      - {} {} {}",
          ingredient.name,
          nutriplan_core::product::format_quantity(ingredient.quantity),
          ingredient.unit
        )?;
      }
    }
  }
  Ok(())
}

fn write_summary(
  out: &mut impl Write,
  summary: &PlanSummary,
  catalog: &[Category],
) -> anyhow::Result<()> {
  writeln!(
    out,
    "{} day(s), {} meal(s), {} ingredient(s)",
    summary.days, summary.meals, summary.ingredients
  )?;
  for (category_id, count) in &summary.categories {
    writeln!(out, "  {:<20} {count}", category_label(catalog, category_id))?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use nutriplan_core::product::RawLineItem;
  use nutriplan_store_sqlite::SqliteStore;

  use super::*;

  fn catalog() -> Vec<Category> {
    vec![
      Category::new("dairy", "Nabiał").with_keywords(["mleko", "jogurt"]),
      Category::new("bakery", "Pieczywo").with_keywords(["chleb"]),
    ]
  }

  async fn categorizing(lines: &[&str]) -> (App<SqliteStore, Vec<u8>>, Uuid) {
    let raw: Vec<RawLineItem> = lines.iter().copied().map(RawLineItem::from).collect();
    let plan_id = Uuid::new_v4();
    let mode = Mode::Categorize {
      session: Session::new(&raw, ConsoleNotifier),
      plan_id,
    };
    let store = SqliteStore::open_in_memory().await.unwrap();
    (App::new(store, catalog(), 40, mode, Vec::new()), plan_id)
  }

  async fn creating() -> App<SqliteStore, Vec<u8>> {
    let mode = Mode::Create {
      wizard: Wizard::new(DietPlan::new(""), ConsoleNotifier),
    };
    let store = SqliteStore::open_in_memory().await.unwrap();
    App::new(store, catalog(), 40, mode, Vec::new())
  }

  async fn run(app: &mut App<SqliteStore, Vec<u8>>, line: &str) -> anyhow::Result<Flow> {
    let command = Command::parse(line)?.context("blank line")?;
    app.handle(command).await
  }

  fn session(app: &App<SqliteStore, Vec<u8>>) -> &Session {
    match app.mode() {
      Mode::Categorize { session, .. } => session,
      Mode::Create { wizard } => wizard.session(),
    }
  }

  // ── Parsing ───────────────────────────────────────────────────────────────

  #[test]
  fn parses_commands_and_aliases() {
    assert_eq!(
      Command::parse("assign 2 dairy").unwrap(),
      Some(Command::Assign {
        item:     2,
        category: "dairy".into(),
      })
    );
    assert_eq!(
      Command::parse("  e 1 mleko 1l ").unwrap(),
      Some(Command::Edit {
        item: 1,
        text: "mleko 1l".into(),
      })
    );
    assert_eq!(
      Command::parse("suggest").unwrap(),
      Some(Command::Suggest { item: None })
    );
    assert_eq!(
      Command::parse("s 3").unwrap(),
      Some(Command::Suggest { item: Some(3) })
    );
    assert_eq!(Command::parse("client").unwrap(), Some(Command::Client(String::new())));
    assert_eq!(Command::parse("   ").unwrap(), None);
  }

  #[test]
  fn rejects_malformed_commands() {
    assert!(Command::parse("frobnicate").is_err());
    assert!(Command::parse("assign x dairy").is_err());
    assert!(Command::parse("assign 0 dairy").is_err());
    assert!(Command::parse("assign 1").is_err());
    assert!(Command::parse("add").is_err());
  }

  // ── Categorize mode ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn assign_by_id_or_name_then_save() {
    let (mut app, plan_id) = categorizing(&["mleko 200ml", "chleb 1 szt"]).await;

    run(&mut app, "assign 1 dairy").await.unwrap();
    assert_eq!(session(&app).partition().uncategorized_count(), 1);
    assert!(run(&mut app, "save").await.is_err());

    // "chleb" is now item 1: the uncategorized pool is listed first.
    run(&mut app, "assign 1 pieczywo").await.unwrap();
    assert!(session(&app).can_proceed());
    run(&mut app, "save").await.unwrap();

    let saved = app.store().get_assignments(plan_id).await.unwrap();
    assert_eq!(saved["dairy"][0].name, "mleko");
    assert_eq!(saved["bakery"][0].name, "chleb");
    let out = String::from_utf8(app.output().clone()).unwrap();
    assert!(out.contains("saved 2 product(s) in 2 categories"));
  }

  #[tokio::test]
  async fn unknown_category_and_item_are_rejected() {
    let (mut app, _) = categorizing(&["mleko 200ml"]).await;
    assert!(run(&mut app, "assign 1 spices").await.is_err());
    assert!(run(&mut app, "assign 5 dairy").await.is_err());
    assert_eq!(session(&app).history().undo_depth(), 0);
  }

  #[tokio::test]
  async fn undo_and_redo_follow_the_session() {
    let (mut app, _) = categorizing(&["mleko 200ml", "jabłko"]).await;
    run(&mut app, "assign 1 dairy").await.unwrap();
    run(&mut app, "unassign 2").await.unwrap();
    assert_eq!(session(&app).partition().uncategorized_count(), 2);

    run(&mut app, "undo").await.unwrap();
    assert_eq!(session(&app).partition().bucket(&"dairy".to_owned()).len(), 1);
    run(&mut app, "redo").await.unwrap();
    assert!(session(&app).partition().categorized().is_empty());

    run(&mut app, "redo").await.unwrap();
    let out = String::from_utf8(app.output().clone()).unwrap();
    assert!(out.contains("nothing to redo"));
  }

  #[tokio::test]
  async fn edit_records_a_correction() {
    let (mut app, _) = categorizing(&["3 jaja"]).await;
    run(&mut app, "edit 1 jaja 3 szt").await.unwrap();

    let product = &session(&app).partition().uncategorized()[0];
    assert_eq!(product.name, "jaja");
    assert_eq!(product.unit, "szt");

    let corrections = app.store().list_corrections("3 jaja").await.unwrap();
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0].name, "jaja");
  }

  #[tokio::test]
  async fn suggestions_are_advisory() {
    let (mut app, _) = categorizing(&["mleko 200ml", "chleb 1 szt"]).await;
    run(&mut app, "suggest").await.unwrap();
    run(&mut app, "suggest 1").await.unwrap();

    assert_eq!(session(&app).partition().uncategorized_count(), 2);
    let out = String::from_utf8(app.output().clone()).unwrap();
    assert!(out.contains("→  dairy"));
    assert!(out.contains("→  bakery"));
  }

  #[tokio::test]
  async fn wizard_commands_need_create_mode() {
    let (mut app, _) = categorizing(&["mleko"]).await;
    assert!(run(&mut app, "next").await.is_err());
    assert!(run(&mut app, "name Redukcja").await.is_err());
    assert_eq!(run(&mut app, "quit").await.unwrap(), Flow::Quit);
  }

  // ── Create mode ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_walks_the_wizard_and_saves() {
    let mut app = creating().await;

    assert!(run(&mut app, "next").await.is_err());
    assert!(run(&mut app, "assign 1 dairy").await.is_err());

    run(&mut app, "name Redukcja").await.unwrap();
    run(&mut app, "next").await.unwrap();
    run(&mut app, "meal Śniadanie").await.unwrap();
    run(&mut app, "add mleko 200ml").await.unwrap();
    run(&mut app, "add chleb 2 szt").await.unwrap();
    run(&mut app, "next").await.unwrap();
    assert!(run(&mut app, "add jabłko").await.is_err());

    run(&mut app, "assign 1 dairy").await.unwrap();
    run(&mut app, "assign 1 bakery").await.unwrap();
    assert!(run(&mut app, "save").await.is_err());
    run(&mut app, "next").await.unwrap();
    run(&mut app, "save").await.unwrap();

    let Mode::Create { wizard } = app.mode() else {
      panic!("expected create mode");
    };
    assert_eq!(wizard.step(), Step::Preview);
    let plan_id = wizard.plan().plan_id;
    let stored = app.store().get_plan(plan_id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Redukcja");
    assert_eq!(stored.days[0].label, "Dzień 1");
    assert_eq!(stored.ingredient_count(), 2);
  }

  #[tokio::test]
  async fn plan_undo_outside_categorize_step() {
    let mut app = creating().await;
    run(&mut app, "name A").await.unwrap();
    run(&mut app, "name B").await.unwrap();
    run(&mut app, "undo").await.unwrap();

    let Mode::Create { wizard } = app.mode() else {
      panic!("expected create mode");
    };
    assert_eq!(wizard.plan().name, "A");
  }

  #[tokio::test]
  async fn plan_is_read_only_once_categorized() {
    let mut app = creating().await;
    run(&mut app, "name Redukcja").await.unwrap();
    run(&mut app, "next").await.unwrap();
    run(&mut app, "add mleko 200ml").await.unwrap();
    run(&mut app, "next").await.unwrap();
    run(&mut app, "assign 1 dairy").await.unwrap();
    run(&mut app, "next").await.unwrap();

    let err = run(&mut app, "undo").await.unwrap_err();
    assert!(err.to_string().contains("locked"));
    assert!(run(&mut app, "add chleb").await.is_err());
    run(&mut app, "save").await.unwrap();

    let Mode::Create { wizard } = app.mode() else {
      panic!("expected create mode");
    };
    let stored = app.store().get_plan(wizard.plan().plan_id).await.unwrap().unwrap();
    assert_eq!(stored.ingredient_count(), 1);
    let saved = app.store().get_assignments(stored.plan_id).await.unwrap();
    assert_eq!(saved["dairy"].len(), 1);
  }

  #[test]
  fn refused_edit_message_does_not_guess_the_cause() {
    let old: ParsedProduct = parse_line("chleb 1 szt");
    let err = edit_refused(2, "mleko 200ml", &old).to_string();
    assert_eq!(err, "edit refused: \"mleko 200ml\" could not replace item 2 (chleb)");
  }
}
