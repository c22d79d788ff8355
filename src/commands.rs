use std::io::{BufRead, Write};
use std::path::PathBuf;
use harvest::catalog::{self, QueryCatalog};
use harvest::collector::{HttpPageSource, PageProgress, StopReason};
use harvest::config::{self, HarvestConfig};
use harvest::session::{ClearOutcome, CollectReport, Session, SessionOptions};
use harvest::staging::StagedPreview;
use harvest::storage::{ArtifactStore, ClearReport, MigrateReport, QueryTable, Table};
use harvest::ui::{self, Icons, PageBar, Spinner};
use owo_colors::OwoColorize;

/// Resolved settings shared by every command
pub struct Context {
    pub config: HarvestConfig,
    pub config_path: PathBuf,
    pub database: PathBuf,
}

impl Context {
    fn open_store(&self) -> anyhow::Result<ArtifactStore> {
        config::ensure_db_dir(&self.database)?;
        Ok(ArtifactStore::open(&self.database)?)
    }

    /// Build a session over the HTTP source.
    ///
    /// Without an API key the session still opens; collection then fails
    /// with the remote's rejection.
    fn open_session(&self, require_key: bool) -> anyhow::Result<Session> {
        let api_key = match self.config.api_key() {
            Ok(key) => key,
            Err(e) if require_key => return Err(e),
            Err(e) => {
                ui::warn(&format!("{}; collection will fail", e));
                String::new()
            }
        };
        let source = HttpPageSource::new(
            &self.config.api.base_url,
            &api_key,
            self.config.api.timeout(),
        )?;

        config::ensure_db_dir(&self.database)?;
        let session = Session::new(
            &self.database,
            Box::new(source),
            SessionOptions::from(&self.config),
        )?;
        Ok(session)
    }
}

pub fn run_init(ctx: &Context, force: bool, api_key: Option<String>) -> anyhow::Result<()> {
    let mut config = ctx.config.clone();
    if api_key.is_some() {
        config.api.api_key = api_key;
    }
    if config.database.is_none() {
        config.database = Some(ctx.database.to_string_lossy().to_string());
    }

    config::write_config(&ctx.config_path, &config, force)?;
    ctx.open_store()?;

    ui::success("Initialized harvest");
    ui::status(Icons::GEAR, "Config", &ctx.config_path.display().to_string());
    ui::status(Icons::DATABASE, "Database", &ctx.database.display().to_string());
    Ok(())
}

pub fn run_collect(ctx: &Context, category: &str, migrate: bool) -> anyhow::Result<()> {
    let mut session = ctx.open_session(true)?;

    ui::header(&format!("Collecting {}", category));
    let report = collect_with_progress(&mut session, category, ctx.config.collect.max_pages)?;
    print_collect_report(&report);

    if migrate {
        let report = session.migrate()?;
        print_migrate_report(&report);
    } else if report.staged.artifacts > 0 {
        ui::info("Note", "staged rows are discarded on exit; pass --migrate to persist them");
    }
    Ok(())
}

pub fn run_queries(json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(catalog::entries())?);
    } else {
        ui::section(&format!(" {} questions ", catalog::entries().len()));
        println!("{}", ui::catalog_table(catalog::entries()));
    }
    Ok(())
}

pub fn run_query(ctx: &Context, key: &str, json: bool) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let entry = catalog::find(key).ok_or_else(|| harvest::Error::UnknownQuery(key.to_string()))?;

    if !json {
        ui::status(Icons::SEARCH, &format!("Query {}", entry.number), entry.question);
    }
    let table = QueryCatalog::new(&store).run_entry(entry)?;
    print_table(&table, json)
}

pub fn run_show(ctx: &Context, table: &str, limit: usize, json: bool) -> anyhow::Result<()> {
    let table: Table = table.parse()?;
    let store = ctx.open_store()?;

    if !json {
        ui::status(table_icon(table), "Table", table.name());
    }
    let rows = store.table_rows(table, limit)?;
    print_table(&rows, json)
}

pub fn run_stats(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let stats = store.stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    ui::header(&format!("Harvest Statistics ({})", ctx.database.display()));
    println!(
        "{}",
        ui::stats_table(&[
            ("Artifacts", &stats.artifacts.to_string()),
            ("Media rows", &stats.media.to_string()),
            ("Color rows", &stats.colors.to_string()),
        ])
    );
    Ok(())
}

/// One-shot clear: confirm with `--yes` or an interactive prompt
pub fn run_clear(ctx: &Context, yes: bool) -> anyhow::Result<()> {
    let confirmed = confirm_clear(yes, || {
        ui::warn("This deletes every collected artifact, media row and color row.");
        print!("Type 'yes' to confirm: ");
        std::io::stdout().flush()?;
        console::Term::stdout().read_line()
    })?;

    if !confirmed {
        ui::info("Clear", "cancelled, nothing deleted");
        return Ok(());
    }

    let mut store = ctx.open_store()?;
    let spinner = Spinner::new("Deleting rows and compacting the database...");
    let report = store.clear_all();
    spinner.finish_and_clear();
    print_clear_report(&report?);
    Ok(())
}

/// `--yes` skips the prompt; otherwise only an explicit "yes" confirms
fn confirm_clear<F>(yes: bool, ask: F) -> std::io::Result<bool>
where
    F: FnOnce() -> std::io::Result<String>,
{
    if yes {
        return Ok(true);
    }
    Ok(ask()?.trim().eq_ignore_ascii_case("yes"))
}

pub fn run_serve(ctx: &Context, port: u16) -> anyhow::Result<()> {
    let session = ctx.open_session(false)?;
    ui::status(Icons::DATABASE, "Database", &ctx.database.display().to_string());

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(harvest::server::start_server(port, session))
}

const SHELL_HELP: &str = "\
Commands:
  categories            list collectable categories
  collect <category>    fetch a category into the staged batch
  staged [limit]        staged counts and leading rows (default 3)
  migrate               persist the staged batch
  queries               list catalog questions
  query <key|number>    run a catalog question
  show <table> [limit]  preview metadata, media or colors
  stats                 row counts in the database
  clear                 delete all data (run twice to confirm)
  help                  this message
  exit                  leave the shell";

/// Interactive session: staged rows survive between commands
pub fn run_shell(ctx: &Context) -> anyhow::Result<()> {
    let mut session = ctx.open_session(false)?;
    let max_pages = ctx.config.collect.max_pages;

    ui::header("Harvest shell");
    ui::status(Icons::DATABASE, "Database", &session.database_path().display().to_string());
    println!("{}", ui::dim("Type 'help' for commands."));

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("harvest> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };
        let rest: Vec<&str> = parts.collect();
        if command != "clear" {
            session.cancel_clear();
        }

        let result = match command {
            "exit" | "quit" => break,
            "help" | "?" => {
                println!("{}", SHELL_HELP);
                Ok(())
            }
            "categories" => {
                for category in session.categories() {
                    println!("  {}", ui::key(category));
                }
                Ok(())
            }
            "collect" if !rest.is_empty() => {
                let category = rest.join(" ");
                collect_with_progress(&mut session, &category, max_pages)
                    .map(|report| print_collect_report(&report))
            }
            "staged" => {
                let limit = rest.first().and_then(|l| l.parse().ok()).unwrap_or(3);
                print_staged(&session.staged().preview(limit))
            }
            "migrate" => session
                .migrate()
                .map(|report| print_migrate_report(&report))
                .map_err(Into::into),
            "queries" => run_queries(false),
            "query" if !rest.is_empty() => {
                let key = rest.join(" ");
                session
                    .run_query(&key)
                    .map_err(anyhow::Error::from)
                    .and_then(|table| print_table(&table, false))
            }
            "show" if !rest.is_empty() => rest[0]
                .parse::<Table>()
                .map_err(anyhow::Error::from)
                .and_then(|table| {
                    let limit = rest.get(1).and_then(|l| l.parse().ok()).unwrap_or(20);
                    session.preview(table, limit).map_err(Into::into)
                })
                .and_then(|rows| print_table(&rows, false)),
            "stats" => session.stats().map_err(Into::into).map(|stats| {
                ui::summary_row("Artifacts", &stats.artifacts.to_string());
                ui::summary_row("Media rows", &stats.media.to_string());
                ui::summary_row("Color rows", &stats.colors.to_string());
            }),
            "clear" => session.clear().map_err(Into::into).map(|outcome| match outcome {
                ClearOutcome::Armed => {
                    ui::warn("Run 'clear' again to delete all data; any other command cancels.")
                }
                ClearOutcome::Cleared(report) => print_clear_report(&report),
            }),
            other => {
                Err(anyhow::anyhow!("unknown or incomplete command '{}' (try 'help')", other))
            }
        };

        if let Err(e) = result {
            ui::error(&e.to_string());
        }
    }
    Ok(())
}

fn collect_with_progress(
    session: &mut Session,
    category: &str,
    max_pages: u32,
) -> anyhow::Result<CollectReport> {
    let bar = PageBar::new(category, max_pages);
    let report = session.collect_with(category, &mut |progress: PageProgress| bar.update(progress));
    bar.finish_and_clear();
    Ok(report?)
}

fn print_collect_report(report: &CollectReport) {
    match &report.stop {
        StopReason::RemoteUnavailable(message) => {
            ui::error(&format!("API error: {}", message));
            ui::warn(&format!(
                "Kept {} {} records fetched before the failure",
                report.records, report.category
            ));
        }
        StopReason::Exhausted | StopReason::PageCap => {
            ui::success(&format!("Collected {} {} records.", report.records, report.category));
        }
    }
    ui::summary_row("Requests:", &report.requests.to_string());
    ui::summary_row("Stopped:", &report.stop.to_string());
    ui::summary_row(
        &format!("{} Staged:", Icons::PACKAGE),
        &report.staged.to_string(),
    );
}

fn print_staged(preview: &StagedPreview) -> anyhow::Result<()> {
    ui::status(Icons::PACKAGE, "Staged", &preview.counts.to_string());
    print_rows("artifact_metadata", &preview.artifacts)?;
    print_rows("artifact_media", &preview.media)?;
    print_rows("artifact_colors", &preview.colors)
}

fn print_rows<T: serde::Serialize>(label: &str, rows: &[T]) -> anyhow::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    ui::section(&format!(" {} ", label));
    for row in rows {
        println!("  {}", serde_json::to_string(row)?);
    }
    Ok(())
}

fn print_migrate_report(report: &MigrateReport) {
    ui::success("Data migrated successfully!");
    println!(
        "{}",
        ui::stats_table(&[
            (
                "Metadata",
                &format!("{} inserted, {} ignored", report.artifacts.inserted, report.artifacts.skipped),
            ),
            (
                "Media",
                &format!("{} inserted, {} ignored", report.media.inserted, report.media.skipped),
            ),
            (
                "Colors",
                &format!("{} inserted, {} skipped", report.colors.inserted, report.colors.skipped),
            ),
        ])
    );
}

fn print_clear_report(report: &ClearReport) {
    ui::success("All data cleared.");
    ui::summary_row(
        &format!("{} Deleted:", Icons::DEL),
        &format!(
            "{} artifacts, {} media rows, {} colors",
            report.artifacts, report.media, report.colors
        ),
    );
}

fn print_table(table: &QueryTable, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&table.to_records())?);
        return Ok(());
    }

    if table.is_empty() && table.columns.is_empty() {
        println!("∅ No results.");
        return Ok(());
    }
    println!("{}", ui::query_table(table));
    println!(
        "{}",
        format!("{} row(s)", table.len()).style(ui::theme().muted)
    );
    Ok(())
}

fn table_icon(table: Table) -> &'static str {
    match table {
        Table::Metadata => Icons::SCROLL,
        Table::Media => Icons::FRAME,
        Table::Colors => Icons::PALETTE,
    }
}
