use crate::output::Output;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use owo_colors::OwoColorize;
use watchlist_sync_config::{Config, CredentialStore, PathManager, SyncSettings};
use watchlist_sync_core::{ActionKind, ReportedItem, SyncOrchestrator, SyncReport, UnmatchedFilm};

pub async fn run_sync(dry_run: bool, output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");

    let settings = load_settings()?;
    tracing::debug!("Resolved settings: {:?}", settings);

    let orchestrator = SyncOrchestrator::from_settings(&settings)
        .map_err(|e| eyre!("{}", e))?
        .with_dry_run(dry_run);

    if output.is_human() {
        output.info(format!(
            "Syncing Letterboxd user '{}' to Plex (Letterboxd lists can take a while to load)...",
            settings.letterboxd_username
        ));
    }

    let report = orchestrator.sync().await.wrap_err("Sync failed")?;

    if output.is_human() {
        print_report(&report, output);
    } else {
        let value = serde_json::to_value(&report).wrap_err("Failed to serialize sync report")?;
        output.json(&value);
    }

    Ok(())
}

fn load_settings() -> Result<SyncSettings> {
    let paths = PathManager::new().map_err(|e| eyre!("{}", e))?;

    let config_file = paths.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    let credentials_file = paths.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store
        .load()
        .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;

    SyncSettings::from_env(&config, &cred_store).map_err(|e| eyre!("{}", e))
}

fn describe(item: &ReportedItem) -> String {
    let mut line = match item.year {
        Some(year) => format!("{} ({})", item.title, year),
        None => item.title.clone(),
    };
    if let Some(id) = &item.external_id {
        line.push_str(&format!(" [{}]", id));
    }
    line
}

fn print_items(heading: &str, items: &[ReportedItem], output: &Output) {
    if items.is_empty() {
        return;
    }
    output.println(format!("{} ({}):", heading.bold(), items.len()));
    for item in items {
        output.println(format!("  - {}", describe(item)));
    }
}

fn print_report(report: &SyncReport, output: &Output) {
    let (removed_heading, added_heading) = if report.dry_run {
        ("Would remove from Plex watchlist", "Would add to Plex watchlist")
    } else {
        ("Removed from Plex watchlist", "Added to Plex watchlist")
    };

    output.println("");
    print_items(removed_heading, &report.removed, output);
    print_items(added_heading, &report.added, output);

    output.println("");
    output.println(format!("  Already on Plex watchlist: {}", report.already_present));
    output.println(format!("  Skipped (already watched): {}", report.skipped_watched.len()));
    output.println(format!("  Only on Plex (left alone): {}", report.plex_only));

    for failed in &report.failed {
        let verb = match failed.action {
            ActionKind::Remove => "remove",
            ActionKind::Add => "add",
        };
        output.warn(format!("Could not {} {}: {}", verb, describe(&failed.item), failed.error));
    }

    if !report.unmatched.is_empty() {
        output.println("");
        output.println(format!("{}", "The following films could not be synced:".yellow()));
        output.println(unmatched_table(&report.unmatched).to_string());
        output.println("");
        output.println("This can be for a few reasons, e.g.:");
        output.println("  - The film is considered a TV show on Plex Discover");
        output.println("  - The film is upcoming or unconfirmed and so not yet available on Plex Discover");
        output.println("  - The film has no IMDb or TMDB id on Letterboxd");
    }

    if !report.plex_lookup_failed.is_empty() {
        output.println("");
        output.println(format!(
            "{}",
            "The following Plex watchlist entries could not be looked up and were only checked for removal by title and year:"
                .yellow()
        ));
        output.println(unmatched_table(&report.plex_lookup_failed).to_string());
    }

    output.println("");
    let summary = format!(
        "{} {} removed, {} added, {} unmatched, {} Plex lookups failed, {} failed in {:.1}s",
        if report.dry_run { "Dry run complete:" } else { "Sync complete:" },
        report.removed.len(),
        report.added.len(),
        report.unmatched.len(),
        report.plex_lookup_failed.len(),
        report.failed.len(),
        report.duration_secs
    );
    if report.has_problems() {
        output.warn(summary);
    } else {
        output.success(summary);
    }
}

fn unmatched_table(items: &[UnmatchedFilm]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Year").add_attribute(Attribute::Bold),
            Cell::new("IMDb ID").add_attribute(Attribute::Bold),
            Cell::new("Reason").add_attribute(Attribute::Bold),
        ]);

    for unmatched in items {
        table.add_row(vec![
            Cell::new(&unmatched.film.title),
            Cell::new(unmatched.film.year.map(|y| y.to_string()).unwrap_or_default()),
            Cell::new(unmatched.film.external_id.as_deref().unwrap_or("-")),
            Cell::new(unmatched.reason.to_string()).fg(Color::Yellow),
        ]);
    }
    table
}
