pub mod db;
pub mod overtime;
pub mod remote;
pub mod settings;
pub mod utils;

use anyhow::Context;
use db::Database;
use log::info;
use overtime::{LogNotifier, OvertimeDesk};
use settings::{desk_home, SettingsStore};

/// Headless host: loads settings, opens the local store, synchronizes once
/// and prints the rendered desk view as JSON.
pub fn run() -> anyhow::Result<()> {
    utils::logging::init();

    info!("Overtime desk starting up...");

    let home = desk_home()?;
    let settings_store = SettingsStore::new(home.join("settings.json"))?;
    let settings = settings_store.settings();
    let db_path = settings
        .database_path
        .clone()
        .unwrap_or_else(|| home.join("overtime.sqlite3"));

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(async move {
        let database = Database::new(db_path)?;
        let desk = OvertimeDesk::new(database, LogNotifier, settings.desk_options());
        desk.set_filter(settings.default_filter.clone()).await;
        desk.spawn_watcher().await;

        let refreshed = desk.refresh().await;
        let view = desk.view().await;
        desk.stop_watcher().await?;
        refreshed?;

        info!(
            "{} overtime configurations ({} shown), {} employees without one",
            view.rows.len(),
            view.visible_rows.len(),
            view.eligible_persons.len()
        );
        println!("{}", serde_json::to_string_pretty(&view)?);
        Ok::<(), anyhow::Error>(())
    })
}
