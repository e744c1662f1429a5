use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow, bail};

use ff_lineup_terminal::backend_fetch::backend_from_config;
use ff_lineup_terminal::config::AppConfig;
use ff_lineup_terminal::identity::SessionIdentity;
use ff_lineup_terminal::lineup::{LineupRow, RosterView};
use ff_lineup_terminal::percentiles::format_probability;
use ff_lineup_terminal::provider::spawn_provider;
use ff_lineup_terminal::state::{
    AppState, Delta, Phase, ProviderCommand, RegistrationStatus, apply_delta,
};

const WAIT_LIMIT: Duration = Duration::from_secs(60);

/// Prints every league's lineup for one username without the terminal UI.
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let username = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: lineup_dump <username>"))?;

    let config = AppConfig::from_env();
    let backend = backend_from_config(&config)?;
    eprintln!("backend: {}", config.backend_label());

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(backend, tx, cmd_rx);

    let mut state = AppState::new(Some(SessionIdentity::generate()));
    state.website = config.website;
    state.username_input = username;
    state.submit_username()?;
    pump(&mut state, &cmd_tx, &rx, |phase| {
        matches!(
            phase,
            Phase::RosterReady { .. }
                | Phase::RosterError { .. }
                | Phase::CatalogError { .. }
                | Phase::CatalogReady { selection: None }
        )
    })?;

    if let Phase::CatalogError { message } = &state.phase {
        bail!("{message}");
    }
    let leagues: Vec<String> = state
        .catalog
        .as_ref()
        .map(|catalog| catalog.names().map(str::to_string).collect())
        .unwrap_or_default();
    if leagues.is_empty() {
        println!("No leagues found.");
        return Ok(());
    }

    for (idx, league) in leagues.iter().enumerate() {
        if idx > 0 {
            state.select_league(league);
            pump(&mut state, &cmd_tx, &rx, |phase| {
                matches!(phase, Phase::RosterReady { .. } | Phase::RosterError { .. })
            })?;
        }
        match (&state.phase, &state.roster) {
            (Phase::RosterReady { .. }, Some(view)) => print_view(view),
            (Phase::RosterError { message, .. }, _) => println!("== {league} ==\n  {message}\n"),
            _ => println!("== {league} ==\n  no data\n"),
        }
    }

    for line in state.logs.iter().filter(|line| line.starts_with("[WARN]")) {
        eprintln!("{line}");
    }
    Ok(())
}

fn pump(
    state: &mut AppState,
    cmd_tx: &mpsc::Sender<ProviderCommand>,
    rx: &mpsc::Receiver<Delta>,
    done: impl Fn(&Phase) -> bool,
) -> Result<()> {
    let started = Instant::now();
    loop {
        for cmd in state.take_pending() {
            cmd_tx
                .send(cmd)
                .map_err(|_| anyhow!("provider thread stopped"))?;
        }
        if done(&state.phase) {
            return Ok(());
        }
        if let RegistrationStatus::Failed(reason) = &state.registration {
            bail!("{reason}");
        }
        let remaining = WAIT_LIMIT
            .checked_sub(started.elapsed())
            .ok_or_else(|| anyhow!("timed out waiting for backend"))?;
        match rx.recv_timeout(remaining) {
            Ok(delta) => apply_delta(state, delta),
            Err(mpsc::RecvTimeoutError::Timeout) => bail!("timed out waiting for backend"),
            Err(mpsc::RecvTimeoutError::Disconnected) => bail!("provider thread stopped"),
        }
    }
}

fn print_view(view: &RosterView) {
    println!("== {} ==", view.league);
    for row in &view.rows {
        println!("{}", format_row(row));
    }
    for group in &view.free_agents {
        if group.rows.is_empty() {
            continue;
        }
        println!("  -- free agents: {} --", group.position);
        for row in &group.rows {
            println!("{}", format_row(row));
        }
    }
    println!();
}

fn format_row(row: &LineupRow) -> String {
    let flex = row
        .flex
        .as_ref()
        .map(|f| format!("{} {}", f.color.hex, f.label))
        .unwrap_or_default();
    format!(
        "  {:<9} {:<24} {} {:<9} {:<18} stars {} | {} | P(>={:.0}) {}",
        row.entry.slot.label(),
        row.entry.name,
        row.position.color.hex,
        row.position.label,
        flex,
        row.stars,
        row.projection_label,
        row.threshold,
        format_probability(row.probability)
    )
}
