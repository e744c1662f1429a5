use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::backend_fetch::{LeagueBackend, Registration, load_roster_bundle};
use crate::error::FetchError;
use crate::state::{Delta, ProviderCommand};

/// Runs backend calls off the UI thread until the command channel closes.
///
/// Roster fetches each get their own thread so a slow league never holds up a newer
/// selection; ordering is restored on the UI side by the generation token.
pub fn spawn_provider(
    backend: Arc<dyn LeagueBackend>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for cmd in cmd_rx {
            handle_command(&backend, &tx, cmd);
        }
    })
}

fn handle_command(backend: &Arc<dyn LeagueBackend>, tx: &Sender<Delta>, cmd: ProviderCommand) {
    match cmd {
        ProviderCommand::FetchLastRun => {
            let result = backend
                .last_run_info()
                .map(|info| info.runtime)
                .map_err(|err| FetchError::last_run(&err));
            let _ = tx.send(Delta::LastRunInfo(result));
        }
        ProviderCommand::Register {
            activation,
            identity,
            username,
            website,
        } => {
            let registration = Registration {
                name: username,
                website,
            };
            let result = backend
                .register_user(&identity, &registration)
                .map_err(|err| FetchError::registration(&err));
            let _ = tx.send(Delta::Registered { activation, result });
        }
        ProviderCommand::FetchCatalog {
            activation,
            identity,
        } => {
            let result = backend
                .fetch_catalog(&identity)
                .map_err(|err| FetchError::catalog(&err));
            let _ = tx.send(Delta::CatalogLoaded { activation, result });
        }
        ProviderCommand::FetchRoster {
            activation,
            generation,
            identity,
            league,
        } => {
            let backend = Arc::clone(backend);
            let tx = tx.clone();
            thread::spawn(move || {
                let mut warn = |msg: String| {
                    let _ = tx.send(Delta::Log(msg));
                };
                let result = load_roster_bundle(backend.as_ref(), &identity, &league, &mut warn)
                    .map_err(|err| FetchError::roster(&league, &err));
                let _ = tx.send(Delta::RosterLoaded {
                    activation,
                    generation,
                    league,
                    result,
                });
            });
        }
    }
}
