use std::collections::VecDeque;

use crate::config::Website;
use crate::error::FetchError;
use crate::identity::SessionIdentity;
use crate::lineup::{LineupRow, RosterView};
use crate::roster::{LeagueCatalog, RosterBundle};

const MAX_LOGS: usize = 200;

/// Step size of the threshold control, in fantasy points.
pub const THRESHOLD_STEP: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    CatalogLoading,
    CatalogReady { selection: Option<String> },
    RosterLoading { league: String },
    RosterReady { league: String },
    RosterError { league: String, message: String },
    /// Terminal for the current activation.
    CatalogError { message: String },
}

impl Phase {
    fn accepts_league_selection(&self) -> bool {
        matches!(
            self,
            Self::CatalogReady { .. }
                | Self::RosterLoading { .. }
                | Self::RosterReady { .. }
                | Self::RosterError { .. }
        )
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::CatalogLoading | Self::RosterLoading { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationStatus {
    NotStarted,
    Pending { username: String },
    Done { username: String },
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub identity: Option<SessionIdentity>,
    pub phase: Phase,
    pub registration: RegistrationStatus,
    pub website: Website,
    pub username_input: String,
    pub input_active: bool,
    pub last_run: Option<String>,
    pub catalog: Option<LeagueCatalog>,
    pub selected_league: Option<String>,
    pub roster: Option<RosterView>,
    pub selected_row: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pending: VecDeque<ProviderCommand>,
    activation: u64,
    roster_generation: u64,
}

#[derive(Debug, Clone)]
pub enum Delta {
    LastRunInfo(Result<String, FetchError>),
    Registered {
        activation: u64,
        result: Result<(), FetchError>,
    },
    CatalogLoaded {
        activation: u64,
        result: Result<LeagueCatalog, FetchError>,
    },
    RosterLoaded {
        activation: u64,
        generation: u64,
        league: String,
        result: Result<RosterBundle, FetchError>,
    },
    Log(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    FetchLastRun,
    Register {
        activation: u64,
        identity: SessionIdentity,
        username: String,
        website: Website,
    },
    FetchCatalog {
        activation: u64,
        identity: SessionIdentity,
    },
    FetchRoster {
        activation: u64,
        generation: u64,
        identity: SessionIdentity,
        league: String,
    },
}

impl AppState {
    pub fn new(identity: Option<SessionIdentity>) -> Self {
        Self {
            identity,
            phase: Phase::Idle,
            registration: RegistrationStatus::NotStarted,
            website: Website::default(),
            username_input: String::new(),
            input_active: true,
            last_run: None,
            catalog: None,
            selected_league: None,
            roster: None,
            selected_row: 0,
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
            pending: VecDeque::new(),
            activation: 0,
            roster_generation: 0,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Commands queued by transitions, in issue order.
    pub fn take_pending(&mut self) -> Vec<ProviderCommand> {
        self.pending.drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn activation(&self) -> u64 {
        self.activation
    }

    pub fn roster_generation(&self) -> u64 {
        self.roster_generation
    }

    pub fn request_last_run(&mut self) {
        self.pending.push_back(ProviderCommand::FetchLastRun);
    }

    /// Registers the typed username with the backend. Success activates the
    /// league view.
    pub fn submit_username(&mut self) -> Result<(), FetchError> {
        let Some(identity) = self.identity.clone() else {
            self.push_log("[WARN] No session identity; registration not sent");
            return Err(FetchError::IdentityMissing);
        };
        let username = self.username_input.trim().to_string();
        if username.is_empty() {
            let err = FetchError::RegistrationFailed("Username is required".to_string());
            self.registration = RegistrationStatus::Failed(err.to_string());
            return Err(err);
        }

        self.activation += 1;
        self.reset_league_view();
        self.phase = Phase::Idle;
        self.input_active = false;
        self.registration = RegistrationStatus::Pending {
            username: username.clone(),
        };
        self.pending.push_back(ProviderCommand::Register {
            activation: self.activation,
            identity,
            username: username.clone(),
            website: self.website,
        });
        self.push_log(format!(
            "[INFO] Loading teams for {username} ({})",
            self.website.label()
        ));
        Ok(())
    }

    /// `Idle -> CatalogLoading`. Any earlier activation's results become stale.
    pub fn activate(&mut self) -> Result<(), FetchError> {
        let Some(identity) = self.identity.clone() else {
            self.push_log("[WARN] No session identity; league catalog not requested");
            return Err(FetchError::IdentityMissing);
        };
        self.activation += 1;
        self.reset_league_view();
        self.phase = Phase::CatalogLoading;
        self.pending.push_back(ProviderCommand::FetchCatalog {
            activation: self.activation,
            identity,
        });
        Ok(())
    }

    /// Starts a roster fetch for `league`, superseding any fetch in flight. The
    /// displayed bundle is cleared until the new one arrives.
    pub fn select_league(&mut self, league: &str) -> bool {
        if !self.phase.accepts_league_selection() {
            self.push_log(format!("[INFO] League selection ignored while {:?}", self.phase));
            return false;
        }
        let known = self
            .catalog
            .as_ref()
            .is_some_and(|catalog| catalog.contains_name(league));
        if !known {
            self.push_log(format!("[WARN] Unknown league: {league}"));
            return false;
        }
        let Some(identity) = self.identity.clone() else {
            return false;
        };

        self.roster_generation += 1;
        self.selected_league = Some(league.to_string());
        self.roster = None;
        self.selected_row = 0;
        self.phase = Phase::RosterLoading {
            league: league.to_string(),
        };
        self.pending.push_back(ProviderCommand::FetchRoster {
            activation: self.activation,
            generation: self.roster_generation,
            identity,
            league: league.to_string(),
        });
        true
    }

    pub fn select_next_league(&mut self) -> bool {
        self.step_league(1)
    }

    pub fn select_prev_league(&mut self) -> bool {
        self.step_league(-1)
    }

    pub fn reload_league(&mut self) -> bool {
        match self.selected_league.clone() {
            Some(league) => self.select_league(&league),
            None => false,
        }
    }

    fn step_league(&mut self, step: isize) -> bool {
        let Some(catalog) = self.catalog.as_ref() else {
            return false;
        };
        if catalog.is_empty() {
            return false;
        }
        let len = catalog.len() as isize;
        let current = self
            .selected_league
            .as_deref()
            .and_then(|name| catalog.position(name))
            .map(|idx| idx as isize)
            .unwrap_or(-step.signum());
        let next = (current + step).rem_euclid(len) as usize;
        let Some(name) = catalog.get(next).map(|l| l.name.clone()) else {
            return false;
        };
        self.select_league(&name)
    }

    pub fn selected_row(&self) -> Option<&LineupRow> {
        self.roster.as_ref()?.row(self.selected_row)
    }

    pub fn select_row_next(&mut self) {
        let count = self.roster.as_ref().map(RosterView::row_count).unwrap_or(0);
        if count > 0 {
            self.selected_row = (self.selected_row + 1).min(count - 1);
        }
    }

    pub fn select_row_prev(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    pub fn nudge_threshold(&mut self, delta: f64) {
        let idx = self.selected_row;
        if let Some(row) = self.roster.as_mut().and_then(|view| view.row_mut(idx)) {
            row.nudge_threshold(delta);
        }
    }

    pub fn toggle_website(&mut self) {
        self.website = self.website.toggle();
    }

    fn reset_league_view(&mut self) {
        self.catalog = None;
        self.selected_league = None;
        self.roster = None;
        self.selected_row = 0;
    }

    fn clamp_row_selection(&mut self) {
        let count = self.roster.as_ref().map(RosterView::row_count).unwrap_or(0);
        self.selected_row = self.selected_row.min(count.saturating_sub(1));
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::LastRunInfo(Ok(runtime)) => state.last_run = Some(runtime),
        Delta::LastRunInfo(Err(err)) => state.push_log(format!("[WARN] {err}")),
        Delta::Registered { activation, result } => {
            if activation != state.activation {
                state.push_log("[INFO] Discarded stale registration result");
                return;
            }
            let username = match &state.registration {
                RegistrationStatus::Pending { username } => username.clone(),
                _ => String::new(),
            };
            match result {
                Ok(()) => {
                    state.registration = RegistrationStatus::Done { username };
                    state.username_input.clear();
                    if let Err(err) = state.activate() {
                        state.push_log(format!("[WARN] {err}"));
                    }
                }
                Err(err) => {
                    state.push_log(format!("[WARN] {err}"));
                    state.registration = RegistrationStatus::Failed(err.to_string());
                    state.input_active = true;
                }
            }
        }
        Delta::CatalogLoaded { activation, result } => {
            if activation != state.activation || state.phase != Phase::CatalogLoading {
                state.push_log("[INFO] Discarded stale league catalog");
                return;
            }
            match result {
                Ok(catalog) => {
                    let selection = catalog.default_selection().map(str::to_string);
                    state.push_log(format!("[INFO] {} league(s) available", catalog.len()));
                    state.catalog = Some(catalog);
                    state.phase = Phase::CatalogReady {
                        selection: selection.clone(),
                    };
                    match selection {
                        Some(league) => {
                            state.select_league(&league);
                        }
                        None => state.push_log("[INFO] No leagues found for this user"),
                    }
                }
                Err(err) => {
                    state.push_log(format!("[WARN] {err}"));
                    state.phase = Phase::CatalogError {
                        message: err.to_string(),
                    };
                }
            }
        }
        Delta::RosterLoaded {
            activation,
            generation,
            league,
            result,
        } => {
            if activation != state.activation || generation != state.roster_generation {
                state.push_log(format!("[INFO] Discarded stale roster for {league}"));
                return;
            }
            match result {
                Ok(bundle) => {
                    state.roster = Some(RosterView::from_bundle(league.clone(), bundle));
                    state.clamp_row_selection();
                    state.phase = Phase::RosterReady { league };
                }
                Err(err) => {
                    state.push_log(format!("[WARN] {err}"));
                    state.roster = None;
                    state.selected_row = 0;
                    state.phase = Phase::RosterError {
                        league,
                        message: err.to_string(),
                    };
                }
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
