//! Dashboard loading sequence.
//!
//! A load resolves the active profile id, fetches the profile, then refreshes
//! matches. Every load takes a generation token up front and only writes its
//! result if no newer load has started since, so a slow earlier sequence can
//! never replace the view or the stored identity of a later one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::gateway::GrantGateway;
use crate::models::{MatchResult, Profile};
use crate::resolver::{decide_identity, Resolution};
use crate::routes::Route;
use crate::store::IdentityStore;

/// Number of ranked matches requested per refresh.
pub const MAX_MATCHES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub profile_id: String,
    pub profile: Profile,
    pub matches: Vec<MatchResult>,
}

impl DashboardData {
    /// Matches in the order the gateway ranked them, with one-based ranks.
    pub fn ranked(&self) -> impl Iterator<Item = (usize, &MatchResult)> {
        self.matches
            .iter()
            .enumerate()
            .map(|(index, result)| (index + 1, result))
    }

    pub fn view_grant(&self, grant_id: &str) -> Route {
        Route::GrantDetail {
            grant_id: grant_id.to_string(),
            profile_id: Some(self.profile_id.clone()),
        }
    }

    pub fn can_generate_packet(&self) -> bool {
        !self.matches.is_empty()
    }

    /// `None` while there is nothing to put in a packet.
    pub fn generate_packet(&self) -> Option<Route> {
        self.can_generate_packet().then(|| Route::Packet {
            profile_id: self.profile_id.clone(),
            grant_ids: self.grant_ids(),
        })
    }

    fn grant_ids(&self) -> Vec<String> {
        self.matches
            .iter()
            .map(|result| result.grant.id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    Loading,
    Ready(DashboardData),
    Failed { message: String },
    RedirectToOnboarding,
}

impl DashboardView {
    /// The single way out of a failed load.
    pub fn recovery(&self) -> Option<Route> {
        match self {
            DashboardView::Failed { .. } | DashboardView::RedirectToOnboarding => {
                Some(Route::Onboarding)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load started before this one finished; its result was dropped.
    Superseded,
    /// Same navigation input as the last request; nothing was fetched.
    Unchanged,
}

pub struct Dashboard<'a> {
    gateway: &'a dyn GrantGateway,
    store: &'a dyn IdentityStore,
    generation: AtomicU64,
    requested: Mutex<Option<Option<String>>>,
    view: Mutex<DashboardView>,
}

impl<'a> Dashboard<'a> {
    pub fn new(gateway: &'a dyn GrantGateway, store: &'a dyn IdentityStore) -> Self {
        Self {
            gateway,
            store,
            generation: AtomicU64::new(0),
            requested: Mutex::new(None),
            view: Mutex::new(DashboardView::Loading),
        }
    }

    pub fn view(&self) -> DashboardView {
        lock(&self.view).clone()
    }

    /// Re-runs the sequence only when the navigation input differs from the
    /// last one requested.
    pub async fn navigate(&self, navigation: Option<&str>) -> LoadOutcome {
        let key = normalize(navigation);
        if lock(&self.requested).as_ref() == Some(&key) {
            return LoadOutcome::Unchanged;
        }
        self.load(key.as_deref()).await
    }

    /// Runs the full resolve, profile, matches sequence once.
    pub async fn load(&self, navigation: Option<&str>) -> LoadOutcome {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *lock(&self.requested) = Some(normalize(navigation));
        *lock(&self.view) = DashboardView::Loading;

        let view = match self.run(token, navigation).await {
            Some(view) => view,
            None => return self.superseded(token),
        };

        if !self.is_current(token) {
            return self.superseded(token);
        }
        *lock(&self.view) = view;
        LoadOutcome::Applied
    }

    async fn run(&self, token: u64, navigation: Option<&str>) -> Option<DashboardView> {
        let decision = match decide_identity(navigation, self.store).await {
            Ok(decision) => decision,
            Err(err) => return Some(failed(err)),
        };
        if !self.is_current(token) {
            return None;
        }

        let profile_id = match decision.commit(self.store).await {
            Ok(Resolution::Resolved(id)) => id,
            Ok(Resolution::RedirectToOnboarding) => {
                info!("no active profile, redirecting to onboarding");
                return Some(DashboardView::RedirectToOnboarding);
            }
            Err(err) => return Some(failed(err)),
        };
        if !self.is_current(token) {
            return None;
        }

        let profile = match self.gateway.get_profile(&profile_id).await {
            Ok(profile) => profile,
            Err(err) => return Some(failed(err)),
        };
        if !self.is_current(token) {
            return None;
        }

        let matches = match self.gateway.refresh_matches(&profile_id, MAX_MATCHES).await {
            Ok(matches) => matches,
            Err(err) => return Some(failed(err)),
        };

        info!(profile_id = %profile_id, matches = matches.len(), "dashboard loaded");
        Some(DashboardView::Ready(DashboardData {
            profile_id,
            profile,
            matches,
        }))
    }

    fn is_current(&self, token: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == token
    }

    fn superseded(&self, token: u64) -> LoadOutcome {
        debug!(token, "discarding result of superseded dashboard load");
        LoadOutcome::Superseded
    }
}

fn failed(err: impl std::fmt::Display) -> DashboardView {
    warn!(error = %err, "dashboard load failed");
    DashboardView::Failed {
        message: err.to_string(),
    }
}

fn normalize(navigation: Option<&str>) -> Option<String> {
    navigation
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
