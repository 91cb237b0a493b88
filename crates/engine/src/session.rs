//! The session manager: the entry point a front-end talks to.
//!
//! It authenticates a user, keeps track of who is logged in and scopes every
//! ledger operation to that user. State is loaded and persisted through the
//! [`SyncCoordinator`]; derived values come back as a [`Dashboard`].

use std::{sync::Arc, time::Duration};

use chrono::Datelike;
use rand::{RngCore, SeedableRng, rngs::StdRng};

use crate::{
    Dashboard, EngineError, Ledger, ResultEngine,
    accounts::{AccountStore, UserAccount},
    clock::{Clock, SystemClock, days_in_month, month_key},
    credentials::hash_credential,
    metrics::{Badge, BadgePolicy, crossed_badges},
    scheduler,
    sync::{LocalCache, MemoryCache, RemoteAuth, RemoteStore, SyncCoordinator},
    util::{
        DEFAULT_MONTHLY_GOAL, ensure_amount, ensure_credential, ensure_goal, normalize_username,
    },
};

/// Who is using the tracker right now.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    LoggedOut,
    LoggedIn(String),
}

/// Owns the session, the account store and the sync coordinator.
///
/// Every operation takes `&mut self`, so a session never has two operations
/// in flight.
pub struct SessionManager {
    session: Session,
    accounts: AccountStore,
    sync: SyncCoordinator,
    clock: Box<dyn Clock>,
    rng: Box<dyn RngCore + Send>,
    badge_policy: BadgePolicy,
}

impl SessionManager {
    /// Return a builder for `SessionManager`. Help to build the struct.
    pub fn builder() -> SessionManagerBuilder {
        SessionManagerBuilder::default()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_user(&self) -> Option<&str> {
        match &self.session {
            Session::LoggedIn(id) => Some(id),
            Session::LoggedOut => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.current_user().is_some()
    }

    fn active_user(&self) -> ResultEngine<String> {
        self.current_user()
            .map(ToString::to_string)
            .ok_or_else(|| EngineError::NoActiveSession("log in first".to_string()))
    }

    /// Create an account and log it in.
    ///
    /// An existing username fails with [`EngineError::DuplicateAccount`] and
    /// leaves the existing account untouched. The remote store only answers
    /// yes or no, so any refusal from a reachable remote is reported as
    /// [`EngineError::DuplicateAccount`]; its message goes to the log.
    pub async fn register(
        &mut self,
        username: &str,
        credential: &str,
        monthly_goal: i64,
    ) -> ResultEngine<Dashboard> {
        let id = normalize_username(username)?;
        ensure_credential(credential)?;
        ensure_goal(monthly_goal)?;

        self.hydrate_account(&id);
        if self.accounts.contains(&id) {
            return Err(EngineError::DuplicateAccount(id));
        }

        let monthly_goal = match self.sync.remote_register(&id, credential, monthly_goal).await? {
            Some(RemoteAuth::Rejected(message)) => {
                tracing::debug!("remote refused to register {id}: {message}");
                return Err(EngineError::DuplicateAccount(id));
            }
            Some(RemoteAuth::Accepted(record)) if ensure_goal(record.monthly_goal).is_ok() => {
                record.monthly_goal
            }
            _ => monthly_goal,
        };

        let account = self.accounts.register(&id, credential, monthly_goal)?.clone();
        self.sync.save_account(&account)?;
        tracing::info!("registered {id} with a monthly goal of {monthly_goal}");

        self.session = Session::LoggedIn(id.clone());
        self.load_ledger(&id).await?;
        self.dashboard_with(&id, Vec::new())
    }

    /// Check a credential pair and log the user in.
    ///
    /// A reachable remote decides; the local store is consulted only when the
    /// remote cannot be reached.
    pub async fn login(&mut self, username: &str, credential: &str) -> ResultEngine<Dashboard> {
        let id = normalize_username(username)?;
        ensure_credential(credential)?;
        self.hydrate_account(&id);

        match self.sync.remote_authenticate(&id, credential).await? {
            Some(RemoteAuth::Accepted(record)) => {
                let known_goal = self.accounts.account(&id).map(|account| account.monthly_goal);
                let monthly_goal = match ensure_goal(record.monthly_goal) {
                    Ok(()) => record.monthly_goal,
                    Err(err) => {
                        tracing::warn!("ignoring remote goal for {id}: {err}");
                        known_goal.unwrap_or(DEFAULT_MONTHLY_GOAL)
                    }
                };
                let stored = match self.accounts.authenticate(&id, credential) {
                    Ok(account) => account.credential.clone(),
                    Err(_) => hash_credential(credential)?,
                };
                let account = UserAccount {
                    id: id.clone(),
                    credential: stored,
                    monthly_goal,
                };
                self.sync.save_account(&account)?;
                self.accounts.insert(account);
                tracing::debug!("{id} authenticated by remote");
            }
            Some(RemoteAuth::Rejected(message)) => {
                return Err(EngineError::WrongCredential(message));
            }
            None => {
                self.accounts.authenticate(&id, credential)?;
                tracing::debug!("{id} authenticated locally");
            }
        }

        self.session = Session::LoggedIn(id.clone());
        self.load_ledger(&id).await?;
        self.dashboard_with(&id, Vec::new())
    }

    pub fn logout(&mut self) {
        if let Session::LoggedIn(id) = std::mem::take(&mut self.session) {
            tracing::info!("{id} logged out");
        }
    }

    /// Record `amount` on today's date for the logged-in user.
    ///
    /// The returned dashboard carries the badges this deposit reached. A
    /// threshold rewarded earlier in the month is not rewarded again, even
    /// if a goal change pushed progress back below it. Nothing changes in
    /// memory unless the deposit reached the local cache.
    pub async fn deposit(&mut self, amount: i64) -> ResultEngine<Dashboard> {
        let id = self.active_user()?;
        ensure_amount(amount)?;

        let today = self.clock.today();
        if !self.accounts.ledger(&id)?.is_for(today) {
            self.load_ledger(&id).await?;
        }

        let account = self.accounts.account(&id)?.clone();
        let goal = account.monthly_goal;
        let mut ledger = self.accounts.ledger(&id)?.clone();
        let before = ledger.percent_complete(goal)?;
        let rewarded = ledger.peak_percent().unwrap_or(before);
        let total = ledger.apply_deposit(amount, today.day(), days_in_month(today))?;
        let after = ledger.percent_complete(goal)?;
        let badges = crossed_badges(rewarded, after, self.badge_policy);
        ledger.raise_peak(after);

        self.sync.write_deposit(&account, &ledger, amount, today).await?;
        self.accounts.replace_ledger(&id, ledger)?;
        tracing::info!("{id} saved {amount} on day {}, total {total}", today.day());

        for badge in &badges {
            tracing::info!("{id}: {badge}");
        }
        self.dashboard_with(&id, badges)
    }

    /// Change the monthly goal. The target schedule of the month is kept.
    pub async fn update_goal(&mut self, monthly_goal: i64) -> ResultEngine<Dashboard> {
        let id = self.active_user()?;
        ensure_goal(monthly_goal)?;

        let mut account = self.accounts.account(&id)?.clone();
        account.monthly_goal = monthly_goal;
        let ledger = self.accounts.ledger(&id)?.clone();
        self.sync.write_account(&account, &ledger).await?;
        self.accounts.update_goal(&id, monthly_goal)?;
        tracing::info!("{id} changed monthly goal to {monthly_goal}");

        self.dashboard_with(&id, Vec::new())
    }

    /// Reload the logged-in user through the read path.
    pub async fn refresh(&mut self) -> ResultEngine<Dashboard> {
        let id = self.active_user()?;
        self.load_ledger(&id).await?;
        self.dashboard_with(&id, Vec::new())
    }

    /// Current dashboard, from memory. Once the month turns over it still
    /// shows the old month until the next [`Self::refresh`] or deposit.
    pub fn dashboard(&self) -> ResultEngine<Dashboard> {
        let id = self.active_user()?;
        self.dashboard_with(&id, Vec::new())
    }

    fn dashboard_with(&self, id: &str, badges: Vec<Badge>) -> ResultEngine<Dashboard> {
        Dashboard::build(
            self.accounts.account(id)?,
            self.accounts.ledger(id)?,
            self.clock.today(),
            badges,
        )
    }

    /// Pull a cached account into the store. A corrupt record is treated as
    /// absent.
    fn hydrate_account(&mut self, id: &str) {
        if self.accounts.contains(id) {
            return;
        }
        match self.sync.load_account(id) {
            Ok(Some(account)) => self.accounts.insert(account),
            Ok(None) => {}
            Err(err) => tracing::warn!("ignoring cached account for {id}: {err}"),
        }
    }

    /// Load the ledger of the current month for `id`.
    ///
    /// A corrupt cache or a ledger left over from an earlier month is
    /// replaced by an empty one, and the target schedule is generated the
    /// first time a month is seen. Anything created here is persisted before
    /// returning.
    async fn load_ledger(&mut self, id: &str) -> ResultEngine<()> {
        let today = self.clock.today();
        let days_in_month = days_in_month(today);
        let account = self.accounts.account(id)?.clone();
        let loaded = self.sync.read(&account, days_in_month).await;
        let (remote_goal, mut ledger, mut dirty) = match loaded {
            Ok(loaded) => (loaded.remote_goal, loaded.ledger, false),
            Err(EngineError::CacheCorrupt(reason)) => {
                tracing::warn!("cached ledger for {id} is corrupt ({reason}), starting over");
                (None, Ledger::for_month(today), true)
            }
            Err(err) => return Err(err),
        };

        if !ledger.is_for(today) {
            match ledger.month().map(str::to_owned) {
                Some(previous) => {
                    tracing::info!("{id}: {previous} is over, starting {}", month_key(today));
                    ledger = Ledger::for_month(today);
                }
                None => {
                    ledger.stamp_month(today);
                }
            }
            dirty = true;
        }

        if let Some(goal) = remote_goal
            && goal != self.accounts.account(id)?.monthly_goal
        {
            match self.accounts.update_goal(id, goal) {
                Ok(()) => self.sync.save_account(self.accounts.account(id)?)?,
                Err(err) => tracing::warn!("ignoring remote goal for {id}: {err}"),
            }
        }

        if !ledger.targets_initialized() {
            let goal = self.accounts.account(id)?.monthly_goal;
            ledger.set_targets(scheduler::generate(goal, days_in_month, &mut *self.rng)?);
            tracing::info!("generated {days_in_month} daily targets for {id}");
            dirty = true;
        }

        self.accounts.replace_ledger(id, ledger)?;
        if dirty {
            let account = self.accounts.account(id)?.clone();
            let ledger = self.accounts.ledger(id)?.clone();
            self.sync.write_account(&account, &ledger).await?;
        }
        Ok(())
    }
}

/// The builder for `SessionManager`.
///
/// Unset collaborators default to an in-memory cache, no remote, the system
/// clock and an entropy-seeded RNG.
#[derive(Default)]
pub struct SessionManagerBuilder {
    cache: Option<Box<dyn LocalCache>>,
    remote: Option<Arc<dyn RemoteStore>>,
    clock: Option<Box<dyn Clock>>,
    rng: Option<Box<dyn RngCore + Send>>,
    remote_timeout: Option<Duration>,
    badge_policy: BadgePolicy,
}

impl SessionManagerBuilder {
    pub fn cache(mut self, cache: impl LocalCache + 'static) -> Self {
        self.cache = Some(Box::new(cache));
        self
    }

    pub fn remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    pub fn remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = Some(timeout);
        self
    }

    pub fn badge_policy(mut self, policy: BadgePolicy) -> Self {
        self.badge_policy = policy;
        self
    }

    pub fn build(self) -> SessionManager {
        let cache = self
            .cache
            .unwrap_or_else(|| Box::new(MemoryCache::new()));
        let mut sync = SyncCoordinator::new(cache);
        if let Some(remote) = self.remote {
            sync = sync.with_remote(remote);
        }
        if let Some(timeout) = self.remote_timeout {
            sync = sync.with_timeout(timeout);
        }

        SessionManager {
            session: Session::LoggedOut,
            accounts: AccountStore::new(),
            sync,
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
            rng: self
                .rng
                .unwrap_or_else(|| Box::new(StdRng::from_entropy())),
            badge_policy: self.badge_policy,
        }
    }
}
