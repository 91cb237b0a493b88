//! Core of the savings tracker.
//!
//! A user sets a monthly goal; the engine splits it into daily targets,
//! records deposits and derives progress, streaks and milestone badges.
//! Storage and transport stay outside: the engine talks to a [`LocalCache`]
//! and, optionally, a [`RemoteStore`].
//!
//! ```rust,no_run
//! use engine::{MemoryCache, SessionManager};
//!
//! # async fn demo() -> Result<(), engine::EngineError> {
//! let mut sessions = SessionManager::builder().cache(MemoryCache::new()).build();
//! sessions.register("alice", "s3cret", 30_000).await?;
//! let dashboard = sessions.deposit(7_500).await?;
//! assert_eq!(dashboard.percent_complete, 25);
//! # Ok(())
//! # }
//! ```

pub use accounts::{AccountStore, UserAccount};
pub use clock::{Clock, FixedClock, SystemClock, days_in_month};
pub use credentials::{hash_credential, verify_credential};
pub use dashboard::Dashboard;
pub use error::EngineError;
pub use ledger::{Ledger, LedgerSnapshot};
pub use metrics::{BADGE_BAND, BADGE_THRESHOLDS, Badge, BadgePolicy, crossed_badges, streak};
pub use session::{Session, SessionManager, SessionManagerBuilder};
pub use sync::{
    DEFAULT_REMOTE_TIMEOUT, LoadedUser, LocalCache, MemoryCache, RemoteAuth, RemoteStore,
    SyncCoordinator, USERS_NAMESPACE, account_key, ledger_key,
};
pub use util::{
    DEFAULT_MONTHLY_GOAL, MIN_MONTHLY_GOAL, normalize_username, parse_amount, parse_goal,
};

mod accounts;
mod clock;
mod credentials;
mod dashboard;
mod error;
mod ledger;
mod metrics;
pub mod scheduler;
mod session;
mod sync;
mod util;

pub(crate) type ResultEngine<T> = Result<T, EngineError>;
