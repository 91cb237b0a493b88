//! One read/write surface over the optional remote store and the local cache.
//!
//! Reads prefer the remote and refresh the cache with what it returns; any
//! remote failure falls back to the cache. Writes always land in the cache,
//! whatever the remote said. A cached ledger the remote has not acknowledged
//! is marked unsynced and pushed as a whole once the remote answers again,
//! so a deposit made offline is never overwritten by an older remote copy.
//! Remote failures are logged and swallowed here:
//! [`EngineError::RemoteUnreachable`] never leaves this module.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use api_types::{ledger::SavedData, user::UserRecord};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{EngineError, Ledger, ResultEngine, accounts::UserAccount};

/// Namespace of every key the engine writes to the local cache.
pub const USERS_NAMESPACE: &str = "users";

/// Bound on every remote call when none is configured.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(3);

pub fn account_key(id: &str) -> String {
    format!("{USERS_NAMESPACE}/{id}/account")
}

pub fn ledger_key(id: &str) -> String {
    format!("{USERS_NAMESPACE}/{id}/ledger")
}

/// Outcome of a register or login call that reached the remote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteAuth {
    Accepted(UserRecord),
    Rejected(String),
}

/// The remote authority. Transport failures must be reported as
/// [`EngineError::RemoteUnreachable`].
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn register(
        &self,
        id: &str,
        credential: &str,
        monthly_goal: i64,
    ) -> ResultEngine<RemoteAuth>;

    async fn authenticate(&self, id: &str, credential: &str) -> ResultEngine<RemoteAuth>;

    /// `Ok(None)` when the remote does not know `id`.
    async fn fetch_user(&self, id: &str) -> ResultEngine<Option<UserRecord>>;

    async fn record_deposit(&self, id: &str, amount: i64, date: NaiveDate) -> ResultEngine<()>;

    async fn update_account(&self, record: &UserRecord) -> ResultEngine<()>;
}

/// Durable key/value storage for serialized records.
pub trait LocalCache: Send {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, record: String) -> ResultEngine<()>;
}

/// Process-local cache, lost on exit.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, record: String) -> ResultEngine<()> {
        self.entries.insert(key.to_string(), record);
        Ok(())
    }
}

/// Ledger entry of the local cache.
#[derive(Debug, Serialize, Deserialize)]
struct CachedLedger {
    ledger: SavedData,
    /// Written locally but not acknowledged by the remote yet.
    #[serde(default)]
    unsynced: bool,
}

/// Result of the read path.
#[derive(Debug)]
pub struct LoadedUser {
    /// Goal reported by the remote, when the remote answered.
    pub remote_goal: Option<i64>,
    pub ledger: Ledger,
}

pub struct SyncCoordinator {
    cache: Box<dyn LocalCache>,
    remote: Option<Arc<dyn RemoteStore>>,
    timeout: Duration,
}

impl SyncCoordinator {
    pub fn new(cache: Box<dyn LocalCache>) -> Self {
        Self {
            cache,
            remote: None,
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Run a remote call under the configured timeout.
    ///
    /// Returns `None` when the remote could not be reached in time.
    async fn remote_call<T, F>(&self, op: &str, call: F) -> Option<ResultEngine<T>>
    where
        F: Future<Output = ResultEngine<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Err(EngineError::RemoteUnreachable(reason))) => {
                tracing::warn!("remote {op} failed: {reason}");
                None
            }
            Ok(result) => Some(result),
            Err(_) => {
                tracing::warn!("remote {op} timed out after {:?}", self.timeout);
                None
            }
        }
    }

    /// Register on the remote. `None` means the caller must fall back to the
    /// local store.
    pub async fn remote_register(
        &self,
        id: &str,
        credential: &str,
        monthly_goal: i64,
    ) -> ResultEngine<Option<RemoteAuth>> {
        let Some(remote) = self.remote.clone() else {
            return Ok(None);
        };
        self.remote_call("register", remote.register(id, credential, monthly_goal))
            .await
            .transpose()
    }

    pub async fn remote_authenticate(
        &self,
        id: &str,
        credential: &str,
    ) -> ResultEngine<Option<RemoteAuth>> {
        let Some(remote) = self.remote.clone() else {
            return Ok(None);
        };
        self.remote_call("authenticate", remote.authenticate(id, credential))
            .await
            .transpose()
    }

    /// Cached account for `id`, if any.
    pub fn load_account(&self, id: &str) -> ResultEngine<Option<UserAccount>> {
        let Some(raw) = self.cache.get(&account_key(id)) else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| EngineError::CacheCorrupt(format!("account {id}: {err}")))
    }

    pub fn save_account(&mut self, account: &UserAccount) -> ResultEngine<()> {
        let raw = serde_json::to_string(account)
            .map_err(|err| EngineError::Storage(err.to_string()))?;
        self.cache.set(&account_key(&account.id), raw)
    }

    /// Cached ledger of `id` and whether it holds changes the remote has not
    /// acknowledged. A missing entry is an empty, synced ledger.
    fn load_local_ledger(&self, id: &str, days_in_month: u32) -> ResultEngine<(Ledger, bool)> {
        let Some(raw) = self.cache.get(&ledger_key(id)) else {
            return Ok((Ledger::new(), false));
        };
        let cached: CachedLedger = serde_json::from_str(&raw)
            .map_err(|err| EngineError::CacheCorrupt(format!("ledger {id}: {err}")))?;
        Ok((Ledger::from_saved(cached.ledger, days_in_month)?, cached.unsynced))
    }

    fn save_ledger(&mut self, id: &str, ledger: &Ledger, unsynced: bool) -> ResultEngine<()> {
        let cached = CachedLedger {
            ledger: ledger.to_saved(),
            unsynced,
        };
        let raw = serde_json::to_string(&cached)
            .map_err(|err| EngineError::Storage(err.to_string()))?;
        self.cache.set(&ledger_key(id), raw)
    }

    /// Whether the cached ledger of `id` carries writes the remote missed.
    /// An unreadable entry counts as unsynced.
    fn has_unsynced(&self, id: &str) -> bool {
        self.cache.get(&ledger_key(id)).is_some_and(|raw| {
            serde_json::from_str::<CachedLedger>(&raw).map_or(true, |cached| cached.unsynced)
        })
    }

    /// Clear the unsynced mark once the remote has the ledger. The data is
    /// already on disk, so a failure here only costs a later re-push.
    fn mark_synced(&mut self, id: &str, ledger: &Ledger) {
        if let Err(err) = self.save_ledger(id, ledger, false) {
            tracing::warn!("could not mark ledger of {id} as synced: {err}");
        }
    }

    /// Replace the remote copy of the account with `ledger`.
    async fn push(&self, remote: &dyn RemoteStore, account: &UserAccount, ledger: &Ledger) -> bool {
        let record = UserRecord {
            username: account.id.clone(),
            monthly_goal: account.monthly_goal,
            saved_data: ledger.to_saved(),
        };
        match self.remote_call("update", remote.update_account(&record)).await {
            Some(Ok(())) => true,
            Some(Err(err)) => {
                tracing::warn!("remote rejected update for {}: {err}", account.id);
                false
            }
            None => false,
        }
    }

    /// Read path.
    ///
    /// Local writes the remote never acknowledged are pushed first and the
    /// local copy is kept. Otherwise the remote copy wins when reachable and
    /// refreshes the cache, and the cache is used when it is not. Only a
    /// corrupt cache entry with no remote copy to replace it is reported, as
    /// [`EngineError::CacheCorrupt`].
    pub async fn read(
        &mut self,
        account: &UserAccount,
        days_in_month: u32,
    ) -> ResultEngine<LoadedUser> {
        let id = account.id.as_str();
        let local = self.load_local_ledger(id, days_in_month);

        let Some(remote) = self.remote.clone() else {
            let (ledger, _) = local?;
            return Ok(LoadedUser {
                remote_goal: None,
                ledger,
            });
        };

        if let Ok((ledger, true)) = &local {
            if self.push(remote.as_ref(), account, ledger).await {
                tracing::info!("pushed offline changes of {id} to remote");
                self.mark_synced(id, ledger);
            } else {
                tracing::warn!("remote unreachable, keeping unsynced local ledger of {id}");
            }
            return Ok(LoadedUser {
                remote_goal: None,
                ledger: ledger.clone(),
            });
        }

        let fetched = self.remote_call("fetch", remote.fetch_user(id)).await;
        match fetched {
            Some(Ok(Some(record))) => match Ledger::from_saved(record.saved_data, days_in_month) {
                Ok(mut ledger) => {
                    if let Ok((cached, _)) = &local {
                        ledger.merge_peak(cached);
                    }
                    self.save_ledger(id, &ledger, false)?;
                    tracing::debug!("loaded {id} from remote");
                    return Ok(LoadedUser {
                        remote_goal: Some(record.monthly_goal),
                        ledger,
                    });
                }
                Err(err) => tracing::warn!("remote ledger for {id} rejected: {err}"),
            },
            Some(Ok(None)) => tracing::debug!("remote does not know {id}"),
            Some(Err(err)) => tracing::warn!("remote fetch for {id} failed: {err}"),
            None => tracing::warn!("remote unreachable, using local cache for {id}"),
        }

        let (ledger, _) = local?;
        Ok(LoadedUser {
            remote_goal: None,
            ledger,
        })
    }

    /// Write a deposit.
    ///
    /// The ledger is journaled to the cache as unsynced before the remote is
    /// called, so a failed cache write leaves both sides untouched. If
    /// earlier writes never reached the remote, the whole ledger is pushed
    /// instead of the single deposit.
    pub async fn write_deposit(
        &mut self,
        account: &UserAccount,
        ledger: &Ledger,
        amount: i64,
        date: NaiveDate,
    ) -> ResultEngine<()> {
        let id = account.id.as_str();
        let Some(remote) = self.remote.clone() else {
            return self.save_ledger(id, ledger, false);
        };

        let backlog = self.has_unsynced(id);
        self.save_ledger(id, ledger, true)?;

        let synced = if backlog {
            self.push(remote.as_ref(), account, ledger).await
        } else {
            match self
                .remote_call("deposit", remote.record_deposit(id, amount, date))
                .await
            {
                Some(Ok(())) => true,
                Some(Err(err)) => {
                    tracing::warn!("remote rejected deposit for {id}: {err}");
                    false
                }
                None => false,
            }
        };
        if synced {
            self.mark_synced(id, ledger);
        }
        Ok(())
    }

    /// Write the whole account (goal update, target generation), journaled
    /// to the cache before the remote is called.
    pub async fn write_account(
        &mut self,
        account: &UserAccount,
        ledger: &Ledger,
    ) -> ResultEngine<()> {
        let id = account.id.as_str();
        let Some(remote) = self.remote.clone() else {
            self.save_account(account)?;
            return self.save_ledger(id, ledger, false);
        };

        self.save_account(account)?;
        self.save_ledger(id, ledger, true)?;
        if self.push(remote.as_ref(), account, ledger).await {
            self.mark_synced(id, ledger);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_share_the_users_namespace() {
        assert_eq!(account_key("alice"), "users/alice/account");
        assert_eq!(ledger_key("alice"), "users/alice/ledger");
    }

    fn alice() -> UserAccount {
        UserAccount {
            id: "alice".to_string(),
            credential: "$argon2id$stub".to_string(),
            monthly_goal: 30_000,
        }
    }

    #[test]
    fn account_round_trips_through_cache() {
        let mut sync = SyncCoordinator::new(Box::new(MemoryCache::new()));
        let account = alice();
        sync.save_account(&account).unwrap();
        assert_eq!(sync.load_account("alice").unwrap(), Some(account));
        assert_eq!(sync.load_account("bob").unwrap(), None);
    }

    #[test]
    fn garbage_account_is_corrupt() {
        let mut cache = MemoryCache::new();
        cache.set(&account_key("alice"), "{not json".to_string()).unwrap();
        let sync = SyncCoordinator::new(Box::new(cache));
        assert!(matches!(
            sync.load_account("alice"),
            Err(EngineError::CacheCorrupt(_))
        ));
    }

    #[tokio::test]
    async fn local_only_read_of_unknown_user_is_empty() {
        let mut sync = SyncCoordinator::new(Box::new(MemoryCache::new()));
        assert!(!sync.has_remote());
        let loaded = sync.read(&alice(), 30).await.unwrap();
        assert_eq!(loaded.ledger, Ledger::new());
        assert_eq!(loaded.remote_goal, None);
    }

    #[tokio::test]
    async fn corrupt_ledger_is_reported() {
        let mut cache = MemoryCache::new();
        cache
            .set(
                &ledger_key("alice"),
                r#"{"ledger":{"total":5,"days":{},"targets":[]},"unsynced":false}"#.to_string(),
            )
            .unwrap();
        let mut sync = SyncCoordinator::new(Box::new(cache));
        assert!(matches!(
            sync.read(&alice(), 30).await,
            Err(EngineError::CacheCorrupt(_))
        ));
    }

    #[tokio::test]
    async fn local_only_writes_are_never_pending() {
        let mut sync = SyncCoordinator::new(Box::new(MemoryCache::new()));
        let mut ledger = Ledger::new();
        ledger.apply_deposit(400, 2, 30).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 9, 2).unwrap();

        sync.write_deposit(&alice(), &ledger, 400, date).await.unwrap();
        assert!(!sync.has_unsynced("alice"));
        assert_eq!(sync.read(&alice(), 30).await.unwrap().ledger, ledger);
    }

    #[test]
    fn unreadable_ledger_counts_as_unsynced() {
        let mut cache = MemoryCache::new();
        cache.set(&ledger_key("alice"), "{oops".to_string()).unwrap();
        let sync = SyncCoordinator::new(Box::new(cache));
        assert!(sync.has_unsynced("alice"));
        assert!(!sync.has_unsynced("bob"));
    }
}
