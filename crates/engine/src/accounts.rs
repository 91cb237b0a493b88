//! In-memory account store.
//!
//! Owns every known [`UserAccount`] and its [`Ledger`], keyed by username.
//! The store does no I/O: the session loads records into it and hands
//! mutated state to the sync coordinator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    EngineError, Ledger, ResultEngine,
    credentials::{hash_credential, verify_credential},
    util::{ensure_credential, ensure_goal},
};

/// A registered user.
///
/// `credential` is an Argon2 PHC string, never the plain password.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: String,
    pub credential: String,
    pub monthly_goal: i64,
}

#[derive(Debug)]
struct StoredUser {
    account: UserAccount,
    ledger: Ledger,
}

#[derive(Debug, Default)]
pub struct AccountStore {
    users: HashMap<String, StoredUser>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new account with an empty ledger.
    pub fn register(
        &mut self,
        id: &str,
        credential: &str,
        monthly_goal: i64,
    ) -> ResultEngine<&UserAccount> {
        if self.users.contains_key(id) {
            return Err(EngineError::DuplicateAccount(id.to_string()));
        }
        ensure_credential(credential)?;
        ensure_goal(monthly_goal)?;

        let account = UserAccount {
            id: id.to_string(),
            credential: hash_credential(credential)?,
            monthly_goal,
        };
        let stored = self.users.entry(id.to_string()).or_insert(StoredUser {
            account,
            ledger: Ledger::new(),
        });
        Ok(&stored.account)
    }

    pub fn authenticate(&self, id: &str, credential: &str) -> ResultEngine<&UserAccount> {
        let stored = self
            .users
            .get(id)
            .ok_or_else(|| EngineError::NoSuchAccount(id.to_string()))?;
        if !verify_credential(credential, &stored.account.credential)? {
            return Err(EngineError::WrongCredential(format!(
                "invalid credentials for {id}"
            )));
        }
        Ok(&stored.account)
    }

    pub fn update_goal(&mut self, id: &str, monthly_goal: i64) -> ResultEngine<()> {
        ensure_goal(monthly_goal)?;
        let stored = self
            .users
            .get_mut(id)
            .ok_or_else(|| EngineError::NoSuchAccount(id.to_string()))?;
        stored.account.monthly_goal = monthly_goal;
        Ok(())
    }

    /// Insert or refresh an account loaded from a cache or the remote store.
    ///
    /// A user already present keeps its ledger.
    pub fn insert(&mut self, account: UserAccount) {
        match self.users.get_mut(&account.id) {
            Some(stored) => stored.account = account,
            None => {
                self.users.insert(
                    account.id.clone(),
                    StoredUser {
                        account,
                        ledger: Ledger::new(),
                    },
                );
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.users.contains_key(id)
    }

    pub fn account(&self, id: &str) -> ResultEngine<&UserAccount> {
        self.users
            .get(id)
            .map(|stored| &stored.account)
            .ok_or_else(|| EngineError::NoSuchAccount(id.to_string()))
    }

    pub fn ledger(&self, id: &str) -> ResultEngine<&Ledger> {
        self.users
            .get(id)
            .map(|stored| &stored.ledger)
            .ok_or_else(|| EngineError::NoSuchAccount(id.to_string()))
    }

    pub fn ledger_mut(&mut self, id: &str) -> ResultEngine<&mut Ledger> {
        self.users
            .get_mut(id)
            .map(|stored| &mut stored.ledger)
            .ok_or_else(|| EngineError::NoSuchAccount(id.to_string()))
    }

    pub fn replace_ledger(&mut self, id: &str, ledger: Ledger) -> ResultEngine<()> {
        *self.ledger_mut(id)? = ledger;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_authenticate() {
        let mut store = AccountStore::new();
        let account = store.register("alice", "password", 30_000).unwrap().clone();
        assert_ne!(account.credential, "password");
        assert_eq!(account.monthly_goal, 30_000);

        assert_eq!(store.authenticate("alice", "password").unwrap(), &account);
        assert!(matches!(
            store.authenticate("alice", "nope"),
            Err(EngineError::WrongCredential(_))
        ));
        assert_eq!(
            store.authenticate("bob", "password"),
            Err(EngineError::NoSuchAccount("bob".to_string()))
        );
    }

    #[test]
    fn duplicate_registration_keeps_original_account() {
        let mut store = AccountStore::new();
        let original = store.register("alice", "password", 30_000).unwrap().clone();

        assert_eq!(
            store.register("alice", "other", 99_000),
            Err(EngineError::DuplicateAccount("alice".to_string()))
        );
        assert_eq!(store.account("alice").unwrap(), &original);
        assert!(store.authenticate("alice", "password").is_ok());
    }

    #[test]
    fn invalid_goal_is_rejected() {
        let mut store = AccountStore::new();
        assert!(matches!(
            store.register("alice", "password", 0),
            Err(EngineError::InvalidGoal(_))
        ));
        assert!(!store.contains("alice"));
    }

    #[test]
    fn update_goal_overwrites() {
        let mut store = AccountStore::new();
        store.register("alice", "password", 30_000).unwrap();
        store.update_goal("alice", 40_000).unwrap();
        store.update_goal("alice", 40_000).unwrap();
        assert_eq!(store.account("alice").unwrap().monthly_goal, 40_000);
        assert!(matches!(
            store.update_goal("alice", -1),
            Err(EngineError::InvalidGoal(_))
        ));
    }

    #[test]
    fn insert_keeps_existing_ledger() {
        let mut store = AccountStore::new();
        let account = store.register("alice", "password", 30_000).unwrap().clone();
        store.ledger_mut("alice").unwrap().apply_deposit(100, 1, 30).unwrap();

        store.insert(UserAccount {
            monthly_goal: 35_000,
            ..account
        });
        assert_eq!(store.ledger("alice").unwrap().total(), 100);
        assert_eq!(store.account("alice").unwrap().monthly_goal, 35_000);
    }
}
