use crate::types::{AccountId, AudienceScope};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Decides whether a claimant falls inside a drop's audience
pub trait AudiencePolicy: Send + Sync {
    fn is_authorized(&self, scope: &AudienceScope, claimant: &AccountId) -> bool;
}

/// Named groups of accounts, typically loaded from configuration.
///
/// Public drops admit everyone. A restricted drop admits only members of its
/// group; an unknown group admits nobody.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudienceDirectory {
    groups: BTreeMap<String, BTreeSet<AccountId>>,
}

impl AudienceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group<I>(mut self, group: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = AccountId>,
    {
        self.groups
            .entry(group.into())
            .or_default()
            .extend(members);
        self
    }

    pub fn add_member(&mut self, group: impl Into<String>, account: AccountId) {
        self.groups.entry(group.into()).or_default().insert(account);
    }

    pub fn is_member(&self, group: &str, account: &AccountId) -> bool {
        self.groups
            .get(group)
            .is_some_and(|members| members.contains(account))
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }
}

impl AudiencePolicy for AudienceDirectory {
    fn is_authorized(&self, scope: &AudienceScope, claimant: &AccountId) -> bool {
        match scope {
            AudienceScope::Public => true,
            AudienceScope::Restricted { group } => self.is_member(group, claimant),
        }
    }
}
