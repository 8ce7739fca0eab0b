// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Roster: member records and their accrued debt.
//!
//! Debt is only changed through [`Roster::charge_debt`] and
//! [`Roster::credit_debt`]. Charging enforces the member's effective ceiling
//! under the active [`LendingPolicy`] and emits a `tracing::warn` once the
//! resulting debt reaches 80% of it.

use std::collections::HashMap;

use libris_core::{LibrisError, Member, MemberId, MemberPatch, NewMember, ResourceKind};
use tracing::warn;

use crate::policy::{DebtStanding, LendingPolicy};
use crate::stats::DebtSummary;

/// Owns every member record, in insertion order.
#[derive(Debug, Clone)]
pub struct Roster {
    members: HashMap<MemberId, Member>,
    order: Vec<MemberId>,
    policy: LendingPolicy,
}

impl Roster {
    pub fn new(policy: &LendingPolicy) -> Self {
        Self {
            members: HashMap::new(),
            order: Vec::new(),
            policy: *policy,
        }
    }

    /// Build a roster from stored records, rejecting duplicate ids.
    pub fn from_members(members: Vec<Member>, policy: &LendingPolicy) -> Result<Self, LibrisError> {
        let mut roster = Self::new(policy);
        for member in members {
            member.validate()?;
            if roster.members.contains_key(&member.id) {
                return Err(LibrisError::Validation(format!(
                    "duplicate member id `{}`",
                    member.id
                )));
            }
            roster.order.push(member.id.clone());
            roster.members.insert(member.id.clone(), member);
        }
        Ok(roster)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, member_id: &MemberId) -> Option<&Member> {
        self.members.get(member_id)
    }

    pub fn require(&self, member_id: &MemberId) -> Result<&Member, LibrisError> {
        self.members.get(member_id).ok_or_else(|| member_id.into())
    }

    /// All members in insertion order.
    pub fn list(&self) -> impl Iterator<Item = &Member> + '_ {
        self.order.iter().filter_map(|id| self.members.get(id))
    }

    /// Members whose name contains `search` (case-insensitive), sorted by name.
    /// A blank search matches everyone.
    pub fn find_by_name(&self, search: &str) -> std::vec::IntoIter<&Member> {
        let needle = search.trim().to_lowercase();
        let mut members: Vec<&Member> = self
            .members
            .values()
            .filter(|m| needle.is_empty() || m.name.to_lowercase().contains(&needle))
            .collect();
        members.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        members.into_iter()
    }

    pub fn effective_ceiling(&self, member: &Member) -> u32 {
        self.policy.effective_ceiling(member)
    }

    pub fn standing(&self, member: &Member) -> DebtStanding {
        self.policy.standing(member)
    }

    /// Add `amount` to the member's debt. Returns the new debt.
    pub fn charge_debt(&mut self, member_id: &MemberId, amount: u32) -> Result<u32, LibrisError> {
        let policy = self.policy;
        let member = self.get_mut(member_id)?;
        let ceiling = policy.effective_ceiling(member);
        let new_debt = member.debt.saturating_add(amount);
        if new_debt > ceiling {
            return Err(LibrisError::OverLimit {
                member_id: member_id.clone(),
                debt: member.debt,
                requested: amount,
                ceiling,
            });
        }
        member.debt = new_debt;

        if u64::from(new_debt) * 5 >= u64::from(ceiling) * 4 {
            warn!(
                member_id = %member_id,
                debt = new_debt,
                ceiling,
                "member approaching debt ceiling (80%+)"
            );
        }
        Ok(new_debt)
    }

    /// Subtract `amount` from the member's debt, never below zero. Returns the new debt.
    pub fn credit_debt(&mut self, member_id: &MemberId, amount: u32) -> Result<u32, LibrisError> {
        let member = self.get_mut(member_id)?;
        member.debt = member.debt.saturating_sub(amount);
        Ok(member.debt)
    }

    /// A member may be deleted only when they owe nothing.
    pub fn can_delete(&self, member_id: &MemberId) -> Result<bool, LibrisError> {
        Ok(self.require(member_id)?.debt == 0)
    }

    /// Register a member with a fresh id and no debt.
    pub fn insert(&mut self, new: NewMember) -> Result<&Member, LibrisError> {
        let member = new.into_member(MemberId::generate());
        member.validate()?;

        let id = member.id.clone();
        self.order.push(id.clone());
        self.members.insert(id.clone(), member);
        self.require(&id)
    }

    /// Edit contact details or `maxDebt`. `debt` may only be echoed back unchanged.
    pub fn update(&mut self, member_id: &MemberId, patch: MemberPatch) -> Result<&Member, LibrisError> {
        let current = self.require(member_id)?;
        if let Some(id) = &patch.id {
            if id != member_id {
                return Err(LibrisError::Validation("member id cannot be changed".into()));
            }
        }
        if let Some(debt) = patch.debt {
            if debt != current.debt {
                return Err(LibrisError::Validation(
                    "debt is managed by lending and cannot be set directly".into(),
                ));
            }
        }

        let mut member = current.clone();
        if let Some(name) = patch.name {
            member.name = name.trim().to_string();
        }
        if patch.email.is_some() {
            member.email = patch.email;
        }
        if patch.phone.is_some() {
            member.phone = patch.phone;
        }
        if let Some(max_debt) = patch.max_debt {
            member.max_debt = max_debt;
        }
        member.validate()?;

        let slot = self.get_mut(member_id)?;
        *slot = member;
        Ok(&*slot)
    }

    /// Remove a member who owes nothing.
    pub fn remove(&mut self, member_id: &MemberId) -> Result<Member, LibrisError> {
        let member = self.require(member_id)?;
        if member.debt > 0 {
            return Err(LibrisError::DeleteBlocked {
                kind: ResourceKind::Members,
                id: member_id.to_string(),
                reason: format!("member still owes {}", member.debt),
            });
        }
        self.order.retain(|id| id != member_id);
        self.members
            .remove(member_id)
            .ok_or_else(|| member_id.into())
    }

    pub fn summary(&self) -> DebtSummary {
        DebtSummary::collect(self.list())
    }

    fn get_mut(&mut self, member_id: &MemberId) -> Result<&mut Member, LibrisError> {
        self.members.get_mut(member_id).ok_or_else(|| member_id.into())
    }
}
