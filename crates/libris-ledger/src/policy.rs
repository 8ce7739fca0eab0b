// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lending policy: which debt limit is authoritative and how debt standing
//! is classified.

use libris_config::model::{LendingConfig, LimitPolicyConfig};
use libris_core::{Member, DEFAULT_DEBT_COST, MIN_DEBT_COST, SYSTEM_MAX_DEBT_LIMIT};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Which debt limit is checked when a member borrows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LimitPolicy {
    /// `min(member.maxDebt, debt_ceiling)`.
    #[default]
    Member,
    /// `debt_ceiling` only; a member's own `maxDebt` is informational.
    System,
}

impl From<LimitPolicyConfig> for LimitPolicy {
    fn from(config: LimitPolicyConfig) -> Self {
        match config {
            LimitPolicyConfig::Member => Self::Member,
            LimitPolicyConfig::System => Self::System,
        }
    }
}

/// Pricing and debt rules shared by the catalog, roster, and ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingPolicy {
    pub debt_ceiling: u32,
    pub limit: LimitPolicy,
    pub min_debt_cost: u32,
    pub default_debt_cost: u32,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            debt_ceiling: SYSTEM_MAX_DEBT_LIMIT,
            limit: LimitPolicy::default(),
            min_debt_cost: MIN_DEBT_COST,
            default_debt_cost: DEFAULT_DEBT_COST,
        }
    }
}

impl From<&LendingConfig> for LendingPolicy {
    fn from(config: &LendingConfig) -> Self {
        Self {
            debt_ceiling: config.debt_ceiling.min(SYSTEM_MAX_DEBT_LIMIT),
            limit: config.limit_policy.into(),
            // The configured minimum can raise the record floor, never lower it.
            min_debt_cost: config.min_debt_cost.max(MIN_DEBT_COST),
            default_debt_cost: config.default_debt_cost,
        }
    }
}

impl LendingPolicy {
    pub fn with_limit(mut self, limit: LimitPolicy) -> Self {
        self.limit = limit;
        self
    }

    /// The debt limit applied to `member` under this policy.
    pub fn effective_ceiling(&self, member: &Member) -> u32 {
        match self.limit {
            LimitPolicy::Member => member.max_debt.min(self.debt_ceiling),
            LimitPolicy::System => self.debt_ceiling,
        }
    }

    pub fn standing(&self, member: &Member) -> DebtStanding {
        DebtStanding::classify(member.debt, self.effective_ceiling(member))
    }
}

/// Coarse debt band shown next to a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DebtStanding {
    /// No debt.
    Clear,
    /// Below 50% of the ceiling.
    Low,
    /// Below 80% of the ceiling.
    Elevated,
    /// 80% of the ceiling or more.
    Critical,
}

impl DebtStanding {
    pub fn classify(debt: u32, ceiling: u32) -> Self {
        if debt == 0 {
            return Self::Clear;
        }
        // Integer percentages: debt/ceiling < 0.5 <=> 2*debt < ceiling.
        let debt = u64::from(debt);
        let ceiling = u64::from(ceiling);
        if debt * 2 < ceiling {
            Self::Low
        } else if debt * 5 < ceiling * 4 {
            Self::Elevated
        } else {
            Self::Critical
        }
    }
}
