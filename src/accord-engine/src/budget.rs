//! Rolling per-agent spend caps.
//!
//! The window resets lazily: the first debit attempted at or after `window_start + window`
//! zeroes `spent` and restarts the window at the current time.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use serde::Serialize;

use crate::errors::{AccordError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgentBudget {
    pub daily_limit: U256,
    pub spent: U256,
    pub window_start: u64,
}

impl AgentBudget {
    fn window_elapsed(&self, now: u64, window: u64) -> bool {
        now >= self.window_start.saturating_add(window)
    }
}

#[derive(Debug, Clone)]
pub struct BudgetLedger {
    window: u64,
    budgets: HashMap<Address, AgentBudget>,
}

impl BudgetLedger {
    pub fn new(window: u64) -> Self {
        Self {
            window,
            budgets: HashMap::new(),
        }
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    pub fn set_daily_limit(&mut self, agent: Address, limit: U256) {
        self.budgets.entry(agent).or_default().daily_limit = limit;
    }

    pub fn budget(&self, agent: Address) -> AgentBudget {
        self.budgets.get(&agent).copied().unwrap_or_default()
    }

    /// Debit `amount`, resetting an elapsed window first. On failure nothing changes.
    pub fn check_and_debit(&mut self, agent: Address, amount: U256, now: u64) -> Result<()> {
        let mut budget = self.budget(agent);
        if budget.window_elapsed(now, self.window) {
            budget.spent = U256::ZERO;
            budget.window_start = now;
        }

        let new_spent = budget
            .spent
            .checked_add(amount)
            .filter(|total| *total <= budget.daily_limit)
            .ok_or(AccordError::BudgetExceeded {
                limit: budget.daily_limit,
                requested: amount,
                spent: budget.spent,
            })?;

        budget.spent = new_spent;
        self.budgets.insert(agent, budget);
        Ok(())
    }

    /// Remaining allowance as of `now`, reflecting a reset the next debit would perform.
    pub fn remaining(&self, agent: Address, now: u64) -> U256 {
        let budget = self.budget(agent);
        if budget.window_elapsed(now, self.window) {
            budget.daily_limit
        } else {
            budget.daily_limit.saturating_sub(budget.spent)
        }
    }

    /// Put back a snapshot taken before a debit that must be rolled back.
    pub(crate) fn restore(&mut self, agent: Address, snapshot: Option<AgentBudget>) {
        match snapshot {
            Some(budget) => {
                self.budgets.insert(agent, budget);
            }
            None => {
                self.budgets.remove(&agent);
            }
        }
    }

    pub(crate) fn snapshot(&self, agent: Address) -> Option<AgentBudget> {
        self.budgets.get(&agent).copied()
    }
}
