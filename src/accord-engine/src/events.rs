//! Audit events emitted by successful state transitions.

use alloy_primitives::{Address, B256, U256};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CoordinationEvent {
    IntentProposed {
        intent_hash: B256,
        proposer: Address,
        coordination_type: B256,
        participants: Vec<Address>,
        expiry: u64,
    },
    IntentAccepted {
        intent_hash: B256,
        participant: Address,
        accepted_count: usize,
    },
    IntentReady {
        intent_hash: B256,
    },
    IntentExecuted {
        intent_hash: B256,
        executor: Address,
    },
    IntentCancelled {
        intent_hash: B256,
        cancelled_by: Address,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutorEvent {
    BoundedExecuted {
        intent_hash: B256,
        agent: Address,
        nonce: u64,
        target: Address,
        asset: Address,
        amount: U256,
        policy_epoch: u64,
    },
    PolicyUpdateQueued {
        root: B256,
        activates_at: u64,
        queued_by: Address,
    },
    PolicyActivated {
        root: B256,
        epoch: u64,
    },
    PolicyVetoed {
        root: B256,
        reason: String,
        vetoed_by: Address,
    },
    BudgetSet {
        agent: Address,
        daily_limit: U256,
    },
    GuardianChanged {
        previous: Address,
        guardian: Address,
    },
}

/// Append-only event log owned by one engine.
#[derive(Debug, Clone)]
pub struct EventLog<E> {
    events: Vec<E>,
}

impl<E> Default for EventLog<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E: Serialize> EventLog<E> {
    pub(crate) fn emit(&mut self, event: E) {
        self.events.push(event);
    }

    pub fn all(&self) -> &[E] {
        &self.events
    }

    pub fn last(&self) -> Option<&E> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Hand buffered events to the host, leaving the log empty.
    pub fn drain(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }

    /// JSON array of every buffered event, for audit export.
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.events)
    }
}
