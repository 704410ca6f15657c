//! Timelocked policy-root rotation with guardian veto.
//!
//! At most one update is queued at a time; queueing again overwrites it. Each activation bumps
//! the policy epoch, which invalidates bounded intents signed under the previous policy.

use alloy_primitives::{Address, B256};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    context::CallContext,
    errors::{AccordError, Result, Role},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueuedPolicy {
    pub root: B256,
    pub activates_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VetoRecord {
    pub root: B256,
    pub reason: String,
    pub vetoed_by: Address,
    pub vetoed_at: u64,
}

#[derive(Debug, Clone)]
pub struct PolicyGovernance {
    admin: Address,
    guardian: Address,
    delay: u64,
    root: B256,
    epoch: u64,
    queued: Option<QueuedPolicy>,
    vetoes: Vec<VetoRecord>,
}

impl PolicyGovernance {
    pub fn new(admin: Address, guardian: Address, delay: u64, initial_root: B256) -> Self {
        Self {
            admin,
            guardian,
            delay,
            root: initial_root,
            epoch: 0,
            queued: None,
            vetoes: Vec::new(),
        }
    }

    pub fn ensure_admin(&self, ctx: &CallContext) -> Result<()> {
        if ctx.sender != self.admin {
            warn!(caller = %ctx.sender, "admin call rejected");
            return Err(AccordError::NotAuthorized {
                caller: ctx.sender,
                role: Role::Admin,
            });
        }
        Ok(())
    }

    fn ensure_guardian(&self, ctx: &CallContext) -> Result<()> {
        if ctx.sender != self.guardian {
            warn!(caller = %ctx.sender, "guardian call rejected");
            return Err(AccordError::NotAuthorized {
                caller: ctx.sender,
                role: Role::Guardian,
            });
        }
        Ok(())
    }

    pub fn queue_update(&mut self, ctx: &CallContext, new_root: B256) -> Result<QueuedPolicy> {
        self.ensure_admin(ctx)?;
        let queued = QueuedPolicy {
            root: new_root,
            activates_at: ctx.timestamp.saturating_add(self.delay),
        };
        if let Some(previous) = self.queued.replace(queued) {
            info!(previous = %previous.root, "queued policy overwritten");
        }
        Ok(queued)
    }

    /// Activate the queued root once its delay has elapsed. Callable by anyone.
    /// Returns the new `(root, epoch)`.
    pub fn activate(&mut self, ctx: &CallContext) -> Result<(B256, u64)> {
        let queued = self.queued.ok_or_else(|| {
            debug!("activation with empty queue");
            AccordError::NoPolicyQueued
        })?;
        if ctx.timestamp < queued.activates_at {
            debug!(activates_at = queued.activates_at, now = ctx.timestamp, "timelock pending");
            return Err(AccordError::TimelockNotElapsed {
                activates_at: queued.activates_at,
                now: ctx.timestamp,
            });
        }
        self.root = queued.root;
        self.epoch += 1;
        self.queued = None;
        Ok((self.root, self.epoch))
    }

    pub fn veto(&mut self, ctx: &CallContext, reason: impl Into<String>) -> Result<VetoRecord> {
        self.ensure_guardian(ctx)?;
        let queued = self.queued.take().ok_or_else(|| {
            debug!("veto with empty queue");
            AccordError::NoPolicyQueued
        })?;
        let record = VetoRecord {
            root: queued.root,
            reason: reason.into(),
            vetoed_by: ctx.sender,
            vetoed_at: ctx.timestamp,
        };
        self.vetoes.push(record.clone());
        Ok(record)
    }

    /// Replace the guardian; returns the previous one.
    pub fn set_guardian(&mut self, ctx: &CallContext, guardian: Address) -> Result<Address> {
        self.ensure_admin(ctx)?;
        if guardian == Address::ZERO {
            debug!("zero guardian rejected");
            return Err(AccordError::InvalidConfig("guardian must be set".into()));
        }
        Ok(std::mem::replace(&mut self.guardian, guardian))
    }

    pub fn root(&self) -> B256 {
        self.root
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn queued(&self) -> Option<QueuedPolicy> {
        self.queued
    }

    pub fn vetoes(&self) -> &[VetoRecord] {
        &self.vetoes
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn guardian(&self) -> Address {
        self.guardian
    }

    pub fn delay(&self) -> u64 {
        self.delay
    }
}
