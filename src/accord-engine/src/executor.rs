//! Policy-bounded execution for autonomous agents.
//!
//! An agent's signed intent is only honoured when it was signed against the live policy epoch
//! and root, its operation is a member of the committed allow-set, and the agent's rolling budget
//! covers the amount. The effect itself is delegated to a [`Vault`].

use std::sync::Arc;

use accord_types::{calldata_hash, BoundedIntent, BoundedPayload, SigningDomain};
use alloy_primitives::{Address, B256, U256};
use tracing::{debug, info, instrument};

use crate::{
    budget::{AgentBudget, BudgetLedger},
    config::ExecutorConfig,
    context::CallContext,
    errors::{AccordError, Commitment, EffectError, Result},
    events::{EventLog, ExecutorEvent},
    governance::{PolicyGovernance, QueuedPolicy, VetoRecord},
    nonces::NonceBook,
    policy::verify_operation,
    signature::{DelegatedValidator, SignerRegistry},
};

/// Effect requested by a validated bounded intent. Only policy-proven fields are carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundedAction<'a> {
    /// Move `amount` of `asset` (native when zero) to `to`.
    Transfer {
        asset: Address,
        to: Address,
        amount: U256,
    },
    /// Call `target` with `data`, making `amount` of `asset` available to it.
    Call {
        target: Address,
        asset: Address,
        amount: U256,
        data: &'a [u8],
    },
}

/// Holder of the funds an agent spends from.
///
/// `perform` must be all-or-nothing: an `Err` means no transfer or call took effect.
pub trait Vault {
    fn perform(
        &mut self,
        agent: Address,
        action: &BoundedAction<'_>,
    ) -> std::result::Result<(), EffectError>;
}

/// Everything the agent submits for one bounded execution.
#[derive(Debug, Clone, Copy)]
pub struct BoundedRequest<'a> {
    pub intent: &'a BoundedIntent,
    pub payload: &'a BoundedPayload,
    pub calldata: &'a [u8],
    pub proof: &'a [B256],
    pub signature: &'a [u8],
}

pub struct BoundedExecutor<V> {
    domain: SigningDomain,
    signers: SignerRegistry,
    nonces: NonceBook,
    governance: PolicyGovernance,
    budgets: BudgetLedger,
    vault: V,
    events: EventLog<ExecutorEvent>,
}

impl<V: Vault> BoundedExecutor<V> {
    pub fn new(config: ExecutorConfig, vault: V) -> Result<Self> {
        config.validate()?;
        info!(
            domain = config.domain.name(),
            chain_id = config.domain.chain_id(),
            admin = %config.admin,
            guardian = %config.guardian,
            "bounded executor initialised"
        );
        Ok(Self {
            governance: PolicyGovernance::new(
                config.admin,
                config.guardian,
                config.timelock_delay_secs,
                config.initial_policy_root,
            ),
            budgets: BudgetLedger::new(config.budget_window_secs),
            domain: config.domain,
            signers: SignerRegistry::new(),
            nonces: NonceBook::default(),
            vault,
            events: EventLog::default(),
        })
    }

    pub fn register_delegated_signer(
        &mut self,
        account: Address,
        validator: Arc<dyn DelegatedValidator>,
    ) {
        self.signers.register_delegated(account, validator);
    }

    /// Validate and perform one bounded operation; returns the intent hash.
    #[instrument(skip_all, fields(agent = %request.intent.agentId, nonce = request.intent.nonce))]
    pub fn execute(&mut self, ctx: &CallContext, request: BoundedRequest<'_>) -> Result<B256> {
        let BoundedRequest {
            intent,
            payload,
            calldata,
            proof,
            signature,
        } = request;
        let agent = intent.agentId;

        if intent.expiry <= ctx.timestamp {
            debug!(expiry = intent.expiry, now = ctx.timestamp, "intent expired");
            return Err(AccordError::Expired);
        }
        self.nonces
            .check(agent, intent.nonce)
            .inspect_err(|e| debug!(error = %e, "stale nonce"))?;

        let epoch = self.governance.epoch();
        if intent.policyEpoch != epoch {
            debug!(expected = epoch, provided = intent.policyEpoch, "stale policy epoch");
            return Err(AccordError::PayloadMismatch(Commitment::PolicyEpoch {
                expected: epoch,
                provided: intent.policyEpoch,
            }));
        }
        if payload.policyRoot != self.governance.root() {
            debug!(provided = %payload.policyRoot, "payload built against another policy root");
            return Err(AccordError::PayloadMismatch(Commitment::PolicyRoot));
        }
        if payload.payload_hash() != intent.payloadHash {
            debug!("payload does not match commitment");
            return Err(AccordError::PayloadMismatch(Commitment::Payload));
        }
        if payload.commits_calldata() && calldata_hash(calldata) != payload.calldataHash {
            debug!(len = calldata.len(), "calldata does not match commitment");
            return Err(AccordError::PayloadMismatch(Commitment::Calldata));
        }
        let digest = self.domain.signing_hash(intent);
        if !self.signers.verify(agent, digest, signature) {
            debug!("intent signature invalid");
            return Err(AccordError::SignatureInvalid);
        }

        if !verify_operation(
            self.governance.root(),
            payload.target,
            payload.asset,
            payload.amount,
            proof,
        ) {
            debug!(
                op_target = %payload.target,
                amount = %payload.amount,
                "operation not in allow-set"
            );
            return Err(AccordError::PolicyProofInvalid);
        }

        let budget_before = self.budgets.snapshot(agent);
        let nonce_before = self.nonces.current(agent);
        self.budgets
            .check_and_debit(agent, payload.amount, ctx.timestamp)
            .inspect_err(|e| debug!(error = %e, "budget exhausted"))?;
        self.nonces.advance(agent, intent.nonce);

        let action = if calldata.is_empty() {
            BoundedAction::Transfer {
                asset: payload.asset,
                to: payload.target,
                amount: payload.amount,
            }
        } else {
            BoundedAction::Call {
                target: payload.target,
                asset: payload.asset,
                amount: payload.amount,
                data: calldata,
            }
        };
        let vault = &mut self.vault;
        if let Err(e) = EffectError::contain("vault", || vault.perform(agent, &action)) {
            self.budgets.restore(agent, budget_before);
            self.nonces.restore(agent, nonce_before);
            debug!(error = %e, "vault effect failed; rolled back");
            return Err(e.into());
        }

        let intent_hash = intent.intent_hash();
        self.events.emit(ExecutorEvent::BoundedExecuted {
            intent_hash,
            agent,
            nonce: intent.nonce,
            target: payload.target,
            asset: payload.asset,
            amount: payload.amount,
            policy_epoch: epoch,
        });
        info!(
            %intent_hash,
            op_target = %payload.target,
            amount = %payload.amount,
            "bounded execution completed"
        );
        Ok(intent_hash)
    }

    /// Membership of (target, asset, amount) in the live allow-set.
    pub fn verify_policy_proof(
        &self,
        target: Address,
        asset: Address,
        amount: U256,
        proof: &[B256],
    ) -> bool {
        verify_operation(self.governance.root(), target, asset, amount, proof)
    }

    #[instrument(skip_all, fields(caller = %ctx.sender, %agent))]
    pub fn set_daily_limit(
        &mut self,
        ctx: &CallContext,
        agent: Address,
        limit: U256,
    ) -> Result<()> {
        self.governance.ensure_admin(ctx)?;
        self.budgets.set_daily_limit(agent, limit);
        self.events.emit(ExecutorEvent::BudgetSet {
            agent,
            daily_limit: limit,
        });
        info!(%limit, "daily limit set");
        Ok(())
    }

    #[instrument(skip_all, fields(caller = %ctx.sender, %new_root))]
    pub fn queue_policy_update(
        &mut self,
        ctx: &CallContext,
        new_root: B256,
    ) -> Result<QueuedPolicy> {
        let queued = self.governance.queue_update(ctx, new_root)?;
        self.events.emit(ExecutorEvent::PolicyUpdateQueued {
            root: queued.root,
            activates_at: queued.activates_at,
            queued_by: ctx.sender,
        });
        info!(activates_at = queued.activates_at, "policy update queued");
        Ok(queued)
    }

    #[instrument(skip_all, fields(caller = %ctx.sender))]
    pub fn activate_policy(&mut self, ctx: &CallContext) -> Result<u64> {
        let (root, epoch) = self.governance.activate(ctx)?;
        self.events.emit(ExecutorEvent::PolicyActivated { root, epoch });
        info!(%root, epoch, "policy activated");
        Ok(epoch)
    }

    #[instrument(skip_all, fields(caller = %ctx.sender))]
    pub fn veto_policy(&mut self, ctx: &CallContext, reason: &str) -> Result<()> {
        let record = self.governance.veto(ctx, reason)?;
        info!(root = %record.root, reason, "policy update vetoed");
        self.events.emit(ExecutorEvent::PolicyVetoed {
            root: record.root,
            reason: record.reason,
            vetoed_by: record.vetoed_by,
        });
        Ok(())
    }

    #[instrument(skip_all, fields(caller = %ctx.sender, %guardian))]
    pub fn set_guardian(&mut self, ctx: &CallContext, guardian: Address) -> Result<()> {
        let previous = self.governance.set_guardian(ctx, guardian)?;
        self.events.emit(ExecutorEvent::GuardianChanged { previous, guardian });
        info!(%previous, "guardian changed");
        Ok(())
    }

    pub fn nonce(&self, agent: Address) -> u64 {
        self.nonces.current(agent)
    }

    pub fn policy_root(&self) -> B256 {
        self.governance.root()
    }

    pub fn policy_epoch(&self) -> u64 {
        self.governance.epoch()
    }

    pub fn queued_policy(&self) -> Option<QueuedPolicy> {
        self.governance.queued()
    }

    pub fn veto_history(&self) -> &[VetoRecord] {
        self.governance.vetoes()
    }

    pub fn admin(&self) -> Address {
        self.governance.admin()
    }

    pub fn guardian(&self) -> Address {
        self.governance.guardian()
    }

    pub fn timelock_delay(&self) -> u64 {
        self.governance.delay()
    }

    pub fn budget_window(&self) -> u64 {
        self.budgets.window()
    }

    pub fn budget(&self, agent: Address) -> AgentBudget {
        self.budgets.budget(agent)
    }

    pub fn remaining_budget(&self, agent: Address, now: u64) -> U256 {
        self.budgets.remaining(agent, now)
    }

    pub fn domain(&self) -> &SigningDomain {
        &self.domain
    }

    pub fn domain_separator(&self) -> B256 {
        self.domain.separator()
    }

    pub fn events(&self) -> &EventLog<ExecutorEvent> {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<ExecutorEvent> {
        self.events.drain()
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub fn vault_mut(&mut self) -> &mut V {
        &mut self.vault
    }
}
