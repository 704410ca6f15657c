//! Multi-party intent coordination.
//!
//! Lifecycle: `None -> Proposed -> Ready -> Executed`, with `Proposed | Ready -> Cancelled`.
//! Records are kept in an arena indexed by intent hash and are never removed; terminal records
//! stay queryable.

use std::collections::{HashMap, HashSet};

use accord_types::{AcceptanceAttestation, AgentIntent, CoordinationPayload, SigningDomain};
use alloy_primitives::{Address, B256};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    config::CoordinatorConfig,
    context::CallContext,
    errors::{AccordError, Commitment, EffectError, Result, Role},
    events::{CoordinationEvent, EventLog},
    nonces::NonceBook,
    signature::{DelegatedValidator, SignerRegistry},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum IntentStatus {
    #[default]
    None,
    Proposed,
    Ready,
    Executed,
    Cancelled,
}

impl IntentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, IntentStatus::Executed | IntentStatus::Cancelled)
    }
}

/// Application-specific effect run once an intent executes.
///
/// Implementations must be all-or-nothing: an `Err` means no effect happened.
pub trait ExecutionHook {
    fn on_execute(
        &mut self,
        intent_hash: B256,
        payload: &CoordinationPayload,
        execution_data: &[u8],
    ) -> std::result::Result<(), EffectError>;
}

/// Hook that performs no effect; the coordinator is then a pure agreement registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl ExecutionHook for NoopHook {
    fn on_execute(
        &mut self,
        _intent_hash: B256,
        _payload: &CoordinationPayload,
        _execution_data: &[u8],
    ) -> std::result::Result<(), EffectError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CoordinationRecord {
    status: IntentStatus,
    payload_hash: B256,
    initiator: Address,
    expiry: u64,
    participants: Vec<Address>,
    /// Parallel to `participants`.
    accepted: Vec<bool>,
    accepted_count: usize,
}

impl CoordinationRecord {
    fn position(&self, participant: Address) -> Option<usize> {
        self.participants.iter().position(|p| *p == participant)
    }

    /// Mark `participants[slot]` as accepted; returns true when the set is complete.
    fn mark_accepted(&mut self, slot: usize) -> bool {
        self.accepted[slot] = true;
        self.accepted_count += 1;
        if self.accepted_count == self.participants.len() {
            self.status = IntentStatus::Ready;
            true
        } else {
            false
        }
    }
}

/// Read-only projection of a coordination record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordView {
    pub status: IntentStatus,
    pub payload_hash: B256,
    pub initiator: Address,
    pub expiry: u64,
    pub participants: Vec<Address>,
    pub accepted: Vec<Address>,
    pub accepted_count: usize,
}

/// Coordination engine: one instance per deployment domain.
pub struct Coordinator<H = NoopHook> {
    domain: SigningDomain,
    signers: SignerRegistry,
    nonces: NonceBook,
    records: Vec<CoordinationRecord>,
    index: HashMap<B256, usize>,
    hook: H,
    events: EventLog<CoordinationEvent>,
}

impl Coordinator<NoopHook> {
    pub fn without_hook(config: CoordinatorConfig) -> Result<Self> {
        Self::new(config, NoopHook)
    }
}

impl<H: ExecutionHook> Coordinator<H> {
    pub fn new(config: CoordinatorConfig, hook: H) -> Result<Self> {
        config.validate()?;
        info!(
            domain = config.domain.name(),
            chain_id = config.domain.chain_id(),
            verifying_contract = %config.domain.verifying_contract(),
            "coordinator initialised"
        );
        Ok(Self {
            domain: config.domain,
            signers: SignerRegistry::new(),
            nonces: NonceBook::default(),
            records: Vec::new(),
            index: HashMap::new(),
            hook,
            events: EventLog::default(),
        })
    }

    /// Register a contract-style identity whose signatures are checked by `validator`.
    pub fn register_delegated_signer(
        &mut self,
        account: Address,
        validator: std::sync::Arc<dyn DelegatedValidator>,
    ) {
        self.signers.register_delegated(account, validator);
    }

    pub fn signers(&self) -> &SignerRegistry {
        &self.signers
    }

    /// Record a new intent signed by `intent.agentId`; returns its hash.
    #[instrument(skip_all, fields(agent = %intent.agentId, nonce = intent.nonce))]
    pub fn propose(
        &mut self,
        ctx: &CallContext,
        intent: &AgentIntent,
        payload: &CoordinationPayload,
        signature: &[u8],
    ) -> Result<B256> {
        if intent.expiry <= ctx.timestamp {
            debug!(expiry = intent.expiry, now = ctx.timestamp, "intent expired");
            return Err(AccordError::Expired);
        }
        self.nonces
            .check(intent.agentId, intent.nonce)
            .inspect_err(|e| debug!(error = %e, "stale nonce"))?;
        validate_participants(&intent.participants).inspect_err(|_| {
            debug!(count = intent.participants.len(), "invalid participant list")
        })?;

        let intent_hash = intent.intent_hash();
        if self.index.contains_key(&intent_hash) {
            debug!(%intent_hash, "intent already recorded");
            return Err(AccordError::AlreadyExists(intent_hash));
        }
        if payload.payload_hash() != intent.payloadHash {
            debug!(%intent_hash, "payload does not match commitment");
            return Err(AccordError::PayloadMismatch(Commitment::Payload));
        }
        let digest = self.domain.signing_hash(intent);
        if !self.signers.verify(intent.agentId, digest, signature) {
            debug!(%intent_hash, "intent signature invalid");
            return Err(AccordError::SignatureInvalid);
        }

        self.nonces.advance(intent.agentId, intent.nonce);

        let mut record = CoordinationRecord {
            status: IntentStatus::Proposed,
            payload_hash: intent.payloadHash,
            initiator: intent.agentId,
            expiry: intent.expiry,
            participants: intent.participants.clone(),
            accepted: vec![false; intent.participants.len()],
            accepted_count: 0,
        };
        let ready = match record.position(intent.agentId) {
            Some(slot) => record.mark_accepted(slot),
            None => false,
        };

        self.index.insert(intent_hash, self.records.len());
        self.records.push(record);

        self.events.emit(CoordinationEvent::IntentProposed {
            intent_hash,
            proposer: intent.agentId,
            coordination_type: intent.coordinationType,
            participants: intent.participants.clone(),
            expiry: intent.expiry,
        });
        if ready {
            self.events.emit(CoordinationEvent::IntentReady { intent_hash });
        }
        info!(%intent_hash, ready, "intent proposed");
        Ok(intent_hash)
    }

    /// Record one participant's signed acceptance.
    #[instrument(skip_all, fields(intent = %intent_hash, participant = %attestation.participant))]
    pub fn accept(
        &mut self,
        ctx: &CallContext,
        intent_hash: B256,
        attestation: &AcceptanceAttestation,
        signature: &[u8],
    ) -> Result<()> {
        let slot_index = self.slot(intent_hash)?;
        let record = &self.records[slot_index];

        if record.status != IntentStatus::Proposed {
            debug!(status = ?record.status, "acceptance outside proposed state");
            return Err(AccordError::WrongState {
                actual: record.status,
            });
        }
        if attestation.intentHash != intent_hash {
            debug!(attested = %attestation.intentHash, "attestation names another intent");
            return Err(AccordError::PayloadMismatch(Commitment::IntentHash));
        }
        if attestation.expiry <= ctx.timestamp {
            debug!(expiry = attestation.expiry, now = ctx.timestamp, "attestation expired");
            return Err(AccordError::Expired);
        }
        let participant = attestation.participant;
        let Some(slot) = record.position(participant) else {
            debug!("attester is not a participant");
            return Err(AccordError::NotParticipant(participant));
        };
        if record.accepted[slot] {
            debug!("participant already accepted");
            return Err(AccordError::AlreadyAccepted(participant));
        }
        let digest = self.domain.signing_hash(attestation);
        if !self.signers.verify(participant, digest, signature) {
            debug!("attestation signature invalid");
            return Err(AccordError::SignatureInvalid);
        }

        let record = &mut self.records[slot_index];
        let ready = record.mark_accepted(slot);
        let accepted_count = record.accepted_count;

        self.events.emit(CoordinationEvent::IntentAccepted {
            intent_hash,
            participant,
            accepted_count,
        });
        if ready {
            self.events.emit(CoordinationEvent::IntentReady { intent_hash });
        }
        info!(accepted_count, ready, "acceptance recorded");
        Ok(())
    }

    /// Execute a ready intent, running the hook at most once.
    #[instrument(skip_all, fields(intent = %intent_hash))]
    pub fn execute(
        &mut self,
        ctx: &CallContext,
        intent_hash: B256,
        payload: &CoordinationPayload,
        execution_data: &[u8],
    ) -> Result<()> {
        let slot = self.slot(intent_hash)?;
        let record = &self.records[slot];

        if record.status != IntentStatus::Ready {
            debug!(status = ?record.status, "execution outside ready state");
            return Err(AccordError::WrongState {
                actual: record.status,
            });
        }
        if record.expiry <= ctx.timestamp {
            debug!(expiry = record.expiry, now = ctx.timestamp, "ready intent expired");
            return Err(AccordError::Expired);
        }
        if payload.payload_hash() != record.payload_hash {
            debug!("payload does not match commitment");
            return Err(AccordError::PayloadMismatch(Commitment::Payload));
        }

        // Terminal state is persisted before the hook runs so a re-triggered execution is
        // rejected with WrongState.
        self.records[slot].status = IntentStatus::Executed;
        let hook = &mut self.hook;
        let outcome = EffectError::contain("execution hook", || {
            hook.on_execute(intent_hash, payload, execution_data)
        });
        if let Err(e) = outcome {
            self.records[slot].status = IntentStatus::Ready;
            debug!(error = %e, "execution hook failed; rolled back");
            return Err(e.into());
        }

        self.events.emit(CoordinationEvent::IntentExecuted {
            intent_hash,
            executor: ctx.sender,
        });
        info!(executor = %ctx.sender, "intent executed");
        Ok(())
    }

    /// Cancel a non-terminal intent. Only the initiator may cancel.
    #[instrument(skip_all, fields(intent = %intent_hash, caller = %ctx.sender))]
    pub fn cancel(&mut self, ctx: &CallContext, intent_hash: B256) -> Result<()> {
        let slot = self.slot(intent_hash)?;
        let record = &mut self.records[slot];

        if record.status.is_terminal() {
            debug!(status = ?record.status, "cancel of terminal intent");
            return Err(AccordError::WrongState {
                actual: record.status,
            });
        }
        if ctx.sender != record.initiator {
            debug!(initiator = %record.initiator, "cancel by non-initiator");
            return Err(AccordError::NotAuthorized {
                caller: ctx.sender,
                role: Role::Initiator,
            });
        }
        record.status = IntentStatus::Cancelled;

        self.events.emit(CoordinationEvent::IntentCancelled {
            intent_hash,
            cancelled_by: ctx.sender,
        });
        info!("intent cancelled");
        Ok(())
    }

    pub fn status(&self, intent_hash: B256) -> IntentStatus {
        self.find(intent_hash)
            .map(|r| r.status)
            .unwrap_or_default()
    }

    pub fn record(&self, intent_hash: B256) -> Option<RecordView> {
        self.find(intent_hash).map(|r| RecordView {
            status: r.status,
            payload_hash: r.payload_hash,
            initiator: r.initiator,
            expiry: r.expiry,
            participants: r.participants.clone(),
            accepted: r
                .participants
                .iter()
                .zip(&r.accepted)
                .filter(|(_, accepted)| **accepted)
                .map(|(p, _)| *p)
                .collect(),
            accepted_count: r.accepted_count,
        })
    }

    pub fn nonce(&self, agent: Address) -> u64 {
        self.nonces.current(agent)
    }

    pub fn has_accepted(&self, intent_hash: B256, participant: Address) -> bool {
        self.find(intent_hash)
            .and_then(|r| r.position(participant).map(|slot| r.accepted[slot]))
            .unwrap_or(false)
    }

    /// Participants whose acceptance is still outstanding, in intent order.
    pub fn pending_participants(&self, intent_hash: B256) -> Vec<Address> {
        self.find(intent_hash)
            .map(|r| {
                r.participants
                    .iter()
                    .zip(&r.accepted)
                    .filter(|(_, accepted)| !**accepted)
                    .map(|(p, _)| *p)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn domain(&self) -> &SigningDomain {
        &self.domain
    }

    pub fn domain_separator(&self) -> B256 {
        self.domain.separator()
    }

    pub fn events(&self) -> &EventLog<CoordinationEvent> {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<CoordinationEvent> {
        self.events.drain()
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub fn hook_mut(&mut self) -> &mut H {
        &mut self.hook
    }

    fn find(&self, intent_hash: B256) -> Option<&CoordinationRecord> {
        self.index.get(&intent_hash).map(|&i| &self.records[i])
    }

    fn slot(&self, intent_hash: B256) -> Result<usize> {
        self.index
            .get(&intent_hash)
            .copied()
            .ok_or_else(|| {
                debug!(%intent_hash, "unknown intent");
                AccordError::NotFound(intent_hash)
            })
    }
}

/// Participants must be non-empty, non-zero and distinct.
fn validate_participants(participants: &[Address]) -> Result<()> {
    if participants.is_empty() {
        return Err(AccordError::InvalidParticipants);
    }
    let mut seen = HashSet::with_capacity(participants.len());
    for p in participants {
        if *p == Address::ZERO || !seen.insert(*p) {
            return Err(AccordError::InvalidParticipants);
        }
    }
    Ok(())
}
