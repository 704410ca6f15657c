//! Accord: multi-party intent coordination and policy-bounded agent execution.
//!
//! Two engines share one signing and validation stack:
//! - [`Coordinator`] runs the propose / accept / execute / cancel lifecycle of intents that
//!   several parties must sign off on;
//! - [`BoundedExecutor`] lets a single agent move value only inside an administrator-committed
//!   allow-set, under a rolling budget, with timelocked policy rotation and a guardian veto.
//!
//! Both are plain objects mutated through `&mut self`: every entry point either completes or
//! leaves state exactly as it found it.

pub mod budget;
pub mod config;
pub mod constants;
pub mod context;
pub mod coordination;
pub mod errors;
pub mod events;
pub mod executor;
pub mod governance;
pub mod nonces;
pub mod policy;
pub mod signature;

pub use accord_types as types;

pub use budget::{AgentBudget, BudgetLedger};
pub use config::{CoordinatorConfig, ExecutorConfig};
pub use context::CallContext;
pub use coordination::{Coordinator, ExecutionHook, IntentStatus, NoopHook, RecordView};
pub use errors::{AccordError, Commitment, EffectError, Result, Role};
pub use events::{CoordinationEvent, EventLog, ExecutorEvent};
pub use executor::{BoundedAction, BoundedExecutor, BoundedRequest, Vault};
pub use governance::{PolicyGovernance, QueuedPolicy, VetoRecord};
pub use policy::{verify_operation, PolicyTree};
pub use signature::{DelegateFault, DelegatedValidator, SignatureValidator, SignerRegistry};
