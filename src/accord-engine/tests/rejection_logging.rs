mod common;

use std::{
    io,
    sync::{Arc, Mutex},
};

use accord_engine::{
    types::{calldata_hash, BoundedIntent, BoundedPayload, PolicyOperation},
    AccordError, BoundedExecutor, BoundedRequest, CallContext, Commitment, Coordinator,
    CoordinatorConfig, ExecutorConfig, PolicyTree,
};
use alloy_primitives::{Address, B256, U256};
use common::{
    agent_intent, attestation, sign_record, swap_payload, MemoryVault, Party, RecordingHook,
    CHAIN_ID, HOUR, NOW,
};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn with_debug_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, logs.text())
}

#[test]
fn test_coordinator_rejections_are_logged() {
    let (a, b) = (Party::nth(0), Party::nth(1));
    let config = CoordinatorConfig::new(CHAIN_ID, Address::with_last_byte(0xc0));
    let mut c = Coordinator::new(config, RecordingHook::default()).unwrap();
    let payload = swap_payload(b"swap");
    let intent = agent_intent(a.address, vec![a.address, b.address], &payload, 1, NOW + HOUR);
    let sig = sign_record(c.domain(), &a, &intent);
    let hash = c.propose(&CallContext::new(a.address, NOW), &intent, &payload, &sig).unwrap();

    let (results, logs) = with_debug_logs(|| {
        let replay = c.propose(&CallContext::new(a.address, NOW), &intent, &payload, &sig);
        let att = attestation(hash, a.address, NOW + HOUR);
        let att_sig = sign_record(c.domain(), &a, &att);
        let again = c.accept(&CallContext::new(a.address, NOW), hash, &att, &att_sig);
        let early = c.execute(&CallContext::new(a.address, NOW), hash, &payload, b"");
        let foreign_cancel = c.cancel(&CallContext::new(b.address, NOW), hash);
        (replay, again, early, foreign_cancel)
    });

    assert!(matches!(results.0, Err(AccordError::NonceTooLow { .. })));
    assert_eq!(results.1, Err(AccordError::AlreadyAccepted(a.address)));
    assert!(matches!(results.2, Err(AccordError::WrongState { .. })));
    assert!(matches!(results.3, Err(AccordError::NotAuthorized { .. })));
    for message in [
        "stale nonce",
        "participant already accepted",
        "execution outside ready state",
        "cancel by non-initiator",
    ] {
        assert!(logs.contains(message), "missing {message:?} in:\n{logs}");
    }
}

#[test]
fn test_executor_commitment_rejections_are_logged() {
    let agent = Party::nth(0);
    let admin = Address::with_last_byte(0xad);
    let operation = PolicyOperation::new(
        Address::with_last_byte(0xde),
        Address::with_last_byte(0xd5),
        U256::from(25u64),
    );
    let tree = PolicyTree::from_operations([&operation]).unwrap();
    let config = ExecutorConfig::new(
        CHAIN_ID,
        Address::with_last_byte(0xe1),
        admin,
        Address::with_last_byte(0x9a),
        tree.root(),
    );
    let mut exec = BoundedExecutor::new(config, MemoryVault::default()).unwrap();

    let calldata = b"swap(25)".to_vec();
    let payload = BoundedPayload {
        policyRoot: B256::repeat_byte(0x01),
        target: operation.target,
        asset: operation.asset,
        amount: operation.amount,
        calldataHash: calldata_hash(&calldata),
    };
    let intent = BoundedIntent {
        payloadHash: payload.payload_hash(),
        expiry: NOW + HOUR,
        nonce: 1,
        agentId: agent.address,
        policyEpoch: 0,
    };
    let signature = agent.sign(exec.domain().signing_hash(&intent));
    let proof = tree.proof_for(&operation).unwrap();

    let mut live = payload.clone();
    live.policyRoot = tree.root();
    let live_intent = BoundedIntent {
        payloadHash: live.payload_hash(),
        ..intent.clone()
    };
    let live_signature = agent.sign(exec.domain().signing_hash(&live_intent));

    let ctx = CallContext::new(agent.address, NOW);
    let (results, logs) = with_debug_logs(|| {
        let wrong_root = exec.execute(
            &ctx,
            BoundedRequest {
                intent: &intent,
                payload: &payload,
                calldata: &calldata,
                proof: &proof,
                signature: &signature,
            },
        );
        let wrong_calldata = exec.execute(
            &ctx,
            BoundedRequest {
                intent: &live_intent,
                payload: &live,
                calldata: b"swap(26)",
                proof: &proof,
                signature: &live_signature,
            },
        );
        (wrong_root, wrong_calldata)
    });

    assert_eq!(results.0, Err(AccordError::PayloadMismatch(Commitment::PolicyRoot)));
    assert_eq!(results.1, Err(AccordError::PayloadMismatch(Commitment::Calldata)));
    assert!(logs.contains("payload built against another policy root"), "{logs}");
    assert!(logs.contains("calldata does not match commitment"), "{logs}");
}
