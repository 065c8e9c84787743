//! End-to-end integration tests for the KARMA ledger.
//!
//! These tests exercise the full operation lifecycle through the public
//! surface: initialization, user creation, issuance, value movements,
//! the audit trail, and persistence across store reopens. They prove
//! that the layers compose: wire dispatch, the operation engine, the
//! typed repository, and the sled store underneath.
//!
//! Each test stands alone with its own temporary store. No shared
//! state, no test ordering dependencies.

use karma_ledger::dispatch::{dispatch, DispatchReply, Invocation};
use karma_ledger::ledger::{Ledger, LedgerError, ReadMode};
use karma_ledger::record::AccountKind;
use karma_ledger::storage::{keys, LedgerRepository, SledStore, StateStore};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Opens a fresh temporary store and hands back both the engine and a
/// raw handle for byte-level assertions.
fn setup() -> (Ledger<SledStore>, SledStore) {
    let store = SledStore::open_temporary().expect("temp store");
    let ledger = Ledger::new(LedgerRepository::new(store.clone()));
    (ledger, store)
}

/// Dispatches a wire invocation with an explicit call id.
fn invoke(
    ledger: &Ledger<SledStore>,
    function: &str,
    args: &[&str],
    call_id: &str,
) -> Result<DispatchReply, LedgerError> {
    let call = Invocation::new(
        function,
        args.iter().map(|s| s.to_string()).collect(),
        call_id,
    );
    dispatch(ledger, &call)
}

// ---------------------------------------------------------------------------
// 1. Full Allocation Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn full_allocation_lifecycle() {
    let (ledger, _store) = setup();

    ledger.initialize("shanchain", 50_000).unwrap();
    ledger.create_user("10086", "china mobile", 100).unwrap();
    ledger.create_user("10000", "sinopec", 200).unwrap();

    // Issue more supply, allocate some of it, move some between users.
    ledger.issue(10_000).unwrap();
    ledger.exchange("call-1", "10086", 2_500).unwrap();
    ledger.transfer("call-2", "10086", "10000", 600).unwrap();

    let root = ledger.get_root().unwrap();
    assert_eq!(root.total_integral, 60_000);
    assert_eq!(root.rest_integral, 57_500);
    assert_eq!(root.allocated(), 2_500);

    assert_eq!(ledger.get_user("10086").unwrap().integral, 2_000);
    assert_eq!(ledger.get_user("10000").unwrap().integral, 800);

    // Both movements left audit records under their call ids.
    let first = ledger.get_transaction("call-1").unwrap();
    assert_eq!(first.from_type, AccountKind::Root);
    assert_eq!(first.to_id, "10086");
    assert_eq!(first.integral, 2_500);

    let second = ledger.get_transaction("call-2").unwrap();
    assert_eq!(second.from_type, AccountKind::User);
    assert_eq!(second.from_id, "10086");
    assert_eq!(second.to_id, "10000");
    assert_eq!(second.integral, 600);

    // Supply is conserved: what the root gave up is what users hold
    // beyond their starting balances.
    let users_total = 2_000 + 800;
    assert_eq!(root.total_integral - root.rest_integral + 100 + 200, users_total);
}

// ---------------------------------------------------------------------------
// 2. Wire Surface End to End
// ---------------------------------------------------------------------------

#[test]
fn wire_surface_end_to_end() {
    let (ledger, _store) = setup();

    invoke(&ledger, "init", &["shanchain", "50000"], "boot").unwrap();
    invoke(&ledger, "createUser", &["10086", "china mobile", "100"], "c1").unwrap();
    invoke(&ledger, "createUser", &["10000", "sinopec", "200"], "c2").unwrap();
    invoke(&ledger, "additional", &["1000"], "c3").unwrap();
    invoke(&ledger, "exchange", &["10086", "300"], "call-1").unwrap();
    invoke(&ledger, "transfer", &["10086", "10000", "150"], "call-2").unwrap();

    match invoke(&ledger, "getRoot", &[], "q1").unwrap() {
        DispatchReply::Root(root) => {
            assert_eq!(root.total_integral, 51_000);
            assert_eq!(root.rest_integral, 50_700);
        }
        other => panic!("expected Root reply, got {:?}", other),
    }
    match invoke(&ledger, "getUser", &["10086"], "q2").unwrap() {
        DispatchReply::User(user) => assert_eq!(user.integral, 250),
        other => panic!("expected User reply, got {:?}", other),
    }
    match invoke(&ledger, "getTransaction", &["call-2"], "q3").unwrap() {
        DispatchReply::Transaction(record) => {
            assert_eq!(record.id, "call-2");
            assert_eq!(record.integral, 150);
        }
        other => panic!("expected Transaction reply, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// 3. Rejected Operations Leave No Trace
// ---------------------------------------------------------------------------

#[test]
fn rejected_operations_leave_no_trace() {
    let (ledger, _store) = setup();

    ledger.initialize("shanchain", 1_000).unwrap();
    ledger.create_user("10086", "china mobile", 100).unwrap();

    // Overdraw the root.
    assert!(matches!(
        ledger.exchange("call-1", "10086", 1_001),
        Err(LedgerError::InsufficientFunds { .. })
    ));
    // Pay a ghost.
    assert!(matches!(
        ledger.exchange("call-2", "99999", 10),
        Err(LedgerError::NotFound { .. })
    ));
    // Re-register an existing user.
    assert!(matches!(
        ledger.create_user("10086", "impostor", 0),
        Err(LedgerError::UserExists(_))
    ));
    // Send to yourself.
    assert!(matches!(
        ledger.transfer("call-3", "10086", "10086", 10),
        Err(LedgerError::SelfTransfer { .. })
    ));

    // Nothing moved and no audit records appeared.
    let root = ledger.get_root().unwrap();
    assert_eq!(root.rest_integral, 1_000);
    assert_eq!(ledger.get_user("10086").unwrap().integral, 100);
    for call_id in ["call-1", "call-2", "call-3"] {
        assert!(matches!(
            ledger.get_transaction(call_id),
            Err(LedgerError::NotFound { .. })
        ));
    }
}

// ---------------------------------------------------------------------------
// 4. Persistence Survives Reopen
// ---------------------------------------------------------------------------

#[test]
fn persistence_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");

    // First session: run a small lifecycle and flush.
    {
        let store = SledStore::open(dir.path()).expect("open store");
        let ledger = Ledger::new(LedgerRepository::new(store));
        ledger.initialize("shanchain", 50_000).unwrap();
        ledger.create_user("10086", "china mobile", 100).unwrap();
        ledger.exchange("call-1", "10086", 2_000).unwrap();
        ledger.repository().flush().unwrap();
    }
    // The store is dropped here.

    // Second session: everything survived, balances included.
    {
        let store = SledStore::open(dir.path()).expect("reopen store");
        let ledger = Ledger::new(LedgerRepository::new(store));

        let root = ledger.get_root().unwrap();
        assert_eq!(root.name, "shanchain");
        assert_eq!(root.total_integral, 50_000);
        assert_eq!(root.rest_integral, 48_000);

        assert_eq!(ledger.get_user("10086").unwrap().integral, 2_100);

        let record = ledger.get_transaction("call-1").unwrap();
        assert_eq!(record.integral, 2_000);
        assert!(record.time > 0);
    }
}

// ---------------------------------------------------------------------------
// 5. Lenient Reads for Legacy Clients
// ---------------------------------------------------------------------------

#[test]
fn lenient_reads_for_legacy_clients() {
    let store = SledStore::open_temporary().expect("temp store");
    let ledger = Ledger::with_read_mode(LedgerRepository::new(store), ReadMode::Lenient);

    // Before initialization every read yields the zero-valued record.
    assert_eq!(ledger.get_root().unwrap().total_integral, 0);
    assert_eq!(ledger.get_user("10086").unwrap().integral, 0);
    assert_eq!(ledger.get_transaction("call-1").unwrap().id, "");

    // After initialization reads behave normally.
    ledger.initialize("shanchain", 500).unwrap();
    assert_eq!(ledger.get_root().unwrap().total_integral, 500);
}

// ---------------------------------------------------------------------------
// 6. Re-initialization Overwrites In Place
// ---------------------------------------------------------------------------

#[test]
fn reinitialization_overwrites_in_place() {
    let (ledger, _store) = setup();

    ledger.initialize("shanchain", 50_000).unwrap();
    ledger.create_user("10086", "china mobile", 100).unwrap();
    ledger.exchange("call-1", "10086", 1_000).unwrap();

    // Re-running init resets the root outright. User balances are
    // separate records and survive untouched.
    ledger.initialize("shanchain-2", 9_000).unwrap();

    let root = ledger.get_root().unwrap();
    assert_eq!(root.name, "shanchain-2");
    assert_eq!(root.total_integral, 9_000);
    assert_eq!(root.rest_integral, 9_000);
    assert_eq!(ledger.get_user("10086").unwrap().integral, 1_100);
}

// ---------------------------------------------------------------------------
// 7. Stored Bytes Stay Wire-Compatible
// ---------------------------------------------------------------------------

#[test]
fn stored_bytes_stay_wire_compatible() {
    let (ledger, store) = setup();

    ledger.initialize("shanchain", 50_000).unwrap();
    ledger.create_user("10086", "china mobile", 100).unwrap();

    // Consumers of the old deployment read these exact shapes.
    let root_raw = store.get(keys::ROOT).unwrap().expect("root bytes");
    assert_eq!(
        String::from_utf8(root_raw).unwrap(),
        r#"{"ID":"0001","Name":"shanchain","TotalIntegral":50000,"RestIntegral":50000}"#
    );

    let user_raw = store.get(&keys::user("10086")).unwrap().expect("user bytes");
    assert_eq!(
        String::from_utf8(user_raw).unwrap(),
        r#"{"ID":"10086","Name":"china mobile","Integral":100}"#
    );

    ledger.exchange("call-1", "10086", 40).unwrap();
    let tx_raw = store
        .get(&keys::transaction("call-1"))
        .unwrap()
        .expect("tx bytes");
    let tx_json: serde_json::Value = serde_json::from_slice(&tx_raw).unwrap();
    assert_eq!(tx_json["ID"], "call-1");
    assert_eq!(tx_json["Step"], 0);
    assert_eq!(tx_json["Integral"], 40);
    assert_eq!(tx_json["FromType"], 0);
    assert_eq!(tx_json["FromID"], "0001");
    assert_eq!(tx_json["ToType"], 1);
    assert_eq!(tx_json["ToID"], "10086");
}

// ---------------------------------------------------------------------------
// 8. Audit Trail Accumulates Across Movements
// ---------------------------------------------------------------------------

#[test]
fn audit_trail_accumulates_across_movements() {
    let (ledger, _store) = setup();

    ledger.initialize("shanchain", 50_000).unwrap();
    ledger.create_user("10086", "china mobile", 0).unwrap();
    ledger.create_user("10000", "sinopec", 0).unwrap();

    for i in 1..=5i64 {
        let call_id = format!("exchange-{i}");
        ledger.exchange(&call_id, "10086", i * 10).unwrap();
    }
    ledger.transfer("transfer-1", "10086", "10000", 30).unwrap();

    // Every record is retrievable and carries its own amounts.
    for i in 1..=5i64 {
        let record = ledger.get_transaction(&format!("exchange-{i}")).unwrap();
        assert_eq!(record.integral, i * 10);
        assert_eq!(record.to_id, "10086");
    }
    let moved = ledger.get_transaction("transfer-1").unwrap();
    assert_eq!(moved.from_id, "10086");
    assert_eq!(moved.to_id, "10000");

    // 10 + 20 + 30 + 40 + 50 issued to 10086, 30 passed on.
    assert_eq!(ledger.get_user("10086").unwrap().integral, 120);
    assert_eq!(ledger.get_user("10000").unwrap().integral, 30);
    assert_eq!(ledger.get_root().unwrap().rest_integral, 49_850);
}
