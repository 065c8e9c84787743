//! Invocation dispatch: the stringly-typed wire surface.
//!
//! Callers address the ledger by function name plus a positional string
//! argument list; this module owns the name table, the arity checks, and
//! the argument parsing, then routes to the typed engine methods. The
//! names are load-bearing: existing clients were built against them.
//!
//! ```text
//! function        args                           reply
//! --------------  -----------------------------  -----------
//! init            [name, total]                  Root
//! additional      [amount]                       Root
//! createUser      [id, name, integral]           User
//! exchange        [recipient, amount]            Transaction
//! transfer        [sender, recipient, amount]    Transaction
//! getRoot         []                             Root
//! getUser         [id]                           User
//! getTransaction  [call id]                      Transaction
//! ```

use serde::Serialize;

use crate::ledger::{parse_integral, Ledger, LedgerError, LedgerResult};
use crate::record::{Root, Transaction, User};
use crate::storage::StateStore;

// ---------------------------------------------------------------------------
// Invocation envelope
// ---------------------------------------------------------------------------

/// A single ledger invocation as it arrives off the wire.
///
/// `call_id` is assigned by the hosting shell, one per invocation; a
/// movement's transaction record is stored under it.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Wire function name, matched verbatim.
    pub function: String,
    /// Positional string arguments.
    pub args: Vec<String>,
    /// Shell-assigned execution id.
    pub call_id: String,
}

impl Invocation {
    pub fn new(
        function: impl Into<String>,
        args: Vec<String>,
        call_id: impl Into<String>,
    ) -> Self {
        Self {
            function: function.into(),
            args,
            call_id: call_id.into(),
        }
    }
}

/// Reply from a dispatched invocation.
///
/// Untagged on purpose: a reply serializes as the bare record, exactly
/// what legacy clients parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DispatchReply {
    Root(Root),
    User(User),
    Transaction(Transaction),
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Routes an invocation to the engine method behind its wire name.
///
/// Unknown names and wrong arities are rejected here, before any
/// argument is parsed; everything else is the engine's verdict.
pub fn dispatch<S: StateStore>(
    ledger: &Ledger<S>,
    call: &Invocation,
) -> LedgerResult<DispatchReply> {
    let args = &call.args;
    match call.function.as_str() {
        "init" => {
            expect_args(call, 2)?;
            let total = parse_integral(&args[1])?;
            Ok(DispatchReply::Root(ledger.initialize(&args[0], total)?))
        }
        "additional" => {
            expect_args(call, 1)?;
            let amount = parse_integral(&args[0])?;
            Ok(DispatchReply::Root(ledger.issue(amount)?))
        }
        "createUser" => {
            expect_args(call, 3)?;
            let integral = parse_integral(&args[2])?;
            Ok(DispatchReply::User(ledger.create_user(
                &args[0], &args[1], integral,
            )?))
        }
        "exchange" => {
            expect_args(call, 2)?;
            let amount = parse_integral(&args[1])?;
            Ok(DispatchReply::Transaction(ledger.exchange(
                &call.call_id,
                &args[0],
                amount,
            )?))
        }
        "transfer" => {
            expect_args(call, 3)?;
            let amount = parse_integral(&args[2])?;
            Ok(DispatchReply::Transaction(ledger.transfer(
                &call.call_id,
                &args[0],
                &args[1],
                amount,
            )?))
        }
        "getRoot" => {
            expect_args(call, 0)?;
            Ok(DispatchReply::Root(ledger.get_root()?))
        }
        "getUser" => {
            expect_args(call, 1)?;
            Ok(DispatchReply::User(ledger.get_user(&args[0])?))
        }
        "getTransaction" => {
            expect_args(call, 1)?;
            Ok(DispatchReply::Transaction(ledger.get_transaction(&args[0])?))
        }
        other => Err(LedgerError::UnknownFunction(other.to_string())),
    }
}

fn expect_args(call: &Invocation, expected: usize) -> LedgerResult<()> {
    if call.args.len() != expected {
        return Err(LedgerError::WrongArgumentCount {
            function: call.function.clone(),
            expected,
            actual: call.args.len(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AccountKind;
    use crate::storage::{LedgerRepository, SledStore};
    use serde_json::json;

    fn fresh() -> Ledger<SledStore> {
        Ledger::new(LedgerRepository::new(
            SledStore::open_temporary().expect("temp store"),
        ))
    }

    fn invoke<S: crate::storage::StateStore>(
        ledger: &Ledger<S>,
        function: &str,
        args: &[&str],
    ) -> LedgerResult<DispatchReply> {
        invoke_as(ledger, function, args, "call-0")
    }

    fn invoke_as<S: crate::storage::StateStore>(
        ledger: &Ledger<S>,
        function: &str,
        args: &[&str],
        call_id: &str,
    ) -> LedgerResult<DispatchReply> {
        let call = Invocation::new(
            function,
            args.iter().map(|s| s.to_string()).collect(),
            call_id,
        );
        dispatch(ledger, &call)
    }

    #[test]
    fn init_routes_to_initialize() {
        let ledger = fresh();
        let reply = invoke(&ledger, "init", &["shanchain", "50000"]).unwrap();
        match reply {
            DispatchReply::Root(root) => {
                assert_eq!(root.name, "shanchain");
                assert_eq!(root.rest_integral, 50_000);
            }
            other => panic!("expected Root reply, got {:?}", other),
        }
    }

    #[test]
    fn unknown_function_is_rejected() {
        let ledger = fresh();
        match invoke(&ledger, "frobnicate", &[]) {
            Err(LedgerError::UnknownFunction(name)) => assert_eq!(name, "frobnicate"),
            other => panic!("expected UnknownFunction, got {:?}", other),
        }
    }

    #[test]
    fn function_names_match_case_sensitively() {
        let ledger = fresh();
        match invoke(&ledger, "getroot", &[]) {
            Err(LedgerError::UnknownFunction(name)) => assert_eq!(name, "getroot"),
            other => panic!("expected UnknownFunction, got {:?}", other),
        }
    }

    #[test]
    fn every_function_enforces_its_arity() {
        let ledger = fresh();
        let table: &[(&str, usize)] = &[
            ("init", 2),
            ("additional", 1),
            ("createUser", 3),
            ("exchange", 2),
            ("transfer", 3),
            ("getRoot", 0),
            ("getUser", 1),
            ("getTransaction", 1),
        ];
        for &(function, expected) in table {
            let extra = vec!["x"; expected + 1];
            match invoke(&ledger, function, &extra) {
                Err(LedgerError::WrongArgumentCount {
                    function: got_fn,
                    expected: got_expected,
                    actual,
                }) => {
                    assert_eq!(got_fn, function);
                    assert_eq!(got_expected, expected);
                    assert_eq!(actual, expected + 1);
                }
                other => panic!("expected WrongArgumentCount for {}, got {:?}", function, other),
            }
        }
    }

    #[test]
    fn arity_is_checked_before_parsing() {
        let ledger = fresh();
        // Garbage amount, but the arity failure wins.
        match invoke(&ledger, "additional", &["nonsense", "extra"]) {
            Err(LedgerError::WrongArgumentCount { .. }) => {}
            other => panic!("expected WrongArgumentCount, got {:?}", other),
        }
    }

    #[test]
    fn malformed_amounts_are_rejected_at_the_boundary() {
        let ledger = fresh();
        match invoke(&ledger, "init", &["shanchain", "lots"]) {
            Err(LedgerError::MalformedAmount(raw)) => assert_eq!(raw, "lots"),
            other => panic!("expected MalformedAmount, got {:?}", other),
        }
    }

    #[test]
    fn exchange_stores_record_under_supplied_call_id() {
        let ledger = fresh();
        invoke(&ledger, "init", &["shanchain", "50000"]).unwrap();
        invoke(&ledger, "createUser", &["10086", "china mobile", "100"]).unwrap();
        invoke_as(&ledger, "exchange", &["10086", "200"], "call-42").unwrap();

        match invoke(&ledger, "getTransaction", &["call-42"]).unwrap() {
            DispatchReply::Transaction(record) => {
                assert_eq!(record.id, "call-42");
                assert_eq!(record.from_type, AccountKind::Root);
                assert_eq!(record.to_id, "10086");
                assert_eq!(record.integral, 200);
            }
            other => panic!("expected Transaction reply, got {:?}", other),
        }
    }

    #[test]
    fn full_lifecycle_over_wire_names() {
        let ledger = fresh();
        invoke(&ledger, "init", &["shanchain", "50000"]).unwrap();
        invoke(&ledger, "createUser", &["10086", "china mobile", "100"]).unwrap();
        invoke(&ledger, "createUser", &["10000", "sinopec", "200"]).unwrap();
        invoke(&ledger, "additional", &["1000"]).unwrap();
        invoke_as(&ledger, "exchange", &["10086", "300"], "call-1").unwrap();
        invoke_as(&ledger, "transfer", &["10086", "10000", "150"], "call-2").unwrap();

        match invoke(&ledger, "getRoot", &[]).unwrap() {
            DispatchReply::Root(root) => {
                assert_eq!(root.total_integral, 51_000);
                assert_eq!(root.rest_integral, 50_700);
            }
            other => panic!("expected Root reply, got {:?}", other),
        }
        match invoke(&ledger, "getUser", &["10086"]).unwrap() {
            DispatchReply::User(user) => assert_eq!(user.integral, 250),
            other => panic!("expected User reply, got {:?}", other),
        }
        match invoke(&ledger, "getUser", &["10000"]).unwrap() {
            DispatchReply::User(user) => assert_eq!(user.integral, 350),
            other => panic!("expected User reply, got {:?}", other),
        }
    }

    #[test]
    fn replies_serialize_as_bare_records() {
        let ledger = fresh();
        let reply = invoke(&ledger, "init", &["shanchain", "50000"]).unwrap();
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({
                "ID": "0001",
                "Name": "shanchain",
                "TotalIntegral": 50_000,
                "RestIntegral": 50_000,
            })
        );
    }
}
