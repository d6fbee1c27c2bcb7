
use serde_json::json;
use soltrace::ast::{AstBuilder, NodeKind, NodeRef};
use soltrace::config::InterpreterConfig;
use soltrace::interpreter::{
    Callback, ErrorPolicy, EvaluationError, FullInterpreter, InterpreterError, RunMode,
    TransactionRunner, Value,
};
use soltrace::trace::EmittedEvent;
use tempfile::TempDir;
use test_helpers::*;

fn trace_json(interpreter: &FullInterpreter<'_>) -> serde_json::Value {
    let mut buffer = Vec::new();
    interpreter.finish_to_writer(&mut buffer).unwrap();
    serde_json::from_slice(&buffer).unwrap()
}

#[test]
fn test_storage_reads_initializer() {
    let ast = counter_contract();
    let transactions = vec![call("Counter", "f", vec![])];
    let mut interpreter = FullInterpreter::new(&ast, &transactions, InterpreterConfig::default());

    interpreter.run().unwrap();

    let count = interpreter.global_environment().get_by_name("count").unwrap();
    assert_eq!(count.current(), Some(&Value::uint(5)));
    assert_eq!(
        trace_json(&interpreter),
        json!([{ "event": "Changed", "args": { "0": 5 } }])
    );
}

#[test]
fn test_parameters_bound_per_transaction() {
    let ast = observer_contract();
    let transactions = vec![
        call("Observer", "f", vec![Value::uint(1)]),
        call("Observer", "f", vec![Value::uint(2)]),
    ];
    let mut interpreter = FullInterpreter::new(&ast, &transactions, InterpreterConfig::default());

    interpreter.run().unwrap();
    assert_eq!(
        trace_json(&interpreter),
        json!([
            { "event": "Seen", "args": { "0": 1, "1": 1 } },
            { "event": "Seen", "args": { "0": 2, "1": 2 } }
        ])
    );
}

#[test]
fn test_events_follow_transaction_order() {
    let ast = counter_contract();
    let transactions: Vec<_> = (0..4).map(|_| call("Counter", "f", vec![])).collect();
    let mut interpreter = FullInterpreter::new(&ast, &transactions, InterpreterConfig::default());

    interpreter.run().unwrap();
    let events = interpreter.trace().events();
    assert_eq!(events.len(), 4);
    assert!(events
        .iter()
        .all(|event| *event == EmittedEvent::new("Changed").with_arg(Value::uint(5))));
}

#[test]
fn test_arguments_keep_order_and_values() {
    let ast = ledger_contract();
    let transactions = vec![
        call("Ledger", "f", vec![Value::uint(4)]),
        call("Ledger", "f", vec![Value::uint(40)]),
    ];
    let mut interpreter = FullInterpreter::new(&ast, &transactions, InterpreterConfig::default());

    interpreter.run().unwrap();
    assert_eq!(
        trace_json(&interpreter),
        json!([
            { "event": "Sum", "args": { "0": 14 } },
            { "event": "Offset", "args": { "0": -6 } },
            { "event": "Flag", "args": { "0": false } },
            { "event": "Sum", "args": { "0": 50 } },
            { "event": "Offset", "args": { "0": -6 } },
            { "event": "Flag", "args": { "0": true } }
        ])
    );
}

#[test]
fn test_return_short_circuits_siblings() {
    let mut skipped = None;
    let ast = single_function_contract(|ast| {
        let before = ast.emit("Before", vec![]);
        let value = ast.literal(Value::uint(3));
        let ret = ast.ret(Some(value));
        let after = ast.emit("After", vec![]);
        skipped = Some(after.id());
        vec![before, ret, after]
    });
    let transactions = vec![call("C", "f", vec![])];
    let mut interpreter = FullInterpreter::new(&ast, &transactions, InterpreterConfig::default());

    let result = interpreter.interpret_transaction(&transactions[0]).unwrap();
    assert_eq!(result, Some(Value::uint(3)));
    assert!(!interpreter.coverage().is_covered(skipped.unwrap()));
    let names: Vec<&str> = interpreter
        .trace()
        .events()
        .iter()
        .map(|event| event.event.as_str())
        .collect();
    assert_eq!(names, vec!["Before"]);
}

#[test]
fn test_return_in_nested_block_stops_enclosing_siblings() {
    let mut skipped = None;
    let ast = single_function_contract(|ast| {
        let inner_emit = ast.emit("A", vec![]);
        let value = ast.literal(Value::uint(1));
        let ret = ast.ret(Some(value));
        let nested = ast.nested_block(vec![inner_emit, ret]);
        let after = ast.emit("C", vec![]);
        skipped = Some(after.id());
        vec![nested, after]
    });
    let transactions = vec![call("C", "f", vec![])];
    let mut interpreter = FullInterpreter::new(&ast, &transactions, InterpreterConfig::default());

    let result = interpreter.interpret_transaction(&transactions[0]).unwrap();
    assert_eq!(result, Some(Value::uint(1)));
    assert!(!interpreter.coverage().is_covered(skipped.unwrap()));
    assert_eq!(interpreter.trace().events(), &[EmittedEvent::new("A")]);
}

#[test]
fn test_unsupported_node_leaves_no_partial_events() {
    let mut ast = AstBuilder::new();
    let good = ast.emit("Good", vec![]);
    let ok = ast.function("ok", vec![], vec![good]);
    let partial = ast.emit("Partial", vec![]);
    let condition = ast.literal(Value::Bool(true));
    let then = ast.emit("Then", vec![]);
    let branch = ast.if_statement(condition, then, None);
    let branch_id = branch.id();
    let bad = ast.function("bad", vec![], vec![partial, branch]);
    let contract = ast.contract("C", vec![], vec![], vec![ok, bad]);
    let unit = AstBuilder::source_unit(vec![contract]);

    let transactions = vec![call("C", "ok", vec![]), call("C", "bad", vec![])];
    let mut interpreter = FullInterpreter::new(&unit, &transactions, InterpreterConfig::default());

    assert_eq!(
        interpreter.interpret_transaction(&transactions[0]).unwrap(),
        None
    );
    assert_eq!(
        interpreter.interpret_transaction(&transactions[1]),
        Err(InterpreterError::UnsupportedNode {
            kind: NodeKind::IfStatement,
            id: branch_id,
        })
    );
    assert_eq!(interpreter.trace().events(), &[EmittedEvent::new("Good")]);
    assert_eq!(interpreter.call_stack_depth(), 0);
}

#[test]
fn test_failed_run_discards_trace() {
    let ast = overflow_contract();
    let transactions = vec![call("Overflow", "f", vec![])];
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("trace.json");
    let config = InterpreterConfig::default().with_trace_output(&output);
    let mut interpreter = FullInterpreter::new(&ast, &transactions, config);

    assert!(matches!(
        interpreter.run(),
        Err(InterpreterError::Evaluation(EvaluationError::Overflow { .. }))
    ));
    assert_eq!(interpreter.call_stack_depth(), 0);
    assert_eq!(
        TransactionRunner::finish(&mut interpreter),
        Err(InterpreterError::TraceDiscarded)
    );
    assert!(!output.exists());
}

#[test]
fn test_run_requires_transactions() {
    let ast = counter_contract();
    let mut interpreter = FullInterpreter::new(&ast, &[], InterpreterConfig::default());
    assert_eq!(interpreter.run(), Err(InterpreterError::NoTransactions));
}

#[test]
fn test_run_rejects_mixed_contracts() {
    let ast = counter_contract();
    let transactions = vec![call("Counter", "f", vec![]), call("Other", "f", vec![])];
    let mut interpreter = FullInterpreter::new(&ast, &transactions, InterpreterConfig::default());

    assert_eq!(
        interpreter.run(),
        Err(InterpreterError::MultipleContracts {
            expected: "Counter".to_string(),
            found: "Other".to_string(),
        })
    );
    assert!(interpreter.coverage().is_empty());
}

#[test]
fn test_identical_runs_produce_identical_traces() {
    let ast = overflow_contract();
    let transactions: Vec<_> = (0..3).map(|_| call("Overflow", "f", vec![])).collect();
    let config = InterpreterConfig::default()
        .with_seed(42)
        .with_error_policy(ErrorPolicy::Substitute);

    let render = || {
        let mut interpreter = FullInterpreter::new(&ast, &transactions, config.clone());
        interpreter.run().unwrap();
        let mut buffer = Vec::new();
        interpreter.finish_to_writer(&mut buffer).unwrap();
        buffer
    };

    let first = render();
    assert_eq!(first, render());

    let events: serde_json::Value = serde_json::from_slice(&first).unwrap();
    for event in events.as_array().unwrap() {
        let value = event["args"]["0"].as_u64().unwrap();
        assert!(value <= 255);
    }
}

#[test]
fn test_finish_writes_configured_path() {
    let ast = counter_contract();
    let transactions = vec![call("Counter", "f", vec![])];
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out").join("interpretation.json");
    let config = InterpreterConfig::default().with_trace_output(&output);
    let mut interpreter = FullInterpreter::new(&ast, &transactions, config);

    {
        let mut callback = Callback::Full(&mut interpreter);
        callback.run().unwrap();
        callback.finish().unwrap();
    }

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written, json!([{ "event": "Changed", "args": { "0": 5 } }]));
}

#[test]
fn test_navigation_callbacks_rejected_in_full_mode() {
    let ast = counter_contract();
    let transactions = vec![call("Counter", "f", vec![])];
    let mut interpreter = FullInterpreter::new(&ast, &transactions, InterpreterConfig::default());
    let function = &ast.contracts[0].functions[0];

    let mut callback = Callback::Full(&mut interpreter);
    assert_eq!(callback.mode(), RunMode::FullInterpretation);

    let expected = |name: &'static str| -> Result<(), InterpreterError> {
        Err(InterpreterError::InvalidInvocation {
            callback: name,
            mode: RunMode::FullInterpretation,
        })
    };
    assert_eq!(
        callback.visit_node_before_processing(NodeRef::Function(function)),
        expected("visit_node_before_processing")
    );
    assert_eq!(
        callback.visit_node_after_processing(NodeRef::Function(function)),
        expected("visit_node_after_processing")
    );
    assert_eq!(
        callback.next_target_statement().map(|_| ()),
        expected("next_target_statement")
    );
}

#[test]
fn test_call_stack_empty_after_each_transaction() {
    let ast = observer_contract();
    let transactions = vec![
        call("Observer", "f", vec![Value::uint(1)]),
        call("Observer", "f", vec![]),
    ];
    let mut interpreter = FullInterpreter::new(&ast, &transactions, InterpreterConfig::default());

    interpreter.interpret_transaction(&transactions[0]).unwrap();
    assert_eq!(interpreter.call_stack_depth(), 0);

    assert!(matches!(
        interpreter.interpret_transaction(&transactions[1]),
        Err(InterpreterError::ArgumentMismatch { .. })
    ));
    assert_eq!(interpreter.call_stack_depth(), 0);
}
