use super::*;
use crate::call_site::Argument;
use patchref_common::SourceLocation;

fn call(start: u32) -> FallbackExpr {
    FallbackExpr::Call(CallSite::invocation(
        SourceLocation::new("Patches.cs", start, 5),
        "Field",
        vec![],
        vec![Argument::String(format!("Game.Player:field{start}"))],
    ))
}

fn starts(expr: &FallbackExpr) -> Vec<u32> {
    expr.flatten().iter().map(|site| site.location.start).collect()
}

#[test]
fn test_flatten_left_to_right() {
    // (a ?? b) ?? (c ?? d)
    let chain = FallbackExpr::coalesce(
        FallbackExpr::coalesce(call(0), call(10)),
        FallbackExpr::coalesce(call(20), call(30)),
    );
    assert_eq!(starts(&chain), vec![0, 10, 20, 30]);
}

#[test]
fn test_right_nested_chain() {
    // a ?? (b ?? c), the usual parse of `a ?? b ?? c`
    let chain = FallbackExpr::coalesce(call(0), FallbackExpr::coalesce(call(10), call(20)));
    assert_eq!(starts(&chain), vec![0, 10, 20]);
}

#[test]
fn test_other_operands_are_skipped() {
    let chain = FallbackExpr::coalesce(call(0), FallbackExpr::Other);
    assert_eq!(starts(&chain), vec![0]);
    assert!(FallbackExpr::Other.flatten().is_empty());
}

#[test]
fn test_chain_from_json() {
    let json = r#"{
        "expr": "coalesce",
        "left": {
            "expr": "call",
            "location": { "file": "Patches.cs", "start": 4, "length": 9 },
            "call": "invocation",
            "method": "Field",
            "args": [{ "kind": "string", "value": "Game.Player:hp" }]
        },
        "right": { "expr": "other" }
    }"#;
    let chain: FallbackExpr = serde_json::from_str(json).unwrap();
    let sites = chain.flatten();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].location, SourceLocation::new("Patches.cs", 4, 9));
    assert_eq!(
        sites[0].call,
        crate::call_site::Call::Invocation {
            method: "Field".into(),
            generic_args: vec![],
            args: vec![Argument::String("Game.Player:hp".into())],
        }
    );
}
