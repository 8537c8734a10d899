//! Parse / print / serialize round trips

use pretty_assertions::assert_eq;
use quill_syntax::ast::{Script, Stmt, VersionedScript, AST_VERSION};
use quill_syntax::parser::Parser;
use quill_syntax::printer::Printer;
use rstest::rstest;

fn parse(source: &str) -> Script {
    let (script, diags) = Parser::new(source).parse();
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    script
}

#[rstest]
#[case::command("add 2 3\n")]
#[case::assignment("x = 1 + 2 * 3\n")]
#[case::conditional("if x > 1\n    tick\nelse\n    tock\nend\n")]
#[case::function("fn f(a, b)\n    return a + b\nend\n")]
#[case::handler("@throttle(100)\non tick\n    advance\nend\n")]
fn test_print_of_canonical_source_is_stable(#[case] source: &str) {
    let script = parse(source);
    let printer = Printer::default();
    let printed: String = script
        .statements
        .iter()
        .filter_map(|stmt| printer.print_stmt(stmt, 0))
        .collect();
    assert_eq!(printed, source);
}

#[test]
fn test_versioned_json_round_trip() {
    let script = parse("# setup\nscore = 0\nadd score 10  # bump\n");
    let json = VersionedScript::new(script.clone()).to_json().unwrap();
    assert!(json.contains("\"ast_version\""));

    let restored = VersionedScript::from_json(&json).unwrap();
    assert_eq!(restored.ast_version, AST_VERSION);
    assert_eq!(restored.script, script);
}

#[test]
fn test_json_uses_snake_case_type_tags() {
    let script = parse("# group\n\ntick\n");
    let json = VersionedScript::new(script).to_json().unwrap();
    assert!(json.contains("\"comment_group\""));
    assert!(json.contains("\"command\""));
}

#[test]
fn test_positions_survive_serialization() {
    let script = parse("add 2 3\n");
    let json = VersionedScript::new(script.clone()).to_json().unwrap();
    let restored = VersionedScript::from_json(&json).unwrap();
    match (&restored.script.statements[0], &script.statements[0]) {
        (Stmt::Command(a), Stmt::Command(b)) => assert_eq!(a.pos, b.pos),
        other => panic!("unexpected statements: {:?}", other),
    }
}
