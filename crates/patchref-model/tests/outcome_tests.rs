use super::*;

#[test]
fn test_found_has_no_diagnostic() {
    let loc = SourceLocation::new("P.cs", 0, 1);
    assert!(ResolutionOutcome::Found.to_diagnostic(loc).is_none());
    assert_eq!(ResolutionOutcome::Found.diagnostic_code(), None);
}

#[test]
fn test_outcomes_map_to_codes() {
    let cases = [
        (
            ResolutionOutcome::member_not_found("A", "b"),
            DiagnosticCode::MemberNotFound,
        ),
        (
            ResolutionOutcome::AssemblyNotFound {
                assembly: "Lib".into(),
                type_name: "A".into(),
            },
            DiagnosticCode::AssemblyNotFound,
        ),
        (ResolutionOutcome::type_not_found("A"), DiagnosticCode::TypeNotFound),
        (
            ResolutionOutcome::MissingGetter {
                member_name: "P".into(),
            },
            DiagnosticCode::MissingGetter,
        ),
        (
            ResolutionOutcome::MissingSetter {
                member_name: "P".into(),
            },
            DiagnosticCode::MissingSetter,
        ),
        (
            ResolutionOutcome::WrongFieldType {
                owner: "A".into(),
                expected: "System.Boolean".into(),
                actual: "System.String".into(),
            },
            DiagnosticCode::WrongFieldType,
        ),
        (
            ResolutionOutcome::MissingConstructor {
                type_name: "A".into(),
            },
            DiagnosticCode::MissingConstructor,
        ),
        (
            ResolutionOutcome::MissingStaticConstructor {
                type_name: "A".into(),
            },
            DiagnosticCode::MissingConstructor,
        ),
    ];
    for (outcome, code) in cases {
        assert_eq!(outcome.diagnostic_code(), Some(code), "{outcome:?}");
    }
}

#[test]
fn test_diagnostic_message_text() {
    let loc = SourceLocation::new("P.cs", 5, 10);
    let diag = ResolutionOutcome::WrongFieldType {
        owner: "Game.Player".into(),
        expected: "System.Boolean".into(),
        actual: "System.String".into(),
    }
    .to_diagnostic(loc.clone())
    .expect("failure");
    assert_eq!(diag.location, loc);
    assert_eq!(
        diag.message_text,
        "Field on type 'Game.Player' is declared as 'System.String', not 'System.Boolean'."
    );
}

#[test]
fn test_with_owner_name_rewrites_owner_scoped_failures() {
    let rewritten = ResolutionOutcome::member_not_found("Base", "x").with_owner_name("Derived");
    assert_eq!(rewritten, ResolutionOutcome::member_not_found("Derived", "x"));

    let getter = ResolutionOutcome::MissingGetter {
        member_name: "P".into(),
    };
    assert_eq!(getter.clone().with_owner_name("Derived"), getter);
}
