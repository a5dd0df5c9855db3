//! Tests for the pair-to-AST builder

use sql_syntax::{
    ParseError,
    ast::{ComparisonOp, Expr, JoinKind, Literal, Quantifier, SelectItem, SetExpr, TableFactor},
    parse,
};

#[test]
fn test_build_simple_select() {
    let query = parse("SELECT * FROM Movies WHERE year = 2003").unwrap();
    let select = query.as_select().expect("plain select");

    assert_eq!(select.projection, vec![SelectItem::Wildcard]);
    assert!(matches!(
        &select.from,
        Some(TableFactor::Table { name, alias: None }) if name.base() == "Movies"
    ));

    match select.selection.as_deref() {
        Some(Expr::Comparison { op, right, .. }) => {
            assert_eq!(*op, ComparisonOp::Eq);
            assert_eq!(**right, Expr::Literal(Literal::Integer(2003)));
        }
        other => panic!("Expected comparison, got {:?}", other),
    }
}

#[test]
fn test_build_joins() {
    let query = parse(
        "SELECT * FROM a JOIN b ON a.id = b.id LEFT OUTER JOIN c ON c.id = b.id, d CROSS JOIN e",
    )
    .unwrap();
    let select = query.as_select().unwrap();

    let kinds: Vec<JoinKind> = select.joins.iter().map(|j| j.kind).collect();
    assert_eq!(
        kinds,
        vec![
            JoinKind::Inner,
            JoinKind::Left,
            JoinKind::Simple,
            JoinKind::Cross
        ]
    );
    assert!(select.joins[0].on.is_some());
    assert!(select.joins[2].on.is_none());
    assert_eq!(select.exposed_names(), vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn test_build_aliases_and_nested_join() {
    let query =
        parse("SELECT m.title AS t FROM (Movies m JOIN Ratings r ON m.id = r.movie_id) x").unwrap();
    let select = query.as_select().unwrap();

    match &select.projection[0] {
        SelectItem::Expr { alias, .. } => assert_eq!(alias.as_deref(), Some("t")),
        other => panic!("Expected aliased expression, got {:?}", other),
    }
    assert_eq!(select.exposed_names(), vec!["x"]);

    let unaliased = parse("SELECT * FROM (Movies m JOIN Ratings r ON m.id = r.movie_id)").unwrap();
    assert_eq!(unaliased.as_select().unwrap().exposed_names(), vec!["m", "r"]);
}

#[test]
fn test_not_exists_is_folded() {
    let query = parse("SELECT * FROM t WHERE NOT EXISTS (SELECT 1 FROM s)").unwrap();
    let selection = query.as_select().unwrap().selection.clone().unwrap();
    assert!(matches!(
        selection.as_ref(),
        Expr::Exists { negated: true, .. }
    ));
}

#[test]
fn test_quantified_comparison() {
    let query = parse("SELECT * FROM t WHERE a >= SOME (SELECT b FROM s)").unwrap();
    let selection = query.as_select().unwrap().selection.clone().unwrap();
    match selection.as_ref() {
        Expr::Quantified { op, quantifier, .. } => {
            assert_eq!(*op, ComparisonOp::GtEq);
            assert_eq!(*quantifier, Quantifier::Any);
        }
        other => panic!("Expected quantified comparison, got {:?}", other),
    }
}

#[test]
fn test_set_operation_is_left_associative() {
    let query = parse("SELECT a FROM t UNION SELECT a FROM s INTERSECT SELECT a FROM u").unwrap();
    match &query.body {
        SetExpr::SetOperation { left, right, .. } => {
            assert!(matches!(left.as_ref(), SetExpr::SetOperation { .. }));
            assert!(matches!(right.as_ref(), SetExpr::Select(_)));
        }
        other => panic!("Expected set operation, got {:?}", other),
    }
}

#[test]
fn test_keyword_flags_and_clause_operands() {
    let query = parse(
        "SELECT DISTINCT a FROM t WHERE a > 1 ORDER BY a DESC, b ASC, c LIMIT 10 OFFSET 5",
    )
    .unwrap();
    let select = query.as_select().expect("plain select");

    assert!(select.distinct);
    assert!(select.selection.is_some());
    let directions: Vec<Option<bool>> = query.order_by.iter().map(|o| o.descending).collect();
    assert_eq!(directions, vec![Some(true), Some(false), None]);
    assert_eq!(query.limit.as_deref(), Some(&Expr::Literal(Literal::Integer(10))));
    assert_eq!(query.offset.as_deref(), Some(&Expr::Literal(Literal::Integer(5))));

    let union = parse("SELECT a FROM t UNION ALL SELECT a FROM s").unwrap();
    assert!(matches!(union.body, SetExpr::SetOperation { all: true, .. }));
}

#[test]
fn test_large_integers_become_decimals() {
    let query = parse("SELECT * FROM t WHERE a = 99999999999999999999").unwrap();
    let selection = query.as_select().unwrap().selection.clone().unwrap();
    match selection.as_ref() {
        Expr::Comparison { right, .. } => {
            assert!(matches!(right.as_ref(), Expr::Literal(Literal::Decimal(_))))
        }
        other => panic!("Expected comparison, got {:?}", other),
    }
}

#[test]
fn test_unsupported_statements() {
    for (sql, keyword) in [
        ("INSERT INTO t VALUES (1)", "INSERT"),
        ("update t set a = 1", "UPDATE"),
        ("DELETE FROM t", "DELETE"),
        ("CREATE TABLE t (a INT)", "CREATE"),
        ("WITH x AS (SELECT 1) SELECT * FROM x", "WITH"),
    ] {
        assert_eq!(
            parse(sql),
            Err(ParseError::UnsupportedStatement(keyword.to_string())),
            "{}",
            sql
        );
    }
}

#[test]
fn test_syntax_errors_carry_position() {
    match parse("SELECT *\nFROM t WHERE a = = 1") {
        Err(ParseError::Syntax { line, .. }) => assert_eq!(line, 2),
        other => panic!("Expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_join_without_on_is_rejected() {
    assert!(matches!(
        parse("SELECT * FROM a JOIN b"),
        Err(ParseError::Syntax { .. })
    ));
}
