//! Rendering tests: canonical text and parse/render stability

use sql_syntax::{parse, to_sql};

fn canonical(sql: &str) -> String {
    to_sql(&parse(sql).unwrap_or_else(|e| panic!("Failed to parse {}: {}", sql, e)))
}

#[test]
fn test_canonical_keywords_and_spacing() {
    assert_eq!(
        canonical("select   *  from Movies where year=2003"),
        "SELECT * FROM Movies WHERE year = 2003"
    );
    assert_eq!(
        canonical("SELECT a FROM t WHERE b != 1"),
        "SELECT a FROM t WHERE b <> 1"
    );
}

#[test]
fn test_join_rendering() {
    assert_eq!(
        canonical("SELECT * FROM a JOIN b ON a.id=b.id left outer join c on c.id=b.id"),
        "SELECT * FROM a INNER JOIN b ON a.id = b.id LEFT JOIN c ON c.id = b.id"
    );
    assert_eq!(
        canonical("SELECT * FROM Movies m, Ratings AS r"),
        "SELECT * FROM Movies AS m, Ratings AS r"
    );
}

#[test]
fn test_parentheses_are_preserved_not_invented() {
    assert_eq!(
        canonical("SELECT * FROM t WHERE (a = 1 OR b = 2) AND c = 3"),
        "SELECT * FROM t WHERE (a = 1 OR b = 2) AND c = 3"
    );
    assert_eq!(
        canonical("SELECT * FROM t WHERE a = 1 OR b = 2 AND c = 3"),
        "SELECT * FROM t WHERE a = 1 OR b = 2 AND c = 3"
    );
}

#[test]
fn test_subqueries_and_aggregates() {
    assert_eq!(
        canonical(
            "select dept, count(distinct name) from emp where id in (select id from x) group by dept having count(*) > 1"
        ),
        "SELECT dept, count(DISTINCT name) FROM emp WHERE id IN (SELECT id FROM x) GROUP BY dept HAVING count(*) > 1"
    );
}

#[test]
fn test_render_is_stable() {
    let queries = [
        "SELECT * FROM t WHERE a BETWEEN -1 AND 1.50 AND b NOT IN (1, 2)",
        "SELECT DISTINCT t.a, s.* FROM t LEFT JOIN s ON t.id = s.id AND s.b IS NOT NULL",
        "SELECT a FROM t WHERE NOT (a LIKE 'x''%' OR a IS NULL) ORDER BY a DESC LIMIT 5",
        "SELECT a FROM t UNION ALL SELECT b FROM s EXCEPT SELECT c FROM u",
        "SELECT * FROM t WHERE a > ALL (SELECT b FROM s) AND NOT EXISTS (SELECT 1 FROM u)",
        "SELECT * FROM (SELECT a FROM t) AS d, (a JOIN b ON a.x = b.x) WHERE d.a - (1 - 2) > 0",
        "SELECT \"order\", \"first name\" FROM \"select\"",
    ];

    for sql in queries {
        let once = canonical(sql);
        let twice = canonical(&once);
        assert_eq!(once, twice, "rendering of {} is not stable", sql);
    }
}
