use crate::{
    ast::{
        ArithmeticOp, ColumnRef, ComparisonOp, Expr, FunctionCall, Join, JoinKind, Literal,
        ObjectName, OrderByItem, Quantifier, Query, Select, SelectItem, SetExpr, SetOperator,
        TableFactor, UnaryOp,
    },
    errors::ParseError,
    parser::{Rule, SqlParser},
};
use bigdecimal::BigDecimal;
use pest::{Parser, iterators::Pair};
use std::{str::FromStr, sync::Arc};
use tracing::debug;

pub type BuildResult<T> = Result<T, ParseError>;

/// Parse a single SELECT statement into a typed AST
pub fn parse(input: &str) -> BuildResult<Query> {
    let mut pairs =
        SqlParser::parse(Rule::statement, input).map_err(ParseError::from_pest_error)?;

    let statement = pairs
        .next()
        .ok_or_else(|| ParseError::syntax("Empty input", 1, 1))?;

    for pair in statement.into_inner() {
        match pair.as_rule() {
            Rule::query => {
                let query = build_query(pair)?;
                debug!("Parsed query: {}", query);
                return Ok(query);
            }
            Rule::unsupported_statement => {
                let keyword = pair
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::unsupported_keyword)
                    .map(|p| p.as_str().to_uppercase())
                    .unwrap_or_default();
                return Err(ParseError::UnsupportedStatement(keyword));
            }
            _ => {}
        }
    }

    Err(ParseError::syntax("Empty input", 1, 1))
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_all
            | Rule::kw_and
            | Rule::kw_any
            | Rule::kw_as
            | Rule::kw_asc
            | Rule::kw_between
            | Rule::kw_by
            | Rule::kw_cross
            | Rule::kw_desc
            | Rule::kw_distinct
            | Rule::kw_except
            | Rule::kw_exists
            | Rule::kw_false
            | Rule::kw_from
            | Rule::kw_full
            | Rule::kw_group
            | Rule::kw_having
            | Rule::kw_in
            | Rule::kw_inner
            | Rule::kw_intersect
            | Rule::kw_is
            | Rule::kw_join
            | Rule::kw_left
            | Rule::kw_like
            | Rule::kw_limit
            | Rule::kw_minus
            | Rule::kw_not
            | Rule::kw_null
            | Rule::kw_offset
            | Rule::kw_on
            | Rule::kw_or
            | Rule::kw_order
            | Rule::kw_outer
            | Rule::kw_right
            | Rule::kw_select
            | Rule::kw_some
            | Rule::kw_true
            | Rule::kw_union
            | Rule::kw_where
    )
}

fn unexpected(pair: &Pair<Rule>) -> ParseError {
    let (line, column) = pair.line_col();
    ParseError::syntax(
        format!("Unexpected {:?}: '{}'", pair.as_rule(), pair.as_str()),
        line,
        column,
    )
}

fn missing(parent: &Pair<Rule>, what: &str) -> ParseError {
    let (line, column) = parent.line_col();
    ParseError::syntax(format!("Expected {}", what), line, column)
}

/// Children of `pair` with keyword tokens filtered out.
fn operands(pair: Pair<Rule>) -> impl Iterator<Item = Pair<Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule()))
}

fn has_keyword(pair: &Pair<Rule>, kw: Rule) -> bool {
    pair.clone().into_inner().any(|p| p.as_rule() == kw)
}

fn first_operand<'i>(pair: Pair<'i, Rule>, what: &str) -> BuildResult<Pair<'i, Rule>> {
    let context = pair.clone();
    operands(pair).next().ok_or_else(|| missing(&context, what))
}

// ----------------------------------------------------------------------------
// Queries
// ----------------------------------------------------------------------------

fn build_query(pair: Pair<Rule>) -> BuildResult<Query> {
    let mut body = None;
    let mut order_by = Vec::new();
    let mut limit = None;
    let mut offset = None;
    let context = pair.clone();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::set_expr => body = Some(build_set_expr(inner)?),
            Rule::order_by_clause => {
                for item in operands(inner) {
                    order_by.push(build_order_item(item)?);
                }
            }
            Rule::limit_clause => limit = Some(build_expr(first_operand(inner, "LIMIT value")?)?),
            Rule::offset_clause => {
                offset = Some(build_expr(first_operand(inner, "OFFSET value")?)?)
            }
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(Query {
        body: body.ok_or_else(|| missing(&context, "query body"))?,
        order_by,
        limit,
        offset,
    })
}

fn build_set_expr(pair: Pair<Rule>) -> BuildResult<SetExpr> {
    let context = pair.clone();
    let mut inner = pair.into_inner();
    let first = inner.next().ok_or_else(|| missing(&context, "SELECT"))?;
    let mut expr = build_set_term(first)?;

    while let Some(op_pair) = inner.next() {
        let all = has_keyword(&op_pair, Rule::kw_all);
        let op = build_set_operator(&op_pair)?;
        let term = inner
            .next()
            .ok_or_else(|| missing(&op_pair, "right-hand SELECT"))?;
        expr = SetExpr::SetOperation {
            op,
            all,
            left: Box::new(expr),
            right: Box::new(build_set_term(term)?),
        };
    }

    Ok(expr)
}

fn build_set_operator(pair: &Pair<Rule>) -> BuildResult<SetOperator> {
    let keyword = pair
        .clone()
        .into_inner()
        .next()
        .ok_or_else(|| missing(pair, "set operator"))?;
    match keyword.as_rule() {
        Rule::kw_union => Ok(SetOperator::Union),
        Rule::kw_intersect => Ok(SetOperator::Intersect),
        Rule::kw_except | Rule::kw_minus => Ok(SetOperator::Except),
        _ => Err(unexpected(&keyword)),
    }
}

fn build_set_term(pair: Pair<Rule>) -> BuildResult<SetExpr> {
    let inner = first_operand(pair, "SELECT")?;
    match inner.as_rule() {
        Rule::select => Ok(SetExpr::Select(Box::new(build_select(inner)?))),
        Rule::query => Ok(SetExpr::Query(Box::new(build_query(inner)?))),
        _ => Err(unexpected(&inner)),
    }
}

fn build_select(pair: Pair<Rule>) -> BuildResult<Select> {
    let mut select = Select {
        distinct: has_keyword(&pair, Rule::kw_distinct),
        ..Default::default()
    };

    for inner in operands(pair) {
        match inner.as_rule() {
            Rule::select_list => {
                for item in inner.into_inner() {
                    select.projection.push(build_select_item(item)?);
                }
            }
            Rule::from_clause => {
                let mut factors = operands(inner);
                if let Some(base) = factors.next() {
                    select.from = Some(build_table_factor(base)?);
                }
                for join in factors {
                    select.joins.push(build_join(join)?);
                }
            }
            Rule::where_clause => {
                select.selection = Some(build_expr(first_operand(inner, "WHERE condition")?)?)
            }
            Rule::group_by_clause => {
                for key in operands(inner) {
                    select.group_by.push(build_expr(key)?);
                }
            }
            Rule::having_clause => {
                select.having = Some(build_expr(first_operand(inner, "HAVING condition")?)?)
            }
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(select)
}

fn build_select_item(pair: Pair<Rule>) -> BuildResult<SelectItem> {
    let context = pair.clone();
    let mut inner = pair.into_inner();
    let first = inner.next().ok_or_else(|| missing(&context, "select item"))?;

    match first.as_rule() {
        Rule::wildcard => Ok(SelectItem::Wildcard),
        Rule::qualified_wildcard => Ok(SelectItem::QualifiedWildcard(build_object_name(first)?)),
        Rule::expr => {
            let expr = build_expr(first)?;
            let alias = inner.next().map(build_alias).transpose()?;
            Ok(SelectItem::Expr { expr, alias })
        }
        _ => Err(unexpected(&first)),
    }
}

fn build_alias(pair: Pair<Rule>) -> BuildResult<String> {
    build_ident(first_operand(pair, "alias")?)
}

fn build_order_item(pair: Pair<Rule>) -> BuildResult<OrderByItem> {
    let descending = if has_keyword(&pair, Rule::kw_desc) {
        Some(true)
    } else if has_keyword(&pair, Rule::kw_asc) {
        Some(false)
    } else {
        None
    };

    Ok(OrderByItem {
        expr: build_expr(first_operand(pair, "ORDER BY expression")?)?,
        descending,
    })
}

// ----------------------------------------------------------------------------
// FROM clause
// ----------------------------------------------------------------------------

fn build_table_factor(pair: Pair<Rule>) -> BuildResult<TableFactor> {
    let context = pair.clone();
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| missing(&context, "table reference"))?;

    match first.as_rule() {
        Rule::table_name => Ok(TableFactor::Table {
            name: build_object_name(first)?,
            alias: inner.next().map(build_alias).transpose()?,
        }),
        Rule::derived_table => {
            let mut parts = first.into_inner();
            let query = parts
                .next()
                .ok_or_else(|| missing(&context, "derived table query"))?;
            Ok(TableFactor::Derived {
                subquery: Arc::new(build_query(query)?),
                alias: parts.next().map(build_alias).transpose()?,
            })
        }
        Rule::nested_join => {
            let mut base = None;
            let mut joins = Vec::new();
            let mut alias = None;
            for part in first.into_inner() {
                match part.as_rule() {
                    Rule::table_factor => base = Some(build_table_factor(part)?),
                    Rule::join_clause => joins.push(build_join(part)?),
                    Rule::alias => alias = Some(build_alias(part)?),
                    _ => return Err(unexpected(&part)),
                }
            }
            Ok(TableFactor::NestedJoin {
                base: Box::new(base.ok_or_else(|| missing(&context, "table reference"))?),
                joins,
                alias,
            })
        }
        _ => Err(unexpected(&first)),
    }
}

fn build_join(pair: Pair<Rule>) -> BuildResult<Join> {
    let join = first_operand(pair, "join")?;
    let context = join.clone();

    match join.as_rule() {
        Rule::comma_join | Rule::cross_join => {
            let kind = if join.as_rule() == Rule::comma_join {
                JoinKind::Simple
            } else {
                JoinKind::Cross
            };
            Ok(Join {
                relation: build_table_factor(first_operand(join, "table reference")?)?,
                kind,
                on: None,
            })
        }
        Rule::qualified_join => {
            let mut kind = JoinKind::Inner;
            let mut relation = None;
            let mut on = None;
            for part in operands(join) {
                match part.as_rule() {
                    Rule::join_operator => kind = build_join_kind(&part),
                    Rule::table_factor => relation = Some(build_table_factor(part)?),
                    Rule::expr => on = Some(build_expr(part)?),
                    _ => return Err(unexpected(&part)),
                }
            }
            let relation = relation.ok_or_else(|| missing(&context, "table reference"))?;
            if on.is_none() {
                return Err(missing(&context, "ON condition for JOIN"));
            }
            Ok(Join { relation, kind, on })
        }
        _ => Err(unexpected(&join)),
    }
}

fn build_join_kind(pair: &Pair<Rule>) -> JoinKind {
    if has_keyword(pair, Rule::kw_left) {
        JoinKind::Left
    } else if has_keyword(pair, Rule::kw_right) {
        JoinKind::Right
    } else if has_keyword(pair, Rule::kw_full) {
        JoinKind::Full
    } else {
        JoinKind::Inner
    }
}

// ----------------------------------------------------------------------------
// Expressions
// ----------------------------------------------------------------------------

fn build_expr(pair: Pair<Rule>) -> BuildResult<Arc<Expr>> {
    match pair.as_rule() {
        Rule::expr | Rule::primary => build_expr(first_operand(pair, "expression")?),
        Rule::or_expr => build_logical_chain(pair, Expr::or),
        Rule::and_expr => build_logical_chain(pair, Expr::and),
        Rule::not_expr => build_not(pair),
        Rule::predicate => build_predicate(pair),
        Rule::additive | Rule::multiplicative => build_arithmetic_chain(pair),
        Rule::unary => build_unary(pair),
        Rule::exists_expr => Ok(Expr::exists(Arc::new(build_query(first_operand(
            pair,
            "EXISTS subquery",
        )?)?))),
        Rule::subquery_expr => Ok(Arc::new(Expr::Subquery(Arc::new(build_query(
            first_operand(pair, "subquery")?,
        )?)))),
        Rule::nested_expr => Ok(Arc::new(Expr::Nested(build_expr(first_operand(
            pair,
            "expression",
        )?)?))),
        Rule::function_call => build_function_call(pair),
        Rule::literal => build_literal(pair),
        Rule::column_ref => Ok(Expr::column(build_column_ref(pair)?)),
        _ => Err(unexpected(&pair)),
    }
}

fn build_logical_chain(
    pair: Pair<Rule>,
    combine: fn(Arc<Expr>, Arc<Expr>) -> Arc<Expr>,
) -> BuildResult<Arc<Expr>> {
    let context = pair.clone();
    let mut terms = operands(pair);
    let first = terms.next().ok_or_else(|| missing(&context, "expression"))?;
    let mut expr = build_expr(first)?;
    for term in terms {
        expr = combine(expr, build_expr(term)?);
    }
    Ok(expr)
}

fn build_not(pair: Pair<Rule>) -> BuildResult<Arc<Expr>> {
    let negate = has_keyword(&pair, Rule::kw_not);
    let inner = build_expr(first_operand(pair, "expression")?)?;
    if !negate {
        return Ok(inner);
    }

    match inner.as_ref() {
        Expr::Exists {
            subquery,
            negated: false,
        } => Ok(Arc::new(Expr::Exists {
            subquery: subquery.clone(),
            negated: true,
        })),
        _ => Ok(Expr::not(inner)),
    }
}

fn build_predicate(pair: Pair<Rule>) -> BuildResult<Arc<Expr>> {
    let context = pair.clone();
    let mut inner = pair.into_inner();
    let left = build_expr(
        inner
            .next()
            .ok_or_else(|| missing(&context, "expression"))?,
    )?;

    let Some(tail) = inner.next() else {
        return Ok(left);
    };

    let negated = has_keyword(&tail, Rule::kw_not);
    match tail.as_rule() {
        Rule::comparison_tail => {
            let mut parts = tail.clone().into_inner();
            let op_pair = parts
                .next()
                .ok_or_else(|| missing(&tail, "comparison operator"))?;
            let op = ComparisonOp::parse(op_pair.as_str()).ok_or_else(|| unexpected(&op_pair))?;
            let right = parts
                .next()
                .ok_or_else(|| missing(&tail, "right-hand operand"))?;

            if right.as_rule() == Rule::quantified_subquery {
                let mut quantified = right.clone().into_inner();
                let quantifier = match quantified.next().and_then(|q| q.into_inner().next()) {
                    Some(q) if q.as_rule() == Rule::kw_all => Quantifier::All,
                    Some(_) => Quantifier::Any,
                    None => return Err(missing(&right, "ANY, SOME or ALL")),
                };
                let subquery = quantified
                    .next()
                    .ok_or_else(|| missing(&right, "subquery"))?;
                return Ok(Arc::new(Expr::Quantified {
                    op,
                    left,
                    quantifier,
                    subquery: Arc::new(build_query(subquery)?),
                }));
            }

            Ok(Expr::compare(op, left, build_expr(right)?))
        }
        Rule::is_null_tail => Ok(Arc::new(Expr::IsNull {
            expr: left,
            negated,
        })),
        Rule::between_tail => {
            let mut bounds = operands(tail.clone());
            let low = bounds
                .next()
                .ok_or_else(|| missing(&tail, "BETWEEN lower bound"))?;
            let high = bounds
                .next()
                .ok_or_else(|| missing(&tail, "BETWEEN upper bound"))?;
            Ok(Arc::new(Expr::Between {
                expr: left,
                low: build_expr(low)?,
                high: build_expr(high)?,
                negated,
            }))
        }
        Rule::in_tail => {
            let target = first_operand(tail.clone(), "IN list")?;
            match target.as_rule() {
                Rule::query => Ok(Arc::new(Expr::InSubquery {
                    expr: left,
                    subquery: Arc::new(build_query(target)?),
                    negated,
                })),
                Rule::in_list => {
                    let list = target
                        .into_inner()
                        .map(build_expr)
                        .collect::<BuildResult<Vec<_>>>()?;
                    Ok(Arc::new(Expr::InList {
                        expr: left,
                        list,
                        negated,
                    }))
                }
                _ => Err(unexpected(&target)),
            }
        }
        Rule::like_tail => Ok(Arc::new(Expr::Like {
            expr: left,
            pattern: build_expr(first_operand(tail, "LIKE pattern")?)?,
            negated,
        })),
        _ => Err(unexpected(&tail)),
    }
}

fn build_arithmetic_chain(pair: Pair<Rule>) -> BuildResult<Arc<Expr>> {
    let context = pair.clone();
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| missing(&context, "operand"))?;
    let mut expr = build_expr(first)?;

    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_str() {
            "+" => ArithmeticOp::Add,
            "-" => ArithmeticOp::Subtract,
            "*" => ArithmeticOp::Multiply,
            "/" => ArithmeticOp::Divide,
            "%" => ArithmeticOp::Modulo,
            _ => return Err(unexpected(&op_pair)),
        };
        let right = inner
            .next()
            .ok_or_else(|| missing(&op_pair, "operand"))?;
        expr = Arc::new(Expr::Arithmetic {
            op,
            left: expr,
            right: build_expr(right)?,
        });
    }

    Ok(expr)
}

fn build_unary(pair: Pair<Rule>) -> BuildResult<Arc<Expr>> {
    let context = pair.clone();
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| missing(&context, "operand"))?;

    if first.as_rule() != Rule::unary_op {
        return build_expr(first);
    }

    let op = if first.as_str() == "-" {
        UnaryOp::Minus
    } else {
        UnaryOp::Plus
    };
    let operand = inner
        .next()
        .ok_or_else(|| missing(&context, "operand"))?;
    Ok(Arc::new(Expr::Unary {
        op,
        expr: build_expr(operand)?,
    }))
}

fn build_function_call(pair: Pair<Rule>) -> BuildResult<Arc<Expr>> {
    let mut call = FunctionCall {
        name: String::new(),
        args: Vec::new(),
        distinct: false,
        wildcard: false,
    };

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::function_name => call.name = build_ident(first_operand(part, "name")?)?,
            Rule::function_args => {
                call.distinct = has_keyword(&part, Rule::kw_distinct);
                for arg in operands(part) {
                    match arg.as_rule() {
                        Rule::star_arg => call.wildcard = true,
                        _ => call.args.push(build_expr(arg)?),
                    }
                }
            }
            _ => return Err(unexpected(&part)),
        }
    }

    Ok(Arc::new(Expr::Function(call)))
}

fn build_literal(pair: Pair<Rule>) -> BuildResult<Arc<Expr>> {
    let value = pair
        .clone()
        .into_inner()
        .next()
        .ok_or_else(|| missing(&pair, "literal"))?;

    let literal = match value.as_rule() {
        Rule::number => parse_number(&value)?,
        Rule::string => Literal::String(parse_string_literal(value.as_str())),
        Rule::kw_null => Literal::Null,
        Rule::kw_true => Literal::Boolean(true),
        Rule::kw_false => Literal::Boolean(false),
        _ => return Err(unexpected(&value)),
    };

    Ok(Expr::literal(literal))
}

fn parse_number(pair: &Pair<Rule>) -> BuildResult<Literal> {
    let text = pair.as_str();
    if !text.contains(['.', 'e', 'E']) {
        if let Ok(value) = text.parse::<i64>() {
            return Ok(Literal::Integer(value));
        }
    }

    BigDecimal::from_str(text)
        .map(Literal::Decimal)
        .map_err(|e| {
            let (line, column) = pair.line_col();
            ParseError::syntax(format!("Invalid number '{}': {}", text, e), line, column)
        })
}

fn parse_string_literal(raw: &str) -> String {
    let body = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw);
    body.replace("''", "'")
}

fn build_column_ref(pair: Pair<Rule>) -> BuildResult<ColumnRef> {
    let mut parts = pair
        .clone()
        .into_inner()
        .map(build_ident)
        .collect::<BuildResult<Vec<_>>>()?;

    let name = parts.pop().ok_or_else(|| missing(&pair, "column name"))?;
    let qualifier = if parts.is_empty() {
        None
    } else {
        Some(ObjectName(parts))
    };
    Ok(ColumnRef { qualifier, name })
}

fn build_object_name(pair: Pair<Rule>) -> BuildResult<ObjectName> {
    let parts = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::ident)
        .map(build_ident)
        .collect::<BuildResult<Vec<_>>>()?;
    Ok(ObjectName(parts))
}

fn build_ident(pair: Pair<Rule>) -> BuildResult<String> {
    let inner = pair
        .clone()
        .into_inner()
        .next()
        .ok_or_else(|| missing(&pair, "identifier"))?;

    match inner.as_rule() {
        Rule::bare_ident => Ok(inner.as_str().to_string()),
        Rule::quoted_ident => {
            let raw = inner.as_str();
            let body = &raw[1..raw.len() - 1];
            Ok(if raw.starts_with('"') {
                body.replace("\"\"", "\"")
            } else {
                body.to_string()
            })
        }
        _ => Err(unexpected(&inner)),
    }
}
