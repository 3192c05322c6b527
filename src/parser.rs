//! Front end: tree-sitter-python concrete tree lowered into [`crate::ast`].
//!
//! Syntax errors are fatal. Well-formed constructs without an AST node become
//! [`Unsupported`] so later stages can degrade instead of failing.

use tree_sitter::{Node, Parser};

use crate::ast::{
    BinaryOperator, CompareOperator, Constant, Expression, LogicalOperator, Module, Parameter,
    Statement, StringSegment, UnaryOperator, Unsupported,
};
use crate::error::TranslateError;

pub fn parse(source: &str) -> Result<Module, TranslateError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::language())
        .map_err(|err| TranslateError::internal(format!("Failed to load Python grammar: {err}")))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| TranslateError::internal("Python parser produced no tree"))?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(syntax_error(root, source));
    }

    let lowering = Lowering { source };
    Ok(Module {
        body: lowering.block(root),
    })
}

fn syntax_error(root: Node, source: &str) -> TranslateError {
    let node = first_error(root).unwrap_or(root);
    let position = node.start_position();
    let message = if node.is_missing() {
        format!("expected '{}'", node.kind())
    } else {
        let text = node
            .utf8_text(source.as_bytes())
            .unwrap_or_default()
            .lines()
            .next()
            .unwrap_or_default()
            .trim();
        if text.is_empty() {
            "unexpected end of input".to_string()
        } else {
            let snippet: String = text.chars().take(40).collect();
            format!("unexpected '{snippet}'")
        }
    };
    TranslateError::Syntax {
        message,
        line: position.row + 1,
        column: position.column + 1,
    }
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    None
}

struct Lowering<'s> {
    source: &'s str,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node) -> &'s str {
        self.source.get(node.byte_range()).unwrap_or_default()
    }

    fn unsupported(&self, node: Node) -> Unsupported {
        Unsupported {
            kind: node.kind().to_string(),
            source: self.text(node).to_string(),
            line: node.start_position().row + 1,
        }
    }

    fn unsupported_statement(&self, node: Node) -> Statement {
        Statement::Unsupported(self.unsupported(node))
    }

    fn unsupported_expression(&self, node: Node) -> Expression {
        Expression::Unsupported(self.unsupported(node))
    }

    fn block(&self, node: Node) -> Vec<Statement> {
        named_children(node)
            .into_iter()
            .map(|child| self.statement(child))
            .collect()
    }

    fn field_block(&self, node: Node, field: &str) -> Vec<Statement> {
        node.child_by_field_name(field)
            .map(|body| self.block(body))
            .unwrap_or_default()
    }

    fn statement(&self, node: Node) -> Statement {
        match node.kind() {
            "function_definition" => self.function_definition(node),
            "return_statement" => {
                let value = named_children(node)
                    .first()
                    .map(|value| self.expression(*value));
                Statement::Return(value)
            }
            "expression_statement" => self.expression_statement(node),
            "if_statement" => self.if_statement(node),
            "for_statement" => self.for_statement(node),
            "while_statement" => {
                let (Some(test), None) = (
                    node.child_by_field_name("condition"),
                    node.child_by_field_name("alternative"),
                ) else {
                    return self.unsupported_statement(node);
                };
                Statement::While {
                    test: self.expression(test),
                    body: self.field_block(node, "body"),
                }
            }
            "pass_statement" => Statement::Pass,
            "break_statement" => Statement::Break,
            "continue_statement" => Statement::Continue,
            _ => self.unsupported_statement(node),
        }
    }

    fn function_definition(&self, node: Node) -> Statement {
        let is_async = node
            .child(0)
            .is_some_and(|first| first.kind() == "async");
        let Some(name) = node.child_by_field_name("name") else {
            return self.unsupported_statement(node);
        };
        if is_async {
            return self.unsupported_statement(node);
        }

        let mut params = Vec::new();
        if let Some(parameters) = node.child_by_field_name("parameters") {
            for param in named_children(parameters) {
                match self.parameter(param) {
                    Some(param) => params.push(param),
                    None => return self.unsupported_statement(node),
                }
            }
        }

        Statement::FunctionDef {
            name: self.text(name).to_string(),
            params,
            body: self.field_block(node, "body"),
        }
    }

    fn parameter(&self, node: Node) -> Option<Parameter> {
        match node.kind() {
            "identifier" => Some(Parameter {
                name: self.text(node).to_string(),
                default: None,
            }),
            "typed_parameter" => named_children(node)
                .into_iter()
                .find(|child| child.kind() == "identifier")
                .map(|name| Parameter {
                    name: self.text(name).to_string(),
                    default: None,
                }),
            "default_parameter" | "typed_default_parameter" => {
                let name = node.child_by_field_name("name")?;
                if name.kind() != "identifier" {
                    return None;
                }
                Some(Parameter {
                    name: self.text(name).to_string(),
                    default: node
                        .child_by_field_name("value")
                        .map(|value| self.expression(value)),
                })
            }
            _ => None,
        }
    }

    fn expression_statement(&self, node: Node) -> Statement {
        let children = named_children(node);
        let [child] = children.as_slice() else {
            return self.unsupported_statement(node);
        };
        match child.kind() {
            "assignment" => self.assignment(*child),
            "augmented_assignment" => self.augmented_assignment(*child),
            _ => Statement::Expr(self.expression(*child)),
        }
    }

    fn assignment(&self, node: Node) -> Statement {
        let mut targets = Vec::new();
        let mut current = node;
        let value = loop {
            if current.child_by_field_name("type").is_some() {
                return self.unsupported_statement(node);
            }
            let (Some(left), Some(right)) = (
                current.child_by_field_name("left"),
                current.child_by_field_name("right"),
            ) else {
                return self.unsupported_statement(node);
            };
            match self.assignment_target(left) {
                Some(target) => targets.push(target),
                None => return self.unsupported_statement(node),
            }
            if right.kind() == "assignment" {
                current = right;
            } else {
                break self.expression(right);
            }
        };
        Statement::Assign { targets, value }
    }

    fn assignment_target(&self, node: Node) -> Option<Expression> {
        match node.kind() {
            "identifier" | "attribute" | "subscript" => Some(self.expression(node)),
            _ => None,
        }
    }

    fn augmented_assignment(&self, node: Node) -> Statement {
        let (Some(left), Some(operator), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("operator"),
            node.child_by_field_name("right"),
        ) else {
            return self.unsupported_statement(node);
        };
        let symbol = self.text(operator).trim_end_matches('=');
        let (Some(target), Some(op)) = (
            self.assignment_target(left),
            BinaryOperator::from_symbol(symbol),
        ) else {
            return self.unsupported_statement(node);
        };
        Statement::AugAssign {
            target,
            op,
            value: self.expression(right),
        }
    }

    fn if_statement(&self, node: Node) -> Statement {
        let Some(condition) = node.child_by_field_name("condition") else {
            return self.unsupported_statement(node);
        };

        let mut cursor = node.walk();
        let alternatives: Vec<Node> = node
            .children_by_field_name("alternative", &mut cursor)
            .collect();

        let mut orelse = Vec::new();
        for clause in alternatives.into_iter().rev() {
            match clause.kind() {
                "else_clause" => orelse = self.field_block(clause, "body"),
                "elif_clause" => {
                    let Some(test) = clause.child_by_field_name("condition") else {
                        return self.unsupported_statement(node);
                    };
                    orelse = vec![Statement::If {
                        test: self.expression(test),
                        body: self.field_block(clause, "consequence"),
                        orelse,
                    }];
                }
                _ => return self.unsupported_statement(node),
            }
        }

        Statement::If {
            test: self.expression(condition),
            body: self.field_block(node, "consequence"),
            orelse,
        }
    }

    fn for_statement(&self, node: Node) -> Statement {
        let is_async = node
            .child(0)
            .is_some_and(|first| first.kind() == "async");
        let (Some(left), Some(right), None, false) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
            node.child_by_field_name("alternative"),
            is_async,
        ) else {
            return self.unsupported_statement(node);
        };

        let target = match left.kind() {
            "identifier" => Expression::Name(self.text(left).to_string()),
            "pattern_list" | "tuple_pattern" | "list_pattern" => {
                let names = named_children(left);
                if names.iter().any(|name| name.kind() != "identifier") {
                    return self.unsupported_statement(node);
                }
                Expression::List(
                    names
                        .into_iter()
                        .map(|name| Expression::Name(self.text(name).to_string()))
                        .collect(),
                )
            }
            _ => return self.unsupported_statement(node),
        };

        Statement::For {
            target,
            iterable: self.expression(right),
            body: self.field_block(node, "body"),
        }
    }

    fn expression(&self, node: Node) -> Expression {
        match node.kind() {
            "identifier" => Expression::Name(self.text(node).to_string()),
            "integer" => self.integer(node),
            "float" => {
                let text = self.text(node).replace('_', "");
                if text.ends_with(['j', 'J']) {
                    return self.unsupported_expression(node);
                }
                Expression::Constant(Constant::Number(text))
            }
            "true" => Expression::Constant(Constant::Boolean(true)),
            "false" => Expression::Constant(Constant::Boolean(false)),
            "none" => Expression::Constant(Constant::None),
            "string" => self.string(node),
            "concatenated_string" => self.concatenated_string(node),
            "binary_operator" => {
                let (Some(left), Some(operator), Some(right)) = (
                    node.child_by_field_name("left"),
                    node.child_by_field_name("operator"),
                    node.child_by_field_name("right"),
                ) else {
                    return self.unsupported_expression(node);
                };
                match BinaryOperator::from_symbol(self.text(operator)) {
                    Some(op) => {
                        Expression::binary(self.expression(left), op, self.expression(right))
                    }
                    None => self.unsupported_expression(node),
                }
            }
            "unary_operator" => {
                let (Some(operator), Some(argument)) = (
                    node.child_by_field_name("operator"),
                    node.child_by_field_name("argument"),
                ) else {
                    return self.unsupported_expression(node);
                };
                let op = match self.text(operator) {
                    "-" => UnaryOperator::Neg,
                    "+" => UnaryOperator::Pos,
                    "~" => UnaryOperator::Invert,
                    _ => return self.unsupported_expression(node),
                };
                Expression::UnaryOp {
                    op,
                    operand: Box::new(self.expression(argument)),
                }
            }
            "not_operator" => match node.child_by_field_name("argument") {
                Some(argument) => Expression::UnaryOp {
                    op: UnaryOperator::Not,
                    operand: Box::new(self.expression(argument)),
                },
                None => self.unsupported_expression(node),
            },
            "boolean_operator" => {
                let (Some(left), Some(operator), Some(right)) = (
                    node.child_by_field_name("left"),
                    node.child_by_field_name("operator"),
                    node.child_by_field_name("right"),
                ) else {
                    return self.unsupported_expression(node);
                };
                let op = match self.text(operator) {
                    "and" => LogicalOperator::And,
                    "or" => LogicalOperator::Or,
                    _ => return self.unsupported_expression(node),
                };
                Expression::Logical {
                    left: Box::new(self.expression(left)),
                    op,
                    right: Box::new(self.expression(right)),
                }
            }
            "comparison_operator" => self.comparison(node),
            "call" => self.call(node),
            "attribute" => {
                let (Some(object), Some(attribute)) = (
                    node.child_by_field_name("object"),
                    node.child_by_field_name("attribute"),
                ) else {
                    return self.unsupported_expression(node);
                };
                Expression::Attribute {
                    object: Box::new(self.expression(object)),
                    name: self.text(attribute).to_string(),
                }
            }
            "subscript" => {
                let mut cursor = node.walk();
                let indices: Vec<Node> = node
                    .children_by_field_name("subscript", &mut cursor)
                    .collect();
                let (Some(value), [index]) = (node.child_by_field_name("value"), indices.as_slice())
                else {
                    return self.unsupported_expression(node);
                };
                if index.kind() == "slice" {
                    return self.unsupported_expression(node);
                }
                Expression::Index {
                    object: Box::new(self.expression(value)),
                    index: Box::new(self.expression(*index)),
                }
            }
            "list" | "tuple" | "expression_list" => Expression::List(
                named_children(node)
                    .into_iter()
                    .map(|element| self.expression(element))
                    .collect(),
            ),
            "dictionary" => {
                let mut pairs = Vec::new();
                for entry in named_children(node) {
                    let (Some(key), Some(value)) = (
                        entry.child_by_field_name("key"),
                        entry.child_by_field_name("value"),
                    ) else {
                        return self.unsupported_expression(node);
                    };
                    pairs.push((self.expression(key), self.expression(value)));
                }
                Expression::Dict(pairs)
            }
            "parenthesized_expression" => match named_children(node).first() {
                Some(inner) => self.expression(*inner),
                None => self.unsupported_expression(node),
            },
            _ => self.unsupported_expression(node),
        }
    }

    fn integer(&self, node: Node) -> Expression {
        let cleaned = self.text(node).replace('_', "").to_ascii_lowercase();
        if cleaned.ends_with('j') {
            return self.unsupported_expression(node);
        }
        let parsed = if let Some(digits) = cleaned.strip_prefix("0x") {
            i64::from_str_radix(digits, 16)
        } else if let Some(digits) = cleaned.strip_prefix("0o") {
            i64::from_str_radix(digits, 8)
        } else if let Some(digits) = cleaned.strip_prefix("0b") {
            i64::from_str_radix(digits, 2)
        } else {
            cleaned.parse()
        };
        match parsed {
            Ok(value) => Expression::Constant(Constant::Integer(value)),
            Err(_) => Expression::Constant(Constant::Number(cleaned)),
        }
    }

    fn comparison(&self, node: Node) -> Expression {
        let operands = named_children(node);
        let mut cursor = node.walk();
        let operators: Vec<Node> = node
            .children_by_field_name("operators", &mut cursor)
            .collect();

        let mut ops = Vec::with_capacity(operators.len());
        for operator in operators {
            // `not in` and `is not` are aliased tokens; their kind is the
            // canonical spelling whatever the whitespace in between.
            match CompareOperator::from_symbol(operator.kind()) {
                Some(op) => ops.push(op),
                None => return self.unsupported_expression(node),
            }
        }

        let Some((first, rest)) = operands.split_first() else {
            return self.unsupported_expression(node);
        };
        if rest.len() != ops.len() {
            return self.unsupported_expression(node);
        }
        Expression::Compare {
            left: Box::new(self.expression(*first)),
            ops,
            comparators: rest.iter().map(|operand| self.expression(*operand)).collect(),
        }
    }

    fn call(&self, node: Node) -> Expression {
        let (Some(function), Some(arguments)) = (
            node.child_by_field_name("function"),
            node.child_by_field_name("arguments"),
        ) else {
            return self.unsupported_expression(node);
        };
        if arguments.kind() != "argument_list" {
            return self.unsupported_expression(node);
        }
        let args = named_children(arguments)
            .into_iter()
            .map(|arg| self.expression(arg))
            .collect();
        Expression::Call {
            callee: Box::new(self.expression(function)),
            args,
        }
    }

    fn concatenated_string(&self, node: Node) -> Expression {
        let mut segments = Vec::new();
        for part in named_children(node) {
            match self.string(part) {
                Expression::Constant(Constant::String(text)) => {
                    segments.push(StringSegment::Text(text));
                }
                Expression::InterpolatedString(parts) => segments.extend(parts),
                _ => return self.unsupported_expression(node),
            }
        }
        let interpolated = segments
            .iter()
            .any(|segment| matches!(segment, StringSegment::Expr(_)));
        if !interpolated {
            let joined = segments
                .into_iter()
                .filter_map(|segment| match segment {
                    StringSegment::Text(text) => Some(text),
                    StringSegment::Expr(_) => None,
                })
                .collect::<String>();
            return Expression::Constant(Constant::String(joined));
        }
        Expression::InterpolatedString(merge_text(segments))
    }

    fn string(&self, node: Node) -> Expression {
        if node.kind() != "string" {
            return self.unsupported_expression(node);
        }
        let literal = StringLiteral::split(self.text(node));
        let content_start = node.start_byte() + literal.prefix.len() + literal.quote_len;
        let content_end = node.end_byte().saturating_sub(literal.quote_len);
        let raw = literal.prefix.contains(['r', 'R']);

        if !literal.prefix.contains(['f', 'F']) {
            let content = self.source.get(content_start..content_end).unwrap_or_default();
            let value = if raw {
                content.to_string()
            } else {
                unescape(content)
            };
            return Expression::Constant(Constant::String(value));
        }

        let mut interpolations = Vec::new();
        collect_interpolations(node, &mut interpolations);

        let mut segments = Vec::new();
        let mut cursor = content_start;
        for interpolation in interpolations {
            let literal_text = self
                .source
                .get(cursor..interpolation.start_byte())
                .unwrap_or_default();
            push_fstring_text(&mut segments, literal_text, raw);
            segments.push(StringSegment::Expr(self.interpolation(interpolation)));
            cursor = interpolation.end_byte();
        }
        let tail = self.source.get(cursor..content_end).unwrap_or_default();
        push_fstring_text(&mut segments, tail, raw);
        Expression::InterpolatedString(segments)
    }

    fn interpolation(&self, node: Node) -> Expression {
        let has_modifiers = node.child_by_field_name("type_conversion").is_some()
            || node.child_by_field_name("format_specifier").is_some();
        let mut cursor = node.walk();
        let self_documenting = node.children(&mut cursor).any(|child| child.kind() == "=");
        match node.child_by_field_name("expression") {
            Some(expression) if !has_modifiers && !self_documenting => self.expression(expression),
            _ => self.unsupported_expression(node),
        }
    }
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn collect_interpolations<'t>(node: Node<'t>, found: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "interpolation" {
            found.push(child);
        } else {
            collect_interpolations(child, found);
        }
    }
}

fn push_fstring_text(segments: &mut Vec<StringSegment>, text: &str, raw: bool) {
    if text.is_empty() {
        return;
    }
    let text = text.replace("{{", "{").replace("}}", "}");
    let text = if raw { text } else { unescape(&text) };
    segments.push(StringSegment::Text(text));
}

fn merge_text(segments: Vec<StringSegment>) -> Vec<StringSegment> {
    let mut merged: Vec<StringSegment> = Vec::with_capacity(segments.len());
    for segment in segments {
        match (merged.last_mut(), segment) {
            (Some(StringSegment::Text(previous)), StringSegment::Text(text)) => {
                previous.push_str(&text);
            }
            (_, segment) => merged.push(segment),
        }
    }
    merged
}

struct StringLiteral<'s> {
    prefix: &'s str,
    quote_len: usize,
}

impl<'s> StringLiteral<'s> {
    fn split(text: &'s str) -> Self {
        let prefix_len = text
            .find(|c: char| c == '"' || c == '\'')
            .unwrap_or(text.len());
        let prefix = &text[..prefix_len];
        let body = &text[prefix_len..];
        let quote_len = if body.starts_with("\"\"\"") || body.starts_with("'''") {
            3
        } else {
            1
        };
        Self { prefix, quote_len }
    }
}

/// Decodes Python backslash escapes. Unknown escapes keep their backslash.
fn unescape(content: &str) -> String {
    let mut decoded = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            decoded.push('\\');
            break;
        };
        match escape {
            '\n' => {}
            '\\' => decoded.push('\\'),
            '\'' => decoded.push('\''),
            '"' => decoded.push('"'),
            'n' => decoded.push('\n'),
            't' => decoded.push('\t'),
            'r' => decoded.push('\r'),
            'a' => decoded.push('\u{07}'),
            'b' => decoded.push('\u{08}'),
            'f' => decoded.push('\u{0c}'),
            'v' => decoded.push('\u{0b}'),
            'x' | 'u' | 'U' => {
                let width = match escape {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = (0..width)
                    .filter_map(|_| chars.next_if(char::is_ascii_hexdigit))
                    .collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(decoded_char) if digits.len() == width => decoded.push(decoded_char),
                    _ => {
                        decoded.push('\\');
                        decoded.push(escape);
                        decoded.push_str(&digits);
                    }
                }
            }
            '0'..='7' => {
                let mut digits = String::from(escape);
                while digits.len() < 3 {
                    match chars.next_if(|d| ('0'..='7').contains(d)) {
                        Some(d) => digits.push(d),
                        None => break,
                    }
                }
                match u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32) {
                    Some(decoded_char) => decoded.push(decoded_char),
                    None => {
                        decoded.push('\\');
                        decoded.push_str(&digits);
                    }
                }
            }
            other => {
                decoded.push('\\');
                decoded.push(other);
            }
        }
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn parse_ok(source: &str) -> Vec<Statement> {
        parse(source).expect("parse failed").body
    }

    fn single_expression(source: &str) -> Expression {
        match parse_ok(source).as_slice() {
            [Statement::Expr(expr)] => expr.clone(),
            other => panic!("expected one expression statement, got {other:?}"),
        }
    }

    #[test]
    fn parses_function_with_body() {
        let body = parse_ok(indoc! {"
            def add(a, b=2):
                total = a + b
                return total
        "});

        let expected = vec![Statement::FunctionDef {
            name: "add".to_string(),
            params: vec![
                Parameter {
                    name: "a".to_string(),
                    default: None,
                },
                Parameter {
                    name: "b".to_string(),
                    default: Some(Expression::integer(2)),
                },
            ],
            body: vec![
                Statement::Assign {
                    targets: vec![Expression::name("total")],
                    value: Expression::binary(
                        Expression::name("a"),
                        BinaryOperator::Add,
                        Expression::name("b"),
                    ),
                },
                Statement::Return(Some(Expression::name("total"))),
            ],
        }];
        assert_eq!(body, expected);
    }

    #[test]
    fn nests_elif_clauses_in_orelse() {
        let body = parse_ok(indoc! {"
            if a:
                pass
            elif b:
                pass
            else:
                pass
        "});

        let expected = vec![Statement::If {
            test: Expression::name("a"),
            body: vec![Statement::Pass],
            orelse: vec![Statement::If {
                test: Expression::name("b"),
                body: vec![Statement::Pass],
                orelse: vec![Statement::Pass],
            }],
        }];
        assert_eq!(body, expected);
    }

    #[test]
    fn keeps_chained_assignment_targets() {
        let body = parse_ok("a = b = 1\n");
        assert_eq!(
            body,
            vec![Statement::Assign {
                targets: vec![Expression::name("a"), Expression::name("b")],
                value: Expression::integer(1),
            }]
        );
    }

    #[test]
    fn parses_chained_comparison() {
        let expr = single_expression("a < b <= c\n");
        assert_eq!(
            expr,
            Expression::Compare {
                left: Box::new(Expression::name("a")),
                ops: vec![CompareOperator::Less, CompareOperator::LessEq],
                comparators: vec![Expression::name("b"), Expression::name("c")],
            }
        );
    }

    #[test]
    fn parses_membership_operators() {
        let expr = single_expression("x not in items\n");
        assert_eq!(
            expr,
            Expression::Compare {
                left: Box::new(Expression::name("x")),
                ops: vec![CompareOperator::NotIn],
                comparators: vec![Expression::name("items")],
            }
        );
    }

    #[test]
    fn parses_interpolated_string_segments() {
        let expr = single_expression("f\"Hello, {name}!\"\n");
        assert_eq!(
            expr,
            Expression::InterpolatedString(vec![
                StringSegment::Text("Hello, ".to_string()),
                StringSegment::Expr(Expression::name("name")),
                StringSegment::Text("!".to_string()),
            ])
        );
    }

    #[test]
    fn collapses_doubled_braces_in_fstrings() {
        let expr = single_expression("f'{{literal}} {x}'\n");
        assert_eq!(
            expr,
            Expression::InterpolatedString(vec![
                StringSegment::Text("{literal} ".to_string()),
                StringSegment::Expr(Expression::name("x")),
            ])
        );
    }

    #[test]
    fn format_specifiers_are_unsupported() {
        let expr = single_expression("f\"{value:.2f}\"\n");
        let Expression::InterpolatedString(segments) = expr else {
            panic!("expected interpolated string");
        };
        assert!(matches!(
            segments.as_slice(),
            [StringSegment::Expr(Expression::Unsupported(Unsupported { kind, .. }))] if kind == "interpolation"
        ));
    }

    #[test]
    fn decodes_string_escapes() {
        assert_eq!(
            single_expression("'tab\\there\\n\\x41\\u00e9'\n"),
            Expression::string("tab\there\nAé")
        );
        assert_eq!(
            single_expression("r'raw\\n'\n"),
            Expression::string("raw\\n")
        );
        assert_eq!(
            single_expression("\"\"\"triple \"quoted\" text\"\"\"\n"),
            Expression::string("triple \"quoted\" text")
        );
    }

    #[test]
    fn joins_adjacent_string_literals() {
        assert_eq!(
            single_expression("'ab' \"cd\"\n"),
            Expression::string("abcd")
        );
    }

    #[test]
    fn canonicalises_integer_literals() {
        assert_eq!(single_expression("0x1F\n"), Expression::integer(31));
        assert_eq!(single_expression("1_000\n"), Expression::integer(1000));
        assert_eq!(
            single_expression("99999999999999999999\n"),
            Expression::Constant(Constant::Number("99999999999999999999".to_string()))
        );
        assert_eq!(
            single_expression("2.5\n"),
            Expression::Constant(Constant::Number("2.5".to_string()))
        );
    }

    #[test]
    fn lowers_unknown_statements_to_unsupported() {
        let body = parse_ok(indoc! {"
            import math
            x = 1
            class Point:
                pass
        "});
        assert_eq!(body.len(), 3);
        assert!(matches!(
            &body[0],
            Statement::Unsupported(Unsupported { kind, line: 1, .. }) if kind == "import_statement"
        ));
        assert!(matches!(&body[1], Statement::Assign { .. }));
        assert!(matches!(
            &body[2],
            Statement::Unsupported(Unsupported { kind, line: 3, .. }) if kind == "class_definition"
        ));
    }

    #[test]
    fn tuple_unpacking_assignment_is_unsupported() {
        let body = parse_ok("a, b = 1, 2\n");
        assert!(matches!(body.as_slice(), [Statement::Unsupported(_)]));
    }

    #[test]
    fn keyword_arguments_are_unsupported() {
        let expr = single_expression("print(x, end=\"\")\n");
        let Expression::Call { args, .. } = expr else {
            panic!("expected call");
        };
        assert_eq!(args[0], Expression::name("x"));
        assert!(matches!(
            &args[1],
            Expression::Unsupported(Unsupported { kind, .. }) if kind == "keyword_argument"
        ));
    }

    #[test]
    fn tuple_loop_targets_become_lists() {
        let body = parse_ok(indoc! {"
            for key, value in pairs:
                pass
        "});
        assert!(matches!(
            body.as_slice(),
            [Statement::For { target: Expression::List(names), .. }] if names.len() == 2
        ));
    }

    #[test]
    fn skips_comments() {
        let body = parse_ok(indoc! {"
            # leading
            x = 1  # trailing
        "});
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn reports_syntax_errors_with_location() {
        let err = parse("x = (1 +\n").expect_err("unbalanced parenthesis");
        assert!(matches!(err, TranslateError::Syntax { .. }));
        assert!(err.to_string().starts_with("Syntax error at line"));
    }

    #[test]
    fn empty_source_is_an_empty_module() {
        assert_eq!(parse_ok(""), Vec::new());
    }
}
