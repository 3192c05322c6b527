use crate::ast::{
    BinaryOperator, CompareOperator, Constant, Expression, LogicalOperator, StringSegment,
    UnaryOperator, Unsupported,
};
use crate::builtins::Operand;
use crate::config::TranslateOptions;
use crate::error::{Degradation, TranslateError};

/// Renders one expression tree as JavaScript source.
///
/// Operands that are themselves operator expressions are always
/// parenthesized, whatever the relative precedence.
pub struct ExpressionTranslator<'t> {
    options: &'t TranslateOptions,
    degradations: &'t mut Vec<Degradation>,
    scope: &'t str,
}

impl<'t> ExpressionTranslator<'t> {
    pub fn new(
        options: &'t TranslateOptions,
        degradations: &'t mut Vec<Degradation>,
        scope: &'t str,
    ) -> Self {
        Self {
            options,
            degradations,
            scope,
        }
    }

    pub fn translate(&mut self, expr: &Expression) -> Result<String, TranslateError> {
        match expr {
            Expression::Constant(constant) => Ok(constant_literal(constant)),
            Expression::Name(name) => Ok(name.clone()),
            Expression::BinaryOp { left, op, right } => self.binary(left, *op, right),
            Expression::UnaryOp { op, operand } => {
                let operand = self.operand(operand)?;
                let symbol = match op {
                    UnaryOperator::Not => "!",
                    UnaryOperator::Neg => "-",
                    UnaryOperator::Pos => "+",
                    UnaryOperator::Invert => "~",
                };
                Ok(format!("{symbol}{operand}"))
            }
            Expression::Logical { left, op, right } => {
                let symbol = match op {
                    LogicalOperator::And => "&&",
                    LogicalOperator::Or => "||",
                };
                let left = self.logical_operand(left)?;
                let right = self.logical_operand(right)?;
                Ok(format!("{left} {symbol} {right}"))
            }
            Expression::Compare {
                left,
                ops,
                comparators,
            } => self.compare(left, ops, comparators),
            Expression::Call { callee, args } => self.call(callee, args),
            Expression::Attribute { object, name } => {
                let object = self.operand(object)?;
                Ok(format!("{object}.{name}"))
            }
            Expression::Index { object, index } => {
                let object = self.operand(object)?;
                let index = self.translate(index)?;
                Ok(format!("{object}[{index}]"))
            }
            Expression::List(elements) => Ok(format!("[{}]", self.join(elements)?)),
            Expression::Dict(pairs) => self.dict(pairs),
            Expression::InterpolatedString(segments) => self.template_literal(segments),
            Expression::Unsupported(node) => Ok(self.unsupported(node)),
        }
    }

    fn binary(
        &mut self,
        left: &Expression,
        op: BinaryOperator,
        right: &Expression,
    ) -> Result<String, TranslateError> {
        let symbol = match op {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => {
                let left = self.translate(left)?;
                let right = self.translate(right)?;
                return Ok(format!("Math.pow({left}, {right})"));
            }
            BinaryOperator::FloorDiv => {
                let left = self.operand(left)?;
                let right = self.operand(right)?;
                return Ok(format!("Math.floor({left} / {right})"));
            }
        };
        let left = self.operand(left)?;
        let right = self.operand(right)?;
        Ok(format!("{left} {symbol} {right}"))
    }

    fn compare(
        &mut self,
        left: &Expression,
        ops: &[CompareOperator],
        comparators: &[Expression],
    ) -> Result<String, TranslateError> {
        if ops.len() != comparators.len() || ops.is_empty() {
            return Err(TranslateError::internal(format!(
                "comparison has {} operators but {} comparators",
                ops.len(),
                comparators.len()
            )));
        }

        let mut lhs = left;
        let mut parts = Vec::with_capacity(ops.len());
        for (op, rhs) in ops.iter().zip(comparators) {
            let part = match comparison_symbol(*op) {
                Some(symbol) => {
                    let left = self.comparison_operand(lhs)?;
                    let right = self.comparison_operand(rhs)?;
                    format!("{left} {symbol} {right}")
                }
                None => {
                    let needle = self.translate(lhs)?;
                    let haystack = self.operand(rhs)?;
                    let negation = if *op == CompareOperator::NotIn { "!" } else { "" };
                    format!("{negation}{haystack}.includes({needle})")
                }
            };
            parts.push(part);
            lhs = rhs;
        }
        Ok(parts.join(" && "))
    }

    fn call(&mut self, callee: &Expression, args: &[Expression]) -> Result<String, TranslateError> {
        let options = self.options;
        if let Expression::Name(name) = callee {
            if let Some(template) = options.builtins.lookup(name, args.len()) {
                let mut operands = Vec::with_capacity(args.len());
                for arg in args {
                    operands.push(Operand {
                        text: self.translate(arg)?,
                        compound: arg.is_compound(),
                    });
                }
                return Ok(template.render(&operands));
            }
        }

        let callee = match callee {
            Expression::Name(name) => options.case_convention.apply(name).into_owned(),
            other => self.operand(other)?,
        };
        Ok(format!("{callee}({})", self.join(args)?))
    }

    fn dict(&mut self, pairs: &[(Expression, Expression)]) -> Result<String, TranslateError> {
        if pairs.is_empty() {
            return Ok("{}".to_string());
        }
        let mut entries = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let key = match key {
                Expression::Constant(Constant::String(text)) => string_literal(text),
                other => format!("[{}]", self.translate(other)?),
            };
            entries.push(format!("{key}: {}", self.translate(value)?));
        }
        Ok(format!("{{{}}}", entries.join(", ")))
    }

    fn template_literal(&mut self, segments: &[StringSegment]) -> Result<String, TranslateError> {
        let mut rendered = String::from("`");
        for segment in segments {
            match segment {
                StringSegment::Text(text) => escape_template_text(text, &mut rendered),
                StringSegment::Expr(expr) => {
                    rendered.push_str("${");
                    rendered.push_str(&self.translate(expr)?);
                    rendered.push('}');
                }
            }
        }
        rendered.push('`');
        Ok(rendered)
    }

    fn unsupported(&mut self, node: &Unsupported) -> String {
        self.record(node);
        let source = node.source.split_whitespace().collect::<Vec<_>>().join(" ");
        format!(
            "undefined /* untranslated {}: {} */",
            node.kind,
            source.replace("*/", "* /")
        )
    }

    fn record(&mut self, node: &Unsupported) {
        tracing::warn!(
            kind = %node.kind,
            line = node.line,
            scope = %self.scope,
            "untranslated expression"
        );
        self.degradations.push(Degradation {
            kind: node.kind.clone(),
            line: node.line,
            scope: self.scope.to_string(),
        });
    }

    fn join(&mut self, exprs: &[Expression]) -> Result<String, TranslateError> {
        let rendered = exprs
            .iter()
            .map(|expr| self.translate(expr))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rendered.join(", "))
    }

    /// Operand of an arithmetic or unary operator, or the object of a member
    /// access.
    fn operand(&mut self, expr: &Expression) -> Result<String, TranslateError> {
        let text = self.translate(expr)?;
        Ok(if expr.is_compound() {
            format!("({text})")
        } else {
            text
        })
    }

    fn logical_operand(&mut self, expr: &Expression) -> Result<String, TranslateError> {
        let text = self.translate(expr)?;
        Ok(if matches!(expr, Expression::Logical { .. }) {
            format!("({text})")
        } else {
            text
        })
    }

    fn comparison_operand(&mut self, expr: &Expression) -> Result<String, TranslateError> {
        let text = self.translate(expr)?;
        Ok(
            if matches!(expr, Expression::Compare { .. } | Expression::Logical { .. }) {
                format!("({text})")
            } else {
                text
            },
        )
    }
}

/// JavaScript spelling of every comparison except membership, which renders
/// as an `includes` call instead.
fn comparison_symbol(op: CompareOperator) -> Option<&'static str> {
    match op {
        CompareOperator::Eq | CompareOperator::Is => Some("==="),
        CompareOperator::NotEq | CompareOperator::IsNot => Some("!=="),
        CompareOperator::Less => Some("<"),
        CompareOperator::LessEq => Some("<="),
        CompareOperator::Greater => Some(">"),
        CompareOperator::GreaterEq => Some(">="),
        CompareOperator::In | CompareOperator::NotIn => None,
    }
}

fn constant_literal(constant: &Constant) -> String {
    match constant {
        Constant::String(text) => string_literal(text),
        Constant::Integer(value) => value.to_string(),
        Constant::Number(text) => text.clone(),
        Constant::Boolean(true) => "true".to_string(),
        Constant::Boolean(false) => "false".to_string(),
        Constant::None => "null".to_string(),
    }
}

/// Double-quoted literal with JSON escaping, which JavaScript accepts as is.
pub(crate) fn string_literal(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}

fn escape_template_text(text: &str, out: &mut String) {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaseConvention;
    use crate::ast::Statement;
    use crate::parser::parse;

    fn render_with(options: &TranslateOptions, source: &str) -> (String, Vec<Degradation>) {
        let module = parse(source).expect("parse");
        let [Statement::Expr(expr)] = module.body.as_slice() else {
            panic!("expected a single expression statement");
        };
        let mut degradations = Vec::new();
        let text = ExpressionTranslator::new(options, &mut degradations, "global")
            .translate(expr)
            .expect("translate");
        (text, degradations)
    }

    fn render(source: &str) -> String {
        render_with(&TranslateOptions::default(), source).0
    }

    #[test]
    fn renders_constants() {
        assert_eq!(render("\"say \\\"hi\\\"\\n\""), r#""say \"hi\"\n""#);
        assert_eq!(render("True"), "true");
        assert_eq!(render("None"), "null");
        assert_eq!(render("1.5"), "1.5");
        assert_eq!(render("0b101"), "5");
    }

    #[test]
    fn wraps_compound_operands() {
        assert_eq!(render("a + b * c"), "a + (b * c)");
        assert_eq!(render("(a - b) - c"), "(a - b) - c");
        assert_eq!(render("-(x + 1)"), "-(x + 1)");
        assert_eq!(render("- -x"), "-(-x)");
        assert_eq!(render("not a < b"), "!(a < b)");
    }

    #[test]
    fn desugars_power_and_floor_division() {
        assert_eq!(render("x ** (y + 1)"), "Math.pow(x, y + 1)");
        assert_eq!(render("(a + b) // 2"), "Math.floor((a + b) / 2)");
        assert_eq!(render("2 ** 3 + 1"), "(Math.pow(2, 3)) + 1");
    }

    #[test]
    fn chains_comparisons_with_strict_equality() {
        assert_eq!(render("a < b < c"), "a < b && b < c");
        assert_eq!(render("a == b != c"), "a === b && b !== c");
        assert_eq!(render("x is None"), "x === null");
        assert_eq!(render("x in items"), "items.includes(x)");
        assert_eq!(render("x not in a + b"), "!(a + b).includes(x)");
    }

    #[test]
    fn renders_logical_operators() {
        assert_eq!(render("a and b or c"), "(a && b) || c");
        assert_eq!(render("a or (b and c)"), "a || (b && c)");
        assert_eq!(render("x < 1 or y > 2"), "x < 1 || y > 2");
    }

    #[test]
    fn translates_builtin_calls() {
        assert_eq!(render("print(\"a\", x)"), "console.log(\"a\", x)");
        assert_eq!(render("len(items)"), "items.length");
        assert_eq!(render("len(a + b)"), "(a + b).length");
        assert_eq!(render("int(s)"), "parseInt(s, 10)");
        assert_eq!(render("float(s)"), "parseFloat(s)");
        assert_eq!(render("str(n)"), "String(n)");
        assert_eq!(render("range(3)"), "Array.from({length: 3}, (_, i) => i)");
        assert_eq!(
            render("range(0, 10, 3)"),
            "Array.from({length: Math.ceil((10 - 0) / 3)}, (_, i) => i * 3 + 0)"
        );
    }

    #[test]
    fn builtin_arity_mismatch_falls_back_to_plain_call() {
        assert_eq!(render("len(a, b)"), "len(a, b)");
    }

    #[test]
    fn applies_case_convention_to_call_targets_only() {
        let options = TranslateOptions {
            case_convention: CaseConvention::SnakeToCamel,
            ..TranslateOptions::default()
        };
        let (text, _) = render_with(&options, "add_numbers(first_value, 2)");
        assert_eq!(text, "addNumbers(first_value, 2)");
    }

    #[test]
    fn renders_collections() {
        assert_eq!(render("[1, \"two\", None]"), "[1, \"two\", null]");
        assert_eq!(render("{}"), "{}");
        assert_eq!(
            render("{\"name\": \"Alice\", key: 1, 2: x}"),
            "{\"name\": \"Alice\", [key]: 1, [2]: x}"
        );
        assert_eq!(render("items[i + 1]"), "items[i + 1]");
        assert_eq!(render("user.name"), "user.name");
    }

    #[test]
    fn renders_template_literals_in_segment_order() {
        assert_eq!(render("f\"Hello, {name}!\""), "`Hello, ${name}!`");
        assert_eq!(
            render("f\"`{a}` costs ${b * 2}\\n\""),
            "`\\`${a}\\` costs $${b * 2}\\n`"
        );
    }

    #[test]
    fn degrades_unsupported_expressions() {
        let (text, degradations) =
            render_with(&TranslateOptions::default(), "print(lambda x: x)");
        assert_eq!(
            text,
            "console.log(undefined /* untranslated lambda: lambda x: x */)"
        );
        assert_eq!(
            degradations,
            vec![Degradation {
                kind: "lambda".to_string(),
                line: 1,
                scope: "global".to_string(),
            }]
        );
    }

    #[test]
    fn mismatched_comparison_is_internal_error() {
        let options = TranslateOptions::default();
        let mut degradations = Vec::new();
        let expr = Expression::Compare {
            left: Box::new(Expression::name("a")),
            ops: vec![CompareOperator::Less],
            comparators: Vec::new(),
        };
        let err = ExpressionTranslator::new(&options, &mut degradations, "global")
            .translate(&expr)
            .expect_err("inconsistent node");
        assert!(matches!(err, TranslateError::Internal { .. }));
    }
}
