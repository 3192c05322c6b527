use rustc_hash::FxHashSet;

use crate::ast::{
    BinaryOperator, Constant, Expression, Parameter, Statement, UnaryOperator, Unsupported,
};
use crate::backend::Translation;
use crate::builtins::BuiltinFunction;
use crate::config::TranslateOptions;
use crate::error::{Degradation, TranslateError};

use super::emitter::Emitter;
use super::expression::ExpressionTranslator;
use super::scope::{DeclarationForm, ScopeTracker};

/// Walks statements top-down, emitting JavaScript lines. Holds all mutable
/// state of one translation run.
pub struct StatementTranslator<'o> {
    options: &'o TranslateOptions,
    scope: ScopeTracker,
    emitter: Emitter,
    degradations: Vec<Degradation>,
}

impl<'o> StatementTranslator<'o> {
    pub fn new(options: &'o TranslateOptions) -> Self {
        Self {
            options,
            scope: ScopeTracker::new(options.scoping),
            emitter: Emitter::new(),
            degradations: Vec::new(),
        }
    }

    pub fn finish(self) -> Translation {
        Translation {
            code: self.emitter.render(),
            degradations: self.degradations,
        }
    }

    /// Top-level entry: hoists block-nested module locals, then translates
    /// the body.
    pub fn translate_module(&mut self, body: &[Statement]) -> Result<(), TranslateError> {
        let hoisted = self.scope.hoist_block_locals(body);
        self.declare_hoisted(&hoisted);
        self.translate_block(body)
    }

    pub fn translate_block(&mut self, body: &[Statement]) -> Result<(), TranslateError> {
        for statement in body {
            self.translate(statement)?;
        }
        Ok(())
    }

    pub fn translate(&mut self, statement: &Statement) -> Result<(), TranslateError> {
        match statement {
            Statement::FunctionDef { name, params, body } => self.function(name, params, body)?,
            Statement::Return(Some(value)) => {
                let value = self.expression(value)?;
                self.emitter.add_line(&format!("return {value};"));
            }
            Statement::Return(None) => self.emitter.add_line("return;"),
            Statement::Assign { targets, value } => self.assign(targets, value)?,
            Statement::AugAssign { target, op, value } => self.aug_assign(target, *op, value)?,
            Statement::If { test, body, orelse } => self.if_chain(test, body, orelse)?,
            Statement::For {
                target,
                iterable,
                body,
            } => self.for_loop(target, iterable, body)?,
            Statement::While { test, body } => {
                let test = self.expression(test)?;
                self.emitter.add_line(&format!("while ({test}) {{"));
                self.nested_block(body)?;
                self.emitter.add_line("}");
            }
            Statement::Expr(expr) => {
                let expr = self.expression(expr)?;
                self.emitter.add_line(&format!("{expr};"));
            }
            Statement::Pass => {}
            Statement::Break => self.emitter.add_line("break;"),
            Statement::Continue => self.emitter.add_line("continue;"),
            Statement::Unsupported(node) => self.unsupported(node),
        }
        Ok(())
    }

    fn function(
        &mut self,
        name: &str,
        params: &[Parameter],
        body: &[Statement],
    ) -> Result<(), TranslateError> {
        let mut rendered = Vec::with_capacity(params.len());
        for param in params {
            match &param.default {
                Some(default) => {
                    let default = self.expression(default)?;
                    rendered.push(format!("{} = {default}", param.name));
                }
                None => rendered.push(param.name.clone()),
            }
        }

        let js_name = self.options.case_convention.apply(name);
        if js_name == name {
            self.scope.declare_function(name);
        }
        self.emitter
            .add_line(&format!("function {js_name}({}) {{", rendered.join(", ")));
        self.scope.enter_function(name, params, body);
        let hoisted = self.scope.hoist_block_locals(body);
        self.emitter.indent();
        self.declare_hoisted(&hoisted);
        self.block_contents(body)?;
        self.emitter.dedent();
        self.scope.exit_function()?;
        self.emitter.add_line("}");
        Ok(())
    }

    fn nested_block(&mut self, body: &[Statement]) -> Result<(), TranslateError> {
        self.emitter.indent();
        self.block_contents(body)?;
        self.emitter.dedent();
        Ok(())
    }

    /// A body with nothing to emit gets a `// pass` marker so the braces
    /// are never empty.
    fn block_contents(&mut self, body: &[Statement]) -> Result<(), TranslateError> {
        if body.iter().all(|statement| matches!(statement, Statement::Pass)) {
            self.emitter.add_line("// pass");
            Ok(())
        } else {
            self.translate_block(body)
        }
    }

    fn declare_hoisted(&mut self, names: &[String]) {
        if !names.is_empty() {
            self.emitter.add_line(&format!("let {};", names.join(", ")));
        }
    }

    fn assign(&mut self, targets: &[Expression], value: &Expression) -> Result<(), TranslateError> {
        if targets.is_empty() {
            return Err(TranslateError::internal("assignment without targets"));
        }

        // Chained targets are bound left to right, each from the previous one.
        let mut value = self.expression(value)?;
        for target in targets {
            let target_text = self.assignment_target(target)?;
            let line = match target {
                Expression::Name(name) => match self.scope.declare(name) {
                    DeclarationForm::FirstBinding(keyword) => {
                        format!("{} {target_text} = {value};", keyword.as_str())
                    }
                    DeclarationForm::Reassignment => format!("{target_text} = {value};"),
                },
                _ => format!("{target_text} = {value};"),
            };
            self.emitter.add_line(&line);
            value = target_text;
        }
        Ok(())
    }

    fn aug_assign(
        &mut self,
        target: &Expression,
        op: BinaryOperator,
        value: &Expression,
    ) -> Result<(), TranslateError> {
        let target = self.assignment_target(target)?;
        let value_text = self.expression(value)?;
        let line = match op {
            BinaryOperator::Pow => format!("{target} = Math.pow({target}, {value_text});"),
            BinaryOperator::FloorDiv => {
                let divisor = if value.is_compound() {
                    format!("({value_text})")
                } else {
                    value_text
                };
                format!("{target} = Math.floor({target} / {divisor});")
            }
            BinaryOperator::Add => format!("{target} += {value_text};"),
            BinaryOperator::Sub => format!("{target} -= {value_text};"),
            BinaryOperator::Mul => format!("{target} *= {value_text};"),
            BinaryOperator::Div => format!("{target} /= {value_text};"),
            BinaryOperator::Mod => format!("{target} %= {value_text};"),
        };
        self.emitter.add_line(&line);
        Ok(())
    }

    fn assignment_target(&mut self, target: &Expression) -> Result<String, TranslateError> {
        match target {
            Expression::Name(_) | Expression::Attribute { .. } | Expression::Index { .. } => {
                self.expression(target)
            }
            other => Err(TranslateError::internal(format!(
                "assignment target must be a name, attribute or subscript, found {other:?}"
            ))),
        }
    }

    fn if_chain(
        &mut self,
        test: &Expression,
        body: &[Statement],
        orelse: &[Statement],
    ) -> Result<(), TranslateError> {
        let test = self.expression(test)?;
        self.emitter.add_line(&format!("if ({test}) {{"));
        self.nested_block(body)?;

        let mut orelse = orelse;
        loop {
            match orelse {
                [] => break,
                [Statement::If { test, body, orelse: next }] => {
                    let test = self.expression(test)?;
                    self.emitter.add_line(&format!("}} else if ({test}) {{"));
                    self.nested_block(body)?;
                    orelse = next.as_slice();
                }
                block => {
                    self.emitter.add_line("} else {");
                    self.nested_block(block)?;
                    break;
                }
            }
        }
        self.emitter.add_line("}");
        Ok(())
    }

    fn for_loop(
        &mut self,
        target: &Expression,
        iterable: &Expression,
        body: &[Statement],
    ) -> Result<(), TranslateError> {
        // A body that rebinds the counter iterates the materialized range.
        let (header, bound) = match (target, range_arguments(iterable)) {
            (Expression::Name(counter), Some(args)) if !rebinds(body, counter) => {
                let Some(header) = self.counting_header(counter, args, body)? else {
                    return Ok(());
                };
                (header, vec![counter.clone()])
            }
            _ => {
                let (binding, bound) = match target {
                    Expression::Name(name) => (name.clone(), vec![name.clone()]),
                    Expression::List(names) => {
                        let mut bound = Vec::with_capacity(names.len());
                        for name in names {
                            let Expression::Name(name) = name else {
                                return Err(TranslateError::internal(
                                    "loop destructuring supports plain names only",
                                ));
                            };
                            bound.push(name.clone());
                        }
                        (format!("[{}]", bound.join(", ")), bound)
                    }
                    other => {
                        return Err(TranslateError::internal(format!(
                            "unexpected loop target {other:?}"
                        )));
                    }
                };
                let iterable = self.expression(iterable)?;
                (format!("for (let {binding} of {iterable}) {{"), bound)
            }
        };

        self.emitter.add_line(&header);
        self.scope.enter_loop(bound);
        self.nested_block(body)?;
        self.scope.exit_loop()?;
        self.emitter.add_line("}");
        Ok(())
    }

    /// Header of a counting loop over `range(...)`. `range` evaluates its
    /// arguments once, so a bound or step the body could change is copied
    /// into a header variable first. Returns `None` when the loop was
    /// replaced by the error `range` raises for a zero step.
    fn counting_header(
        &mut self,
        counter: &str,
        args: &[Expression],
        body: &[Statement],
    ) -> Result<Option<String>, TranslateError> {
        let (start, stop, step) = match args {
            [stop] => (None, stop, None),
            [start, stop] => (Some(start), stop, None),
            [start, stop, step] => (Some(start), stop, Some(step)),
            _ => return Err(TranslateError::internal("range takes one to three arguments")),
        };
        let literal_step = step.and_then(integer_literal);
        if literal_step == Some(0) {
            self.emitter
                .add_line("throw new RangeError(\"range() arg 3 must not be zero\");");
            return Ok(None);
        }

        let mut taken = FxHashSet::default();
        taken.insert(counter);
        let mut take = |name| {
            taken.insert(name);
        };
        args.iter().for_each(|arg| arg.visit_names(&mut take));
        body.iter().for_each(|statement| statement.visit_names(&mut take));

        let start = match start {
            Some(start) => self.expression(start)?,
            None => "0".to_string(),
        };
        let mut init = vec![format!("{counter} = {start}")];
        let stop = self.loop_invariant(stop, &format!("{counter}End"), body, &taken, &mut init)?;

        let (test, update) = match (step, literal_step) {
            (None, _) | (_, Some(1)) => (format!("{counter} < {stop}"), format!("{counter}++")),
            (_, Some(-1)) => (format!("{counter} > {stop}"), format!("{counter}--")),
            (Some(_), Some(value)) if value < 0 => {
                (format!("{counter} > {stop}"), format!("{counter} += {value}"))
            }
            (Some(_), Some(value)) => {
                (format!("{counter} < {stop}"), format!("{counter} += {value}"))
            }
            (Some(step), None) => {
                let step =
                    self.loop_invariant(step, &format!("{counter}Step"), body, &taken, &mut init)?;
                (
                    format!("{step} > 0 ? {counter} < {stop} : {counter} > {stop}"),
                    format!("{counter} += {step}"),
                )
            }
        };
        let init = init.join(", ");
        Ok(Some(format!("for (let {init}; {test}; {update}) {{")))
    }

    /// Renders a `range` argument that must not change while the loop runs.
    /// Integer literals and names the body never rebinds are used as they
    /// are; anything else is evaluated once into a fresh header variable.
    fn loop_invariant(
        &mut self,
        expr: &Expression,
        base: &str,
        body: &[Statement],
        taken: &FxHashSet<&str>,
        init: &mut Vec<String>,
    ) -> Result<String, TranslateError> {
        let stable = match expr {
            Expression::Name(name) => !rebinds(body, name),
            other => integer_literal(other).is_some(),
        };
        let text = self.expression(expr)?;
        if stable {
            return Ok(text);
        }
        let name = fresh_name(base, taken);
        init.push(format!("{name} = {text}"));
        Ok(name)
    }

    fn unsupported(&mut self, node: &Unsupported) {
        let scope = self.scope.current_scope().to_string();
        tracing::warn!(
            kind = %node.kind,
            line = node.line,
            scope = %scope,
            "untranslated statement"
        );
        let first_line = node.source.lines().next().unwrap_or_default().trim_end();
        self.emitter
            .add_line(&format!("// untranslated {}: {first_line}", node.kind));
        self.degradations.push(Degradation {
            kind: node.kind.clone(),
            line: node.line,
            scope,
        });
    }

    fn expression(&mut self, expr: &Expression) -> Result<String, TranslateError> {
        ExpressionTranslator::new(
            self.options,
            &mut self.degradations,
            self.scope.current_scope(),
        )
        .translate(expr)
    }
}

/// Arguments of a `range(...)` call with one to three arguments.
fn range_arguments(iterable: &Expression) -> Option<&[Expression]> {
    let Expression::Call { callee, args } = iterable else {
        return None;
    };
    let Expression::Name(name) = callee.as_ref() else {
        return None;
    };
    let is_range = BuiltinFunction::from_name(name) == Some(BuiltinFunction::Range);
    (is_range && (1..=3).contains(&args.len())).then_some(args.as_slice())
}

/// Whether `body` assigns to `name` outside nested function definitions.
fn rebinds(body: &[Statement], name: &str) -> bool {
    body.iter().any(|statement| match statement {
        Statement::Assign { targets, .. } => targets
            .iter()
            .any(|target| matches!(target, Expression::Name(target) if target == name)),
        Statement::AugAssign {
            target: Expression::Name(target),
            ..
        } => target == name,
        Statement::If { body, orelse, .. } => rebinds(body, name) || rebinds(orelse, name),
        Statement::While { body, .. } => rebinds(body, name),
        Statement::For { target, body, .. } => {
            let mut bound = false;
            target.visit_names(&mut |target| bound |= target == name);
            bound || rebinds(body, name)
        }
        _ => false,
    })
}

fn fresh_name(base: &str, taken: &FxHashSet<&str>) -> String {
    let mut name = base.to_string();
    let mut suffix = 2;
    while taken.contains(name.as_str()) {
        name = format!("{base}{suffix}");
        suffix += 1;
    }
    name
}

fn integer_literal(expr: &Expression) -> Option<i64> {
    match expr {
        Expression::Constant(Constant::Integer(value)) => Some(*value),
        Expression::UnaryOp {
            op: UnaryOperator::Neg,
            operand,
        } => match operand.as_ref() {
            Expression::Constant(Constant::Integer(value)) => value.checked_neg(),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CaseConvention, Scoping};
    use crate::parser::parse;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn translate_with(options: &TranslateOptions, source: &str) -> Translation {
        let module = parse(source).expect("parse");
        let mut translator = StatementTranslator::new(options);
        translator
            .translate_module(&module.body)
            .expect("translate");
        translator.finish()
    }

    fn translate(source: &str) -> String {
        translate_with(&TranslateOptions::default(), source).code
    }

    #[test]
    fn translates_if_else_end_to_end() {
        let code = translate(indoc! {r#"
            if x < y:
                print("a")
            else:
                print("b")
        "#});
        assert_eq!(
            code,
            indoc! {r#"
                if (x < y) {
                  console.log("a");
                } else {
                  console.log("b");
                }"#}
        );
    }

    #[test]
    fn collapses_elif_chains() {
        let code = translate(indoc! {"
            if n < 0:
                sign = -1
            elif n == 0:
                sign = 0
            else:
                sign = 1
        "});
        assert_eq!(
            code,
            indoc! {"
                if (n < 0) {
                  let sign = -1;
                } else if (n === 0) {
                  sign = 0;
                } else {
                  sign = 1;
                }"}
        );
    }

    #[test]
    fn if_without_else_emits_no_trailing_block() {
        let code = translate("if ok:\n    go()\n");
        assert_eq!(code, "if (ok) {\n  go();\n}");
    }

    #[test]
    fn declares_each_name_once() {
        let code = translate(indoc! {"
            count = 0
            count = count + 1
            def bump(step):
                total = step * 2
                step = total
                return total
        "});
        assert_eq!(
            code,
            indoc! {"
                let count = 0;
                count = count + 1;
                function bump(step) {
                  const total = step * 2;
                  step = total;
                  return total;
                }"}
        );
    }

    #[test]
    fn lexical_scoping_uses_let_for_rebound_locals() {
        let options = TranslateOptions {
            scoping: Scoping::Lexical,
            ..TranslateOptions::default()
        };
        let code = translate_with(
            &options,
            indoc! {"
                def first():
                    acc = 0
                    acc += 1
                    return acc
                def second():
                    acc = 10
                    return acc
            "},
        )
        .code;
        assert_eq!(
            code,
            indoc! {"
                function first() {
                  let acc = 0;
                  acc += 1;
                  return acc;
                }
                function second() {
                  const acc = 10;
                  return acc;
                }"}
        );
    }

    #[test]
    fn chained_assignment_binds_each_target() {
        let code = translate("a = b = [1, 2]\n");
        assert_eq!(code, "let a = [1, 2];\nlet b = a;");
    }

    #[test]
    fn assigns_to_attributes_and_subscripts_without_declaring() {
        let code = translate("user.name = \"x\"\nitems[0] = 1\n");
        assert_eq!(code, "user.name = \"x\";\nitems[0] = 1;");
    }

    #[test]
    fn desugars_augmented_assignment() {
        let code = translate(indoc! {"
            x += 1
            x **= 2
            x //= n + 1
            x %= 3
        "});
        assert_eq!(
            code,
            indoc! {"
                x += 1;
                x = Math.pow(x, 2);
                x = Math.floor(x / (n + 1));
                x %= 3;"}
        );
    }

    #[test]
    fn emits_counting_loops_for_range() {
        let code = translate(indoc! {"
            for i in range(5):
                pass
            for i in range(2, 5):
                pass
            for i in range(0, 10, 3):
                pass
            for i in range(10, 0, -2):
                pass
            for i in range(n + 1):
                pass
        "});
        assert_eq!(
            code,
            indoc! {"
                for (let i = 0; i < 5; i++) {
                  // pass
                }
                for (let i = 2; i < 5; i++) {
                  // pass
                }
                for (let i = 0; i < 10; i += 3) {
                  // pass
                }
                for (let i = 10; i > 0; i += -2) {
                  // pass
                }
                for (let i = 0, iEnd = n + 1; i < iEnd; i++) {
                  // pass
                }"}
        );
    }

    #[test]
    fn range_arguments_are_evaluated_once() {
        let code = translate(indoc! {"
            n = 3
            for i in range(n):
                n = n + 1
            for i in range(len(items)):
                iEnd = i
            for i in range(6, 0, step):
                print(i)
            for i in range(start, stop, size + 1):
                print(i)
        "});
        assert_eq!(
            code,
            indoc! {"
                let n = 3;
                for (let i = 0, iEnd = n; i < iEnd; i++) {
                  n = n + 1;
                }
                for (let i = 0, iEnd2 = items.length; i < iEnd2; i++) {
                  let iEnd = i;
                }
                for (let i = 6; step > 0 ? i < 0 : i > 0; i += step) {
                  console.log(i);
                }
                for (let i = start, iStep = size + 1; iStep > 0 ? i < stop : i > stop; i += iStep) {
                  console.log(i);
                }"}
        );
    }

    #[test]
    fn zero_range_step_throws_like_python() {
        let code = translate("for i in range(0, 5, 0):\n    print(i)\n");
        assert_eq!(
            code,
            "throw new RangeError(\"range() arg 3 must not be zero\");"
        );
    }

    #[test]
    fn loop_targets_are_reassigned_not_redeclared() {
        let code = translate(indoc! {r#"
            for w in words:
                w = w + "!"
            for key, value in pairs:
                value += 1
            for i in range(3):
                i = i * 2
            w = 0
        "#});
        assert_eq!(
            code,
            indoc! {r#"
                for (let w of words) {
                  w = w + "!";
                }
                for (let [key, value] of pairs) {
                  value += 1;
                }
                for (let i of Array.from({length: 3}, (_, i) => i)) {
                  i = i * 2;
                }
                let w = 0;"#}
        );
    }

    #[test]
    fn function_names_count_as_declared() {
        let code = translate(indoc! {"
            def f():
                return 1
            f = 3
        "});
        assert_eq!(code, "function f() {\n  return 1;\n}\nf = 3;");
    }

    #[test]
    fn lexical_scoping_hoists_block_locals() {
        let options = TranslateOptions {
            scoping: Scoping::Lexical,
            ..TranslateOptions::default()
        };
        let code = translate_with(
            &options,
            indoc! {"
                def sign(n):
                    if n > 0:
                        r = 1
                    else:
                        r = -1
                    return r
                def scan(values):
                    for v in values:
                        v = v * 2
                        seen = v
                    return seen
                if ok:
                    label = 'yes'
                print(label)
            "},
        )
        .code;
        assert_eq!(
            code,
            indoc! {r#"
                let label;
                function sign(n) {
                  let r;
                  if (n > 0) {
                    r = 1;
                  } else {
                    r = -1;
                  }
                  return r;
                }
                function scan(values) {
                  let seen;
                  for (let v of values) {
                    v = v * 2;
                    seen = v;
                  }
                  return seen;
                }
                if (ok) {
                  label = "yes";
                }
                console.log(label);"#}
        );
    }

    #[test]
    fn emits_for_of_loops_for_other_iterables() {
        let code = translate(indoc! {"
            for num in numbers:
                print(num * 2)
            for key, value in pairs:
                continue
        "});
        assert_eq!(
            code,
            indoc! {"
                for (let num of numbers) {
                  console.log(num * 2);
                }
                for (let [key, value] of pairs) {
                  continue;
                }"}
        );
    }

    #[test]
    fn translates_while_and_break() {
        let code = translate(indoc! {"
            while n > 0:
                n -= 1
                if n == 3:
                    break
        "});
        assert_eq!(
            code,
            indoc! {"
                while (n > 0) {
                  n -= 1;
                  if (n === 3) {
                    break;
                  }
                }"}
        );
    }

    #[test]
    fn functions_render_defaults_and_case_convention() {
        let options = TranslateOptions {
            case_convention: CaseConvention::SnakeToCamel,
            ..TranslateOptions::default()
        };
        let code = translate_with(
            &options,
            indoc! {"
                def greet_user(name, greeting=\"Hi\"):
                    return
                def noop():
                    pass
            "},
        )
        .code;
        assert_eq!(
            code,
            indoc! {r#"
                function greetUser(name, greeting = "Hi") {
                  return;
                }
                function noop() {
                  // pass
                }"#}
        );
    }

    #[test]
    fn degrades_unsupported_statements_and_keeps_siblings() {
        let translation = translate_with(
            &TranslateOptions::default(),
            indoc! {"
                import math
                def area(r):
                    with open(r) as f:
                        pass
                    return r * r
                print(area(2))
            "},
        );
        assert_eq!(
            translation.code,
            indoc! {"
                // untranslated import_statement: import math
                function area(r) {
                  // untranslated with_statement: with open(r) as f:
                  return r * r;
                }
                console.log(area(2));"}
        );
        let scopes: Vec<(&str, &str)> = translation
            .degradations
            .iter()
            .map(|d| (d.kind.as_str(), d.scope.as_str()))
            .collect();
        assert_eq!(
            scopes,
            vec![("import_statement", "global"), ("with_statement", "area")]
        );
    }

    #[test]
    fn zero_target_assignment_is_internal_error() {
        let options = TranslateOptions::default();
        let mut translator = StatementTranslator::new(&options);
        let err = translator
            .translate(&Statement::Assign {
                targets: Vec::new(),
                value: Expression::integer(1),
            })
            .expect_err("inconsistent node");
        assert!(matches!(err, TranslateError::Internal { .. }));
    }
}
