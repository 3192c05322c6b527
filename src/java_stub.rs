//! Placeholder Java output: signatures and loop skeletons with TODO bodies.
//! Performs no real translation.

use rustc_hash::FxHashSet;

use crate::ast::{CompareOperator, Constant, Expression, Module, Statement};
use crate::backend::{Backend, Translation};
use crate::error::TranslateError;
use crate::transpiler::expression::string_literal;

#[derive(Debug, Clone, Copy, Default)]
pub struct JavaStub;

impl JavaStub {
    pub fn render(&self, module: &Module) -> String {
        let mut collector = StubCollector::default();
        collector.visit_block(&module.body);
        collector.render()
    }
}

impl Backend for JavaStub {
    fn name(&self) -> &'static str {
        "java"
    }

    fn generate(&self, module: &Module) -> Result<Translation, TranslateError> {
        Ok(Translation {
            code: self.render(module),
            degradations: Vec::new(),
        })
    }
}

#[derive(Default)]
struct StubCollector<'m> {
    functions: Vec<String>,
    variables: Vec<&'m str>,
    seen: FxHashSet<&'m str>,
    loops: Vec<String>,
}

impl<'m> StubCollector<'m> {
    fn visit_block(&mut self, body: &'m [Statement]) {
        for statement in body {
            self.visit(statement);
        }
    }

    fn visit(&mut self, statement: &'m Statement) {
        match statement {
            Statement::FunctionDef { name, params, body } => {
                let params = params
                    .iter()
                    .map(|param| format!("int {}", param.name))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.functions.push(format!(
                    "public int {name}({params}) {{\n    // TODO: function body\n}}"
                ));
                self.visit_block(body);
            }
            Statement::Assign { targets, .. } => {
                for target in targets {
                    if let Expression::Name(name) = target {
                        if self.seen.insert(name.as_str()) {
                            self.variables.push(name.as_str());
                        }
                    }
                }
            }
            Statement::For { target, body, .. } => {
                let counter = match target {
                    Expression::Name(name) => name.as_str(),
                    _ => "i",
                };
                self.loops.push(format!(
                    "for (int {counter} = 0; {counter} < N; {counter}++) {{\n    // TODO: loop body\n}}"
                ));
                self.visit_block(body);
            }
            Statement::While { test, body } => {
                self.loops.push(format!(
                    "while ({}) {{\n    // TODO: loop body\n}}",
                    while_condition(test)
                ));
                self.visit_block(body);
            }
            Statement::If { body, orelse, .. } => {
                self.visit_block(body);
                self.visit_block(orelse);
            }
            _ => {}
        }
    }

    fn render(self) -> String {
        let variables = self
            .variables
            .iter()
            .map(|name| format!("int {name} = 0;  // TODO: assign proper value"))
            .collect::<Vec<_>>()
            .join("\n");
        [self.functions.join("\n\n"), variables, self.loops.join("\n\n")]
            .into_iter()
            .filter(|section| !section.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn while_condition(test: &Expression) -> String {
    let Expression::Compare {
        left,
        ops,
        comparators,
    } = test
    else {
        return "/* complex condition */".to_string();
    };

    let left = match left.as_ref() {
        Expression::Name(name) => name.as_str(),
        _ => "x",
    };
    let op = match ops.first() {
        Some(CompareOperator::Eq) => "==",
        Some(CompareOperator::NotEq) => "!=",
        Some(CompareOperator::Less) => "<",
        Some(CompareOperator::LessEq) => "<=",
        Some(CompareOperator::Greater) => ">",
        Some(CompareOperator::GreaterEq) => ">=",
        _ => "??",
    };
    let right = match comparators.first() {
        Some(Expression::Constant(constant)) => java_literal(constant),
        _ => "?".to_string(),
    };
    format!("{left} {op} {right}")
}

fn java_literal(constant: &Constant) -> String {
    match constant {
        Constant::String(text) => string_literal(text),
        Constant::Integer(value) => value.to_string(),
        Constant::Number(text) => text.clone(),
        Constant::Boolean(value) => value.to_string(),
        Constant::None => "null".to_string(),
    }
}
