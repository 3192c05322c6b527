//! Python to JavaScript translation engine.
//!
//! [`StatementTranslator`] drives the walk top-down and owns every piece of
//! per-run state: the [`ScopeTracker`], the [`Emitter`] and the degradation
//! list. A fresh one is built for each call to [`Transpiler::transpile`], so
//! one `Transpiler` can serve any number of runs.

pub mod emitter;
pub mod expression;
pub mod scope;
pub mod statement;

use crate::ast::Module;
use crate::backend::{Backend, Translation};
use crate::config::TranslateOptions;
use crate::error::TranslateError;

pub use emitter::Emitter;
pub use expression::ExpressionTranslator;
pub use scope::{BindingKeyword, DeclarationForm, FrameKind, ScopeTracker};
pub use statement::StatementTranslator;

#[derive(Debug, Clone, Default)]
pub struct Transpiler {
    options: TranslateOptions,
}

impl Transpiler {
    pub fn new(options: TranslateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TranslateOptions {
        &self.options
    }

    pub fn transpile(&self, module: &Module) -> Result<Translation, TranslateError> {
        tracing::debug!(statements = module.body.len(), "translating module");
        let mut translator = StatementTranslator::new(&self.options);
        translator.translate_module(&module.body)?;
        let translation = translator.finish();
        tracing::debug!(
            lines = translation.code.lines().count(),
            degradations = translation.degradations.len(),
            "translation finished"
        );
        Ok(translation)
    }
}

impl Backend for Transpiler {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn generate(&self, module: &Module) -> Result<Translation, TranslateError> {
        self.transpile(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaseConvention;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const PROGRAM: &str = indoc! {r#"
        def greet(name):
            print(f"Hello, {name}!")

        greet("World")

        x = 10
        y = 20
        if x < y:
            print("x is smaller")
        else:
            print("y is smaller")

        numbers = [1, 2, 3]
        for num in numbers:
            print(num * 2)

        person = {
            "name": "Alice",
            "age": 30,
            "is_student": False
        }

        def factorial(n):
            if n <= 1:
                return 1
            return n * factorial(n - 1)
    "#};

    #[test]
    fn translates_complete_program() {
        let translation = Transpiler::default()
            .translate_source(PROGRAM)
            .expect("translation should succeed");
        assert_eq!(
            translation.code,
            indoc! {r#"
                function greet(name) {
                  console.log(`Hello, ${name}!`);
                }
                greet("World");
                let x = 10;
                let y = 20;
                if (x < y) {
                  console.log("x is smaller");
                } else {
                  console.log("y is smaller");
                }
                let numbers = [1, 2, 3];
                for (let num of numbers) {
                  console.log(num * 2);
                }
                let person = {"name": "Alice", "age": 30, "is_student": false};
                function factorial(n) {
                  if (n <= 1) {
                    return 1;
                  }
                  return n * factorial(n - 1);
                }"#}
        );
        assert!(translation.degradations.is_empty());
    }

    #[test]
    fn translation_is_deterministic() {
        let options = TranslateOptions {
            case_convention: CaseConvention::SnakeToCamel,
            ..TranslateOptions::default()
        };
        let transpiler = Transpiler::new(options);
        let first = transpiler.translate_source(PROGRAM).expect("first run");
        let second = transpiler.translate_source(PROGRAM).expect("second run");
        assert_eq!(first, second);
    }

    #[test]
    fn state_does_not_leak_between_runs() {
        let transpiler = Transpiler::default();
        let first = transpiler.translate_source("x = 1\n").expect("first run");
        let second = transpiler.translate_source("x = 2\n").expect("second run");
        assert_eq!(first.code, "let x = 1;");
        assert_eq!(second.code, "let x = 2;");
    }

    #[test]
    fn syntax_errors_are_fatal() {
        let err = Transpiler::default()
            .translate_source("def broken(:\n    pass\n")
            .expect_err("malformed input");
        assert!(matches!(err, TranslateError::Syntax { line: 1, .. }));
    }

    #[test]
    fn empty_module_translates_to_empty_output() {
        let translation = Transpiler::default()
            .translate_source("")
            .expect("empty input");
        assert_eq!(translation.code, "");
    }
}
