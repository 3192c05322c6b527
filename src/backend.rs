use serde::Serialize;

use crate::ast::Module;
use crate::config::TranslateOptions;
use crate::error::{Degradation, TranslateError};
use crate::java_stub::JavaStub;
use crate::parser;
use crate::transpiler::Transpiler;

/// Generated source plus one entry per placeholder emitted for an
/// untranslated construct.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Translation {
    pub code: String,
    pub degradations: Vec<Degradation>,
}

/// Common interface implemented by each output language.
///
/// Implementations are stateless between calls; every `generate` builds its
/// own working state, so one instance may serve concurrent callers.
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;
    fn generate(&self, module: &Module) -> Result<Translation, TranslateError>;

    fn translate_source(&self, source: &str) -> Result<Translation, TranslateError> {
        let module = parser::parse(source)?;
        self.generate(&module)
    }
}

pub fn backends(options: &TranslateOptions) -> Vec<Box<dyn Backend>> {
    vec![
        Box::new(Transpiler::new(options.clone())),
        Box::new(JavaStub),
    ]
}

/// Looks a back end up by name; `js` is accepted for `javascript`.
pub fn backend(name: &str, options: &TranslateOptions) -> Option<Box<dyn Backend>> {
    let name = match name {
        "js" => "javascript",
        other => other,
    };
    backends(options)
        .into_iter()
        .find(|backend| backend.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_backends_by_name() {
        let options = TranslateOptions::default();
        let names: Vec<&str> = backends(&options).iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["javascript", "java"]);

        assert_eq!(backend("js", &options).map(|b| b.name()), Some("javascript"));
        assert_eq!(backend("java", &options).map(|b| b.name()), Some("java"));
        assert!(backend("cobol", &options).is_none());
    }

    #[test]
    fn every_backend_reports_syntax_errors() {
        let options = TranslateOptions::default();
        for backend in backends(&options) {
            let err = backend
                .translate_source("while True\n    pass\n")
                .expect_err("missing colon");
            assert!(
                matches!(err, TranslateError::Syntax { .. }),
                "{} accepted malformed input",
                backend.name()
            );
        }
    }
}
