use std::borrow::Cow;
use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFunction {
    Print,
    Len,
    Str,
    Int,
    Float,
    Range,
}

impl BuiltinFunction {
    pub const ALL: [Self; 6] = [
        Self::Print,
        Self::Len,
        Self::Str,
        Self::Int,
        Self::Float,
        Self::Range,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "print" => Some(Self::Print),
            "len" => Some(Self::Len),
            "str" => Some(Self::Str),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "range" => Some(Self::Range),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Len => "len",
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Range => "range",
        }
    }

    fn default_forms(self) -> &'static [(Option<usize>, &'static str)] {
        match self {
            Self::Print => &[(None, "console.log($*)")],
            Self::Len => &[(Some(1), "$0.length")],
            Self::Str => &[(Some(1), "String($*)")],
            Self::Int => &[(Some(1), "parseInt($*, 10)")],
            Self::Float => &[(Some(1), "parseFloat($*)")],
            Self::Range => &[
                (Some(1), "Array.from({length: $0}, (_, i) => i)"),
                (Some(2), "Array.from({length: $1 - $0}, (_, i) => i + $0)"),
                (
                    Some(3),
                    "Array.from({length: Math.ceil(($1 - $0) / $2)}, (_, i) => i * $2 + $0)",
                ),
            ],
        }
    }
}

/// A translated call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub text: String,
    /// Set for operator expressions, which get parenthesized when spliced
    /// into a template through `$N`.
    pub compound: bool,
}

impl Operand {
    pub fn wrapped(&self) -> Cow<'_, str> {
        if self.compound {
            Cow::Owned(format!("({})", self.text))
        } else {
            Cow::Borrowed(&self.text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePart {
    Text(String),
    Arg(usize),
    AllArgs,
}

/// Output form for a built-in call.
///
/// `$N` splices the N-th argument (parenthesized when compound), `$*` all
/// arguments comma-joined, and `$$` a literal dollar sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    parts: Vec<TemplatePart>,
}

impl Template {
    pub fn parse(name: &str, arity: Option<usize>, source: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidTemplate {
            name: name.to_string(),
            template: source.to_string(),
            reason,
        };

        let mut parts = Vec::new();
        let mut text = String::new();
        let mut chars = source.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '$' {
                text.push(c);
                continue;
            }
            match chars.peek().copied() {
                Some('$') => {
                    chars.next();
                    text.push('$');
                }
                Some('*') => {
                    chars.next();
                    flush_text(&mut parts, &mut text);
                    parts.push(TemplatePart::AllArgs);
                }
                Some(d) if d.is_ascii_digit() => {
                    let mut digits = String::new();
                    while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                        digits.push(d);
                        chars.next();
                    }
                    let index: usize = digits
                        .parse()
                        .map_err(|_| invalid(format!("argument index '{digits}' is too large")))?;
                    let Some(arity) = arity else {
                        return Err(invalid(
                            "positional arguments need an explicit arity".to_string(),
                        ));
                    };
                    if index >= arity {
                        return Err(ConfigError::ArgumentOutOfRange {
                            name: name.to_string(),
                            template: source.to_string(),
                            index,
                            arity,
                        });
                    }
                    flush_text(&mut parts, &mut text);
                    parts.push(TemplatePart::Arg(index));
                }
                Some(other) => return Err(invalid(format!("unknown placeholder '${other}'"))),
                None => return Err(invalid("dangling '$'".to_string())),
            }
        }
        flush_text(&mut parts, &mut text);
        Ok(Self { parts })
    }

    pub fn render(&self, args: &[Operand]) -> String {
        let mut rendered = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Text(text) => rendered.push_str(text),
                TemplatePart::Arg(index) => {
                    if let Some(arg) = args.get(*index) {
                        rendered.push_str(&arg.wrapped());
                    }
                }
                TemplatePart::AllArgs => {
                    let joined = args
                        .iter()
                        .map(|arg| arg.text.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    rendered.push_str(&joined);
                }
            }
        }
        rendered
    }
}

fn flush_text(parts: &mut Vec<TemplatePart>, text: &mut String) {
    if !text.is_empty() {
        parts.push(TemplatePart::Text(std::mem::take(text)));
    }
}

/// Host-supplied form, as written in the options file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuiltinSpec {
    #[serde(default)]
    pub arity: Option<usize>,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BuiltinForm {
    arity: Option<usize>,
    template: Template,
}

/// Source-callee to output-idiom mapping consulted before generic call
/// emission. Overrides replace every form registered for a name; an empty
/// override list removes the built-in.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<BuiltinSpec>>")]
pub struct BuiltinTable {
    forms: FxHashMap<String, Vec<BuiltinForm>>,
}

impl BuiltinTable {
    pub fn with_overrides(
        overrides: BTreeMap<String, Vec<BuiltinSpec>>,
    ) -> Result<Self, ConfigError> {
        let mut table = Self::default();
        for (name, specs) in overrides {
            let forms = specs
                .into_iter()
                .map(|spec| {
                    Ok(BuiltinForm {
                        arity: spec.arity,
                        template: Template::parse(&name, spec.arity, &spec.template)?,
                    })
                })
                .collect::<Result<Vec<_>, ConfigError>>()?;
            table.forms.insert(name, forms);
        }
        Ok(table)
    }

    pub fn lookup(&self, name: &str, arity: usize) -> Option<&Template> {
        self.forms
            .get(name)?
            .iter()
            .find(|form| form.arity.is_none_or(|expected| expected == arity))
            .map(|form| &form.template)
    }
}

impl Default for BuiltinTable {
    fn default() -> Self {
        let mut forms = FxHashMap::default();
        for builtin in BuiltinFunction::ALL {
            let builtin_forms = builtin
                .default_forms()
                .iter()
                .filter_map(|&(arity, source)| {
                    Template::parse(builtin.name(), arity, source)
                        .ok()
                        .map(|template| BuiltinForm { arity, template })
                })
                .collect();
            forms.insert(builtin.name().to_string(), builtin_forms);
        }
        Self { forms }
    }
}

impl TryFrom<BTreeMap<String, Vec<BuiltinSpec>>> for BuiltinTable {
    type Error = ConfigError;

    fn try_from(overrides: BTreeMap<String, Vec<BuiltinSpec>>) -> Result<Self, Self::Error> {
        Self::with_overrides(overrides)
    }
}
