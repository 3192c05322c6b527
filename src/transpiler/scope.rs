use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::{Expression, Parameter, Statement};
use crate::config::Scoping;
use crate::error::TranslateError;

pub const GLOBAL_SCOPE: &str = "global";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Global,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKeyword {
    Let,
    Const,
}

impl BindingKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Let => "let",
            Self::Const => "const",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationForm {
    FirstBinding(BindingKeyword),
    Reassignment,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    declared: FxHashSet<String>,
    params: FxHashSet<String>,
    /// Names bound more than once in this function's own body.
    rebound: FxHashSet<String>,
    /// Targets of the loops currently open in this frame, innermost last.
    loop_targets: Vec<Vec<String>>,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            declared: FxHashSet::default(),
            params: FxHashSet::default(),
            rebound: FxHashSet::default(),
            loop_targets: Vec::new(),
        }
    }

    fn binds_in_loop(&self, name: &str) -> bool {
        self.loop_targets.iter().flatten().any(|target| target == name)
    }
}

/// Declaration bookkeeping for one translation run.
///
/// In [`Scoping::Flat`] every first binding lands in the single global set,
/// so a name is declared once per run no matter which function binds it.
/// Parameters of the enclosing functions are always treated as declared,
/// and so are the targets of the loops open in the current function, whose
/// `let` lives in the loop header.
#[derive(Debug)]
pub struct ScopeTracker {
    scoping: Scoping,
    global: Frame,
    functions: Vec<Frame>,
    call_stack: Vec<String>,
}

impl ScopeTracker {
    pub fn new(scoping: Scoping) -> Self {
        Self {
            scoping,
            global: Frame::new(FrameKind::Global),
            functions: Vec::new(),
            call_stack: Vec::new(),
        }
    }

    pub fn declare(&mut self, name: &str) -> DeclarationForm {
        if self.current_frame().binds_in_loop(name) {
            return DeclarationForm::Reassignment;
        }
        match self.scoping {
            Scoping::Flat => {
                let is_param = self.functions.iter().any(|frame| frame.params.contains(name));
                if is_param || !self.global.declared.insert(name.to_string()) {
                    return DeclarationForm::Reassignment;
                }
                match self.frame_kind() {
                    FrameKind::Global => DeclarationForm::FirstBinding(BindingKeyword::Let),
                    FrameKind::Function => DeclarationForm::FirstBinding(BindingKeyword::Const),
                }
            }
            Scoping::Lexical => {
                let frame = self.current_frame_mut();
                if frame.params.contains(name) || !frame.declared.insert(name.to_string()) {
                    return DeclarationForm::Reassignment;
                }
                let keyword = match frame.kind {
                    FrameKind::Function if !frame.rebound.contains(name) => BindingKeyword::Const,
                    _ => BindingKeyword::Let,
                };
                DeclarationForm::FirstBinding(keyword)
            }
        }
    }

    /// Records a function definition's name in the enclosing frame, so a
    /// later plain assignment reuses the function's binding.
    pub fn declare_function(&mut self, name: &str) {
        let frame = match self.scoping {
            Scoping::Flat => &mut self.global,
            Scoping::Lexical => self.current_frame_mut(),
        };
        frame.declared.insert(name.to_string());
    }

    /// Declares up front, in [`Scoping::Lexical`], every local whose first
    /// binding sits inside an `if` or loop body, so the JavaScript binding
    /// is not confined to that block. Returns the names in binding order;
    /// [`Scoping::Flat`] hoists nothing.
    pub fn hoist_block_locals(&mut self, body: &[Statement]) -> Vec<String> {
        if self.scoping != Scoping::Lexical {
            return Vec::new();
        }
        let mut first_bound = FxHashSet::default();
        let mut hoisted = Vec::new();
        nested_first_bindings(body, false, &mut Vec::new(), &mut first_bound, &mut hoisted);

        let frame = self.current_frame_mut();
        hoisted
            .into_iter()
            .filter(|name| !frame.params.contains(*name) && frame.declared.insert(name.to_string()))
            .map(str::to_string)
            .collect()
    }

    pub fn enter_loop(&mut self, targets: Vec<String>) {
        self.current_frame_mut().loop_targets.push(targets);
    }

    pub fn exit_loop(&mut self) -> Result<(), TranslateError> {
        self.current_frame_mut()
            .loop_targets
            .pop()
            .map(drop)
            .ok_or_else(|| TranslateError::internal("exit_loop called without a matching enter_loop"))
    }

    pub fn enter_function(&mut self, name: &str, params: &[Parameter], body: &[Statement]) {
        let mut frame = Frame::new(FrameKind::Function);
        frame.params = params.iter().map(|param| param.name.clone()).collect();
        if self.scoping == Scoping::Lexical {
            let mut counts = FxHashMap::default();
            count_bindings(body, &mut counts);
            frame.rebound = counts
                .into_iter()
                .filter(|&(_, count)| count > 1)
                .map(|(name, _)| name.to_string())
                .collect();
        }
        self.functions.push(frame);
        self.call_stack.push(name.to_string());
    }

    pub fn exit_function(&mut self) -> Result<(), TranslateError> {
        match (self.functions.pop(), self.call_stack.pop()) {
            (Some(_), Some(_)) => Ok(()),
            _ => Err(TranslateError::internal(
                "exit_function called without a matching enter_function",
            )),
        }
    }

    /// Innermost enclosing function name, or `global`.
    pub fn current_scope(&self) -> &str {
        self.call_stack
            .last()
            .map(String::as_str)
            .unwrap_or(GLOBAL_SCOPE)
    }

    fn current_frame(&self) -> &Frame {
        self.functions.last().unwrap_or(&self.global)
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        self.functions.last_mut().unwrap_or(&mut self.global)
    }

    pub fn frame_kind(&self) -> FrameKind {
        if self.functions.is_empty() {
            FrameKind::Global
        } else {
            FrameKind::Function
        }
    }
}

fn count_bindings<'a>(body: &'a [Statement], counts: &mut FxHashMap<&'a str, usize>) {
    for statement in body {
        match statement {
            Statement::Assign { targets, .. } => {
                for target in targets {
                    if let Expression::Name(name) = target {
                        *counts.entry(name.as_str()).or_default() += 1;
                    }
                }
            }
            Statement::AugAssign {
                target: Expression::Name(name),
                ..
            } => {
                // An augmented assignment always follows some earlier binding.
                *counts.entry(name.as_str()).or_default() += 2;
            }
            Statement::If { body, orelse, .. } => {
                count_bindings(body, counts);
                count_bindings(orelse, counts);
            }
            Statement::For { body, .. } | Statement::While { body, .. } => {
                count_bindings(body, counts);
            }
            _ => {}
        }
    }
}

/// Collects, in source order, names whose first binding is nested in a
/// block. Assignments to an enclosing loop's target are not bindings.
fn nested_first_bindings<'a>(
    body: &'a [Statement],
    nested: bool,
    loop_targets: &mut Vec<&'a str>,
    first_bound: &mut FxHashSet<&'a str>,
    hoisted: &mut Vec<&'a str>,
) {
    for statement in body {
        match statement {
            Statement::Assign { targets, .. } => {
                for target in targets {
                    if let Expression::Name(name) = target {
                        bind_first(name, nested, loop_targets, first_bound, hoisted);
                    }
                }
            }
            Statement::AugAssign {
                target: Expression::Name(name),
                ..
            } => bind_first(name, nested, loop_targets, first_bound, hoisted),
            Statement::If { body, orelse, .. } => {
                nested_first_bindings(body, true, loop_targets, first_bound, hoisted);
                nested_first_bindings(orelse, true, loop_targets, first_bound, hoisted);
            }
            Statement::While { body, .. } => {
                nested_first_bindings(body, true, loop_targets, first_bound, hoisted);
            }
            Statement::For { target, body, .. } => {
                let depth = loop_targets.len();
                target.visit_names(&mut |name| loop_targets.push(name));
                nested_first_bindings(body, true, loop_targets, first_bound, hoisted);
                loop_targets.truncate(depth);
            }
            _ => {}
        }
    }
}

fn bind_first<'a>(
    name: &'a str,
    nested: bool,
    loop_targets: &[&'a str],
    first_bound: &mut FxHashSet<&'a str>,
    hoisted: &mut Vec<&'a str>,
) {
    if !loop_targets.contains(&name) && first_bound.insert(name) && nested {
        hoisted.push(name);
    }
}
