//! Lexical scopes and their namespaces.
//!
//! A [`ScopeIndex`] records, for the module, every class body and every
//! function body, the names bound directly in that scope and the line each
//! binding happens at. Compound statements (`if`, `for`, `try`, ...) do not
//! open scopes; their bodies bind into the enclosing scope, so a class defined
//! under `if __name__ == "__main__":` is a module binding.
//!
//! Binding lines model execution order. A class name is bound after its body
//! has run, so its binding line is the last line of the class body. A slot
//! decorator binds `__slots__` in the class body at the first line of the
//! decorated definition.

use std::collections::HashMap;

use slotinfer_python_cst::{ClassDef, DefId, Expression, FunctionDef, Module, Statement};

use crate::decorators::DecoratorMatcher;

/// Index of a scope within a [`ScopeIndex`].
pub type ScopeId = usize;

/// The module scope is always the first scope.
pub const MODULE_SCOPE: ScopeId = 0;

/// Reserved name of the slot declaration.
pub const SLOTS_NAME: &str = "__slots__";

#[derive(Debug, Clone, Copy)]
pub enum ScopeKind<'a> {
    Module,
    Class(&'a ClassDef<'a>),
    Function(&'a FunctionDef<'a>),
}

/// What a name is bound to.
#[derive(Debug, Clone, Copy)]
pub enum BindingKind<'a> {
    /// A class statement.
    Class(&'a ClassDef<'a>),
    /// A `def` statement.
    Function,
    /// A plain name target of an assignment, with the assigned value.
    Value(&'a Expression<'a>),
    /// An import or from-import.
    Import,
    /// `__slots__` installed by a slot decorator on the given initializer.
    SlotsInstall(&'a FunctionDef<'a>),
    /// Any other binding: loop and `with` targets, unpacking, augmented
    /// assignment, exception names, type aliases.
    Other,
}

#[derive(Debug, Clone, Copy)]
pub struct Binding<'a> {
    pub name: &'a str,
    pub line: u32,
    pub kind: BindingKind<'a>,
}

#[derive(Debug)]
pub struct Scope<'a> {
    pub kind: ScopeKind<'a>,
    pub parent: Option<ScopeId>,
    /// Python `__qualname__` of the class or function; empty for the module.
    pub qualname: String,
    /// Bindings in source order.
    pub bindings: Vec<Binding<'a>>,
}

impl<'a> Scope<'a> {
    /// The latest binding of `name` on a line before `cutoff`.
    ///
    /// Without a cutoff every binding is visible. Among bindings on the same
    /// line the later one wins.
    pub fn lookup_before(&self, name: &str, cutoff: Option<u32>) -> Option<Binding<'a>> {
        self.bindings
            .iter()
            .filter(|b| b.name == name && cutoff.is_none_or(|c| b.line < c))
            .max_by_key(|b| b.line)
            .copied()
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, ScopeKind::Class(_))
    }

    /// Prefix for the qualified names of definitions nested in this scope.
    fn child_prefix(&self) -> String {
        match self.kind {
            ScopeKind::Module => String::new(),
            ScopeKind::Class(_) => format!("{}.", self.qualname),
            ScopeKind::Function(_) => format!("{}.<locals>.", self.qualname),
        }
    }
}

/// Scopes, namespaces and definitions of one module.
#[derive(Debug)]
pub struct ScopeIndex<'a> {
    scopes: Vec<Scope<'a>>,
    /// Body scope of each class and function.
    bodies: HashMap<DefId, ScopeId>,
    /// Scope each class and function statement executes in.
    enclosing: HashMap<DefId, ScopeId>,
    classes: HashMap<DefId, &'a ClassDef<'a>>,
    /// All functions in source order.
    functions: Vec<&'a FunctionDef<'a>>,
    /// Functions carrying at least one slot decorator.
    decorated: Vec<&'a FunctionDef<'a>>,
}

impl<'a> ScopeIndex<'a> {
    /// Index a module. `matcher` selects the decorators that install
    /// `__slots__`.
    pub fn build(module: &'a Module<'a>, matcher: &DecoratorMatcher) -> Self {
        let mut index = ScopeIndex {
            scopes: vec![Scope {
                kind: ScopeKind::Module,
                parent: None,
                qualname: String::new(),
                bindings: Vec::new(),
            }],
            bodies: HashMap::new(),
            enclosing: HashMap::new(),
            classes: HashMap::new(),
            functions: Vec::new(),
            decorated: Vec::new(),
        };
        index.index_body(MODULE_SCOPE, &module.body, matcher);
        index
    }

    pub fn scope(&self, id: ScopeId) -> &Scope<'a> {
        &self.scopes[id]
    }

    pub fn module(&self) -> &Scope<'a> {
        &self.scopes[MODULE_SCOPE]
    }

    pub fn body_of(&self, id: DefId) -> Option<ScopeId> {
        self.bodies.get(&id).copied()
    }

    pub fn enclosing_of(&self, id: DefId) -> Option<ScopeId> {
        self.enclosing.get(&id).copied()
    }

    pub fn class(&self, id: DefId) -> Option<&'a ClassDef<'a>> {
        self.classes.get(&id).copied()
    }

    /// Qualified name of a class or function.
    pub fn qualname(&self, id: DefId) -> Option<&str> {
        self.body_of(id).map(|s| self.scopes[s].qualname.as_str())
    }

    /// The first function whose `def` keyword is on `line`.
    pub fn function_at_line(&self, line: u32) -> Option<&'a FunctionDef<'a>> {
        self.functions.iter().copied().find(|f| f.line == line)
    }

    /// Functions carrying a slot decorator, in source order.
    pub fn decorated(&self) -> &[&'a FunctionDef<'a>] {
        &self.decorated
    }

    fn new_scope(&mut self, kind: ScopeKind<'a>, parent: ScopeId, name: &str) -> ScopeId {
        let qualname = format!("{}{}", self.scopes[parent].child_prefix(), name);
        self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            qualname,
            bindings: Vec::new(),
        });
        self.scopes.len() - 1
    }

    fn bind(&mut self, scope: ScopeId, name: &'a str, line: u32, kind: BindingKind<'a>) {
        self.scopes[scope].bindings.push(Binding { name, line, kind });
    }

    /// Index the statements of a body, returning the last line seen.
    fn index_body(
        &mut self,
        scope: ScopeId,
        body: &'a [Statement<'a>],
        matcher: &DecoratorMatcher,
    ) -> u32 {
        let mut last = 0;
        for stmt in body {
            last = last.max(stmt.line());
            let end = self.index_statement(scope, stmt, matcher);
            last = last.max(end);
        }
        last
    }

    fn index_statement(
        &mut self,
        scope: ScopeId,
        stmt: &'a Statement<'a>,
        matcher: &DecoratorMatcher,
    ) -> u32 {
        match stmt {
            Statement::FunctionDef(f) => {
                if !matcher.slot_decorators(f).is_empty() {
                    self.bind(scope, SLOTS_NAME, f.first_line(), BindingKind::SlotsInstall(f));
                    self.decorated.push(f);
                }
                self.functions.push(f);
                let body = self.new_scope(ScopeKind::Function(f), scope, f.name.value);
                self.bodies.insert(f.id(), body);
                self.enclosing.insert(f.id(), scope);
                self.bind(scope, f.name.value, f.line, BindingKind::Function);
                self.index_body(body, &f.body, matcher)
            }
            Statement::ClassDef(c) => {
                let body = self.new_scope(ScopeKind::Class(c), scope, c.name.value);
                self.bodies.insert(c.id(), body);
                self.enclosing.insert(c.id(), scope);
                self.classes.insert(c.id(), c);
                let end = self.index_body(body, &c.body, matcher).max(c.line);
                self.bind(scope, c.name.value, end, BindingKind::Class(c));
                end
            }
            Statement::Assign(a) => {
                for target in &a.targets {
                    self.bind_target(scope, target, a.line, BindingKind::Value(&a.value));
                }
                a.line
            }
            Statement::AnnAssign(a) => {
                if let Some(value) = &a.value {
                    self.bind_target(scope, &a.target, a.line, BindingKind::Value(value));
                }
                a.line
            }
            Statement::AugAssign(a) => {
                self.bind_target(scope, &a.target, a.line, BindingKind::Other);
                a.line
            }
            Statement::Import(i) => {
                for alias in &i.names {
                    if let Some(name) = alias.bound_name() {
                        self.bind(scope, name, i.line, BindingKind::Import);
                    }
                }
                i.line
            }
            Statement::ImportFrom(i) => {
                for alias in &i.names {
                    if let Some(name) = alias.bound_name() {
                        self.bind(scope, name, i.line, BindingKind::Import);
                    }
                }
                i.line
            }
            Statement::If(s) => {
                let end = self.index_body(scope, &s.body, matcher);
                end.max(self.index_body(scope, &s.orelse, matcher))
            }
            Statement::While(s) => {
                let end = self.index_body(scope, &s.body, matcher);
                end.max(self.index_body(scope, &s.orelse, matcher))
            }
            Statement::For(s) => {
                self.bind_target(scope, &s.target, s.line, BindingKind::Other);
                let end = self.index_body(scope, &s.body, matcher);
                end.max(self.index_body(scope, &s.orelse, matcher))
            }
            Statement::With(s) => {
                for item in &s.items {
                    if let Some(target) = &item.target {
                        self.bind_target(scope, target, s.line, BindingKind::Other);
                    }
                }
                self.index_body(scope, &s.body, matcher)
            }
            Statement::Try(s) => {
                let mut end = self.index_body(scope, &s.body, matcher);
                for handler in &s.handlers {
                    if let Some(name) = handler.name {
                        self.bind(scope, name.value, name.line, BindingKind::Other);
                    }
                    end = end.max(self.index_body(scope, &handler.body, matcher));
                }
                end = end.max(self.index_body(scope, &s.orelse, matcher));
                end.max(self.index_body(scope, &s.finalbody, matcher))
            }
            Statement::Match(s) => s
                .cases
                .iter()
                .map(|case| self.index_body(scope, &case.body, matcher))
                .max()
                .unwrap_or(s.line),
            Statement::Other(o) if o.keyword == "type" => {
                if let Some(Expression::Name(n)) = o.exprs.first() {
                    self.bind(scope, n.value, o.line, BindingKind::Other);
                }
                o.line
            }
            other => other.line(),
        }
    }

    /// Bind the plain names of an assignment target. Names inside unpacking
    /// targets are bound to an unknown element of the value.
    fn bind_target(
        &mut self,
        scope: ScopeId,
        target: &'a Expression<'a>,
        line: u32,
        kind: BindingKind<'a>,
    ) {
        match target {
            Expression::Name(n) => self.bind(scope, n.value, line, kind),
            Expression::Tuple(t) => {
                for e in &t.elements {
                    self.bind_target(scope, e, line, BindingKind::Other);
                }
            }
            Expression::List(l) => {
                for e in &l.elements {
                    self.bind_target(scope, e, line, BindingKind::Other);
                }
            }
            Expression::Starred(s) => self.bind_target(scope, &s.value, line, BindingKind::Other),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotinfer_python_cst::parse_module;

    fn matcher() -> DecoratorMatcher {
        DecoratorMatcher::new(["slots", "slot.s"])
    }

    fn names(scope: &Scope<'_>) -> Vec<(String, u32)> {
        scope
            .bindings
            .iter()
            .map(|b| (b.name.to_string(), b.line))
            .collect()
    }

    #[test]
    fn module_bindings_include_nested_blocks() {
        let source = "\
import os, a.b as ab
from m import x as y
CONST = 1
if __name__ == '__main__':
    class Base:
        pass
    for i, (j, *k) in pairs:
        total += i
";
        let module = parse_module(source).unwrap();
        let index = ScopeIndex::build(&module, &matcher());
        assert_eq!(
            names(index.module()),
            vec![
                ("os".to_string(), 1),
                ("ab".to_string(), 1),
                ("y".to_string(), 2),
                ("CONST".to_string(), 3),
                ("Base".to_string(), 6),
                ("i".to_string(), 7),
                ("j".to_string(), 7),
                ("k".to_string(), 7),
                ("total".to_string(), 8),
            ]
        );
        let base = index.module().lookup_before("Base", None).unwrap();
        assert!(matches!(base.kind, BindingKind::Class(c) if c.name.value == "Base"));
    }

    #[test]
    fn class_binding_happens_after_body() {
        let source = "\
class A:
    x = 1

    def f(self):
        pass
B = A
";
        let module = parse_module(source).unwrap();
        let index = ScopeIndex::build(&module, &matcher());
        let a = index.module().lookup_before("A", None).unwrap();
        assert_eq!(a.line, 5);
        assert!(index.module().lookup_before("A", Some(5)).is_none());
        let b = index.module().lookup_before("B", None).unwrap();
        assert!(matches!(b.kind, BindingKind::Value(Expression::Name(n)) if n.value == "A"));
    }

    #[test]
    fn slot_decorator_installs_in_class_body() {
        let source = "\
class A:
    other = 1

    @property
    @slots
    def __init__(self):
        self.x = 1
";
        let module = parse_module(source).unwrap();
        let index = ScopeIndex::build(&module, &matcher());
        assert_eq!(index.decorated().len(), 1);
        let decorated = index.decorated()[0];
        let class_scope = index.scope(index.enclosing_of(decorated.id()).unwrap());
        assert_eq!(class_scope.qualname, "A");
        let slots = class_scope.lookup_before(SLOTS_NAME, None).unwrap();
        assert_eq!(slots.line, 4);
        assert!(matches!(slots.kind, BindingKind::SlotsInstall(f) if f.line == 6));
        assert!(class_scope.lookup_before(SLOTS_NAME, Some(4)).is_none());
    }

    #[test]
    fn qualified_names() {
        let source = "\
class Outer:
    class Inner:
        def __init__(self):
            pass

def factory():
    class Local:
        pass
    return Local
";
        let module = parse_module(source).unwrap();
        let index = ScopeIndex::build(&module, &matcher());
        let qualnames: Vec<&str> = (0..5).map(|i| index.scope(i).qualname.as_str()).collect();
        assert_eq!(
            qualnames,
            vec!["", "Outer", "Outer.Inner", "Outer.Inner.__init__", "factory"]
        );
        assert_eq!(index.scope(5).qualname, "factory.<locals>.Local");
        let init = index.function_at_line(3).unwrap();
        assert_eq!(index.qualname(init.id()), Some("Outer.Inner.__init__"));
        assert!(index.scope(index.enclosing_of(init.id()).unwrap()).is_class());
    }

    #[test]
    fn lookup_before_prefers_latest() {
        let source = "x = 1\nx = 2\nx = 3\n";
        let module = parse_module(source).unwrap();
        let index = ScopeIndex::build(&module, &matcher());
        assert_eq!(index.module().lookup_before("x", Some(3)).unwrap().line, 2);
        assert_eq!(index.module().lookup_before("x", None).unwrap().line, 3);
        assert!(index.module().lookup_before("x", Some(1)).is_none());
    }

    #[test]
    fn function_at_line_uses_def_keyword() {
        let source = "@slots\ndef f(self):\n    pass\n";
        let module = parse_module(source).unwrap();
        let index = ScopeIndex::build(&module, &matcher());
        assert!(index.function_at_line(1).is_none());
        assert_eq!(index.function_at_line(2).map(|f| f.name.value), Some("f"));
    }
}
