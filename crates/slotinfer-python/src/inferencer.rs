//! The slot inferencer.
//!
//! [`SlotInferencer`] infers the `__slots__` declaration of decorated
//! initializers in one parsed module and installs it into the class
//! namespace model of the [`ScopeIndex`].
//!
//! # Base classes
//!
//! A `super().__init__(...)` call merges the declared slots of every base of
//! the enclosing class. Base names are looked up the way the class body sees
//! them while the decorator runs: class body bindings made before the
//! initializer first, then module bindings. A resolved base supplies
//! `__slots__` through ordinary attribute lookup along its MRO. An ancestor
//! whose bases cannot be followed ends the known part of the MRO, and the
//! lookup fails only if it gets that far. Supported
//! declarations are slot decorator installations, literal sequences of
//! strings, `Other.__slots__` and concatenations of those.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::convert::Infallible;

use slotinfer_core::output::{Location, Warning};
use slotinfer_python_cst::{
    walk_function_def, ClassDef, DefId, DictItem, Expression, FunctionDef, Module,
};
use tracing::{debug, info, trace, warn};

use crate::collector::SlotCollector;
use crate::decorators::DecoratorMatcher;
use crate::error::{SlotError, SlotResult};
use crate::mro::{compute_mro, MroError};
use crate::scope::{
    Binding, BindingKind, ScopeId, ScopeIndex, ScopeKind, MODULE_SCOPE, SLOTS_NAME,
};
use crate::types::{DecoratorSpan, InferOptions, SlotDeclaration, SlotList};

/// Limit on `A = B` alias chains followed while resolving a name.
const MAX_ALIAS_DEPTH: usize = 32;

/// Name of the module namespace in error messages.
const MODULE_DISPLAY_NAME: &str = "<module>";

/// Builtin root class, implicit when not bound in the module.
const OBJECT_NAME: &str = "object";

/// Warning code for a decorated function outside a class body.
pub const WARN_OUTSIDE_CLASS: &str = "slots_outside_class";

/// Warning code for a decorated function not named `__init__`.
pub const WARN_NOT_INITIALIZER: &str = "not_an_initializer";

/// A node of an ancestry linearization. Bases that cannot be followed
/// statically are opaque and have no bases of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Ancestor {
    Class(DefId),
    /// Index of the error recorded for the base.
    Opaque(usize),
}

/// Slots inferred for one initializer.
#[derive(Debug, Clone)]
struct Inferred {
    slots: SlotList,
    merged_bases: Vec<String>,
}

/// Infers and installs slot declarations for one module.
pub struct SlotInferencer<'a> {
    file: String,
    index: ScopeIndex<'a>,
    matcher: DecoratorMatcher,
    /// Inferred slots per initializer.
    memo: HashMap<DefId, Inferred>,
    /// Initializers and classes whose slots are being computed.
    in_progress: HashSet<DefId>,
    warnings: Vec<Warning>,
}

impl<'a> SlotInferencer<'a> {
    pub fn new(module: &'a Module<'a>, file: impl Into<String>, options: &InferOptions) -> Self {
        let matcher = DecoratorMatcher::new(options.decorators.iter().cloned());
        let index = ScopeIndex::build(module, &matcher);
        SlotInferencer {
            file: file.into(),
            index,
            matcher,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    /// The scope index of the module.
    pub fn index(&self) -> &ScopeIndex<'a> {
        &self.index
    }

    /// Warnings produced so far.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    /// Infer and install the declaration for the function whose `def`
    /// keyword is on `line`.
    ///
    /// The function does not need to carry a slot decorator; its declaration
    /// is installed at its first line either way.
    pub fn infer_at_line(&mut self, line: u32) -> SlotResult<SlotDeclaration> {
        let function = self
            .index
            .function_at_line(line)
            .ok_or(SlotError::FunctionNotFound { line })?;
        self.install(function)
    }

    /// Infer and install the declarations of every decorated function, in
    /// source order. The first error aborts.
    pub fn infer_all(&mut self) -> SlotResult<Vec<SlotDeclaration>> {
        let functions: Vec<&'a FunctionDef<'a>> = self.index.decorated().to_vec();
        functions.into_iter().map(|f| self.install(f)).collect()
    }

    // ------------------------------------------------------------------------
    // Installation
    // ------------------------------------------------------------------------

    fn install(&mut self, function: &'a FunctionDef<'a>) -> SlotResult<SlotDeclaration> {
        let scope_id = self.index.enclosing_of(function.id()).unwrap_or(MODULE_SCOPE);
        let scope = self.index.scope(scope_id);
        let install_line = function.first_line();
        let slot_decorators = self.matcher.slot_decorators(function);

        let class = match scope.kind {
            ScopeKind::Class(c) => Some(c),
            _ => None,
        };

        let scope_name = if scope.qualname.is_empty() {
            MODULE_DISPLAY_NAME.to_string()
        } else {
            scope.qualname.clone()
        };
        if let [first, second, ..] = slot_decorators.as_slice() {
            return Err(SlotError::AlreadyDeclared {
                scope: scope_name,
                line: second.line,
                previous_line: first.line,
            });
        }
        if let Some(previous) = scope.lookup_before(SLOTS_NAME, Some(install_line)) {
            return Err(SlotError::AlreadyDeclared {
                scope: scope_name,
                line: install_line,
                previous_line: previous.line,
            });
        }

        if class.is_none() {
            let name = self.function_qualname(function);
            warn!(file = %self.file, function = %name, line = function.line, "slot decorator outside a class body");
            self.warnings.push(Warning::with_location(
                WARN_OUTSIDE_CLASS,
                format!("{} is not defined in a class body; no declaration is installed", name),
                Location::new(&self.file, function.line, function.col),
            ));
        }

        if function.name.value != "__init__" {
            self.warnings.push(Warning::with_location(
                WARN_NOT_INITIALIZER,
                format!("slot decorator on {}, which is not __init__", function.name.value),
                Location::new(&self.file, function.line, function.col),
            ));
        }

        let qualified_name = match class {
            Some(c) => self.class_qualname(c),
            None => self.function_qualname(function),
        };
        let inferred = self.infer_function(function)?;

        info!(
            file = %self.file,
            class = %qualified_name,
            line = install_line,
            slots = %inferred.slots,
            "installed __slots__"
        );

        Ok(SlotDeclaration {
            class_name: class.map(|c| c.name.value.to_string()),
            qualified_name,
            function: function.name.value.to_string(),
            def_line: function.line,
            def_col: function.col,
            install_line,
            decorator: slot_decorators.first().map(|d| DecoratorSpan {
                line: d.line,
                end_line: d.end_line,
            }),
            slots: inferred.slots,
            merged_bases: inferred.merged_bases,
        })
    }

    // ------------------------------------------------------------------------
    // Inference
    // ------------------------------------------------------------------------

    /// Slots of one initializer: its receiver assignments plus, when it
    /// delegates to `super().__init__`, the declared slots of every base.
    fn infer_function(&mut self, function: &'a FunctionDef<'a>) -> SlotResult<Inferred> {
        let id = function.id();
        if let Some(done) = self.memo.get(&id) {
            return Ok(done.clone());
        }
        if !self.in_progress.insert(id) {
            return Err(SlotError::CyclicInheritance {
                class: self.enclosing_qualname(function),
                line: function.line,
            });
        }
        let result = self.collect_and_merge(function);
        self.in_progress.remove(&id);

        let inferred = result?;
        self.memo.insert(id, inferred.clone());
        Ok(inferred)
    }

    fn collect_and_merge(&mut self, function: &'a FunctionDef<'a>) -> SlotResult<Inferred> {
        let mut collector = SlotCollector::new();
        walk_function_def(&mut collector, function);
        let mut names: BTreeSet<String> = collector.names;
        let mut merged_bases = Vec::new();

        trace!(function = %function.name.value, line = function.line, names = ?names, "collected receiver attributes");

        if let Some(&call_line) = collector.super_calls.first() {
            let scope_id = self.index.enclosing_of(function.id()).unwrap_or(MODULE_SCOPE);
            let ScopeKind::Class(class) = self.index.scope(scope_id).kind else {
                return Err(SlotError::EnclosingClassNotFound {
                    function: self.function_qualname(function),
                    line: call_line,
                });
            };
            let cutoff = function.first_line();

            for base in &class.bases {
                let Expression::Name(base_name) = base else {
                    return Err(SlotError::UnsupportedBase {
                        class: self.class_qualname(class),
                        line: class.line,
                    });
                };
                let (found_in, binding) = self
                    .lookup_two_tier(scope_id, base_name.value, cutoff)
                    .ok_or_else(|| SlotError::UnresolvedName {
                        name: base_name.value.to_string(),
                        line: base_name.line,
                    })?;
                let base_class =
                    self.binding_class(found_in, binding, base_name.value, base_name.line)?;
                let slots =
                    self.class_slots(base_class)?
                        .ok_or_else(|| SlotError::MissingSlots {
                            name: base_name.value.to_string(),
                            line: base_name.line,
                        })?;
                debug!(base = %base_name.value, slots = %slots, "merged base class slots");
                names.extend(slots.into_vec());
                merged_bases.push(self.class_qualname(base_class));
            }
        }

        Ok(Inferred {
            slots: SlotList::from(names),
            merged_bases,
        })
    }

    /// Declared slots of a class through attribute lookup along its MRO.
    /// `None` when no class in the MRO binds `__slots__`.
    fn class_slots(&mut self, class: &'a ClassDef<'a>) -> SlotResult<Option<SlotList>> {
        let id = class.id();
        if !self.in_progress.insert(id) {
            return Err(SlotError::CyclicInheritance {
                class: self.class_qualname(class),
                line: class.line,
            });
        }
        let result = self.class_slots_internal(class);
        self.in_progress.remove(&id);
        result
    }

    fn class_slots_internal(&mut self, class: &'a ClassDef<'a>) -> SlotResult<Option<SlotList>> {
        if let Some(found) = self.own_slots_binding(class) {
            return self.eval_slots_binding(class, found).map(Some);
        }

        let mut opaque: Vec<SlotError> = Vec::new();
        let mro = compute_mro(Ancestor::Class(class.id()), &mut |a: &Ancestor| {
            Ok::<_, Infallible>(self.ancestor_bases(*a, &mut opaque))
        })
        .map_err(|e| match e {
            MroError::InconsistentHierarchy(a) | MroError::Cycle(a) => match a {
                Ancestor::Class(id) => self.cyclic_error(id, class),
                Ancestor::Opaque(_) => self.cyclic_error(class.id(), class),
            },
            MroError::Bases(never) => match never {},
        })?;
        trace!(class = %self.class_qualname(class), mro = ?mro, "computed MRO");

        for ancestor in mro.into_iter().skip(1) {
            match ancestor {
                Ancestor::Class(id) => {
                    let Some(ancestor) = self.index.class(id) else {
                        continue;
                    };
                    if let Some(found) = self.own_slots_binding(ancestor) {
                        return self.eval_slots_binding(ancestor, found).map(Some);
                    }
                }
                // The lookup would continue into a class that cannot be analyzed
                Ancestor::Opaque(i) => return Err(opaque.swap_remove(i)),
            }
        }
        Ok(None)
    }

    /// The last `__slots__` binding in the body of a class.
    fn own_slots_binding(&self, class: &'a ClassDef<'a>) -> Option<(ScopeId, Binding<'a>)> {
        let body = self.index.body_of(class.id())?;
        self.index
            .scope(body)
            .lookup_before(SLOTS_NAME, None)
            .map(|b| (body, b))
    }

    fn eval_slots_binding(
        &mut self,
        owner: &'a ClassDef<'a>,
        (scope, binding): (ScopeId, Binding<'a>),
    ) -> SlotResult<SlotList> {
        match binding.kind {
            BindingKind::SlotsInstall(function) => {
                self.infer_function(function).map(|inferred| inferred.slots)
            }
            BindingKind::Value(expr) => self.eval_slots_expr(owner, expr, scope, binding.line, 0),
            _ => Err(self.opaque_slots(owner, binding.line)),
        }
    }

    /// Evaluate a `__slots__` value expression statically.
    fn eval_slots_expr(
        &mut self,
        owner: &'a ClassDef<'a>,
        expr: &'a Expression<'a>,
        scope: ScopeId,
        line: u32,
        depth: usize,
    ) -> SlotResult<SlotList> {
        match expr {
            Expression::Strings(s) => match s.value() {
                Some(name) => Ok([name].into_iter().collect()),
                None => Err(self.opaque_slots(owner, line)),
            },
            Expression::Tuple(t) => self.literal_names(owner, &t.elements, line),
            Expression::List(l) => self.literal_names(owner, &l.elements, line),
            Expression::Set(s) => self.literal_names(owner, &s.elements, line),
            Expression::Dict(d) => {
                let mut keys = Vec::with_capacity(d.items.len());
                for item in &d.items {
                    match item {
                        DictItem::Pair(key, _) => keys.push(key),
                        DictItem::Unpack(_) => {
                            return Err(self.opaque_slots(owner, line))
                        }
                    }
                }
                let mut names = Vec::with_capacity(keys.len());
                for key in keys {
                    match key {
                        Expression::Strings(s) => match s.value() {
                            Some(v) => names.push(v),
                            None => return Err(self.opaque_slots(owner, line)),
                        },
                        _ => return Err(self.opaque_slots(owner, line)),
                    }
                }
                Ok(names.into_iter().collect())
            }
            Expression::BinaryOp(op) if op.op == "+" => {
                let left = self.eval_slots_expr(owner, &op.left, scope, line, depth)?;
                let right = self.eval_slots_expr(owner, &op.right, scope, line, depth)?;
                Ok(left.union(&right))
            }
            Expression::Attribute(attr) if attr.attr.value == SLOTS_NAME => {
                let Expression::Name(name) = attr.value.as_ref() else {
                    return Err(self.opaque_slots(owner, line));
                };
                let (found_in, binding) = self
                    .resolve_lexical(name.value, scope, Some(line))
                    .ok_or_else(|| SlotError::UnresolvedName {
                        name: name.value.to_string(),
                        line: name.line,
                    })?;
                let class = self.binding_class(found_in, binding, name.value, name.line)?;
                self.class_slots(class)?
                    .ok_or_else(|| SlotError::MissingSlots {
                        name: name.value.to_string(),
                        line: name.line,
                    })
            }
            Expression::Name(name) if depth < MAX_ALIAS_DEPTH => {
                match self.resolve_lexical(name.value, scope, Some(line)) {
                    Some((found_in, Binding {
                        kind: BindingKind::Value(value),
                        line: bound_at,
                        ..
                    })) => self.eval_slots_expr(owner, value, found_in, bound_at, depth + 1),
                    _ => Err(self.opaque_slots(owner, line)),
                }
            }
            _ => Err(self.opaque_slots(owner, line)),
        }
    }

    fn literal_names(
        &self,
        owner: &'a ClassDef<'a>,
        elements: &'a [Expression<'a>],
        line: u32,
    ) -> SlotResult<SlotList> {
        let mut names = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                Expression::Strings(s) => match s.value() {
                    Some(v) => names.push(v),
                    None => return Err(self.opaque_slots(owner, line)),
                },
                _ => return Err(self.opaque_slots(owner, line)),
            }
        }
        Ok(names.into_iter().collect())
    }

    // ------------------------------------------------------------------------
    // Name resolution
    // ------------------------------------------------------------------------

    /// Look up a base name the way a class body sees it while a decorator in
    /// it runs: class body bindings before `cutoff`, then module bindings.
    fn lookup_two_tier(
        &self,
        class_scope: ScopeId,
        name: &str,
        cutoff: u32,
    ) -> Option<(ScopeId, Binding<'a>)> {
        if let Some(b) = self.index.scope(class_scope).lookup_before(name, Some(cutoff)) {
            return Some((class_scope, b));
        }
        let module_cutoff = self.module_cutoff(class_scope, Some(cutoff));
        self.index
            .module()
            .lookup_before(name, module_cutoff)
            .map(|b| (MODULE_SCOPE, b))
    }

    /// Cutoff for module bindings while `scope` executes up to `cutoff`.
    ///
    /// A class body runs while its enclosing scope is at the class
    /// statement. Once a function scope is crossed the time of execution is
    /// unknown and every module binding is visible.
    fn module_cutoff(&self, mut scope: ScopeId, mut cutoff: Option<u32>) -> Option<u32> {
        loop {
            let s = self.index.scope(scope);
            match s.kind {
                ScopeKind::Module => return cutoff,
                ScopeKind::Class(c) => cutoff = cutoff.map(|_| c.line),
                ScopeKind::Function(_) => return None,
            }
            scope = s.parent?;
        }
    }

    /// Python lexical name resolution from `scope`: the scope itself, then
    /// enclosing function scopes, then the module. Class scopes are not
    /// visible from functions nested in them.
    fn resolve_lexical(
        &self,
        name: &str,
        mut scope: ScopeId,
        mut cutoff: Option<u32>,
    ) -> Option<(ScopeId, Binding<'a>)> {
        let mut crossed_function = false;
        loop {
            let s = self.index.scope(scope);
            let visible = !(crossed_function && s.is_class());
            if visible {
                if let Some(b) = s.lookup_before(name, cutoff) {
                    return Some((scope, b));
                }
            }
            match s.kind {
                ScopeKind::Module => return None,
                ScopeKind::Class(c) => cutoff = cutoff.map(|_| c.line),
                ScopeKind::Function(_) => {
                    cutoff = None;
                    crossed_function = true;
                }
            }
            scope = s.parent?;
        }
    }

    /// The class a binding refers to, following `Alias = Class` assignments.
    fn binding_class(
        &self,
        scope: ScopeId,
        binding: Binding<'a>,
        name: &str,
        line: u32,
    ) -> SlotResult<&'a ClassDef<'a>> {
        let mut current = (scope, binding);
        for _ in 0..MAX_ALIAS_DEPTH {
            let (found_in, binding) = current;
            match binding.kind {
                BindingKind::Class(c) => return Ok(c),
                BindingKind::Value(Expression::Name(alias)) => {
                    current = self
                        .resolve_lexical(alias.value, found_in, Some(binding.line))
                        .ok_or_else(|| SlotError::UnresolvedName {
                            name: alias.value.to_string(),
                            line: alias.line,
                        })?;
                }
                _ => break,
            }
        }
        Err(SlotError::OpaqueBase {
            name: name.to_string(),
            line,
        })
    }

    /// Direct bases of an ancestor in a linearization.
    ///
    /// A base that cannot be followed becomes an opaque node holding the
    /// error, which is only reported if a lookup reaches it.
    fn ancestor_bases(&self, ancestor: Ancestor, opaque: &mut Vec<SlotError>) -> Vec<Ancestor> {
        let Ancestor::Class(id) = ancestor else {
            return Vec::new();
        };
        let Some(class) = self.index.class(id) else {
            return Vec::new();
        };
        let mut bases = Vec::with_capacity(class.bases.len());
        for base in &class.bases {
            match self.resolve_base(class, base) {
                Ok(Some(base_id)) => bases.push(Ancestor::Class(base_id)),
                Ok(None) => {}
                Err(err) => {
                    trace!(class = %self.class_qualname(class), error = %err, "opaque ancestor");
                    opaque.push(err);
                    bases.push(Ancestor::Opaque(opaque.len() - 1));
                }
            }
        }
        bases
    }

    /// One base of a class, resolved where its class statement runs.
    /// `None` for the implicit `object` root.
    fn resolve_base(
        &self,
        class: &'a ClassDef<'a>,
        base: &'a Expression<'a>,
    ) -> SlotResult<Option<DefId>> {
        let Expression::Name(name) = base else {
            return Err(SlotError::UnsupportedBase {
                class: self.class_qualname(class),
                line: class.line,
            });
        };
        let scope = self.index.enclosing_of(class.id()).unwrap_or(MODULE_SCOPE);
        match self.resolve_lexical(name.value, scope, Some(class.line)) {
            Some((found_in, binding)) => {
                let base_class = self.binding_class(found_in, binding, name.value, name.line)?;
                Ok(Some(base_class.id()))
            }
            None if name.value == OBJECT_NAME => Ok(None),
            None => Err(SlotError::UnresolvedName {
                name: name.value.to_string(),
                line: name.line,
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Names and errors
    // ------------------------------------------------------------------------

    fn class_qualname(&self, class: &ClassDef<'_>) -> String {
        self.index
            .qualname(class.id())
            .map(str::to_string)
            .unwrap_or_else(|| class.name.value.to_string())
    }

    fn function_qualname(&self, function: &FunctionDef<'_>) -> String {
        self.index
            .qualname(function.id())
            .map(str::to_string)
            .unwrap_or_else(|| function.name.value.to_string())
    }

    /// Qualified name of the class around a function, or of the function.
    fn enclosing_qualname(&self, function: &FunctionDef<'_>) -> String {
        let scope = self.index.enclosing_of(function.id()).unwrap_or(MODULE_SCOPE);
        match self.index.scope(scope).kind {
            ScopeKind::Class(c) => self.class_qualname(c),
            _ => self.function_qualname(function),
        }
    }

    fn opaque_slots(&self, owner: &ClassDef<'_>, line: u32) -> SlotError {
        SlotError::OpaqueSlots {
            class: self.class_qualname(owner),
            line,
        }
    }

    fn cyclic_error(&self, id: DefId, fallback: &ClassDef<'_>) -> SlotError {
        let class = self.index.class(id).unwrap_or(fallback);
        SlotError::CyclicInheritance {
            class: self.class_qualname(class),
            line: class.line,
        }
    }
}
