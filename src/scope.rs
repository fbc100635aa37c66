//! The symbol-table contract this crate checks against, plus the
//! checker-owned lookup context (current block, current function, and the
//! acquired-id redirect).

use crate::ast::IdHandle;
use std::cell::RefCell;

/// Name resolution, owned and implemented by the embedder. This crate never
/// stores identifiers itself; it only asks this trait for the `IdHandle` a
/// name resolves to in a given lexical position. `scope_frame` is the
/// opaque token carried on the enclosing `Blk` (see `ast::Blk`); passing it
/// by value instead of a `&Blk` lets the checker hold a mutable borrow of
/// the statement being checked and still resolve names in its block.
pub trait Scope {
    fn lookup_name(&self, scope_frame: u64, seq_no: usize, name: &str) -> Option<IdHandle>;
    fn lookup_param(&self, func: &IdHandle, name: &str) -> Option<IdHandle>;
    fn lookup_field(&self, aggregate: &IdHandle, name: &str) -> Option<IdHandle>;
    fn is_contract(&self, id: &IdHandle) -> bool;
    fn is_struct(&self, id: &IdHandle) -> bool;
    fn is_func(&self, id: &IdHandle) -> bool;
}

/// Per-check mutable context: which function is being checked, and the
/// "acquired id" redirect used while checking a struct/contract field
/// access chain (`a.b.c` redirects name lookup for `b` into `a`'s fields,
/// and `c` into `b`'s).
#[derive(Default)]
pub struct CheckContext {
    pub current_func: RefCell<Option<IdHandle>>,
    acquired: RefCell<Option<IdHandle>>,
}

impl CheckContext {
    pub fn new() -> Self {
        CheckContext::default()
    }

    pub fn acquired(&self) -> Option<IdHandle> {
        self.acquired.borrow().clone()
    }

    /// Redirects name lookup to `id`'s fields for the duration of the
    /// returned guard, restoring the previous redirect when it drops —
    /// including on an early `?` return from a failed field check.
    pub fn acquire(&self, id: IdHandle) -> AcquiredGuard<'_> {
        let previous = self.acquired.replace(Some(id));
        AcquiredGuard {
            ctx: self,
            previous,
        }
    }
}

pub struct AcquiredGuard<'c> {
    ctx: &'c CheckContext,
    previous: Option<IdHandle>,
}

impl Drop for AcquiredGuard<'_> {
    fn drop(&mut self) {
        *self.ctx.acquired.borrow_mut() = self.previous.take();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ast::Id;
    use crate::meta::{Meta, MetaKind};
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// A minimal in-memory `Scope` for this crate's own tests: a flat name
    /// table plus an explicit field/param map keyed by (owner name, field
    /// name), ignoring block/seq_no scoping rules entirely.
    #[derive(Default)]
    pub struct MapScope {
        pub names: HashMap<String, IdHandle>,
        pub fields: HashMap<(String, String), IdHandle>,
    }

    impl MapScope {
        pub fn new() -> Self {
            MapScope::default()
        }

        pub fn declare_var(&mut self, name: &str, meta: Meta) -> IdHandle {
            let id = Rc::new(Id::Var {
                name: name.to_string(),
                pos: crate::ast::Pos::new(0, 0),
                meta: std::cell::RefCell::new(meta),
                is_used: Cell::new(false),
            });
            self.names.insert(name.to_string(), id.clone());
            id
        }
    }

    impl Scope for MapScope {
        fn lookup_name(&self, _scope_frame: u64, _seq_no: usize, name: &str) -> Option<IdHandle> {
            self.names.get(name).cloned()
        }

        fn lookup_param(&self, func: &IdHandle, name: &str) -> Option<IdHandle> {
            func.params().iter().find(|p| p.name() == name).cloned()
        }

        fn lookup_field(&self, aggregate: &IdHandle, name: &str) -> Option<IdHandle> {
            self.fields
                .get(&(aggregate.name().to_string(), name.to_string()))
                .cloned()
                .or_else(|| aggregate.fields().iter().find(|f| f.name() == name).cloned())
        }

        fn is_contract(&self, id: &IdHandle) -> bool {
            id.is_contract()
        }

        fn is_struct(&self, id: &IdHandle) -> bool {
            id.is_struct()
        }

        fn is_func(&self, id: &IdHandle) -> bool {
            id.is_func()
        }
    }

    #[test]
    fn acquired_guard_restores_previous_on_drop() {
        let ctx = CheckContext::new();
        let outer = Rc::new(Id::Var {
            name: "outer".to_string(),
            pos: crate::ast::Pos::new(0, 0),
            meta: std::cell::RefCell::new(Meta::of(MetaKind::Int32)),
            is_used: Cell::new(false),
        });
        let inner = Rc::new(Id::Var {
            name: "inner".to_string(),
            pos: crate::ast::Pos::new(0, 0),
            meta: std::cell::RefCell::new(Meta::of(MetaKind::Int32)),
            is_used: Cell::new(false),
        });

        let _outer_guard = ctx.acquire(outer.clone());
        assert_eq!(ctx.acquired().unwrap().name(), "outer");
        {
            let _inner_guard = ctx.acquire(inner.clone());
            assert_eq!(ctx.acquired().unwrap().name(), "inner");
        }
        assert_eq!(ctx.acquired().unwrap().name(), "outer");
    }

    #[test]
    fn acquired_guard_restores_even_on_early_return() {
        fn fails(ctx: &CheckContext, id: IdHandle) -> Result<(), ()> {
            let _guard = ctx.acquire(id);
            Err(())
        }

        let ctx = CheckContext::new();
        let id = Rc::new(Id::Var {
            name: "x".to_string(),
            pos: crate::ast::Pos::new(0, 0),
            meta: std::cell::RefCell::new(Meta::of(MetaKind::Int32)),
            is_used: Cell::new(false),
        });
        assert!(fails(&ctx, id).is_err());
        assert!(ctx.acquired().is_none());
    }
}
