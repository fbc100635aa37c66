//! Name/type checking entry points.
//!
//! `Checker` owns the scope reference, the per-check [`CheckContext`], an
//! append-only error sink, and a [`CheckerConfig`] — a mix of borrowed
//! collaborators and interior mutable caches, with none of the
//! thread-safety a single-pass checker never needs.

pub mod expr;
pub mod stmt;

use crate::ast::WordDef;
use crate::error::Error;
use crate::meta::Meta;
use crate::scope::{CheckContext, Scope};
use std::collections::HashMap;

/// A builtin's declared shape: exact parameter Metas and a return Meta.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservedSignature {
    pub params: Vec<Meta>,
    pub returns: Meta,
}

/// Extra reserved call names beyond `map`, `malloc32`, `malloc64`. Lets an
/// embedder teach the checker about additional intrinsics without forking
/// it.
#[derive(Debug, Clone, Default)]
pub struct CheckerConfig {
    reserved: HashMap<String, ReservedSignature>,
}

impl CheckerConfig {
    pub fn new() -> Self {
        CheckerConfig::default()
    }

    pub fn with_reserved(
        mut self,
        name: impl Into<String>,
        params: Vec<Meta>,
        returns: Meta,
    ) -> Self {
        self.reserved.insert(name.into(), ReservedSignature { params, returns });
        self
    }

    pub(crate) fn reserved(&self, name: &str) -> Option<&ReservedSignature> {
        self.reserved.get(name)
    }
}

pub struct Checker<'s, S: Scope> {
    pub(crate) scope: &'s S,
    pub(crate) ctx: CheckContext,
    pub(crate) config: CheckerConfig,
    errors: Vec<Error>,
}

impl<'s, S: Scope> Checker<'s, S> {
    pub fn new(scope: &'s S, config: CheckerConfig) -> Self {
        Checker {
            scope,
            ctx: CheckContext::new(),
            config,
            errors: Vec::new(),
        }
    }

    /// Checks every word, continuing past a word that failed so later words
    /// still get checked. Returns the full accumulated error
    /// list.
    pub fn check_program(&mut self, words: &mut [WordDef]) -> Vec<Error> {
        tracing::debug!(word_count = words.len(), "checking program");
        for word in words.iter_mut() {
            self.check_word(word);
        }
        self.errors.clone()
    }

    /// Checks one word's body statement by statement, continuing past a
    /// sibling statement's error. Returns only the errors this call added.
    pub fn check_word(&mut self, word: &mut WordDef) -> Vec<Error> {
        tracing::trace!(name = word.id.name(), "checking word");
        let start = self.errors.len();
        *self.ctx.current_func.borrow_mut() = Some(word.id.clone());

        let scope_frame = word.body.scope_frame;
        for seq_no in 0..word.body.stmts.len() {
            let stmt = &mut word.body.stmts[seq_no];
            if let Err(e) = stmt::check_stmt(self, stmt, scope_frame, seq_no) {
                self.errors.push(e);
            }
        }

        *self.ctx.current_func.borrow_mut() = None;
        self.errors[start..].to_vec()
    }
}

/// External entry point: `checker::check_program(words, scope, config) -> Vec<Error>`.
pub fn check_program<S: Scope>(
    words: &mut [WordDef],
    scope: &S,
    config: CheckerConfig,
) -> Vec<Error> {
    Checker::new(scope, config).check_program(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::meta::MetaKind;
    use crate::scope::tests::MapScope;
    use std::cell::Cell;
    use std::rc::Rc;

    fn func(name: &str, params: Vec<IdHandle>, returns: Meta) -> IdHandle {
        Rc::new(Id::Func {
            name: name.to_string(),
            pos: Pos::new(0, 0),
            is_used: Cell::new(false),
            params,
            returns,
        })
    }

    #[test]
    fn check_word_reports_undefined_id_and_continues() {
        let scope = MapScope::new();
        let mut config = CheckerConfig::new();
        config = config.with_reserved("noop", vec![], Meta::void());

        let body_pos = Pos::new(1, 0);
        let mut body = Blk::new(BlkKind::Func, body_pos.clone());
        body.stmts.push(stmt_new_exp(exp_new_id("missing", Pos::new(1, 1)), Pos::new(1, 1)));
        body.stmts.push(stmt_new_exp(exp_new_lit_int(1, Pos::new(2, 1)), Pos::new(2, 1)));

        let mut word = WordDef {
            id: func("w", vec![], Meta::void()),
            body,
        };

        let mut checker = Checker::new(&scope, config);
        let errors = checker.check_word(&mut word);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, crate::error::ErrorKind::UndefinedId);
    }

    #[test]
    fn check_word_resolves_declared_variable() {
        let mut scope = MapScope::new();
        let v = scope.declare_var("count", Meta::of(MetaKind::Int32));

        let mut body = Blk::new(BlkKind::Func, Pos::new(0, 0));
        let id_exp = exp_new_id("count", Pos::new(0, 0));
        body.stmts.push(stmt_new_exp(id_exp, Pos::new(0, 0)));

        let mut word = WordDef {
            id: func("w", vec![], Meta::void()),
            body,
        };

        let mut checker = Checker::new(&scope, CheckerConfig::new());
        let errors = checker.check_word(&mut word);
        assert!(errors.is_empty());
        assert!(v.is_used());
    }
}
