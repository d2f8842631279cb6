//! Operation hooks.
//!
//! Every mutating table operation runs its before-hooks, the core
//! operation, then its after-hooks. Each hook shares the operation's exact
//! argument shape. A failing before-hook aborts before the core operation
//! runs; a failing after-hook surfaces its error, but the core operation
//! has already committed.

use std::sync::Arc;

use rowmap_core::{Bindings, Filter};

use crate::error::Result;

/// Hook for single-record insert.
pub type InsertHook<R> = Arc<dyn Fn(&R) -> Result<()> + Send + Sync>;

/// Hook for batch insert.
pub type InsertManyHook<R> = Arc<dyn Fn(&[R]) -> Result<()> + Send + Sync>;

/// Hook for saving an existing record.
pub type SaveHook<R> = Arc<dyn Fn(&R) -> Result<()> + Send + Sync>;

/// Hook for filtered updates; receives the filter and the raw payload.
pub type UpdateHook = Arc<dyn Fn(&Filter, &Bindings) -> Result<()> + Send + Sync>;

/// Hook for filtered deletes.
pub type DeleteHook = Arc<dyn Fn(&Filter) -> Result<()> + Send + Sync>;

/// Before/after callback lists for one operation kind.
pub struct HookPair<F> {
    /// Callbacks run before the core operation.
    pub before: Vec<F>,
    /// Callbacks run after the core operation.
    pub after: Vec<F>,
}

impl<F> Default for HookPair<F> {
    fn default() -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
        }
    }
}

impl<F> HookPair<F> {
    fn merge(&mut self, other: Self) {
        self.before.extend(other.before);
        self.after.extend(other.after);
    }
}

/// Hooks for every operation of one table.
pub struct TableHooks<R> {
    /// Insert hooks.
    pub insert: HookPair<InsertHook<R>>,
    /// Batch-insert hooks.
    pub insert_many: HookPair<InsertManyHook<R>>,
    /// Save hooks.
    pub save: HookPair<SaveHook<R>>,
    /// Update hooks.
    pub update: HookPair<UpdateHook>,
    /// Delete hooks.
    pub delete: HookPair<DeleteHook>,
}

impl<R> Default for TableHooks<R> {
    fn default() -> Self {
        Self {
            insert: HookPair::default(),
            insert_many: HookPair::default(),
            save: HookPair::default(),
            update: HookPair::default(),
            delete: HookPair::default(),
        }
    }
}

impl<R> TableHooks<R> {
    /// Appends another hook set after this one's callbacks.
    pub fn merge(&mut self, other: TableHooks<R>) {
        self.insert.merge(other.insert);
        self.insert_many.merge(other.insert_many);
        self.save.merge(other.save);
        self.update.merge(other.update);
        self.delete.merge(other.delete);
    }
}
