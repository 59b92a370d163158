//! Storage port for persistence

use crate::Result;
use async_trait::async_trait;
use hbnb_types::{Entity, EntityKey, EntityKind};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Entities addressed by composite key, in key order
pub type Objects = BTreeMap<EntityKey, Entity>;

/// Uniform contract over the file and relational backends.
///
/// Mutations go through a unit of work: `new` and `delete` are visible to
/// this instance right away and become durable on `save`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    /// Every entity, or only those of `kind`.
    async fn all(&self, kind: Option<EntityKind>) -> Result<Objects>;

    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>>;

    /// Register a new or modified entity for persistence.
    async fn new(&self, entity: Entity) -> Result<()>;

    /// Persist the unit of work, stamping `updated_at` on every upsert.
    async fn save(&self) -> Result<()>;

    /// Remove an entity (and its dependents) from view; removed durably on `save`.
    async fn delete(&self, entity: &Entity) -> Result<()>;

    async fn count(&self, kind: Option<EntityKind>) -> Result<usize> {
        Ok(self.all(kind).await?.len())
    }

    /// Drop in-memory state and rebuild it from the durable backend.
    async fn reload(&self) -> Result<()>;

    /// Release backend resources. Safe to call more than once.
    async fn close(&self) -> Result<()>;
}

/// Mutations accumulated between two saves.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    pending: HashMap<EntityKey, Entity>,
    deleted: HashSet<EntityKey>,
}

/// What the unit of work says about one key
#[derive(Debug)]
pub enum Overlay<'a> {
    Pending(&'a Entity),
    Deleted,
    Untouched,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.deleted.is_empty()
    }

    pub fn stage(&mut self, entity: Entity) {
        let key = entity.key();
        self.deleted.remove(&key);
        self.pending.insert(key, entity);
    }

    pub fn remove(&mut self, key: EntityKey) {
        self.pending.remove(&key);
        self.deleted.insert(key);
    }

    pub fn lookup(&self, key: &EntityKey) -> Overlay<'_> {
        if self.deleted.contains(key) {
            Overlay::Deleted
        } else if let Some(entity) = self.pending.get(key) {
            Overlay::Pending(entity)
        } else {
            Overlay::Untouched
        }
    }

    /// Apply pending changes on top of a durable snapshot.
    pub fn overlay(&self, objects: &mut Objects, kind: Option<EntityKind>) {
        for key in &self.deleted {
            objects.remove(key);
        }
        for (key, entity) in &self.pending {
            if kind.map_or(true, |k| k == key.kind) {
                objects.insert(key.clone(), entity.clone());
            }
        }
    }

    /// Take the accumulated changes, leaving the unit of work empty.
    ///
    /// Upserts come back stamped and ordered parents first; deletions come
    /// back ordered children first.
    pub fn drain(&mut self) -> (Vec<Entity>, Vec<EntityKey>) {
        let mut upserts: Vec<Entity> = self.pending.drain().map(|(_, e)| e).collect();
        for entity in &mut upserts {
            entity.base_mut().touch();
        }
        upserts.sort_by_key(|e| (e.kind().depth(), e.key()));

        let mut deletions: Vec<EntityKey> = self.deleted.drain().collect();
        deletions.sort_by(|a, b| b.kind.depth().cmp(&a.kind.depth()).then_with(|| a.cmp(b)));

        (upserts, deletions)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.deleted.clear();
    }
}
