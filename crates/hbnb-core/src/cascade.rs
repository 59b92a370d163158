//! Delete cascades
//!
//! Removing a parent removes everything that references it:
//! State → City → Place → Review, User → Place and Review.
//! Removing an Amenity only detaches it from the places that link it.

use crate::{Result, Storage};
use hbnb_types::{Entity, EntityKey, EntityKind, Place};
use std::collections::BTreeSet;

/// Everything a delete has to touch
#[derive(Debug, Default)]
pub struct DeletePlan {
    /// The deleted entity and every dependent, parents first
    pub removed: Vec<EntityKey>,
    /// Places that survive but lose an amenity link
    pub detached: Vec<Place>,
}

/// Work out the full effect of deleting `entity` against the current view.
pub async fn plan_delete<S: Storage + ?Sized>(storage: &S, entity: &Entity) -> Result<DeletePlan> {
    let root = entity.key();

    // Leaf kinds have no dependents
    if matches!(root.kind, EntityKind::Review) {
        return Ok(DeletePlan {
            removed: vec![root],
            detached: Vec::new(),
        });
    }

    let objects = storage.all(None).await?;
    let mut removed = BTreeSet::new();
    let mut order = Vec::new();
    let mut queue = vec![root.clone()];

    while let Some(key) = queue.pop() {
        if !removed.insert(key.clone()) {
            continue;
        }
        order.push(key.clone());

        for child in objects.values() {
            if references(child, &key) {
                queue.push(child.key());
            }
        }
    }

    let mut detached = Vec::new();
    if root.kind == EntityKind::Amenity {
        for child in objects.values() {
            if let Entity::Place(place) = child {
                if place.has_amenity(&root.id) && !removed.contains(&child.key()) {
                    let mut place = place.clone();
                    place.unlink_amenity(&root.id);
                    detached.push(place);
                }
            }
        }
    }

    order.sort_by_key(|k| k.kind.depth());
    tracing::debug!(
        "Delete of {} cascades to {} entities, detaches {} places",
        root,
        order.len() - 1,
        detached.len()
    );

    Ok(DeletePlan {
        removed: order,
        detached,
    })
}

/// Whether `child` holds a foreign key to `parent`.
fn references(child: &Entity, parent: &EntityKey) -> bool {
    let id = parent.id.as_str();
    match (child, parent.kind) {
        (Entity::City(c), EntityKind::State) => c.state_id == id,
        (Entity::Place(p), EntityKind::City) => p.city_id == id,
        (Entity::Place(p), EntityKind::User) => p.user_id == id,
        (Entity::Review(r), EntityKind::Place) => r.place_id == id,
        (Entity::Review(r), EntityKind::User) => r.user_id == id,
        _ => false,
    }
}
