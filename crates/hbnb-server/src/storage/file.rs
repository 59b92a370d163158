//! JSON file storage (whole-file snapshot, rewritten on every save)

use async_trait::async_trait;
use hbnb_core::cascade::plan_delete;
use hbnb_core::ports::{Objects, Overlay, UnitOfWork};
use hbnb_core::{Entity, EntityKey, EntityKind, HbnbError, ModelError, Result, Storage};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Stores every entity in one JSON object keyed by `<ClassName>.<id>`.
///
/// Single writer: two processes saving to the same file race.
pub struct FileStorage {
    path: PathBuf,
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<EntityKey, Entity>,
    uow: UnitOfWork,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            inner: RwLock::new(Inner::default()),
        }
    }

    async fn read_snapshot(&self) -> Result<HashMap<EntityKey, Entity>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No storage file at {}, starting empty", self.path.display());
                return Ok(HashMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        let records: Map<String, Value> = serde_json::from_str(&content)?;
        let mut objects = HashMap::with_capacity(records.len());

        for (raw_key, record) in records {
            let key: EntityKey = match raw_key.parse() {
                Ok(key) => key,
                Err(ModelError::UnknownClass(class)) => {
                    warn!("Skipping record {} of unknown class {}", raw_key, class);
                    continue;
                }
                Err(e) => {
                    warn!("Skipping record with unusable key: {}", e);
                    continue;
                }
            };

            let entity = Entity::from_dict(key.kind, record)
                .map_err(|e| HbnbError::persistence(format!("{}: {}", raw_key, e)))?;
            if entity.id() != key.id {
                warn!("Record {} carries id {}, keeping the record's", raw_key, entity.id());
            }
            objects.insert(entity.key(), entity);
        }

        Ok(objects)
    }

    /// Write and fsync a sibling temp file, then rename it over the store.
    async fn write_snapshot(&self, objects: &HashMap<EntityKey, Entity>) -> Result<()> {
        let mut records = BTreeMap::new();
        for (key, entity) in objects {
            records.insert(key.to_string(), entity.to_dict()?);
        }
        let content = serde_json::to_string_pretty(&records)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "storage.json".to_string());
        let tmp = self.path.with_file_name(format!(".{}.tmp", file_name));

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                warn!("Failed to remove {}: {}", tmp.display(), cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn all(&self, kind: Option<EntityKind>) -> Result<Objects> {
        let inner = self.inner.read().await;
        let mut objects: Objects = inner
            .objects
            .iter()
            .filter(|(key, _)| kind.map_or(true, |k| k == key.kind))
            .map(|(key, entity)| (key.clone(), entity.clone()))
            .collect();
        inner.uow.overlay(&mut objects, kind);
        Ok(objects)
    }

    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        let key = EntityKey::new(kind, id);
        let inner = self.inner.read().await;
        Ok(match inner.uow.lookup(&key) {
            Overlay::Pending(entity) => Some(entity.clone()),
            Overlay::Deleted => None,
            Overlay::Untouched => inner.objects.get(&key).cloned(),
        })
    }

    async fn new(&self, entity: Entity) -> Result<()> {
        self.inner.write().await.uow.stage(entity);
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        let (upserts, deletions) = inner.uow.drain();

        let mut snapshot = inner.objects.clone();
        for key in &deletions {
            snapshot.remove(key);
        }
        for entity in upserts {
            snapshot.insert(entity.key(), entity);
        }

        self.write_snapshot(&snapshot).await?;
        debug!(
            "Saved {} entities to {} ({} removed)",
            snapshot.len(),
            self.path.display(),
            deletions.len()
        );
        inner.objects = snapshot;
        Ok(())
    }

    async fn delete(&self, entity: &Entity) -> Result<()> {
        let plan = plan_delete(self, entity).await?;
        let mut inner = self.inner.write().await;
        for key in plan.removed {
            inner.uow.remove(key);
        }
        for place in plan.detached {
            inner.uow.stage(Entity::Place(place));
        }
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let objects = self.read_snapshot().await?;
        info!("Loaded {} entities from {}", objects.len(), self.path.display());

        let mut inner = self.inner.write().await;
        inner.objects = objects;
        inner.uow.clear();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.inner.write().await.uow.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hbnb_core::{City, Place, State};

    #[tokio::test]
    async fn test_save_writes_class_keyed_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");
        let storage = FileStorage::new(&path);
        storage.reload().await.unwrap();

        let state = Entity::from(State::new("Oregon"));
        storage.new(state.clone()).await.unwrap();
        storage.save().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let records: Map<String, Value> = serde_json::from_str(&content).unwrap();
        let record = &records[&format!("State.{}", state.id())];
        assert_eq!(record["__class__"], "State");
        assert_eq!(record["name"], "Oregon");
        assert!(record["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_reload_skips_unknown_classes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");
        let state = State::new("Idaho");
        let mut records = Map::new();
        records.insert(
            format!("State.{}", state.base.id),
            Value::Object(Entity::from(state.clone()).to_dict().unwrap()),
        );
        records.insert(
            "BaseModel.1234".to_string(),
            serde_json::json!({ "id": "1234", "__class__": "BaseModel" }),
        );
        std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

        let storage = FileStorage::new(&path);
        storage.reload().await.unwrap();

        assert_eq!(storage.count(None).await.unwrap(), 1);
        assert!(storage
            .get(EntityKind::State, &state.base.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_reload_rejects_malformed_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");
        std::fs::write(&path, r#"{"City.1": {"id": "1", "name": 7}}"#).unwrap();

        let storage = FileStorage::new(&path);
        let err = storage.reload().await.unwrap_err();
        assert!(err.is_persistence_failure());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("absent.json"));
        storage.reload().await.unwrap();
        assert_eq!(storage.count(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupant"), "x").unwrap();
        let storage = FileStorage::new(&path);

        storage.new(State::new("Vermont").into()).await.unwrap();
        let err = storage.save().await.unwrap_err();
        assert!(err.is_persistence_failure());

        assert_eq!(storage.count(None).await.unwrap(), 0);
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["store".to_string()]);
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("file.json"));
        storage.reload().await.unwrap();

        let state = State::new("Maine");
        let city = City::new(&state.base.id, "Portland");
        let place = Place::new(&city.base.id, "u", "Shack");
        storage.new(state.into()).await.unwrap();
        storage.new(city.into()).await.unwrap();
        storage.new(place.into()).await.unwrap();
        storage.save().await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["file.json".to_string()]);
    }
}
