//! SQLite database storage (embedded, no external dependencies)

use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hbnb_core::cascade::plan_delete;
use hbnb_core::ports::{Objects, Overlay, UnitOfWork};
use hbnb_core::{
    Amenity, BaseModel, City, Entity, EntityKey, EntityKind, HbnbError, Place, Result, Review,
    State, Storage, User,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One table per entity kind plus the `place_amenity` join table.
pub struct DbStorage {
    pool: SqlitePool,
    uow: Mutex<UnitOfWork>,
}

impl DbStorage {
    pub async fn connect(database_path: &str) -> AnyResult<Self> {
        info!("Opening SQLite database at: {}", database_path);

        // Create parent directory if needed
        if let Some(parent) = std::path::Path::new(database_path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| {
                format!("Failed to connect to SQLite database at: {}", database_path)
            })?;

        info!("SQLite connection established");

        Ok(Self {
            pool,
            uow: Mutex::new(UnitOfWork::new()),
        })
    }

    async fn run_migrations(&self) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS states (
                id TEXT PRIMARY KEY,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                name TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cities (
                id TEXT PRIMARY KEY,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                state_id TEXT NOT NULL REFERENCES states(id) ON DELETE CASCADE,
                name TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS amenities (
                id TEXT PRIMARY KEY,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                name TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                email TEXT NOT NULL,
                password TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS places (
                id TEXT PRIMARY KEY,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                city_id TEXT NOT NULL REFERENCES cities(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                number_rooms INTEGER NOT NULL DEFAULT 0,
                number_bathrooms INTEGER NOT NULL DEFAULT 0,
                max_guest INTEGER NOT NULL DEFAULT 0,
                price_by_night INTEGER NOT NULL DEFAULT 0,
                latitude REAL NOT NULL DEFAULT 0,
                longitude REAL NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id TEXT PRIMARY KEY,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                place_id TEXT NOT NULL REFERENCES places(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS place_amenity (
                place_id TEXT NOT NULL REFERENCES places(id) ON DELETE CASCADE,
                amenity_id TEXT NOT NULL REFERENCES amenities(id) ON DELETE CASCADE,
                PRIMARY KEY (place_id, amenity_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_rows<R>(&self, kind: EntityKind, id: Option<&str>) -> Result<Vec<R>>
    where
        R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let mut sql = format!("SELECT * FROM {}", kind.collection());
        if id.is_some() {
            sql.push_str(" WHERE id = ?1");
        }
        sql.push_str(" ORDER BY id");

        let mut query = sqlx::query_as::<_, R>(&sql);
        if let Some(id) = id {
            query = query.bind(id.to_string());
        }
        query.fetch_all(&self.pool).await.map_err(persistence)
    }

    /// Amenity links grouped by place.
    async fn fetch_links(
        &self,
        place_id: Option<&str>,
    ) -> Result<HashMap<String, BTreeSet<String>>> {
        let rows: Vec<(String, String)> = match place_id {
            Some(id) => {
                sqlx::query_as::<_, (String, String)>(
                    "SELECT place_id, amenity_id FROM place_amenity WHERE place_id = ?1",
                )
                .bind(id.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, (String, String)>(
                    "SELECT place_id, amenity_id FROM place_amenity",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(persistence)?;

        let mut links: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (place_id, amenity_id) in rows {
            links.entry(place_id).or_default().insert(amenity_id);
        }
        Ok(links)
    }

    /// Fresh rows for one kind, materialized as entities.
    async fn fetch_entities(&self, kind: EntityKind, id: Option<&str>) -> Result<Vec<Entity>> {
        let entities = match kind {
            EntityKind::State => self
                .fetch_rows::<StateRow>(kind, id)
                .await?
                .into_iter()
                .map(|r| Entity::State(r.into()))
                .collect(),
            EntityKind::City => self
                .fetch_rows::<CityRow>(kind, id)
                .await?
                .into_iter()
                .map(|r| Entity::City(r.into()))
                .collect(),
            EntityKind::Amenity => self
                .fetch_rows::<AmenityRow>(kind, id)
                .await?
                .into_iter()
                .map(|r| Entity::Amenity(r.into()))
                .collect(),
            EntityKind::User => self
                .fetch_rows::<UserRow>(kind, id)
                .await?
                .into_iter()
                .map(|r| Entity::User(r.into()))
                .collect(),
            EntityKind::Review => self
                .fetch_rows::<ReviewRow>(kind, id)
                .await?
                .into_iter()
                .map(|r| Entity::Review(r.into()))
                .collect(),
            EntityKind::Place => {
                let rows = self.fetch_rows::<PlaceRow>(kind, id).await?;
                let mut links = self.fetch_links(id).await?;
                rows.into_iter()
                    .map(|r| {
                        let amenity_ids = links.remove(&r.id).unwrap_or_default();
                        Entity::Place(r.into_place(amenity_ids))
                    })
                    .collect()
            }
        };
        Ok(entities)
    }
}

#[async_trait]
impl Storage for DbStorage {
    fn backend(&self) -> &'static str {
        "db"
    }

    async fn all(&self, kind: Option<EntityKind>) -> Result<Objects> {
        let kinds = match kind {
            Some(kind) => vec![kind],
            None => EntityKind::ALL.to_vec(),
        };

        let mut objects = Objects::new();
        for kind in kinds {
            for entity in self.fetch_entities(kind, None).await? {
                objects.insert(entity.key(), entity);
            }
        }

        self.uow.lock().await.overlay(&mut objects, kind);
        Ok(objects)
    }

    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        let key = EntityKey::new(kind, id);
        match self.uow.lock().await.lookup(&key) {
            Overlay::Pending(entity) => return Ok(Some(entity.clone())),
            Overlay::Deleted => return Ok(None),
            Overlay::Untouched => {}
        }
        Ok(self.fetch_entities(kind, Some(id)).await?.into_iter().next())
    }

    async fn new(&self, entity: Entity) -> Result<()> {
        self.uow.lock().await.stage(entity);
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        let (upserts, deletions) = self.uow.lock().await.drain();
        if upserts.is_empty() && deletions.is_empty() {
            return Ok(());
        }

        // Dropping the transaction on any error rolls the whole unit back
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        for key in &deletions {
            let sql = format!("DELETE FROM {} WHERE id = ?1", key.kind.collection());
            sqlx::query(&sql)
                .bind(&key.id)
                .execute(&mut *tx)
                .await
                .map_err(persistence)?;
        }

        for entity in &upserts {
            upsert(&mut *tx, entity).await.map_err(persistence)?;
        }

        tx.commit().await.map_err(persistence)?;
        debug!(
            "Committed {} upserts and {} deletions",
            upserts.len(),
            deletions.len()
        );
        Ok(())
    }

    async fn delete(&self, entity: &Entity) -> Result<()> {
        let plan = plan_delete(self, entity).await?;
        let mut uow = self.uow.lock().await;
        for key in plan.removed {
            uow.remove(key);
        }
        for place in plan.detached {
            uow.stage(Entity::Place(place));
        }
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.run_migrations().await.map_err(persistence)?;
        self.uow.lock().await.clear();
        info!("Database schema ready");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.uow.lock().await.clear();
        self.pool.close().await;
        Ok(())
    }
}

fn persistence(e: sqlx::Error) -> HbnbError {
    HbnbError::persistence(e)
}

async fn upsert(
    conn: &mut SqliteConnection,
    entity: &Entity,
) -> std::result::Result<(), sqlx::Error> {
    match entity {
        Entity::State(s) => {
            sqlx::query(
                r#"
                INSERT INTO states (id, created_at, updated_at, name)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    name = excluded.name
                "#,
            )
            .bind(&s.base.id)
            .bind(s.base.created_at)
            .bind(s.base.updated_at)
            .bind(&s.name)
            .execute(&mut *conn)
            .await?;
        }
        Entity::City(c) => {
            sqlx::query(
                r#"
                INSERT INTO cities (id, created_at, updated_at, state_id, name)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    state_id = excluded.state_id,
                    name = excluded.name
                "#,
            )
            .bind(&c.base.id)
            .bind(c.base.created_at)
            .bind(c.base.updated_at)
            .bind(&c.state_id)
            .bind(&c.name)
            .execute(&mut *conn)
            .await?;
        }
        Entity::Amenity(a) => {
            sqlx::query(
                r#"
                INSERT INTO amenities (id, created_at, updated_at, name)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    name = excluded.name
                "#,
            )
            .bind(&a.base.id)
            .bind(a.base.created_at)
            .bind(a.base.updated_at)
            .bind(&a.name)
            .execute(&mut *conn)
            .await?;
        }
        Entity::User(u) => {
            sqlx::query(
                r#"
                INSERT INTO users
                    (id, created_at, updated_at, email, password, first_name, last_name)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    email = excluded.email,
                    password = excluded.password,
                    first_name = excluded.first_name,
                    last_name = excluded.last_name
                "#,
            )
            .bind(&u.base.id)
            .bind(u.base.created_at)
            .bind(u.base.updated_at)
            .bind(&u.email)
            .bind(&u.password)
            .bind(&u.first_name)
            .bind(&u.last_name)
            .execute(&mut *conn)
            .await?;
        }
        Entity::Review(r) => {
            sqlx::query(
                r#"
                INSERT INTO reviews (id, created_at, updated_at, place_id, user_id, text)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    place_id = excluded.place_id,
                    user_id = excluded.user_id,
                    text = excluded.text
                "#,
            )
            .bind(&r.base.id)
            .bind(r.base.created_at)
            .bind(r.base.updated_at)
            .bind(&r.place_id)
            .bind(&r.user_id)
            .bind(&r.text)
            .execute(&mut *conn)
            .await?;
        }
        Entity::Place(p) => {
            sqlx::query(
                r#"
                INSERT INTO places (id, created_at, updated_at, city_id, user_id, name,
                                    description, number_rooms, number_bathrooms, max_guest,
                                    price_by_night, latitude, longitude)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    city_id = excluded.city_id,
                    user_id = excluded.user_id,
                    name = excluded.name,
                    description = excluded.description,
                    number_rooms = excluded.number_rooms,
                    number_bathrooms = excluded.number_bathrooms,
                    max_guest = excluded.max_guest,
                    price_by_night = excluded.price_by_night,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude
                "#,
            )
            .bind(&p.base.id)
            .bind(p.base.created_at)
            .bind(p.base.updated_at)
            .bind(&p.city_id)
            .bind(&p.user_id)
            .bind(&p.name)
            .bind(&p.description)
            .bind(p.number_rooms)
            .bind(p.number_bathrooms)
            .bind(p.max_guest)
            .bind(p.price_by_night)
            .bind(p.latitude)
            .bind(p.longitude)
            .execute(&mut *conn)
            .await?;

            // Links are rewritten wholesale for every saved place
            sqlx::query("DELETE FROM place_amenity WHERE place_id = ?1")
                .bind(&p.base.id)
                .execute(&mut *conn)
                .await?;
            for amenity_id in &p.amenity_ids {
                sqlx::query("INSERT INTO place_amenity (place_id, amenity_id) VALUES (?1, ?2)")
                    .bind(&p.base.id)
                    .bind(amenity_id)
                    .execute(&mut *conn)
                    .await?;
            }
        }
    }
    Ok(())
}

// Helper structs for sqlx query_as
#[derive(sqlx::FromRow)]
struct StateRow {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    name: String,
}

impl From<StateRow> for State {
    fn from(r: StateRow) -> Self {
        State {
            base: base(r.id, r.created_at, r.updated_at),
            name: r.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CityRow {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    state_id: String,
    name: String,
}

impl From<CityRow> for City {
    fn from(r: CityRow) -> Self {
        City {
            base: base(r.id, r.created_at, r.updated_at),
            state_id: r.state_id,
            name: r.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AmenityRow {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    name: String,
}

impl From<AmenityRow> for Amenity {
    fn from(r: AmenityRow) -> Self {
        Amenity {
            base: base(r.id, r.created_at, r.updated_at),
            name: r.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    email: String,
    password: String,
    first_name: String,
    last_name: String,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            base: base(r.id, r.created_at, r.updated_at),
            email: r.email,
            password: r.password,
            first_name: r.first_name,
            last_name: r.last_name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    place_id: String,
    user_id: String,
    text: String,
}

impl From<ReviewRow> for Review {
    fn from(r: ReviewRow) -> Self {
        Review {
            base: base(r.id, r.created_at, r.updated_at),
            place_id: r.place_id,
            user_id: r.user_id,
            text: r.text,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PlaceRow {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    city_id: String,
    user_id: String,
    name: String,
    description: String,
    number_rooms: i64,
    number_bathrooms: i64,
    max_guest: i64,
    price_by_night: i64,
    latitude: f64,
    longitude: f64,
}

impl PlaceRow {
    fn into_place(self, amenity_ids: BTreeSet<String>) -> Place {
        Place {
            base: base(self.id, self.created_at, self.updated_at),
            city_id: self.city_id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            number_rooms: self.number_rooms,
            number_bathrooms: self.number_bathrooms,
            max_guest: self.max_guest,
            price_by_night: self.price_by_night,
            latitude: self.latitude,
            longitude: self.longitude,
            amenity_ids,
        }
    }
}

fn base(id: String, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> BaseModel {
    BaseModel {
        id,
        created_at,
        updated_at,
    }
}
