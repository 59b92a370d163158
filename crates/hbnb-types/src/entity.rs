//! The closed set of entity variants and their composite keys

use crate::{Amenity, BaseModel, City, ModelError, Place, Result, Review, State, User};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Entity classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    State,
    City,
    Amenity,
    Place,
    User,
    Review,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::State,
        EntityKind::City,
        EntityKind::Amenity,
        EntityKind::Place,
        EntityKind::User,
        EntityKind::Review,
    ];

    /// Class name used in composite keys and `__class__`
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::State => "State",
            EntityKind::City => "City",
            EntityKind::Amenity => "Amenity",
            EntityKind::Place => "Place",
            EntityKind::User => "User",
            EntityKind::Review => "Review",
        }
    }

    /// Plural name; doubles as the table name
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::State => "states",
            EntityKind::City => "cities",
            EntityKind::Amenity => "amenities",
            EntityKind::Place => "places",
            EntityKind::User => "users",
            EntityKind::Review => "reviews",
        }
    }

    /// Foreign-key depth: a kind only references kinds of lower depth.
    pub fn depth(self) -> u8 {
        match self {
            EntityKind::State | EntityKind::Amenity | EntityKind::User => 0,
            EntityKind::City => 1,
            EntityKind::Place => 2,
            EntityKind::Review => 3,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ModelError::UnknownClass(s.to_string()))
    }
}

/// Composite key `<ClassName>.<id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.id)
    }
}

impl FromStr for EntityKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let (class, id) = s
            .split_once('.')
            .filter(|(_, id)| !id.is_empty())
            .ok_or_else(|| ModelError::MalformedKey(s.to_string()))?;
        Ok(EntityKey::new(class.parse()?, id))
    }
}

/// Any persisted record
///
/// Serializes as the record's fields plus a `__class__` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__class__")]
pub enum Entity {
    State(State),
    City(City),
    Amenity(Amenity),
    Place(Place),
    User(User),
    Review(Review),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::State(_) => EntityKind::State,
            Entity::City(_) => EntityKind::City,
            Entity::Amenity(_) => EntityKind::Amenity,
            Entity::Place(_) => EntityKind::Place,
            Entity::User(_) => EntityKind::User,
            Entity::Review(_) => EntityKind::Review,
        }
    }

    pub fn base(&self) -> &BaseModel {
        match self {
            Entity::State(e) => &e.base,
            Entity::City(e) => &e.base,
            Entity::Amenity(e) => &e.base,
            Entity::Place(e) => &e.base,
            Entity::User(e) => &e.base,
            Entity::Review(e) => &e.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseModel {
        match self {
            Entity::State(e) => &mut e.base,
            Entity::City(e) => &mut e.base,
            Entity::Amenity(e) => &mut e.base,
            Entity::Place(e) => &mut e.base,
            Entity::User(e) => &mut e.base,
            Entity::Review(e) => &mut e.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.kind(), self.id())
    }

    /// Full field dictionary, as persisted.
    pub fn to_dict(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ModelError::NotAnObject(self.kind().to_string())),
            Err(source) => Err(ModelError::Invalid {
                kind: self.kind().to_string(),
                source,
            }),
        }
    }

    /// Field dictionary safe to hand to clients (no credentials).
    pub fn to_public_dict(&self) -> Result<Map<String, Value>> {
        let mut dict = self.to_dict()?;
        if self.kind() == EntityKind::User {
            dict.remove("password");
        }
        Ok(dict)
    }

    /// Rebuild an entity of `kind` from its field dictionary.
    ///
    /// The `__class__` entry, if any, is overwritten with `kind`.
    pub fn from_dict(kind: EntityKind, value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(ModelError::NotAnObject(kind.to_string()));
        };
        fields.insert("__class__".to_string(), Value::from(kind.name()));
        serde_json::from_value(Value::Object(fields)).map_err(|source| ModelError::Invalid {
            kind: kind.to_string(),
            source,
        })
    }

    /// Build a brand-new entity of `kind` from client-supplied fields.
    ///
    /// Identity and timestamps are always freshly generated.
    pub fn create(kind: EntityKind, mut fields: Map<String, Value>) -> Result<Self> {
        let base = BaseModel::new();
        fields.insert("id".to_string(), Value::from(base.id));
        for key in ["created_at", "updated_at"] {
            fields.insert(
                key.to_string(),
                Value::from(crate::timestamp::format(&base.created_at)),
            );
        }
        Self::from_dict(kind, Value::Object(fields))
    }
}

/// Typed access to one entity variant.
pub trait Model: Sized + Clone + Into<Entity> {
    const KIND: EntityKind;

    fn base(&self) -> &BaseModel;

    fn from_entity(entity: Entity) -> Option<Self>;

    fn id(&self) -> &str {
        &self.base().id
    }
}

macro_rules! impl_model {
    ($ty:ident) => {
        impl Model for $ty {
            const KIND: EntityKind = EntityKind::$ty;

            fn base(&self) -> &BaseModel {
                &self.base
            }

            fn from_entity(entity: Entity) -> Option<Self> {
                match entity {
                    Entity::$ty(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Entity {
            fn from(inner: $ty) -> Self {
                Entity::$ty(inner)
            }
        }
    };
}

impl_model!(State);
impl_model!(City);
impl_model!(Amenity);
impl_model!(Place);
impl_model!(User);
impl_model!(Review);
