use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::action::UNIVERSAL_TYPE;

/// A problem object with its single nominal type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedObject {
    pub name: String,
    pub type_tag: String,
}

impl TypedObject {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        TypedObject {
            name: name.into(),
            type_tag: type_tag.into(),
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, UNIVERSAL_TYPE)
    }
}

/// Objects in declaration order with a type index for candidate lookup.
///
/// Names are unique; declaring a name twice keeps its first position and
/// the last type tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TypedObject>", into = "Vec<TypedObject>")]
pub struct ObjectRegistry {
    objects: Vec<TypedObject>,
    by_name: FxHashMap<String, usize>,
    by_type: FxHashMap<String, Vec<usize>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: TypedObject) {
        match self.by_name.get(&object.name) {
            Some(&idx) => {
                self.objects[idx].type_tag = object.type_tag;
                self.reindex_types();
            }
            None => {
                let idx = self.objects.len();
                self.by_name.insert(object.name.clone(), idx);
                self.by_type
                    .entry(object.type_tag.clone())
                    .or_default()
                    .push(idx);
                self.objects.push(object);
            }
        }
    }

    fn reindex_types(&mut self) {
        self.by_type.clear();
        for (idx, object) in self.objects.iter().enumerate() {
            self.by_type
                .entry(object.type_tag.clone())
                .or_default()
                .push(idx);
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TypedObject> {
        self.by_name.get(name).map(|&idx| &self.objects[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypedObject> {
        self.objects.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|o| o.name.as_str())
    }

    /// Object names carrying exactly `type_tag`, in declaration order.
    pub fn of_type(&self, type_tag: &str) -> Vec<&str> {
        self.by_type
            .get(type_tag)
            .map(|idxs| {
                idxs.iter()
                    .map(|&idx| self.objects[idx].name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_type(&self, type_tag: &str) -> bool {
        self.by_type.contains_key(type_tag)
    }
}

impl From<Vec<TypedObject>> for ObjectRegistry {
    fn from(objects: Vec<TypedObject>) -> Self {
        objects.into_iter().collect()
    }
}

impl From<ObjectRegistry> for Vec<TypedObject> {
    fn from(registry: ObjectRegistry) -> Self {
        registry.objects
    }
}

impl FromIterator<TypedObject> for ObjectRegistry {
    fn from_iter<I: IntoIterator<Item = TypedObject>>(iter: I) -> Self {
        let mut registry = ObjectRegistry::new();
        for object in iter {
            registry.insert(object);
        }
        registry
    }
}
