use super::{FieldMeta, Model, ModelOpt, Record};
use crate::error::{OrmError, OrmResult};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cache of parsed models, keyed by record type.
///
/// Owned by a session core and shared through `Arc`. Lookups take a read lock; only a
/// miss takes the write lock, re-checks, and parses, so concurrent first lookups of the
/// same type parse it exactly once.
#[derive(Debug, Default)]
pub struct Registry {
    models: RwLock<HashMap<TypeId, Arc<Model>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached model for `T`, parsing and caching it on first use.
    pub fn get<T: Record>(&self) -> OrmResult<Arc<Model>> {
        let key = TypeId::of::<T>();
        if let Some(model) = self.read().get(&key) {
            return Ok(Arc::clone(model));
        }

        let mut models = self.write();
        if let Some(model) = models.get(&key) {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(parse_model::<T>(Vec::new())?);
        models.insert(key, Arc::clone(&model));
        Ok(model)
    }

    /// Parse `T` again, apply `opts`, and replace whatever was cached for it.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use structql::{with_column_name, with_table_name};
    ///
    /// registry.register::<User>([with_table_name("accounts"), with_column_name("id", "uid")])?;
    /// ```
    pub fn register<T: Record>(
        &self,
        opts: impl IntoIterator<Item = ModelOpt>,
    ) -> OrmResult<Arc<Model>> {
        let model = Arc::new(parse_model::<T>(opts)?);
        self.write().insert(TypeId::of::<T>(), Arc::clone(&model));
        Ok(model)
    }

    /// Number of cached models.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // The map is never left half-updated, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeId, Arc<Model>>> {
        self.models.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeId, Arc<Model>>> {
        self.models.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_model<T: Record>(opts: impl IntoIterator<Item = ModelOpt>) -> OrmResult<Model> {
    let descriptors = T::fields();

    let mut fields = Vec::with_capacity(descriptors.len());
    let mut field_index = HashMap::with_capacity(descriptors.len());
    for (i, desc) in descriptors.into_iter().enumerate() {
        let tags = parse_tag(desc.tag)?;
        let column = match tags.get("column") {
            Some(column) if !column.is_empty() => column.clone(),
            _ => underscore_name(desc.name),
        };
        field_index.insert(desc.name, i);
        fields.push(FieldMeta {
            name: desc.name,
            column,
            ty: desc.ty,
            offset: desc.offset,
            tags,
            get: desc.get,
            set: desc.set,
        });
    }

    let table_name = T::table_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| underscore_name(T::type_name()));

    let mut model = Model {
        type_id: TypeId::of::<T>(),
        type_name: T::type_name(),
        table_name,
        fields,
        field_index,
        column_index: HashMap::new(),
    };
    for opt in opts {
        model.apply(opt)?;
    }
    model.rebuild_column_index()?;

    tracing::debug!(
        target: "structql.registry",
        record = model.type_name,
        table = %model.table_name,
        fields = model.fields.len(),
        "parsed model"
    );
    Ok(model)
}

/// Parse a field tag of comma separated `key=value` pairs.
///
/// A bare key is kept with an empty value. An empty key or a segment with more than one
/// `=` is rejected with [`OrmError::UnknownTagFormat`].
pub fn parse_tag(tag: &str) -> OrmResult<HashMap<String, String>> {
    let mut tags = HashMap::new();
    for segment in tag.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (key, value) = match segment.split_once('=') {
            Some((_, rest)) if rest.contains('=') => {
                return Err(OrmError::UnknownTagFormat(tag.to_string()));
            }
            Some((key, value)) => (key.trim(), value.trim()),
            None => (segment, ""),
        };
        if key.is_empty() {
            return Err(OrmError::UnknownTagFormat(tag.to_string()));
        }
        tags.insert(key.to_string(), value.to_string());
    }
    Ok(tags)
}

/// Convert a camel case identifier to snake case.
///
/// Every uppercase character becomes lowercase and, unless it is the first character,
/// gets a `_` in front: `TestModel` → `test_model`, `ID` → `i_d`.
pub fn underscore_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
