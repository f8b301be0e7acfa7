use crate::store::{
    IndexDef, ProbeSpec, ReadSpec, RecordKey, RecordStore, Row, RowDirective, StoreError,
    StoreFault, TableDef, UpdateFn, VisitFn,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Mutex, MutexGuard},
};

///
/// MemStore
///
/// In-process store engine: sorted row storage per table, maintained
/// secondary indexes, and a try-only row-lock table. Data guards are held
/// only across short resolve/write sections; a row lock is held across the
/// caller's callback so concurrent writers observe `Busy` instead of
/// interleaving.
///

pub struct MemStore {
    tables: Mutex<BTreeMap<&'static str, TableState>>,
    locks: Mutex<BTreeSet<(&'static str, RecordKey)>>,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tables: Mutex::new(BTreeMap::new()),
            locks: Mutex::new(BTreeSet::new()),
        }
    }

    /// Register a table definition. Re-registering an existing table is a
    /// no-op; rows survive.
    pub fn register(&self, def: &'static TableDef) -> Result<(), StoreFault> {
        let mut tables = self.guard_tables()?;
        tables
            .entry(def.name)
            .or_insert_with(|| TableState::new(def));
        Ok(())
    }

    /// Seed or host-insert one row. Every index field must be present and
    /// unique indexes must stay unique.
    pub fn insert(&self, table: &str, row: Row) -> Result<(), StoreFault> {
        let mut tables = self.guard_tables()?;
        let state = resolve_mut(&mut tables, table)?;

        let pk = key_for(state.def.name, state.def.primary(), &row)?;
        if state.rows.contains_key(&pk) {
            return Err(StoreFault::DuplicateKey {
                table: state.def.name.to_string(),
                index: state.def.primary().name.to_string(),
                key: pk.to_string(),
            });
        }
        state.link(&pk, &row)?;
        state.rows.insert(pk, row);
        Ok(())
    }

    /// Read one row by primary key, unlocked. Host/assertion surface.
    pub fn get(&self, table: &str, key: &RecordKey) -> Result<Option<Row>, StoreFault> {
        let tables = self.guard_tables()?;
        let state = resolve(&tables, table)?;
        Ok(state.rows.get(key).cloned())
    }

    /// Number of rows currently stored in `table`.
    pub fn count(&self, table: &str) -> Result<usize, StoreFault> {
        let tables = self.guard_tables()?;
        let state = resolve(&tables, table)?;
        Ok(state.rows.len())
    }

    // ------------------------------------------------------------------
    // Guards and row locks
    // ------------------------------------------------------------------

    fn guard_tables(&self) -> Result<MutexGuard<'_, BTreeMap<&'static str, TableState>>, StoreFault> {
        self.tables.lock().map_err(|_| StoreFault::Poisoned)
    }

    fn try_lock_row(&self, table: &'static str, key: &RecordKey) -> Result<bool, StoreFault> {
        let mut locks = self.locks.lock().map_err(|_| StoreFault::Poisoned)?;
        Ok(locks.insert((table, key.clone())))
    }

    fn unlock_row(&self, table: &'static str, key: &RecordKey) -> Result<(), StoreFault> {
        let mut locks = self.locks.lock().map_err(|_| StoreFault::Poisoned)?;
        locks.remove(&(table, key.clone()));
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn grab_lock_for_tests(&self, table: &'static str, key: &RecordKey) -> bool {
        self.try_lock_row(table, key).expect("lock table")
    }

    #[cfg(test)]
    pub(crate) fn release_lock_for_tests(&self, table: &'static str, key: &RecordKey) {
        self.unlock_row(table, key).expect("lock table");
    }
}

impl RecordStore for MemStore {
    fn probe(&self, spec: &ProbeSpec) -> Result<bool, StoreFault> {
        let tables = self.guard_tables()?;
        let state = resolve(&tables, spec.table)?;
        let index = state.index(spec.index)?;

        if spec.key.len() != index.fields.len() {
            return Err(arity_fault(spec.table, index, spec.key.len()));
        }

        Ok(state
            .indexes
            .get(spec.index)
            .and_then(|map| map.get(&spec.key))
            .is_some_and(|pks| !pks.is_empty()))
    }

    fn update_locked(&self, spec: &ReadSpec, apply: UpdateFn<'_>) -> Result<bool, StoreError> {
        // Resolve the single target and take its lock under the data guard.
        let (pk, snapshot) = {
            let tables = self.guard_tables()?;
            let state = resolve(&tables, spec.table)?;
            let index = state.index(spec.index)?;

            if !index.unique {
                return Err(StoreFault::IndexNotUnique {
                    table: spec.table.to_string(),
                    index: spec.index.to_string(),
                }
                .into());
            }
            if spec.key.len() != index.fields.len() {
                return Err(arity_fault(spec.table, index, spec.key.len()).into());
            }

            let pk = state
                .indexes
                .get(spec.index)
                .and_then(|map| map.get(&spec.key))
                .and_then(|pks| pks.iter().next())
                .cloned();
            let Some(pk) = pk else {
                return Ok(false);
            };

            let row = state.rows.get(&pk).cloned().ok_or_else(|| StoreFault::Corrupt {
                message: format!("index {} holds key {pk} without a row", spec.index),
            })?;

            if !self.try_lock_row(spec.table, &pk)? {
                return Err(StoreError::Busy {
                    table: spec.table,
                    key: pk,
                });
            }

            (pk, row)
        };

        // Lock held, data guard released: run the caller's update function.
        let applied = apply(&snapshot);

        let written = applied.and_then(|next| {
            let mut tables = self.guard_tables()?;
            let state = resolve_mut(&mut tables, spec.table)?;

            let next_pk = key_for(state.def.name, state.def.primary(), &next)?;
            if next_pk != pk {
                return Err(StoreFault::PrimaryKeyMutation {
                    table: spec.table.to_string(),
                    key: pk.to_string(),
                });
            }

            // Vet the new keys before the old links come apart, so a
            // rejected write leaves the table exactly as it was.
            let keys = state.index_keys(&next)?;
            state.check_unique(&pk, &keys)?;

            if let Some(old) = state.rows.get(&pk).cloned() {
                state.unlink(&pk, &old);
            }
            state.apply_link(&pk, keys);
            state.rows.insert(pk.clone(), next);
            Ok(())
        });

        self.unlock_row(spec.table, &pk)?;
        written?;
        Ok(true)
    }

    fn visit_locked(&self, spec: &ReadSpec, visit: VisitFn<'_>) -> Result<(), StoreError> {
        // Enumerate matching primary keys under the data guard, then walk
        // them lock-by-lock.
        let matches = {
            let tables = self.guard_tables()?;
            let state = resolve(&tables, spec.table)?;
            let index = state.index(spec.index)?;

            if spec.key.len() > index.fields.len() {
                return Err(arity_fault(spec.table, index, spec.key.len()).into());
            }

            let mut pks = Vec::new();
            if let Some(map) = state.indexes.get(spec.index) {
                for (index_key, set) in map.range(spec.key.clone()..) {
                    if !index_key.starts_with(&spec.key) {
                        break;
                    }
                    for pk in set {
                        let row = state.rows.get(pk).ok_or_else(|| StoreFault::Corrupt {
                            message: format!(
                                "index {} holds key {pk} without a row",
                                spec.index
                            ),
                        })?;
                        if spec.matches(row) {
                            pks.push(pk.clone());
                        }
                    }
                }
            }
            pks
        };

        for pk in matches {
            if !self.try_lock_row(spec.table, &pk)? {
                return Err(StoreError::Busy {
                    table: spec.table,
                    key: pk,
                });
            }

            let visited = self.visit_one(spec, &pk, &mut *visit);
            self.unlock_row(spec.table, &pk)?;
            visited?;
        }

        Ok(())
    }
}

impl MemStore {
    // One locked step of a visit: re-read, re-check, call back, apply the
    // directive. The row lock is already held; rows that vanished or fell
    // out of the predicate since enumeration are skipped.
    fn visit_one(
        &self,
        spec: &ReadSpec,
        pk: &RecordKey,
        visit: VisitFn<'_>,
    ) -> Result<(), StoreFault> {
        let snapshot = {
            let tables = self.guard_tables()?;
            let state = resolve(&tables, spec.table)?;
            match state.rows.get(pk) {
                Some(row) if spec.matches(row) => Some(match spec.projection {
                    Some(fields) => row.project(fields),
                    None => row.clone(),
                }),
                _ => None,
            }
        };

        let Some(snapshot) = snapshot else {
            return Ok(());
        };

        if visit(&snapshot) == RowDirective::Delete {
            let mut tables = self.guard_tables()?;
            let state = resolve_mut(&mut tables, spec.table)?;
            if let Some(row) = state.rows.remove(pk) {
                state.unlink(pk, &row);
            }
        }

        Ok(())
    }
}

///
/// TableState
///
/// One registered table: definition, primary-keyed rows, and one sorted
/// key map per named index.
///

struct TableState {
    def: &'static TableDef,
    rows: BTreeMap<RecordKey, Row>,
    indexes: BTreeMap<&'static str, BTreeMap<RecordKey, BTreeSet<RecordKey>>>,
}

impl TableState {
    fn new(def: &'static TableDef) -> Self {
        let mut indexes = BTreeMap::new();
        for index in def.indexes {
            indexes.insert(index.name, BTreeMap::new());
        }
        Self {
            def,
            rows: BTreeMap::new(),
            indexes,
        }
    }

    fn index(&self, name: &str) -> Result<&'static IndexDef, StoreFault> {
        self.def.index(name).ok_or_else(|| StoreFault::UnknownIndex {
            table: self.def.name.to_string(),
            index: name.to_string(),
        })
    }

    /// Add `row` under `pk` in every index, enforcing uniqueness.
    fn link(&mut self, pk: &RecordKey, row: &Row) -> Result<(), StoreFault> {
        let keys = self.index_keys(row)?;
        self.check_unique(pk, &keys)?;
        self.apply_link(pk, keys);
        Ok(())
    }

    /// Compute every index key up front so a failure never half-links.
    fn index_keys(
        &self,
        row: &Row,
    ) -> Result<Vec<(&'static IndexDef, RecordKey)>, StoreFault> {
        let mut keys = Vec::with_capacity(self.def.indexes.len());
        for index in self.def.indexes {
            keys.push((index, key_for(self.def.name, index, row)?));
        }
        Ok(keys)
    }

    fn check_unique(
        &self,
        pk: &RecordKey,
        keys: &[(&'static IndexDef, RecordKey)],
    ) -> Result<(), StoreFault> {
        for (index, key) in keys {
            let taken = self
                .indexes
                .get(index.name)
                .and_then(|map| map.get(key))
                .is_some_and(|pks| !pks.is_empty() && !pks.contains(pk));
            if index.unique && taken {
                return Err(StoreFault::DuplicateKey {
                    table: self.def.name.to_string(),
                    index: index.name.to_string(),
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    fn apply_link(&mut self, pk: &RecordKey, keys: Vec<(&'static IndexDef, RecordKey)>) {
        for (index, key) in keys {
            self.indexes
                .entry(index.name)
                .or_default()
                .entry(key)
                .or_default()
                .insert(pk.clone());
        }
    }

    /// Remove `row`'s entries for `pk` from every index.
    fn unlink(&mut self, pk: &RecordKey, row: &Row) {
        for index in self.def.indexes {
            let Ok(key) = key_for(self.def.name, index, row) else {
                continue;
            };
            if let Some(map) = self.indexes.get_mut(index.name)
                && let Some(pks) = map.get_mut(&key)
            {
                pks.remove(pk);
                if pks.is_empty() {
                    map.remove(&key);
                }
            }
        }
    }
}

fn resolve<'a>(
    tables: &'a BTreeMap<&'static str, TableState>,
    table: &str,
) -> Result<&'a TableState, StoreFault> {
    tables.get(table).ok_or_else(|| StoreFault::unknown_table(table))
}

fn resolve_mut<'a>(
    tables: &'a mut BTreeMap<&'static str, TableState>,
    table: &str,
) -> Result<&'a mut TableState, StoreFault> {
    tables
        .get_mut(table)
        .ok_or_else(|| StoreFault::unknown_table(table))
}

fn key_for(table: &str, index: &IndexDef, row: &Row) -> Result<RecordKey, StoreFault> {
    let mut key = RecordKey::new();
    for field in index.fields {
        let value = row.get(field).cloned().ok_or_else(|| StoreFault::MissingIndexField {
            table: table.to_string(),
            index: index.name.to_string(),
            field: (*field).to_string(),
        })?;
        key = key.field(value);
    }
    Ok(key)
}

fn arity_fault(table: &str, index: &IndexDef, got: usize) -> StoreFault {
    StoreFault::KeyArity {
        table: table.to_string(),
        index: index.name.to_string(),
        expected: index.fields.len(),
        got,
    }
}
