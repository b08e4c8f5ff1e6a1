//! Breathing program catalog.
//!
//! Built-ins are rebuilt from [`builtin_programs`] at every load; only the
//! custom subset, the ids of deleted built-ins and the active reference are
//! persisted. At least one built-in is always present.

use std::rc::Rc;

use uuid::Uuid;

use super::{builtin_programs, Program};
use crate::error::ValidationError;
use crate::storage::{
    load_json, remove_key, save_json, KvStore, ACTIVE_PROGRAM_KEY, CUSTOM_PROGRAMS_KEY,
    HIDDEN_BUILTINS_KEY,
};

pub struct ProgramStore {
    store: Rc<dyn KvStore>,
    programs: Vec<Program>,
    active: Option<Program>,
    hidden_builtins: Vec<Uuid>,
}

impl ProgramStore {
    /// Populate the catalog from the built-in set plus persisted custom
    /// programs, and restore the active reference if it still resolves.
    pub fn load(store: Rc<dyn KvStore>) -> Self {
        let builtins = builtin_programs();

        let mut hidden_builtins: Vec<Uuid> =
            load_json(store.as_ref(), HIDDEN_BUILTINS_KEY).unwrap_or_default();
        let mut programs: Vec<Program> = builtins
            .iter()
            .filter(|p| !hidden_builtins.contains(&p.id))
            .cloned()
            .collect();
        if programs.is_empty() {
            tracing::warn!("hidden built-in list covers every built-in, ignoring it");
            hidden_builtins.clear();
            programs = builtins;
        }

        let custom: Vec<Program> = load_json(store.as_ref(), CUSTOM_PROGRAMS_KEY).unwrap_or_default();
        for program in custom {
            if program.is_built_in {
                tracing::warn!(id = %program.id, "skipping persisted custom program flagged built-in");
                continue;
            }
            if let Err(e) = program.validate() {
                tracing::warn!(id = %program.id, error = %e, "skipping invalid persisted program");
                continue;
            }
            if programs.iter().any(|p| p.id == program.id) {
                tracing::warn!(id = %program.id, "skipping duplicate persisted program");
                continue;
            }
            programs.push(program);
        }

        let active = load_json::<Option<Program>>(store.as_ref(), ACTIVE_PROGRAM_KEY)
            .flatten()
            .and_then(|saved| programs.iter().find(|p| p.id == saved.id).cloned());

        tracing::debug!(
            programs = programs.len(),
            active = active.as_ref().map(|p| p.name.as_str()).unwrap_or("-"),
            "program catalog loaded"
        );

        Self {
            store,
            programs,
            active,
            hidden_builtins,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn built_ins(&self) -> impl Iterator<Item = &Program> {
        self.programs.iter().filter(|p| p.is_built_in)
    }

    pub fn custom(&self) -> impl Iterator<Item = &Program> {
        self.programs.iter().filter(|p| !p.is_built_in)
    }

    pub fn get(&self, id: Uuid) -> Option<&Program> {
        self.programs.iter().find(|p| p.id == id)
    }

    pub fn active(&self) -> Option<&Program> {
        self.active.as_ref()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Append a user-authored program and persist the custom subset.
    pub fn add(&mut self, program: Program) -> Result<(), ValidationError> {
        program.validate()?;
        if program.is_built_in {
            return Err(ValidationError::BuiltInFlag);
        }
        if self.get(program.id).is_some() {
            return Err(ValidationError::DuplicateId(program.id));
        }
        self.programs.push(program);
        self.persist_custom();
        Ok(())
    }

    /// Replace a custom program with the same id. Built-ins cannot be
    /// edited. A running session keeps the copy it was armed with.
    pub fn update(&mut self, program: Program) -> bool {
        if program.is_built_in || program.validate().is_err() {
            return false;
        }
        let Some(slot) = self
            .programs
            .iter_mut()
            .find(|p| p.id == program.id && !p.is_built_in)
        else {
            return false;
        };
        *slot = program.clone();
        self.persist_custom();

        if self.active.as_ref().is_some_and(|a| a.id == program.id) {
            self.active = Some(program);
            self.persist_active();
        }
        true
    }

    /// Remove a program. Refuses (returns false, no mutation) to delete the
    /// sole remaining built-in, or a program that is not in the catalog.
    pub fn delete(&mut self, program: &Program) -> bool {
        let Some(index) = self.programs.iter().position(|p| p.id == program.id) else {
            return false;
        };
        let is_built_in = self.programs[index].is_built_in;
        if is_built_in && self.built_ins().count() <= 1 {
            tracing::debug!(id = %program.id, "refusing to delete the last built-in program");
            return false;
        }

        let removed = self.programs.remove(index);
        if is_built_in {
            self.hidden_builtins.push(removed.id);
            save_json(self.store.as_ref(), HIDDEN_BUILTINS_KEY, &self.hidden_builtins);
        } else {
            self.persist_custom();
        }

        if self.active.as_ref().is_some_and(|a| a.id == removed.id) {
            self.active = None;
            self.persist_active();
        }
        true
    }

    /// Remember `program` as the active one. Programs outside the catalog
    /// are ignored.
    pub fn set_active(&mut self, program: &Program) -> bool {
        let Some(found) = self.get(program.id).cloned() else {
            tracing::warn!(id = %program.id, "cannot activate a program outside the catalog");
            return false;
        };
        self.active = Some(found);
        self.persist_active();
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist_custom(&self) {
        let custom: Vec<&Program> = self.custom().collect();
        save_json(self.store.as_ref(), CUSTOM_PROGRAMS_KEY, &custom);
    }

    fn persist_active(&self) {
        match &self.active {
            Some(program) => save_json(self.store.as_ref(), ACTIVE_PROGRAM_KEY, program),
            None => remove_key(self.store.as_ref(), ACTIVE_PROGRAM_KEY),
        }
    }
}
