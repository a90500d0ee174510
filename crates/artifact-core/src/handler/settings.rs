//! Artifacts aggregated into one section of `.claude/settings.json`.
//!
//! Every call reads the whole document, edits one section and writes the
//! whole document back. Keys outside the section, and entries inside it that
//! are not artifacts of this type, pass through untouched.

use super::{ArtifactHandler, Call, CreateOptions, DeleteOptions, ReadOptions, UpdateOptions};
use crate::artifact::{Artifact, ArtifactRecord, IDENTITY_FIELDS};
use crate::error::{CrudError, OperationError, Result};
use crate::io;
use crate::merge;
use crate::paths;
use crate::result::{OperationResult, ResultBuilder};
use crate::types::{ArtifactKind, OperationKind};
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// How a settings section holds its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionShape {
    /// `[ {"name": …, …}, … ]`, identified by each element's `name`.
    List,
    /// `{ "<name>": {…}, … }`, identified by key.
    Map,
}

/// An artifact stored as one entry of a settings section.
pub trait SettingsEntry: ArtifactRecord {
    const SECTION: &'static str;
    const SHAPE: SectionShape;

    /// The JSON written into the section. Derived fields are left out.
    fn encode(&self) -> Result<Value>;

    fn decode(id: &str, raw: &Value) -> Result<Self>;

    /// Mark the entry inactive without removing it.
    fn disable(&mut self);
}

// ---------------------------------------------------------------------------
// SettingsDoc
// ---------------------------------------------------------------------------

/// An in-memory copy of `settings.json`.
struct SettingsDoc {
    path: PathBuf,
    root: Map<String, Value>,
}

impl SettingsDoc {
    fn load(project_root: &Path) -> Result<Self> {
        let path = paths::settings_path(project_root);
        let root = match io::read_optional(&path)? {
            None => Map::new(),
            Some(text) if text.trim().is_empty() => Map::new(),
            Some(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(CrudError::Settings(format!(
                        "{} is not a JSON object",
                        path.display()
                    )))
                }
                Err(e) => {
                    return Err(CrudError::Settings(format!("{}: {e}", path.display())));
                }
            },
        };
        Ok(Self { path, root })
    }

    fn save(&self) -> Result<()> {
        let mut text = serde_json::to_string_pretty(&self.root)?;
        text.push('\n');
        io::atomic_write(&self.path, text.as_bytes())
    }

    fn entry_name(value: &Value) -> Option<&str> {
        value.get("name").and_then(Value::as_str)
    }

    /// `(id, raw)` for every entry in the section, in stored order.
    fn entries(&self, section: &str, shape: SectionShape) -> Result<Vec<(String, &Value)>> {
        let Some(value) = self.root.get(section) else {
            return Ok(Vec::new());
        };
        match (shape, value) {
            (SectionShape::List, Value::Array(items)) => Ok(items
                .iter()
                .filter_map(|v| Self::entry_name(v).map(|n| (n.to_string(), v)))
                .collect()),
            (SectionShape::Map, Value::Object(map)) => {
                Ok(map.iter().map(|(k, v)| (k.clone(), v)).collect())
            }
            (SectionShape::List, _) => Err(CrudError::Settings(format!(
                "'{section}' is not an array"
            ))),
            (SectionShape::Map, _) => Err(CrudError::Settings(format!(
                "'{section}' is not an object"
            ))),
        }
    }

    fn get(&self, section: &str, shape: SectionShape, id: &str) -> Result<Option<&Value>> {
        Ok(self
            .entries(section, shape)?
            .into_iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, v)| v))
    }

    /// Insert or replace the entry `id`. List entries keep their position.
    fn put(&mut self, section: &str, shape: SectionShape, id: &str, value: Value) -> Result<()> {
        let slot = self.root.entry(section.to_string()).or_insert_with(|| match shape {
            SectionShape::List => Value::Array(Vec::new()),
            SectionShape::Map => Value::Object(Map::new()),
        });
        match (shape, slot) {
            (SectionShape::List, Value::Array(items)) => {
                match items
                    .iter_mut()
                    .find(|v| Self::entry_name(v) == Some(id))
                {
                    Some(existing) => *existing = value,
                    None => items.push(value),
                }
                Ok(())
            }
            (SectionShape::Map, Value::Object(map)) => {
                map.insert(id.to_string(), value);
                Ok(())
            }
            _ => Err(CrudError::Settings(format!(
                "'{section}' has an unexpected shape"
            ))),
        }
    }

    fn remove(&mut self, section: &str, shape: SectionShape, id: &str) {
        match (shape, self.root.get_mut(section)) {
            (SectionShape::List, Some(Value::Array(items))) => {
                items.retain(|v| Self::entry_name(v) != Some(id));
            }
            (SectionShape::Map, Some(Value::Object(map))) => {
                map.remove(id);
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// SettingsHandler
// ---------------------------------------------------------------------------

pub struct SettingsHandler<A> {
    _marker: PhantomData<fn() -> A>,
}

impl<A> Default for SettingsHandler<A> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<A: SettingsEntry> fmt::Debug for SettingsHandler<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SettingsHandler<{}.{}>", paths::SETTINGS_FILE, A::SECTION)
    }
}

impl<A: SettingsEntry> SettingsHandler<A> {
    fn find(doc: &SettingsDoc, id: &str) -> Result<Option<A>> {
        doc.get(A::SECTION, A::SHAPE, id)?
            .map(|raw| A::decode(id, raw))
            .transpose()
    }

    fn not_found(doc: &SettingsDoc, id: &str) -> OperationError {
        let mut available: Vec<String> = doc
            .entries(A::SECTION, A::SHAPE)
            .map(|e| e.into_iter().map(|(id, _)| id).collect())
            .unwrap_or_default();
        available.sort();
        OperationError::not_found(format!("{} '{id}'", A::KIND))
            .with_context("path", doc.path.display().to_string())
            .with_context("section", A::SECTION)
            .with_context("available", available)
    }

    /// Load the document and the existing entry, or the failure to report.
    fn load_existing(root: &Path, id: &str, op: OperationKind) -> std::result::Result<(SettingsDoc, A), OperationError> {
        let doc = SettingsDoc::load(root).map_err(|e| e.into_operation_error(op))?;
        match Self::find(&doc, id) {
            Ok(Some(a)) => Ok((doc, a)),
            Ok(None) => Err(Self::not_found(&doc, id)),
            Err(e) => Err(e.into_operation_error(op)),
        }
    }

    fn write_entry(doc: &mut SettingsDoc, record: &A) -> Result<()> {
        let value = record.encode()?;
        doc.put(A::SECTION, A::SHAPE, record.id(), value)?;
        doc.save()
    }
}

impl<A: SettingsEntry> ArtifactHandler for SettingsHandler<A> {
    fn kind(&self) -> ArtifactKind {
        A::KIND
    }

    fn path(&self, root: &Path, _id: &str) -> Result<PathBuf> {
        Ok(paths::settings_path(root))
    }

    fn exists(&self, root: &Path, id: &str) -> bool {
        SettingsDoc::load(root)
            .and_then(|doc| Self::find(&doc, id))
            .map(|found| found.is_some())
            .unwrap_or(false)
    }

    fn create(
        &self,
        call: Call<'_>,
        artifact: Artifact,
        opts: CreateOptions,
    ) -> OperationResult<Artifact> {
        let b = ResultBuilder::new(call.started, OperationKind::Create, A::KIND)
            .path(&paths::settings_path(call.root))
            .dry_run(opts.dry_run);
        let mut record: A = match artifact.into_record() {
            Ok(r) => r,
            Err(e) => return b.fail_with(e),
        };
        record.derive_id();
        let b = b.id(record.id());
        if let Err(e) = record.validate() {
            return b.fail_with(e);
        }
        let mut doc = match SettingsDoc::load(call.root) {
            Ok(d) => d,
            Err(e) => return b.fail_with(e),
        };
        match doc.get(A::SECTION, A::SHAPE, record.id()) {
            Ok(Some(_)) if !opts.overwrite => {
                return b.fail(
                    OperationError::already_exists(format!("{} '{}'", A::KIND, record.id()))
                        .with_context("section", A::SECTION),
                );
            }
            Ok(_) => {}
            Err(e) => return b.fail_with(e),
        }
        if !opts.dry_run {
            if let Err(e) = Self::write_entry(&mut doc, &record) {
                return b.fail_with(e);
            }
        }
        let artifact = record.into_artifact();
        b.after(Some(artifact.clone())).succeed(Some(artifact))
    }

    fn read(&self, call: Call<'_>, id: &str, opts: ReadOptions) -> OperationResult<Artifact> {
        let b = ResultBuilder::new(call.started, OperationKind::Read, A::KIND)
            .id(id)
            .path(&paths::settings_path(call.root));
        let record = match Self::load_existing(call.root, id, OperationKind::Read) {
            Ok((_, a)) => a,
            Err(err) => return b.fail(err),
        };
        let snapshot = record.into_artifact();
        let mut data = snapshot.clone();
        if !opts.include_content {
            data.strip_content();
        }
        b.before(Some(snapshot.clone()))
            .after(Some(snapshot))
            .succeed(Some(data))
    }

    fn update(
        &self,
        call: Call<'_>,
        id: &str,
        changes: &Map<String, Value>,
        opts: UpdateOptions,
    ) -> OperationResult<Artifact> {
        let b = ResultBuilder::new(call.started, OperationKind::Update, A::KIND)
            .id(id)
            .path(&paths::settings_path(call.root))
            .dry_run(opts.dry_run);
        let (mut doc, record) = match Self::load_existing(call.root, id, OperationKind::Update) {
            Ok(found) => found,
            Err(err) => return b.fail(err),
        };
        let before = record.into_artifact();
        let b = b.before(Some(before.clone()));

        let fields = match before.to_fields() {
            Ok(f) => f,
            Err(e) => return b.fail_with(e),
        };
        let merged = merge::apply_changes(
            &fields,
            changes,
            opts.merge,
            IDENTITY_FIELDS,
            A::retained_on_replace(),
        );
        let updated: A = match Artifact::from_fields(A::KIND, merged).and_then(|a| a.into_record()) {
            Ok(u) => u,
            Err(e) => return b.fail_with(e),
        };
        if let Err(e) = updated.validate() {
            return b.fail_with(e);
        }
        if !opts.dry_run {
            if let Err(e) = Self::write_entry(&mut doc, &updated) {
                return b.fail_with(e);
            }
        }
        let after = updated.into_artifact();
        b.after(Some(after.clone())).succeed(Some(after))
    }

    fn delete(&self, call: Call<'_>, id: &str, opts: DeleteOptions) -> OperationResult<()> {
        let b = ResultBuilder::new(call.started, OperationKind::Delete, A::KIND)
            .id(id)
            .path(&paths::settings_path(call.root))
            .dry_run(opts.dry_run);
        let (mut doc, mut record) = match Self::load_existing(call.root, id, OperationKind::Delete) {
            Ok(found) => found,
            Err(err) => return b.fail(err),
        };
        let b = b.before(Some(record.clone().into_artifact()));
        if opts.dry_run {
            return b.succeed(None);
        }

        let outcome = if opts.soft {
            record.disable();
            Self::write_entry(&mut doc, &record)
        } else {
            doc.remove(A::SECTION, A::SHAPE, id);
            doc.save()
        };
        match outcome {
            Ok(()) => b.succeed(None),
            Err(e) => b.fail_with(e),
        }
    }

    fn list(&self, call: Call<'_>) -> OperationResult<Vec<Artifact>> {
        let b = ResultBuilder::new(call.started, OperationKind::Query, A::KIND)
            .path(&paths::settings_path(call.root));
        let doc = match SettingsDoc::load(call.root) {
            Ok(d) => d,
            Err(e) => return b.fail_with(e),
        };
        let entries = match doc.entries(A::SECTION, A::SHAPE) {
            Ok(e) => e,
            Err(e) => return b.fail_with(e),
        };
        let mut items = Vec::with_capacity(entries.len());
        for (id, raw) in entries {
            match A::decode(&id, raw) {
                Ok(a) => items.push(a.into_artifact()),
                Err(e) => return b.id(id).fail_with(e),
            }
        }
        b.succeed(Some(items))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
