//! One-file-per-artifact storage for markdown artifacts.

use super::{ArtifactHandler, Call, CreateOptions, DeleteOptions, ReadOptions, UpdateOptions};
use crate::artifact::{Artifact, ArtifactRecord, IDENTITY_FIELDS};
use crate::error::{OperationError, Result};
use crate::io;
use crate::merge;
use crate::result::{OperationResult, ResultBuilder};
use crate::types::{ArtifactKind, OperationKind};
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Result of decoding a file that may hold a different artifact type.
#[derive(Debug)]
pub enum Decoded<A> {
    Match(A),
    /// The file parsed but belongs to another artifact type sharing the directory.
    Other(ArtifactKind),
}

/// An artifact persisted as its own markdown file.
pub trait MarkdownArtifact: ArtifactRecord {
    fn file_path(root: &Path, id: &str) -> Result<PathBuf>;

    /// Ids of the files present in this type's directory. Types that share a
    /// directory see each other's ids here.
    fn stored_ids(root: &Path) -> Result<Vec<String>>;

    fn render(&self) -> Result<String>;

    fn decode(id: &str, text: &str, path: &Path) -> Result<Decoded<Self>>;

    /// Physically remove the artifact.
    fn remove(root: &Path, id: &str) -> Result<()> {
        std::fs::remove_file(Self::file_path(root, id)?)?;
        Ok(())
    }

    /// Move the stored artifact from one id to another.
    fn relocate(root: &Path, from: &str, to: &str) -> Result<()> {
        let target = Self::file_path(root, to)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(Self::file_path(root, from)?, target)?;
        Ok(())
    }
}

enum Loaded<A> {
    Found(A),
    Missing,
    Mistyped(ArtifactKind),
}

// ---------------------------------------------------------------------------
// MarkdownHandler
// ---------------------------------------------------------------------------

pub struct MarkdownHandler<A> {
    _marker: PhantomData<fn() -> A>,
}

impl<A> Default for MarkdownHandler<A> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<A: MarkdownArtifact> fmt::Debug for MarkdownHandler<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarkdownHandler<{}>", A::KIND)
    }
}

impl<A: MarkdownArtifact> MarkdownHandler<A> {
    fn load(path: &Path, id: &str) -> Result<Loaded<A>> {
        let Some(text) = io::read_optional(path)? else {
            return Ok(Loaded::Missing);
        };
        Ok(match A::decode(id, &text, path)? {
            Decoded::Match(a) => Loaded::Found(a),
            Decoded::Other(kind) => Loaded::Mistyped(kind),
        })
    }

    /// Ids of stored artifacts that really are of this type.
    fn matching_ids(root: &Path) -> Vec<String> {
        let Ok(ids) = A::stored_ids(root) else {
            return Vec::new();
        };
        ids.into_iter()
            .filter(|id| {
                A::file_path(root, id)
                    .and_then(|p| Self::load(&p, id))
                    .map(|l| matches!(l, Loaded::Found(_)))
                    .unwrap_or(false)
            })
            .collect()
    }

    fn not_found(root: &Path, id: &str, path: &Path, found: Option<ArtifactKind>) -> OperationError {
        let mut err = OperationError::not_found(format!("{} '{id}'", A::KIND))
            .with_context("path", path.display().to_string())
            .with_context("available", Self::matching_ids(root));
        if let Some(kind) = found {
            err = err.with_context("foundType", kind.as_str());
        }
        err
    }

    /// Resolve the path for `id` and load what is stored there, turning
    /// absence and type mismatches into NOT_FOUND.
    fn load_existing(
        root: &Path,
        id: &str,
        op: OperationKind,
    ) -> std::result::Result<(A, PathBuf), (Option<PathBuf>, OperationError)> {
        let path = A::file_path(root, id).map_err(|e| (None, e.into_operation_error(op)))?;
        match Self::load(&path, id) {
            Ok(Loaded::Found(a)) => Ok((a, path)),
            Ok(Loaded::Missing) => {
                let err = Self::not_found(root, id, &path, None);
                Err((Some(path), err))
            }
            Ok(Loaded::Mistyped(kind)) => {
                let err = Self::not_found(root, id, &path, Some(kind));
                Err((Some(path), err))
            }
            Err(e) => Err((Some(path), e.into_operation_error(op))),
        }
    }
}

fn with_path(b: ResultBuilder, path: Option<&Path>) -> ResultBuilder {
    match path {
        Some(p) => b.path(p),
        None => b,
    }
}

impl<A: MarkdownArtifact> ArtifactHandler for MarkdownHandler<A> {
    fn kind(&self) -> ArtifactKind {
        A::KIND
    }

    fn path(&self, root: &Path, id: &str) -> Result<PathBuf> {
        A::file_path(root, id)
    }

    fn exists(&self, root: &Path, id: &str) -> bool {
        A::file_path(root, id)
            .and_then(|p| Self::load(&p, id))
            .map(|l| matches!(l, Loaded::Found(_)))
            .unwrap_or(false)
    }

    fn create(
        &self,
        call: Call<'_>,
        artifact: Artifact,
        opts: CreateOptions,
    ) -> OperationResult<Artifact> {
        let b = ResultBuilder::new(call.started, OperationKind::Create, A::KIND)
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
        let path = match A::file_path(call.root, record.id()) {
            Ok(p) => p,
            Err(e) => return b.fail_with(e),
        };
        let b = b.path(&path);

        if path.exists() && !opts.overwrite {
            return b.fail(
                OperationError::already_exists(format!("{} '{}'", A::KIND, record.id()))
                    .with_context("path", path.display().to_string()),
            );
        }

        let text = match record.render() {
            Ok(t) => t,
            Err(e) => return b.fail_with(e),
        };
        if !opts.dry_run {
            if let Err(e) = io::atomic_write(&path, text.as_bytes()) {
                return b.fail_with(e);
            }
        }
        let artifact = record.into_artifact();
        b.after(Some(artifact.clone())).succeed(Some(artifact))
    }

    fn read(&self, call: Call<'_>, id: &str, opts: ReadOptions) -> OperationResult<Artifact> {
        let b = ResultBuilder::new(call.started, OperationKind::Read, A::KIND).id(id);
        let (record, path) = match Self::load_existing(call.root, id, OperationKind::Read) {
            Ok(found) => found,
            Err((path, err)) => return with_path(b, path.as_deref()).fail(err),
        };
        let snapshot = record.into_artifact();
        let mut data = snapshot.clone();
        if !opts.include_content {
            data.strip_content();
        }
        b.path(&path)
            .before(Some(snapshot.clone()))
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
            .dry_run(opts.dry_run);
        let (record, path) = match Self::load_existing(call.root, id, OperationKind::Update) {
            Ok(found) => found,
            Err((path, err)) => return with_path(b, path.as_deref()).fail(err),
        };
        let b = b.path(&path);
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

        let new_path = match A::file_path(call.root, updated.id()) {
            Ok(p) => p,
            Err(e) => return b.fail_with(e),
        };
        let moved = updated.id() != id;
        if moved && new_path.exists() {
            return b.fail(
                OperationError::already_exists(format!("{} '{}'", A::KIND, updated.id()))
                    .with_context("path", new_path.display().to_string()),
            );
        }
        let text = match updated.render() {
            Ok(t) => t,
            Err(e) => return b.fail_with(e),
        };

        if !opts.dry_run {
            if moved {
                if let Err(e) = A::relocate(call.root, id, updated.id()) {
                    return b.fail_with(e);
                }
            }
            if let Err(e) = io::atomic_write(&new_path, text.as_bytes()) {
                return b.fail_with(e);
            }
        }

        let after = updated.into_artifact();
        b.path(&new_path)
            .after(Some(after.clone()))
            .succeed(Some(after))
    }

    fn delete(&self, call: Call<'_>, id: &str, opts: DeleteOptions) -> OperationResult<()> {
        let b = ResultBuilder::new(call.started, OperationKind::Delete, A::KIND)
            .id(id)
            .dry_run(opts.dry_run);
        let (record, path) = match Self::load_existing(call.root, id, OperationKind::Delete) {
            Ok(found) => found,
            Err((path, err)) => return with_path(b, path.as_deref()).fail(err),
        };
        let b = b.path(&path).before(Some(record.into_artifact()));
        if opts.dry_run {
            return b.succeed(None);
        }

        let outcome = if opts.soft {
            std::fs::rename(&path, io::vacant_backup_path(&path)).map_err(Into::into)
        } else {
            A::remove(call.root, id)
        };
        match outcome {
            Ok(()) => b.succeed(None),
            Err(e) => b.fail_with(e),
        }
    }

    fn list(&self, call: Call<'_>) -> OperationResult<Vec<Artifact>> {
        let b = ResultBuilder::new(call.started, OperationKind::Query, A::KIND);
        let ids = match A::stored_ids(call.root) {
            Ok(ids) => ids,
            Err(e) => return b.fail_with(e),
        };
        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            let loaded = A::file_path(call.root, &id).and_then(|p| Self::load(&p, &id));
            match loaded {
                Ok(Loaded::Found(a)) => items.push(a.into_artifact()),
                Ok(Loaded::Missing) | Ok(Loaded::Mistyped(_)) => {}
                Err(e) => return b.id(id).fail_with(e),
            }
        }
        b.succeed(Some(items))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
