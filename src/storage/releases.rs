use chrono::Utc;
use redb::{ReadOnlyTable, ReadTransaction, ReadableTable, Table, TableDefinition, WriteTransaction};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::db::{Database, DatabaseError};
use super::models::{
    is_placeholder_id, MediaItem, ReleaseDraft, ReleaseNote, ReleaseRecord, Tag, TagInput,
};
use super::tables::*;
use crate::slug::{release_slug, release_slug_full};

type BlobTable = TableDefinition<'static, &'static str, &'static [u8]>;
type IndexTable = TableDefinition<'static, &'static str, &'static str>;

/// The two color-coded vocabularies a release can be classified with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    Labels,
    Tags,
}

impl Vocabulary {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vocabulary::Labels => "label",
            Vocabulary::Tags => "tag",
        }
    }

    fn entries(&self) -> BlobTable {
        match self {
            Vocabulary::Labels => LABELS,
            Vocabulary::Tags => TAGS,
        }
    }

    fn names(&self) -> IndexTable {
        match self {
            Vocabulary::Labels => LABEL_NAMES,
            Vocabulary::Tags => TAG_NAMES,
        }
    }

    fn joins(&self) -> BlobTable {
        match self {
            Vocabulary::Labels => RELEASE_LABELS,
            Vocabulary::Tags => RELEASE_TAGS,
        }
    }
}

/// Number of join rows held for a single release.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JoinRows {
    pub tags: usize,
    pub labels: usize,
    pub media: usize,
}

/// Changes applied to one join set during a save.
#[derive(Debug, Default, Clone, Copy)]
struct JoinDelta {
    added: usize,
    removed: usize,
}

impl Database {
    // ========================================================================
    // Release reads
    // ========================================================================

    /// All releases with their tags, labels and media. Order follows the
    /// primary key and carries no meaning; sorting belongs to the query layer.
    pub fn fetch_releases(&self) -> Result<Vec<ReleaseNote>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let reader = ReleaseReader::open(&read_txn)?;
        let releases = read_txn.open_table(RELEASES)?;

        let mut notes = Vec::new();
        for result in releases.iter()? {
            let (_, value) = result?;
            let record: ReleaseRecord = rmp_serde::from_slice(value.value())?;
            notes.push(reader.assemble(record)?);
        }

        Ok(notes)
    }

    pub fn get_release(&self, id: &str) -> Result<Option<ReleaseNote>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let releases = read_txn.open_table(RELEASES)?;

        match decode_entry::<ReleaseRecord>(&releases, id)? {
            Some(record) => Ok(Some(ReleaseReader::open(&read_txn)?.assemble(record)?)),
            None => Ok(None),
        }
    }

    /// Resolve a share link (slug -> uuid -> release)
    pub fn get_release_by_slug(&self, slug: &str) -> Result<Option<ReleaseNote>, DatabaseError> {
        let id = {
            let read_txn = self.begin_read()?;
            let slugs = read_txn.open_table(RELEASE_SLUGS)?;
            let id = slugs.get(slug)?.map(|v| v.value().to_string());
            id
        };

        match id {
            Some(id) => self.get_release(&id),
            None => Ok(None),
        }
    }

    pub fn join_rows(&self, release_id: &str) -> Result<JoinRows, DatabaseError> {
        let read_txn = self.begin_read()?;
        let tags: Vec<String> = decode_entry(&read_txn.open_table(RELEASE_TAGS)?, release_id)?
            .unwrap_or_default();
        let labels: Vec<String> =
            decode_entry(&read_txn.open_table(RELEASE_LABELS)?, release_id)?.unwrap_or_default();
        let media: Vec<MediaItem> =
            decode_entry(&read_txn.open_table(RELEASE_MEDIA)?, release_id)?.unwrap_or_default();

        Ok(JoinRows {
            tags: tags.len(),
            labels: labels.len(),
            media: media.len(),
        })
    }

    // ========================================================================
    // Release writes
    // ========================================================================

    /// Insert or update a release and reconcile its tags, labels and media.
    ///
    /// A draft whose id is absent or a client placeholder is inserted under a
    /// fresh uuid and receives its slug; otherwise the existing row is updated
    /// and keeps its slug. Collections set to `None` are left untouched, the
    /// others are diffed against what is stored. Everything happens in one
    /// write transaction, so a failure leaves no partial release behind.
    pub fn save_release(&self, draft: &ReleaseDraft) -> Result<ReleaseNote, DatabaseError> {
        let now = Utc::now();
        let write_txn = self.begin_write()?;

        let release_id = {
            let mut releases = write_txn.open_table(RELEASES)?;
            let target = draft.id.as_deref().filter(|id| !is_placeholder_id(id));

            let record = match target {
                Some(id) => {
                    let mut record: ReleaseRecord = decode_entry(&releases, id)?
                        .ok_or_else(|| DatabaseError::NotFound(format!("release {id}")))?;
                    record.title = draft.title.clone();
                    record.description = draft.description.clone();
                    record.datetime = draft.datetime;
                    record.category = draft.category;
                    record.updated_at = now;
                    record
                }
                None => {
                    let id = uuid::Uuid::new_v4().to_string();
                    let mut slugs = write_txn.open_table(RELEASE_SLUGS)?;
                    let slug = allocate_slug(&mut slugs, &draft.title, &id)?;
                    ReleaseRecord {
                        id,
                        title: draft.title.clone(),
                        description: draft.description.clone(),
                        datetime: draft.datetime,
                        category: draft.category,
                        slug,
                        created_at: now,
                        updated_at: now,
                    }
                }
            };

            let data = rmp_serde::to_vec_named(&record)?;
            releases.insert(record.id.as_str(), data.as_slice())?;
            record.id
        };

        if let Some(ref tags) = draft.tags {
            let delta = sync_vocabulary(&write_txn, Vocabulary::Tags, &release_id, tags)?;
            tracing::debug!(release_id = %release_id, added = delta.added, removed = delta.removed, "Synced tags");
        }
        if let Some(ref labels) = draft.labels {
            let delta = sync_vocabulary(&write_txn, Vocabulary::Labels, &release_id, labels)?;
            tracing::debug!(release_id = %release_id, added = delta.added, removed = delta.removed, "Synced labels");
        }
        if let Some(ref media) = draft.media {
            sync_media(&write_txn, &release_id, media)?;
        }

        write_txn.commit()?;

        self.get_release(&release_id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("release {release_id} after save")))
    }

    /// Delete a release together with its slug, join rows and media rows.
    /// Returns false if the release did not exist.
    pub fn delete_release(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing: Option<ReleaseRecord> = {
            let releases = write_txn.open_table(RELEASES)?;
            let result = decode_entry(&releases, id)?;
            result
        };

        let deleted = match existing {
            Some(record) => {
                {
                    let mut table = write_txn.open_table(RELEASE_TAGS)?;
                    table.remove(id)?;
                }
                {
                    let mut table = write_txn.open_table(RELEASE_LABELS)?;
                    table.remove(id)?;
                }
                {
                    let mut table = write_txn.open_table(RELEASE_MEDIA)?;
                    table.remove(id)?;
                }
                {
                    let mut slugs = write_txn.open_table(RELEASE_SLUGS)?;
                    slugs.remove(record.slug.as_str())?;
                }
                {
                    let mut releases = write_txn.open_table(RELEASES)?;
                    releases.remove(id)?;
                }
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    // ========================================================================
    // Vocabulary
    // ========================================================================

    /// Every tag or label, sorted by name (case-insensitive).
    pub fn list_vocabulary(&self, vocabulary: Vocabulary) -> Result<Vec<Tag>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(vocabulary.entries())?;

        let mut entries = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let entry: Tag = rmp_serde::from_slice(value.value())?;
            entries.push(entry);
        }

        entries.sort_by_key(|entry| entry.name.to_lowercase());
        Ok(entries)
    }
}

// ============================================================================
// Read helpers
// ============================================================================

/// Tables needed to turn a `ReleaseRecord` into a `ReleaseNote`.
struct ReleaseReader {
    labels: ReadOnlyTable<&'static str, &'static [u8]>,
    release_labels: ReadOnlyTable<&'static str, &'static [u8]>,
    release_media: ReadOnlyTable<&'static str, &'static [u8]>,
    release_tags: ReadOnlyTable<&'static str, &'static [u8]>,
    tags: ReadOnlyTable<&'static str, &'static [u8]>,
}

impl ReleaseReader {
    fn open(txn: &ReadTransaction) -> Result<Self, DatabaseError> {
        Ok(Self {
            labels: txn.open_table(LABELS)?,
            release_labels: txn.open_table(RELEASE_LABELS)?,
            release_media: txn.open_table(RELEASE_MEDIA)?,
            release_tags: txn.open_table(RELEASE_TAGS)?,
            tags: txn.open_table(TAGS)?,
        })
    }

    fn assemble(&self, record: ReleaseRecord) -> Result<ReleaseNote, DatabaseError> {
        let tags = resolve_entries(&self.release_tags, &self.tags, &record.id)?;
        let labels = resolve_entries(&self.release_labels, &self.labels, &record.id)?;
        let media: Vec<MediaItem> =
            decode_entry(&self.release_media, &record.id)?.unwrap_or_default();

        let slug = if record.slug.is_empty() {
            release_slug(&record.title, &record.id)
        } else {
            record.slug
        };

        Ok(ReleaseNote {
            id: record.id,
            title: record.title,
            description: record.description,
            datetime: record.datetime,
            category: record.category,
            tags,
            labels,
            slug,
            media,
        })
    }
}

fn resolve_entries(
    joins: &impl ReadableTable<&'static str, &'static [u8]>,
    entries: &impl ReadableTable<&'static str, &'static [u8]>,
    release_id: &str,
) -> Result<Vec<Tag>, DatabaseError> {
    let ids: Vec<String> = decode_entry(joins, release_id)?.unwrap_or_default();

    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(entry) = decode_entry::<Tag>(entries, &id)? {
            resolved.push(entry);
        }
    }
    Ok(resolved)
}

fn decode_entry<T: DeserializeOwned>(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    key: &str,
) -> Result<Option<T>, DatabaseError> {
    match table.get(key)? {
        Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
        None => Ok(None),
    }
}

// ============================================================================
// Write helpers
// ============================================================================

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn allocate_slug(
    slugs: &mut Table<'_, &'static str, &'static str>,
    title: &str,
    id: &str,
) -> Result<String, DatabaseError> {
    let short = release_slug(title, id);
    let slug = if slugs.get(short.as_str())?.is_none() {
        short
    } else {
        let full = release_slug_full(title, id);
        if slugs.get(full.as_str())?.is_some() {
            return Err(DatabaseError::Conflict(format!("slug '{full}' is already in use")));
        }
        full
    };

    slugs.insert(slug.as_str(), id)?;
    Ok(slug)
}

/// Find a vocabulary entry by name, creating it or refreshing its color.
fn upsert_entry(
    txn: &WriteTransaction,
    vocabulary: Vocabulary,
    input: &TagInput,
) -> Result<String, DatabaseError> {
    let key = normalize_name(&input.name);
    if key.is_empty() {
        return Err(DatabaseError::Validation(format!(
            "{} name must not be empty",
            vocabulary.as_str()
        )));
    }

    let mut names = txn.open_table(vocabulary.names())?;
    let mut entries = txn.open_table(vocabulary.entries())?;

    let existing_id = names.get(key.as_str())?.map(|v| v.value().to_string());
    let id = match existing_id {
        Some(id) => {
            let current: Option<Tag> = decode_entry(&entries, &id)?;
            let needs_write = current
                .as_ref()
                .map(|entry| entry.color != input.color)
                .unwrap_or(true);
            if needs_write {
                let entry = Tag {
                    id: id.clone(),
                    name: current
                        .map(|entry| entry.name)
                        .unwrap_or_else(|| input.name.trim().to_string()),
                    color: input.color.clone(),
                };
                insert_encoded(&mut entries, &id, &entry)?;
            }
            id
        }
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            let entry = Tag {
                id: id.clone(),
                name: input.name.trim().to_string(),
                color: input.color.clone(),
            };
            insert_encoded(&mut entries, &id, &entry)?;
            names.insert(key.as_str(), id.as_str())?;
            tracing::debug!(kind = vocabulary.as_str(), id = %id, name = %entry.name, "Created vocabulary entry");
            id
        }
    };

    Ok(id)
}

fn sync_vocabulary(
    txn: &WriteTransaction,
    vocabulary: Vocabulary,
    release_id: &str,
    inputs: &[TagInput],
) -> Result<JoinDelta, DatabaseError> {
    let mut desired: Vec<String> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let id = upsert_entry(txn, vocabulary, input)?;
        if !desired.contains(&id) {
            desired.push(id);
        }
    }

    let mut joins = txn.open_table(vocabulary.joins())?;
    let existing: Vec<String> = decode_entry(&joins, release_id)?.unwrap_or_default();

    let delta = JoinDelta {
        added: desired.iter().filter(|id| !existing.contains(id)).count(),
        removed: existing.iter().filter(|id| !desired.contains(id)).count(),
    };
    if delta.added == 0 && delta.removed == 0 {
        return Ok(delta);
    }

    if desired.is_empty() {
        joins.remove(release_id)?;
    } else {
        insert_encoded(&mut joins, release_id, &desired)?;
    }
    Ok(delta)
}

fn sync_media(
    txn: &WriteTransaction,
    release_id: &str,
    media: &[MediaItem],
) -> Result<(), DatabaseError> {
    let mut table = txn.open_table(RELEASE_MEDIA)?;
    let existing: Vec<MediaItem> = decode_entry(&table, release_id)?.unwrap_or_default();
    if existing.as_slice() == media {
        return Ok(());
    }

    if media.is_empty() {
        table.remove(release_id)?;
    } else {
        insert_encoded(&mut table, release_id, media)?;
    }
    Ok(())
}

fn insert_encoded<T: Serialize + ?Sized>(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    key: &str,
    value: &T,
) -> Result<(), DatabaseError> {
    let data = rmp_serde::to_vec_named(value)?;
    table.insert(key, data.as_slice())?;
    Ok(())
}
