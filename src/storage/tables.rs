use redb::TableDefinition;

/// Release rows: uuid -> ReleaseRecord (msgpack)
pub const RELEASES: TableDefinition<&str, &[u8]> = TableDefinition::new("releases");

/// Slug index: slug -> release uuid (share-link lookups)
pub const RELEASE_SLUGS: TableDefinition<&str, &str> = TableDefinition::new("release_slugs");

/// Tag vocabulary: uuid -> Tag (msgpack)
pub const TAGS: TableDefinition<&str, &[u8]> = TableDefinition::new("tags");

/// Tag name index: normalized name -> tag uuid
pub const TAG_NAMES: TableDefinition<&str, &str> = TableDefinition::new("tag_names");

/// Label vocabulary: uuid -> Label (msgpack)
pub const LABELS: TableDefinition<&str, &[u8]> = TableDefinition::new("labels");

/// Label name index: normalized name -> label uuid
pub const LABEL_NAMES: TableDefinition<&str, &str> = TableDefinition::new("label_names");

/// Release/tag join: release uuid -> msgpack Vec of tag uuids
pub const RELEASE_TAGS: TableDefinition<&str, &[u8]> = TableDefinition::new("release_tags");

/// Release/label join: release uuid -> msgpack Vec of label uuids
pub const RELEASE_LABELS: TableDefinition<&str, &[u8]> = TableDefinition::new("release_labels");

/// Media rows: release uuid -> msgpack Vec of MediaItem (ordered)
pub const RELEASE_MEDIA: TableDefinition<&str, &[u8]> = TableDefinition::new("release_media");

/// Users: uuid -> UserRecord (msgpack)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Username index: lowercase username -> user uuid
pub const USERNAMES: TableDefinition<&str, &str> = TableDefinition::new("usernames");

/// Email index: lowercase email -> user uuid
pub const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// Sessions: hex SHA-256 of the bearer token -> SessionRecord (msgpack)
pub const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");
