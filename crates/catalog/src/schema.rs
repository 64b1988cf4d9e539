//! SQLite schema and triggers.
//!
//! Statements are kept separate because trigger bodies contain `;`.

/// Run before the schema on every startup so cached documents are rebuilt
/// against the current base URL and settings.
pub(crate) const DROP_CACHE_SQL: &str = "DROP TABLE IF EXISTS pre_rendered_json";

/// Run after the schema exists.
pub(crate) const CLEAR_COLLECTION_CACHE_SQL: &str =
    "UPDATE collection SET pre_rendered_json = NULL WHERE pre_rendered_json IS NOT NULL";

pub(crate) const SCHEMA_SQL: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS dataset (
    uuid TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('file', 'postgis')),
    path TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS license (
    title TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'text/html',
    alternative_url TEXT,
    alternative_type TEXT
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS collection (
    uuid TEXT PRIMARY KEY,
    id TEXT NOT NULL UNIQUE,
    layer_name TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    license_title TEXT REFERENCES license(title) ON DELETE SET NULL ON UPDATE CASCADE,
    extent_json TEXT,
    crs_json TEXT NOT NULL DEFAULT '["http://www.opengis.net/def/crs/OGC/1.3/CRS84"]',
    storage_crs TEXT NOT NULL DEFAULT 'http://www.opengis.net/def/crs/OGC/1.3/CRS84',
    storage_crs_coordinate_epoch REAL,
    is_3d INTEGER NOT NULL DEFAULT 0,
    datetime_field TEXT,
    dataset_uuid TEXT NOT NULL REFERENCES dataset(uuid) ON DELETE CASCADE ON UPDATE CASCADE,
    pre_rendered_json TEXT,
    UNIQUE (dataset_uuid, layer_name)
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_collection_dataset ON collection(dataset_uuid)",
    r#"
CREATE TABLE IF NOT EXISTS general_option (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS pre_rendered_json (
    key TEXT PRIMARY KEY,
    json_value TEXT NOT NULL
)
"#,
];

pub(crate) const TRIGGER_SQL: &[&str] = &[
    // Landing page follows the service title and description.
    r#"
CREATE TRIGGER IF NOT EXISTS pre_render_landing_page
AFTER UPDATE OF value ON general_option
BEGIN
    UPDATE pre_rendered_json SET json_value =
        json_patch(json_value, json_object(
            'title', (SELECT value FROM general_option WHERE key = 'service_title'),
            'description', (SELECT value FROM general_option WHERE key = 'service_description')
        ))
    WHERE key = 'landing_page';
END
"#,
    r#"
CREATE TRIGGER IF NOT EXISTS invalidate_collections_on_insert
AFTER INSERT ON collection
BEGIN
    DELETE FROM pre_rendered_json WHERE key = 'collections';
END
"#,
    // Recreated on every start so older catalogs lose the column-less
    // version. Caching a collection document must not fire it.
    "DROP TRIGGER IF EXISTS invalidate_collections_on_update",
    r#"
CREATE TRIGGER invalidate_collections_on_update
AFTER UPDATE OF id, title, description, license_title, extent_json, crs_json,
    storage_crs, storage_crs_coordinate_epoch, datetime_field ON collection
BEGIN
    DELETE FROM pre_rendered_json WHERE key = 'collections';
END
"#,
    r#"
CREATE TRIGGER IF NOT EXISTS invalidate_collections_on_delete
AFTER DELETE ON collection
BEGIN
    DELETE FROM pre_rendered_json WHERE key = 'collections';
END
"#,
    r#"
CREATE TRIGGER IF NOT EXISTS invalidate_collections_on_license_insert
AFTER INSERT ON license
BEGIN
    DELETE FROM pre_rendered_json WHERE key = 'collections';
END
"#,
    r#"
CREATE TRIGGER IF NOT EXISTS invalidate_collections_on_license_update
AFTER UPDATE ON license
BEGIN
    DELETE FROM pre_rendered_json WHERE key = 'collections';
    UPDATE collection SET pre_rendered_json = NULL
    WHERE license_title = OLD.title OR license_title = NEW.title;
END
"#,
    r#"
CREATE TRIGGER IF NOT EXISTS invalidate_collections_on_license_delete
AFTER DELETE ON license
BEGIN
    DELETE FROM pre_rendered_json WHERE key = 'collections';
END
"#,
    // Metadata edits drop the cached collection document.
    r#"
CREATE TRIGGER IF NOT EXISTS clear_collection_cache
AFTER UPDATE OF id, title, description, license_title, extent_json, crs_json,
    storage_crs, storage_crs_coordinate_epoch, datetime_field ON collection
BEGIN
    UPDATE collection SET pre_rendered_json = NULL WHERE uuid = NEW.uuid;
END
"#,
];
