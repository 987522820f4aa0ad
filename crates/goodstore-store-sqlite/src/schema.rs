//! SQL schema for the goodstore SQLite store.
//!
//! Run on every open. Each statement is idempotent, so reopening a populated
//! database leaves its rows alone. `user_version` 1 marks this table layout.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS categories (
    id          INTEGER PRIMARY KEY,
    code        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS certification_types (
    id             INTEGER PRIMARY KEY,
    code           TEXT NOT NULL UNIQUE,
    name           TEXT NOT NULL,
    description    TEXT,
    issuing_agency TEXT,
    category_code  TEXT REFERENCES categories(code)
);

CREATE TABLE IF NOT EXISTS stores (
    id         INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    address    TEXT NOT NULL DEFAULT '',
    district   TEXT,
    lat        REAL,
    lon        REAL,
    phone      TEXT,
    raw_meta   TEXT,                    -- JSON object or NULL
    created_at TEXT NOT NULL,           -- RFC 3339 UTC
    score      INTEGER NOT NULL DEFAULT 0 CHECK (score >= 0)
);

-- Live ingestion matches on address; an empty address is not a key.
CREATE UNIQUE INDEX IF NOT EXISTS stores_address_uq
    ON stores(address) WHERE address <> '';
-- Seed loading matches on name.
CREATE INDEX IF NOT EXISTS stores_name_idx ON stores(name);

CREATE TABLE IF NOT EXISTS certifications (
    id           INTEGER PRIMARY KEY,
    store_id     INTEGER NOT NULL REFERENCES stores(id),
    cert_type_id INTEGER NOT NULL REFERENCES certification_types(id),
    UNIQUE (store_id, cert_type_id)
);

-- Append-only; identical rows are allowed.
CREATE TABLE IF NOT EXISTS cardnews (
    id         INTEGER PRIMARY KEY,
    store_id   INTEGER NOT NULL REFERENCES stores(id),
    title      TEXT NOT NULL,
    summary    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    raw_json   TEXT
);

CREATE INDEX IF NOT EXISTS cardnews_store_idx ON cardnews(store_id);

PRAGMA user_version = 1;
";
