//! SQL schema for the NutriPlan SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for later migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS plans (
    plan_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    client      TEXT,
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC
    days_json   TEXT NOT NULL    -- JSON array of DietDay
);

-- One row per categorized product. A save replaces every row of the plan.
-- No foreign key on plan_id: a categorization may be saved for a list that
-- did not come from a stored plan.
CREATE TABLE IF NOT EXISTS assignments (
    plan_id      TEXT NOT NULL,
    category_id  TEXT NOT NULL,
    position     INTEGER NOT NULL,  -- order within the bucket
    product_json TEXT NOT NULL,
    PRIMARY KEY (plan_id, category_id, position)
);

-- Append-only log of user edits to parsed products.
CREATE TABLE IF NOT EXISTS corrections (
    correction_id INTEGER PRIMARY KEY AUTOINCREMENT,
    original      TEXT NOT NULL,
    name          TEXT NOT NULL,
    quantity      REAL NOT NULL,
    unit          TEXT NOT NULL,
    category_id   TEXT,
    recorded_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    category_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    color       TEXT,
    icon        TEXT,
    keywords    TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS plans_created_idx       ON plans(created_at);
CREATE INDEX IF NOT EXISTS corrections_original_idx ON corrections(original);

PRAGMA user_version = 1;
";
