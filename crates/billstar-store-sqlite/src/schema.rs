//! SQL schema for the billstar SQLite store.
//!
//! A star schema: five dimension tables keyed by synthetic code with a
//! UNIQUE natural key, and one fact table referencing them.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS periods (
    period_code         TEXT PRIMARY KEY,
    period_name         TEXT NOT NULL UNIQUE,   -- YYYY-MM-DD
    period_date         TEXT NOT NULL UNIQUE,
    period_day          INTEGER NOT NULL,
    period_month        INTEGER NOT NULL,
    period_year         INTEGER NOT NULL,
    period_quarter      INTEGER NOT NULL,
    period_day_of_week  INTEGER NOT NULL,       -- 1 = Monday
    period_day_of_year  INTEGER NOT NULL,
    period_week_of_year INTEGER NOT NULL,       -- ISO-8601
    period_is_holiday   INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS organisations (
    org_code TEXT PRIMARY KEY,
    org_name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS providers (
    provider_code TEXT PRIMARY KEY,
    provider_name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS accounts (
    account_code TEXT PRIMARY KEY,
    account_id   TEXT NOT NULL UNIQUE,
    org_code     TEXT REFERENCES organisations(org_code)
);

CREATE TABLE IF NOT EXISTS resources (
    resource_code TEXT PRIMARY KEY,
    resource_id   TEXT NOT NULL,
    resource_name TEXT NOT NULL,
    account_code  TEXT REFERENCES accounts(account_code),
    UNIQUE (resource_id, resource_name)
);

-- Facts are append-only.
CREATE TABLE IF NOT EXISTS usages (
    usage_code     TEXT PRIMARY KEY,
    period_code    TEXT NOT NULL REFERENCES periods(period_code),
    org_code       TEXT REFERENCES organisations(org_code),
    provider_code  TEXT REFERENCES providers(provider_code),
    account_code   TEXT REFERENCES accounts(account_code),
    resource_code  TEXT REFERENCES resources(resource_code),
    usage_amount   REAL NOT NULL,
    usage_currency TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS usages_period_idx   ON usages(period_code);
CREATE INDEX IF NOT EXISTS usages_resource_idx ON usages(resource_code);

PRAGMA user_version = 1;
";
