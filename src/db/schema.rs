use rusqlite_migration::{Migrations, M};

/// Schema of the operations store. Migrations are append-only.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        M::up(
            "CREATE TABLE equipment (
                id               TEXT NOT NULL PRIMARY KEY,
                user_id          TEXT NOT NULL,
                created_at       TEXT NOT NULL,
                updated_at       TEXT NOT NULL,
                name             TEXT NOT NULL,
                type             TEXT NOT NULL,
                model            TEXT,
                serial_number    TEXT,
                status           TEXT NOT NULL DEFAULT 'operational'
                    CHECK (status IN ('operational', 'maintenance', 'down', 'retired')),
                location         TEXT,
                purchase_date    TEXT,
                last_maintenance TEXT,
                next_maintenance TEXT,
                UNIQUE (id, user_id)
            );
            CREATE INDEX equipment_user_id ON equipment (user_id);",
        ),
        M::up(
            "CREATE TABLE inventory_items (
                id            TEXT NOT NULL PRIMARY KEY,
                user_id       TEXT NOT NULL,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL,
                name          TEXT NOT NULL,
                category      TEXT NOT NULL,
                sku           TEXT,
                current_stock INTEGER NOT NULL DEFAULT 0 CHECK (current_stock >= 0),
                minimum_stock INTEGER NOT NULL DEFAULT 0 CHECK (minimum_stock >= 0),
                maximum_stock INTEGER,
                unit_cost     REAL,
                location      TEXT
            );
            CREATE INDEX inventory_items_user_id ON inventory_items (user_id);",
        ),
        M::up(
            "CREATE TABLE financial_transactions (
                id               TEXT NOT NULL PRIMARY KEY,
                user_id          TEXT NOT NULL,
                created_at       TEXT NOT NULL,
                updated_at       TEXT NOT NULL,
                type             TEXT NOT NULL
                    CHECK (type IN ('revenue', 'expense', 'asset', 'liability')),
                category         TEXT NOT NULL,
                amount           REAL NOT NULL,
                description      TEXT NOT NULL,
                transaction_date TEXT NOT NULL,
                reference_type   TEXT,
                reference_id     TEXT
            );
            CREATE INDEX financial_transactions_user_id ON financial_transactions (user_id);",
        ),
        M::up(
            "CREATE TABLE production_records (
                id            TEXT NOT NULL PRIMARY KEY,
                user_id       TEXT NOT NULL,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL,
                date          TEXT NOT NULL,
                shift         TEXT NOT NULL,
                material_type TEXT NOT NULL,
                quantity      REAL NOT NULL,
                quality       TEXT NOT NULL,
                location      TEXT NOT NULL,
                notes         TEXT
            );
            CREATE INDEX production_records_user_id ON production_records (user_id);",
        ),
        M::up(
            "CREATE TABLE maintenance_records (
                id             TEXT NOT NULL PRIMARY KEY,
                user_id        TEXT NOT NULL,
                created_at     TEXT NOT NULL,
                updated_at     TEXT NOT NULL,
                equipment_id   TEXT NOT NULL,
                type           TEXT NOT NULL,
                description    TEXT NOT NULL,
                scheduled_date TEXT NOT NULL,
                completed_date TEXT,
                cost           REAL,
                status         TEXT NOT NULL DEFAULT 'scheduled'
                    CHECK (status IN ('scheduled', 'in-progress', 'completed', 'cancelled')),
                FOREIGN KEY (equipment_id, user_id) REFERENCES equipment (id, user_id)
                    ON DELETE CASCADE
            );
            CREATE INDEX maintenance_records_user_id ON maintenance_records (user_id);",
        ),
    ])
}
