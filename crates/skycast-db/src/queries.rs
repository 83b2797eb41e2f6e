use crate::models::{
    FrequentLocationRow, LocationRow, SearchHistoryRow, UserRow, WeatherQueryRow,
};
use crate::{Database, now_timestamp};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Locations --

    pub fn create_location(&self, id: &str, name: &str, latitude: &str, longitude: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO locations (id, name, latitude, longitude) VALUES (?1, ?2, ?3, ?4)",
                (id, name, latitude, longitude),
            )?;
            Ok(())
        })
    }

    pub fn get_location(&self, id: &str) -> Result<Option<LocationRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, latitude, longitude FROM locations WHERE id = ?1")?;
            let row = stmt.query_row([id], location_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn list_locations(&self) -> Result<Vec<LocationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name, latitude, longitude FROM locations ORDER BY created_at")?;
            let rows = stmt
                .query_map([], location_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Deletes a location; FK cascades remove its weather queries and search
    /// history entries. Returns false when no such location exists.
    pub fn delete_location(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let affected = conn.execute("DELETE FROM locations WHERE id = ?1", [id])?;
            Ok(affected > 0)
        })
    }

    // -- Weather queries --

    /// Inserts one fetched day. `query_date` is stamped here and never
    /// mutated afterwards; `raw_data` is stored verbatim.
    pub fn create_weather_query(
        &self,
        id: &str,
        user_id: Option<&str>,
        location_id: &str,
        forecast_date: &str,
        raw_data: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO weather_queries (id, user_id, location_id, query_date, forecast_date, raw_data)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (id, user_id, location_id, now_timestamp(), forecast_date, raw_data),
            )?;
            Ok(())
        })
    }

    pub fn list_recent_weather_queries(&self, user_id: &str, limit: u32) -> Result<Vec<WeatherQueryRow>> {
        self.with_conn(|conn| {
            // JOIN locations to shape the nested response in a single query
            let mut stmt = conn.prepare(
                "SELECT w.id, w.user_id, w.location_id, l.name, l.latitude, l.longitude,
                        w.query_date, w.forecast_date, w.raw_data
                 FROM weather_queries w
                 JOIN locations l ON w.location_id = l.id
                 WHERE w.user_id = ?1
                 ORDER BY w.query_date DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], |row| {
                    Ok(WeatherQueryRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        location_id: row.get(2)?,
                        location_name: row.get(3)?,
                        latitude: row.get(4)?,
                        longitude: row.get(5)?,
                        query_date: row.get(6)?,
                        forecast_date: row.get(7)?,
                        raw_data: row.get(8)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Search history --

    pub fn create_search_history_entry(&self, id: &str, user_id: &str, location_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO search_history (id, user_id, location_id, search_date)
                 VALUES (?1, ?2, ?3, ?4)",
                (id, user_id, location_id, now_timestamp()),
            )?;
            Ok(())
        })
    }

    pub fn list_search_history(&self, user_id: &str) -> Result<Vec<SearchHistoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.user_id, u.username, s.location_id, l.name, l.latitude, l.longitude,
                        s.search_date
                 FROM search_history s
                 JOIN users u ON s.user_id = u.id
                 JOIN locations l ON s.location_id = l.id
                 WHERE s.user_id = ?1
                 ORDER BY s.search_date DESC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(SearchHistoryRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        username: row.get(2)?,
                        location_id: row.get(3)?,
                        location_name: row.get(4)?,
                        latitude: row.get(5)?,
                        longitude: row.get(6)?,
                        search_date: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// The caller's most-searched locations, count descending. Ties fall to
    /// the store's default ordering.
    pub fn frequent_locations(&self, user_id: &str, top_n: u32) -> Result<Vec<FrequentLocationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT l.id, l.name, COUNT(*) AS search_count
                 FROM search_history s
                 JOIN locations l ON s.location_id = l.id
                 WHERE s.user_id = ?1
                 GROUP BY l.id, l.name
                 ORDER BY search_count DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![user_id, top_n], |row| {
                    Ok(FrequentLocationRow {
                        location_id: row.get(0)?,
                        location_name: row.get(1)?,
                        search_count: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn location_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<LocationRow, rusqlite::Error> {
    Ok(LocationRow {
        id: row.get(0)?,
        name: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
    })
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_user(db: &Database) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, &format!("user-{id}"), "hash").unwrap();
        id
    }

    fn seed_location(db: &Database, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_location(&id, name, "50.450100", "30.523400").unwrap();
        id
    }

    #[test]
    fn create_and_get_location() {
        let db = test_db();
        let id = seed_location(&db, "Kyiv");

        let loc = db.get_location(&id).unwrap().unwrap();
        assert_eq!(loc.name, "Kyiv");
        assert_eq!(loc.latitude, "50.450100");
        assert_eq!(loc.longitude, "30.523400");

        assert!(db.get_location("missing").unwrap().is_none());
    }

    #[test]
    fn recent_weather_queries_returns_ten_newest_first() {
        let db = test_db();
        let user = seed_user(&db);
        let loc = seed_location(&db, "Kyiv");

        let mut ids = Vec::new();
        for i in 0..15 {
            let id = Uuid::new_v4().to_string();
            db.create_weather_query(&id, Some(&user), &loc, "2026-08-06", &format!("{{\"n\":{i}}}"))
                .unwrap();
            ids.push(id);
            std::thread::sleep(std::time::Duration::from_millis(1));
        }

        let rows = db.list_recent_weather_queries(&user, 10).unwrap();
        assert_eq!(rows.len(), 10);

        // Newest first: the last inserted row leads, the first five never appear.
        let expected: Vec<String> = ids[5..].iter().rev().cloned().collect();
        let got: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn weather_query_allows_anonymous_user() {
        let db = test_db();
        let loc = seed_location(&db, "Kyiv");

        let id = Uuid::new_v4().to_string();
        db.create_weather_query(&id, None, &loc, "2026-08-06", "{}").unwrap();

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM weather_queries WHERE user_id IS NULL",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn raw_data_is_stored_verbatim() {
        let db = test_db();
        let user = seed_user(&db);
        let loc = seed_location(&db, "Kyiv");

        let doc = r#"{"datetime":"2026-08-06","tempmax":31.2,"hours":[{"datetime":"00:00:00"}]}"#;
        let id = Uuid::new_v4().to_string();
        db.create_weather_query(&id, Some(&user), &loc, "2026-08-06", doc).unwrap();

        let rows = db.list_recent_weather_queries(&user, 10).unwrap();
        assert_eq!(rows[0].raw_data, doc);
    }

    #[test]
    fn search_history_newest_first() {
        let db = test_db();
        let user = seed_user(&db);
        let kyiv = seed_location(&db, "Kyiv");
        let lviv = seed_location(&db, "Lviv");

        let first = Uuid::new_v4().to_string();
        db.create_search_history_entry(&first, &user, &kyiv).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let second = Uuid::new_v4().to_string();
        db.create_search_history_entry(&second, &user, &lviv).unwrap();

        let rows = db.list_search_history(&user).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, second);
        assert_eq!(rows[0].location_name, "Lviv");
        assert_eq!(rows[1].id, first);
    }

    #[test]
    fn frequent_locations_orders_by_count_desc() {
        let db = test_db();
        let user = seed_user(&db);

        let counts = [("A", 5), ("B", 3), ("C", 3), ("D", 1)];
        for (name, n) in counts {
            let loc = seed_location(&db, name);
            for _ in 0..n {
                db.create_search_history_entry(&Uuid::new_v4().to_string(), &user, &loc)
                    .unwrap();
            }
        }

        let rows = db.frequent_locations(&user, 5).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].location_name, "A");
        assert_eq!(rows[0].search_count, 5);
        // B and C tie at 3 in either order; D is last.
        assert_eq!(rows[3].location_name, "D");
        assert_eq!(rows[3].search_count, 1);

        let top_two = db.frequent_locations(&user, 2).unwrap();
        assert_eq!(top_two.len(), 2);
    }

    #[test]
    fn frequent_locations_only_counts_the_given_user() {
        let db = test_db();
        let user = seed_user(&db);
        let other = seed_user(&db);
        let loc = seed_location(&db, "Kyiv");

        db.create_search_history_entry(&Uuid::new_v4().to_string(), &other, &loc).unwrap();

        assert!(db.frequent_locations(&user, 5).unwrap().is_empty());
    }

    #[test]
    fn deleting_a_location_cascades_to_dependents() {
        let db = test_db();
        let user = seed_user(&db);
        let loc = seed_location(&db, "Kyiv");

        db.create_weather_query(&Uuid::new_v4().to_string(), Some(&user), &loc, "2026-08-06", "{}")
            .unwrap();
        db.create_search_history_entry(&Uuid::new_v4().to_string(), &user, &loc).unwrap();

        assert!(db.delete_location(&loc).unwrap());
        assert!(!db.delete_location(&loc).unwrap());

        assert!(db.list_recent_weather_queries(&user, 10).unwrap().is_empty());
        assert!(db.list_search_history(&user).unwrap().is_empty());
    }
}
