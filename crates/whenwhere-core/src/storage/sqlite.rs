//! SQLite implementation of [`Store`].

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use super::{data_dir, migrations, Store};
use crate::day::Day;
use crate::error::{DatabaseError, Result};
use crate::location::{Address, Coordinate, Location};
use crate::range::{DayRange, Slot, SlotRange, TimeRange};
use crate::tag::Tag;
use crate::task::Task;
use crate::time_of_day::TimeOfDay;
use crate::user::User;

pub const DB_FILE: &str = "whenwhere.db";

// The only places deciding what a user's listings show.
const VISIBLE_RANGE: &str = "parent_tag_id IS NULL";
const VISIBLE_TAG: &str = "parent_task_id IS NULL";

const USER_COLUMNS: &str = "id, first_name, last_name, created_at, updated_at";
const RANGE_COLUMNS: &str = "id, user_id, name, parent_tag_id, slots, created_at, updated_at";
const LOCATION_COLUMNS: &str =
    "id, user_id, name, street, city, zip, state, latitude, longitude, created_at, updated_at";
const TAG_COLUMNS: &str = "id, user_id, name, parent_task_id, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, user_id, title, content, important, long_lasting, tag_id, created_at, updated_at";

/// Slot types with their own range table.
trait RangeRow: Slot + Serialize + DeserializeOwned {
    const TABLE: &'static str;
}

impl RangeRow for Day {
    const TABLE: &'static str = "day_ranges";
}

impl RangeRow for TimeOfDay {
    const TABLE: &'static str = "time_ranges";
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
fn format_ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn get_ts(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        created_at: get_ts(row, 3)?,
        updated_at: get_ts(row, 4)?,
    })
}

fn row_to_range<T: RangeRow>(row: &Row) -> rusqlite::Result<SlotRange<T>> {
    let raw: String = row.get(4)?;
    let slots: Vec<T> = serde_json::from_str(&raw).map_err(|e| conversion_error(4, e))?;
    Ok(SlotRange::from_parts(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        slots,
        get_ts(row, 5)?,
        get_ts(row, 6)?,
    ))
}

fn row_to_location(row: &Row) -> rusqlite::Result<Location> {
    let latitude: Option<f64> = row.get(7)?;
    let longitude: Option<f64> = row.get(8)?;
    Ok(Location {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        address: Address {
            street: row.get(3)?,
            city: row.get(4)?,
            zip: row.get(5)?,
            state: row.get(6)?,
        },
        coordinate: latitude.zip(longitude).map(|(lat, lon)| Coordinate::new(lat, lon)),
        created_at: get_ts(row, 9)?,
        updated_at: get_ts(row, 10)?,
    })
}

/// Tag without its location associations; callers fill those in.
fn row_to_tag(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        parent_task_id: row.get(3)?,
        location_ids: Vec::new(),
        created_at: get_ts(row, 4)?,
        updated_at: get_ts(row, 5)?,
    })
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        important: row.get(4)?,
        long_lasting: row.get(5)?,
        tag_id: row.get(6)?,
        created_at: get_ts(row, 7)?,
        updated_at: get_ts(row, 8)?,
    })
}

/// Delete a tag and what it owns. Runs inside the caller's transaction.
fn delete_tag_rows(conn: &Connection, tag_id: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM day_ranges WHERE parent_tag_id = ?1", params![tag_id])?;
    conn.execute("DELETE FROM time_ranges WHERE parent_tag_id = ?1", params![tag_id])?;
    conn.execute("DELETE FROM tag_locations WHERE tag_id = ?1", params![tag_id])?;
    conn.execute("UPDATE tasks SET tag_id = NULL WHERE tag_id = ?1", params![tag_id])?;
    conn.execute("DELETE FROM tags WHERE id = ?1", params![tag_id])?;
    Ok(())
}

/// SQLite database holding users and everything they own.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/whenwhere.db`, creating and
    /// migrating it as needed.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the
    /// database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join(DB_FILE))
    }

    /// Open (or create) the database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "opened database");
        Self::with_connection(conn)
    }

    /// Open an empty in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // === Ranges (shared by both slot kinds) ===

    fn find_range<T: RangeRow>(&self, id: &str) -> Result<Option<SlotRange<T>>> {
        let sql = format!("SELECT {RANGE_COLUMNS} FROM {} WHERE id = ?1", T::TABLE);
        Ok(self
            .conn
            .query_row(&sql, params![id], row_to_range::<T>)
            .optional()?)
    }

    fn visible_ranges<T: RangeRow>(&self, user_id: &str) -> Result<Vec<SlotRange<T>>> {
        let sql = format!(
            "SELECT {RANGE_COLUMNS} FROM {} WHERE user_id = ?1 AND {VISIBLE_RANGE}
             ORDER BY name COLLATE NOCASE, created_at",
            T::TABLE
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let ranges = stmt
            .query_map(params![user_id], row_to_range::<T>)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ranges)
    }

    fn hidden_range<T: RangeRow>(&self, tag_id: &str) -> Result<Option<SlotRange<T>>> {
        let sql = format!(
            "SELECT {RANGE_COLUMNS} FROM {} WHERE parent_tag_id = ?1 LIMIT 1",
            T::TABLE
        );
        Ok(self
            .conn
            .query_row(&sql, params![tag_id], row_to_range::<T>)
            .optional()?)
    }

    fn save_range<T: RangeRow>(&self, range: &SlotRange<T>) -> Result<()> {
        range.validate()?;
        let slots = serde_json::to_string(&range.slot_vec())?;
        let sql = format!(
            "INSERT INTO {} ({RANGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                parent_tag_id = excluded.parent_tag_id,
                slots = excluded.slots,
                updated_at = excluded.updated_at",
            T::TABLE
        );
        self.conn.execute(
            &sql,
            params![
                range.id,
                range.user_id,
                range.name.trim(),
                range.parent_tag_id,
                slots,
                format_ts(&range.created_at),
                format_ts(&range.updated_at),
            ],
        )?;
        Ok(())
    }

    fn destroy_range<T: RangeRow>(&self, id: &str) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", T::TABLE);
        self.conn.execute(&sql, params![id])?;
        Ok(())
    }

    // === Tags ===

    fn load_tag_locations(&self, tag: &mut Tag) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("SELECT location_id FROM tag_locations WHERE tag_id = ?1 ORDER BY position")?;
        tag.location_ids = stmt
            .query_map(params![tag.id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(())
    }

    fn with_locations(&self, tag: Option<Tag>) -> Result<Option<Tag>> {
        match tag {
            Some(mut tag) => {
                self.load_tag_locations(&mut tag)?;
                Ok(Some(tag))
            }
            None => Ok(None),
        }
    }
}

impl Store for SqliteStore {
    // === Users ===

    fn find_user(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        Ok(self.conn.query_row(&sql, params![id], row_to_user).optional()?)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, rowid");
        let mut stmt = self.conn.prepare(&sql)?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    fn save_user(&self, user: &User) -> Result<()> {
        user.validate()?;
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                updated_at = excluded.updated_at"
        );
        self.conn.execute(
            &sql,
            params![
                user.id,
                user.first_name.trim(),
                user.last_name.trim(),
                format_ts(&user.created_at),
                format_ts(&user.updated_at),
            ],
        )?;
        Ok(())
    }

    fn destroy_user(&self, id: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM tag_locations WHERE tag_id IN (SELECT id FROM tags WHERE user_id = ?1)",
            params![id],
        )?;
        for table in ["day_ranges", "time_ranges", "tags", "tasks", "locations"] {
            tx.execute(&format!("DELETE FROM {table} WHERE user_id = ?1"), params![id])?;
        }
        tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    // === Day ranges ===

    fn find_day_range(&self, id: &str) -> Result<Option<DayRange>> {
        self.find_range(id)
    }

    fn visible_day_ranges(&self, user_id: &str) -> Result<Vec<DayRange>> {
        self.visible_ranges(user_id)
    }

    fn hidden_day_range(&self, tag_id: &str) -> Result<Option<DayRange>> {
        self.hidden_range(tag_id)
    }

    fn save_day_range(&self, range: &DayRange) -> Result<()> {
        self.save_range(range)
    }

    fn destroy_day_range(&self, id: &str) -> Result<()> {
        self.destroy_range::<Day>(id)
    }

    // === Time ranges ===

    fn find_time_range(&self, id: &str) -> Result<Option<TimeRange>> {
        self.find_range(id)
    }

    fn visible_time_ranges(&self, user_id: &str) -> Result<Vec<TimeRange>> {
        self.visible_ranges(user_id)
    }

    fn hidden_time_range(&self, tag_id: &str) -> Result<Option<TimeRange>> {
        self.hidden_range(tag_id)
    }

    fn save_time_range(&self, range: &TimeRange) -> Result<()> {
        self.save_range(range)
    }

    fn destroy_time_range(&self, id: &str) -> Result<()> {
        self.destroy_range::<TimeOfDay>(id)
    }

    // === Locations ===

    fn find_location(&self, id: &str) -> Result<Option<Location>> {
        let sql = format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], row_to_location)
            .optional()?)
    }

    fn find_location_by_name(&self, user_id: &str, name: &str) -> Result<Option<Location>> {
        let sql =
            format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE user_id = ?1 AND name = ?2");
        Ok(self
            .conn
            .query_row(&sql, params![user_id, name], row_to_location)
            .optional()?)
    }

    fn list_locations(&self, user_id: &str) -> Result<Vec<Location>> {
        let sql = format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE user_id = ?1
             ORDER BY name COLLATE NOCASE, created_at"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let locations = stmt
            .query_map(params![user_id], row_to_location)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(locations)
    }

    fn save_location(&self, location: &Location) -> Result<()> {
        location.validate()?;
        let (latitude, longitude) = match location.coordinate {
            Some(c) => (Some(c.latitude), Some(c.longitude)),
            None => (None, None),
        };
        let sql = format!(
            "INSERT INTO locations ({LOCATION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                street = excluded.street,
                city = excluded.city,
                zip = excluded.zip,
                state = excluded.state,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                updated_at = excluded.updated_at"
        );
        let address = &location.address;
        self.conn.execute(
            &sql,
            params![
                location.id,
                location.user_id,
                location.name,
                address.street,
                address.city,
                address.zip,
                address.state,
                latitude,
                longitude,
                format_ts(&location.created_at),
                format_ts(&location.updated_at),
            ],
        )?;
        Ok(())
    }

    fn destroy_location(&self, id: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM tag_locations WHERE location_id = ?1", params![id])?;
        tx.execute("DELETE FROM locations WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    // === Tags ===

    fn find_tag(&self, id: &str) -> Result<Option<Tag>> {
        let sql = format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = ?1");
        let tag = self.conn.query_row(&sql, params![id], row_to_tag).optional()?;
        self.with_locations(tag)
    }

    fn visible_tags(&self, user_id: &str) -> Result<Vec<Tag>> {
        let sql = format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE user_id = ?1 AND {VISIBLE_TAG}
             ORDER BY name COLLATE NOCASE, created_at"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut tags = stmt
            .query_map(params![user_id], row_to_tag)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for tag in &mut tags {
            self.load_tag_locations(tag)?;
        }
        Ok(tags)
    }

    fn hidden_tag(&self, task_id: &str) -> Result<Option<Tag>> {
        let sql = format!("SELECT {TAG_COLUMNS} FROM tags WHERE parent_task_id = ?1 LIMIT 1");
        let tag = self
            .conn
            .query_row(&sql, params![task_id], row_to_tag)
            .optional()?;
        self.with_locations(tag)
    }

    fn save_tag(&self, tag: &Tag) -> Result<()> {
        tag.validate()?;
        let tx = self.conn.unchecked_transaction()?;
        let sql = format!(
            "INSERT INTO tags ({TAG_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                parent_task_id = excluded.parent_task_id,
                updated_at = excluded.updated_at"
        );
        tx.execute(
            &sql,
            params![
                tag.id,
                tag.user_id,
                tag.name.trim(),
                tag.parent_task_id,
                format_ts(&tag.created_at),
                format_ts(&tag.updated_at),
            ],
        )?;
        tx.execute("DELETE FROM tag_locations WHERE tag_id = ?1", params![tag.id])?;
        for (position, location_id) in tag.location_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO tag_locations (tag_id, location_id, position) VALUES (?1, ?2, ?3)",
                params![tag.id, location_id, position as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn destroy_tag(&self, id: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        delete_tag_rows(&tx, id)?;
        tx.commit()?;
        Ok(())
    }

    // === Tasks ===

    fn find_task(&self, id: &str) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
        Ok(self.conn.query_row(&sql, params![id], row_to_task).optional()?)
    }

    fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 ORDER BY created_at, rowid"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params![user_id], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    fn save_task(&self, task: &Task) -> Result<()> {
        task.validate()?;
        let sql = format!(
            "INSERT INTO tasks ({TASK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                important = excluded.important,
                long_lasting = excluded.long_lasting,
                tag_id = excluded.tag_id,
                updated_at = excluded.updated_at"
        );
        self.conn.execute(
            &sql,
            params![
                task.id,
                task.user_id,
                task.title.trim(),
                task.content,
                task.important,
                task.long_lasting,
                task.tag_id,
                format_ts(&task.created_at),
                format_ts(&task.updated_at),
            ],
        )?;
        Ok(())
    }

    fn destroy_task(&self, id: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let hidden: Vec<String> = {
            let mut stmt = tx.prepare("SELECT id FROM tags WHERE parent_task_id = ?1")?;
            let ids = stmt
                .query_map(params![id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            ids
        };
        for tag_id in &hidden {
            delete_tag_rows(&tx, tag_id)?;
        }
        tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn store_with_user() -> (SqliteStore, User) {
        let store = SqliteStore::open_memory().unwrap();
        let user = User::new("Grace", "Hopper");
        store.save_user(&user).unwrap();
        (store, user)
    }

    fn t(h: i64) -> TimeOfDay {
        TimeOfDay::at_hour(h).unwrap()
    }

    #[test]
    fn user_round_trip() {
        let (store, user) = store_with_user();
        let found = store.find_user(&user.id).unwrap().unwrap();
        assert_eq!(found.full_name(), "Grace Hopper");
        assert_eq!(store.list_users().unwrap().len(), 1);
        assert!(store.find_user("missing").unwrap().is_none());
    }

    #[test]
    fn save_surfaces_validation_errors() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store.save_user(&User::new("", "Hopper")).unwrap_err();
        match err {
            CoreError::Validation(errors) => assert!(errors.has("first_name")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn range_slots_round_trip() {
        let (store, user) = store_with_user();
        let mut days = DayRange::new(&user.id, "Weekend");
        days.set_slots([Day::Saturday, Day::Sunday]);
        store.save_day_range(&days).unwrap();

        let mut times = TimeRange::new(&user.id, "Night");
        times.set_slots(TimeRange::span(t(22), t(2)));
        store.save_time_range(&times).unwrap();

        let days_back = store.find_day_range(&days.id).unwrap().unwrap();
        assert_eq!(days_back.slot_vec(), vec![Day::Sunday, Day::Saturday]);
        let times_back = store.find_time_range(&times.id).unwrap().unwrap();
        assert_eq!(times_back.slot_vec(), vec![t(0), t(1), t(22), t(23)]);
        assert_eq!(times_back.created_at, times.created_at);
    }

    #[test]
    fn save_range_updates_in_place() {
        let (store, user) = store_with_user();
        let mut range = DayRange::new(&user.id, "Gym");
        range.set_slots([Day::Monday]);
        store.save_day_range(&range).unwrap();
        range.name = "Gym Days".into();
        range.set_slots([Day::Thursday]);
        store.save_day_range(&range).unwrap();

        let ranges = store.visible_day_ranges(&user.id).unwrap();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].name, "Gym Days");
        assert_eq!(ranges[0].slot_vec(), vec![Day::Thursday]);
    }

    #[test]
    fn hidden_ranges_are_not_listed() {
        let (store, user) = store_with_user();
        let tag = Tag::new(&user.id, "Errands");
        store.save_tag(&tag).unwrap();
        store.save_day_range(&DayRange::new(&user.id, "Weekdays")).unwrap();
        let hidden = DayRange::override_for(&user.id, &tag.id);
        store.save_day_range(&hidden).unwrap();

        let visible = store.visible_day_ranges(&user.id).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Weekdays");
        assert_eq!(store.hidden_day_range(&tag.id).unwrap().unwrap().id, hidden.id);
        assert!(store.hidden_time_range(&tag.id).unwrap().is_none());
    }

    #[test]
    fn hidden_tags_are_not_listed() {
        let (store, user) = store_with_user();
        let task = Task::new(&user.id, "Water plants");
        store.save_task(&task).unwrap();
        store.save_tag(&Tag::new(&user.id, "Home")).unwrap();
        let hidden = Tag::hidden_for(&user.id, &task.id);
        store.save_tag(&hidden).unwrap();

        let names: Vec<String> = store
            .visible_tags(&user.id)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Home"]);
        assert_eq!(store.hidden_tag(&task.id).unwrap().unwrap().id, hidden.id);
    }

    #[test]
    fn location_coordinates_round_trip() {
        let (store, user) = store_with_user();
        let mut home = Location::new(&user.id, "Home");
        home.address.city = Some("Springfield".into());
        home.coordinate = Some(Coordinate::new(44.05, -123.09));
        store.save_location(&home).unwrap();

        let found = store.find_location_by_name(&user.id, "Home").unwrap().unwrap();
        assert_eq!(found.coordinate, home.coordinate);
        assert_eq!(found.address.city.as_deref(), Some("Springfield"));
        assert!(store.find_location_by_name(&user.id, "Work").unwrap().is_none());
    }

    #[test]
    fn tag_locations_keep_order() {
        let (store, user) = store_with_user();
        let home = Location::new(&user.id, "Home");
        let work = Location::new(&user.id, "Work");
        store.save_location(&home).unwrap();
        store.save_location(&work).unwrap();

        let mut tag = Tag::new(&user.id, "Errands");
        tag.set_location_ids([work.id.clone(), home.id.clone()]);
        store.save_tag(&tag).unwrap();
        let found = store.find_tag(&tag.id).unwrap().unwrap();
        assert_eq!(found.location_ids, vec![work.id.clone(), home.id.clone()]);

        store.destroy_location(&work.id).unwrap();
        let found = store.find_tag(&tag.id).unwrap().unwrap();
        assert_eq!(found.location_ids, vec![home.id.clone()]);
    }

    #[test]
    fn locations_by_ids_skips_missing() {
        let (store, user) = store_with_user();
        let home = Location::new(&user.id, "Home");
        store.save_location(&home).unwrap();
        let found = store
            .locations_by_ids(&["gone".to_string(), home.id.clone()])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, home.id);
    }

    #[test]
    fn destroy_task_removes_hidden_tag_and_ranges() {
        let (store, user) = store_with_user();
        let task = Task::new(&user.id, "Stretch");
        store.save_task(&task).unwrap();
        let hidden = Tag::hidden_for(&user.id, &task.id);
        store.save_tag(&hidden).unwrap();
        let range = TimeRange::override_for(&user.id, &hidden.id);
        store.save_time_range(&range).unwrap();

        store.destroy_task(&task.id).unwrap();
        assert!(store.find_task(&task.id).unwrap().is_none());
        assert!(store.find_tag(&hidden.id).unwrap().is_none());
        assert!(store.find_time_range(&range.id).unwrap().is_none());
    }

    #[test]
    fn destroy_tag_detaches_tasks() {
        let (store, user) = store_with_user();
        let tag = Tag::new(&user.id, "Work");
        store.save_tag(&tag).unwrap();
        let task = Task::new(&user.id, "Expenses").with_tag(&tag.id);
        store.save_task(&task).unwrap();

        store.destroy_tag(&tag.id).unwrap();
        let task = store.find_task(&task.id).unwrap().unwrap();
        assert!(task.tag_id.is_none());
    }

    #[test]
    fn destroy_user_cascades() {
        let (store, user) = store_with_user();
        let tag = Tag::new(&user.id, "Work");
        store.save_tag(&tag).unwrap();
        store.save_task(&Task::new(&user.id, "Expenses")).unwrap();
        store.save_location(&Location::new(&user.id, "Work")).unwrap();
        store.save_day_range(&DayRange::new(&user.id, "Weekdays")).unwrap();

        store.destroy_user(&user.id).unwrap();
        assert!(store.find_user(&user.id).unwrap().is_none());
        assert!(store.list_tasks(&user.id).unwrap().is_empty());
        assert!(store.visible_tags(&user.id).unwrap().is_empty());
        assert!(store.list_locations(&user.id).unwrap().is_empty());
        assert!(store.visible_day_ranges(&user.id).unwrap().is_empty());
    }

    #[test]
    fn open_at_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DB_FILE);
        let user = User::new("Ada", "Lovelace");
        {
            let store = SqliteStore::open_at(&path).unwrap();
            store.save_user(&user).unwrap();
        }
        let store = SqliteStore::open_at(&path).unwrap();
        assert!(store.find_user(&user.id).unwrap().is_some());
    }
}
