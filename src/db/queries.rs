use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::models::{AuthUser, Booking, BookingStatus, Profile, ServiceType, TimeSlot};

// ── Users & sessions ──

pub struct StoredCredentials {
    pub user: AuthUser,
    pub password_hash: String,
}

pub fn create_user(
    conn: &Connection,
    user: &AuthUser,
    password_hash: &str,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, email, full_name, password_hash) VALUES (?1, ?2, ?3, ?4)",
        params![user.id, user.email, user.full_name, password_hash],
    )?;
    Ok(())
}

pub fn email_exists(conn: &Connection, email: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn get_credentials(
    conn: &Connection,
    email: &str,
) -> anyhow::Result<Option<StoredCredentials>> {
    let creds = conn
        .query_row(
            "SELECT id, email, full_name, password_hash FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok(StoredCredentials {
                    user: AuthUser {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        full_name: row.get(2)?,
                    },
                    password_hash: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(creds)
}

pub fn create_auth_session(conn: &Connection, token: &str, user_id: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO auth_sessions (token, user_id) VALUES (?1, ?2)",
        params![token, user_id],
    )?;
    Ok(())
}

pub fn delete_auth_session(conn: &Connection, token: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM auth_sessions WHERE token = ?1", params![token])?;
    Ok(count > 0)
}

pub fn get_user_by_token(conn: &Connection, token: &str) -> anyhow::Result<Option<AuthUser>> {
    let user = conn
        .query_row(
            "SELECT u.id, u.email, u.full_name FROM auth_sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token = ?1",
            params![token],
            |row| {
                Ok(AuthUser {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    full_name: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

// ── Profiles ──

pub fn save_profile(conn: &Connection, profile: &Profile) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO profiles (id, full_name, phone, is_admin) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
           full_name = excluded.full_name,
           phone = excluded.phone,
           is_admin = excluded.is_admin",
        params![profile.id, profile.full_name, profile.phone, profile.is_admin as i32],
    )?;
    Ok(())
}

pub fn set_admin(conn: &Connection, id: &str, is_admin: bool) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE profiles SET is_admin = ?1 WHERE id = ?2",
        params![is_admin as i32, id],
    )?;
    Ok(count > 0)
}

pub fn get_profile(conn: &Connection, id: &str) -> anyhow::Result<Option<Profile>> {
    let profile = conn
        .query_row(
            "SELECT id, full_name, phone, is_admin FROM profiles WHERE id = ?1",
            params![id],
            parse_profile_row,
        )
        .optional()?;
    Ok(profile)
}

pub fn get_profiles(conn: &Connection, ids: &[String]) -> anyhow::Result<Vec<Profile>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = (1..=ids.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT id, full_name, phone, is_admin FROM profiles WHERE id IN ({placeholders})"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(ids.iter()), parse_profile_row)?;

    let mut profiles = vec![];
    for row in rows {
        profiles.push(row?);
    }
    Ok(profiles)
}

fn parse_profile_row(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        full_name: row.get(1)?,
        phone: row.get(2)?,
        is_admin: row.get::<_, i64>(3)? != 0,
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO budgets (id, user_id, date, time, vehicle_brand, vehicle_model, vehicle_year, service_type, message, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            booking.id,
            booking.user_id,
            booking.date.format("%Y-%m-%d").to_string(),
            booking.time.as_str(),
            booking.vehicle_brand,
            booking.vehicle_model,
            booking.vehicle_year,
            booking.service_type.label(),
            booking.message,
            booking.status.as_str(),
            format_timestamp(&booking.created_at),
        ],
    )?;
    Ok(())
}

/// Newest first; optionally restricted to one status.
pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
) -> anyhow::Result<Vec<Booking>> {
    const COLUMNS: &str = "id, user_id, date, time, vehicle_brand, vehicle_model, vehicle_year, service_type, message, status, created_at";

    let mut bookings = vec![];
    match status_filter {
        Some(status) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM budgets WHERE status = ?1 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt.query_map(params![status.as_str()], |row| Ok(parse_booking_row(row)))?;
            for row in rows {
                bookings.push(row??);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM budgets ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt.query_map([], |row| Ok(parse_booking_row(row)))?;
            for row in rows {
                bookings.push(row??);
            }
        }
    }
    Ok(bookings)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn
        .query_row(
            "SELECT id, user_id, date, time, vehicle_brand, vehicle_model, vehicle_year, service_type, message, status, created_at
             FROM budgets WHERE id = ?1",
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE budgets SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let date_str: String = row.get(2)?;
    let time_str: String = row.get(3)?;
    let vehicle_brand: Option<String> = row.get(4)?;
    let vehicle_model: Option<String> = row.get(5)?;
    let vehicle_year: Option<String> = row.get(6)?;
    let service_type: String = row.get(7)?;
    let message: Option<String> = row.get(8)?;
    let status_str: String = row.get(9)?;
    let created_at_str: String = row.get(10)?;

    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid date in booking {id}: {e}"))?;
    let time = TimeSlot::parse(&time_str)
        .ok_or_else(|| anyhow::anyhow!("invalid time slot in booking {id}: {time_str}"))?;
    let status = BookingStatus::parse(&status_str)
        .ok_or_else(|| anyhow::anyhow!("invalid status in booking {id}: {status_str}"))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| anyhow::anyhow!("invalid created_at in booking {id}: {e}"))?
        .with_timezone(&Utc);

    Ok(Booking {
        id,
        user_id,
        date,
        time,
        vehicle_brand: vehicle_brand.unwrap_or_default(),
        vehicle_model: vehicle_model.unwrap_or_default(),
        vehicle_year: vehicle_year.unwrap_or_default(),
        service_type: ServiceType::from(service_type),
        message: message.unwrap_or_default(),
        status,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::Duration;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn booking(id: &str, status: BookingStatus, created_at: DateTime<Utc>) -> Booking {
        Booking {
            id: id.to_string(),
            user_id: "u-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            time: TimeSlot::H10,
            vehicle_brand: "VW".to_string(),
            vehicle_model: "Polo".to_string(),
            vehicle_year: "2023".to_string(),
            service_type: ServiceType::SoundInstallation,
            message: String::new(),
            status,
            created_at,
        }
    }

    #[test]
    fn test_bookings_newest_first() {
        let conn = setup_db();
        let now = Utc::now();
        for (id, age) in [("old", 2), ("new", 0), ("mid", 1)] {
            let created_at = now - Duration::hours(age);
            create_booking(&conn, &booking(id, BookingStatus::Pending, created_at)).unwrap();
        }

        let ids: Vec<String> = get_all_bookings(&conn, None)
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_status_filter() {
        let conn = setup_db();
        let now = Utc::now();
        create_booking(&conn, &booking("a", BookingStatus::Pending, now)).unwrap();
        create_booking(&conn, &booking("b", BookingStatus::Confirmed, now)).unwrap();

        let confirmed = get_all_bookings(&conn, Some(BookingStatus::Confirmed)).unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, "b");
    }

    #[test]
    fn test_booking_roundtrip_keeps_fields() {
        let conn = setup_db();
        let created_at = DateTime::parse_from_rfc3339("2025-06-01T12:00:00.250000Z")
            .unwrap()
            .with_timezone(&Utc);
        let original = booking("x", BookingStatus::Pending, created_at);
        create_booking(&conn, &original).unwrap();

        let loaded = get_booking_by_id(&conn, "x").unwrap().unwrap();
        assert_eq!(loaded, original);
        assert!(get_booking_by_id(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_update_status() {
        let conn = setup_db();
        create_booking(&conn, &booking("x", BookingStatus::Pending, Utc::now())).unwrap();

        assert!(update_booking_status(&conn, "x", BookingStatus::Confirmed).unwrap());
        assert!(!update_booking_status(&conn, "nope", BookingStatus::Confirmed).unwrap());
        let loaded = get_booking_by_id(&conn, "x").unwrap().unwrap();
        assert_eq!(loaded.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_profiles_batch_lookup() {
        let conn = setup_db();
        for (id, name) in [("u-1", "Ana"), ("u-2", "Bruno"), ("u-3", "Carla")] {
            save_profile(
                &conn,
                &Profile {
                    id: id.to_string(),
                    full_name: Some(name.to_string()),
                    phone: None,
                    is_admin: false,
                },
            )
            .unwrap();
        }

        let ids = vec!["u-1".to_string(), "u-3".to_string(), "u-9".to_string()];
        let mut names: Vec<String> = get_profiles(&conn, &ids)
            .unwrap()
            .into_iter()
            .filter_map(|p| p.full_name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Ana", "Carla"]);
        assert!(get_profiles(&conn, &[]).unwrap().is_empty());
    }
}
