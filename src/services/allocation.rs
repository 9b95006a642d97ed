//! Хранение сеток занятости мест.
//!
//! One row per (performance, section), created empty on first use. Callers
//! lock the row for the rest of their transaction, so concurrent bookings of
//! the same section queue up behind each other.

use sqlx::types::Json;
use sqlx::PgConnection;

use super::refs::persisted_id;
use crate::models::{Entity, EntityRef, PerformanceKey, SectionAllocation, SectionKey};
use crate::utils::AppError;

/// Loads the allocation of `section` for `performance` and locks it until the
/// surrounding transaction ends.
pub async fn lock(
    conn: &mut PgConnection,
    performance: &EntityRef<PerformanceKey>,
    section: &EntityRef<SectionKey>,
    number_of_rows: i32,
    row_capacity: i32,
) -> Result<SectionAllocation, AppError> {
    let performance_id = persisted_id(performance)?;
    let section_id = persisted_id(section)?;

    let empty = SectionAllocation::new(
        performance.clone(),
        section.clone(),
        number_of_rows,
        row_capacity,
    );
    sqlx::query(
        "INSERT INTO section_allocations (performance_id, section_id, allocated, occupied_count) \
         VALUES ($1, $2, $3, 0) \
         ON CONFLICT (performance_id, section_id) DO NOTHING",
    )
    .bind(performance_id)
    .bind(section_id)
    .bind(Json(empty.allocated()))
    .execute(&mut *conn)
    .await?;

    let (id, Json(allocated)): (i64, Json<Vec<Vec<bool>>>) = sqlx::query_as(
        "SELECT id, allocated FROM section_allocations \
         WHERE performance_id = $1 AND section_id = $2 \
         FOR UPDATE",
    )
    .bind(performance_id)
    .bind(section_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(SectionAllocation::from_parts(
        Some(id),
        performance.clone(),
        section.clone(),
        allocated,
    ))
}

pub async fn save(conn: &mut PgConnection, allocation: &SectionAllocation) -> Result<(), AppError> {
    let id = allocation
        .id()
        .ok_or_else(|| AppError::ReferentialIntegrity("allocation is not persisted".to_string()))?;
    sqlx::query("UPDATE section_allocations SET allocated = $2, occupied_count = $3 WHERE id = $1")
        .bind(id)
        .bind(Json(allocation.allocated()))
        .bind(allocation.occupied_count())
        .execute(conn)
        .await?;
    Ok(())
}
