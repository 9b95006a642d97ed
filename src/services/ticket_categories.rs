use sqlx::PgPool;
use tracing::info;

use super::Page;
use crate::models::TicketCategory;
use crate::utils::AppError;
use crate::validation::CheckConstraints;

#[derive(Clone)]
pub struct TicketCategoryService {
    pool: PgPool,
}

impl TicketCategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, page: Page) -> Result<Vec<TicketCategory>, AppError> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, description FROM ticket_categories ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, description)| {
                let mut category = TicketCategory::new();
                category.set_id(Some(id));
                category.set_description(description);
                category
            })
            .collect())
    }

    pub async fn create(&self, mut category: TicketCategory) -> Result<TicketCategory, AppError> {
        category.check()?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO ticket_categories (description) VALUES ($1) RETURNING id",
        )
        .bind(category.description())
        .fetch_one(&self.pool)
        .await?;
        category.set_id(Some(id));
        info!(ticket_category_id = id, %category, "Ticket category created");
        Ok(category)
    }

    /// Deletes a category that no price or ticket refers to.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM ticket_categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("ticket category {id}")));
        }
        info!(ticket_category_id = id, "Ticket category deleted");
        Ok(())
    }
}
