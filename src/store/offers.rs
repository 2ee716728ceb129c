use async_trait::async_trait;
use chrono::NaiveDate;
use tokio_postgres::types::Json;
use uuid::Uuid;

use super::error::Result;
use super::pg::{param_refs, row_to_offer, rows_to_offers, DynParams, PgStore, OFFER_COLUMNS};
use super::{like_pattern, non_negative, OfferRepository};
use crate::models::{Offer, OfferRecord, OfferStatus};

#[async_trait]
impl OfferRepository for PgStore {
    async fn insert(&self, offer: &Offer, user_id: &str, id: Option<Uuid>) -> Result<OfferRecord> {
        let id = id.unwrap_or_else(Uuid::new_v4);
        let conn = self.pool().get().await?;

        let query = format!(
            "INSERT INTO offers (id, user_id, customer_name, phone_number, address, customer_email,
                task_description, bill_of_materials, time, resource, status, price,
                project_start, materials_ordered)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {}",
            OFFER_COLUMNS
        );

        let row = conn
            .query_one(
                &query,
                &[
                    &id,
                    &user_id,
                    &offer.customer_name,
                    &offer.phone_number,
                    &offer.address,
                    &offer.customer_email,
                    &offer.task_description,
                    &Json(&offer.bill_of_materials),
                    &offer.time,
                    &offer.resource,
                    &offer.status.as_str(),
                    &Json(&offer.price),
                    &offer.project_start,
                    &offer.materials_ordered,
                ],
            )
            .await?;

        tracing::debug!(offer_id = %id, user_id, "offer inserted");
        row_to_offer(&row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<OfferRecord>> {
        let conn = self.pool().get().await?;
        let query = format!("SELECT {} FROM offers WHERE id = $1", OFFER_COLUMNS);

        match conn.query_opt(&query, &[&id]).await? {
            Some(row) => Ok(Some(row_to_offer(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<OfferRecord>> {
        let conn = self.pool().get().await?;
        let query = format!(
            "SELECT {} FROM offers ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            OFFER_COLUMNS
        );

        let rows = conn
            .query(&query, &[&non_negative(limit), &non_negative(offset)])
            .await?;
        rows_to_offers(&rows)
    }

    async fn list_by_customer(&self, name: &str) -> Result<Vec<OfferRecord>> {
        let conn = self.pool().get().await?;
        let query = format!(
            "SELECT {} FROM offers WHERE customer_name ILIKE $1 ORDER BY created_at DESC",
            OFFER_COLUMNS
        );

        let rows = conn.query(&query, &[&like_pattern(name)]).await?;
        rows_to_offers(&rows)
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<Vec<OfferRecord>> {
        let mut conditions = vec!["user_id = $1".to_string()];
        let mut params: DynParams = vec![Box::new(user_id.to_string())];

        if let Some(month) = month {
            params.push(Box::new(month as i32));
            conditions.push(format!("EXTRACT(MONTH FROM created_at)::int = ${}", params.len()));
        }
        if let Some(year) = year {
            params.push(Box::new(year));
            conditions.push(format!("EXTRACT(YEAR FROM created_at)::int = ${}", params.len()));
        }

        let query = format!(
            "SELECT {} FROM offers WHERE {} ORDER BY created_at DESC",
            OFFER_COLUMNS,
            conditions.join(" AND ")
        );

        let conn = self.pool().get().await?;
        let rows = conn.query(&query, &param_refs(&params)).await?;
        rows_to_offers(&rows)
    }

    async fn list_by_project_start(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OfferRecord>> {
        let conn = self.pool().get().await?;
        let query = format!(
            "SELECT {} FROM offers
             WHERE user_id = $1 AND project_start >= $2 AND project_start <= $3
             ORDER BY project_start DESC",
            OFFER_COLUMNS
        );

        let rows = conn.query(&query, &[&user_id, &start, &end]).await?;
        rows_to_offers(&rows)
    }

    async fn search(&self, user_id: &str, term: &str, limit: i64) -> Result<Vec<OfferRecord>> {
        let conn = self.pool().get().await?;
        let query = format!(
            "SELECT {} FROM offers
             WHERE user_id = $1
               AND (customer_name ILIKE $2 OR phone_number ILIKE $2
                    OR address ILIKE $2 OR task_description ILIKE $2)
             ORDER BY created_at DESC
             LIMIT $3",
            OFFER_COLUMNS
        );

        let rows = conn
            .query(&query, &[&user_id, &like_pattern(term), &non_negative(limit)])
            .await?;
        rows_to_offers(&rows)
    }

    async fn update(&self, id: Uuid, offer: &Offer, user_id: &str) -> Result<bool> {
        let conn = self.pool().get().await?;

        let affected = conn
            .execute(
                "UPDATE offers SET
                    user_id = $2, customer_name = $3, phone_number = $4, address = $5,
                    customer_email = $6, task_description = $7, bill_of_materials = $8,
                    time = $9, resource = $10, status = $11, price = $12,
                    project_start = $13, materials_ordered = $14, updated_at = NOW()
                 WHERE id = $1",
                &[
                    &id,
                    &user_id,
                    &offer.customer_name,
                    &offer.phone_number,
                    &offer.address,
                    &offer.customer_email,
                    &offer.task_description,
                    &Json(&offer.bill_of_materials),
                    &offer.time,
                    &offer.resource,
                    &offer.status.as_str(),
                    &Json(&offer.price),
                    &offer.project_start,
                    &offer.materials_ordered,
                ],
            )
            .await?;

        Ok(affected > 0)
    }

    async fn set_status(&self, id: Uuid, status: OfferStatus) -> Result<Option<OfferStatus>> {
        let conn = self.pool().get().await?;
        let row = conn
            .query_opt(
                "UPDATE offers SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING id",
                &[&id, &status.as_str()],
            )
            .await?;

        Ok(row.map(|_| status))
    }

    async fn toggle_materials_ordered(&self, id: Uuid) -> Result<Option<bool>> {
        let conn = self.pool().get().await?;
        let row = conn
            .query_opt(
                "UPDATE offers SET materials_ordered = NOT materials_ordered, updated_at = NOW()
                 WHERE id = $1
                 RETURNING materials_ordered",
                &[&id],
            )
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("materials_ordered")?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let conn = self.pool().get().await?;
        let affected = conn
            .execute("DELETE FROM offers WHERE id = $1", &[&id])
            .await?;
        Ok(affected > 0)
    }

    async fn count(&self) -> Result<i64> {
        let conn = self.pool().get().await?;
        let row = conn.query_one("SELECT COUNT(*) AS total FROM offers", &[]).await?;
        Ok(row.try_get("total")?)
    }
}
