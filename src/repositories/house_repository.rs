use async_trait::async_trait;

use crate::{
    db::DbPool,
    error::AppError,
    models::house::{House, NewHouse},
    repositories::HouseRepository,
};

/// [`HouseRepository`] backed by the `houses` table.
#[derive(Debug, Clone)]
pub struct PgHouseRepository {
    pool: DbPool,
}

impl PgHouseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HouseRepository for PgHouseRepository {
    async fn list(&self) -> Result<Vec<House>, AppError> {
        let houses = sqlx::query_as::<_, House>("SELECT * FROM houses ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(houses)
    }

    async fn get(&self, id: i64) -> Result<Option<House>, AppError> {
        let house = sqlx::query_as::<_, House>("SELECT * FROM houses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(house)
    }

    async fn create(&self, house: NewHouse) -> Result<House, AppError> {
        let house = sqlx::query_as::<_, House>(
            r#"
            INSERT INTO houses (
                name,
                city_name,
                address,
                price,
                type_rent,
                amenities,
                bedroom,
                bathroom,
                description,
                area,
                image
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(house.name)
        .bind(house.city_name)
        .bind(house.address)
        .bind(house.price)
        .bind(house.type_rent)
        .bind(house.amenities)
        .bind(house.bedroom)
        .bind(house.bathroom)
        .bind(house.description)
        .bind(house.area)
        .bind(house.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(house)
    }

    async fn update(&self, house: &House) -> Result<House, AppError> {
        let updated = sqlx::query_as::<_, House>(
            r#"
            UPDATE houses
            SET name = $2,
                city_name = $3,
                address = $4,
                price = $5,
                type_rent = $6,
                amenities = $7,
                bedroom = $8,
                bathroom = $9,
                description = $10,
                area = $11,
                image = $12,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(house.id)
        .bind(&house.name)
        .bind(&house.city_name)
        .bind(&house.address)
        .bind(house.price)
        .bind(&house.type_rent)
        .bind(&house.amenities)
        .bind(house.bedroom)
        .bind(house.bathroom)
        .bind(&house.description)
        .bind(&house.area)
        .bind(&house.image)
        .fetch_optional(&self.pool)
        .await?
        // Deleted between the handler's read and this write
        .ok_or(AppError::HouseNotFound)?;

        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<Option<House>, AppError> {
        let house = sqlx::query_as::<_, House>("DELETE FROM houses WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(house)
    }
}
