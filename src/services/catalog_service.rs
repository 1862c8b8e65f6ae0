use crate::{
    error::{ApiError, Result},
    models::catalog::{CreateProductRequest, UpdateProductRequest},
};
use sea_orm::{
    entity::*, query::*, DatabaseConnection, DatabaseTransaction, PaginatorTrait,
    TransactionTrait,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

pub struct CatalogService {
    db: DatabaseConnection,
}

impl CatalogService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Purchasable products, cheapest cadence first
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<entity::products::Model>> {
        let products = entity::products::Entity::find()
            .filter(entity::products::Column::Active.eq(true))
            .order_by_asc(entity::products::Column::WindowType)
            .order_by_asc(entity::products::Column::Code)
            .all(&self.db)
            .await?;

        Ok(products)
    }

    /// Resolve an active product and share-lock it, so its terms cannot
    /// change before the caller's transaction commits
    pub async fn lock_active(
        &self,
        code: &str,
        txn: &DatabaseTransaction,
    ) -> Result<entity::products::Model> {
        entity::products::Entity::find()
            .filter(entity::products::Column::Code.eq(code))
            .filter(entity::products::Column::Active.eq(true))
            .lock_shared()
            .one(txn)
            .await?
            .ok_or_else(|| ApiError::InvalidProduct(format!("Unknown or inactive product: {}", code)))
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<entity::products::Model> {
        validate_day_bounds(request.min_days, request.max_days)?;

        let existing = entity::products::Entity::find()
            .filter(entity::products::Column::Code.eq(request.code.as_str()))
            .count(&self.db)
            .await?;
        if existing > 0 {
            return Err(ApiError::Conflict(format!(
                "Product {} already exists",
                request.code
            )));
        }

        let now = OffsetDateTime::now_utc();
        let product = entity::products::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(request.code),
            label: Set(request.label),
            window_type: Set(request.window_type),
            quantity_per_window: Set(request.quantity_per_window),
            duration_days: Set(request.duration_days),
            credits_cost: Set(request.credits_cost),
            price_per_day_credits: Set(request.price_per_day_credits),
            min_days: Set(request.min_days),
            max_days: Set(request.max_days),
            active: Set(request.active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(product_id = %product.id, "Created catalog product");

        Ok(product)
    }

    /// Edit a product. Pricing and cadence are frozen once a purchase
    /// references the product; purchases keep their own snapshot either way.
    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        code: &str,
        request: UpdateProductRequest,
    ) -> Result<entity::products::Model> {
        // Row lock pairs with the share lock purchases take on the product
        let txn = self.db.begin().await?;
        let product = entity::products::Entity::find()
            .filter(entity::products::Column::Code.eq(code))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Product {} not found", code)))?;

        if request.changes_terms(&product) {
            let references = entity::purchases::Entity::find()
                .filter(entity::purchases::Column::ProductId.eq(product.id))
                .count(&txn)
                .await?;
            if references > 0 {
                return Err(ApiError::Conflict(format!(
                    "Product {} is referenced by {} purchase(s); its price and cadence can no longer change",
                    code, references
                )));
            }
        }

        validate_day_bounds(
            request.min_days.or(product.min_days),
            request.max_days.or(product.max_days),
        )?;

        let mut active: entity::products::ActiveModel = product.into();
        if let Some(label) = request.label {
            active.label = Set(label);
        }
        if let Some(is_active) = request.active {
            active.active = Set(is_active);
        }
        if let Some(window_type) = request.window_type {
            active.window_type = Set(window_type);
        }
        if let Some(quantity) = request.quantity_per_window {
            active.quantity_per_window = Set(quantity);
        }
        if let Some(days) = request.duration_days {
            active.duration_days = Set(days);
        }
        if let Some(cost) = request.credits_cost {
            active.credits_cost = Set(cost);
        }
        if let Some(per_day) = request.price_per_day_credits {
            active.price_per_day_credits = Set(Some(per_day));
        }
        if let Some(min_days) = request.min_days {
            active.min_days = Set(Some(min_days));
        }
        if let Some(max_days) = request.max_days {
            active.max_days = Set(Some(max_days));
        }
        active.updated_at = Set(OffsetDateTime::now_utc());

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(product_id = %updated.id, "Updated catalog product");

        Ok(updated)
    }
}

fn validate_day_bounds(min_days: Option<i32>, max_days: Option<i32>) -> Result<()> {
    if let (Some(min), Some(max)) = (min_days, max_days) {
        if min > max {
            return Err(ApiError::BadRequest(format!(
                "minDays ({}) must not exceed maxDays ({})",
                min, max
            )));
        }
    }
    Ok(())
}
