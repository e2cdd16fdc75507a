use crate::models::{
    Budget, BudgetLineItem, BudgetTotals, CompanySettings, HardwarePrice, ItemCategory,
    MarginRule, PriceTable, PromobFile, SheetPrice,
};
use sqlx::{PgConnection, PgPool};
use std::time::Duration;
use uuid::Uuid;

const INSERT_TIMEOUT: Duration = Duration::from_secs(30);

/// Look up an uploaded file record
pub async fn get_promob_file(pool: &PgPool, file_id: Uuid) -> Result<Option<PromobFile>, sqlx::Error> {
    sqlx::query_as::<_, PromobFile>(
        r#"
        SELECT id, company_id, project_id, customer_id, environment, storage_path, file_name
        FROM promob_files
        WHERE id = $1
        "#
    )
    .bind(file_id)
    .fetch_optional(pool)
    .await
}

/// Company defaults for margins and material loss
pub async fn get_company_settings(
    pool: &PgPool,
    company_id: Uuid,
) -> Result<Option<CompanySettings>, sqlx::Error> {
    sqlx::query_as::<_, CompanySettings>(
        r#"
        SELECT id, default_margin_sheet, default_margin_hardware, material_loss_pct
        FROM companies
        WHERE id = $1
        "#
    )
    .bind(company_id)
    .fetch_optional(pool)
    .await
}

/// Active price table (newest first when several are flagged active)
pub async fn find_active_price_table(
    pool: &PgPool,
    company_id: Uuid,
) -> Result<Option<PriceTable>, sqlx::Error> {
    sqlx::query_as::<_, PriceTable>(
        r#"
        SELECT id, company_id, name, is_active, created_at
        FROM price_tables
        WHERE company_id = $1
          AND is_active
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#
    )
    .bind(company_id)
    .fetch_optional(pool)
    .await
}

/// Exact (material, thickness) match in a price table
pub async fn find_sheet_price(
    pool: &PgPool,
    price_table_id: Uuid,
    material: &str,
    thickness: &str,
) -> Result<Option<SheetPrice>, sqlx::Error> {
    sqlx::query_as::<_, SheetPrice>(
        r#"
        SELECT id, price_table_id, material, thickness, price_per_m2
        FROM sheet_prices
        WHERE price_table_id = $1
          AND material = $2
          AND thickness = $3
        ORDER BY id
        LIMIT 1
        "#
    )
    .bind(price_table_id)
    .bind(material)
    .bind(thickness)
    .fetch_optional(pool)
    .await
}

/// Exact reference match in a price table
pub async fn find_hardware_price(
    pool: &PgPool,
    price_table_id: Uuid,
    reference: &str,
) -> Result<Option<HardwarePrice>, sqlx::Error> {
    sqlx::query_as::<_, HardwarePrice>(
        r#"
        SELECT id, price_table_id, reference, unit_price
        FROM hardware_prices
        WHERE price_table_id = $1
          AND reference = $2
        ORDER BY id
        LIMIT 1
        "#
    )
    .bind(price_table_id)
    .bind(reference)
    .fetch_optional(pool)
    .await
}

/// Most specific margin rule: environment match first, then the newest
/// environment-agnostic rule. Client-type rules are not applicable here.
pub async fn find_margin_rule(
    pool: &PgPool,
    company_id: Uuid,
    category: ItemCategory,
    environment: &str,
) -> Result<Option<MarginRule>, sqlx::Error> {
    sqlx::query_as::<_, MarginRule>(
        r#"
        SELECT id, company_id, item_type, environment, client_type, margin_pct, created_at
        FROM margin_rules
        WHERE company_id = $1
          AND item_type = $2
          AND (environment = $3 OR environment IS NULL)
          AND client_type IS NULL
        ORDER BY environment IS NULL, created_at DESC, id
        LIMIT 1
        "#
    )
    .bind(company_id)
    .bind(category.as_str())
    .bind(environment)
    .fetch_optional(pool)
    .await
}

/// Insert-or-touch the budget for (project, customer)
pub async fn upsert_budget(
    pool: &PgPool,
    company_id: Uuid,
    project_id: Uuid,
    customer_id: Uuid,
) -> Result<Budget, sqlx::Error> {
    sqlx::query_as::<_, Budget>(
        r#"
        INSERT INTO budgets (id, company_id, project_id, customer_id, total_cost, total_price)
        VALUES ($1, $2, $3, $4, 0, 0)
        ON CONFLICT (project_id, customer_id)
        DO UPDATE SET updated_at = now()
        RETURNING id, company_id, project_id, customer_id, total_cost, total_price,
                  created_at, updated_at
        "#
    )
    .bind(Uuid::new_v4())
    .bind(company_id)
    .bind(project_id)
    .bind(customer_id)
    .fetch_one(pool)
    .await
}

/// Bulk insert of one chunk of line items on the caller's transaction
pub async fn insert_line_items(conn: &mut PgConnection, items: &[BudgetLineItem]) -> Result<u64, sqlx::Error> {
    if items.is_empty() {
        return Ok(0);
    }

    let start_time = std::time::Instant::now();

    let mut query_builder = sqlx::QueryBuilder::new(
        "INSERT INTO budget_items (
            id, budget_id, promob_file_id, environment,
            reference, description, width_mm, height_mm, depth_mm, quantity,
            material, model, thickness, category, area_m2,
            unit_cost, total_cost, unit_price, total_price, no_price,
            created_at
        ) "
    );

    query_builder.push_values(items, |mut b, item| {
        b.push_bind(item.id)
            .push_bind(item.budget_id)
            .push_bind(item.promob_file_id)
            .push_bind(&item.environment)
            .push_bind(&item.reference)
            .push_bind(&item.description)
            .push_bind(item.width_mm.clone())
            .push_bind(item.height_mm.clone())
            .push_bind(item.depth_mm.clone())
            .push_bind(item.quantity)
            .push_bind(&item.material)
            .push_bind(&item.model)
            .push_bind(&item.thickness)
            .push_bind(item.category.as_str())
            .push_bind(item.area_m2.clone())
            .push_bind(item.unit_cost.clone())
            .push_bind(item.total_cost.clone())
            .push_bind(item.unit_price.clone())
            .push_bind(item.total_price.clone())
            .push_bind(item.no_price)
            .push_bind(item.created_at);
    });

    let execute_result = tokio::time::timeout(INSERT_TIMEOUT, query_builder.build().execute(&mut *conn)).await;

    match execute_result {
        Ok(Ok(result)) => {
            tracing::info!(
                "Inserted {} budget items in {:?}",
                result.rows_affected(),
                start_time.elapsed()
            );
            Ok(result.rows_affected())
        }
        Ok(Err(e)) => {
            tracing::error!("Budget item insert failed after {:?}: {:?}", start_time.elapsed(), e);
            Err(e)
        }
        Err(_) => {
            tracing::error!("Budget item insert timed out (>{:?})", INSERT_TIMEOUT);
            Err(sqlx::Error::PoolTimedOut)
        }
    }
}

/// Write the sum over all of the budget's items back into its totals
pub async fn recompute_budget_totals(
    pool: &PgPool,
    budget_id: Uuid,
) -> Result<Option<BudgetTotals>, sqlx::Error> {
    sqlx::query_as::<_, BudgetTotals>(
        r#"
        UPDATE budgets b
        SET total_cost = s.total_cost,
            total_price = s.total_price,
            updated_at = now()
        FROM (
            SELECT coalesce(sum(total_cost), 0) AS total_cost,
                   coalesce(sum(total_price), 0) AS total_price
            FROM budget_items
            WHERE budget_id = $1
        ) s
        WHERE b.id = $1
        RETURNING b.total_cost, b.total_price
        "#
    )
    .bind(budget_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_budget(pool: &PgPool, budget_id: Uuid) -> Result<Option<Budget>, sqlx::Error> {
    sqlx::query_as::<_, Budget>(
        r#"
        SELECT id, company_id, project_id, customer_id, total_cost, total_price,
               created_at, updated_at
        FROM budgets
        WHERE id = $1
        "#
    )
    .bind(budget_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_budget_items(pool: &PgPool, budget_id: Uuid) -> Result<Vec<BudgetLineItem>, sqlx::Error> {
    sqlx::query_as::<_, BudgetLineItem>(
        r#"
        SELECT id, budget_id, promob_file_id, environment,
               reference, description, width_mm, height_mm, depth_mm, quantity,
               material, model, thickness, category, area_m2,
               unit_cost, total_cost, unit_price, total_price, no_price,
               created_at
        FROM budget_items
        WHERE budget_id = $1
        ORDER BY created_at, id
        "#
    )
    .bind(budget_id)
    .fetch_all(pool)
    .await
}
