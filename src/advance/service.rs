use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{MySql, MySqlPool, Transaction};
use strum::IntoEnumIterator;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use super::AdvanceKind;
use super::fees::{FeeBreakdown, FeeRule, compute_total};
use super::limits;
use super::status::{DebtEffect, NewHistory, Subaction, initial_history, plan_transition};
use crate::error::{AppError, AppResult};
use crate::model::advance::{
    Actor, Advance, AdvanceHistory, AdvanceStatus, AdvanceTax, PaymentMethod,
};
use crate::service::{company as company_service, debt as debt_service, employee as employee_service, tax as tax_service};
use crate::utils::db_utils::{SqlValue, WhereClause, bind_query_as, bind_query_scalar};
use crate::utils::pagination::Page;

const COLUMNS: &str = "id, employee_id, company_id, company_debt_id, requested_amount, \
    total_amount, status, payment_method, reason, payment_date, payment_term, paid_at, created_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewAdvanceRequest {
    #[schema(example = "100000", value_type = String)]
    pub requested_amount: Decimal,
    pub payment_method: PaymentMethod,
    #[schema(example = "Medical bill")]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AdvanceFilter {
    pub company_id: Option<u64>,
    pub employee_id: Option<u64>,
    pub status: Option<AdvanceStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Requested amount of the employee's advances still open for `payment_date`.
async fn outstanding(
    tx: &mut Transaction<'_, MySql>,
    kind: AdvanceKind,
    employee_id: u64,
    payment_date: NaiveDate,
) -> AppResult<Decimal> {
    let open: Vec<SqlValue> = AdvanceStatus::iter()
        .filter(|s| s.is_outstanding())
        .map(|s| SqlValue::String(s.to_string()))
        .collect();
    let placeholders = vec!["?"; open.len()].join(", ");

    let mut w = WhereClause::default();
    w.and("employee_id = ?", SqlValue::U64(employee_id))
        .and("payment_date = ?", SqlValue::Date(payment_date))
        .and_all(&format!("status IN ({placeholders})"), open);

    let sum = bind_query_scalar(
        sqlx::query_scalar::<_, Decimal>(&format!(
            "SELECT COALESCE(SUM(requested_amount), 0) FROM {}{}",
            kind.table(),
            w.sql()
        )),
        w.values(),
    )
    .fetch_one(&mut **tx)
    .await?;
    Ok(sum)
}

/// Everything written for a new advance apart from the ids the database
/// hands out.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AdvancePlan {
    requested_amount: Decimal,
    status: AdvanceStatus,
    payment_method: PaymentMethod,
    reason: Option<String>,
    payment_date: NaiveDate,
    payment_term: u16,
    fees: FeeBreakdown,
    history: NewHistory,
}

fn plan_request(
    req: &NewAdvanceRequest,
    rules: &[FeeRule],
    today: NaiveDate,
    payment_date: NaiveDate,
    actor_user_id: u64,
) -> AdvancePlan {
    AdvancePlan {
        requested_amount: req.requested_amount,
        status: AdvanceStatus::Requested,
        payment_method: req.payment_method,
        reason: req
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string),
        payment_date,
        payment_term: limits::payment_term(today, payment_date),
        fees: compute_total(req.requested_amount, rules),
        history: initial_history(Some(actor_user_id)),
    }
}

async fn insert_history(
    tx: &mut Transaction<'_, MySql>,
    kind: AdvanceKind,
    advance_id: u64,
    entry: &NewHistory,
) -> AppResult<()> {
    sqlx::query(&format!(
        "INSERT INTO {} (advance_id, status, actor, actor_user_id) VALUES (?, ?, ?, ?)",
        kind.history_table()
    ))
    .bind(advance_id)
    .bind(entry.status.as_ref())
    .bind(entry.actor.as_ref())
    .bind(entry.actor_user_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_fee_lines(
    tx: &mut Transaction<'_, MySql>,
    kind: AdvanceKind,
    advance_id: u64,
    breakdown: &FeeBreakdown,
) -> AppResult<()> {
    for line in &breakdown.lines {
        sqlx::query(&format!(
            "INSERT INTO {} (advance_id, name, kind, rate, amount) VALUES (?, ?, ?, ?, ?)",
            kind.tax_table()
        ))
        .bind(advance_id)
        .bind(&line.name)
        .bind(line.kind.as_ref())
        .bind(line.rate)
        .bind(line.amount)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Validates and records a new advance for `employee_id`, together with its
/// fee snapshot, its first history row and its share of the company debt.
pub async fn request(
    pool: &MySqlPool,
    kind: AdvanceKind,
    employee_id: u64,
    actor_user_id: u64,
    req: &NewAdvanceRequest,
    today: NaiveDate,
) -> AppResult<Advance> {
    let employee = employee_service::get(pool, employee_id).await?;
    let company = company_service::get(pool, employee.company_id).await?;

    if !employee.is_active() {
        return Err(AppError::forbidden("Inactive employees cannot request advances"));
    }
    if !company.is_active {
        return Err(AppError::forbidden("Company is not active"));
    }

    limits::validate_amount(req.requested_amount, &company)?;
    limits::check_request_window(&company, today)?;
    limits::check_destination(&employee, req.payment_method)?;

    let payment_date = kind.payment_date(&company, today);
    let ceiling = kind.ceiling(&employee, &company, today, payment_date);

    let rules =
        tax_service::applicable_rules(pool, company.id, req.payment_method, employee.bank_id)
            .await?;
    let plan = plan_request(req, &rules, today, payment_date, actor_user_id);

    let mut tx = pool.begin().await?;

    // serialises concurrent requests of the same employee until commit
    sqlx::query("SELECT id FROM employees WHERE id = ? FOR UPDATE")
        .bind(employee.id)
        .execute(&mut *tx)
        .await?;
    let open = outstanding(&mut tx, kind, employee.id, payment_date).await?;
    limits::check_ceiling(plan.requested_amount, open, ceiling)?;

    let debt_id = debt_service::add_requested(
        &mut tx,
        company.id,
        plan.payment_date,
        plan.payment_method,
        plan.fees.total_amount,
    )
    .await?;

    let advance_id = sqlx::query(&format!(
        r#"
        INSERT INTO {}
            (employee_id, company_id, company_debt_id, requested_amount, total_amount,
             status, payment_method, reason, payment_date, payment_term)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        kind.table()
    ))
    .bind(employee.id)
    .bind(company.id)
    .bind(debt_id)
    .bind(plan.requested_amount)
    .bind(plan.fees.total_amount)
    .bind(plan.status.as_ref())
    .bind(plan.payment_method.as_ref())
    .bind(plan.reason.as_deref())
    .bind(plan.payment_date)
    .bind(plan.payment_term)
    .execute(&mut *tx)
    .await?
    .last_insert_id();

    insert_fee_lines(&mut tx, kind, advance_id, &plan.fees).await?;
    insert_history(&mut tx, kind, advance_id, &plan.history).await?;

    tx.commit().await?;

    info!(
        advance_id,
        employee_id = employee.id,
        company_id = company.id,
        requested = %req.requested_amount,
        total = %plan.fees.total_amount,
        "{} requested",
        kind.label()
    );

    get(pool, kind, advance_id).await
}

/// Moves an advance to the status `subaction` targets, writing exactly one
/// history row. Nothing is written when the move is not allowed.
pub async fn transition(
    pool: &MySqlPool,
    kind: AdvanceKind,
    advance_id: u64,
    subaction: Subaction,
    actor: Actor,
    actor_user_id: u64,
) -> AppResult<Advance> {
    let current = get(pool, kind, advance_id).await?;
    let plan = plan_transition(current.status, subaction, actor, Some(actor_user_id))?;

    let mut tx = pool.begin().await?;

    // guarded on the status read above so a concurrent change loses cleanly
    let paid_at = if plan.to == AdvanceStatus::Paid {
        ", paid_at = CURRENT_TIMESTAMP"
    } else {
        ""
    };
    let updated = sqlx::query(&format!(
        "UPDATE {} SET status = ?{} WHERE id = ? AND status = ?",
        kind.table(),
        paid_at
    ))
    .bind(plan.to.as_ref())
    .bind(advance_id)
    .bind(plan.from.as_ref())
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        drop(tx);
        let fresh = get(pool, kind, advance_id).await?;
        warn!(advance_id, from = %fresh.status, to = %plan.to, "Lost status race");
        return Err(AppError::InvalidTransition {
            from: fresh.status,
            to: plan.to,
        });
    }

    insert_history(&mut tx, kind, advance_id, &plan.history).await?;

    match plan.to.debt_effect() {
        DebtEffect::RemoveRequested => {
            debt_service::remove_requested(
                &mut tx,
                current.company_debt_id,
                current.payment_method,
                current.total_amount,
            )
            .await?
        }
        DebtEffect::AddPaid => {
            debt_service::add_paid(
                &mut tx,
                current.company_debt_id,
                current.payment_method,
                current.total_amount,
            )
            .await?
        }
        DebtEffect::None => {}
    }

    tx.commit().await?;

    info!(
        advance_id,
        from = %plan.from,
        to = %plan.to,
        actor = %actor,
        actor_user_id,
        "{} status changed",
        kind.label()
    );

    get(pool, kind, advance_id).await
}

pub async fn get(pool: &MySqlPool, kind: AdvanceKind, id: u64) -> AppResult<Advance> {
    sqlx::query_as::<_, Advance>(&format!("SELECT {COLUMNS} FROM {} WHERE id = ?", kind.table()))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", kind.label())))
}

pub async fn list(
    pool: &MySqlPool,
    kind: AdvanceKind,
    filter: &AdvanceFilter,
    page: Page,
) -> AppResult<(Vec<Advance>, i64)> {
    let mut w = WhereClause::default();
    w.and_opt("company_id = ?", filter.company_id)
        .and_opt("employee_id = ?", filter.employee_id)
        .and_opt(
            "status = ?",
            filter.status.map(|s| SqlValue::String(s.as_ref().to_string())),
        );

    let total = bind_query_scalar(
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}{}", kind.table(), w.sql())),
        w.values(),
    )
    .fetch_one(pool)
    .await?;

    let data = bind_query_as(
        sqlx::query_as::<_, Advance>(&format!(
            "SELECT {COLUMNS} FROM {}{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            kind.table(),
            w.sql()
        )),
        w.values(),
    )
    .bind(page.per_page)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok((data, total))
}

pub async fn history(pool: &MySqlPool, kind: AdvanceKind, advance_id: u64) -> AppResult<Vec<AdvanceHistory>> {
    let rows = sqlx::query_as::<_, AdvanceHistory>(&format!(
        "SELECT id, advance_id, status, actor, actor_user_id, created_at FROM {} \
         WHERE advance_id = ? ORDER BY id",
        kind.history_table()
    ))
    .bind(advance_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn taxes(pool: &MySqlPool, kind: AdvanceKind, advance_id: u64) -> AppResult<Vec<AdvanceTax>> {
    let rows = sqlx::query_as::<_, AdvanceTax>(&format!(
        "SELECT id, advance_id, name, kind, rate, amount FROM {} WHERE advance_id = ? ORDER BY id",
        kind.tax_table()
    ))
    .bind(advance_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tax::FeeKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(amount: i64, reason: Option<&str>) -> NewAdvanceRequest {
        NewAdvanceRequest {
            requested_amount: Decimal::from(amount),
            payment_method: PaymentMethod::BankAccount,
            reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn untaxed_request_is_recorded_at_face_value() {
        let plan = plan_request(
            &request(100_000, None),
            &[],
            date(2026, 3, 10),
            date(2026, 3, 31),
            7,
        );

        assert_eq!(plan.status, AdvanceStatus::Requested);
        assert_eq!(plan.fees.total_amount, Decimal::from(100_000));
        assert!(plan.fees.lines.is_empty());
        assert_eq!(plan.payment_term, 21);
        assert_eq!(
            plan.history,
            NewHistory {
                status: AdvanceStatus::Requested,
                actor: Actor::Employee,
                actor_user_id: Some(7),
            }
        );
    }

    #[test]
    fn fee_lines_are_snapshotted_with_the_request() {
        let rules = vec![FeeRule {
            name: "transfer".into(),
            kind: FeeKind::Flat,
            value: Decimal::from(5_000),
        }];
        let plan = plan_request(
            &request(100_000, Some("  Medical bill ")),
            &rules,
            date(2026, 3, 10),
            date(2026, 3, 31),
            7,
        );

        assert_eq!(plan.fees.lines.len(), 1);
        assert_eq!(plan.fees.total_amount, Decimal::from(105_000));
        assert_eq!(plan.reason.as_deref(), Some("Medical bill"));

        let blank = plan_request(
            &request(100_000, Some("   ")),
            &[],
            date(2026, 3, 10),
            date(2026, 3, 31),
            7,
        );
        assert_eq!(blank.reason, None);
    }
}
