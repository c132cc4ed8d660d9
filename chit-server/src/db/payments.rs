//! Payment rows
//!
//! The read model joins the schedule, chit and payer so list endpoints need
//! no follow-up queries.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    BulkPaymentEntry, BulkPaymentResult, MemberRef, Payment, PaymentCreate, PaymentFilter,
    PaymentStatus,
};
use shared::util::now_millis;
use sqlx::{PgConnection, PgExecutor, PgPool};

use super::{chits, ledger, members, schedules};
use crate::error::{ServiceError, ServiceResult};
use crate::settlement::{expected_payments, plan_bulk_update};
use crate::util::validate_amount;

const PAYMENT_SELECT: &str = r#"
    SELECT p.id, p.chit_schedule_id, s.chit_id, c.title AS chit_title, p.month_number,
           p.membership_id, p.external_member_id,
           COALESCE(u.name, e.name, 'Unknown') AS member_name,
           COALESCE(u.phone_number, e.phone_number, '') AS member_phone,
           p.amount_paid, p.status, p.payment_date
    FROM payments p
    JOIN chit_schedules s ON s.id = p.chit_schedule_id
    JOIN chits c ON c.id = s.chit_id
    LEFT JOIN memberships m ON m.id = p.membership_id
    LEFT JOIN users u ON u.id = m.user_id
    LEFT JOIN external_members e ON e.id = p.external_member_id
"#;

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    chit_schedule_id: i64,
    chit_id: i64,
    chit_title: String,
    month_number: i32,
    membership_id: Option<i64>,
    external_member_id: Option<i64>,
    member_name: String,
    member_phone: String,
    amount_paid: Decimal,
    status: String,
    payment_date: i64,
}

impl PaymentRow {
    fn into_payment(self) -> ServiceResult<Payment> {
        let member = MemberRef::from_columns(self.membership_id, self.external_member_id)?
            .ok_or_else(|| ServiceError::Db(format!("payment {} has no member", self.id).into()))?;
        let status = PaymentStatus::from_db(&self.status).ok_or_else(|| {
            let message = format!("payment {} has unknown status {:?}", self.id, self.status);
            ServiceError::Db(message.into())
        })?;

        Ok(Payment {
            id: self.id,
            chit_schedule_id: self.chit_schedule_id,
            chit_id: self.chit_id,
            chit_title: self.chit_title,
            month_number: self.month_number,
            member,
            member_type: member.kind(),
            member_name: self.member_name,
            member_phone: self.member_phone,
            amount_paid: self.amount_paid,
            status,
            payment_date: self.payment_date,
        })
    }
}

fn into_payments(rows: Vec<PaymentRow>) -> ServiceResult<Vec<Payment>> {
    rows.into_iter().map(PaymentRow::into_payment).collect()
}

/// All payments of a chit, ordered by month then id
pub async fn list_for_chit<'e>(
    db: impl PgExecutor<'e>,
    chit_id: i64,
) -> ServiceResult<Vec<Payment>> {
    let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
        "{PAYMENT_SELECT} WHERE s.chit_id = $1 ORDER BY p.month_number, p.id"
    ))
    .bind(chit_id)
    .fetch_all(db)
    .await?;
    into_payments(rows)
}

/// Payments across the organizer's chits, optionally filtered
pub async fn list_for_organizer(
    pool: &PgPool,
    organizer_id: i64,
    filter: &PaymentFilter,
) -> ServiceResult<Vec<Payment>> {
    let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
        r#"
        {PAYMENT_SELECT}
        WHERE c.organizer_id = $1
          AND ($2::BIGINT IS NULL OR c.id = $2)
          AND ($3::INTEGER IS NULL OR p.month_number = $3)
        ORDER BY c.id, p.month_number, p.id
        "#
    ))
    .bind(organizer_id)
    .bind(filter.chit_id)
    .bind(filter.month_number)
    .fetch_all(pool)
    .await?;
    into_payments(rows)
}

pub async fn find_owned<'e>(
    db: impl PgExecutor<'e>,
    payment_id: i64,
    organizer_id: i64,
) -> ServiceResult<Option<Payment>> {
    let row: Option<PaymentRow> = sqlx::query_as(&format!(
        "{PAYMENT_SELECT} WHERE p.id = $1 AND c.organizer_id = $2"
    ))
    .bind(payment_id)
    .bind(organizer_id)
    .fetch_optional(db)
    .await?;
    row.map(PaymentRow::into_payment).transpose()
}

pub async fn get_owned(
    pool: &PgPool,
    payment_id: i64,
    organizer_id: i64,
) -> ServiceResult<Payment> {
    find_owned(pool, payment_id, organizer_id)
        .await?
        .ok_or_else(|| payment_not_found(payment_id).into())
}

/// Payments of one owned chit, optionally for a single month
pub async fn list_for_owned_chit(
    pool: &PgPool,
    chit_id: i64,
    organizer_id: i64,
    month_number: Option<i32>,
) -> ServiceResult<Vec<Payment>> {
    chits::get_owned(pool, chit_id, organizer_id).await?;
    list_for_organizer(
        pool,
        organizer_id,
        &PaymentFilter {
            chit_id: Some(chit_id),
            month_number,
        },
    )
    .await
}

/// Record a payment by hand. The month is taken from the schedule.
pub async fn create(
    pool: &PgPool,
    organizer_id: i64,
    data: &PaymentCreate,
) -> ServiceResult<Payment> {
    let member = data.member()?;
    validate_amount(data.amount_paid, "amount_paid")?;

    let mut tx = pool.begin().await?;
    let schedule = schedules::lock_schedule(&mut tx, data.chit_schedule, organizer_id).await?;

    if !members::belongs_to_chit(&mut *tx, schedule.chit_id, member).await? {
        return Err(members::member_not_found(member).into());
    }

    let payment_id = insert(
        &mut tx,
        schedule.id,
        schedule.month_number,
        member,
        data.amount_paid,
        data.status,
    )
    .await?
    .ok_or_else(|| {
        AppError::new(ErrorCode::PaymentAlreadyExists)
            .with_detail("chit_schedule", schedule.id)
            .with_detail("member_id", member.id())
    })?;

    let payment = find_owned(&mut *tx, payment_id, organizer_id)
        .await?
        .ok_or_else(|| payment_not_found(payment_id))?;
    tx.commit().await?;

    tracing::info!(
        payment_id,
        schedule_id = schedule.id,
        chit_id = schedule.chit_id,
        amount = %payment.amount_paid,
        "Payment recorded"
    );
    Ok(payment)
}

pub async fn update_status(
    pool: &PgPool,
    payment_id: i64,
    organizer_id: i64,
    status: PaymentStatus,
) -> ServiceResult<Payment> {
    let result = sqlx::query(
        r#"
        UPDATE payments p SET status = $1
        FROM chit_schedules s, chits c
        WHERE p.id = $2 AND s.id = p.chit_schedule_id AND c.id = s.chit_id AND c.organizer_id = $3
        "#,
    )
    .bind(status.as_db())
    .bind(payment_id)
    .bind(organizer_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(payment_not_found(payment_id).into());
    }
    tracing::info!(payment_id, status = status.as_db(), "Payment status updated");
    get_owned(pool, payment_id, organizer_id).await
}

/// Create the expected payment of every participant that has none yet for
/// this schedule. Existing rows are never touched; returns only new rows.
pub async fn generate_for_schedule(
    pool: &PgPool,
    schedule_id: i64,
    organizer_id: i64,
) -> ServiceResult<Vec<Payment>> {
    let mut tx = pool.begin().await?;
    let schedule = schedules::lock_schedule(&mut tx, schedule_id, organizer_id).await?;
    let chit = chits::find_owned(&mut *tx, schedule.chit_id, organizer_id)
        .await?
        .ok_or_else(|| chits::chit_not_found(schedule.chit_id))?;
    let snapshot = ledger::load(&mut tx, chit).await?;

    let mut created = Vec::new();
    for expected in expected_payments(&snapshot, &schedule) {
        if let Some(id) = insert(
            &mut tx,
            schedule.id,
            schedule.month_number,
            expected.member,
            expected.amount_paid,
            PaymentStatus::Pending,
        )
        .await?
        {
            created.push(id);
        }
    }

    let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
        "{PAYMENT_SELECT} WHERE p.id = ANY($1) ORDER BY p.id"
    ))
    .bind(&created)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(
        schedule_id,
        chit_id = schedule.chit_id,
        created = created.len(),
        "Payments generated"
    );
    into_payments(rows)
}

/// Apply valid status updates for one chit in a single transaction and
/// report the invalid ones
pub async fn bulk_update(
    pool: &PgPool,
    chit_id: i64,
    organizer_id: i64,
    entries: &[BulkPaymentEntry],
) -> ServiceResult<BulkPaymentResult> {
    let mut tx = pool.begin().await?;
    let chit = chits::lock_owned(&mut tx, chit_id, organizer_id).await?;
    let snapshot = ledger::load(&mut tx, chit).await?;

    let (updates, errors) = plan_bulk_update(&snapshot, entries);
    for (payment_id, status) in &updates {
        sqlx::query("UPDATE payments SET status = $1 WHERE id = $2")
            .bind(status.as_db())
            .bind(payment_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    let updated_payment_ids: Vec<i64> = updates.iter().map(|(id, _)| *id).collect();
    tracing::info!(
        chit_id,
        updated = updated_payment_ids.len(),
        rejected = errors.len(),
        "Bulk payment update"
    );

    Ok(BulkPaymentResult {
        updated_count: updated_payment_ids.len(),
        updated_payment_ids,
        errors,
    })
}

/// Insert unless the member already has a payment for this schedule.
/// Returns the new id, or `None` when a row already existed (first write wins).
async fn insert(
    conn: &mut PgConnection,
    schedule_id: i64,
    month_number: i32,
    member: MemberRef,
    amount_paid: Decimal,
    status: PaymentStatus,
) -> ServiceResult<Option<i64>> {
    let (membership_id, external_id) = member.columns();
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO payments (chit_schedule_id, membership_id, external_member_id,
                              month_number, amount_paid, status, payment_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT DO NOTHING
        RETURNING id
        "#,
    )
    .bind(schedule_id)
    .bind(membership_id)
    .bind(external_id)
    .bind(month_number)
    .bind(amount_paid)
    .bind(status.as_db())
    .bind(now_millis())
    .fetch_optional(&mut *conn)
    .await?;
    Ok(id)
}

fn payment_not_found(payment_id: i64) -> AppError {
    AppError::new(ErrorCode::PaymentNotFound).with_detail("payment_id", payment_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> PaymentRow {
        PaymentRow {
            id: 7,
            chit_schedule_id: 101,
            chit_id: 1,
            chit_title: "Family pool".into(),
            month_number: 1,
            membership_id: None,
            external_member_id: Some(10),
            member_name: "Unknown".into(),
            member_phone: "+919800000010".into(),
            amount_paid: Decimal::from(200),
            status: "late".into(),
            payment_date: 1_736_899_200_000,
        }
    }

    #[test]
    fn row_becomes_tagged_payment() {
        let payment = row().into_payment().unwrap();
        assert_eq!(payment.member, MemberRef::External(10));
        assert_eq!(payment.member_type, shared::models::MemberKind::External);
        assert_eq!(payment.status, PaymentStatus::Late);
    }

    #[test]
    fn corrupt_rows_are_internal_errors() {
        let orphan = PaymentRow {
            external_member_id: None,
            ..row()
        };
        assert!(matches!(orphan.into_payment(), Err(ServiceError::Db(_))));

        let odd_status = PaymentRow {
            status: "refunded".into(),
            ..row()
        };
        assert!(matches!(odd_status.into_payment(), Err(ServiceError::Db(_))));
    }
}
