//! Monthly schedule rows and lifter assignment
//!
//! Storage keeps the lifter as two nullable foreign keys; everything above
//! this module sees `Option<MemberRef>`.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{ChitSchedule, MemberRef, ScheduleMonthUpdate};
use sqlx::{PgConnection, PgExecutor, PgPool};

use super::{chits, members};
use crate::error::{ServiceResult, unique_violation};
use crate::settlement::ensure_can_lift;
use crate::util::validate_amount;

const SCHEDULE_COLUMNS: &str = "s.id, s.chit_id, s.month_number, s.lift_amount, s.no_lift_amount, \
     s.lifted_by_membership, s.lifted_by_external";

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    id: i64,
    chit_id: i64,
    month_number: i32,
    lift_amount: Decimal,
    no_lift_amount: Decimal,
    lifted_by_membership: Option<i64>,
    lifted_by_external: Option<i64>,
}

impl ScheduleRow {
    fn into_schedule(self) -> Result<ChitSchedule, AppError> {
        Ok(ChitSchedule {
            id: self.id,
            chit_id: self.chit_id,
            month_number: self.month_number,
            lift_amount: self.lift_amount,
            no_lift_amount: self.no_lift_amount,
            lifter: MemberRef::from_columns(self.lifted_by_membership, self.lifted_by_external)?,
        })
    }
}

fn into_schedules(rows: Vec<ScheduleRow>) -> Result<Vec<ChitSchedule>, AppError> {
    rows.into_iter().map(ScheduleRow::into_schedule).collect()
}

pub async fn list_for_chit<'e>(
    db: impl PgExecutor<'e>,
    chit_id: i64,
) -> ServiceResult<Vec<ChitSchedule>> {
    let rows: Vec<ScheduleRow> = sqlx::query_as(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM chit_schedules s \
         WHERE s.chit_id = $1 ORDER BY s.month_number"
    ))
    .bind(chit_id)
    .fetch_all(db)
    .await?;
    Ok(into_schedules(rows)?)
}

/// Schedules of every chit the organizer owns, optionally narrowed to one chit
pub async fn list_for_organizer(
    pool: &PgPool,
    organizer_id: i64,
    chit_id: Option<i64>,
) -> ServiceResult<Vec<ChitSchedule>> {
    let rows: Vec<ScheduleRow> = sqlx::query_as(&format!(
        r#"
        SELECT {SCHEDULE_COLUMNS}
        FROM chit_schedules s
        JOIN chits c ON c.id = s.chit_id
        WHERE c.organizer_id = $1 AND ($2::BIGINT IS NULL OR s.chit_id = $2)
        ORDER BY s.chit_id, s.month_number
        "#
    ))
    .bind(organizer_id)
    .bind(chit_id)
    .fetch_all(pool)
    .await?;
    Ok(into_schedules(rows)?)
}

pub async fn find_owned<'e>(
    db: impl PgExecutor<'e>,
    schedule_id: i64,
    organizer_id: i64,
) -> ServiceResult<Option<ChitSchedule>> {
    let row: Option<ScheduleRow> = sqlx::query_as(&format!(
        r#"
        SELECT {SCHEDULE_COLUMNS}
        FROM chit_schedules s
        JOIN chits c ON c.id = s.chit_id
        WHERE s.id = $1 AND c.organizer_id = $2
        "#
    ))
    .bind(schedule_id)
    .bind(organizer_id)
    .fetch_optional(db)
    .await?;
    Ok(row.map(ScheduleRow::into_schedule).transpose()?)
}

pub async fn get_owned(
    pool: &PgPool,
    schedule_id: i64,
    organizer_id: i64,
) -> ServiceResult<ChitSchedule> {
    find_owned(pool, schedule_id, organizer_id)
        .await?
        .ok_or_else(|| schedule_not_found(schedule_id).into())
}

/// Lock the schedule's chit, then read the schedule under that lock
pub(crate) async fn lock_schedule(
    conn: &mut PgConnection,
    schedule_id: i64,
    organizer_id: i64,
) -> ServiceResult<ChitSchedule> {
    let chit_id: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT s.chit_id FROM chit_schedules s
        JOIN chits c ON c.id = s.chit_id
        WHERE s.id = $1 AND c.organizer_id = $2
        "#,
    )
    .bind(schedule_id)
    .bind(organizer_id)
    .fetch_optional(&mut *conn)
    .await?;
    let chit_id = chit_id.ok_or_else(|| schedule_not_found(schedule_id))?;

    chits::lock_owned(&mut *conn, chit_id, organizer_id).await?;

    find_owned(&mut *conn, schedule_id, organizer_id)
        .await?
        .ok_or_else(|| schedule_not_found(schedule_id).into())
}

/// Edit a month's contribution and/or its lifter
pub async fn update_month(
    pool: &PgPool,
    schedule_id: i64,
    organizer_id: i64,
    data: &ScheduleMonthUpdate,
) -> ServiceResult<ChitSchedule> {
    let lifter = requested_lifter(data)?;
    if let Some(amount) = data.no_lift_amount {
        validate_no_lift_amount(amount)?;
    }

    let mut tx = pool.begin().await?;
    let schedule = lock_schedule(&mut tx, schedule_id, organizer_id).await?;

    if let Some(amount) = data.no_lift_amount {
        sqlx::query("UPDATE chit_schedules SET no_lift_amount = $1 WHERE id = $2")
            .bind(amount)
            .bind(schedule_id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(lifter) = lifter {
        write_lifter(&mut tx, &schedule, lifter).await?;
    }

    let updated = find_owned(&mut *tx, schedule_id, organizer_id)
        .await?
        .ok_or_else(|| schedule_not_found(schedule_id))?;
    tx.commit().await?;

    tracing::info!(
        schedule_id,
        chit_id = updated.chit_id,
        month = updated.month_number,
        "Schedule month updated"
    );
    Ok(updated)
}

/// Record `member` as the lifter of a schedule.
///
/// Existing payment rows are left untouched; regenerate them explicitly.
pub async fn assign_lifter(
    pool: &PgPool,
    schedule_id: i64,
    organizer_id: i64,
    member: MemberRef,
) -> ServiceResult<ChitSchedule> {
    let mut tx = pool.begin().await?;
    let mut schedule = lock_schedule(&mut tx, schedule_id, organizer_id).await?;

    write_lifter(&mut tx, &schedule, Some(member)).await?;
    tx.commit().await?;

    tracing::info!(
        schedule_id,
        chit_id = schedule.chit_id,
        member_type = %member.kind(),
        member_id = member.id(),
        "Lifter assigned"
    );
    schedule.lifter = Some(member);
    Ok(schedule)
}

/// Caller holds the chit lock
async fn write_lifter(
    conn: &mut PgConnection,
    schedule: &ChitSchedule,
    lifter: Option<MemberRef>,
) -> ServiceResult<()> {
    if schedule.lifter == lifter {
        return Ok(());
    }

    if let Some(member) = lifter {
        if !members::belongs_to_chit(&mut *conn, schedule.chit_id, member).await? {
            return Err(members::member_not_found(member).into());
        }
        let schedules = list_for_chit(&mut *conn, schedule.chit_id).await?;
        ensure_can_lift(&schedules, member, schedule.id)?;
    }

    let (membership_id, external_id) = lifter.map(|m| m.columns()).unwrap_or((None, None));
    let result = sqlx::query(
        "UPDATE chit_schedules SET lifted_by_membership = $1, lifted_by_external = $2 \
         WHERE id = $3",
    )
    .bind(membership_id)
    .bind(external_id)
    .bind(schedule.id)
    .execute(&mut *conn)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if unique_violation(&e).is_some() => {
            Err(AppError::new(ErrorCode::LifterAlreadyAssigned).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Lifter change requested by an update-month body.
///
/// `None` leaves the lifter unchanged, `Some(None)` clears it.
fn requested_lifter(data: &ScheduleMonthUpdate) -> Result<Option<Option<MemberRef>>, AppError> {
    match (data.lifted_by_membership, data.lifted_by_external) {
        (Some(Some(_)), Some(Some(_))) => Err(AppError::new(ErrorCode::DualLifterAssignment)
            .with_detail("lifted_by_external", ErrorCode::DualLifterAssignment.message())),
        (Some(Some(id)), _) => Ok(Some(Some(MemberRef::Verified(id)))),
        (_, Some(Some(id))) => Ok(Some(Some(MemberRef::External(id)))),
        (Some(None), _) | (_, Some(None)) => Ok(Some(None)),
        (None, None) => Ok(None),
    }
}

fn validate_no_lift_amount(amount: Decimal) -> Result<(), AppError> {
    validate_amount(amount, "no_lift_amount")?;
    if amount < Decimal::ZERO {
        return Err(AppError::new(ErrorCode::InvalidAmount)
            .with_detail("no_lift_amount", "Ensure this value is greater than or equal to 0."));
    }
    Ok(())
}

pub(crate) fn schedule_not_found(schedule_id: i64) -> AppError {
    AppError::new(ErrorCode::ScheduleNotFound).with_detail("schedule_id", schedule_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(membership: Option<Option<i64>>, external: Option<Option<i64>>) -> ScheduleMonthUpdate {
        ScheduleMonthUpdate {
            no_lift_amount: None,
            lifted_by_membership: membership,
            lifted_by_external: external,
        }
    }

    #[test]
    fn no_lift_amount_validation() {
        assert!(validate_no_lift_amount(Decimal::ZERO).is_ok());
        assert!(validate_no_lift_amount("33.33".parse().unwrap()).is_ok());

        let err = validate_no_lift_amount(Decimal::from(-1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAmount);

        let err = validate_no_lift_amount("33.333".parse().unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAmount);
        assert!(err.details.unwrap().contains_key("no_lift_amount"));

        assert!(validate_no_lift_amount(Decimal::from(10_000_000_000_i64)).is_err());
    }

    #[test]
    fn lifter_change_from_update_body() {
        assert_eq!(requested_lifter(&body(None, None)).unwrap(), None);
        assert_eq!(
            requested_lifter(&body(Some(Some(4)), None)).unwrap(),
            Some(Some(MemberRef::Verified(4)))
        );
        assert_eq!(
            requested_lifter(&body(Some(None), Some(Some(9)))).unwrap(),
            Some(Some(MemberRef::External(9)))
        );
        assert_eq!(requested_lifter(&body(Some(None), None)).unwrap(), Some(None));
    }

    #[test]
    fn both_lifters_rejected() {
        let err = requested_lifter(&body(Some(Some(1)), Some(Some(2)))).unwrap_err();
        assert_eq!(err.code, ErrorCode::DualLifterAssignment);
        assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn row_with_both_lifter_columns_is_rejected() {
        let row = ScheduleRow {
            id: 1,
            chit_id: 1,
            month_number: 1,
            lift_amount: Decimal::from(400),
            no_lift_amount: Decimal::from(25),
            lifted_by_membership: Some(1),
            lifted_by_external: Some(2),
        };
        assert!(row.into_schedule().is_err());
    }
}
