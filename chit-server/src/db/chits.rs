//! Chits and their schedule rows
//!
//! Every query is scoped to the organizer: a chit owned by someone else is
//! reported as not found.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{Chit, ChitCreate, ChitDetail, ChitSummary, ChitUpdate};
use shared::util::now_millis;
use sqlx::{PgConnection, PgExecutor, PgPool};

use super::{members, schedules};
use crate::error::ServiceResult;
use crate::settlement::{SlotUsage, default_no_lift_amount, ensure_capacity};
use crate::util::{AT_LEAST_ONE, MAX_NAME_LEN, validate_amount, validate_required_text};

pub(crate) const CHIT_SELECT: &str = r#"
    SELECT c.id, c.organizer_id, u.name AS organizer_name, u.phone_number AS organizer_phone,
           c.title, c.total_slots, c.total_amount, c.lift_amount, c.start_date,
           c.duration_months, c.created_at
    FROM chits c
    JOIN users u ON u.id = c.organizer_id
"#;

/// Chit terms after defaults and partial updates are applied
#[derive(Debug, Clone, Copy)]
struct ChitTerms {
    total_slots: i32,
    total_amount: Decimal,
    lift_amount: Decimal,
    duration_months: i32,
}

impl ChitTerms {
    fn validate(&self) -> Result<(), AppError> {
        if self.total_slots < 1 {
            return Err(AppError::new(ErrorCode::InvalidSlotCount)
                .with_detail("total_slots", AT_LEAST_ONE));
        }
        if self.duration_months < 1 {
            return Err(AppError::new(ErrorCode::InvalidDuration)
                .with_detail("duration_months", AT_LEAST_ONE));
        }
        validate_amount(self.total_amount, "total_amount")?;
        validate_amount(self.lift_amount, "lift_amount")?;
        if self.total_amount <= Decimal::ZERO {
            return Err(AppError::new(ErrorCode::InvalidAmount)
                .with_detail("total_amount", "Ensure this value is greater than 0."));
        }
        if self.lift_amount < Decimal::ZERO || self.lift_amount > self.total_amount {
            return Err(AppError::new(ErrorCode::InvalidAmount)
                .with_detail("lift_amount", "Must be between 0 and total_amount."));
        }
        Ok(())
    }

    fn no_lift_amount(&self) -> Decimal {
        default_no_lift_amount(self.total_amount, self.lift_amount, self.total_slots)
    }
}

pub async fn list_for_organizer(
    pool: &PgPool,
    organizer_id: i64,
) -> Result<Vec<ChitSummary>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT c.id, c.organizer_id, u.name AS organizer_name, u.phone_number AS organizer_phone,
               c.title, c.total_slots, c.total_amount, c.lift_amount, c.start_date,
               c.duration_months, c.created_at,
               (SELECT COUNT(*) FROM memberships m WHERE m.chit_id = c.id)
             + (SELECT COUNT(*) FROM external_members e WHERE e.chit_id = c.id) AS member_count
        FROM chits c
        JOIN users u ON u.id = c.organizer_id
        WHERE c.organizer_id = $1
        ORDER BY c.created_at DESC, c.id DESC
        "#,
    )
    .bind(organizer_id)
    .fetch_all(pool)
    .await
}

/// Plain chit rows of an organizer, newest first
pub async fn list_owned<'e>(
    db: impl PgExecutor<'e>,
    organizer_id: i64,
) -> Result<Vec<Chit>, sqlx::Error> {
    sqlx::query_as(&format!(
        "{CHIT_SELECT} WHERE c.organizer_id = $1 ORDER BY c.created_at DESC, c.id DESC"
    ))
    .bind(organizer_id)
    .fetch_all(db)
    .await
}

pub async fn find_owned<'e>(
    db: impl PgExecutor<'e>,
    chit_id: i64,
    organizer_id: i64,
) -> Result<Option<Chit>, sqlx::Error> {
    sqlx::query_as(&format!("{CHIT_SELECT} WHERE c.id = $1 AND c.organizer_id = $2"))
        .bind(chit_id)
        .bind(organizer_id)
        .fetch_optional(db)
        .await
}

/// Like [`find_owned`] but errors with `ChitNotFound`
pub async fn get_owned(pool: &PgPool, chit_id: i64, organizer_id: i64) -> ServiceResult<Chit> {
    find_owned(pool, chit_id, organizer_id)
        .await?
        .ok_or_else(|| chit_not_found(chit_id).into())
}

/// Lock the chit row for the rest of the transaction.
///
/// Slot capacity and lifter assignment are read-then-write checks; holding
/// this lock serializes them per chit.
pub async fn lock_owned(
    conn: &mut PgConnection,
    chit_id: i64,
    organizer_id: i64,
) -> ServiceResult<Chit> {
    let chit: Option<Chit> = sqlx::query_as(&format!(
        "{CHIT_SELECT} WHERE c.id = $1 AND c.organizer_id = $2 FOR UPDATE OF c"
    ))
    .bind(chit_id)
    .bind(organizer_id)
    .fetch_optional(&mut *conn)
    .await?;
    chit.ok_or_else(|| chit_not_found(chit_id).into())
}

/// Slots held by verified and external members together
pub async fn used_slots<'e>(db: impl PgExecutor<'e>, chit_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT (SELECT COALESCE(SUM(slot_count), 0) FROM memberships WHERE chit_id = $1)
             + (SELECT COALESCE(SUM(slot_count), 0) FROM external_members WHERE chit_id = $1)
        "#,
    )
    .bind(chit_id)
    .fetch_one(db)
    .await
}

/// Chit with members, schedules and slot usage
pub async fn detail(pool: &PgPool, chit_id: i64, organizer_id: i64) -> ServiceResult<ChitDetail> {
    let chit = get_owned(pool, chit_id, organizer_id).await?;
    let memberships = members::list_memberships(pool, chit_id).await?;
    let external_members = members::list_external(pool, chit_id).await?;
    let schedules = schedules::list_for_chit(pool, chit_id).await?;

    let used = memberships
        .iter()
        .map(|m| i64::from(m.slot_count))
        .chain(external_members.iter().map(|m| i64::from(m.slot_count)))
        .sum();
    let usage = SlotUsage::new(chit.total_slots, used);

    Ok(ChitDetail {
        chit,
        used_slots: usage.used_slots,
        available_slots: usage.available_slots,
        memberships,
        external_members,
        schedules,
    })
}

/// Create a chit with its initial external members and one schedule per month
pub async fn create(
    pool: &PgPool,
    organizer_id: i64,
    data: &ChitCreate,
) -> ServiceResult<ChitDetail> {
    validate_required_text(&data.title, "title", MAX_NAME_LEN)?;
    let terms = ChitTerms {
        total_slots: data.total_slots,
        total_amount: data.total_amount,
        lift_amount: data.lift_amount,
        duration_months: data.duration_months,
    };
    terms.validate()?;

    for member in &data.external_members_data {
        members::validate_external_create(member)?;
    }
    let external_slots: i64 = data
        .external_members_data
        .iter()
        .map(|m| i64::from(m.slot_count))
        .sum();
    ensure_capacity(terms.total_slots, 0, external_slots)?;

    let now = now_millis();
    let mut tx = pool.begin().await?;

    let chit_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO chits (organizer_id, title, total_slots, total_amount, lift_amount,
                           start_date, duration_months, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(organizer_id)
    .bind(data.title.trim())
    .bind(terms.total_slots)
    .bind(terms.total_amount)
    .bind(terms.lift_amount)
    .bind(data.start_date)
    .bind(terms.duration_months)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for member in &data.external_members_data {
        members::insert_external(&mut *tx, chit_id, member, now).await?;
    }

    insert_schedules(&mut tx, chit_id, 1..=terms.duration_months, &terms).await?;

    tx.commit().await?;

    tracing::info!(
        chit_id,
        organizer_id,
        months = terms.duration_months,
        external_members = data.external_members_data.len(),
        "Chit created"
    );

    detail(pool, chit_id, organizer_id).await
}

/// Partial update.
///
/// `total_slots` may not drop below the slots already taken. Changing
/// `duration_months` appends missing schedules, or removes trailing ones
/// that have neither a lifter nor payments.
pub async fn update(
    pool: &PgPool,
    chit_id: i64,
    organizer_id: i64,
    data: &ChitUpdate,
) -> ServiceResult<ChitDetail> {
    if let Some(title) = &data.title {
        validate_required_text(title, "title", MAX_NAME_LEN)?;
    }

    let mut tx = pool.begin().await?;
    let chit = lock_owned(&mut tx, chit_id, organizer_id).await?;

    let terms = ChitTerms {
        total_slots: data.total_slots.unwrap_or(chit.total_slots),
        total_amount: data.total_amount.unwrap_or(chit.total_amount),
        lift_amount: data.lift_amount.unwrap_or(chit.lift_amount),
        duration_months: data.duration_months.unwrap_or(chit.duration_months),
    };
    terms.validate()?;

    let used = used_slots(&mut *tx, chit_id).await?;
    if i64::from(terms.total_slots) < used {
        return Err(AppError::with_message(
            ErrorCode::SlotCapacityExceeded,
            format!("total_slots cannot be less than the {used} slot(s) already taken"),
        )
        .with_detail("total_slots", format!("Must be at least {used}."))
        .into());
    }

    if terms.duration_months > chit.duration_months {
        insert_schedules(
            &mut tx,
            chit_id,
            chit.duration_months + 1..=terms.duration_months,
            &terms,
        )
        .await?;
    } else if terms.duration_months < chit.duration_months {
        remove_trailing_schedules(&mut tx, chit_id, terms.duration_months).await?;
    }

    sqlx::query(
        r#"
        UPDATE chits
        SET title = $1, total_slots = $2, total_amount = $3, lift_amount = $4,
            start_date = $5, duration_months = $6
        WHERE id = $7
        "#,
    )
    .bind(data.title.as_deref().map(str::trim).unwrap_or(&chit.title))
    .bind(terms.total_slots)
    .bind(terms.total_amount)
    .bind(terms.lift_amount)
    .bind(data.start_date.unwrap_or(chit.start_date))
    .bind(terms.duration_months)
    .bind(chit_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(chit_id, organizer_id, "Chit updated");

    detail(pool, chit_id, organizer_id).await
}

/// Delete a chit and everything it owns
pub async fn delete(pool: &PgPool, chit_id: i64, organizer_id: i64) -> ServiceResult<()> {
    let result = sqlx::query("DELETE FROM chits WHERE id = $1 AND organizer_id = $2")
        .bind(chit_id)
        .bind(organizer_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(chit_not_found(chit_id).into());
    }
    tracing::info!(chit_id, organizer_id, "Chit deleted");
    Ok(())
}

async fn insert_schedules(
    conn: &mut PgConnection,
    chit_id: i64,
    months: std::ops::RangeInclusive<i32>,
    terms: &ChitTerms,
) -> Result<(), sqlx::Error> {
    let no_lift_amount = terms.no_lift_amount();
    for month_number in months {
        sqlx::query(
            r#"
            INSERT INTO chit_schedules (chit_id, month_number, lift_amount, no_lift_amount)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(chit_id)
        .bind(month_number)
        .bind(terms.lift_amount)
        .bind(no_lift_amount)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn remove_trailing_schedules(
    conn: &mut PgConnection,
    chit_id: i64,
    keep_months: i32,
) -> ServiceResult<()> {
    let blocked: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM chit_schedules s
        WHERE s.chit_id = $1 AND s.month_number > $2
          AND (s.lifted_by_membership IS NOT NULL
               OR s.lifted_by_external IS NOT NULL
               OR EXISTS (SELECT 1 FROM payments p WHERE p.chit_schedule_id = s.id))
        "#,
    )
    .bind(chit_id)
    .bind(keep_months)
    .fetch_one(&mut *conn)
    .await?;

    if blocked > 0 {
        return Err(AppError::new(ErrorCode::DurationShrinkBlocked)
            .with_detail(
                "duration_months",
                format!("{blocked} trailing month(s) have a lifter or payments"),
            )
            .into());
    }

    sqlx::query("DELETE FROM chit_schedules WHERE chit_id = $1 AND month_number > $2")
        .bind(chit_id)
        .bind(keep_months)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) fn chit_not_found(chit_id: i64) -> AppError {
    AppError::new(ErrorCode::ChitNotFound).with_detail("chit_id", chit_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms() -> ChitTerms {
        ChitTerms {
            total_slots: 5,
            total_amount: Decimal::from(500),
            lift_amount: Decimal::from(400),
            duration_months: 5,
        }
    }

    #[test]
    fn valid_terms_pass() {
        assert!(terms().validate().is_ok());
        assert_eq!(terms().no_lift_amount(), Decimal::from(25));
    }

    #[test]
    fn invalid_terms_use_specific_codes() {
        let zero_slots = ChitTerms { total_slots: 0, ..terms() };
        assert_eq!(zero_slots.validate().unwrap_err().code, ErrorCode::InvalidSlotCount);

        let zero_months = ChitTerms { duration_months: 0, ..terms() };
        assert_eq!(zero_months.validate().unwrap_err().code, ErrorCode::InvalidDuration);

        let free_pool = ChitTerms { total_amount: Decimal::ZERO, ..terms() };
        assert_eq!(free_pool.validate().unwrap_err().code, ErrorCode::InvalidAmount);

        let over_lift = ChitTerms { lift_amount: Decimal::from(600), ..terms() };
        let err = over_lift.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAmount);
        assert!(err.details.unwrap().contains_key("lift_amount"));

        let negative_lift = ChitTerms { lift_amount: Decimal::from(-1), ..terms() };
        assert!(negative_lift.validate().is_err());
    }

    #[test]
    fn amounts_must_fit_the_money_column() {
        let fractional = ChitTerms {
            total_amount: "1000.005".parse().unwrap(),
            ..terms()
        };
        let err = fractional.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAmount);
        assert!(err.details.unwrap().contains_key("total_amount"));

        let huge = ChitTerms {
            total_amount: Decimal::from(100_000_000_000_i64),
            ..terms()
        };
        assert_eq!(huge.validate().unwrap_err().code, ErrorCode::InvalidAmount);

        let fractional_lift = ChitTerms {
            lift_amount: "400.004".parse().unwrap(),
            ..terms()
        };
        let err = fractional_lift.validate().unwrap_err();
        assert!(err.details.unwrap().contains_key("lift_amount"));
    }

    #[test]
    fn single_slot_chit_has_zero_contribution() {
        let solo = ChitTerms { total_slots: 1, ..terms() };
        assert_eq!(solo.no_lift_amount(), Decimal::ZERO);
    }
}
