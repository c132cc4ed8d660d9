//! Verified memberships and external members
//!
//! Anything that takes slots locks the chit row first, then checks capacity
//! and writes inside the same transaction.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    ExternalMember, ExternalMemberCreate, ExternalMemberUpdate, MemberRef, Membership,
    MembershipCreate,
};
use shared::util::now_millis;
use sqlx::{PgConnection, PgExecutor, PgPool};

use super::{chits, users};
use crate::error::{ServiceResult, unique_violation};
use crate::settlement::ensure_capacity;
use crate::util::{
    MAX_NAME_LEN, MAX_PHONE_LEN, validate_optional_text, validate_required_text,
    validate_slot_count,
};

const MEMBERSHIP_SELECT: &str = r#"
    SELECT m.id, m.chit_id, m.user_id, u.name AS user_name, u.phone_number AS user_phone,
           m.slot_count, m.is_organizer, m.joined_at
    FROM memberships m
    JOIN users u ON u.id = m.user_id
"#;

const EXTERNAL_COLUMNS: &str =
    "e.id, e.chit_id, e.phone_number, e.name, e.slot_count, e.is_organizer, e.joined_at";

pub async fn list_memberships<'e>(
    db: impl PgExecutor<'e>,
    chit_id: i64,
) -> Result<Vec<Membership>, sqlx::Error> {
    sqlx::query_as(&format!("{MEMBERSHIP_SELECT} WHERE m.chit_id = $1 ORDER BY m.joined_at, m.id"))
        .bind(chit_id)
        .fetch_all(db)
        .await
}

pub async fn list_external<'e>(
    db: impl PgExecutor<'e>,
    chit_id: i64,
) -> Result<Vec<ExternalMember>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {EXTERNAL_COLUMNS} FROM external_members e \
         WHERE e.chit_id = $1 ORDER BY e.joined_at, e.id"
    ))
    .bind(chit_id)
    .fetch_all(db)
    .await
}

/// Whether `member` is a participant of `chit_id`
pub async fn belongs_to_chit<'e>(
    db: impl PgExecutor<'e>,
    chit_id: i64,
    member: MemberRef,
) -> Result<bool, sqlx::Error> {
    let sql = match member {
        MemberRef::Verified(_) => {
            "SELECT EXISTS (SELECT 1 FROM memberships WHERE id = $1 AND chit_id = $2)"
        }
        MemberRef::External(_) => {
            "SELECT EXISTS (SELECT 1 FROM external_members WHERE id = $1 AND chit_id = $2)"
        }
    };
    sqlx::query_scalar(sql)
        .bind(member.id())
        .bind(chit_id)
        .fetch_one(db)
        .await
}

/// Not-found error naming the member's kind
pub fn member_not_found(member: MemberRef) -> AppError {
    let code = match member {
        MemberRef::Verified(_) => ErrorCode::MembershipNotFound,
        MemberRef::External(_) => ErrorCode::ExternalMemberNotFound,
    };
    AppError::new(code).with_detail("member_id", member.id())
}

/// Add a verified user, looked up by phone number, to a chit
pub async fn add_membership(
    pool: &PgPool,
    chit_id: i64,
    organizer_id: i64,
    data: &MembershipCreate,
) -> ServiceResult<Membership> {
    validate_required_text(&data.phone_number, "phone_number", MAX_PHONE_LEN)?;
    validate_slot_count(data.slot_count)?;

    let user = users::find_by_phone(pool, data.phone_number.trim())
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::UserNotFound)
                .with_detail("phone_number", data.phone_number.trim())
        })?;

    let mut tx = pool.begin().await?;
    let chit = chits::lock_owned(&mut tx, chit_id, organizer_id).await?;

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM memberships WHERE chit_id = $1 AND user_id = $2)",
    )
    .bind(chit_id)
    .bind(user.id)
    .fetch_one(&mut *tx)
    .await?;
    if exists {
        return Err(membership_exists(user.id).into());
    }

    let used = chits::used_slots(&mut *tx, chit_id).await?;
    ensure_capacity(chit.total_slots, used, i64::from(data.slot_count))?;

    let inserted = sqlx::query_scalar(
        r#"
        INSERT INTO memberships (chit_id, user_id, slot_count, is_organizer, joined_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(chit_id)
    .bind(user.id)
    .bind(data.slot_count)
    .bind(data.is_organizer)
    .bind(now_millis())
    .fetch_one(&mut *tx)
    .await;

    let membership_id: i64 = match inserted {
        Ok(id) => id,
        Err(e) if unique_violation(&e).is_some() => return Err(membership_exists(user.id).into()),
        Err(e) => return Err(e.into()),
    };

    let membership: Membership = sqlx::query_as(&format!("{MEMBERSHIP_SELECT} WHERE m.id = $1"))
        .bind(membership_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(
        chit_id,
        membership_id,
        user_id = user.id,
        slots = data.slot_count,
        "Member added"
    );
    Ok(membership)
}

/// Add an external (unverified) member to a chit
pub async fn add_external(
    pool: &PgPool,
    chit_id: i64,
    organizer_id: i64,
    data: &ExternalMemberCreate,
) -> ServiceResult<ExternalMember> {
    validate_external_create(data)?;

    let mut tx = pool.begin().await?;
    let chit = chits::lock_owned(&mut tx, chit_id, organizer_id).await?;

    let used = chits::used_slots(&mut *tx, chit_id).await?;
    ensure_capacity(chit.total_slots, used, i64::from(data.slot_count))?;

    let member = insert_external(&mut tx, chit_id, data, now_millis()).await?;
    tx.commit().await?;

    tracing::info!(
        chit_id,
        external_member_id = member.id,
        slots = member.slot_count,
        "External member added"
    );
    Ok(member)
}

pub fn validate_external_create(data: &ExternalMemberCreate) -> Result<(), AppError> {
    validate_required_text(&data.phone_number, "phone_number", MAX_PHONE_LEN)?;
    validate_optional_text(data.name.as_deref(), "name", MAX_NAME_LEN)?;
    validate_slot_count(data.slot_count)
}

/// Insert without any capacity check; callers have done it under the chit lock
pub(crate) async fn insert_external(
    conn: &mut PgConnection,
    chit_id: i64,
    data: &ExternalMemberCreate,
    joined_at: i64,
) -> Result<ExternalMember, sqlx::Error> {
    let name = data
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    sqlx::query_as(&format!(
        r#"
        INSERT INTO external_members AS e
            (chit_id, phone_number, name, slot_count, is_organizer, joined_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {EXTERNAL_COLUMNS}
        "#
    ))
    .bind(chit_id)
    .bind(data.phone_number.trim())
    .bind(name)
    .bind(data.slot_count)
    .bind(data.is_organizer)
    .bind(joined_at)
    .fetch_one(&mut *conn)
    .await
}

/// External members across all chits of an organizer
pub async fn list_external_for_organizer(
    pool: &PgPool,
    organizer_id: i64,
) -> Result<Vec<ExternalMember>, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        SELECT {EXTERNAL_COLUMNS}
        FROM external_members e
        JOIN chits c ON c.id = e.chit_id
        WHERE c.organizer_id = $1
        ORDER BY e.chit_id, e.joined_at, e.id
        "#
    ))
    .bind(organizer_id)
    .fetch_all(pool)
    .await
}

pub async fn find_external_owned<'e>(
    db: impl PgExecutor<'e>,
    member_id: i64,
    organizer_id: i64,
) -> Result<Option<ExternalMember>, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        SELECT {EXTERNAL_COLUMNS}
        FROM external_members e
        JOIN chits c ON c.id = e.chit_id
        WHERE e.id = $1 AND c.organizer_id = $2
        "#
    ))
    .bind(member_id)
    .bind(organizer_id)
    .fetch_optional(db)
    .await
}

pub async fn get_external_owned(
    pool: &PgPool,
    member_id: i64,
    organizer_id: i64,
) -> ServiceResult<ExternalMember> {
    find_external_owned(pool, member_id, organizer_id)
        .await?
        .ok_or_else(|| member_not_found(MemberRef::External(member_id)).into())
}

/// Partial update; growing `slot_count` re-checks capacity under the chit lock
pub async fn update_external(
    pool: &PgPool,
    member_id: i64,
    organizer_id: i64,
    data: &ExternalMemberUpdate,
) -> ServiceResult<ExternalMember> {
    if let Some(phone) = &data.phone_number {
        validate_required_text(phone, "phone_number", MAX_PHONE_LEN)?;
    }
    validate_optional_text(data.name.as_deref(), "name", MAX_NAME_LEN)?;
    if let Some(slots) = data.slot_count {
        validate_slot_count(slots)?;
    }

    let mut tx = pool.begin().await?;
    let current = find_external_owned(&mut *tx, member_id, organizer_id)
        .await?
        .ok_or_else(|| member_not_found(MemberRef::External(member_id)))?;
    let chit = chits::lock_owned(&mut tx, current.chit_id, organizer_id).await?;

    let slot_count = data.slot_count.unwrap_or(current.slot_count);
    if slot_count > current.slot_count {
        let used = chits::used_slots(&mut *tx, chit.id).await?;
        ensure_capacity(chit.total_slots, used, i64::from(slot_count - current.slot_count))?;
    }

    let name = match &data.name {
        Some(n) => Some(n.trim().to_string()).filter(|n| !n.is_empty()),
        None => current.name.clone(),
    };

    let updated: ExternalMember = sqlx::query_as(&format!(
        r#"
        UPDATE external_members AS e
        SET phone_number = $1, name = $2, slot_count = $3, is_organizer = $4
        WHERE e.id = $5
        RETURNING {EXTERNAL_COLUMNS}
        "#
    ))
    .bind(data.phone_number.as_deref().map(str::trim).unwrap_or(&current.phone_number))
    .bind(name)
    .bind(slot_count)
    .bind(data.is_organizer.unwrap_or(current.is_organizer))
    .bind(member_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(chit_id = chit.id, external_member_id = member_id, "External member updated");
    Ok(updated)
}

/// Remove an external member without payments.
///
/// Schedules naming them as lifter fall back to unassigned.
pub async fn delete_external(
    pool: &PgPool,
    member_id: i64,
    organizer_id: i64,
) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;
    let member = find_external_owned(&mut *tx, member_id, organizer_id)
        .await?
        .ok_or_else(|| member_not_found(MemberRef::External(member_id)))?;
    chits::lock_owned(&mut tx, member.chit_id, organizer_id).await?;

    let payment_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE external_member_id = $1")
            .bind(member_id)
            .fetch_one(&mut *tx)
            .await?;
    if payment_count > 0 {
        return Err(AppError::new(ErrorCode::MemberHasPayments)
            .with_detail("payment_count", payment_count)
            .into());
    }

    sqlx::query("DELETE FROM external_members WHERE id = $1")
        .bind(member_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(
        chit_id = member.chit_id,
        external_member_id = member_id,
        "External member removed"
    );
    Ok(())
}

fn membership_exists(user_id: i64) -> AppError {
    AppError::new(ErrorCode::MembershipAlreadyExists).with_detail("user_id", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_code_follows_member_kind() {
        assert_eq!(
            member_not_found(MemberRef::Verified(3)).code,
            ErrorCode::MembershipNotFound
        );
        assert_eq!(
            member_not_found(MemberRef::External(3)).code,
            ErrorCode::ExternalMemberNotFound
        );
    }

    #[test]
    fn external_create_validation() {
        let ok = ExternalMemberCreate {
            phone_number: "+919800000001".into(),
            name: Some("Asha".into()),
            slot_count: 2,
            is_organizer: false,
        };
        assert!(validate_external_create(&ok).is_ok());

        let no_phone = ExternalMemberCreate {
            phone_number: " ".into(),
            ..ok.clone()
        };
        assert!(validate_external_create(&no_phone).is_err());

        let no_slots = ExternalMemberCreate { slot_count: 0, ..ok };
        assert!(validate_external_create(&no_slots).is_err());
    }
}
