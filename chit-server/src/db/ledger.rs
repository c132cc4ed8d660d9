//! Loads [`ChitLedger`] snapshots for the settlement engine

use shared::models::Chit;
use sqlx::{PgConnection, PgPool};

use super::{chits, members, payments, schedules};
use crate::error::ServiceResult;
use crate::settlement::ChitLedger;

/// Members, schedules and payments of `chit`, read on one connection so a
/// caller holding the chit lock sees a consistent snapshot
pub async fn load(conn: &mut PgConnection, chit: Chit) -> ServiceResult<ChitLedger> {
    let memberships = members::list_memberships(&mut *conn, chit.id).await?;
    let external_members = members::list_external(&mut *conn, chit.id).await?;
    let schedules = schedules::list_for_chit(&mut *conn, chit.id).await?;
    let payments = payments::list_for_chit(&mut *conn, chit.id).await?;

    Ok(ChitLedger {
        chit,
        memberships,
        external_members,
        schedules,
        payments,
    })
}

pub async fn load_owned(
    pool: &PgPool,
    chit_id: i64,
    organizer_id: i64,
) -> ServiceResult<ChitLedger> {
    let mut conn = pool.acquire().await?;
    let chit = chits::find_owned(&mut *conn, chit_id, organizer_id)
        .await?
        .ok_or_else(|| chits::chit_not_found(chit_id))?;
    load(&mut conn, chit).await
}

/// One snapshot per chit of the organizer, newest chit first
pub async fn load_all_for_organizer(
    pool: &PgPool,
    organizer_id: i64,
) -> ServiceResult<Vec<ChitLedger>> {
    let mut conn = pool.acquire().await?;
    let owned = chits::list_owned(&mut *conn, organizer_id).await?;

    let mut ledgers = Vec::with_capacity(owned.len());
    for chit in owned {
        ledgers.push(load(&mut conn, chit).await?);
    }
    Ok(ledgers)
}
