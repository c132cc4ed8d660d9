//! Lift eligibility

use shared::error::{AppError, ErrorCode};
use shared::models::{ChitSchedule, Eligibility, MemberRef};

const ALREADY_LIFTED: &str = "Member has already lifted in this chit";
const ELIGIBLE: &str = "Eligible to lift";

/// A member may lift iff no schedule of the chit records them as lifter
pub fn check_eligibility(schedules: &[ChitSchedule], member: MemberRef) -> Eligibility {
    let already_lifted = schedules.iter().any(|s| s.lifter == Some(member));
    Eligibility {
        can_lift: !already_lifted,
        reason: if already_lifted { ALREADY_LIFTED } else { ELIGIBLE }.to_string(),
    }
}

/// Assignment-time check for `member` lifting on `target_schedule_id`.
///
/// Re-assigning a schedule's current lifter is allowed (no-op).
pub fn ensure_can_lift(
    schedules: &[ChitSchedule],
    member: MemberRef,
    target_schedule_id: i64,
) -> Result<(), AppError> {
    let lifted_elsewhere = schedules
        .iter()
        .any(|s| s.id != target_schedule_id && s.lifter == Some(member));
    if lifted_elsewhere {
        return Err(AppError::new(ErrorCode::LifterAlreadyAssigned)
            .with_detail("member_id", member.id())
            .with_detail("member_type", member.kind().as_str()));
    }
    Ok(())
}
