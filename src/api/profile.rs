use super::helper;
use super::helper::BearerToken;
use crate::AppState;
use crate::errors::AppError;
use crate::identity::Identity;
use crate::model::profile::{
    BEGINNER_ACHIEVEMENT_ID, EXPERT_ACHIEVEMENT_ID, INTERMEDIATE_ACHIEVEMENT_ID, LevelProgress,
    ProfileView, UserRow,
};
use crate::refresh;
use crate::response::ApiResponse;
use crate::schema::{user_achievement_progress::dsl as uap_dsl, users::dsl as users_dsl};
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use chrono::{DateTime, Utc};
use deadpool_diesel::postgres::Pool;
use diesel::prelude::*;
use futures::Stream;
use futures::stream;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// How often an active profile watch re-runs the aggregation.
pub const REFRESH_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Returns the caller's unified profile view.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Some(ProfileView)` for an authenticated caller with a profile (200 OK).
/// * `None` for an unauthenticated caller or a missing profile row (200 OK);
///   no data-store call is made in the unauthenticated case.
/// * `500 Internal Server Error` if any of the aggregation reads fails.
#[instrument(skip(state, token))]
pub async fn get_profile(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<ApiResponse<Option<ProfileView>>, AppError> {
    let Some(identity) = resolve_identity(&state, token.as_deref()).await else {
        info!("Profile requested without a resolvable identity");
        return Ok(ApiResponse::ok(None));
    };

    let view = fetch_profile_view(&state, &identity).await?;
    Ok(ApiResponse::ok(view))
}

/// Streams the caller's profile view as SSE `profile` events, re-running
/// the aggregation every `REFRESH_PERIOD` while the connection is open.
/// A failed cycle keeps the previously streamed state; disconnecting stops
/// the refresh task.
#[instrument(skip(state, token))]
pub async fn watch_profile(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    let Some(identity) = resolve_identity(&state, token.as_deref()).await else {
        return Err(AppError::Unauthorized(
            "A valid session is required to watch the profile".to_string(),
        ));
    };

    info!("Starting profile watch for user {}", identity.id);

    let handle = refresh::spawn_refresh(REFRESH_PERIOD, move || {
        let state = state.clone();
        let identity = identity.clone();
        async move { fetch_profile_view(&state, &identity).await }
    });

    let mut rx = handle.receiver();
    // pick up a view published before this receiver subscribed
    rx.mark_changed();

    let stream = stream::unfold((rx, handle), |(mut rx, handle)| async move {
        loop {
            if rx.changed().await.is_err() {
                return None;
            }
            let view = rx.borrow_and_update().clone();
            if let Some(view) = view {
                let event = Event::default().event("profile").json_data(&view);
                return Some((event, (rx, handle)));
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Resolves the capability behind the bearer token. Absence of a session,
/// an unknown token and an unreachable identity service all collapse to
/// `None` for read paths.
async fn resolve_identity(state: &AppState, token: Option<&str>) -> Option<Identity> {
    let token = token?;
    match state.identity.get_user(token).await {
        Ok(identity) => identity,
        Err(err) => {
            warn!("Identity resolution failed: {}", err);
            None
        }
    }
}

/// One aggregation cycle: four concurrent reads, badge reconciliation with
/// write-back, derived display fields, tolerant rank attachment.
pub(crate) async fn fetch_profile_view(
    state: &AppState,
    identity: &Identity,
) -> Result<Option<ProfileView>, AppError> {
    let user_id = identity.id;

    let user_future = helper::run_query(&state.pool, move |conn| {
        users_dsl::users
            .find(user_id)
            .select((
                users_dsl::email,
                users_dsl::username,
                users_dsl::profile_photo,
                users_dsl::points,
                users_dsl::xp,
                users_dsl::badges1,
                users_dsl::badges2,
                users_dsl::badges3,
                users_dsl::longest_quiz_streak,
            ))
            .first::<UserRow>(conn)
            .optional()
    });

    let (user_row, beginner, intermediate, expert) = tokio::try_join!(
        user_future,
        tier_completion(&state.pool, user_id, BEGINNER_ACHIEVEMENT_ID),
        tier_completion(&state.pool, user_id, INTERMEDIATE_ACHIEVEMENT_ID),
        tier_completion(&state.pool, user_id, EXPERT_ACHIEVEMENT_ID),
    )?;

    let Some(user) = user_row else {
        info!("No profile row for identity {}", user_id);
        return Ok(None);
    };

    let stored = [user.badges1, user.badges2, user.badges3];
    let completed = [
        beginner.is_some(),
        intermediate.is_some(),
        expert.is_some(),
    ];
    let (flags, changed) = reconcile_badges(stored, completed);

    if changed {
        let updated = helper::run_query(&state.pool, move |conn| {
            diesel::update(users_dsl::users.find(user_id))
                .set((
                    users_dsl::badges1.eq(flags[0]),
                    users_dsl::badges2.eq(flags[1]),
                    users_dsl::badges3.eq(flags[2]),
                ))
                .execute(conn)
        })
        .await?;

        if updated != 1 {
            warn!(
                "Badge write-back affected {} rows for user {}",
                updated, user_id
            );
        }
        info!(
            "Upgraded badge flags for user {}: {:?} -> {:?}",
            user_id, stored, flags
        );
    }

    let progress = LevelProgress::from_xp(user.xp);

    let rank = match state.ranking.get_rank(user_id).await {
        Ok(rank) => rank,
        Err(err) => {
            warn!("Rank unavailable for user {}: {}", user_id, err);
            None
        }
    };

    Ok(Some(ProfileView {
        email: user.email,
        username: user.username,
        profile_photo: user.profile_photo,
        points: user.points,
        xp: user.xp,
        badges1: flags[0],
        badges2: flags[1],
        badges3: flags[2],
        longest_quiz_streak: user.longest_quiz_streak,
        level: progress.level,
        xp_in_level: progress.xp_in_level,
        progress_fraction: progress.progress_fraction,
        rank,
    }))
}

/// The completion timestamp of one tier's achievement-progress row, if both
/// the row and the timestamp exist.
async fn tier_completion(
    pool: &Pool,
    user_id: Uuid,
    achievement_id: Uuid,
) -> Result<Option<DateTime<Utc>>, AppError> {
    let completed_at = helper::run_query(pool, move |conn| {
        uap_dsl::user_achievement_progress
            .filter(uap_dsl::user_id.eq(user_id))
            .filter(uap_dsl::achievement_id.eq(achievement_id))
            .select(uap_dsl::last_completed_at)
            .first::<Option<DateTime<Utc>>>(conn)
            .optional()
    })
    .await?;

    Ok(completed_at.flatten())
}

/// Monotonic badge reconciliation: a flag becomes true when its tier is
/// completed and never goes back to false. Returns the new flags and
/// whether anything changed.
fn reconcile_badges(stored: [bool; 3], completed: [bool; 3]) -> ([bool; 3], bool) {
    let next = [
        stored[0] || completed[0],
        stored[1] || completed[1],
        stored[2] || completed[2],
    ];
    (next, next != stored)
}
