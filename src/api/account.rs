use super::helper;
use super::helper::BearerToken;
use crate::AppState;
use crate::errors::{BootstrapError, SeedDomain};
use crate::model::account::{
    NewAchievementProgress, NewLevelStreak, NewMissionProgress, NewQuizProgress, NewUser,
};
use crate::payloads::account::{ForgotPasswordForm, ResetPasswordForm, SignInForm, SignUpForm};
use crate::response::FormRedirect;
use crate::schema::{
    achievements::dsl as achievements_dsl, level_streaks::dsl as streaks_dsl,
    missions::dsl as missions_dsl, quiz_levels::dsl as levels_dsl,
    quiz_questions::dsl as questions_dsl, user_achievement_progress::dsl as uap_dsl,
    user_mission_progress::dsl as ump_dsl, user_quiz_progress::dsl as uqp_dsl,
    users::dsl as users_dsl,
};
use axum::extract::{Form, State};
use axum::response::{IntoResponse, Response};
use diesel::prelude::*;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

const SIGN_UP_VIEW: &str = "/sign-up";
const SIGN_IN_VIEW: &str = "/sign-in";
const FORGOT_PASSWORD_VIEW: &str = "/forgot-password";
const RESET_PASSWORD_VIEW: &str = "/reset-password";
const HOME_VIEW: &str = "/home";

/// Response header carrying the session token issued by the identity
/// service on a successful sign-in.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Creates an identity record, the profile row and the full per-domain
/// progress set for a new user.
///
/// Request Body: `SignUpForm` (urlencoded)
///
/// Returns
/// * `303` to `/home` on full success.
/// * `303` back to `/sign-up` with `?error=<message>` identifying the failed
///   step otherwise. No step rolls back a previous step's writes.
#[instrument(skip(state, form))]
pub async fn sign_up(State(state): State<AppState>, Form(form): Form<SignUpForm>) -> FormRedirect {
    let email = form.email.trim().to_string();
    let username = form.username.trim().to_string();

    if email.is_empty() || username.is_empty() || form.password.is_empty() {
        warn!("Signup rejected: missing required fields");
        return FormRedirect::error(SIGN_UP_VIEW, "Email, username and password are required");
    }

    info!("Attempting signup for email: {}", email);

    match bootstrap_account(&state, email, username, form.password).await {
        Ok(user_id) => {
            info!("Signup bootstrap complete for user {}", user_id);
            FormRedirect::to(HOME_VIEW)
        }
        Err(err) => {
            error!("Signup bootstrap failed: {:?}", err);
            FormRedirect::error(SIGN_UP_VIEW, err.to_string())
        }
    }
}

/// The bootstrap sequence: identity record, then profile row, then the four
/// read-then-fan-out seeding steps. Each step is gated on the previous one
/// succeeding and nothing is compensated on failure.
async fn bootstrap_account(
    state: &AppState,
    email: String,
    username: String,
    password: String,
) -> Result<Uuid, BootstrapError> {
    let identity = state.identity.sign_up(&email, &password).await?;
    let user_id = identity.id;
    info!("Identity record {} created, inserting profile row", user_id);

    let new_user = NewUser::bootstrap(user_id, username, email);
    helper::run_query(&state.pool, move |conn| {
        diesel::insert_into(users_dsl::users)
            .values(&new_user)
            .execute(conn)
    })
    .await
    .map_err(BootstrapError::ProfileCreation)?;

    seed_quiz_progress(state, user_id).await?;
    seed_mission_progress(state, user_id).await?;
    seed_achievement_progress(state, user_id).await?;
    seed_level_streaks(state, user_id).await?;

    Ok(user_id)
}

/// One quiz-progress row per question in the catalog. An empty catalog
/// seeds nothing and is not an error.
async fn seed_quiz_progress(state: &AppState, user_id: Uuid) -> Result<(), BootstrapError> {
    let questions = helper::run_query(&state.pool, |conn| {
        questions_dsl::quiz_questions
            .select((questions_dsl::id, questions_dsl::level_id))
            .load::<(Uuid, Uuid)>(conn)
    })
    .await
    .map_err(|source| BootstrapError::CatalogRead {
        domain: SeedDomain::QuizProgress,
        source,
    })?;

    if questions.is_empty() {
        info!("Question catalog is empty, no quiz progress to seed");
        return Ok(());
    }

    let rows: Vec<NewQuizProgress> = questions
        .into_iter()
        .map(|(question_id, level_id)| NewQuizProgress {
            id: Uuid::new_v4(),
            user_id,
            level_id,
            question_id,
            is_completed: false,
        })
        .collect();

    let inserted = helper::run_query(&state.pool, move |conn| {
        diesel::insert_into(uqp_dsl::user_quiz_progress)
            .values(&rows)
            .on_conflict((uqp_dsl::user_id, uqp_dsl::question_id))
            .do_nothing()
            .execute(conn)
    })
    .await
    .map_err(|source| BootstrapError::ProgressSeed {
        domain: SeedDomain::QuizProgress,
        source,
    })?;

    info!("Seeded {} quiz progress rows for user {}", inserted, user_id);
    Ok(())
}

/// One mission-progress row per mission, snapshotting the mission's current
/// requirement and reward values at level 1.
async fn seed_mission_progress(state: &AppState, user_id: Uuid) -> Result<(), BootstrapError> {
    let missions = helper::run_query(&state.pool, |conn| {
        missions_dsl::missions
            .select((
                missions_dsl::id,
                missions_dsl::level_requirement,
                missions_dsl::xp_reward,
                missions_dsl::points_reward,
            ))
            .load::<(Uuid, i32, i32, i32)>(conn)
    })
    .await
    .map_err(|source| BootstrapError::CatalogRead {
        domain: SeedDomain::MissionProgress,
        source,
    })?;

    if missions.is_empty() {
        info!("Mission catalog is empty, no mission progress to seed");
        return Ok(());
    }

    let rows: Vec<NewMissionProgress> = missions
        .into_iter()
        .map(
            |(mission_id, level_requirement, xp_reward, points_reward)| NewMissionProgress {
                id: Uuid::new_v4(),
                user_id,
                mission_id,
                progress_point: 0,
                current_level: 1,
                current_level_requirement: level_requirement,
                current_xp_reward: xp_reward,
                current_points_reward: points_reward,
                last_completed_at: None,
            },
        )
        .collect();

    let inserted = helper::run_query(&state.pool, move |conn| {
        diesel::insert_into(ump_dsl::user_mission_progress)
            .values(&rows)
            .on_conflict((ump_dsl::user_id, ump_dsl::mission_id))
            .do_nothing()
            .execute(conn)
    })
    .await
    .map_err(|source| BootstrapError::ProgressSeed {
        domain: SeedDomain::MissionProgress,
        source,
    })?;

    info!(
        "Seeded {} mission progress rows for user {}",
        inserted, user_id
    );
    Ok(())
}

async fn seed_achievement_progress(state: &AppState, user_id: Uuid) -> Result<(), BootstrapError> {
    let achievement_ids = helper::run_query(&state.pool, |conn| {
        achievements_dsl::achievements
            .select(achievements_dsl::id)
            .load::<Uuid>(conn)
    })
    .await
    .map_err(|source| BootstrapError::CatalogRead {
        domain: SeedDomain::AchievementProgress,
        source,
    })?;

    if achievement_ids.is_empty() {
        info!("Achievement catalog is empty, no achievement progress to seed");
        return Ok(());
    }

    let rows: Vec<NewAchievementProgress> = achievement_ids
        .into_iter()
        .map(|achievement_id| NewAchievementProgress {
            id: Uuid::new_v4(),
            user_id,
            achievement_id,
            progress_point: 0,
            last_completed_at: None,
        })
        .collect();

    let inserted = helper::run_query(&state.pool, move |conn| {
        diesel::insert_into(uap_dsl::user_achievement_progress)
            .values(&rows)
            .on_conflict((uap_dsl::user_id, uap_dsl::achievement_id))
            .do_nothing()
            .execute(conn)
    })
    .await
    .map_err(|source| BootstrapError::ProgressSeed {
        domain: SeedDomain::AchievementProgress,
        source,
    })?;

    info!(
        "Seeded {} achievement progress rows for user {}",
        inserted, user_id
    );
    Ok(())
}

async fn seed_level_streaks(state: &AppState, user_id: Uuid) -> Result<(), BootstrapError> {
    let level_ids = helper::run_query(&state.pool, |conn| {
        levels_dsl::quiz_levels
            .select(levels_dsl::id)
            .load::<Uuid>(conn)
    })
    .await
    .map_err(|source| BootstrapError::CatalogRead {
        domain: SeedDomain::LevelStreaks,
        source,
    })?;

    if level_ids.is_empty() {
        info!("Level catalog is empty, no level streaks to seed");
        return Ok(());
    }

    let rows: Vec<NewLevelStreak> = level_ids
        .into_iter()
        .map(|level_id| NewLevelStreak {
            id: Uuid::new_v4(),
            user_id,
            level_id,
            current_streak: 0,
            last_question_id: None,
        })
        .collect();

    let inserted = helper::run_query(&state.pool, move |conn| {
        diesel::insert_into(streaks_dsl::level_streaks)
            .values(&rows)
            .on_conflict((streaks_dsl::user_id, streaks_dsl::level_id))
            .do_nothing()
            .execute(conn)
    })
    .await
    .map_err(|source| BootstrapError::ProgressSeed {
        domain: SeedDomain::LevelStreaks,
        source,
    })?;

    info!("Seeded {} level streak rows for user {}", inserted, user_id);
    Ok(())
}

/// Validates credentials against the identity service and establishes a
/// session.
///
/// Request Body: `SignInForm` (urlencoded)
///
/// Returns
/// * `303` to `/home` with the session token in `x-session-token` on success.
/// * `303` back to `/sign-in` with `?error=<message>` otherwise.
#[instrument(skip(state, form))]
pub async fn sign_in(State(state): State<AppState>, Form(form): Form<SignInForm>) -> Response {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return FormRedirect::error(SIGN_IN_VIEW, "Email and password are required")
            .into_response();
    }

    match state
        .identity
        .sign_in_with_password(email, &form.password)
        .await
    {
        Ok(session) => {
            info!("Sign-in succeeded for user {}", session.identity.id);
            (
                [(SESSION_TOKEN_HEADER, session.access_token)],
                FormRedirect::to(HOME_VIEW),
            )
                .into_response()
        }
        Err(err) => {
            warn!("Sign-in failed for email {}: {}", email, err);
            FormRedirect::error(SIGN_IN_VIEW, err.to_string()).into_response()
        }
    }
}

/// Triggers the identity service's out-of-band password reset email.
///
/// Request Body: `ForgotPasswordForm` (urlencoded)
#[instrument(skip(state, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> FormRedirect {
    let email = form.email.trim();
    if email.is_empty() {
        return FormRedirect::error(FORGOT_PASSWORD_VIEW, "Email is required");
    }

    match state.identity.reset_password_for_email(email).await {
        Ok(()) => match form.callback_url.as_deref() {
            Some(callback_url) if !callback_url.is_empty() => {
                FormRedirect::to(callback_url.to_string())
            }
            _ => FormRedirect::success(
                FORGOT_PASSWORD_VIEW,
                "Check your email for a link to reset your password.",
            ),
        },
        Err(err) => {
            error!("Password reset email failed for {}: {}", email, err);
            FormRedirect::error(FORGOT_PASSWORD_VIEW, "Could not reset password")
        }
    }
}

/// Replaces the caller's credential. The confirmation check runs before
/// anything is sent to the identity service: on a mismatch no mutation is
/// attempted.
///
/// Request Body: `ResetPasswordForm` (urlencoded)
#[instrument(skip(state, token, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Form(form): Form<ResetPasswordForm>,
) -> FormRedirect {
    if form.password.is_empty() || form.confirm_password.is_empty() {
        return FormRedirect::error(
            RESET_PASSWORD_VIEW,
            "Password and confirm password are required",
        );
    }

    if form.password != form.confirm_password {
        warn!("Password reset rejected: confirmation mismatch");
        return FormRedirect::error(RESET_PASSWORD_VIEW, "Passwords do not match");
    }

    let Some(token) = token else {
        return FormRedirect::error(
            RESET_PASSWORD_VIEW,
            "You must be signed in to update your password",
        );
    };

    match state.identity.update_password(&token, &form.password).await {
        Ok(()) => {
            info!("Password updated");
            FormRedirect::success(RESET_PASSWORD_VIEW, "Password updated")
        }
        Err(err) => {
            error!("Password update failed: {}", err);
            FormRedirect::error(RESET_PASSWORD_VIEW, "Password update failed")
        }
    }
}

/// Terminates the session unconditionally. A failing identity-service call
/// is logged and ignored; the caller lands on the sign-in view either way.
#[instrument(skip(state, token))]
pub async fn sign_out(State(state): State<AppState>, BearerToken(token): BearerToken) -> FormRedirect {
    if let Some(token) = token {
        if let Err(err) = state.identity.sign_out(&token).await {
            warn!("Sign-out call failed, redirecting anyway: {}", err);
        }
    }

    FormRedirect::to(SIGN_IN_VIEW)
}
