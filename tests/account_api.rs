use axum::http::StatusCode;
use axum_test::TestResponse;
use quizquest_server::payloads::account::{
    ForgotPasswordForm, ResetPasswordForm, SignInForm, SignUpForm,
};
use uuid::Uuid;

mod helpers;
use helpers::{
    count_achievement_progress, count_level_streaks, count_mission_progress, count_quiz_progress,
    count_users, create_test_achievement, create_test_level, create_test_mission,
    create_test_question, create_test_user, find_user_id_by_email, get_mission_progress_snapshot,
    get_user_badges, get_user_core_fields, setup_test_environment,
};

fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get("location")
        .expect("redirect should carry a location header")
        .to_str()
        .expect("location header should be valid UTF-8")
        .to_string()
}

// sign_up

#[tokio::test]
async fn test_sign_up_success_seeds_all_progress_domains() {
    let (server, pool, _identity) = setup_test_environment().await;

    let level1 = create_test_level(&pool, "Basics", 1).await;
    let level2 = create_test_level(&pool, "Advanced", 2).await;
    create_test_question(&pool, level1, "What is 2 + 2?").await;
    create_test_question(&pool, level1, "What is 3 * 3?").await;
    create_test_question(&pool, level2, "What is 12 / 4?").await;
    let mission_id = create_test_mission(&pool, "Daily Five", 5, 100, 50).await;
    create_test_mission(&pool, "Weekly Marathon", 20, 500, 250).await;
    create_test_achievement(&pool, Uuid::new_v4(), "First Steps").await;
    create_test_achievement(&pool, Uuid::new_v4(), "Quiz Master").await;

    let payload = SignUpForm {
        email: "newcomer@test.com".to_string(),
        username: "newcomer".to_string(),
        password: "hunter2!".to_string(),
    };

    let response = server.post("/account/sign-up").form(&payload).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/home");

    let user_id = find_user_id_by_email(&pool, "newcomer@test.com")
        .await
        .expect("profile row should exist after signup");

    let (points, xp, longest_streak) = get_user_core_fields(&pool, user_id).await.unwrap();
    assert_eq!(points, 0);
    assert_eq!(xp, 0);
    assert_eq!(longest_streak, 0);
    assert_eq!(get_user_badges(&pool, user_id).await.unwrap(), (false, false, false));

    assert_eq!(count_quiz_progress(&pool, user_id).await, 3);
    assert_eq!(count_mission_progress(&pool, user_id).await, 2);
    assert_eq!(count_achievement_progress(&pool, user_id).await, 2);
    assert_eq!(count_level_streaks(&pool, user_id).await, 2);

    let (progress_point, current_level, requirement, xp_reward, points_reward, completed_at) =
        get_mission_progress_snapshot(&pool, user_id, mission_id)
            .await
            .expect("mission progress row should exist");
    assert_eq!(progress_point, 0);
    assert_eq!(current_level, 1);
    assert_eq!(requirement, 5);
    assert_eq!(xp_reward, 100);
    assert_eq!(points_reward, 50);
    assert!(completed_at.is_none());
}

#[tokio::test]
async fn test_sign_up_with_empty_catalogs_creates_no_progress() {
    let (server, pool, _identity) = setup_test_environment().await;

    let payload = SignUpForm {
        email: "lonely@test.com".to_string(),
        username: "lonely".to_string(),
        password: "hunter2!".to_string(),
    };

    let response = server.post("/account/sign-up").form(&payload).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/home");

    let user_id = find_user_id_by_email(&pool, "lonely@test.com")
        .await
        .expect("profile row should exist after signup");
    assert_eq!(count_quiz_progress(&pool, user_id).await, 0);
    assert_eq!(count_mission_progress(&pool, user_id).await, 0);
    assert_eq!(count_achievement_progress(&pool, user_id).await, 0);
    assert_eq!(count_level_streaks(&pool, user_id).await, 0);
}

#[tokio::test]
async fn test_sign_up_with_empty_mission_catalog_still_succeeds() {
    let (server, pool, _identity) = setup_test_environment().await;

    let level_id = create_test_level(&pool, "Basics", 1).await;
    create_test_question(&pool, level_id, "What is 2 + 2?").await;
    create_test_achievement(&pool, Uuid::new_v4(), "First Steps").await;

    let payload = SignUpForm {
        email: "no_missions@test.com".to_string(),
        username: "no_missions".to_string(),
        password: "hunter2!".to_string(),
    };

    let response = server.post("/account/sign-up").form(&payload).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/home");

    let user_id = find_user_id_by_email(&pool, "no_missions@test.com")
        .await
        .expect("profile row should exist after signup");
    assert_eq!(count_quiz_progress(&pool, user_id).await, 1);
    assert_eq!(count_mission_progress(&pool, user_id).await, 0);
    assert_eq!(count_achievement_progress(&pool, user_id).await, 1);
    assert_eq!(count_level_streaks(&pool, user_id).await, 1);
}

#[tokio::test]
async fn test_sign_up_missing_fields_redirects_without_touching_identity() {
    let (server, pool, identity) = setup_test_environment().await;

    let payload = SignUpForm {
        email: "incomplete@test.com".to_string(),
        username: "   ".to_string(),
        password: "hunter2!".to_string(),
    };

    let response = server.post("/account/sign-up").form(&payload).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    let target = location(&response);
    assert!(target.starts_with("/sign-up?error="));
    assert!(target.contains("required"));

    assert_eq!(identity.sign_up_calls(), 0);
    assert_eq!(count_users(&pool).await, 0);
}

#[tokio::test]
async fn test_sign_up_identity_rejection_surfaces_message_verbatim() {
    let (server, pool, identity) = setup_test_environment().await;
    identity.set_sign_up_failure("User already registered");

    let payload = SignUpForm {
        email: "taken@test.com".to_string(),
        username: "taken".to_string(),
        password: "hunter2!".to_string(),
    };

    let response = server.post("/account/sign-up").form(&payload).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/sign-up?error=User+already+registered"
    );
    assert_eq!(count_users(&pool).await, 0);
}

#[tokio::test]
async fn test_sign_up_duplicate_profile_row_keeps_identity_record() {
    let (server, pool, identity) = setup_test_environment().await;

    // a stale profile row already occupies the id the identity service hands out
    let stale_id = Uuid::new_v4();
    create_test_user(&pool, stale_id, "stale", "stale@test.com", 0, 0).await;
    identity.set_sign_up_id(stale_id);

    let level_id = create_test_level(&pool, "Basics", 1).await;
    create_test_question(&pool, level_id, "What is 2 + 2?").await;

    let payload = SignUpForm {
        email: "fresh@test.com".to_string(),
        username: "fresh".to_string(),
        password: "hunter2!".to_string(),
    };

    let response = server.post("/account/sign-up").form(&payload).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/sign-up?error=Failed+to+create+user+profile"
    );

    // no compensation: the identity record survives the failed bootstrap,
    // and the aborted sequence never reached the seeding steps
    assert!(identity.has_identity("fresh@test.com"));
    assert_eq!(count_quiz_progress(&pool, stale_id).await, 0);
}

// sign_in

#[tokio::test]
async fn test_sign_in_success_redirects_home_with_session_token() {
    let (server, _pool, identity) = setup_test_environment().await;
    identity.register_user("player@test.com", "hunter2!");

    let payload = SignInForm {
        email: "player@test.com".to_string(),
        password: "hunter2!".to_string(),
    };

    let response = server.post("/account/sign-in").form(&payload).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/home");

    let token = response
        .headers()
        .get("x-session-token")
        .expect("session token header should be set")
        .to_str()
        .unwrap()
        .to_string();
    assert!(identity.has_session(&token));
}

#[tokio::test]
async fn test_sign_in_invalid_credentials_redirects_with_error() {
    let (server, _pool, identity) = setup_test_environment().await;
    identity.register_user("player@test.com", "hunter2!");

    let payload = SignInForm {
        email: "player@test.com".to_string(),
        password: "wrong-password".to_string(),
    };

    let response = server.post("/account/sign-in").form(&payload).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/sign-in?error=Invalid+login+credentials"
    );
    assert!(response.headers().get("x-session-token").is_none());
}

// forgot_password

#[tokio::test]
async fn test_forgot_password_success_shows_email_banner() {
    let (server, _pool, identity) = setup_test_environment().await;

    let payload = ForgotPasswordForm {
        email: "player@test.com".to_string(),
        callback_url: None,
    };

    let response = server.post("/account/forgot-password").form(&payload).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    let target = location(&response);
    assert!(target.starts_with("/forgot-password?success="));
    assert!(target.contains("Check+your+email"));
    assert_eq!(identity.reset_email_calls(), 1);
}

#[tokio::test]
async fn test_forgot_password_redirects_to_callback_url() {
    let (server, _pool, identity) = setup_test_environment().await;

    let payload = ForgotPasswordForm {
        email: "player@test.com".to_string(),
        callback_url: Some("/back-to-app".to_string()),
    };

    let response = server.post("/account/forgot-password").form(&payload).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/back-to-app");
    assert_eq!(identity.reset_email_calls(), 1);
}

#[tokio::test]
async fn test_forgot_password_missing_email_is_rejected() {
    let (server, _pool, identity) = setup_test_environment().await;

    let payload = ForgotPasswordForm {
        email: "  ".to_string(),
        callback_url: None,
    };

    let response = server.post("/account/forgot-password").form(&payload).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/forgot-password?error=Email+is+required");
    assert_eq!(identity.reset_email_calls(), 0);
}

// reset_password

#[tokio::test]
async fn test_reset_password_mismatch_never_calls_credential_update() {
    let (server, _pool, identity) = setup_test_environment().await;
    let user_id = identity.register_user("player@test.com", "hunter2!");
    let token = identity.issue_session(user_id, "player@test.com");

    let payload = ResetPasswordForm {
        password: "new-password".to_string(),
        confirm_password: "different-password".to_string(),
    };

    let response = server
        .post("/account/reset-password")
        .authorization_bearer(&token)
        .form(&payload)
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/reset-password?error=Passwords+do+not+match"
    );
    assert_eq!(identity.update_password_calls(), 0);
}

#[tokio::test]
async fn test_reset_password_success() {
    let (server, _pool, identity) = setup_test_environment().await;
    let user_id = identity.register_user("player@test.com", "hunter2!");
    let token = identity.issue_session(user_id, "player@test.com");

    let payload = ResetPasswordForm {
        password: "new-password".to_string(),
        confirm_password: "new-password".to_string(),
    };

    let response = server
        .post("/account/reset-password")
        .authorization_bearer(&token)
        .form(&payload)
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/reset-password?success=Password+updated"
    );
    assert_eq!(identity.update_password_calls(), 1);
}

#[tokio::test]
async fn test_reset_password_without_session_is_rejected() {
    let (server, _pool, identity) = setup_test_environment().await;

    let payload = ResetPasswordForm {
        password: "new-password".to_string(),
        confirm_password: "new-password".to_string(),
    };

    let response = server.post("/account/reset-password").form(&payload).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    let target = location(&response);
    assert!(target.starts_with("/reset-password?error="));
    assert!(target.contains("signed+in"));
    assert_eq!(identity.update_password_calls(), 0);
}

// sign_out

#[tokio::test]
async fn test_sign_out_terminates_session_and_redirects() {
    let (server, _pool, identity) = setup_test_environment().await;
    let user_id = identity.register_user("player@test.com", "hunter2!");
    let token = identity.issue_session(user_id, "player@test.com");

    let response = server
        .post("/account/sign-out")
        .authorization_bearer(&token)
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/sign-in");
    assert!(!identity.has_session(&token));
}

#[tokio::test]
async fn test_sign_out_without_session_still_redirects() {
    let (server, _pool, _identity) = setup_test_environment().await;

    let response = server.post("/account/sign-out").await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/sign-in");
}
