use crate::schema::level_streaks;
use crate::schema::user_achievement_progress;
use crate::schema::user_mission_progress;
use crate::schema::user_quiz_progress;
use crate::schema::users;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub points: i32,
    pub xp: i32,
    pub badges1: bool,
    pub badges2: bool,
    pub badges3: bool,
    pub longest_quiz_streak: i32,
    // profile_photo defaults to NULL, created_at has a DB default (CURRENT_TIMESTAMP)
}

impl NewUser {
    /// A freshly-bootstrapped user: zero progress, no badges.
    pub fn bootstrap(id: Uuid, username: String, email: String) -> Self {
        NewUser {
            id,
            username,
            email,
            points: 0,
            xp: 0,
            badges1: false,
            badges2: false,
            badges3: false,
            longest_quiz_streak: 0,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = user_quiz_progress)]
pub struct NewQuizProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub level_id: Uuid,
    pub question_id: Uuid,
    pub is_completed: bool,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = user_mission_progress)]
pub struct NewMissionProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mission_id: Uuid,
    pub progress_point: i32,
    pub current_level: i32,
    // snapshot of the mission catalog row at signup time
    pub current_level_requirement: i32,
    pub current_xp_reward: i32,
    pub current_points_reward: i32,
    pub last_completed_at: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = user_achievement_progress)]
pub struct NewAchievementProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub progress_point: i32,
    pub last_completed_at: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = level_streaks)]
pub struct NewLevelStreak {
    pub id: Uuid,
    pub user_id: Uuid,
    pub level_id: Uuid,
    pub current_streak: i32,
    pub last_question_id: Option<Uuid>,
}
