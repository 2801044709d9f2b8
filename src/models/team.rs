use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::random_code;

pub const INVITE_CODE_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub invite_code: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A team together with the requesting user's role in it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMembership {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub team: Team,
    pub role: String,
}

/// Public preview of a team shown on the join page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPreview {
    pub id: i64,
    pub name: String,
    pub member_count: i64,
}

const SELECT_TEAM: &str = "SELECT id, name, invite_code, owner_id, created_at FROM teams";

/// Create a team and enrol its creator with the `owner` role.
pub async fn create(pool: &PgPool, name: &str, owner_id: i64) -> Result<Team, AppError> {
    let mut tx = pool.begin().await?;

    let team = sqlx::query_as::<_, Team>(
        "INSERT INTO teams (name, invite_code, owner_id) VALUES ($1, $2, $3) \
         RETURNING id, name, invite_code, owner_id, created_at",
    )
    .bind(name)
    .bind(random_code(INVITE_CODE_LEN))
    .bind(owner_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, 'owner')")
        .bind(team.id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(team)
}

pub async fn find_by_invite_code(pool: &PgPool, code: &str) -> Result<Option<Team>, AppError> {
    let team = sqlx::query_as::<_, Team>(&format!("{SELECT_TEAM} WHERE invite_code = $1"))
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(team)
}

pub async fn member_count(pool: &PgPool, team_id: i64) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM team_members WHERE team_id = $1")
        .bind(team_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn is_member(pool: &PgPool, team_id: i64, user_id: i64) -> Result<bool, AppError> {
    let member: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM team_members WHERE team_id = $1 AND user_id = $2)",
    )
    .bind(team_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(member)
}

/// Add a member. Returns `false` when the user already belonged to the team.
pub async fn add_member(pool: &PgPool, team_id: i64, user_id: i64) -> Result<bool, AppError> {
    let result = sqlx::query(
        "INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, 'member') \
         ON CONFLICT (team_id, user_id) DO NOTHING",
    )
    .bind(team_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<TeamMembership>, AppError> {
    let teams = sqlx::query_as::<_, TeamMembership>(
        "SELECT t.id, t.name, t.invite_code, t.owner_id, t.created_at, m.role \
         FROM team_members m \
         JOIN teams t ON t.id = m.team_id \
         WHERE m.user_id = $1 \
         ORDER BY m.joined_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(teams)
}
