use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use tracing::{debug, info};
use validator::Validate;

use crate::{
    config::Config,
    consts::{
        index::{UNIQ_USER_EMAIL, UNIQ_USER_USERNAME},
        table::USER_TABLE,
    },
    db::{self, Db, is_unique_violation},
    errors::{Error, Result},
    models::user::{CreateUser, CurrentUser, User, UserWithPassword, normalize_email},
    utils::{
        jwt::{Claims, encode_jwt},
        pwd::{hash_password, verify_password},
        record_id::{new_record_id, record_key},
        time::time_now,
        validator::{validate_password, validate_username},
    },
};

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct TokenResponse {
    pub access: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

async fn taken(sdb: &Db, field: &'static str, value: String) -> Result<bool> {
    let rows: Vec<RecordId> = sdb
        .query(format!(
            "SELECT VALUE id FROM type::table($table) WHERE {field} = $value LIMIT 1;"
        ))
        .bind(("table", USER_TABLE))
        .bind(("value", value))
        .await?
        .take(0)?;
    Ok(!rows.is_empty())
}

pub async fn register(sdb: &Db, input: RegisterRequest) -> Result<User> {
    let username = input.username.trim().to_string();
    let email = normalize_email(&input.email);

    if taken(sdb, "username", username.clone()).await? {
        return Err(Error::invalid("username", "A user with that username already exists."));
    }
    if taken(sdb, "email", email.clone()).await? {
        return Err(Error::invalid("email", "A user with that email already exists."));
    }

    let row = CreateUser {
        id: new_record_id(USER_TABLE),
        username,
        email,
        password_hash: hash_password(&input.password)?,
        created_at: time_now(),
    };
    let id = row.id.clone();
    let result = db::insert(sdb, USER_TABLE, row).await;
    if is_unique_violation(&result, UNIQ_USER_USERNAME) {
        return Err(Error::invalid("username", "A user with that username already exists."));
    }
    if is_unique_violation(&result, UNIQ_USER_EMAIL) {
        return Err(Error::invalid("email", "A user with that email already exists."));
    }
    result?;

    info!(user = %id, "account registered");
    let user: Option<User> = sdb.select(id).await?;
    user.ok_or(Error::InternalServerError)
}

/// Verifies credentials and signs an access token for the account.
pub async fn issue_token(sdb: &Db, config: &Config, input: TokenRequest) -> Result<TokenResponse> {
    let rows: Vec<UserWithPassword> = sdb
        .query("SELECT * FROM type::table($table) WHERE username = $username LIMIT 1;")
        .bind(("table", USER_TABLE))
        .bind(("username", input.username.trim().to_string()))
        .await?
        .take(0)?;
    let user = rows.into_iter().next().ok_or(Error::InvalidLoginDetails)?;

    if !verify_password(&input.password, &user.password_hash)? {
        debug!(user = %user.id, "password mismatch");
        return Err(Error::InvalidLoginDetails);
    }

    let claims = Claims::new(record_key(&user.id), config.access_token_ttl_minutes);
    Ok(TokenResponse {
        access: encode_jwt(&claims, &config.jwt_secret)?,
        token_type: "Bearer",
        expires_in: config.access_token_ttl_minutes * 60,
    })
}

pub async fn load_user(sdb: &Db, user_id: RecordId) -> Result<Option<CurrentUser>> {
    let user: Option<User> = sdb.select(user_id).await?;
    Ok(user.map(CurrentUser::from))
}
