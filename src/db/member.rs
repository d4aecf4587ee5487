use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct MemberStore {
    pool: SqlitePool,
}

/// Member role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Member {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub role: Role,
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: i64,
    email: String,
    password_hash: String,
    nickname: String,
    role: String,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            nickname: row.nickname,
            role: Role::from_str(&row.role),
        }
    }
}

impl MemberStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new member. Returns the member ID.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        nickname: &str,
        role: Role,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO members (email, password_hash, nickname, role) VALUES (?, ?, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(nickname)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Look up a member by email (the login key).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Member>, sqlx::Error> {
        let row: Option<MemberRow> = sqlx::query_as(
            "SELECT id, email, password_hash, nickname, role FROM members WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Member::from))
    }

    /// Check whether an email is already registered.
    pub async fn exists_by_email(&self, email: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM members WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    /// Check whether a nickname is already taken.
    pub async fn exists_by_nickname(&self, nickname: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM members WHERE nickname = ?")
            .bind(nickname)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }
}
