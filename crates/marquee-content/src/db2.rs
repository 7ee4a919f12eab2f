//! Db2 REST content backend.
//!
//! Talks to the Db2 REST service that sits next to the movie database.
//! A [`Db2Handler`] authenticates once when it is constructed (so bad
//! credentials fail registration up front) and then issues synchronous
//! SQL jobs through `POST /v1/services/execsql`.
//!
//! # Schema
//!
//! | Table | Columns |
//! |-------|---------|
//! | `MOVIES` | `ID`, `TITLE`, `RELEASE_YEAR`, `OVERVIEW`, `POPULARITY` |
//! | `GENRES` | `ID`, `NAME` |
//! | `MOVIE_GENRES` | `MOVIE_ID`, `GENRE_ID` |

use marquee_types::{AuthSettings, Genre, Movie, MovieId};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ContentError;

const SEARCH_SQL: &str = "SELECT ID, TITLE, RELEASE_YEAR, OVERVIEW, POPULARITY FROM MOVIES \
     WHERE LOWER(TITLE) LIKE ? ESCAPE '!' \
     ORDER BY POPULARITY DESC NULLS LAST, ID \
     LIMIT ? OFFSET ?";

const MOVIE_SQL: &str =
    "SELECT ID, TITLE, RELEASE_YEAR, OVERVIEW, POPULARITY FROM MOVIES WHERE ID = ?";

const GENRES_SQL: &str = "SELECT G.NAME FROM GENRES G \
     JOIN MOVIE_GENRES MG ON MG.GENRE_ID = G.ID \
     WHERE MG.MOVIE_ID = ? ORDER BY G.NAME";

/// An authenticated connection to a Db2 REST service.
pub struct Db2Handler {
    client: reqwest::Client,
    base_url: String,
    token: String,
    database: String,
}

impl core::fmt::Debug for Db2Handler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Db2Handler")
            .field("base_url", &self.base_url)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

/// Response body of `POST /v1/auth`.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: Option<String>,
}

/// Response body of a synchronous `POST /v1/services/execsql`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecSqlResponse<R> {
    #[serde(default = "Vec::new")]
    result_set: Vec<R>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct MovieRow {
    id: MovieId,
    title: String,
    release_year: Option<i32>,
    overview: Option<String>,
    popularity: Option<f64>,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            release_year: row.release_year,
            overview: row.overview,
            popularity: row.popularity,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct GenreRow {
    name: String,
}

impl Db2Handler {
    /// Authenticate against the Db2 REST service described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Transport`] if the service is unreachable
    /// and [`ContentError::Auth`] if it rejects the credentials or does
    /// not hand back a token.
    pub async fn connect(settings: &AuthSettings) -> Result<Self, ContentError> {
        let scheme = if settings.ssl { "https" } else { "http" };
        let base_url = format!("{scheme}://{}:{}", settings.hostname, settings.rest_port);
        let client = reqwest::Client::new();

        let body = serde_json::json!({
            "dbParms": {
                "dbHost": settings.hostname,
                "dbName": settings.database,
                "dbPort": settings.db_port,
                "isSSLConnection": settings.ssl,
                "username": settings.username,
                "password": settings.password,
            },
            "expiryTime": settings.expiry_time,
        });

        let response = client
            .post(format!("{base_url}/v1/auth"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ContentError::Transport(format!("Db2 auth request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(ContentError::Auth(format!(
                "Db2 returned {status}: {error_body}"
            )));
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| ContentError::Auth(format!("Db2 auth response parse failed: {e}")))?;
        let token = auth
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ContentError::Auth("Db2 auth response missing token".to_owned()))?;

        debug!(%base_url, database = %settings.database, "Db2 REST session established");

        Ok(Self {
            client,
            base_url,
            token,
            database: settings.database.clone(),
        })
    }

    /// Run one synchronous query job and decode its result set.
    async fn query<R: DeserializeOwned>(
        &self,
        sql: &str,
        parameters: serde_json::Value,
    ) -> Result<Vec<R>, ContentError> {
        let body = serde_json::json!({
            "isQuery": true,
            "sqlStatement": sql,
            "parameters": parameters,
            "sync": true,
        });

        let response = self
            .client
            .post(format!("{}/v1/services/execsql", self.base_url))
            .header("authorization", &self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ContentError::Transport(format!("Db2 query request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(ContentError::Backend {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let parsed: ExecSqlResponse<R> = response
            .json()
            .await
            .map_err(|e| ContentError::Decode(format!("Db2 result set parse failed: {e}")))?;
        Ok(parsed.result_set)
    }

    /// Fetch one page (0-based) of movies whose title contains `query`.
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Movie>, ContentError> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
        let offset = u64::from(page).saturating_mul(u64::from(page_size));
        let rows: Vec<MovieRow> = self
            .query(
                SEARCH_SQL,
                serde_json::json!({ "1": pattern, "2": page_size, "3": offset }),
            )
            .await?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    /// Fetch a single movie by identifier.
    pub async fn movie(&self, id: MovieId) -> Result<Movie, ContentError> {
        let rows: Vec<MovieRow> = self.query(MOVIE_SQL, serde_json::json!({ "1": id })).await?;
        rows.into_iter()
            .next()
            .map(Movie::from)
            .ok_or(ContentError::MovieNotFound(id))
    }

    /// Fetch the genre names attached to `movie`.
    pub async fn genres(&self, movie: &Movie) -> Result<Vec<Genre>, ContentError> {
        let rows: Vec<GenreRow> = self
            .query(GENRES_SQL, serde_json::json!({ "1": movie.id }))
            .await?;
        Ok(rows.into_iter().map(|row| Genre(row.name)).collect())
    }

    /// Name of the database this handler is connected to.
    pub fn database(&self) -> &str {
        &self.database
    }
}

/// Escape `LIKE` wildcards so user input only ever matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '!') {
            escaped.push('!');
        }
        escaped.push(c);
    }
    escaped
}
