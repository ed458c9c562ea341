//! Bibliothèque SQLite
//!
//! Les filtres de visibilité sont appliqués en SQL ; le reste de la sémantique
//! de [`SceneQuery`] (listes, termes `&`/`!`, mois, tri) est appliqué en Rust
//! sur les lignes chargées.

use crate::{
    LibraryBundle, Playlist, Result, Scene, SceneLibrary, SceneQuery, VideoFile, async_trait,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS scenes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scene_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL DEFAULT '',
    site TEXT NOT NULL DEFAULT '',
    studio TEXT NOT NULL DEFAULT '',
    cover_url TEXT NOT NULL DEFAULT '',
    duration INTEGER NOT NULL DEFAULT 0,
    release_date TEXT,
    release_date_text TEXT NOT NULL DEFAULT '',
    added_date TEXT,
    created_at TEXT,
    updated_at TEXT,
    last_opened TEXT,
    star_rating REAL NOT NULL DEFAULT 0,
    total_file_size INTEGER NOT NULL DEFAULT 0,
    total_watch_time INTEGER NOT NULL DEFAULT 0,
    favourite INTEGER NOT NULL DEFAULT 0,
    watchlist INTEGER NOT NULL DEFAULT 0,
    is_watched INTEGER NOT NULL DEFAULT 0,
    is_scripted INTEGER NOT NULL DEFAULT 0,
    is_available INTEGER NOT NULL DEFAULT 0,
    is_accessible INTEGER NOT NULL DEFAULT 0,
    is_hidden INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS scene_tags (
    scene_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (scene_id, name)
);
CREATE TABLE IF NOT EXISTS scene_cast (
    scene_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (scene_id, name)
);
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scene_id INTEGER NOT NULL DEFAULT 0,
    path TEXT NOT NULL DEFAULT '',
    filename TEXT NOT NULL DEFAULT '',
    size INTEGER NOT NULL DEFAULT 0,
    video_width INTEGER NOT NULL DEFAULT 0,
    video_height INTEGER NOT NULL DEFAULT 0,
    video_bitrate INTEGER NOT NULL DEFAULT 0,
    duration REAL NOT NULL DEFAULT 0,
    type TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_files_scene ON files (scene_id);
CREATE TABLE IF NOT EXISTS playlists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL DEFAULT '',
    ordering INTEGER NOT NULL DEFAULT 0,
    is_system INTEGER NOT NULL DEFAULT 0,
    is_deo_enabled INTEGER NOT NULL DEFAULT 0,
    is_smart INTEGER NOT NULL DEFAULT 0,
    search_params TEXT NOT NULL DEFAULT ''
);
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);
INSERT OR IGNORE INTO kv (key, value) VALUES ('content_version', 0);
";

const SCENE_COLUMNS: &str = "id, scene_id, title, site, studio, cover_url, duration, \
    release_date, release_date_text, added_date, created_at, updated_at, last_opened, \
    star_rating, total_file_size, total_watch_time, favourite, watchlist, is_watched, \
    is_scripted, is_available, is_accessible, is_hidden";

const FILE_COLUMNS: &str =
    "id, scene_id, path, filename, size, video_width, video_height, video_bitrate, duration, type";

const PLAYLIST_COLUMNS: &str =
    "id, name, ordering, is_system, is_deo_enabled, is_smart, search_params";

/// Requête d'une liste dérivée (sites, tags, acteurs, mois), restreinte aux
/// scènes que `SceneQuery::accessible()` retiendrait
macro_rules! visible_sql {
    ($head:literal, $tail:literal) => {
        concat!($head, "s.is_accessible = 1 AND s.is_hidden = 0", $tail)
    };
}

/// Bibliothèque adossée à un fichier SQLite
#[derive(Debug, Clone)]
pub struct SqliteLibrary {
    conn: Arc<Mutex<Connection>>,
}

fn fmt_datetime(dt: &Option<DateTime<Utc>>) -> Option<String> {
    dt.as_ref().map(|d| d.to_rfc3339())
}

fn parse_datetime(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|d| d.with_timezone(&Utc))
}

fn scene_from_row(row: &Row<'_>) -> rusqlite::Result<Scene> {
    Ok(Scene {
        id: row.get::<_, i64>(0)? as u64,
        scene_id: row.get(1)?,
        title: row.get(2)?,
        site: row.get(3)?,
        studio: row.get(4)?,
        cover_url: row.get(5)?,
        duration: row.get::<_, i64>(6)? as u32,
        release_date: row
            .get::<_, Option<String>>(7)?
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        release_date_text: row.get(8)?,
        added_date: parse_datetime(row.get(9)?),
        created_at: parse_datetime(row.get(10)?),
        updated_at: parse_datetime(row.get(11)?),
        last_opened: parse_datetime(row.get(12)?),
        star_rating: row.get(13)?,
        total_file_size: row.get::<_, i64>(14)? as u64,
        total_watch_time: row.get::<_, i64>(15)? as u64,
        favourite: row.get(16)?,
        watchlist: row.get(17)?,
        is_watched: row.get(18)?,
        is_scripted: row.get(19)?,
        is_available: row.get(20)?,
        is_accessible: row.get(21)?,
        is_hidden: row.get(22)?,
        ..Default::default()
    })
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<VideoFile> {
    Ok(VideoFile {
        id: row.get::<_, i64>(0)? as u64,
        scene_id: row.get::<_, i64>(1)? as u64,
        path: row.get(2)?,
        filename: row.get(3)?,
        size: row.get::<_, i64>(4)? as u64,
        video_width: row.get::<_, i64>(5)? as u32,
        video_height: row.get::<_, i64>(6)? as u32,
        video_bitrate: row.get::<_, i64>(7)? as u32,
        duration: row.get(8)?,
        file_type: row.get(9)?,
    })
}

fn playlist_from_row(row: &Row<'_>) -> rusqlite::Result<Playlist> {
    Ok(Playlist {
        id: row.get::<_, i64>(0)? as u64,
        name: row.get(1)?,
        ordering: row.get(2)?,
        is_system: row.get(3)?,
        is_deo_enabled: row.get(4)?,
        is_smart: row.get(5)?,
        search_params: row.get(6)?,
    })
}

/// Noms (tags ou acteurs) par scène, dans l'ordre d'insertion
fn names_by_scene(conn: &Connection, table: &str) -> rusqlite::Result<HashMap<u64, Vec<String>>> {
    let sql = format!(
        "SELECT scene_id, name FROM {} ORDER BY scene_id, position",
        table
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)? as u64, row.get::<_, String>(1)?))
    })?;

    let mut out: HashMap<u64, Vec<String>> = HashMap::new();
    for row in rows {
        let (id, name) = row?;
        out.entry(id).or_default().push(name);
    }
    Ok(out)
}

fn files_by_scene(conn: &Connection) -> rusqlite::Result<HashMap<u64, Vec<VideoFile>>> {
    let sql = format!(
        "SELECT {} FROM files WHERE scene_id <> 0 ORDER BY scene_id, id",
        FILE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], file_from_row)?;

    let mut out: HashMap<u64, Vec<VideoFile>> = HashMap::new();
    for row in rows {
        let file = row?;
        out.entry(file.scene_id).or_default().push(file);
    }
    Ok(out)
}

/// Charge les scènes satisfaisant `where_sql` avec leurs tags, acteurs et fichiers
fn load_scenes(
    conn: &Connection,
    where_sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> rusqlite::Result<Vec<Scene>> {
    let sql = format!(
        "SELECT {} FROM scenes s WHERE {} ORDER BY id",
        SCENE_COLUMNS, where_sql
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut scenes = stmt
        .query_map(args, scene_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if scenes.is_empty() {
        return Ok(scenes);
    }

    let mut tags = names_by_scene(conn, "scene_tags")?;
    let mut cast = names_by_scene(conn, "scene_cast")?;
    let mut files = files_by_scene(conn)?;
    for scene in &mut scenes {
        scene.tags = tags.remove(&scene.id).unwrap_or_default();
        scene.cast = cast.remove(&scene.id).unwrap_or_default();
        scene.files = files.remove(&scene.id).unwrap_or_default();
    }
    Ok(scenes)
}

fn visibility_clause(query: &SceneQuery) -> (String, Vec<bool>) {
    let mut clauses = vec!["s.is_hidden = ?".to_string()];
    let mut args = vec![query.dl_state.as_deref() == Some("hidden")];
    let flags = [
        ("s.is_available", query.is_available),
        ("s.is_accessible", query.is_accessible),
        ("s.is_watched", query.is_watched),
    ];
    for (column, value) in flags {
        if let Some(v) = value {
            clauses.push(format!("{} = ?", column));
            args.push(v);
        }
    }
    (clauses.join(" AND "), args)
}

fn bump_version(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE kv SET value = value + 1 WHERE key = 'content_version'",
        [],
    )?;
    Ok(())
}

fn insert_file(conn: &Connection, file: &VideoFile, scene_id: u64) -> rusqlite::Result<u64> {
    let id = if file.id == 0 {
        None
    } else {
        Some(file.id as i64)
    };
    conn.execute(
        "INSERT OR REPLACE INTO files
            (id, scene_id, path, filename, size, video_width, video_height, video_bitrate, duration, type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            scene_id as i64,
            file.path,
            file.filename,
            file.size as i64,
            file.video_width,
            file.video_height,
            file.video_bitrate,
            file.duration,
            file.file_type,
        ],
    )?;
    Ok(conn.last_insert_rowid() as u64)
}

impl SqliteLibrary {
    /// Ouvre (ou crée) la base et son schéma
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        info!(path = %path.display(), "📚 Scene library opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let out = tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            f(&conn)
        })
        .await??;
        Ok(out)
    }

    /// Ajoute ou met à jour une scène (clé `scene_id`) avec ses tags, acteurs
    /// et fichiers. Renvoie la clé primaire.
    pub fn save_scene(&self, scene: &Scene) -> Result<u64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO scenes (scene_id, title, site, studio, cover_url, duration,
                release_date, release_date_text, added_date, created_at, updated_at, last_opened,
                star_rating, total_file_size, total_watch_time, favourite, watchlist, is_watched,
                is_scripted, is_available, is_accessible, is_hidden)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20, ?21, ?22)
             ON CONFLICT(scene_id) DO UPDATE SET
                title = excluded.title,
                site = excluded.site,
                studio = excluded.studio,
                cover_url = excluded.cover_url,
                duration = excluded.duration,
                release_date = excluded.release_date,
                release_date_text = excluded.release_date_text,
                added_date = excluded.added_date,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at,
                last_opened = excluded.last_opened,
                star_rating = excluded.star_rating,
                total_file_size = excluded.total_file_size,
                total_watch_time = excluded.total_watch_time,
                favourite = excluded.favourite,
                watchlist = excluded.watchlist,
                is_watched = excluded.is_watched,
                is_scripted = excluded.is_scripted,
                is_available = excluded.is_available,
                is_accessible = excluded.is_accessible,
                is_hidden = excluded.is_hidden",
            params![
                scene.scene_id,
                scene.title,
                scene.site,
                scene.studio,
                scene.cover_url,
                scene.duration,
                scene.release_date.map(|d| d.format("%Y-%m-%d").to_string()),
                scene.release_date_text,
                fmt_datetime(&scene.added_date),
                fmt_datetime(&scene.created_at),
                fmt_datetime(&scene.updated_at),
                fmt_datetime(&scene.last_opened),
                scene.star_rating,
                scene.total_file_size as i64,
                scene.total_watch_time as i64,
                scene.favourite,
                scene.watchlist,
                scene.is_watched,
                scene.is_scripted,
                scene.is_available,
                scene.is_accessible,
                scene.is_hidden,
            ],
        )?;

        let id: i64 = tx.query_row(
            "SELECT id FROM scenes WHERE scene_id = ?1",
            params![scene.scene_id],
            |row| row.get(0),
        )?;

        tx.execute("DELETE FROM scene_tags WHERE scene_id = ?1", params![id])?;
        tx.execute("DELETE FROM scene_cast WHERE scene_id = ?1", params![id])?;
        tx.execute("DELETE FROM files WHERE scene_id = ?1", params![id])?;

        for (position, tag) in scene.tags.iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO scene_tags (scene_id, name, position) VALUES (?1, ?2, ?3)",
                params![id, tag, position as i64],
            )?;
        }
        for (position, actor) in scene.cast.iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO scene_cast (scene_id, name, position) VALUES (?1, ?2, ?3)",
                params![id, actor, position as i64],
            )?;
        }
        for file in &scene.files {
            insert_file(&tx, file, id as u64)?;
        }

        bump_version(&tx)?;
        tx.commit()?;

        debug!(scene_id = %scene.scene_id, id, "Scene saved");
        Ok(id as u64)
    }

    /// Ajoute ou remplace un fichier ; `scene_id == 0` le laisse non rattaché
    pub fn save_file(&self, file: &VideoFile) -> Result<u64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let id = insert_file(&tx, file, file.scene_id)?;
        bump_version(&tx)?;
        tx.commit()?;
        Ok(id)
    }

    pub fn save_playlist(&self, playlist: &Playlist) -> Result<u64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let id = if playlist.id == 0 {
            None
        } else {
            Some(playlist.id as i64)
        };
        tx.execute(
            "INSERT OR REPLACE INTO playlists
                (id, name, ordering, is_system, is_deo_enabled, is_smart, search_params)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                playlist.name,
                playlist.ordering,
                playlist.is_system,
                playlist.is_deo_enabled,
                playlist.is_smart,
                playlist.search_params,
            ],
        )?;
        let id = tx.last_insert_rowid() as u64;
        bump_version(&tx)?;
        tx.commit()?;
        Ok(id)
    }

    /// Importe un lot complet (scènes, fichiers isolés, listes)
    pub fn import(&self, bundle: &LibraryBundle) -> Result<()> {
        for scene in &bundle.scenes {
            self.save_scene(scene)?;
        }
        for file in &bundle.files {
            self.save_file(file)?;
        }
        for playlist in &bundle.playlists {
            self.save_playlist(playlist)?;
        }
        info!(
            scenes = bundle.scenes.len(),
            files = bundle.files.len(),
            playlists = bundle.playlists.len(),
            "📥 Library bundle imported"
        );
        Ok(())
    }

    async fn distinct_column(&self, sql: &'static str) -> Result<Vec<String>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(sql)?;
            stmt.query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
    }
}

#[async_trait]
impl SceneLibrary for SqliteLibrary {
    async fn query_scenes(&self, query: &SceneQuery) -> Result<Vec<Scene>> {
        let (where_sql, flags) = visibility_clause(query);
        let scenes = self
            .with_conn(move |conn| {
                let args: Vec<&dyn rusqlite::ToSql> =
                    flags.iter().map(|f| f as &dyn rusqlite::ToSql).collect();
                load_scenes(conn, &where_sql, &args)
            })
            .await?;
        Ok(query.apply(scenes.iter()))
    }

    async fn distinct_sites(&self) -> Result<Vec<String>> {
        const SQL: &str = visible_sql!(
            "SELECT DISTINCT s.site FROM scenes s WHERE ",
            " AND s.site <> '' ORDER BY s.site"
        );
        self.distinct_column(SQL).await
    }

    async fn distinct_tags(&self) -> Result<Vec<String>> {
        const SQL: &str = visible_sql!(
            "SELECT DISTINCT t.name FROM scene_tags t JOIN scenes s ON s.id = t.scene_id WHERE ",
            " AND t.name <> '' ORDER BY t.name"
        );
        self.distinct_column(SQL).await
    }

    async fn distinct_actors(&self) -> Result<Vec<String>> {
        const SQL: &str = visible_sql!(
            "SELECT DISTINCT c.name FROM scene_cast c JOIN scenes s ON s.id = c.scene_id WHERE ",
            " AND c.name <> '' ORDER BY c.name"
        );
        self.distinct_column(SQL).await
    }

    async fn release_groups(&self) -> Result<Vec<String>> {
        const SQL: &str = visible_sql!(
            "SELECT DISTINCT m FROM (
                SELECT CASE WHEN s.release_date IS NOT NULL
                    THEN substr(s.release_date, 1, 7)
                    ELSE substr(s.release_date_text, 1, 7) END AS m
                FROM scenes s WHERE ",
            ") WHERE length(m) = 7 ORDER BY m"
        );
        self.distinct_column(SQL).await
    }

    async fn playlists(&self, deo_only: bool) -> Result<Vec<Playlist>> {
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {} FROM playlists WHERE (?1 = 0 OR is_deo_enabled = 1) ORDER BY ordering, id",
                PLAYLIST_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map(params![deo_only], playlist_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
    }

    async fn playlist(&self, id: u64) -> Result<Option<Playlist>> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM playlists WHERE id = ?1", PLAYLIST_COLUMNS);
            conn.query_row(&sql, params![id as i64], playlist_from_row)
                .optional()
        })
        .await
    }

    async fn unmatched_files(&self) -> Result<Vec<VideoFile>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM files WHERE scene_id = 0 ORDER BY id",
                FILE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map([], file_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
    }

    async fn scene_by_scene_id(&self, scene_id: &str) -> Result<Option<Scene>> {
        let scene_id = scene_id.to_string();
        let mut scenes = self
            .with_conn(move |conn| load_scenes(conn, "s.scene_id = ?", &[&scene_id]))
            .await?;
        Ok(scenes.pop())
    }

    async fn file_by_id(&self, id: u64) -> Result<Option<VideoFile>> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM files WHERE id = ?1", FILE_COLUMNS);
            conn.query_row(&sql, params![id as i64], file_from_row)
                .optional()
        })
        .await
    }

    async fn content_version(&self) -> Result<u64> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM kv WHERE key = 'content_version'",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map(|v| v as u64)
        })
        .await
    }
}
