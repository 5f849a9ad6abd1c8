use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, ToSql};

use crate::error::AppError;
use crate::models::{Board, BoardSummary, NewTodo, Todo, TodoPatch};
use crate::query::{SortSpec, TodoFilter, TodoQuery};

pub type DbPool = Arc<Mutex<Connection>>;

const TODO_COLUMNS: &str =
    "id, title, description, status, priority, tags, due_date, board_id, sort_order, created_at, updated_at";

/// Document-style store over two collections (todos, boards) plus the token
/// table backing authenticated board reads.
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
    capture_stacks: bool,
}

impl Repository {
    pub fn open(path: &str, capture_stacks: bool) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'pending',
                priority TEXT NOT NULL DEFAULT 'medium',
                tags TEXT NOT NULL DEFAULT '[]',
                due_date TEXT,
                board_id TEXT,
                sort_order INTEGER,
                created_at INTEGER DEFAULT (strftime('%s', 'now')),
                updated_at INTEGER DEFAULT (strftime('%s', 'now'))
            );

            CREATE INDEX IF NOT EXISTS todos_board_idx ON todos(board_id);
            CREATE INDEX IF NOT EXISTS todos_status_due_idx ON todos(status, due_date, created_at);

            CREATE TABLE IF NOT EXISTS boards (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                created_at INTEGER DEFAULT (strftime('%s', 'now')),
                updated_at INTEGER DEFAULT (strftime('%s', 'now'))
            );

            CREATE INDEX IF NOT EXISTS boards_owner_idx ON boards(owner_id, created_at);

            CREATE TABLE IF NOT EXISTS api_tokens (
                id INTEGER PRIMARY KEY,
                token TEXT UNIQUE NOT NULL,
                owner_id TEXT NOT NULL,
                created_at INTEGER DEFAULT (strftime('%s', 'now'))
            );
            ",
        )?;

        Ok(Repository {
            pool: Arc::new(Mutex::new(conn)),
            capture_stacks,
        })
    }

    fn run<T>(&self, op: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T, AppError> {
        let conn = self.pool.lock().unwrap();
        op(&conn).map_err(|err| AppError::storage(err, self.capture_stacks))
    }

    // Todo collection

    pub fn insert_todo(&self, new: &NewTodo) -> Result<Todo, AppError> {
        self.run(|conn| {
            conn.execute(
                "INSERT INTO todos (title, description, status, priority, tags, due_date, board_id, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    new.title,
                    new.description,
                    new.status,
                    new.priority,
                    encode_tags(&new.tags),
                    new.due_date,
                    new.board_id,
                    new.sort_order,
                ],
            )?;
            let id = conn.last_insert_rowid();

            conn.query_row(
                &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"),
                [id],
                todo_from_row,
            )
        })
    }

    pub fn find_todos(&self, query: &TodoQuery) -> Result<Vec<Todo>, AppError> {
        let (clause, mut params) = filter_sql(&query.filter);
        let sql = format!(
            "SELECT {TODO_COLUMNS} FROM todos{clause}{} LIMIT ? OFFSET ?",
            order_sql(query.sort)
        );
        params.push(Box::new(query.page.limit));
        params.push(Box::new(query.page.skip()));

        self.run(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let rows = stmt.query_map(refs.as_slice(), todo_from_row)?.collect();
            rows
        })
    }

    pub fn count_todos(&self, filter: &TodoFilter) -> Result<u64, AppError> {
        let (clause, params) = filter_sql(filter);
        let sql = format!("SELECT COUNT(*) FROM todos{clause}");

        self.run(|conn| {
            let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let count: i64 = conn.query_row(&sql, refs.as_slice(), |row| row.get(0))?;
            Ok(count as u64)
        })
    }

    pub fn find_todos_by_board(
        &self,
        board_id: &str,
        sort: SortSpec,
    ) -> Result<Vec<Todo>, AppError> {
        let sql = format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE board_id = ?1{}",
            order_sql(sort)
        );

        self.run(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([board_id], todo_from_row)?.collect();
            rows
        })
    }

    pub fn update_todo(&self, id: i64, patch: &TodoPatch) -> Result<Option<Todo>, AppError> {
        let mut sets: Vec<&'static str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(title) = &patch.title {
            sets.push("title = ?");
            params.push(Box::new(title.clone()));
        }
        if let Some(description) = &patch.description {
            sets.push("description = ?");
            params.push(Box::new(description.clone()));
        }
        if let Some(status) = patch.status {
            sets.push("status = ?");
            params.push(Box::new(status));
        }
        if let Some(priority) = patch.priority {
            sets.push("priority = ?");
            params.push(Box::new(priority));
        }
        if let Some(tags) = &patch.tags {
            sets.push("tags = ?");
            params.push(Box::new(encode_tags(tags)));
        }
        if let Some(due_date) = &patch.due_date {
            sets.push("due_date = ?");
            params.push(Box::new(due_date.clone()));
        }
        if let Some(board_id) = &patch.board_id {
            sets.push("board_id = ?");
            params.push(Box::new(board_id.clone()));
        }
        if let Some(sort_order) = patch.sort_order {
            sets.push("sort_order = ?");
            params.push(Box::new(sort_order));
        }

        self.run(move |conn| {
            if sets.is_empty() {
                return find_todo(conn, id);
            }

            sets.push("updated_at = strftime('%s', 'now')");
            params.push(Box::new(id));

            let sql = format!("UPDATE todos SET {} WHERE id = ?", sets.join(", "));
            let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
            conn.execute(&sql, refs.as_slice())?;

            find_todo(conn, id)
        })
    }

    pub fn delete_todo(&self, id: i64) -> Result<bool, AppError> {
        self.run(|conn| {
            let rows = conn.execute("DELETE FROM todos WHERE id = ?1", [id])?;
            Ok(rows > 0)
        })
    }

    // Board collection

    pub fn insert_board(&self, name: &str, owner_id: &str) -> Result<Board, AppError> {
        self.run(|conn| {
            conn.execute(
                "INSERT INTO boards (name, owner_id) VALUES (?1, ?2)",
                [name.trim(), owner_id],
            )?;
            let id = conn.last_insert_rowid();

            conn.query_row(
                "SELECT id, name, owner_id, created_at, updated_at FROM boards WHERE id = ?1",
                [id],
                |row| {
                    Ok(Board {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        owner_id: row.get(2)?,
                        created_at: row.get(3)?,
                        updated_at: row.get(4)?,
                    })
                },
            )
        })
    }

    pub fn find_boards_by_owner(&self, owner_id: &str) -> Result<Vec<BoardSummary>, AppError> {
        self.run(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, created_at FROM boards
                 WHERE owner_id = ?1 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt.query_map([owner_id], |row| {
                Ok(BoardSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?
            .collect();
            rows
        })
    }

    // API token table

    pub fn insert_api_token(&self, token: &str, owner_id: &str) -> Result<(), AppError> {
        self.run(|conn| {
            conn.execute(
                "INSERT INTO api_tokens (token, owner_id) VALUES (?1, ?2)",
                [token, owner_id],
            )?;
            Ok(())
        })
    }

    pub fn find_token_owner(&self, token: &str) -> Result<Option<String>, AppError> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT owner_id FROM api_tokens WHERE token = ?1")?;
            let mut rows = stmt.query([token])?;

            match rows.next()? {
                Some(row) => Ok(Some(row.get(0)?)),
                None => Ok(None),
            }
        })
    }
}

fn find_todo(conn: &Connection, id: i64) -> rusqlite::Result<Option<Todo>> {
    let mut stmt = conn.prepare(&format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"))?;
    let mut rows = stmt.query([id])?;

    match rows.next()? {
        Some(row) => Ok(Some(todo_from_row(row)?)),
        None => Ok(None),
    }
}

fn todo_from_row(row: &Row) -> rusqlite::Result<Todo> {
    let tags: String = row.get(5)?;

    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        priority: row.get(4)?,
        tags: serde_json::from_str(&tags).unwrap_or_default(),
        due_date: row.get(6)?,
        board_id: row.get(7)?,
        sort_order: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn encode_tags(tags: &[String]) -> String {
    serde_json::Value::from(tags.to_vec()).to_string()
}

fn filter_sql(filter: &TodoFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(status) = filter.status {
        clauses.push("status = ?".to_string());
        params.push(Box::new(status));
    }
    if let Some(priority) = filter.priority {
        clauses.push("priority = ?".to_string());
        params.push(Box::new(priority));
    }
    if let Some(board_id) = &filter.board_id {
        clauses.push("board_id = ?".to_string());
        params.push(Box::new(board_id.clone()));
    }
    if let Some(q) = &filter.title_match {
        clauses.push("title LIKE ? ESCAPE '\\'".to_string());
        params.push(Box::new(format!("%{}%", escape_like(q))));
    }
    if !filter.tags.is_empty() {
        let marks = vec!["?"; filter.tags.len()].join(", ");
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM json_each(todos.tags) WHERE json_each.value IN ({marks}))"
        ));
        for tag in &filter.tags {
            params.push(Box::new(tag.clone()));
        }
    }

    let clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    (clause, params)
}

// Equal primary keys fall back to newest row first, so repeated identical
// reads return the same order and board-scoped reads agree with filtered
// list reads.
fn order_sql(sort: SortSpec) -> String {
    format!(
        " ORDER BY {} {}, id DESC",
        sort.field.column(),
        sort.direction.keyword()
    )
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
