//! SQL generation for question searches.
//!
//! Every user-supplied value is a positional bind parameter. Builders return
//! `(sql, binds)` pairs that the Postgres store executes.

use crate::models::{PageWindow, QuestionId, SortSpec, UserId};
use crate::search::{Filter, Predicate};

mod bind;

use bind::{push_bigint, push_bigint_array, push_text, push_text_array};

/// Bind values for `sqlx` queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Text(String),
    TextArray(Vec<String>),
    BigInt(i64),
    BigIntArray(Vec<i64>),
}

const QUESTION_COLUMNS: &str = "q.id, q.content, q.category, q.created_at, q.updated_at";

/// Escape LIKE meta-characters so user input is matched literally.
pub(crate) fn escape_like_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Query over the `question` table for one predicate.
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    predicate: &'a Predicate,
    sort: SortSpec,
    window: Option<PageWindow>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(predicate: &'a Predicate) -> Self {
        Self {
            predicate,
            sort: SortSpec::default(),
            window: None,
        }
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_window(mut self, window: PageWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Ids only. Used for the first phase of tag-filtered paging.
    pub fn build_id_sql(&self) -> (String, Vec<BindValue>) {
        self.build_select("q.id")
    }

    /// Full rows.
    pub fn build_sql(&self) -> (String, Vec<BindValue>) {
        self.build_select(QUESTION_COLUMNS)
    }

    /// `COUNT(*)` with the same filters and no ordering or window.
    pub fn build_count_sql(&self) -> (String, Vec<BindValue>) {
        let mut bind_params = Vec::new();
        let mut sql = "SELECT COUNT(*) FROM question q".to_string();
        sql.push_str(&where_clause(self.predicate, &mut bind_params));
        (sql, bind_params)
    }

    fn build_select(&self, columns: &str) -> (String, Vec<BindValue>) {
        let mut bind_params = Vec::new();
        let mut sql = format!("SELECT {columns} FROM question q");
        sql.push_str(&where_clause(self.predicate, &mut bind_params));
        sql.push_str(&order_by_clause(self.sort));
        if let Some(window) = self.window {
            sql.push_str(&format!(
                " OFFSET {} LIMIT {}",
                window.offset.max(0),
                window.limit.max(0)
            ));
        }
        (sql, bind_params)
    }
}

/// Second phase: materialize known ids in the page order.
pub fn build_load_by_ids_sql(ids: &[QuestionId], sort: SortSpec) -> (String, Vec<BindValue>) {
    let mut bind_params = Vec::new();
    let idx = push_bigint_array(&mut bind_params, ids.iter().map(|id| id.0).collect());
    let sql = format!(
        "SELECT {QUESTION_COLUMNS} FROM question q WHERE q.id = ANY(${idx}){}",
        order_by_clause(sort)
    );
    (sql, bind_params)
}

/// Tag names for a batch of questions, one row per (question, tag).
pub fn build_tag_names_sql(ids: &[QuestionId]) -> (String, Vec<BindValue>) {
    let mut bind_params = Vec::new();
    let idx = push_bigint_array(&mut bind_params, ids.iter().map(|id| id.0).collect());
    let sql = format!(
        "SELECT qt.question_id, t.name FROM question_tag qt \
         JOIN tag t ON t.id = qt.tag_id \
         WHERE qt.question_id = ANY(${idx}) \
         ORDER BY qt.question_id, t.name"
    );
    (sql, bind_params)
}

/// Which of `ids` the user has answered.
pub fn build_answered_ids_sql(user_id: UserId, ids: &[QuestionId]) -> (String, Vec<BindValue>) {
    let mut bind_params = Vec::new();
    let user_idx = push_bigint(&mut bind_params, user_id.0);
    let ids_idx = push_bigint_array(&mut bind_params, ids.iter().map(|id| id.0).collect());
    let sql = format!(
        "SELECT DISTINCT a.question_id FROM answer a \
         WHERE a.user_id = ${user_idx} AND a.question_id = ANY(${ids_idx})"
    );
    (sql, bind_params)
}

fn where_clause(predicate: &Predicate, bind_params: &mut Vec<BindValue>) -> String {
    if predicate.is_empty() {
        return String::new();
    }
    let clauses: Vec<String> = predicate
        .clauses()
        .iter()
        .map(|filter| filter_sql(filter, bind_params))
        .collect();
    format!(" WHERE {}", clauses.join(" AND "))
}

fn filter_sql(filter: &Filter, bind_params: &mut Vec<BindValue>) -> String {
    match filter {
        Filter::Category(category) => {
            let idx = push_text(bind_params, category.as_str().to_string());
            format!("q.category = ${idx}")
        }
        Filter::ContentContains(keyword) => {
            let idx = push_text(bind_params, format!("%{}%", escape_like_pattern(keyword)));
            format!("q.content ILIKE ${idx} ESCAPE E'\\\\'")
        }
        Filter::AnyTag(names) => {
            let idx = push_text_array(bind_params, names.as_slice().to_vec());
            format!(
                "EXISTS (SELECT 1 FROM question_tag qt JOIN tag t ON t.id = qt.tag_id \
                 WHERE qt.question_id = q.id AND t.name = ANY(${idx}))"
            )
        }
        Filter::Answered { user_id, answered } => {
            let idx = push_bigint(bind_params, user_id.0);
            let exists = format!(
                "EXISTS (SELECT 1 FROM answer a WHERE a.question_id = q.id AND a.user_id = ${idx})"
            );
            if *answered {
                exists
            } else {
                format!("NOT {exists}")
            }
        }
    }
}

fn order_by_clause(sort: SortSpec) -> String {
    let mut sql = format!(
        " ORDER BY q.{} {}",
        sort.field.column(),
        sort.direction.as_sql()
    );
    if sort.needs_tie_breaker() {
        sql.push_str(", q.id ASC");
    }
    sql
}
