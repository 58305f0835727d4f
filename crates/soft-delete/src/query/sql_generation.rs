//! Statement SQL generation (PostgreSQL dialect)

use serde_json::Value;

use super::statement::Statement;
use super::types::*;

/// Collects parameters, or inlines literals when rendering for display
struct SqlWriter {
    sql: String,
    params: Vec<Value>,
    inline: bool,
}

impl SqlWriter {
    fn new(inline: bool) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            inline,
        }
    }

    fn push(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }

    fn push_value(&mut self, value: &Value) {
        if self.inline {
            let literal = inline_literal(value);
            self.sql.push_str(&literal);
        } else if value.is_null() {
            self.sql.push_str("NULL");
        } else {
            self.params.push(value.clone());
            self.sql.push_str(&format!("${}", self.params.len()));
        }
    }
}

fn inline_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

impl Statement {
    /// Generate SQL with `$n` placeholders and the values to bind
    pub fn to_sql_with_params(&self) -> (String, Vec<Value>) {
        let writer = self.render(SqlWriter::new(false));
        (writer.sql, writer.params)
    }

    /// Generate SQL with values inlined
    pub fn to_sql(&self) -> String {
        self.render(SqlWriter::new(true)).sql
    }

    fn render(&self, mut w: SqlWriter) -> SqlWriter {
        match self.query_type {
            QueryType::Select => self.build_select_sql(&mut w),
            QueryType::Insert => self.build_insert_sql(&mut w),
            QueryType::Update => self.build_update_sql(&mut w),
            QueryType::Delete => self.build_delete_sql(&mut w),
        }
        w
    }

    fn build_select_sql(&self, w: &mut SqlWriter) {
        w.push(&format!("SELECT {}.* FROM {}", self.table, self.table));

        for join in &self.joins {
            w.push(&format!(" {} {} ON ", join.join_type, join.table));
            let on: Vec<String> = join
                .on_conditions
                .iter()
                .map(|(left, right)| format!("{} = {}", left, right))
                .collect();
            w.push(&on.join(" AND "));
        }

        self.build_where_clause(w, &[]);

        if let Some(limit) = self.limit {
            w.push(&format!(" LIMIT {}", limit));
        }
    }

    fn build_insert_sql(&self, w: &mut SqlWriter) {
        w.push(&format!("INSERT INTO {}", self.table));

        if self.set_clauses.is_empty() {
            w.push(" DEFAULT VALUES");
            return;
        }

        let columns: Vec<&str> = self
            .set_clauses
            .iter()
            .map(|clause| self.local_column(&clause.column))
            .collect();
        w.push(&format!(" ({}) VALUES (", columns.join(", ")));
        for (i, clause) in self.set_clauses.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push_value(&clause.value);
        }
        w.push(")");
    }

    /// Joined tables move into `FROM`, their ON pairs into the WHERE clause
    fn build_update_sql(&self, w: &mut SqlWriter) {
        w.push(&format!("UPDATE {} SET ", self.table));
        for (i, clause) in self.set_clauses.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            // PostgreSQL rejects table-qualified SET targets
            w.push(&format!("{} = ", self.local_column(&clause.column)));
            w.push_value(&clause.value);
        }

        if !self.joins.is_empty() {
            let tables: Vec<&str> = self.joins.iter().map(|j| j.table.as_str()).collect();
            w.push(&format!(" FROM {}", tables.join(", ")));
        }

        self.build_where_clause(w, &self.join_predicates());
    }

    fn build_delete_sql(&self, w: &mut SqlWriter) {
        w.push(&format!("DELETE FROM {}", self.table));

        if !self.joins.is_empty() {
            let tables: Vec<&str> = self.joins.iter().map(|j| j.table.as_str()).collect();
            w.push(&format!(" USING {}", tables.join(", ")));
        }

        self.build_where_clause(w, &self.join_predicates());
    }

    fn join_predicates(&self) -> Vec<String> {
        self.joins
            .iter()
            .flat_map(|join| join.on_conditions.iter())
            .map(|(left, right)| format!("{} = {}", left, right))
            .collect()
    }

    fn build_where_clause(&self, w: &mut SqlWriter, leading: &[String]) {
        if leading.is_empty() && self.conditions.is_empty() {
            return;
        }

        w.push(" WHERE ");
        let mut first = true;
        for predicate in leading {
            if !first {
                w.push(" AND ");
            }
            first = false;
            w.push(predicate);
        }

        for condition in &self.conditions {
            if !first {
                w.push(" AND ");
            }
            first = false;
            render_condition(w, condition);
        }
    }

    /// Strip this statement's own table prefix from a column
    fn local_column<'a>(&self, column: &'a str) -> &'a str {
        column
            .strip_prefix(self.table.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(column)
    }
}

fn render_condition(w: &mut SqlWriter, condition: &WhereCondition) {
    match condition.operator {
        QueryOperator::IsNull | QueryOperator::IsNotNull => {
            w.push(&format!("{} {}", condition.column, condition.operator));
        }
        QueryOperator::In => {
            if condition.values.is_empty() {
                w.push("1 = 0");
                return;
            }
            w.push(&format!("{} IN (", condition.column));
            for (i, value) in condition.values.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.push_value(value);
            }
            w.push(")");
        }
        _ => {
            w.push(&format!("{} {} ", condition.column, condition.operator));
            match &condition.value {
                Some(value) => w.push_value(value),
                None => w.push("NULL"),
            }
        }
    }
}
