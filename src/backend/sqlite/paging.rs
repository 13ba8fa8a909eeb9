//! Keyset-paginated row streaming.
//!
//! Every statement handed to [`PagedRows`] must select text columns only,
//! order by its leading `cursor_columns` columns, and take its parameters
//! as: the optional anchor, one value per cursor column, then `LIMIT`.
//! A page is fully read before it is handed out, so no statement stays
//! open between calls to `next`.

use rusqlite::{Connection, params_from_iter, types::Value as SqlValue};

use super::storage_error;
use crate::errors::GraphError;

pub(crate) type RowConverter<T> = fn(Vec<String>) -> Result<T, GraphError>;

pub(crate) struct PagedRows<'a, T> {
    conn: &'a Connection,
    sql: &'static str,
    anchor: Option<String>,
    cursor: Vec<String>,
    page_size: usize,
    convert: RowConverter<T>,
    buffer: std::vec::IntoIter<T>,
    exhausted: bool,
}

impl<'a, T> PagedRows<'a, T> {
    /// Encoded keys are never empty, so empty strings start before every row.
    pub(crate) fn new(
        conn: &'a Connection,
        sql: &'static str,
        anchor: Option<String>,
        cursor_columns: usize,
        page_size: usize,
        convert: RowConverter<T>,
    ) -> Self {
        Self {
            conn,
            sql,
            anchor,
            cursor: vec![String::new(); cursor_columns],
            page_size: page_size.max(1),
            convert,
            buffer: Vec::new().into_iter(),
            exhausted: false,
        }
    }

    fn fetch_page(&mut self) -> Result<Vec<T>, GraphError> {
        let mut values: Vec<SqlValue> = Vec::with_capacity(self.cursor.len() + 2);
        if let Some(anchor) = &self.anchor {
            values.push(SqlValue::Text(anchor.clone()));
        }
        values.extend(self.cursor.iter().cloned().map(SqlValue::Text));
        values.push(SqlValue::Integer(self.page_size as i64));

        let conn = self.conn;
        let mut stmt = conn.prepare_cached(self.sql).map_err(storage_error)?;
        let columns = stmt.column_count();
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                (0..columns)
                    .map(|idx| row.get::<_, String>(idx))
                    .collect::<Result<Vec<String>, _>>()
            })
            .map_err(storage_error)?;
        let mut raw = Vec::new();
        for row in rows {
            raw.push(row.map_err(storage_error)?);
        }

        if raw.len() < self.page_size {
            self.exhausted = true;
        }
        if let Some(last) = raw.last() {
            let width = self.cursor.len();
            self.cursor = last[..width].to_vec();
        }
        let convert = self.convert;
        raw.into_iter().map(convert).collect()
    }
}

impl<T> Iterator for PagedRows<'_, T> {
    type Item = Result<T, GraphError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.next() {
                return Some(Ok(item));
            }
            if self.exhausted {
                return None;
            }
            match self.fetch_page() {
                Ok(page) => self.buffer = page.into_iter(),
                Err(err) => {
                    self.exhausted = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
