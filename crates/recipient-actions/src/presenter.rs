//! Result rendering: banners, tables and paged lists.

use bridge_client::ChatSummary;
use chrono::{DateTime, Utc};
use std::fmt;

/// One-line outcome shown after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Success(String),
    Error(String),
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Success(message) => write!(f, "[ok] {}", message),
            Feedback::Error(message) => write!(f, "[error] {}", message),
        }
    }
}

/// Client-side paging state. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: u64,
    page_size: u64,
    total: u64,
}

impl Pager {
    pub fn new(page_size: u64) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size)
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }

    /// Record the total reported with the last page. The current page is
    /// pulled back when the total shrank below it.
    pub fn set_total(&mut self, total: u64) {
        self.total = total;
        self.page = self.page.min(self.total_pages().max(1));
    }

    /// Move to `page` if it lies in `[1, total_pages]`.
    pub fn go_to(&mut self, page: u64) -> bool {
        if page >= 1 && page <= self.total_pages() {
            self.page = page;
            true
        } else {
            false
        }
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to(self.page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        self.page > 1 && self.go_to(self.page - 1)
    }

    /// Back to the first page, e.g. after a filter change.
    pub fn rewind(&mut self) {
        self.page = 1;
    }

    pub fn query_params(&self) -> Vec<(String, String)> {
        vec![
            ("offset".to_string(), self.offset().to_string()),
            ("limit".to_string(), self.page_size.to_string()),
        ]
    }
}

/// Yes / no / don't care.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TriState {
    #[default]
    Any,
    Yes,
    No,
}

impl TriState {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            TriState::Any => None,
            TriState::Yes => Some(true),
            TriState::No => Some(false),
        }
    }
}

impl std::str::FromStr for TriState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "any" | "all" => Ok(TriState::Any),
            "yes" | "true" | "1" => Ok(TriState::Yes),
            "no" | "false" | "0" => Ok(TriState::No),
            other => Err(format!("expected yes/no/any, got '{}'", other)),
        }
    }
}

/// Server-side filters of the chat list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatFilter {
    pub search: String,
    pub has_media: bool,
}

impl ChatFilter {
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if !self.search.trim().is_empty() {
            params.push(("search".to_string(), self.search.trim().to_string()));
        }
        if self.has_media {
            params.push(("has_media".to_string(), "true".to_string()));
        }
        params
    }
}

/// Server-side filters of a chat's message list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub search: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_from_me: TriState,
    pub media_only: bool,
}

impl MessageFilter {
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if !self.search.trim().is_empty() {
            params.push(("search".to_string(), self.search.trim().to_string()));
        }
        if let Some(start) = self.start_time {
            params.push(("start_time".to_string(), start.to_rfc3339()));
        }
        if let Some(end) = self.end_time {
            params.push(("end_time".to_string(), end.to_rfc3339()));
        }
        if let Some(from_me) = self.is_from_me.as_bool() {
            params.push(("is_from_me".to_string(), from_me.to_string()));
        }
        if self.media_only {
            params.push(("media_only".to_string(), "true".to_string()));
        }
        params
    }
}

/// Case-insensitive filter over already-fetched chats, by name or JID.
pub fn local_filter<'a>(chats: &'a [ChatSummary], needle: &str) -> Vec<&'a ChatSummary> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return chats.iter().collect();
    }
    chats
        .iter()
        .filter(|chat| {
            chat.jid.to_lowercase().contains(&needle)
                || chat
                    .name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Renders results as plain text.
#[derive(Debug, Clone, Copy)]
pub struct ResultPresenter {
    max_cell_chars: usize,
}

impl Default for ResultPresenter {
    fn default() -> Self {
        Self { max_cell_chars: 48 }
    }
}

impl ResultPresenter {
    pub fn new(max_cell_chars: usize) -> Self {
        Self {
            max_cell_chars: max_cell_chars.max(4),
        }
    }

    pub fn banner(&self, feedback: &Feedback) -> String {
        feedback.to_string()
    }

    pub fn table(&self, table: &Table) -> String {
        if table.is_empty() {
            return "(no results)".to_string();
        }

        let cells: Vec<Vec<String>> = std::iter::once(&table.headers)
            .chain(table.rows.iter())
            .map(|row| row.iter().map(|cell| self.clip(cell)).collect())
            .collect();

        let columns = cells.iter().map(Vec::len).max().unwrap_or(0);
        let widths: Vec<usize> = (0..columns)
            .map(|col| {
                cells
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::with_capacity(cells.len() + 1);
        for (index, row) in cells.iter().enumerate() {
            let line = row
                .iter()
                .enumerate()
                .map(|(col, cell)| format!("{:<width$}", cell, width = widths[col]))
                .collect::<Vec<_>>()
                .join("  ");
            lines.push(line.trim_end().to_string());
            if index == 0 {
                let rule: usize = widths.iter().sum::<usize>() + 2 * columns.saturating_sub(1);
                lines.push("-".repeat(rule));
            }
        }
        lines.join("\n")
    }

    /// Table followed by a page footer.
    pub fn page(&self, table: &Table, pager: &Pager) -> String {
        format!(
            "{}\nPage {} of {} ({} total)",
            self.table(table),
            pager.page(),
            pager.total_pages().max(1),
            pager.total()
        )
    }

    fn clip(&self, cell: &str) -> String {
        let flat = cell.replace(['\n', '\r'], " ");
        if flat.chars().count() <= self.max_cell_chars {
            return flat;
        }
        let mut clipped: String = flat.chars().take(self.max_cell_chars - 1).collect();
        clipped.push('…');
        clipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(jid: &str, name: Option<&str>) -> ChatSummary {
        ChatSummary {
            jid: jid.into(),
            name: name.map(String::from),
            last_message_time: None,
        }
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let mut pager = Pager::new(10);
        pager.set_total(25);
        assert_eq!(pager.total_pages(), 3);
    }

    #[test]
    fn test_next_page_stops_at_last_page() {
        let mut pager = Pager::new(10);
        pager.set_total(25);

        assert!(pager.next_page());
        assert!(pager.next_page());
        assert_eq!(pager.page(), 3);
        assert!(!pager.next_page());
        assert_eq!(pager.page(), 3);
        assert_eq!(pager.offset(), 20);
    }

    #[test]
    fn test_shrinking_total_pulls_page_back() {
        let mut pager = Pager::new(10);
        pager.set_total(45);
        assert!(pager.go_to(5));

        pager.set_total(12);
        assert_eq!(pager.page(), 2);
        assert_eq!(pager.offset(), 10);
        assert!(!pager.next_page());

        pager.set_total(0);
        assert_eq!(pager.page(), 1);
    }

    #[test]
    fn test_prev_page_stops_at_first_page() {
        let mut pager = Pager::new(10);
        pager.set_total(25);
        assert!(!pager.prev_page());
        assert_eq!(pager.page(), 1);
    }

    #[test]
    fn test_empty_list_has_no_next_page() {
        let mut pager = Pager::new(20);
        assert_eq!(pager.total_pages(), 0);
        assert!(!pager.next_page());
        assert_eq!(
            pager.query_params(),
            vec![
                ("offset".to_string(), "0".to_string()),
                ("limit".to_string(), "20".to_string())
            ]
        );
    }

    #[test]
    fn test_message_filter_params() {
        let filter = MessageFilter {
            search: " invoice ".into(),
            is_from_me: TriState::No,
            media_only: true,
            ..MessageFilter::default()
        };

        assert_eq!(
            filter.query_params(),
            vec![
                ("search".to_string(), "invoice".to_string()),
                ("is_from_me".to_string(), "false".to_string()),
                ("media_only".to_string(), "true".to_string()),
            ]
        );
        assert!(MessageFilter::default().query_params().is_empty());
    }

    #[test]
    fn test_tri_state_parsing() {
        assert_eq!("yes".parse::<TriState>(), Ok(TriState::Yes));
        assert_eq!("any".parse::<TriState>(), Ok(TriState::Any));
        assert!("maybe".parse::<TriState>().is_err());
    }

    #[test]
    fn test_local_filter_matches_name_or_jid() {
        let chats = vec![
            chat("5511999999999@s.whatsapp.net", Some("Alice")),
            chat("12036342@g.us", Some("Book Club")),
            chat("5511888888888@s.whatsapp.net", None),
        ];

        assert_eq!(local_filter(&chats, "alice").len(), 1);
        assert_eq!(local_filter(&chats, "@G.US").len(), 1);
        assert_eq!(local_filter(&chats, "5511").len(), 2);
        assert_eq!(local_filter(&chats, "  ").len(), 3);
    }

    #[test]
    fn test_table_rendering() {
        let mut table = Table::new(["Phone", "Name"]);
        table.push(["5511999999999", "Alice"]);

        let rendered = ResultPresenter::default().table(&table);

        assert_eq!(
            rendered,
            "Phone          Name\n--------------------\n5511999999999  Alice"
        );
    }

    #[test]
    fn test_long_cells_are_clipped() {
        let mut table = Table::new(["Text"]);
        table.push(["abcdefghij"]);

        let rendered = ResultPresenter::new(5).table(&table);

        assert!(rendered.ends_with("abcd…"));
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new(["Phone"]);
        assert_eq!(ResultPresenter::default().table(&table), "(no results)");
    }

    #[test]
    fn test_banner() {
        let presenter = ResultPresenter::default();
        assert_eq!(
            presenter.banner(&Feedback::Error("boom".into())),
            "[error] boom"
        );
    }
}
