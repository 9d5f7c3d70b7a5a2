use std::collections::HashMap;

use anyhow::{Result, anyhow};
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};

use rugby_types::models::{
    Highlight, HighlightFilter, HighlightPatch, MostViewed, NewHighlight, Statistics,
};

use crate::models::{HIGHLIGHT_COLUMNS, HighlightRow};
use crate::{Database, OptionalExt, now_timestamp};

/// The two set-valued attributes of a highlight, each in its own join table.
#[derive(Debug, Clone, Copy)]
enum Labels {
    Categories,
    Tags,
}

impl Labels {
    fn table(self) -> &'static str {
        match self {
            Self::Categories => "highlight_categories",
            Self::Tags => "highlight_tags",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Categories => "category",
            Self::Tags => "tag",
        }
    }
}

impl Database {
    // -- Reads --

    /// One page of highlights matching `filter`, plus the total match count.
    pub fn list_highlights(&self, filter: &HighlightFilter) -> Result<(Vec<Highlight>, u64)> {
        self.with_conn(|conn| {
            let (where_sql, mut args) = filter_clause(filter);

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM highlights h {where_sql}"),
                params_from_iter(args.iter()),
                |r| r.get(0),
            )?;

            let sql = format!(
                "SELECT {HIGHLIGHT_COLUMNS} FROM highlights h {where_sql}
                 ORDER BY h.{} DESC, h.id DESC
                 LIMIT ? OFFSET ?",
                filter.sort.column()
            );
            args.push(Value::Integer(i64::from(filter.limit)));
            args.push(Value::Integer(i64::try_from(filter.offset())?));

            let rows = query_rows(conn, &sql, params_from_iter(args.iter()))?;
            Ok((attach_labels(conn, rows)?, u64::try_from(total)?))
        })
    }

    /// Fetch without touching the view counter.
    pub fn get_highlight(&self, id: i64) -> Result<Option<Highlight>> {
        self.with_conn(|conn| fetch_highlight(conn, id))
    }

    /// Bump the view counter and return the record as it is afterwards.
    /// `None` when the id does not exist.
    pub fn record_view(&self, id: i64) -> Result<Option<Highlight>> {
        self.with_conn(|conn| {
            let changed = conn.execute("UPDATE highlights SET views = views + 1 WHERE id = ?1", [id])?;
            if changed == 0 {
                return Ok(None);
            }
            fetch_highlight(conn, id)
        })
    }

    pub fn featured_highlights(&self, limit: u32) -> Result<Vec<Highlight>> {
        self.with_conn(|conn| {
            let rows = query_rows(
                conn,
                &format!(
                    "SELECT {HIGHLIGHT_COLUMNS} FROM highlights h
                     WHERE h.featured = 1
                     ORDER BY h.posted_date DESC, h.id DESC
                     LIMIT ?1"
                ),
                [limit],
            )?;
            attach_labels(conn, rows)
        })
    }

    /// Distinct category values across all highlights, alphabetical.
    pub fn categories(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT MIN(category) FROM highlight_categories
                 GROUP BY fold_case(category)
                 ORDER BY fold_case(category)",
            )?;
            let categories = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(categories)
        })
    }

    pub fn statistics(&self) -> Result<Statistics> {
        self.with_conn(|conn| {
            let total_highlights: i64 =
                conn.query_row("SELECT COUNT(*) FROM highlights", [], |r| r.get(0))?;
            let total_views: i64 =
                conn.query_row("SELECT COALESCE(SUM(views), 0) FROM highlights", [], |r| r.get(0))?;
            let most_viewed = conn
                .query_row(
                    "SELECT title, views FROM highlights ORDER BY views DESC, id ASC LIMIT 1",
                    [],
                    |r| {
                        Ok(MostViewed {
                            title: r.get(0)?,
                            views: r.get(1)?,
                        })
                    },
                )
                .optional()?;
            let total_subscribers: i64 = conn.query_row(
                "SELECT COUNT(*) FROM newsletter_subscriptions WHERE active = 1",
                [],
                |r| r.get(0),
            )?;

            Ok(Statistics {
                total_highlights,
                total_views,
                most_viewed,
                total_subscribers,
            })
        })
    }

    // -- Writes --

    pub fn create_highlight(&self, new: &NewHighlight) -> Result<Highlight> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO highlights (title, description, thumbnail, video_url, duration, featured, posted_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    new.title,
                    new.description,
                    new.thumbnail,
                    new.video_url,
                    new.duration,
                    new.featured,
                    now_timestamp(),
                ],
            )?;
            let id = tx.last_insert_rowid();

            replace_labels(&tx, Labels::Categories, id, &new.categories)?;
            replace_labels(&tx, Labels::Tags, id, &new.tags)?;

            let highlight = fetch_highlight(&tx, id)?
                .ok_or_else(|| anyhow!("Highlight {} missing right after insert", id))?;
            tx.commit()?;
            Ok(highlight)
        })
    }

    /// Rewrite only the fields present in `patch`. `None` when the id does
    /// not exist.
    pub fn update_highlight(&self, id: i64, patch: &HighlightPatch) -> Result<Option<Highlight>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists = tx
                .query_row("SELECT 1 FROM highlights WHERE id = ?1", [id], |_| Ok(()))
                .optional()?
                .is_some();
            if !exists {
                return Ok(None);
            }

            let text_fields = [
                ("title", &patch.title),
                ("description", &patch.description),
                ("thumbnail", &patch.thumbnail),
                ("video_url", &patch.video_url),
                ("duration", &patch.duration),
            ];

            let mut assignments: Vec<String> = Vec::new();
            let mut args: Vec<Value> = Vec::new();
            for (column, value) in text_fields {
                if let Some(value) = value {
                    assignments.push(format!("{column} = ?"));
                    args.push(Value::Text(value.clone()));
                }
            }
            if let Some(featured) = patch.featured {
                assignments.push("featured = ?".to_string());
                args.push(Value::Integer(i64::from(featured)));
            }

            if !assignments.is_empty() {
                args.push(Value::Integer(id));
                tx.execute(
                    &format!("UPDATE highlights SET {} WHERE id = ?", assignments.join(", ")),
                    params_from_iter(args.iter()),
                )?;
            }

            if let Some(categories) = &patch.categories {
                replace_labels(&tx, Labels::Categories, id, categories)?;
            }
            if let Some(tags) = &patch.tags {
                replace_labels(&tx, Labels::Tags, id, tags)?;
            }

            let highlight = fetch_highlight(&tx, id)?;
            tx.commit()?;
            Ok(highlight)
        })
    }

    /// Returns false when nothing was deleted. Category, tag and saved-list
    /// rows go with it through `ON DELETE CASCADE`.
    pub fn delete_highlight(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM highlights WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    /// Single-statement increment. Returns the new count, `None` for an
    /// unknown id.
    pub fn like_highlight(&self, id: i64) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            conn.query_row(
                "UPDATE highlights SET likes = likes + 1 WHERE id = ?1 RETURNING likes",
                [id],
                |row| row.get(0),
            )
            .optional()
        })
    }
}

pub(crate) fn fetch_highlight(conn: &Connection, id: i64) -> Result<Option<Highlight>> {
    let row = conn
        .query_row(
            &format!("SELECT {HIGHLIGHT_COLUMNS} FROM highlights h WHERE h.id = ?1"),
            [id],
            HighlightRow::from_row,
        )
        .optional()?;

    match row {
        Some(row) => Ok(attach_labels(conn, vec![row])?.pop()),
        None => Ok(None),
    }
}

pub(crate) fn query_rows<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<HighlightRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, HighlightRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Batch-load categories and tags for `rows` and build the API models,
/// preserving row order.
pub(crate) fn attach_labels(conn: &Connection, rows: Vec<HighlightRow>) -> Result<Vec<Highlight>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut categories = load_labels(conn, Labels::Categories, &ids)?;
    let mut tags = load_labels(conn, Labels::Tags, &ids)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            row.into_highlight(
                categories.remove(&id).unwrap_or_default(),
                tags.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}

fn load_labels(conn: &Connection, labels: Labels, ids: &[i64]) -> Result<HashMap<i64, Vec<String>>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT highlight_id, {} FROM {} WHERE highlight_id IN ({}) ORDER BY highlight_id, position",
        labels.column(),
        labels.table(),
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(ids.iter()))?;

    let mut out: HashMap<i64, Vec<String>> = HashMap::new();
    while let Some(row) = rows.next()? {
        out.entry(row.get(0)?).or_default().push(row.get(1)?);
    }
    Ok(out)
}

fn replace_labels(conn: &Connection, labels: Labels, id: i64, values: &[String]) -> Result<()> {
    conn.execute(
        &format!("DELETE FROM {} WHERE highlight_id = ?1", labels.table()),
        [id],
    )?;

    let mut stmt = conn.prepare(&format!(
        "INSERT OR IGNORE INTO {} (highlight_id, {}, position) VALUES (?1, ?2, ?3)",
        labels.table(),
        labels.column()
    ))?;
    for (position, value) in values.iter().enumerate() {
        stmt.execute(params![id, value, position as i64])?;
    }
    Ok(())
}

/// WHERE clause and its positional arguments for a listing filter.
fn filter_clause(filter: &HighlightFilter) -> (String, Vec<Value>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    if let Some(category) = &filter.category {
        conditions.push(
            "EXISTS (SELECT 1 FROM highlight_categories hc
                     WHERE hc.highlight_id = h.id AND fold_case(hc.category) = ?)",
        );
        args.push(Value::Text(category.to_lowercase()));
    }

    // instr() takes the term literally, so `%` and `_` need no escaping.
    if let Some(term) = &filter.search {
        conditions.push("(instr(fold_case(h.title), ?) > 0 OR instr(fold_case(h.description), ?) > 0)");
        let needle = term.to_lowercase();
        args.push(Value::Text(needle.clone()));
        args.push(Value::Text(needle));
    }

    if conditions.is_empty() {
        (String::new(), args)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rugby_types::models::SortField;

    fn new_highlight(title: &str, categories: &[&str]) -> NewHighlight {
        NewHighlight {
            title: title.to_string(),
            description: format!("{title} description"),
            thumbnail: "https://img.example/thumb.jpg".to_string(),
            video_url: "https://video.example/clip.mp4".to_string(),
            duration: "1:32".to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            tags: vec![],
            featured: false,
        }
    }

    fn filter() -> HighlightFilter {
        HighlightFilter::default()
    }

    #[test]
    fn create_starts_counters_at_zero() {
        let db = Database::open_in_memory().unwrap();
        let mut new = new_highlight("Final Try", &["try", "classic"]);
        new.tags = vec!["six nations".into(), "wing".into()];

        let created = db.create_highlight(&new).unwrap();
        assert!(created.id > 0);
        assert_eq!(created.views, 0);
        assert_eq!(created.likes, 0);
        assert_eq!(created.duration, "1:32");
        assert_eq!(created.categories, vec!["try", "classic"]);
        assert_eq!(created.tags, vec!["six nations", "wing"]);
        assert!(!created.featured);
    }

    #[test]
    fn category_filter_only_returns_members() {
        let db = Database::open_in_memory().unwrap();
        db.create_highlight(&new_highlight("Final Try", &["try", "classic"])).unwrap();
        db.create_highlight(&new_highlight("Big Tackle", &["tackle"])).unwrap();
        db.create_highlight(&new_highlight("Wing Try", &["Try"])).unwrap();

        let (found, total) = db
            .list_highlights(&HighlightFilter { category: Some("try".into()), ..filter() })
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(found.len(), 2);
        for h in &found {
            assert!(h.categories.iter().any(|c| c.eq_ignore_ascii_case("try")));
        }
    }

    #[test]
    fn search_matches_title_or_description_case_insensitively() {
        let db = Database::open_in_memory().unwrap();
        db.create_highlight(&new_highlight("Championship Final", &["final"])).unwrap();
        let mut other = new_highlight("Scrum", &["scrum"]);
        other.description = "Dominant CHAMPIONSHIP scrum".into();
        db.create_highlight(&other).unwrap();
        db.create_highlight(&new_highlight("Lineout", &["lineout"])).unwrap();

        let (found, total) = db
            .list_highlights(&HighlightFilter { search: Some("championship".into()), ..filter() })
            .unwrap();
        assert_eq!(total, 2);
        for h in &found {
            let hay = format!("{} {}", h.title, h.description).to_lowercase();
            assert!(hay.contains("championship"));
        }
    }

    #[test]
    fn search_wildcards_match_literally() {
        let db = Database::open_in_memory().unwrap();
        db.create_highlight(&new_highlight("100% effort", &["effort"])).unwrap();
        db.create_highlight(&new_highlight("1000 metres", &["running"])).unwrap();

        let (found, _) = db
            .list_highlights(&HighlightFilter { search: Some("100%".into()), ..filter() })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "100% effort");
    }

    #[test]
    fn accented_search_and_category_ignore_case() {
        let db = Database::open_in_memory().unwrap();
        db.create_highlight(&new_highlight("Élite Try", &["Équipe"])).unwrap();
        db.create_highlight(&new_highlight("Elite Tackle", &["equipe"])).unwrap();

        for term in ["élite", "ÉLITE", "Élite"] {
            let (found, total) = db
                .list_highlights(&HighlightFilter { search: Some(term.into()), ..filter() })
                .unwrap();
            assert_eq!(total, 1, "search {term}");
            assert_eq!(found[0].title, "Élite Try");
        }

        let (found, total) = db
            .list_highlights(&HighlightFilter { category: Some("équipe".into()), ..filter() })
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].categories, vec!["Équipe"]);

        assert_eq!(db.categories().unwrap(), vec!["equipe", "Équipe"]);
    }

    #[test]
    fn sorts_descending_with_id_tie_break() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_highlight(&new_highlight("A", &["x"])).unwrap();
        let b = db.create_highlight(&new_highlight("B", &["x"])).unwrap();
        let c = db.create_highlight(&new_highlight("C", &["x"])).unwrap();
        db.record_view(a.id).unwrap();
        db.record_view(a.id).unwrap();

        let (by_views, _) = db
            .list_highlights(&HighlightFilter { sort: SortField::Views, ..filter() })
            .unwrap();
        let ids: Vec<i64> = by_views.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![a.id, c.id, b.id]);

        let (by_date, _) = db.list_highlights(&filter()).unwrap();
        let ids: Vec<i64> = by_date.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);

        let (by_title, _) = db
            .list_highlights(&HighlightFilter { sort: SortField::Title, ..filter() })
            .unwrap();
        assert_eq!(by_title[0].title, "C");
    }

    #[test]
    fn pagination_reports_total() {
        let db = Database::open_in_memory().unwrap();
        for i in 0..5 {
            db.create_highlight(&new_highlight(&format!("Clip {i}"), &["x"])).unwrap();
        }

        let page = HighlightFilter { page: 2, limit: 2, ..filter() };
        let (found, total) = db.list_highlights(&page).unwrap();
        assert_eq!(total, 5);
        assert_eq!(found.len(), 2);
        assert_eq!(page.total_pages(total), 3);

        let (last, _) = db.list_highlights(&HighlightFilter { page: 3, ..page }).unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].title, "Clip 0");
    }

    #[test]
    fn each_view_adds_exactly_one() {
        let db = Database::open_in_memory().unwrap();
        let h = db.create_highlight(&new_highlight("Final Try", &["try"])).unwrap();

        assert_eq!(db.record_view(h.id).unwrap().unwrap().views, 1);
        assert_eq!(db.record_view(h.id).unwrap().unwrap().views, 2);
        for _ in 0..3 {
            db.record_view(h.id).unwrap();
        }
        assert_eq!(db.get_highlight(h.id).unwrap().unwrap().views, 5);
        assert!(db.record_view(h.id + 100).unwrap().is_none());
    }

    #[test]
    fn likes_are_not_deduplicated() {
        let db = Database::open_in_memory().unwrap();
        let h = db.create_highlight(&new_highlight("Drop Goal", &["kick"])).unwrap();

        for n in 1..=4 {
            assert_eq!(db.like_highlight(h.id).unwrap(), Some(n));
        }
        assert_eq!(db.like_highlight(9999).unwrap(), None);
        assert_eq!(db.get_highlight(h.id).unwrap().unwrap().views, 0);
    }

    #[test]
    fn update_rewrites_only_supplied_fields() {
        let db = Database::open_in_memory().unwrap();
        let h = db.create_highlight(&new_highlight("Old Title", &["try"])).unwrap();
        db.like_highlight(h.id).unwrap();

        let patch = HighlightPatch {
            title: Some("New Title".into()),
            categories: Some(vec!["classic".into()]),
            featured: Some(true),
            ..Default::default()
        };
        let updated = db.update_highlight(h.id, &patch).unwrap().unwrap();
        assert_eq!(updated.title, "New Title");
        assert_eq!(updated.description, h.description);
        assert_eq!(updated.categories, vec!["classic"]);
        assert!(updated.featured);
        assert_eq!(updated.likes, 1);
        assert_eq!(updated.posted_date, h.posted_date);

        assert!(db.update_highlight(h.id + 1, &patch).unwrap().is_none());
    }

    #[test]
    fn delete_cascades_labels() {
        let db = Database::open_in_memory().unwrap();
        let h = db.create_highlight(&new_highlight("Gone", &["try"])).unwrap();

        assert!(db.delete_highlight(h.id).unwrap());
        assert!(!db.delete_highlight(h.id).unwrap());
        assert!(db.get_highlight(h.id).unwrap().is_none());
        assert!(db.categories().unwrap().is_empty());
    }

    #[test]
    fn featured_is_capped_and_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let mut ids = Vec::new();
        for i in 0..8 {
            let mut new = new_highlight(&format!("Feature {i}"), &["x"]);
            new.featured = true;
            ids.push(db.create_highlight(&new).unwrap().id);
        }
        db.create_highlight(&new_highlight("Not featured", &["x"])).unwrap();

        let featured = db.featured_highlights(6).unwrap();
        assert_eq!(featured.len(), 6);
        assert!(featured.iter().all(|h| h.featured));
        assert_eq!(featured[0].id, *ids.last().unwrap());
    }

    #[test]
    fn categories_are_distinct_and_sorted() {
        let db = Database::open_in_memory().unwrap();
        db.create_highlight(&new_highlight("A", &["try", "classic"])).unwrap();
        db.create_highlight(&new_highlight("B", &["tackle", "try"])).unwrap();

        assert_eq!(db.categories().unwrap(), vec!["classic", "tackle", "try"]);
    }

    #[test]
    fn statistics_summarise_the_table() {
        let db = Database::open_in_memory().unwrap();
        let empty = db.statistics().unwrap();
        assert_eq!(empty.total_highlights, 0);
        assert_eq!(empty.total_views, 0);
        assert!(empty.most_viewed.is_none());

        let a = db.create_highlight(&new_highlight("Quiet", &["x"])).unwrap();
        let b = db.create_highlight(&new_highlight("Viral", &["x"])).unwrap();
        db.record_view(a.id).unwrap();
        for _ in 0..3 {
            db.record_view(b.id).unwrap();
        }

        let stats = db.statistics().unwrap();
        assert_eq!(stats.total_highlights, 2);
        assert_eq!(stats.total_views, 4);
        assert_eq!(
            stats.most_viewed,
            Some(MostViewed { title: "Viral".into(), views: 3 })
        );
    }
}
