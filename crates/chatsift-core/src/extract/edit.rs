//! The edit extraction module.

use crate::{
    dispatch::{ExtractCtx, LineHandler},
    error::{Result, SiftError},
    extract::rules::{EditKind, ExtractionRules, FieldKind, GroupRef},
    table::CategoryTable,
};
use chatsift_types::{ClassifiedLine, EditRecord, SubjectType};
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

/// The `MM-dd HH:mm:ss` timestamp form the source emits.
static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").expect("Invalid timestamp regex")
});

/// Turns classified edit lines into [`EditRecord`]s.
///
/// The extractor re-matches the category's full pattern to obtain captures
/// (classification only established *that* the pattern matches), converts
/// them through the category's declarative field bindings, updates the
/// last-known context, and appends a record to the current session's log
/// when the category denotes a spatial edit. A conversion failure drops the
/// line from structured extraction only; display and other handlers have
/// already seen it.
pub struct EditExtractor {
    rules: ExtractionRules,
}

impl EditExtractor {
    pub fn new(rules: ExtractionRules) -> Self {
        Self { rules }
    }

    /// The tags this module wants, derived from the categories its rules
    /// cover (deduplicated, sorted for deterministic registration).
    pub fn interests(&self, table: &CategoryTable) -> Vec<String> {
        let tags: BTreeSet<String> = self
            .rules
            .category_ids()
            .filter_map(|id| table.get(id))
            .map(|entry| entry.tag().to_string())
            .collect();
        tags.into_iter().collect()
    }

    fn extract(&self, line: &ClassifiedLine, ctx: &mut ExtractCtx<'_>) -> Result<()> {
        let Some(category_id) = line.category_id.as_deref() else {
            return Ok(());
        };
        let Some(rule) = self.rules.get(category_id) else {
            return Ok(());
        };
        let entry = ctx
            .table
            .get(category_id)
            .ok_or_else(|| SiftError::UnknownCategory(category_id.to_string()))?;
        let caps = entry.full_captures(&line.canonical).ok_or_else(|| {
            SiftError::extraction(category_id, "full pattern no longer matches canonical text")
        })?;

        // Convert every bound capture before mutating anything, so a failed
        // conversion leaves LastContext and the log untouched.
        let mut fields = Fields::default();
        for binding in &rule.fields {
            let text = capture_text(&caps, &binding.group).ok_or_else(|| {
                SiftError::extraction(category_id, format!("missing capture group {:?}", binding.group))
            })?;
            match binding.field {
                FieldKind::Actor => fields.actor = Some(text.to_string()),
                FieldKind::X => fields.x = Some(parse_i32(category_id, "x", text)?),
                FieldKind::Y => fields.y = Some(parse_i32(category_id, "y", text)?),
                FieldKind::Z => fields.z = Some(parse_i32(category_id, "z", text)?),
                FieldKind::Subject => fields.subject = Some(ctx.registry.lookup(text)),
                FieldKind::Timestamp => {
                    fields.timestamp_ms = Some(parse_timestamp(category_id, text)?)
                }
            }
        }

        match rule.kind {
            EditKind::ContextOnly => {
                fields.commit(ctx);
            }
            EditKind::Creation | EditKind::Destruction => {
                let (x, y, z) = match (fields.x, fields.y, fields.z) {
                    (Some(x), Some(y), Some(z)) => (x, y, z),
                    _ => {
                        return Err(SiftError::extraction(
                            category_id,
                            "edit category is missing a coordinate binding",
                        ))
                    }
                };
                let actor = fields.actor.clone().ok_or_else(|| {
                    SiftError::extraction(category_id, "edit category is missing an actor binding")
                })?;
                // Categories without a timestamp capture stamp the record
                // with the wall clock, truncated to match source precision.
                let timestamp_ms = fields
                    .timestamp_ms
                    .unwrap_or_else(|| truncate_to_second(Utc::now().timestamp_millis()));
                let subject = fields.subject.clone().unwrap_or_else(SubjectType::unknown);

                let record = EditRecord {
                    timestamp_ms,
                    actor,
                    is_creation: rule.kind == EditKind::Creation,
                    x,
                    y,
                    z,
                    subject,
                };

                fields.timestamp_ms = Some(timestamp_ms);
                fields.subject = Some(record.subject.clone());
                fields.commit(ctx);

                let inserted = ctx.logs.log_mut(ctx.session).add(record);
                debug!(
                    target: "chatsift::extract",
                    category = category_id,
                    session = %ctx.session,
                    x, y, z,
                    collapsed = !inserted,
                    "recorded edit"
                );
            }
        }

        Ok(())
    }
}

impl LineHandler for EditExtractor {
    fn on_classified(&mut self, line: &ClassifiedLine, ctx: &mut ExtractCtx<'_>) {
        if let Err(e) = self.extract(line, ctx) {
            debug!(
                target: "chatsift::extract",
                error = %e,
                seq = line.seq,
                "line dropped from structured extraction"
            );
        }
    }

    fn on_revised(&mut self, old: &ClassifiedLine, new: &ClassifiedLine, ctx: &mut ExtractCtx<'_>) {
        // Pending fragments are withheld from dispatch, so nothing was ever
        // derived from `old`; the reassembled line is extracted fresh.
        let _ = old;
        self.on_classified(new, ctx);
    }
}

/// Converted fields staged before commit.
#[derive(Debug, Default)]
struct Fields {
    actor: Option<String>,
    x: Option<i32>,
    y: Option<i32>,
    z: Option<i32>,
    subject: Option<SubjectType>,
    timestamp_ms: Option<i64>,
}

impl Fields {
    /// Overwrite the last-known context with every learned field; fields
    /// this extraction did not learn keep their previous values.
    fn commit(self, ctx: &mut ExtractCtx<'_>) {
        let last = &mut *ctx.last;
        if self.actor.is_some() {
            last.actor = self.actor;
        }
        if self.x.is_some() {
            last.x = self.x;
        }
        if self.y.is_some() {
            last.y = self.y;
        }
        if self.z.is_some() {
            last.z = self.z;
        }
        if self.subject.is_some() {
            last.subject = self.subject;
        }
        if self.timestamp_ms.is_some() {
            last.timestamp_ms = self.timestamp_ms;
        }
    }
}

fn capture_text<'t>(caps: &regex::Captures<'t>, group: &GroupRef) -> Option<&'t str> {
    match group {
        GroupRef::Name(name) => caps.name(name).map(|m| m.as_str()),
        GroupRef::Index(index) => caps.get(*index).map(|m| m.as_str()),
    }
}

fn parse_i32(category: &str, axis: &str, text: &str) -> Result<i32> {
    text.trim().parse().map_err(|_| {
        SiftError::extraction(category, format!("non-numeric {axis} coordinate '{text}'"))
    })
}

fn truncate_to_second(ms: i64) -> i64 {
    ms - ms.rem_euclid(1_000)
}

/// Parse a captured timestamp into epoch milliseconds (whole-second
/// precision). Accepts bare epoch seconds or the `MM-dd HH:mm:ss` form the
/// source emits, resolved against the current year.
fn parse_timestamp(category: &str, text: &str) -> Result<i64> {
    let trimmed = text.trim();
    if MONTH_DAY_RE.is_match(trimmed) {
        return parse_month_day(category, trimmed, Utc::now());
    }
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let secs: i64 = trimmed
            .parse()
            .map_err(|_| SiftError::extraction(category, format!("bad epoch seconds '{trimmed}'")))?;
        return secs.checked_mul(1_000).ok_or_else(|| {
            SiftError::extraction(category, format!("epoch seconds '{trimmed}' out of range"))
        });
    }
    Err(SiftError::extraction(
        category,
        format!("unrecognized timestamp '{trimmed}'"),
    ))
}

fn parse_month_day(category: &str, text: &str, now: DateTime<Utc>) -> Result<i64> {
    let parse_with_year = |year: i32| {
        NaiveDateTime::parse_from_str(&format!("{year} {text}"), "%Y %m-%d %H:%M:%S")
    };
    let mut ts = parse_with_year(now.year())
        .map_err(|e| SiftError::extraction(category, format!("bad timestamp '{text}': {e}")))?
        .and_utc();
    // A log line cannot come from the future: a December timestamp read in
    // January belongs to the previous year.
    if ts > now {
        if let Ok(rolled) = parse_with_year(now.year() - 1) {
            ts = rolled.and_utc();
        }
    }
    Ok(ts.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractionRule, FieldBinding};
    use crate::{edit_log::EditLogs, subjects::StaticRegistry};
    use chatsift_types::{Category, LastContext, SessionKey};
    use chrono::TimeZone;

    fn table() -> CategoryTable {
        let (table, errors) = CategoryTable::compile(vec![
            Category::new(
                "edit.created",
                "edit.created",
                r"(?P<actor>\w+) placed (?P<block>\w+) at \((?P<x>-?\d+),(?P<y>-?\d+),(?P<z>-?\d+)\)",
            ),
            Category::new(
                "edit.destroyed",
                "edit.destroyed",
                r"(?P<ts>\d\d-\d\d \d\d:\d\d:\d\d) (?P<actor>\w+) broke (?P<block>\w+) at \((?P<x>-?\d+),(?P<y>-?\d+),(?P<z>-?\d+)\)",
            ),
            Category::new("ctx.teleport", "ctx.teleport", r"Teleported to \((?P<x>-?\d+),(?P<y>-?\d+),(?P<z>-?\d+)\)"),
        ]);
        assert!(errors.is_empty());
        table
    }

    fn coord_bindings() -> Vec<FieldBinding> {
        vec![
            FieldBinding::named("actor", FieldKind::Actor),
            FieldBinding::named("block", FieldKind::Subject),
            FieldBinding::named("x", FieldKind::X),
            FieldBinding::named("y", FieldKind::Y),
            FieldBinding::named("z", FieldKind::Z),
        ]
    }

    fn rules() -> ExtractionRules {
        let mut destroyed_fields = coord_bindings();
        destroyed_fields.push(FieldBinding::named("ts", FieldKind::Timestamp));
        ExtractionRules::new(vec![
            ExtractionRule {
                category_id: "edit.created".into(),
                kind: EditKind::Creation,
                fields: coord_bindings(),
            },
            ExtractionRule {
                category_id: "edit.destroyed".into(),
                kind: EditKind::Destruction,
                fields: destroyed_fields,
            },
            ExtractionRule {
                category_id: "ctx.teleport".into(),
                kind: EditKind::ContextOnly,
                fields: vec![
                    FieldBinding::named("x", FieldKind::X),
                    FieldBinding::named("y", FieldKind::Y),
                    FieldBinding::named("z", FieldKind::Z),
                ],
            },
        ])
    }

    struct Harness {
        table: CategoryTable,
        registry: StaticRegistry,
        session: SessionKey,
        last: LastContext,
        logs: EditLogs,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                table: table(),
                registry: StaticRegistry::new([("stone".to_string(), 1)]),
                session: SessionKey::new("mc.example.net", 0),
                last: LastContext::default(),
                logs: EditLogs::new(),
            }
        }

        fn feed(&mut self, extractor: &mut EditExtractor, category: &str, text: &str) {
            let mut line = ClassifiedLine::unmatched(text, text, 0);
            line.category_id = Some(category.into());
            line.tag = Some(category.into());
            let mut ctx = ExtractCtx {
                table: &self.table,
                registry: &self.registry,
                session: &self.session,
                last: &mut self.last,
                logs: &mut self.logs,
            };
            extractor.on_classified(&line, &mut ctx);
        }

        fn log(&self) -> &crate::edit_log::EditLog {
            self.logs.log(&self.session).expect("log created")
        }
    }

    #[test]
    fn test_creation_line_appends_record() {
        let mut harness = Harness::new();
        let mut extractor = EditExtractor::new(rules());
        harness.feed(&mut extractor, "edit.created", "Steve placed stone at (100,64,-200)");

        assert_eq!(harness.log().len(), 1);
        let record = harness.log().iter().next().unwrap();
        assert_eq!(record.actor, "Steve");
        assert!(record.is_creation);
        assert_eq!((record.x, record.y, record.z), (100, 64, -200));
        assert_eq!(record.subject.id, 1);
        assert_eq!(record.timestamp_ms % 1_000, 0, "whole-second precision");

        assert_eq!(harness.last.position(), Some((100, 64, -200)));
        assert_eq!(harness.last.actor.as_deref(), Some("Steve"));
    }

    #[test]
    fn test_unknown_subject_still_appends() {
        let mut harness = Harness::new();
        let mut extractor = EditExtractor::new(rules());
        harness.feed(&mut extractor, "edit.created", "Alex placed bedrockite at (1,2,3)");

        assert_eq!(harness.log().len(), 1);
        assert!(harness.log().iter().next().unwrap().subject.is_unknown());
    }

    #[test]
    fn test_destruction_with_timestamp_capture() {
        let mut harness = Harness::new();
        let mut extractor = EditExtractor::new(rules());
        harness.feed(
            &mut extractor,
            "edit.destroyed",
            "07-29 02:05:33 Alex broke stone at (4,5,6)",
        );

        let record = harness.log().iter().next().unwrap();
        assert!(!record.is_creation);
        let ts = Utc.timestamp_millis_opt(record.timestamp_ms).unwrap();
        assert_eq!(
            (ts.format("%m-%d %H:%M:%S").to_string()),
            "07-29 02:05:33"
        );
    }

    #[test]
    fn test_conversion_failure_leaves_state_untouched() {
        let mut harness = Harness::new();
        // Bind the actor group to X: the capture is non-numeric and every
        // conversion failure must leave both the log and context untouched.
        let mut extractor = EditExtractor::new(ExtractionRules::new(vec![ExtractionRule {
            category_id: "edit.created".into(),
            kind: EditKind::Creation,
            fields: vec![FieldBinding::named("actor", FieldKind::X)],
        }]));
        harness.feed(&mut extractor, "edit.created", "Steve placed stone at (1,2,3)");

        assert!(harness.logs.log(&harness.session).is_none_or(|l| l.is_empty()));
        assert!(harness.last.x.is_none());
        assert!(harness.last.actor.is_none());
    }

    #[test]
    fn test_context_only_updates_last_without_record() {
        let mut harness = Harness::new();
        let mut extractor = EditExtractor::new(rules());
        harness.feed(&mut extractor, "ctx.teleport", "Teleported to (7,8,9)");

        assert!(harness.logs.log(&harness.session).is_none_or(|l| l.is_empty()));
        assert_eq!(harness.last.position(), Some((7, 8, 9)));
        assert!(harness.last.actor.is_none(), "unlearned fields keep previous values");
    }

    #[test]
    fn test_unruled_category_is_ignored() {
        let mut harness = Harness::new();
        let mut extractor = EditExtractor::new(ExtractionRules::new(Vec::new()));
        harness.feed(&mut extractor, "edit.created", "Steve placed stone at (1,2,3)");
        assert!(harness.logs.log(&harness.session).is_none());
    }

    #[test]
    fn test_interests_deduplicates_tags() {
        let extractor = EditExtractor::new(rules());
        let interests = extractor.interests(&table());
        assert_eq!(interests, ["ctx.teleport", "edit.created", "edit.destroyed"]);
    }

    #[test]
    fn test_parse_month_day_rolls_back_year() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let ts = parse_month_day("t", "12-31 23:59:59", now).unwrap();
        let parsed = Utc.timestamp_millis_opt(ts).unwrap();
        assert_eq!(parsed.year(), 2025);
    }

    #[test]
    fn test_parse_timestamp_epoch_seconds() {
        assert_eq!(parse_timestamp("t", "120").unwrap(), 120_000);
        assert!(parse_timestamp("t", "not a time").is_err());
    }

    #[test]
    fn test_parse_timestamp_rejects_out_of_range_epoch_seconds() {
        // i64::MAX seconds cannot be expressed in milliseconds; the
        // conversion must fail instead of overflowing.
        assert!(parse_timestamp("t", "9223372036854775807").is_err());
        assert!(parse_timestamp("t", "99999999999999999999").is_err());
    }

    #[test]
    fn test_out_of_range_timestamp_is_dropped_not_panicked() {
        let mut harness = Harness::new();
        let (table, errors) = CategoryTable::compile(vec![Category::new(
            "edit.created",
            "edit.created",
            r"(?P<ts>\d+) (?P<actor>\w+) placed (?P<block>\w+) at \((?P<x>-?\d+),(?P<y>-?\d+),(?P<z>-?\d+)\)",
        )]);
        assert!(errors.is_empty());
        harness.table = table;

        let mut fields = coord_bindings();
        fields.push(FieldBinding::named("ts", FieldKind::Timestamp));
        let mut extractor = EditExtractor::new(ExtractionRules::new(vec![ExtractionRule {
            category_id: "edit.created".into(),
            kind: EditKind::Creation,
            fields,
        }]));
        harness.feed(
            &mut extractor,
            "edit.created",
            "9223372036854775807 Steve placed stone at (1,2,3)",
        );

        assert!(harness.logs.log(&harness.session).is_none_or(|l| l.is_empty()));
        assert!(harness.last.timestamp_ms.is_none());
    }

    #[test]
    fn test_truncate_to_second() {
        assert_eq!(truncate_to_second(1_234), 1_000);
        assert_eq!(truncate_to_second(1_000), 1_000);
    }
}
