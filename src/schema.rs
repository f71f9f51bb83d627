//! Declarative table and relation definitions.
//!
//! Every persisted table is described once here. The migration that creates
//! the database renders its DDL from these declarations, and the relation
//! graph is queried by `copilot schema`.

use crate::models::{
    ExperienceLevel, JobListingStatus, JobListingType, LocationRequirement, QuestionType,
    WageInterval,
};

/// SQL expression producing an RFC 3339 UTC timestamp with milliseconds.
pub const NOW_SQL: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// A named, closed set of literal values stored in a text column.
#[derive(Debug)]
pub struct EnumDef {
    pub name: &'static str,
    pub values: &'static [&'static str],
}

pub static WAGE_INTERVAL: EnumDef = EnumDef {
    name: "job_listings_wage_interval",
    values: WageInterval::LITERALS,
};
pub static LOCATION_REQUIREMENT: EnumDef = EnumDef {
    name: "job_listings_location_req",
    values: LocationRequirement::LITERALS,
};
pub static EXPERIENCE_LEVEL: EnumDef = EnumDef {
    name: "job_listings_exp_level",
    values: ExperienceLevel::LITERALS,
};
pub static JOB_LISTING_STATUS: EnumDef = EnumDef {
    name: "job_listings_status",
    values: JobListingStatus::LITERALS,
};
pub static JOB_LISTING_TYPE: EnumDef = EnumDef {
    name: "job_listings_type",
    values: JobListingType::LITERALS,
};
pub static QUESTION_TYPE: EnumDef = EnumDef {
    name: "question_types",
    values: QuestionType::LITERALS,
};

pub static ENUMS: &[&EnumDef] = &[
    &WAGE_INTERVAL,
    &LOCATION_REQUIREMENT,
    &EXPERIENCE_LEVEL,
    &JOB_LISTING_STATUS,
    &JOB_LISTING_TYPE,
    &QUESTION_TYPE,
];

#[derive(Debug, Clone, Copy)]
pub enum ColumnKind {
    /// Hyphenated v4 UUID generated at insert time.
    Uuid,
    Varchar,
    Text,
    Integer,
    Boolean,
    /// RFC 3339 UTC text.
    Timestamp,
    Enum(&'static EnumDef),
}

impl ColumnKind {
    fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Integer | ColumnKind::Boolean => "INTEGER",
            _ => "TEXT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Uuid => "uuid",
            ColumnKind::Varchar => "varchar",
            ColumnKind::Text => "text",
            ColumnKind::Integer => "integer",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Timestamp => "timestamp",
            ColumnKind::Enum(def) => def.name,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum DefaultValue {
    Now,
    Bool(bool),
    Literal(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Deleting the parent fails while dependents exist.
    NoAction,
    Cascade,
}

#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
    pub on_delete: OnDelete,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub primary_key: bool,
    pub not_null: bool,
    pub unique: bool,
    pub default: Option<DefaultValue>,
    pub references: Option<ForeignKey>,
}

impl ColumnDef {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            primary_key: false,
            not_null: false,
            unique: false,
            default: None,
            references: None,
        }
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    pub const fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some(ForeignKey {
            table,
            column,
            on_delete: OnDelete::NoAction,
        });
        self
    }

    pub const fn references_cascade(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some(ForeignKey {
            table,
            column,
            on_delete: OnDelete::Cascade,
        });
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("\"{}\" {}", self.name, self.kind.sql_type());
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        match self.default {
            Some(DefaultValue::Now) => sql.push_str(&format!(" DEFAULT ({})", NOW_SQL)),
            Some(DefaultValue::Bool(b)) => sql.push_str(if b { " DEFAULT 1" } else { " DEFAULT 0" }),
            Some(DefaultValue::Literal(lit)) => sql.push_str(&format!(" DEFAULT '{}'", lit)),
            None => {}
        }
        match self.kind {
            ColumnKind::Enum(def) => {
                let values: Vec<String> = def.values.iter().map(|v| format!("'{}'", v)).collect();
                sql.push_str(&format!(" CHECK (\"{}\" IN ({}))", self.name, values.join(", ")));
            }
            ColumnKind::Boolean => {
                sql.push_str(&format!(" CHECK (\"{}\" IN (0, 1))", self.name));
            }
            _ => {}
        }
        if let Some(fk) = &self.references {
            sql.push_str(&format!(" REFERENCES \"{}\"(\"{}\")", fk.table, fk.column));
            if fk.on_delete == OnDelete::Cascade {
                sql.push_str(" ON DELETE CASCADE");
            }
        }
        sql
    }
}

#[derive(Debug)]
pub struct IndexDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    pub indexes: &'static [IndexDef],
}

impl TableDef {
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| format!("    {}", c.to_sql())).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (\n{}\n);",
            self.name,
            columns.join(",\n")
        )
    }

    pub fn create_index_sql(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|idx| {
                let cols: Vec<String> = idx.columns.iter().map(|c| format!("\"{}\"", c)).collect();
                format!(
                    "CREATE INDEX IF NOT EXISTS \"{}\" ON \"{}\" ({});",
                    idx.name,
                    self.name,
                    cols.join(", ")
                )
            })
            .collect()
    }
}

const fn id_uuid() -> ColumnDef {
    ColumnDef::new("id", ColumnKind::Uuid).primary_key()
}

const fn created_at() -> ColumnDef {
    ColumnDef::new("createdAt", ColumnKind::Timestamp)
        .not_null()
        .default(DefaultValue::Now)
}

const fn updated_at() -> ColumnDef {
    ColumnDef::new("updatedAt", ColumnKind::Timestamp)
        .not_null()
        .default(DefaultValue::Now)
}

pub static USERS: TableDef = TableDef {
    name: "users",
    columns: &[
        ColumnDef::new("id", ColumnKind::Varchar).primary_key(),
        ColumnDef::new("name", ColumnKind::Varchar).not_null(),
        ColumnDef::new("email", ColumnKind::Varchar).not_null().unique(),
        ColumnDef::new("imageUrl", ColumnKind::Varchar).not_null(),
        created_at(),
        updated_at(),
    ],
    indexes: &[],
};

pub static ORGANIZATIONS: TableDef = TableDef {
    name: "organizations",
    columns: &[
        ColumnDef::new("id", ColumnKind::Varchar).primary_key(),
        ColumnDef::new("name", ColumnKind::Varchar).not_null(),
        ColumnDef::new("imageUrl", ColumnKind::Varchar),
        created_at(),
        updated_at(),
    ],
    indexes: &[],
};

pub static JOB_LISTINGS: TableDef = TableDef {
    name: "job_listings",
    columns: &[
        id_uuid(),
        ColumnDef::new("organizationId", ColumnKind::Varchar)
            .not_null()
            .references_cascade("organizations", "id"),
        ColumnDef::new("title", ColumnKind::Varchar).not_null(),
        ColumnDef::new("description", ColumnKind::Text).not_null(),
        ColumnDef::new("wage", ColumnKind::Integer),
        ColumnDef::new("wageInterval", ColumnKind::Enum(&WAGE_INTERVAL)),
        ColumnDef::new("stateAbbreviation", ColumnKind::Varchar),
        ColumnDef::new("city", ColumnKind::Varchar),
        ColumnDef::new("isFeatured", ColumnKind::Boolean)
            .not_null()
            .default(DefaultValue::Bool(false)),
        ColumnDef::new("locationRequirement", ColumnKind::Enum(&LOCATION_REQUIREMENT)).not_null(),
        ColumnDef::new("experienceLevel", ColumnKind::Enum(&EXPERIENCE_LEVEL)).not_null(),
        ColumnDef::new("status", ColumnKind::Enum(&JOB_LISTING_STATUS))
            .not_null()
            .default(DefaultValue::Literal("Draft")),
        ColumnDef::new("type", ColumnKind::Enum(&JOB_LISTING_TYPE)).not_null(),
        ColumnDef::new("postedAt", ColumnKind::Timestamp),
        created_at(),
        updated_at(),
    ],
    indexes: &[IndexDef {
        name: "job_listings_stateAbbreviation_index",
        columns: &["stateAbbreviation"],
    }],
};

pub static SCRAPED_JOBS: TableDef = TableDef {
    name: "scraped_jobs",
    columns: &[
        id_uuid(),
        ColumnDef::new("title", ColumnKind::Varchar).not_null(),
        ColumnDef::new("companyName", ColumnKind::Varchar).not_null(),
        ColumnDef::new("description", ColumnKind::Text).not_null(),
        ColumnDef::new("wage", ColumnKind::Varchar),
        ColumnDef::new("locationRequirement", ColumnKind::Varchar).not_null(),
        ColumnDef::new("experienceLevel", ColumnKind::Varchar),
        ColumnDef::new("location", ColumnKind::Varchar).not_null(),
        ColumnDef::new("sourceUrl", ColumnKind::Text).not_null().unique(),
        ColumnDef::new("sourceSite", ColumnKind::Varchar).not_null(),
        ColumnDef::new("scrapedAt", ColumnKind::Timestamp)
            .not_null()
            .default(DefaultValue::Now),
        ColumnDef::new("postedAt", ColumnKind::Varchar),
    ],
    indexes: &[],
};

pub static SAVED_JOBS: TableDef = TableDef {
    name: "saved_jobs",
    columns: &[
        id_uuid(),
        ColumnDef::new("userId", ColumnKind::Varchar).not_null().references("users", "id"),
        ColumnDef::new("jobId", ColumnKind::Uuid).not_null().references("scraped_jobs", "id"),
        ColumnDef::new("aiMatchScore", ColumnKind::Integer).not_null(),
        created_at(),
        updated_at(),
    ],
    indexes: &[],
};

pub static GENERATED_COVER_LETTERS: TableDef = TableDef {
    name: "generated_cover_letters",
    columns: &[
        id_uuid(),
        ColumnDef::new("userId", ColumnKind::Varchar).not_null().references("users", "id"),
        ColumnDef::new("jobId", ColumnKind::Uuid).not_null().references("scraped_jobs", "id"),
        ColumnDef::new("coverLetter", ColumnKind::Text),
        created_at(),
        updated_at(),
    ],
    indexes: &[],
};

pub static INTERVIEW_SESSIONS: TableDef = TableDef {
    name: "interview_sessions",
    columns: &[
        id_uuid(),
        ColumnDef::new("userId", ColumnKind::Varchar).not_null().references("users", "id"),
        ColumnDef::new("jobId", ColumnKind::Uuid).references("scraped_jobs", "id"),
        created_at(),
        updated_at(),
    ],
    indexes: &[],
};

pub static INTERVIEW_QNA: TableDef = TableDef {
    name: "interview_qna",
    columns: &[
        id_uuid(),
        ColumnDef::new("interviewSessionId", ColumnKind::Uuid)
            .not_null()
            .references_cascade("interview_sessions", "id"),
        ColumnDef::new("question", ColumnKind::Text).not_null(),
        ColumnDef::new("answer", ColumnKind::Text),
        ColumnDef::new("questionType", ColumnKind::Enum(&QUESTION_TYPE)).not_null(),
        ColumnDef::new("aiFeedback", ColumnKind::Text).not_null(),
        created_at(),
        updated_at(),
    ],
    indexes: &[],
};

/// All tables, parents before children.
pub static TABLES: &[&TableDef] = &[
    &USERS,
    &ORGANIZATIONS,
    &JOB_LISTINGS,
    &SCRAPED_JOBS,
    &SAVED_JOBS,
    &GENERATED_COVER_LETTERS,
    &INTERVIEW_SESSIONS,
    &INTERVIEW_QNA,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// A named navigation from `table` to `target`. `fields` are columns of
/// `table`, `references` the matching columns of `target`.
#[derive(Debug)]
pub struct RelationDef {
    pub table: &'static str,
    pub name: &'static str,
    pub target: &'static str,
    pub cardinality: Cardinality,
    pub fields: &'static [&'static str],
    pub references: &'static [&'static str],
}

const fn one(
    table: &'static str,
    name: &'static str,
    target: &'static str,
    field: &'static [&'static str],
) -> RelationDef {
    RelationDef {
        table,
        name,
        target,
        cardinality: Cardinality::One,
        fields: field,
        references: &["id"],
    }
}

const fn many(
    table: &'static str,
    name: &'static str,
    target: &'static str,
    foreign: &'static [&'static str],
) -> RelationDef {
    RelationDef {
        table,
        name,
        target,
        cardinality: Cardinality::Many,
        fields: &["id"],
        references: foreign,
    }
}

pub static RELATIONS: &[RelationDef] = &[
    many("users", "savedJobs", "saved_jobs", &["userId"]),
    many("users", "generatedCoverLetters", "generated_cover_letters", &["userId"]),
    many("users", "interviewSessions", "interview_sessions", &["userId"]),
    many("organizations", "jobListings", "job_listings", &["organizationId"]),
    many("scraped_jobs", "savedJobs", "saved_jobs", &["jobId"]),
    many("scraped_jobs", "interviewSessions", "interview_sessions", &["jobId"]),
    many("scraped_jobs", "generatedCoverLetters", "generated_cover_letters", &["jobId"]),
    one("saved_jobs", "user", "users", &["userId"]),
    one("saved_jobs", "job", "scraped_jobs", &["jobId"]),
    one("generated_cover_letters", "user", "users", &["userId"]),
    one("generated_cover_letters", "job", "scraped_jobs", &["jobId"]),
    one("interview_sessions", "user", "users", &["userId"]),
    one("interview_sessions", "job", "scraped_jobs", &["jobId"]),
    many("interview_sessions", "interviewQnA", "interview_qna", &["interviewSessionId"]),
    one("interview_qna", "interviewSession", "interview_sessions", &["interviewSessionId"]),
];

pub fn tables() -> &'static [&'static TableDef] {
    TABLES
}

pub fn table(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().copied().find(|t| t.name == name)
}

pub fn relations_of(table: &str) -> impl Iterator<Item = &'static RelationDef> + '_ {
    RELATIONS.iter().filter(move |r| r.table == table)
}

pub fn enum_values(name: &str) -> Option<&'static [&'static str]> {
    ENUMS.iter().find(|e| e.name == name).map(|e| e.values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column<'a>(t: &'a TableDef, name: &str) -> Option<&'a ColumnDef> {
        t.columns.iter().find(|c| c.name == name)
    }

    #[test]
    fn test_every_foreign_key_points_at_a_declared_primary_key() {
        for t in TABLES {
            for col in t.columns {
                if let Some(fk) = &col.references {
                    let target = table(fk.table).expect("referenced table is declared");
                    let target_col = column(target, fk.column).expect("referenced column exists");
                    assert!(target_col.primary_key, "{}.{} -> {}.{}", t.name, col.name, fk.table, fk.column);
                }
            }
        }
    }

    #[test]
    fn test_only_two_cascades_are_declared() {
        let mut cascades: Vec<(&str, &str)> = TABLES
            .iter()
            .flat_map(|t| t.columns.iter().map(move |c| (t.name, c)))
            .filter(|(_, c)| matches!(c.references, Some(fk) if fk.on_delete == OnDelete::Cascade))
            .map(|(t, c)| (t, c.name))
            .collect();
        cascades.sort();
        assert_eq!(
            cascades,
            vec![("interview_qna", "interviewSessionId"), ("job_listings", "organizationId")]
        );
    }

    #[test]
    fn test_relations_reference_real_columns() {
        for rel in RELATIONS {
            let from = table(rel.table).unwrap();
            let to = table(rel.target).unwrap();
            for f in rel.fields {
                assert!(column(from, f).is_some(), "{}.{}", rel.table, f);
            }
            for r in rel.references {
                assert!(column(to, r).is_some(), "{}.{}", rel.target, r);
            }
        }
    }

    #[test]
    fn test_interview_session_relations() {
        let names: Vec<(&str, Cardinality)> = relations_of("interview_sessions")
            .map(|r| (r.name, r.cardinality))
            .collect();
        assert_eq!(
            names,
            vec![
                ("user", Cardinality::One),
                ("job", Cardinality::One),
                ("interviewQnA", Cardinality::Many),
            ]
        );
    }

    #[test]
    fn test_job_listing_ddl() {
        let sql = JOB_LISTINGS.create_table_sql();
        assert!(sql.contains("\"status\" TEXT NOT NULL DEFAULT 'Draft' CHECK (\"status\" IN ('Draft', 'De-listed', 'Published'))"));
        assert!(sql.contains("\"isFeatured\" INTEGER NOT NULL DEFAULT 0"));
        assert!(sql.contains("REFERENCES \"organizations\"(\"id\") ON DELETE CASCADE"));

        let idx = JOB_LISTINGS.create_index_sql();
        assert_eq!(
            idx,
            vec!["CREATE INDEX IF NOT EXISTS \"job_listings_stateAbbreviation_index\" ON \"job_listings\" (\"stateAbbreviation\");"]
        );
    }

    #[test]
    fn test_enum_values_lookup() {
        assert_eq!(
            enum_values("question_types"),
            Some(&["Behavioral", "Technical", "Situational"][..])
        );
        assert!(enum_values("nope").is_none());
    }
}
