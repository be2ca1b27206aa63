//! Entity models returned by the backend and their list-view configuration.

use crate::paging::SortSpec;
use crate::resolve::{Chain, Extractor, ResolvedRef};
use crate::view::Column;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every entity collection exposed by the backend.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Student,
    Teacher,
    Class,
    TotalClass,
    Major,
    Academy,
    Payment,
    Score,
}

impl EntityKind {
    /// Collection path relative to the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            Self::Student => "students",
            Self::Teacher => "teachers",
            Self::Class => "classes",
            Self::TotalClass => "total-classes",
            Self::Major => "majors",
            Self::Academy => "academies",
            Self::Payment => "payments",
            Self::Score => "scores",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Class => "class",
            Self::TotalClass => "total-class",
            Self::Major => "major",
            Self::Academy => "academy",
            Self::Payment => "payment",
            Self::Score => "score",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity that can stand in for its ID in another entity's row.
pub trait Referent {
    fn to_ref(&self) -> ResolvedRef;
}

/// Static list-view configuration for an entity model.
pub trait Listing: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn default_sort() -> SortSpec {
        SortSpec::ascending("id")
    }

    fn columns() -> Vec<Column<Self>>;
}

fn opt_str(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_owned())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub student_no: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub major_id: Option<i64>,
}

impl Referent for Student {
    fn to_ref(&self) -> ResolvedRef {
        ResolvedRef::new(EntityKind::Student, self.id, &self.name)
            .with_link(EntityKind::Class, self.class_id)
            .with_link(EntityKind::Major, self.major_id)
    }
}

impl Listing for Student {
    const KIND: EntityKind = EntityKind::Student;

    fn columns() -> Vec<Column<Self>> {
        let major = Extractor::new("majorId", EntityKind::Major, |s: &Student| s.major_id);
        vec![
            Column::field("ID", |s: &Student| s.id.to_string()),
            Column::field("No.", |s: &Student| opt_str(&s.student_no)),
            Column::field("Name", |s: &Student| s.name.clone()),
            Column::field("Gender", |s: &Student| opt_str(&s.gender)),
            Column::reference(
                "Class",
                Chain::single(Extractor::new("classId", EntityKind::Class, |s: &Student| {
                    s.class_id
                })),
            ),
            Column::reference("Major", Chain::single(major)),
            Column::reference("Academy", Chain::single(major).then(EntityKind::Academy)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub academy_id: Option<i64>,
}

impl Referent for Teacher {
    fn to_ref(&self) -> ResolvedRef {
        ResolvedRef::new(EntityKind::Teacher, self.id, &self.name)
            .with_link(EntityKind::Academy, self.academy_id)
    }
}

impl Listing for Teacher {
    const KIND: EntityKind = EntityKind::Teacher;

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::field("ID", |t: &Teacher| t.id.to_string()),
            Column::field("Name", |t: &Teacher| t.name.clone()),
            Column::field("Title", |t: &Teacher| opt_str(&t.title)),
            Column::reference(
                "Academy",
                Chain::single(Extractor::new(
                    "academyId",
                    EntityKind::Academy,
                    |t: &Teacher| t.academy_id,
                )),
            ),
        ]
    }
}

/// A teaching class (the backend calls the collection `classes`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub major_id: Option<i64>,
    #[serde(default)]
    pub total_class_id: Option<i64>,
    #[serde(default)]
    pub teacher_id: Option<i64>,
}

impl Referent for ClassInfo {
    fn to_ref(&self) -> ResolvedRef {
        ResolvedRef::new(EntityKind::Class, self.id, &self.name)
            .with_link(EntityKind::Major, self.major_id)
            .with_link(EntityKind::TotalClass, self.total_class_id)
            .with_link(EntityKind::Teacher, self.teacher_id)
    }
}

impl Listing for ClassInfo {
    const KIND: EntityKind = EntityKind::Class;

    fn columns() -> Vec<Column<Self>> {
        let major = Extractor::new("majorId", EntityKind::Major, |c: &ClassInfo| c.major_id);
        vec![
            Column::field("ID", |c: &ClassInfo| c.id.to_string()),
            Column::field("Name", |c: &ClassInfo| c.name.clone()),
            Column::reference("Major", Chain::single(major)),
            Column::reference("Academy", Chain::single(major).then(EntityKind::Academy)),
            Column::reference(
                "Total class",
                Chain::single(Extractor::new(
                    "totalClassId",
                    EntityKind::TotalClass,
                    |c: &ClassInfo| c.total_class_id,
                )),
            ),
            Column::reference(
                "Head teacher",
                Chain::single(Extractor::new(
                    "teacherId",
                    EntityKind::Teacher,
                    |c: &ClassInfo| c.teacher_id,
                )),
            ),
        ]
    }
}

/// A cohort grouping several classes of one major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalClass {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub major_id: Option<i64>,
    #[serde(default)]
    pub grade: Option<String>,
}

impl Referent for TotalClass {
    fn to_ref(&self) -> ResolvedRef {
        ResolvedRef::new(EntityKind::TotalClass, self.id, &self.name)
            .with_link(EntityKind::Major, self.major_id)
    }
}

impl Listing for TotalClass {
    const KIND: EntityKind = EntityKind::TotalClass;

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::field("ID", |t: &TotalClass| t.id.to_string()),
            Column::field("Name", |t: &TotalClass| t.name.clone()),
            Column::field("Grade", |t: &TotalClass| opt_str(&t.grade)),
            Column::reference(
                "Major",
                Chain::single(Extractor::new(
                    "majorId",
                    EntityKind::Major,
                    |t: &TotalClass| t.major_id,
                )),
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Major {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub academy_id: Option<i64>,
}

impl Referent for Major {
    fn to_ref(&self) -> ResolvedRef {
        ResolvedRef::new(EntityKind::Major, self.id, &self.name)
            .with_link(EntityKind::Academy, self.academy_id)
    }
}

impl Listing for Major {
    const KIND: EntityKind = EntityKind::Major;

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::field("ID", |m: &Major| m.id.to_string()),
            Column::field("Name", |m: &Major| m.name.clone()),
            Column::reference(
                "Academy",
                Chain::single(Extractor::new(
                    "academyId",
                    EntityKind::Academy,
                    |m: &Major| m.academy_id,
                )),
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Academy {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub dean: Option<String>,
}

impl Referent for Academy {
    fn to_ref(&self) -> ResolvedRef {
        ResolvedRef::new(EntityKind::Academy, self.id, &self.name)
    }
}

impl Listing for Academy {
    const KIND: EntityKind = EntityKind::Academy;

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::field("ID", |a: &Academy| a.id.to_string()),
            Column::field("Name", |a: &Academy| a.name.clone()),
            Column::field("Dean", |a: &Academy| opt_str(&a.dean)),
        ]
    }
}

/// A tuition payment record. `status` is the backend's free-text state
/// (e.g. `已缴费` / `未缴费`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    #[serde(default)]
    pub student_id: Option<i64>,
    pub amount: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub paid_on: Option<NaiveDate>,
}

impl Listing for Payment {
    const KIND: EntityKind = EntityKind::Payment;

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::field("ID", |p: &Payment| p.id.to_string()),
            Column::reference(
                "Student",
                Chain::single(Extractor::new(
                    "studentId",
                    EntityKind::Student,
                    |p: &Payment| p.student_id,
                )),
            ),
            Column::field("Amount", |p: &Payment| format!("{:.2}", p.amount)),
            Column::field("Status", |p: &Payment| opt_str(&p.status)),
            Column::field("Paid on", |p: &Payment| {
                p.paid_on
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_owned())
            }),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub id: i64,
    #[serde(default)]
    pub student_id: Option<i64>,
    pub course: String,
    #[serde(default)]
    pub term: Option<String>,
    pub score: f64,
}

impl Listing for Score {
    const KIND: EntityKind = EntityKind::Score;

    fn columns() -> Vec<Column<Self>> {
        let student = Extractor::new("studentId", EntityKind::Student, |s: &Score| s.student_id);
        vec![
            Column::field("ID", |s: &Score| s.id.to_string()),
            Column::reference("Student", Chain::single(student)),
            Column::reference("Class", Chain::single(student).then(EntityKind::Class)),
            Column::field("Course", |s: &Score| s.course.clone()),
            Column::field("Term", |s: &Score| opt_str(&s.term)),
            Column::field("Score", |s: &Score| format!("{:.1}", s.score)),
        ]
    }
}

/// Raw foreign-key rendering used when no resolved name is available.
pub fn raw_id(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_owned())
}
