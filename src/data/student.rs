use maud::Render;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudentRecord {
    pub id: i64,
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A fully validated student, ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
}

/// A validated partial update. `None` leaves the column alone; for
/// `middle_name`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentChanges {
    pub student_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<Option<String>>,
}

impl StudentChanges {
    pub fn apply_to(self, record: &mut StudentRecord) {
        let Self {
            student_id,
            first_name,
            last_name,
            middle_name,
        } = self;

        if let Some(student_id) = student_id {
            record.student_id = student_id;
        }
        if let Some(first_name) = first_name {
            record.first_name = first_name;
        }
        if let Some(last_name) = last_name {
            record.last_name = last_name;
        }
        if let Some(middle_name) = middle_name {
            record.middle_name = middle_name;
        }
    }
}

impl Render for StudentRecord {
    fn render_to(&self, buffer: &mut String) {
        let mut name = format!("{}, {}", self.last_name, self.first_name);
        if let Some(middle_name) = &self.middle_name {
            name.push(' ');
            name.push_str(middle_name);
        }
        name.render_to(buffer);
    }
}
