use rusqlite::{params, Row};

use super::{new_id, optional, Database, DatabaseError, Result};
use crate::models::{InterviewQnA, InterviewSession, QuestionType};
use crate::schema::NOW_SQL;

const QNA_COLUMNS: &str =
    "id, interviewSessionId, question, answer, questionType, aiFeedback, createdAt, updatedAt";

impl Database {
    /// Opens a mock-interview session, optionally tied to a scraped job.
    pub fn start_interview_session(
        &self,
        user_id: &str,
        job_id: Option<&str>,
    ) -> Result<InterviewSession> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO interview_sessions (id, userId, jobId) VALUES (?1, ?2, ?3)",
            params![id, user_id, job_id],
        )?;
        tracing::debug!(session_id = %id, user_id, "interview session started");
        self.get_interview_session(&id)?
            .ok_or_else(|| DatabaseError::not_found("interview session", id.clone()))
    }

    pub fn get_interview_session(&self, id: &str) -> Result<Option<InterviewSession>> {
        optional(self.conn.query_row(
            "SELECT id, userId, jobId, createdAt, updatedAt FROM interview_sessions WHERE id = ?1",
            [id],
            Self::row_to_session,
        ))
    }

    pub fn list_sessions(&self, user_id: &str) -> Result<Vec<InterviewSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, userId, jobId, createdAt, updatedAt FROM interview_sessions
             WHERE userId = ?1 ORDER BY createdAt DESC",
        )?;
        let rows = stmt.query_map([user_id], Self::row_to_session)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn add_interview_qna(
        &self,
        session_id: &str,
        question: &str,
        question_type: QuestionType,
        ai_feedback: &str,
    ) -> Result<InterviewQnA> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO interview_qna (id, interviewSessionId, question, questionType, aiFeedback)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, session_id, question, question_type, ai_feedback],
        )?;
        self.touch_session(session_id)?;
        self.get_qna(&id)?
            .ok_or_else(|| DatabaseError::not_found("interview question", id.clone()))
    }

    /// Records the candidate's answer and the feedback on it.
    pub fn answer_question(&self, qna_id: &str, answer: &str, ai_feedback: &str) -> Result<InterviewQnA> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE interview_qna SET answer = ?2, aiFeedback = ?3, updatedAt = {} WHERE id = ?1",
                NOW_SQL
            ),
            params![qna_id, answer, ai_feedback],
        )?;
        if changed == 0 {
            return Err(DatabaseError::not_found("interview question", qna_id));
        }
        let qna = self
            .get_qna(qna_id)?
            .ok_or_else(|| DatabaseError::not_found("interview question", qna_id))?;
        self.touch_session(&qna.interview_session_id)?;
        Ok(qna)
    }

    pub fn get_qna(&self, id: &str) -> Result<Option<InterviewQnA>> {
        optional(self.conn.query_row(
            &format!("SELECT {} FROM interview_qna WHERE id = ?1", QNA_COLUMNS),
            [id],
            Self::row_to_qna,
        ))
    }

    /// Questions of a session in the order they were asked.
    pub fn list_qna(&self, session_id: &str) -> Result<Vec<InterviewQnA>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM interview_qna WHERE interviewSessionId = ?1 ORDER BY createdAt, rowid",
            QNA_COLUMNS
        ))?;
        let rows = stmt.query_map([session_id], Self::row_to_qna)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Deletes a session and, by cascade, all of its questions.
    pub fn delete_interview_session(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM interview_sessions WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(DatabaseError::not_found("interview session", id));
        }
        Ok(())
    }

    fn touch_session(&self, id: &str) -> Result<()> {
        self.conn.execute(
            &format!("UPDATE interview_sessions SET updatedAt = {} WHERE id = ?1", NOW_SQL),
            [id],
        )?;
        Ok(())
    }

    fn row_to_session(row: &Row) -> rusqlite::Result<InterviewSession> {
        Ok(InterviewSession {
            id: row.get(0)?,
            user_id: row.get(1)?,
            job_id: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn row_to_qna(row: &Row) -> rusqlite::Result<InterviewQnA> {
        Ok(InterviewQnA {
            id: row.get(0)?,
            interview_session_id: row.get(1)?,
            question: row.get(2)?,
            answer: row.get(3)?,
            question_type: row.get(4)?,
            ai_feedback: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;

    #[test]
    fn test_session_without_job() {
        let db = test_support::db();
        test_support::user(&db, "u1", "a@example.com");
        let session = db.start_interview_session("u1", None).unwrap();
        assert!(session.job_id.is_none());
        assert_eq!(db.list_sessions("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_questions_are_answered_in_order() {
        let db = test_support::db();
        test_support::user(&db, "u1", "a@example.com");
        let job = test_support::scraped_job_id(&db, "https://jobs.example/1");
        let session = db.start_interview_session("u1", Some(&job)).unwrap();

        let q1 = db
            .add_interview_qna(&session.id, "Tell me about a conflict.", QuestionType::Behavioral, "Pending")
            .unwrap();
        db.add_interview_qna(&session.id, "Explain ownership.", QuestionType::Technical, "Pending")
            .unwrap();
        assert!(q1.answer.is_none());

        let answered = db
            .answer_question(&q1.id, "I listened first.", "Good use of STAR.")
            .unwrap();
        assert_eq!(answered.answer.as_deref(), Some("I listened first."));
        assert_eq!(answered.ai_feedback, "Good use of STAR.");

        let qna = db.list_qna(&session.id).unwrap();
        assert_eq!(qna.len(), 2);
        assert_eq!(qna[0].id, q1.id);
        assert_eq!(qna[1].question_type, QuestionType::Technical);
    }

    #[test]
    fn test_questions_touch_their_session() {
        let db = test_support::db();
        test_support::user(&db, "u1", "a@example.com");
        let session = db.start_interview_session("u1", None).unwrap();

        test_support::tick();
        let q = db
            .add_interview_qna(&session.id, "Walk me through a design.", QuestionType::Technical, "Pending")
            .unwrap();
        let asked = db.get_interview_session(&session.id).unwrap().unwrap();
        assert!(asked.updated_at > session.updated_at);

        test_support::tick();
        let answered = db.answer_question(&q.id, "Start from the data.", "Clear.").unwrap();
        assert!(answered.updated_at > q.updated_at);
        let after_answer = db.get_interview_session(&session.id).unwrap().unwrap();
        assert!(after_answer.updated_at > asked.updated_at);
    }

    #[test]
    fn test_deleting_session_cascades_to_questions() {
        let db = test_support::db();
        test_support::user(&db, "u1", "a@example.com");
        let session = db.start_interview_session("u1", None).unwrap();
        let keep = db.start_interview_session("u1", None).unwrap();
        let q = db
            .add_interview_qna(&session.id, "Why us?", QuestionType::Situational, "n/a")
            .unwrap();
        db.add_interview_qna(&keep.id, "Why now?", QuestionType::Situational, "n/a")
            .unwrap();

        db.delete_interview_session(&session.id).unwrap();

        assert!(db.get_qna(&q.id).unwrap().is_none());
        assert!(db.list_qna(&session.id).unwrap().is_empty());
        assert_eq!(db.list_qna(&keep.id).unwrap().len(), 1);
    }

    #[test]
    fn test_question_requires_existing_session() {
        let db = test_support::db();
        let err = db
            .add_interview_qna("no-such-session", "Q", QuestionType::Technical, "f")
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ForeignKeyViolation));
    }

    #[test]
    fn test_user_with_session_cannot_be_deleted() {
        let db = test_support::db();
        test_support::user(&db, "u1", "a@example.com");
        let session = db.start_interview_session("u1", None).unwrap();
        assert!(matches!(
            db.delete_user("u1").unwrap_err(),
            DatabaseError::ForeignKeyViolation
        ));
        db.delete_interview_session(&session.id).unwrap();
        db.delete_user("u1").unwrap();
    }
}
