//! Exam sessions and the schedule export.

use crate::entities::{ClassGroup, ClassScoped, Exam, NotificationType, Page};
use crate::portal::Portal;
use crate::types::{ExamUpdate, NewExam, PortalResult};
use crate::utils::csv::exams_to_csv;
use crate::utils::new_id;

const PAGE: Page = Exam::PAGE;

impl Portal {
    pub async fn create_exam(&self, request: NewExam) -> PortalResult<Exam> {
        let result = self.try_create_exam(request).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_create_exam(&self, request: NewExam) -> PortalResult<Exam> {
        let author = self.require_publisher().await?;
        request.validate()?;
        let class_id = self.target_class(&author, request.class_id.as_deref()).await?;

        let exam = Exam {
            id: new_id(),
            subject: request.subject.trim().to_string(),
            date: request.date,
            duration_minutes: request.duration_minutes,
            room: request.room.trim().to_string(),
            notes: request.notes.filter(|notes| !notes.trim().is_empty()),
            author_id: author.id.clone(),
            class_id,
        };
        let exam = self.create_content(exam).await?;

        self.notify(
            format!("Examen {} ajouté", exam.subject),
            NotificationType::Success,
            Some(PAGE),
        )
        .await;
        Ok(exam)
    }

    pub async fn update_exam(&self, id: &str, patch: ExamUpdate) -> PortalResult<Exam> {
        let result = self.try_update_exam(id, patch).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_update_exam(&self, id: &str, mut patch: ExamUpdate) -> PortalResult<Exam> {
        let author = self.require_publisher().await?;
        patch.validate()?;
        patch.subject = patch.subject.map(|subject| subject.trim().to_string());
        patch.room = patch.room.map(|room| room.trim().to_string());

        let exam: Exam = self.update_content(&author, id, &patch).await?;

        self.notify("Examen modifié", NotificationType::Success, Some(PAGE))
            .await;
        Ok(exam)
    }

    pub async fn delete_exam(&self, id: &str) -> PortalResult<()> {
        let result = self.try_delete_exam(id).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_delete_exam(&self, id: &str) -> PortalResult<()> {
        let author = self.require_publisher().await?;
        let _: Exam = self.delete_content(&author, id).await?;

        self.notify("Examen supprimé", NotificationType::Success, Some(PAGE))
            .await;
        Ok(())
    }

    /// Exam schedule as CSV text, optionally restricted to one class.
    pub async fn export_exams_csv(&self, class_id: Option<&str>) -> PortalResult<String> {
        let result = self.try_export_exams_csv(class_id).await;
        self.report(result, Some(PAGE)).await
    }

    async fn try_export_exams_csv(&self, class_id: Option<&str>) -> PortalResult<String> {
        self.acting_user().await?;
        let (exams, classes) = {
            let state = self.state.read().await;
            (state.domain.all::<Exam>(), state.domain.all::<ClassGroup>())
        };
        let exams: Vec<Exam> = match class_id {
            Some(class_id) => exams
                .into_iter()
                .filter(|exam| exam.class_id == class_id)
                .collect(),
            None => exams,
        };
        Ok(exams_to_csv(&exams, &classes))
    }
}
