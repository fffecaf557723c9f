use tracing::info;

use super::LifecycleEngine;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    SubmissionId,
    actors::entities::Actor,
    events::entities::EventKind,
    submissions::entities::{AiAnalysis, Submission},
};
use crate::services::authz;

fn check_score(name: &str, value: Option<f64>, max: f64) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || !(0.0..=max).contains(&v) => Err(
            HWSystemError::out_of_range(format!("{name} 必须在 0 到 {max} 之间: {v}")),
        ),
        _ => Ok(()),
    }
}

/// 附加 AI 分析结果（仅作参考，不改变状态与成绩）
pub async fn attach_ai_analysis(
    engine: &LifecycleEngine,
    actor: &Actor,
    submission_id: SubmissionId,
    analysis: AiAnalysis,
) -> Result<Submission> {
    check_score("completeness_score", analysis.completeness_score, 100.0)?;
    check_score("clarity_score", analysis.clarity_score, 100.0)?;
    check_score("accuracy_score", analysis.accuracy_score, 100.0)?;
    check_score("estimated_grade", analysis.estimated_grade, 100.0)?;
    check_score("confidence", analysis.confidence, 1.0)?;

    let submission = engine
        .ctx()
        .mutate_submission(actor, submission_id, "attach_ai_analysis", |view| {
            authz::ensure_teacher_of_record(actor, &view.roster)?;

            let mut record = view.submission.clone();
            record.ai_analysis = Some(analysis.clone());
            Ok((record, EventKind::AnalysisAttached))
        })
        .await?;

    info!("AI analysis attached to submission {}", submission.id);
    Ok(submission)
}
