//! 统计计算
//!
//! 纯函数：输入为组织架构、作业列表与投影快照，输出各范围的统计。
//! 已归档作业不计入，只统计在册学生的有效提交。

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use super::projection::FactTable;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    ClassId, HomeworkId, SchoolId, UserId,
    directory::entities::ClassRoster,
    events::entities::SubmissionFact,
    homeworks::entities::Homework,
    stats::entities::{
        ClassStats, HomeworkStats, SchoolStats, ScopeStats, ScoreRange, StatsScope, StudentStats,
        SubmissionTotals, TrendPoint, TrendStats,
    },
    submissions::entities::SubmissionStatus,
};

#[derive(Debug, Default)]
struct Tally {
    submitted: u64,
    pending: u64,
    reviewed: u64,
    graded: u64,
    late: u64,
    grade_sum: f64,
    grades: Vec<f64>,
}

impl Tally {
    fn into_totals(self, expected: u64) -> (SubmissionTotals, Vec<f64>) {
        let completed = self.reviewed + self.graded;
        // 已交即计入完成率，Pending 只表示尚未批阅
        let completion_rate = if expected == 0 {
            0.0
        } else {
            (self.submitted as f64 * 100.0 / expected as f64).clamp(0.0, 100.0)
        };
        let average_grade = (self.graded > 0).then(|| self.grade_sum / self.graded as f64);

        (
            SubmissionTotals {
                expected_submissions: expected,
                submitted_count: self.submitted,
                completed_count: completed,
                pending_count: self.pending,
                reviewed_count: self.reviewed,
                graded_count: self.graded,
                late_count: self.late,
                average_grade,
                completion_rate,
            },
            self.grades,
        )
    }
}

/// 目标作业（作业 -> 所属班级）中在册学生的有效提交
fn eligible<'a>(
    targets: &'a HashMap<HomeworkId, &'a ClassRoster>,
    facts: &'a FactTable,
    student: Option<UserId>,
) -> impl Iterator<Item = &'a SubmissionFact> {
    facts.values().filter(move |fact| {
        fact.is_active
            && student.is_none_or(|id| id == fact.student_id)
            && targets
                .get(&fact.homework_id)
                .is_some_and(|roster| roster.has_student(&fact.student_id))
    })
}

fn tally(
    targets: &HashMap<HomeworkId, &ClassRoster>,
    facts: &FactTable,
    student: Option<UserId>,
) -> Tally {
    let mut tally = Tally::default();

    for fact in eligible(targets, facts, student) {
        tally.submitted += 1;
        if fact.is_late {
            tally.late += 1;
        }
        match fact.status {
            SubmissionStatus::Pending => tally.pending += 1,
            SubmissionStatus::Reviewed => tally.reviewed += 1,
            SubmissionStatus::Graded => {
                tally.graded += 1;
                if let Some(grade) = fact.grade {
                    tally.grade_sum += grade;
                    tally.grades.push(grade);
                }
            }
        }
    }

    tally
}

fn targets_for<'a>(
    homeworks: &'a [Homework],
    classes: &[&'a ClassRoster],
) -> HashMap<HomeworkId, &'a ClassRoster> {
    let by_class: HashMap<_, &ClassRoster> = classes.iter().map(|c| (c.id, *c)).collect();
    homeworks
        .iter()
        .filter(|h| !h.is_archived())
        .filter_map(|h| by_class.get(&h.class_id).map(|roster| (h.id, *roster)))
        .collect()
}

fn expected_for(targets: &HashMap<HomeworkId, &ClassRoster>) -> u64 {
    targets.values().map(|roster| roster.enrolled() as u64).sum()
}

pub fn class_stats(roster: &ClassRoster, homeworks: &[Homework], facts: &FactTable) -> ClassStats {
    let targets = targets_for(homeworks, &[roster]);
    let (totals, _) = tally(&targets, facts, None).into_totals(expected_for(&targets));

    ClassStats {
        class_id: roster.id,
        enrolled_students: roster.enrolled() as u64,
        homework_count: targets.len() as u64,
        totals,
    }
}

pub fn student_stats(
    student_id: UserId,
    classes: &[&ClassRoster],
    homeworks: &[Homework],
    facts: &FactTable,
) -> StudentStats {
    let targets = targets_for(homeworks, classes);
    let expected = targets.len() as u64;
    let (totals, _) = tally(&targets, facts, Some(student_id)).into_totals(expected);

    StudentStats {
        student_id,
        class_count: classes.len() as u64,
        homework_count: expected,
        totals,
    }
}

pub fn school_stats(
    school_id: SchoolId,
    classes: &[&ClassRoster],
    homeworks: &[Homework],
    facts: &FactTable,
) -> SchoolStats {
    let targets = targets_for(homeworks, classes);
    let (totals, _) = tally(&targets, facts, None).into_totals(expected_for(&targets));
    let students: BTreeSet<&UserId> = classes.iter().flat_map(|c| &c.student_ids).collect();

    SchoolStats {
        school_id,
        class_count: classes.len() as u64,
        enrolled_students: students.len() as u64,
        homework_count: targets.len() as u64,
        totals,
    }
}

#[derive(Debug, Default)]
struct DayBucket {
    submitted: u64,
    graded: u64,
    grade_sum: f64,
}

/// 按天汇总提交与评分，BTreeMap 保证日期升序且与事件顺序无关
fn trend_points(
    targets: &HashMap<HomeworkId, &ClassRoster>,
    facts: &FactTable,
    student: Option<UserId>,
) -> Vec<TrendPoint> {
    let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();

    for fact in eligible(targets, facts, student) {
        days.entry(fact.submitted_at.date_naive())
            .or_default()
            .submitted += 1;

        if fact.status == SubmissionStatus::Graded
            && let (Some(graded_at), Some(grade)) = (fact.graded_at, fact.grade)
        {
            let day = days.entry(graded_at.date_naive()).or_default();
            day.graded += 1;
            day.grade_sum += grade;
        }
    }

    days.into_iter()
        .map(|(date, day)| TrendPoint {
            date,
            submitted_count: day.submitted,
            graded_count: day.graded,
            average_grade: (day.graded > 0).then(|| day.grade_sum / day.graded as f64),
        })
        .collect()
}

pub fn class_trend(roster: &ClassRoster, homeworks: &[Homework], facts: &FactTable) -> TrendStats {
    let targets = targets_for(homeworks, &[roster]);
    let (totals, _) = tally(&targets, facts, None).into_totals(expected_for(&targets));

    TrendStats {
        totals,
        points: trend_points(&targets, facts, None),
    }
}

pub fn student_trend(
    student_id: UserId,
    classes: &[&ClassRoster],
    homeworks: &[Homework],
    facts: &FactTable,
) -> TrendStats {
    let targets = targets_for(homeworks, classes);
    let (totals, _) =
        tally(&targets, facts, Some(student_id)).into_totals(targets.len() as u64);

    TrendStats {
        totals,
        points: trend_points(&targets, facts, Some(student_id)),
    }
}

fn find_class(classes: &[ClassRoster], class_id: ClassId) -> Result<&ClassRoster> {
    classes
        .iter()
        .find(|c| c.id == class_id)
        .ok_or_else(|| HWSystemError::not_found(format!("班级不存在: {class_id}")))
}

fn enrolled_classes(classes: &[ClassRoster], student_id: UserId) -> Result<Vec<&ClassRoster>> {
    let enrolled: Vec<&ClassRoster> =
        classes.iter().filter(|c| c.has_student(&student_id)).collect();
    if enrolled.is_empty() {
        return Err(HWSystemError::not_found(format!(
            "学生未加入任何班级: {student_id}"
        )));
    }
    Ok(enrolled)
}

fn score_distribution(grades: &[f64]) -> Vec<ScoreRange> {
    let mut counts = [0u64; 5];
    for grade in grades {
        let bucket = if *grade >= 90.0 {
            0
        } else if *grade >= 80.0 {
            1
        } else if *grade >= 70.0 {
            2
        } else if *grade >= 60.0 {
            3
        } else {
            4
        };
        counts[bucket] += 1;
    }

    ["90-100", "80-89", "70-79", "60-69", "0-59"]
        .iter()
        .zip(counts)
        .map(|(range, count)| ScoreRange {
            range: range.to_string(),
            count,
        })
        .collect()
}

pub fn homework_stats(homework: &Homework, roster: &ClassRoster, facts: &FactTable) -> HomeworkStats {
    let targets = HashMap::from([(homework.id, roster)]);
    let (totals, grades) = tally(&targets, facts, None).into_totals(roster.enrolled() as u64);

    let submitted: BTreeSet<UserId> = facts
        .values()
        .filter(|f| f.is_active && f.homework_id == homework.id)
        .map(|f| f.student_id)
        .collect();
    let unsubmitted_students = roster
        .student_ids
        .iter()
        .filter(|id| !submitted.contains(id))
        .copied()
        .collect();

    HomeworkStats {
        homework_id: homework.id,
        class_id: roster.id,
        enrolled_students: roster.enrolled() as u64,
        min_grade: grades.iter().copied().reduce(f64::min),
        max_grade: grades.iter().copied().reduce(f64::max),
        score_distribution: score_distribution(&grades),
        unsubmitted_students,
        totals,
    }
}

/// 计算指定范围的统计
pub fn compute(
    scope: StatsScope,
    classes: &[ClassRoster],
    homeworks: &[Homework],
    facts: &FactTable,
) -> Result<ScopeStats> {
    match scope {
        StatsScope::Class(class_id) => {
            let roster = find_class(classes, class_id)?;
            Ok(ScopeStats::Class(class_stats(roster, homeworks, facts)))
        }
        StatsScope::ClassTrend(class_id) => {
            let roster = find_class(classes, class_id)?;
            Ok(ScopeStats::ClassTrend(class_trend(roster, homeworks, facts)))
        }
        StatsScope::StudentTrend(student_id) => {
            let enrolled = enrolled_classes(classes, student_id)?;
            Ok(ScopeStats::StudentTrend(student_trend(
                student_id, &enrolled, homeworks, facts,
            )))
        }
        StatsScope::Student(student_id) => {
            let enrolled = enrolled_classes(classes, student_id)?;
            Ok(ScopeStats::Student(student_stats(
                student_id, &enrolled, homeworks, facts,
            )))
        }
        StatsScope::School(school_id) => {
            let members: Vec<&ClassRoster> =
                classes.iter().filter(|c| c.school_id == school_id).collect();
            Ok(ScopeStats::School(school_stats(
                school_id, &members, homeworks, facts,
            )))
        }
        StatsScope::Homework(homework_id) => {
            let homework = homeworks
                .iter()
                .find(|h| h.id == homework_id && !h.is_archived())
                .ok_or_else(|| HWSystemError::not_found(format!("作业不存在: {homework_id}")))?;
            let roster = classes
                .iter()
                .find(|c| c.id == homework.class_id)
                .ok_or_else(|| {
                    HWSystemError::not_found(format!("班级不存在: {}", homework.class_id))
                })?;
            Ok(ScopeStats::Homework(homework_stats(homework, roster, facts)))
        }
    }
}
