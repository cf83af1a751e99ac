// Exam scoring
// Auto-gradable questions are matched against submitted answers; essay
// questions with no stored answer never auto-match


use std::collections::HashMap;

use crate::database::sqlite::models::ExamQuestion;

/// Result of grading one submitted answer set
#[derive(Debug, Clone, PartialEq)]
pub struct ExamGrade {
    /// Percentage score, or `None` for an exam with no questions
    pub score: Option<f64>,
    pub correct: usize,
    pub total: usize,
    /// Whether the score met the passing threshold; `None` when ungraded
    pub passed: Option<bool>,
}

/// Percentage of questions answered correctly, or `None` for an empty exam
#[inline]
pub fn score_answers(questions: &[ExamQuestion], answers: &HashMap<i64, String>) -> Option<f64> {
    if questions.is_empty() {
        return None;
    }

    let correct = count_correct(questions, answers);
    Some(correct as f64 / questions.len() as f64 * 100.0)
}

/// Grade an answer set against a passing threshold
#[inline]
pub fn grade(
    questions: &[ExamQuestion],
    answers: &HashMap<i64, String>,
    passing_score: f64,
) -> ExamGrade {
    let score = score_answers(questions, answers);

    ExamGrade {
        score,
        correct: count_correct(questions, answers),
        total: questions.len(),
        passed: score.map(|s| s >= passing_score),
    }
}

fn count_correct(questions: &[ExamQuestion], answers: &HashMap<i64, String>) -> usize {
    questions
        .iter()
        .filter(|question| match (&question.correct_answer, answers.get(&question.id)) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        })
        .count()
}
