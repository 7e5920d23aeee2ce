//! Domain Services
//!
//! Pure rules: progress arithmetic, lesson ordering, grading and the
//! course-tree cycle check. No I/O here.

use kernel::id::{CourseId, LessonId, ModuleId};

use crate::domain::entities::{Lesson, Module};
use crate::domain::value_objects::SubmissionStatus;

/// `round(completed / total * 100, 2)`, or 0 for a course without lessons
pub fn compute_progress_percentage(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let completed = completed.min(total);
    ((completed as f64 / total as f64) * 10_000.0).round() / 100.0
}

/// Published lessons of a course in reading order: by the owning module's
/// `sort_order`, then the lesson's own `sort_order`.
///
/// Lessons whose module is not in `modules` are left out.
pub fn ordered_published_lessons<'a>(modules: &[Module], lessons: &'a [Lesson]) -> Vec<&'a Lesson> {
    let module_rank = |module_id: &ModuleId| {
        modules
            .iter()
            .enumerate()
            .find(|(_, m)| &m.module_id == module_id)
            .map(|(index, m)| (m.sort_order, index))
    };

    let mut ordered: Vec<((i32, usize), &Lesson)> = lessons
        .iter()
        .filter(|l| l.is_published())
        .filter_map(|l| module_rank(&l.module_id).map(|rank| (rank, l)))
        .collect();

    ordered.sort_by(|(a_rank, a), (b_rank, b)| {
        a_rank
            .cmp(b_rank)
            .then(a.sort_order.cmp(&b.sort_order))
            .then_with(|| a.title.cmp(&b.title))
    });

    ordered.into_iter().map(|(_, lesson)| lesson).collect()
}

/// Neighbours of a lesson within an ordered sequence
#[derive(Debug, Clone, Copy)]
pub struct Neighbours<'a> {
    pub previous: Option<&'a Lesson>,
    pub next: Option<&'a Lesson>,
}

/// Both sides are `None` when the lesson is not in the sequence (a draft
/// being previewed, for instance).
pub fn lesson_neighbours<'a>(ordered: &[&'a Lesson], current: &LessonId) -> Neighbours<'a> {
    let Some(index) = ordered.iter().position(|l| &l.lesson_id == current) else {
        return Neighbours {
            previous: None,
            next: None,
        };
    };

    Neighbours {
        previous: index.checked_sub(1).map(|i| ordered[i]),
        next: ordered.get(index + 1).copied(),
    }
}

/// Literal comparison after trimming surrounding whitespace. Exercise
/// authoring guarantees a non-blank solution, so blank code never passes.
pub fn grade_submission(code: &str, solution: &str) -> SubmissionStatus {
    if code.trim() == solution.trim() {
        SubmissionStatus::Passed
    } else {
        SubmissionStatus::Failed
    }
}

/// Whether making `parent` the parent of `course` closes a loop.
///
/// `parent_ancestors` is the chain above `parent` (its parent, grandparent,
/// and so on).
pub fn would_create_cycle(course: &CourseId, parent: &CourseId, parent_ancestors: &[CourseId]) -> bool {
    parent == course || parent_ancestors.contains(course)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{ContentType, PublishStatus, Slug};
    use chrono::Utc;

    fn module(course_id: CourseId, sort_order: i32) -> Module {
        Module {
            module_id: ModuleId::new(),
            course_id,
            title: format!("Module {sort_order}"),
            description: String::new(),
            sort_order,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn lesson(module: &Module, slug: &str, sort_order: i32, status: PublishStatus) -> Lesson {
        Lesson {
            lesson_id: LessonId::new(),
            module_id: module.module_id,
            course_id: module.course_id,
            slug: Slug::new(slug).unwrap(),
            title: slug.to_uppercase(),
            content: String::new(),
            status,
            content_type: ContentType::Markdown,
            video_url: None,
            duration_minutes: None,
            sort_order,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_progress_rounding() {
        assert_eq!(compute_progress_percentage(0, 0), 0.0);
        assert_eq!(compute_progress_percentage(5, 0), 0.0);
        assert_eq!(compute_progress_percentage(0, 4), 0.0);
        assert_eq!(compute_progress_percentage(1, 3), 33.33);
        assert_eq!(compute_progress_percentage(2, 3), 66.67);
        assert_eq!(compute_progress_percentage(1, 8), 12.5);
        assert_eq!(compute_progress_percentage(3, 3), 100.0);
    }

    #[test]
    fn test_progress_matches_formula_across_range() {
        for total in 1..=40u64 {
            for completed in 0..=total {
                let expected =
                    (completed as f64 / total as f64 * 100.0 * 100.0).round() / 100.0;
                let actual = compute_progress_percentage(completed, total);
                assert!((actual - expected).abs() < 1e-9, "{completed}/{total}");
                assert!((0.0..=100.0).contains(&actual));
            }
        }
    }

    #[test]
    fn test_ordering_follows_module_then_lesson() {
        let course = CourseId::new();
        // Inserted out of order on purpose
        let m2 = module(course, 2);
        let m1 = module(course, 1);
        let lessons = vec![
            lesson(&m2, "l3", 1, PublishStatus::Published),
            lesson(&m1, "l2", 2, PublishStatus::Published),
            lesson(&m1, "draft", 3, PublishStatus::Draft),
            lesson(&m1, "l1", 1, PublishStatus::Published),
        ];
        let modules = vec![m2, m1];

        let ordered = ordered_published_lessons(&modules, &lessons);
        let slugs: Vec<&str> = ordered.iter().map(|l| l.slug.as_str()).collect();
        assert_eq!(slugs, vec!["l1", "l2", "l3"]);
    }

    #[test]
    fn test_neighbours_at_boundaries() {
        let course = CourseId::new();
        let m1 = module(course, 1);
        let lessons = vec![
            lesson(&m1, "a", 1, PublishStatus::Published),
            lesson(&m1, "b", 2, PublishStatus::Published),
            lesson(&m1, "c", 3, PublishStatus::Published),
        ];
        let modules = vec![m1];
        let ordered = ordered_published_lessons(&modules, &lessons);

        let first = lesson_neighbours(&ordered, &lessons[0].lesson_id);
        assert!(first.previous.is_none());
        assert_eq!(first.next.map(|l| l.slug.as_str()), Some("b"));

        let middle = lesson_neighbours(&ordered, &lessons[1].lesson_id);
        assert_eq!(middle.previous.map(|l| l.slug.as_str()), Some("a"));
        assert_eq!(middle.next.map(|l| l.slug.as_str()), Some("c"));

        let last = lesson_neighbours(&ordered, &lessons[2].lesson_id);
        assert_eq!(last.previous.map(|l| l.slug.as_str()), Some("b"));
        assert!(last.next.is_none());
    }

    #[test]
    fn test_single_lesson_has_no_neighbours() {
        let m1 = module(CourseId::new(), 1);
        let lessons = vec![lesson(&m1, "only", 1, PublishStatus::Published)];
        let modules = vec![m1];
        let ordered = ordered_published_lessons(&modules, &lessons);

        let n = lesson_neighbours(&ordered, &lessons[0].lesson_id);
        assert!(n.previous.is_none() && n.next.is_none());
        let unknown = lesson_neighbours(&ordered, &LessonId::new());
        assert!(unknown.previous.is_none() && unknown.next.is_none());
    }

    #[test]
    fn test_grading_trims_whitespace() {
        assert_eq!(
            grade_submission("  print('hi')\n", "print('hi')"),
            SubmissionStatus::Passed
        );
        assert_eq!(
            grade_submission("print('hi') ", "\n\tprint('hi')\n"),
            SubmissionStatus::Passed
        );
        assert_eq!(
            grade_submission("print( 'hi')", "print('hi')"),
            SubmissionStatus::Failed
        );
        assert_eq!(grade_submission("PRINT('hi')", "print('hi')"), SubmissionStatus::Failed);
    }

    #[test]
    fn test_grading_is_plain_trimmed_equality() {
        assert_eq!(grade_submission("   ", ""), SubmissionStatus::Passed);
        assert_eq!(grade_submission("   ", "x = 1"), SubmissionStatus::Failed);
    }

    #[test]
    fn test_cycle_detection() {
        let root = CourseId::new();
        let child = CourseId::new();
        let grandchild = CourseId::new();

        assert!(would_create_cycle(&root, &root, &[]));
        // root -> child -> grandchild; making grandchild root's parent loops
        assert!(would_create_cycle(&root, &grandchild, &[child, root]));
        assert!(!would_create_cycle(&grandchild, &root, &[]));
        assert!(!would_create_cycle(&child, &root, &[]));
    }
}
