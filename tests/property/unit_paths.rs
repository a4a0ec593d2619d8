//! Enumeration over arbitrary plan shapes: one unit per part intro, chapter or section,
//! each with its own destination, always in the same order.

use bookwright::plan::{BookLanguage, BookPlan, ChapterBody, ChapterPlan, PartPlan, SectionPlan, WordRange};
use bookwright::unit::{enumerate, UnitKind};
use proptest::prelude::*;
use std::collections::HashSet;

/// `None` is a bullet-driven chapter, `Some(n)` a chapter with `n` sections.
fn plan_from_shape(shape: &[Vec<Option<usize>>]) -> BookPlan {
    let parts = shape
        .iter()
        .enumerate()
        .map(|(p, chapters)| PartPlan {
            name: format!("Part {}", p + 1),
            introduction: "Introduction".to_string(),
            chapters: chapters
                .iter()
                .enumerate()
                .map(|(c, sections)| ChapterPlan {
                    name: format!("Chapter {}", c + 1),
                    body: match sections {
                        None => ChapterBody::BulletDriven {
                            bullet_points: vec!["point".to_string()],
                            word_range: WordRange::CHAPTER,
                        },
                        Some(n) => ChapterBody::Sectioned(
                            (0..*n)
                                .map(|s| SectionPlan {
                                    name: format!("Section {}", s + 1),
                                    bullet_points: vec!["point".to_string()],
                                    word_range: WordRange::SECTION,
                                })
                                .collect(),
                        ),
                    },
                })
                .collect(),
        })
        .collect();

    BookPlan {
        book_language: BookLanguage::En,
        name: "Generated".to_string(),
        slug: "generated".to_string(),
        target_reader: "Readers".to_string(),
        back_cover_description: String::new(),
        tone: "popular science".to_string(),
        parts,
    }
}

fn shape_strategy() -> impl Strategy<Value = Vec<Vec<Option<usize>>>> {
    prop::collection::vec(
        prop::collection::vec(prop::option::of(1usize..12), 1..8),
        1..6,
    )
}

proptest! {
    #[test]
    fn destinations_are_unique(shape in shape_strategy()) {
        let plan = plan_from_shape(&shape);
        prop_assert!(plan.validate().is_ok());
        let units = enumerate(&plan);
        let destinations: HashSet<_> = units.iter().map(|u| u.destination.clone()).collect();
        prop_assert_eq!(destinations.len(), units.len());
    }

    #[test]
    fn unit_count_matches_shape(shape in shape_strategy()) {
        let plan = plan_from_shape(&shape);
        let expected: usize = shape
            .iter()
            .map(|chapters| 1 + chapters.iter().map(|c| c.unwrap_or(1)).sum::<usize>())
            .sum();
        let units = enumerate(&plan);
        prop_assert_eq!(units.len(), expected);
        let intros = units.iter().filter(|u| u.kind() == UnitKind::PartIntro).count();
        prop_assert_eq!(intros, shape.len());
    }

    #[test]
    fn enumeration_is_stable(shape in shape_strategy()) {
        let plan = plan_from_shape(&shape);
        let first: Vec<_> = enumerate(&plan).into_iter().map(|u| u.destination).collect();
        let second: Vec<_> = enumerate(&plan).into_iter().map(|u| u.destination).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_unit_but_the_first_has_a_predecessor(shape in shape_strategy()) {
        let units = enumerate(&plan_from_shape(&shape));
        prop_assert!(units[0].preceding.is_none());
        for pair in units.windows(2) {
            prop_assert_eq!(pair[1].preceding.as_ref(), Some(&pair[0].destination));
        }
    }
}
