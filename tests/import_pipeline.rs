//! End-to-end merge behavior of the importer over realistic multi-source
//! batches, without touching the store.

use codequest::database::Difficulty;
use codequest::importer::Importer;

const AMAZON: &str = r#"[
    {"title": "Two Sum", "link": "/problems/two-sum/", "difficulty": "Easy", "topics": ["Array", "Hash Table"]},
    {"title": "LRU Cache", "link": "https://leetcode.com/problems/lru-cache/", "difficulty": "Medium", "topics": "Design"},
    {"title": "", "link": ""},
    {"difficulty": "Hard"}
]"#;

const GOOGLE: &str = r#"[
    {"title": "Two Sum", "link": "/problems/two-sum/", "difficulty": "Medium", "topics": ["Array", "Math"]},
    {"title": "Median of Two Sorted Arrays", "link": "/problems/median-of-two-sorted-arrays/", "difficulty": "Hard"}
]"#;

fn run_import(batches: &[(&str, &str)]) -> (Vec<codequest::database::Question>, codequest::importer::ImportReport) {
    let mut importer = Importer::new();
    for (source, payload) in batches {
        importer.ingest_json(source, payload);
    }
    importer.finish()
}

#[test]
fn two_sources_merge_into_canonical_questions() {
    let (questions, report) = run_import(&[("Amazon", AMAZON), ("Google", GOOGLE)]);

    assert_eq!(report.batches, 2);
    assert_eq!(report.processed, 6);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.unique, 3);
    assert!(report.batch_errors.is_empty());

    let two_sum = questions.iter().find(|q| q.id == "two-sum").expect("two-sum");
    assert_eq!(two_sum.companies, vec!["Amazon", "Google"]);
    assert_eq!(two_sum.topics, vec!["Array", "Hash Table", "Math"]);
    // Amazon was processed first, so its difficulty sticks.
    assert_eq!(two_sum.difficulty, Difficulty::Easy);
    assert_eq!(two_sum.source_url, "https://leetcode.com/problems/two-sum/");

    let median = questions
        .iter()
        .find(|q| q.id == "median-of-two-sorted-arrays")
        .expect("median");
    assert_eq!(median.companies, vec!["Google"]);
    assert_eq!(median.difficulty, Difficulty::Hard);
}

#[test]
fn rerunning_the_same_batches_is_idempotent() {
    let (first, _) = run_import(&[("Amazon", AMAZON), ("Google", GOOGLE)]);
    let (second, report) = run_import(&[
        ("Amazon", AMAZON),
        ("Google", GOOGLE),
        ("Amazon", AMAZON),
        ("Google", GOOGLE),
    ]);

    assert_eq!(report.unique, first.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.title, b.title);
        assert_eq!(a.difficulty, b.difficulty);
        assert_eq!(a.companies, b.companies);
        assert_eq!(a.topics, b.topics);
        assert_eq!(a.source_url, b.source_url);
    }
}

#[test]
fn source_order_only_affects_scalar_winners_not_sets() {
    let (forward, _) = run_import(&[("Amazon", AMAZON), ("Google", GOOGLE)]);
    let (reverse, _) = run_import(&[("Google", GOOGLE), ("Amazon", AMAZON)]);

    let fwd = forward.iter().find(|q| q.id == "two-sum").expect("two-sum");
    let rev = reverse.iter().find(|q| q.id == "two-sum").expect("two-sum");

    // Sets agree regardless of processing order.
    let mut fwd_companies = fwd.companies.clone();
    let mut rev_companies = rev.companies.clone();
    fwd_companies.sort();
    rev_companies.sort();
    assert_eq!(fwd_companies, rev_companies);

    let mut fwd_topics = fwd.topics.clone();
    let mut rev_topics = rev.topics.clone();
    fwd_topics.sort();
    rev_topics.sort();
    assert_eq!(fwd_topics, rev_topics);

    // Scalars follow whichever source came first.
    assert_eq!(fwd.difficulty, Difficulty::Easy);
    assert_eq!(rev.difficulty, Difficulty::Medium);
}

#[test]
fn a_broken_batch_does_not_poison_the_run() {
    let (questions, report) = run_import(&[
        ("Broken", "this is not json"),
        ("Amazon", AMAZON),
    ]);

    assert_eq!(report.batch_errors.len(), 1);
    assert_eq!(report.batch_errors[0].source, "Broken");
    assert_eq!(report.unique, 2);
    assert!(questions.iter().any(|q| q.id == "two-sum"));
    assert!(questions.iter().any(|q| q.id == "lru-cache"));
}
