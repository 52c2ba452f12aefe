//! Property-style checks of the comment planner over every behavior,
//! target type and provider combination.

use infracost_tasks_core::{
    feedback_block, CommentFormat, CommentPlanner, CommentRequest, OutputFormat, RepoProvider,
    ReportPaths, TargetType, TaskError, UpdateBehavior,
};

const TARGETS: [TargetType; 2] = [TargetType::PullRequest, TargetType::Commit];

fn providers() -> Vec<RepoProvider> {
    vec![
        RepoProvider::GitHub,
        RepoProvider::AzureRepos,
        RepoProvider::from_id("Bitbucket"),
        RepoProvider::from_id("TfsVersionControl"),
    ]
}

#[test]
fn test_json_arrays_keep_order() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["a.json"],
        vec!["a.json", "b.json"],
        vec!["z/plan.json", "a/plan.json", "m/plan.json"],
        vec!["with space.json", "unicodé.json", "a.json"],
    ];

    for case in cases {
        let raw = serde_json::to_string(&case).unwrap();
        let paths = CommentPlanner::normalize_report_paths(&raw).unwrap();
        assert_eq!(paths.as_slice(), case.as_slice(), "input {}", raw);
    }
}

#[test]
fn test_non_json_strings_are_literal() {
    for raw in [
        "infracost.json",
        "/tmp/infracost base.json",
        "C:\\reports\\infracost.json",
        "[not json",
        "{unterminated",
    ] {
        let paths = CommentPlanner::normalize_report_paths(raw).unwrap();
        assert_eq!(paths.into_vec(), vec![raw.to_string()]);
    }
}

#[test]
fn test_non_array_json_is_malformed() {
    for raw in ["{\"path\": \"a.json\"}", "[1, 2]", "[]"] {
        let err = CommentPlanner::normalize_report_paths(raw).unwrap_err();
        assert!(matches!(err, TaskError::MalformedInput(_)), "input {}", raw);
    }
}

#[test]
fn test_only_github_gets_github_format() {
    for provider in providers() {
        let expected = if provider == RepoProvider::GitHub {
            OutputFormat::GithubComment
        } else {
            OutputFormat::AzureReposComment
        };
        assert_eq!(CommentPlanner::select_format(&provider), expected);
    }
}

#[test]
fn test_only_azure_repos_commit_is_rejected() {
    for provider in providers() {
        for target in TARGETS {
            let result = CommentPlanner::validate_target_support(&provider, target);
            let rejected = provider == RepoProvider::AzureRepos && target == TargetType::Commit;
            assert_eq!(result.is_err(), rejected, "{:?} {:?}", provider, target);
        }
    }
}

#[test]
fn test_commit_suppresses_every_note() {
    for behavior in UpdateBehavior::ALL {
        assert_eq!(CommentPlanner::compose_note(TargetType::Commit, behavior), "");
    }
}

#[test]
fn test_every_rendering_ends_with_feedback() {
    let feedback = feedback_block();
    for raw in ["", "## Infracost report\n\n| a | b |\n", "💰 monthly cost"] {
        for target in TARGETS {
            for behavior in UpdateBehavior::ALL {
                for format in [OutputFormat::GithubComment, OutputFormat::AzureReposComment] {
                    let comment = CommentPlanner::render_comment(raw, format, target, behavior);
                    assert!(comment.body().starts_with(raw));
                    assert!(comment.body().ends_with(&feedback));
                    assert!(!comment.body().is_empty());
                }
            }
        }
    }
}

#[test]
fn test_rendering_is_deterministic() {
    let first = CommentPlanner::render_comment(
        "report",
        OutputFormat::AzureReposComment,
        TargetType::PullRequest,
        UpdateBehavior::DeleteAndNew,
    );
    let second = CommentPlanner::render_comment(
        "report",
        OutputFormat::AzureReposComment,
        TargetType::PullRequest,
        UpdateBehavior::DeleteAndNew,
    );
    assert_eq!(first, second);
    assert_eq!(first.format(), CommentFormat::AzureDevopsMarkdown);
}

#[test]
fn test_request_validation_matches_planner() {
    let paths = ReportPaths::new(vec!["single.json".to_string()]).unwrap();
    for provider in providers() {
        for target in TARGETS {
            let request =
                CommentRequest::new(paths.clone(), provider.clone()).with_target_type(target);
            assert_eq!(
                request.validate().is_ok(),
                CommentPlanner::validate_target_support(&provider, target).is_ok()
            );
        }
    }
}
