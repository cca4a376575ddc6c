// sanifix-core/tests/fixture_scenarios.rs
//! End-to-end scenarios for the incomplete multi-character sanitization class:
//! each one runs the same rule set once and to a fixed point, and checks that
//! only the fixpoint run is free of the dangerous pattern.

use anyhow::Result;
use test_log::test;

use sanifix_core::{
    compile_rule_set, sanitize, sanitize_to_report, BudgetKind, Mode, PatternKind, RuleConfig,
    RuleSet, RuleSetConfig, Status, Verdict,
};

fn rule(name: &str, kind: PatternKind, pattern: &str, replace_with: &str) -> RuleConfig {
    RuleConfig {
        name: name.to_string(),
        kind,
        pattern: pattern.to_string(),
        replace_with: replace_with.to_string(),
        ..Default::default()
    }
}

fn build(mode: Mode, max_iterations: usize, rules: Vec<RuleConfig>) -> Result<RuleSet> {
    Ok(compile_rule_set(&RuleSetConfig {
        name: "fixture".to_string(),
        mode,
        max_iterations,
        rules,
        ..Default::default()
    })?)
}

fn script_rules() -> Vec<RuleConfig> {
    vec![rule("script_tag", PatternKind::Regex, "</?script>", "")]
}

#[test]
fn test_script_tag_single_pass_leaves_live_tag() -> Result<()> {
    let set = build(Mode::SinglePass, 1, script_rules())?;
    let report = sanitize_to_report(&set, "<scr<script>ipt>alert(1)</script>");
    assert_eq!(report.status, Status::Converged);
    assert_eq!(report.text, "<script>alert(1)");
    assert_eq!(report.matches_per_pass, vec![2]);
    assert!(!report.pattern_free);
    Ok(())
}

#[test]
fn test_script_tag_fixpoint_removes_every_tag() -> Result<()> {
    let set = build(Mode::Fixpoint, 8, script_rules())?;
    let report = sanitize_to_report(&set, "<scr<script>ipt>alert(1)</script>");
    assert_eq!(report.status, Status::Converged);
    assert_eq!(report.text, "alert(1)");
    assert!(!report.text.contains("<script"));
    assert_eq!(report.matches_per_pass.last(), Some(&0));
    assert!(report.pattern_free);
    Ok(())
}

#[test]
fn test_dot_pair_deletion_modes_differ_in_last_pass() -> Result<()> {
    let rules = vec![rule("dot_pair", PatternKind::Literal, "..", "")];
    let single = sanitize(&build(Mode::SinglePass, 1, rules.clone())?, "....//");
    let fixed = sanitize(&build(Mode::Fixpoint, 8, rules)?, "....//");

    assert_eq!(single.matches_per_pass(), vec![2]);
    assert_eq!(fixed.matches_per_pass(), vec![2, 0]);
    assert_eq!(single.verdict.text(), "//");
    assert_eq!(fixed.verdict, Verdict::Converged { text: "//".to_string(), passes: 1 });
    Ok(())
}

#[test]
fn test_traversal_segment_needs_fixpoint() -> Result<()> {
    let rules = vec![rule("travel", PatternKind::Regex, r"(/)?\.\./", "")];

    let single = sanitize_to_report(&build(Mode::SinglePass, 1, rules.clone())?, "....//");
    assert_eq!(single.text, "../");
    assert!(single.matches_per_pass.last().copied().unwrap_or_default() > 0);
    assert!(!single.pattern_free);

    let fixed = sanitize_to_report(&build(Mode::Fixpoint, 8, rules)?, "....//");
    assert_eq!(fixed.text, "");
    assert_eq!(fixed.matches_per_pass, vec![1, 1, 0]);
    assert!(fixed.is_safe());
    Ok(())
}

#[test]
fn test_comment_delimiters() -> Result<()> {
    let rules = vec![rule("comment", PatternKind::Regex, "<!--|--!?>", "")];
    let input = "<!-<!---->->";

    let single = sanitize(&build(Mode::SinglePass, 1, rules.clone())?, input);
    assert!(single.verdict.text().contains("<!--"));

    let fixed = sanitize(&build(Mode::Fixpoint, 8, rules)?, input);
    let text = fixed.verdict.text();
    assert!(fixed.verdict.is_converged());
    assert!(!text.contains("<!--") && !text.contains("-->"));
    Ok(())
}

#[test]
fn test_converged_output_is_idempotent() -> Result<()> {
    let set = build(
        Mode::Fixpoint,
        16,
        vec![
            rule("comment", PatternKind::Regex, "<!--|--!?>", ""),
            rule("script", PatternKind::Regex, "(?i)</?script[^>]*>", ""),
            rule("travel", PatternKind::Regex, r"(/)?\.\./", ""),
        ],
    )?;
    let inputs = [
        "",
        "plain text",
        "<!-<!---->->",
        "<SCR<script>IPT src=x>",
        "..././..././etc",
        "<scr<!-- -->ipt>",
    ];
    for input in inputs {
        let run = sanitize(&set, input);
        assert!(run.verdict.is_converged(), "input {input:?}");
        let (again, matches) = set.apply_once(run.verdict.text())?;
        assert_eq!(matches, 0, "input {input:?}");
        assert_eq!(again, run.verdict.text());
    }
    Ok(())
}

#[test]
fn test_swapping_rules_are_reported_cyclic() -> Result<()> {
    let set = build(
        Mode::Fixpoint,
        50,
        vec![
            rule("a_to_b", PatternKind::Literal, "<a>", "<b>"),
            rule("b_to_a", PatternKind::Literal, "<b>", "<a>"),
        ],
    )?;
    let run = sanitize(&set, "x<a>y");
    match run.verdict {
        Verdict::Cyclic { cycle_length, passes, ref text } => {
            assert_eq!(cycle_length, 1);
            assert!(passes <= 50);
            assert_eq!(text, "x<a>y");
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_budget_of_one_pass_is_not_enough() -> Result<()> {
    let rules = vec![rule("ab", PatternKind::Literal, "ab", "")];
    let run = sanitize(&build(Mode::Fixpoint, 1, rules.clone())?, "aaabbb");
    assert_eq!(run.verdict.status(), Status::BudgetExceeded);
    assert_eq!(run.verdict.budget(), Some(BudgetKind::Iterations));

    let run = sanitize(&build(Mode::Fixpoint, 3, rules)?, "aaabbb");
    assert_eq!(run.verdict, Verdict::Converged { text: String::new(), passes: 3 });
    Ok(())
}

#[test]
fn test_independent_calls_run_in_parallel() -> Result<()> {
    let set = build(Mode::Fixpoint, 16, script_rules())?;
    let inputs: Vec<String> = (0..8)
        .map(|i| format!("{}<script>{}alert({i})</script>", "<scr".repeat(i), "ipt>".repeat(i)))
        .collect();

    let shared = &set;
    std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| scope.spawn(move || sanitize(shared, input)))
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let run = handle.join().expect("worker panicked");
            assert_eq!(run.verdict.text(), format!("alert({i})"));
        }
    });
    Ok(())
}
