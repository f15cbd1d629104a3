use super::*;
use shared::{
    domain::CandidateId,
    protocol::{BestCandidate, BiasColumn, BiasRow, BiasSummary, CurrentCandidate},
};

fn row(category: &str, population: f64, top_selected: f64, difference: f64) -> BiasRow {
    BiasRow {
        category: category.to_string(),
        population,
        top_selected,
        difference,
    }
}

fn sample_summary() -> BiasSummary {
    BiasSummary::new(vec![
        BiasColumn {
            name: "Género".to_string(),
            rows: vec![
                row("F", 48.0, 60.5, 12.5),
                row("M", 52.0, 39.5, -12.5),
            ],
        },
        BiasColumn {
            name: "Religión_ficticia".to_string(),
            rows: vec![
                row("Zeta", 20.0, 23.0, 3.0),
                row("Alfa", 50.0, 50.0, 0.0),
                row("Omega", 30.0, 27.0, -3.0),
            ],
        },
    ])
}

fn results(current_id: Option<&str>, is_best: bool, best_id: &str) -> ResultSet {
    ResultSet {
        current_candidate: CurrentCandidate {
            id: current_id.map(CandidateId::new),
            score: 0.9,
            is_best,
            rank: None,
        },
        best_candidate: BestCandidate {
            id: CandidateId::new(best_id),
            name: "Ana Ruiz".to_string(),
            score: 0.987654,
        },
        bias_summary: sample_summary(),
    }
}

#[test]
fn scores_use_four_decimals() {
    assert_eq!(format_score(0.123456), "0.1235");
    assert_eq!(format_score(1.0), "1.0000");
    assert_eq!(format_score(-0.0), "0.0000");
    assert_eq!(format_score(12.3), "12.3000");
}

#[test]
fn percents_print_shortest_form() {
    assert_eq!(format_percent(12.5), "12.5");
    assert_eq!(format_percent(3.0), "3");
    assert_eq!(format_percent(-0.0), "0");
    assert_eq!(format_percent(33.33), "33.33");
}

#[test]
fn render_is_idempotent() {
    let results = results(Some("B"), false, "A");
    for role in [ViewerRole::Candidate, ViewerRole::Recruiter] {
        assert_eq!(render_results(&results, role), render_results(&results, role));
    }
}

#[test]
fn candidate_view_never_has_bias_tables() {
    let html = render_results(&results(Some("B"), false, "A"), ViewerRole::Candidate);
    assert!(!html.contains("bias-table"));
    assert!(!html.contains("<h4>"));
    assert!(!html.contains("Bias Mitigation Summary"));
}

#[test]
fn recruiter_view_has_one_table_per_column_in_order() {
    let summary = sample_summary();
    let html = render_results(&results(Some("B"), false, "A"), ViewerRole::Recruiter);

    assert_eq!(html.matches("<table class=\"bias-table\">").count(), summary.len());

    // Everything after each heading up to the next one is that column's table.
    let sections: Vec<&str> = html.split("<h4>").skip(1).collect();
    assert_eq!(sections.len(), summary.len());
    for (section, column) in sections.iter().zip(summary.columns()) {
        assert!(
            section.starts_with(&format!("{}</h4>", column.name)),
            "heading out of order: {section}"
        );
        assert_eq!(section.matches("<table").count(), 1);
        assert_eq!(section.matches("<tr><td>").count(), column.rows.len());

        let mut last = 0;
        for row in &column.rows {
            let at = section
                .find(&format!("<tr><td>{}</td>", row.category))
                .expect("row rendered");
            assert!(at >= last, "row {} out of order", row.category);
            last = at;
        }
    }
}

#[test]
fn differences_are_signed_and_colored() {
    let html = render_results(&results(Some("B"), false, "A"), ViewerRole::Recruiter);
    assert!(html.contains("<td style=\"color:#ff4d4d\">+12.5</td>"));
    assert!(html.contains("<td style=\"color:#ff4d4d\">-12.5</td>"));
    assert!(html.contains("<td style=\"color:#4dff4d\">+3</td>"));
    assert!(html.contains("<td style=\"color:#4dff4d\">-3</td>"));
    assert!(html.contains("<td style=\"color:#4dff4d\">0</td>"));
}

#[test]
fn winner_sees_own_id_and_celebration() {
    let mut results = results(Some("A"), true, "A");
    results.best_candidate.score = 0.9;

    let candidate = render_results(&results, ViewerRole::Candidate);
    assert!(candidate.contains("<strong>WINNER-ID A</strong>"));
    assert!(candidate.contains("Congratulations!"));
    assert!(!candidate.contains("Thanks for Participating"));
    assert!(!candidate.contains("bias-table"));

    let recruiter = render_results(&results, ViewerRole::Recruiter);
    assert!(recruiter.contains("Congratulations!"));
    assert!(recruiter.contains("bias-table"));
    assert!(!recruiter.contains("Current Best Score"));
}

#[test]
fn non_winner_candidate_sees_placeholder_only() {
    let html = render_results(&results(Some("B"), false, "A"), ViewerRole::Candidate);
    assert!(html.contains("<strong>...</strong>"));
    assert!(!html.contains("WINNER-ID"));
    assert!(html.contains("Thanks for Participating"));
    assert!(!html.contains("Current Best Score"));
    assert!(!html.contains("Ana Ruiz"));
}

#[test]
fn non_winner_recruiter_sees_best_score_inline() {
    let html = render_results(&results(Some("B"), false, "A"), ViewerRole::Recruiter);
    assert!(html.contains("Current Best Score: <strong>0.9877</strong> (Ana Ruiz)"));
    assert!(html.contains("<strong>...</strong>"));
}

#[test]
fn missing_current_id_hides_winner_id() {
    let html = render_results(&results(None, true, "A"), ViewerRole::Candidate);
    assert!(html.contains("<strong>WINNER-ID ...</strong>"));
}

#[test]
fn header_shows_formatted_own_score_only() {
    let mut results = results(Some("B"), false, "A");
    results.current_candidate.score = 0.123456;
    results.current_candidate.rank = Some(0);

    let html = render_results(&results, ViewerRole::Candidate);
    assert!(html.contains("<div class=\"score-display\">0.1235</div>"));
    assert!(!html.contains("Rank"));
    assert!(!html.contains("class=\"rank\""));
}

#[test]
fn server_text_is_escaped() {
    let mut results = results(Some("B"), false, "A");
    results.best_candidate.name = "<script>x</script>".to_string();
    results.bias_summary = BiasSummary::new(vec![BiasColumn {
        name: "a&b".to_string(),
        rows: vec![row("\"q\"", 1.0, 1.0, 0.0)],
    }]);

    let html = render_results(&results, ViewerRole::Recruiter);
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
    assert!(html.contains("<h4>a&amp;b</h4>"));
    assert!(html.contains("<td>&quot;q&quot;</td>"));
}

#[test]
fn recruiter_view_with_empty_summary_has_no_tables() {
    let mut results = results(Some("B"), false, "A");
    results.bias_summary = BiasSummary::default();
    let html = render_results(&results, ViewerRole::Recruiter);
    assert!(html.contains("Bias Mitigation Summary"));
    assert!(!html.contains("<table"));
}

#[test]
fn renderer_only_renders_after_display() {
    let mut renderer = ResultsRenderer::new();
    assert!(renderer.render(ViewerRole::Recruiter).is_none());
    assert!(!renderer.has_results());

    let results = results(Some("B"), false, "A");
    let displayed = renderer.display(results.clone(), ViewerRole::Candidate);
    assert_eq!(displayed, render_results(&results, ViewerRole::Candidate));
    assert_eq!(
        renderer.render(ViewerRole::Recruiter),
        Some(render_results(&results, ViewerRole::Recruiter))
    );
    assert_eq!(renderer.current(), Some(&results));
}
