use approx::assert_relative_eq;
use mortgage_roi_core::annuity::monthly_effective_rate;
use mortgage_roi_core::comparison::{
    build_schedule, compare_options, summarize_outcome, BreakEvenLabel, ComparisonAssumptions,
    ComparisonInput, LoanOutcome,
};
use mortgage_roi_core::loan::{solve_loan, LoanInput, RawLoanInput, SolvedLoan};
use mortgage_roi_core::LoanSide;

fn solved(principal: f64, years: f64, rate: f64) -> SolvedLoan {
    solve_loan(&LoanInput {
        label: format!("{years}-year"),
        principal: Some(principal),
        term_years: Some(years),
        annual_rate_percent: Some(rate),
        ..Default::default()
    })
    .unwrap()
}

fn option(label: &str, years: &str, rate: &str) -> RawLoanInput {
    RawLoanInput {
        label: label.into(),
        principal: "350000".into(),
        years: years.into(),
        rate: rate.into(),
        closing_costs: "0".into(),
        pmi: "0".into(),
        ..Default::default()
    }
}

fn thirty_vs_fifteen(reinvestment: &str) -> ComparisonInput {
    ComparisonInput {
        options: [
            option("Mortgage option 1", "30", "6"),
            option("Mortgage option 2", "15", "5.5"),
        ],
        reinvestment_rate_percent: reinvestment.into(),
        assumptions: ComparisonAssumptions::default(),
    }
}

// ===========================================================================
// Schedule invariants
// ===========================================================================

#[test]
fn test_balances_non_negative_and_non_increasing() {
    let a = solved(350_000.0, 30.0, 6.0);
    let b = solved(350_000.0, 15.0, 5.5);
    let schedule = build_schedule(&a, &b, Some(0.006)).unwrap();

    let mut previous = (a.principal, b.principal);
    for row in &schedule.rows {
        assert!(row.balance_a >= 0.0 && row.balance_b >= 0.0);
        assert!(row.balance_a <= previous.0, "A rose at month {}", row.month);
        assert!(row.balance_b <= previous.1, "B rose at month {}", row.month);
        previous = (row.balance_a, row.balance_b);
    }
}

#[test]
fn test_unbounded_label_whenever_nothing_saved() {
    // B pays less interest overall but more per month early on, so the
    // cumulative delta starts negative.
    let a = solved(300_000.0, 30.0, 4.0);
    let b = solved(300_000.0, 15.0, 7.0);
    let schedule = build_schedule(&a, &b, None).unwrap();
    assert_eq!(schedule.lower_interest, Some(LoanSide::B));
    assert!(schedule.row(1).unwrap().interest_delta_sum < 0.0);
    assert!(schedule.terminal.interest_delta_sum > 0.0);

    for row in &schedule.rows {
        if row.interest_delta_sum <= 0.0 {
            assert_eq!(row.break_even, BreakEvenLabel::Unbounded, "month {}", row.month);
        }
    }
}

#[test]
fn test_identical_loans_are_degenerate() {
    let a = solved(300_000.0, 30.0, 6.0);
    let b = a.clone();
    let schedule = build_schedule(&a, &b, Some(0.005)).unwrap();

    assert_eq!(schedule.higher_payment, None);
    assert_eq!(schedule.lower_interest, None);
    for row in &schedule.rows {
        assert_eq!(row.delta_sum, 0.0);
        assert_eq!(row.interest_delta_sum, 0.0);
        assert_eq!(row.break_even, BreakEvenLabel::Unbounded);
        assert_eq!(row.break_even_rate, None);
    }

    let outcome = summarize_outcome(&schedule, &a, &b, &ComparisonAssumptions::default()).unwrap();
    assert_eq!(outcome.winner, None);
    assert_eq!(outcome.difference, 0.0);
    assert_eq!(outcome.crossover_month_with_tax, None);
}

#[test]
fn test_break_even_rows_agree_with_labels() {
    let a = solved(350_000.0, 30.0, 6.0);
    let b = solved(350_000.0, 15.0, 5.5);
    let schedule = build_schedule(&a, &b, None).unwrap();

    for row in &schedule.rows {
        match row.break_even {
            BreakEvenLabel::Rate(rate) => assert_eq!(row.break_even_rate, Some(rate)),
            BreakEvenLabel::Unsolvable => assert_eq!(row.break_even_rate, None),
            BreakEvenLabel::Unbounded => {}
        }
    }
    assert!(matches!(schedule.terminal.break_even, BreakEvenLabel::Rate(_)));
}

// ===========================================================================
// End-to-end comparison
// ===========================================================================

#[test]
fn test_thirty_vs_fifteen_at_ten_percent() {
    let out = compare_options(&thirty_vs_fifteen("10")).unwrap();
    assert!(out.warnings.is_empty(), "{:?}", out.warnings);

    let result = out.result;
    assert_eq!(result.reinvestment_rate_percent, Some(10.0));
    assert_relative_eq!(
        result.monthly_return.unwrap(),
        monthly_effective_rate(0.10),
        epsilon = 1e-15
    );

    let comparison = result.comparison.unwrap();
    assert_eq!(comparison.lowest_interest, Some(LoanSide::B));
    assert_eq!(comparison.schedule.strategy.primary, LoanSide::A);

    let outcome = comparison.outcome.unwrap();
    assert_eq!(outcome.winner, Some(LoanSide::A));
    assert_eq!(outcome.payoff_month, 180);
    let crossover = outcome.crossover_month_with_tax.unwrap();
    assert!(crossover > 1 && crossover < 360, "crossover {crossover}");
    assert!(outcome.crossover_month_without_tax.is_some());

    // Investing at 10% beats the break-even return, so A wins.
    let break_even = comparison.break_even_rate_percent.unwrap();
    assert!(break_even < 10.0, "break-even {break_even}");
    let [first, second] = &comparison.options;
    assert_eq!(first.break_even_rate, Some(break_even));
    assert_eq!(second.break_even, BreakEvenLabel::Rate(break_even));
}

#[test]
fn test_blank_reinvestment_rate_omits_portfolios() {
    let out = compare_options(&thirty_vs_fifteen("")).unwrap();
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].contains("Reinvestment rate"));

    let comparison = out.result.comparison.unwrap();
    assert!(comparison.outcome.is_none());
    assert!(comparison
        .schedule
        .rows
        .iter()
        .all(|row| row.portfolio_value_a.is_none() && row.portfolio_value_b.is_none()));
    assert_eq!(comparison.options[0].portfolio_value, None);
    assert_eq!(comparison.options[0].tax_amount, 0.0);
}

#[test]
fn test_unsolvable_option_blocks_comparison() {
    let mut input = thirty_vs_fifteen("7");
    input.options[0].payment = "2000".into();
    let out = compare_options(&input).unwrap();

    assert!(out.result.comparison.is_none());
    assert!(matches!(out.result.loans[0], LoanOutcome::Failed(_)));
    assert!(out.result.loans[1].solved().is_some());
}

#[test]
fn test_closing_costs_seed_other_strategy() {
    let mut input = thirty_vs_fifteen("6");
    input.options[1].closing_costs = "5000".into();
    let out = compare_options(&input).unwrap();
    let schedule = out.result.comparison.unwrap().schedule;

    assert_eq!(schedule.strategy.seed_a, 5000.0);
    assert_eq!(schedule.strategy.seed_b, 0.0);
    let first = schedule.row(1).unwrap();
    let growth = 1.0 + monthly_effective_rate(0.06);
    let delta = first.payment_b - first.payment_a;
    assert_relative_eq!(
        first.portfolio_value_a.unwrap(),
        5000.0 * growth + delta,
        max_relative = 1e-12
    );
}

#[test]
fn test_output_serialises() {
    let out = compare_options(&thirty_vs_fifteen("8")).unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["result"]["loans"][0]["status"], "solved");
    assert!(json["result"]["comparison"]["schedule"]["rows"].is_array());
    assert_eq!(json["metadata"]["precision"], "ieee754_f64");
}
