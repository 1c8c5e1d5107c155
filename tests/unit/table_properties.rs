//! Properties of the cleaned table, checked through the public pipeline API

use gdp_indicators::cleaning::{clean, merge};
use gdp_indicators::models::{
    default_derived_columns, default_indicators, IndicatorSeries, IndicatorSpec, YearRange,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn series(spec: &IndicatorSpec, values: &[(i32, Value)]) -> IndicatorSeries {
    let mut s = IndicatorSeries::new(spec);
    s.values = values.iter().cloned().collect();
    s
}

/// Sparse observations for every default indicator
fn sparse_inputs(years: YearRange) -> Vec<IndicatorSeries> {
    default_indicators()
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let observed: Vec<(i32, Value)> = years
                .years()
                .filter(|y| (*y as usize + i) % 3 == 0)
                .map(|y| (y, json!(1000.0 * (i + 1) as f64 + y as f64)))
                .collect();
            series(spec, &observed)
        })
        .collect()
}

#[test_log::test]
fn test_row_count_matches_scaffold() {
    for (start, end) in [(2014, 2024), (2020, 2020), (1990, 2023)] {
        let years = YearRange::new(start, end).unwrap();
        let table = clean(&merge(years, &sparse_inputs(years)), &default_derived_columns(), true);

        assert_eq!(table.row_count(), (end - start + 1) as usize);
        assert_eq!(table.years, (start..=end).collect::<Vec<_>>());
        for column in &table.columns {
            assert_eq!(column.values.len(), table.row_count(), "{}", column.name);
        }
    }
}

#[test_log::test]
fn test_every_declared_column_exists() {
    let years = YearRange::new(2014, 2024).unwrap();
    let inputs: Vec<IndicatorSeries> = default_indicators()
        .iter()
        .map(|spec| IndicatorSeries::empty(spec, years))
        .collect();
    let table = clean(&merge(years, &inputs), &default_derived_columns(), true);

    assert_eq!(
        table.headers(),
        vec![
            "year",
            "GDP_current_USD",
            "GDP_constant_2015_USD",
            "GDP_growth_pct",
            "GDP_per_capita_current_USD",
            "Population_total",
            "GDP_current_billion_USD",
            "GDP_constant_2015_billion_USD",
            "notes_missing_imputed",
        ]
    );
    assert!(table.columns.iter().all(|c| c.values.iter().all(Option::is_none)));
    assert_eq!(table.imputed_flags, Some(vec![false; 11]));
}

#[test_log::test]
fn test_observed_values_survive_cleaning() {
    let years = YearRange::new(2014, 2024).unwrap();
    let inputs = sparse_inputs(years);
    let table = clean(&merge(years, &inputs), &default_derived_columns(), true);

    for input in &inputs {
        let column = table.column(&input.short_name).unwrap();
        for (year, raw) in &input.values {
            let row = (year - years.start) as usize;
            assert_eq!(column.values[row], raw.as_f64(), "{} {}", input.short_name, year);
        }
    }
}

#[test_log::test]
fn test_midpoint_and_boundary_fill() {
    let spec = IndicatorSpec::new("NY.GDP.PCAP.CD", "GDP_per_capita_current_USD");
    let years = YearRange::new(2013, 2017).unwrap();
    let input = series(
        &spec,
        &[(2014, json!(1560.0)), (2016, json!(1732.0)), (2017, json!("1980.5"))],
    );
    let table = clean(&merge(years, &[input]), &[], true);
    let values = &table.column("GDP_per_capita_current_USD").unwrap().values;

    // 2013 takes the first observation, 2015 the mean of its neighbours
    assert_eq!(values[0], Some(1560.0));
    assert_eq!(values[2], Some((1560.0 + 1732.0) / 2.0));
    assert_eq!(values[4], Some(1980.5));
    assert_eq!(table.imputed_flags, Some(vec![true, false, true, false, false]));
}

#[test_log::test]
fn test_derived_columns_are_exact_division() {
    let years = YearRange::new(2014, 2024).unwrap();
    let table = clean(&merge(years, &sparse_inputs(years)), &default_derived_columns(), false);

    for (derived, source) in [
        ("GDP_current_billion_USD", "GDP_current_USD"),
        ("GDP_constant_2015_billion_USD", "GDP_constant_2015_USD"),
    ] {
        let derived = table.column(derived).unwrap();
        let source = table.column(source).unwrap();
        for (d, s) in derived.values.iter().zip(&source.values) {
            assert_eq!(*d, s.map(|v| v / 1e9));
        }
    }
}

#[test_log::test]
fn test_unparsable_cells_are_imputed() {
    let spec = IndicatorSpec::new("NY.GDP.MKTP.KD.ZG", "GDP_growth_pct");
    let years = YearRange::new(2019, 2021).unwrap();
    let input = series(
        &spec,
        &[(2019, json!(3.87)), (2020, json!("..")), (2021, json!(9.69))],
    );
    let table = clean(&merge(years, &[input]), &[], true);
    let column = table.column("GDP_growth_pct").unwrap();

    assert_eq!(column.imputed, vec![false, true, false]);
    let filled = column.values[1].unwrap();
    assert!((filled - 6.78).abs() < 1e-12);
}
