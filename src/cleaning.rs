//! Join & clean pipeline
//!
//! Left-joins every fetched series onto the year scaffold, coerces cells to
//! numbers, fills gaps by linear interpolation (flat at the edges) and
//! appends the derived billion-USD columns.

use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{
    CleanedTable, ColumnKind, DerivedColumn, IndicatorSeries, MergedColumn, MergedTable,
    NumericColumn, YearRange,
};

/// Left join of each series onto `years`, columns in the order given
pub fn merge(years: YearRange, series: &[IndicatorSeries]) -> MergedTable {
    let scaffold: Vec<i32> = years.years().collect();

    let columns = series
        .iter()
        .map(|s| {
            let outside = s.values.keys().filter(|y| !years.contains(**y)).count();
            if outside > 0 {
                debug!("{}: dropping {} records outside {}", s.short_name, outside, years.as_query());
            }

            MergedColumn {
                name: s.short_name.clone(),
                cells: scaffold
                    .iter()
                    .map(|year| s.values.get(year).cloned().unwrap_or(Value::Null))
                    .collect(),
            }
        })
        .collect();

    MergedTable {
        years: scaffold,
        columns,
    }
}

/// Numbers pass through, numeric strings are parsed, anything else is absent
pub fn coerce_numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Fill absent cells linearly between present neighbours; cells before the
/// first or after the last present value take that value. Present cells are
/// returned untouched. An all-absent input comes back all-absent.
pub fn interpolate(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let present: Vec<usize> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();

    let (Some(&first), Some(&last)) = (present.first(), present.last()) else {
        return values.to_vec();
    };

    let mut filled = values.to_vec();
    for cell in &mut filled[..first] {
        *cell = values[first];
    }
    for cell in &mut filled[last + 1..] {
        *cell = values[last];
    }

    for pair in present.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo < 2 {
            continue;
        }
        let (Some(lo_value), Some(hi_value)) = (values[lo], values[hi]) else {
            continue;
        };
        let span = (hi - lo) as f64;
        for i in lo + 1..hi {
            let t = (i - lo) as f64 / span;
            filled[i] = Some(lo_value + (hi_value - lo_value) * t);
        }
    }

    filled
}

/// Coerce, interpolate and derive. The row set is exactly `merged.years`.
pub fn clean(merged: &MergedTable, derived: &[DerivedColumn], track_imputed: bool) -> CleanedTable {
    let mut columns: Vec<NumericColumn> = merged
        .columns
        .iter()
        .map(|column| {
            let raw: Vec<Option<f64>> = column.cells.iter().map(coerce_numeric).collect();
            let values = interpolate(&raw);
            let imputed = raw
                .iter()
                .zip(&values)
                .map(|(before, after)| before.is_none() && after.is_some())
                .collect();

            if values.iter().all(Option::is_none) {
                warn!("⚠️ {} has no values in range; column left empty", column.name);
            }

            NumericColumn {
                name: column.name.clone(),
                kind: ColumnKind::Indicator,
                values,
                imputed,
            }
        })
        .collect();

    let imputed_flags = track_imputed.then(|| {
        (0..merged.years.len())
            .map(|row| columns.iter().any(|c| c.imputed[row]))
            .collect()
    });

    for spec in derived {
        let Some(source) = columns.iter().find(|c| c.name == spec.source) else {
            warn!(
                "⚠️ Skipping derived column {}: source {} is not configured",
                spec.name, spec.source
            );
            continue;
        };
        let column = derive(source, spec);
        columns.push(column);
    }

    CleanedTable {
        years: merged.years.clone(),
        columns,
        imputed_flags,
    }
}

fn derive(source: &NumericColumn, spec: &DerivedColumn) -> NumericColumn {
    NumericColumn {
        name: spec.name.clone(),
        kind: ColumnKind::Derived,
        values: source
            .values
            .iter()
            .map(|v| v.map(|x| x / spec.divisor))
            .collect(),
        imputed: source.imputed.clone(),
    }
}
