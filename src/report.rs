//! Plain-text parameter tables.

use std::fmt::{self, Display, Formatter};

use crate::{estimate::Estimate, summary::ParamSummary};

const COLUMN_WIDTH: usize = 10;

fn name_width(names: &[&str], header: &str) -> usize {
    names
        .iter()
        .map(|name| name.len())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
}

fn write_value(f: &mut Formatter<'_>, value: Option<f64>) -> fmt::Result {
    match value {
        Some(v) if v.is_finite() => write!(f, " {v:>COLUMN_WIDTH$.4}"),
        _ => write!(f, " {:>COLUMN_WIDTH$}", "n/a"),
    }
}

fn write_header(f: &mut Formatter<'_>, width: usize, columns: &[&str]) -> fmt::Result {
    write!(f, "{:<width$}", "parameter")?;
    for column in columns {
        write!(f, " {column:>COLUMN_WIDTH$}")?;
    }
    writeln!(f)
}

/// Maximum likelihood estimates with standard errors, z and p values.
#[derive(Debug, Clone, Copy)]
pub struct EstimateTable<'a> {
    names: &'a [&'a str],
    estimate: &'a Estimate,
}

impl<'a> EstimateTable<'a> {
    /// # Panics
    ///
    /// If there is not exactly one name per parameter.
    pub fn new(names: &'a [&'a str], estimate: &'a Estimate) -> Self {
        assert_eq!(
            names.len(),
            estimate.params.len(),
            "one name per parameter is required"
        );
        Self { names, estimate }
    }
}

impl Display for EstimateTable<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let width = name_width(self.names, "parameter");
        write_header(f, width, &["estimate", "std.err", "z", "p"])?;

        let se = self.estimate.std_errors();
        let z = self.estimate.z_values();
        let p = self.estimate.p_values();
        let at = |values: &Option<Vec<f64>>, i: usize| values.as_ref().map(|v| v[i]);

        for (i, (name, value)) in self.names.iter().zip(&self.estimate.params).enumerate() {
            write!(f, "{name:<width$}")?;
            write_value(f, Some(*value))?;
            write_value(f, at(&se, i))?;
            write_value(f, at(&z, i))?;
            write_value(f, at(&p, i))?;
            writeln!(f)?;
        }
        write!(
            f,
            "log-likelihood {:.4}, AIC {:.4}",
            self.estimate.log_likelihood,
            self.estimate.aic()
        )
    }
}

/// Posterior means, standard deviations and 95% credible intervals.
#[derive(Debug, Clone, Copy)]
pub struct PosteriorTable<'a> {
    names: &'a [&'a str],
    summaries: &'a [ParamSummary],
}

impl<'a> PosteriorTable<'a> {
    /// # Panics
    ///
    /// If there is not exactly one name per summary.
    pub fn new(names: &'a [&'a str], summaries: &'a [ParamSummary]) -> Self {
        assert_eq!(
            names.len(),
            summaries.len(),
            "one name per parameter is required"
        );
        Self { names, summaries }
    }
}

impl Display for PosteriorTable<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let width = name_width(self.names, "parameter");
        write_header(f, width, &["mean", "sd", "2.5%", "97.5%"])?;
        for (name, summary) in self.names.iter().zip(self.summaries) {
            write!(f, "{name:<width$}")?;
            write_value(f, Some(summary.mean))?;
            write_value(f, Some(summary.sd))?;
            write_value(f, Some(summary.lower))?;
            write_value(f, Some(summary.upper))?;
            writeln!(f)?;
        }
        Ok(())
    }
}
