//! Factor derivation engine.
//!
//! Drives a factor from its registry definition through the pipeline:
//! check the store, fetch the declared raw fields, attach annual records to
//! the quarterly spine, deduplicate and sort, apply the declared fill
//! policies, run the formula, validate the output shape, and persist.
//! Persisting happens only on the full-universe scope, so sample runs can
//! never overwrite the canonical artifact.
//!
//! The link table and the market-cap series are built once at construction
//! and shared read-only across every computation in the run. Factors run
//! sequentially and independently: a failure in one is returned for that
//! factor and does not abort or corrupt its siblings.

use crate::inputs::FactorInputs;
use crate::registry::{FactorDef, find_factor};
use chrono::NaiveDate;
use lisbon_core::column::{COMPANY_ID, DATE, PERIOD_END, REPORT_DATE, factor_column, is_factor_column};
use lisbon_core::error::{Error, Result};
use lisbon_core::field::Field;
use lisbon_core::frame::round_columns;
use lisbon_core::policy::FillPolicy;
use lisbon_data::source::{EntityScope, FundamentalsSource, MarketDataSource, scope_filter};
use lisbon_data::store::FactorStore;
use lisbon_market::link::LinkTable;
use lisbon_market::marketcap::build_market_caps;
use lisbon_temporal::asof::attach_annual;
use lisbon_temporal::transform::{fill_missing, forward_fill};
use polars::prelude::*;
use tracing::{debug, error, info};

/// Decimal places factor columns are rounded to at persist time.
const FACTOR_DECIMALS: u32 = 4;

/// Run-level engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Companies the run covers.
    pub scope: EntityScope,
    /// Earliest fiscal year fetched from the fundamentals source.
    pub start_year: i32,
    /// First date of the daily market data window.
    pub market_start: NaiveDate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scope: EntityScope::All,
            start_year: 2000,
            market_start: NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid date"),
        }
    }
}

/// Result of one factor computation.
#[derive(Debug)]
pub enum FactorOutcome {
    /// Served from the store without recomputation.
    Cached(DataFrame),
    /// Freshly derived (and persisted, when the scope is the full universe).
    Fresh(DataFrame),
}

impl FactorOutcome {
    /// The factor table, however it was obtained.
    #[must_use]
    pub const fn table(&self) -> &DataFrame {
        match self {
            Self::Cached(table) | Self::Fresh(table) => table,
        }
    }

    /// Consumes the outcome, returning the table.
    #[must_use]
    pub fn into_table(self) -> DataFrame {
        match self {
            Self::Cached(table) | Self::Fresh(table) => table,
        }
    }

    /// True when the table came from the store.
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }
}

/// Sequential factor derivation engine.
///
/// Holds the immutable run context: the sources, the store, the normalized
/// link table and the scope-filtered market-cap series.
pub struct FactorEngine<'a> {
    fundamentals: &'a dyn FundamentalsSource,
    store: &'a dyn FactorStore,
    config: EngineConfig,
    links: LinkTable,
    market_caps: DataFrame,
}

impl std::fmt::Debug for FactorEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactorEngine")
            .field("config", &self.config)
            .field("market_cap_rows", &self.market_caps.height())
            .finish_non_exhaustive()
    }
}

impl<'a> FactorEngine<'a> {
    /// Builds the run context: normalizes the link table, derives the
    /// market-cap series from daily data, and filters it to the scope.
    pub fn new(
        fundamentals: &'a dyn FundamentalsSource,
        market: &dyn MarketDataSource,
        store: &'a dyn FactorStore,
        config: EngineConfig,
    ) -> Result<Self> {
        let links = LinkTable::new(market.links()?)?;
        let daily = market.daily(config.market_start)?;
        let caps = build_market_caps(&daily, &links)?;
        let market_caps = scope_filter(caps.lazy(), &config.scope).collect()?;
        info!(rows = market_caps.height(), "market-cap series ready");

        Ok(Self {
            fundamentals,
            store,
            config,
            links,
            market_caps,
        })
    }

    /// The shared market-cap series.
    #[must_use]
    pub fn market_caps(&self) -> &DataFrame {
        &self.market_caps
    }

    /// The normalized link table.
    #[must_use]
    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    /// The run scope.
    #[must_use]
    pub const fn scope(&self) -> &EntityScope {
        &self.config.scope
    }

    /// Computes one factor by name.
    ///
    /// Full-scope runs return the stored table on a cache hit and persist
    /// fresh results; scoped runs neither read nor write the store.
    pub fn compute(&self, name: &str) -> Result<FactorOutcome> {
        let def = find_factor(name).ok_or_else(|| Error::UnknownFactor(name.to_string()))?;

        if self.config.scope.is_all() {
            if let Some(table) = self.store.load(def.name)? {
                info!(factor = def.name, rows = table.height(), "cache hit");
                return Ok(FactorOutcome::Cached(table));
            }
        }

        debug!(factor = def.name, "fetching raw fields");
        let fundamentals = self.prepare_fundamentals(&def)?;

        let inputs = FactorInputs {
            column: factor_column(def.name),
            fundamentals,
            market_caps: def.needs_market_caps.then_some(&self.market_caps),
        };
        let table = (def.formula)(&inputs)?;
        validate_output(def.name, &inputs.column, &table)?;

        let finalized = finalize(&inputs.column, table)?;
        if self.config.scope.is_all() {
            self.store.store(def.name, &finalized)?;
            info!(factor = def.name, rows = finalized.height(), "persisted");
        }
        Ok(FactorOutcome::Fresh(finalized))
    }

    /// Computes a batch of factors sequentially and independently.
    ///
    /// Each factor's result stands alone: an error is recorded for that
    /// factor and the remaining ones still run. Artifacts persisted before
    /// a failure are left intact.
    pub fn compute_many(&self, names: &[&str]) -> Vec<(String, Result<FactorOutcome>)> {
        names
            .iter()
            .map(|name| {
                let result = self.compute(name);
                if let Err(e) = &result {
                    error!(factor = *name, error = %e, "factor computation failed");
                }
                ((*name).to_string(), result)
            })
            .collect()
    }

    /// Fetches and prepares the fundamentals frame for a definition:
    /// quarterly spine (always, so annual items get report dates), annual
    /// attach, one row per `(company, period end)` keeping the latest
    /// report, transform ordering, then the declared fill policies.
    fn prepare_fundamentals(&self, def: &FactorDef) -> Result<DataFrame> {
        let quarterly_fields: Vec<Field> = def.quarterly.iter().map(|(field, _)| *field).collect();
        let mut frame = self.fundamentals.quarterly(
            &quarterly_fields,
            &self.config.scope,
            self.config.start_year,
        )?;

        if !def.annual.is_empty() {
            let annual_fields: Vec<Field> = def.annual.iter().map(|(field, _)| *field).collect();
            let annual = self.fundamentals.annual(
                &annual_fields,
                &self.config.scope,
                self.config.start_year,
            )?;
            frame = attach_annual(&frame, &annual)?;
        }

        let mut lf = frame
            .lazy()
            .sort([COMPANY_ID, PERIOD_END, REPORT_DATE], Default::default())
            .unique_stable(
                Some(vec![COMPANY_ID.into(), PERIOD_END.into()]),
                UniqueKeepStrategy::Last,
            )
            .sort([COMPANY_ID, PERIOD_END], Default::default());

        let fills: Vec<Expr> = def
            .quarterly
            .iter()
            .chain(def.annual.iter())
            .filter_map(|(field, policy)| match policy {
                FillPolicy::ForwardFill { limit } => {
                    Some(forward_fill(field.column(), *limit, COMPANY_ID).alias(field.column()))
                }
                FillPolicy::Zero => Some(fill_missing(field.column(), 0.0).alias(field.column())),
                FillPolicy::AsReported => None,
            })
            .collect();
        if !fills.is_empty() {
            lf = lf.with_columns(fills);
        }

        Ok(lf.collect()?)
    }
}

/// Rejects factor outputs that are not entity-date-keyed tables.
pub(crate) fn validate_output(name: &str, column: &str, table: &DataFrame) -> Result<()> {
    let schema_error = |reason: String| Error::Schema {
        factor: name.to_string(),
        reason,
    };

    if table.column(COMPANY_ID).is_err() {
        return Err(schema_error(format!("missing column {COMPANY_ID}")));
    }
    if table.column(DATE).is_err() && table.column(REPORT_DATE).is_err() {
        return Err(schema_error("no date key column".to_string()));
    }
    let values = table
        .column(column)
        .map_err(|_| schema_error(format!("missing column {column}")))?;
    let numeric = matches!(
        values.dtype(),
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::UInt32
            | DataType::UInt64
    );
    if !numeric {
        return Err(schema_error(format!(
            "column {column} has non-numeric dtype {}",
            values.dtype()
        )));
    }
    Ok(())
}

/// Canonical form of a factor table: rows where the factor is undefined are
/// dropped, factor columns rounded to a fixed precision.
fn finalize(column: &str, table: DataFrame) -> Result<DataFrame> {
    let mut out = table.lazy().filter(col(column).is_not_null()).collect()?;
    let factor_columns: Vec<String> = out
        .get_columns()
        .iter()
        .map(|c| c.name().to_string())
        .filter(|n| is_factor_column(n))
        .collect();
    let names: Vec<&str> = factor_columns.iter().map(String::as_str).collect();
    round_columns(&mut out, &names, FACTOR_DECIMALS)?;
    Ok(out)
}
