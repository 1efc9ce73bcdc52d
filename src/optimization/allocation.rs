use crate::core::cargo::Cargo;
use crate::core::contract::ContractMonth;
use crate::core::relation::HedgeRelation;
use crate::core::trade::{PaperTrade, EPSILON};
use chrono::NaiveDate;
use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

/// Errors arising from allocation policy configuration.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("unknown direction policy '{0}', expected 'ignore' or 'opposite'")]
    UnknownDirectionPolicy(String),
    #[error("minimum cargo need must be positive, got {0}")]
    InvalidMinimumNeed(Decimal),
    #[error("invalid policy file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whether a cargo's buy/sell side restricts which paper may hedge it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionPolicy {
    /// Any paper with available volume is eligible.
    #[default]
    Ignore,
    /// Only paper whose net-open sign offsets the cargo: short paper
    /// for a Buy cargo, long paper for a Sell cargo.
    RequireOpposite,
}

impl std::str::FromStr for DirectionPolicy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" => Ok(DirectionPolicy::Ignore),
            "opposite" | "require_opposite" => Ok(DirectionPolicy::RequireOpposite),
            other => Err(PolicyError::UnknownDirectionPolicy(other.to_string())),
        }
    }
}

/// Ordered benchmark tiers used to decide which cargoes allocate first.
///
/// A cargo's tier is the index of the first pattern contained in its
/// pricing benchmark; cargoes matching no pattern (or with no benchmark)
/// share the last tier.
///
/// # Examples
///
/// ```
/// use hedge_engine::optimization::allocation::BenchmarkTiers;
///
/// let tiers = BenchmarkTiers::brent_jcc();
/// assert_eq!(tiers.rank(Some("DATED BRENT")), 0);
/// assert_eq!(tiers.rank(Some("JCC")), 1);
/// assert_eq!(tiers.rank(Some("WTI")), 2);
/// assert_eq!(tiers.rank(None), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct BenchmarkTiers(Vec<String>);

impl BenchmarkTiers {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_uppercase())
                .filter(|p| !p.is_empty())
                .collect(),
        )
    }

    /// Brent first, everything else after.
    pub fn brent_only() -> Self {
        Self::new(["BRENT"])
    }

    /// Brent first, JCC second, everything else last.
    pub fn brent_jcc() -> Self {
        Self::new(["BRENT", "JCC"])
    }

    pub fn patterns(&self) -> &[String] {
        &self.0
    }

    pub fn rank(&self, benchmark: Option<&str>) -> usize {
        let benchmark = benchmark.map(str::to_uppercase);
        benchmark
            .and_then(|b| self.0.iter().position(|p| b.contains(p.as_str())))
            .unwrap_or(self.0.len())
    }
}

impl From<Vec<String>> for BenchmarkTiers {
    fn from(patterns: Vec<String>) -> Self {
        Self::new(patterns)
    }
}

impl From<BenchmarkTiers> for Vec<String> {
    fn from(tiers: BenchmarkTiers) -> Self {
        tiers.0
    }
}

impl Default for BenchmarkTiers {
    fn default() -> Self {
        Self::brent_only()
    }
}

/// Configuration for an allocation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationPolicy {
    pub direction: DirectionPolicy,
    pub benchmarks: BenchmarkTiers,
    /// Cargoes stop taking paper once their remaining need drops below this.
    pub min_cargo_need: Decimal,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            direction: DirectionPolicy::default(),
            benchmarks: BenchmarkTiers::default(),
            min_cargo_need: Decimal::ONE,
        }
    }
}

impl AllocationPolicy {
    /// Load a policy from JSON; omitted fields keep their defaults.
    pub fn from_json(input: &str) -> Result<Self, PolicyError> {
        let policy: Self = serde_json::from_str(input)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.min_cargo_need <= Decimal::ZERO {
            return Err(PolicyError::InvalidMinimumNeed(self.min_cargo_need));
        }
        Ok(())
    }
}

/// Output of one allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationResult {
    pub run_id: Uuid,
    /// One row per allocation slice, in allocation order.
    pub relations: Vec<HedgeRelation>,
    /// Cargoes in input order with updated `unhedged_volume`.
    pub cargoes: Vec<Cargo>,
    /// Paper in input order with updated `allocated_to_physical`.
    pub paper: Vec<PaperTrade>,
}

impl AllocationResult {
    pub fn relations_for_cargo<'a>(&'a self, cargo_id: &'a str) -> impl Iterator<Item = &'a HedgeRelation> + 'a {
        self.relations
            .iter()
            .filter(move |r| r.cargo_id.as_str() == cargo_id)
    }

    pub fn relations_for_ticket<'a>(&'a self, ticket: &'a str) -> impl Iterator<Item = &'a HedgeRelation> + 'a {
        self.relations.iter().filter(move |r| r.ticket == ticket)
    }

    pub fn cargo(&self, cargo_id: &str) -> Option<&Cargo> {
        self.cargoes.iter().find(|c| c.id().as_str() == cargo_id)
    }

    pub fn trade(&self, ticket: &str) -> Option<&PaperTrade> {
        self.paper.iter().find(|t| t.ticket() == ticket)
    }
}

/// Greedy allocation of net-open paper to physical cargoes.
#[derive(Debug, Clone, Default)]
pub struct AllocationEngine {
    policy: AllocationPolicy,
}

impl AllocationEngine {
    pub fn new(policy: AllocationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AllocationPolicy {
        &self.policy
    }

    /// Allocate net-open paper volume to cargoes.
    ///
    /// # Algorithm
    ///
    /// 1. Order cargoes by benchmark tier, then designation date (undated
    ///    last), then cargo id.
    /// 2. For each cargo, candidates are paper trades in the target month
    ///    whose commodity contains the hedge proxy (and, under
    ///    [`DirectionPolicy::RequireOpposite`], whose net-open sign offsets
    ///    the cargo).
    /// 3. Candidates are ranked by |trade date - designation date|, earliest
    ///    trade first on ties; without a designation date (or any dated
    ///    candidate) by trade date alone.
    /// 4. Walk the ranking, taking `min(|available|, need)` from each trade,
    ///    until the cargo's need falls below the policy minimum.
    ///
    /// A paper trade may be split across many cargoes and a cargo may draw
    /// on many trades. `paper` should already be netted.
    pub fn allocate(&self, cargoes: &[Cargo], paper: &[PaperTrade]) -> AllocationResult {
        let start = Instant::now();
        let mut cargoes = cargoes.to_vec();
        let mut paper = paper.to_vec();

        // Running tally per paper trade, indexed like `paper`.
        let mut allocated = vec![Decimal::ZERO; paper.len()];

        let mut by_month: HashMap<ContractMonth, Vec<usize>> = HashMap::new();
        for (idx, trade) in paper.iter().enumerate() {
            by_month.entry(trade.month().clone()).or_default().push(idx);
        }

        // Policy fields are public, so a non-positive minimum can reach here.
        let min_need = self.policy.min_cargo_need.max(EPSILON);

        let mut relations = Vec::new();
        for ci in self.processing_order(&cargoes) {
            let cargo = &cargoes[ci];
            let mut need = cargo.unhedged_volume().abs();
            if need < min_need {
                continue;
            }
            if !cargo.has_known_proxy() {
                log::debug!("cargo {} has no hedge proxy, skipping", cargo.id());
                continue;
            }

            let mut candidates: Vec<usize> = by_month
                .get(cargo.target_month())
                .map(|indices| {
                    indices
                        .iter()
                        .copied()
                        .filter(|&pi| self.is_eligible(cargo, &paper[pi]))
                        .collect()
                })
                .unwrap_or_default();
            if candidates.is_empty() {
                log::debug!(
                    "no paper for cargo {} ({} {})",
                    cargo.id(),
                    cargo.hedge_proxy(),
                    cargo.target_month()
                );
                continue;
            }
            rank_candidates(&mut candidates, &paper, cargo.designation_date());

            for pi in candidates {
                if need < min_need {
                    break;
                }
                let available = paper[pi].net_open_volume() - allocated[pi];
                if available.abs() < EPSILON {
                    continue;
                }

                let amount = available.abs().min(need);
                if amount < EPSILON {
                    continue;
                }
                let signed = available.signum() * amount;
                need -= amount;
                allocated[pi] += signed;
                relations.push(HedgeRelation::new(cargo, &paper[pi], signed));
            }

            let residual = cargo.unhedged_volume().signum() * need;
            cargoes[ci].unhedged_volume = residual;
        }

        for (trade, amount) in paper.iter_mut().zip(allocated) {
            trade.allocated_to_physical = amount;
        }

        log::info!(
            "allocated {} hedge relations across {} cargoes in {:.2?}",
            relations.len(),
            cargoes.len(),
            start.elapsed()
        );

        AllocationResult {
            run_id: Uuid::new_v4(),
            relations,
            cargoes,
            paper,
        }
    }

    /// Cargo indices in the order they get first call on paper.
    pub fn processing_order(&self, cargoes: &[Cargo]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..cargoes.len()).collect();
        order.sort_by(|&a, &b| {
            let (ca, cb) = (&cargoes[a], &cargoes[b]);
            self.policy
                .benchmarks
                .rank(ca.benchmark())
                .cmp(&self.policy.benchmarks.rank(cb.benchmark()))
                .then_with(|| {
                    let da = ca.designation_date().unwrap_or(NaiveDate::MAX);
                    let db = cb.designation_date().unwrap_or(NaiveDate::MAX);
                    da.cmp(&db)
                })
                .then_with(|| ca.id().cmp(cb.id()))
        });
        order
    }

    fn is_eligible(&self, cargo: &Cargo, trade: &PaperTrade) -> bool {
        if !trade.commodity().contains(cargo.hedge_proxy()) {
            return false;
        }
        match self.policy.direction {
            DirectionPolicy::Ignore => true,
            DirectionPolicy::RequireOpposite => {
                trade.net_open_volume().signum() == cargo.direction().hedging_sign()
            }
        }
    }
}

fn rank_candidates(candidates: &mut [usize], paper: &[PaperTrade], designation: Option<NaiveDate>) {
    let any_dated = candidates.iter().any(|&i| paper[i].trade_date().is_some());
    match designation {
        Some(designated) if any_dated => candidates.sort_by_key(|&i| {
            let date = paper[i].trade_date();
            let lag = date
                .map(|d| (d - designated).num_days().abs())
                .unwrap_or(i64::MAX);
            (lag, date.is_none(), date)
        }),
        _ => candidates.sort_by_key(|&i| {
            let date = paper[i].trade_date();
            (date.is_none(), date)
        }),
    }
}
