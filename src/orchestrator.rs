//! # Solve Orchestrator
//!
//! Runs one request end to end:
//!
//! 1. **Compose forces**: force-typed knowns collapse into one resultant.
//! 2. **Resolve names**: known and target names → quantity ids.
//! 3. **Search**: minimum-depth derivation path over the formula graph.
//! 4. **Calculate**: execute the path step by step against a running value
//!    table.
//!
//! A missing path is a regular response with a non-`Solved` status. Errors
//! are reserved for bad input, unknown names, storage failures and failed
//! calculations.

use std::sync::Arc;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::force::{ForceAnalysisResult, ForceComposer};
use crate::index::{DistanceIndex, IndexHandle};
use crate::model::{
    CalculationResult, DerivationStep, KnownVariable, PhysicalQuantity, QuantityId, SolvingPath,
    ValueTable,
};
use crate::nlu::ProblemParser;
use crate::search::{DerivationSearch, SearchOutcome};
use crate::solver::EquationSolver;
use crate::storage::{KnowledgeSnapshot, KnowledgeStore, MemoryStore};
use crate::{Error, Result};

/// Overall outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Solved,
    NoPathFound,
    SearchBudgetExceeded,
}

/// What a solve returns to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResponse {
    pub status: SolveStatus,
    /// Value of the target; `None` unless solved.
    pub result: Option<CalculationResult>,
    /// `FindFormula` / `Calculation` pairs, numbered from 1.
    pub steps: SolvingPath,
    pub force_analysis: Option<ForceAnalysisResult>,
    pub message: String,
}

impl SolveResponse {
    fn unsolved(status: SolveStatus, force_analysis: Option<ForceAnalysisResult>, message: impl Into<String>) -> Self {
        Self { status, result: None, steps: SolvingPath::default(), force_analysis, message: message.into() }
    }

    pub fn is_solved(&self) -> bool {
        self.status == SolveStatus::Solved
    }
}

/// The primary entry point: a knowledge store plus the published distance
/// index and the engine components.
pub struct SolveOrchestrator<S: KnowledgeStore> {
    store: S,
    index: IndexHandle,
    config: EngineConfig,
    composer: ForceComposer,
    search: DerivationSearch,
    solver: EquationSolver,
}

impl<S: KnowledgeStore> SolveOrchestrator<S> {
    /// Wrap `store` with the default configuration and build the index.
    pub async fn new(store: S) -> Result<Self> {
        Self::with_config(store, EngineConfig::default()).await
    }

    pub async fn with_config(store: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let index = build_index(&store).await?;
        Ok(Self {
            composer: ForceComposer::new(config.force.clone()),
            search: DerivationSearch::new(config.search.clone()),
            solver: EquationSolver::with_config(&config.solver),
            index: IndexHandle::new(index),
            store,
            config,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The currently published index.
    pub fn index(&self) -> Arc<DistanceIndex> {
        self.index.snapshot()
    }

    /// Recompute the index from the store and publish it. Solves already
    /// running keep the snapshot they started with.
    pub async fn rebuild_index(&self) -> Result<Arc<DistanceIndex>> {
        let index = build_index(&self.store).await?;
        self.index.publish(index);
        Ok(self.index.snapshot())
    }

    /// Parse `text` with `parser`, then [`solve`](Self::solve).
    pub async fn solve_problem<P: ProblemParser + ?Sized>(&self, parser: &P, text: &str) -> Result<SolveResponse> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("Problem text is empty".into()));
        }
        info!(chars = text.chars().count(), "parsing problem");
        let problem = parser.parse(text).await?;
        self.solve(problem.knowns, &problem.unknown).await
    }

    /// Derive and compute `target_name` from `knowns`.
    pub async fn solve(&self, knowns: Vec<KnownVariable>, target_name: &str) -> Result<SolveResponse> {
        if knowns.is_empty() {
            return Err(Error::InvalidInput("No known quantities given".into()));
        }
        info!(knowns = knowns.len(), target = target_name, "solve request");

        // Phase 1: Compose forces
        let (knowns, force_analysis) = self.composer.substitute(knowns);
        if let Some(analysis) = &force_analysis {
            info!(
                magnitude = analysis.resultant.magnitude,
                is_equilibrium = analysis.is_equilibrium,
                "forces replaced by resultant"
            );
        }

        // Phase 2: Resolve names
        let target = self
            .store
            .quantity_by_name(target_name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Quantity '{target_name}'")))?;

        let mut values = ValueTable::new();
        let mut known_ids: Vec<QuantityId> = Vec::with_capacity(knowns.len());
        let mut seen: HashSet<QuantityId> = HashSet::new();
        for known in &knowns {
            match self.store.quantity_id_by_name(&known.name).await? {
                Some(id) => {
                    values.insert(id, known.value);
                    if seen.insert(id) {
                        known_ids.push(id);
                    }
                }
                None => warn!(name = %known.name, "known quantity not in knowledge store, skipped"),
            }
        }
        if known_ids.is_empty() {
            return Err(Error::NotFound("None of the known quantities exist in the knowledge store".into()));
        }

        if let Some(&value) = values.get(&target.id) {
            return Ok(SolveResponse {
                status: SolveStatus::Solved,
                result: Some(CalculationResult { name: target.name.clone(), value, unit: target.unit.clone() }),
                steps: SolvingPath::default(),
                force_analysis,
                message: format!("{} is already known", target.name),
            });
        }

        // Phase 3: Search
        let index = self.index.snapshot();
        let outcome = self.search.find_path(&self.store, &index, &known_ids, target.id).await?;
        debug!(target = %target.name, expansions = outcome.expansions(), "search finished");
        let path = match outcome {
            SearchOutcome::Found { path, .. } => path,
            SearchOutcome::NoPathFound { .. } => {
                return Ok(SolveResponse::unsolved(
                    SolveStatus::NoPathFound,
                    force_analysis,
                    format!("Could not find a solving path to {}", target.name),
                ));
            }
            SearchOutcome::BudgetExceeded { expansions, .. } => {
                return Ok(SolveResponse::unsolved(
                    SolveStatus::SearchBudgetExceeded,
                    force_analysis,
                    format!("Search gave up after {expansions} expansions"),
                ));
            }
        };

        // Phase 4: Calculate
        let (steps, result) = self.calculate(&path, &target, &mut values).await?;
        info!(target = %target.name, value = result.value, steps = path.len(), "solved");

        Ok(SolveResponse {
            status: SolveStatus::Solved,
            message: format!("Solved {} in {} step(s)", target.name, path.len()),
            result: Some(result),
            steps,
            force_analysis,
        })
    }

    /// Execute `path` in order, pairing each `FindFormula` with its
    /// `Calculation`.
    async fn calculate(
        &self,
        path: &SolvingPath,
        target: &PhysicalQuantity,
        values: &mut ValueTable,
    ) -> Result<(SolvingPath, CalculationResult)> {
        let mut steps = Vec::with_capacity(path.len() * 2);
        let mut last: Option<CalculationResult> = None;

        for step in path {
            let DerivationStep::FindFormula { formula_id, output_id, .. } = step else { continue };
            let formula = self.store.resolve_formula(*formula_id).await?;
            let output = formula
                .quantity(*output_id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("Quantity {output_id} in formula {formula_id}")))?;

            let value = self
                .solver
                .solve(&formula, &output, values)
                .map_err(|e| Error::CalculationFailed { step: step.step(), source: Box::new(e) })?;
            debug!(step = step.step(), formula = %formula.formula.name, quantity = %output.name, value, "calculated");

            let mut find = step.clone();
            find.set_description(format!("Use formula {} to find {}", formula.formula.name, output.name));
            steps.push(find);

            let result = CalculationResult { name: output.name.clone(), value, unit: output.unit.clone() };
            steps.push(DerivationStep::calculation(formula.id(), result.clone()));
            last = Some(result);
        }

        let result = match values.get(&target.id) {
            Some(&value) => CalculationResult { name: target.name.clone(), value, unit: target.unit.clone() },
            None => last.ok_or_else(|| Error::InvalidInput("Solving path produced no calculation".into()))?,
        };
        Ok((SolvingPath::from_steps(steps), result))
    }
}

/// In-memory knowledge for testing and embedding.
impl SolveOrchestrator<MemoryStore> {
    pub async fn from_snapshot(snapshot: KnowledgeSnapshot) -> Result<Self> {
        Self::new(MemoryStore::from_snapshot(snapshot)?).await
    }
}

async fn build_index<S: KnowledgeStore>(store: &S) -> Result<DistanceIndex> {
    let quantities = store.all_quantities().await?;
    let formulas = store.all_formulas().await?;
    Ok(DistanceIndex::build(&quantities, &formulas))
}
