//! # physics-derive: Formula-Graph Physics Problem Solver
//!
//! Derives an unknown physical quantity from a set of knowns by searching a
//! knowledge graph of quantities and the formulas that relate them, then
//! rearranging and evaluating each formula along the way.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `KnowledgeStore` is the contract between the engine and storage
//! 2. **Clean DTOs**: `PhysicalQuantity`, `Formula`, `DerivationStep` cross all boundaries
//! 3. **Parser owns nothing**: equation text → AST is a pure function
//! 4. **Snapshot reads**: the distance index is published whole and read lock-free
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use physics_derive::{KnownVariable, MemoryStore, SolveOrchestrator};
//!
//! # async fn example() -> physics_derive::Result<()> {
//! let store = MemoryStore::new();
//! let f = store.add_quantity("force", "F", "N")?;
//! let m = store.add_quantity("mass", "m", "kg")?;
//! let a = store.add_quantity("acceleration", "a", "m/s^2")?;
//! store.add_formula("Newton's second law", "F = m·a", &[f, m, a], &[])?;
//!
//! let engine = SolveOrchestrator::new(store).await?;
//! let response = engine.solve(
//!     vec![KnownVariable::new("mass", 10.0, "kg"), KnownVariable::new("acceleration", 2.0, "m/s^2")],
//!     "force",
//! ).await?;
//!
//! for step in &response.steps {
//!     println!("{}. {}", step.step(), step.description());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! | Phase | Module | Description |
//! |-------|--------|-------------|
//! | Compose | `force` | Force knowns → one resultant |
//! | Search | `search` + `index` | Hypergraph A* over formulas |
//! | Solve | `solver` + `expr` | Rearrange and evaluate each formula |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod expr;
pub mod storage;
pub mod index;
pub mod search;
pub mod solver;
pub mod force;
pub mod config;
pub mod nlu;
pub mod orchestrator;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    PhysicalQuantity, Constant, Formula, ResolvedFormula,
    QuantityId, ConstantId, FormulaId,
    KnownVariable, ParsedProblem, CalculationResult,
    DerivationStep, SolvingPath, ValueTable,
};

// ============================================================================
// Re-exports: Storage
// ============================================================================

pub use storage::{KnowledgeStore, KnowledgeSnapshot, MemoryStore};

// ============================================================================
// Re-exports: Engine
// ============================================================================

pub use config::{EngineConfig, SearchConfig, ForceConfig, SolverConfig};
pub use index::{Distance, DistanceIndex, IndexHandle};
pub use search::{DerivationSearch, SearchOutcome};
pub use solver::{EquationSolver, RearrangeStrategy, RuleTable};
pub use force::{ForceAnalysisResult, ForceComponent, ForceComposer};
pub use nlu::{CompletionModel, JsonProblemParser, ProblemParser};
pub use orchestrator::{SolveOrchestrator, SolveResponse, SolveStatus};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Equation syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Malformed equation: {0}")]
    MalformedEquation(String),

    #[error("Cannot isolate {symbol} in {equation}")]
    NoSymbolicSolution { symbol: String, equation: String },

    #[error("Missing value for variable {0}")]
    MissingVariable(String),

    #[error("Evaluation error: {0}")]
    EvaluationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation failed at step {step}: {source}")]
    CalculationFailed {
        step: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Problem parser error: {0}")]
    ParserError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
