//! rt-orchestrator: Supervises agent processes and routes the shared conversation
//!
//! The orchestrator spawns each configured agent, pumps its output into one
//! shared conversation log, and sends each agent the whole conversation,
//! relabeled from its point of view, whenever it is addressed. Operator
//! input can address one agent, all of them, or hand control to an
//! autonomous round-robin loop.

pub mod console;
pub mod input;
pub mod log;
pub mod pump;
pub mod registry;
pub mod round_table;
pub mod router;
pub mod scheduler;
pub mod state;
pub mod supervisor;

pub use console::{Console, StreamKind};
pub use input::{parse_operator_line, spawn_input_reader, InputRouter, OperatorCommand, RouteOutcome};
pub use log::{ConversationLog, PendingAppend};
pub use registry::{ChildHandle, ChildRegistry};
pub use round_table::{RoundTable, RunSummary};
pub use router::CatchUpRouter;
pub use scheduler::LoopScheduler;
pub use state::OrchestratorState;
pub use supervisor::{ChildExit, ShutdownReport, Supervisor};
