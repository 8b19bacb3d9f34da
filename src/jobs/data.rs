use crate::jobs::actions::Task;
use crate::jobs::context::FindContext;
use serde::{Deserialize, Serialize};

/// Immutable behavioral category, assigned at spawn and persisted in creep
/// memory.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Role {
    Harvester,
    Carrier,
    #[default]
    Worker,
    Upgrader,
    Reserver,
    Explorer,
    Infantry,
    Transferer,
}

/// One stage of a role's cascade: consult the world and the ledger, return a
/// viable task or nothing.
pub type TaskFinder = fn(&mut FindContext) -> Option<Task>;

impl Role {
    /// The ordered strategy list for this role. Evaluation is strictly
    /// first-success-wins; later stages are cheaper to skip, not necessarily
    /// cheaper to run.
    pub fn strategies(self) -> &'static [TaskFinder] {
        match self {
            Role::Harvester => crate::jobs::harvest::HARVESTER_STRATEGIES,
            Role::Carrier => crate::jobs::haul::CARRIER_STRATEGIES,
            Role::Worker => crate::jobs::build::WORKER_STRATEGIES,
            Role::Upgrader => crate::jobs::upgrade::UPGRADER_STRATEGIES,
            Role::Reserver => crate::jobs::reserve::RESERVER_STRATEGIES,
            Role::Explorer => crate::jobs::scout::EXPLORER_STRATEGIES,
            Role::Infantry => crate::jobs::defend::INFANTRY_STRATEGIES,
            Role::Transferer => crate::jobs::transferer::TRANSFERER_STRATEGIES,
        }
    }
}

/// Run a cascade to its first success.
pub fn find_task(ctx: &mut FindContext) -> Option<Task> {
    let strategies = ctx.memory.role.strategies();

    strategies.iter().find_map(|finder| finder(&mut *ctx))
}
