use anyhow::anyhow;
use futures::TryFutureExt;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::session::{Session, SessionReply};
use crate::world::{World, WorldState};

pub mod action;
pub mod dnf;
pub mod goal;
pub mod interpret;
pub mod parse;
pub mod physics;
pub mod planner;
pub mod relation;
pub mod search;
pub mod session;
pub mod utils;
pub mod world;
pub mod worlds;

/// A world plus its current state: what a driver loads, owns, and mutates
/// by executing plans.
#[derive(Clone, Debug)]
#[derive(Serialize, Deserialize)]
pub struct Project {
    pub world: World,
    pub state: WorldState,
}

/// Runs one conversational turn on the blocking pool, so an interactive
/// driver can keep listening for interrupts while the planner grinds. The
/// session travels into the task and comes back with the reply.
pub fn run_submit(mut session: Session, utterance: String) -> SubmitFuture {
    let handle = tokio::task::spawn_blocking(move || {
        let reply = session.submit(&utterance);
        (session, reply)
    });
    SubmitFuture { handle }
}

pub struct SubmitFuture {
    handle: JoinHandle<(Session, SessionReply)>,
}

impl SubmitFuture {
    pub fn handle(&self) -> &JoinHandle<(Session, SessionReply)> {
        &self.handle
    }

    pub fn future(self) -> impl Future<Output = anyhow::Result<(Session, SessionReply)>> {
        self.handle.map_err(|join_err| anyhow!(join_err))
    }
}
