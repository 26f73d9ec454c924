use bevy::prelude::*;

pub mod bundle;
pub mod config;
pub mod filter;
pub mod governor;
pub mod math;
pub mod mob;
pub mod mob_set;
pub mod registry;
pub mod sensor_grid;
mod systems;

use governor::Governor;
use mob::{FleetInput, MobCommand};
use systems::{advance_fleet_tick, run_fleet_governors};

pub use config::FleetSettings;

/// Drives every registered fleet's governor once per `Update`.
pub struct FleetAiPlugin;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum FleetSet {
    Advance, // Tick counter
    Govern,  // Governors turn pending inputs into commands
}

/// Current simulation tick shared by all fleets.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FleetTick(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FleetId(pub u16);

struct FleetSlot {
    id: FleetId,
    governor: Box<dyn Governor>,
    pending: Option<FleetInput>,
}

/// The fleets under AI control and their inputs for the coming tick.
#[derive(Resource, Default)]
pub struct FleetRoster {
    fleets: Vec<FleetSlot>,
}

impl FleetRoster {
    pub fn add(&mut self, governor: Box<dyn Governor>) -> FleetId {
        let id = FleetId(self.fleets.len() as u16);
        info!("Fleet {:?} controlled by the {} governor", id, governor.name());
        self.fleets.push(FleetSlot {
            id,
            governor,
            pending: None,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.fleets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fleets.is_empty()
    }

    /// Queue the observation the fleet will act on at the next govern pass.
    /// A newer submission replaces one that was never consumed.
    pub fn submit(&mut self, id: FleetId, input: FleetInput) {
        match self.fleets.iter_mut().find(|f| f.id == id) {
            Some(fleet) => fleet.pending = Some(input),
            None => warn!("Input submitted for unknown fleet {:?}", id),
        }
    }

    pub fn governor(&self, id: FleetId) -> Option<&dyn Governor> {
        self.fleets
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.governor.as_ref())
    }

    pub fn has_pending(&self, id: FleetId) -> bool {
        self.fleets.iter().any(|f| f.id == id && f.pending.is_some())
    }
}

/// One mob order produced by a fleet's governor.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct FleetCommand {
    pub fleet: FleetId,
    pub command: MobCommand,
}

impl Plugin for FleetAiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FleetTick>();
        app.init_resource::<FleetRoster>();
        app.add_message::<FleetCommand>();

        app.configure_sets(Update, (FleetSet::Advance, FleetSet::Govern).chain());
        app.add_systems(
            Update,
            (
                advance_fleet_tick.in_set(FleetSet::Advance),
                run_fleet_governors.in_set(FleetSet::Govern),
            ),
        );
    }
}
