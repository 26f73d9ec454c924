use armada_macros::profile;
use bevy::prelude::*;

use super::{FleetCommand, FleetRoster, FleetTick};

pub(super) fn advance_fleet_tick(mut tick: ResMut<FleetTick>) {
    tick.0 += 1;
}

/// Fleets without a pending input sit this tick out.
#[profile]
pub(super) fn run_fleet_governors(
    tick: Res<FleetTick>,
    mut roster: ResMut<FleetRoster>,
    mut writer: MessageWriter<FleetCommand>,
) {
    for fleet in roster.fleets.iter_mut() {
        let Some(input) = fleet.pending.take() else {
            continue;
        };
        let commands = fleet.governor.run_tick(tick.0, &input);
        debug!(
            "Tick {}: fleet {:?} issued {} commands",
            tick.0,
            fleet.id,
            commands.len()
        );
        writer.write_batch(commands.into_iter().map(|command| FleetCommand {
            fleet: fleet.id,
            command,
        }));
    }
}
